//! The client engine: one owner for the session, the merged view, render
//! bookkeeping and the polling loop.
//!
//! Every user intent arrives as a [`UiEvent`] through [`GameClient::handle_event`];
//! every snapshot arrives through [`GameClient::apply_poll`]. Frontends only
//! ever see [`Frame`]s.

use crate::api::{ApiError, ApiResult, PartyApi};
use crate::config::ClientConfig;
use crate::poll::{PollEvent, PollTicket, PollingLoop};
use crate::protocol::{PlayerAction, UiEvent};
use crate::session::{SessionStore, StoreError};
use crate::state::view::{self, Frame, Header, MainPanel, Notice, Screen};
use crate::state::{decide, reconcile, RenderScheduler, ViewState};
use crate::types::*;
use crate::validate;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Notice text for a failed server call
fn failure_message(err: &ApiError, doing: &str, default: &str) -> String {
    match err {
        ApiError::Network(_) => format!("Network problem while {}", doing),
        _ => err.user_message(default),
    }
}

pub struct GameClient {
    api: Arc<dyn PartyApi>,
    store: SessionStore,
    config: ClientConfig,
    session: Option<ClientSession>,
    /// Bumped whenever a session starts or ends
    generation: u64,
    view: Option<ViewState>,
    scheduler: RenderScheduler,
    main: Option<MainPanel>,
    main_rebuilt: bool,
    screen: Screen,
    ranking_open: bool,
    notices: Vec<Notice>,
    poller: PollingLoop,
}

impl GameClient {
    pub fn new(api: Arc<dyn PartyApi>, store: SessionStore, config: ClientConfig) -> Self {
        let poller = PollingLoop::new(config.poll_interval);
        Self {
            api,
            store,
            config,
            session: None,
            generation: 0,
            view: None,
            scheduler: RenderScheduler::new(),
            main: None,
            main_rebuilt: false,
            screen: Screen::Home,
            ranking_open: false,
            notices: Vec::new(),
            poller,
        }
    }

    pub fn session(&self) -> Option<&ClientSession> {
        self.session.as_ref()
    }

    pub fn view(&self) -> Option<&ViewState> {
        self.view.as_ref()
    }

    pub fn screen(&self) -> &Screen {
        &self.screen
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn poller(&self) -> &PollingLoop {
        &self.poller
    }

    /// Number of main panel rebuilds so far
    pub fn rebuilds(&self) -> u64 {
        self.scheduler.rebuilds()
    }

    /// Ticket for a poll issued right now, if there is a session
    pub fn ticket(&self) -> Option<PollTicket> {
        self.session.as_ref().map(|s| PollTicket {
            generation: self.generation,
            party_id: s.party_id.clone(),
            player_id: s.player_id.clone(),
        })
    }

    // ========== Session lifecycle ==========

    /// Restore the persisted session, if any. Returns whether the game view
    /// is now active.
    pub async fn resume(&mut self) -> bool {
        let stored = match self.store.load() {
            Some(stored) => stored,
            None => return false,
        };

        tracing::info!(
            "Resuming party {} as player {}",
            stored.party_id,
            stored.player_id
        );
        match self
            .api
            .party_state(&stored.party_id, &stored.player_id)
            .await
        {
            Ok(snapshot) => {
                let player_name = stored
                    .player_name
                    .unwrap_or_else(|| snapshot.you.name.clone());
                let session = ClientSession {
                    party_id: stored.party_id,
                    player_id: stored.player_id,
                    player_name,
                    is_host: snapshot.me_is_host,
                };
                self.begin_session(session);
                self.apply_snapshot(snapshot);
                self.poller.start();
                true
            }
            Err(e) if e.is_transient() => {
                tracing::warn!("Could not reach server to resume session: {}", e);
                self.screen = Screen::Home;
                self.notices
                    .push(Notice::alert("Network problem while resuming session"));
                false
            }
            Err(e) => {
                tracing::info!("Stored session rejected: {}", e);
                if let Err(e) = self.store.clear() {
                    tracing::warn!("Failed to clear stored session: {}", e);
                }
                self.screen = Screen::Home;
                false
            }
        }
    }

    fn begin_session(&mut self, session: ClientSession) {
        self.generation += 1;
        self.view = None;
        self.main = None;
        self.main_rebuilt = false;
        self.scheduler.invalidate();
        self.ranking_open = false;
        if let Err(e) = self.store.save(&session) {
            tracing::warn!("Failed to persist session: {}", e);
        }
        tracing::info!(
            generation = self.generation,
            "Session started for {} in party {}",
            session.player_name,
            session.party_id
        );
        self.session = Some(session);
        self.screen = Screen::Game;
    }

    fn end_session(&mut self) {
        self.poller.stop();
        self.generation += 1;
        self.session = None;
        self.view = None;
        self.main = None;
        self.main_rebuilt = false;
        self.scheduler.invalidate();
        self.ranking_open = false;
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored session: {}", e);
        }
        self.screen = Screen::Home;
    }

    /// Stop polling but keep the persisted session for the next start
    pub fn shutdown(&mut self) {
        self.poller.stop();
    }

    // ========== Polling ==========

    /// Wait for the polling loop and act on what it reports. Cancel safe.
    pub async fn step(&mut self) {
        match self.poller.next_event().await {
            PollEvent::Due => {
                self.begin_poll();
            }
            PollEvent::Completed(ticket, result) => self.apply_poll(ticket, result),
        }
    }

    fn begin_poll(&mut self) -> bool {
        let ticket = match self.ticket() {
            Some(ticket) => ticket,
            None => return false,
        };
        let api = Arc::clone(&self.api);
        let (party_id, player_id) = (ticket.party_id.clone(), ticket.player_id.clone());
        let fut = async move { api.party_state(&party_id, &player_id).await }.boxed();
        self.poller.launch(ticket, fut)
    }

    /// Apply a finished poll unless its session has been replaced since
    pub fn apply_poll(&mut self, ticket: PollTicket, result: ApiResult<PartySnapshot>) {
        if self.ticket().as_ref() != Some(&ticket) {
            tracing::debug!(
                generation = ticket.generation,
                current = self.generation,
                "Discarding poll for a stale session"
            );
            return;
        }

        match result {
            Ok(snapshot) => self.apply_snapshot(snapshot),
            Err(ApiError::SessionNotFound) => {
                tracing::warn!("Session {} no longer exists on server", ticket.player_id);
                self.end_session();
            }
            Err(e) if e.is_transient() => tracing::debug!("Poll failed, retrying: {}", e),
            Err(e) => tracing::warn!("Poll rejected: {}", e),
        }
    }

    fn apply_snapshot(&mut self, snapshot: PartySnapshot) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        if let Some(prev) = &self.view {
            if !prev.phase.can_follow(&snapshot.phase) {
                tracing::warn!(
                    from = %prev.phase,
                    to = %snapshot.phase,
                    "Unexpected phase transition"
                );
            }
        }

        session.is_host = snapshot.me_is_host;
        if !snapshot.you.name.is_empty() {
            session.player_name = snapshot.you.name.clone();
        }

        let merged = reconcile(self.view.as_ref(), snapshot);
        if self.scheduler.observe(&merged) {
            self.main = Some(view::main_panel(&merged, session));
            self.main_rebuilt = true;
        }
        self.view = Some(merged);
    }

    // ========== User events ==========

    pub async fn handle_event(&mut self, event: UiEvent) {
        tracing::debug!(?event, "UI event");
        match event {
            UiEvent::CreateParty => self.create_party().await,
            UiEvent::JoinParty { party_id } => self.join_party(&party_id).await,
            UiEvent::SubmitName { name } => self.register(&name).await,
            UiEvent::BackToHome => {
                if matches!(self.screen, Screen::Name { .. }) {
                    self.screen = Screen::Home;
                }
            }
            UiEvent::SelectVoteTarget { player_id } => {
                if let Some(merged) = self.view.as_mut() {
                    if !merged.select_vote_target(&player_id) {
                        tracing::debug!("Vote target {} not selectable", player_id);
                    }
                }
            }
            UiEvent::SelectTask { index } => {
                if let (Some(merged), Some(session)) = (self.view.as_mut(), self.session.as_ref())
                {
                    if !merged.select_task(&session.player_id, index) {
                        tracing::debug!("Task {} not selectable", index);
                    }
                }
            }
            UiEvent::ConfirmAction => self.confirm().await,
            UiEvent::OpenRanking => {
                if self.session.is_some() {
                    self.ranking_open = true;
                    self.poller.schedule_repoll(Duration::ZERO);
                }
            }
            UiEvent::CloseRanking => self.ranking_open = false,
            UiEvent::Exit => {
                if self.session.is_some() {
                    tracing::info!("Leaving party");
                }
                self.end_session();
            }
        }
    }

    async fn create_party(&mut self) {
        if self.screen != Screen::Home {
            return;
        }
        match self.api.create_party().await {
            Ok(created) => {
                tracing::info!("Created party {}", created.party_id);
                self.screen = Screen::Name {
                    party_id: created.party_id,
                };
            }
            Err(e) => {
                tracing::warn!("Create party failed: {}", e);
                self.notices.push(Notice::alert(failure_message(
                    &e,
                    "creating party",
                    "Could not create party",
                )));
            }
        }
    }

    async fn join_party(&mut self, raw: &str) {
        if self.screen != Screen::Home {
            return;
        }
        let party_id = match validate::party_id(raw) {
            Ok(id) => id,
            Err(e) => {
                self.notices.push(Notice::alert(e.to_string()));
                return;
            }
        };

        match self.api.join_party(&party_id).await {
            Ok(joined) => {
                tracing::info!("Joining party {}", joined.party_id);
                self.screen = Screen::Name {
                    party_id: joined.party_id,
                };
            }
            Err(e) => {
                tracing::warn!("Join party {} failed: {}", party_id, e);
                self.notices.push(Notice::alert(failure_message(
                    &e,
                    "joining party",
                    "Party not found",
                )));
            }
        }
    }

    async fn register(&mut self, raw_name: &str) {
        let party_id = match &self.screen {
            Screen::Name { party_id } => party_id.clone(),
            _ => {
                self.notices
                    .push(Notice::inline(validate::InputError::NoParty.to_string()));
                return;
            }
        };
        let name = match validate::player_name(raw_name) {
            Ok(name) => name,
            Err(e) => {
                self.notices.push(Notice::inline(e.to_string()));
                return;
            }
        };

        match self.api.register_player(&party_id, &name).await {
            Ok(registered) => {
                let session = ClientSession {
                    party_id: registered.party_id,
                    player_id: registered.player_id,
                    player_name: registered.name,
                    is_host: registered.is_host,
                };
                self.begin_session(session);
                self.poller.start();
                self.poller.schedule_repoll(Duration::ZERO);
            }
            Err(e) => {
                tracing::warn!("Register in party {} failed: {}", party_id, e);
                self.notices.push(Notice::inline(failure_message(
                    &e,
                    "registering",
                    "Could not register player",
                )));
            }
        }
    }

    async fn confirm(&mut self) {
        let decision = decide(self.view.as_ref(), self.session.as_ref());
        let (action, session) = match (decision.action, self.session.clone()) {
            (Some(action), Some(session)) => (action, session),
            _ => {
                tracing::debug!("Action button disabled ({})", decision.label);
                return;
            }
        };

        let (party_id, player_id) = (session.party_id.as_str(), session.player_id.as_str());
        let result = match &action {
            PlayerAction::StartRound => self.api.start_round(party_id, player_id).await,
            PlayerAction::SubmitVote { target_player_id } => {
                self.api
                    .submit_vote(party_id, player_id, target_player_id)
                    .await
            }
            PlayerAction::ChooseTask { task_index } => {
                self.api
                    .star_choose_task(party_id, player_id, *task_index)
                    .await
            }
        };

        match result {
            Ok(ack) => {
                tracing::info!(action = action.name(), status = %ack.status, "Action accepted");
                match action {
                    PlayerAction::StartRound => self.poller.schedule_repoll(Duration::ZERO),
                    PlayerAction::SubmitVote { .. } => {
                        if let Some(merged) = self.view.as_mut() {
                            merged.mark_vote_sent();
                        }
                        self.poller.schedule_repoll(self.config.vote_repoll_delay);
                    }
                    PlayerAction::ChooseTask { .. } => {
                        self.poller.schedule_repoll(self.config.task_repoll_delay)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(action = action.name(), "Action failed: {}", e);
                let (doing, default) = match action {
                    PlayerAction::StartRound => ("starting round", "Could not start round"),
                    PlayerAction::SubmitVote { .. } => ("submitting vote", "Could not submit vote"),
                    PlayerAction::ChooseTask { .. } => ("choosing task", "Could not choose task"),
                };
                self.notices
                    .push(Notice::alert(failure_message(&e, doing, default)));
            }
        }
    }

    // ========== Output ==========

    /// Build the next frame. Pending notices and the rebuild flag are handed
    /// over and reset.
    pub fn take_frame(&mut self) -> Frame {
        let in_game = self.screen == Screen::Game;
        let session = self.session.as_ref().filter(|_| in_game);
        let merged = self.view.as_ref().filter(|_| in_game);

        let header = match (merged, session) {
            (Some(v), Some(s)) => Some(view::header(v, s)),
            (None, Some(s)) => Some(Header {
                party_id: s.party_id.clone(),
                player_name: s.player_name.clone(),
                role: if s.is_host { "Host" } else { "Player" },
                stars: 0,
                questions_left: 0,
            }),
            _ => None,
        };

        Frame {
            screen: self.screen.clone(),
            header,
            status: merged.zip(session).map(|(v, s)| view::status(v, s)),
            main: self.main.clone().filter(|_| in_game),
            main_rebuilt: std::mem::take(&mut self.main_rebuilt) && in_game,
            selection: merged.map(|v| v.selection.clone()).unwrap_or_default(),
            has_voted: merged.is_some_and(|v| v.has_voted),
            action: decide(merged, session),
            ranking: self
                .ranking_open
                .then(|| merged.map(view::ranking).unwrap_or_default()),
            notices: std::mem::take(&mut self.notices),
        }
    }
}

// ========== Frontends ==========

/// What a line of user input means
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Event(UiEvent),
    /// Leave the program, keeping the session for next time
    Quit,
    Ignored,
}

pub trait Frontend {
    fn render(&mut self, frame: &Frame) -> ClientResult<()>;

    fn interpret(&mut self, line: &str) -> Input;
}

/// Drive `client` until the input channel closes or the user quits
pub async fn run<F: Frontend>(
    client: &mut GameClient,
    frontend: &mut F,
    mut lines: mpsc::Receiver<String>,
) -> ClientResult<()> {
    frontend.render(&client.take_frame())?;

    loop {
        tokio::select! {
            _ = client.step() => {}
            line = lines.recv() => {
                let Some(line) = line else {
                    tracing::info!("Input closed");
                    break;
                };
                match frontend.interpret(&line) {
                    Input::Event(event) => client.handle_event(event).await,
                    Input::Quit => break,
                    Input::Ignored => {}
                }
            }
        }
        frontend.render(&client.take_frame())?;
    }

    client.shutdown();
    Ok(())
}

use super::ViewState;
use crate::protocol::PlayerAction;
use crate::types::*;

/// What the action button shows and, if enabled, what it does
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub label: &'static str,
    pub action: Option<PlayerAction>,
}

impl Decision {
    fn disabled(label: &'static str) -> Self {
        Self {
            label,
            action: None,
        }
    }

    fn enabled(label: &'static str, action: PlayerAction) -> Self {
        Self {
            label,
            action: Some(action),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.action.is_some()
    }

    pub fn action_name(&self) -> Option<&'static str> {
        self.action.as_ref().map(PlayerAction::name)
    }
}

/// Pick the one action the local player may take right now.
///
/// Role comes from the session (kept in sync with the server's `me_is_host`);
/// star-ness from the merged view.
pub fn decide(view: Option<&ViewState>, session: Option<&ClientSession>) -> Decision {
    let (view, session) = match (view, session) {
        (Some(v), Some(s)) => (v, s),
        _ => return Decision::disabled("Waiting"),
    };

    match view.phase {
        Phase::Finished => Decision::disabled("Finished"),

        Phase::Idle if session.is_host => Decision::enabled("Start round", PlayerAction::StartRound),
        Phase::Idle => Decision::disabled("Waiting for host"),

        Phase::Voting if view.has_voted => Decision::disabled("Vote sent"),
        Phase::Voting => match &view.selection.vote_target_id {
            Some(target) => Decision::enabled(
                "Confirm vote",
                PlayerAction::SubmitVote {
                    target_player_id: target.clone(),
                },
            ),
            None => Decision::disabled("Confirm vote"),
        },

        Phase::TaskChoice if view.is_star(&session.player_id) => match view.selection.task_index {
            Some(task_index) => {
                Decision::enabled("Confirm task", PlayerAction::ChooseTask { task_index })
            }
            None => Decision::disabled("Confirm task"),
        },
        Phase::TaskChoice => Decision::disabled("Waiting for star"),

        Phase::TaskResult if session.is_host => {
            Decision::enabled("Next round", PlayerAction::StartRound)
        }
        Phase::TaskResult => Decision::disabled("Waiting for host"),
    }
}

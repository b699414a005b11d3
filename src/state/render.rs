use super::ViewState;
use crate::types::*;

/// Render-significant part of the merged state.
///
/// Scoreboard, header and selection marks are left out; they are cheap to
/// refresh on every poll.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    pub phase: Phase,
    pub question_text: Option<String>,
    pub star_player_id: Option<PlayerId>,
    pub selected_task: Option<String>,
    pub round_number: u32,
}

pub fn fingerprint(view: &ViewState) -> Fingerprint {
    Fingerprint {
        phase: view.phase,
        question_text: view.question_text.clone(),
        star_player_id: view.star.as_ref().map(|s| s.id.clone()),
        selected_task: view.selected_task.clone(),
        round_number: view.round_number,
    }
}

pub fn should_rebuild(key: &Fingerprint, last: Option<&Fingerprint>) -> bool {
    last != Some(key)
}

/// Remembers the fingerprint of the last main-panel rebuild
#[derive(Debug, Default)]
pub struct RenderScheduler {
    last: Option<Fingerprint>,
    rebuilds: u64,
}

impl RenderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `view` and report whether the main panel must be rebuilt
    pub fn observe(&mut self, view: &ViewState) -> bool {
        let key = fingerprint(view);
        if !should_rebuild(&key, self.last.as_ref()) {
            return false;
        }
        tracing::debug!(
            phase = %key.phase,
            round = key.round_number,
            "Main panel rebuild"
        );
        self.last = Some(key);
        self.rebuilds += 1;
        true
    }

    /// Forget the last key so the next observation always rebuilds
    pub fn invalidate(&mut self) {
        self.last = None;
    }

    pub fn last_key(&self) -> Option<&Fingerprint> {
        self.last.as_ref()
    }

    pub fn rebuilds(&self) -> u64 {
        self.rebuilds
    }
}

mod dispatch;
mod reconcile;
mod render;
pub mod view;

pub use dispatch::{decide, Decision};
pub use reconcile::reconcile;
pub use render::{fingerprint, should_rebuild, Fingerprint, RenderScheduler};

use crate::types::*;

/// The star of the current round.
///
/// `name` is `None` when the server names a star that is not on the roster.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StarRef {
    pub id: PlayerId,
    pub name: Option<String>,
}

/// Server snapshot merged with the local, unconfirmed selection.
///
/// Only `reconcile` builds one; afterwards only the selection setters below
/// touch it until the next poll.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewState {
    pub party_id: PartyId,
    pub phase: Phase,
    pub round_number: u32,
    pub questions_left: u32,
    pub host_id: Option<PlayerId>,
    pub is_host: bool,
    pub players: Vec<PlayerSummary>,
    pub name: String,
    pub stars: u32,
    pub question_text: Option<String>,
    pub is_positive: Option<bool>,
    pub star: Option<StarRef>,
    pub task_options: Vec<String>,
    pub selected_task: Option<String>,
    pub has_voted: bool,
    pub selection: LocalSelection,
}

impl ViewState {
    /// Phase plus round; local state never outlives one instance
    pub fn phase_instance(&self) -> (Phase, u32) {
        (self.phase, self.round_number)
    }

    pub fn is_star(&self, player_id: &str) -> bool {
        self.star.as_ref().is_some_and(|s| s.id == player_id)
    }

    pub fn star_name(&self) -> Option<&str> {
        self.star.as_ref().and_then(|s| s.name.as_deref())
    }

    /// Tentatively pick a vote target. Refused once the vote is locked.
    pub fn select_vote_target(&mut self, player_id: &str) -> bool {
        if self.phase != Phase::Voting || self.has_voted {
            return false;
        }
        if !self.players.iter().any(|p| p.id == player_id) {
            return false;
        }
        self.selection.vote_target_id = Some(player_id.to_string());
        true
    }

    /// Tentatively pick one of the offered tasks (star only)
    pub fn select_task(&mut self, player_id: &str, index: usize) -> bool {
        if self.phase != Phase::TaskChoice || !self.is_star(player_id) {
            return false;
        }
        if index >= self.task_options.len() {
            return false;
        }
        self.selection.task_index = Some(index);
        true
    }

    /// Lock the vote locally right after the server accepted it
    pub fn mark_vote_sent(&mut self) {
        if self.phase == Phase::Voting {
            self.has_voted = true;
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_select_vote_target_only_while_voting() {
        let mut view = reconcile(None, snapshot(Phase::Idle, 0));
        assert!(!view.select_vote_target("p2"));
        assert!(view.selection.vote_target_id.is_none());

        let mut view = reconcile(None, snapshot(Phase::Voting, 1));
        assert!(view.select_vote_target("p2"));
        assert_eq!(view.selection.vote_target_id.as_deref(), Some("p2"));
    }

    #[test]
    fn test_select_vote_target_rejects_unknown_player() {
        let mut view = reconcile(None, snapshot(Phase::Voting, 1));
        assert!(!view.select_vote_target("ghost"));
        assert!(view.selection.vote_target_id.is_none());
    }

    #[test]
    fn test_select_vote_target_after_lock() {
        let mut view = reconcile(None, snapshot(Phase::Voting, 1));
        view.select_vote_target("p2");
        view.mark_vote_sent();

        assert!(!view.select_vote_target("p3"));
        assert_eq!(view.selection.vote_target_id.as_deref(), Some("p2"));
    }

    #[test]
    fn test_select_task_star_only() {
        let mut snap = with_star(snapshot(Phase::TaskChoice, 1), "p2", "Bob");
        snap.task_options_for_star = vec!["Sing".to_string(), "Dance".to_string()];
        let mut view = reconcile(None, snap);

        assert!(!view.select_task("p1", 0));
        assert!(view.select_task("p2", 1));
        assert_eq!(view.selection.task_index, Some(1));
        assert!(!view.select_task("p2", 2));
        assert_eq!(view.selection.task_index, Some(1));
    }

    #[test]
    fn test_mark_vote_sent_outside_voting_is_noop() {
        let mut view = reconcile(None, snapshot(Phase::TaskResult, 1));
        view.mark_vote_sent();
        assert!(!view.has_voted);
    }
}

use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type PartyId = String;
pub type PlayerId = String;

/// Required length of a party id
pub const PARTY_ID_LEN: usize = 4;

/// Maximum length of a display name (in characters, after trimming)
pub const MAX_NAME_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Voting,
    TaskChoice,
    TaskResult,
    Finished,
}

impl Phase {
    /// Wire name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Voting => "voting",
            Phase::TaskChoice => "task_choice",
            Phase::TaskResult => "task_result",
            Phase::Finished => "finished",
        }
    }

    /// Whether the server may move from `self` to `to`.
    ///
    /// Staying in the same phase is always allowed (consecutive polls).
    pub fn can_follow(&self, to: &Phase) -> bool {
        use Phase::*;

        match (self, to) {
            (a, b) if a == b => true,
            (Idle, Voting) => true,
            (Voting, TaskChoice) => true,
            (TaskChoice, TaskResult) => true,
            (TaskResult, Voting) => true, // host starts the next round straight away
            (TaskResult, Idle) => true,
            (TaskResult, Finished) => true,
            (Idle, Finished) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the party roster, in ranking order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub stars: u32,
}

/// The server's record of the polling player
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SelfView {
    #[serde(default)]
    pub id: Option<PlayerId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub has_voted: bool,
    #[serde(default)]
    pub vote_target_id: Option<PlayerId>,
}

/// Authoritative party state as returned by `party_state`.
///
/// Everything but the phase is optional on the wire so a partial snapshot
/// still renders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PartySnapshot {
    #[serde(default)]
    pub party_id: PartyId,
    #[serde(rename = "state")]
    pub phase: Phase,
    /// `None` when the server left it out; the client then keeps its own
    #[serde(default)]
    pub round_number: Option<u32>,
    #[serde(default)]
    pub questions_left: u32,
    #[serde(default)]
    pub host_id: Option<PlayerId>,
    #[serde(default)]
    pub me_is_host: bool,
    #[serde(default)]
    pub players: Vec<PlayerSummary>,
    #[serde(default)]
    pub you: SelfView,
    #[serde(default)]
    pub question_text: Option<String>,
    #[serde(default)]
    pub is_positive: Option<bool>,
    #[serde(default)]
    pub star_player_id: Option<PlayerId>,
    #[serde(default)]
    pub star_player_name: Option<String>,
    /// Only filled for the star while choosing
    #[serde(default)]
    pub task_options_for_star: Vec<String>,
    #[serde(default)]
    pub selected_task: Option<String>,
}

/// Identity plus role of the local player
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClientSession {
    pub party_id: PartyId,
    pub player_id: PlayerId,
    pub player_name: String,
    pub is_host: bool,
}

/// Tentative choices the server does not know about yet
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalSelection {
    pub vote_target_id: Option<PlayerId>,
    pub task_index: Option<usize>,
}

impl LocalSelection {
    pub fn clear(&mut self) {
        self.vote_target_id = None;
        self.task_index = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_wire_names() {
        let phase: Phase = serde_json::from_str("\"task_choice\"").unwrap();
        assert_eq!(phase, Phase::TaskChoice);
        assert_eq!(serde_json::to_string(&Phase::TaskResult).unwrap(), "\"task_result\"");
        assert_eq!(Phase::Finished.to_string(), "finished");
    }

    #[test]
    fn test_phase_cycle() {
        assert!(Phase::Idle.can_follow(&Phase::Voting));
        assert!(Phase::Voting.can_follow(&Phase::TaskChoice));
        assert!(Phase::TaskChoice.can_follow(&Phase::TaskResult));
        assert!(Phase::TaskResult.can_follow(&Phase::Finished));
        assert!(Phase::Idle.can_follow(&Phase::Finished));
        assert!(Phase::Voting.can_follow(&Phase::Voting));

        assert!(!Phase::Idle.can_follow(&Phase::TaskChoice));
        assert!(!Phase::Voting.can_follow(&Phase::Idle));
        assert!(!Phase::Finished.can_follow(&Phase::Idle));
    }

    #[test]
    fn test_partial_snapshot_defaults() {
        let snapshot: PartySnapshot = serde_json::from_str(r#"{"state": "voting"}"#).unwrap();

        assert_eq!(snapshot.phase, Phase::Voting);
        assert_eq!(snapshot.round_number, None);
        assert!(snapshot.players.is_empty());
        assert!(!snapshot.you.has_voted);
        assert!(snapshot.question_text.is_none());
        assert!(snapshot.star_player_id.is_none());
        assert!(snapshot.task_options_for_star.is_empty());
    }

    #[test]
    fn test_full_snapshot_parses() {
        let json = r#"{
            "party_id": "0421",
            "state": "task_choice",
            "round_number": 3,
            "questions_left": 37,
            "host_id": "h1",
            "me_is_host": false,
            "players": [
                {"id": "p2", "name": "Bo", "stars": 2},
                {"id": "p1", "name": "Al", "stars": 1}
            ],
            "you": {"id": "p1", "name": "Al", "stars": 1, "has_voted": false, "vote_target_id": null},
            "question_text": "Who is the most kind?",
            "is_positive": true,
            "star_player_id": "p2",
            "star_player_name": "Bo",
            "task_options_for_star": [],
            "selected_task": null
        }"#;

        let snapshot: PartySnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.phase, Phase::TaskChoice);
        assert_eq!(snapshot.round_number, Some(3));
        assert_eq!(snapshot.players[0].id, "p2");
        assert_eq!(snapshot.you.id.as_deref(), Some("p1"));
        assert_eq!(snapshot.star_player_name.as_deref(), Some("Bo"));
    }
}

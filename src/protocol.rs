use crate::types::*;
use serde::{Deserialize, Serialize};

// ========== Wire bodies ==========

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePartyResponse {
    pub party_id: PartyId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPartyRequest {
    pub party_id: PartyId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinPartyResponse {
    pub party_id: PartyId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPlayerRequest {
    pub party_id: PartyId,
    pub player_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterPlayerResponse {
    pub party_id: PartyId,
    pub player_id: PlayerId,
    pub name: String,
    #[serde(default)]
    pub stars: u32,
    #[serde(default)]
    pub is_host: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartRoundRequest {
    pub party_id: PartyId,
    pub player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitVoteRequest {
    pub party_id: PartyId,
    pub player_id: PlayerId,
    pub target_player_id: PlayerId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StarChooseTaskRequest {
    pub party_id: PartyId,
    pub player_id: PlayerId,
    pub task_index: usize,
}

/// Acknowledgement of a game action (`"ok"`, or `"finished"` for a start
/// request that ran out of questions)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ack {
    #[serde(default)]
    pub status: String,
}

/// Error body of a rejected request.
///
/// `detail` is usually a message but validation failures may carry a list, so
/// it stays untyped here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    pub fn message(&self) -> Option<String> {
        match self.detail.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Array(items) => items
                .iter()
                .find_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(|s| s.to_string()),
            _ => None,
        }
    }
}

// ========== Game actions ==========

/// The single action the action button can trigger
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerAction {
    StartRound,
    SubmitVote { target_player_id: PlayerId },
    ChooseTask { task_index: usize },
}

impl PlayerAction {
    pub fn name(&self) -> &'static str {
        match self {
            PlayerAction::StartRound => "start_round",
            PlayerAction::SubmitVote { .. } => "submit_vote",
            PlayerAction::ChooseTask { .. } => "choose_task",
        }
    }
}

// ========== UI events ==========

/// Everything a frontend can ask the client to do
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    CreateParty,
    JoinParty { party_id: String },
    SubmitName { name: String },
    /// Leave the name view without registering
    BackToHome,
    SelectVoteTarget { player_id: PlayerId },
    SelectTask { index: usize },
    ConfirmAction,
    OpenRanking,
    CloseRanking,
    Exit,
}

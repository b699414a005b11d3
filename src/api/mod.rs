mod http;

use async_trait::async_trait;

pub use http::HttpPartyApi;

use crate::protocol::*;
use crate::types::*;

/// Result type for party server calls
pub type ApiResult<T> = Result<T, ApiError>;

/// Errors that can occur when talking to the party server
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Request never produced a response (connect failure, timeout, abort)
    #[error("Network problem: {0}")]
    Network(String),

    /// Server refused the request, usually with a `detail` message
    #[error("Request rejected ({status}): {}", .detail.as_deref().unwrap_or("no detail"))]
    Rejected { status: u16, detail: Option<String> },

    /// The poll endpoint no longer knows this party/player pair
    #[error("Session not found")]
    SessionNotFound,

    #[error("Response parsing failed: {0}")]
    Malformed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ApiError {
    /// Errors that the next poll or a user retry may clear on their own
    pub fn is_transient(&self) -> bool {
        matches!(self, ApiError::Network(_) | ApiError::Malformed(_))
    }

    /// Message to show the user, falling back to `default` when the server
    /// gave no detail
    pub fn user_message(&self, default: &str) -> String {
        match self {
            ApiError::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            _ => default.to_string(),
        }
    }
}

/// The party server as seen by the client
#[async_trait]
pub trait PartyApi: Send + Sync {
    async fn create_party(&self) -> ApiResult<CreatePartyResponse>;

    async fn join_party(&self, party_id: &str) -> ApiResult<JoinPartyResponse>;

    async fn register_player(
        &self,
        party_id: &str,
        player_name: &str,
    ) -> ApiResult<RegisterPlayerResponse>;

    /// Idempotent poll. `SessionNotFound` when the pair is unknown.
    async fn party_state(&self, party_id: &str, player_id: &str) -> ApiResult<PartySnapshot>;

    async fn start_round(&self, party_id: &str, player_id: &str) -> ApiResult<Ack>;

    async fn submit_vote(
        &self,
        party_id: &str,
        player_id: &str,
        target_player_id: &str,
    ) -> ApiResult<Ack>;

    async fn star_choose_task(
        &self,
        party_id: &str,
        player_id: &str,
        task_index: usize,
    ) -> ApiResult<Ack>;
}

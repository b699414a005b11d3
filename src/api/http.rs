use super::*;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// `PartyApi` over the server's JSON endpoints under `<base>/api/`
pub struct HttpPartyApi {
    base_url: Url,
    client: reqwest::Client,
}

impl HttpPartyApi {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let mut base = base_url.trim().to_string();
        // Url::join replaces the last segment unless the base ends in '/'
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| ApiError::Config(format!("Invalid server URL '{}': {}", base, e)))?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, name: &str) -> ApiResult<Url> {
        self.base_url
            .join(&format!("api/{}", name))
            .map_err(|e| ApiError::Config(format!("Invalid endpoint '{}': {}", name, e)))
    }

    fn post(&self, name: &str) -> ApiResult<RequestBuilder> {
        let url = self.endpoint(name)?;
        tracing::debug!("POST {}", url);
        Ok(self.client.post(url))
    }

    async fn send(request: RequestBuilder) -> ApiResult<reqwest::Response> {
        request
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ApiResult<T> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| ApiError::Malformed(e.to_string()));
        }

        let detail = response
            .json::<ErrorBody>()
            .await
            .ok()
            .and_then(|body| body.message());
        tracing::debug!("Request rejected with {}: {:?}", status, detail);
        Err(ApiError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl PartyApi for HttpPartyApi {
    async fn create_party(&self) -> ApiResult<CreatePartyResponse> {
        let response = Self::send(self.post("create_party")?).await?;
        Self::decode(response).await
    }

    async fn join_party(&self, party_id: &str) -> ApiResult<JoinPartyResponse> {
        let body = JoinPartyRequest {
            party_id: party_id.to_string(),
        };
        let response = Self::send(self.post("join_party")?.json(&body)).await?;
        Self::decode(response).await
    }

    async fn register_player(
        &self,
        party_id: &str,
        player_name: &str,
    ) -> ApiResult<RegisterPlayerResponse> {
        let body = RegisterPlayerRequest {
            party_id: party_id.to_string(),
            player_name: player_name.to_string(),
        };
        let response = Self::send(self.post("register_player")?.json(&body)).await?;
        Self::decode(response).await
    }

    async fn party_state(&self, party_id: &str, player_id: &str) -> ApiResult<PartySnapshot> {
        let url = self.endpoint("party_state")?;
        let request = self
            .client
            .get(url)
            .query(&[("party_id", party_id), ("player_id", player_id)]);
        let response = Self::send(request).await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::SessionNotFound);
        }
        Self::decode(response).await
    }

    async fn start_round(&self, party_id: &str, player_id: &str) -> ApiResult<Ack> {
        let body = StartRoundRequest {
            party_id: party_id.to_string(),
            player_id: player_id.to_string(),
        };
        let response = Self::send(self.post("start_round")?.json(&body)).await?;
        Self::decode(response).await
    }

    async fn submit_vote(
        &self,
        party_id: &str,
        player_id: &str,
        target_player_id: &str,
    ) -> ApiResult<Ack> {
        let body = SubmitVoteRequest {
            party_id: party_id.to_string(),
            player_id: player_id.to_string(),
            target_player_id: target_player_id.to_string(),
        };
        let response = Self::send(self.post("submit_vote")?.json(&body)).await?;
        Self::decode(response).await
    }

    async fn star_choose_task(
        &self,
        party_id: &str,
        player_id: &str,
        task_index: usize,
    ) -> ApiResult<Ack> {
        let body = StarChooseTaskRequest {
            party_id: party_id.to_string(),
            player_id: player_id.to_string(),
            task_index,
        };
        let response = Self::send(self.post("star_choose_task")?.json(&body)).await?;
        Self::decode(response).await
    }
}

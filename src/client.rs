use async_trait::async_trait;
use reqwest::Url;
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::backend::{
    ChatBackend, ChatReply, ChatRequest, CreateSessionRequest, CreatedSession, FeedbackRequest,
    HistoryEntry, TitleReply, TitleRequest, UpdateSessionRequest,
};
use crate::config::Config;
use crate::error::{ClientError, retry_delay};
use crate::events::SessionSummary;

/// HTTP client for the support backend
#[derive(Clone)]
pub struct HttpBackend {
    base: Url,
    client: reqwest::Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl HttpBackend {
    pub fn new(config: &Config) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::network(format!("Failed to create HTTP client: {e}")))?;

        let base = Url::parse(config.api_base_url.trim())
            .map_err(|e| ClientError::validation(format!("Invalid backend URL {}: {e}", config.api_base_url)))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::validation(format!(
                "Backend URL {} cannot take a path",
                config.api_base_url
            )));
        }

        Ok(Self {
            base,
            client,
            max_retries: config.max_retries,
            retry_backoff: config.retry_backoff(),
        })
    }

    pub fn base_url(&self) -> &str {
        self.base.as_str().trim_end_matches('/')
    }

    /// Endpoint URL below the base. Each segment is percent-encoded, so ids
    /// containing `/`, `?` or `#` stay inside their own segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Send a request once and map non-success statuses to typed errors
    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ClientError::from_status(status.as_u16(), &body))
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let body = response.text().await?;
        serde_json::from_str(&body)
            .map_err(|e| ClientError::decode(format!("Unexpected response body: {e}")))
    }

    /// GET with bounded retries for retryable failures
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ClientError> {
        let mut attempt = 0;

        loop {
            let result = match self.send(self.client.get(url.clone())).await {
                Ok(response) => Self::decode(response).await,
                Err(e) => Err(e),
            };

            match result {
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = retry_delay(self.retry_backoff, attempt);
                    tracing::warn!(%url, attempt, ?delay, error = %e, "retrying request");
                    tokio::time::sleep(delay).await;
                }
                other => return other,
            }
        }
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ClientError> {
        tracing::debug!(session_id = ?request.session_id, "sending question");
        let response = self.send(self.client.post(self.url(&["chat"])).json(&request)).await?;
        Self::decode(response).await
    }

    async fn send_feedback(&self, request: FeedbackRequest) -> Result<(), ClientError> {
        self.send(self.client.post(self.url(&["feedback"])).json(&request)).await?;
        Ok(())
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, ClientError> {
        self.get_json(self.url(&["get_chat_sessions", user_id])).await
    }

    async fn session_messages(&self, session_id: &str) -> Result<Vec<HistoryEntry>, ClientError> {
        self.get_json(self.url(&["get_chat_messages", session_id])).await
    }

    async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionSummary, ClientError> {
        let response = self
            .send(self.client.post(self.url(&["create_chat_session"])).json(&request))
            .await?;
        let created: CreatedSession = Self::decode(response).await?;
        Ok(created.into())
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ClientError> {
        self.send(self.client.delete(self.url(&["delete_chat_session", session_id])))
            .await?;
        Ok(())
    }

    async fn update_session(&self, session_id: &str, request: UpdateSessionRequest) -> Result<(), ClientError> {
        self.send(
            self.client
                .put(self.url(&["update_chat_session", session_id]))
                .json(&request),
        )
        .await?;
        Ok(())
    }

    async fn generate_title(&self, request: TitleRequest) -> Result<String, ClientError> {
        let response = self
            .send(self.client.post(self.url(&["generate_title"])).json(&request))
            .await?;
        let reply: TitleReply = Self::decode(response).await?;
        Ok(reply.title)
    }
}

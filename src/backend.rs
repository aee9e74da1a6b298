//! Backend abstraction and wire types
//!
//! `ChatBackend` is the seam between the conversation view and the remote
//! support API. The HTTP implementation lives in `client.rs`; tests use the
//! scripted backend from `testing.rs`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ClientError;
use crate::events::{Role, Sentiment, SessionSummary};

/// Body of `POST /chat`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub api_key: String,
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Response of `POST /chat`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChatReply {
    pub answer: String,
    #[serde(default = "default_contextual")]
    pub contextual: bool,
}

fn default_contextual() -> bool {
    true
}

/// Body of `POST /feedback`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedbackRequest {
    pub query: String,
    pub response: String,
    pub feedback: String,
}

impl FeedbackRequest {
    pub fn new(query: impl Into<String>, response: impl Into<String>, sentiment: Sentiment) -> Self {
        Self {
            query: query.into(),
            response: response.into(),
            feedback: sentiment.to_string(),
        }
    }
}

/// One stored message as returned by `GET /get_chat_messages/{id}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
}

impl HistoryEntry {
    pub fn role(&self) -> Role {
        match self.kind.to_lowercase().as_str() {
            "user" | "human" => Role::User,
            "bot" | "assistant" | "ai" => Role::Bot,
            _ => Role::Error,
        }
    }
}

/// Body of `POST /create_chat_session`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    pub title: String,
}

/// Response of `POST /create_chat_session`
#[derive(Debug, Clone, Deserialize)]
pub struct CreatedSession {
    pub session_id: String,
    pub title: String,
}

impl From<CreatedSession> for SessionSummary {
    fn from(created: CreatedSession) -> Self {
        SessionSummary {
            id: created.session_id,
            title: created.title,
        }
    }
}

/// Body of `PUT /update_chat_session/{id}`
#[derive(Debug, Clone, Serialize)]
pub struct UpdateSessionRequest {
    pub title: String,
}

/// Body of `POST /generate_title`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TitleRequest {
    pub api_key: String,
    pub query: String,
}

/// Response of `POST /generate_title`
#[derive(Debug, Clone, Deserialize)]
pub struct TitleReply {
    pub title: String,
}

/// Remote support API consumed by the conversation view
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Ask a question, optionally within a stored session
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ClientError>;

    /// Record user feedback for a question/answer pair
    async fn send_feedback(&self, request: FeedbackRequest) -> Result<(), ClientError>;

    /// List the sessions owned by a user
    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, ClientError>;

    /// Fetch the stored messages of a session
    async fn session_messages(&self, session_id: &str) -> Result<Vec<HistoryEntry>, ClientError>;

    /// Create a new session
    async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionSummary, ClientError>;

    /// Delete a session
    async fn delete_session(&self, session_id: &str) -> Result<(), ClientError>;

    /// Update the stored title of a session
    async fn update_session(&self, session_id: &str, request: UpdateSessionRequest) -> Result<(), ClientError>;

    /// Ask the backend to generate a short title for a query
    async fn generate_title(&self, request: TitleRequest) -> Result<String, ClientError>;
}

#[async_trait]
impl<T: ChatBackend + ?Sized> ChatBackend for std::sync::Arc<T> {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ClientError> {
        (**self).chat(request).await
    }

    async fn send_feedback(&self, request: FeedbackRequest) -> Result<(), ClientError> {
        (**self).send_feedback(request).await
    }

    async fn list_sessions(&self, user_id: &str) -> Result<Vec<SessionSummary>, ClientError> {
        (**self).list_sessions(user_id).await
    }

    async fn session_messages(&self, session_id: &str) -> Result<Vec<HistoryEntry>, ClientError> {
        (**self).session_messages(session_id).await
    }

    async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionSummary, ClientError> {
        (**self).create_session(request).await
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ClientError> {
        (**self).delete_session(session_id).await
    }

    async fn update_session(&self, session_id: &str, request: UpdateSessionRequest) -> Result<(), ClientError> {
        (**self).update_session(session_id, request).await
    }

    async fn generate_title(&self, request: TitleRequest) -> Result<String, ClientError> {
        (**self).generate_title(request).await
    }
}

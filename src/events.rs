use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::backend::{ChatReply, HistoryEntry};
use crate::error::ClientError;

/// Results delivered from background requests back to the UI loop
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A submitted question was answered (or failed)
    Reply {
        generation: u64,
        result: Result<ChatReply, ClientError>,
    },

    /// The session list for the signed-in user was fetched
    SessionsLoaded(Result<Vec<SessionSummary>, ClientError>),

    /// Messages for a selected session were fetched
    MessagesLoaded {
        generation: u64,
        session_id: String,
        result: Result<Vec<HistoryEntry>, ClientError>,
    },

    /// A new session was created by the backend
    SessionCreated(Result<SessionSummary, ClientError>),

    /// A session was deleted on the backend
    SessionDeleted {
        session_id: String,
        result: Result<(), ClientError>,
    },

    /// Feedback for a message was acknowledged (or failed)
    FeedbackRecorded {
        session_id: Option<String>,
        position: usize,
        sentiment: Sentiment,
        result: Result<(), ClientError>,
    },

    /// A generated title was stored for a session
    SessionRenamed {
        session_id: String,
        result: Result<String, ClientError>,
    },
}

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
    Error,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "You",
            Role::Bot => "Bot",
            Role::Error => "Error",
        }
    }
}

/// Individual message in a conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    /// Raw text as typed by the user or returned by the backend
    pub content: String,
    /// Formatted HTML, present for bot messages only
    pub html: Option<String>,
    pub position: usize,
    pub timestamp: DateTime<Utc>,
}

/// User sentiment attached to a bot message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr)]
pub enum Sentiment {
    #[strum(to_string = "Positive", serialize = "positive", serialize = "good")]
    Positive,
    #[strum(to_string = "Negative", serialize = "negative", serialize = "bad")]
    Negative,
}

/// Session listing entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: String,
    pub title: String,
}

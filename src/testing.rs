//! Test doubles for the conversation view

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::backend::{
    ChatBackend, ChatReply, ChatRequest, CreateSessionRequest, FeedbackRequest, HistoryEntry,
    TitleRequest, UpdateSessionRequest,
};
use crate::config::{ChatMode, Config};
use crate::error::ClientError;
use crate::events::SessionSummary;
use crate::format::{HtmlFormatter, ResponseFormatter};

/// Config pointing nowhere, with the given mode
pub fn test_config(mode: ChatMode) -> Config {
    Config {
        mode,
        home: std::env::temp_dir().join("supportdesk-test"),
        ..Config::default()
    }
}

/// Formatter that counts how often it runs
#[derive(Debug, Default)]
pub struct CountingFormatter {
    pub calls: Arc<AtomicUsize>,
}

impl ResponseFormatter for CountingFormatter {
    fn format(&self, raw: &str) -> String {
        self.calls.fetch_add(1, Ordering::SeqCst);
        HtmlFormatter.format(raw)
    }
}

#[derive(Default)]
struct FakeState {
    replies: VecDeque<Result<ChatReply, ClientError>>,
    chats: Vec<ChatRequest>,
    feedback: Vec<FeedbackRequest>,
    fail_feedback: bool,
    sessions: Vec<SessionSummary>,
    history: HashMap<String, Vec<HistoryEntry>>,
    created: usize,
    title: Option<String>,
    fail_titles: bool,
    title_requests: usize,
    renamed: Vec<(String, String)>,
}

/// Scripted in-memory backend
#[derive(Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> std::sync::MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn push_reply(&self, answer: &str, contextual: bool) {
        self.state().replies.push_back(Ok(ChatReply {
            answer: answer.to_string(),
            contextual,
        }));
    }

    pub fn push_chat_error(&self, error: ClientError) {
        self.state().replies.push_back(Err(error));
    }

    pub fn last_chat(&self) -> Option<ChatRequest> {
        self.state().chats.last().cloned()
    }

    pub fn fail_feedback(&self, fail: bool) {
        self.state().fail_feedback = fail;
    }

    pub fn feedback_sent(&self) -> Vec<FeedbackRequest> {
        self.state().feedback.clone()
    }

    pub fn set_sessions(&self, sessions: Vec<SessionSummary>) {
        self.state().sessions = sessions;
    }

    pub fn set_history(&self, session_id: &str, history: Vec<HistoryEntry>) {
        self.state().history.insert(session_id.to_string(), history);
    }

    pub fn set_title(&self, title: &str) {
        self.state().title = Some(title.to_string());
    }

    pub fn fail_titles(&self, fail: bool) {
        self.state().fail_titles = fail;
    }

    pub fn title_requests(&self) -> usize {
        self.state().title_requests
    }

    pub fn renamed(&self) -> Vec<(String, String)> {
        self.state().renamed.clone()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn chat(&self, request: ChatRequest) -> Result<ChatReply, ClientError> {
        let mut state = self.state();
        state.chats.push(request);
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Err(ClientError::server("no scripted reply")))
    }

    async fn send_feedback(&self, request: FeedbackRequest) -> Result<(), ClientError> {
        let mut state = self.state();
        if state.fail_feedback {
            return Err(ClientError::network("feedback endpoint unreachable"));
        }
        state.feedback.push(request);
        Ok(())
    }

    async fn list_sessions(&self, _user_id: &str) -> Result<Vec<SessionSummary>, ClientError> {
        Ok(self.state().sessions.clone())
    }

    async fn session_messages(&self, session_id: &str) -> Result<Vec<HistoryEntry>, ClientError> {
        Ok(self.state().history.get(session_id).cloned().unwrap_or_default())
    }

    async fn create_session(&self, request: CreateSessionRequest) -> Result<SessionSummary, ClientError> {
        let mut state = self.state();
        state.created += 1;
        let summary = SessionSummary {
            id: format!("session-{}", state.created),
            title: request.title,
        };
        state.sessions.insert(0, summary.clone());
        Ok(summary)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), ClientError> {
        let mut state = self.state();
        let before = state.sessions.len();
        state.sessions.retain(|s| s.id != session_id);
        if state.sessions.len() == before {
            return Err(ClientError::not_found(format!("session {session_id} not found")));
        }
        Ok(())
    }

    async fn update_session(&self, session_id: &str, request: UpdateSessionRequest) -> Result<(), ClientError> {
        self.state()
            .renamed
            .push((session_id.to_string(), request.title));
        Ok(())
    }

    async fn generate_title(&self, _request: TitleRequest) -> Result<String, ClientError> {
        let mut state = self.state();
        state.title_requests += 1;
        if state.fail_titles {
            return Err(ClientError::server("title service down"));
        }
        Ok(state.title.clone().unwrap_or_else(|| "Generated Title".to_string()))
    }
}

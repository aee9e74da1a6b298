use chrono::Utc;

use crate::backend::HistoryEntry;
use crate::events::{Message, Role, SessionSummary};
use crate::feedback::FeedbackTracker;
use crate::format::ResponseFormatter;

/// Title given to sessions until a generated one replaces it
pub const PLACEHOLDER_TITLE: &str = "New Chat";

/// Title of the local transcript in stateless mode
pub const LOCAL_TITLE: &str = "Conversation";

/// Session list plus the conversation currently on screen
#[derive(Debug, Default)]
pub struct SessionManager {
    sessions: Vec<SessionSummary>,
    current_session: Option<ActiveSession>,
}

/// The open conversation with its runtime state
#[derive(Debug, Clone)]
pub struct ActiveSession {
    /// Backend id; `None` for the local stateless transcript
    pub session_id: Option<String>,
    pub title: String,
    pub messages: Vec<Message>,
    pub feedback: FeedbackTracker,
    title_requested: bool,
}

impl ActiveSession {
    fn new(session_id: Option<String>, title: String) -> Self {
        Self {
            session_id,
            title,
            messages: Vec::new(),
            feedback: FeedbackTracker::new(),
            title_requested: false,
        }
    }

    /// Local transcript used when the backend does not store sessions
    pub fn local() -> Self {
        Self::new(None, LOCAL_TITLE.to_string())
    }

    fn push(&mut self, role: Role, content: String, html: Option<String>) -> usize {
        let position = self.messages.len();
        self.messages.push(Message {
            role,
            content,
            html,
            position,
            timestamp: Utc::now(),
        });
        position
    }

    pub fn push_user(&mut self, content: String) -> usize {
        self.push(Role::User, content, None)
    }

    pub fn push_bot(&mut self, raw: String, formatter: &dyn ResponseFormatter) -> usize {
        let html = formatter.format(&raw);
        self.push(Role::Bot, raw, Some(html))
    }

    pub fn push_error(&mut self, content: String) -> usize {
        self.push(Role::Error, content, None)
    }

    /// First question asked in this conversation
    pub fn first_question(&self) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
    }

    /// A stored session whose title is still the placeholder and has seen a
    /// full exchange gets exactly one rename attempt
    pub fn wants_title(&self) -> bool {
        self.session_id.is_some()
            && !self.title_requested
            && self.title == PLACEHOLDER_TITLE
            && self.messages.iter().any(|m| m.role == Role::Bot)
    }

    pub fn is_stored(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
    }
}

impl SessionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the session list with what the backend returned
    pub fn set_sessions(&mut self, sessions: Vec<SessionSummary>) {
        self.sessions = sessions;
        if let Some(active) = &mut self.current_session {
            if let Some(id) = &active.session_id {
                if let Some(summary) = self.sessions.iter().find(|s| &s.id == id) {
                    active.title = summary.title.clone();
                }
            }
        }
    }

    /// Get all known sessions, newest first
    pub fn list_sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    pub fn find(&self, session_id: &str) -> Option<&SessionSummary> {
        self.sessions.iter().find(|s| s.id == session_id)
    }

    /// Prepend a freshly created session and make it active
    pub fn insert_created(&mut self, summary: SessionSummary) {
        self.sessions.retain(|s| s.id != summary.id);
        self.current_session = Some(ActiveSession::new(Some(summary.id.clone()), summary.title.clone()));
        self.sessions.insert(0, summary);
    }

    /// Open a stored session with its fetched history. Bot entries are
    /// formatted here, once.
    pub fn open(
        &mut self,
        session_id: &str,
        history: Vec<HistoryEntry>,
        formatter: &dyn ResponseFormatter,
    ) {
        let title = self
            .find(session_id)
            .map(|s| s.title.clone())
            .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string());
        let mut session = ActiveSession::new(Some(session_id.to_string()), title);

        for entry in history {
            match entry.role() {
                Role::User => session.push_user(entry.message),
                Role::Bot => session.push_bot(entry.message, formatter),
                Role::Error => session.push_error(entry.message),
            };
        }

        self.current_session = Some(session);
    }

    /// Use a local transcript as the active conversation
    pub fn open_local(&mut self) {
        self.current_session = Some(ActiveSession::local());
    }

    /// Remove a session from the list. Returns true when it was the active
    /// one, in which case the active pointer is cleared.
    pub fn remove(&mut self, session_id: &str) -> bool {
        self.sessions.retain(|s| s.id != session_id);

        let was_active = self
            .current_session
            .as_ref()
            .is_some_and(|s| s.is_stored(session_id));
        if was_active {
            self.current_session = None;
        }
        was_active
    }

    /// Record that a rename was attempted for the active session
    pub fn mark_title_requested(&mut self) {
        if let Some(session) = &mut self.current_session {
            session.title_requested = true;
        }
    }

    /// Store a new title for a session in the list and, if open, the view
    pub fn rename(&mut self, session_id: &str, title: &str) {
        if let Some(summary) = self.sessions.iter_mut().find(|s| s.id == session_id) {
            summary.title = title.to_string();
        }
        if let Some(session) = &mut self.current_session {
            if session.is_stored(session_id) {
                session.title = title.to_string();
            }
        }
    }

    /// Get current session
    pub fn current_session(&self) -> Option<&ActiveSession> {
        self.current_session.as_ref()
    }

    /// Get current session mutably
    pub fn current_session_mut(&mut self) -> Option<&mut ActiveSession> {
        self.current_session.as_mut()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.current_session.as_ref()?.session_id.as_deref()
    }
}

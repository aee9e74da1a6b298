//! Conversation view state
//!
//! `ConversationView` owns everything the chat screen shows: the session list
//! and open conversation, per-message feedback, the escalation prompt and the
//! in-flight request. Network calls are split into a synchronous `begin_*`
//! step that validates and builds the request, and an `apply_*` step that
//! folds the result back in. The TUI runs the call on a background task in
//! between; the `async` helpers at the bottom run all three steps inline.

use crate::auth::AuthContext;
use crate::backend::{
    ChatBackend, ChatReply, ChatRequest, CreateSessionRequest, HistoryEntry, TitleRequest,
    UpdateSessionRequest,
};
use crate::config::{ChatMode, Config};
use crate::error::ClientError;
use crate::escalation::{EscalationChoice, EscalationGate};
use crate::events::{Message, Role, Sentiment, SessionSummary};
use crate::feedback::FeedbackPlan;
use crate::format::{HtmlFormatter, ResponseFormatter};
use crate::session::{ActiveSession, PLACEHOLDER_TITLE, SessionManager};
use crate::title::{clean_title, title_query};

/// Text of the inert entry appended when a question fails
pub const SUBMIT_ERROR_TEXT: &str = "Sorry, I couldn't process your request.";

/// A submitted question waiting for its answer
#[derive(Debug, Clone)]
pub struct PendingSubmit {
    pub generation: u64,
    pub request: ChatRequest,
}

/// Result of folding an answer back into the view
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The answer was appended at `position`
    Answered { position: usize, escalate: bool },
    /// The request failed and an error entry was appended
    Failed(ClientError),
    /// The answer belongs to a request that is no longer current
    Discarded,
}

/// A rename the caller should perform for the active session
#[derive(Debug, Clone)]
pub struct PendingTitle {
    pub session_id: String,
    pub request: TitleRequest,
}

pub struct ConversationView {
    mode: ChatMode,
    auth: AuthContext,
    sessions: SessionManager,
    escalation: EscalationGate,
    formatter: Box<dyn ResponseFormatter>,
    next_generation: u64,
    in_flight: Option<u64>,
    /// Latest requested session open, as (generation, session id)
    pending_open: Option<(u64, String)>,
}

impl ConversationView {
    pub fn new(config: &Config, auth: AuthContext) -> Self {
        Self::with_formatter(config, auth, Box::new(HtmlFormatter))
    }

    pub fn with_formatter(config: &Config, auth: AuthContext, formatter: Box<dyn ResponseFormatter>) -> Self {
        let mut sessions = SessionManager::new();
        if config.mode == ChatMode::Stateless {
            sessions.open_local();
        }

        Self {
            mode: config.mode,
            auth,
            sessions,
            escalation: EscalationGate::new(&config.escalation.marker, &config.escalation.url),
            formatter,
            next_generation: 0,
            in_flight: None,
            pending_open: None,
        }
    }

    pub fn mode(&self) -> ChatMode {
        self.mode
    }

    pub fn auth(&self) -> &AuthContext {
        &self.auth
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        self.sessions.list_sessions()
    }

    pub fn active(&self) -> Option<&ActiveSession> {
        self.sessions.current_session()
    }

    pub fn active_id(&self) -> Option<&str> {
        self.sessions.active_id()
    }

    pub fn messages(&self) -> &[Message] {
        self.active().map(|s| s.messages.as_slice()).unwrap_or(&[])
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn escalation_visible(&self) -> bool {
        self.escalation.is_visible()
    }

    pub fn feedback(&self, position: usize) -> Option<Sentiment> {
        self.active()?.feedback.get(position)
    }

    fn session_backed(&self) -> Result<(), ClientError> {
        match self.mode {
            ChatMode::SessionBacked => Ok(()),
            ChatMode::Stateless => Err(ClientError::validation(
                "Sessions are not available in stateless mode",
            )),
        }
    }

    /// Forget any request in flight so its answer is discarded on arrival
    fn invalidate_in_flight(&mut self) {
        if let Some(generation) = self.in_flight.take() {
            tracing::debug!(generation, "dropping in-flight request");
        }
        self.escalation.reset();
    }

    // ------------------------------------------------------------------
    // Submit
    // ------------------------------------------------------------------

    /// Validate a question, append it optimistically and build the request
    pub fn begin_submit(&mut self, query: &str) -> Result<PendingSubmit, ClientError> {
        let question = query.trim();
        if question.is_empty() {
            return Err(ClientError::validation("Question must not be empty"));
        }
        if self.in_flight.is_some() {
            return Err(ClientError::validation("Still waiting for the previous answer"));
        }

        let api_key = self.auth.api_key.clone();
        let session = self
            .sessions
            .current_session_mut()
            .ok_or_else(|| ClientError::validation("No conversation is open"))?;
        session.push_user(question.to_string());
        let session_id = session.session_id.clone();

        self.next_generation += 1;
        let generation = self.next_generation;
        self.in_flight = Some(generation);

        Ok(PendingSubmit {
            generation,
            request: ChatRequest {
                api_key,
                question: question.to_string(),
                session_id,
            },
        })
    }

    /// Append the answer (or an error entry) for a submitted question
    pub fn apply_reply(&mut self, generation: u64, result: Result<ChatReply, ClientError>) -> SubmitOutcome {
        if self.in_flight != Some(generation) {
            tracing::debug!(generation, "discarding stale answer");
            return SubmitOutcome::Discarded;
        }
        self.in_flight = None;

        let Some(session) = self.sessions.current_session_mut() else {
            return SubmitOutcome::Discarded;
        };

        match result {
            Ok(reply) => {
                let escalate = self.escalation.observe_answer(&reply.answer, reply.contextual);
                let position = session.push_bot(reply.answer, self.formatter.as_ref());
                tracing::info!(position, contextual = reply.contextual, escalate, "answer received");
                SubmitOutcome::Answered { position, escalate }
            }
            Err(e) => {
                tracing::error!(error = %e, kind = ?e.kind, "question failed");
                session.push_error(SUBMIT_ERROR_TEXT.to_string());
                SubmitOutcome::Failed(e)
            }
        }
    }

    // ------------------------------------------------------------------
    // Titles
    // ------------------------------------------------------------------

    /// Build the one-time title request for the active session, if due
    pub fn begin_title(&mut self) -> Option<PendingTitle> {
        let session = self.sessions.current_session()?;
        if !session.wants_title() {
            return None;
        }
        let session_id = session.session_id.clone()?;
        let query = title_query(session.first_question()?);

        self.sessions.mark_title_requested();
        Some(PendingTitle {
            session_id,
            request: TitleRequest {
                api_key: self.auth.api_key.clone(),
                query,
            },
        })
    }

    /// Store a title that the backend generated and persisted
    pub fn apply_title(&mut self, session_id: &str, result: Result<String, ClientError>) -> Option<String> {
        match result {
            Ok(title) => {
                self.sessions.rename(session_id, &title);
                Some(title)
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "title generation failed");
                None
            }
        }
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub fn apply_sessions(&mut self, sessions: Vec<SessionSummary>) {
        tracing::debug!(count = sessions.len(), "session list loaded");
        self.sessions.set_sessions(sessions);
    }

    pub fn apply_created(&mut self, summary: SessionSummary) {
        tracing::info!(session_id = %summary.id, "session created");
        self.invalidate_in_flight();
        self.pending_open = None;
        self.sessions.insert_created(summary);
    }

    /// Record a request to open `session_id`. Only the latest open is
    /// applied; the returned generation identifies it.
    pub fn begin_select(&mut self, session_id: &str) -> Result<u64, ClientError> {
        self.session_backed()?;
        self.next_generation += 1;
        let generation = self.next_generation;
        self.pending_open = Some((generation, session_id.to_string()));
        Ok(generation)
    }

    /// Switch to a stored session using its fetched history. Returns false
    /// when a later open superseded this one or the session was deleted.
    pub fn apply_selected(&mut self, generation: u64, session_id: &str, history: Vec<HistoryEntry>) -> bool {
        match &self.pending_open {
            Some((pending, id)) if *pending == generation && id == session_id => {}
            _ => {
                tracing::debug!(generation, session_id, "discarding stale session history");
                return false;
            }
        }
        self.pending_open = None;
        self.invalidate_in_flight();
        self.sessions.open(session_id, history, self.formatter.as_ref());
        true
    }

    /// Forget a failed open. Returns false when it was already superseded.
    pub fn fail_select(&mut self, generation: u64) -> bool {
        if self.pending_open.as_ref().is_some_and(|(pending, _)| *pending == generation) {
            self.pending_open = None;
            return true;
        }
        false
    }

    /// Drop a deleted session. Returns true when it was the open one.
    pub fn apply_deleted(&mut self, session_id: &str) -> bool {
        if self
            .pending_open
            .as_ref()
            .is_some_and(|(_, id)| id == session_id)
        {
            self.pending_open = None;
        }
        let was_active = self.sessions.remove(session_id);
        if was_active {
            self.invalidate_in_flight();
        }
        tracing::info!(session_id, was_active, "session deleted");
        was_active
    }

    /// Request body for a new session owned by the signed-in user
    pub fn create_request(&self) -> Result<CreateSessionRequest, ClientError> {
        self.session_backed()?;
        Ok(CreateSessionRequest {
            user_id: self.auth.user_id.clone(),
            title: PLACEHOLDER_TITLE.to_string(),
        })
    }

    /// Start a fresh local transcript (stateless mode)
    pub fn reset_local(&mut self) {
        self.invalidate_in_flight();
        self.sessions.open_local();
    }

    // ------------------------------------------------------------------
    // Feedback and escalation
    // ------------------------------------------------------------------

    pub fn plan_feedback(&self, position: usize, sentiment: Sentiment) -> Result<FeedbackPlan, ClientError> {
        let session = self
            .active()
            .ok_or_else(|| ClientError::validation("No conversation is open"))?;
        session.feedback.plan(&session.messages, position, sentiment)
    }

    /// Record acknowledged feedback. Ignored if the session changed meanwhile.
    pub fn apply_feedback(&mut self, session_id: Option<&str>, position: usize, sentiment: Sentiment) -> bool {
        let Some(session) = self.sessions.current_session_mut() else {
            return false;
        };
        if session.session_id.as_deref() != session_id {
            return false;
        }
        let stored = session.feedback.confirm(position, sentiment);
        if stored {
            tracing::info!(position, %sentiment, "feedback recorded");
        }
        stored
    }

    /// Most recent bot answer, the default target for feedback commands
    pub fn last_bot_position(&self) -> Option<usize> {
        self.messages()
            .iter()
            .rev()
            .find(|m| m.role == Role::Bot)
            .map(|m| m.position)
    }

    pub fn resolve_escalation(&mut self, choice: EscalationChoice) -> Option<String> {
        self.escalation.resolve(choice).map(str::to_string)
    }

    // ------------------------------------------------------------------
    // Inline async helpers
    // ------------------------------------------------------------------

    /// Ask a question and wait for the answer. Also performs the one-time
    /// rename of a placeholder-titled session.
    pub async fn submit<B>(&mut self, backend: &B, query: &str) -> Result<SubmitOutcome, ClientError>
    where
        B: ChatBackend + ?Sized,
    {
        if self.active().is_none() {
            match self.mode {
                ChatMode::SessionBacked => self.create_session(backend).await?,
                ChatMode::Stateless => self.reset_local(),
            }
        }

        let pending = self.begin_submit(query)?;
        let result = backend.chat(pending.request).await;
        let outcome = self.apply_reply(pending.generation, result);

        if matches!(outcome, SubmitOutcome::Answered { .. }) {
            self.refresh_title(backend).await;
        }
        Ok(outcome)
    }

    /// Generate and persist a title if the active session still has the
    /// placeholder. Failures keep the placeholder.
    pub async fn refresh_title<B>(&mut self, backend: &B) -> Option<String>
    where
        B: ChatBackend + ?Sized,
    {
        let pending = self.begin_title()?;
        let result = generate_and_store_title(backend, &pending).await;
        self.apply_title(&pending.session_id, result)
    }

    pub async fn load_sessions<B>(&mut self, backend: &B) -> Result<(), ClientError>
    where
        B: ChatBackend + ?Sized,
    {
        self.session_backed()?;
        let sessions = backend.list_sessions(&self.auth.user_id).await?;
        self.apply_sessions(sessions);
        Ok(())
    }

    pub async fn create_session<B>(&mut self, backend: &B) -> Result<(), ClientError>
    where
        B: ChatBackend + ?Sized,
    {
        let request = self.create_request()?;
        let summary = backend.create_session(request).await?;
        self.apply_created(summary);
        Ok(())
    }

    pub async fn select_session<B>(&mut self, backend: &B, session_id: &str) -> Result<(), ClientError>
    where
        B: ChatBackend + ?Sized,
    {
        let generation = self.begin_select(session_id)?;
        let history = backend.session_messages(session_id).await?;
        self.apply_selected(generation, session_id, history);
        Ok(())
    }

    pub async fn delete_session<B>(&mut self, backend: &B, session_id: &str) -> Result<bool, ClientError>
    where
        B: ChatBackend + ?Sized,
    {
        self.session_backed()?;
        backend.delete_session(session_id).await?;
        Ok(self.apply_deleted(session_id))
    }

    /// Send feedback, then record it locally once acknowledged
    pub async fn record_feedback<B>(
        &mut self,
        backend: &B,
        position: usize,
        sentiment: Sentiment,
    ) -> Result<(), ClientError>
    where
        B: ChatBackend + ?Sized,
    {
        match self.plan_feedback(position, sentiment)? {
            FeedbackPlan::AlreadyRecorded => Ok(()),
            FeedbackPlan::Send(request) => {
                let session_id = self.active_id().map(str::to_string);
                backend.send_feedback(request).await?;
                self.apply_feedback(session_id.as_deref(), position, sentiment);
                Ok(())
            }
        }
    }
}

/// Ask the backend for a title, clean it up and store it on the session
pub async fn generate_and_store_title<B>(backend: &B, pending: &PendingTitle) -> Result<String, ClientError>
where
    B: ChatBackend + ?Sized,
{
    let raw = backend.generate_title(pending.request.clone()).await?;
    let title = clean_title(&raw).ok_or_else(|| ClientError::decode("Backend returned an empty title"))?;
    backend
        .update_session(&pending.session_id, UpdateSessionRequest { title: title.clone() })
        .await?;
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::testing::{CountingFormatter, FakeBackend, test_config};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn auth() -> AuthContext {
        AuthContext::new("key-1", "user-1", Some("Dana".to_string()))
    }

    fn view(mode: ChatMode) -> ConversationView {
        ConversationView::new(&test_config(mode), auth())
    }

    #[tokio::test]
    async fn test_submit_appends_user_then_bot() {
        let backend = FakeBackend::new();
        backend.push_reply("Use `git status`\n\n- item one\n- item two", true);
        let mut view = view(ChatMode::SessionBacked);

        let outcome = view.submit(&backend, "  what changed?  ").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Answered { position: 1, escalate: false });

        let messages = view.messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].content, "what changed?");
        assert_eq!(messages[1].role, Role::Bot);
        let html = messages[1].html.as_deref().unwrap();
        assert!(html.contains(r#"<code class="bot-inline-code">git status</code>"#));
        assert_eq!(html.matches("<li").count(), 2);

        let request = backend.last_chat().unwrap();
        assert_eq!(request.api_key, "key-1");
        assert_eq!(request.session_id.as_deref(), Some("session-1"));
    }

    #[tokio::test]
    async fn test_formatter_runs_once_per_answer() {
        let backend = FakeBackend::new();
        backend.push_reply("**one**", true);
        backend.push_reply("**two**", true);
        let formatter = CountingFormatter::default();
        let calls = Arc::clone(&formatter.calls);
        let mut view = ConversationView::with_formatter(
            &test_config(ChatMode::Stateless),
            auth(),
            Box::new(formatter),
        );

        view.submit(&backend, "first").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        view.submit(&backend, "second").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        // reading messages back does not reformat
        let _ = view.messages();
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_submit_appends_error_entry() {
        let backend = FakeBackend::new();
        backend.push_chat_error(ClientError::network("connection refused"));
        let mut view = view(ChatMode::Stateless);

        let outcome = view.submit(&backend, "hello").await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Failed(ref e) if e.kind == ErrorKind::Network));
        assert_eq!(view.messages()[1].role, Role::Error);
        assert_eq!(view.messages()[1].content, SUBMIT_ERROR_TEXT);
        assert!(!view.is_loading());
    }

    #[test]
    fn test_second_submit_while_loading_is_rejected() {
        let mut view = view(ChatMode::Stateless);
        let pending = view.begin_submit("first").unwrap();
        assert!(view.is_loading());

        let err = view.begin_submit("second").unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(view.messages().len(), 1);

        let reply = ChatReply { answer: "ok".to_string(), contextual: true };
        assert!(matches!(
            view.apply_reply(pending.generation, Ok(reply)),
            SubmitOutcome::Answered { position: 1, .. }
        ));
    }

    #[test]
    fn test_stale_reply_is_discarded_after_switch() {
        let mut view = view(ChatMode::SessionBacked);
        view.apply_created(SessionSummary { id: "a".to_string(), title: PLACEHOLDER_TITLE.to_string() });
        let pending = view.begin_submit("question for a").unwrap();

        let generation = view.begin_select("b").unwrap();
        assert!(view.apply_selected(generation, "b", Vec::new()));
        let reply = ChatReply { answer: "late".to_string(), contextual: true };
        assert_eq!(view.apply_reply(pending.generation, Ok(reply)), SubmitOutcome::Discarded);
        assert!(view.messages().is_empty());
        assert!(!view.is_loading());
    }

    #[test]
    fn test_latest_open_wins() {
        let mut view = view(ChatMode::SessionBacked);
        let first = view.begin_select("a").unwrap();
        let second = view.begin_select("b").unwrap();

        assert!(view.apply_selected(second, "b", Vec::new()));
        assert!(!view.apply_selected(first, "a", Vec::new()));
        assert_eq!(view.active_id(), Some("b"));
    }

    #[test]
    fn test_open_of_deleted_session_is_dropped() {
        let mut view = view(ChatMode::SessionBacked);
        view.apply_sessions(vec![SessionSummary { id: "a".to_string(), title: "A".to_string() }]);
        let generation = view.begin_select("a").unwrap();

        view.apply_deleted("a");
        assert!(!view.apply_selected(generation, "a", Vec::new()));
        assert_eq!(view.active_id(), None);
    }

    #[test]
    fn test_empty_question_is_rejected() {
        let mut view = view(ChatMode::Stateless);
        assert!(view.begin_submit("   ").is_err());
        assert!(view.messages().is_empty());
    }

    #[tokio::test]
    async fn test_escalation_follows_marker() {
        let backend = FakeBackend::new();
        backend.push_reply("Sorry, NO RELEVANT CONTEXT for that.", false);
        backend.push_reply("Here you go.", true);
        let mut view = view(ChatMode::Stateless);

        let outcome = view.submit(&backend, "obscure").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Answered { position: 1, escalate: true });
        assert!(view.escalation_visible());

        view.submit(&backend, "common").await.unwrap();
        assert!(!view.escalation_visible());
    }

    #[tokio::test]
    async fn test_non_contextual_reply_offers_escalation() {
        let backend = FakeBackend::new();
        backend.push_reply("Maybe try restarting the service.", false);
        let mut view = view(ChatMode::Stateless);

        let outcome = view.submit(&backend, "server is down").await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Answered { position: 1, escalate: true });
        assert!(view.escalation_visible());
    }

    #[tokio::test]
    async fn test_escalation_choices() {
        let backend = FakeBackend::new();
        backend.push_reply("no relevant context", false);
        backend.push_reply("no relevant context", false);
        let mut view = view(ChatMode::Stateless);

        view.submit(&backend, "q1").await.unwrap();
        assert_eq!(view.resolve_escalation(EscalationChoice::No), None);
        assert!(!view.escalation_visible());

        view.submit(&backend, "q2").await.unwrap();
        assert_eq!(
            view.resolve_escalation(EscalationChoice::Yes).as_deref(),
            Some("https://support.example.com/escalate")
        );
        assert!(!view.escalation_visible());
    }

    #[tokio::test]
    async fn test_feedback_is_pessimistic_and_exclusive() {
        let backend = FakeBackend::new();
        backend.push_reply("answer", true);
        let mut view = view(ChatMode::Stateless);
        view.submit(&backend, "question").await.unwrap();

        backend.fail_feedback(true);
        assert!(view.record_feedback(&backend, 1, Sentiment::Positive).await.is_err());
        assert_eq!(view.feedback(1), None);

        backend.fail_feedback(false);
        view.record_feedback(&backend, 1, Sentiment::Positive).await.unwrap();
        assert_eq!(view.feedback(1), Some(Sentiment::Positive));

        let sent = backend.feedback_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].query, "question");
        assert_eq!(sent[0].response, "answer");
        assert_eq!(sent[0].feedback, "Positive");

        let err = view.record_feedback(&backend, 1, Sentiment::Negative).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
        assert_eq!(view.feedback(1), Some(Sentiment::Positive));
        assert_eq!(backend.feedback_sent().len(), 1);
    }

    #[tokio::test]
    async fn test_first_exchange_renames_placeholder_once() {
        let backend = FakeBackend::new();
        backend.set_title("\"Rust Install Help.\"");
        backend.push_reply("answer one", true);
        backend.push_reply("answer two", true);
        let mut view = view(ChatMode::SessionBacked);

        view.submit(&backend, "how do I install rust?").await.unwrap();
        assert_eq!(view.active().unwrap().title, "Rust Install Help");
        assert_eq!(view.sessions()[0].title, "Rust Install Help");
        assert_eq!(
            backend.renamed(),
            vec![("session-1".to_string(), "Rust Install Help".to_string())]
        );

        view.submit(&backend, "and update it?").await.unwrap();
        assert_eq!(backend.title_requests(), 1);
    }

    #[tokio::test]
    async fn test_title_failure_keeps_placeholder() {
        let backend = FakeBackend::new();
        backend.fail_titles(true);
        backend.push_reply("answer", true);
        backend.push_reply("answer", true);
        let mut view = view(ChatMode::SessionBacked);

        view.submit(&backend, "question").await.unwrap();
        assert_eq!(view.active().unwrap().title, PLACEHOLDER_TITLE);

        view.submit(&backend, "again").await.unwrap();
        assert_eq!(backend.title_requests(), 1);
    }

    #[tokio::test]
    async fn test_delete_active_and_inactive_sessions() {
        let backend = FakeBackend::new();
        backend.set_sessions(vec![
            SessionSummary { id: "a".to_string(), title: "A".to_string() },
            SessionSummary { id: "b".to_string(), title: "B".to_string() },
        ]);
        let mut view = view(ChatMode::SessionBacked);
        view.load_sessions(&backend).await.unwrap();
        view.select_session(&backend, "a").await.unwrap();

        assert!(!view.delete_session(&backend, "b").await.unwrap());
        assert_eq!(view.active_id(), Some("a"));

        assert!(view.delete_session(&backend, "a").await.unwrap());
        assert_eq!(view.active_id(), None);
        assert!(view.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_select_loads_history() {
        let backend = FakeBackend::new();
        backend.set_sessions(vec![SessionSummary { id: "a".to_string(), title: "Docker".to_string() }]);
        backend.set_history(
            "a",
            vec![
                HistoryEntry { kind: "user".to_string(), message: "ports?".to_string() },
                HistoryEntry { kind: "bot".to_string(), message: "use -p".to_string() },
            ],
        );
        let mut view = view(ChatMode::SessionBacked);
        view.load_sessions(&backend).await.unwrap();
        view.select_session(&backend, "a").await.unwrap();

        assert_eq!(view.active().unwrap().title, "Docker");
        assert_eq!(view.messages().len(), 2);
        assert_eq!(view.last_bot_position(), Some(1));
    }

    #[tokio::test]
    async fn test_stateless_mode_has_no_sessions() {
        let backend = FakeBackend::new();
        backend.push_reply("hi", true);
        let mut view = view(ChatMode::Stateless);

        assert!(view.load_sessions(&backend).await.is_err());
        assert!(view.create_request().is_err());

        view.submit(&backend, "hello").await.unwrap();
        assert!(backend.last_chat().unwrap().session_id.is_none());
        assert_eq!(backend.title_requests(), 0);
    }
}

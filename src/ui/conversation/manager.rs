use crate::backend::ChatBackend;
use crate::config::{ChatMode, Config};
use crate::error::ClientError;
use crate::escalation::EscalationChoice;
use crate::events::{AppEvent, Sentiment};
use crate::feedback::FeedbackPlan;
use crate::transcript;
use crate::ui::conversation::composer::ConversationResult;
use crate::ui::conversation::history::answer_positions;
use crate::ui::conversation::{
    ConversationComposer, ConversationHistory, ParsedCommand, SessionSidebar, SlashCommand,
    get_help_text,
};
use crate::view::{ConversationView, SubmitOutcome, generate_and_store_title};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Actions that can be requested by the conversation manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConversationAction {
    None,
    Exit,
    SignOut,
}

/// One-line message shown under the header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub text: String,
    pub is_error: bool,
}

/// Drives the chat screen: routes keys and commands to the view, runs
/// backend calls on background tasks and folds their results back in.
pub struct ConversationManager {
    view: ConversationView,
    backend: Arc<dyn ChatBackend>,
    events: mpsc::UnboundedSender<AppEvent>,
    composer: ConversationComposer,
    status: Option<Status>,
    notice: Option<String>,
    pending_question: Option<String>,
    creating_session: bool,
    loading_sessions: bool,
    show_sidebar: bool,
    history_limit: usize,
    scroll_offset: usize,
    export_dir: PathBuf,
}

impl ConversationManager {
    pub fn new(
        config: &Config,
        view: ConversationView,
        backend: Arc<dyn ChatBackend>,
        events: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        let mut composer = ConversationComposer::new("Ask a question about open-source software...");
        composer.set_focus(true);

        Self {
            show_sidebar: config.ui.show_sidebar && view.mode() == ChatMode::SessionBacked,
            view,
            backend,
            events,
            composer,
            status: None,
            notice: None,
            pending_question: None,
            creating_session: false,
            loading_sessions: false,
            history_limit: config.ui.history_limit,
            scroll_offset: 0,
            export_dir: config.home.clone(),
        }
    }

    pub fn view(&self) -> &ConversationView {
        &self.view
    }

    pub fn status(&self) -> Option<&Status> {
        self.status.as_ref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Kick off the initial session list fetch
    pub fn start(&mut self) {
        if self.view.mode() == ChatMode::SessionBacked {
            self.refresh_sessions();
        }
    }

    fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(Status { text: text.into(), is_error: false });
    }

    fn set_error(&mut self, context: &str, error: &ClientError) {
        self.status = Some(Status {
            text: format!("{context}: {}", error.message),
            is_error: true,
        });
    }

    /// Run a backend call in the background and deliver its event
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = AppEvent> + Send + 'static,
    {
        let events = self.events.clone();
        tokio::spawn(async move {
            let event = task.await;
            if events.send(event).is_err() {
                tracing::debug!("event loop closed before task finished");
            }
        });
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if self.notice.is_some() && key.code == KeyCode::Esc {
            self.notice = None;
            return ConversationAction::None;
        }

        match key.code {
            KeyCode::PageUp => {
                self.scroll_offset = self.scroll_offset.saturating_add(5);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.scroll_offset = self.scroll_offset.saturating_sub(5);
                return ConversationAction::None;
            }
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return ConversationAction::Exit;
            }
            _ => {}
        }

        match self.composer.handle_key(key) {
            ConversationResult::Submitted(input) => {
                self.submit_input(input);
                ConversationAction::None
            }
            ConversationResult::Command(command) => self.run_command(command),
            ConversationResult::None => ConversationAction::None,
        }
    }

    /// Submit a question, creating a backend session first when none is open
    pub fn submit_input(&mut self, input: String) {
        let question = input.trim().to_string();
        if question.is_empty() {
            return;
        }
        self.notice = None;
        self.scroll_offset = 0;

        if self.view.active().is_none() {
            match self.view.mode() {
                ChatMode::SessionBacked => {
                    if self.pending_question.is_some() {
                        self.set_status("Still opening a conversation...");
                        return;
                    }
                    self.pending_question = Some(question);
                    self.create_session();
                    return;
                }
                ChatMode::Stateless => self.view.reset_local(),
            }
        }

        match self.view.begin_submit(&question) {
            Ok(pending) => {
                self.status = None;
                let backend = Arc::clone(&self.backend);
                self.spawn(async move {
                    AppEvent::Reply {
                        generation: pending.generation,
                        result: backend.chat(pending.request).await,
                    }
                });
            }
            Err(e) => self.set_error("Cannot send", &e),
        }
        self.composer.set_waiting(self.view.is_loading());
    }

    /// Handle slash commands
    pub fn run_command(&mut self, command: ParsedCommand) -> ConversationAction {
        if self.view.is_loading() && !command.command.available_while_loading() {
            self.set_status("Wait for the current answer first");
            return ConversationAction::None;
        }

        match command.command {
            SlashCommand::New => {
                match self.view.mode() {
                    ChatMode::SessionBacked => self.create_session(),
                    ChatMode::Stateless => {
                        self.view.reset_local();
                        self.set_status("Started a new conversation");
                    }
                }
                self.composer.set_waiting(self.view.is_loading());
            }
            SlashCommand::Sessions => self.refresh_sessions(),
            SlashCommand::Open => self.open_session(&command),
            SlashCommand::Delete => self.delete_session(&command),
            SlashCommand::Good | SlashCommand::Bad => {
                if let Some(sentiment) = command.sentiment() {
                    self.send_feedback(&command, sentiment);
                }
            }
            SlashCommand::Yes | SlashCommand::No => {
                if let Some(choice) = command.escalation_choice() {
                    self.escalate(choice);
                }
            }
            SlashCommand::Export => self.export(&command),
            SlashCommand::Signout => return ConversationAction::SignOut,
            SlashCommand::Help => self.notice = Some(get_help_text()),
            SlashCommand::Bye => return ConversationAction::Exit,
        }

        ConversationAction::None
    }

    fn refresh_sessions(&mut self) {
        if self.view.mode() != ChatMode::SessionBacked {
            self.set_status("Sessions are not available in stateless mode");
            return;
        }
        self.loading_sessions = true;
        let backend = Arc::clone(&self.backend);
        let user_id = self.view.auth().user_id.clone();
        self.spawn(async move { AppEvent::SessionsLoaded(backend.list_sessions(&user_id).await) });
    }

    fn create_session(&mut self) {
        if self.creating_session {
            return;
        }
        match self.view.create_request() {
            Ok(request) => {
                self.creating_session = true;
                let backend = Arc::clone(&self.backend);
                self.spawn(async move { AppEvent::SessionCreated(backend.create_session(request).await) });
            }
            Err(e) => {
                self.pending_question = None;
                self.set_error("Cannot start a conversation", &e);
            }
        }
    }

    fn open_session(&mut self, command: &ParsedCommand) {
        let Some(index) = command.index() else {
            self.set_status("Usage: /open <n>");
            return;
        };
        let Some(session) = self.view.sessions().get(index - 1) else {
            self.set_status(format!("There is no conversation #{index}"));
            return;
        };

        let session_id = session.id.clone();
        let opening = format!("Opening {}...", session.title);
        let generation = match self.view.begin_select(&session_id) {
            Ok(generation) => generation,
            Err(e) => {
                self.set_error("Cannot open conversation", &e);
                return;
            }
        };
        let backend = Arc::clone(&self.backend);
        self.set_status(opening);
        self.spawn(async move {
            let result = backend.session_messages(&session_id).await;
            AppEvent::MessagesLoaded { generation, session_id, result }
        });
    }

    fn delete_session(&mut self, command: &ParsedCommand) {
        let target = match command.index() {
            Some(index) => self.view.sessions().get(index - 1).map(|s| s.id.clone()),
            None if command.argument().is_some() => None,
            None => self.view.active_id().map(str::to_string),
        };
        let Some(session_id) = target else {
            self.set_status("Nothing to delete. Usage: /delete [n]");
            return;
        };

        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = backend.delete_session(&session_id).await;
            AppEvent::SessionDeleted { session_id, result }
        });
    }

    fn send_feedback(&mut self, command: &ParsedCommand, sentiment: Sentiment) {
        let position = match command.index() {
            Some(n) => answer_positions(self.view.messages()).get(n - 1).copied(),
            None => self.view.last_bot_position(),
        };
        let Some(position) = position else {
            self.set_status("No answer to rate");
            return;
        };

        match self.view.plan_feedback(position, sentiment) {
            Ok(FeedbackPlan::AlreadyRecorded) => {
                self.set_status(format!("Already marked {sentiment}"));
            }
            Ok(FeedbackPlan::Send(request)) => {
                let session_id = self.view.active_id().map(str::to_string);
                let backend = Arc::clone(&self.backend);
                self.spawn(async move {
                    AppEvent::FeedbackRecorded {
                        session_id,
                        position,
                        sentiment,
                        result: backend.send_feedback(request).await,
                    }
                });
            }
            Err(e) => self.set_error("Cannot send feedback", &e),
        }
    }

    fn escalate(&mut self, choice: EscalationChoice) {
        if !self.view.escalation_visible() {
            self.set_status("Nothing to escalate");
            return;
        }
        match self.view.resolve_escalation(choice) {
            Some(url) => self.set_status(format!("Raise your issue at {url}")),
            None => self.set_status("Okay, glad to keep helping here"),
        }
    }

    fn export(&mut self, command: &ParsedCommand) {
        let Some(session) = self.view.active() else {
            self.set_status("No conversation to export");
            return;
        };

        let path = match command.argument() {
            Some(path) => PathBuf::from(path),
            None => {
                let name = session
                    .session_id
                    .clone()
                    .unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
                self.export_dir.join(format!("transcript-{name}.html"))
            }
        };

        match transcript::export(session, &path) {
            Ok(()) => self.set_status(format!("Saved {}", path.display())),
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                self.status = Some(Status { text: format!("Export failed: {e}"), is_error: true });
            }
        }
    }

    /// Fold a background result into the view
    pub fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Reply { generation, result } => {
                match self.view.apply_reply(generation, result) {
                    SubmitOutcome::Answered { .. } => {
                        self.scroll_offset = 0;
                        self.request_title();
                    }
                    SubmitOutcome::Failed(e) => self.set_error("Request failed", &e),
                    SubmitOutcome::Discarded => {}
                }
            }
            AppEvent::SessionsLoaded(result) => {
                self.loading_sessions = false;
                match result {
                    Ok(sessions) => self.view.apply_sessions(sessions),
                    Err(e) => self.set_error("Could not load conversations", &e),
                }
            }
            AppEvent::MessagesLoaded { generation, session_id, result } => match result {
                Ok(history) => {
                    if self.view.apply_selected(generation, &session_id, history) {
                        self.scroll_offset = 0;
                        self.status = None;
                    }
                }
                Err(e) => {
                    if self.view.fail_select(generation) {
                        self.set_error("Could not open conversation", &e);
                    }
                }
            },
            AppEvent::SessionCreated(result) => {
                self.creating_session = false;
                match result {
                    Ok(summary) => {
                        self.view.apply_created(summary);
                        self.scroll_offset = 0;
                        if let Some(question) = self.pending_question.take() {
                            self.submit_input(question);
                        }
                    }
                    Err(e) => {
                        if let Some(question) = self.pending_question.take() {
                            tracing::warn!(%question, "dropping question after session creation failed");
                        }
                        self.set_error("Could not start a conversation", &e);
                    }
                }
            }
            AppEvent::SessionDeleted { session_id, result } => match result {
                Ok(()) => {
                    self.view.apply_deleted(&session_id);
                    self.set_status("Conversation deleted");
                }
                Err(e) => self.set_error("Could not delete conversation", &e),
            },
            AppEvent::FeedbackRecorded { session_id, position, sentiment, result } => match result {
                Ok(()) => {
                    if self.view.apply_feedback(session_id.as_deref(), position, sentiment) {
                        self.set_status("Thanks for the feedback");
                    }
                }
                Err(e) => self.set_error("Feedback was not recorded", &e),
            },
            AppEvent::SessionRenamed { session_id, result } => {
                self.view.apply_title(&session_id, result);
            }
        }

        self.composer.set_waiting(self.view.is_loading());
    }

    fn request_title(&mut self) {
        let Some(pending) = self.view.begin_title() else {
            return;
        };
        let backend = Arc::clone(&self.backend);
        self.spawn(async move {
            let result = generate_and_store_title(backend.as_ref(), &pending).await;
            AppEvent::SessionRenamed { session_id: pending.session_id, result }
        });
    }

    /// Render the conversation UI components
    pub fn render(&self, area: Rect, buf: &mut Buffer) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Header
                Constraint::Min(5),    // Body
                Constraint::Length(5), // Composer
            ])
            .split(area);

        self.render_header(rows[0], buf);

        let body = if self.show_sidebar {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Length(30), Constraint::Min(20)])
                .split(rows[1]);
            SessionSidebar {
                sessions: self.view.sessions(),
                active_id: self.view.active_id(),
                loading: self.loading_sessions,
            }
            .render(columns[0], buf);
            columns[1]
        } else {
            rows[1]
        };

        let active = self.view.active();
        ConversationHistory {
            title: active.map(|s| s.title.as_str()).unwrap_or("No conversation open"),
            messages: self.view.messages(),
            feedback: active.map(|s| &s.feedback),
            loading: self.view.is_loading(),
            escalation: self.view.escalation_visible(),
            greeting: self.view.auth().greeting_name(),
            max_messages: self.history_limit,
            scroll_offset: self.scroll_offset,
        }
        .render(body, buf);

        if let Some(notice) = &self.notice {
            render_notice(notice, body, buf);
        }

        self.composer.clone().render(rows[2], buf);
    }

    fn render_header(&self, area: Rect, buf: &mut Buffer) {
        let mode = match self.view.mode() {
            ChatMode::SessionBacked => "sessions",
            ChatMode::Stateless => "stateless",
        };
        let mut spans = vec![
            Span::styled(
                format!(" Support Desk | {} ", self.view.auth().greeting_name()),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("[{mode}] "), Style::default().fg(Color::DarkGray)),
        ];
        if let Some(status) = &self.status {
            let color = if status.is_error { Color::Red } else { Color::Yellow };
            spans.push(Span::styled(status.text.clone(), Style::default().fg(color)));
        }
        buf.set_line(area.x, area.y, &Line::from(spans), area.width);
    }
}

fn render_notice(text: &str, area: Rect, buf: &mut Buffer) {
    let width = area.width.saturating_sub(4).min(80);
    let height = (text.lines().count() as u16 + 2).min(area.height);
    let popup = Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    };

    Clear.render(popup, buf);
    Paragraph::new(text.to_string())
        .wrap(Wrap { trim: false })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Help (Esc to close)")
                .border_style(Style::default().fg(Color::Cyan)),
        )
        .render(popup, buf);
}

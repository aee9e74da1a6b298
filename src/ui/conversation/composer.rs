use crate::ui::conversation::commands::{CommandEntry, ParsedCommand, command_entries, parse_slash_command};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::cell::{Cell, RefCell};

/// Result returned when the user interacts with the conversation composer
#[derive(Debug, PartialEq)]
pub enum ConversationResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// State for the text area within the composer
#[derive(Debug, Clone, Default)]
pub struct TextAreaState {
    pub content: String,
    /// Byte offset, always on a char boundary
    pub cursor_position: usize,
}

/// Conversation composer for user input
#[derive(Clone)]
pub struct ConversationComposer {
    state: RefCell<TextAreaState>,
    placeholder: String,
    has_focus: bool,
    waiting: bool,
    command_entries: Vec<CommandEntry>,
    filtered_commands: RefCell<Vec<CommandEntry>>,
    show_command_palette: Cell<bool>,
    selected_command: Cell<Option<usize>>,
}

impl ConversationComposer {
    pub fn new(placeholder: impl Into<String>) -> Self {
        Self {
            state: RefCell::new(TextAreaState::default()),
            placeholder: placeholder.into(),
            has_focus: false,
            waiting: false,
            command_entries: command_entries(),
            filtered_commands: RefCell::new(Vec::new()),
            show_command_palette: Cell::new(false),
            selected_command: Cell::new(None),
        }
    }

    /// Handle key input
    pub fn handle_key(&self, key: KeyEvent) -> ConversationResult {
        if key.kind != KeyEventKind::Press {
            return ConversationResult::None;
        }

        let mut state = self.state.borrow_mut();

        match key.code {
            KeyCode::Enter => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.insert_char(&mut state, '\n');
                } else if self.show_command_palette.get() {
                    if self.apply_selected_command(&mut state) {
                        return ConversationResult::None;
                    }
                } else if !state.content.trim().is_empty() {
                    let content = std::mem::take(&mut state.content);
                    if let Some(command) = parse_slash_command(&content) {
                        state.cursor_position = 0;
                        drop(state);
                        self.close_command_palette();
                        return ConversationResult::Command(command);
                    }
                    if self.waiting {
                        // keep the draft until the pending answer arrives
                        state.content = content;
                        return ConversationResult::None;
                    }
                    state.cursor_position = 0;
                    drop(state);
                    self.close_command_palette();
                    return ConversationResult::Submitted(content);
                }
            }
            KeyCode::Up => {
                if self.show_command_palette.get() {
                    self.move_command_selection(-1);
                    return ConversationResult::None;
                }
            }
            KeyCode::Down => {
                if self.show_command_palette.get() {
                    self.move_command_selection(1);
                    return ConversationResult::None;
                }
            }
            KeyCode::Esc => {
                if self.show_command_palette.get() {
                    self.close_command_palette();
                    return ConversationResult::None;
                }
            }
            KeyCode::Tab => {
                if self.show_command_palette.get() && self.apply_selected_command(&mut state) {
                    return ConversationResult::None;
                }
            }
            KeyCode::Char(c) => {
                if c == '/' && state.content.is_empty() {
                    self.insert_char(&mut state, c);
                    self.open_command_palette(&state);
                    return ConversationResult::None;
                }

                self.insert_char(&mut state, c);

                if self.show_command_palette.get() {
                    if state.content.starts_with('/') && !c.is_whitespace() {
                        self.refresh_command_palette(&state);
                    } else {
                        self.close_command_palette();
                    }
                }
            }
            KeyCode::Backspace => {
                if self.backspace(&mut state) && self.show_command_palette.get() {
                    self.refresh_or_close(&state);
                }
            }
            KeyCode::Delete => {
                if self.delete(&mut state) && self.show_command_palette.get() {
                    self.refresh_or_close(&state);
                }
            }
            KeyCode::Left => {
                if let Some((index, _)) = state.content[..state.cursor_position].char_indices().next_back() {
                    state.cursor_position = index;
                }
            }
            KeyCode::Right => {
                if let Some(c) = state.content[state.cursor_position..].chars().next() {
                    state.cursor_position += c.len_utf8();
                }
            }
            KeyCode::Home => {
                state.cursor_position = 0;
            }
            KeyCode::End => {
                state.cursor_position = state.content.len();
            }
            _ => {}
        }

        ConversationResult::None
    }

    /// Insert a character at the cursor position
    fn insert_char(&self, state: &mut TextAreaState, c: char) {
        state.content.insert(state.cursor_position, c);
        state.cursor_position += c.len_utf8();
    }

    /// Delete character before cursor
    fn backspace(&self, state: &mut TextAreaState) -> bool {
        match state.content[..state.cursor_position].char_indices().next_back() {
            Some((index, _)) => {
                state.content.remove(index);
                state.cursor_position = index;
                true
            }
            None => false,
        }
    }

    /// Delete character at cursor
    fn delete(&self, state: &mut TextAreaState) -> bool {
        if state.cursor_position < state.content.len() {
            state.content.remove(state.cursor_position);
            true
        } else {
            false
        }
    }

    fn refresh_or_close(&self, state: &TextAreaState) {
        if state.content.starts_with('/') {
            self.refresh_command_palette(state);
        } else {
            self.close_command_palette();
        }
    }

    fn open_command_palette(&self, state: &TextAreaState) {
        self.show_command_palette.set(true);
        self.refresh_command_palette(state);
        self.selected_command.set(Some(0));
    }

    fn close_command_palette(&self) {
        self.show_command_palette.set(false);
        self.filtered_commands.borrow_mut().clear();
        self.selected_command.set(None);
    }

    fn refresh_command_palette(&self, state: &TextAreaState) {
        let query = state.content.trim_start_matches('/').to_lowercase();
        let mut filtered = self.filtered_commands.borrow_mut();
        filtered.clear();

        for entry in &self.command_entries {
            if query.is_empty() || entry.keyword.starts_with(&query) {
                filtered.push(*entry);
            }
        }

        if filtered.is_empty() {
            self.selected_command.set(None);
        } else {
            let index = self.selected_command.get().unwrap_or(0);
            let clamped = index.min(filtered.len() - 1);
            self.selected_command.set(Some(clamped));
        }
    }

    fn move_command_selection(&self, delta: isize) {
        let filtered = self.filtered_commands.borrow();
        if filtered.is_empty() {
            self.selected_command.set(None);
            return;
        }

        let current = self.selected_command.get().unwrap_or(0) as isize;
        let len = filtered.len() as isize;
        let next = (current + delta).rem_euclid(len);

        self.selected_command.set(Some(next as usize));
    }

    fn apply_selected_command(&self, state: &mut TextAreaState) -> bool {
        let filtered = self.filtered_commands.borrow();
        let Some(index) = self.selected_command.get() else {
            return false;
        };

        let Some(entry) = filtered.get(index).copied() else {
            return false;
        };

        state.content = format!("/{} ", entry.keyword);
        state.cursor_position = state.content.len();
        drop(filtered);
        self.close_command_palette();
        true
    }

    /// Set focus state
    pub fn set_focus(&mut self, has_focus: bool) {
        self.has_focus = has_focus;
    }

    /// Questions are held back while an answer is pending; commands still run
    pub fn set_waiting(&mut self, waiting: bool) {
        self.waiting = waiting;
    }

    /// Get current content
    pub fn get_content(&self) -> String {
        self.state.borrow().content.clone()
    }

    /// Clear content
    pub fn clear(&self) {
        let mut state = self.state.borrow_mut();
        state.content.clear();
        state.cursor_position = 0;
    }

    fn title(&self) -> &'static str {
        if self.waiting {
            "⏳ Waiting for the answer... (commands still work)"
        } else {
            "💬 Ask a question - Enter to send, Shift+Enter for new line, / for commands"
        }
    }
}

impl Widget for ConversationComposer {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let state = self.state.borrow();

        let block = Block::default()
            .borders(Borders::ALL)
            .title(self.title())
            .style(if self.has_focus && !self.waiting {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if state.content.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder.as_str(),
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
        } else {
            let mut content = state.content.clone();
            if self.has_focus {
                content.insert(state.cursor_position.min(content.len()), '▌');
            }

            // keep the cursor line visible when the draft is taller than the box
            let lines: Vec<&str> = content.split('\n').collect();
            let height = inner_area.height as usize;
            let start = lines.len().saturating_sub(height);
            for (i, line_text) in lines[start..].iter().enumerate() {
                let line = Line::from(vec![Span::raw(*line_text)]);
                buf.set_line(inner_area.x, inner_area.y + i as u16, &line, inner_area.width);
            }
        }

        if self.show_command_palette.get() {
            let filtered = self.filtered_commands.borrow();
            let palette_height = (filtered.len().min(6) + 2) as u16;
            let palette_area = Rect {
                x: inner_area.x,
                y: area.y.saturating_sub(palette_height),
                width: inner_area.width,
                height: palette_height.min(area.y),
            };
            if palette_area.height < 3 {
                return;
            }

            let block = Block::default()
                .borders(Borders::ALL)
                .title("Commands")
                .style(Style::default().fg(Color::Blue));
            let inner = block.inner(palette_area);
            block.render(palette_area, buf);

            let selected = self.selected_command.get();
            let skip = selected
                .unwrap_or(0)
                .saturating_sub(inner.height.saturating_sub(1) as usize);
            for (row, (index, entry)) in filtered.iter().enumerate().skip(skip).enumerate() {
                if row >= inner.height as usize {
                    break;
                }

                let style = if selected == Some(index) {
                    Style::default().fg(Color::Black).bg(Color::Cyan).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };

                let line = Line::from(vec![
                    Span::styled(format!("/{}", entry.keyword), style),
                    Span::styled(" - ", Style::default().fg(Color::DarkGray)),
                    Span::styled(entry.description, Style::default().fg(Color::Gray)),
                ]);

                buf.set_line(inner.x, inner.y + row as u16, &line, inner.width);
            }
        }
    }
}

//! Conversation history display component

use crate::events::{Message, Role, Sentiment};
use crate::feedback::FeedbackTracker;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Positions of bot answers, in order. Answer `n` on screen is entry `n - 1`.
pub fn answer_positions(messages: &[Message]) -> Vec<usize> {
    messages
        .iter()
        .filter(|m| m.role == Role::Bot)
        .map(|m| m.position)
        .collect()
}

/// Snapshot of the open conversation, rendered bottom-aligned
pub struct ConversationHistory<'a> {
    pub title: &'a str,
    pub messages: &'a [Message],
    pub feedback: Option<&'a FeedbackTracker>,
    pub loading: bool,
    pub escalation: bool,
    pub greeting: &'a str,
    pub max_messages: usize,
    pub scroll_offset: usize,
}

impl Widget for ConversationHistory<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("💬 {}", self.title));

        let inner_area = block.inner(area);
        block.render(area, buf);

        let mut all_lines: Vec<Line> = Vec::new();

        if self.messages.is_empty() && !self.loading {
            all_lines.extend(self.welcome_lines());
        } else {
            let start = self.messages.len().saturating_sub(self.max_messages);
            let mut answer_number = answer_positions(&self.messages[..start]).len();
            for message in &self.messages[start..] {
                if message.role == Role::Bot {
                    answer_number += 1;
                }
                all_lines.append(&mut self.render_message(message, answer_number, inner_area.width));
                all_lines.push(Line::from(""));
            }

            if self.loading {
                all_lines.push(Line::from(vec![
                    Span::styled("🤖 Bot: ", Style::default().fg(Color::Green)),
                    Span::styled("Thinking...", Style::default().fg(Color::Yellow)),
                ]));
            }

            if self.escalation {
                all_lines.push(Line::from(vec![Span::styled(
                    "Would you like to raise this issue for further assistance? /yes or /no",
                    Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
                )]));
            }
        }

        // show the bottom of the conversation, shifted up by the scroll offset
        let height = inner_area.height as usize;
        let total = all_lines.len();
        let end = total.saturating_sub(self.scroll_offset.min(total.saturating_sub(height)));
        let start = end.saturating_sub(height);

        for (i, line) in all_lines[start..end].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

impl ConversationHistory<'_> {
    fn welcome_lines(&self) -> Vec<Line<'static>> {
        vec![
            Line::from(vec![Span::styled(
                format!("Welcome, {}! 👋", self.greeting),
                Style::default().fg(Color::Green),
            )]),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Please feel free to ask about any aspect of open-source software.",
                Style::default().fg(Color::Gray),
            )]),
            Line::from(""),
            Line::from(vec![Span::styled(
                "Press Enter to send, Shift+Enter for new line, /help for commands.",
                Style::default().fg(Color::DarkGray),
            )]),
        ]
    }

    /// Render a single message into lines
    fn render_message(&self, message: &Message, answer_number: usize, width: u16) -> Vec<Line<'static>> {
        let mut lines = Vec::new();

        let role_icon = match message.role {
            Role::User => "👤",
            Role::Bot => "🤖",
            Role::Error => "⚠️",
        };
        let timestamp = message.timestamp.format("%H:%M").to_string();

        let mut header = vec![Span::styled(
            format!("{} {} {}", role_icon, message.role.label(), timestamp),
            Style::default().fg(Color::DarkGray),
        )];
        if message.role == Role::Bot {
            header.push(Span::styled(
                format!("  #{answer_number}"),
                Style::default().fg(Color::DarkGray),
            ));
            match self.feedback.and_then(|f| f.get(message.position)) {
                Some(Sentiment::Positive) => {
                    header.push(Span::styled("  👍", Style::default().fg(Color::Green)))
                }
                Some(Sentiment::Negative) => {
                    header.push(Span::styled("  👎", Style::default().fg(Color::Red)))
                }
                None => {}
            }
        }
        lines.push(Line::from(header));

        let content_width = width.saturating_sub(2) as usize;
        let mut in_code = false;
        for raw_line in message.content.lines() {
            if raw_line.trim_start().starts_with("```") {
                in_code = !in_code;
                continue;
            }

            let style = self.get_content_style(message.role, raw_line, in_code);
            let wrapped = if in_code {
                vec![raw_line.to_string()]
            } else {
                wrap_text(raw_line, content_width)
            };
            for content_line in wrapped {
                lines.push(Line::from(vec![
                    Span::raw("  "),
                    Span::styled(content_line, style),
                ]));
            }
        }

        lines
    }

    /// Get content style based on role
    fn get_content_style(&self, role: Role, line: &str, in_code: bool) -> Style {
        match role {
            Role::User => Style::default().fg(Color::Blue),
            Role::Error => Style::default().fg(Color::Red),
            Role::Bot if in_code => Style::default().fg(Color::Cyan),
            Role::Bot if line.trim_start().starts_with('#') => {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            }
            Role::Bot => Style::default().fg(Color::Green),
        }
    }
}

/// Wrap one line of text to fit within the given width
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        let current_len = current_line.chars().count();
        let word_len = word.chars().count();
        if current_len + word_len + 1 <= width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !current_line.is_empty() {
                lines.push(std::mem::take(&mut current_line));
            }
            current_line.push_str(word);
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

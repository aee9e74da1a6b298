//! Session list shown beside the conversation

use crate::events::SessionSummary;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

pub struct SessionSidebar<'a> {
    pub sessions: &'a [SessionSummary],
    pub active_id: Option<&'a str>,
    pub loading: bool,
}

impl Widget for SessionSidebar<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("🗂 Chats");
        let inner = block.inner(area);
        block.render(area, buf);

        if self.sessions.is_empty() {
            let hint = if self.loading { "Loading..." } else { "No chats yet. /new" };
            buf.set_line(
                inner.x,
                inner.y,
                &Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
                inner.width,
            );
            return;
        }

        let width = inner.width as usize;
        for (row, (index, session)) in self
            .sessions
            .iter()
            .enumerate()
            .take(inner.height as usize)
            .enumerate()
        {
            let active = self.active_id == Some(session.id.as_str());
            let style = if active {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if active { "▶" } else { " " };
            let text = truncate(&format!("{marker}{:>2}. {}", index + 1, session.title), width);

            buf.set_line(
                inner.x,
                inner.y + row as u16,
                &Line::from(Span::styled(text, style)),
                inner.width,
            );
        }
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }

    #[test]
    fn test_marks_active_session() {
        let sessions = vec![
            SessionSummary { id: "a".to_string(), title: "Docker ports".to_string() },
            SessionSummary { id: "b".to_string(), title: "Git rebase".to_string() },
        ];
        let area = Rect::new(0, 0, 30, 6);
        let mut buf = Buffer::empty(area);
        SessionSidebar { sessions: &sessions, active_id: Some("b"), loading: false }.render(area, &mut buf);

        let row = |y: u16| -> String { (0..30).map(|x| buf.get(x, y).symbol().to_string()).collect() };
        assert!(row(1).contains(" 1. Docker ports"));
        assert!(row(2).contains("▶ 2. Git rebase"));
    }
}

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

use crate::events::{Message, Role, Sentiment};
use crate::session::ActiveSession;

const STYLE: &str = "body{font-family:sans-serif;max-width:48rem;margin:2rem auto}\
.chat-message{margin:1rem 0}.user .content{white-space:pre-wrap}\
.error{color:#a00}.feedback{color:#666;font-size:.85em}\
pre{background:#f4f4f4;padding:.75rem;overflow-x:auto}";

/// Render a conversation as a standalone HTML page. User text is escaped;
/// bot messages use their formatted HTML.
pub fn render_html(session: &ActiveSession) -> String {
    let title = html_escape::encode_text(&session.title);
    let mut page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<h1>{title}</h1>\n"
    );

    for message in &session.messages {
        page.push_str(&render_message(message, session.feedback.get(message.position)));
    }

    page.push_str("</body>\n</html>\n");
    page
}

fn render_message(message: &Message, feedback: Option<Sentiment>) -> String {
    let class = match message.role {
        Role::User => "user",
        Role::Bot => "bot",
        Role::Error => "error",
    };
    let body = match (&message.role, &message.html) {
        (Role::Bot, Some(html)) => html.clone(),
        _ => html_escape::encode_text(&message.content).into_owned(),
    };
    let feedback = feedback
        .map(|s| format!("<div class=\"feedback\">Feedback: {s}</div>"))
        .unwrap_or_default();

    format!(
        "<div class=\"chat-message {class}\"><strong>{}:</strong> <div class=\"content\">{body}</div>{feedback}</div>\n",
        message.role.label()
    )
}

/// Write the transcript of a conversation to `path`
pub fn export(session: &ActiveSession, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).context("Failed to create export directory")?;
        }
    }
    fs::write(path, render_html(session)).context("Failed to write transcript")?;
    tracing::info!(path = %path.display(), messages = session.messages.len(), "transcript exported");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::HtmlFormatter;

    fn session() -> ActiveSession {
        let mut session = ActiveSession::local();
        session.push_user("<b>why</b>?".to_string());
        session.push_bot("**because**".to_string(), &HtmlFormatter);
        session.feedback.confirm(1, Sentiment::Positive);
        session
    }

    #[test]
    fn test_render_escapes_user_and_keeps_bot_html() {
        let html = render_html(&session());

        assert!(html.contains("&lt;b&gt;why&lt;/b&gt;?"));
        assert!(html.contains("<strong>because</strong>"));
        assert!(html.contains("Feedback: Positive"));
        assert!(html.contains("<title>Conversation</title>"));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("chat.html");
        export(&session(), &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("<!DOCTYPE html>"));
    }
}

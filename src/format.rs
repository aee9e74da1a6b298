//! Bot response formatting
//!
//! Turns the markdown-like text returned by the backend into a small HTML
//! subset. The raw text is escaped before any pass runs, so the only tags in
//! the output are the ones emitted here.
//!
//! Pass order matters: fenced code blocks are pulled out first and replaced by
//! placeholder lines, so the header, bold, list and inline-code passes and the
//! newline-to-`<br>` conversion never see code content. Formatting is not
//! idempotent; apply it once per raw response.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Marks a placeholder line standing in for an extracted code block
const PLACEHOLDER: char = '\u{E000}';

static FENCED_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"```([\w+#.-]+)?[ \t]*\n((?s:.*?))```").expect("valid regex"));
static HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*#{1,6}[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("valid regex"));
static BOLD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("valid regex"));
static BULLET_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*[-*+][ \t]+(.+)$").expect("valid regex"));
static NUMBERED_ITEM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d+[.)][ \t]+(.+)$").expect("valid regex"));
static INLINE_CODE: Lazy<Regex> = Lazy::new(|| Regex::new(r"`([^`\n]+)`").expect("valid regex"));
static BLANK_LINES: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t]*\n").expect("valid regex"));

/// Converts raw bot text into display HTML
pub trait ResponseFormatter: Send + Sync {
    fn format(&self, raw: &str) -> String;
}

/// The standard markdown-subset to HTML formatter
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlFormatter;

impl ResponseFormatter for HtmlFormatter {
    fn format(&self, raw: &str) -> String {
        format_response(raw)
    }
}

/// Format a raw bot answer as HTML
pub fn format_response(raw: &str) -> String {
    let cleaned: String = raw
        .replace("\r\n", "\n")
        .chars()
        .filter(|c| *c != PLACEHOLDER)
        .collect();
    if cleaned.trim().is_empty() {
        return String::new();
    }

    let escaped = html_escape::encode_text(&cleaned).into_owned();
    let (text, code_blocks) = extract_code_blocks(&escaped);

    let text = HEADER.replace_all(&text, r#"<h3 class="bot-header">$1</h3>"#);
    let text = BOLD.replace_all(&text, "<strong>$1</strong>");
    let text = BULLET_ITEM.replace_all(&text, r#"<li class="bot-list-item">$1</li>"#);
    let text = NUMBERED_ITEM.replace_all(&text, r#"<li class="bot-list-item">$1</li>"#);
    let text = INLINE_CODE.replace_all(&text, r#"<code class="bot-inline-code">$1</code>"#);

    let mut html = String::new();
    for block in BLANK_LINES.split(text.trim()) {
        render_block(block, &code_blocks, &mut html);
    }
    html
}

/// Replace every complete fence with a placeholder line and return the
/// rendered `<pre>` blocks by index. Unterminated fences are left as text.
fn extract_code_blocks(text: &str) -> (String, Vec<String>) {
    let mut blocks = Vec::new();
    let replaced = FENCED_CODE.replace_all(text, |caps: &Captures| {
        let code = caps.get(2).map_or("", |m| m.as_str()).trim_matches('\n');
        let code = code.trim_end();
        let rendered = match caps.get(1) {
            Some(lang) => format!(
                r#"<pre><code class="bot-code language-{}">{}</code></pre>"#,
                lang.as_str(),
                code
            ),
            None => format!(r#"<pre><code class="bot-code">{code}</code></pre>"#),
        };
        blocks.push(rendered);
        format!("\n\n{PLACEHOLDER}{}{PLACEHOLDER}\n\n", blocks.len() - 1)
    });
    (replaced.into_owned(), blocks)
}

fn placeholder_index(line: &str) -> Option<usize> {
    line.trim()
        .strip_prefix(PLACEHOLDER)?
        .strip_suffix(PLACEHOLDER)?
        .parse()
        .ok()
}

/// Group the lines of one blank-line separated block into paragraphs, lists,
/// headers and code blocks
fn render_block(block: &str, code_blocks: &[String], out: &mut String) {
    let mut paragraph: Vec<&str> = Vec::new();
    let mut items: Vec<&str> = Vec::new();

    for line in block.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if trimmed.starts_with("<li") {
            flush_paragraph(&mut paragraph, out);
            items.push(trimmed);
        } else if trimmed.starts_with("<h3") {
            flush_paragraph(&mut paragraph, out);
            flush_list(&mut items, out);
            out.push_str(trimmed);
        } else if let Some(index) = placeholder_index(trimmed) {
            flush_paragraph(&mut paragraph, out);
            flush_list(&mut items, out);
            if let Some(code) = code_blocks.get(index) {
                out.push_str(code);
            }
        } else {
            flush_list(&mut items, out);
            paragraph.push(trimmed);
        }
    }

    flush_paragraph(&mut paragraph, out);
    flush_list(&mut items, out);
}

fn flush_paragraph(lines: &mut Vec<&str>, out: &mut String) {
    if lines.is_empty() {
        return;
    }
    out.push_str(r#"<p class="bot-paragraph">"#);
    out.push_str(&lines.join("<br>"));
    out.push_str("</p>");
    lines.clear();
}

fn flush_list(items: &mut Vec<&str>, out: &mut String) {
    if items.is_empty() {
        return;
    }
    out.push_str(r#"<ul class="bot-list">"#);
    for item in items.iter() {
        out.push_str(item);
    }
    out.push_str("</ul>");
    items.clear();
}

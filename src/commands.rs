use anyhow::{Context, Result, bail};

use crate::auth::AuthContext;
use crate::backend::ChatBackend;
use crate::config::{ChatMode, Config};
use crate::storage::CredentialStore;
use crate::view::{ConversationView, SubmitOutcome};

/// User id used when only `SUPPORTDESK_API_KEY` is set
pub const ENV_USER_ID: &str = "default";

pub fn credential_store(config: &Config) -> CredentialStore {
    CredentialStore::new(config.credentials_path())
}

/// Stored login first, then an API key from the environment
pub fn resolve_auth(store: &CredentialStore) -> Result<Option<AuthContext>> {
    if let Some(auth) = AuthContext::restore(store)? {
        return Ok(Some(auth));
    }
    Ok(Config::env_api_key().map(|key| AuthContext::new(key, ENV_USER_ID, None)))
}

/// Like `resolve_auth`, but tells the user how to sign in when nobody is
pub fn require_auth(store: &CredentialStore) -> Result<AuthContext> {
    match resolve_auth(store)? {
        Some(auth) => Ok(auth),
        None => bail!("Not signed in. Run 'supportdesk login --api-key <key> --user-id <id>' first."),
    }
}

pub fn login(config: &Config, api_key: String, user_id: String, name: Option<String>) -> Result<()> {
    let store = credential_store(config);
    let auth = AuthContext::login(&store, AuthContext::new(api_key, user_id, name))?;
    println!("✅ Signed in as {}", auth.greeting_name());
    Ok(())
}

pub fn logout(config: &Config) -> Result<()> {
    let store = credential_store(config);
    match AuthContext::restore(&store)? {
        Some(auth) => {
            auth.sign_out(&store)?;
            println!("👋 Signed out.");
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

pub fn whoami(config: &Config) -> Result<()> {
    let store = credential_store(config);
    match resolve_auth(&store)? {
        Some(auth) => {
            println!("👤 {}", auth.greeting_name());
            println!("   🆔 User: {}", auth.user_id);
            println!("   🌐 Backend: {}", config.api_base_url);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

pub async fn list_sessions(config: &Config, backend: &dyn ChatBackend) -> Result<()> {
    if config.mode == ChatMode::Stateless {
        println!("Sessions are not available in stateless mode.");
        return Ok(());
    }

    let auth = require_auth(&credential_store(config))?;
    let sessions = backend
        .list_sessions(&auth.user_id)
        .await
        .context("Failed to load conversations")?;

    if sessions.is_empty() {
        println!("📭 No conversations yet. Run 'supportdesk' to start one!");
        return Ok(());
    }

    println!("💬 Your conversations:");
    println!("{}", "=".repeat(50));
    for (index, session) in sessions.iter().enumerate() {
        println!("{:>3}. {}", index + 1, session.title);
        println!("     🆔 {}", session.id);
    }

    Ok(())
}

/// One-shot question. Prints the raw answer, or its HTML with `html`.
pub async fn ask(config: &Config, backend: &dyn ChatBackend, question: &str, html: bool) -> Result<()> {
    let auth = require_auth(&credential_store(config))?;
    let mut view = ConversationView::new(config, auth);
    let output = answer_question(&mut view, backend, question, html).await?;
    println!("{output}");

    if view.escalation_visible() {
        println!();
        println!("🙋 Need more help? Raise the issue at {}", config.escalation.url);
    }
    Ok(())
}

/// Submit `question` through the view and return the text to print. The
/// HTML is the copy formatted when the answer was appended.
async fn answer_question(
    view: &mut ConversationView,
    backend: &dyn ChatBackend,
    question: &str,
    html: bool,
) -> Result<String> {
    match view.submit(backend, question).await? {
        SubmitOutcome::Answered { position, .. } => {
            let message = &view.messages()[position];
            let output = match (&message.html, html) {
                (Some(formatted), true) => formatted.clone(),
                _ => message.content.clone(),
            };
            Ok(output)
        }
        SubmitOutcome::Failed(e) => Err(e).context("Request failed"),
        SubmitOutcome::Discarded => bail!("The answer was discarded"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{CountingFormatter, FakeBackend, test_config};
    use std::sync::Arc;
    use std::sync::atomic::Ordering;

    fn config_in(dir: &std::path::Path, mode: ChatMode) -> Config {
        Config {
            home: dir.to_path_buf(),
            ..test_config(mode)
        }
    }

    #[test]
    fn test_login_then_logout() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), ChatMode::SessionBacked);

        login(&config, "key".to_string(), "user-9".to_string(), None).unwrap();
        let store = credential_store(&config);
        assert_eq!(AuthContext::restore(&store).unwrap().unwrap().user_id, "user-9");

        logout(&config).unwrap();
        assert!(AuthContext::restore(&store).unwrap().is_none());
    }

    #[test]
    fn test_login_rejects_blank_key() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), ChatMode::SessionBacked);
        assert!(login(&config, " ".to_string(), "user".to_string(), None).is_err());
    }

    #[tokio::test]
    async fn test_ask_with_stored_login() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), ChatMode::Stateless);
        login(&config, "key".to_string(), "user".to_string(), None).unwrap();

        let backend = FakeBackend::new();
        backend.push_reply("Run `cargo build`.", true);
        ask(&config, &backend, "how do I build?", false).await.unwrap();

        let request = backend.last_chat().unwrap();
        assert_eq!(request.api_key, "key");
        assert!(request.session_id.is_none());
    }

    #[tokio::test]
    async fn test_html_answer_is_formatted_once() {
        let formatter = CountingFormatter::default();
        let calls = Arc::clone(&formatter.calls);
        let mut view = ConversationView::with_formatter(
            &test_config(ChatMode::Stateless),
            AuthContext::new("key", "user", None),
            Box::new(formatter),
        );
        let backend = FakeBackend::new();
        backend.push_reply("**done**", true);

        let output = answer_question(&mut view, &backend, "is it done?", true).await.unwrap();
        assert_eq!(output, r#"<p class="bot-paragraph"><strong>done</strong></p>"#);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_plain_answer_is_raw_text() {
        let mut view = ConversationView::new(
            &test_config(ChatMode::Stateless),
            AuthContext::new("key", "user", None),
        );
        let backend = FakeBackend::new();
        backend.push_reply("**done**", true);

        let output = answer_question(&mut view, &backend, "is it done?", false).await.unwrap();
        assert_eq!(output, "**done**");
    }

    #[tokio::test]
    async fn test_ask_reports_backend_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path(), ChatMode::Stateless);
        login(&config, "key".to_string(), "user".to_string(), None).unwrap();

        let backend = FakeBackend::new();
        backend.push_chat_error(crate::error::ClientError::server("boom"));
        assert!(ask(&config, &backend, "hello", false).await.is_err());
    }
}

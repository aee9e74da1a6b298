//! Signed-in user context
//!
//! An `AuthContext` is created on login, handed to the components that talk
//! to the backend, and cleared on sign-out.

use anyhow::{Result, bail};
use chrono::Utc;

use crate::storage::{CredentialStore, StoredCredentials};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub api_key: String,
    pub user_id: String,
    pub display_name: Option<String>,
}

impl AuthContext {
    pub fn new(api_key: impl Into<String>, user_id: impl Into<String>, display_name: Option<String>) -> Self {
        Self {
            api_key: api_key.into(),
            user_id: user_id.into(),
            display_name,
        }
    }

    /// Name shown in greetings, falling back to the user id
    pub fn greeting_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }

    /// Validate and persist a new login
    pub fn login(store: &CredentialStore, context: AuthContext) -> Result<AuthContext> {
        if context.api_key.trim().is_empty() {
            bail!("API key must not be empty");
        }
        if context.user_id.trim().is_empty() {
            bail!("User id must not be empty");
        }

        store.save(&StoredCredentials {
            api_key: context.api_key.clone(),
            user_id: context.user_id.clone(),
            display_name: context.display_name.clone(),
            signed_in_at: Utc::now().to_rfc3339(),
        })?;
        tracing::info!(user_id = %context.user_id, "signed in");
        Ok(context)
    }

    /// Restore a previous login, if any
    pub fn restore(store: &CredentialStore) -> Result<Option<AuthContext>> {
        Ok(store.load()?.map(|stored| AuthContext {
            api_key: stored.api_key,
            user_id: stored.user_id,
            display_name: stored.display_name,
        }))
    }

    /// Consume the context and remove the persisted login
    pub fn sign_out(self, store: &CredentialStore) -> Result<()> {
        store.clear()?;
        tracing::info!(user_id = %self.user_id, "signed out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_restore_sign_out() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        let context = AuthContext::login(
            &store,
            AuthContext::new("key", "user-7", Some("Alex".to_string())),
        )
        .unwrap();
        assert_eq!(context.greeting_name(), "Alex");

        let restored = AuthContext::restore(&store).unwrap().unwrap();
        assert_eq!(restored, context);

        restored.sign_out(&store).unwrap();
        assert!(AuthContext::restore(&store).unwrap().is_none());
    }

    #[test]
    fn test_login_rejects_blank_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = CredentialStore::new(dir.path().join("credentials.json"));

        assert!(AuthContext::login(&store, AuthContext::new("  ", "user", None)).is_err());
        assert!(!dir.path().join("credentials.json").exists());
    }

    #[test]
    fn test_greeting_falls_back_to_user_id() {
        let context = AuthContext::new("key", "user-9", None);
        assert_eq!(context.greeting_name(), "user-9");
    }
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Stored sign-in record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub api_key: String,
    pub user_id: String,
    pub display_name: Option<String>,
    pub signed_in_at: String,
}

/// Key-value store for the signed-in user, removed on sign-out
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        CredentialStore { path }
    }

    pub fn load(&self) -> Result<Option<StoredCredentials>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&self.path).context("Failed to read credentials")?;
        let credentials = serde_json::from_str(&content).context("Failed to parse credentials")?;
        Ok(Some(credentials))
    }

    pub fn save(&self, credentials: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).context("Failed to create credentials directory")?;
        }

        let content =
            serde_json::to_string_pretty(credentials).context("Failed to serialize credentials")?;
        fs::write(&self.path, content).context("Failed to write credentials")?;
        restrict_permissions(&self.path)?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path).context("Failed to remove credentials")?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &std::path::Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
        .context("Failed to restrict credentials permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &std::path::Path) -> Result<()> {
    Ok(())
}

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
pub const DEFAULT_ESCALATION_MARKER: &str = "no relevant context";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the support backend
    pub api_base_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retries for idempotent (GET) requests
    pub max_retries: u32,

    /// Base backoff between retries, multiplied by the attempt number
    pub retry_backoff_ms: u64,

    /// Whether conversations are stored as backend sessions
    pub mode: ChatMode,

    /// Escalation prompt settings
    pub escalation: EscalationConfig,

    /// UI preferences
    pub ui: UiConfig,

    /// Application home directory
    #[serde(skip)]
    pub home: PathBuf,
}

/// Capability flag for the conversation view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChatMode {
    /// Conversations are backend sessions with titles and history
    SessionBacked,
    /// A single local transcript, no session endpoints
    Stateless,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EscalationConfig {
    /// Case-insensitive substring marking an answer without context
    pub marker: String,
    /// Where users are sent when they accept escalation
    pub url: String,
}

/// UI configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    pub show_sidebar: bool,
    pub history_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        let home = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".supportdesk");

        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: 60,
            max_retries: 2,
            retry_backoff_ms: 500,
            mode: ChatMode::SessionBacked,
            escalation: EscalationConfig::default(),
            ui: UiConfig::default(),
            home,
        }
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            marker: DEFAULT_ESCALATION_MARKER.to_string(),
            url: "https://support.example.com/escalate".to_string(),
        }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            show_sidebar: true,
            history_limit: 500,
        }
    }
}

impl Config {
    /// Load configuration from `~/.supportdesk/config.toml` and the environment
    pub fn load() -> Result<Self> {
        let home = dirs::home_dir()
            .context("Could not find home directory")?
            .join(".supportdesk");
        let mut config = Self::load_from(&home)?;
        config.apply_env();
        Ok(config)
    }

    /// Load configuration rooted at an explicit home directory, writing
    /// defaults when no config file exists yet
    pub fn load_from(home: &Path) -> Result<Self> {
        fs::create_dir_all(home).context("Failed to create .supportdesk directory")?;
        let config_path = home.join("config.toml");

        let mut config = if config_path.exists() {
            let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")?
        } else {
            let config = Config {
                home: home.to_path_buf(),
                ..Config::default()
            };
            config.save()?;
            config
        };

        config.home = home.to_path_buf();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = self.home.join("config.toml");
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content).context("Failed to write config file")?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SUPPORTDESK_API_URL") {
            if !url.trim().is_empty() {
                self.api_base_url = url;
            }
        }
    }

    /// API key from the environment, used when no login has been stored
    pub fn env_api_key() -> Option<String> {
        std::env::var("SUPPORTDESK_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }

    pub fn credentials_path(&self) -> PathBuf {
        self.home.join("credentials.json")
    }

    pub fn log_path(&self) -> PathBuf {
        self.home.join("supportdesk.log")
    }
}

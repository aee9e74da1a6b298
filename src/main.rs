use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::OpenOptions;
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

use supportdesk::client::HttpBackend;
use supportdesk::commands;
use supportdesk::config::{ChatMode, Config};
use supportdesk::ui;

#[derive(Parser)]
#[command(name = "supportdesk")]
#[command(version = "0.1.0")]
#[command(about = "Chat with your support assistant from the terminal", long_about = None)]
struct Cli {
    /// Backend base URL (overrides config and SUPPORTDESK_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Keep a single local transcript instead of backend sessions
    #[arg(long, global = true)]
    stateless: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Store credentials for the backend
    Login {
        #[arg(long)]
        api_key: String,
        #[arg(long)]
        user_id: String,
        /// Name used in greetings
        #[arg(long)]
        name: Option<String>,
    },
    /// Forget stored credentials
    Logout,
    /// Show who is signed in
    Whoami,
    /// List your conversations
    Sessions,
    /// Ask a single question and print the answer
    Ask {
        question: String,
        /// Print the formatted HTML instead of the raw answer
        #[arg(long)]
        html: bool,
    },
    /// Open the interactive chat (default)
    Chat,
}

fn init_logging(config: &Config) -> Result<()> {
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(config.log_path())
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("supportdesk=info")),
        )
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(url) = cli.api_url {
        config.api_base_url = url;
    }
    if cli.stateless {
        config.mode = ChatMode::Stateless;
    }
    init_logging(&config)?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Login { api_key, user_id, name } => commands::login(&config, api_key, user_id, name),
        Commands::Logout => commands::logout(&config),
        Commands::Whoami => commands::whoami(&config),
        Commands::Sessions => {
            let backend = HttpBackend::new(&config)?;
            commands::list_sessions(&config, &backend).await
        }
        Commands::Ask { question, html } => {
            let backend = HttpBackend::new(&config)?;
            commands::ask(&config, &backend, &question, html).await
        }
        Commands::Chat => {
            let store = commands::credential_store(&config);
            let auth = commands::require_auth(&store)?;
            let backend = Arc::new(HttpBackend::new(&config)?);
            println!("🚀 Connecting to {}...", backend.base_url());
            ui::run_chat(&config, auth, backend, &store).await
        }
    }
}

//! Terminal setup and the chat event loop

use anyhow::{Context, Result, bail};
use crossterm::{
    ExecutableCommand,
    event::{self, Event},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::auth::AuthContext;
use crate::backend::ChatBackend;
use crate::config::Config;
use crate::storage::CredentialStore;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use crate::view::ConversationView;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Raw-mode terminal, restored on drop
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn init() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        stdout.execute(EnterAlternateScreen)?;
        let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().execute(LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Wait up to one poll interval for a terminal event
fn read_terminal_event() -> io::Result<Option<Event>> {
    if event::poll(POLL_INTERVAL)? {
        event::read().map(Some)
    } else {
        Ok(None)
    }
}

/// Pull events from `next` on a blocking thread and forward them until the
/// receiver is dropped or reading fails
fn spawn_input_reader<F>(mut next: F, tx: mpsc::UnboundedSender<Event>) -> JoinHandle<()>
where
    F: FnMut() -> io::Result<Option<Event>> + Send + 'static,
{
    tokio::task::spawn_blocking(move || {
        loop {
            match next() {
                Ok(Some(input)) => {
                    if tx.send(input).is_err() {
                        break;
                    }
                }
                Ok(None) => {
                    if tx.is_closed() {
                        break;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "failed to read terminal input");
                    break;
                }
            }
        }
    })
}

/// Run the interactive chat until the user exits or signs out
pub async fn run_chat(
    config: &Config,
    auth: AuthContext,
    backend: Arc<dyn ChatBackend>,
    store: &CredentialStore,
) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let view = ConversationView::new(config, auth);
    let mut manager = ConversationManager::new(config, view, backend, tx);
    manager.start();

    let mut guard = TerminalGuard::init().context("Failed to initialise terminal")?;
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    let _input_reader = spawn_input_reader(read_terminal_event, input_tx);
    tracing::info!(mode = ?config.mode, "chat started");

    let action = loop {
        guard
            .terminal
            .draw(|frame| manager.render(frame.size(), frame.buffer_mut()))
            .context("Failed to draw")?;

        tokio::select! {
            Some(app_event) = rx.recv() => manager.handle_event(app_event),
            input = input_rx.recv() => match input {
                Some(Event::Key(key)) => match manager.handle_key(key) {
                    ConversationAction::None => {}
                    action => break action,
                },
                // resize and other events only need a redraw
                Some(_) => {}
                None => bail!("Terminal input closed"),
            },
        }
    };

    drop(input_rx);
    drop(guard);

    if action == ConversationAction::SignOut {
        manager.view().auth().clone().sign_out(store)?;
        println!("👋 Signed out.");
    }
    tracing::info!("chat closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyEvent};

    #[tokio::test]
    async fn test_input_reader_forwards_until_receiver_dropped() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut reads = 0;
        let handle = spawn_input_reader(
            move || {
                reads += 1;
                if reads <= 2 {
                    Ok(Some(Event::Key(KeyEvent::from(KeyCode::Char('a')))))
                } else {
                    std::thread::sleep(Duration::from_millis(5));
                    Ok(None)
                }
            },
            tx,
        );

        assert!(matches!(rx.recv().await, Some(Event::Key(_))));
        assert!(matches!(rx.recv().await, Some(Event::Key(_))));
        drop(rx);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_input_reader_stops_on_error() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = spawn_input_reader(|| Err(io::Error::other("tty gone")), tx);

        handle.await.unwrap();
        assert!(rx.recv().await.is_none());
    }
}

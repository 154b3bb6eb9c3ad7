//! tmux terminal channel
//!
//! Talks to agent sessions through the tmux CLI. Text is pasted literally and
//! submitted with a debounced Enter so long instructions are not cut short by
//! the agent's input handling.

mod helpers;
mod session_ops;
mod types;

use anyhow::{anyhow, Result};
use shell_escape::escape;
use std::borrow::Cow;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

use super::TerminalChannel;

pub use helpers::{check_tmux_available, last_lines};
pub use session_ops::{kill_session_by_name, session_is_running};
pub use types::{DEFAULT_AGENT_COMMAND, DEFAULT_SESSION_PREFIX, TMUX_DEBOUNCE_MS};

/// Terminal channel backed by tmux sessions
#[derive(Debug, Clone)]
pub struct TmuxChannel {
    /// Prefix for sessions this channel creates
    prefix: String,
    /// Command typed into a freshly spawned session
    agent_command: String,
    /// Lines of scrollback captured in addition to the visible pane
    history: usize,
}

impl TmuxChannel {
    /// Create a channel, failing early when tmux is missing
    pub fn new() -> Result<Self> {
        check_tmux_available()?;
        Ok(Self {
            prefix: DEFAULT_SESSION_PREFIX.to_string(),
            agent_command: DEFAULT_AGENT_COMMAND.to_string(),
            history: 0,
        })
    }

    pub fn with_agent_command(mut self, command: impl Into<String>) -> Self {
        self.agent_command = command.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_history(mut self, history: usize) -> Self {
        self.history = history;
        self
    }

    /// Generate a fresh session name
    fn session_name(&self) -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("{}-{}", self.prefix, &id[..8])
    }
}

impl TerminalChannel for TmuxChannel {
    fn exists(&self, session: &str) -> Result<bool> {
        session_is_running(session)
    }

    fn send(&self, session: &str, text: &str) -> Result<()> {
        debug!(session, chars = text.len(), "sending text to tmux session");
        helpers::send_keys_debounced(session, text, TMUX_DEBOUNCE_MS)
    }

    fn read(&self, session: &str, max_lines: usize) -> Result<String> {
        let capture = helpers::capture_pane(session, self.history)?;
        Ok(last_lines(&capture, max_lines))
    }

    fn spawn(&self, working_dir: &Path) -> Result<String> {
        let dir = working_dir.to_str().ok_or_else(|| {
            anyhow!(
                "Working directory contains invalid UTF-8: {}",
                working_dir.display()
            )
        })?;

        let session_name = self.session_name();
        session_ops::create_session(&session_name, dir)?;
        helpers::configure_session_for_stability(&session_name);

        // Let the login shell settle before typing into it.
        std::thread::sleep(Duration::from_millis(types::TMUX_SHELL_STARTUP_MS));

        let command = escape_command(&self.agent_command);
        if let Err(e) = helpers::send_keys_debounced(&session_name, &command, TMUX_DEBOUNCE_MS) {
            let _ = kill_session_by_name(&session_name);
            return Err(anyhow!("Failed to start agent in '{session_name}': {e}"));
        }

        info!(session = %session_name, dir, "spawned agent session");
        Ok(session_name)
    }
}

/// Quote each word of the agent command for the shell
fn escape_command(command: &str) -> String {
    command
        .split_whitespace()
        .map(|word| escape(Cow::Borrowed(word)).into_owned())
        .collect::<Vec<_>>()
        .join(" ")
}

//! Terminal channel abstraction
//!
//! The chain engine only needs four things from a terminal multiplexer:
//! checking that a session exists, typing text into it, reading what it
//! currently shows, and creating a session running the agent. Session
//! teardown and naming policy live with the implementation.

pub mod tmux;

use anyhow::Result;
use std::path::Path;

pub use tmux::TmuxChannel;

/// Capability the chain monitor consumes to talk to the agent's session.
///
/// The session may be shared with other tooling; callers must not assume
/// exclusive access to its screen.
pub trait TerminalChannel: Send + Sync {
    /// Check whether the named session exists.
    fn exists(&self, session: &str) -> Result<bool>;

    /// Type `text` into the session and submit it.
    fn send(&self, session: &str, text: &str) -> Result<()>;

    /// Most recent visible output, at most `max_lines` lines.
    fn read(&self, session: &str, max_lines: usize) -> Result<String>;

    /// Create a new session running the agent in `working_dir` and return its
    /// identifier.
    fn spawn(&self, working_dir: &Path) -> Result<String>;
}

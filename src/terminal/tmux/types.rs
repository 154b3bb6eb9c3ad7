//! Constants for the tmux channel

/// Debounce delay between pasting text and pressing Enter (milliseconds)
pub const TMUX_DEBOUNCE_MS: u64 = 200;

/// Number of attempts for the Enter key after a paste
pub const TMUX_ENTER_RETRY_ATTEMPTS: u32 = 3;

/// Delay between Enter key attempts (milliseconds)
pub const TMUX_ENTER_RETRY_DELAY_MS: u64 = 200;

/// Delay after creating a session before the agent command is typed (milliseconds)
pub const TMUX_SHELL_STARTUP_MS: u64 = 500;

/// Default prefix for sessions created by chainwatch
pub const DEFAULT_SESSION_PREFIX: &str = "chainwatch";

/// Default command that starts the agent inside a new session
pub const DEFAULT_AGENT_COMMAND: &str = "claude";

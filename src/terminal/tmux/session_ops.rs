//! Session operations for the tmux channel (create, query)

use anyhow::{anyhow, Context, Result};
use std::process::Command;

/// Check if a tmux session exists
pub fn session_is_running(session_name: &str) -> Result<bool> {
    let output = Command::new("tmux")
        .args(["has-session", "-t", session_name])
        .output()
        .context("Failed to check if tmux session exists")?;

    Ok(output.status.success())
}

/// Create a new detached tmux session
pub fn create_session(session_name: &str, working_dir: &str) -> Result<()> {
    let create_output = Command::new("tmux")
        .args(["new-session", "-d", "-s", session_name, "-c", working_dir])
        .output()
        .context("Failed to create tmux session")?;

    if !create_output.status.success() {
        let stderr = String::from_utf8_lossy(&create_output.stderr);
        return Err(anyhow!("Failed to create tmux session: {}", stderr.trim()));
    }

    Ok(())
}

/// Kill a tmux session by name
pub fn kill_session_by_name(session_name: &str) -> Result<()> {
    let output = Command::new("tmux")
        .args(["kill-session", "-t", session_name])
        .output()
        .context("Failed to kill tmux session")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("Failed to kill tmux session: {}", stderr.trim()));
    }

    Ok(())
}

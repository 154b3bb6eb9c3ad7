//! Helper functions for tmux operations

use anyhow::{anyhow, bail, Context, Result};
use std::process::Command;
use std::time::Duration;

use super::types::{TMUX_ENTER_RETRY_ATTEMPTS, TMUX_ENTER_RETRY_DELAY_MS};

/// Check if tmux is available on the system
pub fn check_tmux_available() -> Result<()> {
    if which::which("tmux").is_err() {
        return Err(anyhow!(
            "tmux is not installed. Please install tmux to drive agent sessions.\n\
             On Ubuntu/Debian: sudo apt-get install tmux\n\
             On macOS: brew install tmux\n\
             On Arch: sudo pacman -S tmux"
        ));
    }
    Ok(())
}

/// Configure a tmux session so long agent output does not destabilise it
pub fn configure_session_for_stability(session_name: &str) {
    let options: [(&str, &str); 3] = [
        ("history-limit", "5000"),
        ("aggressive-resize", "on"),
        ("remain-on-exit", "on"),
    ];

    for (option, value) in options {
        let result = Command::new("tmux")
            .args(["set-option", "-t", session_name, option, value])
            .output();
        if let Err(e) = result {
            tracing::debug!(session = session_name, option, error = %e, "tmux set-option failed");
        }
    }
}

/// Paste text literally, wait, then press Enter
pub fn send_keys_debounced(session_name: &str, text: &str, debounce_ms: u64) -> Result<()> {
    let paste_output = Command::new("tmux")
        .args(["send-keys", "-t", session_name, "-l", text])
        .output()
        .context("Failed to send text to tmux")?;

    if !paste_output.status.success() {
        let stderr = String::from_utf8_lossy(&paste_output.stderr);
        bail!("Failed to paste text: {}", stderr.trim());
    }

    std::thread::sleep(Duration::from_millis(debounce_ms));

    send_enter_with_retry(
        session_name,
        TMUX_ENTER_RETRY_ATTEMPTS,
        TMUX_ENTER_RETRY_DELAY_MS,
    )
}

/// Press Enter, retrying a few times if tmux refuses
fn send_enter_with_retry(session_name: &str, attempts: u32, retry_delay_ms: u64) -> Result<()> {
    for attempt in 1..=attempts {
        let output = Command::new("tmux")
            .args(["send-keys", "-t", session_name, "Enter"])
            .output()
            .context("Failed to send Enter to tmux")?;

        if output.status.success() {
            return Ok(());
        }

        if attempt < attempts {
            std::thread::sleep(Duration::from_millis(retry_delay_ms));
        }
    }
    bail!("Failed to send Enter after {attempts} attempts")
}

/// Capture the joined visible pane plus `history` lines of scrollback
pub fn capture_pane(session_name: &str, history: usize) -> Result<String> {
    let start = format!("-{history}");
    let output = Command::new("tmux")
        .args(["capture-pane", "-p", "-J", "-t", session_name, "-S", &start])
        .output()
        .context("Failed to capture tmux pane")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!("Failed to capture pane: {}", stderr.trim());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Keep the last `max_lines` lines of a capture, ignoring the blank padding
/// tmux appends below the cursor.
pub fn last_lines(capture: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = capture.trim_end().lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

//! Signal heuristic rules
//!
//! The phrase lists are tuned against one agent's output conventions (status
//! glyphs, box-drawn prompts, todo lists). They are plain data so another
//! agent's conventions can be described in a TOML file without code changes.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Placeholder replaced by the awaited keyword inside phrase templates.
pub const KEYWORD_PLACEHOLDER: &str = "{keyword}";

/// File name looked up under the user's config directory.
const RULES_FILE: &str = "signals.toml";

/// Rules driving `CompletionSignalDetector`.
///
/// Fields present in a rules file replace the built-in list entirely;
/// missing fields keep the built-in value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalRules {
    /// Substrings (case-sensitive) that mark a line as a mention of the
    /// keyword rather than a signal. May contain `{keyword}`.
    pub mention_phrases: Vec<String>,
    /// Like `mention_phrases`, matched ignoring case.
    pub mention_phrases_ignore_case: Vec<String>,
    /// Glyphs an agent prints in front of a status line.
    pub status_markers: Vec<String>,
    /// Regex for numbered task-list entries, tested against the trimmed line.
    pub numbered_item_pattern: String,
    /// Characters tolerated between a status marker and the keyword.
    pub max_marker_gap: usize,
}

impl Default for SignalRules {
    fn default() -> Self {
        let mention_phrases = [
            // Structural list and box markers
            "│",
            "├",
            "└",
            "☐",
            "☒",
            "- [",
            "* ",
            "• ",
            // Quoting the keyword back
            "Document",
            "signal completion",
            "with {keyword}",
            "and {keyword}",
            "using {keyword}",
            "type {keyword}",
            ": Say",
            ". Say",
            // Plans and steps
            "Execute step",
            "Step ",
            "execute it",
            "plan:",
            "todo list",
            // Intent
            "Create",
            "Analyze",
            "then execute",
            "Let me",
            "I need to",
            "I will",
            "I should",
        ];

        Self {
            mention_phrases: mention_phrases.iter().map(|s| s.to_string()).collect(),
            mention_phrases_ignore_case: vec!["say {keyword}".to_string()],
            status_markers: ["⏺", "●", "✓", "✔", "✅"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            numbered_item_pattern: r"^\d+\.".to_string(),
            max_marker_gap: 9,
        }
    }
}

impl SignalRules {
    /// Parse rules from TOML text.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse signal rules")
    }

    /// Read rules from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read signal rules: {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("Invalid rules file: {}", path.display()))
    }

    /// `<config dir>/chainwatch/signals.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("chainwatch").join(RULES_FILE))
    }

    /// Rules for a run: an explicit file, else the user's rules file when it
    /// exists, else the built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }
}

/// Expand a phrase template for one keyword.
pub(crate) fn expand(template: &str, keyword: &str) -> String {
    template.replace(KEYWORD_PLACEHOLDER, keyword)
}

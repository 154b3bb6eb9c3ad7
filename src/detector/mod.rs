//! Completion signal detection
//!
//! Decides whether a line of agent output *is* the awaited keyword, as opposed
//! to a plan, a quoted instruction or prose that merely mentions it. Anything
//! not explicitly accepted is rejected.

mod rules;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use regex::Regex;

pub use rules::{SignalRules, KEYWORD_PLACEHOLDER};

/// Classifies terminal lines as completion signals.
#[derive(Debug, Clone)]
pub struct CompletionSignalDetector {
    rules: SignalRules,
    numbered_item: Regex,
}

impl Default for CompletionSignalDetector {
    /// Built-in rules. Their numbered-item pattern is a fixed literal, so
    /// this is the one infallible construction path.
    fn default() -> Self {
        Self::new(SignalRules::default()).expect("built-in signal rules must compile")
    }
}

impl CompletionSignalDetector {
    pub fn new(rules: SignalRules) -> Result<Self> {
        let numbered_item = Regex::new(&rules.numbered_item_pattern).with_context(|| {
            format!(
                "Invalid numbered_item_pattern: {}",
                rules.numbered_item_pattern
            )
        })?;
        Ok(Self {
            rules,
            numbered_item,
        })
    }

    pub fn rules(&self) -> &SignalRules {
        &self.rules
    }

    /// Whether `line` is a genuine completion signal for `keyword`.
    ///
    /// Mentions are rejected before anything is accepted, so an instruction
    /// quoting the keyword never counts.
    pub fn is_completion_signal(&self, line: &str, keyword: &str) -> bool {
        if keyword.is_empty() || self.is_mention(line, keyword) {
            return false;
        }

        let trimmed = line.trim();
        if self.numbered_item.is_match(trimmed) {
            return false;
        }

        if keyword.ends_with(':') {
            let body = self.strip_status_marker(trimmed).unwrap_or(trimmed);
            return body
                .strip_prefix(keyword)
                .is_some_and(|rest| !rest.chars().any(char::is_whitespace));
        }

        if trimmed == keyword {
            return true;
        }

        self.rules.status_markers.iter().any(|marker| {
            let Some(rest) = trimmed.strip_prefix(marker.as_str()) else {
                return false;
            };
            if rest.trim_start() == keyword {
                return true;
            }
            rest.strip_suffix(keyword)
                .is_some_and(|gap| gap.chars().count() <= self.rules.max_marker_gap)
        })
    }

    /// Byte offset (within `text`) of the keyword on the last line that is a
    /// completion signal, if any.
    pub fn find_last_signal(&self, text: &str, keyword: &str) -> Option<usize> {
        let mut line_end = text.len();
        loop {
            let line_start = text[..line_end].rfind('\n').map_or(0, |nl| nl + 1);
            let line = &text[line_start..line_end];
            if line.contains(keyword) && self.is_completion_signal(line, keyword) {
                return line.rfind(keyword).map(|at| line_start + at);
            }
            if line_start == 0 {
                return None;
            }
            line_end = line_start - 1;
        }
    }

    fn is_mention(&self, line: &str, keyword: &str) -> bool {
        let exact = self
            .rules
            .mention_phrases
            .iter()
            .any(|phrase| line.contains(&rules::expand(phrase, keyword)));
        if exact {
            return true;
        }

        let lowered = line.to_lowercase();
        self.rules
            .mention_phrases_ignore_case
            .iter()
            .any(|phrase| lowered.contains(&rules::expand(phrase, keyword).to_lowercase()))
    }

    fn strip_status_marker<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.rules
            .status_markers
            .iter()
            .find_map(|marker| line.strip_prefix(marker.as_str()))
            .map(str::trim_start)
    }
}

/// Classify one line with the built-in rules.
pub fn is_completion_signal(line: &str, keyword: &str) -> bool {
    CompletionSignalDetector::default().is_completion_signal(line, keyword)
}

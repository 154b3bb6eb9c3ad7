//! Detect command - classifies lines against a keyword with the active rules

use anyhow::{Context, Result};
use colored::Colorize;
use std::io::BufRead;
use std::path::Path;

use crate::detector::{CompletionSignalDetector, SignalRules};

/// Classify each line, printing whether it counts as a completion signal.
/// Reads stdin when no lines are given. Returns the number of signals.
pub fn execute(keyword: &str, lines: Vec<String>, rules_path: Option<&Path>) -> Result<usize> {
    let detector = CompletionSignalDetector::new(SignalRules::resolve(rules_path)?)?;

    let lines = if lines.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<std::io::Result<Vec<_>>>()
            .context("Failed to read lines from stdin")?
    } else {
        lines
    };

    let signals = classify(&detector, keyword, &lines);
    for (line, is_signal) in lines.iter().zip(&signals) {
        if *is_signal {
            println!("{} {line}", "✓".green().bold());
        } else {
            println!("{} {}", "─".dimmed(), line.dimmed());
        }
    }

    Ok(signals.iter().filter(|s| **s).count())
}

fn classify(detector: &CompletionSignalDetector, keyword: &str, lines: &[String]) -> Vec<bool> {
    lines
        .iter()
        .map(|line| detector.is_completion_signal(line, keyword))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_lines() {
        let detector = CompletionSignalDetector::default();
        let lines = vec![
            "⏺ DONE".to_string(),
            "Then say DONE".to_string(),
            "DONE".to_string(),
        ];
        assert_eq!(
            classify(&detector, "DONE", &lines),
            vec![true, false, true]
        );
    }

    #[test]
    fn test_execute_counts_signals() {
        let dir = tempfile::TempDir::new().unwrap();
        let rules = dir.path().join("signals.toml");
        std::fs::write(&rules, "status_markers = [\"[ok]\"]\n").unwrap();

        let count = execute(
            "DONE",
            vec!["[ok] DONE".to_string(), "⏺ DONE".to_string()],
            Some(&rules),
        )
        .unwrap();
        assert_eq!(count, 1);
    }
}

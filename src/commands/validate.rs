//! Validate command - checks a workflow document without running it

use anyhow::{bail, Result};
use colored::Colorize;
use std::path::Path;

use crate::error::ChainError;
use crate::workflow::WorkflowDefinition;

/// Load and validate a workflow, printing the chain it describes
pub fn execute(path: &Path) -> Result<()> {
    let definition = WorkflowDefinition::load(path)?;

    if let Err(ChainError::Configuration(errors)) = definition.validate() {
        println!(
            "{} {} is invalid:",
            "✗".red().bold(),
            path.display().to_string().bold()
        );
        for error in &errors {
            println!("  {} {error}", "─".dimmed());
        }
        bail!("Workflow has {} problem(s)", errors.len());
    }

    println!(
        "{} {} is valid",
        "✓".green().bold(),
        path.display().to_string().bold()
    );
    if let Some(id) = &definition.instance_id {
        println!("  instance: {}", id.cyan());
    }
    for (index, link) in definition.chains.iter().enumerate() {
        match &link.next_keyword {
            Some(next) => println!(
                "  {index}. {} {} {}",
                link.keyword.cyan(),
                "→".dimmed(),
                next
            ),
            None => println!("  {index}. {} {}", link.keyword.cyan(), "(final)".dimmed()),
        }
    }

    let options = definition.options();
    println!(
        "  poll every {}s, timeout {}s, {} attempt(s) {}s apart",
        options.poll_interval, options.timeout, options.retry_attempts, options.retry_delay
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_accepts_good_workflow() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("good.json");
        std::fs::write(
            &path,
            r#"{
                "chains": [
                    { "keyword": "PLAN_DONE", "instruction": "Build {{TASK}}", "nextKeyword": "BUILD_DONE" },
                    { "keyword": "BUILD_DONE", "instruction": "Summarise" }
                ],
                "initialPrompt": "Plan {{TASK}} and say PLAN_DONE"
            }"#,
        )
        .unwrap();

        assert!(execute(&path).is_ok());
    }

    #[test]
    fn test_validate_rejects_broken_links() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(
            &path,
            r#"{
                "chains": [
                    { "keyword": "PLAN_DONE", "instruction": "Build", "nextKeyword": "NOPE" },
                    { "keyword": "BUILD_DONE", "instruction": "Summarise" }
                ],
                "initialPrompt": "Plan {{TASK}}"
            }"#,
        )
        .unwrap();

        let err = execute(&path).unwrap_err();
        assert!(err.to_string().contains("problem(s)"));
    }

    #[test]
    fn test_validate_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(execute(&dir.path().join("missing.json")).is_err());
    }
}

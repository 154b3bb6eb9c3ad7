//! Workflow document type definitions

use serde::{Deserialize, Serialize};

/// Placeholder substituted with the task description before a chain runs.
pub const TASK_PLACEHOLDER: &str = "{{TASK}}";

/// Root of a workflow document as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    #[serde(default)]
    pub instance_id: Option<String>,
    #[serde(default)]
    pub task_description: Option<String>,
    pub chains: Vec<ChainLink>,
    pub initial_prompt: String,
    #[serde(default)]
    pub options: WorkflowOptions,
}

/// One link of the chain: the keyword that triggers it, the instruction it
/// sends, and the keyword awaited afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainLink {
    pub keyword: String,
    pub instruction: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_keyword: Option<String>,
}

/// Timing and retry options. All durations are whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkflowOptions {
    pub poll_interval: u64,
    pub timeout: u64,
    pub retry_attempts: u32,
    pub retry_delay: u64,
}

impl Default for WorkflowOptions {
    fn default() -> Self {
        Self {
            poll_interval: 5,
            timeout: 3600,
            retry_attempts: 3,
            retry_delay: 2,
        }
    }
}

/// A problem found while validating a workflow definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub message: String,
    /// Keyword of the offending link, when the problem is local to one.
    pub keyword: Option<String>,
}

impl ValidationError {
    pub(crate) fn global(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            keyword: None,
        }
    }

    pub(crate) fn at(keyword: &str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            keyword: Some(keyword.to_string()),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(keyword) = &self.keyword {
            write!(f, "Keyword '{}': {}", keyword, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

impl std::error::Error for ValidationError {}

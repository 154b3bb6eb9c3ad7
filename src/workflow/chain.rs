//! Runtime chain built from a validated workflow definition

use anyhow::{Context, Result};
use std::path::Path;

use crate::error::ChainError;

use super::types::{ChainLink, WorkflowDefinition, WorkflowOptions, TASK_PLACEHOLDER};
use super::validation::{validate, validate_links};

/// One stage of a running chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    pub trigger_keyword: String,
    pub instruction: String,
    pub next_keyword: Option<String>,
}

impl From<ChainLink> for Stage {
    fn from(link: ChainLink) -> Self {
        Self {
            trigger_keyword: link.keyword,
            instruction: link.instruction,
            next_keyword: link.next_keyword,
        }
    }
}

/// An ordered, validated, immutable chain of stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowChain {
    stages: Vec<Stage>,
    initial_prompt: Option<String>,
}

impl WorkflowChain {
    /// Build a chain from raw links, rejecting broken keyword linkage.
    pub fn new(links: Vec<ChainLink>) -> Result<Self, ChainError> {
        let errors = validate_links(&links);
        if !errors.is_empty() {
            return Err(ChainError::Configuration(errors));
        }

        Ok(Self {
            stages: links.into_iter().map(Stage::from).collect(),
            initial_prompt: None,
        })
    }

    pub fn stage(&self, index: usize) -> Option<&Stage> {
        self.stages.get(index)
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Always false for a constructed chain; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Keyword awaited before anything has run.
    pub fn first_keyword(&self) -> &str {
        &self.stages[0].trigger_keyword
    }

    /// Position of the stage triggered by `keyword`.
    pub fn index_of(&self, keyword: &str) -> Option<usize> {
        self.stages
            .iter()
            .position(|stage| stage.trigger_keyword == keyword)
    }

    /// Prompt that kicks the agent off, when the chain came from a document.
    pub fn initial_prompt(&self) -> Option<&str> {
        self.initial_prompt.as_deref()
    }
}

impl WorkflowDefinition {
    /// Parse a workflow document from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse workflow JSON")
    }

    /// Read and parse a workflow document.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read workflow file: {}", path.display()))?;
        Self::from_json(&text)
            .with_context(|| format!("Invalid workflow file: {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ChainError> {
        validate(self).map_err(ChainError::Configuration)
    }

    /// Validate, then derive the runtime chain with `{{TASK}}` replaced in the
    /// initial prompt and every instruction. The definition itself is untouched.
    pub fn instantiate(&self, task: &str) -> Result<WorkflowChain, ChainError> {
        self.validate()?;

        let links = self
            .chains
            .iter()
            .map(|link| ChainLink {
                keyword: link.keyword.clone(),
                instruction: substitute_task(&link.instruction, task),
                next_keyword: link.next_keyword.clone(),
            })
            .collect();

        let mut chain = WorkflowChain::new(links)?;
        chain.initial_prompt = Some(substitute_task(&self.initial_prompt, task));
        Ok(chain)
    }

    pub fn options(&self) -> WorkflowOptions {
        self.options
    }
}

/// Replace every `{{TASK}}` occurrence in `template`.
pub fn substitute_task(template: &str, task: &str) -> String {
    template.replace(TASK_PLACEHOLDER, task)
}

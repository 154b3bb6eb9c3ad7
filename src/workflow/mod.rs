//! Workflow chain definitions
//!
//! A workflow document lists the stages of a chain as keyword-linked records.
//! Documents are validated once and turned into an immutable `WorkflowChain`
//! with the task description substituted in.

mod chain;
mod types;
mod validation;

#[cfg(test)]
mod tests;

pub use chain::{substitute_task, Stage, WorkflowChain};
pub use types::{ChainLink, ValidationError, WorkflowDefinition, WorkflowOptions, TASK_PLACEHOLDER};
pub use validation::{validate, validate_links};

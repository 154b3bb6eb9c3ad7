//! Error types for the chain engine

use thiserror::Error;

use crate::monitor::MonitorState;
use crate::workflow::ValidationError;

/// Errors raised by the chain engine.
///
/// Channel and file-system plumbing outside the engine reports through
/// `anyhow`; these variants are the outcomes callers need to match on.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The workflow definition is malformed or its keyword links are broken.
    #[error("invalid workflow: {}", format_validation_errors(.0))]
    Configuration(Vec<ValidationError>),

    #[error("chain monitor is already active")]
    AlreadyActive,

    #[error("chain monitor already finished ({0})")]
    AlreadyFinished(MonitorState),

    #[error("failed to read session output: {0}")]
    ChannelRead(String),

    #[error("dispatch failed after {attempts} attempt(s): {last_error}")]
    DispatchFailure { attempts: u32, last_error: String },

    #[error("dispatch cancelled by stop request")]
    DispatchCancelled,
}

fn format_validation_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

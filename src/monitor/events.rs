//! Lifecycle events and outcomes reported by the chain monitor

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

use super::state::StageExecution;

/// Events emitted while a chain runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChainEvent {
    Started,
    StageExecuted {
        keyword: String,
        stage_index: usize,
    },
    ChainComplete {
        total_stages: usize,
    },
    ChainFailed {
        keyword: String,
        instruction: String,
        error: String,
    },
    TimedOut {
        completed_stages: usize,
        total_stages: usize,
    },
    Stopped,
    /// Recoverable problem; the monitor keeps polling
    Error {
        detail: String,
    },
}

impl ChainEvent {
    /// Whether this event reports how the run ended
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ChainEvent::ChainComplete { .. }
                | ChainEvent::ChainFailed { .. }
                | ChainEvent::TimedOut { .. }
                | ChainEvent::Stopped
        )
    }
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ChainOutcome {
    Complete {
        total_stages: usize,
    },
    Failed {
        keyword: String,
        instruction: String,
        error: String,
    },
    TimedOut {
        completed_stages: usize,
        total_stages: usize,
    },
    Stopped,
}

impl ChainOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ChainOutcome::Complete { .. })
    }
}

impl From<&ChainOutcome> for ChainEvent {
    fn from(outcome: &ChainOutcome) -> Self {
        match outcome {
            ChainOutcome::Complete { total_stages } => ChainEvent::ChainComplete {
                total_stages: *total_stages,
            },
            ChainOutcome::Failed {
                keyword,
                instruction,
                error,
            } => ChainEvent::ChainFailed {
                keyword: keyword.clone(),
                instruction: instruction.clone(),
                error: error.clone(),
            },
            ChainOutcome::TimedOut {
                completed_stages,
                total_stages,
            } => ChainEvent::TimedOut {
                completed_stages: *completed_stages,
                total_stages: *total_stages,
            },
            ChainOutcome::Stopped => ChainEvent::Stopped,
        }
    }
}

/// Report of a run, available at any point
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub session: String,
    pub total_stages: usize,
    pub executed_stages: Vec<StageExecution>,
    pub started_at: Option<DateTime<Utc>>,
    pub poll_count: u64,
    #[serde(serialize_with = "serialize_secs")]
    pub elapsed: Duration,
    pub outcome: Option<ChainOutcome>,
}

fn serialize_secs<S: serde::Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(value.as_secs_f64())
}

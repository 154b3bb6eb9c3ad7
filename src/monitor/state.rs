//! Monitor lifecycle states and per-run bookkeeping

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Instant;

use super::buffer::OutputWindow;

/// Lifecycle of a chain monitor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitorState {
    /// Constructed, not started
    Idle,
    /// Polling the session
    Active,
    Complete,
    Failed,
    TimedOut,
    /// Cancelled from outside
    Stopped,
}

impl std::fmt::Display for MonitorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            MonitorState::Idle => "idle",
            MonitorState::Active => "active",
            MonitorState::Complete => "complete",
            MonitorState::Failed => "failed",
            MonitorState::TimedOut => "timed out",
            MonitorState::Stopped => "stopped",
        };
        write!(f, "{name}")
    }
}

impl MonitorState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            MonitorState::Complete
                | MonitorState::Failed
                | MonitorState::TimedOut
                | MonitorState::Stopped
        )
    }

    /// Valid transitions:
    /// - `Idle` -> `Active`
    /// - `Active` -> `Complete` | `Failed` | `TimedOut` | `Stopped`
    /// - terminal states go nowhere
    pub fn can_transition_to(&self, next: &MonitorState) -> bool {
        match self {
            MonitorState::Idle => matches!(next, MonitorState::Active),
            MonitorState::Active => next.is_terminal(),
            _ => false,
        }
    }
}

/// One stage execution, in the order they happened
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageExecution {
    pub keyword: String,
    pub stage_index: usize,
    pub executed_at: DateTime<Utc>,
    /// Send attempts used; 0 until the dispatch finished
    pub attempts: u32,
    pub dispatched: bool,
}

/// Mutable state owned by one monitor for the length of a run
#[derive(Debug)]
pub struct ChainRunState {
    pub current_stage_index: usize,
    pub current_keyword: String,
    pub output: OutputWindow,
    /// Absolute offset of the last occurrence acted upon, per keyword
    pub last_match_offset: HashMap<String, usize>,
    pub executed_stages: Vec<StageExecution>,
    pub started_at: Option<Instant>,
    pub started_at_utc: Option<DateTime<Utc>>,
    pub poll_count: u64,
    /// Lines of the previous capture, for working out what is new
    pub(super) last_capture: Vec<String>,
}

impl ChainRunState {
    pub fn new(first_keyword: &str, buffer_capacity: usize) -> Self {
        Self {
            current_stage_index: 0,
            current_keyword: first_keyword.to_string(),
            output: OutputWindow::new(buffer_capacity),
            last_match_offset: HashMap::new(),
            executed_stages: Vec::new(),
            started_at: None,
            started_at_utc: None,
            poll_count: 0,
            last_capture: Vec::new(),
        }
    }

    /// Stages whose instruction was delivered
    pub fn completed_stages(&self) -> usize {
        self.executed_stages.iter().filter(|e| e.dispatched).count()
    }

    pub fn has_executed(&self, keyword: &str, stage_index: usize) -> bool {
        self.executed_stages
            .iter()
            .any(|e| e.keyword == keyword && e.stage_index == stage_index)
    }

    /// Whether `offset` is past everything already consumed for `keyword`
    pub fn is_new_match(&self, keyword: &str, offset: usize) -> bool {
        self.last_match_offset
            .get(keyword)
            .is_none_or(|&last| offset > last)
    }

    pub fn consume(&mut self, keyword: &str, offset: usize) {
        let entry = self
            .last_match_offset
            .entry(keyword.to_string())
            .or_insert(offset);
        *entry = (*entry).max(offset);
    }
}

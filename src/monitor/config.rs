//! Configuration for the chain monitor

use std::time::Duration;

use crate::workflow::WorkflowOptions;

/// Default size of the trailing output window (bytes)
pub const DEFAULT_BUFFER_CAPACITY: usize = 10_000;

/// Default number of lines read from the session per poll
pub const DEFAULT_CAPTURE_LINES: usize = 100;

/// Configuration for the monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    /// Total budget measured from `start()`, not from the last stage
    pub timeout: Duration,
    pub retry_attempts: u32,
    pub retry_delay: Duration,
    pub buffer_capacity: usize,
    pub capture_lines: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        WorkflowOptions::default().into()
    }
}

impl From<WorkflowOptions> for MonitorConfig {
    fn from(options: WorkflowOptions) -> Self {
        Self {
            poll_interval: Duration::from_secs(options.poll_interval),
            timeout: Duration::from_secs(options.timeout),
            retry_attempts: options.retry_attempts.max(1),
            retry_delay: Duration::from_secs(options.retry_delay),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            capture_lines: DEFAULT_CAPTURE_LINES,
        }
    }
}

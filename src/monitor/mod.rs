//! Chain monitor
//!
//! Polls the agent's session, accumulates its output in a bounded window,
//! asks the detector whether the awaited keyword has been signalled, and
//! dispatches the matching instruction with retry before advancing the chain.

mod buffer;
mod config;
mod core;
mod dispatch;
mod events;
mod state;


pub use buffer::{unseen_lines, OutputWindow};
pub use config::{MonitorConfig, DEFAULT_BUFFER_CAPACITY, DEFAULT_CAPTURE_LINES};
pub use self::core::ChainMonitor;
pub use dispatch::{RetryingDispatcher, StopHandle};
pub use events::{ChainEvent, ChainOutcome, RunSummary};
pub use state::{ChainRunState, MonitorState, StageExecution};

pub mod commands;
pub mod detector;
pub mod error;
pub mod logging;
pub mod monitor;
pub mod terminal;
pub mod workflow;

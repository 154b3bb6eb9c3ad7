//! CLI command implementations

pub mod detect;
pub mod run;
pub mod validate;

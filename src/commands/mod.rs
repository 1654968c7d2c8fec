//! Command handlers
//!
//! Each command handler orchestrates the execution of a CLI command.

pub mod rules;
pub mod watch;

pub use rules::{run_check, run_init, run_rules};
pub use watch::run_watch;

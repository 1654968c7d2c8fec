//! Command-line interface
//!
//! Argument parsing and output formatting.

pub mod args;
pub mod output;

pub use args::{generate_completions, Cli, Commands, OutputFormat, WatchArgs};
pub use output::{print_output, ActiveAlertList, TableDisplay, ThresholdList};

//! CLI argument definitions using clap derive
//!
//! Defines all command-line arguments and subcommands.

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Threshold-based system metrics watcher
///
/// Evaluates CPU and network readings against configurable thresholds and
/// raises alerts when a threshold stays breached for its configured
/// duration.
#[derive(Parser, Debug)]
#[command(name = "metricwatch")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Path to threshold configuration file
    #[arg(short, long, global = true, env = "METRICWATCH_CONFIG")]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the evaluation loop
    Watch(WatchArgs),

    /// List configured thresholds
    Rules,

    /// Validate the threshold configuration file
    Check,

    /// Write the default threshold configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the watch command
#[derive(Parser, Debug)]
pub struct WatchArgs {
    /// Evaluate against a simulated metric source
    #[arg(long)]
    pub simulate: bool,

    /// Override the check interval, in seconds
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Stop after this many seconds instead of running until killed
    #[arg(long, value_name = "SECS")]
    pub run_for: Option<u64>,
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format for machine parsing
    Json,
    /// Compact single-line format
    Compact,
}

/// Generate shell completions and print to stdout
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_rules() {
        let args = Cli::try_parse_from(["metricwatch", "rules"]).unwrap();
        assert!(matches!(args.command, Commands::Rules));
    }

    #[test]
    fn test_cli_parse_watch_flags() {
        let args =
            Cli::try_parse_from(["metricwatch", "watch", "--simulate", "--run-for", "30"]).unwrap();
        match args.command {
            Commands::Watch(watch) => {
                assert!(watch.simulate);
                assert_eq!(watch.run_for, Some(30));
                assert_eq!(watch.interval, None);
            }
            _ => panic!("expected watch command"),
        }
    }

    #[test]
    fn test_cli_parse_verbose_and_format() {
        let args =
            Cli::try_parse_from(["metricwatch", "-v", "--format", "json", "rules"]).unwrap();
        assert!(args.verbose);
        assert_eq!(args.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_parse_init_force() {
        let args = Cli::try_parse_from(["metricwatch", "init", "--force"]).unwrap();
        assert!(matches!(args.command, Commands::Init { force: true }));
    }
}

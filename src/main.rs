//! metricwatch - threshold-based system metrics watcher
//!
//! A command-line tool that evaluates CPU and network readings against
//! configurable thresholds and raises alerts on sustained breaches.

use clap::Parser;
use metricwatch::cli::args::{generate_completions, Cli, Commands};
use metricwatch::commands::{run_check, run_init, run_rules, run_watch};
use metricwatch::error::{AppError, ConfigError, MetricError};

fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    // Parse CLI arguments
    let cli = Cli::parse();

    // Set log level based on verbose flag
    if cli.verbose {
        log::set_max_level(log::LevelFilter::Debug);
    }

    let result = run(&cli);

    if let Err(e) = result {
        log::error!("{}", e);
        print_error(&e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), AppError> {
    match &cli.command {
        Commands::Watch(args) => run_watch(args, cli.format, cli.config.as_deref()),

        Commands::Rules => run_rules(cli.format, cli.config.as_deref()),

        Commands::Check => run_check(cli.config.as_deref()),

        Commands::Init { force } => run_init(cli.config.as_deref(), *force),

        Commands::Completions { shell } => {
            generate_completions(*shell);
            Ok(())
        }
    }
}

fn print_error(err: &AppError) {
    eprintln!("Error: {}", err);

    // Print helpful hints for common errors
    match err {
        AppError::Metric(MetricError::NotSupported(_)) => {
            eprintln!();
            eprintln!("Hint: This build carries no OS metric collector.");
            eprintln!("      Run 'metricwatch watch --simulate' for a demo loop.");
        }
        AppError::Config(ConfigError::FileNotFound(_)) => {
            eprintln!();
            eprintln!("Hint: Run 'metricwatch init' to write the default configuration.");
        }
        _ => {}
    }
}

//! Threshold configuration command handlers
//!
//! `rules` lists the configured thresholds, `check` validates the
//! configuration file, and `init` writes the default configuration.

use crate::alerts::AlertConfig;
use crate::cli::args::OutputFormat;
use crate::cli::output::{print_output, ThresholdList};
use crate::commands::watch::load_thresholds;
use crate::error::{ConfigError, Result};

use std::path::PathBuf;

/// Run the rules command
pub fn run_rules(format: OutputFormat, config_path: Option<&str>) -> Result<()> {
    let thresholds = load_thresholds(config_path)?;
    print_output(&ThresholdList::new(&thresholds), format)?;
    Ok(())
}

/// Run the check command
pub fn run_check(config_path: Option<&str>) -> Result<()> {
    let path = resolve_path(config_path);
    let config = AlertConfig::load(&path)?;
    let thresholds = config.to_thresholds()?;

    println!(
        "{}: {} thresholds ({} enabled), check interval {}s{}",
        path.display(),
        config.thresholds.len(),
        thresholds.len(),
        config.settings.check_interval_secs,
        if config.settings.enabled {
            ""
        } else {
            ", alerting disabled"
        },
    );
    Ok(())
}

/// Run the init command
pub fn run_init(config_path: Option<&str>, force: bool) -> Result<()> {
    let path = resolve_path(config_path);
    if path.exists() && !force {
        return Err(ConfigError::InvalidValue {
            key: "config".to_string(),
            message: format!("{} already exists (use --force to overwrite)", path.display()),
        }
        .into());
    }

    let config = AlertConfig::default();
    config.save(&path)?;
    println!("Wrote {} thresholds to {}", config.thresholds.len(), path.display());
    Ok(())
}

fn resolve_path(config_path: Option<&str>) -> PathBuf {
    config_path
        .map(PathBuf::from)
        .unwrap_or_else(AlertConfig::default_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_then_check() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thresholds.toml");
        let path_str = path.to_str().unwrap();

        run_init(Some(path_str), false).unwrap();
        assert!(path.exists());

        // A second init without --force refuses to overwrite
        assert!(run_init(Some(path_str), false).is_err());
        run_init(Some(path_str), true).unwrap();

        run_check(Some(path_str)).unwrap();
    }

    #[test]
    fn test_check_missing_file() {
        assert!(run_check(Some("/nonexistent/thresholds.toml")).is_err());
    }

    #[test]
    fn test_rules_with_explicit_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thresholds.toml");
        AlertConfig::default().save(&path).unwrap();

        run_rules(OutputFormat::Compact, path.to_str()).unwrap();
    }
}

//! Unified error types for metricwatch
//!
//! This module defines all error types used throughout the application.
//! Uses thiserror for ergonomic error definitions.

use thiserror::Error;

/// Top-level application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Error from a metric source
    #[error("Metric error: {0}")]
    Metric(#[from] MetricError),

    /// Error from configuration parsing/validation
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Error delivering an event to an observer
    #[error("Event delivery error: {0}")]
    Delivery(String),

    /// IO error (file operations, console output)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from metric source operations
///
/// These are always non-fatal to the evaluation loop: a failing source
/// causes the affected check to be skipped for the tick, nothing more.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricError {
    /// The source could not produce a reading right now
    #[error("Metric unavailable: {0}")]
    Unavailable(String),

    /// The source does not provide this capability at all
    #[error("Metric not supported: {0}")]
    NotSupported(String),

    /// The source produced output that could not be interpreted
    #[error("Failed to parse metric data: {0}")]
    Parse(String),
}

/// Errors from configuration parsing and validation
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Failed to parse config file
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid config value
    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },

    /// TOML parsing error
    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_error_display() {
        let err = MetricError::Unavailable("connection stats".to_string());
        assert_eq!(err.to_string(), "Metric unavailable: connection stats");
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::InvalidValue {
            key: "threshold".to_string(),
            message: "must be finite".to_string(),
        };
        assert!(err.to_string().contains("threshold"));
        assert!(err.to_string().contains("must be finite"));
    }

    #[test]
    fn test_error_conversion() {
        let metric_err = MetricError::NotSupported("wifi".to_string());
        let app_err: AppError = metric_err.into();
        assert!(matches!(app_err, AppError::Metric(_)));
    }
}

//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::alerts::types::{format_quantity, ActiveAlert, ThresholdConfig};
use crate::cli::args::OutputFormat;
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// Threshold entry for display
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdRow {
    pub name: String,
    pub kind: String,
    pub metric: String,
    pub threshold: f64,
    pub duration_secs: u64,
    pub severity: String,
}

impl From<&(String, ThresholdConfig)> for ThresholdRow {
    fn from((name, config): &(String, ThresholdConfig)) -> Self {
        Self {
            name: name.clone(),
            kind: config.kind.to_string(),
            metric: format!("{:?}", config.metric),
            threshold: config.threshold,
            duration_secs: config.duration.as_secs(),
            severity: config.severity.to_string(),
        }
    }
}

impl TableDisplay for ThresholdRow {
    fn to_table(&self) -> String {
        format!(
            "{:<28} {:>12} {:>6}s  {:<8} {}",
            self.name,
            format_quantity(self.threshold),
            self.duration_secs,
            self.severity,
            self.kind,
        )
    }

    fn to_compact(&self) -> String {
        format!("{}={}", self.name, self.threshold)
    }
}

/// Threshold listing for display
#[derive(Debug, Clone, Serialize)]
pub struct ThresholdList {
    pub thresholds: Vec<ThresholdRow>,
}

impl ThresholdList {
    /// Build a listing sorted by threshold name
    pub fn new(configs: &[(String, ThresholdConfig)]) -> Self {
        let mut thresholds: Vec<ThresholdRow> = configs.iter().map(ThresholdRow::from).collect();
        thresholds.sort_by(|a, b| a.name.cmp(&b.name));
        Self { thresholds }
    }
}

impl TableDisplay for ThresholdList {
    fn to_table(&self) -> String {
        if self.thresholds.is_empty() {
            return "No thresholds configured".to_string();
        }
        let mut out = format!(
            "{:<28} {:>12} {:>7}  {:<8} {}",
            "NAME", "THRESHOLD", "FOR", "SEVERITY", "KIND"
        );
        for row in &self.thresholds {
            out.push('\n');
            out.push_str(&row.to_table());
        }
        out
    }

    fn to_compact(&self) -> String {
        self.thresholds
            .iter()
            .map(|row| row.to_compact())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Active alert listing for display
#[derive(Debug, Clone, Serialize)]
pub struct ActiveAlertList {
    pub alerts: Vec<ActiveAlertRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActiveAlertRow {
    pub key: String,
    pub severity: String,
    pub current_value: f64,
    pub message: String,
}

impl ActiveAlertList {
    /// Build a listing sorted by alert key
    pub fn new(alerts: impl IntoIterator<Item = (String, ActiveAlert)>) -> Self {
        let mut alerts: Vec<ActiveAlertRow> = alerts
            .into_iter()
            .map(|(key, alert)| ActiveAlertRow {
                key,
                severity: alert.severity.to_string(),
                current_value: alert.current_value,
                message: alert.message,
            })
            .collect();
        alerts.sort_by(|a, b| a.key.cmp(&b.key));
        Self { alerts }
    }
}

impl TableDisplay for ActiveAlertList {
    fn to_table(&self) -> String {
        if self.alerts.is_empty() {
            return "No active alerts".to_string();
        }
        let mut out = String::new();
        for (i, row) in self.alerts.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format!(
                "[{}] {}: {}",
                row.severity, row.key, row.message
            ));
        }
        out
    }
}

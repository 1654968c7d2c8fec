//! Alert notification channels
//!
//! Terminal output for fired alerts, plus a fanout that delivers one alert
//! to every configured channel.

use super::types::{AlertSeverity, FiredAlert};
use crate::error::Result;
use std::io::{self, Write};
use std::time::SystemTime;

/// Notification channel trait
pub trait AlertNotifier: Send + Sync {
    /// Deliver a notification for a fired alert
    fn notify(&self, alert: &FiredAlert) -> Result<()>;

    /// Channel name for identification
    fn name(&self) -> &str;
}

/// Terminal/console notifier
///
/// Writes alerts to stderr (or stdout) with ANSI-colored severity tags.
pub struct TerminalNotifier {
    use_stderr: bool,
    use_colors: bool,
}

impl TerminalNotifier {
    pub fn new() -> Self {
        Self {
            use_stderr: true,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier that uses stdout
    pub fn stdout() -> Self {
        Self {
            use_stderr: false,
            use_colors: Self::supports_color(),
        }
    }

    /// Create a notifier without colors
    pub fn no_color() -> Self {
        Self {
            use_stderr: true,
            use_colors: false,
        }
    }

    fn supports_color() -> bool {
        std::env::var("TERM")
            .map(|term| term != "dumb")
            .unwrap_or(false)
    }

    fn format_alert(&self, alert: &FiredAlert) -> String {
        let timestamp = SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| {
                let secs = d.as_secs();
                let hours = (secs % 86_400) / 3600;
                let mins = (secs % 3600) / 60;
                let secs = secs % 60;
                format!("{:02}:{:02}:{:02}", hours, mins, secs)
            })
            .unwrap_or_else(|_| "??:??:??".to_string());

        format!(
            "[{}] {} {}: {}",
            timestamp,
            self.format_severity(alert.config.severity),
            alert.config.kind,
            alert.message()
        )
    }

    fn format_severity(&self, severity: AlertSeverity) -> String {
        if !self.use_colors {
            return format!("{}", severity);
        }

        let (color_code, text) = match severity {
            AlertSeverity::Info => ("\x1b[36m", "INFO"),         // Cyan
            AlertSeverity::Warning => ("\x1b[33m", "WARNING"),   // Yellow
            AlertSeverity::Critical => ("\x1b[31m", "CRITICAL"), // Red
        };

        format!("{}{}\x1b[0m", color_code, text)
    }
}

impl Default for TerminalNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl AlertNotifier for TerminalNotifier {
    fn notify(&self, alert: &FiredAlert) -> Result<()> {
        let message = self.format_alert(alert);

        if self.use_stderr {
            let stderr = io::stderr();
            let mut handle = stderr.lock();
            writeln!(handle, "{}", message)?;
        } else {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", message)?;
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "terminal"
    }
}

/// Fanout over multiple notification channels
///
/// A failing channel is logged and skipped; the remaining channels still get
/// the alert.
pub struct NotificationFanout {
    notifiers: Vec<Box<dyn AlertNotifier>>,
}

impl NotificationFanout {
    pub fn new() -> Self {
        Self {
            notifiers: Vec::new(),
        }
    }

    pub fn add_notifier(&mut self, notifier: Box<dyn AlertNotifier>) {
        self.notifiers.push(notifier);
    }

    /// Deliver one alert to every channel
    pub fn notify_all(&self, alert: &FiredAlert) {
        for notifier in &self.notifiers {
            if let Err(e) = notifier.notify(alert) {
                log::warn!("Failed to notify via {}: {}", notifier.name(), e);
            }
        }
    }

    pub fn notifier_count(&self) -> usize {
        self.notifiers.len()
    }
}

impl Default for NotificationFanout {
    fn default() -> Self {
        let mut fanout = Self::new();
        fanout.add_notifier(Box::new(TerminalNotifier::new()));
        fanout
    }
}

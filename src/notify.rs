//! Publishing of run summaries outside the terminal.

use std::io::{self, Write};

use notify_rust::{Notification, Timeout};

use crate::cleaner::Report;
use crate::error::{JanitorError, Result};

/// Trait for notification backends
pub trait Notifier: Send + Sync {
    /// Get the name of this backend
    fn name(&self) -> &'static str;

    /// Check if this backend is available on the current system
    fn is_available(&self) -> bool;

    /// Send a generic notification
    fn send(&self, title: &str, body: &str) -> Result<()>;

    /// Publish the summary of a finished run
    fn send_report(&self, report: &Report) -> Result<()> {
        self.send(report_title(report), &report_body(report))
    }
}

/// Title for a finished run
pub fn report_title(report: &Report) -> &'static str {
    if report.cancelled {
        "Cleanup Cancelled"
    } else {
        "Cleanup Complete"
    }
}

/// Summary without its header line
pub fn report_body(report: &Report) -> String {
    let summary = report.summary();
    let body: Vec<&str> = summary.lines().skip(1).collect();
    if body.is_empty() {
        "Nothing to clean".to_string()
    } else {
        body.join("\n")
    }
}

pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn name(&self) -> &'static str {
        "stderr"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn send(&self, title: &str, body: &str) -> Result<()> {
        let mut stderr = io::stderr().lock();
        let write = |stderr: &mut io::StderrLock<'_>| -> io::Result<()> {
            writeln!(stderr, "\n[{}]", title)?;
            writeln!(stderr, "{}", "-".repeat(60))?;
            for line in body.lines() {
                writeln!(stderr, "  {}", line)?;
            }
            Ok(())
        };
        write(&mut stderr).map_err(|e| JanitorError::Other(e.to_string()))
    }
}

pub struct DesktopNotifier {
    app_name: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self {
            app_name: "Rusty Janitor".to_string(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for DesktopNotifier {
    fn name(&self) -> &'static str {
        "desktop"
    }

    fn is_available(&self) -> bool {
        if cfg!(unix) && !cfg!(target_os = "macos") {
            std::env::var("DISPLAY").is_ok() || std::env::var("WAYLAND_DISPLAY").is_ok()
        } else {
            true
        }
    }

    fn send(&self, title: &str, body: &str) -> Result<()> {
        Notification::new()
            .appname(&self.app_name)
            .summary(title)
            .body(body)
            .timeout(Timeout::Milliseconds(10_000))
            .show()
            .map_err(|e| JanitorError::Other(format!("desktop notification failed: {}", e)))?;
        Ok(())
    }
}

/// Desktop notifications when a session is available, else stderr.
pub fn create_notifier() -> Box<dyn Notifier> {
    let desktop = DesktopNotifier::new();
    if desktop.is_available() {
        Box::new(desktop)
    } else {
        tracing::debug!("No desktop session, notifying on stderr");
        Box::new(StderrNotifier)
    }
}

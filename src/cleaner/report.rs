//! Accumulation of per-item outcomes into the final run summary.

use std::fmt;

use serde::Serialize;

use super::hooks::HookResult;
use super::purger::{ItemOutcome, PurgeResult};

const BYTES_PER_GB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Immutable summary of one run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    /// Top-level entries removed across all purge targets.
    pub deleted_count: u32,
    /// Recycle bin size before it was emptied, in GiB.
    pub recycle_bin_size_gb: f64,
    /// Notes, skipped entries and hook results, in recording order.
    pub items: Vec<String>,
    /// The run stopped early on a cancellation request.
    pub cancelled: bool,
}

impl Report {
    /// Render the human-readable summary. Empty sections are omitted.
    pub fn summary(&self) -> String {
        let mut lines = Vec::new();
        lines.push(if self.cancelled {
            "Cleanup cancelled:".to_string()
        } else {
            "Cleanup completed:".to_string()
        });

        if self.deleted_count > 0 {
            lines.push(format!("- {} files deleted", self.deleted_count));
        }
        if self.recycle_bin_size_gb > 0.0 {
            lines.push(format!(
                "- {:.2} GB in Recycle Bin before cleaning",
                self.recycle_bin_size_gb
            ));
        }
        if !self.items.is_empty() {
            lines.push("Details:".to_string());
            lines.extend(self.items.iter().map(|item| format!("  - {}", item)));
        }

        lines.join("\n")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Append-only log owned by a single run.
///
/// `build` consumes the accumulator, so a report is produced at most once.
#[derive(Debug, Default)]
pub struct ReportAccumulator {
    deleted_count: u32,
    recycle_bin_bytes: u64,
    items: Vec<String>,
    cancelled: bool,
}

impl ReportAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deleted(&mut self, count: u32) {
        self.deleted_count = self.deleted_count.saturating_add(count);
    }

    pub fn record_item(&mut self, descriptor: impl Into<String>) {
        self.items.push(descriptor.into());
    }

    pub fn record_recycle_bin(&mut self, size_bytes: u64) {
        self.recycle_bin_bytes = self.recycle_bin_bytes.saturating_add(size_bytes);
    }

    /// Fold one folder purge into the log.
    pub fn record_purge(&mut self, result: PurgeResult) {
        self.record_deleted(result.deleted_count);
        if let Some(note) = result.note {
            self.record_item(note);
        }
        for outcome in result.outcomes {
            if let ItemOutcome::Skipped { path, reason } = outcome {
                self.record_item(format!("Skipped {}: {}", path.display(), reason));
            }
        }
    }

    pub fn record_hook(&mut self, result: HookResult) {
        self.record_item(result.to_string());
    }

    pub fn mark_cancelled(&mut self) {
        self.cancelled = true;
    }

    pub fn build(self) -> Report {
        Report {
            deleted_count: self.deleted_count,
            recycle_bin_size_gb: self.recycle_bin_bytes as f64 / BYTES_PER_GB,
            items: self.items,
            cancelled: self.cancelled,
        }
    }
}

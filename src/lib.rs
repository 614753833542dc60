//! Rusty Janitor - unattended multi-stage system cleanup
//!
//! This crate provides functionality for:
//! - Purging temp folders and emptying the recycle bin
//! - Running pluggable maintenance hooks (power plan, service reduction, ...)
//! - Sequencing stages on a background worker with progress and cancellation
//! - Checking a release feed and fetching the installer

pub mod cleaner;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod notify;
#[cfg(unix)]
pub mod signals;
pub mod update;

// Re-export commonly used types
pub use cleaner::{CleanupOrchestrator, Report, StageConfig};
pub use config::Config;
pub use error::{JanitorError, Result};

//! Cleanup stages and their orchestration.
//!
//! This module provides:
//! - Purging of temp folders
//! - Recycle bin sizing and emptying
//! - Pluggable maintenance hooks
//! - Sequenced, cancellable runs with progress reporting

pub mod hooks;
mod orchestrator;
mod purger;
pub mod recycle_bin;
mod report;
mod stage;
mod targets;

pub use hooks::{HookKind, HookResult, HookSet, MaintenanceHook};
pub use orchestrator::{
    CancelToken, CleanOptions, CleanupOrchestrator, RunEvent, RunHandle, RunState,
};
pub use purger::{EntryKind, FolderPurger, ItemOutcome, PurgeResult};
pub use recycle_bin::{default_gateway, RecycleBinGateway, TrashDirGateway};
pub use report::{Report, ReportAccumulator};
pub use stage::{Stage, StageConfig};
pub use targets::{PurgeTarget, PurgeTargets};

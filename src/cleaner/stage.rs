//! Stage selection and the fixed stage timeline.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::hooks::HookKind;
use crate::error::{JanitorError, Result};

/// Which stages a run executes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Purge temp folders and empty the recycle bin.
    pub purge_temp: bool,
    pub browser_cache: bool,
    pub duplicate_files: bool,
    pub restore_points: bool,
    pub defragment: bool,
    pub import_power_plan: bool,
    pub reduce_services: bool,
}

impl StageConfig {
    /// Every stage enabled.
    pub fn all() -> Self {
        Self {
            purge_temp: true,
            browser_cache: true,
            duplicate_files: true,
            restore_points: true,
            defragment: true,
            import_power_plan: true,
            reduce_services: true,
        }
    }

    /// Only the temp purge (and recycle bin) stage.
    pub fn temp_only() -> Self {
        Self {
            purge_temp: true,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.purge_temp
            || self.browser_cache
            || self.duplicate_files
            || self.restore_points
            || self.defragment
            || self.import_power_plan
            || self.reduce_services)
    }

    /// Reject a configuration with no stage enabled.
    pub fn validate(&self) -> Result<()> {
        if self.is_empty() {
            return Err(JanitorError::NoStagesSelected);
        }
        Ok(())
    }

    pub fn is_enabled(&self, stage: Stage) -> bool {
        match stage {
            Stage::PurgeTemp | Stage::RecycleBin => self.purge_temp,
            Stage::BrowserCache => self.browser_cache,
            Stage::DuplicateFiles => self.duplicate_files,
            Stage::RestorePoints => self.restore_points,
            Stage::Defragment => self.defragment,
            Stage::ImportPowerPlan => self.import_power_plan,
            Stage::ReduceServices => self.reduce_services,
            Stage::Finalize => true,
        }
    }
}

/// One step of the run timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    PurgeTemp,
    BrowserCache,
    DuplicateFiles,
    RecycleBin,
    RestorePoints,
    Defragment,
    ImportPowerPlan,
    ReduceServices,
    Finalize,
}

impl Stage {
    /// Execution order, independent of which stages are enabled.
    pub const ORDER: [Stage; 9] = [
        Stage::PurgeTemp,
        Stage::BrowserCache,
        Stage::DuplicateFiles,
        Stage::RecycleBin,
        Stage::RestorePoints,
        Stage::Defragment,
        Stage::ImportPowerPlan,
        Stage::ReduceServices,
        Stage::Finalize,
    ];

    /// Progress percentage reported once this stage is done.
    pub fn milestone(self) -> u8 {
        match self {
            Stage::PurgeTemp => 10,
            Stage::BrowserCache => 20,
            Stage::DuplicateFiles => 30,
            Stage::RecycleBin => 40,
            Stage::RestorePoints => 50,
            Stage::Defragment => 60,
            Stage::ImportPowerPlan => 70,
            Stage::ReduceServices => 80,
            Stage::Finalize => 100,
        }
    }

    /// The hook backing this stage, if any.
    pub fn hook(self) -> Option<HookKind> {
        match self {
            Stage::BrowserCache => Some(HookKind::BrowserCache),
            Stage::DuplicateFiles => Some(HookKind::DuplicateFiles),
            Stage::RestorePoints => Some(HookKind::RestorePoints),
            Stage::Defragment => Some(HookKind::Defragment),
            Stage::ImportPowerPlan => Some(HookKind::ImportPowerPlan),
            Stage::ReduceServices => Some(HookKind::ReduceServices),
            Stage::PurgeTemp | Stage::RecycleBin | Stage::Finalize => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Stage::PurgeTemp => "Temp folders",
            Stage::RecycleBin => "Recycle bin",
            Stage::Finalize => "Finalize",
            other => other.hook().map(HookKind::label).unwrap_or_default(),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

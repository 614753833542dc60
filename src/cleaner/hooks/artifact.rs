use std::path::PathBuf;
use std::process::Command;

use super::{HookKind, HookResult, MaintenanceHook};
use crate::config::ArtifactsConfig;
use crate::error::{JanitorError, Result};

/// Applies a bundled artifact (power profile, maintenance script) through an
/// OS command. The artifact path is appended as the last argument.
#[derive(Debug, Clone)]
pub struct ArtifactHook {
    kind: HookKind,
    artifact: PathBuf,
    command: Vec<String>,
}

impl ArtifactHook {
    pub fn new(kind: HookKind, artifact: PathBuf, command: Vec<String>) -> Self {
        Self {
            kind,
            artifact,
            command,
        }
    }

    pub fn power_plan(config: &ArtifactsConfig) -> Self {
        Self::new(
            HookKind::ImportPowerPlan,
            config.power_plan_path(),
            config.power_plan_command.clone(),
        )
    }

    pub fn reduce_services(config: &ArtifactsConfig) -> Self {
        Self::new(
            HookKind::ReduceServices,
            config.services_script_path(),
            config.services_command.clone(),
        )
    }

    fn hook_error(&self, message: impl Into<String>) -> JanitorError {
        JanitorError::Hook {
            label: self.kind.label().to_string(),
            message: message.into(),
        }
    }

    fn apply(&self) -> Result<String> {
        let (program, args) = self
            .command
            .split_first()
            .ok_or_else(|| self.hook_error("empty command"))?;

        tracing::info!("Running {} {:?} {}", program, args, self.artifact.display());

        let output = Command::new(program)
            .args(args)
            .arg(&self.artifact)
            .output()
            .map_err(|e| self.hook_error(format!("cannot run {}: {}", program, e)))?;

        if output.status.success() {
            let name = self
                .artifact
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.artifact.display().to_string());
            Ok(format!("Applied {}", name))
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(self.hook_error(format!("{} {}", output.status, stderr.trim())))
        }
    }
}

impl MaintenanceHook for ArtifactHook {
    fn kind(&self) -> HookKind {
        self.kind
    }

    fn invoke(&self) -> HookResult {
        if !self.artifact.is_file() {
            tracing::info!("{} artifact not found: {}", self.kind, self.artifact.display());
            return HookResult::new(
                self.kind,
                format!("Artifact not found: {}", self.artifact.display()),
            );
        }

        match self.apply() {
            Ok(note) => HookResult::new(self.kind, note),
            Err(e) => {
                tracing::warn!("{}", e);
                HookResult::new(self.kind, e.to_string())
            }
        }
    }

    fn has_side_effects(&self) -> bool {
        true
    }
}

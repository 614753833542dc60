use super::{HookKind, HookResult, MaintenanceHook};

/// Stand-in for a capability that has no implementation on this system.
#[derive(Debug, Clone, Copy)]
pub struct PlaceholderHook {
    kind: HookKind,
}

impl PlaceholderHook {
    pub fn new(kind: HookKind) -> Self {
        Self { kind }
    }

    fn note(&self) -> &'static str {
        match self.kind {
            HookKind::BrowserCache => "Checked; no browser cache handler installed",
            HookKind::DuplicateFiles => "Checked; no duplicate file detector installed",
            HookKind::RestorePoints => "Checked; no restore point handler installed",
            HookKind::Defragment => "Checked; no defragmenter installed",
            HookKind::ImportPowerPlan | HookKind::ReduceServices => {
                "Checked; no artifact configured"
            }
        }
    }
}

impl MaintenanceHook for PlaceholderHook {
    fn kind(&self) -> HookKind {
        self.kind
    }

    fn invoke(&self) -> HookResult {
        tracing::debug!("{} placeholder invoked", self.kind);
        HookResult::new(self.kind, self.note())
    }
}

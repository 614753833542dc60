//! Maintenance hooks: optional capabilities invoked by the cleanup stages.
//!
//! Every hook produces exactly one [`HookResult`], success or failure alike.
//! The orchestrator only sees the [`MaintenanceHook`] trait, so a placeholder
//! can be replaced with a real implementation through [`HookSet::with_hook`].

mod artifact;
mod inert;

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use serde::Serialize;

use crate::config::ArtifactsConfig;

pub use artifact::ArtifactHook;
pub use inert::PlaceholderHook;

/// The maintenance capabilities a run can invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookKind {
    BrowserCache,
    DuplicateFiles,
    RestorePoints,
    Defragment,
    ImportPowerPlan,
    ReduceServices,
}

impl HookKind {
    pub const ALL: [HookKind; 6] = [
        HookKind::BrowserCache,
        HookKind::DuplicateFiles,
        HookKind::RestorePoints,
        HookKind::Defragment,
        HookKind::ImportPowerPlan,
        HookKind::ReduceServices,
    ];

    /// Human-readable stage label.
    pub fn label(self) -> &'static str {
        match self {
            HookKind::BrowserCache => "Browser cache",
            HookKind::DuplicateFiles => "Duplicate files",
            HookKind::RestorePoints => "Restore points",
            HookKind::Defragment => "Defragmentation",
            HookKind::ImportPowerPlan => "Power plan",
            HookKind::ReduceServices => "Service reduction",
        }
    }
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one hook invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookResult {
    pub label: String,
    pub note: String,
}

impl HookResult {
    pub fn new(kind: HookKind, note: impl Into<String>) -> Self {
        Self {
            label: kind.label().to_string(),
            note: note.into(),
        }
    }
}

impl fmt::Display for HookResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.note)
    }
}

/// Trait for maintenance capabilities.
///
/// Implementations must not fail the run: internal errors belong in the
/// returned note.
pub trait MaintenanceHook: Send + Sync {
    /// Which capability this hook provides.
    fn kind(&self) -> HookKind;

    /// Run the capability.
    fn invoke(&self) -> HookResult;

    /// Whether invoking changes the system. Such hooks are not invoked in
    /// dry-run mode.
    fn has_side_effects(&self) -> bool {
        false
    }
}

/// The hooks available to a run, one per [`HookKind`].
pub struct HookSet {
    hooks: Vec<Box<dyn MaintenanceHook>>,
}

impl HookSet {
    /// Default hooks: placeholders, plus artifact hooks for the power plan
    /// and the service-reduction script.
    pub fn new(artifacts: &ArtifactsConfig) -> Self {
        Self {
            hooks: vec![
                Box::new(PlaceholderHook::new(HookKind::BrowserCache)),
                Box::new(PlaceholderHook::new(HookKind::DuplicateFiles)),
                Box::new(PlaceholderHook::new(HookKind::RestorePoints)),
                Box::new(PlaceholderHook::new(HookKind::Defragment)),
                Box::new(ArtifactHook::power_plan(artifacts)),
                Box::new(ArtifactHook::reduce_services(artifacts)),
            ],
        }
    }

    /// Hooks that only record that they ran.
    pub fn placeholders() -> Self {
        Self {
            hooks: HookKind::ALL
                .into_iter()
                .map(|kind| Box::new(PlaceholderHook::new(kind)) as Box<dyn MaintenanceHook>)
                .collect(),
        }
    }

    /// Replace the hook registered for `hook.kind()`.
    pub fn with_hook(mut self, hook: Box<dyn MaintenanceHook>) -> Self {
        let kind = hook.kind();
        self.hooks.retain(|h| h.kind() != kind);
        self.hooks.push(hook);
        self
    }

    pub fn get(&self, kind: HookKind) -> Option<&dyn MaintenanceHook> {
        self.hooks
            .iter()
            .find(|h| h.kind() == kind)
            .map(|h| h.as_ref())
    }

    /// Invoke the hook for `kind`. Always yields a result, even if the hook is
    /// missing or panics.
    pub fn invoke(&self, kind: HookKind, dry_run: bool) -> HookResult {
        let Some(hook) = self.get(kind) else {
            return HookResult::new(kind, "No handler registered");
        };

        if dry_run && hook.has_side_effects() {
            return HookResult::new(kind, "Not applied (dry run)");
        }

        match panic::catch_unwind(AssertUnwindSafe(|| hook.invoke())) {
            Ok(result) => result,
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("{} hook panicked: {}", kind, message);
                HookResult::new(kind, format!("Failed: {}", message))
            }
        }
    }
}

impl fmt::Debug for HookSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.hooks.iter().map(|h| h.kind()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingHook {
        kind: HookKind,
        calls: Arc<AtomicUsize>,
        side_effects: bool,
    }

    impl MaintenanceHook for CountingHook {
        fn kind(&self) -> HookKind {
            self.kind
        }

        fn invoke(&self) -> HookResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            HookResult::new(self.kind, "Removed 3 duplicates")
        }

        fn has_side_effects(&self) -> bool {
            self.side_effects
        }
    }

    struct PanickingHook;

    impl MaintenanceHook for PanickingHook {
        fn kind(&self) -> HookKind {
            HookKind::Defragment
        }

        fn invoke(&self) -> HookResult {
            panic!("volume locked")
        }
    }

    #[test]
    fn test_default_set_covers_every_kind() {
        let set = HookSet::new(&ArtifactsConfig::default());
        for kind in HookKind::ALL {
            assert_eq!(set.get(kind).unwrap().kind(), kind);
        }
    }

    #[test]
    fn test_with_hook_replaces_placeholder() {
        let calls = Arc::new(AtomicUsize::new(0));
        let set = HookSet::placeholders().with_hook(Box::new(CountingHook {
            kind: HookKind::DuplicateFiles,
            calls: Arc::clone(&calls),
            side_effects: false,
        }));

        let result = set.invoke(HookKind::DuplicateFiles, false);

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(result.label, "Duplicate files");
        assert_eq!(result.note, "Removed 3 duplicates");
    }

    #[test]
    fn test_dry_run_skips_side_effects() {
        let calls = Arc::new(AtomicUsize::new(0));
        let set = HookSet::placeholders().with_hook(Box::new(CountingHook {
            kind: HookKind::ReduceServices,
            calls: Arc::clone(&calls),
            side_effects: true,
        }));

        let result = set.invoke(HookKind::ReduceServices, true);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(result.note.contains("dry run"));
    }

    #[test]
    fn test_panic_is_folded_into_note() {
        let set = HookSet::placeholders().with_hook(Box::new(PanickingHook));

        let result = set.invoke(HookKind::Defragment, false);

        assert_eq!(result.label, "Defragmentation");
        assert!(result.note.contains("volume locked"));
    }

    #[test]
    fn test_hook_result_display() {
        let result = HookResult::new(HookKind::BrowserCache, "done");
        assert_eq!(result.to_string(), "Browser cache: done");
    }
}

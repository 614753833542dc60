//! Orchestrator for multi-stage cleanup runs.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

use crate::cleaner::hooks::HookSet;
use crate::cleaner::purger::FolderPurger;
use crate::cleaner::recycle_bin::RecycleBinGateway;
use crate::cleaner::report::{Report, ReportAccumulator};
use crate::cleaner::stage::{Stage, StageConfig};
use crate::cleaner::targets::PurgeTargets;
use crate::error::{JanitorError, Result};

/// Room for every milestone plus the completion event, so the worker never
/// blocks on a slow observer.
const EVENT_CAPACITY: usize = Stage::ORDER.len() + 1;

/// Lifecycle of the most recent run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Event published by a background run. Progress events always precede the
/// single `Completed` event.
#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    Progress(u8),
    Completed(Report),
}

/// Options for the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct CleanOptions {
    /// If true, report what would be removed without removing it.
    pub dry_run: bool,
}

/// Cooperative cancellation flag, checked between stages.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Share an existing flag, e.g. one set from a signal handler.
    pub fn from_flag(flag: Arc<AtomicBool>) -> Self {
        Self { flag }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Releases the in-flight slot when dropped.
struct RunGuard {
    in_flight: Arc<AtomicBool>,
}

impl RunGuard {
    fn acquire(in_flight: &Arc<AtomicBool>) -> Result<Self> {
        in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| JanitorError::AlreadyRunning)?;
        Ok(Self {
            in_flight: Arc::clone(in_flight),
        })
    }
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.in_flight.store(false, Ordering::SeqCst);
    }
}

/// Handle to a run executing on a background worker.
#[derive(Debug)]
pub struct RunHandle {
    events: Receiver<RunEvent>,
    cancel: CancelToken,
    worker: JoinHandle<()>,
}

impl RunHandle {
    /// Ordered event stream of the run.
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    /// Request cancellation before the next stage starts.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Block until the run finishes.
    pub fn wait(self) -> Result<Report> {
        self.wait_with(|_| {})
    }

    /// Block until the run finishes, forwarding progress to `on_progress`.
    pub fn wait_with(self, mut on_progress: impl FnMut(u8)) -> Result<Report> {
        let mut report = None;
        for event in self.events.iter() {
            match event {
                RunEvent::Progress(percent) => on_progress(percent),
                RunEvent::Completed(r) => {
                    report = Some(r);
                    break;
                }
            }
        }

        if self.worker.join().is_err() {
            return Err(JanitorError::Other("cleanup worker panicked".to_string()));
        }
        report.ok_or_else(|| JanitorError::Other("cleanup worker exited without a report".into()))
    }
}

/// Sequences the cleanup stages of a run.
///
/// At most one run is in flight per orchestrator; a second request while one
/// is active is rejected with [`JanitorError::AlreadyRunning`].
pub struct CleanupOrchestrator {
    targets: PurgeTargets,
    gateway: Arc<dyn RecycleBinGateway>,
    hooks: HookSet,
    options: CleanOptions,
    purger: FolderPurger,
    in_flight: Arc<AtomicBool>,
    state: Mutex<RunState>,
}

impl CleanupOrchestrator {
    /// Create a new orchestrator.
    pub fn new(
        targets: PurgeTargets,
        gateway: Arc<dyn RecycleBinGateway>,
        hooks: HookSet,
        options: CleanOptions,
    ) -> Self {
        Self {
            targets,
            gateway,
            hooks,
            purger: FolderPurger::new(options.dry_run),
            options,
            in_flight: Arc::new(AtomicBool::new(false)),
            state: Mutex::new(RunState::Idle),
        }
    }

    /// State of the most recent run.
    pub fn state(&self) -> RunState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Run all enabled stages on the calling thread.
    pub fn run(&self, config: &StageConfig) -> Result<Report> {
        self.run_with(config, &CancelToken::new(), |_| {})
    }

    /// Run on the calling thread, reporting progress and honoring `cancel`.
    pub fn run_with(
        &self,
        config: &StageConfig,
        cancel: &CancelToken,
        mut on_progress: impl FnMut(u8),
    ) -> Result<Report> {
        let _guard = self.begin(config)?;
        Ok(self.drive(config, cancel, &mut on_progress))
    }

    /// Run on a background worker. Configuration errors and an active run are
    /// reported here, before the worker starts.
    pub fn spawn(self: &Arc<Self>, config: StageConfig, cancel: CancelToken) -> Result<RunHandle> {
        let guard = self.begin(&config)?;
        let (tx, rx) = mpsc::sync_channel(EVENT_CAPACITY);
        let orchestrator = Arc::clone(self);
        let worker_cancel = cancel.clone();

        let worker = thread::Builder::new()
            .name("cleanup-worker".to_string())
            .spawn(move || {
                let _guard = guard;
                let report = orchestrator.drive(&config, &worker_cancel, &mut |percent| {
                    let _ = tx.send(RunEvent::Progress(percent));
                });
                let _ = tx.send(RunEvent::Completed(report));
            })
            .map_err(|e| JanitorError::Other(format!("cannot start cleanup worker: {}", e)))?;

        Ok(RunHandle {
            events: rx,
            cancel,
            worker,
        })
    }

    fn set_state(&self, state: RunState) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn begin(&self, config: &StageConfig) -> Result<RunGuard> {
        let guard = RunGuard::acquire(&self.in_flight)?;

        if let Err(e) = config.validate() {
            tracing::error!("Cleanup rejected: {}", e);
            self.set_state(RunState::Failed);
            return Err(e);
        }

        self.set_state(RunState::Running);
        Ok(guard)
    }

    /// Run the stages, leaving the state at `Failed` if a stage panics.
    fn drive(
        &self,
        config: &StageConfig,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8),
    ) -> Report {
        match panic::catch_unwind(AssertUnwindSafe(|| {
            self.drive_stages(config, cancel, &mut *on_progress)
        })) {
            Ok(report) => report,
            Err(payload) => {
                tracing::error!("Cleanup worker panicked");
                self.set_state(RunState::Failed);
                panic::resume_unwind(payload)
            }
        }
    }

    fn drive_stages(
        &self,
        config: &StageConfig,
        cancel: &CancelToken,
        on_progress: &mut dyn FnMut(u8),
    ) -> Report {
        let mut acc = ReportAccumulator::new();
        let mut last = 0u8;

        for stage in Stage::ORDER {
            if cancel.is_cancelled() {
                tracing::info!("Cleanup cancelled before stage: {}", stage);
                acc.record_item(format!("Cancelled before {}", stage));
                acc.mark_cancelled();
                self.set_state(RunState::Cancelled);
                return acc.build();
            }

            if stage != Stage::Finalize && config.is_enabled(stage) {
                tracing::info!("Running stage: {}", stage);
                self.run_stage(stage, &mut acc);
            } else {
                tracing::debug!("Skipping stage: {}", stage);
            }

            last = last.max(stage.milestone());
            on_progress(last);
        }

        self.set_state(RunState::Completed);
        acc.build()
    }

    fn run_stage(&self, stage: Stage, acc: &mut ReportAccumulator) {
        match stage {
            Stage::PurgeTemp => {
                for target in self.targets.iter() {
                    let result = self.purger.purge(&target.path);
                    tracing::info!(
                        "{} ({}): {} entries deleted",
                        target.label,
                        target.path.display(),
                        result.deleted_count
                    );
                    acc.record_purge(result);
                }
            }
            Stage::RecycleBin => {
                // Size first, so the report reflects the pre-cleanup state
                let size = self.gateway.query_size();
                acc.record_recycle_bin(size);

                if self.options.dry_run {
                    acc.record_item("Recycle Bin: not emptied (dry run)");
                } else if let Err(e) = self.gateway.empty() {
                    tracing::warn!("Failed to empty {}: {}", self.gateway.name(), e);
                    acc.record_item(format!("Recycle Bin: {}", e));
                }
            }
            Stage::Finalize => {}
            hook_stage => {
                if let Some(kind) = hook_stage.hook() {
                    let result = self.hooks.invoke(kind, self.options.dry_run);
                    tracing::info!("{}", result);
                    acc.record_hook(result);
                }
            }
        }
    }
}

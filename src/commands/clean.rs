//! Clean command implementation.

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};

use crate::cleaner::{
    default_gateway, CancelToken, CleanOptions, CleanupOrchestrator, HookSet, PurgeTargets,
};
use crate::cli::CleanArgs;
use crate::config::Config;
use crate::error::JanitorError;
use crate::notify::create_notifier;

/// Run the clean command.
pub fn run(args: CleanArgs, config: &Config, quiet: bool) -> Result<()> {
    let stages = args.stages().unwrap_or(config.stages);

    let targets = PurgeTargets::resolve(&config.targets);
    for target in targets.iter() {
        tracing::debug!("Purge target {}: {}", target.label, target.path.display());
    }

    let orchestrator = Arc::new(CleanupOrchestrator::new(
        targets,
        default_gateway(&config.recycle_bin),
        HookSet::new(&config.artifacts),
        CleanOptions {
            dry_run: args.dry_run,
        },
    ));

    let cancel_flag = Arc::new(AtomicBool::new(false));
    #[cfg(unix)]
    {
        if let Err(e) = crate::signals::install_cancel_handlers(Arc::clone(&cancel_flag)) {
            tracing::warn!("Cannot install signal handlers: {}", e);
        }
    }

    let handle = match orchestrator.spawn(stages, CancelToken::from_flag(cancel_flag)) {
        Ok(handle) => handle,
        Err(JanitorError::NoStagesSelected) => {
            eprintln!("Error: No cleanup stages selected.");
            eprintln!(
                "Pass --temp, --browser-cache, --duplicates, --restore-points, --defragment, \
                 --power-plan, --reduce-services or --all, or enable stages in the [stages] config section."
            );
            std::process::exit(2);
        }
        Err(e) => return Err(e).context("Failed to start cleanup"),
    };

    if args.dry_run && !args.json && !quiet {
        println!("[DRY RUN] Nothing will be removed.");
    }

    let bar = if args.no_progress || args.json || quiet {
        ProgressBar::hidden()
    } else {
        progress_bar()
    };

    let report = handle
        .wait_with(|percent| bar.set_position(u64::from(percent)))
        .context("Cleanup did not finish")?;
    bar.finish_and_clear();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.summary());
    }

    if args.notify {
        let notifier = create_notifier();
        if let Err(e) = notifier.send_report(&report) {
            tracing::warn!("{} notification failed: {}", notifier.name(), e);
        }
    }

    if report.cancelled {
        std::process::exit(130);
    }

    Ok(())
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{bar:40.cyan/blue}] {pos:>3}%")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    bar
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use nix::sys::signal::{self, SigHandler, Signal};

static CANCEL: OnceLock<Arc<AtomicBool>> = OnceLock::new();

/// Route SIGINT and SIGTERM to `cancel` instead of terminating the process.
///
/// Only the first flag installed is used; later calls re-install the handlers
/// for that same flag.
pub fn install_cancel_handlers(cancel: Arc<AtomicBool>) -> nix::Result<()> {
    let _ = CANCEL.set(cancel);

    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_cancel))?;
        signal::signal(Signal::SIGTERM, SigHandler::Handler(handle_cancel))?;
    }

    Ok(())
}

extern "C" fn handle_cancel(_: i32) {
    if let Some(cancel) = CANCEL.get() {
        cancel.store(true, Ordering::SeqCst);
    }
}

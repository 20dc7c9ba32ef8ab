//! Signal-delivery adapter for graceful shutdown.
//!
//! The locking core exposes a pure `cleanup`; this module is the thin
//! adapter that wires it to OS signal delivery. Handlers are
//! async-signal-safe: they only store the received signal number atomically.
//! The run loop polls [`take_pending`] between units of work and routes a
//! pending signal through [`handle_termination`], which logs, cleans up the
//! lock file, and exits with the documented status
//! ([`exit_codes::SUCCESS`]).

use crate::exit_codes;
use crate::lock;
use crate::logger::Logger;
use std::path::Path;
use std::sync::atomic::{AtomicI32, Ordering};

/// Last received termination signal; 0 means none pending.
static PENDING_SIGNAL: AtomicI32 = AtomicI32::new(0);

/// Install handlers for SIGINT and SIGTERM.
///
/// Must be called before the lock is acquired so no window exists in which
/// a signal could strand a fresh lock file.
#[cfg(unix)]
pub fn install() -> std::io::Result<()> {
    use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

    let action = SigAction::new(
        SigHandler::Handler(store_pending),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );

    unsafe {
        signal::sigaction(Signal::SIGINT, &action)
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
        signal::sigaction(Signal::SIGTERM, &action)
            .map_err(|e| std::io::Error::from_raw_os_error(e as i32))?;
    }

    Ok(())
}

/// No signal wiring on platforms without POSIX delivery; cleanup still runs
/// through the guard on every normal exit path.
#[cfg(not(unix))]
pub fn install() -> std::io::Result<()> {
    Ok(())
}

/// Async-signal-safe handler: stores the signal number, nothing else.
#[cfg(unix)]
extern "C" fn store_pending(signal: std::os::raw::c_int) {
    PENDING_SIGNAL.store(signal, Ordering::SeqCst);
}

/// Take the pending signal number, if one has been delivered since the last
/// call.
pub fn take_pending() -> Option<i32> {
    match PENDING_SIGNAL.swap(0, Ordering::SeqCst) {
        0 => None,
        signal => Some(signal),
    }
}

/// Terminal path for a received signal: clean up the lock file, then exit
/// with [`exit_codes::SUCCESS`].
///
/// The contract is exactly `(signal, lock_path, logger)`; adapters must not
/// thread extra state through it.
pub fn handle_termination(signal: i32, lock_path: &Path, logger: &dyn Logger) -> ! {
    terminate_cleanup(signal, lock_path, logger);
    std::process::exit(exit_codes::SUCCESS);
}

/// Cleanup performed on the termination path, separated so tests can drive
/// it without exiting the process.
fn terminate_cleanup(signal: i32, lock_path: &Path, logger: &dyn Logger) {
    logger.debug(&format!("signal {} received, cleaning up...", signal));
    lock::cleanup(lock_path, logger);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logger::NullLogger;
    use tempfile::TempDir;

    #[test]
    fn termination_cleanup_removes_lock_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("ICD4.lock");
        std::fs::write(&path, "{}").unwrap();

        terminate_cleanup(15, &path, &NullLogger);
        assert!(!path.exists());

        // Idempotent on the already-absent file.
        terminate_cleanup(15, &path, &NullLogger);
    }

    #[test]
    fn handler_contract_is_signal_path_logger() {
        // The termination handler takes the raw signal number, the lock
        // path, and the injected logger — nothing else. Wiring that tries
        // to pass extra state through it does not compile against this
        // signature.
        let _handler: fn(i32, &Path, &dyn Logger) -> ! = handle_termination;
    }

    #[cfg(unix)]
    #[test]
    #[serial_test::serial]
    fn raised_signal_is_observed_as_pending() {
        use nix::sys::signal::{Signal, raise};

        install().unwrap();
        let _ = take_pending();

        raise(Signal::SIGTERM).unwrap();

        assert_eq!(take_pending(), Some(Signal::SIGTERM as i32));
        assert!(take_pending().is_none());
    }
}

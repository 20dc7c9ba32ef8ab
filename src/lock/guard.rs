//! RAII lock guard implementation.

use crate::error::{PicodockError, Result};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

/// RAII guard for an acquired lock.
///
/// The guard owns the open, exclusively-locked file descriptor; the OS
/// advisory lock is released only when the descriptor closes, which happens
/// when the guard is dropped (or at process exit). Dropping the guard also
/// deletes the lock file. If deletion fails, a warning is printed but no
/// panic occurs.
#[derive(Debug)]
pub struct LockGuard {
    /// Open descriptor carrying the exclusive advisory lock.
    _file: File,

    /// Path to the lock file.
    path: PathBuf,

    /// Whether the lock file has already been handled (released or abandoned).
    released: bool,
}

impl LockGuard {
    /// Create a new lock guard owning the locked descriptor.
    pub(super) fn new(file: File, path: PathBuf) -> Self {
        Self {
            _file: file,
            path,
            released: false,
        }
    }

    /// Get the path to the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Manually release the lock, removing the lock file.
    ///
    /// Useful when the caller wants to release before the guard goes out of
    /// scope and handle errors explicitly.
    pub fn release(mut self) -> Result<()> {
        self.released = true;
        fs::remove_file(&self.path).map_err(|e| {
            PicodockError::LockError(format!(
                "failed to release lock '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Drop the descriptor without removing the lock file.
    ///
    /// This leaves the same on-disk state a crashed holder would: the record
    /// persists, the descriptor lock is gone, and recovery is by expiration.
    /// Only a holder that is going away without cleaning up should use this;
    /// the lock tests use it to simulate abnormal termination.
    pub fn abandon(mut self) {
        self.released = true;
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if !self.released
            && let Err(e) = fs::remove_file(&self.path)
        {
            eprintln!(
                "Warning: failed to release lock '{}': {}",
                self.path.display(),
                e
            );
        }
    }
}

//! Advisory file-locking primitive.
//!
//! Exactly one primitive is used everywhere in the locking subsystem: an
//! exclusive, non-blocking advisory lock on an open file handle. The trait
//! keeps the platform backing swappable without touching manager logic.

use fs2::FileExt;
use std::fs::File;
use std::io;

/// Try-acquire-exclusive, non-blocking capability on an open file handle.
///
/// An `Err` with kind [`io::ErrorKind::WouldBlock`] means another live
/// process (or another handle in this process) holds the lock. The lock is
/// released when the handle closes.
pub(super) trait AdvisoryLock {
    fn try_exclusive(&self) -> io::Result<()>;
}

impl AdvisoryLock for File {
    fn try_exclusive(&self) -> io::Result<()> {
        FileExt::try_lock_exclusive(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn second_handle_gets_would_block() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("contended");

        let first = File::create(&path).unwrap();
        first.try_exclusive().unwrap();

        let second = File::open(&path).unwrap();
        let err = second.try_exclusive().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    }

    #[test]
    fn lock_released_when_handle_drops() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("released");

        {
            let holder = File::create(&path).unwrap();
            holder.try_exclusive().unwrap();
        }

        let next = File::open(&path).unwrap();
        next.try_exclusive().unwrap();
    }
}

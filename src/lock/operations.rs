//! Lock manager operations: acquire, freedom check, cleanup.

use super::flock::AdvisoryLock;
use super::guard::LockGuard;
use super::record::LockRecord;
use crate::logger::Logger;
use chrono::Utc;
use std::fs::{self, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// Try to acquire the lock at `lock_path` for `duration_seconds`.
///
/// Returns `Some(LockGuard)` when this call both wrote a fresh record and
/// obtained the exclusive non-blocking descriptor lock; `None` otherwise.
/// `duration_seconds = 0` means "expires immediately": free for the next
/// acquirer, but still exclusive against a racer at the same instant.
///
/// Never blocks, never retries, never panics: a held lock and an I/O failure
/// (permissions, missing directory, full disk) both report as "not acquired",
/// the latter at error severity.
///
/// The open uses create-if-missing semantics, so there is no separate
/// exists-then-create step to race against. The descriptor lock is taken
/// before the freedom check, and the record is overwritten in place while it
/// is held; among N concurrent acquirers racing on a fresh lock, exactly one
/// wins.
pub fn acquire(lock_path: &Path, duration_seconds: u64, logger: &dyn Logger) -> Option<LockGuard> {
    logger.debug(&format!("acquiring lock file: {}", lock_path.display()));

    let mut file = match OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
    {
        Ok(file) => file,
        Err(e) => {
            logger.error(&format!(
                "failed to open lock file '{}': {}",
                lock_path.display(),
                e
            ));
            return None;
        }
    };

    if let Err(e) = file.try_exclusive() {
        if e.kind() == io::ErrorKind::WouldBlock {
            logger.debug("lock is held by another live process; new lock not acquired");
        } else {
            logger.error(&format!("failed to acquire descriptor lock: {}", e));
        }
        return None;
    }

    // Descriptor lock held from here on: the freedom check and the record
    // overwrite below are serialized against every other acquirer.
    let mut content = String::new();
    if let Err(e) = file.read_to_string(&mut content) {
        logger.error(&format!("failed to read lock file: {}", e));
        return None;
    }

    match LockRecord::decode(&content) {
        Ok(record) => {
            let now = Utc::now().timestamp();
            if !record.is_free_at(now) {
                logger.debug(&format!(
                    "existing lock is still valid (expiration {}, now {}); new lock not acquired",
                    record.expiration, now
                ));
                return None;
            }
        }
        Err(e) => {
            // Corrupt state is recoverable, never blocking.
            logger.error(&format!("{}; treating lock as free", e));
        }
    }

    let record = LockRecord::new(duration_seconds);
    if let Err(e) = write_record(&mut file, &record) {
        logger.error(&format!(
            "failed to write lock record to '{}': {}",
            lock_path.display(),
            e
        ));
        return None;
    }

    logger.debug("new lock acquired successfully");
    Some(LockGuard::new(file, lock_path.to_path_buf()))
}

/// Check whether the lock at `lock_path` is free, without mutating it.
///
/// Exposed for the `lock status` command and for tests. The transient
/// descriptor lock taken here is released when the check's handle drops,
/// distinct from the lock a successful [`acquire`] keeps.
///
/// A file that cannot be opened (including an absent one) reports as not
/// free; callers on the acquisition path never depend on this, since
/// [`acquire`] creates the file itself.
pub fn is_free(lock_path: &Path, logger: &dyn Logger) -> bool {
    logger.debug(&format!("checking lock file: {}", lock_path.display()));

    let mut file = match OpenOptions::new().read(true).write(true).open(lock_path) {
        Ok(file) => file,
        Err(e) => {
            logger.error(&format!(
                "failed to open lock file '{}': {}",
                lock_path.display(),
                e
            ));
            return false;
        }
    };

    if let Err(e) = file.try_exclusive() {
        if e.kind() == io::ErrorKind::WouldBlock {
            logger.debug("lock is currently held by another live process");
        } else {
            logger.error(&format!("failed to probe descriptor lock: {}", e));
        }
        return false;
    }

    let mut content = String::new();
    if let Err(e) = file.read_to_string(&mut content) {
        logger.error(&format!("failed to read lock file: {}", e));
        return false;
    }

    match LockRecord::decode(&content) {
        Ok(record) => {
            let now = Utc::now().timestamp();
            logger.debug(&format!(
                "current time: {}, expiration: {}",
                now, record.expiration
            ));
            let free = record.is_free_at(now);
            logger.debug(if free { "lock is free" } else { "lock is held" });
            free
        }
        Err(e) => {
            logger.error(&format!("{}; lock is free", e));
            true
        }
    }
}

/// Remove the lock file if present.
///
/// Idempotent: an already-absent file is not an error. Removal errors are
/// logged, never escalated. Intended to be invoked only by the process that
/// currently owns the lock, on normal exit or on a termination signal.
pub fn cleanup(lock_path: &Path, logger: &dyn Logger) {
    match fs::remove_file(lock_path) {
        Ok(()) => logger.debug("lock file removed successfully"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            logger.debug("lock file already absent; nothing to clean up");
        }
        Err(e) => logger.error(&format!(
            "error during cleanup of '{}': {}",
            lock_path.display(),
            e
        )),
    }
}

/// Overwrite the open lock file with `record` and flush it to disk.
fn write_record(file: &mut fs::File, record: &LockRecord) -> io::Result<()> {
    let json = record
        .encode()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(json.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

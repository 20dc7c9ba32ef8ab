//! Behavior tests for the locking subsystem: mutual exclusion, expiration,
//! stale-lock recovery, and cleanup.

use super::*;
use crate::logger::NullLogger;
use chrono::Utc;
use std::fs;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

/// Largest 32-bit Unix timestamp, used as an anomalous stored expiration.
const MAX_UNIX_TIMESTAMP: i64 = 2_147_483_647;

fn test_lock_path(temp_dir: &TempDir) -> PathBuf {
    temp_dir.path().join("ICD4.lock")
}

#[test]
fn single_acquirer_succeeds_and_creates_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    let guard = acquire(&path, 0, &NullLogger);
    assert!(guard.is_some(), "failed to acquire lock on a fresh path");
    assert!(path.exists(), "lock file was not created on acquisition");
}

#[test]
fn live_holder_denies_concurrent_acquire() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    let holder = acquire(&path, 5, &NullLogger).unwrap();

    // The holder's descriptor lock alone must deny the second acquirer.
    assert!(acquire(&path, 0, &NullLogger).is_none());
    assert!(!is_free(&path, &NullLogger));

    drop(holder);
}

#[test]
fn abandoned_holder_with_time_remaining_denies_acquire() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    // Abandon drops the descriptor lock but leaves the record behind, the
    // state a crashed holder leaves. Five seconds remain on the clock.
    acquire(&path, 5, &NullLogger).unwrap().abandon();

    assert!(path.exists());
    assert!(acquire(&path, 0, &NullLogger).is_none());
    assert!(!is_free(&path, &NullLogger));
}

#[test]
fn stale_record_is_recovered_by_expiration() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    fs::write(&path, r#"{"expiration": 1}"#).unwrap();

    let guard = acquire(&path, 60, &NullLogger);
    assert!(
        guard.is_some(),
        "failed to acquire lock over an expired record"
    );

    // The stale record was overwritten, not merely tolerated.
    let content = fs::read_to_string(&path).unwrap();
    let record = LockRecord::decode(&content).unwrap();
    assert!(record.expiration > Utc::now().timestamp());
}

#[test]
fn anomalous_expiration_is_treated_as_free() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    fs::write(&path, format!(r#"{{"expiration": {}}}"#, MAX_UNIX_TIMESTAMP)).unwrap();
    assert!(is_free(&path, &NullLogger));
    assert!(acquire(&path, 0, &NullLogger).is_some());

    fs::write(&path, format!(r#"{{"expiration": {}}}"#, i64::MAX)).unwrap();
    assert!(acquire(&path, 0, &NullLogger).is_some());
}

#[test]
fn lock_self_releases_after_expiration() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    acquire(&path, 2, &NullLogger).unwrap().abandon();
    assert!(acquire(&path, 0, &NullLogger).is_none());

    thread::sleep(Duration::from_secs(3));

    assert!(
        acquire(&path, 0, &NullLogger).is_some(),
        "failed to acquire lock after expiration"
    );
}

#[test]
fn zero_duration_expires_immediately() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    acquire(&path, 0, &NullLogger).unwrap().abandon();

    // Freedom is strict: at the expiration second itself the lock still
    // reads as held, one second later it is free.
    thread::sleep(Duration::from_secs(2));
    assert!(acquire(&path, 0, &NullLogger).is_some());
}

#[test]
fn exactly_one_winner_under_contention() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let path = path.clone();
            thread::spawn(move || acquire(&path, 60, &NullLogger))
        })
        .collect();

    // Guards are kept alive until every thread has finished, so the winner's
    // descriptor lock stays held for the whole race.
    let results: Vec<Option<LockGuard>> =
        handles.into_iter().map(|h| h.join().unwrap()).collect();

    let winners = results.iter().filter(|r| r.is_some()).count();
    assert_eq!(
        winners, 1,
        "expected exactly one of 10 concurrent acquirers to win, got {}",
        winners
    );
}

#[test]
fn corrupt_content_is_recoverable() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    fs::write(&path, "not json at all {{{").unwrap();

    assert!(is_free(&path, &NullLogger));
    let guard = acquire(&path, 60, &NullLogger);
    assert!(
        guard.is_some(),
        "invalid content must be recoverable, not a block"
    );

    let content = fs::read_to_string(&path).unwrap();
    assert!(LockRecord::decode(&content).is_ok());
}

#[test]
fn cleanup_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    // No file present: must not panic or report through any channel.
    cleanup(&path, &NullLogger);

    acquire(&path, 60, &NullLogger).unwrap().abandon();
    cleanup(&path, &NullLogger);
    assert!(!path.exists());

    cleanup(&path, &NullLogger);
}

#[test]
fn guard_drop_removes_lock_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    let guard = acquire(&path, 60, &NullLogger).unwrap();
    assert!(path.exists());

    drop(guard);
    assert!(!path.exists());

    // And the lock domain is immediately reusable.
    assert!(acquire(&path, 0, &NullLogger).is_some());
}

#[test]
fn guard_manual_release_removes_lock_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    let guard = acquire(&path, 60, &NullLogger).unwrap();
    assert_eq!(guard.path(), path.as_path());

    guard.release().unwrap();
    assert!(!path.exists());
}

#[test]
fn abandon_leaves_record_behind() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    acquire(&path, 60, &NullLogger).unwrap().abandon();

    assert!(path.exists());
    let record = LockRecord::decode(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(record.pid, Some(std::process::id()));
}

#[test]
fn is_free_reports_false_for_absent_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    assert!(!is_free(&path, &NullLogger));
}

#[test]
fn is_free_does_not_mutate_the_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = test_lock_path(&temp_dir);

    let content = r#"{"expiration": 1}"#;
    fs::write(&path, content).unwrap();

    assert!(is_free(&path, &NullLogger));
    assert_eq!(fs::read_to_string(&path).unwrap(), content);

    // The transient probe lock is released once the check returns.
    assert!(acquire(&path, 0, &NullLogger).is_some());
}

#[test]
fn acquire_reports_failure_on_unwritable_path() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("missing-dir").join("ICD4.lock");

    // The locks directory does not exist: an I/O failure, reported as
    // "not acquired" rather than a panic or an error value.
    assert!(acquire(&path, 60, &NullLogger).is_none());
}

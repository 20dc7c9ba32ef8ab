//! Locking subsystem for picodock.
//!
//! This module implements the single-instance execution lock that keeps two
//! processes from driving the same physical programmer over USB at once:
//! - One lock file per hardware resource (the path encodes the programmer
//!   identifier, so distinct programmers never share a lock domain).
//! - An exclusive, non-blocking advisory lock on the open file descriptor is
//!   the true mutual-exclusion primitive. It fails fast: callers that cannot
//!   get it immediately are told "not acquired", never queued.
//! - The file content is a JSON record carrying an `expiration` Unix
//!   timestamp — cooperative metadata for time-based release. A stale record
//!   left behind by a crashed holder is recovered by expiration, not by
//!   deletion: the next acquirer overwrites it once it reads as free.
//!
//! # Lock Records
//!
//! See [`LockRecord`]. An empty record is valid ("freshly created, not yet
//! time-bounded"); malformed content is treated as free, since leftover
//! garbage is more likely than a legitimate hold.
//!
//! # RAII Guards
//!
//! [`acquire`] returns a [`LockGuard`] that owns the exclusively-locked
//! descriptor. Dropping the guard removes the lock file exactly once and
//! releases the descriptor lock; this is what guarantees cleanup on every
//! exit path short of a kill. Signal-triggered exits route through
//! [`cleanup`] instead (see the `signal` module).

mod flock;
mod guard;
mod operations;
mod record;

#[cfg(test)]
mod tests;

pub use guard::LockGuard;
pub use operations::{acquire, cleanup, is_free};
pub use record::{ANOMALY_WINDOW_SECS, CodecError, LockRecord};

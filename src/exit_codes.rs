//! Exit code constants for the picodock CLI.
//!
//! - 0: Success. Also used for signal-triggered graceful shutdown: when
//!   SIGINT/SIGTERM interrupts a run, the lock file is cleaned up and the
//!   process exits with this status deliberately.
//! - 1: User error (bad args, invalid config, unusable environment)
//! - 2: Docker failure (daemon not ready, container command failed)
//! - 3: Lock acquisition failure (another instance is already running or
//!   the lock is still valid) — the distinct status callers script against.

/// Successful execution, including graceful shutdown after a termination signal.
pub const SUCCESS: i32 = 0;

/// User error: bad arguments, invalid configuration, or unusable environment.
pub const USER_ERROR: i32 = 1;

/// Docker failure: daemon not ready after retries, or the container command failed.
pub const DOCKER_FAILURE: i32 = 2;

/// Lock acquisition failure: the hardware lock could not be acquired.
pub const LOCK_FAILURE: i32 = 3;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [SUCCESS, USER_ERROR, DOCKER_FAILURE, LOCK_FAILURE];
        for (i, &a) in codes.iter().enumerate() {
            for (j, &b) in codes.iter().enumerate() {
                if i != j {
                    assert_ne!(a, b, "Exit codes must be distinct");
                }
            }
        }
    }

    #[test]
    fn lock_failure_is_nonzero() {
        assert_ne!(LOCK_FAILURE, SUCCESS);
    }
}

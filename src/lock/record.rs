//! Lock-file codec: the persisted lock record and its JSON form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Sanity bound on stored expirations, in seconds.
///
/// A record whose expiration lies further than this beyond the current time
/// is treated as free: a corrupted or maliciously huge timestamp must never
/// block acquirers forever.
pub const ANOMALY_WINDOW_SECS: i64 = 3600;

/// Decode failure, reported distinctly from "file absent" so the manager
/// can apply its "malformed means free" policy.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("lock file contains invalid content: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The persisted lock state.
///
/// `expiration` is the only field freedom evaluation depends on; 0 (or
/// absent) means "no recorded expiration". The remaining fields identify the
/// holder for diagnostics and are ignored by the freedom policy. Unknown
/// fields in the file are ignored on decode.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LockRecord {
    /// Absolute Unix timestamp (seconds) after which the lock is free.
    #[serde(default)]
    pub expiration: i64,

    /// Holder identity (e.g., `user@HOST`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,

    /// Process ID of the holder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Timestamp when the lock was taken (RFC3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acquired_at: Option<DateTime<Utc>>,
}

impl LockRecord {
    /// Create a record expiring `duration_seconds` from now, stamped with
    /// the current process as holder.
    pub fn new(duration_seconds: u64) -> Self {
        let now = Utc::now();
        let duration = i64::try_from(duration_seconds).unwrap_or(i64::MAX);
        Self {
            expiration: now.timestamp().saturating_add(duration),
            owner: Some(owner_string()),
            pid: Some(std::process::id()),
            acquired_at: Some(now),
        }
    }

    /// Whether this record reads as free at `now` (Unix seconds).
    ///
    /// Free when the expiration has passed, or when it lies beyond the
    /// anomaly window (see [`ANOMALY_WINDOW_SECS`]).
    pub fn is_free_at(&self, now: i64) -> bool {
        self.expiration > now.saturating_add(ANOMALY_WINDOW_SECS) || now > self.expiration
    }

    /// Parse the persisted textual form.
    ///
    /// Empty (or whitespace-only) content is the valid empty record:
    /// "freshly created, not yet time-bounded".
    pub fn decode(content: &str) -> Result<Self, CodecError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(content)?)
    }

    /// Serialize to the persisted textual form.
    pub fn encode(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Holder identity string for lock records.
pub(crate) fn owner_string() -> String {
    let user = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "unknown".to_string());

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    format!("{}@{}", user, host)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_content_is_the_empty_record() {
        let record = LockRecord::decode("").unwrap();
        assert_eq!(record.expiration, 0);
        assert!(record.owner.is_none());

        let record = LockRecord::decode("  \n").unwrap();
        assert_eq!(record, LockRecord::default());
    }

    #[test]
    fn empty_object_is_the_empty_record() {
        let record = LockRecord::decode("{}").unwrap();
        assert_eq!(record, LockRecord::default());
    }

    #[test]
    fn decode_reads_expiration() {
        let record = LockRecord::decode(r#"{"expiration": 1700000000}"#).unwrap();
        assert_eq!(record.expiration, 1_700_000_000);
    }

    #[test]
    fn decode_ignores_unknown_fields() {
        let record =
            LockRecord::decode(r#"{"expiration": 42, "holder_note": "left by an old build"}"#)
                .unwrap();
        assert_eq!(record.expiration, 42);
    }

    #[test]
    fn malformed_content_is_a_distinct_error() {
        let err = LockRecord::decode("not json at all {{{").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn encode_then_decode_preserves_record() {
        let record = LockRecord::new(60);
        let decoded = LockRecord::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(decoded, record);
        assert!(decoded.owner.is_some());
        assert_eq!(decoded.pid, Some(std::process::id()));
    }

    #[test]
    fn new_record_expires_duration_from_now() {
        let before = Utc::now().timestamp();
        let record = LockRecord::new(60);
        let after = Utc::now().timestamp();

        assert!(record.expiration >= before + 60);
        assert!(record.expiration <= after + 60);
    }

    #[test]
    fn freedom_policy() {
        let now = Utc::now().timestamp();

        // No recorded expiration: free.
        assert!(LockRecord::default().is_free_at(now));

        // Past expiration: free. Boundary: now == expiration is still held.
        let past = LockRecord {
            expiration: now - 10,
            ..Default::default()
        };
        assert!(past.is_free_at(now));
        let boundary = LockRecord {
            expiration: now,
            ..Default::default()
        };
        assert!(!boundary.is_free_at(now));

        // Within the window: held.
        let held = LockRecord {
            expiration: now + 60,
            ..Default::default()
        };
        assert!(!held.is_free_at(now));

        // Beyond the anomaly window: free.
        let anomalous = LockRecord {
            expiration: now + ANOMALY_WINDOW_SECS + 1,
            ..Default::default()
        };
        assert!(anomalous.is_free_at(now));
        let max = LockRecord {
            expiration: i64::MAX,
            ..Default::default()
        };
        assert!(max.is_free_at(now));
    }

    #[test]
    fn owner_string_has_user_and_host() {
        let owner = owner_string();
        assert!(owner.contains('@'));
    }
}

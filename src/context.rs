//! Path resolution for picodock state.
//!
//! All state lives under `~/.picodock/`: the configuration file and the
//! per-programmer lock files. Lock paths are keyed by the programmer
//! identifier so distinct physical programmers never share a lock domain.

use crate::error::{PicodockError, Result};
use std::env;
use std::path::{Path, PathBuf};

/// State directory name under the user's home directory.
pub const STATE_DIR_NAME: &str = ".picodock";

/// Resolved paths for picodock state.
///
/// All paths are absolute.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// The user's home directory.
    pub home_dir: PathBuf,

    /// State directory (default: `~/.picodock/`).
    pub state_dir: PathBuf,

    /// Lock files directory (default: `~/.picodock/locks/`).
    pub locks_dir: PathBuf,
}

impl ToolContext {
    /// Resolve the context from the environment.
    pub fn resolve() -> Result<Self> {
        let home = env::var_os("HOME")
            .or_else(|| env::var_os("USERPROFILE"))
            .ok_or_else(|| {
                PicodockError::UserError(
                    "cannot determine home directory: neither HOME nor USERPROFILE is set"
                        .to_string(),
                )
            })?;

        Ok(Self::resolve_from(PathBuf::from(home)))
    }

    /// Resolve the context from a specific home directory.
    ///
    /// This is useful for testing or when the home directory is known.
    pub fn resolve_from<P: AsRef<Path>>(home_dir: P) -> Self {
        let home_dir = home_dir.as_ref().to_path_buf();
        let state_dir = home_dir.join(STATE_DIR_NAME);
        let locks_dir = state_dir.join("locks");

        Self {
            home_dir,
            state_dir,
            locks_dir,
        }
    }

    /// Path to the configuration file.
    pub fn config_path(&self) -> PathBuf {
        self.state_dir.join("config.yaml")
    }

    /// Lock file path for the given programmer identifier.
    pub fn lock_path(&self, programmer_id: &str) -> PathBuf {
        self.locks_dir
            .join(format!("{}.lock", sanitize_component(programmer_id)))
    }
}

/// Reduce an identifier to a safe filename component.
fn sanitize_component(id: &str) -> String {
    let sanitized: String = id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        "default".to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_from_builds_expected_layout() {
        let ctx = ToolContext::resolve_from("/home/dev");

        assert_eq!(ctx.state_dir, PathBuf::from("/home/dev/.picodock"));
        assert_eq!(ctx.locks_dir, PathBuf::from("/home/dev/.picodock/locks"));
        assert_eq!(
            ctx.config_path(),
            PathBuf::from("/home/dev/.picodock/config.yaml")
        );
    }

    #[test]
    fn lock_path_is_keyed_by_programmer() {
        let ctx = ToolContext::resolve_from("/home/dev");

        assert_eq!(
            ctx.lock_path("ICD4"),
            PathBuf::from("/home/dev/.picodock/locks/ICD4.lock")
        );
        assert_ne!(ctx.lock_path("ICD4"), ctx.lock_path("PK5"));
    }

    #[test]
    fn lock_path_sanitizes_unsafe_identifiers() {
        let ctx = ToolContext::resolve_from("/home/dev");

        let path = ctx.lock_path("../oops/serial:01");
        let name = path.file_name().unwrap().to_str().unwrap();
        assert_eq!(name, ".._oops_serial_01.lock");
    }

    #[test]
    fn empty_identifier_falls_back_to_default() {
        let ctx = ToolContext::resolve_from("/home/dev");
        let path = ctx.lock_path("");
        assert_eq!(path.file_name().unwrap().to_str().unwrap(), "default.lock");
    }
}

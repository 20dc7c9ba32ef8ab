//! Configuration model for picodock.
//!
//! This module defines the Config struct that represents
//! `~/.picodock/config.yaml`. It supports forward-compatible YAML parsing
//! (unknown fields are ignored), sensible defaults for every field, and
//! validation of config values. A missing config file yields the defaults.

use crate::error::{PicodockError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_image_name() -> String {
    "mplabx-container".to_string()
}

fn default_image_tag() -> String {
    "v6.20.1".to_string()
}

fn default_programmer_id() -> String {
    "ICD4".to_string()
}

fn default_device() -> String {
    "32MK1024GPK064".to_string()
}

fn default_mplab_version() -> String {
    "v6.20".to_string()
}

fn default_workspace_dir() -> String {
    "/workspace".to_string()
}

fn default_lock_duration() -> u64 {
    0
}

fn default_docker_retry_count() -> u32 {
    3
}

fn default_docker_retry_delay_secs() -> u64 {
    5
}

/// Configuration for picodock.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Docker image name for the MPLAB tool container.
    #[serde(default = "default_image_name")]
    pub image_name: String,

    /// Docker image tag.
    #[serde(default = "default_image_tag")]
    pub image_tag: String,

    /// Programmer identifier: selects the lock domain and the `-TP`
    /// argument passed to ipecmd.
    #[serde(default = "default_programmer_id")]
    pub programmer_id: String,

    /// Target device part number (the `-P` argument).
    #[serde(default = "default_device")]
    pub device: String,

    /// MPLAB X version directory under `/opt/microchip/mplabx/`.
    #[serde(default = "default_mplab_version")]
    pub mplab_version: String,

    /// Workspace mount point inside the container.
    #[serde(default = "default_workspace_dir")]
    pub workspace_dir: String,

    /// Default lock duration in seconds when no flag is given.
    /// 0 means the lock expires immediately.
    #[serde(default = "default_lock_duration")]
    pub lock_duration: u64,

    /// Docker daemon readiness check attempts.
    #[serde(default = "default_docker_retry_count")]
    pub docker_retry_count: u32,

    /// Delay between readiness check attempts, in seconds.
    #[serde(default = "default_docker_retry_delay_secs")]
    pub docker_retry_delay_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            image_name: default_image_name(),
            image_tag: default_image_tag(),
            programmer_id: default_programmer_id(),
            device: default_device(),
            mplab_version: default_mplab_version(),
            workspace_dir: default_workspace_dir(),
            lock_duration: default_lock_duration(),
            docker_retry_count: default_docker_retry_count(),
            docker_retry_delay_secs: default_docker_retry_delay_secs(),
        }
    }
}

impl Config {
    /// Load configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            PicodockError::UserError(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)
            .map_err(|e| PicodockError::UserError(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate config values.
    pub fn validate(&self) -> Result<()> {
        if self.image_name.is_empty() {
            return Err(PicodockError::UserError(
                "config: image_name must not be empty".to_string(),
            ));
        }
        if self.image_tag.is_empty() {
            return Err(PicodockError::UserError(
                "config: image_tag must not be empty".to_string(),
            ));
        }
        if self.programmer_id.is_empty() {
            return Err(PicodockError::UserError(
                "config: programmer_id must not be empty".to_string(),
            ));
        }
        if self.device.is_empty() {
            return Err(PicodockError::UserError(
                "config: device must not be empty".to_string(),
            ));
        }
        if self.docker_retry_count == 0 {
            return Err(PicodockError::UserError(
                "config: docker_retry_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Full image reference, `name:tag`.
    pub fn image(&self) -> String {
        format!("{}:{}", self.image_name, self.image_tag)
    }

    /// Container path of the IPE command-line frontend.
    pub fn ipecmd_path(&self) -> String {
        format!(
            "/opt/microchip/mplabx/{}/mplab_platform/mplab_ipe/ipecmd.sh",
            self.mplab_version
        )
    }

    /// Container path of the MDB debugger.
    pub fn mdb_path(&self) -> String {
        format!(
            "/opt/microchip/mplabx/{}/mplab_platform/bin/mdb.sh",
            self.mplab_version
        )
    }
}

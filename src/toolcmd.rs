//! Vendor tool command construction.
//!
//! Builds the in-container executable path and argument list for each tool.
//! Nothing here talks to Docker; the `docker` module wraps the result in a
//! `docker run` invocation.

use crate::config::Config;
use crate::error::{PicodockError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the throwaway mdb script the scan command writes into the
/// workspace.
pub const HWSCAN_SCRIPT: &str = ".picodock-hwscan.tmp";

/// A fully formed in-container command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    /// Absolute path of the executable inside the container.
    pub exec_command: String,

    /// Arguments passed to it.
    pub arguments: Vec<String>,
}

/// ipecmd invocation programming `hex_file` through the configured
/// programmer: `-P<device> -TP<programmer> -F<hex> -M -OL`.
pub fn ipe_invocation(config: &Config, hex_file: &str) -> ToolInvocation {
    ToolInvocation {
        exec_command: config.ipecmd_path(),
        arguments: vec![
            format!("-P{}", config.device),
            format!("-TP{}", config.programmer_id),
            format!("-F{}", hex_file),
            "-M".to_string(),
            "-OL".to_string(),
        ],
    }
}

/// mdb invocation.
///
/// With no script, starts the debugger bare. With a script and an ELF
/// image, writes a sibling `<script>.tmp` containing the script plus a
/// trailing `Program` command for the image at its workspace path, and runs
/// that. Script paths are kept as given so they resolve the same way inside
/// the container's workspace mount.
pub fn mdb_invocation(
    config: &Config,
    script: Option<&Path>,
    elf: Option<&str>,
) -> Result<ToolInvocation> {
    let arguments = match (script, elf) {
        (None, None) => Vec::new(),
        (Some(script), Some(elf)) => vec![write_program_script(config, script, elf)?],
        (Some(_), None) => {
            return Err(PicodockError::UserError(
                "mdb needs an ELF image to go with the script".to_string(),
            ));
        }
        (None, Some(_)) => {
            return Err(PicodockError::UserError(
                "mdb needs a script to go with the ELF image".to_string(),
            ));
        }
    };

    Ok(ToolInvocation {
        exec_command: config.mdb_path(),
        arguments,
    })
}

/// Write `<script>.tmp` with a trailing `Program` command and return its
/// path as the mdb argument.
fn write_program_script(config: &Config, script: &Path, elf: &str) -> Result<String> {
    let content = fs::read_to_string(script).map_err(|e| {
        PicodockError::UserError(format!(
            "failed to read mdb script '{}': {}",
            script.display(),
            e
        ))
    })?;

    let tmp_name = format!("{}.tmp", script.display());
    let tmp_path = PathBuf::from(&tmp_name);

    let program_line = format!("Program \"{}/{}\"\n", config.workspace_dir, elf);
    fs::write(&tmp_path, format!("{}{}", content, program_line)).map_err(|e| {
        PicodockError::UserError(format!(
            "failed to write mdb script '{}': {}",
            tmp_path.display(),
            e
        ))
    })?;

    Ok(tmp_name)
}

/// `/bin/bash` invocation; `command` is split shell-style into arguments.
pub fn shell_invocation(command: Option<&str>) -> Result<ToolInvocation> {
    let arguments = match command {
        None => Vec::new(),
        Some(raw) => shell_words::split(raw).map_err(|e| {
            PicodockError::UserError(format!(
                "failed to parse shell command '{}': {}\n\
                 Fix: check for unmatched quotes or invalid escape sequences.",
                raw, e
            ))
        })?,
    };

    Ok(ToolInvocation {
        exec_command: "/bin/bash".to_string(),
        arguments,
    })
}

/// mdb invocation that lists attached hardware tools.
///
/// Writes the throwaway `hwtool`/`quit` script into `workspace` (the
/// directory mounted into the container); the caller removes it after the
/// run.
pub fn scan_invocation(config: &Config, workspace: &Path) -> Result<ToolInvocation> {
    let script_path = workspace.join(HWSCAN_SCRIPT);
    fs::write(&script_path, "hwtool\nquit\n").map_err(|e| {
        PicodockError::UserError(format!(
            "failed to write scan script '{}': {}",
            script_path.display(),
            e
        ))
    })?;

    Ok(ToolInvocation {
        exec_command: config.mdb_path(),
        arguments: vec![HWSCAN_SCRIPT.to_string()],
    })
}

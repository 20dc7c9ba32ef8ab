//! Docker daemon readiness and container invocation.
//!
//! Containers run privileged with the USB bus mapped and the caller's
//! working directory mounted as the workspace, so the vendor tools can
//! reach both the programmer hardware and the files being programmed.
//! While a container runs, the child is polled so pending termination
//! signals are serviced; a signal kills the container and routes through
//! the termination path, which cleans up the lock and exits.

use crate::config::Config;
use crate::error::{PicodockError, Result};
use crate::logger::Logger;
use crate::signal;
use crate::toolcmd::ToolInvocation;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::Duration;

/// Child poll interval while a container runs.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Verify the Docker daemon is ready, retrying per the config.
pub fn check_daemon(config: &Config, logger: &dyn Logger) -> Result<()> {
    let command: &[&str] = if cfg!(target_os = "linux") {
        &["systemctl", "is-active", "--quiet", "docker"]
    } else {
        &["docker", "info"]
    };

    for attempt in 1..=config.docker_retry_count {
        let status = Command::new(command[0])
            .args(&command[1..])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        if matches!(status, Ok(s) if s.success()) {
            return Ok(());
        }

        logger.debug(&format!(
            "docker daemon not ready (attempt {}/{})",
            attempt, config.docker_retry_count
        ));
        if attempt < config.docker_retry_count {
            thread::sleep(Duration::from_secs(config.docker_retry_delay_secs));
        }
    }

    logger.error("docker daemon is not running after retries");
    Err(PicodockError::DockerError(
        "daemon is not running after retries".to_string(),
    ))
}

/// Build the `docker run` argument list for a tool invocation.
pub fn run_args(config: &Config, invocation: &ToolInvocation, workspace: &Path) -> Vec<String> {
    let mut args = vec![
        "run".to_string(),
        "--privileged".to_string(),
        "--device=/dev/bus/usb".to_string(),
        "-v".to_string(),
        format!("{}:{}", workspace.display(), config.workspace_dir),
        "-w".to_string(),
        config.workspace_dir.clone(),
        config.image(),
        invocation.exec_command.clone(),
    ];
    args.extend(invocation.arguments.iter().cloned());
    args
}

/// Run a tool container with inherited stdio (interactive tools).
pub fn run_streaming(
    config: &Config,
    invocation: &ToolInvocation,
    lock_path: &Path,
    logger: &dyn Logger,
) -> Result<()> {
    let workspace = current_workspace()?;
    log_exec(invocation, logger);

    let mut child = Command::new("docker")
        .args(run_args(config, invocation, &workspace))
        .spawn()
        .map_err(|e| PicodockError::DockerError(format!("failed to start docker: {}", e)))?;

    let status = wait_with_signals(&mut child, lock_path, logger)?;
    if status.success() {
        logger.info("docker command executed successfully");
        Ok(())
    } else {
        Err(PicodockError::DockerError(format!(
            "docker run exited with {}",
            status
        )))
    }
}

/// Run a tool container and capture its stdout (stderr stays inherited).
pub fn run_capture(
    config: &Config,
    invocation: &ToolInvocation,
    lock_path: &Path,
    logger: &dyn Logger,
) -> Result<String> {
    let workspace = current_workspace()?;
    log_exec(invocation, logger);

    let mut child = Command::new("docker")
        .args(run_args(config, invocation, &workspace))
        .stdout(Stdio::piped())
        .spawn()
        .map_err(|e| PicodockError::DockerError(format!("failed to start docker: {}", e)))?;

    let mut stdout = String::new();
    if let Some(mut pipe) = child.stdout.take() {
        pipe.read_to_string(&mut stdout).map_err(|e| {
            PicodockError::DockerError(format!("failed to read docker output: {}", e))
        })?;
    }

    let status = wait_with_signals(&mut child, lock_path, logger)?;
    if status.success() {
        Ok(stdout)
    } else {
        Err(PicodockError::DockerError(format!(
            "docker run exited with {}",
            status
        )))
    }
}

/// Wait for the child, servicing pending termination signals.
fn wait_with_signals(
    child: &mut Child,
    lock_path: &Path,
    logger: &dyn Logger,
) -> Result<ExitStatus> {
    loop {
        if let Some(sig) = signal::take_pending() {
            let _ = child.kill();
            let _ = child.wait();
            signal::handle_termination(sig, lock_path, logger);
        }

        match child.try_wait() {
            Ok(Some(status)) => return Ok(status),
            Ok(None) => thread::sleep(POLL_INTERVAL),
            Err(e) => {
                return Err(PicodockError::DockerError(format!(
                    "failed to wait for docker: {}",
                    e
                )));
            }
        }
    }
}

fn current_workspace() -> Result<std::path::PathBuf> {
    std::env::current_dir().map_err(|e| {
        PicodockError::UserError(format!("failed to get current working directory: {}", e))
    })
}

fn log_exec(invocation: &ToolInvocation, logger: &dyn Logger) {
    logger.info(&format!(
        "exec: {} {}",
        invocation.exec_command,
        invocation.arguments.join(" ")
    ));
}

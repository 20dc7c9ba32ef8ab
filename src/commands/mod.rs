//! Command implementations for picodock.
//!
//! This module provides the dispatcher that routes CLI commands to their
//! implementations, and the lock-then-run flow shared by every
//! hardware-touching command: resolve paths and config, install signal
//! handlers, acquire the programmer lock, check the Docker daemon, run the
//! containerized tool, and let the guard clean the lock up on the way out.

use crate::cli::{
    Command, IpeArgs, LockAction, LockClearArgs, LockCommand, LockStatusArgs, MdbArgs, RunFlags,
    ScanArgs, ShellArgs,
};
use crate::config::Config;
use crate::context::ToolContext;
use crate::docker;
use crate::error::{PicodockError, Result};
use crate::hwscan;
use crate::lock::{self, LockGuard, LockRecord};
use crate::logger::{Logger, TracingLogger};
use crate::signal;
use crate::toolcmd;
use std::fs;
use std::path::PathBuf;

/// Dispatch a command to its implementation.
pub fn dispatch(command: Command) -> Result<()> {
    match command {
        Command::Ipe(args) => cmd_ipe(args),
        Command::Mdb(args) => cmd_mdb(args),
        Command::Shell(args) => cmd_shell(args),
        Command::Scan(args) => cmd_scan(args),
        Command::Lock(lock_cmd) => dispatch_lock(lock_cmd),
    }
}

/// Dispatch lock subcommands.
fn dispatch_lock(lock_cmd: LockCommand) -> Result<()> {
    match lock_cmd.action {
        LockAction::Status(args) => cmd_lock_status(args),
        LockAction::Clear(args) => cmd_lock_clear(args),
    }
}

/// A hardware session: resolved config, the programmer's lock path, and the
/// held lock guard. Dropping the session releases the lock.
struct Session {
    config: Config,
    lock_path: PathBuf,
    _guard: LockGuard,
}

/// Resolve config, install signal handlers, and acquire the programmer lock.
///
/// Signal handlers go in before the lock is acquired so no window exists in
/// which a signal could strand a fresh lock file. Acquisition failure maps
/// to the distinct lock-failure exit status.
fn open_session(flags: &RunFlags, logger: &dyn Logger) -> Result<Session> {
    let ctx = ToolContext::resolve()?;
    let mut config = Config::load(ctx.config_path())?;
    flags.apply(&mut config);
    config.validate()?;

    signal::install().map_err(|e| {
        PicodockError::UserError(format!("failed to install signal handlers: {}", e))
    })?;

    fs::create_dir_all(&ctx.locks_dir).map_err(|e| {
        PicodockError::UserError(format!(
            "failed to create locks directory '{}': {}",
            ctx.locks_dir.display(),
            e
        ))
    })?;

    let lock_path = ctx.lock_path(&config.programmer_id);
    let Some(guard) = lock::acquire(&lock_path, config.lock_duration, logger) else {
        return Err(PicodockError::LockError(
            "another instance is already running or the lock is still valid".to_string(),
        ));
    };

    docker::check_daemon(&config, logger)?;

    Ok(Session {
        config,
        lock_path,
        _guard: guard,
    })
}

fn cmd_ipe(args: IpeArgs) -> Result<()> {
    let logger = TracingLogger;
    let session = open_session(&args.flags, &logger)?;

    let invocation = toolcmd::ipe_invocation(&session.config, &args.hex_file);
    docker::run_streaming(&session.config, &invocation, &session.lock_path, &logger)
}

fn cmd_mdb(args: MdbArgs) -> Result<()> {
    let logger = TracingLogger;
    let session = open_session(&args.flags, &logger)?;

    let invocation =
        toolcmd::mdb_invocation(&session.config, args.script.as_deref(), args.elf.as_deref())?;
    docker::run_streaming(&session.config, &invocation, &session.lock_path, &logger)
}

fn cmd_shell(args: ShellArgs) -> Result<()> {
    let logger = TracingLogger;
    let session = open_session(&args.flags, &logger)?;

    let invocation = toolcmd::shell_invocation(args.command.as_deref())?;
    docker::run_streaming(&session.config, &invocation, &session.lock_path, &logger)
}

fn cmd_scan(args: ScanArgs) -> Result<()> {
    let logger = TracingLogger;

    // Offline conversion: no Docker, no hardware, no lock.
    if let Some(path) = &args.from_file {
        let captured = fs::read_to_string(path).map_err(|e| {
            PicodockError::UserError(format!(
                "failed to read captured listing '{}': {}",
                path.display(),
                e
            ))
        })?;
        println!("{}", hwscan::hwscan(&captured)?);
        return Ok(());
    }

    let session = open_session(&args.flags, &logger)?;

    let workspace = std::env::current_dir().map_err(|e| {
        PicodockError::UserError(format!("failed to get current working directory: {}", e))
    })?;

    let invocation = toolcmd::scan_invocation(&session.config, &workspace)?;
    let output = docker::run_capture(&session.config, &invocation, &session.lock_path, &logger);

    // The throwaway script goes away whether or not the run succeeded.
    let _ = fs::remove_file(workspace.join(toolcmd::HWSCAN_SCRIPT));

    println!("{}", hwscan::hwscan(&output?)?);
    Ok(())
}

fn cmd_lock_status(args: LockStatusArgs) -> Result<()> {
    let logger = TracingLogger;
    let lock_path = resolve_lock_target(args.programmer.as_deref())?;

    if !lock_path.exists() {
        println!("Lock: {} (absent)", lock_path.display());
        return Ok(());
    }

    let free = lock::is_free(&lock_path, &logger);
    println!(
        "Lock: {} ({})",
        lock_path.display(),
        if free { "free" } else { "held" }
    );

    match fs::read_to_string(&lock_path) {
        Ok(content) => match LockRecord::decode(&content) {
            Ok(record) => {
                println!("Expiration: {}", record.expiration);
                if let Some(owner) = &record.owner {
                    println!("Owner: {}", owner);
                }
                if let Some(pid) = record.pid {
                    println!("PID: {}", pid);
                }
                if let Some(acquired_at) = record.acquired_at {
                    println!("Acquired: {}", acquired_at.to_rfc3339());
                }
            }
            Err(e) => println!("Record: unreadable ({})", e),
        },
        Err(e) => println!("Record: unreadable ({})", e),
    }

    Ok(())
}

fn cmd_lock_clear(args: LockClearArgs) -> Result<()> {
    if !args.force {
        return Err(PicodockError::UserError(
            "refusing to clear the lock without --force".to_string(),
        ));
    }

    let logger = TracingLogger;
    let lock_path = resolve_lock_target(args.programmer.as_deref())?;

    lock::cleanup(&lock_path, &logger);
    println!("Cleared lock: {}", lock_path.display());
    Ok(())
}

/// Resolve the lock path for the lock subcommands.
fn resolve_lock_target(programmer: Option<&str>) -> Result<PathBuf> {
    let ctx = ToolContext::resolve()?;
    let config = Config::load(ctx.config_path())?;
    let programmer = programmer.unwrap_or(&config.programmer_id);
    Ok(ctx.lock_path(programmer))
}

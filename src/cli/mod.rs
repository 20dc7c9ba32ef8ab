//! CLI argument parsing for picodock.
//!
//! Uses clap derive macros for declarative argument definitions.
//! This module defines the command structure; actual implementations
//! are in the `commands` module.

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Picodock: Docker-containerized runner for MPLAB hardware-programming
/// tools.
///
/// Every hardware-touching command first acquires a single-instance lock
/// keyed by the programmer identifier, so two processes never drive the
/// same programmer over USB at once. The lock expires on its own after
/// `--lock-duration` seconds and is cleaned up on exit, including on
/// SIGINT/SIGTERM.
#[derive(Parser, Debug)]
#[command(name = "picodock")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands for picodock.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Program a hex file through the configured programmer.
    ///
    /// Runs the MPLAB IPE command-line frontend inside the container with
    /// `-P<device> -TP<programmer> -F<hex> -M -OL`.
    Ipe(IpeArgs),

    /// Run the MPLAB debugger.
    ///
    /// With no arguments, starts mdb bare. With a script and an ELF image,
    /// appends a Program command for the image and runs the script.
    Mdb(MdbArgs),

    /// Open /bin/bash inside the tool container.
    Shell(ShellArgs),

    /// Enumerate attached hardware tools and print them as JSON.
    ///
    /// Runs mdb's hwtool listing in the container and converts the table
    /// to JSON. With --from-file, converts a previously captured listing
    /// without touching Docker or the lock.
    Scan(ScanArgs),

    /// Lock management commands.
    ///
    /// Inspect or forcibly clear the programmer lock.
    Lock(LockCommand),
}

/// Flags shared by the hardware-touching commands.
#[derive(Parser, Debug, Default)]
pub struct RunFlags {
    /// Lock duration in seconds (0 means the lock expires immediately).
    #[arg(long)]
    pub lock_duration: Option<u64>,

    /// Docker image name.
    #[arg(long)]
    pub image_name: Option<String>,

    /// Docker image tag.
    #[arg(long)]
    pub image_tag: Option<String>,

    /// Programmer identifier (selects the lock domain and the -TP argument).
    #[arg(long)]
    pub programmer: Option<String>,
}

impl RunFlags {
    /// Overlay these flags onto a loaded config.
    pub fn apply(&self, config: &mut Config) {
        if let Some(lock_duration) = self.lock_duration {
            config.lock_duration = lock_duration;
        }
        if let Some(image_name) = &self.image_name {
            config.image_name = image_name.clone();
        }
        if let Some(image_tag) = &self.image_tag {
            config.image_tag = image_tag.clone();
        }
        if let Some(programmer) = &self.programmer {
            config.programmer_id = programmer.clone();
        }
    }
}

/// Arguments for the `ipe` command.
#[derive(Parser, Debug)]
pub struct IpeArgs {
    /// The hex file to program.
    pub hex_file: String,

    #[command(flatten)]
    pub flags: RunFlags,
}

/// Arguments for the `mdb` command.
#[derive(Parser, Debug)]
pub struct MdbArgs {
    /// Debugger script to run.
    pub script: Option<PathBuf>,

    /// ELF image the script programs.
    pub elf: Option<String>,

    #[command(flatten)]
    pub flags: RunFlags,
}

/// Arguments for the `shell` command.
#[derive(Parser, Debug)]
pub struct ShellArgs {
    /// Command line passed to /bin/bash, shell-style quoted.
    pub command: Option<String>,

    #[command(flatten)]
    pub flags: RunFlags,
}

/// Arguments for the `scan` command.
#[derive(Parser, Debug)]
pub struct ScanArgs {
    /// Convert a previously captured listing instead of scanning hardware.
    #[arg(long)]
    pub from_file: Option<PathBuf>,

    #[command(flatten)]
    pub flags: RunFlags,
}

/// Lock subcommands.
#[derive(Parser, Debug)]
pub struct LockCommand {
    #[command(subcommand)]
    pub action: LockAction,
}

/// Available lock actions.
#[derive(Subcommand, Debug)]
pub enum LockAction {
    /// Show whether the programmer lock is held, and by whom.
    Status(LockStatusArgs),

    /// Forcibly remove the lock file.
    ///
    /// Requires --force to prevent accidental clearing. A live holder's
    /// descriptor lock cannot be overridden; this only removes the record.
    Clear(LockClearArgs),
}

/// Arguments for the `lock status` command.
#[derive(Parser, Debug)]
pub struct LockStatusArgs {
    /// Programmer identifier whose lock to inspect.
    #[arg(long)]
    pub programmer: Option<String>,
}

/// Arguments for the `lock clear` command.
#[derive(Parser, Debug)]
pub struct LockClearArgs {
    /// Programmer identifier whose lock to clear.
    #[arg(long)]
    pub programmer: Option<String>,

    /// Force clearing the lock (required for safety).
    #[arg(long)]
    pub force: bool,
}

impl Cli {
    /// Parse command line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

//! dotfile-tracker — commit and push dotfiles whenever they are saved.
//!
//! # Usage
//!
//! ```text
//! dotfile-tracker watch -f <files> -u <user> -b <branch> [-p <repo>]
//! dotfile-tracker status [--lock-file <path>] [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{status::StatusArgs, watch::WatchArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "dotfile-tracker",
    version,
    about = "Monitor dotfiles and autocommit to git",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch files and publish every saved change (runs until interrupted).
    Watch(WatchArgs),

    /// Report whether a watcher currently holds the instance lock.
    Status(StatusArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Watch(args) => args.run(),
        Commands::Status(args) => args.run(),
    }
}

//! CLI command definitions for flow2api-config
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

pub mod inspect;

use clap::{Parser, Subcommand};
use inspect::{GetArgs, OverridesArgs, ShowArgs};

/// Inspect the resolved Flow2API configuration
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: $FLOW2API_CONFIG_PATH or config/setting.toml)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the merged file + environment configuration (default)
    Show(ShowArgs),

    /// List FLOW2API_* environment variables that are set and what they resolved to
    Overrides(OverridesArgs),

    /// Print a single value, e.g. `get server.port`
    Get(GetArgs),
}

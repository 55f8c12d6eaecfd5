//! Flow2API configuration inspector
//!
//! Loads the layered configuration the same way the server does and prints
//! what it resolved to.

use anyhow::Result;
use clap::Parser;
use flow2api_config::cli::inspect::{ShowArgs, run_get, run_overrides, run_show};
use flow2api_config::cli::{Cli, Command};
use flow2api_config::config::{ConfigPaths, ConfigResolver, ProcessEnv};
use std::fs::OpenOptions;
use tracing::{Level, debug};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on --log option
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    let paths = match &cli.config {
        Some(path) => ConfigPaths::with_file(path),
        None => ConfigPaths::discover(),
    };
    debug!("Using config file {}", paths.config_file().display());
    let config = ConfigResolver::load_with(paths, ProcessEnv)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    match cli.command {
        Some(Command::Show(args)) => run_show(&config, &args, &mut out)?,
        Some(Command::Overrides(args)) => run_overrides(&config, &args, &mut out)?,
        Some(Command::Get(args)) => run_get(&config, &args, &mut out)?,
        None => run_show(&config, &ShowArgs::default(), &mut out)?,
    }

    Ok(())
}

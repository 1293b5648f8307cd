// src/lib.rs

pub mod cli;
pub mod commands;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod pid;
pub mod process;
pub mod runtime_cache;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::debug;

pub use cli::{CliArgs, Command};
pub use commands::Services;
pub use errors::SupervisorError;

use crate::config::load_for_project;
use crate::fs::{FileSystem, RealFileSystem};
use crate::process::SystemProcessBackend;

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - project root and config loading
/// - the shared services (pid registry, process controller, runtime cache)
/// - dispatch to the command handler
pub async fn run(args: CliArgs) -> Result<()> {
    let root = project_root(args.root.as_deref())?;
    let config = load_for_project(args.config.as_deref(), &root)?;
    debug!(root = ?root, ?config, "configuration loaded");

    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let mut services = Services::new(root, config, fs, SystemProcessBackend::new());

    match args.command {
        Command::Start(start) => commands::start::run(services, &start).await?,
        Command::Stop => {
            commands::stop::run(&mut services).await?;
        }
        Command::Restart(restart) => commands::restart::run(services, &restart).await?,
        Command::Status => {
            commands::status::run(&mut services);
        }
    }

    Ok(())
}

/// `--root` if given, otherwise the current directory. Must be a directory.
fn project_root(explicit: Option<&Path>) -> Result<PathBuf> {
    let root = match explicit {
        Some(path) => path.to_path_buf(),
        None => std::env::current_dir().context("determining current directory")?,
    };

    if !root.is_dir() {
        return Err(SupervisorError::Configuration(format!(
            "project root {} is not a directory",
            root.display()
        ))
        .into());
    }
    Ok(root)
}

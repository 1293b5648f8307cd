// src/commands/mod.rs

//! Command handlers for `start`, `stop`, `restart` and `status`.
//!
//! The handlers do not share behaviour through a base type; each one takes
//! the [`Services`] bundle and uses the pieces it needs.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::signal::unix::{signal, SignalKind};
use tracing::{info, warn};

use crate::config::ConfigFile;
use crate::errors::Result;
use crate::fs::FileSystem;
use crate::pid::PidRegistry;
use crate::process::{ProcessBackend, ProcessController, StopOutcome};
use crate::runtime_cache::RuntimeCache;

pub mod restart;
pub mod start;
pub mod status;
pub mod stop;

/// Shared services composed into every command handler.
#[derive(Debug)]
pub struct Services<B: ProcessBackend> {
    pub root: PathBuf,
    pub config: ConfigFile,
    pub fs: Arc<dyn FileSystem>,
    pub registry: PidRegistry,
    pub controller: ProcessController<B>,
    pub cache: RuntimeCache,
}

/// What happened to the server named by the pid record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReport {
    /// No (valid) pid record.
    NoRecord,
    /// The record named a process that was no longer running; record removed.
    Stale { pid: u32 },
    Stopped { pid: u32, outcome: StopOutcome },
}

impl<B: ProcessBackend> Services<B> {
    pub fn new(root: PathBuf, config: ConfigFile, fs: Arc<dyn FileSystem>, backend: B) -> Self {
        let registry = PidRegistry::new(config.pid_file(&root), fs.clone());
        let cache = RuntimeCache::new(config.cache_dir(&root), fs.clone());
        Self {
            root,
            config,
            fs,
            registry,
            controller: ProcessController::new(backend),
            cache,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn stop_timeout(&self) -> Duration {
        self.config.stop_timeout()
    }

    /// Stop whatever server the pid record names and remove the record.
    pub async fn stop_recorded(&mut self) -> Result<StopReport> {
        let Some(pid) = self.registry.read() else {
            return Ok(StopReport::NoRecord);
        };

        if !self.controller.is_running(pid) {
            self.registry.clear()?;
            return Ok(StopReport::Stale { pid });
        }

        let outcome = self.controller.stop(Some(pid), self.stop_timeout()).await?;
        self.registry.clear()?;
        Ok(StopReport::Stopped { pid, outcome })
    }

    /// Remove the pid record only if it still names `pid`; a daemonizing
    /// launcher may have replaced it with its own.
    pub(crate) fn release_record(&self, pid: u32) -> Result<()> {
        if self.registry.read() == Some(pid) {
            self.registry.clear()?;
        }
        Ok(())
    }
}

/// Log a stop report the way every command reports it.
pub(crate) fn log_stop_report(report: &StopReport) {
    match report {
        StopReport::NoRecord => {}
        StopReport::Stale { pid } => {
            warn!(pid, "recorded server is not running; removed stale pid record")
        }
        StopReport::Stopped { pid, outcome } => info!(pid, ?outcome, "previous server stopped"),
    }
}

/// Resolves on Ctrl-C or SIGTERM.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl+C"),
        _ = terminate => info!("received SIGTERM"),
    }
}

// src/pid.rs

//! Persisted record of the supervised server's process id.
//!
//! The record is a single file whose whole content is the decimal pid. A
//! record may be stale (the process has since exited); callers must confirm
//! liveness with [`crate::process::ProcessController::is_running`].
//!
//! Nothing guards the file against two supervisors writing it concurrently.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::debug;

use crate::errors::Result;
use crate::fs::FileSystem;

/// Default location of the pid record, relative to the project root. The
/// server launcher writes the same file when it daemonizes.
pub const DEFAULT_PID_FILE: &str = "runtime/hyperf.pid";

#[derive(Debug, Clone)]
pub struct PidRegistry {
    path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl PidRegistry {
    pub fn new(path: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            path: path.into(),
            fs,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored pid, or `None` when the file is missing, unreadable, or does not
    /// hold a positive integer.
    pub fn read(&self) -> Option<u32> {
        if !self.fs.is_file(&self.path) {
            return None;
        }
        let contents = self.fs.read_to_string(&self.path).ok()?;
        let pid = parse_pid(&contents);
        if pid.is_none() {
            debug!(path = ?self.path, "ignoring malformed pid record");
        }
        pid
    }

    pub fn write(&self, pid: u32) -> Result<()> {
        self.fs
            .write(&self.path, pid.to_string().as_bytes())
            .with_context(|| format!("writing pid record {:?}", self.path))?;
        debug!(pid, path = ?self.path, "pid record written");
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        self.fs
            .remove_file(&self.path)
            .with_context(|| format!("removing pid record {:?}", self.path))?;
        Ok(())
    }
}

fn parse_pid(contents: &str) -> Option<u32> {
    // Parse as signed so "-5" is rejected as non-positive rather than malformed.
    match contents.trim().parse::<i64>() {
        Ok(pid) if pid > 0 => u32::try_from(pid).ok(),
        _ => None,
    }
}

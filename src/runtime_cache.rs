// src/runtime_cache.rs

//! The server's generated runtime cache (proxy classes, compiled container),
//! wiped on request before a start so stale code is not served.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::errors::Result;
use crate::fs::FileSystem;

#[derive(Debug, Clone)]
pub struct RuntimeCache {
    dir: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl RuntimeCache {
    pub fn new(dir: impl Into<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            dir: dir.into(),
            fs,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Remove the cache directory. A missing directory is a no-op.
    pub fn clear(&self) -> Result<()> {
        if !self.fs.exists(&self.dir) {
            return Ok(());
        }
        self.fs
            .remove_dir_all(&self.dir)
            .with_context(|| format!("clearing runtime cache {:?}", self.dir))?;
        info!(dir = ?self.dir, "runtime cache cleared");
        Ok(())
    }
}

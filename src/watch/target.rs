// src/watch/target.rs

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Smallest accepted watch interval, in seconds.
pub const MIN_INTERVAL_SECS: u64 = 1;
/// Largest accepted watch interval, in seconds.
pub const MAX_INTERVAL_SECS: u64 = 15;
/// Interval used when none is configured.
pub const DEFAULT_INTERVAL_SECS: u64 = 3;

/// Clamp a requested interval into `[MIN_INTERVAL_SECS, MAX_INTERVAL_SECS]`.
pub fn normalize_interval(requested: i64) -> u64 {
    requested.clamp(MIN_INTERVAL_SECS as i64, MAX_INTERVAL_SECS as i64) as u64
}

/// What to monitor and how often.
///
/// - `dirs` are scanned recursively.
/// - `files` are watched individually and bypass the extension filter.
/// - `extensions` only restrict files found under `dirs`, and only for the
///   polling backend; stored lowercase without a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    dirs: Vec<PathBuf>,
    files: Vec<PathBuf>,
    extensions: Vec<String>,
    interval: Duration,
}

impl WatchTarget {
    pub fn new<E, S>(dirs: Vec<PathBuf>, files: Vec<PathBuf>, extensions: E, interval_secs: i64) -> Self
    where
        E: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let extensions = extensions
            .into_iter()
            .map(|e| e.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        Self {
            dirs,
            files,
            extensions,
            interval: Duration::from_secs(normalize_interval(interval_secs)),
        }
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Case-insensitive extension check for files found under `dirs`.
    pub fn matches_extension(&self, path: &Path) -> bool {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => {
                let ext = ext.to_lowercase();
                self.extensions.iter().any(|allowed| *allowed == ext)
            }
            None => false,
        }
    }
}

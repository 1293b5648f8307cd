// src/watch/polling.rs

//! Signature-scanning change detector.
//!
//! Every call rescans the monitored tree and compares `(name, size, mtime)`
//! per file against the previous scan. No file contents are read.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;
use std::time::SystemTime;

use tracing::{debug, info};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::watch::detector::{ChangeDetector, DetectorKind};
use crate::watch::target::WatchTarget;

/// Comparable summary of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileSignature {
    pub name: String,
    pub size: u64,
    pub modified: SystemTime,
}

pub type SignatureMap = BTreeMap<PathBuf, FileSignature>;

/// A detected difference between two scans.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Added(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
}

pub struct PollingBackend {
    target: WatchTarget,
    fs: Arc<dyn FileSystem>,
    baseline: SignatureMap,
}

impl std::fmt::Debug for PollingBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PollingBackend")
            .field("files", &self.baseline.len())
            .finish_non_exhaustive()
    }
}

impl PollingBackend {
    /// Build the detector and take the baseline scan.
    pub fn new(target: WatchTarget, fs: Arc<dyn FileSystem>) -> Result<Self> {
        let baseline = collect_signatures(&target, fs.as_ref())?;
        debug!(files = baseline.len(), "polling baseline captured");
        Ok(Self {
            target,
            fs,
            baseline,
        })
    }

    pub fn signatures(&self) -> &SignatureMap {
        &self.baseline
    }

    /// One synchronous scan. The baseline is replaced by the fresh scan
    /// whatever the result, so a change is reported once.
    pub fn poll(&mut self) -> Result<Option<Change>> {
        let current = collect_signatures(&self.target, self.fs.as_ref())?;
        let change = first_change(&self.baseline, &current);
        self.baseline = current;
        if let Some(change) = &change {
            info!(?change, "file change detected");
        }
        Ok(change)
    }
}

impl ChangeDetector for PollingBackend {
    fn has_changes(&mut self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async move { Ok(self.poll()?.is_some()) })
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::Polling
    }
}

/// Additions and modifications win over removals; the first one found is
/// returned.
pub fn first_change(old: &SignatureMap, new: &SignatureMap) -> Option<Change> {
    for (path, sig) in new {
        match old.get(path) {
            None => return Some(Change::Added(path.clone())),
            Some(prev) if prev != sig => return Some(Change::Modified(path.clone())),
            Some(_) => {}
        }
    }

    old.keys()
        .find(|path| !new.contains_key(*path))
        .map(|path| Change::Removed(path.clone()))
}

/// Scan every monitored directory (extension-filtered) and explicit file.
///
/// Missing directories and files are skipped; files that disappear between
/// listing and `stat` are skipped too.
pub fn collect_signatures(target: &WatchTarget, fs: &dyn FileSystem) -> Result<SignatureMap> {
    let mut signatures = SignatureMap::new();

    for dir in target.dirs() {
        if !fs.is_dir(dir) {
            continue;
        }
        scan_dir(target, fs, dir, &mut signatures)?;
    }

    for file in target.files() {
        if fs.is_file(file) {
            insert_signature(fs, file, &mut signatures);
        }
    }

    Ok(signatures)
}

fn scan_dir(
    target: &WatchTarget,
    fs: &dyn FileSystem,
    dir: &Path,
    out: &mut SignatureMap,
) -> Result<()> {
    for entry in fs.read_dir(dir)? {
        if fs.is_dir(&entry) {
            scan_dir(target, fs, &entry, out)?;
        } else if fs.is_file(&entry) && target.matches_extension(&entry) {
            insert_signature(fs, &entry, out);
        }
    }
    Ok(())
}

fn insert_signature(fs: &dyn FileSystem, path: &Path, out: &mut SignatureMap) {
    match fs.stat(path) {
        Ok(stat) => {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            out.insert(
                path.to_path_buf(),
                FileSignature {
                    name,
                    size: stat.size,
                    modified: stat.modified,
                },
            );
        }
        Err(e) => debug!(path = ?path, error = %e, "skipping file that could not be stat'ed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;

    fn target() -> WatchTarget {
        WatchTarget::new(
            vec![PathBuf::from("app"), PathBuf::from("config")],
            vec![PathBuf::from(".env")],
            ["php", "env"],
            1,
        )
    }

    #[test]
    fn nested_files_are_scanned_and_filtered() {
        let fs = MockFileSystem::new();
        fs.add_file("app/Http/Controller/Index.php", "<?php");
        fs.add_file("app/Http/notes.txt", "ignored");
        fs.add_file("config/autoload/server.PHP", "<?php");
        fs.add_file(".env", "APP_ENV=dev");
        fs.add_file("README.md", "not monitored");

        let sigs = collect_signatures(&target(), &fs).unwrap();
        let paths: Vec<_> = sigs.keys().cloned().collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from(".env"),
                PathBuf::from("app/Http/Controller/Index.php"),
                PathBuf::from("config/autoload/server.PHP"),
            ]
        );
        assert_eq!(sigs[&PathBuf::from(".env")].name, ".env");
    }

    #[test]
    fn missing_directories_and_files_are_skipped() {
        let fs = MockFileSystem::new();
        let sigs = collect_signatures(&target(), &fs).unwrap();
        assert!(sigs.is_empty());
    }

    #[test]
    fn additions_are_reported_before_removals() {
        let fs = MockFileSystem::new();
        fs.add_file("app/a.php", "a");
        let old = collect_signatures(&target(), &fs).unwrap();

        fs.remove_file(Path::new("app/a.php")).unwrap();
        fs.add_file("app/b.php", "b");
        let new = collect_signatures(&target(), &fs).unwrap();

        assert_eq!(
            first_change(&old, &new),
            Some(Change::Added(PathBuf::from("app/b.php")))
        );
        assert_eq!(
            first_change(&new, &collect_signatures(&target(), &MockFileSystem::new()).unwrap()),
            Some(Change::Removed(PathBuf::from("app/b.php")))
        );
    }

    #[test]
    fn size_change_alone_counts_as_modification() {
        let fs = MockFileSystem::new();
        fs.add_file("app/a.php", "a");
        let old = collect_signatures(&target(), &fs).unwrap();

        let mut new = old.clone();
        if let Some(sig) = new.get_mut(Path::new("app/a.php")) {
            sig.size += 1;
        }
        assert_eq!(
            first_change(&old, &new),
            Some(Change::Modified(PathBuf::from("app/a.php")))
        );
    }
}

// src/watch/event.rs

//! Notification-based change detector built on `notify`.
//!
//! Every directory below the monitored roots, plus every explicit file, gets
//! its own non-recursive watch at construction time. Directories created
//! afterwards are not picked up until the next detector is built (the watch
//! loop builds a new one after every restart).

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::errors::{Result, SupervisorError};
use crate::fs::FileSystem;
use crate::watch::detector::{ChangeDetector, DetectorKind};
use crate::watch::target::WatchTarget;

pub struct EventBackend {
    watcher: RecommendedWatcher,
    watched: Vec<PathBuf>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    target: WatchTarget,
}

impl std::fmt::Debug for EventBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBackend")
            .field("watched", &self.watched)
            .finish_non_exhaustive()
    }
}

impl EventBackend {
    /// Initialise the platform watcher and register all paths.
    ///
    /// Fails with `WatchBackendInit` only when the watcher itself cannot be
    /// created; individual paths that cannot be watched are skipped.
    pub fn new(target: WatchTarget, fs: &dyn FileSystem) -> Result<Self> {
        let (event_tx, events_rx) = mpsc::unbounded_channel::<Event>();

        // Closure called synchronously by notify whenever an event arrives.
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_relevant(&event.kind) {
                        // The receiver is gone once the backend is dropped.
                        let _ = event_tx.send(event);
                    }
                }
                Err(err) => warn!("file watch error: {err}"),
            },
            Config::default(),
        )
        .map_err(|e| SupervisorError::WatchBackendInit(e.to_string()))?;

        let mut watched = Vec::new();
        for path in watch_paths(&target, fs) {
            match watcher.watch(&path, RecursiveMode::NonRecursive) {
                Ok(()) => watched.push(path),
                Err(e) => warn!(path = ?path, error = %e, "could not watch path; skipping"),
            }
        }

        info!(paths = watched.len(), "file watcher started");

        Ok(Self {
            watcher,
            watched,
            events_rx,
            target,
        })
    }

    pub fn watched_paths(&self) -> &[PathBuf] {
        &self.watched
    }

    /// Consume every queued event, returning how many there were.
    fn drain(&mut self) -> usize {
        let mut count = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            debug!(?event, "received notify event");
            count += 1;
        }
        count
    }
}

impl ChangeDetector for EventBackend {
    fn has_changes(&mut self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>> {
        Box::pin(async move {
            sleep(self.target.interval()).await;
            let count = self.drain();
            if count > 0 {
                info!(events = count, "file change detected");
            }
            Ok(count > 0)
        })
    }

    fn kind(&self) -> DetectorKind {
        DetectorKind::Event
    }
}

impl Drop for EventBackend {
    fn drop(&mut self) {
        for path in &self.watched {
            if let Err(e) = self.watcher.unwatch(path) {
                debug!(path = ?path, error = %e, "unwatch failed during teardown");
            }
        }
        debug!(paths = self.watched.len(), "file watcher released");
    }
}

/// Content writes, creations, deletions and renames. Attribute-only changes
/// and plain reads are ignored.
fn is_relevant(kind: &EventKind) -> bool {
    match kind {
        EventKind::Create(_) | EventKind::Remove(_) | EventKind::Any => true,
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Modify(_) => true,
        EventKind::Access(AccessKind::Close(AccessMode::Write)) => true,
        EventKind::Access(_) | EventKind::Other => false,
    }
}

/// Each monitored directory, all of its sub-directories, then the explicit
/// files that exist.
fn watch_paths(target: &WatchTarget, fs: &dyn FileSystem) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    for dir in target.dirs() {
        if fs.is_dir(dir) {
            collect_dirs(fs, dir, &mut paths);
        }
    }
    paths.extend(target.files().iter().filter(|f| fs.exists(f)).cloned());
    paths
}

fn collect_dirs(fs: &dyn FileSystem, dir: &Path, out: &mut Vec<PathBuf>) {
    out.push(dir.to_path_buf());
    match fs.read_dir(dir) {
        Ok(entries) => {
            for entry in entries {
                if fs.is_dir(&entry) {
                    collect_dirs(fs, &entry, out);
                }
            }
        }
        Err(e) => debug!(path = ?dir, error = %e, "could not list directory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFileSystem;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    #[test]
    fn relevant_event_kinds() {
        assert!(is_relevant(&EventKind::Create(CreateKind::File)));
        assert!(is_relevant(&EventKind::Remove(RemoveKind::Any)));
        assert!(is_relevant(&EventKind::Modify(ModifyKind::Data(DataChange::Content))));
        assert!(is_relevant(&EventKind::Access(AccessKind::Close(AccessMode::Write))));
        assert!(!is_relevant(&EventKind::Modify(ModifyKind::Metadata(MetadataKind::Any))));
        assert!(!is_relevant(&EventKind::Access(AccessKind::Read)));
    }

    #[test]
    fn watch_paths_lists_every_subdirectory_and_existing_files() {
        let fs = MockFileSystem::new();
        fs.add_file("app/Http/Controller/Index.php", "<?php");
        fs.add_file("app/Model/User.php", "<?php");
        fs.add_file(".env", "A=1");
        let target = WatchTarget::new(
            vec![PathBuf::from("app"), PathBuf::from("config")],
            vec![PathBuf::from(".env"), PathBuf::from(".env.local")],
            ["php"],
            3,
        );

        let mut paths = watch_paths(&target, &fs);
        paths.sort();
        assert_eq!(
            paths,
            vec![
                PathBuf::from(".env"),
                PathBuf::from("app"),
                PathBuf::from("app/Http"),
                PathBuf::from("app/Http/Controller"),
                PathBuf::from("app/Model"),
            ]
        );
    }
}

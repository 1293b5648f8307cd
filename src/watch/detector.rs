// src/watch/detector.rs

//! Change-detector abstraction and backend selection.
//!
//! The watch loop only sees `Box<dyn ChangeDetector>`. A [`DetectorFactory`]
//! builds a fresh detector for every watch cycle, so file state that changed
//! while the server was restarting becomes the new baseline.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::{Result, SupervisorError};
use crate::fs::FileSystem;
use crate::types::BackendPreference;
use crate::watch::event::EventBackend;
use crate::watch::polling::PollingBackend;
use crate::watch::target::WatchTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorKind {
    /// Filesystem notifications; `has_changes` waits one interval itself.
    Event,
    /// Signature scanning; `has_changes` returns immediately.
    Polling,
}

/// Trait implemented by both change-detection backends.
///
/// Construction captures the baseline, so the first `has_changes` call only
/// reports changes made after the detector was built.
pub trait ChangeDetector: Send {
    fn has_changes(&mut self) -> Pin<Box<dyn Future<Output = Result<bool>> + Send + '_>>;

    fn kind(&self) -> DetectorKind;

    /// Whether `has_changes` already blocks for an interval. When it does
    /// not, the caller sleeps between calls.
    fn waits_internally(&self) -> bool {
        self.kind() == DetectorKind::Event
    }
}

impl fmt::Debug for dyn ChangeDetector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeDetector")
            .field("kind", &self.kind())
            .finish()
    }
}

/// Builds one detector per watch cycle.
pub trait DetectorFactory: Send {
    fn create(&mut self, target: &WatchTarget) -> Result<Box<dyn ChangeDetector>>;
}

/// Builds the notification backend. A `WatchBackendInit` error makes the
/// factory fall back to polling; any other error is returned.
pub type EventInit = fn(&WatchTarget, &dyn FileSystem) -> Result<Box<dyn ChangeDetector>>;

fn notify_backend(target: &WatchTarget, fs: &dyn FileSystem) -> Result<Box<dyn ChangeDetector>> {
    Ok(Box::new(EventBackend::new(target.clone(), fs)?))
}

/// Production factory: notifications first, polling as the fallback.
#[derive(Debug, Clone)]
pub struct DefaultDetectorFactory {
    preference: BackendPreference,
    fs: Arc<dyn FileSystem>,
    event_init: EventInit,
}

impl DefaultDetectorFactory {
    pub fn new(preference: BackendPreference, fs: Arc<dyn FileSystem>) -> Self {
        Self::with_event_init(preference, fs, notify_backend)
    }

    /// Same selection policy over a different notification backend.
    pub fn with_event_init(
        preference: BackendPreference,
        fs: Arc<dyn FileSystem>,
        event_init: EventInit,
    ) -> Self {
        Self {
            preference,
            fs,
            event_init,
        }
    }
}

impl DetectorFactory for DefaultDetectorFactory {
    fn create(&mut self, target: &WatchTarget) -> Result<Box<dyn ChangeDetector>> {
        if self.preference != BackendPreference::Polling {
            match (self.event_init)(target, self.fs.as_ref()) {
                Ok(backend) => {
                    info!("using filesystem notification watcher");
                    return Ok(backend);
                }
                Err(SupervisorError::WatchBackendInit(reason)) => {
                    if self.preference == BackendPreference::Event {
                        warn!(%reason, "notification watcher unavailable; falling back to polling");
                    } else {
                        info!(%reason, "notification watcher unavailable; using polling");
                    }
                }
                Err(other) => return Err(other),
            }
        }

        let backend = PollingBackend::new(target.clone(), Arc::clone(&self.fs))?;
        info!(files = backend.signatures().len(), "using polling file watcher");
        Ok(Box::new(backend))
    }
}

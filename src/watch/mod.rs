// src/watch/mod.rs

//! File watching and change detection.
//!
//! This module is responsible for:
//! - Describing what to monitor (`WatchTarget`).
//! - Two interchangeable detectors behind the `ChangeDetector` trait:
//!   a `notify`-based event backend and a signature-polling backend.
//! - Choosing a backend per watch cycle (`DetectorFactory`).
//!
//! It does **not** know about processes; it only answers "did anything
//! change since the last call?".

pub mod detector;
pub mod event;
pub mod polling;
pub mod target;

pub use detector::{
    ChangeDetector, DefaultDetectorFactory, DetectorFactory, DetectorKind, EventInit,
};
pub use event::EventBackend;
pub use polling::{collect_signatures, Change, FileSignature, PollingBackend, SignatureMap};
pub use target::{
    normalize_interval, WatchTarget, DEFAULT_INTERVAL_SECS, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS,
};

// src/process/mod.rs

//! Process lifecycle layer.
//!
//! - [`launch`] describes the server command line and resolves the executable.
//! - [`backend`] provides the `ProcessBackend` trait and the real
//!   `SystemProcessBackend` (spawning via `tokio::process`, signals via `nix`).
//! - [`controller`] implements the start / probe / graceful-then-forced stop
//!   policy on top of a backend.

pub mod backend;
pub mod controller;
pub mod launch;

pub use backend::{ProcessBackend, ProcessSignal, SystemProcessBackend};
pub use controller::{ProcessController, ProcessHandle, StopOutcome, DEFAULT_STOP_TIMEOUT};
pub use launch::{resolve_executable, LaunchSpec};

// src/engine/mod.rs

//! Watch-and-restart engine.
//!
//! The lifecycle is a four-state machine (`STARTING`, `RUNNING`, `STOPPING`,
//! `ERROR_BACKOFF`) with no terminal state:
//!
//! - The pure transition logic lives in [`core`]: it consumes
//!   [`WatchEvent`]s and answers with the next [`WatchAction`].
//! - The async shell in [`watch_loop`] performs each action against the
//!   process controller, the pid registry and a change detector, and turns
//!   the result back into an event.

use std::time::Duration;

/// Outcome of the action the shell just performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchEvent {
    /// The server was spawned and its pid recorded.
    ChildStarted { pid: u32 },
    /// The change detector reported a modification.
    ChangeDetected,
    /// The liveness probe found the server gone.
    ChildExited { pid: u32 },
    /// The stop sequence finished and the settle delay elapsed.
    Stopped,
    /// Anything in the current cycle failed. `pid` carries a server that was
    /// spawned before the failure so the backoff can stop it.
    Failed { reason: String, pid: Option<u32> },
    /// The error backoff delay elapsed.
    BackoffElapsed,
}

/// What the shell must do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchAction {
    /// Clear the runtime cache if configured, spawn, record the pid.
    Launch,
    /// Build a fresh detector and block until a change or a child death.
    Monitor { pid: u32 },
    /// Stop the server, clear the record, sleep `settle`.
    Stop { pid: u32, settle: Duration },
    /// Best-effort stop of whatever is left, clear the record, sleep `delay`.
    Backoff { pid: Option<u32>, delay: Duration },
}

/// Fixed delays of the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchTimings {
    /// Pause between a completed stop and the next start.
    pub settle: Duration,
    /// Pause after a failed cycle.
    pub backoff: Duration,
}

impl Default for WatchTimings {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            backoff: Duration::from_secs(3),
        }
    }
}

pub mod core;
pub mod watch_loop;

pub use self::core::WatchCore;
pub use crate::types::WatchState;
pub use watch_loop::{WatchLoop, WatchLoopParts};

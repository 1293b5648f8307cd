// src/process/backend.rs

//! Pluggable OS process backend.
//!
//! The controller talks to a `ProcessBackend` instead of calling `kill(2)`
//! directly. Production code uses [`SystemProcessBackend`]; tests provide a
//! fake that records signals and simulates exits on a virtual clock.

use std::collections::HashMap;
use std::process::Stdio;

use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tracing::{debug, info};

use crate::errors::{Result, SupervisorError};
use crate::process::launch::LaunchSpec;

/// Signals the supervisor sends to its child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessSignal {
    /// Cooperative termination request (SIGTERM).
    Terminate,
    /// Unconditional termination (SIGKILL).
    Kill,
}

impl ProcessSignal {
    fn as_nix(self) -> Signal {
        match self {
            ProcessSignal::Terminate => Signal::SIGTERM,
            ProcessSignal::Kill => Signal::SIGKILL,
        }
    }
}

/// Trait abstracting process creation, liveness probing and signalling.
pub trait ProcessBackend: Send {
    /// Spawn a new independent OS process and return its pid.
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<u32>;

    /// Zero-effect liveness probe. Must return `false` (never error) for pids
    /// that do not exist or cannot be signalled.
    fn probe(&mut self, pid: u32) -> bool;

    /// Deliver `signal` to `pid`. A process that is already gone is not an
    /// error.
    fn signal(&mut self, pid: u32, signal: ProcessSignal) -> Result<()>;
}

/// Real backend: `tokio::process` for spawning, `nix` for signals.
///
/// Children spawned through this backend are kept so they can be reaped;
/// otherwise an exited child would linger as a zombie and keep answering
/// the signal-0 probe.
#[derive(Debug, Default)]
pub struct SystemProcessBackend {
    children: HashMap<u32, Child>,
}

impl SystemProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn reap(&mut self, pid: u32) -> bool {
        let Some(child) = self.children.get_mut(&pid) else {
            return false;
        };
        match child.try_wait() {
            Ok(Some(status)) => {
                info!(pid, exit_code = ?status.code(), "server process exited");
                self.children.remove(&pid);
                true
            }
            Ok(None) => false,
            Err(e) => {
                debug!(pid, error = %e, "try_wait failed; falling back to signal probe");
                false
            }
        }
    }
}

fn to_nix_pid(pid: u32) -> Option<Pid> {
    i32::try_from(pid).ok().filter(|p| *p > 0).map(Pid::from_raw)
}

impl ProcessBackend for SystemProcessBackend {
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<u32> {
        let mut cmd = Command::new(&spec.executable);
        cmd.args(spec.argv())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        if let Some(dir) = &spec.working_dir {
            cmd.current_dir(dir);
        }

        if spec.daemonize {
            // Keep terminal signals aimed at the supervisor away from the server.
            cmd.process_group(0);
        }

        let child = cmd.spawn().map_err(|source| SupervisorError::Spawn {
            command: spec.display(),
            source,
        })?;

        let pid = child.id().ok_or_else(|| SupervisorError::Spawn {
            command: spec.display(),
            source: std::io::Error::other("spawned process exited before its pid was read"),
        })?;

        debug!(pid, cmd = %spec.display(), "spawned server process");
        self.children.insert(pid, child);
        Ok(pid)
    }

    fn probe(&mut self, pid: u32) -> bool {
        let Some(nix_pid) = to_nix_pid(pid) else {
            return false;
        };
        if self.reap(pid) {
            return false;
        }
        kill(nix_pid, None).is_ok()
    }

    fn signal(&mut self, pid: u32, signal: ProcessSignal) -> Result<()> {
        let Some(nix_pid) = to_nix_pid(pid) else {
            return Err(SupervisorError::Configuration(format!(
                "refusing to signal invalid pid {pid}"
            )));
        };
        match kill(nix_pid, signal.as_nix()) {
            Ok(()) => Ok(()),
            Err(Errno::ESRCH) => {
                debug!(pid, ?signal, "process already gone");
                Ok(())
            }
            Err(errno) => Err(SupervisorError::Io(std::io::Error::from(errno))),
        }
    }
}

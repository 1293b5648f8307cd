// src/process/controller.rs

//! Start, probe and stop the supervised server.

use std::path::PathBuf;
use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::process::backend::{ProcessBackend, ProcessSignal};
use crate::process::launch::LaunchSpec;

/// Default bound on the graceful-stop wait.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(15);

/// A process started by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessHandle {
    pub pid: u32,
    pub command: PathBuf,
    pub args: Vec<String>,
}

/// How a `stop` request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// Nothing to do: no pid, or the pid was not running. No signal sent.
    NotRunning,
    /// The process exited after the graceful signal.
    Graceful,
    /// The process outlived the timeout and was sent the kill signal.
    Forced,
}

/// Owns the process backend and implements the lifecycle policy on top of
/// it: liveness probing, spawning, graceful stop with forced escalation.
pub struct ProcessController<B: ProcessBackend> {
    backend: B,
    poll_interval: Duration,
    kill_grace: Duration,
}

impl<B: ProcessBackend> std::fmt::Debug for ProcessController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessController")
            .field("poll_interval", &self.poll_interval)
            .field("kill_grace", &self.kill_grace)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend> ProcessController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            poll_interval: Duration::from_secs(1),
            kill_grace: Duration::from_secs(1),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_running(&mut self, pid: u32) -> bool {
        self.backend.probe(pid)
    }

    pub fn start(&mut self, spec: &LaunchSpec) -> Result<ProcessHandle> {
        info!(cmd = %spec.display(), daemonize = spec.daemonize, "starting server process");
        let pid = self.backend.spawn(spec)?;
        Ok(ProcessHandle {
            pid,
            command: spec.executable.clone(),
            args: spec.argv(),
        })
    }

    /// Stop `pid`: graceful signal, poll once per poll interval for up to
    /// `timeout`, then the kill signal plus a short grace period.
    ///
    /// After a forced kill death is not guaranteed; a survivor is only logged.
    pub async fn stop(&mut self, pid: Option<u32>, timeout: Duration) -> Result<StopOutcome> {
        let Some(pid) = pid else {
            return Ok(StopOutcome::NotRunning);
        };
        if !self.is_running(pid) {
            debug!(pid, "stop requested for a process that is not running");
            return Ok(StopOutcome::NotRunning);
        }

        info!(pid, "stopping server process");
        self.backend.signal(pid, ProcessSignal::Terminate)?;

        if self.wait_until_exit(pid, timeout).await {
            info!(pid, "server process stopped");
            return Ok(StopOutcome::Graceful);
        }

        warn!(pid, timeout_secs = timeout.as_secs(), "process did not exit gracefully, forcing kill");
        self.backend.signal(pid, ProcessSignal::Kill)?;
        sleep(self.kill_grace).await;

        if self.is_running(pid) {
            warn!(pid, "process still visible after forced kill");
        } else {
            info!(pid, "server process stopped");
        }
        Ok(StopOutcome::Forced)
    }

    /// Poll until `pid` is gone, with no upper bound.
    pub async fn wait_for_exit(&mut self, pid: u32) {
        while self.is_running(pid) {
            sleep(self.poll_interval).await;
        }
    }

    /// Returns `true` once the process is observed dead, `false` if it is
    /// still alive when `timeout` has elapsed.
    async fn wait_until_exit(&mut self, pid: u32, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if !self.is_running(pid) {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(self.poll_interval).await;
        }
    }
}

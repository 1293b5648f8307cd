// src/engine/watch_loop.rs

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::engine::core::WatchCore;
use crate::engine::{WatchAction, WatchEvent, WatchTimings};
use crate::errors::{Result, SupervisorError};
use crate::pid::PidRegistry;
use crate::process::{LaunchSpec, ProcessBackend, ProcessController};
use crate::runtime_cache::RuntimeCache;
use crate::types::WatchState;
use crate::watch::{DetectorFactory, WatchTarget};

/// Everything the watch loop needs, gathered by the caller.
pub struct WatchLoopParts<B: ProcessBackend, F: DetectorFactory> {
    pub controller: ProcessController<B>,
    pub factory: F,
    pub registry: PidRegistry,
    pub target: WatchTarget,
    pub launch: LaunchSpec,
    pub stop_timeout: Duration,
    /// Cleared before every start when set.
    pub cache: Option<RuntimeCache>,
    pub timings: WatchTimings,
}

/// Async shell around [`WatchCore`].
///
/// Each call to [`WatchLoop::step`] performs the pending action (spawn,
/// monitor, stop, back off), feeds the outcome into the core and stores the
/// next action. Errors never escape a step: they are logged and turned into
/// a backoff.
pub struct WatchLoop<B: ProcessBackend, F: DetectorFactory> {
    core: WatchCore,
    next: WatchAction,
    controller: ProcessController<B>,
    factory: F,
    registry: PidRegistry,
    target: WatchTarget,
    launch: LaunchSpec,
    stop_timeout: Duration,
    cache: Option<RuntimeCache>,
    observer: Option<mpsc::UnboundedSender<WatchState>>,
}

impl<B: ProcessBackend, F: DetectorFactory> fmt::Debug for WatchLoop<B, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchLoop")
            .field("core", &self.core)
            .field("next", &self.next)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<B: ProcessBackend, F: DetectorFactory> WatchLoop<B, F> {
    pub fn new(parts: WatchLoopParts<B, F>) -> Self {
        let core = WatchCore::new(parts.timings);
        let next = core.initial_action();
        Self {
            core,
            next,
            controller: parts.controller,
            factory: parts.factory,
            registry: parts.registry,
            target: parts.target,
            launch: parts.launch,
            stop_timeout: parts.stop_timeout,
            cache: parts.cache,
            observer: None,
        }
    }

    /// Receive every state the loop enters, starting with `STARTING`.
    pub fn with_observer(mut self, observer: mpsc::UnboundedSender<WatchState>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn state(&self) -> WatchState {
        self.core.state()
    }

    pub fn pid(&self) -> Option<u32> {
        self.core.pid()
    }

    pub fn restarts(&self) -> u64 {
        self.core.restarts()
    }

    pub fn controller(&self) -> &ProcessController<B> {
        &self.controller
    }

    /// Run forever.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until `shutdown` resolves, then stop the server and clear the pid
    /// record.
    pub async fn run_until<S>(mut self, shutdown: S) -> Result<()>
    where
        S: Future<Output = ()>,
    {
        info!(
            interval_secs = self.target.interval().as_secs(),
            dirs = ?self.target.dirs(),
            files = ?self.target.files(),
            "watch mode enabled"
        );
        self.publish();

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = self.step() => {}
            }
        }

        info!("shutting down watch loop");
        self.controller.stop(self.core.pid(), self.stop_timeout).await?;
        self.registry.clear()?;
        Ok(())
    }

    /// Perform the pending action and advance the state machine once.
    pub async fn step(&mut self) {
        let action = self.next.clone();
        debug!(?action, state = %self.core.state(), "watch loop action");

        let event = self.perform(action).await;

        let before = self.core.state();
        self.next = self.core.step(event);
        if self.core.state() != before {
            self.publish();
        }
    }

    async fn perform(&mut self, action: WatchAction) -> WatchEvent {
        match action {
            WatchAction::Launch => self.launch_child(),
            WatchAction::Monitor { pid } => match self.monitor(pid).await {
                Ok(event) => event,
                Err(err) => self.failed(err, None),
            },
            WatchAction::Stop { pid, settle } => match self.stop_child(pid).await {
                Ok(()) => {
                    sleep(settle).await;
                    WatchEvent::Stopped
                }
                Err(err) => self.failed(err, None),
            },
            WatchAction::Backoff { pid, delay } => {
                self.cleanup(pid).await;
                sleep(delay).await;
                WatchEvent::BackoffElapsed
            }
        }
    }

    /// Synchronous on purpose: nothing may interrupt the window between
    /// spawning and handing the pid to the core.
    fn launch_child(&mut self) -> WatchEvent {
        if let Some(cache) = &self.cache {
            if let Err(err) = cache.clear() {
                return self.failed(err, None);
            }
        }

        let handle = match self.controller.start(&self.launch) {
            Ok(handle) => handle,
            Err(err) => return self.failed(err, None),
        };

        match self.registry.write(handle.pid) {
            Ok(()) => {
                info!(pid = handle.pid, "server started");
                WatchEvent::ChildStarted { pid: handle.pid }
            }
            Err(err) => self.failed(err, Some(handle.pid)),
        }
    }

    /// Block until the detector reports a change or the server dies. The
    /// detector is dropped, and its OS resources released, on every exit.
    async fn monitor(&mut self, pid: u32) -> Result<WatchEvent> {
        let mut detector = self.factory.create(&self.target)?;
        debug!(pid, kind = ?detector.kind(), "monitoring for changes");

        loop {
            if detector.has_changes().await? {
                info!("file change detected; restarting server");
                return Ok(WatchEvent::ChangeDetected);
            }

            if !detector.waits_internally() {
                sleep(self.target.interval()).await;
            }

            if !self.controller.is_running(pid) {
                error!(error = %SupervisorError::ChildDied(pid), "restarting server");
                return Ok(WatchEvent::ChildExited { pid });
            }
        }
    }

    async fn stop_child(&mut self, pid: u32) -> Result<()> {
        let outcome = self.controller.stop(Some(pid), self.stop_timeout).await?;
        debug!(pid, ?outcome, "server stop finished");
        self.registry.clear()?;
        Ok(())
    }

    /// Best-effort: failures here are logged and the backoff continues.
    async fn cleanup(&mut self, pid: Option<u32>) {
        if let Err(err) = self.controller.stop(pid, self.stop_timeout).await {
            warn!(error = %err, ?pid, "failed to stop server during error backoff");
        }
        if let Err(err) = self.registry.clear() {
            warn!(error = %err, "failed to clear pid record during error backoff");
        }
    }

    fn failed(&self, err: SupervisorError, pid: Option<u32>) -> WatchEvent {
        error!(
            error = %err,
            state = %self.core.state(),
            "watch cycle failed; backing off"
        );
        WatchEvent::Failed {
            reason: err.to_string(),
            pid,
        }
    }

    fn publish(&mut self) {
        let state = self.core.state();
        info!(state = %state, "watch state");
        let dropped = match &self.observer {
            Some(tx) => tx.send(state).is_err(),
            None => false,
        };
        if dropped {
            debug!("watch state observer dropped");
            self.observer = None;
        }
    }
}

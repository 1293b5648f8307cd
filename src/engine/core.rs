// src/engine/core.rs

//! Pure watch-loop state machine.
//!
//! [`WatchCore`] holds the current [`WatchState`] and the pid of the server
//! started in this cycle. `step` applies one [`WatchEvent`] and returns the
//! [`WatchAction`] the IO shell should perform next.
//!
//! No Tokio, no processes, no filesystem: every transition is unit tested
//! directly.

use tracing::{debug, warn};

use crate::engine::{WatchAction, WatchEvent, WatchTimings};
use crate::types::WatchState;

#[derive(Debug, Clone)]
pub struct WatchCore {
    state: WatchState,
    pid: Option<u32>,
    timings: WatchTimings,
    restarts: u64,
}

impl WatchCore {
    /// New core in `STARTING`; the first action is [`WatchCore::initial_action`].
    pub fn new(timings: WatchTimings) -> Self {
        Self {
            state: WatchState::Starting,
            pid: None,
            timings,
            restarts: 0,
        }
    }

    pub fn initial_action(&self) -> WatchAction {
        WatchAction::Launch
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    /// Pid of the server started in the current cycle, if any.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Completed stop-and-restart cycles, whether triggered by a change, a
    /// child death or an error.
    pub fn restarts(&self) -> u64 {
        self.restarts
    }

    pub fn timings(&self) -> WatchTimings {
        self.timings
    }

    /// Apply `event` and return the next action.
    ///
    /// `Failed` is accepted in every state. Any other event that does not
    /// belong to the current state is treated as a failure of the cycle.
    pub fn step(&mut self, event: WatchEvent) -> WatchAction {
        let from = self.state;
        let action = match (self.state, event) {
            (WatchState::Starting, WatchEvent::ChildStarted { pid }) => {
                self.state = WatchState::Running;
                self.pid = Some(pid);
                WatchAction::Monitor { pid }
            }

            (WatchState::Running, WatchEvent::ChangeDetected) => self.begin_stop(),
            (WatchState::Running, WatchEvent::ChildExited { pid }) => {
                debug!(pid, "server exited on its own; restarting");
                self.begin_stop()
            }

            (WatchState::Stopping, WatchEvent::Stopped) => self.begin_start(),
            (WatchState::ErrorBackoff, WatchEvent::BackoffElapsed) => self.begin_start(),

            (_, WatchEvent::Failed { reason, pid }) => {
                debug!(%reason, "watch cycle failed");
                self.pid = self.pid.or(pid);
                self.begin_backoff()
            }

            (state, event) => {
                warn!(%state, ?event, "unexpected watch event; backing off");
                self.begin_backoff()
            }
        };

        if from != self.state {
            debug!(from = %from, to = %self.state, "watch state transition");
        }
        action
    }

    fn begin_stop(&mut self) -> WatchAction {
        self.state = WatchState::Stopping;
        match self.pid {
            Some(pid) => WatchAction::Stop {
                pid,
                settle: self.timings.settle,
            },
            // Running always carries a pid; without one there is nothing to stop.
            None => self.begin_backoff(),
        }
    }

    fn begin_backoff(&mut self) -> WatchAction {
        self.state = WatchState::ErrorBackoff;
        WatchAction::Backoff {
            pid: self.pid,
            delay: self.timings.backoff,
        }
    }

    fn begin_start(&mut self) -> WatchAction {
        self.state = WatchState::Starting;
        self.pid = None;
        self.restarts += 1;
        WatchAction::Launch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn core() -> WatchCore {
        WatchCore::new(WatchTimings::default())
    }

    #[test]
    fn starts_in_starting_with_launch() {
        let core = core();
        assert_eq!(core.state(), WatchState::Starting);
        assert_eq!(core.initial_action(), WatchAction::Launch);
        assert_eq!(core.pid(), None);
    }

    #[test]
    fn change_cycle_goes_running_stopping_starting() {
        let mut core = core();

        let action = core.step(WatchEvent::ChildStarted { pid: 10 });
        assert_eq!(core.state(), WatchState::Running);
        assert_eq!(action, WatchAction::Monitor { pid: 10 });

        let action = core.step(WatchEvent::ChangeDetected);
        assert_eq!(core.state(), WatchState::Stopping);
        assert_eq!(
            action,
            WatchAction::Stop {
                pid: 10,
                settle: Duration::from_secs(1)
            }
        );

        let action = core.step(WatchEvent::Stopped);
        assert_eq!(core.state(), WatchState::Starting);
        assert_eq!(action, WatchAction::Launch);
        assert_eq!(core.pid(), None);
        assert_eq!(core.restarts(), 1);
    }

    #[test]
    fn child_exit_is_handled_like_a_change() {
        let mut core = core();
        core.step(WatchEvent::ChildStarted { pid: 7 });

        let action = core.step(WatchEvent::ChildExited { pid: 7 });
        assert_eq!(core.state(), WatchState::Stopping);
        assert!(matches!(action, WatchAction::Stop { pid: 7, .. }));
    }

    #[test]
    fn spawn_failure_backs_off_without_pid() {
        let mut core = core();
        let action = core.step(WatchEvent::Failed {
            reason: "spawn failed".into(),
            pid: None,
        });

        assert_eq!(core.state(), WatchState::ErrorBackoff);
        assert_eq!(
            action,
            WatchAction::Backoff {
                pid: None,
                delay: Duration::from_secs(3)
            }
        );

        let action = core.step(WatchEvent::BackoffElapsed);
        assert_eq!(core.state(), WatchState::Starting);
        assert_eq!(action, WatchAction::Launch);
    }

    #[test]
    fn failure_while_running_keeps_pid_for_cleanup() {
        let mut core = core();
        core.step(WatchEvent::ChildStarted { pid: 99 });

        let action = core.step(WatchEvent::Failed {
            reason: "detector broke".into(),
            pid: None,
        });
        assert_eq!(
            action,
            WatchAction::Backoff {
                pid: Some(99),
                delay: Duration::from_secs(3)
            }
        );
    }

    #[test]
    fn failure_while_stopping_backs_off() {
        let mut core = core();
        core.step(WatchEvent::ChildStarted { pid: 5 });
        core.step(WatchEvent::ChangeDetected);

        core.step(WatchEvent::Failed {
            reason: "signal failed".into(),
            pid: None,
        });
        assert_eq!(core.state(), WatchState::ErrorBackoff);
        assert_eq!(core.pid(), Some(5));
    }

    #[test]
    fn failure_after_spawn_adopts_the_pid() {
        let mut core = core();
        let action = core.step(WatchEvent::Failed {
            reason: "pid record not writable".into(),
            pid: Some(31),
        });
        assert_eq!(
            action,
            WatchAction::Backoff {
                pid: Some(31),
                delay: Duration::from_secs(3)
            }
        );
        core.step(WatchEvent::BackoffElapsed);
        assert_eq!(core.pid(), None);
    }

    #[test]
    fn out_of_place_event_is_treated_as_failure() {
        let mut core = core();
        let action = core.step(WatchEvent::ChangeDetected);
        assert_eq!(core.state(), WatchState::ErrorBackoff);
        assert!(matches!(action, WatchAction::Backoff { .. }));
    }

    #[test]
    fn custom_timings_flow_into_actions() {
        let timings = WatchTimings {
            settle: Duration::from_millis(10),
            backoff: Duration::from_millis(20),
        };
        let mut core = WatchCore::new(timings);
        core.step(WatchEvent::ChildStarted { pid: 1 });
        assert_eq!(
            core.step(WatchEvent::ChangeDetected),
            WatchAction::Stop {
                pid: 1,
                settle: Duration::from_millis(10)
            }
        );
    }
}

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use reloadctl::errors::{Result, SupervisorError};
use reloadctl::process::{LaunchSpec, ProcessBackend, ProcessSignal};
use tokio::time::Instant;

/// How a fake child reacts to the graceful signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildBehaviour {
    /// Exits `exit_after` (virtual time) after receiving `Terminate`.
    Cooperative { exit_after: Duration },
    /// Ignores `Terminate`; only `Kill` ends it.
    IgnoresTerminate,
}

impl Default for ChildBehaviour {
    fn default() -> Self {
        ChildBehaviour::Cooperative {
            exit_after: Duration::ZERO,
        }
    }
}

#[derive(Debug)]
struct FakeProcess {
    alive: bool,
    exit_at: Option<Instant>,
    behaviour: ChildBehaviour,
}

#[derive(Debug)]
struct FakeState {
    next_pid: u32,
    processes: HashMap<u32, FakeProcess>,
    signals: Vec<(u32, ProcessSignal)>,
    spawned: Vec<LaunchSpec>,
    probes: usize,
    behaviour: ChildBehaviour,
    failing_spawns: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            next_pid: 1000,
            processes: HashMap::new(),
            signals: Vec::new(),
            spawned: Vec::new(),
            probes: 0,
            behaviour: ChildBehaviour::default(),
            failing_spawns: 0,
        }
    }
}

/// A fake process backend that:
/// - hands out increasing pids without creating OS processes
/// - records every signal and spawn
/// - lets children exit on the Tokio clock, so tests can use paused time.
///
/// Clones share state: keep one clone in the test to inspect what the
/// controller did with the other.
#[derive(Debug, Clone, Default)]
pub struct FakeProcessBackend {
    state: Arc<Mutex<FakeState>>,
}

impl FakeProcessBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Behaviour given to processes spawned from now on.
    pub fn with_behaviour(self, behaviour: ChildBehaviour) -> Self {
        self.lock().behaviour = behaviour;
        self
    }

    /// Make the next `n` spawns fail.
    pub fn fail_next_spawns(&self, n: usize) {
        self.lock().failing_spawns = n;
    }

    /// Register a live process that was not spawned through this backend.
    pub fn add_running(&self, pid: u32, behaviour: ChildBehaviour) {
        self.lock().processes.insert(
            pid,
            FakeProcess {
                alive: true,
                exit_at: None,
                behaviour,
            },
        );
    }

    /// Simulate the process dying on its own.
    pub fn kill_externally(&self, pid: u32) {
        if let Some(process) = self.lock().processes.get_mut(&pid) {
            process.alive = false;
        }
    }

    pub fn is_alive(&self, pid: u32) -> bool {
        let mut state = self.lock();
        refresh(&mut state, pid)
    }

    pub fn signals(&self) -> Vec<(u32, ProcessSignal)> {
        self.lock().signals.clone()
    }

    pub fn signals_for(&self, pid: u32) -> Vec<ProcessSignal> {
        self.lock()
            .signals
            .iter()
            .filter(|(p, _)| *p == pid)
            .map(|(_, s)| *s)
            .collect()
    }

    pub fn spawned(&self) -> Vec<LaunchSpec> {
        self.lock().spawned.clone()
    }

    pub fn spawn_count(&self) -> usize {
        self.lock().spawned.len()
    }

    pub fn probe_count(&self) -> usize {
        self.lock().probes
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }
}

fn refresh(state: &mut FakeState, pid: u32) -> bool {
    let Some(process) = state.processes.get_mut(&pid) else {
        return false;
    };
    if let Some(exit_at) = process.exit_at {
        if Instant::now() >= exit_at {
            process.alive = false;
        }
    }
    process.alive
}

impl ProcessBackend for FakeProcessBackend {
    fn spawn(&mut self, spec: &LaunchSpec) -> Result<u32> {
        let mut state = self.lock();
        if state.failing_spawns > 0 {
            state.failing_spawns -= 1;
            return Err(SupervisorError::Spawn {
                command: spec.display(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "fake spawn failure"),
            });
        }

        let pid = state.next_pid;
        state.next_pid += 1;
        let behaviour = state.behaviour;
        state.processes.insert(
            pid,
            FakeProcess {
                alive: true,
                exit_at: None,
                behaviour,
            },
        );
        state.spawned.push(spec.clone());
        Ok(pid)
    }

    fn probe(&mut self, pid: u32) -> bool {
        let mut state = self.lock();
        state.probes += 1;
        refresh(&mut state, pid)
    }

    fn signal(&mut self, pid: u32, signal: ProcessSignal) -> Result<()> {
        let mut state = self.lock();
        state.signals.push((pid, signal));

        let Some(process) = state.processes.get_mut(&pid) else {
            return Ok(());
        };
        match (signal, process.behaviour) {
            (ProcessSignal::Kill, _) => process.alive = false,
            (ProcessSignal::Terminate, ChildBehaviour::Cooperative { exit_after }) => {
                let at = Instant::now() + exit_after;
                process.exit_at = Some(process.exit_at.map_or(at, |prev| prev.min(at)));
            }
            (ProcessSignal::Terminate, ChildBehaviour::IgnoresTerminate) => {}
        }
        Ok(())
    }
}

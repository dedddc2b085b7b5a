//! Scripted in-memory backend for supervisor and ladder tests.

use std::collections::HashSet;
use std::time::Duration;

use parking_lot::Mutex;

use crate::domain::{ProcessHandle, SignalKind, WorkerCommand};
use crate::error::{LaunchError, SignalError};
use crate::ports::ProcessBackend;

/// How fake workers react to signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Behaviour {
    /// Exits on any signal.
    #[default]
    Cooperative,
    /// Traps the cooperative signal, dies on a forceful one.
    IgnoresCooperative,
    /// Left its process group; only a direct forceful signal reaches it.
    DetachedFromGroup,
    /// Survives everything.
    Unkillable,
    /// Every signal send fails with EPERM.
    SignalsDenied,
    /// The group is gone by the time it is resolved.
    GroupVanished,
}

#[derive(Debug, Default)]
struct FakeState {
    next_pid: u32,
    alive: HashSet<u32>,
    launches: usize,
    signals: Vec<(&'static str, SignalKind)>,
    behaviour: Behaviour,
    launch_error: Option<String>,
}

#[derive(Debug, Default)]
pub struct FakeBackend {
    state: Mutex<FakeState>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                next_pid: 10_000,
                ..FakeState::default()
            }),
        }
    }

    pub fn set_behaviour(&self, behaviour: Behaviour) {
        self.state.lock().behaviour = behaviour;
    }

    pub fn fail_launches(&self, message: Option<&str>) {
        self.state.lock().launch_error = message.map(str::to_string);
    }

    /// Simulate the worker dying outside the supervisor.
    pub fn crash(&self, handle: &ProcessHandle) {
        self.state.lock().alive.remove(&handle.pid);
    }

    pub fn launches(&self) -> usize {
        self.state.lock().launches
    }

    pub fn alive_count(&self) -> usize {
        self.state.lock().alive.len()
    }

    pub fn signals(&self) -> Vec<(&'static str, SignalKind)> {
        self.state.lock().signals.clone()
    }

    /// Number of ladders started (each begins with a cooperative group signal).
    pub fn escalations(&self) -> usize {
        self.state
            .lock()
            .signals
            .iter()
            .filter(|s| **s == ("group", SignalKind::Cooperative))
            .count()
    }

    fn deliver(&self, pid: u32, target: &'static str, kind: SignalKind) -> Result<(), SignalError> {
        let mut state = self.state.lock();
        state.signals.push((target, kind));

        if !state.alive.contains(&pid) {
            return Err(SignalError::ProcessNotFound(pid));
        }

        let dies = match state.behaviour {
            Behaviour::Cooperative => true,
            Behaviour::IgnoresCooperative => kind == SignalKind::Forceful,
            Behaviour::DetachedFromGroup => target == "process" && kind == SignalKind::Forceful,
            Behaviour::Unkillable => false,
            Behaviour::SignalsDenied => return Err(SignalError::PermissionDenied(pid)),
            Behaviour::GroupVanished => {
                state.alive.remove(&pid);
                return Err(SignalError::GroupNotFound(pid));
            }
        };

        if dies {
            state.alive.remove(&pid);
        }
        Ok(())
    }
}

impl ProcessBackend for FakeBackend {
    fn launch(&self, _command: &WorkerCommand) -> Result<ProcessHandle, LaunchError> {
        let mut state = self.state.lock();
        if let Some(message) = &state.launch_error {
            return Err(LaunchError::Spawn(message.clone()));
        }

        state.next_pid += 1;
        state.launches += 1;
        let pid = state.next_pid;
        state.alive.insert(pid);
        Ok(ProcessHandle::new(pid))
    }

    fn probe(&self, handle: &ProcessHandle) -> bool {
        self.state.lock().alive.contains(&handle.pid)
    }

    async fn signal_group(&self, handle: &ProcessHandle, kind: SignalKind) -> Result<(), SignalError> {
        self.deliver(handle.pid, "group", kind)
    }

    async fn signal_process(
        &self,
        handle: &ProcessHandle,
        kind: SignalKind,
    ) -> Result<(), SignalError> {
        self.deliver(handle.pid, "process", kind)
    }

    async fn wait_exit(&self, handle: &ProcessHandle, timeout: Duration) -> Result<bool, SignalError> {
        if !self.probe(handle) {
            return Ok(true);
        }
        tokio::time::sleep(timeout).await;
        Ok(!self.probe(handle))
    }
}

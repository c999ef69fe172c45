//! In-memory implementations of the fleet traits
//!
//! The mocks record every call so tests can assert on attempt counts,
//! concurrency and the order of operations without touching real hosts.

use async_trait::async_trait;
use fleet_core::{
    BatchJobResult, BatchTarget, FleetError, FleetResult, HistoryStore, InvocationState,
    InvocationStatus, RemoteCommandRunner, RunHandle, TargetStatusProvider,
};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

/// How a scripted target behaves across submits and polls.
#[derive(Debug, Clone)]
pub enum Script {
    /// Every attempt succeeds with the given output.
    Succeed(String),
    /// Every attempt ends in `Failed` with the given error.
    Fail(String),
    /// The first `n` attempts fail, later ones succeed.
    FailTimes(u32, String),
    /// `submit` itself is rejected.
    SubmitError(String),
    /// The invocation never leaves `InProgress`.
    Hang,
    /// `submit` panics.
    Panic,
    /// The first `n` polls return a transient error, then the attempt succeeds.
    TransientPolls(u32),
    /// `InProgress` until the delay has elapsed, then success.
    Slow(Duration),
}

#[derive(Debug)]
struct HandleState {
    target_id: String,
    attempt: u32,
    submitted_at: Instant,
    polls: u32,
    finished: bool,
}

#[derive(Debug, Default)]
struct RunnerState {
    scripts: HashMap<String, Script>,
    submits: HashMap<String, u32>,
    handles: HashMap<String, HandleState>,
    in_flight: usize,
    max_in_flight: usize,
}

/// Mock implementation of RemoteCommandRunner driven by per-target scripts.
///
/// Targets without a script succeed with output `"ok"`. An attempt counts as
/// in flight from a successful submit until the first terminal poll.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCommandRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl ScriptedCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_script(self, target_id: &str, script: Script) -> Self {
        self.set_script(target_id, script);
        self
    }

    pub fn set_script(&self, target_id: &str, script: Script) {
        self.state
            .lock()
            .unwrap()
            .scripts
            .insert(target_id.to_string(), script);
    }

    /// Number of submit calls made for `target_id`, rejected ones included.
    pub fn submit_count(&self, target_id: &str) -> u32 {
        self.state
            .lock()
            .unwrap()
            .submits
            .get(target_id)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_submits(&self) -> u32 {
        self.state.lock().unwrap().submits.values().sum()
    }

    pub fn max_in_flight(&self) -> usize {
        self.state.lock().unwrap().max_in_flight
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().unwrap().in_flight
    }

    fn script_for(state: &RunnerState, target_id: &str) -> Script {
        state
            .scripts
            .get(target_id)
            .cloned()
            .unwrap_or_else(|| Script::Succeed("ok".to_string()))
    }
}

#[async_trait]
impl RemoteCommandRunner for ScriptedCommandRunner {
    async fn submit(
        &self,
        target: &BatchTarget,
        _command: &str,
        _timeout_hint: Duration,
    ) -> FleetResult<RunHandle> {
        let mut state = self.state.lock().unwrap();
        let attempt = {
            let count = state.submits.entry(target.id.clone()).or_insert(0);
            *count += 1;
            *count
        };

        match Self::script_for(&state, &target.id) {
            Script::SubmitError(message) => return Err(FleetError::submit(message)),
            Script::Panic => {
                drop(state);
                panic!("scripted panic for {}", target.id);
            }
            _ => {}
        }

        let command_id = format!("cmd-{}-{}", target.id, attempt);
        state.handles.insert(
            command_id.clone(),
            HandleState {
                target_id: target.id.clone(),
                attempt,
                submitted_at: Instant::now(),
                polls: 0,
                finished: false,
            },
        );
        state.in_flight += 1;
        state.max_in_flight = state.max_in_flight.max(state.in_flight);

        Ok(RunHandle {
            command_id,
            target_id: target.id.clone(),
            location_hint: target.location_hint.clone(),
        })
    }

    async fn poll_status(&self, handle: &RunHandle) -> FleetResult<InvocationStatus> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;
        let script = match state.handles.get(&handle.command_id) {
            Some(h) => Self::script_for(state, &h.target_id),
            None => return Err(FleetError::transient("InvocationDoesNotExist")),
        };

        let Some(entry) = state.handles.get_mut(&handle.command_id) else {
            return Err(FleetError::transient("InvocationDoesNotExist"));
        };
        entry.polls += 1;

        let status = match script {
            Script::Succeed(output) => InvocationStatus::succeeded(output),
            Script::Fail(error) => InvocationStatus::failed(InvocationState::Failed, error),
            Script::FailTimes(n, error) if entry.attempt <= n => {
                InvocationStatus::failed(InvocationState::Failed, error)
            }
            Script::FailTimes(..) => InvocationStatus::succeeded("ok"),
            Script::Hang => InvocationStatus::in_progress(),
            Script::TransientPolls(n) if entry.polls <= n => {
                return Err(FleetError::transient("InvocationDoesNotExist"));
            }
            Script::TransientPolls(_) => InvocationStatus::succeeded("ok"),
            Script::Slow(delay) if entry.submitted_at.elapsed() < delay => {
                InvocationStatus::in_progress()
            }
            Script::Slow(_) => InvocationStatus::succeeded("ok"),
            Script::SubmitError(_) | Script::Panic => {
                unreachable!("no handle is issued for this script")
            }
        };

        if status.state.is_terminal() && !entry.finished {
            entry.finished = true;
            state.in_flight -= 1;
        }

        Ok(status)
    }
}

#[derive(Debug, Default)]
struct StatusState {
    unreachable: HashSet<String>,
    failing_locations: HashSet<String>,
    calls: Vec<(String, Vec<String>)>,
}

/// Mock implementation of TargetStatusProvider.
///
/// Every requested id is reachable unless marked otherwise; a failing location
/// returns a `Validation` error.
#[derive(Debug, Clone, Default)]
pub struct MockStatusProvider {
    state: Arc<Mutex<StatusState>>,
}

impl MockStatusProvider {
    pub fn all_reachable() -> Self {
        Self::default()
    }

    pub fn with_unreachable(ids: &[&str]) -> Self {
        let provider = Self::default();
        for id in ids {
            provider.set_unreachable(id);
        }
        provider
    }

    pub fn set_unreachable(&self, target_id: &str) {
        self.state
            .lock()
            .unwrap()
            .unreachable
            .insert(target_id.to_string());
    }

    pub fn fail_location(&self, location: &str) {
        self.state
            .lock()
            .unwrap()
            .failing_locations
            .insert(location.to_string());
    }

    pub fn call_count(&self) -> usize {
        self.state.lock().unwrap().calls.len()
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl TargetStatusProvider for MockStatusProvider {
    async fn check_reachable(
        &self,
        location: &str,
        target_ids: &[String],
    ) -> FleetResult<HashMap<String, bool>> {
        let mut state = self.state.lock().unwrap();
        state
            .calls
            .push((location.to_string(), target_ids.to_vec()));

        if state.failing_locations.contains(location) {
            return Err(FleetError::Validation(format!(
                "status query failed for {location}"
            )));
        }

        Ok(target_ids
            .iter()
            .map(|id| (id.clone(), !state.unreachable.contains(id)))
            .collect())
    }
}

/// Mock implementation of HistoryStore kept entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MockHistoryStore {
    entries: Arc<Mutex<Vec<BatchJobResult>>>,
    flushes: Arc<Mutex<u32>>,
    failing: bool,
}

impl MockHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every flush fails with a storage error.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn entries(&self) -> Vec<BatchJobResult> {
        self.entries.lock().unwrap().clone()
    }

    pub fn flush_count(&self) -> u32 {
        *self.flushes.lock().unwrap()
    }
}

#[async_trait]
impl HistoryStore for MockHistoryStore {
    async fn append_and_flush(&self, results: &[BatchJobResult], cap: usize) -> FleetResult<()> {
        *self.flushes.lock().unwrap() += 1;
        if self.failing {
            return Err(FleetError::storage("disk full"));
        }

        let mut entries = self.entries.lock().unwrap();
        entries.extend_from_slice(results);
        if entries.len() > cap {
            let overflow = entries.len() - cap;
            entries.drain(..overflow);
        }
        Ok(())
    }

    async fn load_recent(&self, limit: usize) -> FleetResult<Vec<BatchJobResult>> {
        let entries = self.entries.lock().unwrap();
        let skip = entries.len().saturating_sub(limit);
        Ok(entries[skip..].to_vec())
    }
}

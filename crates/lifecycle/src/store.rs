use crate::error::LifecycleError;
use core_types::RunPhase;
use tokio::sync::watch;

/// How the current run was handed to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubmissionMode {
    #[default]
    Remote,
    /// The submit call failed and the run continues locally. The next status check
    /// decides whether a backend is actually there.
    LocalFallback,
}

/// Everything a consumer needs to know about the current run.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunState {
    pub phase: RunPhase,
    pub last_known_day: u32,
    pub total_days: u32,
    /// Set when a run completes; survives until an explicit reset.
    pub has_data: bool,
    /// Whether the last *completed* run generated news. Only updated on COMPLETE.
    pub last_run_included_news: bool,
    /// News flag of the run currently in flight.
    pub requested_news: bool,
    pub error: Option<String>,
    /// Backend stage for display, e.g. `EVOLVING AGENTS`.
    pub progress_label: Option<String>,
    pub submission: SubmissionMode,
    /// Bumped on every start and reset. Responses for an older generation are stale.
    pub generation: u64,
}

impl RunState {
    /// One-line progress text, e.g. `Day 3 of 30. SIMULATING`.
    pub fn progress_summary(&self) -> String {
        let day = self.last_known_day.min(self.total_days);
        match &self.progress_label {
            Some(label) => format!("Day {day} of {}. {label}", self.total_days),
            None => format!("Day {day} of {}.", self.total_days),
        }
    }
}

/// The single source of truth for the run lifecycle.
///
/// Backed by a `watch` channel: every mutation is visible to all subscribers, and each
/// mutation happens under the channel's lock so check-and-set transitions are atomic.
#[derive(Debug)]
pub struct RunStore {
    tx: watch::Sender<RunState>,
}

impl Default for RunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(RunState::default());
        Self { tx }
    }

    pub fn state(&self) -> RunState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.tx.subscribe()
    }

    /// Moves to RUNNING for a fresh generation and returns it.
    ///
    /// Fails without touching anything if a run is already in flight. A terminal state
    /// is cleared first, exactly as an explicit reset would.
    pub(crate) fn begin_run(&self, total_days: u32, news: bool) -> Result<u64, LifecycleError> {
        let mut outcome = Err(LifecycleError::AlreadyRunning);
        self.tx.send_if_modified(|state| {
            if state.phase == RunPhase::Running {
                return false;
            }
            let generation = state.generation + 1;
            *state = RunState {
                phase: RunPhase::Running,
                total_days,
                requested_news: news,
                generation,
                ..RunState::default()
            };
            outcome = Ok(generation);
            true
        });
        outcome
    }

    /// Applies `update` only if `generation` is still the live, running generation.
    /// Returns whether the update was applied.
    pub(crate) fn apply_if_current(
        &self,
        generation: u64,
        update: impl FnOnce(&mut RunState),
    ) -> bool {
        self.tx.send_if_modified(|state| {
            if state.generation != generation || state.phase != RunPhase::Running {
                return false;
            }
            update(state);
            true
        })
    }

    pub(crate) fn is_current(&self, generation: u64) -> bool {
        let state = self.tx.borrow();
        state.generation == generation && state.phase == RunPhase::Running
    }

    /// Back to IDLE, clearing sticky flags. Returns the new generation.
    pub(crate) fn reset(&self) -> u64 {
        let mut generation = 0;
        self.tx.send_modify(|state| {
            generation = state.generation + 1;
            *state = RunState {
                generation,
                ..RunState::default()
            };
        });
        generation
    }
}

use crate::error::LifecycleError;
use crate::store::{RunState, RunStore, SubmissionMode};
use api_client::SimulationApi;
use configuration::{PollingSettings, RunConfig};
use core_types::{BackendStatus, RunPhase};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

const START_FAILED: &str = "Simulation failed to start.";
const JOB_FAILED: &str = "Simulation job failed on the server.";
const STATUS_CHECK_FAILED: &str = "status check failed";

#[derive(Debug, Clone)]
pub struct ControllerOptions {
    pub poll_interval: Duration,
    /// When false no poller is spawned and the caller drives `poll()` itself.
    pub autopoll: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2000),
            autopoll: true,
        }
    }
}

impl From<&PollingSettings> for ControllerOptions {
    fn from(settings: &PollingSettings) -> Self {
        Self {
            poll_interval: settings.interval(),
            ..Self::default()
        }
    }
}

/// What a single status check did to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Still running; progress was updated.
    Continue,
    /// The run settled in this phase. No further polls will be made.
    Terminal(RunPhase),
    /// The backend reported IDLE; nothing changed.
    NoChange,
    /// Not polled: no run in flight, or another poll already is.
    Skipped,
    /// The response arrived after a reset or another transition and was discarded.
    Stale,
}

struct Inner {
    api: Arc<dyn SimulationApi>,
    store: RunStore,
    options: ControllerOptions,
    /// The live poller and the generation it serves.
    poller: Mutex<Option<(u64, JoinHandle<()>)>>,
    in_flight: AsyncMutex<()>,
}

/// Starts, polls and resets simulation runs against a [`SimulationApi`].
///
/// Cheap to clone; all clones drive the same run.
#[derive(Clone)]
pub struct RunController {
    inner: Arc<Inner>,
}

impl RunController {
    pub fn new(api: Arc<dyn SimulationApi>, store: RunStore, options: ControllerOptions) -> Self {
        Self {
            inner: Arc::new(Inner {
                api,
                store,
                options,
                poller: Mutex::new(None),
                in_flight: AsyncMutex::new(()),
            }),
        }
    }

    pub fn state(&self) -> RunState {
        self.inner.store.state()
    }

    pub fn subscribe(&self) -> watch::Receiver<RunState> {
        self.inner.store.subscribe()
    }

    /// Validates `config`, moves to RUNNING and submits the job.
    ///
    /// A failed submission does not fail the run: it continues as a local fallback and
    /// the first status check settles it. A submission the backend answers with FAILED
    /// moves straight to FAILED.
    pub async fn start(&self, config: &RunConfig) -> Result<(), LifecycleError> {
        config.validate()?;

        let generation = self
            .inner
            .store
            .begin_run(config.num_days, config.news_enabled)?;
        self.cancel_pollers_before(generation);
        tracing::info!(
            generation,
            days = config.num_days,
            agents = config.agents.len(),
            news = config.news_enabled,
            "Starting simulation run"
        );

        match self.inner.api.submit(config).await {
            Ok(response) if response.state.status == BackendStatus::Failed => {
                let message = [Some(response.message), response.state.error]
                    .into_iter()
                    .flatten()
                    .find(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| START_FAILED.to_string());
                tracing::error!(generation, %message, "Backend refused the simulation job");
                self.inner.store.apply_if_current(generation, |state| {
                    state.phase = RunPhase::Failed;
                    state.error = Some(message);
                });
                return Ok(());
            }
            Ok(response) => {
                tracing::info!(generation, message = %response.message, status = %response.state.status, "Simulation job accepted");
                self.inner.store.apply_if_current(generation, |state| {
                    state.progress_label = Some(response.state.status.label());
                });
            }
            Err(e) => {
                tracing::warn!(generation, error = %e, "Could not submit the job, continuing with local fallback");
                self.inner.store.apply_if_current(generation, |state| {
                    state.submission = SubmissionMode::LocalFallback;
                    state.progress_label = Some(BackendStatus::GeneratingNews.label());
                });
            }
        }

        if self.inner.options.autopoll {
            self.spawn_poller(generation);
        }
        Ok(())
    }

    /// Performs one status check for the run in flight.
    pub async fn poll(&self) -> PollOutcome {
        let state = self.inner.store.state();
        if state.phase != RunPhase::Running {
            return PollOutcome::Skipped;
        }
        self.poll_generation(state.generation).await
    }

    /// Returns to IDLE and stops polling. The run configuration is left to the caller.
    pub fn reset(&self) {
        let generation = self.inner.store.reset();
        self.cancel_pollers_before(generation);
        tracing::info!(generation, "Run state reset");
    }

    async fn poll_generation(&self, generation: u64) -> PollOutcome {
        let Ok(_guard) = self.inner.in_flight.try_lock() else {
            return PollOutcome::Skipped;
        };
        if !self.inner.store.is_current(generation) {
            return PollOutcome::Stale;
        }

        let response = match self.inner.api.status().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(generation, error = %e, "Status check failed, polling stopped");
                let applied = self.inner.store.apply_if_current(generation, |state| {
                    state.phase = RunPhase::Failed;
                    state.error = Some(STATUS_CHECK_FAILED.to_string());
                });
                return settled(applied, RunPhase::Failed);
            }
        };

        tracing::debug!(generation, status = %response.status, day = response.day, "Status received");
        match response.status {
            BackendStatus::Complete => {
                let applied = self.inner.store.apply_if_current(generation, |state| {
                    state.phase = RunPhase::Complete;
                    state.last_known_day = response.day;
                    state.has_data = true;
                    state.last_run_included_news = state.requested_news;
                    state.progress_label = None;
                });
                if applied {
                    tracing::info!(generation, days = response.day, "Simulation run complete");
                }
                settled(applied, RunPhase::Complete)
            }
            BackendStatus::Failed => {
                let message = response
                    .error
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| JOB_FAILED.to_string());
                tracing::error!(generation, %message, "Simulation run failed");
                let applied = self.inner.store.apply_if_current(generation, |state| {
                    state.phase = RunPhase::Failed;
                    state.error = Some(message);
                });
                settled(applied, RunPhase::Failed)
            }
            BackendStatus::Idle => {
                if self.inner.store.is_current(generation) {
                    PollOutcome::NoChange
                } else {
                    PollOutcome::Stale
                }
            }
            stage => {
                let applied = self.inner.store.apply_if_current(generation, |state| {
                    state.last_known_day = response.day.min(state.total_days);
                    state.progress_label = Some(stage.label());
                });
                if applied {
                    PollOutcome::Continue
                } else {
                    PollOutcome::Stale
                }
            }
        }
    }

    /// Polls `generation` every interval until it settles or goes stale.
    ///
    /// Does nothing if `generation` was superseded while its submission was in flight, so a
    /// late `start()` can never displace the poller of a newer run.
    fn spawn_poller(&self, generation: u64) {
        let Ok(mut slot) = self.inner.poller.lock() else {
            return;
        };
        if !self.inner.store.is_current(generation) {
            tracing::debug!(generation, "Run superseded before polling began");
            return;
        }
        if matches!(slot.as_ref(), Some((live, _)) if *live > generation) {
            return;
        }

        let controller = self.clone();
        let period = self.inner.options.poll_interval;
        let handle = tokio::spawn(async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately; the first poll waits a full period.
            timer.tick().await;

            loop {
                timer.tick().await;
                match controller.poll_generation(generation).await {
                    PollOutcome::Continue | PollOutcome::NoChange | PollOutcome::Skipped => {}
                    PollOutcome::Terminal(phase) => {
                        tracing::debug!(generation, %phase, "Poller finished");
                        break;
                    }
                    PollOutcome::Stale => {
                        tracing::debug!(generation, "Poller superseded");
                        break;
                    }
                }
            }
        });

        if let Some((_, previous)) = slot.replace((generation, handle)) {
            previous.abort();
        }
    }

    /// Aborts the poller if it belongs to a generation older than `generation`.
    fn cancel_pollers_before(&self, generation: u64) {
        let Ok(mut slot) = self.inner.poller.lock() else {
            return;
        };
        if matches!(slot.as_ref(), Some((owner, _)) if *owner < generation) {
            if let Some((_, handle)) = slot.take() {
                handle.abort();
            }
        }
    }
}

fn settled(applied: bool, phase: RunPhase) -> PollOutcome {
    if applied {
        PollOutcome::Terminal(phase)
    } else {
        PollOutcome::Stale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use api_client::error::ApiError;
    use api_client::{RunResponse, StatusResponse};
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Notify;

    /// A backend whose answers are fixed up front.
    ///
    /// `statuses` is consumed front to back; the last answer repeats. `None` entries
    /// stand for an unreachable backend.
    struct ScriptedApi {
        submit_reply: Option<StatusResponse>,
        statuses: Mutex<VecDeque<Option<StatusResponse>>>,
        gate: Option<Arc<Notify>>,
        /// Holds back the first submission until notified.
        submit_gate: Mutex<Option<Arc<Notify>>>,
        submits: AtomicUsize,
        status_calls: AtomicUsize,
    }

    impl ScriptedApi {
        fn new(statuses: Vec<Option<StatusResponse>>) -> Self {
            Self {
                submit_reply: Some(status("GENERATING_NEWS", 0, 10)),
                statuses: Mutex::new(statuses.into()),
                gate: None,
                submit_gate: Mutex::new(None),
                submits: AtomicUsize::new(0),
                status_calls: AtomicUsize::new(0),
            }
        }

        fn unreachable() -> ApiError {
            ApiError::Server {
                status: 503,
                detail: "backend offline".to_string(),
            }
        }
    }

    #[async_trait]
    impl SimulationApi for ScriptedApi {
        async fn submit(&self, _config: &RunConfig) -> Result<RunResponse, ApiError> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            let held = self.submit_gate.lock().unwrap().take();
            if let Some(gate) = held {
                gate.notified().await;
            }
            match &self.submit_reply {
                Some(state) => Ok(RunResponse {
                    message: match state.status {
                        BackendStatus::Failed => "Backend is shutting down.".to_string(),
                        _ => "Simulation started with custom config!".to_string(),
                    },
                    state: state.clone(),
                }),
                None => Err(Self::unreachable()),
            }
        }

        async fn status(&self) -> Result<StatusResponse, ApiError> {
            self.status_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            let next = {
                let mut statuses = self.statuses.lock().unwrap();
                if statuses.len() > 1 {
                    statuses.pop_front().flatten()
                } else {
                    statuses.front().cloned().flatten()
                }
            };
            next.ok_or_else(Self::unreachable)
        }
    }

    fn status(word: &str, day: u32, total_days: u32) -> StatusResponse {
        StatusResponse {
            status: BackendStatus::from(word.to_string()),
            day,
            total_days,
            error: None,
        }
    }

    fn failed(error: Option<&str>) -> StatusResponse {
        StatusResponse {
            status: BackendStatus::Failed,
            day: 0,
            total_days: 0,
            error: error.map(str::to_string),
        }
    }

    fn config(days: u32, news: bool) -> RunConfig {
        RunConfig {
            num_days: days,
            news_enabled: news,
            ..RunConfig::default()
        }
    }

    fn manual(api: &Arc<ScriptedApi>) -> RunController {
        let options = ControllerOptions {
            autopoll: false,
            ..ControllerOptions::default()
        };
        RunController::new(api.clone(), RunStore::new(), options)
    }

    #[tokio::test]
    async fn invalid_config_is_rejected_before_submitting() {
        let api = Arc::new(ScriptedApi::new(vec![]));
        let controller = manual(&api);

        let err = controller.start(&config(0, true)).await.unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
        assert_eq!(api.submits.load(Ordering::SeqCst), 0);
        assert_eq!(controller.state(), RunState::default());
    }

    #[tokio::test]
    async fn second_start_while_running_is_rejected() {
        let api = Arc::new(ScriptedApi::new(vec![]));
        let controller = manual(&api);

        controller.start(&config(10, true)).await.unwrap();
        let before = controller.state();
        assert_eq!(before.phase, RunPhase::Running);
        assert_eq!(before.total_days, 10);

        let err = controller.start(&config(20, false)).await.unwrap_err();
        assert!(matches!(err, LifecycleError::AlreadyRunning));
        assert_eq!(controller.state(), before);
        assert_eq!(api.submits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn polls_track_progress_until_complete() {
        let api = Arc::new(ScriptedApi::new(vec![
            Some(status("EVOLVING_AGENTS", 0, 10)),
            Some(status("SIMULATING", 3, 10)),
            Some(status("COMPLETE", 10, 10)),
        ]));
        let controller = manual(&api);
        controller.start(&config(10, true)).await.unwrap();
        assert_eq!(controller.state().progress_label.as_deref(), Some("GENERATING NEWS"));

        assert_eq!(controller.poll().await, PollOutcome::Continue);
        assert_eq!(controller.state().progress_label.as_deref(), Some("EVOLVING AGENTS"));

        assert_eq!(controller.poll().await, PollOutcome::Continue);
        let state = controller.state();
        assert_eq!(state.last_known_day, 3);
        assert_eq!(state.progress_summary(), "Day 3 of 10. SIMULATING");
        assert!(!state.has_data);

        assert_eq!(controller.poll().await, PollOutcome::Terminal(RunPhase::Complete));
        let state = controller.state();
        assert_eq!(state.phase, RunPhase::Complete);
        assert_eq!(state.last_known_day, 10);
        assert!(state.has_data);
        assert!(state.last_run_included_news);

        assert_eq!(controller.poll().await, PollOutcome::Skipped);
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn reported_day_is_clamped_to_the_run_length() {
        let api = Arc::new(ScriptedApi::new(vec![Some(status("RUNNING", 50, 50))]));
        let controller = manual(&api);
        controller.start(&config(10, false)).await.unwrap();

        controller.poll().await;
        assert_eq!(controller.state().last_known_day, 10);
    }

    #[tokio::test]
    async fn idle_backend_changes_nothing() {
        let api = Arc::new(ScriptedApi::new(vec![Some(status("IDLE", 0, 30))]));
        let controller = manual(&api);
        controller.start(&config(10, false)).await.unwrap();
        let before = controller.state();

        assert_eq!(controller.poll().await, PollOutcome::NoChange);
        assert_eq!(controller.state(), before);
    }

    #[tokio::test]
    async fn failed_status_uses_server_message_or_fallback() {
        let api = Arc::new(ScriptedApi::new(vec![Some(failed(Some("agent crashed")))]));
        let controller = manual(&api);
        controller.start(&config(10, false)).await.unwrap();
        assert_eq!(controller.poll().await, PollOutcome::Terminal(RunPhase::Failed));
        assert_eq!(controller.state().error.as_deref(), Some("agent crashed"));

        let api = Arc::new(ScriptedApi::new(vec![Some(failed(None))]));
        let controller = manual(&api);
        controller.start(&config(10, false)).await.unwrap();
        controller.poll().await;
        let state = controller.state();
        assert_eq!(state.phase, RunPhase::Failed);
        assert_eq!(state.error.as_deref(), Some(JOB_FAILED));
        assert!(!state.has_data);
    }

    #[tokio::test]
    async fn unreachable_status_endpoint_fails_the_run() {
        let api = Arc::new(ScriptedApi::new(vec![None]));
        let controller = manual(&api);
        controller.start(&config(10, false)).await.unwrap();

        assert_eq!(controller.poll().await, PollOutcome::Terminal(RunPhase::Failed));
        assert_eq!(controller.state().error.as_deref(), Some(STATUS_CHECK_FAILED));
    }

    #[tokio::test]
    async fn failed_submission_falls_back_locally() {
        let mut scripted = ScriptedApi::new(vec![]);
        scripted.submit_reply = None;
        let api = Arc::new(scripted);
        let controller = manual(&api);

        controller.start(&config(10, true)).await.unwrap();
        let state = controller.state();
        assert_eq!(state.phase, RunPhase::Running);
        assert_eq!(state.submission, SubmissionMode::LocalFallback);
    }

    #[tokio::test]
    async fn refused_submission_fails_immediately() {
        let mut scripted = ScriptedApi::new(vec![]);
        scripted.submit_reply = Some(failed(None));
        let api = Arc::new(scripted);
        let controller = manual(&api);

        controller.start(&config(10, true)).await.unwrap();
        let state = controller.state();
        assert_eq!(state.phase, RunPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("Backend is shutting down."));
    }

    #[tokio::test]
    async fn reset_clears_sticky_flags_and_restart_resets_implicitly() {
        let api = Arc::new(ScriptedApi::new(vec![Some(status("COMPLETE", 5, 5))]));
        let controller = manual(&api);
        controller.start(&config(5, true)).await.unwrap();
        controller.poll().await;
        assert!(controller.state().has_data);

        controller.start(&config(5, false)).await.unwrap();
        let state = controller.state();
        assert_eq!(state.phase, RunPhase::Running);
        assert!(!state.has_data);
        assert_eq!(state.generation, 2);

        controller.reset();
        let state = controller.state();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(!state.has_data);
        assert!(!state.last_run_included_news);
        assert_eq!(state.error, None);
        assert_eq!(state.generation, 3);
        assert_eq!(api.submits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn response_after_reset_is_stale() {
        let gate = Arc::new(Notify::new());
        let mut scripted = ScriptedApi::new(vec![Some(status("COMPLETE", 10, 10))]);
        scripted.gate = Some(gate.clone());
        let api = Arc::new(scripted);
        let controller = manual(&api);
        controller.start(&config(10, true)).await.unwrap();

        let polling = tokio::spawn({
            let controller = controller.clone();
            async move { controller.poll().await }
        });
        while api.status_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        // A second poll while the first is outstanding is skipped.
        assert_eq!(controller.poll().await, PollOutcome::Skipped);

        controller.reset();
        gate.notify_one();
        assert_eq!(polling.await.unwrap(), PollOutcome::Stale);

        let state = controller.state();
        assert_eq!(state.phase, RunPhase::Idle);
        assert!(!state.has_data);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_stops_after_failure() {
        let api = Arc::new(ScriptedApi::new(vec![
            Some(status("SIMULATING", 1, 10)),
            Some(failed(Some("out of memory"))),
        ]));
        let controller = RunController::new(api.clone(), RunStore::new(), ControllerOptions::default());
        let mut rx = controller.subscribe();

        controller.start(&config(10, false)).await.unwrap();
        let state = rx.wait_for(|s| s.phase.is_terminal()).await.unwrap().clone();
        assert_eq!(state.phase, RunPhase::Failed);
        assert_eq!(state.error.as_deref(), Some("out of memory"));
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_runs_to_completion() {
        let api = Arc::new(ScriptedApi::new(vec![
            Some(status("GENERATING_NEWS", 0, 3)),
            Some(status("SIMULATING", 2, 3)),
            Some(status("COMPLETE", 3, 3)),
        ]));
        let controller = RunController::new(api.clone(), RunStore::new(), ControllerOptions::default());
        let mut rx = controller.subscribe();

        controller.start(&config(3, true)).await.unwrap();
        let state = rx.wait_for(|s| s.phase.is_terminal()).await.unwrap().clone();
        assert_eq!(state.phase, RunPhase::Complete);
        assert!(state.has_data);
        assert!(state.last_run_included_news);
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn late_submission_does_not_displace_the_live_poller() {
        let gate = Arc::new(Notify::new());
        let scripted = ScriptedApi::new(vec![Some(status("COMPLETE", 10, 10))]);
        *scripted.submit_gate.lock().unwrap() = Some(gate.clone());
        let api = Arc::new(scripted);
        let controller = RunController::new(api.clone(), RunStore::new(), ControllerOptions::default());
        let mut rx = controller.subscribe();

        let first = tokio::spawn({
            let controller = controller.clone();
            async move { controller.start(&config(10, true)).await }
        });
        while api.submits.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        controller.reset();
        controller.start(&config(10, true)).await.unwrap();
        assert_eq!(controller.state().generation, 3);

        gate.notify_one();
        first.await.unwrap().unwrap();

        let state = rx.wait_for(|s| s.phase.is_terminal()).await.unwrap().clone();
        assert_eq!(state.phase, RunPhase::Complete);
        assert_eq!(state.generation, 3);
        assert!(state.has_data);
        assert_eq!(api.status_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn superseded_start_spawns_no_poller() {
        let api = Arc::new(ScriptedApi::new(vec![Some(status("RUNNING", 1, 10))]));
        let controller = RunController::new(api.clone(), RunStore::new(), ControllerOptions::default());
        let generation = controller.inner.store.begin_run(10, false).unwrap();
        controller.reset();

        controller.spawn_poller(generation);
        assert!(controller.inner.poller.lock().unwrap().is_none());
    }
}

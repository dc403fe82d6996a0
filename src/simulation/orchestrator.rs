use std::{
    collections::BTreeSet,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use log::{error, info, warn};
use tokio::{runtime::Handle, sync::watch};

use crate::{
    PitwallError,
    prediction::{PredictionKind, PredictionRecord, decode},
    track::{Track, TrackId, catalog},
};

use super::{
    ENTRY_POINT, RequestKind, SimulationRequest, invoker::SimulationInvoker, qualifying_args,
    sweep::run_sweep,
};

/// Identifies one run. Goes stale as soon as the orchestrator moves on to anything else.
#[derive(Clone, Debug)]
pub struct RunToken {
    latest: Arc<AtomicU64>,
    generation: u64,
}

impl RunToken {
    pub fn new(latest: Arc<AtomicU64>, generation: u64) -> Self {
        Self { latest, generation }
    }

    /// A token nobody can invalidate, for running a sweep outside an orchestrator
    pub fn detached() -> Self {
        Self::new(Arc::new(AtomicU64::new(0)), 0)
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.generation
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SimulationState {
    Idle,
    TrackSelected {
        track: TrackId,
    },
    ParametersEntered {
        request: SimulationRequest,
    },
    Running {
        request: SimulationRequest,
        generation: u64,
    },
    Completed {
        request: SimulationRequest,
        records: Arc<[PredictionRecord]>,
        rejected: usize,
        /// Grid positions that produced nothing, always empty for qualifying
        failures: BTreeSet<u8>,
    },
    Failed {
        request: SimulationRequest,
        error: String,
    },
}

impl SimulationState {
    pub fn name(&self) -> &'static str {
        match self {
            SimulationState::Idle => "idle",
            SimulationState::TrackSelected { .. } => "track selected",
            SimulationState::ParametersEntered { .. } => "parameters entered",
            SimulationState::Running { .. } => "running",
            SimulationState::Completed { .. } => "completed",
            SimulationState::Failed { .. } => "failed",
        }
    }

    pub fn request(&self) -> Option<&SimulationRequest> {
        match self {
            SimulationState::Idle | SimulationState::TrackSelected { .. } => None,
            SimulationState::ParametersEntered { request }
            | SimulationState::Running { request, .. }
            | SimulationState::Completed { request, .. }
            | SimulationState::Failed { request, .. } => Some(request),
        }
    }

    pub fn track(&self) -> Option<TrackId> {
        match self {
            SimulationState::TrackSelected { track } => Some(*track),
            other => other.request().map(|request| request.track),
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SimulationState::Running { .. })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct OrchestratorConfig {
    /// Strategy positions in flight at once
    pub sweep_concurrency: usize,
    /// Overall limit for a run. When unset it is derived from the request: the call timeout
    /// for every call it needs plus the pacing floor.
    pub run_deadline: Option<Duration>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            sweep_concurrency: 1,
            run_deadline: None,
        }
    }
}

/// Drives requests through selection, parameter entry and execution, publishing every
/// state change to subscribers.
///
/// All invocation work runs on the given runtime; none of the operations block. Moving to
/// any other state while a run is in flight abandons it: its result is discarded when it
/// arrives, although the module call itself is left to finish.
pub struct Orchestrator {
    invoker: Arc<SimulationInvoker>,
    runtime: Handle,
    latest: Arc<AtomicU64>,
    state: Arc<watch::Sender<SimulationState>>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(invoker: Arc<SimulationInvoker>, runtime: Handle, config: OrchestratorConfig) -> Self {
        let (state, _) = watch::channel(SimulationState::Idle);
        Self {
            invoker,
            runtime,
            latest: Arc::new(AtomicU64::new(0)),
            state: Arc::new(state),
            config,
        }
    }

    pub fn snapshot(&self) -> SimulationState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SimulationState> {
        self.state.subscribe()
    }

    pub fn select_track(&self, track: &Track) {
        let track_id = track.id;
        self.state.send_modify(|state| {
            self.abandon(state);
            *state = SimulationState::TrackSelected { track: track_id };
        });
        info!("Selected track {} ({})", track.name, track_id);
    }

    /// # Errors
    ///
    /// `InvalidTransition` if no track is selected, `InvalidRequest` if the request is for a
    /// different track than the selected one.
    pub fn enter_parameters(&self, request: SimulationRequest) -> Result<(), PitwallError> {
        let mut outcome = Ok(());
        self.state.send_if_modified(|state| match state.track() {
            None => {
                outcome = Err(PitwallError::InvalidTransition {
                    from: state.name().to_string(),
                    action: "enter parameters".to_string(),
                });
                false
            }
            Some(selected) if selected != request.track => {
                outcome = Err(PitwallError::InvalidRequest {
                    field: "track".to_string(),
                    reason: format!(
                        "request is for {} but {} is selected",
                        catalog::get(request.track).name,
                        catalog::get(selected).name
                    ),
                });
                false
            }
            Some(_) => {
                self.abandon(state);
                *state = SimulationState::ParametersEntered { request };
                true
            }
        });
        outcome
    }

    /// Start the entered (or last run) request in the background and return its generation.
    ///
    /// # Errors
    ///
    /// `InvalidTransition` if no parameters have been entered yet.
    pub fn run(&self) -> Result<u64, PitwallError> {
        let mut started = None;
        let mut from = "";
        self.state.send_if_modified(|state| match state.request().copied() {
            None => {
                from = state.name();
                false
            }
            Some(request) => {
                let generation = self.abandon(state);
                *state = SimulationState::Running {
                    request,
                    generation,
                };
                started = Some((request, generation));
                true
            }
        });

        let Some((request, generation)) = started else {
            return Err(PitwallError::InvalidTransition {
                from: from.to_string(),
                action: "run".to_string(),
            });
        };

        let deadline = self.config.run_deadline.unwrap_or_else(|| {
            let invoker = self.invoker.config();
            invoker.call_timeout * request.invocations() as u32 + invoker.min_duration
        });
        info!(
            "Running request {} for {} ({} calls, deadline {}ms)",
            generation,
            catalog::get(request.track).name,
            request.invocations(),
            deadline.as_millis()
        );

        let job = Job {
            invoker: Arc::clone(&self.invoker),
            state: Arc::clone(&self.state),
            token: RunToken::new(Arc::clone(&self.latest), generation),
            request,
            sweep_concurrency: self.config.sweep_concurrency,
            deadline,
        };
        self.runtime.spawn(job.execute());
        Ok(generation)
    }

    /// Enter `request` and run it
    pub fn submit(&self, request: SimulationRequest) -> Result<u64, PitwallError> {
        self.enter_parameters(request)?;
        self.run()
    }

    /// Back to `Idle`, abandoning any run in flight
    pub fn cancel(&self) {
        self.state.send_modify(|state| {
            self.abandon(state);
            *state = SimulationState::Idle;
        });
        info!("Cancelled, back to idle");
    }

    /// Wait until the orchestrator is no longer `Running` and return that state
    pub async fn wait_for_outcome(&self) -> SimulationState {
        let mut receiver = self.subscribe();
        let outcome = match receiver.wait_for(|state| !state.is_running()).await {
            Ok(state) => state.clone(),
            // the sender lives as long as self
            Err(_) => self.snapshot(),
        };
        outcome
    }

    // Invalidates the current run, if any, and returns the next generation.
    // Always called with the state lock held.
    fn abandon(&self, state: &SimulationState) -> u64 {
        if let SimulationState::Running { generation, .. } = state {
            warn!("Abandoning request {}", generation);
        }
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }
}

struct Job {
    invoker: Arc<SimulationInvoker>,
    state: Arc<watch::Sender<SimulationState>>,
    token: RunToken,
    request: SimulationRequest,
    sweep_concurrency: usize,
    deadline: Duration,
}

struct Completion {
    records: Vec<PredictionRecord>,
    rejected: usize,
    failures: BTreeSet<u8>,
}

impl Job {
    async fn execute(self) {
        let outcome = match tokio::time::timeout(self.deadline, self.simulate()).await {
            Ok(outcome) => outcome.map_err(|e| e.to_string()),
            Err(_) => Err(format!(
                "no result after {}ms",
                self.deadline.as_millis()
            )),
        };

        let request = self.request;
        let next = match outcome {
            Ok(completion) => SimulationState::Completed {
                request,
                records: completion.records.into(),
                rejected: completion.rejected,
                failures: completion.failures,
            },
            Err(error) => SimulationState::Failed { request, error },
        };
        self.publish(next);
    }

    async fn simulate(&self) -> Result<Completion, PitwallError> {
        match self.request.kind {
            RequestKind::Qualifying => {
                let kind = PredictionKind::Qualifying;
                let raw = self
                    .invoker
                    .invoke(kind.module(), ENTRY_POINT, qualifying_args(self.request.track))
                    .await?;
                if let Some(message) = raw.reported_message(kind) {
                    return Err(PitwallError::ModuleReported {
                        module: kind.module().to_string(),
                        message,
                    });
                }
                let decoded = decode(&raw, kind);
                Ok(Completion {
                    records: decoded.records,
                    rejected: decoded.rejected,
                    failures: BTreeSet::new(),
                })
            }
            RequestKind::Strategy { conditions, grid } => {
                let outcome = run_sweep(
                    &self.invoker,
                    self.request.track,
                    conditions,
                    grid,
                    self.sweep_concurrency,
                    &self.token,
                )
                .await;
                if outcome.all_failed(&grid) {
                    return Err(PitwallError::Invocation {
                        module: "strategy".to_string(),
                        reason: format!("all {} grid positions failed", grid.len()),
                    });
                }
                Ok(Completion {
                    records: outcome.records,
                    rejected: outcome.rejected,
                    failures: outcome.failures,
                })
            }
        }
    }

    // Applies the outcome only if this run is still the one the orchestrator is showing
    fn publish(&self, next: SimulationState) {
        let generation = self.token.generation();
        let applied = self.state.send_if_modified(|state| {
            let current = self.token.is_current()
                && matches!(state, SimulationState::Running { generation: running, .. } if *running == generation);
            if current {
                *state = next;
            }
            current
        });

        if !applied {
            warn!("Discarded stale result of request {}", generation);
            return;
        }
        match &*self.state.borrow() {
            SimulationState::Completed {
                records,
                rejected,
                failures,
                ..
            } => info!(
                "Request {} completed: {} records, {} rows rejected, {} positions failed",
                generation,
                records.len(),
                rejected,
                failures.len()
            ),
            SimulationState::Failed { error, .. } => {
                error!("Request {} failed: {}", generation, error)
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::{
        GridPositions, InvokerConfig, MockPredictor, RaceConditions, predictor::PredictorArg,
    };

    const STRATEGY_HEADER: &str = "best_strategy,confidence,num_stops,alternative_1,confidence_1,alternative_2,confidence_2,alternative_3,confidence_3";

    fn strategy_table(args: &[PredictorArg]) -> Result<String, String> {
        Ok(format!(
            "{}\nM-H,0.{:02},1,S-H,0.2,M-M-H,0.1,S-M-H,0.05\n",
            STRATEGY_HEADER,
            args[1].as_int().unwrap_or(0)
        ))
    }

    fn orchestrator(predictor: MockPredictor, config: OrchestratorConfig) -> Orchestrator {
        let invoker = SimulationInvoker::new(
            Arc::new(predictor),
            InvokerConfig {
                min_duration: Duration::ZERO,
                call_timeout: Duration::from_secs(5),
            },
        );
        Orchestrator::new(Arc::new(invoker), Handle::current(), config)
    }

    fn strategy_request(name: &str, grid: GridPositions) -> SimulationRequest {
        let track = catalog::by_name(name).unwrap();
        SimulationRequest::strategy(track, RaceConditions::recommended(track, false), grid)
    }

    #[tokio::test]
    async fn test_invalid_transitions() {
        let orchestrator = orchestrator(MockPredictor::new(), OrchestratorConfig::default());
        assert_eq!(orchestrator.snapshot(), SimulationState::Idle);

        assert!(matches!(
            orchestrator.run(),
            Err(PitwallError::InvalidTransition { .. })
        ));
        let monza = catalog::by_name("Italy").unwrap();
        assert!(matches!(
            orchestrator.enter_parameters(SimulationRequest::qualifying(monza)),
            Err(PitwallError::InvalidTransition { .. })
        ));

        orchestrator.select_track(catalog::by_name("Japan").unwrap());
        assert!(matches!(
            orchestrator.run(),
            Err(PitwallError::InvalidTransition { .. })
        ));
        assert!(matches!(
            orchestrator.enter_parameters(SimulationRequest::qualifying(monza)),
            Err(PitwallError::InvalidRequest { .. })
        ));
        assert_eq!(
            orchestrator.snapshot().track(),
            Some(catalog::by_name("Japan").unwrap().id)
        );
    }

    #[tokio::test]
    async fn test_strategy_run_completes() {
        let predictor = MockPredictor::new().respond("strategy", strategy_table);
        let orchestrator = orchestrator(predictor, OrchestratorConfig::default());
        let request = strategy_request("Netherlands", GridPositions::new(1, 3).unwrap());

        orchestrator.select_track(catalog::by_name("Netherlands").unwrap());
        orchestrator.enter_parameters(request).unwrap();
        let generation = orchestrator.run().unwrap();
        assert_eq!(
            orchestrator.snapshot(),
            SimulationState::Running {
                request,
                generation
            }
        );

        match orchestrator.wait_for_outcome().await {
            SimulationState::Completed {
                records,
                rejected,
                failures,
                ..
            } => {
                assert_eq!(records.len(), 3);
                assert_eq!(rejected, 0);
                assert!(failures.is_empty());
            }
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_rerun_replaces_previous_results() {
        let predictor = MockPredictor::new().respond("strategy", strategy_table);
        let orchestrator = orchestrator(predictor, OrchestratorConfig::default());
        let track = catalog::by_name("Austria").unwrap();

        orchestrator.select_track(track);
        let first = orchestrator
            .submit(strategy_request("Austria", GridPositions::single(4).unwrap()))
            .unwrap();
        orchestrator.wait_for_outcome().await;

        // run again straight from Completed
        let second = orchestrator.run().unwrap();
        assert!(orchestrator.snapshot().is_running());
        assert!(matches!(
            orchestrator.wait_for_outcome().await,
            SimulationState::Completed { .. }
        ));
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_cancel_discards_late_result() {
        let predictor = MockPredictor::new()
            .respond("strategy", strategy_table)
            .with_call_delay(Duration::from_millis(150));
        let orchestrator = orchestrator(predictor, OrchestratorConfig::default());
        let mut updates = orchestrator.subscribe();

        orchestrator.select_track(catalog::by_name("Qatar").unwrap());
        orchestrator
            .submit(strategy_request("Qatar", GridPositions::single(1).unwrap()))
            .unwrap();
        // let the call get under way
        tokio::time::sleep(Duration::from_millis(20)).await;
        orchestrator.cancel();
        assert_eq!(orchestrator.snapshot(), SimulationState::Idle);
        updates.borrow_and_update();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert_eq!(orchestrator.snapshot(), SimulationState::Idle);
        assert!(!updates.has_changed().unwrap());
    }

    #[tokio::test]
    async fn test_new_run_replaces_in_flight_run() {
        let predictor = MockPredictor::new()
            .respond("strategy", strategy_table)
            .with_call_delay(Duration::from_millis(100));
        let orchestrator = orchestrator(predictor, OrchestratorConfig::default());

        orchestrator.select_track(catalog::by_name("Mexico").unwrap());
        let first = orchestrator
            .submit(strategy_request("Mexico", GridPositions::new(1, 4).unwrap()))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        let second = orchestrator
            .submit(strategy_request("Mexico", GridPositions::single(9).unwrap()))
            .unwrap();
        assert!(second > first);

        match orchestrator.wait_for_outcome().await {
            SimulationState::Completed { request, records, .. } => {
                assert_eq!(request.invocations(), 1);
                assert_eq!(records.len(), 1);
            }
            other => panic!("expected completion, got {:?}", other),
        }
        // the abandoned sweep finishing later must not overwrite the result
        tokio::time::sleep(Duration::from_millis(300)).await;
        match orchestrator.snapshot() {
            SimulationState::Completed { records, .. } => assert_eq!(records.len(), 1),
            other => panic!("expected completion, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_watchdog_fails_stuck_run() {
        let predictor = MockPredictor::new()
            .respond("qualifying", |_| Ok("never".to_string()))
            .with_start_delay(Duration::from_millis(500));
        let orchestrator = orchestrator(
            predictor,
            OrchestratorConfig {
                sweep_concurrency: 1,
                run_deadline: Some(Duration::from_millis(50)),
            },
        );
        let track = catalog::by_name("Singapore").unwrap();
        orchestrator.select_track(track);
        orchestrator
            .submit(SimulationRequest::qualifying(track))
            .unwrap();

        match orchestrator.wait_for_outcome().await {
            SimulationState::Failed { error, .. } => assert!(error.contains("50ms")),
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_runtime_failure_is_reported() {
        let predictor = MockPredictor::new().failing_start("python3: command not found");
        let orchestrator = orchestrator(predictor, OrchestratorConfig::default());
        let track = catalog::by_name("Miami").unwrap();
        orchestrator.select_track(track);
        orchestrator
            .submit(SimulationRequest::qualifying(track))
            .unwrap();

        match orchestrator.wait_for_outcome().await {
            SimulationState::Failed { error, .. } => {
                assert!(error.contains("python3: command not found"))
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[test]
    fn test_run_token() {
        let latest = Arc::new(AtomicU64::new(3));
        let token = RunToken::new(Arc::clone(&latest), 3);
        assert!(token.is_current());
        latest.fetch_add(1, Ordering::SeqCst);
        assert!(!token.is_current());
        assert!(RunToken::detached().is_current());
    }
}

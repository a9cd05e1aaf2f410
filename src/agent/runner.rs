use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tracing::{debug, error};

use crate::error::{AgentError, AppError, AppResult};

use super::actions::{ActionRegistry, Verdict};
use super::state::WorkerState;
use super::target::BlobTarget;

/// Lifecycle of one virtual user as seen from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerPhase {
    Running,
    Stopping,
    Stopped,
    Crashed,
}

impl RunnerPhase {
    const fn to_u8(self) -> u8 {
        match self {
            RunnerPhase::Running => 0,
            RunnerPhase::Stopping => 1,
            RunnerPhase::Stopped => 2,
            RunnerPhase::Crashed => 3,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => RunnerPhase::Running,
            1 => RunnerPhase::Stopping,
            2 => RunnerPhase::Stopped,
            _ => RunnerPhase::Crashed,
        }
    }

    #[must_use]
    pub const fn is_finished(self) -> bool {
        matches!(self, RunnerPhase::Stopped | RunnerPhase::Crashed)
    }
}

#[derive(Debug)]
struct ControlCell {
    stop: AtomicBool,
    phase: AtomicU8,
}

/// Stop flag and phase shared between a runner and whoever holds its handle.
/// The flag is only ever set, never cleared.
#[derive(Debug, Clone)]
pub struct RunnerControl(Arc<ControlCell>);

impl Default for RunnerControl {
    fn default() -> Self {
        Self::new()
    }
}

impl RunnerControl {
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(ControlCell {
            stop: AtomicBool::new(false),
            phase: AtomicU8::new(RunnerPhase::Running.to_u8()),
        }))
    }

    /// Signals the runner to stop after its current action. Never blocks.
    pub fn request_stop(&self) {
        self.0.stop.store(true, Ordering::Release);
        drop(self.0.phase.compare_exchange(
            RunnerPhase::Running.to_u8(),
            RunnerPhase::Stopping.to_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        ));
    }

    #[must_use]
    pub fn stop_requested(&self) -> bool {
        self.0.stop.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn phase(&self) -> RunnerPhase {
        RunnerPhase::from_u8(self.0.phase.load(Ordering::Acquire))
    }

    fn finish(&self, phase: RunnerPhase) {
        self.0.phase.store(phase.to_u8(), Ordering::Release);
    }
}

/// One executed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionOutcome {
    pub action: &'static str,
    /// Offset from the runner's start.
    pub started_at: Duration,
    pub elapsed: Duration,
    /// `None` means the action passed.
    pub failure: Option<String>,
}

impl ActionOutcome {
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        self.failure.is_some()
    }
}

/// Append-only outcome log written by exactly one runner.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutcomeLog {
    outcomes: Vec<ActionOutcome>,
}

impl OutcomeLog {
    #[must_use]
    pub const fn from_outcomes(outcomes: Vec<ActionOutcome>) -> Self {
        Self { outcomes }
    }

    #[must_use]
    pub fn results(&self) -> &[ActionOutcome] {
        &self.outcomes
    }

    #[must_use]
    pub fn total_actions(&self) -> usize {
        self.outcomes.len()
    }

    #[must_use]
    pub fn failed_actions(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_failure())
            .count()
    }

    fn push(&mut self, outcome: ActionOutcome) {
        self.outcomes.push(outcome);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerExit {
    Stopped,
    /// The harness itself failed; the log holds what ran before the fault.
    Crashed { error: String },
}

/// What a joined runner hands back.
#[derive(Debug, Clone)]
pub struct RunnerReport {
    pub worker: usize,
    pub log: OutcomeLog,
    pub exit: RunnerExit,
}

impl RunnerReport {
    #[must_use]
    pub fn results(&self) -> &[ActionOutcome] {
        self.log.results()
    }

    #[must_use]
    pub fn total_actions(&self) -> usize {
        self.log.total_actions()
    }

    #[must_use]
    pub fn failed_actions(&self) -> usize {
        self.log.failed_actions()
    }

    #[must_use]
    pub const fn crashed(&self) -> bool {
        matches!(self.exit, RunnerExit::Crashed { .. })
    }
}

/// A virtual user: owns its state, picks actions, records outcomes.
pub struct Runner {
    worker: usize,
    state: WorkerState,
    registry: Arc<ActionRegistry>,
    target: Arc<dyn BlobTarget>,
    control: RunnerControl,
    log: OutcomeLog,
    max_actions: Option<usize>,
    epoch: Instant,
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("worker", &self.worker)
            .field("state", &self.state)
            .field("actions", &self.log.total_actions())
            .finish_non_exhaustive()
    }
}

impl Runner {
    #[must_use]
    pub fn new(
        worker: usize,
        state: WorkerState,
        registry: Arc<ActionRegistry>,
        target: Arc<dyn BlobTarget>,
    ) -> Self {
        Self {
            worker,
            state,
            registry,
            target,
            control: RunnerControl::new(),
            log: OutcomeLog::default(),
            max_actions: None,
            epoch: Instant::now(),
        }
    }

    /// Stops on its own after `limit` actions.
    #[must_use]
    pub const fn with_max_actions(mut self, limit: Option<usize>) -> Self {
        self.max_actions = limit;
        self
    }

    #[must_use]
    pub fn control(&self) -> RunnerControl {
        self.control.clone()
    }

    #[must_use]
    pub const fn state(&self) -> &WorkerState {
        &self.state
    }

    #[must_use]
    pub const fn log(&self) -> &OutcomeLog {
        &self.log
    }

    fn cap_reached(&self) -> bool {
        self.max_actions
            .is_some_and(|limit| self.log.total_actions() >= limit)
    }

    /// Picks and runs one action, appending its outcome.
    ///
    /// # Errors
    ///
    /// Returns an error when the action raises a harness fault or no action
    /// can be chosen; verification failures are recorded, not returned.
    pub async fn step(&mut self) -> AppResult<()> {
        let action = if self.state.has_blobs() {
            self.registry
                .choose(self.state.rng())
                .ok_or_else(|| AppError::agent(AgentError::NoActions))?
        } else {
            self.registry.bootstrap()?
        };
        let name = action.name();

        let started = Instant::now();
        let verdict = self
            .registry
            .execute(name, &mut self.state, self.target.as_ref())
            .await?;
        let elapsed = started.elapsed();

        debug!(
            "worker {} {} in {:?}: {}",
            self.worker,
            name,
            elapsed,
            match &verdict {
                Verdict::Passed => "ok".to_owned(),
                Verdict::Failed(failure) => failure.to_string(),
            }
        );
        self.log.push(ActionOutcome {
            action: name,
            started_at: started.saturating_duration_since(self.epoch),
            elapsed,
            failure: verdict.failure_message(),
        });
        Ok(())
    }

    /// Loops until a stop is requested, the action cap is hit, or a harness
    /// fault occurs.
    pub async fn run(mut self) -> RunnerReport {
        self.epoch = Instant::now();
        while !self.control.stop_requested() && !self.cap_reached() {
            if let Err(err) = self.step().await {
                error!("worker {} crashed: {}", self.worker, err);
                self.control.finish(RunnerPhase::Crashed);
                return RunnerReport {
                    worker: self.worker,
                    log: self.log,
                    exit: RunnerExit::Crashed {
                        error: err.to_string(),
                    },
                };
            }
        }
        debug!(
            "worker {} stopped after {} actions ({})",
            self.worker,
            self.log.total_actions(),
            self.state
        );
        self.control.finish(RunnerPhase::Stopped);
        RunnerReport {
            worker: self.worker,
            log: self.log,
            exit: RunnerExit::Stopped,
        }
    }

    /// Spawns the runner on the current tokio runtime.
    #[must_use]
    pub fn start(self) -> RunnerHandle {
        let worker = self.worker;
        let control = self.control();
        let task = tokio::spawn(self.run());
        RunnerHandle {
            worker,
            control,
            task,
        }
    }
}

#[derive(Debug)]
pub struct RunnerHandle {
    worker: usize,
    control: RunnerControl,
    task: JoinHandle<RunnerReport>,
}

impl RunnerHandle {
    #[must_use]
    pub const fn worker(&self) -> usize {
        self.worker
    }

    /// Idempotent; returns immediately.
    pub fn request_stop(&self) {
        self.control.request_stop();
    }

    #[must_use]
    pub fn phase(&self) -> RunnerPhase {
        self.control.phase()
    }

    /// Waits for the runner to finish. A task that panicked is reported as
    /// crashed with an empty log.
    pub async fn join(self) -> RunnerReport {
        match self.task.await {
            Ok(report) => report,
            Err(err) => {
                self.control.finish(RunnerPhase::Crashed);
                RunnerReport {
                    worker: self.worker,
                    log: OutcomeLog::default(),
                    exit: RunnerExit::Crashed {
                        error: format!("worker task failed: {}", err),
                    },
                }
            }
        }
    }
}

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::error::{AgentError, AppError, AppResult};
use crate::metrics::AggregateReport;
use crate::shutdown::ShutdownReceiver;

use super::actions::ActionRegistry;
use super::runner::{Runner, RunnerHandle, RunnerReport};
use super::settings::AgentSettings;
use super::state::WorkerState;
use super::target::BlobTarget;

/// How often the coordinator checks whether every runner ended on its own.
const FINISHED_POLL_INTERVAL: Duration = Duration::from_millis(50);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunPlan {
    pub workers: usize,
    /// `None` runs until shutdown or until every worker hits its cap.
    pub duration: Option<Duration>,
    pub max_actions: Option<usize>,
    /// Worker `i` is seeded with `seed + i`.
    pub seed: Option<u64>,
}

/// Owns the set of runners for one run.
pub struct Coordinator {
    settings: Arc<AgentSettings>,
    registry: Arc<ActionRegistry>,
    target: Arc<dyn BlobTarget>,
    plan: RunPlan,
}

impl std::fmt::Debug for Coordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Coordinator")
            .field("settings", &self.settings)
            .field("registry", &self.registry)
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl Coordinator {
    /// # Errors
    ///
    /// Returns an error when the plan has no workers or the registry has no
    /// bootstrap action.
    pub fn new(
        settings: Arc<AgentSettings>,
        registry: Arc<ActionRegistry>,
        target: Arc<dyn BlobTarget>,
        plan: RunPlan,
    ) -> AppResult<Self> {
        if plan.workers == 0 {
            return Err(AppError::agent(AgentError::NoWorkers));
        }
        registry.bootstrap()?;
        Ok(Self {
            settings,
            registry,
            target,
            plan,
        })
    }

    fn worker_seed(&self, worker: usize) -> Option<u64> {
        self.plan
            .seed
            .map(|seed| seed.wrapping_add(u64::try_from(worker).unwrap_or(u64::MAX)))
    }

    fn start_runners(&self) -> Vec<RunnerHandle> {
        (0..self.plan.workers)
            .map(|worker| {
                let state = WorkerState::new(Arc::clone(&self.settings), self.worker_seed(worker));
                Runner::new(
                    worker,
                    state,
                    Arc::clone(&self.registry),
                    Arc::clone(&self.target),
                )
                .with_max_actions(self.plan.max_actions)
                .start()
            })
            .collect()
    }

    /// Runs every worker until the plan's duration elapses, a shutdown is
    /// broadcast, or all workers finish on their own, then joins them all and
    /// aggregates their logs.
    ///
    /// # Errors
    ///
    /// Returns an error if the aggregate report cannot be built.
    pub async fn run(&self, mut shutdown_rx: ShutdownReceiver) -> AppResult<AggregateReport> {
        let started_at = chrono::Utc::now().to_rfc3339();
        let started = Instant::now();
        info!(
            "Starting {} workers against {} ({} actions registered)",
            self.plan.workers,
            self.settings.base_url(),
            self.registry.len()
        );
        let handles = self.start_runners();

        tokio::select! {
            () = sleep_or_pending(self.plan.duration) => {
                info!("Run duration elapsed; stopping workers.");
            }
            result = shutdown_rx.recv() => {
                if let Err(broadcast::error::RecvError::Closed) = result {
                    warn!("Shutdown channel closed; stopping workers.");
                } else {
                    info!("Shutdown requested; stopping workers.");
                }
            }
            () = wait_all_finished(&handles) => {
                info!("All workers finished on their own.");
            }
        }

        // Signal everyone before joining anyone.
        for handle in &handles {
            handle.request_stop();
        }
        let reports: Vec<RunnerReport> =
            join_all(handles.into_iter().map(RunnerHandle::join)).await;
        let elapsed = started.elapsed();

        let report = AggregateReport::from_runners(&reports, started_at, elapsed)?;
        info!(
            "Run finished: {} actions, {} failed, {} crashed workers",
            report.total_actions,
            report.failed_actions,
            report.crashes.len()
        );
        Ok(report)
    }
}

async fn sleep_or_pending(duration: Option<Duration>) {
    match duration {
        Some(duration) => tokio::time::sleep(duration).await,
        None => std::future::pending::<()>().await,
    }
}

async fn wait_all_finished(handles: &[RunnerHandle]) {
    let mut ticker = tokio::time::interval(FINISHED_POLL_INTERVAL);
    loop {
        ticker.tick().await;
        if handles.iter().all(|handle| handle.phase().is_finished()) {
            return;
        }
    }
}

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::agent::{RunnerExit, RunnerReport};
use crate::error::MetricsError;

use super::histogram::LatencyHistogram;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub worker: usize,
    pub action: String,
    pub message: String,
    pub at_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashRecord {
    pub worker: usize,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerSummary {
    pub worker: usize,
    pub total_actions: u64,
    pub failed_actions: u64,
    pub crashed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ActionStats {
    pub count: u64,
    pub failed: u64,
    pub min_ms: u64,
    pub p50_ms: u64,
    pub p90_ms: u64,
    pub p99_ms: u64,
    pub max_ms: u64,
}

/// Merged view over every joined runner.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateReport {
    pub started_at: String,
    pub duration_ms: u64,
    pub workers: usize,
    pub total_actions: u64,
    pub failed_actions: u64,
    pub actions: BTreeMap<String, ActionStats>,
    pub failures: Vec<FailureRecord>,
    pub crashes: Vec<CrashRecord>,
    pub per_worker: Vec<WorkerSummary>,
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

fn count_u64(value: usize) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}

impl AggregateReport {
    /// Folds runner reports into one report. Every report must come from a
    /// runner that has already been joined.
    ///
    /// # Errors
    ///
    /// Returns an error if a latency histogram cannot be built.
    pub fn from_runners(
        reports: &[RunnerReport],
        started_at: String,
        elapsed: Duration,
    ) -> Result<Self, MetricsError> {
        let mut histograms: BTreeMap<&'static str, (LatencyHistogram, u64)> = BTreeMap::new();
        let mut failures = Vec::new();
        let mut crashes = Vec::new();
        let mut per_worker = Vec::with_capacity(reports.len());
        let mut total_actions: u64 = 0;
        let mut failed_actions: u64 = 0;

        for report in reports {
            for outcome in report.results() {
                let entry = match histograms.entry(outcome.action) {
                    std::collections::btree_map::Entry::Occupied(entry) => entry.into_mut(),
                    std::collections::btree_map::Entry::Vacant(entry) => {
                        entry.insert((LatencyHistogram::new()?, 0))
                    }
                };
                entry.0.record(duration_ms(outcome.elapsed))?;
                if let Some(message) = outcome.failure.as_ref() {
                    entry.1 = entry.1.saturating_add(1);
                    failures.push(FailureRecord {
                        worker: report.worker,
                        action: outcome.action.to_owned(),
                        message: message.clone(),
                        at_ms: duration_ms(outcome.started_at),
                    });
                }
            }

            let worker_total = count_u64(report.total_actions());
            let worker_failed = count_u64(report.failed_actions());
            total_actions = total_actions.saturating_add(worker_total);
            failed_actions = failed_actions.saturating_add(worker_failed);
            if let RunnerExit::Crashed { error } = &report.exit {
                crashes.push(CrashRecord {
                    worker: report.worker,
                    error: error.clone(),
                });
            }
            per_worker.push(WorkerSummary {
                worker: report.worker,
                total_actions: worker_total,
                failed_actions: worker_failed,
                crashed: report.crashed(),
            });
        }

        let actions = histograms
            .into_iter()
            .map(|(name, (hist, failed))| {
                let (p50_ms, p90_ms, p99_ms) = hist.percentiles();
                (
                    name.to_owned(),
                    ActionStats {
                        count: hist.count(),
                        failed,
                        min_ms: hist.min(),
                        p50_ms,
                        p90_ms,
                        p99_ms,
                        max_ms: hist.max(),
                    },
                )
            })
            .collect();

        Ok(Self {
            started_at,
            duration_ms: duration_ms(elapsed),
            workers: reports.len(),
            total_actions,
            failed_actions,
            actions,
            failures,
            crashes,
            per_worker,
        })
    }

    #[must_use]
    pub fn has_crashes(&self) -> bool {
        !self.crashes.is_empty()
    }
}

//! Latency histograms and the run-wide aggregate report.
mod histogram;
mod report;

pub use histogram::LatencyHistogram;
pub use report::{ActionStats, AggregateReport, CrashRecord, FailureRecord, WorkerSummary};

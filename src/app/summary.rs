use crate::metrics::{ActionStats, AggregateReport};

/// Failures listed in the summary before the rest are elided.
const MAX_LISTED_FAILURES: usize = 20;

fn rate_x100(part: u64, total: u64) -> u64 {
    if total == 0 {
        return 0;
    }
    let scaled = u128::from(part)
        .saturating_mul(10_000)
        .checked_div(u128::from(total))
        .unwrap_or(0);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

fn action_table_header() -> String {
    format!(
        "{:<18} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Action", "Count", "Failed", "Min", "P50", "P90", "P99", "Max"
    )
}

fn action_table_row(name: &str, stats: &ActionStats) -> String {
    format!(
        "{:<18} {:>8} {:>8} {:>6}ms {:>6}ms {:>6}ms {:>6}ms {:>6}ms",
        name,
        stats.count,
        stats.failed,
        stats.min_ms,
        stats.p50_ms,
        stats.p90_ms,
        stats.p99_ms,
        stats.max_ms
    )
}

pub(crate) fn print_summary(report: &AggregateReport) {
    let passed = report.total_actions.saturating_sub(report.failed_actions);
    let pass_rate = rate_x100(passed, report.total_actions);

    println!("Started: {}", report.started_at);
    println!("Duration: {}ms", report.duration_ms);
    println!("Workers: {}", report.workers);
    println!("Total Actions: {}", report.total_actions);
    println!("Passed: {} ({}.{:02}%)", passed, pass_rate / 100, pass_rate % 100);
    println!("Failed: {}", report.failed_actions);
    println!("Crashed Workers: {}", report.crashes.len());

    if !report.actions.is_empty() {
        println!();
        println!("{}", action_table_header());
        for (name, stats) in &report.actions {
            println!("{}", action_table_row(name, stats));
        }
    }

    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in report.failures.iter().take(MAX_LISTED_FAILURES) {
            println!(
                "  [worker {}] {} @{}ms: {}",
                failure.worker, failure.action, failure.at_ms, failure.message
            );
        }
        let hidden = report.failures.len().saturating_sub(MAX_LISTED_FAILURES);
        if hidden > 0 {
            println!("  ... and {} more", hidden);
        }
    }

    for crash in &report.crashes {
        println!("Worker {} crashed: {}", crash.worker, crash.error);
    }
}

use std::sync::Arc;

use tracing::{info, warn};

use crate::agent::actions::ListWrongToken;
use crate::agent::{ActionRegistry, AgentSettings, BlobTarget, Coordinator, HttpTarget, RunPlan};
use crate::args::AgentArgs;
use crate::error::{AgentError, AppError, AppResult, ValidationError};
use crate::metrics::AggregateReport;
use crate::shutdown::shutdown_channel;
use crate::system::shutdown_handlers::setup_signal_shutdown_handler;

use super::export::export_json;
use super::summary::print_summary;

pub(crate) fn build_settings(args: &AgentArgs) -> AppResult<AgentSettings> {
    let url = args
        .url
        .as_deref()
        .ok_or_else(|| AppError::validation(ValidationError::MissingUrl))?;
    AgentSettings::new(
        url,
        &args.auth_header,
        &args.token,
        &args.invalid_token,
        args.blob_sizes.clone(),
    )
}

pub(crate) fn build_registry(args: &AgentArgs) -> AppResult<ActionRegistry> {
    let mut registry = ActionRegistry::with_builtins();
    if args.negative_auth {
        registry.register_action(ListWrongToken)?;
    }
    Ok(registry)
}

pub(crate) fn build_plan(args: &AgentArgs) -> RunPlan {
    RunPlan {
        workers: args.workers.get(),
        duration: args.duration,
        max_actions: args.max_actions.map(|value| value.get()),
        seed: args.seed,
    }
}

/// Runs the agent end to end: one coordinator, one shutdown broadcast wired
/// to process signals, then summary and optional export.
///
/// # Errors
///
/// Returns an error on invalid settings, a failed export, or when any worker
/// crashed.
pub(crate) async fn run_agent(args: AgentArgs) -> AppResult<()> {
    let settings = build_settings(&args)?.into_shared();
    let registry = Arc::new(build_registry(&args)?);
    let target: Arc<dyn BlobTarget> = Arc::new(HttpTarget::new(args.request_timeout)?);
    let plan = build_plan(&args);

    if plan.duration.is_none() && plan.max_actions.is_none() {
        info!("No --duration or --max-actions given; running until Ctrl+C.");
    }

    let coordinator = Coordinator::new(settings, registry, target, plan)?;

    let (shutdown_tx, shutdown_rx) = shutdown_channel();
    let signal_handle = setup_signal_shutdown_handler(&shutdown_tx);

    let result = coordinator.run(shutdown_rx).await;

    drop(shutdown_tx.send(()));
    if let Err(err) = signal_handle.await {
        warn!("Signal handler task failed: {}", err);
    }

    let report = result?;
    finish(&args, &report).await
}

async fn finish(args: &AgentArgs, report: &AggregateReport) -> AppResult<()> {
    print_summary(report);

    if let Some(path) = args.export_json.as_deref() {
        export_json(path, report).await?;
        info!("Wrote JSON report to {}", path);
    }

    if report.has_crashes() {
        return Err(AppError::agent(AgentError::WorkersCrashed {
            count: report.crashes.len(),
        }));
    }
    Ok(())
}

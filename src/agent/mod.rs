//! The traffic-generation core: worker state, the action catalog, the
//! virtual-user runner and the coordinator that drives many of them.
pub mod actions;
mod coordinator;
mod http_target;
pub mod payload;
mod runner;
pub mod settings;
mod state;
pub mod target;

#[cfg(test)]
pub(crate) mod test_support;

pub use actions::{Action, ActionRegistry, Verdict, VerificationFailure};
pub use coordinator::{Coordinator, RunPlan};
pub use http_target::HttpTarget;
pub use runner::{
    ActionOutcome, OutcomeLog, Runner, RunnerControl, RunnerExit, RunnerHandle, RunnerPhase,
    RunnerReport,
};
pub use settings::AgentSettings;
pub use state::{Credentials, WorkerState};
pub use target::{BlobTarget, RequestBody, TargetRequest, TargetResponse};

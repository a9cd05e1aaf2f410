use thiserror::Error;

use crate::error::AppError;

/// The target answered, but not the way the action's contract says it must.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Test Failed: {message}")]
pub struct VerificationFailure {
    message: String,
}

impl VerificationFailure {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Outcome of one action run as seen by the runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed(VerificationFailure),
}

impl Verdict {
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Verdict::Passed)
    }

    #[must_use]
    pub fn failure_message(&self) -> Option<String> {
        match self {
            Verdict::Passed => None,
            Verdict::Failed(failure) => Some(failure.to_string()),
        }
    }
}

/// Error type used inside action bodies so both kinds propagate with `?`.
/// Only `Verification` is absorbed into a [`Verdict`].
#[derive(Debug, Error)]
pub enum ActionError {
    #[error(transparent)]
    Verification(#[from] VerificationFailure),
    #[error(transparent)]
    Harness(#[from] AppError),
}

pub type ActionResult = Result<(), ActionError>;

/// Splits an action result at the action boundary.
///
/// # Errors
///
/// Returns the harness fault unchanged; verification failures become
/// `Ok(Verdict::Failed)`.
pub fn into_verdict(result: ActionResult) -> Result<Verdict, AppError> {
    match result {
        Ok(()) => Ok(Verdict::Passed),
        Err(ActionError::Verification(failure)) => Ok(Verdict::Failed(failure)),
        Err(ActionError::Harness(err)) => Err(err),
    }
}

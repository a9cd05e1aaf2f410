//! Named actions a virtual user can perform against the blob service.
//!
//! Actions are looked up by name at runtime. The runner only ever asks the
//! registry for "any action" or for the bootstrap action, so adding an
//! action is one `register_action` call.
mod auth;
mod blob;
mod contract;
mod verdict;
mod visibility;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::error::{AgentError, AppError, AppResult};

use super::state::WorkerState;
use super::target::BlobTarget;

pub use auth::{LIST_WRONG_TOKEN, ListWrongToken};
pub use blob::{
    DELETE, Delete, FETCH, FETCH_ANONYMOUS, FETCH_HASH, Fetch, FetchAnonymous, FetchHash, LIST,
    List, REPLACE, Replace, UPLOAD, Upload,
};
pub use verdict::{ActionError, ActionResult, Verdict, VerificationFailure, into_verdict};
pub use visibility::{MAKE_PRIVATE, MAKE_PUBLIC, MakePrivate, MakePublic};

/// Action every worker runs until it owns at least one blob.
pub const BOOTSTRAP_ACTION: &str = UPLOAD;

#[async_trait]
pub trait Action: Send + Sync {
    fn name(&self) -> &'static str;

    /// Performs one interaction with the target, updating `state` only on
    /// success.
    ///
    /// # Errors
    ///
    /// Returns `ActionError::Verification` when the response breaks the
    /// action's contract and `ActionError::Harness` for anything else.
    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult;
}

#[derive(Clone, Default)]
pub struct ActionRegistry {
    actions: Vec<Arc<dyn Action>>,
}

impl std::fmt::Debug for ActionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActionRegistry")
            .field("actions", &self.names())
            .finish()
    }
}

impl ActionRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding the standard blob catalog.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        let builtins: [Arc<dyn Action>; 9] = [
            Arc::new(Upload),
            Arc::new(Replace),
            Arc::new(Delete),
            Arc::new(List),
            Arc::new(Fetch),
            Arc::new(FetchAnonymous),
            Arc::new(MakePrivate),
            Arc::new(MakePublic),
            Arc::new(FetchHash),
        ];
        for action in builtins {
            if let Err(err) = registry.register_shared(action) {
                tracing::warn!("Skipping duplicate builtin action: {}", err);
            }
        }
        registry
    }

    /// Registers an action under its own name.
    ///
    /// # Errors
    ///
    /// Returns an error when an action with the same name already exists.
    pub fn register_action<A>(&mut self, action: A) -> AppResult<()>
    where
        A: Action + 'static,
    {
        self.register_shared(Arc::new(action))
    }

    fn register_shared(&mut self, action: Arc<dyn Action>) -> AppResult<()> {
        let name = action.name();
        if self.get(name).is_some() {
            return Err(AppError::agent(AgentError::DuplicateAction { name }));
        }
        self.actions.push(action);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Action> {
        self.actions
            .iter()
            .find(|action| action.name() == name)
            .map(Arc::as_ref)
    }

    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.actions.iter().map(|action| action.name()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Uniform pick over every registered action.
    pub fn choose<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&dyn Action> {
        self.actions.choose(rng).map(Arc::as_ref)
    }

    /// The action forced while a worker owns nothing.
    ///
    /// # Errors
    ///
    /// Returns an error when the bootstrap action was never registered.
    pub fn bootstrap(&self) -> AppResult<&dyn Action> {
        self.get(BOOTSTRAP_ACTION).ok_or_else(|| {
            AppError::agent(AgentError::MissingBootstrapAction {
                name: BOOTSTRAP_ACTION,
            })
        })
    }

    /// Runs the named action and folds verification failures into a verdict.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown names and for harness faults raised by
    /// the action.
    pub async fn execute(
        &self,
        name: &str,
        state: &mut WorkerState,
        target: &dyn BlobTarget,
    ) -> AppResult<Verdict> {
        let action = self.get(name).ok_or_else(|| {
            AppError::agent(AgentError::UnknownAction {
                name: name.to_owned(),
            })
        })?;
        into_verdict(action.execute(state, target).await)
    }
}

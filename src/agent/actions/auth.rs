use async_trait::async_trait;
use reqwest::Method;

use crate::agent::state::{Credentials, WorkerState};
use crate::agent::target::{BlobTarget, TargetRequest};

use super::Action;
use super::verdict::{ActionResult, VerificationFailure};

pub const LIST_WRONG_TOKEN: &str = "list-wrong-token";

/// Lists blobs with the invalid token. The target must refuse.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListWrongToken;

#[async_trait]
impl Action for ListWrongToken {
    fn name(&self) -> &'static str {
        LIST_WRONG_TOKEN
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let request = TargetRequest::new(
            Method::GET,
            state.endpoint("/api/v1/blobs")?,
            state.headers(Credentials::Invalid),
        );
        let response = target.send(request).await?;
        if (200..300).contains(&response.status) {
            return Err(VerificationFailure::new(format!(
                "Expected rejection of invalid token, but got {}",
                response.status
            ))
            .into());
        }
        Ok(())
    }
}

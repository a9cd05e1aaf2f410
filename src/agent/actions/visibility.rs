use async_trait::async_trait;
use rand::Rng;
use reqwest::Method;
use serde_json::json;

use crate::agent::settings::PUBLIC_KEY;
use crate::agent::state::{Credentials, WorkerState};
use crate::agent::target::{BlobTarget, RequestBody, TargetRequest};

use super::Action;
use super::blob::{blob_path, upload_blob};
use super::contract::expect_status;
use super::verdict::ActionResult;

pub const MAKE_PRIVATE: &str = "make-private";
pub const MAKE_PUBLIC: &str = "make-public";

/// Sends the visibility flip with PUT or PATCH, picked at random.
async fn set_visibility(
    state: &mut WorkerState,
    target: &dyn BlobTarget,
    blob_id: &str,
    public: bool,
) -> ActionResult {
    let method = if state.rng().gen_bool(0.5) {
        Method::PUT
    } else {
        Method::PATCH
    };
    let request = TargetRequest::new(
        method,
        state.endpoint(&format!("{}/visibility", blob_path(blob_id)))?,
        state.headers(Credentials::Valid),
    )
    .with_body(RequestBody::Json(json!({ PUBLIC_KEY: public })));
    let response = target.send(request).await?;
    expect_status(&response, 204)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MakePrivate;

#[async_trait]
impl Action for MakePrivate {
    fn name(&self) -> &'static str {
        MAKE_PRIVATE
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let blob_id = match state.public_blob() {
            Some(blob_id) => blob_id,
            None => upload_blob(state, target).await?,
        };
        set_visibility(state, target, &blob_id, false).await?;
        state.make_blob_private(&blob_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MakePublic;

#[async_trait]
impl Action for MakePublic {
    fn name(&self) -> &'static str {
        MAKE_PUBLIC
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        // A freshly uploaded blob is already public; flipping it again is
        // accepted and only noted in the log.
        let blob_id = match state.private_blob() {
            Some(blob_id) => blob_id,
            None => upload_blob(state, target).await?,
        };
        set_visibility(state, target, &blob_id, true).await?;
        state.make_blob_public(&blob_id);
        Ok(())
    }
}

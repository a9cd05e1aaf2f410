use std::collections::BTreeSet;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use reqwest::Method;

use crate::agent::settings::{BLOB_ID_KEY, BLOBS_KEY, HASH_ALGORITHMS, MULTIPART_FILE_KEY};
use crate::agent::state::{Credentials, WorkerState};
use crate::agent::target::{BlobTarget, RequestBody, TargetRequest};

use super::Action;
use super::contract::{
    decode_json, expect_status, require_key, require_string, require_string_list,
};
use super::verdict::{ActionError, ActionResult, VerificationFailure};

pub const UPLOAD: &str = "upload";
pub const REPLACE: &str = "replace";
pub const DELETE: &str = "delete";
pub const LIST: &str = "list";
pub const FETCH: &str = "fetch";
pub const FETCH_ANONYMOUS: &str = "fetch-anonymous";
pub const FETCH_HASH: &str = "fetch-hash";

pub(super) fn blob_path(blob_id: &str) -> String {
    format!("/api/v1/blob/{}", blob_id)
}

/// POSTs a fresh payload and records the returned id. Returns the id.
pub(super) async fn upload_blob(
    state: &mut WorkerState,
    target: &dyn BlobTarget,
) -> Result<String, ActionError> {
    let payload = state.next_payload();
    let request = TargetRequest::new(
        Method::POST,
        state.endpoint("/api/v1/blob")?,
        state.headers(Credentials::Valid),
    )
    .with_body(RequestBody::File {
        field: MULTIPART_FILE_KEY,
        payload,
    });
    let response = target.send(request).await?;
    expect_status(&response, 201)?;
    let document = decode_json(&response)?;
    let blob_id = require_string(require_key(&document, BLOB_ID_KEY)?, BLOB_ID_KEY)?;
    state.new_blob(blob_id.clone());
    Ok(blob_id)
}

/// The last created blob, uploading one first when the worker owns none.
pub(super) async fn last_or_upload(
    state: &mut WorkerState,
    target: &dyn BlobTarget,
) -> Result<String, ActionError> {
    match state.last_blob() {
        Some(blob_id) => Ok(blob_id.to_owned()),
        None => upload_blob(state, target).await,
    }
}

async fn get_blob(
    state: &WorkerState,
    target: &dyn BlobTarget,
    blob_id: &str,
    credentials: Credentials,
) -> ActionResult {
    let request = TargetRequest::new(
        Method::GET,
        state.endpoint(&blob_path(blob_id))?,
        state.headers(credentials),
    );
    let response = target.send(request).await?;
    expect_status(&response, 200)?;
    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Upload;

#[async_trait]
impl Action for Upload {
    fn name(&self) -> &'static str {
        UPLOAD
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        upload_blob(state, target).await.map(|_blob_id| ())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Replace;

#[async_trait]
impl Action for Replace {
    fn name(&self) -> &'static str {
        REPLACE
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let blob_id = match state.random_owned_blob() {
            Some(blob_id) => blob_id,
            None => upload_blob(state, target).await?,
        };
        let payload = state.next_payload();
        let request = TargetRequest::new(
            Method::PUT,
            state.endpoint(&blob_path(&blob_id))?,
            state.headers(Credentials::Valid),
        )
        .with_body(RequestBody::File {
            field: MULTIPART_FILE_KEY,
            payload,
        });
        let response = target.send(request).await?;
        expect_status(&response, 204)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Delete;

#[async_trait]
impl Action for Delete {
    fn name(&self) -> &'static str {
        DELETE
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let blob_id = last_or_upload(state, target).await?;
        let request = TargetRequest::new(
            Method::DELETE,
            state.endpoint(&blob_path(&blob_id))?,
            state.headers(Credentials::Valid),
        );
        let response = target.send(request).await?;
        expect_status(&response, 204)?;
        state.forget_blob(&blob_id);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct List;

#[async_trait]
impl Action for List {
    fn name(&self) -> &'static str {
        LIST
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let request = TargetRequest::new(
            Method::GET,
            state.endpoint("/api/v1/blobs")?,
            state.headers(Credentials::Valid),
        );
        let response = target.send(request).await?;
        // The listing endpoint answers 201, not 200.
        expect_status(&response, 201)?;
        let document = decode_json(&response)?;
        let remote: BTreeSet<String> =
            require_string_list(require_key(&document, BLOBS_KEY)?, BLOBS_KEY)?
                .into_iter()
                .collect();
        let local: BTreeSet<String> = state.owned_blobs().iter().cloned().collect();
        if remote != local {
            return Err(VerificationFailure::new("Blobs in remote and local are different").into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Fetch;

#[async_trait]
impl Action for Fetch {
    fn name(&self) -> &'static str {
        FETCH
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let blob_id = last_or_upload(state, target).await?;
        get_blob(state, target, &blob_id, Credentials::Valid).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchAnonymous;

#[async_trait]
impl Action for FetchAnonymous {
    fn name(&self) -> &'static str {
        FETCH_ANONYMOUS
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let blob_id = match state.public_blob() {
            Some(blob_id) => blob_id,
            None => upload_blob(state, target).await?,
        };
        get_blob(state, target, &blob_id, Credentials::Anonymous).await
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FetchHash;

#[async_trait]
impl Action for FetchHash {
    fn name(&self) -> &'static str {
        FETCH_HASH
    }

    async fn execute(&self, state: &mut WorkerState, target: &dyn BlobTarget) -> ActionResult {
        let blob_id = last_or_upload(state, target).await?;
        let algorithm = HASH_ALGORITHMS
            .choose(state.rng())
            .copied()
            .unwrap_or("md5");
        let request = TargetRequest::new(
            Method::GET,
            state.endpoint(&format!("{}/hash", blob_path(&blob_id)))?,
            state.headers(Credentials::Valid),
        )
        .with_query("type", algorithm.to_owned());
        let response = target.send(request).await?;
        expect_status(&response, 200)?;
        Ok(())
    }
}

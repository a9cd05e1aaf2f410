use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::json;

use crate::error::{AppError, AppResult, HttpError};

use super::settings::{AgentSettings, DEFAULT_AUTH_HEADER};
use super::target::{BlobTarget, RequestBody, TargetRequest, TargetResponse};

pub(crate) const TEST_BASE_URL: &str = "http://blobs.test";
const VALID_TOKEN: &str = "USER_TOKEN";

pub(crate) fn run_async_test<F>(future: F) -> Result<(), String>
where
    F: Future<Output = Result<(), String>>,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(|err| format!("Failed to build runtime: {}", err))?;
    runtime.block_on(future)
}

/// Default settings with tiny payloads so tests stay fast.
pub(crate) fn test_settings() -> Result<AgentSettings, String> {
    AgentSettings::new(
        TEST_BASE_URL,
        DEFAULT_AUTH_HEADER,
        VALID_TOKEN,
        ":():",
        vec![8, 16],
    )
    .map_err(|err| err.to_string())
}

#[derive(Debug, Clone)]
pub(crate) struct SeenRequest {
    pub(crate) method: Method,
    pub(crate) path: String,
    pub(crate) query: Vec<(&'static str, String)>,
    pub(crate) authenticated: bool,
    pub(crate) json: Option<serde_json::Value>,
    pub(crate) file_len: Option<usize>,
}

#[derive(Debug, Default)]
struct FakeStore {
    next_id: u64,
    blobs: BTreeMap<String, bool>,
    seen: Vec<SeenRequest>,
}

/// In-memory blob service following the documented REST contract.
#[derive(Debug, Default)]
pub(crate) struct FakeBlobService {
    store: Mutex<FakeStore>,
    overrides: Vec<(Method, u16)>,
    fixed_upload_id: Option<String>,
    unreachable: bool,
}

impl FakeBlobService {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Every request with `method` answers `status` and changes nothing.
    pub(crate) fn failing(mut self, method: Method, status: u16) -> Self {
        self.overrides.push((method, status));
        self
    }

    /// Uploads always return this id.
    pub(crate) fn with_upload_id(mut self, blob_id: &str) -> Self {
        self.fixed_upload_id = Some(blob_id.to_owned());
        self
    }

    /// Every request fails before a response exists.
    pub(crate) fn unreachable(mut self) -> Self {
        self.unreachable = true;
        self
    }

    pub(crate) fn seen(&self) -> Vec<SeenRequest> {
        self.store
            .lock()
            .map(|store| store.seen.clone())
            .unwrap_or_default()
    }

    pub(crate) fn stored_ids(&self) -> Vec<String> {
        self.store
            .lock()
            .map(|store| store.blobs.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn respond(
        &self,
        store: &mut FakeStore,
        request: &TargetRequest,
        authenticated: bool,
    ) -> TargetResponse {
        if let Some((_, status)) = self
            .overrides
            .iter()
            .find(|(method, _)| *method == request.method)
        {
            return TargetResponse::new(*status, Vec::new());
        }

        let path = request.url.path();
        if path == "/api/v1/blobs" && request.method == Method::GET {
            if !authenticated {
                return TargetResponse::new(401, Vec::new());
            }
            let blobs: Vec<&String> = store.blobs.keys().collect();
            return json_response(201, &json!({ "blobs": blobs }));
        }
        if path == "/api/v1/blob" && request.method == Method::POST {
            store.next_id = store.next_id.saturating_add(1);
            let blob_id = self
                .fixed_upload_id
                .clone()
                .unwrap_or_else(|| format!("b{}", store.next_id));
            store.blobs.insert(blob_id.clone(), true);
            return json_response(201, &json!({ "blobId": blob_id }));
        }

        let Some(rest) = path.strip_prefix("/api/v1/blob/") else {
            return TargetResponse::new(404, Vec::new());
        };
        let mut segments = rest.split('/');
        let blob_id = segments.next().unwrap_or_default().to_owned();
        let suffix = segments.next();
        let Some(public) = store.blobs.get(&blob_id).copied() else {
            return TargetResponse::new(404, Vec::new());
        };

        match (suffix, &request.method) {
            (None, method) if *method == Method::GET => {
                if authenticated || public {
                    TargetResponse::new(200, b"data".to_vec())
                } else {
                    TargetResponse::new(403, Vec::new())
                }
            }
            (None, method) if *method == Method::PUT => TargetResponse::new(204, Vec::new()),
            (None, method) if *method == Method::DELETE => {
                store.blobs.remove(&blob_id);
                TargetResponse::new(204, Vec::new())
            }
            (Some("visibility"), method) if *method == Method::PUT || *method == Method::PATCH => {
                let flag = match &request.body {
                    RequestBody::Json(value) => {
                        value.get("public").and_then(serde_json::Value::as_bool)
                    }
                    RequestBody::Empty | RequestBody::File { .. } => None,
                };
                match flag {
                    Some(flag) => {
                        store.blobs.insert(blob_id, flag);
                        TargetResponse::new(204, Vec::new())
                    }
                    None => TargetResponse::new(400, Vec::new()),
                }
            }
            (Some("hash"), method) if *method == Method::GET => {
                TargetResponse::new(200, b"d41d8cd98f00b204e9800998ecf8427e".to_vec())
            }
            _ => TargetResponse::new(405, Vec::new()),
        }
    }
}

fn json_response(status: u16, value: &serde_json::Value) -> TargetResponse {
    TargetResponse::new(status, value.to_string().into_bytes())
}

#[async_trait]
impl BlobTarget for FakeBlobService {
    async fn send(&self, request: TargetRequest) -> AppResult<TargetResponse> {
        if self.unreachable {
            return Err(AppError::http(HttpError::InvalidUrl {
                url: request.url.to_string(),
                source: url::ParseError::EmptyHost,
            }));
        }
        tokio::task::yield_now().await;
        let authenticated = request
            .headers
            .get(DEFAULT_AUTH_HEADER)
            .is_some_and(|value| value.as_bytes() == VALID_TOKEN.as_bytes());
        let mut store = self
            .store
            .lock()
            .map_err(|_poisoned| {
                AppError::http(HttpError::InvalidUrl {
                    url: request.url.to_string(),
                    source: url::ParseError::EmptyHost,
                })
            })?;
        store.seen.push(SeenRequest {
            method: request.method.clone(),
            path: request.url.path().to_owned(),
            query: request.query.clone(),
            authenticated,
            json: match &request.body {
                RequestBody::Json(value) => Some(value.clone()),
                RequestBody::Empty | RequestBody::File { .. } => None,
            },
            file_len: match &request.body {
                RequestBody::File { payload, .. } => Some(payload.bytes.len()),
                RequestBody::Empty | RequestBody::Json(_) => None,
            },
        });
        Ok(self.respond(&mut store, &request, authenticated))
    }
}

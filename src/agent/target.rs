//! The seam between the action catalog and the wire.
//!
//! Actions describe a request as a [`TargetRequest`] and read back a
//! [`TargetResponse`]; a [`BlobTarget`] turns one into the other. The
//! production implementation is [`super::http_target::HttpTarget`].
use async_trait::async_trait;
use reqwest::Method;
use reqwest::header::HeaderMap;
use url::Url;

use crate::error::AppResult;

use super::payload::Payload;

#[derive(Debug, Clone)]
pub enum RequestBody {
    Empty,
    /// Single-part multipart form carrying a file.
    File { field: &'static str, payload: Payload },
    Json(serde_json::Value),
}

#[derive(Debug, Clone)]
pub struct TargetRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub query: Vec<(&'static str, String)>,
    pub body: RequestBody,
}

impl TargetRequest {
    #[must_use]
    pub fn new(method: Method, url: Url, headers: HeaderMap) -> Self {
        Self {
            method,
            url,
            headers,
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    #[must_use]
    pub fn with_query(mut self, key: &'static str, value: String) -> Self {
        self.query.push((key, value));
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TargetResponse {
    #[must_use]
    pub const fn new(status: u16, body: Vec<u8>) -> Self {
        Self { status, body }
    }
}

#[async_trait]
pub trait BlobTarget: Send + Sync {
    /// Sends one request and waits for the complete response.
    ///
    /// # Errors
    ///
    /// Returns an error when the request cannot be built or the exchange
    /// does not complete. A response with any status code is `Ok`.
    async fn send(&self, request: TargetRequest) -> AppResult<TargetResponse>;
}

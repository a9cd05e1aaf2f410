use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};

use crate::error::{AppError, AppResult, HttpError};

use super::settings::MULTIPART_CONTENT_TYPE;
use super::target::{BlobTarget, RequestBody, TargetRequest, TargetResponse};

/// `BlobTarget` backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTarget {
    client: Client,
}

impl HttpTarget {
    /// Builds the HTTP client used by every worker.
    ///
    /// # Errors
    ///
    /// Returns an error when the client cannot be constructed.
    pub fn new(request_timeout: Duration) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("blobtraf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|err| AppError::http(HttpError::BuildClientFailed { source: err }))?;
        Ok(Self { client })
    }
}

fn build_file_form(field: &'static str, file_name: String, bytes: Vec<u8>) -> AppResult<Form> {
    let part = Part::bytes(bytes)
        .file_name(file_name)
        .mime_str(MULTIPART_CONTENT_TYPE)
        .map_err(|err| {
            AppError::http(HttpError::InvalidMultipartMime {
                mime: MULTIPART_CONTENT_TYPE.to_owned(),
                source: err,
            })
        })?;
    Ok(Form::new().part(field, part))
}

#[async_trait]
impl BlobTarget for HttpTarget {
    async fn send(&self, request: TargetRequest) -> AppResult<TargetResponse> {
        let url = request.url.to_string();
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::File { field, payload } => {
                builder.multipart(build_file_form(field, payload.file_name, payload.bytes)?)
            }
            RequestBody::Json(value) => builder.json(&value),
        };

        let response = builder.send().await.map_err(|err| {
            AppError::http(HttpError::RequestFailed {
                url: url.clone(),
                source: err,
            })
        })?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|err| AppError::http(HttpError::ReadBodyFailed { url, source: err }))?;
        Ok(TargetResponse::new(status, body.to_vec()))
    }
}

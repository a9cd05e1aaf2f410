use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::{AppError, AppResult, ValidationError};

pub const DEFAULT_AUTH_HEADER: &str = "AuthToken";
pub const DEFAULT_VALID_TOKEN: &str = "USER_TOKEN";
/// Deliberately malformed credential used to exercise the rejection path.
pub const DEFAULT_INVALID_TOKEN: &str = ":():";
pub const MULTIPART_FILE_KEY: &str = "file";
pub const MULTIPART_CONTENT_TYPE: &str = "text/plain";
pub const BLOB_ID_KEY: &str = "blobId";
pub const BLOBS_KEY: &str = "blobs";
pub const PUBLIC_KEY: &str = "public";

pub const SIZE_1K: usize = 1024;
pub const SIZE_1M: usize = 1024 * SIZE_1K;
pub const SIZE_10M: usize = 10 * SIZE_1M;
pub const DEFAULT_BLOB_SIZES: [usize; 3] = [SIZE_1K, SIZE_1M, SIZE_10M];

pub const HASH_ALGORITHMS: [&str; 2] = ["md5", "sha256"];

/// Values fixed for the whole run. Built once before any worker starts and
/// shared read-only afterwards.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    base_url: String,
    auth_header: HeaderName,
    valid_token: HeaderValue,
    invalid_token: HeaderValue,
    blob_sizes: Vec<usize>,
}

impl AgentSettings {
    /// Builds settings from raw strings.
    ///
    /// # Errors
    ///
    /// Returns an error when the base URL is not an http(s) URL, the header
    /// name or tokens are not valid header material, or no blob size is given.
    pub fn new(
        base_url: &str,
        auth_header: &str,
        valid_token: &str,
        invalid_token: &str,
        blob_sizes: Vec<usize>,
    ) -> AppResult<Self> {
        let parsed = url::Url::parse(base_url).map_err(|err| {
            AppError::validation(ValidationError::InvalidTargetUrl {
                url: base_url.to_owned(),
                source: err,
            })
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::validation(ValidationError::UnsupportedScheme {
                url: base_url.to_owned(),
            }));
        }
        if blob_sizes.is_empty() {
            return Err(AppError::validation(ValidationError::BlobSizesEmpty));
        }
        if blob_sizes.contains(&0) {
            return Err(AppError::validation(ValidationError::BlobSizeZero));
        }

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            auth_header: parse_header_name(auth_header)?,
            valid_token: parse_header_value(valid_token)?,
            invalid_token: parse_header_value(invalid_token)?,
            blob_sizes,
        })
    }

    /// Settings with the stock credentials and size tiers.
    ///
    /// # Errors
    ///
    /// Returns an error when `base_url` is not a valid http(s) URL.
    pub fn with_defaults(base_url: &str) -> AppResult<Self> {
        Self::new(
            base_url,
            DEFAULT_AUTH_HEADER,
            DEFAULT_VALID_TOKEN,
            DEFAULT_INVALID_TOKEN,
            DEFAULT_BLOB_SIZES.to_vec(),
        )
    }

    #[must_use]
    pub fn into_shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn blob_sizes(&self) -> &[usize] {
        &self.blob_sizes
    }

    #[must_use]
    pub fn valid_headers(&self) -> HeaderMap {
        self.token_headers(&self.valid_token)
    }

    #[must_use]
    pub fn invalid_headers(&self) -> HeaderMap {
        self.token_headers(&self.invalid_token)
    }

    fn token_headers(&self, token: &HeaderValue) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(self.auth_header.clone(), token.clone());
        headers
    }
}

fn parse_header_name(value: &str) -> AppResult<HeaderName> {
    HeaderName::from_bytes(value.trim().as_bytes()).map_err(|_err| {
        AppError::validation(ValidationError::InvalidHeaderName {
            value: value.to_owned(),
        })
    })
}

fn parse_header_value(value: &str) -> AppResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_err| {
        AppError::validation(ValidationError::InvalidHeaderValue {
            value: value.to_owned(),
        })
    })
}

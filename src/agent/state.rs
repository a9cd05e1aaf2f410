use std::sync::Arc;

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use reqwest::header::HeaderMap;
use tracing::warn;
use url::Url;

use crate::error::{AppError, AppResult, HttpError};

use super::payload::{self, Payload};
use super::settings::AgentSettings;

/// Which header set a request carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credentials {
    Valid,
    Invalid,
    Anonymous,
}

/// Everything one virtual user knows about the target.
///
/// Owned by exactly one runner; `private_blobs` is always a subset of
/// `owned_blobs`.
#[derive(Debug)]
pub struct WorkerState {
    settings: Arc<AgentSettings>,
    valid_headers: HeaderMap,
    invalid_headers: HeaderMap,
    owned_blobs: Vec<String>,
    private_blobs: Vec<String>,
    rng: StdRng,
}

impl WorkerState {
    /// Creates a state seeded from `seed`, or from OS entropy when `None`.
    #[must_use]
    pub fn new(settings: Arc<AgentSettings>, seed: Option<u64>) -> Self {
        let rng = seed.map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Self {
            valid_headers: settings.valid_headers(),
            invalid_headers: settings.invalid_headers(),
            settings,
            owned_blobs: Vec::new(),
            private_blobs: Vec::new(),
            rng,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    #[must_use]
    pub fn headers(&self, credentials: Credentials) -> HeaderMap {
        match credentials {
            Credentials::Valid => self.valid_headers.clone(),
            Credentials::Invalid => self.invalid_headers.clone(),
            Credentials::Anonymous => HeaderMap::new(),
        }
    }

    /// Resolves `path` (starting with `/`) against the target base URL.
    ///
    /// # Errors
    ///
    /// Returns an error when the joined string is not a valid URL.
    pub fn endpoint(&self, path: &str) -> AppResult<Url> {
        let raw = format!("{}{}", self.settings.base_url(), path);
        Url::parse(&raw)
            .map_err(|err| AppError::http(HttpError::InvalidUrl { url: raw, source: err }))
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    pub fn next_payload(&mut self) -> Payload {
        payload::generate(&mut self.rng, self.settings.blob_sizes())
    }

    #[must_use]
    pub fn owned_blobs(&self) -> &[String] {
        &self.owned_blobs
    }

    #[must_use]
    pub fn private_blobs(&self) -> &[String] {
        &self.private_blobs
    }

    #[must_use]
    pub fn has_blobs(&self) -> bool {
        !self.owned_blobs.is_empty()
    }

    /// Most recently created blob still owned.
    #[must_use]
    pub fn last_blob(&self) -> Option<&str> {
        self.owned_blobs.last().map(String::as_str)
    }

    pub fn random_owned_blob(&mut self) -> Option<String> {
        self.owned_blobs.choose(&mut self.rng).cloned()
    }

    pub fn public_blob(&mut self) -> Option<String> {
        let public: Vec<&String> = self
            .owned_blobs
            .iter()
            .filter(|blob| !self.private_blobs.contains(blob))
            .collect();
        public.choose(&mut self.rng).map(|blob| (*blob).clone())
    }

    pub fn private_blob(&mut self) -> Option<String> {
        self.private_blobs.choose(&mut self.rng).cloned()
    }

    pub fn new_blob(&mut self, blob_id: String) {
        if self.owned_blobs.contains(&blob_id) {
            warn!("Blob {} already added", blob_id);
            return;
        }
        self.owned_blobs.push(blob_id);
    }

    pub fn forget_blob(&mut self, blob_id: &str) {
        if let Some(pos) = self.owned_blobs.iter().position(|blob| blob == blob_id) {
            self.owned_blobs.remove(pos);
        } else {
            warn!("Remove unknown blob: {}", blob_id);
        }
        self.private_blobs.retain(|blob| blob != blob_id);
    }

    pub fn make_blob_private(&mut self, blob_id: &str) {
        if !self.owns(blob_id) {
            warn!("Blob {} unknown, cannot switch to private", blob_id);
            return;
        }
        if self.is_private(blob_id) {
            warn!("Blob {} already private", blob_id);
            return;
        }
        self.private_blobs.push(blob_id.to_owned());
    }

    /// Marks a blob public. An already-public blob only logs a warning.
    pub fn make_blob_public(&mut self, blob_id: &str) {
        if !self.owns(blob_id) {
            warn!("Blob {} unknown, cannot switch to public", blob_id);
            return;
        }
        if !self.is_private(blob_id) {
            warn!("Blob {} is public already", blob_id);
            return;
        }
        self.private_blobs.retain(|blob| blob != blob_id);
    }

    #[must_use]
    pub fn owns(&self, blob_id: &str) -> bool {
        self.owned_blobs.iter().any(|blob| blob == blob_id)
    }

    #[must_use]
    pub fn is_private(&self, blob_id: &str) -> bool {
        self.private_blobs.iter().any(|blob| blob == blob_id)
    }
}

impl std::fmt::Display for WorkerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "last blob: {}", self.last_blob().unwrap_or("<none>"))
    }
}

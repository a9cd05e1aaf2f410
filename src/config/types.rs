use std::time::Duration;

use serde::Deserialize;

use crate::args::parsers::{parse_blob_sizes, parse_duration_value};
use crate::error::ValidationError;

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub url: Option<String>,
    #[serde(alias = "users")]
    pub workers: Option<usize>,
    pub duration: Option<DurationValue>,
    pub max_actions: Option<usize>,
    pub seed: Option<u64>,
    pub token: Option<String>,
    pub invalid_token: Option<String>,
    pub auth_header: Option<String>,
    pub blob_sizes: Option<BlobSizesValue>,
    pub timeout: Option<DurationValue>,
    pub negative_auth: Option<bool>,
    pub export_json: Option<String>,
    pub verbose: Option<bool>,
    pub no_color: Option<bool>,
}

/// Either a bare number of seconds or a string with a unit suffix.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(u64),
    Text(String),
}

impl DurationValue {
    pub(crate) fn to_duration(&self) -> Result<Duration, ValidationError> {
        match self {
            DurationValue::Seconds(secs) => {
                if *secs == 0 {
                    Err(ValidationError::DurationZero)
                } else {
                    Ok(Duration::from_secs(*secs))
                }
            }
            DurationValue::Text(text) => parse_duration_value(text),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum BlobSizesValue {
    List(Vec<usize>),
    Text(String),
}

impl BlobSizesValue {
    pub(crate) fn to_sizes(&self) -> Result<Vec<usize>, ValidationError> {
        match self {
            BlobSizesValue::List(sizes) => {
                if sizes.is_empty() {
                    return Err(ValidationError::BlobSizesEmpty);
                }
                if sizes.contains(&0) {
                    return Err(ValidationError::BlobSizeZero);
                }
                Ok(sizes.clone())
            }
            BlobSizesValue::Text(text) => parse_blob_sizes(text),
        }
    }
}

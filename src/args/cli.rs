use clap::Parser;
use std::time::Duration;

use crate::agent::settings::{
    DEFAULT_AUTH_HEADER, DEFAULT_INVALID_TOKEN, DEFAULT_VALID_TOKEN,
};

use super::parsers::{parse_blob_sizes, parse_duration_arg, parse_positive_usize};
use super::types::PositiveUsize;

#[derive(Debug, Parser, Clone)]
#[clap(
    version,
    about = "Traffic generator for blob-storage HTTP APIs - concurrent virtual users issuing randomized, state-aware blob actions and reporting pass/fail with latency."
)]
pub struct AgentArgs {
    /// Base URL of the blob service under test
    #[arg(long, short, env = "BLOBTRAF_URL")]
    pub url: Option<String>,

    /// Number of concurrent virtual users
    #[arg(long, short = 'w', default_value = "10", value_parser = parse_positive_usize)]
    pub workers: PositiveUsize,

    /// How long to run (supports ms/s/m/h); runs until Ctrl+C when omitted
    #[arg(long = "duration", short = 't', value_parser = parse_duration_arg)]
    pub duration: Option<Duration>,

    /// Stop each worker after N actions
    #[arg(long = "max-actions", value_parser = parse_positive_usize)]
    pub max_actions: Option<PositiveUsize>,

    /// Seed for reproducible runs (worker i uses seed + i)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Valid credential sent in the auth header
    #[arg(long, default_value = DEFAULT_VALID_TOKEN, env = "BLOBTRAF_TOKEN")]
    pub token: String,

    /// Credential the service must reject
    #[arg(long = "invalid-token", default_value = DEFAULT_INVALID_TOKEN)]
    pub invalid_token: String,

    /// Name of the auth header
    #[arg(long = "auth-header", default_value = DEFAULT_AUTH_HEADER)]
    pub auth_header: String,

    /// Upload sizes in bytes, comma-separated; one is picked per upload
    #[arg(
        long = "blob-sizes",
        default_value = "1024,1048576,10485760",
        value_parser = parse_blob_sizes
    )]
    pub blob_sizes: ::std::vec::Vec<usize>,

    /// Per-request timeout (supports ms/s/m/h)
    #[arg(long = "timeout", default_value = "30s", value_parser = parse_duration_arg)]
    pub request_timeout: Duration,

    /// Also exercise the invalid-token path (adds the list-wrong-token action)
    #[arg(long = "negative-auth")]
    pub negative_auth: bool,

    /// Write the aggregate report as JSON to this path
    #[arg(long = "export-json")]
    pub export_json: Option<String>,

    /// Enable verbose logging (sets log level to debug unless overridden by BLOBTRAF_LOG/RUST_LOG)
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// Disable colored log output
    #[arg(
        long = "no-color",
        env = "NO_COLOR",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub no_color: bool,

    /// Path to config file (TOML/JSON). Defaults to ./blobtraf.toml or ./blobtraf.json if present.
    #[arg(long)]
    pub config: Option<String>,
}

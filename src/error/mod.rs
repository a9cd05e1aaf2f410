mod agent;
mod app;
mod config;
mod http;
mod metrics;
mod validation;

#[cfg(test)]
mod test_support;

pub use agent::AgentError;
pub use app::{AppError, AppResult};
pub use config::ConfigError;
pub use http::HttpError;
pub use metrics::MetricsError;
pub use validation::ValidationError;

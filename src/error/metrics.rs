use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("Failed to create histogram: {message}")]
    CreateHistogram { message: String },
    #[error("Failed to record latency {value}ms: {message}")]
    RecordLatency { value: u64, message: String },
}

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("Action '{name}' is already registered.")]
    DuplicateAction { name: &'static str },
    #[error("Unknown action '{name}'.")]
    UnknownAction { name: String },
    #[error("Action registry has no bootstrap action '{name}'.")]
    MissingBootstrapAction { name: &'static str },
    #[error("Action registry is empty.")]
    NoActions,
    #[error("Worker count must be > 0.")]
    NoWorkers,
    #[error("{count} worker(s) crashed.")]
    WorkersCrashed { count: usize },
    #[error("Test expectation failed: {message}")]
    TestExpectation { message: &'static str },
    #[error("{message}: {value}")]
    TestExpectationValue {
        message: &'static str,
        value: String,
    },
}

use thiserror::Error;

/// Errors a [`crate::Router`] can surface to its caller.
///
/// The router recovers locally from rate-limit and retryable failures;
/// only these terminal, all-candidates-exhausted kinds ever escape `route`.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("invalid router configuration: {0}")]
    InvalidConfiguration(String),

    #[error("no backend available for this request")]
    NoBackendAvailable,

    #[error("all candidate backends failed: {causes:?}")]
    AllBackendsFailed { causes: Vec<(String, String)> },

    #[error("request deadline exceeded")]
    RequestTimeout,

    #[error("request cancelled")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, RouterError>;

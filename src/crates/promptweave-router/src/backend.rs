//! The seam between the router and a concrete model client.
//!
//! Mirrors the shape of a chat-model trait object with one addition: instead
//! of a single catch-all error string, a backend returns a [`BackendError`]
//! with the distinguishable kinds the router's retry/failover state machine
//! switches on.

use async_trait::async_trait;
use serde_json::Value;
use std::time::{Duration, Instant};
use thiserror::Error;

/// A prompt request as seen by a concrete backend, after the router has
/// resolved caching and candidate selection.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub prompt: String,
    pub sampling_params: Value,
}

#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub text: String,
}

/// Error kinds a backend can report. The router treats each differently:
/// `RateLimited` and `Transient` drive retry/failover, the `Permanent*`
/// kinds short-circuit straight to the next candidate (or to the caller if
/// failover is disallowed).
#[derive(Debug, Error, Clone)]
pub enum BackendError {
    #[error("rate limited{}", retry_after.map(|d| format!(", retry after {d:?}")).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    #[error("transient backend failure: {0}")]
    Transient(String),

    #[error("authentication failed: {0}")]
    PermanentAuth(String),

    #[error("malformed request: {0}")]
    PermanentRequest(String),

    #[error("backend failure: {0}")]
    PermanentOther(String),

    /// The request's `CancellationToken` was signalled before or during
    /// dispatch. Never retried or failed over; the router translates this
    /// straight into [`crate::RouterError::Cancelled`].
    #[error("request cancelled")]
    Cancelled,
}

impl BackendError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}

/// A language-model client the router can dispatch a prompt to.
///
/// Implementations own their own connection/auth details; the router only
/// ever sees `dispatch`.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send `request`, honoring `deadline` as a hard cutoff. Implementations
    /// that cannot finish before `deadline` should report
    /// [`BackendError::Transient`] so the router's retry path treats it as a
    /// timeout.
    async fn dispatch(
        &self,
        request: &BackendRequest,
        deadline: Instant,
    ) -> Result<BackendResponse, BackendError>;
}

/// Deterministic test backend: echoes the prompt back, optionally failing a
/// fixed number of times first.
///
/// Used in place of a vendor HTTP client wherever a test needs a backend
/// whose behavior is scripted rather than network-dependent.
pub struct EchoBackend {
    fail_times: parking_lot::Mutex<u32>,
    failure: BackendError,
}

impl EchoBackend {
    /// A backend that always succeeds.
    pub fn always_succeeds() -> Self {
        Self {
            fail_times: parking_lot::Mutex::new(0),
            failure: BackendError::Transient("unused".to_string()),
        }
    }

    /// A backend that fails `times` times with `failure`, then succeeds.
    pub fn fails_then_succeeds(times: u32, failure: BackendError) -> Self {
        Self {
            fail_times: parking_lot::Mutex::new(times),
            failure,
        }
    }

    /// A backend that always fails with `failure`.
    pub fn always_fails(failure: BackendError) -> Self {
        Self {
            fail_times: parking_lot::Mutex::new(u32::MAX),
            failure,
        }
    }
}

#[async_trait]
impl ModelBackend for EchoBackend {
    async fn dispatch(
        &self,
        request: &BackendRequest,
        _deadline: Instant,
    ) -> Result<BackendResponse, BackendError> {
        let mut remaining = self.fail_times.lock();
        if *remaining > 0 {
            *remaining -= 1;
            return Err(self.failure.clone());
        }
        Ok(BackendResponse {
            text: request.prompt.clone(),
        })
    }
}

use promptweave_core::CancellationToken;
use serde_json::Value;
use std::time::Duration;

/// A single prompt dispatch request.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    pub prompt: String,
    pub sampling_params: Value,
    /// Dispatch to this model first, bypassing the configured primary.
    pub preferred_model: Option<String>,
    pub allow_cache: bool,
    pub allow_failover: bool,
    /// Whole-request time budget. `None` means no deadline.
    pub deadline: Option<Duration>,
    /// External cancellation signal, polled before dispatch and between
    /// retry attempts. `None` means the request cannot be cancelled.
    pub cancellation: Option<CancellationToken>,
}

impl RouteRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            sampling_params: Value::Null,
            preferred_model: None,
            allow_cache: true,
            allow_failover: true,
            deadline: None,
            cancellation: None,
        }
    }

    pub fn with_sampling_params(mut self, params: Value) -> Self {
        self.sampling_params = params;
        self
    }

    pub fn with_preferred_model(mut self, model: impl Into<String>) -> Self {
        self.preferred_model = Some(model.into());
        self
    }

    pub fn with_allow_cache(mut self, allow: bool) -> Self {
        self.allow_cache = allow;
        self
    }

    pub fn with_allow_failover(mut self, allow: bool) -> Self {
        self.allow_failover = allow;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }
}

#[derive(Debug, Clone)]
pub struct RouteResponse {
    pub text: String,
    pub model_name: String,
    pub from_cache: bool,
}

//! The dispatch engine: candidate selection, retry/backoff, failover,
//! response caching, and per-backend state tracking.

use crate::backend::{BackendError, BackendRequest, ModelBackend};
use crate::batching::{self, BatchingPolicy};
use crate::context::{self, ContextHandle};
use crate::descriptor::ModelDescriptor;
use crate::error::{RouterError, Result};
use crate::fingerprint::compute_fingerprint;
use crate::request::{RouteRequest, RouteResponse};
use crate::retry::RetryPolicy;
use crate::state::{CircuitConfig, ModelState, ModelStats};
use promptweave_cache::Cache;
use promptweave_core::{Clock, RandomSource};
use std::sync::Arc;
use std::time::Duration;

/// Value type stored in the router's response cache: just enough to
/// reconstruct a [`RouteResponse`] on a cache hit.
#[derive(Debug, Clone)]
pub struct ResponseCacheEntry {
    text: String,
    model_name: String,
}

/// Immutable, validated settings for a [`Router`]. Construct via
/// [`RouterConfig::default`] and the `with_*` builder methods, then pass to
/// [`Router::new`], which validates it once and rejects anything invalid
/// with [`RouterError::InvalidConfiguration`].
#[derive(Clone)]
pub struct RouterConfig {
    retry_policy: RetryPolicy,
    batching_policy: BatchingPolicy,
    circuit: CircuitConfig,
    response_cache: Option<Arc<Cache<u64, ResponseCacheEntry>>>,
    context_cache: Option<Arc<Cache<(String, u64), ContextHandle>>>,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            retry_policy: RetryPolicy::default(),
            batching_policy: BatchingPolicy::default(),
            circuit: CircuitConfig::default(),
            response_cache: None,
            context_cache: None,
        }
    }
}

impl RouterConfig {
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    pub fn with_batching_policy(mut self, policy: BatchingPolicy) -> Self {
        self.batching_policy = policy;
        self
    }

    pub fn with_circuit_config(mut self, circuit: CircuitConfig) -> Self {
        self.circuit = circuit;
        self
    }

    pub fn with_response_cache(mut self, cache: Arc<Cache<u64, ResponseCacheEntry>>) -> Self {
        self.response_cache = Some(cache);
        self
    }

    pub fn with_context_cache(mut self, cache: Arc<Cache<(String, u64), ContextHandle>>) -> Self {
        self.context_cache = Some(cache);
        self
    }

    fn validate(&self) -> std::result::Result<(), String> {
        self.retry_policy.validate()?;
        self.batching_policy.validate()?;
        Ok(())
    }
}

struct Candidate {
    descriptor: ModelDescriptor,
    backend: Arc<dyn ModelBackend>,
    state: ModelState,
}

/// Dispatches prompt requests across an ordered list of model backends.
pub struct Router {
    candidates: Vec<Candidate>,
    retry_policy: RetryPolicy,
    batching_policy: BatchingPolicy,
    response_cache: Option<Arc<Cache<u64, ResponseCacheEntry>>>,
    context_cache: Option<Arc<Cache<(String, u64), ContextHandle>>>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl Router {
    pub fn new(
        models: Vec<(ModelDescriptor, Arc<dyn ModelBackend>)>,
        config: RouterConfig,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        if models.is_empty() {
            return Err(RouterError::InvalidConfiguration(
                "router requires at least one model backend".to_string(),
            ));
        }
        config
            .validate()
            .map_err(RouterError::InvalidConfiguration)?;

        let candidates = models
            .into_iter()
            .map(|(descriptor, backend)| {
                let state = ModelState::new(descriptor.name.clone(), config.circuit);
                Candidate {
                    descriptor,
                    backend,
                    state,
                }
            })
            .collect();

        Ok(Self {
            candidates,
            retry_policy: config.retry_policy,
            batching_policy: config.batching_policy,
            response_cache: config.response_cache,
            context_cache: config.context_cache,
            clock,
            random,
        })
    }

    fn find_candidate(&self, name: &str) -> Option<&Candidate> {
        self.candidates.iter().find(|c| c.descriptor.name == name)
    }

    fn resolve_order(&self, preferred: Option<&str>) -> Vec<usize> {
        let first = preferred
            .and_then(|name| self.candidates.iter().position(|c| c.descriptor.name == name))
            .unwrap_or(0);
        let mut order = vec![first];
        for i in 0..self.candidates.len() {
            if i != first {
                order.push(i);
            }
        }
        order
    }

    /// Retries one candidate per the router's retry policy. Rate-limit and
    /// permanent errors are never retried here; only `Transient` is.
    async fn attempt_candidate(
        &self,
        candidate: &Candidate,
        request: &RouteRequest,
        deadline_instant: std::time::Instant,
    ) -> std::result::Result<crate::backend::BackendResponse, BackendError> {
        let mut attempt = 1;
        loop {
            if let Some(token) = &request.cancellation {
                if token.is_cancelled() {
                    candidate.state.record_failure(self.clock.now());
                    return Err(BackendError::Cancelled);
                }
            }

            let now = self.clock.now();
            if now >= deadline_instant {
                candidate.state.record_failure(now);
                return Err(BackendError::Transient(
                    "request deadline exceeded".to_string(),
                ));
            }

            let backend_request = BackendRequest {
                prompt: request.prompt.clone(),
                sampling_params: request.sampling_params.clone(),
            };
            candidate.state.record_attempt_start();
            let started_at = now;
            let outcome = candidate.backend.dispatch(&backend_request, deadline_instant).await;

            match outcome {
                Ok(response) => {
                    let latency = self.clock.now().saturating_duration_since(started_at);
                    candidate.state.record_success(latency);
                    return Ok(response);
                }
                Err(BackendError::RateLimited { retry_after }) => {
                    let until = retry_after
                        .map(|delay| self.clock.now() + delay)
                        .unwrap_or_else(|| {
                            self.clock.now() + Duration::from_millis(self.retry_policy.max_delay_ms)
                        });
                    candidate.state.record_rate_limited(until);
                    tracing::debug!(model = %candidate.descriptor.name, ?retry_after, "backend rate limited");
                    return Err(BackendError::RateLimited { retry_after });
                }
                Err(err @ BackendError::Transient(_)) => {
                    candidate.state.record_failure(self.clock.now());
                    if attempt >= self.retry_policy.max_attempts {
                        tracing::warn!(model = %candidate.descriptor.name, attempt, "exhausted retries for transient failure");
                        return Err(err);
                    }
                    let delay = self.retry_policy.calculate_delay(attempt, self.random.as_ref());
                    tracing::trace!(model = %candidate.descriptor.name, attempt, delay_ms = delay.as_millis() as u64, "retrying after transient failure");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                    continue;
                }
                Err(permanent) => {
                    candidate.state.record_failure(self.clock.now());
                    tracing::warn!(model = %candidate.descriptor.name, error = %permanent, "permanent backend failure");
                    return Err(permanent);
                }
            }
        }
    }

    fn record_context(&self, model_name: &str, prompt: &str) {
        let Some(cache) = &self.context_cache else {
            return;
        };
        let prefix_hash = tooling::serialization::generate_hash(&prompt);
        cache.set(
            (model_name.to_string(), prefix_hash),
            ContextHandle {
                prefix_hash,
                model_name: model_name.to_string(),
                approximate_token_count: context::approximate_token_count(prompt),
                last_used_at: self.clock.now(),
            },
        );
    }

    /// Looks up a previously recorded context handle for `model_name` and
    /// `prompt`, if context caching is enabled and the exact prompt has been
    /// sent to that model before.
    pub fn context_handle(&self, model_name: &str, prompt: &str) -> Option<ContextHandle> {
        let cache = self.context_cache.as_ref()?;
        let prefix_hash = tooling::serialization::generate_hash(&prompt);
        cache.get(&(model_name.to_string(), prefix_hash))
    }

    pub async fn route(&self, request: RouteRequest) -> Result<RouteResponse> {
        if let Some(token) = &request.cancellation {
            if token.is_cancelled() {
                return Err(RouterError::Cancelled);
            }
        }

        let resolved_name = request
            .preferred_model
            .clone()
            .unwrap_or_else(|| self.candidates[0].descriptor.name.clone());
        let fingerprint = compute_fingerprint(&request.prompt, &resolved_name, &request.sampling_params);

        if request.allow_cache {
            if let Some(cache) = &self.response_cache {
                if let Some(cached) = cache.get(&fingerprint) {
                    if let Some(candidate) = self.find_candidate(&resolved_name) {
                        candidate.state.record_cache_hit();
                    }
                    return Ok(RouteResponse {
                        text: cached.text,
                        model_name: cached.model_name,
                        from_cache: true,
                    });
                } else if let Some(candidate) = self.find_candidate(&resolved_name) {
                    candidate.state.record_cache_miss();
                }
            }
        }

        let deadline_instant =
            self.clock.now() + request.deadline.unwrap_or(Duration::from_secs(3600));
        let order = self.resolve_order(request.preferred_model.as_deref());

        let mut causes = Vec::new();
        for idx in order {
            let candidate = &self.candidates[idx];
            if !candidate.state.try_acquire(self.clock.now()) {
                continue;
            }

            match self.attempt_candidate(candidate, &request, deadline_instant).await {
                Ok(response) => {
                    if request.allow_cache {
                        if let Some(cache) = &self.response_cache {
                            cache.set(
                                fingerprint,
                                ResponseCacheEntry {
                                    text: response.text.clone(),
                                    model_name: candidate.descriptor.name.clone(),
                                },
                            );
                        }
                    }
                    self.record_context(&candidate.descriptor.name, &request.prompt);
                    return Ok(RouteResponse {
                        text: response.text,
                        model_name: candidate.descriptor.name.clone(),
                        from_cache: false,
                    });
                }
                Err(BackendError::Cancelled) => {
                    tracing::debug!(model = %candidate.descriptor.name, "request cancelled mid-dispatch");
                    return Err(RouterError::Cancelled);
                }
                Err(err) => {
                    causes.push((candidate.descriptor.name.clone(), err.to_string()));
                    if !request.allow_failover {
                        break;
                    }
                    tracing::debug!(model = %candidate.descriptor.name, "failing over to next candidate");
                }
            }
        }

        if causes.is_empty() {
            Err(RouterError::NoBackendAvailable)
        } else {
            Err(RouterError::AllBackendsFailed { causes })
        }
    }

    /// Dispatches each request independently; one request's failure never
    /// fails the others. When batching is enabled, requests are grouped by
    /// resolved model and normalized sampling params and dispatched in
    /// chunks no larger than `max_batch_size`.
    pub async fn route_batch(&self, requests: Vec<RouteRequest>) -> Vec<Result<RouteResponse>> {
        if requests.is_empty() {
            return Vec::new();
        }

        if !self.batching_policy.enabled {
            let futures = requests.into_iter().map(|req| self.route(req));
            return futures::future::join_all(futures).await;
        }

        let total = requests.len();
        let mut groups: std::collections::HashMap<u64, Vec<(usize, RouteRequest)>> =
            std::collections::HashMap::new();
        for (index, request) in requests.into_iter().enumerate() {
            let resolved_name = request
                .preferred_model
                .clone()
                .unwrap_or_else(|| self.candidates[0].descriptor.name.clone());
            let key = batching::group_key(&resolved_name, &request.sampling_params);
            groups.entry(key).or_default().push((index, request));
        }

        let mut results: Vec<Option<Result<RouteResponse>>> = (0..total).map(|_| None).collect();
        for (_, group) in groups {
            for chunk in batching::chunk_by_size(group, self.batching_policy.max_batch_size) {
                let futures = chunk
                    .into_iter()
                    .map(|(index, request)| async move { (index, self.route(request).await) });
                for (index, result) in futures::future::join_all(futures).await {
                    results[index] = Some(result);
                }
            }
        }

        results
            .into_iter()
            .map(|r| r.expect("every index assigned exactly one group"))
            .collect()
    }

    pub fn stats(&self) -> Vec<ModelStats> {
        self.candidates.iter().map(|c| c.state.snapshot()).collect()
    }
}

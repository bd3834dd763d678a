//! Fault-tolerant dispatch across a list of model backends: retry with
//! jittered exponential backoff, automatic failover, per-backend
//! rate-limit/circuit-breaker tracking, request batching, response caching,
//! and request fingerprinting.
//!
//! The candidate-selection and retry shape follows a pattern-routing
//! component that tries a primary path and falls back to rules on failure;
//! this generalizes that to an ordered list of N backends, each carrying
//! its own rate-limit window and circuit breaker rather than a single
//! binary fallback.
//!
//! # Modules
//!
//! - `backend` - the `ModelBackend` trait and its error taxonomy
//! - `descriptor` - immutable per-model metadata
//! - `state` - per-backend availability, circuit breaker, and counters
//! - `retry` - exponential backoff with jitter
//! - `batching` - grouping policy for `route_batch`
//! - `context` - reusable prompt-prefix bookkeeping
//! - `fingerprint` - stable request hashing for the response cache
//! - `request` - `RouteRequest`/`RouteResponse`
//! - `router` - `Router`, the dispatch engine
//! - `error` - `RouterError`

mod backend;
mod batching;
mod context;
mod descriptor;
mod error;
mod fingerprint;
mod request;
mod retry;
mod router;
mod state;

pub use backend::{BackendError, BackendRequest, BackendResponse, EchoBackend, ModelBackend};
pub use batching::BatchingPolicy;
pub use context::ContextHandle;
pub use descriptor::ModelDescriptor;
pub use error::{Result, RouterError};
pub use fingerprint::compute_fingerprint;
pub use request::{RouteRequest, RouteResponse};
pub use retry::RetryPolicy;
pub use router::{Router, RouterConfig, ResponseCacheEntry};
pub use state::{BackendState, CircuitConfig, ModelState, ModelStats};

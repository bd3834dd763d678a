//! Per-backend runtime state: availability, rate-limit window, circuit
//! breaker, and the counters `stats()` reports.
//!
//! All of it lives behind one `parking_lot::Mutex` per backend so a
//! transition (e.g. `healthy -> rate_limited`) is atomic with respect to
//! concurrent dispatches, per the "no externally observable race" guarantee
//! shared state must uphold.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

const LATENCY_WINDOW: usize = 256;

/// The four states a backend can be in. `Disabled` is never set by the
/// dispatch path itself; it exists for administrative use by a caller that
/// holds a reference to the `ModelState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendState {
    Healthy,
    RateLimited,
    CircuitOpen,
    Disabled,
}

/// Threshold and cooldown governing the `healthy <-> circuit_open`
/// transition.
#[derive(Debug, Clone, Copy)]
pub struct CircuitConfig {
    pub failure_threshold: u32,
    pub cooldown: Duration,
}

impl Default for CircuitConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
        }
    }
}

/// Point-in-time snapshot returned by [`crate::Router::stats`].
#[derive(Debug, Clone)]
pub struct ModelStats {
    pub name: String,
    pub status: BackendState,
    pub rate_limited_until: Option<Instant>,
    pub in_flight_requests: u64,
    pub total_requests: u64,
    pub total_errors: u64,
    pub p50_latency_ms: f64,
    pub p90_latency_ms: f64,
    pub p99_latency_ms: f64,
    pub cache_hit_rate: f64,
}

struct Inner {
    status: BackendState,
    rate_limited_until: Option<Instant>,
    circuit_opened_at: Option<Instant>,
    half_open_probe_in_flight: bool,
    consecutive_failures: u32,
    in_flight_requests: u64,
    total_requests: u64,
    total_errors: u64,
    latencies_ms: VecDeque<f64>,
    cache_hits: u64,
    cache_misses: u64,
}

pub struct ModelState {
    name: String,
    circuit: CircuitConfig,
    inner: Mutex<Inner>,
}

impl ModelState {
    pub fn new(name: impl Into<String>, circuit: CircuitConfig) -> Self {
        Self {
            name: name.into(),
            circuit,
            inner: Mutex::new(Inner {
                status: BackendState::Healthy,
                rate_limited_until: None,
                circuit_opened_at: None,
                half_open_probe_in_flight: false,
                consecutive_failures: 0,
                in_flight_requests: 0,
                total_requests: 0,
                total_errors: 0,
                latencies_ms: VecDeque::with_capacity(LATENCY_WINDOW),
                cache_hits: 0,
                cache_misses: 0,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Refreshes time-based transitions and reports whether a new request
    /// may be dispatched right now. A circuit-open backend allows exactly
    /// one half-open probe at a time once its cooldown has elapsed.
    pub fn try_acquire(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        match inner.status {
            BackendState::Healthy => true,
            BackendState::Disabled => false,
            BackendState::RateLimited => {
                let until = inner.rate_limited_until.unwrap_or(now);
                if now >= until {
                    inner.status = BackendState::Healthy;
                    inner.rate_limited_until = None;
                    true
                } else {
                    false
                }
            }
            BackendState::CircuitOpen => {
                if inner.half_open_probe_in_flight {
                    return false;
                }
                let opened_at = inner.circuit_opened_at.unwrap_or(now);
                if now.saturating_duration_since(opened_at) >= self.circuit.cooldown {
                    inner.half_open_probe_in_flight = true;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_attempt_start(&self) {
        let mut inner = self.inner.lock();
        inner.in_flight_requests += 1;
        inner.total_requests += 1;
    }

    pub fn record_success(&self, latency: Duration) {
        let mut inner = self.inner.lock();
        inner.in_flight_requests = inner.in_flight_requests.saturating_sub(1);
        inner.consecutive_failures = 0;
        inner.half_open_probe_in_flight = false;
        if inner.status != BackendState::Healthy {
            tracing::info!(model = %self.name, previous_status = ?inner.status, "backend recovered to healthy");
        }
        inner.status = BackendState::Healthy;
        inner.rate_limited_until = None;
        inner.circuit_opened_at = None;
        if inner.latencies_ms.len() == LATENCY_WINDOW {
            inner.latencies_ms.pop_front();
        }
        inner.latencies_ms.push_back(latency.as_secs_f64() * 1000.0);
    }

    pub fn record_failure(&self, now: Instant) {
        let mut inner = self.inner.lock();
        inner.in_flight_requests = inner.in_flight_requests.saturating_sub(1);
        inner.total_errors += 1;

        if inner.half_open_probe_in_flight {
            inner.half_open_probe_in_flight = false;
            inner.status = BackendState::CircuitOpen;
            inner.circuit_opened_at = Some(now);
            tracing::warn!(model = %self.name, "half-open probe failed, circuit re-opened");
            return;
        }

        inner.consecutive_failures += 1;
        if inner.consecutive_failures >= self.circuit.failure_threshold {
            inner.status = BackendState::CircuitOpen;
            inner.circuit_opened_at = Some(now);
            tracing::warn!(model = %self.name, consecutive_failures = inner.consecutive_failures, "circuit opened");
        }
    }

    pub fn record_rate_limited(&self, until: Instant) {
        let mut inner = self.inner.lock();
        inner.in_flight_requests = inner.in_flight_requests.saturating_sub(1);
        inner.total_errors += 1;
        inner.half_open_probe_in_flight = false;
        inner.status = BackendState::RateLimited;
        inner.rate_limited_until = Some(until);
        tracing::info!(model = %self.name, "backend rate limited");
    }

    pub fn record_cache_hit(&self) {
        self.inner.lock().cache_hits += 1;
    }

    pub fn record_cache_miss(&self) {
        self.inner.lock().cache_misses += 1;
    }

    pub fn status(&self) -> BackendState {
        self.inner.lock().status
    }

    pub fn rate_limited_until(&self) -> Option<Instant> {
        self.inner.lock().rate_limited_until
    }

    pub fn snapshot(&self) -> ModelStats {
        let inner = self.inner.lock();
        let mut sorted: Vec<f64> = inner.latencies_ms.iter().copied().collect();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let percentile = |p: f64| -> f64 {
            if sorted.is_empty() {
                return 0.0;
            }
            let idx = ((sorted.len() as f64 - 1.0) * p).round() as usize;
            sorted[idx.min(sorted.len() - 1)]
        };
        let cache_total = inner.cache_hits + inner.cache_misses;
        let cache_hit_rate = if cache_total == 0 {
            0.0
        } else {
            inner.cache_hits as f64 / cache_total as f64
        };
        ModelStats {
            name: self.name.clone(),
            status: inner.status,
            rate_limited_until: inner.rate_limited_until,
            in_flight_requests: inner.in_flight_requests,
            total_requests: inner.total_requests,
            total_errors: inner.total_errors,
            p50_latency_ms: percentile(0.50),
            p90_latency_ms: percentile(0.90),
            p99_latency_ms: percentile(0.99),
            cache_hit_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_healthy_and_available() {
        let state = ModelState::new("m", CircuitConfig::default());
        assert_eq!(state.status(), BackendState::Healthy);
        assert!(state.try_acquire(Instant::now()));
    }

    #[test]
    fn rate_limit_blocks_until_expiry() {
        let state = ModelState::new("m", CircuitConfig::default());
        let now = Instant::now();
        state.record_attempt_start();
        state.record_rate_limited(now + Duration::from_secs(1));
        assert!(!state.try_acquire(now));
        assert!(!state.try_acquire(now + Duration::from_millis(500)));
        assert!(state.try_acquire(now + Duration::from_secs(1)));
        assert_eq!(state.status(), BackendState::Healthy);
    }

    #[test]
    fn circuit_opens_after_threshold_failures() {
        let config = CircuitConfig {
            failure_threshold: 3,
            cooldown: Duration::from_secs(10),
        };
        let state = ModelState::new("m", config);
        let now = Instant::now();
        for _ in 0..3 {
            state.record_attempt_start();
            state.record_failure(now);
        }
        assert_eq!(state.status(), BackendState::CircuitOpen);
        assert!(!state.try_acquire(now));
    }

    #[test]
    fn half_open_probe_closes_circuit_on_success() {
        let config = CircuitConfig {
            failure_threshold: 1,
            cooldown: Duration::from_secs(5),
        };
        let state = ModelState::new("m", config);
        let now = Instant::now();
        state.record_attempt_start();
        state.record_failure(now);
        assert_eq!(state.status(), BackendState::CircuitOpen);

        let probe_time = now + Duration::from_secs(5);
        assert!(state.try_acquire(probe_time));
        state.record_attempt_start();
        state.record_success(Duration::from_millis(10));
        assert_eq!(state.status(), BackendState::Healthy);
    }

    #[test]
    fn half_open_probe_reopens_circuit_on_failure() {
        let config = CircuitConfig {
            failure_threshold: 1,
            cooldown: Duration::from_secs(5),
        };
        let state = ModelState::new("m", config);
        let now = Instant::now();
        state.record_attempt_start();
        state.record_failure(now);

        let probe_time = now + Duration::from_secs(5);
        assert!(state.try_acquire(probe_time));
        state.record_attempt_start();
        state.record_failure(probe_time);
        assert_eq!(state.status(), BackendState::CircuitOpen);
        assert!(!state.try_acquire(probe_time));
    }

    #[test]
    fn latency_percentiles_reflect_recorded_samples() {
        let state = ModelState::new("m", CircuitConfig::default());
        for ms in [10, 20, 30, 40, 50] {
            state.record_attempt_start();
            state.record_success(Duration::from_millis(ms));
        }
        let snapshot = state.snapshot();
        assert!(snapshot.p50_latency_ms > 0.0);
        assert!(snapshot.p99_latency_ms >= snapshot.p50_latency_ms);
    }
}

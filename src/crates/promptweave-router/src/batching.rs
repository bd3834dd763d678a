//! Grouping policy for `route_batch`.
//!
//! A live batcher groups events arriving over time into size- or
//! time-triggered flushes, keyed per client. `route_batch` receives its
//! whole batch up front, so there is nothing to wait on; what carries over
//! from that shape is the *grouping key* (here: model + normalized sampling
//! params) and the discipline of capping how much work runs at once via
//! `max_batch_size`.

use serde_json::Value;
use tooling::serialization::generate_json_hash;

/// `{enabled, max_batch_size, max_wait_ms}` as configured on the router.
#[derive(Debug, Clone, Copy)]
pub struct BatchingPolicy {
    pub enabled: bool,
    pub max_batch_size: usize,
    pub max_wait_ms: u64,
}

impl Default for BatchingPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            max_batch_size: 8,
            max_wait_ms: 50,
        }
    }
}

impl BatchingPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.enabled && self.max_batch_size == 0 {
            return Err("max_batch_size must be greater than zero when batching is enabled".to_string());
        }
        Ok(())
    }
}

/// Stable key grouping requests that could share a dispatch batch: same
/// resolved model, same normalized sampling params.
pub fn group_key(model_name: &str, sampling_params: &Value) -> u64 {
    let params_hash = generate_json_hash(sampling_params);
    tooling::serialization::generate_hash(&(model_name, params_hash))
}

/// Splits `items` into chunks no larger than `max_batch_size`, preserving
/// order. A `max_batch_size` of zero yields a single chunk.
pub fn chunk_by_size<T>(items: Vec<T>, max_batch_size: usize) -> Vec<Vec<T>> {
    if max_batch_size == 0 {
        return vec![items];
    }
    let mut chunks = Vec::new();
    let mut current = Vec::with_capacity(max_batch_size);
    for item in items {
        current.push(item);
        if current.len() == max_batch_size {
            chunks.push(std::mem::replace(
                &mut current,
                Vec::with_capacity(max_batch_size),
            ));
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

//! Stable hashing of a request's identity, used as the response-cache key.

use serde_json::Value;
use tooling::serialization::{generate_hash, generate_json_hash};

/// Hash of `{prompt_content, model_name, normalized_sampling_params}`. Two
/// requests that hash the same MUST be treated as identical by the response
/// cache, so sampling params are normalized (sorted object keys) before
/// hashing rather than hashed by their literal JSON text.
pub fn compute_fingerprint(prompt: &str, model_name: &str, sampling_params: &Value) -> u64 {
    let params_hash = generate_json_hash(sampling_params);
    generate_hash(&(prompt, model_name, params_hash))
}

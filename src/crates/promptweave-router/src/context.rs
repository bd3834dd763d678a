//! Reusable prompt-prefix bookkeeping for backends that support prefix
//! caching.
//!
//! No wire format is defined here — the router has no concrete transport to
//! attach a context handle to — so this only tracks which prefixes have
//! already been sent to which backend. A transport layer wired in above the
//! router can consult [`Router::context_handle`] to decide whether it can
//! substitute a handle for the literal prefix on the way out.

use std::time::Instant;

/// `{prefix_hash, model_name, approximate_token_count, last_used_at}`.
#[derive(Debug, Clone)]
pub struct ContextHandle {
    pub prefix_hash: u64,
    pub model_name: String,
    pub approximate_token_count: u32,
    pub last_used_at: Instant,
}

pub(crate) fn approximate_token_count(prompt: &str) -> u32 {
    prompt.split_whitespace().count() as u32
}

//! Static, immutable metadata about a configured backend.

/// Describes one model the router can dispatch to. Immutable after the
/// router is constructed; nothing in the dispatch path mutates this.
#[derive(Debug, Clone)]
pub struct ModelDescriptor {
    pub name: String,
    pub provider: String,
    pub max_tokens: u32,
    pub supports_streaming: bool,
    pub cost_per_1k_tokens_in: f64,
    pub cost_per_1k_tokens_out: f64,
}

impl ModelDescriptor {
    pub fn new(name: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            provider: provider.into(),
            max_tokens: 4096,
            supports_streaming: false,
            cost_per_1k_tokens_in: 0.0,
            cost_per_1k_tokens_out: 0.0,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_streaming(mut self, supports_streaming: bool) -> Self {
        self.supports_streaming = supports_streaming;
        self
    }

    pub fn with_cost(mut self, per_1k_in: f64, per_1k_out: f64) -> Self {
        self.cost_per_1k_tokens_in = per_1k_in;
        self.cost_per_1k_tokens_out = per_1k_out;
        self
    }
}

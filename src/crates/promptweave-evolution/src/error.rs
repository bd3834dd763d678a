use thiserror::Error;

/// Failures a single fitness computation can produce. Never cached as a
/// fitness value — a failed scoring attempt leaves the cache untouched so a
/// later retry can still succeed.
#[derive(Debug, Error, Clone)]
pub enum FitnessError {
    #[error("fitness scoring failed for prompt {prompt_excerpt:?}: {cause}")]
    ScoringFailed { prompt_excerpt: String, cause: String },
}

/// Errors surfaced by [`crate::EvolutionEngine::evolve`].
///
/// Per-Individual fitness failures and `semantic_rewrite` fallbacks are
/// recovered locally and never reach this type; only construction-time
/// misconfiguration and the batch-level failure-rate threshold do.
#[derive(Debug, Error)]
pub enum EvolutionError {
    #[error("invalid evolution configuration: {0}")]
    InvalidConfiguration(String),

    #[error("evaluation failure rate exceeded in generation {generation}: {failed}/{attempted} prompts failed")]
    EvaluationFailureRateExceeded {
        generation: u32,
        failed: usize,
        attempted: usize,
    },
}

pub type Result<T> = std::result::Result<T, EvolutionError>;

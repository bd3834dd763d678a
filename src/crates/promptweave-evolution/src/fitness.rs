//! Fitness scoring with exact-content memoization.

use crate::error::FitnessError;
use async_trait::async_trait;
use futures::future::join_all;
use promptweave_cache::Cache;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Caller-supplied scoring function, typically backed by a router call or an
/// external judge. Keyed by exact prompt content — two Individuals with
/// identical content always share a cache entry, even across generations.
#[async_trait]
pub trait FitnessFn: Send + Sync {
    async fn score(&self, content: &str) -> Result<f64, FitnessError>;
}

pub struct FitnessEvaluator {
    cache: Arc<Cache<String, f64>>,
    scorer: Arc<dyn FitnessFn>,
    /// Count of scoring calls that actually ran (cache misses that
    /// succeeded). A memoized re-hit costs nothing against this counter, so
    /// it doubles as the "distinct fitness evaluations" budget meter.
    evaluations_performed: AtomicU64,
}

impl FitnessEvaluator {
    pub fn new(cache: Arc<Cache<String, f64>>, scorer: Arc<dyn FitnessFn>) -> Self {
        Self { cache, scorer, evaluations_performed: AtomicU64::new(0) }
    }

    pub fn cache(&self) -> &Cache<String, f64> {
        &self.cache
    }

    pub fn evaluations_performed(&self) -> u64 {
        self.evaluations_performed.load(Ordering::Relaxed)
    }

    /// Scores a single prompt, consulting the memoization cache first. A
    /// failed scoring attempt is never written to the cache, so a later
    /// retry of the same content can still succeed.
    pub async fn evaluate(&self, content: &str) -> Result<f64, FitnessError> {
        if let Some(cached) = self.cache.get(&content.to_string()) {
            return Ok(cached);
        }
        let score = self.scorer.score(content).await?;
        self.cache.set(content.to_string(), score);
        self.evaluations_performed.fetch_add(1, Ordering::Relaxed);
        Ok(score)
    }

    /// Scores `prompts` in input order, deduplicating repeated content
    /// within the batch so each distinct prompt is only evaluated once.
    pub async fn evaluate_batch(&self, prompts: &[String]) -> Vec<Result<f64, FitnessError>> {
        let mut distinct: Vec<&str> = Vec::new();
        for prompt in prompts {
            if !distinct.contains(&prompt.as_str()) {
                distinct.push(prompt.as_str());
            }
        }

        let scored: Vec<(String, Result<f64, FitnessError>)> = join_all(
            distinct
                .into_iter()
                .map(|content| async move { (content.to_string(), self.evaluate(content).await) }),
        )
        .await;

        let by_content: HashMap<String, Result<f64, FitnessError>> = scored.into_iter().collect();

        prompts
            .iter()
            .map(|prompt| by_content[prompt].clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promptweave_cache::{CacheConfig, EvictionPolicy};
    use promptweave_core::SystemClock;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingScorer {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl FitnessFn for CountingScorer {
        async fn score(&self, content: &str) -> Result<f64, FitnessError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(content.len() as f64)
        }
    }

    struct AlwaysFailsScorer;

    #[async_trait]
    impl FitnessFn for AlwaysFailsScorer {
        async fn score(&self, _content: &str) -> Result<f64, FitnessError> {
            Err(FitnessError::ScoringFailed {
                prompt_excerpt: "x".to_string(),
                cause: "boom".to_string(),
            })
        }
    }

    fn evaluator(scorer: Arc<dyn FitnessFn>) -> FitnessEvaluator {
        let cache = Arc::new(
            Cache::new(
                CacheConfig::new(64).with_policy(EvictionPolicy::Lru),
                Arc::new(SystemClock),
            )
            .unwrap(),
        );
        FitnessEvaluator::new(cache, scorer)
    }

    #[tokio::test]
    async fn identical_content_is_scored_once() {
        let scorer = Arc::new(CountingScorer { calls: AtomicUsize::new(0) });
        let eval = evaluator(scorer.clone());
        assert_eq!(eval.evaluate("hello").await.unwrap(), 5.0);
        assert_eq!(eval.evaluate("hello").await.unwrap(), 5.0);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_scores_are_not_cached() {
        let eval = evaluator(Arc::new(AlwaysFailsScorer));
        assert!(eval.evaluate("hello").await.is_err());
        assert_eq!(eval.cache().len(), 0);
    }

    #[tokio::test]
    async fn batch_dedupes_and_preserves_order() {
        let scorer = Arc::new(CountingScorer { calls: AtomicUsize::new(0) });
        let eval = evaluator(scorer.clone());
        let prompts = vec!["a".to_string(), "bb".to_string(), "a".to_string()];
        let results = eval.evaluate_batch(&prompts).await;
        let values: Vec<f64> = results.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(values, vec![1.0, 2.0, 1.0]);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 2);
    }
}

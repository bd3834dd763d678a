//! The generation loop: evaluate, elect elites, reproduce, replace, check
//! for convergence/budget/cancellation.

use crate::config::EvolutionConfig;
use crate::error::{EvolutionError, Result};
use crate::fitness::FitnessEvaluator;
use crate::individual::{best_fitness, mean_fitness, median_fitness, sort_by_fitness_desc, Individual};
use crate::mutation::{self, MutationStrategy};
use crate::selection::tournament_select;
use promptweave_cache::CacheStats;
use promptweave_core::{new_id, CancellationToken, Clock, RandomSource};
use promptweave_router::{ModelStats, RouteRequest, Router};
use serde_json::Value;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    GenerationsReached,
    Converged,
    BudgetExhausted,
    Cancelled,
    FailureRateExceeded,
}

#[derive(Debug, Clone)]
pub struct GenerationStats {
    pub generation: u32,
    pub best_fitness: Option<f64>,
    pub mean_fitness: Option<f64>,
    pub median_fitness: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct TerminalResult {
    pub population: Vec<Individual>,
    pub history: Vec<GenerationStats>,
    pub total_evaluations: u64,
    pub termination_reason: TerminationReason,
}

pub struct EngineStats {
    pub fitness_cache: CacheStats,
    pub router_stats: Option<Vec<ModelStats>>,
}

pub struct EvolutionEngine {
    config: EvolutionConfig,
    fitness: Arc<FitnessEvaluator>,
    router: Option<Arc<Router>>,
    clock: Arc<dyn Clock>,
    random: Arc<dyn RandomSource>,
}

impl EvolutionEngine {
    pub fn new(
        config: EvolutionConfig,
        fitness: Arc<FitnessEvaluator>,
        router: Option<Arc<Router>>,
        clock: Arc<dyn Clock>,
        random: Arc<dyn RandomSource>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, fitness, router, clock, random })
    }

    pub fn stats(&self) -> EngineStats {
        EngineStats {
            fitness_cache: self.fitness.cache().stats(),
            router_stats: self.router.as_ref().map(|r| r.stats()),
        }
    }

    /// One-shot diverse generation without evolution: `count` independent,
    /// uncached Router dispatches of the same prompt. Failed dispatches are
    /// dropped; the result may hold fewer than `count` strings.
    pub async fn generate(&self, seed_prompt: &str, count: usize, params: Value) -> Result<Vec<String>> {
        let router = self
            .router
            .as_ref()
            .ok_or_else(|| EvolutionError::InvalidConfiguration("generate() requires a configured router".to_string()))?;

        let requests: Vec<RouteRequest> = (0..count)
            .map(|_| {
                RouteRequest::new(seed_prompt.to_string())
                    .with_sampling_params(params.clone())
                    .with_allow_cache(false)
            })
            .collect();

        let responses = router.route_batch(requests).await;
        Ok(responses.into_iter().filter_map(|r| r.ok()).map(|r| r.text).collect())
    }

    pub async fn evolve(&self, seed_prompts: Vec<String>, cancellation: Option<CancellationToken>) -> TerminalResult {
        let vocabulary = build_vocabulary(&seed_prompts);
        let mut population = self.build_initial_population(&seed_prompts, &vocabulary).await;
        let mut history = Vec::new();
        let mut total_evaluations: u64 = 0;
        let mut prev_best: Option<f64> = None;
        let mut converged_streak: u32 = 0;
        let mut generation: u32 = 0;

        loop {
            let (attempted, failed, evaluations_this_step) = self.evaluate(&mut population).await;
            total_evaluations += evaluations_this_step;

            if attempted > 0 && (failed as f64 / attempted as f64) > self.config.failure_rate_threshold {
                tracing::warn!(generation, attempted, failed, "fitness failure rate exceeded threshold");
                sort_by_fitness_desc(&mut population);
                return TerminalResult {
                    population,
                    history,
                    total_evaluations,
                    termination_reason: TerminationReason::FailureRateExceeded,
                };
            }

            if let Some(token) = &cancellation {
                if token.is_cancelled() {
                    tracing::info!(generation, "evolution cancelled");
                    sort_by_fitness_desc(&mut population);
                    return TerminalResult {
                        population,
                        history,
                        total_evaluations,
                        termination_reason: TerminationReason::Cancelled,
                    };
                }
            }

            let best_this_gen = best_fitness(&population);
            tracing::debug!(generation, ?best_this_gen, total_evaluations, "generation evaluated");
            history.push(GenerationStats {
                generation,
                best_fitness: best_this_gen,
                mean_fitness: mean_fitness(&population),
                median_fitness: median_fitness(&population),
            });

            if let Some(threshold) = self.config.convergence_threshold {
                if let (Some(this), Some(prev)) = (best_this_gen, prev_best) {
                    let relative_change = (this - prev) / prev.abs().max(f64::EPSILON);
                    if relative_change < threshold {
                        converged_streak += 1;
                    } else {
                        converged_streak = 0;
                    }
                    if converged_streak >= self.config.convergence_patience {
                        tracing::info!(generation, converged_streak, "evolution converged");
                        sort_by_fitness_desc(&mut population);
                        return TerminalResult {
                            population,
                            history,
                            total_evaluations,
                            termination_reason: TerminationReason::Converged,
                        };
                    }
                }
            }
            prev_best = best_this_gen;

            if generation + 1 >= self.config.generations {
                tracing::info!(generation, "reached configured generation limit");
                sort_by_fitness_desc(&mut population);
                return TerminalResult {
                    population,
                    history,
                    total_evaluations,
                    termination_reason: TerminationReason::GenerationsReached,
                };
            }

            if let Some(budget) = self.config.max_fitness_evaluations {
                if total_evaluations >= budget {
                    tracing::info!(generation, total_evaluations, budget, "fitness evaluation budget exhausted");
                    sort_by_fitness_desc(&mut population);
                    return TerminalResult {
                        population,
                        history,
                        total_evaluations,
                        termination_reason: TerminationReason::BudgetExhausted,
                    };
                }
            }

            population = self.reproduce_generation(&population, generation + 1, &vocabulary).await;
            generation += 1;
        }
    }

    async fn build_initial_population(&self, seed_prompts: &[String], vocabulary: &[String]) -> Vec<Individual> {
        let n = self.config.population_size;
        let now = self.clock.now();

        if seed_prompts.len() >= n {
            return seed_prompts[..n]
                .iter()
                .map(|content| Individual::new_seed(new_id(self.random.as_ref()), content.clone(), now))
                .collect();
        }

        let mut population: Vec<Individual> = seed_prompts
            .iter()
            .map(|content| Individual::new_seed(new_id(self.random.as_ref()), content.clone(), now))
            .collect();

        while population.len() < n {
            let source_idx = self.random.gen_below(population.len());
            let strategy = self.config.mutation_strategies[self.random.gen_below(self.config.mutation_strategies.len())];
            let (content, tags) = mutation::apply_mutation(
                strategy,
                &population[source_idx].content,
                vocabulary,
                self.router.as_deref(),
                self.random.as_ref(),
            )
            .await;
            population.push(Individual {
                id: new_id(self.random.as_ref()),
                content,
                generation: 0,
                fitness: None,
                parent_ids: Vec::new(),
                mutations: tags,
                timestamp: self.clock.now(),
            });
        }

        population
    }

    /// Scores every Individual with unset fitness, drops those whose scoring
    /// failed, and returns `(attempted_count, failed_count, evaluations_performed)`.
    async fn evaluate(&self, population: &mut Vec<Individual>) -> (usize, usize, u64) {
        let pending_indices: Vec<usize> = population
            .iter()
            .enumerate()
            .filter(|(_, ind)| ind.fitness.is_none())
            .map(|(i, _)| i)
            .collect();
        let attempted = pending_indices.len();
        if attempted == 0 {
            return (0, 0, 0);
        }

        let contents: Vec<String> = pending_indices.iter().map(|&i| population[i].content.clone()).collect();
        let before_evaluations = self.fitness.evaluations_performed();
        let results = self.fitness.evaluate_batch(&contents).await;
        let performed = self.fitness.evaluations_performed() - before_evaluations;

        let mut failed_indices = HashSet::new();
        for (&idx, result) in pending_indices.iter().zip(results.into_iter()) {
            match result {
                Ok(score) => population[idx].fitness = Some(score),
                Err(_) => {
                    failed_indices.insert(idx);
                }
            }
        }

        let failed = failed_indices.len();
        if !failed_indices.is_empty() {
            let mut kept = Vec::with_capacity(population.len() - failed_indices.len());
            for (i, individual) in population.drain(..).enumerate() {
                if !failed_indices.contains(&i) {
                    kept.push(individual);
                }
            }
            *population = kept;
        }

        (attempted, failed, performed)
    }

    async fn reproduce_generation(&self, population: &[Individual], next_generation: u32, vocabulary: &[String]) -> Vec<Individual> {
        let elite_count = self.config.elite_count.min(population.len());
        let mut ranked = population.to_vec();
        sort_by_fitness_desc(&mut ranked);

        let mut next = Vec::with_capacity(self.config.population_size);
        next.extend(ranked.iter().take(elite_count).cloned());

        while next.len() < self.config.population_size {
            let parent_a_idx = tournament_select(population, self.config.tournament_k, self.random.as_ref());

            let (mut content, parent_ids, mut mutations) = if self.random.gen_bool(self.config.crossover_rate) {
                let parent_b_idx = tournament_select(population, self.config.tournament_k, self.random.as_ref());
                let a = &population[parent_a_idx];
                let b = &population[parent_b_idx];
                let op_idx = self.random.gen_below(self.config.crossover_operations.len());
                let op = self.config.crossover_operations[op_idx];
                let child = op.apply(&a.content, &b.content, self.random.as_ref());
                (child, vec![a.id.clone(), b.id.clone()], vec![op.tag().to_string()])
            } else {
                let parent = &population[parent_a_idx];
                (parent.content.clone(), vec![parent.id.clone()], Vec::new())
            };

            if self.random.gen_bool(self.config.mutation_rate) {
                let strategy: MutationStrategy = self.config.mutation_strategies
                    [self.random.gen_below(self.config.mutation_strategies.len())];
                let (mutated, tags) = mutation::apply_mutation(
                    strategy,
                    &content,
                    vocabulary,
                    self.router.as_deref(),
                    self.random.as_ref(),
                )
                .await;
                content = mutated;
                mutations.extend(tags);
            }

            next.push(Individual::new_offspring(
                new_id(self.random.as_ref()),
                content,
                next_generation,
                parent_ids,
                mutations,
                self.clock.now(),
            ));
        }

        next
    }
}

fn build_vocabulary(seed_prompts: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut vocabulary = Vec::new();
    for prompt in seed_prompts {
        for word in prompt.split_whitespace() {
            if seen.insert(word.to_string()) {
                vocabulary.push(word.to_string());
            }
        }
    }
    vocabulary
}

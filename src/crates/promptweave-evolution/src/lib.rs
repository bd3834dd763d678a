//! Population-based prompt optimizer built on the cache and router crates.
//!
//! # Modules
//!
//! - `individual` — one candidate prompt plus its genealogical metadata
//! - `crossover` — single_point/uniform/semantic recombination
//! - `mutation` — zero_order/first_order/semantic_rewrite/hypermutation
//! - `selection` — tournament selection
//! - `fitness` — scoring with exact-content memoization
//! - `config` — validated `EvolutionConfig`
//! - `engine` — the generation loop
//!
//! The cooperative `CancellationToken` both `evolve` and the router's
//! `route`/`route_batch` poll lives in `promptweave_core` and is
//! re-exported here for convenience.

mod config;
mod crossover;
mod engine;
mod error;
mod fitness;
mod individual;
mod mutation;
mod selection;

pub use config::EvolutionConfig;
pub use crossover::CrossoverOperation;
pub use engine::{EngineStats, EvolutionEngine, GenerationStats, TerminalResult, TerminationReason};
pub use error::{EvolutionError, FitnessError, Result};
pub use fitness::{FitnessEvaluator, FitnessFn};
pub use individual::{best_fitness, mean_fitness, median_fitness, sort_by_fitness_desc, Individual};
pub use mutation::MutationStrategy;
pub use promptweave_core::CancellationToken;
pub use selection::tournament_select;

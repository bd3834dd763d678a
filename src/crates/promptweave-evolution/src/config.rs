use crate::crossover::CrossoverOperation;
use crate::error::EvolutionError;
use crate::mutation::MutationStrategy;

/// Construction-time-validated knobs for [`crate::EvolutionEngine::evolve`].
#[derive(Debug, Clone)]
pub struct EvolutionConfig {
    pub population_size: usize,
    pub generations: u32,
    pub mutation_rate: f64,
    pub crossover_rate: f64,
    pub elite_count: usize,
    pub mutation_strategies: Vec<MutationStrategy>,
    pub crossover_operations: Vec<CrossoverOperation>,
    pub max_fitness_evaluations: Option<u64>,
    pub convergence_threshold: Option<f64>,
    pub convergence_patience: u32,
    pub failure_rate_threshold: f64,
    pub tournament_k: usize,
}

impl Default for EvolutionConfig {
    fn default() -> Self {
        Self {
            population_size: 20,
            generations: 10,
            mutation_rate: 0.2,
            crossover_rate: 0.7,
            elite_count: 2,
            mutation_strategies: vec![MutationStrategy::ZeroOrder, MutationStrategy::FirstOrder],
            crossover_operations: vec![CrossoverOperation::SinglePoint, CrossoverOperation::Uniform],
            max_fitness_evaluations: None,
            convergence_threshold: None,
            convergence_patience: 3,
            failure_rate_threshold: 0.25,
            tournament_k: 3,
        }
    }
}

impl EvolutionConfig {
    pub fn validate(&self) -> Result<(), EvolutionError> {
        if self.population_size == 0 {
            return Err(EvolutionError::InvalidConfiguration(
                "population_size must be greater than zero".to_string(),
            ));
        }
        if self.elite_count > self.population_size {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "elite_count ({}) cannot exceed population_size ({})",
                self.elite_count, self.population_size
            )));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(EvolutionError::InvalidConfiguration(
                "mutation_rate must be within [0.0, 1.0]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_rate) {
            return Err(EvolutionError::InvalidConfiguration(
                "crossover_rate must be within [0.0, 1.0]".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.failure_rate_threshold) {
            return Err(EvolutionError::InvalidConfiguration(
                "failure_rate_threshold must be within [0.0, 1.0]".to_string(),
            ));
        }
        if self.tournament_k == 0 || self.tournament_k > self.population_size {
            return Err(EvolutionError::InvalidConfiguration(format!(
                "tournament_k ({}) must be within [1, population_size ({})]",
                self.tournament_k, self.population_size
            )));
        }
        if self.mutation_strategies.is_empty() {
            return Err(EvolutionError::InvalidConfiguration(
                "mutation_strategies must not be empty".to_string(),
            ));
        }
        if self.crossover_operations.is_empty() {
            return Err(EvolutionError::InvalidConfiguration(
                "crossover_operations must not be empty".to_string(),
            ));
        }
        if let Some(threshold) = self.convergence_threshold {
            if threshold < 0.0 {
                return Err(EvolutionError::InvalidConfiguration(
                    "convergence_threshold must be non-negative".to_string(),
                ));
            }
        }
        Ok(())
    }
}

//! One candidate prompt plus its genealogical and evaluation metadata.

use std::time::Instant;

#[derive(Debug, Clone)]
pub struct Individual {
    pub id: String,
    pub content: String,
    pub generation: u32,
    /// Unset until the fitness evaluator scores this individual's content.
    pub fitness: Option<f64>,
    pub parent_ids: Vec<String>,
    pub mutations: Vec<String>,
    pub timestamp: Instant,
}

impl Individual {
    pub fn new_seed(id: String, content: String, timestamp: Instant) -> Self {
        Self {
            id,
            content,
            generation: 0,
            fitness: None,
            parent_ids: Vec::new(),
            mutations: Vec::new(),
            timestamp,
        }
    }

    pub fn new_offspring(
        id: String,
        content: String,
        generation: u32,
        parent_ids: Vec<String>,
        mutations: Vec<String>,
        timestamp: Instant,
    ) -> Self {
        Self {
            id,
            content,
            generation,
            fitness: None,
            parent_ids,
            mutations,
            timestamp,
        }
    }

    pub fn fitness_or_neg_infinity(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }
}

/// Sorts by descending fitness, matching the order `evolve` returns.
pub fn sort_by_fitness_desc(population: &mut [Individual]) {
    population.sort_by(|a, b| {
        b.fitness_or_neg_infinity()
            .partial_cmp(&a.fitness_or_neg_infinity())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

pub fn best_fitness(population: &[Individual]) -> Option<f64> {
    population.iter().filter_map(|ind| ind.fitness).fold(None, |best, f| {
        Some(best.map_or(f, |b: f64| b.max(f)))
    })
}

pub fn mean_fitness(population: &[Individual]) -> Option<f64> {
    let scored: Vec<f64> = population.iter().filter_map(|ind| ind.fitness).collect();
    if scored.is_empty() {
        None
    } else {
        Some(scored.iter().sum::<f64>() / scored.len() as f64)
    }
}

pub fn median_fitness(population: &[Individual]) -> Option<f64> {
    let mut scored: Vec<f64> = population.iter().filter_map(|ind| ind.fitness).collect();
    if scored.is_empty() {
        return None;
    }
    scored.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let mid = scored.len() / 2;
    if scored.len() % 2 == 0 {
        Some((scored[mid - 1] + scored[mid]) / 2.0)
    } else {
        Some(scored[mid])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn individual(fitness: Option<f64>) -> Individual {
        Individual {
            id: "x".to_string(),
            content: "c".to_string(),
            generation: 0,
            fitness,
            parent_ids: Vec::new(),
            mutations: Vec::new(),
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn sort_orders_descending_by_fitness() {
        let mut pop = vec![individual(Some(1.0)), individual(Some(3.0)), individual(Some(2.0))];
        sort_by_fitness_desc(&mut pop);
        let fitnesses: Vec<f64> = pop.iter().map(|i| i.fitness.unwrap()).collect();
        assert_eq!(fitnesses, vec![3.0, 2.0, 1.0]);
    }

    #[test]
    fn median_handles_even_and_odd() {
        assert_eq!(
            median_fitness(&[individual(Some(1.0)), individual(Some(3.0))]),
            Some(2.0)
        );
        assert_eq!(
            median_fitness(&[individual(Some(1.0)), individual(Some(2.0)), individual(Some(3.0))]),
            Some(2.0)
        );
    }

    #[test]
    fn best_and_mean_ignore_unevaluated() {
        let pop = vec![individual(Some(2.0)), individual(None), individual(Some(4.0))];
        assert_eq!(best_fitness(&pop), Some(4.0));
        assert_eq!(mean_fitness(&pop), Some(3.0));
    }
}

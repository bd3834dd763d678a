//! Tournament selection over an evaluated population.

use crate::individual::Individual;
use promptweave_core::RandomSource;

/// Draws `k` individuals uniformly without replacement from `population` and
/// returns the index of the fittest one. Ties break by earlier `timestamp`,
/// then by lexicographically smaller `id`.
///
/// Panics if `population` is empty or `k` exceeds its length.
pub fn tournament_select(population: &[Individual], k: usize, random: &dyn RandomSource) -> usize {
    assert!(!population.is_empty(), "tournament_select: empty population");
    let k = k.min(population.len());
    let contenders = random.sample_indices(population.len(), k);

    contenders
        .into_iter()
        .max_by(|&a, &b| compare_contenders(&population[a], &population[b]))
        .expect("contenders is non-empty")
}

fn compare_contenders(a: &Individual, b: &Individual) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    a.fitness_or_neg_infinity()
        .partial_cmp(&b.fitness_or_neg_infinity())
        .unwrap_or(Ordering::Equal)
        .then_with(|| b.timestamp.cmp(&a.timestamp)) // earlier timestamp wins -> reverse for max_by
        .then_with(|| b.id.cmp(&a.id)) // lexicographically smaller id wins -> reverse for max_by
}

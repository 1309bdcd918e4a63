//! Survivor selection within a species.
//!
//! Culling receives the species' members ranked best-first and keeps
//! `keep` of them according to the configured method. Genomes marked
//! elite are always kept, whichever method runs.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// How survivors are chosen from a ranked species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CullingMethod {
    /// Keep the top of the ranking outright.
    Elitism,
    /// Keep uniformly random members.
    Random,
    /// Sample survivors proportionally to raw fitness.
    RouletteWheel,
    /// Sample survivors proportionally to rank, which softens huge
    /// fitness gaps.
    Rank,
    /// Sample survivors proportionally to `exp(fitness / T)` with a
    /// unit temperature.
    Boltzmann,
}

/// A member of a species as the culling pass sees it.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Candidate {
    pub id: u64,
    pub fitness: f64,
    pub elite: bool,
}

/// Selects `keep` survivor ids from a best-first ranking.
pub(crate) fn select_survivors(
    ranked: &[Candidate],
    keep: usize,
    method: CullingMethod,
    rng: &mut impl Rng,
) -> Vec<u64> {
    if ranked.len() <= keep {
        return ranked.iter().map(|c| c.id).collect();
    }
    match method {
        CullingMethod::Elitism => ranked[..keep].iter().map(|c| c.id).collect(),
        CullingMethod::Random => sample(ranked, keep, rng, |_, _| 1.0),
        CullingMethod::RouletteWheel => sample(ranked, keep, rng, |c, _| c.fitness.max(0.0)),
        CullingMethod::Rank => {
            let len = ranked.len();
            sample(ranked, keep, rng, move |_, position| (len - position) as f64)
        }
        CullingMethod::Boltzmann => sample(ranked, keep, rng, |c, _| c.fitness.exp()),
    }
}

/// Weighted sampling without replacement, elites first.
fn sample(
    ranked: &[Candidate],
    keep: usize,
    rng: &mut impl Rng,
    weight: impl Fn(&Candidate, usize) -> f64,
) -> Vec<u64> {
    let mut selected: Vec<u64> = Vec::with_capacity(keep);
    let mut pool: Vec<usize> = Vec::new();
    for (position, candidate) in ranked.iter().enumerate() {
        if candidate.elite && selected.len() < keep {
            selected.push(candidate.id);
        } else {
            pool.push(position);
        }
    }

    while selected.len() < keep && !pool.is_empty() {
        let total: f64 = pool.iter().map(|&p| weight(&ranked[p], p)).sum();
        let choice = if total > 0.0 {
            let mut draw = rng.gen::<f64>() * total;
            let mut chosen = pool.len() - 1;
            for (slot, &position) in pool.iter().enumerate() {
                draw -= weight(&ranked[position], position);
                if draw <= 0.0 {
                    chosen = slot;
                    break;
                }
            }
            chosen
        } else {
            rng.gen_range(0..pool.len())
        };
        selected.push(ranked[pool.remove(choice)].id);
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(11)
    }

    /// Five candidates ranked best-first, the top two marked elite.
    fn ranked() -> Vec<Candidate> {
        (0..5)
            .map(|i| Candidate {
                id: i as u64 + 1,
                fitness: 5.0 - i as f64,
                elite: i < 2,
            })
            .collect()
    }

    #[test]
    fn small_species_survive_whole() {
        let survivors = select_survivors(&ranked(), 10, CullingMethod::Elitism, &mut rng());
        assert_eq!(survivors, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn elitism_keeps_the_top() {
        let survivors = select_survivors(&ranked(), 3, CullingMethod::Elitism, &mut rng());
        assert_eq!(survivors, vec![1, 2, 3]);
    }

    #[test]
    fn stochastic_methods_keep_the_requested_count() {
        for method in [
            CullingMethod::Random,
            CullingMethod::RouletteWheel,
            CullingMethod::Rank,
            CullingMethod::Boltzmann,
        ] {
            let survivors = select_survivors(&ranked(), 3, method, &mut rng());
            assert_eq!(survivors.len(), 3, "{:?}", method);
            let mut unique = survivors.clone();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), 3, "{:?} returned duplicates", method);
        }
    }

    #[test]
    fn elites_always_survive() {
        let mut rng = rng();
        for method in [
            CullingMethod::Random,
            CullingMethod::RouletteWheel,
            CullingMethod::Rank,
            CullingMethod::Boltzmann,
        ] {
            for _ in 0..20 {
                let survivors = select_survivors(&ranked(), 3, method, &mut rng);
                assert!(survivors.contains(&1), "{:?} dropped an elite", method);
                assert!(survivors.contains(&2), "{:?} dropped an elite", method);
            }
        }
    }

    #[test]
    fn zero_total_fitness_falls_back_to_uniform() {
        let flat: Vec<Candidate> = (0..4)
            .map(|i| Candidate {
                id: i as u64 + 1,
                fitness: 0.0,
                elite: false,
            })
            .collect();
        let survivors = select_survivors(&flat, 2, CullingMethod::RouletteWheel, &mut rng());
        assert_eq!(survivors.len(), 2);
    }
}

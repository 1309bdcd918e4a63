use crate::genomics::Genotype;

use serde::{Deserialize, Serialize};

use std::fmt;

/// A member of the population: a genotype plus the bookkeeping the
/// evolution loop needs to score, speciate and breed it.
///
/// Genome ids are allocated by the trainer and are monotonic across a
/// run. A `species_id` of 0 means the genome has not been speciated
/// yet.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    pub(crate) id: u64,
    pub(crate) species_id: u64,
    pub(crate) genotype: Genotype,
    pub(crate) fitness: f64,
    pub(crate) adjusted_fitness: f64,
    pub(crate) elite: bool,
}

impl Genome {
    /// Wraps a genotype as an unspeciated, unscored genome.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{Genome, Genotype};
    ///
    /// let genome = Genome::new(1, Genotype::new());
    ///
    /// assert_eq!(genome.id(), 1);
    /// assert_eq!(genome.species_id(), 0);
    /// assert_eq!(genome.fitness(), 0.0);
    /// assert!(!genome.is_elite());
    /// ```
    pub fn new(id: u64, genotype: Genotype) -> Genome {
        Genome {
            id,
            species_id: 0,
            genotype,
            fitness: 0.0,
            adjusted_fitness: 0.0,
            elite: false,
        }
    }

    /// Returns the genome's id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the id of the species the genome belongs to, or 0 if
    /// it has not been speciated.
    pub fn species_id(&self) -> u64 {
        self.species_id
    }

    /// Returns the genome's genotype.
    pub fn genotype(&self) -> &Genotype {
        &self.genotype
    }

    /// Returns the genome's genotype for mutation.
    pub fn genotype_mut(&mut self) -> &mut Genotype {
        &mut self.genotype
    }

    /// Returns the genome's raw fitness.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Records the genome's raw fitness. Non-finite scores are
    /// recorded as `0.0` so a single bad evaluation cannot poison
    /// the rest of the run.
    pub fn set_fitness(&mut self, fitness: f64) {
        self.fitness = if fitness.is_finite() { fitness } else { 0.0 };
    }

    /// Returns the species-mean fitness recorded for this genome's
    /// species at the last evaluation.
    pub fn adjusted_fitness(&self) -> f64 {
        self.adjusted_fitness
    }

    /// Returns whether the genome is exempt from culling and mutation
    /// this generation.
    pub fn is_elite(&self) -> bool {
        self.elite
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Genome {} (species {}, fitness {:.4}{}) {}",
            self.id,
            self.species_id,
            self.fitness,
            if self.elite { ", elite" } else { "" },
            self.genotype,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_finite_fitness_is_zeroed() {
        let mut genome = Genome::new(1, Genotype::new());
        genome.set_fitness(f64::NAN);
        assert_eq!(genome.fitness(), 0.0);
        genome.set_fitness(f64::INFINITY);
        assert_eq!(genome.fitness(), 0.0);
        genome.set_fitness(0.75);
        assert_eq!(genome.fitness(), 0.75);
    }
}

use crate::genomics::Genome;

use serde::{Deserialize, Serialize};

/// A reproductively isolated bucket of genomes.
///
/// Species hold their members as genome ids; the trainer's population
/// vector owns the genomes themselves, so a species can never outlive
/// or leak its members. The representative, by contrast, is an owned
/// snapshot: speciation measures distance against the genome as it
/// looked when it was chosen, even after mutation or culling has
/// changed or removed the original.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Species {
    pub(crate) id: u64,
    pub(crate) representative: Option<Genome>,
    pub(crate) members: Vec<u64>,
    pub(crate) adjusted_fitness: f64,
    pub(crate) best_adjusted_fitness: f64,
    pub(crate) stagnation: u32,
    pub(crate) is_stagnant: bool,
    pub(crate) desired_pop: usize,
}

impl Species {
    /// Creates a species around a representative genome. The caller is
    /// responsible for also listing the genome as a member.
    pub fn new(id: u64, representative: Genome) -> Species {
        Species {
            id,
            representative: Some(representative),
            members: Vec::new(),
            adjusted_fitness: 0.0,
            best_adjusted_fitness: 0.0,
            stagnation: 0,
            is_stagnant: false,
            desired_pop: 0,
        }
    }

    /// Returns the species' id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current representative, if any.
    pub fn representative(&self) -> Option<&Genome> {
        self.representative.as_ref()
    }

    /// Returns the member genome ids, in placement order.
    pub fn members(&self) -> &[u64] {
        &self.members
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the species-mean fitness from the last evaluation.
    pub fn adjusted_fitness(&self) -> f64 {
        self.adjusted_fitness
    }

    /// Returns the best species-mean fitness seen over the species'
    /// lifetime.
    pub fn best_adjusted_fitness(&self) -> f64 {
        self.best_adjusted_fitness
    }

    /// Returns how many consecutive generations the species has gone
    /// without improving.
    pub fn time_stagnated(&self) -> u32 {
        self.stagnation
    }

    /// Returns whether the species has been marked stagnant.
    pub fn is_stagnant(&self) -> bool {
        self.is_stagnant
    }

    /// Returns the population this species was allotted for the next
    /// generation.
    pub fn desired_population(&self) -> usize {
        self.desired_pop
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::Genotype;

    #[test]
    fn new_species_starts_clean() {
        let species = Species::new(3, Genome::new(9, Genotype::new()));
        assert_eq!(species.id(), 3);
        assert!(species.is_empty());
        assert_eq!(species.representative().unwrap().id(), 9);
        assert_eq!(species.time_stagnated(), 0);
        assert!(!species.is_stagnant());
    }
}

//! Parent pairing and offspring planning.
//!
//! Reproduction is split in two: a pairing strategy turns a species'
//! survivors into a list of [`Offspring`] plans (zero, one or two
//! parents each), and the trainer realizes each plan into a child
//! genome once it has allocated an id for it. When the crossover roll
//! fails, a plan falls back to cloning a parent or seeding a fresh
//! genome at even odds.

use crate::genomics::{distance, seed_genotype, Config, Genome, InnovationRegistry};
use crate::populations::crossover::crossover;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The rule for picking crossover parents within a species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairingStrategy {
    /// Two uniform draws.
    Random,
    /// The species' best genome crossed with a uniform draw.
    Fittest,
    /// The species' worst genome crossed with a uniform draw.
    Weakest,
    /// Alternate between the fittest and weakest rules per offspring.
    Alternating,
    /// A uniform draw paired with its nearest fitness peer.
    SimilarFitness,
    /// A uniform draw paired with its farthest fitness peer.
    DissimilarFitness,
    /// A uniform draw paired with its nearest peer in genome distance.
    Proximity,
    /// A uniform draw paired with its farthest peer in genome distance.
    Diversity,
}

/// A reproduction plan: the parents a child will be built from.
#[derive(Clone, Debug)]
pub(crate) struct Offspring {
    parent1: Option<Genome>,
    parent2: Option<Genome>,
}

impl Offspring {
    fn from_parents(parent1: &Genome, parent2: &Genome) -> Offspring {
        Offspring {
            parent1: Some(parent1.clone()),
            parent2: Some(parent2.clone()),
        }
    }

    fn from_parent(parent: &Genome) -> Offspring {
        Offspring {
            parent1: Some(parent.clone()),
            parent2: None,
        }
    }

    fn fresh() -> Offspring {
        Offspring {
            parent1: None,
            parent2: None,
        }
    }

    /// Builds the child genome this plan describes.
    ///
    /// Two parents cross over and the child lands in one of their
    /// species at even odds; one parent clones; no parents seed a
    /// fresh genotype from the configured initial topology.
    pub(crate) fn realize(
        self,
        id: u64,
        config: &Config,
        innovations: &InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Genome {
        match (self.parent1, self.parent2) {
            (Some(first), Some(second)) => {
                let genotype = crossover(first.genotype(), second.genotype(), config, rng);
                let mut child = Genome::new(id, genotype);
                child.species_id = if rng.gen_bool(0.5) {
                    first.species_id()
                } else {
                    second.species_id()
                };
                child
            }
            (Some(parent), None) => {
                let mut child = Genome::new(id, parent.genotype().clone());
                child.species_id = parent.species_id();
                child
            }
            _ => Genome::new(id, seed_genotype(config, innovations, rng)),
        }
    }
}

/// Plans `count` offspring for a species' surviving members.
pub(crate) fn plan_offspring(
    members: &[&Genome],
    count: usize,
    config: &Config,
    rng: &mut impl Rng,
) -> Vec<Offspring> {
    if members.is_empty() {
        return (0..count).map(|_| Offspring::fresh()).collect();
    }
    let fittest = members
        .iter()
        .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
        .copied()
        .unwrap();
    let weakest = members
        .iter()
        .min_by(|a, b| a.fitness().total_cmp(&b.fitness()))
        .copied()
        .unwrap();

    (0..count)
        .map(|index| {
            let crossed = config.crossover_rate > 0.0 && rng.gen::<f64>() < config.crossover_rate;
            match config.pairing_strategy {
                PairingStrategy::Random => anchored(uniform(members, rng), crossed, members, config, rng),
                PairingStrategy::Fittest => anchored(fittest, crossed, members, config, rng),
                PairingStrategy::Weakest => anchored(weakest, crossed, members, config, rng),
                PairingStrategy::Alternating => {
                    let anchor = if index % 2 == 0 { fittest } else { weakest };
                    anchored(anchor, crossed, members, config, rng)
                }
                PairingStrategy::SimilarFitness => {
                    scored(members, crossed, config, rng, Peer::Nearest, fitness_gap)
                }
                PairingStrategy::DissimilarFitness => {
                    scored(members, crossed, config, rng, Peer::Farthest, fitness_gap)
                }
                PairingStrategy::Proximity => {
                    scored(members, crossed, config, rng, Peer::Nearest, genome_gap)
                }
                PairingStrategy::Diversity => {
                    scored(members, crossed, config, rng, Peer::Farthest, genome_gap)
                }
            }
        })
        .collect()
}

fn uniform<'a>(members: &[&'a Genome], rng: &mut impl Rng) -> &'a Genome {
    members[rng.gen_range(0..members.len())]
}

/// Crossover with a uniform partner, or the 50/50 clone/fresh fallback.
fn anchored(
    anchor: &Genome,
    crossed: bool,
    members: &[&Genome],
    _config: &Config,
    rng: &mut impl Rng,
) -> Offspring {
    if crossed {
        Offspring::from_parents(anchor, uniform(members, rng))
    } else if rng.gen_bool(0.5) {
        Offspring::from_parent(anchor)
    } else {
        Offspring::fresh()
    }
}

enum Peer {
    Nearest,
    Farthest,
}

/// Pairs a uniform draw with its best-scoring peer under `gap`.
///
/// A farthest-peer search starts at distance zero, so a species whose
/// members all tie falls back to the clone/fresh path.
fn scored(
    members: &[&Genome],
    crossed: bool,
    config: &Config,
    rng: &mut impl Rng,
    peer: Peer,
    gap: impl Fn(&Genome, &Genome, &Config) -> f64,
) -> Offspring {
    let anchor_index = rng.gen_range(0..members.len());
    let anchor = members[anchor_index];

    let mut partner: Option<&Genome> = None;
    if crossed {
        let mut best = match peer {
            Peer::Nearest => f64::MAX,
            Peer::Farthest => 0.0,
        };
        for (index, candidate) in members.iter().enumerate() {
            if index == anchor_index {
                continue;
            }
            let score = gap(anchor, candidate, config);
            let better = match peer {
                Peer::Nearest => score < best,
                Peer::Farthest => score > best,
            };
            if better {
                best = score;
                partner = Some(candidate);
            }
        }
    }

    match partner {
        Some(partner) => Offspring::from_parents(anchor, partner),
        None if rng.gen_bool(0.5) => Offspring::from_parent(anchor),
        None => Offspring::fresh(),
    }
}

fn fitness_gap(a: &Genome, b: &Genome, _config: &Config) -> f64 {
    (a.fitness() - b.fitness()).abs()
}

fn genome_gap(a: &Genome, b: &Genome, config: &Config) -> f64 {
    distance(a, b, config)
}

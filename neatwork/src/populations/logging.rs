//! Generational snapshots of an evolving population.
//!
//! The logger is a passive observer: the caller decides when to
//! sample, typically once per generation between evaluation and
//! reproduction. How much genome data each snapshot clones is set by
//! the [`ReportingLevel`].

use crate::genomics::Genome;
use crate::populations::Trainer;

use log::info;

use std::fmt;

/// How much of the population each snapshot retains.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clone every genome, grouped by species.
    AllGenomes,
    /// Clone each species' best genome.
    SpeciesChampions,
    /// Clone only the population's best genome.
    PopulationChampion,
    /// Keep statistics only.
    NoGenomes,
}

/// Basic distribution statistics over a fitness sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Computes statistics over a sequence of values.
    ///
    /// # Examples
    /// ```
    /// use neatwork::populations::Stats;
    ///
    /// let stats = Stats::from_values([-2.0, -1.0, 0.5, 1.0, 1.5]);
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from_values(values: impl IntoIterator<Item = f64>) -> Stats {
        let mut values: Vec<f64> = values.into_iter().collect();
        if values.is_empty() {
            return Stats {
                maximum: 0.0,
                minimum: 0.0,
                mean: 0.0,
                median: 0.0,
            };
        }
        values.sort_by(f64::total_cmp);
        let count = values.len();
        let median = if count % 2 == 1 {
            values[count / 2]
        } else {
            (values[count / 2 - 1] + values[count / 2]) / 2.0
        };
        Stats {
            maximum: values[count - 1],
            minimum: values[0],
            mean: values.iter().sum::<f64>() / count as f64,
            median,
        }
    }
}

/// The genomes a snapshot retained, per the logger's reporting level.
#[derive(Clone, Debug)]
pub enum GenerationMembers {
    /// Species ids with their genomes and stagnation counts.
    Species(Vec<(u64, Vec<Genome>, u32)>),
    /// Species ids with their champion and stagnation count.
    SpeciesChampions(Vec<(u64, Genome, u32)>),
    /// The population champion alone.
    PopulationChampion(Genome),
    /// Nothing retained.
    None,
}

/// One generation's snapshot.
#[derive(Clone, Debug)]
pub struct GenerationLog {
    pub generation: u64,
    pub species_count: usize,
    pub best_fitness: f64,
    pub average_distance: f64,
    pub fitness: Stats,
    pub members: GenerationMembers,
}

impl fmt::Display for GenerationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "generation {}: {} species, best {:.6}, mean {:.6}, median {:.6}",
            self.generation,
            self.species_count,
            self.best_fitness,
            self.fitness.mean,
            self.fitness.median,
        )
    }
}

/// Collects per-generation snapshots of a trainer's population.
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<GenerationLog>,
}

impl EvolutionLogger {
    /// Returns a logger with the given reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: Vec::new(),
        }
    }

    /// Takes a snapshot of the trainer's current population.
    pub fn log(&mut self, trainer: &Trainer) {
        let members = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMembers::Species(
                trainer
                    .species()
                    .map(|species| {
                        let genomes = trainer
                            .genomes()
                            .filter(|g| species.members().contains(&g.id()))
                            .cloned()
                            .collect();
                        (species.id(), genomes, species.time_stagnated())
                    })
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMembers::SpeciesChampions(
                trainer
                    .species()
                    .filter_map(|species| {
                        trainer
                            .genomes()
                            .filter(|g| species.members().contains(&g.id()))
                            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
                            .map(|champion| {
                                (species.id(), champion.clone(), species.time_stagnated())
                            })
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => match trainer
                .genomes()
                .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
            {
                Some(champion) => GenerationMembers::PopulationChampion(champion.clone()),
                None => GenerationMembers::None,
            },
            ReportingLevel::NoGenomes => GenerationMembers::None,
        };

        let log = GenerationLog {
            generation: trainer.generation(),
            species_count: trainer.species().count(),
            best_fitness: trainer
                .best_genome()
                .map(Genome::fitness)
                .unwrap_or(0.0),
            average_distance: trainer.average_distance(),
            fitness: Stats::from_values(trainer.genomes().map(Genome::fitness)),
            members,
        };
        info!("{}", log);
        self.logs.push(log);
    }

    /// Iterates over the collected snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &GenerationLog> {
        self.logs.iter()
    }

    /// Returns the number of collected snapshots.
    pub fn len(&self) -> usize {
        self.logs.len()
    }

    /// Returns whether no snapshots have been collected.
    pub fn is_empty(&self) -> bool {
        self.logs.is_empty()
    }
}

//! An implementation of NeuroEvolution of Augmenting Topologies
//! (NEAT): a population-based evolutionary algorithm that evolves
//! both the weights and the topology of small neural networks against
//! a user-supplied fitness function.
//!
//! The trainer maintains a pool of candidate networks (genomes),
//! groups them into reproductively isolated species by structural
//! similarity, allots offspring in proportion to species fitness, and
//! advances generations until a target fitness is reached or the
//! generation budget runs out. Historical markings (innovation ids)
//! keep structurally identical mutations aligned across genomes, so
//! crossover never has to solve a graph-matching problem.
//!
//! # Example usage: evolving an XOR approximator
//! ```no_run
//! use neatwork::fitness::mean_absolute_error;
//! use neatwork::genomics::{AggregationKind, Config, Genome, InitialTopology};
//! use neatwork::networks::Network;
//! use neatwork::populations::{Task, Trainer};
//!
//! struct XorTask {
//!     config: Config,
//! }
//!
//! impl Task for XorTask {
//!     fn num_inputs(&self) -> usize {
//!         2
//!     }
//!
//!     fn num_outputs(&self) -> usize {
//!         1
//!     }
//!
//!     fn evaluate(&self, genome: &Genome) -> f64 {
//!         let mut network = Network::new(genome, &self.config);
//!         let cases = [
//!             ([0.0, 0.0], 0.0),
//!             ([0.0, 1.0], 1.0),
//!             ([1.0, 0.0], 1.0),
//!             ([1.0, 1.0], 0.0),
//!         ];
//!         let mut predictions = Vec::new();
//!         let mut targets = Vec::new();
//!         for (input, target) in cases {
//!             predictions.push(network.evaluate(&input).map(|o| o[0]).unwrap_or(0.0));
//!             targets.push(target);
//!         }
//!         mean_absolute_error(&predictions, &targets)
//!     }
//! }
//!
//! fn main() {
//!     let config = Config {
//!         num_inputs: 2,
//!         num_outputs: 1,
//!         population_size: 150,
//!         max_generations: 200,
//!         stopping_fitness: 0.95,
//!         initial_topology: InitialTopology::Full,
//!         default_aggregation: AggregationKind::Sum,
//!         speciation_distance_threshold: 3.0,
//!         ..Config::default()
//!     };
//!
//!     let mut task = XorTask {
//!         config: config.clone(),
//!     };
//!     let mut trainer = Trainer::new(config).expect("valid configuration");
//!     match trainer.train(&mut task) {
//!         Some(best) => println!("best fitness: {:.6}", best.fitness()),
//!         None => println!("the population never got evaluated"),
//!     }
//! }
//! ```

pub mod fitness;
pub mod genomics;
pub mod networks;
pub mod populations;

pub use genomics::{Config, Genome, Genotype};
pub use networks::Network;
pub use populations::{Task, Trainer};

/// Identifier type for historical markings. Structurally identical
/// mutations share an innovation across all genomes in a run.
pub type Innovation = u64;

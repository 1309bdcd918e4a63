//! The speciation distance metric.
//!
//! Genomes are compared gene-by-gene using their historical markings:
//! connection ids split into matching and disjoint sets, node ids into
//! matching (same id, activation and aggregation), disjoint (same id,
//! different functions) and excess (id present on one side only).
//! Matching genes contribute weight and bias differences; structural
//! mismatches contribute counts normalized by the larger genome's size.

use crate::genomics::{Config, Genome};

use serde::{Deserialize, Serialize};

/// How matching-gene differences are folded into a scalar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMethod {
    /// Sum of absolute differences raised to the configured exponent.
    Euclidean,
    /// Sum of absolute differences, exponent fixed at one.
    Manhattan,
    /// Maximum single absolute difference.
    Chebyshev,
}

struct Partition {
    /// Weight pairs of connections present in both genomes.
    matching_weights: Vec<(f64, f64)>,
    /// Connections present in exactly one genome.
    disjoint_connections: usize,
    /// Bias pairs of nodes with the same id, activation and aggregation.
    matching_biases: Vec<(f64, f64)>,
    /// Nodes sharing an id but differing in activation or aggregation.
    disjoint_nodes: usize,
    /// Nodes whose id exists in only one genome.
    excess_nodes: usize,
    /// Gene count of the larger genome.
    max_genome_size: usize,
}

fn partition(first: &Genome, second: &Genome) -> Partition {
    let a = first.genotype();
    let b = second.genotype();

    let mut matching_weights = Vec::new();
    let mut disjoint_connections = 0;
    for id in a.connection_ids() {
        match b.connection(id) {
            Some(theirs) => {
                matching_weights.push((a.connection(id).unwrap().weight(), theirs.weight()));
            }
            None => disjoint_connections += 1,
        }
    }
    disjoint_connections += b
        .connections()
        .filter(|c| a.connection(c.id()).is_none())
        .count();

    let mut matching_biases = Vec::new();
    let mut disjoint_nodes = 0;
    let mut excess_nodes = 0;
    for id in a.node_ids() {
        let ours = a.node(id).unwrap();
        match b.node(id) {
            Some(theirs) => {
                if ours.activation() == theirs.activation()
                    && ours.aggregation() == theirs.aggregation()
                {
                    matching_biases.push((ours.bias(), theirs.bias()));
                } else {
                    disjoint_nodes += 1;
                }
            }
            None => excess_nodes += 1,
        }
    }
    excess_nodes += b.nodes().filter(|n| a.node(n.id()).is_none()).count();

    let max_genome_size = (a.node_count() + a.connection_count())
        .max(b.node_count() + b.connection_count());

    Partition {
        matching_weights,
        disjoint_connections,
        matching_biases,
        disjoint_nodes,
        excess_nodes,
        max_genome_size,
    }
}

fn matched_sum(pairs: &[(f64, f64)], exponent: f64) -> f64 {
    pairs
        .iter()
        .map(|(a, b)| (a - b).abs().powf(exponent))
        .sum()
}

fn matched_max(pairs: &[(f64, f64)]) -> f64 {
    pairs
        .iter()
        .map(|(a, b)| (a - b).abs())
        .fold(0.0, f64::max)
}

/// Computes the speciation distance between two genomes.
///
/// Identical genomes are at distance zero, and the metric is
/// symmetric in its arguments.
///
/// # Examples
/// ```
/// use neatwork::genomics::{distance, Config, Genome, Genotype};
///
/// let config = Config { num_inputs: 1, num_outputs: 1, ..Config::default() };
/// let genome = Genome::new(1, Genotype::new());
///
/// assert_eq!(distance(&genome, &genome, &config), 0.0);
/// ```
pub fn distance(first: &Genome, second: &Genome, config: &Config) -> f64 {
    let parts = partition(first, second);
    if parts.max_genome_size == 0 {
        return 0.0;
    }

    let (connection_term, node_term) = match config.distance_method {
        DistanceMethod::Euclidean => (
            matched_sum(&parts.matching_weights, config.distance_exponent),
            matched_sum(&parts.matching_biases, config.distance_exponent),
        ),
        DistanceMethod::Manhattan => (
            matched_sum(&parts.matching_weights, 1.0),
            matched_sum(&parts.matching_biases, 1.0),
        ),
        DistanceMethod::Chebyshev => (
            matched_max(&parts.matching_weights),
            matched_max(&parts.matching_biases),
        ),
    };

    let size = parts.max_genome_size as f64;
    let disjoint_term = config.excess_coefficient * parts.disjoint_nodes as f64 / size;
    let excess_term = config.excess_coefficient
        * (parts.excess_nodes + parts.disjoint_connections) as f64
        / size;

    config.matching_coefficient * connection_term
        + config.matching_coefficient * node_term
        + disjoint_term
        + excess_term
}

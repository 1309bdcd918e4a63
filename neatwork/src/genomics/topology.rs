//! Initial-topology builders.
//!
//! A seeded genome always gets `num_inputs + 1` input nodes (the last
//! one is the bias, pinned to activation 1.0 by the evaluator),
//! `num_outputs` output nodes and `num_hidden` hidden nodes; the
//! builder mode only decides which connections exist at generation
//! zero. Every seeded connection acquires its id from the innovation
//! registry, so sibling seed genomes share ids wherever they share
//! structure.

use crate::genomics::{
    ActivationKind, AggregationKind, Config, ConnectionGene, GeneKind, Genotype,
    InnovationRegistry, MutationKind, NodeGene, NodeKind,
};
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Connection layout of freshly seeded genomes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InitialTopology {
    /// No connections.
    None,
    /// Each input-hidden, input-output and hidden-output pair is
    /// connected independently with the configured probability.
    Sparse,
    /// Every input-hidden, input-output and hidden-output pair is
    /// connected.
    Full,
    /// Only input-hidden and hidden-output pairs are connected; no
    /// direct input-output shortcuts.
    Tree,
}

/// Builds a genotype with the configured node layout and initial
/// connections.
pub fn seed_genotype(
    config: &Config,
    innovations: &InnovationRegistry,
    rng: &mut impl Rng,
) -> Genotype {
    let mut genotype = seed_nodes(config);
    match config.initial_topology {
        InitialTopology::None => {}
        InitialTopology::Sparse => {
            let p = config.initial_connection_probability;
            connect_layers(&mut genotype, config, innovations, |rng| rng.gen::<f64>() < p, rng, true);
        }
        InitialTopology::Full => {
            connect_layers(&mut genotype, config, innovations, |_| true, rng, true);
        }
        InitialTopology::Tree => {
            connect_layers(&mut genotype, config, innovations, |_| true, rng, false);
        }
    }
    genotype
}

fn seed_nodes(config: &Config) -> Genotype {
    let mut genotype = Genotype::new();
    // Inputs occupy 0..=num_inputs; the extra slot is the bias node.
    for id in 0..config.input_count() {
        genotype.insert_node(NodeGene::new(
            id as Innovation,
            NodeKind::Input,
            ActivationKind::Linear,
            AggregationKind::Mean,
            0.0,
        ));
    }
    for index in 0..config.num_outputs {
        genotype.insert_node(NodeGene::new(
            output_id(config, index),
            NodeKind::Output,
            config.default_activation,
            config.default_aggregation,
            0.0,
        ));
    }
    for index in 0..config.num_hidden {
        genotype.insert_node(NodeGene::new(
            hidden_id(config, index),
            NodeKind::Hidden,
            config.default_activation,
            config.default_aggregation,
            0.0,
        ));
    }
    genotype
}

fn output_id(config: &Config, index: usize) -> Innovation {
    (index + config.num_inputs + 1) as Innovation
}

fn hidden_id(config: &Config, index: usize) -> Innovation {
    (index + config.num_inputs + config.num_outputs + 1) as Innovation
}

fn connect_layers<R: Rng>(
    genotype: &mut Genotype,
    config: &Config,
    innovations: &InnovationRegistry,
    mut include: impl FnMut(&mut R) -> bool,
    rng: &mut R,
    direct_input_output: bool,
) {
    for input in 0..config.input_count() {
        let input = input as Innovation;
        for hidden in 0..config.num_hidden {
            if include(rng) {
                connect(genotype, innovations, input, hidden_id(config, hidden));
            }
        }
        if direct_input_output {
            for output in 0..config.num_outputs {
                if include(rng) {
                    connect(genotype, innovations, input, output_id(config, output));
                }
            }
        }
    }
    for hidden in 0..config.num_hidden {
        for output in 0..config.num_outputs {
            if include(rng) {
                connect(
                    genotype,
                    innovations,
                    hidden_id(config, hidden),
                    output_id(config, output),
                );
            }
        }
    }
}

fn connect(
    genotype: &mut Genotype,
    innovations: &InnovationRegistry,
    input: Innovation,
    output: Innovation,
) {
    let id = innovations.acquire(MutationKind::AddConnection, GeneKind::Connection, input, output);
    if genotype.connection(id).is_none() {
        genotype.insert_connection(ConnectionGene::new(id, input, output, 1.0));
    }
}

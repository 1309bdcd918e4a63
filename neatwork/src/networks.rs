//! A `Network` is the phenotype of a genome: node genes become
//! neurons, enabled connection genes become weighted edges, and the
//! genome can then be scored by evaluating input vectors.
//!
//! Evaluation is a single sweep over hidden and then output neurons
//! in ascending id order. Edges that point backwards relative to the
//! sweep read the activation their source held before this pass, so
//! cycles produced by random mutation are tolerated with stale reads
//! rather than rejected or iterated to a fixed point.

use crate::genomics::{
    activate, aggregate, ActivationKind, AggregationKind, Config, Genome, NetworkError, NodeKind,
};
use crate::Innovation;

use ahash::RandomState;

use std::collections::HashMap;
use std::fmt;

#[derive(Clone, Debug)]
struct Neuron {
    activation: f64,
    bias: f64,
    activation_kind: ActivationKind,
    aggregation_kind: AggregationKind,
}

/// An executable network generated from a genome.
///
/// Neurons are laid out inputs first (bias last among them), then
/// hidden, then outputs, each segment in ascending gene id order, so
/// evaluation is deterministic regardless of gene map iteration order.
#[derive(Clone, Debug)]
pub struct Network {
    neurons: Vec<Neuron>,
    /// Incoming edges per neuron as `(source index, weight)`.
    incoming: Vec<Vec<(usize, f64)>>,
    input_count: usize,
    output_count: usize,
    reset_activations: bool,
}

impl Network {
    /// Builds a network from a genome.
    ///
    /// Disabled connections, and connections whose endpoints are
    /// missing or disabled, are not expressed.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{Config, Genome, Genotype};
    /// use neatwork::networks::Network;
    ///
    /// let config = Config { num_inputs: 1, num_outputs: 1, ..Config::default() };
    /// let genome = Genome::new(1, Genotype::new());
    /// let network = Network::new(&genome, &config);
    ///
    /// assert_eq!(network.input_len(), 0);
    /// ```
    pub fn new(genome: &Genome, config: &Config) -> Network {
        let genotype = genome.genotype();

        let mut inputs = Vec::new();
        let mut hidden = Vec::new();
        let mut outputs = Vec::new();
        for id in genotype.node_ids() {
            let node = genotype.node(id).unwrap();
            match node.kind() {
                NodeKind::Input => &mut inputs,
                NodeKind::Hidden => &mut hidden,
                NodeKind::Output => &mut outputs,
            }
            .push(node);
        }

        let input_count = inputs.len();
        let output_count = outputs.len();
        let ordered: Vec<_> = inputs.into_iter().chain(hidden).chain(outputs).collect();

        let index_of: HashMap<Innovation, usize, RandomState> = ordered
            .iter()
            .enumerate()
            .map(|(index, node)| (node.id(), index))
            .collect();

        let neurons: Vec<Neuron> = ordered
            .iter()
            .map(|node| Neuron {
                activation: 0.0,
                bias: node.bias(),
                activation_kind: node.activation(),
                aggregation_kind: node.aggregation(),
            })
            .collect();

        let mut incoming = vec![Vec::new(); neurons.len()];
        for id in genotype.connection_ids() {
            let connection = genotype.connection(id).unwrap();
            if !connection.enabled() {
                continue;
            }
            let endpoints_live = [connection.input(), connection.output()]
                .iter()
                .all(|end| genotype.node(*end).is_some_and(|n| n.enabled()));
            if !endpoints_live {
                continue;
            }
            let source = index_of[&connection.input()];
            let target = index_of[&connection.output()];
            incoming[target].push((source, connection.weight()));
        }

        Network {
            neurons,
            incoming,
            input_count,
            output_count,
            reset_activations: config.reset_activations,
        }
    }

    /// Number of input values the network expects, excluding the bias
    /// neuron.
    pub fn input_len(&self) -> usize {
        self.input_count.saturating_sub(1)
    }

    /// Number of output values the network produces.
    pub fn output_len(&self) -> usize {
        self.output_count
    }

    /// Runs one activation sweep over the input vector and returns the
    /// output activations in ascending node id order.
    ///
    /// NaN and non-finite neuron activations are coerced to `0.0`.
    ///
    /// # Errors
    ///
    /// Returns [`NetworkError::InvalidInputShape`] when the input
    /// length does not match [`Network::input_len`].
    pub fn evaluate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NetworkError> {
        let expected = self.input_len();
        if inputs.len() != expected {
            return Err(NetworkError::InvalidInputShape {
                expected,
                actual: inputs.len(),
            });
        }

        if self.reset_activations {
            for neuron in &mut self.neurons {
                neuron.activation = 0.0;
            }
        }

        for (neuron, value) in self.neurons.iter_mut().zip(inputs) {
            neuron.activation = *value;
        }
        if self.input_count > 0 {
            // The bias neuron is the last input-kind node.
            self.neurons[self.input_count - 1].activation = 1.0;
        }

        let mut weighted = Vec::new();
        for index in self.input_count..self.neurons.len() {
            weighted.clear();
            weighted.extend(self.incoming[index].iter().map(|&(source, weight)| {
                let source = &self.neurons[source];
                (source.activation + source.bias) * weight
            }));
            let neuron = &self.neurons[index];
            let summed = aggregate(&weighted, neuron.aggregation_kind);
            let activation = activate(summed, neuron.activation_kind);
            self.neurons[index].activation = if activation.is_finite() {
                activation
            } else {
                0.0
            };
        }

        let first_output = self.neurons.len() - self.output_count;
        Ok(self.neurons[first_output..]
            .iter()
            .map(|n| n.activation)
            .collect())
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Network {{ inputs: {}, hidden: {}, outputs: {}, edges: {} }}",
            self.input_count,
            self.neurons.len() - self.input_count - self.output_count,
            self.output_count,
            self.incoming.iter().map(Vec::len).sum::<usize>(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ConnectionGene, Genotype, NodeGene};

    fn config() -> Config {
        Config {
            num_inputs: 2,
            num_outputs: 1,
            ..Config::default()
        }
    }

    fn input(id: u64) -> NodeGene {
        NodeGene::new(
            id,
            NodeKind::Input,
            ActivationKind::Linear,
            AggregationKind::Mean,
            0.0,
        )
    }

    fn output(id: u64, activation: ActivationKind) -> NodeGene {
        NodeGene::new(id, NodeKind::Output, activation, AggregationKind::Sum, 0.0)
    }

    fn hidden(id: u64, activation: ActivationKind) -> NodeGene {
        NodeGene::new(id, NodeKind::Hidden, activation, AggregationKind::Sum, 0.0)
    }

    /// Inputs 0 and 1, bias 2, output 3.
    fn xor_shell() -> Genotype {
        let mut genotype = Genotype::new();
        genotype.insert_node(input(0));
        genotype.insert_node(input(1));
        genotype.insert_node(input(2));
        genotype.insert_node(output(3, ActivationKind::Linear));
        genotype
    }

    #[test]
    fn invalid_input_shape_is_rejected() {
        let genome = Genome::new(1, xor_shell());
        let mut network = Network::new(&genome, &config());

        assert_eq!(
            network.evaluate(&[1.0]),
            Err(NetworkError::InvalidInputShape {
                expected: 2,
                actual: 1
            })
        );
        assert!(network.evaluate(&[1.0, 0.0]).is_ok());
    }

    #[test]
    fn single_connection_passes_value_through() {
        let mut genotype = xor_shell();
        genotype.insert_connection(ConnectionGene::new(4, 0, 3, 2.0));
        let genome = Genome::new(1, genotype);
        let mut network = Network::new(&genome, &config());

        for x in [-1.5, 0.0, 0.25, 3.0] {
            let outputs = network.evaluate(&[x, 0.0]).unwrap();
            assert_eq!(outputs, vec![2.0 * x]);
        }
    }

    #[test]
    fn bias_neuron_is_pinned_to_one() {
        let mut genotype = xor_shell();
        genotype.insert_connection(ConnectionGene::new(4, 2, 3, 3.0));
        let genome = Genome::new(1, genotype);
        let mut network = Network::new(&genome, &config());

        // Only the bias feeds the output: result is 1.0 * 3.0.
        assert_eq!(network.evaluate(&[0.0, 0.0]).unwrap(), vec![3.0]);
        assert_eq!(network.evaluate(&[9.0, 9.0]).unwrap(), vec![3.0]);
    }

    #[test]
    fn source_bias_shifts_weighted_input() {
        let mut genotype = xor_shell();
        let mut shifted = input(0);
        shifted.set_bias(0.5);
        genotype.insert_node(shifted);
        genotype.insert_connection(ConnectionGene::new(4, 0, 3, 1.0));
        let genome = Genome::new(1, genotype);
        let mut network = Network::new(&genome, &config());

        // Weighted input is (activation + source bias) * weight.
        assert_eq!(network.evaluate(&[1.0, 0.0]).unwrap(), vec![1.5]);
    }

    #[test]
    fn disabled_connections_are_not_expressed() {
        let mut genotype = xor_shell();
        genotype
            .insert_connection(ConnectionGene::new(4, 0, 3, 2.0).with_enabled(false));
        let genome = Genome::new(1, genotype);
        let mut network = Network::new(&genome, &config());

        assert_eq!(network.evaluate(&[5.0, 0.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn hidden_layer_evaluates_before_outputs() {
        let mut genotype = xor_shell();
        genotype.insert_node(hidden(4, ActivationKind::Linear));
        genotype.insert_connection(ConnectionGene::new(5, 0, 4, 2.0));
        genotype.insert_connection(ConnectionGene::new(6, 4, 3, -1.0));
        let genome = Genome::new(1, genotype);
        let mut network = Network::new(&genome, &config());

        // x -> hidden (x2) -> output (x-1) in one sweep.
        assert_eq!(network.evaluate(&[3.0, 0.0]).unwrap(), vec![-6.0]);
    }

    #[test]
    fn cycles_read_stale_activations() {
        let mut genotype = xor_shell();
        genotype.insert_node(hidden(4, ActivationKind::Linear));
        genotype.insert_node(hidden(5, ActivationKind::Linear));
        // 5 feeds 4 although 4 is swept first: 4 sees 5's previous value.
        genotype.insert_connection(ConnectionGene::new(6, 5, 4, 1.0));
        genotype.insert_connection(ConnectionGene::new(7, 0, 5, 1.0));
        genotype.insert_connection(ConnectionGene::new(8, 4, 3, 1.0));
        let genome = Genome::new(1, genotype);

        let persistent = Config {
            reset_activations: false,
            ..config()
        };
        let mut network = Network::new(&genome, &persistent);

        // First sweep: node 5 was still zero when node 4 aggregated.
        assert_eq!(network.evaluate(&[1.0, 0.0]).unwrap(), vec![0.0]);
        // Second sweep: node 4 now sees the 1.0 node 5 held over.
        assert_eq!(network.evaluate(&[1.0, 0.0]).unwrap(), vec![1.0]);
    }

    #[test]
    fn reset_clears_state_between_evaluations() {
        let mut genotype = xor_shell();
        genotype.insert_node(hidden(4, ActivationKind::Linear));
        genotype.insert_node(hidden(5, ActivationKind::Linear));
        genotype.insert_connection(ConnectionGene::new(6, 5, 4, 1.0));
        genotype.insert_connection(ConnectionGene::new(7, 0, 5, 1.0));
        genotype.insert_connection(ConnectionGene::new(8, 4, 3, 1.0));
        let genome = Genome::new(1, genotype);
        let mut network = Network::new(&genome, &config());

        assert_eq!(network.evaluate(&[1.0, 0.0]).unwrap(), vec![0.0]);
        // With resets on, every sweep starts from zeroed activations.
        assert_eq!(network.evaluate(&[1.0, 0.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn non_finite_activations_are_sanitized() {
        let mut genotype = xor_shell();
        genotype.insert_node(output(3, ActivationKind::Softplus));
        genotype.insert_connection(ConnectionGene::new(4, 0, 3, 1000.0));
        let genome = Genome::new(1, genotype);
        let mut network = Network::new(&genome, &config());

        // Softplus overflows to infinity for huge inputs; the sweep
        // records 0.0 instead.
        assert_eq!(network.evaluate(&[1000.0, 0.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn cloned_networks_evaluate_identically() {
        let mut genotype = xor_shell();
        genotype.insert_node(hidden(4, ActivationKind::Sigmoid));
        genotype.insert_connection(ConnectionGene::new(5, 0, 4, 0.7));
        genotype.insert_connection(ConnectionGene::new(6, 1, 4, -0.3));
        genotype.insert_connection(ConnectionGene::new(7, 4, 3, 1.9));
        let genome = Genome::new(1, genotype);

        let mut network = Network::new(&genome, &config());
        let mut clone = network.clone();
        for case in [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]] {
            let a = network.evaluate(&case).unwrap();
            let b = clone.evaluate(&case).unwrap();
            assert_eq!(a[0].to_bits(), b[0].to_bits());
        }
    }
}

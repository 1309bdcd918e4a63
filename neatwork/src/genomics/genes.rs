use crate::genomics::{ActivationKind, AggregationKind};
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// The role a node plays in the network generated
/// from its genome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Input nodes, including the bias node.
    Input,
    /// Hidden nodes.
    Hidden,
    /// Output nodes.
    Output,
}

impl NodeKind {
    /// Returns the kind's serialized name.
    pub fn name(self) -> &'static str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Hidden => "hidden",
            NodeKind::Output => "output",
        }
    }

    /// Parses a kind from its serialized name.
    pub fn from_name(name: &str) -> Option<NodeKind> {
        match name {
            "input" => Some(NodeKind::Input),
            "hidden" => Some(NodeKind::Hidden),
            "output" => Some(NodeKind::Output),
            _ => None,
        }
    }
}

/// A node gene. Nodes are the structural anchors of a
/// genome: connection genes are created between them,
/// and each one carries the activation function,
/// aggregation function and bias of its network
/// counterpart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeGene {
    id: Innovation,
    kind: NodeKind,
    activation: ActivationKind,
    aggregation: AggregationKind,
    bias: f64,
    enabled: bool,
}

impl NodeGene {
    /// Returns a new enabled node gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{ActivationKind, AggregationKind, NodeGene, NodeKind};
    ///
    /// let node = NodeGene::new(5, NodeKind::Hidden, ActivationKind::Sigmoid, AggregationKind::Sum, 0.0);
    ///
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.kind(), NodeKind::Hidden);
    /// assert!(node.enabled());
    /// ```
    pub fn new(
        id: Innovation,
        kind: NodeKind,
        activation: ActivationKind,
        aggregation: AggregationKind,
        bias: f64,
    ) -> NodeGene {
        NodeGene {
            id,
            kind,
            activation,
            aggregation,
            bias,
            enabled: true,
        }
    }

    /// Returns the node's innovation number.
    pub fn id(&self) -> Innovation {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: Innovation) {
        self.id = id;
    }

    /// Returns the node's kind.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the node's activation function.
    pub fn activation(&self) -> ActivationKind {
        self.activation
    }

    /// Replaces the node's activation function.
    pub fn set_activation(&mut self, activation: ActivationKind) {
        self.activation = activation;
    }

    /// Returns the node's aggregation function.
    pub fn aggregation(&self) -> AggregationKind {
        self.aggregation
    }

    /// Replaces the node's aggregation function.
    pub fn set_aggregation(&mut self, aggregation: AggregationKind) {
        self.aggregation = aggregation;
    }

    /// Returns the node's bias.
    pub fn bias(&self) -> f64 {
        self.bias
    }

    /// Sets the node's bias.
    pub fn set_bias(&mut self, bias: f64) {
        self.bias = bias;
    }

    /// Returns whether the node is enabled.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the node's enabled flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn with_enabled(mut self, enabled: bool) -> NodeGene {
        self.enabled = enabled;
        self
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}[{:?}, {}, {}, b={:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.kind,
            self.activation.name(),
            self.aggregation.name(),
            self.bias,
            if self.enabled { "" } else { ")" },
        )
    }
}

/// A connection gene. Connections carry a weight
/// between two nodes, and become the directed edges
/// of the genome's phenotype. The gene's innovation
/// number is its historical marking: structurally
/// identical connections arising in different genomes
/// share the same id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ConnectionGene {
    id: Innovation,
    input: Innovation,
    output: Innovation,
    weight: f64,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new enabled connection gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.id(), 42);
    /// assert_eq!(gene.input(), 3);
    /// assert_eq!(gene.output(), 9);
    /// assert_eq!(gene.weight(), 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(id: Innovation, input: Innovation, output: Innovation, weight: f64) -> ConnectionGene {
        ConnectionGene {
            id,
            input,
            output,
            weight,
            enabled: true,
        }
    }

    /// Returns the connection's innovation number.
    pub fn id(&self) -> Innovation {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: Innovation) {
        self.id = id;
    }

    /// Returns the id of the connection's source node.
    pub fn input(&self) -> Innovation {
        self.input
    }

    pub(crate) fn set_input(&mut self, input: Innovation) {
        self.input = input;
    }

    /// Returns the id of the connection's target node.
    pub fn output(&self) -> Innovation {
        self.output
    }

    pub(crate) fn set_output(&mut self, output: Innovation) {
        self.output = output;
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the connection's weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns whether the connection is expressed in the phenotype.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the connection's enabled flag.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn with_enabled(mut self, enabled: bool) -> ConnectionGene {
        self.enabled = enabled;
        self
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}[{}->{}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.id,
            self.input,
            self.output,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

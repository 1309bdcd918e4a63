use crate::genomics::{
    ActivationKind, AggregationKind, Config, ConnectionGene, GeneKind, GenotypeParseError,
    InnovationRegistry, MutationKind, NodeGene, NodeKind, MUTATION_KINDS,
};
use crate::Innovation;

use ahash::RandomState;
use rand::Rng;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::fmt;
use std::fmt::Write as _;

/// The heritable structure of a genome: a map of node genes and a map
/// of connection genes, both keyed by innovation number.
///
/// All mutation operators live here. Operators whose preconditions are
/// not met return `false` instead of failing; a failed roll of the dice
/// is a normal event during evolution, not an error.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Genotype {
    nodes: HashMap<Innovation, NodeGene, RandomState>,
    connections: HashMap<Innovation, ConnectionGene, RandomState>,
}

impl Genotype {
    /// Creates an empty genotype.
    pub fn new() -> Genotype {
        Genotype::default()
    }

    /// Inserts a node gene, replacing any previous gene with the same id.
    pub fn insert_node(&mut self, node: NodeGene) {
        self.nodes.insert(node.id(), node);
    }

    /// Inserts a connection gene, replacing any previous gene with the
    /// same id.
    pub fn insert_connection(&mut self, connection: ConnectionGene) {
        self.connections.insert(connection.id(), connection);
    }

    /// Returns the node gene with the given id, if present.
    pub fn node(&self, id: Innovation) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Returns the connection gene with the given id, if present.
    pub fn connection(&self, id: Innovation) -> Option<&ConnectionGene> {
        self.connections.get(&id)
    }

    /// Returns an iterator over the node genes. No ordering is
    /// guaranteed; use [`Genotype::node_ids`] for a stable order.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Returns an iterator over the connection genes. No ordering is
    /// guaranteed; use [`Genotype::connection_ids`] for a stable order.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    /// Returns the number of node genes.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of connection genes.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Returns all node ids in ascending order.
    ///
    /// Random selection and crossover always go through these sorted
    /// id lists, which keeps runs reproducible under a fixed seed.
    pub fn node_ids(&self) -> Vec<Innovation> {
        let mut ids: Vec<Innovation> = self.nodes.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Returns all connection ids in ascending order.
    pub fn connection_ids(&self) -> Vec<Innovation> {
        let mut ids: Vec<Innovation> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    fn node_ids_where(&self, predicate: impl Fn(&NodeGene) -> bool) -> Vec<Innovation> {
        let mut ids: Vec<Innovation> = self
            .nodes
            .values()
            .filter(|n| predicate(n))
            .map(|n| n.id())
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Returns the highest id across both gene maps, or 0 when empty.
    pub fn newest_gene_key(&self) -> Innovation {
        let newest_node = self.nodes.keys().copied().max().unwrap_or(0);
        let newest_connection = self.connections.keys().copied().max().unwrap_or(0);
        newest_node.max(newest_connection)
    }

    /// Removes connections whose endpoints do not resolve to enabled
    /// nodes. Must run after any mutation that removes nodes.
    pub fn prune(&mut self) {
        let nodes = &self.nodes;
        self.connections.retain(|_, c| {
            nodes.get(&c.input()).is_some_and(|n| n.enabled())
                && nodes.get(&c.output()).is_some_and(|n| n.enabled())
        });
    }

    /// Renumbers gene ids into a contiguous range: nodes become
    /// `0..n` and connections `n..n + m`, each in ascending order of
    /// their old ids, with connection endpoints remapped to the new
    /// node ids. Applied before saving a genome so dead id ranges from
    /// removals do not leak into the serialized form.
    pub fn reduce_gene_keys(&mut self) {
        let node_ids = self.node_ids();
        let remap: HashMap<Innovation, Innovation, RandomState> = node_ids
            .iter()
            .enumerate()
            .map(|(new, old)| (*old, new as Innovation))
            .collect();

        let mut nodes = HashMap::default();
        for old in node_ids {
            let mut node = self.nodes.remove(&old).unwrap();
            node.set_id(remap[&old]);
            nodes.insert(node.id(), node);
        }
        self.nodes = nodes;

        let next = self.nodes.len() as Innovation;
        let connection_ids = self.connection_ids();
        let mut connections = HashMap::default();
        for (offset, old) in connection_ids.into_iter().enumerate() {
            let mut connection = self.connections.remove(&old).unwrap();
            connection.set_id(next + offset as Innovation);
            if let Some(new) = remap.get(&connection.input()) {
                connection.set_input(*new);
            }
            if let Some(new) = remap.get(&connection.output()) {
                connection.set_output(*new);
            }
            connections.insert(connection.id(), connection);
        }
        self.connections = connections;
    }

    /// Applies the configured mutation pass.
    ///
    /// In single-mutation mode one operator is chosen uniformly and
    /// applied under its own probability gate; otherwise every
    /// operator's gate is rolled independently, in a fixed order.
    pub fn mutate(
        &mut self,
        config: &Config,
        innovations: &InnovationRegistry,
        rng: &mut impl Rng,
    ) {
        if config.single_mutation {
            let kind = MUTATION_KINDS[rng.gen_range(0..MUTATION_KINDS.len())];
            let rate = Self::rate_for(kind, config);
            if rng.gen::<f64>() < rate {
                self.apply(kind, config, innovations, rng);
            }
        } else {
            for kind in MUTATION_KINDS {
                if rng.gen::<f64>() < Self::rate_for(kind, config) {
                    self.apply(kind, config, innovations, rng);
                }
            }
        }
    }

    fn rate_for(kind: MutationKind, config: &Config) -> f64 {
        match kind {
            MutationKind::AddNode => config.add_node_rate,
            MutationKind::AddConnection => config.add_connection_rate,
            MutationKind::RemoveNode => config.remove_node_rate,
            MutationKind::RemoveConnection => config.remove_connection_rate,
            MutationKind::ModifyWeight => config.weight_mutation_rate,
            MutationKind::ModifyBias => config.bias_mutation_rate,
            MutationKind::ModifyActivation => config.activation_mutation_rate,
            MutationKind::ModifyAggregation => config.aggregation_mutation_rate,
            MutationKind::ToggleConnection => config.toggle_connection_rate,
        }
    }

    fn apply(
        &mut self,
        kind: MutationKind,
        config: &Config,
        innovations: &InnovationRegistry,
        rng: &mut impl Rng,
    ) -> bool {
        match kind {
            MutationKind::AddNode => self.mutate_add_node(config, innovations, rng),
            MutationKind::AddConnection => self.mutate_add_connection(innovations, rng),
            MutationKind::RemoveNode => self.mutate_remove_node(rng),
            MutationKind::RemoveConnection => self.mutate_remove_connection(rng),
            MutationKind::ModifyWeight => self.mutate_modify_weight(config, rng),
            MutationKind::ModifyBias => self.mutate_modify_bias(config, rng),
            MutationKind::ModifyActivation => self.mutate_modify_activation(config, rng),
            MutationKind::ModifyAggregation => self.mutate_modify_aggregation(config, rng),
            MutationKind::ToggleConnection => self.mutate_toggle_connection(rng),
        }
    }

    /// Splits a random connection with a new hidden node.
    ///
    /// The split connection is disabled; the incoming replacement gets
    /// weight `1.0` and the outgoing one inherits the old weight, so
    /// the split is initially behavior-preserving. All three new gene
    /// ids come from the innovation registry, which is what lets two
    /// genomes that split the same connection stay alignable.
    pub fn mutate_add_node(
        &mut self,
        config: &Config,
        innovations: &InnovationRegistry,
        rng: &mut impl Rng,
    ) -> bool {
        let connection_ids = self.connection_ids();
        let Some(&split_id) = pick(&connection_ids, rng) else {
            return false;
        };
        let (input, output, weight) = {
            let connection = self.connections.get_mut(&split_id).unwrap();
            connection.set_enabled(false);
            (connection.input(), connection.output(), connection.weight())
        };

        let node_id = innovations.acquire(MutationKind::AddNode, GeneKind::Node, input, output);
        let in_id = innovations.acquire(MutationKind::AddNode, GeneKind::Connection, input, node_id);
        let out_id =
            innovations.acquire(MutationKind::AddNode, GeneKind::Connection, node_id, output);
        if self.nodes.contains_key(&node_id) {
            // This genome already split this connection once.
            return false;
        }

        self.insert_node(NodeGene::new(
            node_id,
            NodeKind::Hidden,
            config.default_activation,
            config.default_aggregation,
            0.0,
        ));
        self.insert_connection(ConnectionGene::new(in_id, input, node_id, 1.0));
        self.insert_connection(ConnectionGene::new(out_id, node_id, output, weight));
        true
    }

    /// Adds a connection between a random non-output source and a
    /// random non-input target, with weight `1.0`.
    pub fn mutate_add_connection(
        &mut self,
        innovations: &InnovationRegistry,
        rng: &mut impl Rng,
    ) -> bool {
        let sources = self.node_ids_where(|n| n.kind() != NodeKind::Output);
        let targets = self.node_ids_where(|n| n.kind() != NodeKind::Input);
        let (Some(&input), Some(&output)) = (pick(&sources, rng), pick(&targets, rng)) else {
            return false;
        };

        let id = innovations.acquire(MutationKind::AddConnection, GeneKind::Connection, input, output);
        if self.connections.contains_key(&id) {
            return false;
        }
        self.insert_connection(ConnectionGene::new(id, input, output, 1.0));
        true
    }

    /// Removes a random hidden node and prunes the connections left
    /// dangling by its removal.
    pub fn mutate_remove_node(&mut self, rng: &mut impl Rng) -> bool {
        let hidden = self.node_ids_where(|n| n.kind() == NodeKind::Hidden);
        let Some(&id) = pick(&hidden, rng) else {
            return false;
        };
        self.nodes.remove(&id);
        self.prune();
        true
    }

    /// Removes a random connection.
    pub fn mutate_remove_connection(&mut self, rng: &mut impl Rng) -> bool {
        let connection_ids = self.connection_ids();
        let Some(&id) = pick(&connection_ids, rng) else {
            return false;
        };
        self.connections.remove(&id);
        true
    }

    /// Nudges a random connection weight by a uniform draw from
    /// `[-weight_variance, weight_variance]`, clamped to the
    /// configured weight bounds.
    pub fn mutate_modify_weight(&mut self, config: &Config, rng: &mut impl Rng) -> bool {
        let connection_ids = self.connection_ids();
        let Some(&id) = pick(&connection_ids, rng) else {
            return false;
        };
        let nudge = rng.gen_range(-config.weight_variance..=config.weight_variance);
        let connection = self.connections.get_mut(&id).unwrap();
        connection.set_weight((connection.weight() + nudge).clamp(config.min_weight, config.max_weight));
        true
    }

    /// Nudges a random node bias by a uniform draw from
    /// `[-bias_variance, bias_variance]`, clamped to the configured
    /// bias bounds.
    pub fn mutate_modify_bias(&mut self, config: &Config, rng: &mut impl Rng) -> bool {
        let node_ids = self.node_ids();
        let Some(&id) = pick(&node_ids, rng) else {
            return false;
        };
        let nudge = rng.gen_range(-config.bias_variance..=config.bias_variance);
        let node = self.nodes.get_mut(&id).unwrap();
        node.set_bias((node.bias() + nudge).clamp(config.min_bias, config.max_bias));
        true
    }

    /// Replaces a random non-input node's activation with a choice
    /// from the allowed set (which always contains the default).
    pub fn mutate_modify_activation(&mut self, config: &Config, rng: &mut impl Rng) -> bool {
        let mut allowed: Vec<ActivationKind> = config.allowed_activations.clone();
        if !allowed.contains(&config.default_activation) {
            allowed.push(config.default_activation);
        }
        let candidates = self.node_ids_where(|n| n.kind() != NodeKind::Input);
        let Some(&id) = pick(&candidates, rng) else {
            return false;
        };
        let choice = allowed[rng.gen_range(0..allowed.len())];
        self.nodes.get_mut(&id).unwrap().set_activation(choice);
        true
    }

    /// Replaces a random non-input node's aggregation with a choice
    /// from the allowed set (which always contains the default).
    pub fn mutate_modify_aggregation(&mut self, config: &Config, rng: &mut impl Rng) -> bool {
        let mut allowed: Vec<AggregationKind> = config.allowed_aggregations.clone();
        if !allowed.contains(&config.default_aggregation) {
            allowed.push(config.default_aggregation);
        }
        let candidates = self.node_ids_where(|n| n.kind() != NodeKind::Input);
        let Some(&id) = pick(&candidates, rng) else {
            return false;
        };
        let choice = allowed[rng.gen_range(0..allowed.len())];
        self.nodes.get_mut(&id).unwrap().set_aggregation(choice);
        true
    }

    /// Flips a random connection's enabled flag.
    pub fn mutate_toggle_connection(&mut self, rng: &mut impl Rng) -> bool {
        let connection_ids = self.connection_ids();
        let Some(&id) = pick(&connection_ids, rng) else {
            return false;
        };
        let connection = self.connections.get_mut(&id).unwrap();
        connection.set_enabled(!connection.enabled());
        true
    }

    /// Renders the genotype in the keyed-text format: all node genes,
    /// then all connection genes, one field per line, in ascending id
    /// order.
    ///
    /// # Examples
    /// ```
    /// use neatwork::genomics::{ActivationKind, AggregationKind, ConnectionGene, Genotype, NodeGene, NodeKind};
    ///
    /// let mut genotype = Genotype::new();
    /// genotype.insert_node(NodeGene::new(0, NodeKind::Input, ActivationKind::Linear, AggregationKind::Mean, 0.0));
    /// genotype.insert_connection(ConnectionGene::new(1, 0, 0, 0.5));
    ///
    /// let text = genotype.serialize();
    /// assert_eq!(Genotype::deserialize(&text).unwrap(), genotype);
    /// ```
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str("nodes:\n");
        for id in self.node_ids() {
            let node = &self.nodes[&id];
            let _ = writeln!(out, "  - {}:", id);
            let _ = writeln!(out, "    type: {}", node.kind().name());
            let _ = writeln!(out, "    bias: {}", node.bias());
            let _ = writeln!(out, "    aggregation: {}", node.aggregation().name());
            let _ = writeln!(out, "    activation: {}", node.activation().name());
            let _ = writeln!(out, "    enabled: {}", node.enabled());
        }
        out.push_str("connections:\n");
        for id in self.connection_ids() {
            let connection = &self.connections[&id];
            let _ = writeln!(out, "  - {}:", id);
            let _ = writeln!(out, "    source: {}", connection.input());
            let _ = writeln!(out, "    target: {}", connection.output());
            let _ = writeln!(out, "    weight: {}", connection.weight());
            let _ = writeln!(out, "    enabled: {}", connection.enabled());
        }
        out
    }

    /// Parses a genotype from the keyed-text format.
    ///
    /// # Errors
    ///
    /// Returns a [`GenotypeParseError`] describing the first offending
    /// line or missing field.
    pub fn deserialize(text: &str) -> Result<Genotype, GenotypeParseError> {
        Parser::default().parse(text)
    }
}

fn pick<'a>(ids: &'a [Innovation], rng: &mut impl Rng) -> Option<&'a Innovation> {
    if ids.is_empty() {
        None
    } else {
        Some(&ids[rng.gen_range(0..ids.len())])
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Section {
    Preamble,
    Nodes,
    Connections,
}

struct Entry {
    id: Innovation,
    fields: Vec<(String, String)>,
}

impl Entry {
    fn field(&self, name: &'static str) -> Result<&str, GenotypeParseError> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .ok_or(GenotypeParseError::MissingField {
                gene: self.id,
                field: name,
            })
    }
}

struct Parser {
    section: Section,
    entry: Option<Entry>,
    genotype: Genotype,
}

impl Default for Parser {
    fn default() -> Parser {
        Parser {
            section: Section::Preamble,
            entry: None,
            genotype: Genotype::new(),
        }
    }
}

impl Parser {
    fn parse(mut self, text: &str) -> Result<Genotype, GenotypeParseError> {
        for (index, raw) in text.lines().enumerate() {
            let number = index + 1;
            let line = raw.trim_end();
            if line.trim().is_empty() {
                continue;
            }

            if line == "nodes:" {
                self.flush()?;
                self.section = Section::Nodes;
            } else if line == "connections:" {
                self.flush()?;
                self.section = Section::Connections;
            } else if let Some(rest) = line.strip_prefix("  - ") {
                if self.section == Section::Preamble {
                    return Err(GenotypeParseError::UnexpectedLine(number));
                }
                self.flush()?;
                let id = rest
                    .strip_suffix(':')
                    .and_then(|id| id.trim().parse::<Innovation>().ok())
                    .ok_or(GenotypeParseError::UnexpectedLine(number))?;
                self.entry = Some(Entry {
                    id,
                    fields: Vec::new(),
                });
            } else if let Some(rest) = line.strip_prefix("    ") {
                let entry = self
                    .entry
                    .as_mut()
                    .ok_or(GenotypeParseError::UnexpectedLine(number))?;
                let (key, value) = rest
                    .split_once(':')
                    .ok_or(GenotypeParseError::UnexpectedLine(number))?;
                entry
                    .fields
                    .push((key.trim().to_string(), value.trim().to_string()));
            } else {
                return Err(GenotypeParseError::UnexpectedLine(number));
            }
        }
        self.flush()?;
        Ok(self.genotype)
    }

    fn flush(&mut self) -> Result<(), GenotypeParseError> {
        let Some(entry) = self.entry.take() else {
            return Ok(());
        };
        match self.section {
            Section::Nodes => {
                let kind = NodeKind::from_name(entry.field("type")?).ok_or_else(|| {
                    invalid(&entry, "type")
                })?;
                let bias = entry
                    .field("bias")?
                    .parse::<f64>()
                    .map_err(|_| invalid(&entry, "bias"))?;
                let aggregation = AggregationKind::from_name(entry.field("aggregation")?)
                    .ok_or_else(|| invalid(&entry, "aggregation"))?;
                let activation = ActivationKind::from_name(entry.field("activation")?)
                    .ok_or_else(|| invalid(&entry, "activation"))?;
                let enabled = parse_bool(&entry, "enabled")?;
                self.genotype.insert_node(
                    NodeGene::new(entry.id, kind, activation, aggregation, bias)
                        .with_enabled(enabled),
                );
            }
            Section::Connections => {
                let source = entry
                    .field("source")?
                    .parse::<Innovation>()
                    .map_err(|_| invalid(&entry, "source"))?;
                let target = entry
                    .field("target")?
                    .parse::<Innovation>()
                    .map_err(|_| invalid(&entry, "target"))?;
                let weight = entry
                    .field("weight")?
                    .parse::<f64>()
                    .map_err(|_| invalid(&entry, "weight"))?;
                let enabled = parse_bool(&entry, "enabled")?;
                self.genotype.insert_connection(
                    ConnectionGene::new(entry.id, source, target, weight).with_enabled(enabled),
                );
            }
            Section::Preamble => {}
        }
        Ok(())
    }
}

fn invalid(entry: &Entry, field: &str) -> GenotypeParseError {
    GenotypeParseError::InvalidValue {
        line: 0,
        field: format!("{} (gene {})", field, entry.id),
    }
}

fn parse_bool(entry: &Entry, field: &'static str) -> Result<bool, GenotypeParseError> {
    match entry.field(field)? {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(invalid(entry, field)),
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let nodes: Vec<String> = self
            .node_ids()
            .iter()
            .map(|id| self.nodes[id].to_string())
            .collect();
        let connections: Vec<String> = self
            .connection_ids()
            .iter()
            .map(|id| self.connections[id].to_string())
            .collect();
        write!(
            f,
            "Genotype {{ nodes: [{}], connections: [{}] }}",
            nodes.join(", "),
            connections.join(", ")
        )
    }
}

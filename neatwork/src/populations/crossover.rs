//! Crossover operators.
//!
//! All operators work over the union of the parents' gene ids, nodes
//! and connections independently. A gene present in only one parent
//! is inherited from that parent; a gene present in both is resolved
//! by the operator's rule over gene-id space. Weights are copied,
//! never averaged, so hand-aligned parents keep recognizable genes.

use crate::genomics::{Config, Genotype};
use crate::Innovation;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// The rule used to resolve genes present in both parents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CrossoverKind {
    /// Each shared gene is taken from either parent at 50/50.
    Uniform,
    /// Ids below a random split point come from the first parent,
    /// the rest from the second.
    SinglePoint,
    /// Three bands over id space; the middle band comes from the
    /// second parent.
    TwoPoint,
    /// A configured number of toggle points; the contributing parent
    /// alternates at each point.
    Multipoint,
}

enum Rule {
    Uniform,
    Bands(Vec<Innovation>),
}

impl Rule {
    fn from_first(&self, id: Innovation, rng: &mut impl Rng) -> bool {
        match self {
            Rule::Uniform => rng.gen_bool(0.5),
            // The contributing parent flips at every band boundary at
            // or below the gene's id.
            Rule::Bands(points) => points.iter().filter(|p| id >= **p).count() % 2 == 0,
        }
    }
}

/// Produces a child genotype from two parents under the configured
/// crossover kind.
pub(crate) fn crossover(
    first: &Genotype,
    second: &Genotype,
    config: &Config,
    rng: &mut impl Rng,
) -> Genotype {
    let span = first.node_count().min(second.node_count()).max(1) as Innovation;
    let rule = match config.crossover_kind {
        CrossoverKind::Uniform => Rule::Uniform,
        CrossoverKind::SinglePoint => Rule::Bands(vec![rng.gen_range(0..span)]),
        CrossoverKind::TwoPoint => {
            let mut points = vec![rng.gen_range(0..span), rng.gen_range(0..span)];
            points.sort_unstable();
            points.into()
        }
        CrossoverKind::Multipoint => {
            let mut points: Vec<Innovation> = (0..config.crossover_points)
                .map(|_| rng.gen_range(0..span))
                .collect();
            points.sort_unstable();
            points.into()
        }
    };

    let mut child = Genotype::new();
    for id in merged_ids(first.node_ids(), second.node_ids()) {
        let gene = match (first.node(id), second.node(id)) {
            (Some(a), Some(b)) => {
                if rule.from_first(id, rng) {
                    a
                } else {
                    b
                }
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => unreachable!("merged id missing from both parents"),
        };
        child.insert_node(gene.clone());
    }
    for id in merged_ids(first.connection_ids(), second.connection_ids()) {
        let gene = match (first.connection(id), second.connection(id)) {
            (Some(a), Some(b)) => {
                if rule.from_first(id, rng) {
                    a
                } else {
                    b
                }
            }
            (Some(a), None) => a,
            (None, Some(b)) => b,
            (None, None) => unreachable!("merged id missing from both parents"),
        };
        child.insert_connection(gene.clone());
    }
    child
}

impl From<Vec<Innovation>> for Rule {
    fn from(points: Vec<Innovation>) -> Rule {
        Rule::Bands(points)
    }
}

fn merged_ids(mut first: Vec<Innovation>, second: Vec<Innovation>) -> Vec<Innovation> {
    first.extend(second);
    first.sort_unstable();
    first.dedup();
    first
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{
        ActivationKind, AggregationKind, Config, ConnectionGene, NodeGene, NodeKind,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(21)
    }

    fn config(kind: CrossoverKind) -> Config {
        Config {
            num_inputs: 1,
            num_outputs: 1,
            crossover_kind: kind,
            ..Config::default()
        }
    }

    fn node(id: u64, bias: f64) -> NodeGene {
        NodeGene::new(
            id,
            NodeKind::Hidden,
            ActivationKind::Sigmoid,
            AggregationKind::Sum,
            bias,
        )
    }

    fn parents() -> (Genotype, Genotype) {
        let mut a = Genotype::new();
        let mut b = Genotype::new();
        for g in [&mut a, &mut b] {
            g.insert_node(node(0, 0.0));
            g.insert_node(node(1, 0.0));
        }
        (a, b)
    }

    #[test]
    fn shared_gene_keeps_one_parents_weight() {
        let (mut a, mut b) = parents();
        a.insert_connection(ConnectionGene::new(7, 0, 1, 1.0));
        b.insert_connection(ConnectionGene::new(7, 0, 1, 3.0));

        let config = config(CrossoverKind::Uniform);
        let mut rng = rng();
        for _ in 0..20 {
            let child = crossover(&a, &b, &config, &mut rng);
            let weight = child.connection(7).unwrap().weight();
            // Copied from a parent, never averaged or renumbered.
            assert!(weight == 1.0 || weight == 3.0);
            assert!(child.connection(5).is_none());
            assert!(child.connection(9).is_none());
        }
    }

    #[test]
    fn unshared_genes_come_from_their_owner() {
        let (mut a, mut b) = parents();
        a.insert_connection(ConnectionGene::new(3, 0, 1, -1.0));
        b.insert_connection(ConnectionGene::new(4, 1, 0, 2.5));

        for kind in [
            CrossoverKind::Uniform,
            CrossoverKind::SinglePoint,
            CrossoverKind::TwoPoint,
            CrossoverKind::Multipoint,
        ] {
            let child = crossover(&a, &b, &config(kind), &mut rng());
            assert_eq!(child.connection(3).unwrap().weight(), -1.0, "{:?}", kind);
            assert_eq!(child.connection(4).unwrap().weight(), 2.5, "{:?}", kind);
        }
    }

    #[test]
    fn child_covers_the_union_of_ids() {
        let (mut a, mut b) = parents();
        a.insert_node(node(5, 0.5));
        b.insert_node(node(6, -0.5));
        a.insert_connection(ConnectionGene::new(10, 0, 5, 1.0));
        b.insert_connection(ConnectionGene::new(11, 0, 6, 1.0));

        let child = crossover(&a, &b, &config(CrossoverKind::SinglePoint), &mut rng());
        assert_eq!(child.node_ids(), vec![0, 1, 5, 6]);
        assert_eq!(child.connection_ids(), vec![10, 11]);
    }

    #[test]
    fn band_rule_alternates_at_points() {
        let rule = Rule::Bands(vec![3, 7]);
        let mut rng = rng();
        // Below the first point: first parent.
        assert!(rule.from_first(0, &mut rng));
        assert!(rule.from_first(2, &mut rng));
        // Between the points: second parent.
        assert!(!rule.from_first(3, &mut rng));
        assert!(!rule.from_first(6, &mut rng));
        // Past the second point: back to the first parent.
        assert!(rule.from_first(7, &mut rng));
        assert!(rule.from_first(100, &mut rng));
    }

    #[test]
    fn single_point_splits_id_space() {
        let (mut a, mut b) = parents();
        for id in 0..4 {
            a.insert_node(node(id, 1.0));
            b.insert_node(node(id, -1.0));
        }

        let child = crossover(&a, &b, &config(CrossoverKind::SinglePoint), &mut rng());
        // Some prefix comes from parent a, the rest from parent b.
        let biases: Vec<f64> = child.node_ids().iter().map(|id| child.node(*id).unwrap().bias()).collect();
        let first_b = biases.iter().position(|b| *b < 0.0);
        if let Some(split) = first_b {
            assert!(biases[split..].iter().all(|b| *b < 0.0));
            assert!(biases[..split].iter().all(|b| *b > 0.0));
        }
    }
}

use crate::Innovation;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::sync::Mutex;

/// The structural mutation operators. Each kind is gated by its own
/// probability in the configuration, and participates in the innovation
/// registry's identity for the mutations that create genes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationKind {
    AddNode,
    AddConnection,
    RemoveNode,
    RemoveConnection,
    ModifyWeight,
    ModifyBias,
    ModifyActivation,
    ModifyAggregation,
    ToggleConnection,
}

/// All mutation kinds, in the order they are attempted.
pub const MUTATION_KINDS: [MutationKind; 9] = [
    MutationKind::AddNode,
    MutationKind::AddConnection,
    MutationKind::RemoveNode,
    MutationKind::RemoveConnection,
    MutationKind::ModifyWeight,
    MutationKind::ModifyBias,
    MutationKind::ModifyActivation,
    MutationKind::ModifyAggregation,
    MutationKind::ToggleConnection,
];

/// Whether an innovation names a node or a connection gene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeneKind {
    Node,
    Connection,
}

type InnovationKey = (MutationKind, GeneKind, Innovation, Innovation);

#[derive(Debug, Default)]
struct Records {
    next_id: Innovation,
    by_key: HashMap<InnovationKey, Innovation, RandomState>,
}

/// The innovation registry: a monotonic id counter plus a record of
/// every structural mutation seen so far, keyed by the mutation's
/// four-tuple identity.
///
/// Structurally identical mutations arising independently in different
/// genomes acquire the same id, which is what lets crossover align two
/// parents in linear time. The registry is owned by the trainer and
/// shared by reference with every genome operation in the run;
/// `acquire` is linearizable, so it may also be called from parallel
/// workers.
///
/// # Examples
/// ```
/// use neatwork::genomics::{GeneKind, InnovationRegistry, MutationKind};
///
/// let registry = InnovationRegistry::new();
///
/// let a = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 0, 3);
/// let b = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 0, 3);
/// let c = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 1, 3);
///
/// // The same structural mutation maps to the same id.
/// assert_eq!(a, b);
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Default)]
pub struct InnovationRegistry {
    records: Mutex<Records>,
}

impl InnovationRegistry {
    /// Creates an empty registry with the counter at zero.
    pub fn new() -> InnovationRegistry {
        InnovationRegistry::default()
    }

    /// Creates an empty registry with the counter seeded to `start`.
    ///
    /// The trainer seeds the counter past the ids of every node in the
    /// initial topology, so gene innovations never collide with them.
    pub fn starting_at(start: Innovation) -> InnovationRegistry {
        let registry = InnovationRegistry::new();
        registry.reset(start);
        registry
    }

    /// Returns the id recorded for the given mutation identity,
    /// allocating the next id if the identity is new.
    ///
    /// # Panics
    ///
    /// Panics if the id counter would wrap around. Exhausting a 64-bit
    /// id space is not a recoverable state for a run.
    pub fn acquire(
        &self,
        mutation: MutationKind,
        gene: GeneKind,
        input: Innovation,
        output: Innovation,
    ) -> Innovation {
        let mut records = self.records.lock().expect("innovation registry poisoned");
        let next = records.next_id;
        let id = *records
            .by_key
            .entry((mutation, gene, input, output))
            .or_insert(next);
        if id == next {
            records.next_id = next
                .checked_add(1)
                .expect("innovation id space exhausted");
        }
        id
    }

    /// Clears all records and seeds the counter to `start`.
    pub fn reset(&self, start: Innovation) {
        let mut records = self.records.lock().expect("innovation registry poisoned");
        records.by_key.clear();
        records.next_id = start;
    }

    /// Returns the id the next novel mutation would acquire.
    pub fn next_id(&self) -> Innovation {
        self.records
            .lock()
            .expect("innovation registry poisoned")
            .next_id
    }

    /// Returns the number of distinct mutations recorded.
    pub fn len(&self) -> usize {
        self.records
            .lock()
            .expect("innovation registry poisoned")
            .by_key
            .len()
    }

    /// Returns whether no mutations have been recorded.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_mutations_share_an_id() {
        let registry = InnovationRegistry::starting_at(10);
        let first = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 2, 5);
        let again = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 2, 5);
        assert_eq!(first, 10);
        assert_eq!(first, again);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn distinct_mutations_get_distinct_ids() {
        let registry = InnovationRegistry::new();
        let a = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 0, 1);
        let b = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 1, 0);
        let c = registry.acquire(MutationKind::AddNode, GeneKind::Node, 0, 1);
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(b, c);
    }

    #[test]
    fn gene_kind_participates_in_identity() {
        let registry = InnovationRegistry::new();
        let node = registry.acquire(MutationKind::AddNode, GeneKind::Node, 0, 1);
        let gene = registry.acquire(MutationKind::AddNode, GeneKind::Connection, 0, 1);
        assert_ne!(node, gene);
    }

    #[test]
    fn reset_clears_records() {
        let registry = InnovationRegistry::new();
        registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 0, 1);
        registry.reset(100);
        assert!(registry.is_empty());
        assert_eq!(registry.next_id(), 100);
        let id = registry.acquire(MutationKind::AddConnection, GeneKind::Connection, 0, 1);
        assert_eq!(id, 100);
    }

    #[test]
    fn concurrent_acquires_agree() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(InnovationRegistry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    (0..100)
                        .map(|i| {
                            registry.acquire(
                                MutationKind::AddConnection,
                                GeneKind::Connection,
                                i % 10,
                                i / 10,
                            )
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let results: Vec<Vec<Innovation>> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        // Every thread resolved each identity to the same id.
        for other in &results[1..] {
            assert_eq!(&results[0], other);
        }
        assert_eq!(registry.len(), 100);
    }
}

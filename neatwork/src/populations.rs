//! A population is a collection of genomes grouped into species and
//! evolved generation by generation, using a task's fitness scores as
//! the source of selective pressure.

mod crossover;
mod culling;
mod logging;
mod pairing;
mod species;
mod trainer;

pub use crossover::CrossoverKind;
pub use culling::CullingMethod;
pub use logging::{EvolutionLogger, GenerationLog, GenerationMembers, ReportingLevel, Stats};
pub use pairing::PairingStrategy;
pub use species::Species;
pub use trainer::{Task, Trainer};

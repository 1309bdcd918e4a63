use crate::genomics::{ActivationKind, AggregationKind, ConfigError, InitialTopology};
use crate::genomics::distance::DistanceMethod;
use crate::populations::{CrossoverKind, CullingMethod, PairingStrategy};
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::path::PathBuf;

/// The complete configuration surface for a run.
///
/// Every field has a usable default; a typical caller overrides the
/// topology counts and a handful of rates with struct-update syntax:
///
/// ```
/// use neatwork::genomics::Config;
///
/// let config = Config {
///     num_inputs: 2,
///     num_outputs: 1,
///     population_size: 150,
///     ..Config::default()
/// };
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    // Population.
    /// Number of genomes in the population.
    pub population_size: usize,
    /// Number of generations to run. Zero means no generation limit.
    pub max_generations: u64,
    /// Seed for the run's random number generator.
    pub random_seed: u64,
    /// Stop once any genome reaches this fitness. Zero disables the check.
    pub stopping_fitness: f64,
    /// Whether network activations are zeroed before each evaluation.
    pub reset_activations: bool,
    /// Number of worker threads for fitness evaluation. Values above 1
    /// evaluate the population in parallel.
    pub num_threads: usize,
    /// Whether to periodically inject a clone of the best genome seen
    /// so far back into the population.
    pub reintroduce_best_genome: bool,
    /// Generation period for best-genome reintroduction.
    pub reintroduction_period: u64,

    // Topology.
    /// Number of input neurons, excluding the bias neuron.
    pub num_inputs: usize,
    /// Number of output neurons.
    pub num_outputs: usize,
    /// Number of hidden neurons in the initial topology.
    pub num_hidden: usize,
    /// Connection layout of seeded genomes.
    pub initial_topology: InitialTopology,
    /// Connection probability for [`InitialTopology::Sparse`].
    pub initial_connection_probability: f64,

    // Distance.
    /// Distance below which two genomes share a species.
    pub speciation_distance_threshold: f64,
    /// Weight of excess genes in the distance metric.
    pub excess_coefficient: f64,
    /// Weight of disjoint genes in the distance metric.
    pub disjoint_coefficient: f64,
    /// Weight of matching-gene weight and bias differences.
    pub matching_coefficient: f64,
    /// Exponent applied to matching-gene differences.
    pub distance_exponent: f64,
    /// Which distance metric to use.
    pub distance_method: DistanceMethod,

    // Species.
    /// Number of genomes per species exempt from culling and mutation.
    pub species_elitism: usize,
    /// Fraction of each species kept through culling.
    pub survival_rate: f64,
    /// Generations without improvement before a species stagnates.
    pub max_stagnation: u32,
    /// Whether the species representative is its fittest member
    /// rather than a random one.
    pub choose_best_representative: bool,
    /// Smallest population any species is allotted.
    pub min_species_size: usize,

    // Mutation.
    /// Chance that a non-elite genome is mutated at all each generation.
    pub mutation_rate: f64,
    /// Chance of splitting a connection with a new node.
    pub add_node_rate: f64,
    /// Chance of removing a random hidden node.
    pub remove_node_rate: f64,
    /// Chance of adding a new connection.
    pub add_connection_rate: f64,
    /// Chance of removing a random connection.
    pub remove_connection_rate: f64,
    /// Chance of nudging a random connection weight.
    pub weight_mutation_rate: f64,
    /// Magnitude bound of the uniform weight nudge.
    pub weight_variance: f64,
    /// Lower clamp for connection weights.
    pub min_weight: f64,
    /// Upper clamp for connection weights.
    pub max_weight: f64,
    /// Chance of nudging a random node bias.
    pub bias_mutation_rate: f64,
    /// Magnitude bound of the uniform bias nudge.
    pub bias_variance: f64,
    /// Lower clamp for node biases.
    pub min_bias: f64,
    /// Upper clamp for node biases.
    pub max_bias: f64,
    /// Chance of replacing a node's activation function.
    pub activation_mutation_rate: f64,
    /// Activation given to new output and hidden nodes.
    pub default_activation: ActivationKind,
    /// Activations an activation mutation may choose from. The default
    /// activation is always an implicit member.
    pub allowed_activations: Vec<ActivationKind>,
    /// Chance of replacing a node's aggregation function.
    pub aggregation_mutation_rate: f64,
    /// Aggregation given to new output and hidden nodes.
    pub default_aggregation: AggregationKind,
    /// Aggregations an aggregation mutation may choose from. The
    /// default aggregation is always an implicit member.
    pub allowed_aggregations: Vec<AggregationKind>,
    /// Chance of flipping a random connection's enabled flag.
    pub toggle_connection_rate: f64,
    /// When true, each mutation pass picks a single operator uniformly
    /// and applies only its gate; otherwise every operator's gate is
    /// rolled independently.
    pub single_mutation: bool,

    // Reproduction.
    /// Chance an offspring is produced by crossover rather than
    /// cloning or fresh initialization.
    pub crossover_rate: f64,
    /// Which crossover operator to use.
    pub crossover_kind: CrossoverKind,
    /// Number of toggle points for [`CrossoverKind::Multipoint`].
    pub crossover_points: usize,
    /// How survivors are selected within a species.
    pub culling_method: CullingMethod,
    /// How parents are paired for crossover.
    pub pairing_strategy: PairingStrategy,

    // Observability.
    /// Emit per-generation progress at info level.
    pub verbose: bool,
    /// Generations between population checkpoints. Zero disables
    /// checkpointing.
    pub checkpoint_interval: u64,
    /// Directory for checkpoints and saved genomes.
    pub output_directory: PathBuf,
    /// Log evaluation phase timings.
    pub log_evaluation: bool,
    /// Log per-generation fitness values.
    pub log_fitness: bool,
    /// Log genome summaries when new bests appear.
    pub log_genomes: bool,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            population_size: 137,
            max_generations: 1000,
            random_seed: 137,
            stopping_fitness: 0.0,
            reset_activations: true,
            num_threads: 16,
            reintroduce_best_genome: true,
            reintroduction_period: 25,
            num_inputs: 0,
            num_outputs: 0,
            num_hidden: 0,
            initial_topology: InitialTopology::None,
            initial_connection_probability: 0.6,
            speciation_distance_threshold: 12.75,
            excess_coefficient: 0.95,
            disjoint_coefficient: 0.75,
            matching_coefficient: 0.65,
            distance_exponent: 1.0,
            distance_method: DistanceMethod::Euclidean,
            species_elitism: 2,
            survival_rate: 0.8,
            max_stagnation: 27,
            choose_best_representative: false,
            min_species_size: 5,
            mutation_rate: 0.8,
            add_node_rate: 0.04,
            remove_node_rate: 0.0,
            add_connection_rate: 0.08,
            remove_connection_rate: 0.01,
            weight_mutation_rate: 0.6,
            weight_variance: 1.0,
            min_weight: -100.0,
            max_weight: 100.0,
            bias_mutation_rate: 0.5,
            bias_variance: 1.0,
            min_bias: -100.0,
            max_bias: 100.0,
            activation_mutation_rate: 0.02,
            default_activation: ActivationKind::Sigmoid,
            allowed_activations: vec![
                ActivationKind::Sigmoid,
                ActivationKind::Tanh,
                ActivationKind::ReLU,
                ActivationKind::Absolute,
                ActivationKind::Step,
                ActivationKind::Gaussian,
                ActivationKind::Inverse,
                ActivationKind::Linear,
                ActivationKind::BentIdentity,
                ActivationKind::Swish,
                ActivationKind::LeakyReLU,
                ActivationKind::BipolarSigmoid,
            ],
            aggregation_mutation_rate: 0.01,
            default_aggregation: AggregationKind::Product,
            allowed_aggregations: vec![
                AggregationKind::Mean,
                AggregationKind::Median,
                AggregationKind::Sum,
                AggregationKind::Max,
                AggregationKind::Min,
                AggregationKind::Count,
                AggregationKind::Product,
            ],
            toggle_connection_rate: 0.03,
            single_mutation: false,
            crossover_rate: 0.8,
            crossover_kind: CrossoverKind::SinglePoint,
            crossover_points: 2,
            culling_method: CullingMethod::Elitism,
            pairing_strategy: PairingStrategy::Random,
            verbose: false,
            checkpoint_interval: 10,
            output_directory: PathBuf::from("."),
            log_evaluation: false,
            log_fitness: false,
            log_genomes: false,
        }
    }
}

impl Config {
    /// Checks the configuration for values that would make a run
    /// meaningless.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: zero inputs, outputs or
    /// population, a probability outside `[0, 1]`, or an empty
    /// allowed-function set whose mutation is enabled.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_inputs == 0 {
            return Err(ConfigError::ZeroInputs);
        }
        if self.num_outputs == 0 {
            return Err(ConfigError::ZeroOutputs);
        }
        if self.population_size == 0 {
            return Err(ConfigError::ZeroPopulation);
        }
        let rates = [
            ("initial_connection_probability", self.initial_connection_probability),
            ("survival_rate", self.survival_rate),
            ("mutation_rate", self.mutation_rate),
            ("add_node_rate", self.add_node_rate),
            ("remove_node_rate", self.remove_node_rate),
            ("add_connection_rate", self.add_connection_rate),
            ("remove_connection_rate", self.remove_connection_rate),
            ("weight_mutation_rate", self.weight_mutation_rate),
            ("bias_mutation_rate", self.bias_mutation_rate),
            ("activation_mutation_rate", self.activation_mutation_rate),
            ("aggregation_mutation_rate", self.aggregation_mutation_rate),
            ("toggle_connection_rate", self.toggle_connection_rate),
            ("crossover_rate", self.crossover_rate),
        ];
        for (name, value) in rates {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::RateOutOfRange(name, value));
            }
        }
        if self.allowed_activations.is_empty() && self.activation_mutation_rate > 0.0 {
            return Err(ConfigError::EmptyActivationSet);
        }
        if self.allowed_aggregations.is_empty() && self.aggregation_mutation_rate > 0.0 {
            return Err(ConfigError::EmptyAggregationSet);
        }
        Ok(())
    }

    /// Number of input-kind nodes in a seeded genome, bias included.
    pub fn input_count(&self) -> usize {
        self.num_inputs + 1
    }

    /// Id of the bias node: the last input-kind id.
    pub fn bias_id(&self) -> Innovation {
        self.num_inputs as Innovation
    }

    /// Ids reserved by the initial topology, before any mutation.
    /// The innovation counter is seeded just past this.
    pub fn reserved_ids(&self) -> Innovation {
        (self.num_inputs + self.num_outputs + self.num_hidden + 1) as Innovation
    }
}

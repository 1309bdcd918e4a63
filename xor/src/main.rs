use neatwork::fitness::mean_absolute_error;
use neatwork::genomics::{AggregationKind, Config, Genome, InitialTopology};
use neatwork::networks::Network;
use neatwork::populations::{EvolutionLogger, ReportingLevel, Task, Trainer};

use log::info;

const CASES: [([f64; 2], f64); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

struct XorTask {
    config: Config,
}

impl Task for XorTask {
    fn num_inputs(&self) -> usize {
        2
    }

    fn num_outputs(&self) -> usize {
        1
    }

    fn evaluate(&self, genome: &Genome) -> f64 {
        let mut network = Network::new(genome, &self.config);
        let mut predictions = Vec::with_capacity(CASES.len());
        let mut targets = Vec::with_capacity(CASES.len());
        for (input, target) in CASES {
            predictions.push(network.evaluate(&input).map(|o| o[0]).unwrap_or(0.0));
            targets.push(target);
        }
        mean_absolute_error(&predictions, &targets)
    }
}

fn main() {
    env_logger::init();

    let config = Config {
        num_inputs: 2,
        num_outputs: 1,
        population_size: 150,
        max_generations: 200,
        stopping_fitness: 0.95,
        random_seed: 42,
        initial_topology: InitialTopology::Full,
        default_aggregation: AggregationKind::Sum,
        speciation_distance_threshold: 3.0,
        weight_variance: 2.0,
        verbose: true,
        ..Config::default()
    };

    let mut task = XorTask {
        config: config.clone(),
    };
    let mut trainer = Trainer::new(config).expect("valid configuration");
    let mut logger = EvolutionLogger::new(ReportingLevel::PopulationChampion);

    trainer.initialize();
    while trainer.continue_training() {
        trainer.evaluate_population(&task);
        logger.log(&trainer);
        trainer.check_for_stagnation();
        trainer.speciate_population();
        trainer.reproduce_species();
        trainer.mutate_offspring();
    }

    match trainer.best_genome() {
        Some(best) => {
            info!(
                "finished after {} generations with best fitness {:.6}",
                trainer.generation(),
                best.fitness(),
            );
            let mut network = Network::new(best, &task.config);
            for (input, target) in CASES {
                let output = network.evaluate(&input).map(|o| o[0]).unwrap_or(0.0);
                println!(
                    "xor({}, {}) = {:.4} (expected {})",
                    input[0], input[1], output, target,
                );
            }
            if let Err(error) = trainer.save_best_genome() {
                eprintln!("failed to save the best genome: {}", error);
            }
        }
        None => println!("no generations ran; nothing to report"),
    }
}

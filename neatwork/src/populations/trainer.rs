use crate::genomics::{
    distance, seed_genotype, Config, ConfigError, Genome, Genotype, InnovationRegistry,
};
use crate::populations::culling::{select_survivors, Candidate};
use crate::populations::pairing::plan_offspring;
use crate::populations::Species;

use ahash::RandomState;
use log::{debug, info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

use std::collections::{HashMap, HashSet};
use std::fs;
use std::io;
use std::path::Path;
use std::time::Instant;

/// A problem definition the trainer can evolve against.
///
/// `evaluate` scores a genome, higher being better; it is called from
/// parallel workers when `num_threads > 1`, so it must not mutate
/// shared state. Non-finite scores are recorded as `0.0`.
pub trait Task: Sync {
    /// Number of network inputs the task feeds, excluding the bias.
    fn num_inputs(&self) -> usize;

    /// Number of network outputs the task reads.
    fn num_outputs(&self) -> usize;

    /// Called once before the first generation.
    fn initialize(&mut self) {}

    /// Scores a genome against the task.
    fn evaluate(&self, genome: &Genome) -> f64;
}

/// The evolution driver.
///
/// Owns the population, the species list, the innovation registry and
/// the run's seeded random number generator, and advances them one
/// generation at a time: evaluate, detect stagnation, speciate, allot
/// offspring, cull, reproduce, mutate.
///
/// # Examples
/// ```no_run
/// use neatwork::genomics::{Config, Genome, InitialTopology};
/// use neatwork::networks::Network;
/// use neatwork::populations::{Task, Trainer};
///
/// struct Constant;
///
/// impl Task for Constant {
///     fn num_inputs(&self) -> usize { 1 }
///     fn num_outputs(&self) -> usize { 1 }
///     fn evaluate(&self, _genome: &Genome) -> f64 { 1.0 }
/// }
///
/// let config = Config {
///     num_inputs: 1,
///     num_outputs: 1,
///     initial_topology: InitialTopology::Full,
///     max_generations: 10,
///     ..Config::default()
/// };
/// let mut trainer = Trainer::new(config).unwrap();
/// let best = trainer.train(&mut Constant).unwrap();
/// assert_eq!(best.fitness(), 1.0);
/// ```
#[derive(Debug)]
pub struct Trainer {
    config: Config,
    population: Vec<Genome>,
    species: Vec<Species>,
    innovations: InnovationRegistry,
    best: Option<Genome>,
    generation: u64,
    next_genome_id: u64,
    next_species_id: u64,
    average_distance: f64,
    rng: ChaCha8Rng,
}

impl Trainer {
    /// Creates a trainer for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration cannot
    /// support a meaningful run.
    pub fn new(config: Config) -> Result<Trainer, ConfigError> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.random_seed);
        let innovations = InnovationRegistry::starting_at(config.reserved_ids());
        Ok(Trainer {
            population: Vec::new(),
            species: Vec::new(),
            innovations,
            best: None,
            generation: 0,
            next_genome_id: 0,
            next_species_id: 0,
            average_distance: 0.0,
            rng,
            config,
        })
    }

    /// Resets the trainer to generation zero with a freshly seeded
    /// population. Called by [`Trainer::train`]; only needed directly
    /// when stepping generations by hand.
    pub fn initialize(&mut self) {
        self.population.clear();
        self.species.clear();
        self.best = None;
        self.generation = 0;
        self.next_genome_id = 0;
        self.next_species_id = 0;
        self.average_distance = 0.0;
        self.rng = ChaCha8Rng::seed_from_u64(self.config.random_seed);
        self.innovations.reset(self.config.reserved_ids());
        self.fill_population();
        info!(
            "initialized population of {} genomes over {} reserved ids",
            self.population.len(),
            self.config.reserved_ids()
        );
    }

    /// Runs the generation loop until a stop condition fires, and
    /// returns the best genome seen.
    ///
    /// Stops when the generation budget is exhausted, or when the best
    /// fitness reaches `stopping_fitness` (if that is above zero).
    pub fn train<T: Task>(&mut self, task: &mut T) -> Option<&Genome> {
        self.initialize();
        task.initialize();
        if task.num_inputs() != self.config.num_inputs
            || task.num_outputs() != self.config.num_outputs
        {
            warn!(
                "task shape {}x{} does not match configured topology {}x{}",
                task.num_inputs(),
                task.num_outputs(),
                self.config.num_inputs,
                self.config.num_outputs,
            );
        }

        while self.continue_training() {
            self.evaluate_population(&*task);
            self.check_for_stagnation();
            self.speciate_population();
            if self.config.verbose {
                info!(
                    "generation {}: {} species, best fitness {:.6}, avg distance {:.4}",
                    self.generation,
                    self.species.len(),
                    self.best.as_ref().map(Genome::fitness).unwrap_or(0.0),
                    self.average_distance,
                );
            }
            self.reproduce_species();
            self.mutate_offspring();
            self.maybe_checkpoint();
        }
        self.best.as_ref()
    }

    /// Returns whether another generation should run.
    pub fn continue_training(&self) -> bool {
        if self.config.stopping_fitness > 0.0 {
            if let Some(best) = &self.best {
                if best.fitness() >= self.config.stopping_fitness {
                    return false;
                }
            }
        }
        !(self.config.max_generations > 0 && self.generation >= self.config.max_generations)
    }

    /// Scores every genome, updates the remembered best, and refreshes
    /// each species' adjusted fitness.
    pub fn evaluate_population<T: Task>(&mut self, task: &T) {
        let started = Instant::now();
        if self.config.num_threads > 1 {
            self.population.par_iter_mut().for_each(|genome| {
                let fitness = task.evaluate(genome);
                genome.set_fitness(fitness);
            });
        } else {
            for genome in &mut self.population {
                let fitness = task.evaluate(genome);
                genome.set_fitness(fitness);
            }
        }
        if self.config.log_evaluation {
            debug!(
                "generation {}: evaluated {} genomes in {:?}",
                self.generation,
                self.population.len(),
                started.elapsed(),
            );
        }

        if let Some(candidate) = self
            .population
            .iter()
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
        {
            let improved = self
                .best
                .as_ref()
                .is_none_or(|best| candidate.fitness() > best.fitness());
            if improved {
                if self.config.log_fitness || self.config.verbose {
                    info!(
                        "generation {}: new best fitness {:.6} (genome {})",
                        self.generation,
                        candidate.fitness(),
                        candidate.id(),
                    );
                }
                if self.config.log_genomes {
                    debug!("new best genome: {}", candidate);
                }
                self.best = Some(candidate.clone());
            }
        }

        let index = self.index_by_id();
        for species in &mut self.species {
            if species.members.is_empty() {
                species.adjusted_fitness = 0.0;
                continue;
            }
            let sum: f64 = species
                .members
                .iter()
                .map(|id| self.population[index[id]].fitness())
                .sum();
            species.adjusted_fitness = sum / species.members.len() as f64;
        }
        for species in &self.species {
            for id in &species.members {
                self.population[index[id]].adjusted_fitness = species.adjusted_fitness;
            }
        }
    }

    /// Advances stagnation counters and purges species that have run
    /// out of patience, except when only one species remains.
    ///
    /// An emptied population is recovered by reseeding from the
    /// initial topology.
    pub fn check_for_stagnation(&mut self) {
        let overcrowded = self.population.len() > 2 * self.config.population_size;
        for species in &mut self.species {
            if species.is_stagnant {
                continue;
            }
            if species.adjusted_fitness > species.best_adjusted_fitness {
                species.best_adjusted_fitness = species.adjusted_fitness;
                species.stagnation = 0;
            } else if species.representative.is_none() {
                species.is_stagnant = true;
            } else {
                species.stagnation += 1;
                if overcrowded && species.stagnation >= self.config.max_stagnation / 3 {
                    species.is_stagnant = true;
                } else if species.stagnation >= self.config.max_stagnation {
                    species.is_stagnant = true;
                }
            }
        }

        // Purging the last species would empty the population mid
        // generation, so a lone stagnant species is left standing.
        if self.species.len() <= 1 {
            return;
        }

        let doomed: HashSet<u64> = self
            .species
            .iter()
            .filter(|s| s.is_stagnant)
            .flat_map(|s| s.members.iter().copied())
            .collect();
        if !doomed.is_empty() {
            debug!(
                "purging {} genomes from {} stagnant species",
                doomed.len(),
                self.species.iter().filter(|s| s.is_stagnant).count(),
            );
        }
        self.population.retain(|g| !doomed.contains(&g.id()));
        self.species
            .retain(|s| !s.is_stagnant && !(s.representative.is_none() && s.members.is_empty()));

        if self.population.is_empty() {
            warn!("population went extinct; reseeding from the initial topology");
            self.species.clear();
            self.fill_population();
        }
    }

    /// Reassigns every genome to a species by distance against the
    /// species representatives, creating new species for genomes that
    /// fit nowhere.
    ///
    /// Placement scans species in id order and takes the first one
    /// within the threshold, so runs are reproducible under a fixed
    /// seed.
    pub fn speciate_population(&mut self) {
        if self.population.is_empty() {
            return;
        }
        if self.species.is_empty() {
            let id = self.alloc_species_id();
            let first = self.population[0].clone();
            self.species.push(Species::new(id, first));
        }

        // Each surviving species re-picks its representative from the
        // current membership, then releases all members for placement.
        let index = self.index_by_id();
        let mut chosen: Vec<Option<Genome>> = Vec::with_capacity(self.species.len());
        for species in &self.species {
            if species.members.is_empty() {
                chosen.push(None);
                continue;
            }
            let id = if self.config.choose_best_representative {
                *species
                    .members
                    .iter()
                    .max_by(|a, b| {
                        self.population[index[*a]]
                            .fitness()
                            .total_cmp(&self.population[index[*b]].fitness())
                    })
                    .unwrap()
            } else {
                species.members[self.rng.gen_range(0..species.members.len())]
            };
            chosen.push(Some(self.population[index[&id]].clone()));
        }
        for (species, representative) in self.species.iter_mut().zip(chosen) {
            if let Some(representative) = representative {
                species.representative = Some(representative);
            }
            species.members.clear();
        }

        let threshold = self.config.speciation_distance_threshold;
        let mut distance_sum = 0.0;
        let mut calculations = 0usize;
        for pi in 0..self.population.len() {
            let mut placed = None;
            for si in 0..self.species.len() {
                let Some(representative) = self.species[si].representative.as_ref() else {
                    continue;
                };
                let d = distance(representative, &self.population[pi], &self.config);
                distance_sum += d;
                calculations += 1;
                if d < threshold {
                    placed = Some(si);
                    break;
                }
            }
            match placed {
                Some(si) => {
                    self.species[si].members.push(self.population[pi].id());
                    self.population[pi].species_id = self.species[si].id;
                }
                None => {
                    let species_id = self.alloc_species_id();
                    let mut species = Species::new(species_id, self.population[pi].clone());
                    species.members.push(self.population[pi].id());
                    self.population[pi].species_id = species_id;
                    self.species.push(species);
                }
            }
        }
        self.average_distance = if calculations > 0 {
            distance_sum / calculations as f64
        } else {
            0.0
        };
    }

    /// Allots offspring, promotes elites, culls each species and
    /// breeds it back up to its quota, then commits the new
    /// population and advances the generation counter.
    pub fn reproduce_species(&mut self) {
        self.update_reproduction_counts();
        self.promote_elite_genomes();
        self.cull_species();
        self.generate_offspring();
        self.commit_population();
    }

    /// Splits the next generation's population among species in
    /// proportion to adjusted fitness, with a floor of
    /// `min_species_size` each.
    fn update_reproduction_counts(&mut self) {
        if self.species.is_empty() {
            return;
        }
        let target = self.config.population_size;
        let floor = self.config.min_species_size;

        if self.species.len() * floor > target {
            // Oversubscribed: every species gets the minimum and the
            // population temporarily runs above target.
            for species in &mut self.species {
                species.desired_pop = floor;
            }
            return;
        }

        // Shift adjusted fitnesses so none is negative before
        // computing proportions.
        let minimum = self
            .species
            .iter()
            .map(|s| s.adjusted_fitness)
            .fold(0.0, f64::min);
        let shift = -minimum.min(0.0);
        for species in &mut self.species {
            species.adjusted_fitness += shift;
        }

        let total: f64 = self.species.iter().map(|s| s.adjusted_fitness).sum();
        let total = total.max(0.0);
        for species in &mut self.species {
            species.desired_pop = if total != 0.0 {
                let share = species.adjusted_fitness / total * target as f64;
                (share.floor() as usize).max(floor)
            } else {
                floor
            };
        }

        let mut allotted: usize = self.species.iter().map(|s| s.desired_pop).sum();
        let mut remaining = target.saturating_sub(allotted);
        'grant: while remaining > 0 {
            for species in &mut self.species {
                if remaining == 0 {
                    break 'grant;
                }
                species.desired_pop += 1;
                allotted += 1;
                remaining -= 1;
            }
        }

        // The per-species floor can push the total over target; walk
        // it back round-robin from species with slack.
        'trim: while allotted > target {
            let mut changed = false;
            for species in &mut self.species {
                if allotted == target {
                    break 'trim;
                }
                if species.desired_pop > floor {
                    species.desired_pop -= 1;
                    allotted -= 1;
                    changed = true;
                }
            }
            if !changed {
                break;
            }
        }
    }

    /// Clears all elite flags, then marks the top `species_elitism`
    /// members of each species. Member lists come out sorted
    /// best-first.
    fn promote_elite_genomes(&mut self) {
        for genome in &mut self.population {
            genome.elite = false;
        }
        let index = self.index_by_id();
        let elitism = self.config.species_elitism;
        let mut elite_ids = Vec::new();
        for species in &mut self.species {
            if species.members.is_empty() {
                continue;
            }
            species.members.sort_by(|a, b| {
                self.population[index[b]]
                    .fitness()
                    .total_cmp(&self.population[index[a]].fitness())
            });
            elite_ids.extend(species.members.iter().take(elitism).copied());
        }
        for id in elite_ids {
            self.population[index[&id]].elite = true;
        }
    }

    /// Shrinks each species to its survivor count using the
    /// configured culling method. Species at or below the minimum
    /// size are left alone.
    fn cull_species(&mut self) {
        let index = self.index_by_id();
        let method = self.config.culling_method;
        let floor = self.config.min_species_size;
        let elitism = self.config.species_elitism;
        let survival = self.config.survival_rate;
        for species in &mut self.species {
            if species.members.len() <= floor {
                continue;
            }
            let mut candidates: Vec<Candidate> = species
                .members
                .iter()
                .map(|id| {
                    let genome = &self.population[index[id]];
                    Candidate {
                        id: *id,
                        fitness: genome.fitness(),
                        elite: genome.is_elite(),
                    }
                })
                .collect();
            candidates
                .sort_by(|a, b| b.fitness.total_cmp(&a.fitness).then(b.id.cmp(&a.id)));
            let keep = ((species.members.len() as f64 * survival).floor() as usize)
                .max(floor)
                .max(elitism)
                .min(species.members.len());
            species.members = select_survivors(&candidates, keep, method, &mut self.rng);
        }
    }

    /// Breeds every underpopulated species back up to its quota.
    fn generate_offspring(&mut self) {
        let index = self.index_by_id();
        for si in 0..self.species.len() {
            if self.species[si].members.is_empty() {
                continue;
            }
            let count = self.species[si]
                .desired_pop
                .saturating_sub(self.species[si].members.len());
            if count == 0 {
                continue;
            }
            let members: Vec<&Genome> = self.species[si]
                .members
                .iter()
                .map(|id| &self.population[index[id]])
                .collect();
            let plans = plan_offspring(&members, count, &self.config, &mut self.rng);
            drop(members);

            let species_id = self.species[si].id;
            for plan in plans {
                self.next_genome_id += 1;
                let mut child =
                    plan.realize(self.next_genome_id, &self.config, &self.innovations, &mut self.rng);
                child.species_id = species_id;
                self.species[si].members.push(child.id());
                self.population.push(child);
            }
        }
    }

    /// Rebuilds the population as the union of the species member
    /// lists, advances the generation, and reinjects the best genome
    /// on its configured period.
    fn commit_population(&mut self) {
        let mut by_id: HashMap<u64, Genome, RandomState> =
            self.population.drain(..).map(|g| (g.id(), g)).collect();
        let mut next = Vec::with_capacity(self.config.population_size);
        for species in &self.species {
            for id in &species.members {
                if let Some(genome) = by_id.remove(id) {
                    next.push(genome);
                }
            }
        }
        self.population = next;
        self.generation += 1;

        if self.config.reintroduce_best_genome
            && self.config.reintroduction_period > 0
            && self.generation % self.config.reintroduction_period == 0
        {
            if let Some(best) = &self.best {
                let mut clone = best.clone();
                self.next_genome_id += 1;
                clone.id = self.next_genome_id;
                clone.species_id = 0;
                clone.elite = false;
                debug!(
                    "generation {}: reintroducing best genome as {}",
                    self.generation,
                    clone.id(),
                );
                self.population.push(clone);
            }
        }
    }

    /// Rolls the mutation gate for every non-elite genome.
    pub fn mutate_offspring(&mut self) {
        for gi in 0..self.population.len() {
            if self.population[gi].elite {
                continue;
            }
            if self.rng.gen::<f64>() >= self.config.mutation_rate {
                continue;
            }
            self.population[gi]
                .genotype
                .mutate(&self.config, &self.innovations, &mut self.rng);
        }
    }

    /// Replaces the population with clones of a single genome and
    /// re-speciates. Mutation differentiates the clones afterwards.
    pub fn repopulate_from(&mut self, genome: &Genome) {
        self.population.clear();
        self.species.clear();
        for _ in 0..self.config.population_size {
            self.next_genome_id += 1;
            let mut clone = genome.clone();
            clone.id = self.next_genome_id;
            clone.species_id = 0;
            clone.elite = false;
            clone.fitness = 0.0;
            self.population.push(clone);
        }
        self.speciate_population();
    }

    fn fill_population(&mut self) {
        for _ in 0..self.config.population_size {
            self.next_genome_id += 1;
            let genotype = seed_genotype(&self.config, &self.innovations, &mut self.rng);
            self.population.push(Genome::new(self.next_genome_id, genotype));
        }
    }

    fn alloc_species_id(&mut self) -> u64 {
        self.next_species_id += 1;
        self.next_species_id
    }

    fn index_by_id(&self) -> HashMap<u64, usize, RandomState> {
        self.population
            .iter()
            .enumerate()
            .map(|(index, genome)| (genome.id(), index))
            .collect()
    }

    fn maybe_checkpoint(&self) {
        let interval = self.config.checkpoint_interval;
        if interval == 0 || self.generation % interval != 0 {
            return;
        }
        let path = self
            .config
            .output_directory
            .join(format!("checkpoint_{:06}.ron", self.generation));
        match ron::to_string(&self.population) {
            Ok(snapshot) => {
                if let Err(error) = fs::write(&path, snapshot) {
                    warn!("failed to write checkpoint {}: {}", path.display(), error);
                } else {
                    debug!("wrote checkpoint {}", path.display());
                }
            }
            Err(error) => warn!("failed to serialize checkpoint: {}", error),
        }
    }

    /// Writes a genome to a file in the keyed-text format, after
    /// pruning and compacting its gene ids.
    pub fn save_genome(path: &Path, genome: &Genome) -> io::Result<()> {
        let mut genotype = genome.genotype().clone();
        genotype.prune();
        genotype.reduce_gene_keys();
        fs::write(path, genotype.serialize())
    }

    /// Writes the best genome seen so far to `best_genome.txt` in the
    /// output directory. Does nothing if no genome has been evaluated.
    pub fn save_best_genome(&self) -> io::Result<()> {
        match &self.best {
            Some(best) => {
                let path = self.config.output_directory.join("best_genome.txt");
                Self::save_genome(&path, best)
            }
            None => Ok(()),
        }
    }

    /// Loads a genome from a keyed-text file, assigning it a fresh id.
    /// A malformed file is skipped rather than treated as fatal.
    pub fn load_genome(&mut self, path: &Path) -> io::Result<Option<Genome>> {
        let text = fs::read_to_string(path)?;
        match Genotype::deserialize(&text) {
            Ok(genotype) => {
                self.next_genome_id += 1;
                Ok(Some(Genome::new(self.next_genome_id, genotype)))
            }
            Err(error) => {
                warn!("skipping malformed genome {}: {}", path.display(), error);
                Ok(None)
            }
        }
    }

    /// Writes the whole population to a file as `---` separated
    /// keyed-text records.
    pub fn save_population(&self, path: &Path) -> io::Result<()> {
        let mut out = String::new();
        for genome in &self.population {
            out.push_str("---\n");
            out.push_str(&genome.genotype().serialize());
        }
        fs::write(path, out)
    }

    /// Appends genomes from a `---` separated keyed-text file to the
    /// population, skipping malformed records. Returns the number of
    /// genomes loaded.
    pub fn load_population(&mut self, path: &Path) -> io::Result<usize> {
        let text = fs::read_to_string(path)?;
        let mut loaded = 0;
        for record in text.split("---\n").filter(|r| !r.trim().is_empty()) {
            match Genotype::deserialize(record) {
                Ok(genotype) => {
                    self.next_genome_id += 1;
                    self.population
                        .push(Genome::new(self.next_genome_id, genotype));
                    loaded += 1;
                }
                Err(error) => warn!("skipping malformed genome record: {}", error),
            }
        }
        Ok(loaded)
    }

    /// Returns the trainer's configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns an iterator over the current population.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.population.iter()
    }

    /// Returns an iterator over the current species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns the best genome seen so far.
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best.as_ref()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the mean speciation distance measured during the last
    /// placement pass. Telemetry only.
    pub fn average_distance(&self) -> f64 {
        self.average_distance
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fitness::mean_absolute_error;
    use crate::genomics::InitialTopology;
    use crate::networks::Network;

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
            let cases = [
                ([0.0, 0.0], 0.0),
                ([0.0, 1.0], 1.0),
                ([1.0, 0.0], 1.0),
                ([1.0, 1.0], 0.0),
            ];
            let mut predictions = Vec::with_capacity(cases.len());
            let mut targets = Vec::with_capacity(cases.len());
            for (input, target) in cases {
                let output = network.evaluate(&input).map(|o| o[0]).unwrap_or(0.0);
                predictions.push(output);
                targets.push(target);
            }
            mean_absolute_error(&predictions, &targets)
        }
    }

    fn xor_config() -> Config {
        Config {
            num_inputs: 2,
            num_outputs: 1,
            population_size: 60,
            max_generations: 10,
            num_threads: 1,
            initial_topology: InitialTopology::Full,
            default_aggregation: crate::genomics::AggregationKind::Sum,
            speciation_distance_threshold: 3.0,
            remove_node_rate: 0.02,
            reintroduce_best_genome: false,
            checkpoint_interval: 0,
            ..Config::default()
        }
    }

    fn xor_task(config: &Config) -> XorTask {
        XorTask {
            config: config.clone(),
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        assert!(Trainer::new(Config::default()).is_err());
        assert!(Trainer::new(xor_config()).is_ok());
    }

    #[test]
    fn generation_invariants_hold_while_stepping() {
        let config = xor_config();
        let task = xor_task(&config);
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();

        for _ in 0..6 {
            trainer.evaluate_population(&task);
            trainer.check_for_stagnation();
            trainer.speciate_population();

            // Every genome sits in exactly one species.
            let member_total: usize = trainer.species.iter().map(|s| s.members.len()).sum();
            assert_eq!(member_total, trainer.population.len());
            for genome in &trainer.population {
                assert_ne!(genome.species_id(), 0);
            }

            trainer.reproduce_species();
            trainer.mutate_offspring();

            // Connection endpoints always resolve to live nodes.
            for genome in &trainer.population {
                for connection in genome.genotype().connections() {
                    for end in [connection.input(), connection.output()] {
                        let node = genome.genotype().node(end);
                        assert!(node.is_some_and(|n| n.enabled()));
                    }
                }
            }
            // Species keeping more survivors than their quota can push
            // the census above target, but never collapse it.
            assert!(trainer.population.len() >= trainer.config.population_size / 2);
            assert!(trainer.population.len() <= trainer.config.population_size * 2);
        }
    }

    #[test]
    fn best_fitness_is_monotonic() {
        let config = xor_config();
        let task = xor_task(&config);
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();

        let mut previous = 0.0;
        for _ in 0..8 {
            trainer.evaluate_population(&task);
            let best = trainer.best_genome().unwrap().fitness();
            assert!(best >= previous);
            previous = best;
            trainer.check_for_stagnation();
            trainer.speciate_population();
            trainer.reproduce_species();
            trainer.mutate_offspring();
        }
    }

    #[test]
    fn train_finds_a_scoring_genome() {
        let config = xor_config();
        let mut task = xor_task(&config);
        let mut trainer = Trainer::new(config).unwrap();
        let best = trainer.train(&mut task).expect("a best genome");
        assert!(best.fitness() > 0.25);
        assert!(best.fitness() <= 1.0);
    }

    #[test]
    fn identical_seeds_give_identical_runs() {
        let run = || {
            let config = Config {
                random_seed: 99,
                max_generations: 5,
                ..xor_config()
            };
            let mut task = xor_task(&config);
            let mut trainer = Trainer::new(config).unwrap();
            trainer.train(&mut task);
            let best = trainer.best_genome().unwrap();
            let fitnesses: Vec<u64> = trainer
                .genomes()
                .map(|g| g.fitness().to_bits())
                .collect();
            (best.genotype().serialize(), best.fitness().to_bits(), fitnesses)
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn stopping_fitness_halts_the_run() {
        let config = Config {
            stopping_fitness: 0.05,
            max_generations: 50,
            ..xor_config()
        };
        let mut task = xor_task(&config);
        let mut trainer = Trainer::new(config).unwrap();
        trainer.train(&mut task);
        // Any genome clears a 0.05 bar immediately.
        assert_eq!(trainer.generation(), 1);
    }

    #[test]
    fn stagnant_species_are_purged_and_population_recovers() {
        let config = Config {
            max_stagnation: 3,
            population_size: 20,
            ..xor_config()
        };
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();

        let ids: Vec<u64> = trainer.genomes().map(Genome::id).collect();
        let mut first = Species::new(1, trainer.population[0].clone());
        first.members = ids[..10].to_vec();
        first.best_adjusted_fitness = 1.0;
        let mut second = Species::new(2, trainer.population[10].clone());
        second.members = ids[10..].to_vec();
        second.best_adjusted_fitness = 1.0;
        trainer.species = vec![first, second];
        trainer.next_species_id = 2;

        for _ in 0..4 {
            // A constant score never beats the recorded best.
            for species in &mut trainer.species {
                species.adjusted_fitness = 0.5;
            }
            trainer.check_for_stagnation();
        }

        assert!(trainer.species.is_empty());
        assert_eq!(trainer.population.len(), 20);
    }

    #[test]
    fn the_last_species_is_never_purged() {
        let config = Config {
            max_stagnation: 2,
            population_size: 10,
            ..xor_config()
        };
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();

        let ids: Vec<u64> = trainer.genomes().map(Genome::id).collect();
        let mut only = Species::new(1, trainer.population[0].clone());
        only.members = ids;
        only.best_adjusted_fitness = 1.0;
        trainer.species = vec![only];
        trainer.next_species_id = 1;

        for _ in 0..5 {
            trainer.species[0].adjusted_fitness = 0.5;
            trainer.check_for_stagnation();
        }

        assert_eq!(trainer.species.len(), 1);
        assert!(trainer.species[0].is_stagnant());
        assert_eq!(trainer.population.len(), 10);
    }

    #[test]
    fn offspring_quotas_sum_to_the_population_target() {
        let config = Config {
            population_size: 20,
            min_species_size: 2,
            ..xor_config()
        };
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();
        trainer.species = vec![
            Species::new(1, trainer.population[0].clone()),
            Species::new(2, trainer.population[1].clone()),
            Species::new(3, trainer.population[2].clone()),
        ];
        trainer.species[0].adjusted_fitness = 1.0;
        trainer.species[1].adjusted_fitness = 1.0;
        trainer.species[2].adjusted_fitness = 1.0;

        trainer.update_reproduction_counts();

        let quotas: Vec<usize> = trainer.species.iter().map(|s| s.desired_pop).collect();
        assert_eq!(quotas.iter().sum::<usize>(), 20);
        // Equal fitness splits evenly, with round-robin slack first.
        assert_eq!(quotas, vec![7, 7, 6]);
    }

    #[test]
    fn dominant_species_is_trimmed_back_to_target() {
        let config = Config {
            population_size: 20,
            min_species_size: 5,
            ..xor_config()
        };
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();
        trainer.species = (0..4)
            .map(|i| Species::new(i as u64 + 1, trainer.population[i].clone()))
            .collect();
        trainer.species[0].adjusted_fitness = 10.0;
        for species in trainer.species.iter_mut().skip(1) {
            species.adjusted_fitness = 0.001;
        }

        trainer.update_reproduction_counts();

        let quotas: Vec<usize> = trainer.species.iter().map(|s| s.desired_pop).collect();
        assert_eq!(quotas.iter().sum::<usize>(), 20);
        assert!(quotas.iter().all(|q| *q >= 5));
    }

    #[test]
    fn oversubscribed_species_all_get_the_minimum() {
        let config = Config {
            population_size: 20,
            min_species_size: 5,
            ..xor_config()
        };
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();
        trainer.species = (0..5)
            .map(|i| Species::new(i as u64 + 1, trainer.population[i].clone()))
            .collect();

        trainer.update_reproduction_counts();

        assert!(trainer.species.iter().all(|s| s.desired_pop == 5));
    }

    #[test]
    fn elites_survive_reproduction_unmutated() {
        let config = Config {
            mutation_rate: 1.0,
            weight_mutation_rate: 1.0,
            species_elitism: 2,
            ..xor_config()
        };
        let task = xor_task(&config);
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();

        trainer.evaluate_population(&task);
        trainer.check_for_stagnation();
        trainer.speciate_population();
        trainer.reproduce_species();

        let elites: Vec<(u64, Genotype)> = trainer
            .genomes()
            .filter(|g| g.is_elite())
            .map(|g| (g.id(), g.genotype().clone()))
            .collect();
        assert!(!elites.is_empty());

        trainer.mutate_offspring();

        for (id, genotype) in elites {
            let after = trainer.genomes().find(|g| g.id() == id).unwrap();
            assert_eq!(after.genotype(), &genotype);
        }
    }

    #[test]
    fn reintroduction_injects_an_unspeciated_clone() {
        let config = Config {
            reintroduce_best_genome: true,
            reintroduction_period: 1,
            ..xor_config()
        };
        let task = xor_task(&config);
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();

        trainer.evaluate_population(&task);
        trainer.check_for_stagnation();
        trainer.speciate_population();
        trainer.reproduce_species();

        assert_eq!(
            trainer.population.len(),
            trainer.config.population_size + 1
        );
        let injected = trainer.population.last().unwrap();
        assert_eq!(injected.species_id(), 0);
        assert_eq!(
            injected.genotype(),
            trainer.best_genome().unwrap().genotype()
        );
    }

    #[test]
    fn population_save_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.txt");

        let config = xor_config();
        let mut trainer = Trainer::new(config.clone()).unwrap();
        trainer.initialize();
        trainer.save_population(&path).unwrap();

        let mut fresh = Trainer::new(config).unwrap();
        let loaded = fresh.load_population(&path).unwrap();
        assert_eq!(loaded, trainer.population.len());
        assert_eq!(
            fresh.population[0].genotype(),
            trainer.population[0].genotype()
        );
    }

    #[test]
    fn malformed_population_records_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("population.txt");

        let config = xor_config();
        let mut trainer = Trainer::new(config.clone()).unwrap();
        trainer.initialize();
        trainer.save_population(&path).unwrap();

        let mut text = fs::read_to_string(&path).unwrap();
        text.push_str("---\nnot a genome\n");
        fs::write(&path, text).unwrap();

        let mut fresh = Trainer::new(config).unwrap();
        let loaded = fresh.load_population(&path).unwrap();
        assert_eq!(loaded, trainer.population.len());
    }

    #[test]
    fn saved_genomes_are_pruned_and_compacted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genome.txt");

        let config = xor_config();
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();
        let genome = trainer.population[0].clone();
        Trainer::save_genome(&path, &genome).unwrap();

        let loaded = trainer.load_genome(&path).unwrap().unwrap();
        let ids = loaded.genotype().node_ids();
        // Compacted node ids run 0..n with no gaps.
        assert_eq!(ids, (0..ids.len() as u64).collect::<Vec<_>>());
        assert_eq!(
            loaded.genotype().connection_count(),
            genome.genotype().connection_count()
        );
    }

    #[test]
    fn checkpoints_are_written_on_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            checkpoint_interval: 1,
            max_generations: 3,
            output_directory: dir.path().to_path_buf(),
            ..xor_config()
        };
        let mut task = xor_task(&config);
        let mut trainer = Trainer::new(config).unwrap();
        trainer.train(&mut task);

        for generation in 1..=3 {
            let path = dir
                .path()
                .join(format!("checkpoint_{:06}.ron", generation));
            assert!(path.exists(), "missing {}", path.display());
        }
    }

    #[test]
    fn repopulate_from_clones_a_template() {
        let config = xor_config();
        let mut trainer = Trainer::new(config).unwrap();
        trainer.initialize();
        let template = trainer.population[0].clone();

        trainer.repopulate_from(&template);

        assert_eq!(trainer.population.len(), trainer.config.population_size);
        for genome in trainer.genomes() {
            assert_eq!(genome.genotype(), template.genotype());
            assert_ne!(genome.id(), template.id());
        }
        // Identical clones all land in one species.
        assert_eq!(trainer.species.len(), 1);
    }
}

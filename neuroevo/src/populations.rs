//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod species;

use crate::{Genome, InnovationHistory};
pub use config::{OffspringAllotment, PopulationConfig};
pub use errors::EvolutionError;
use offspring_factory::OffspringFactory;
pub use species::{Member, Species, SpeciesID};

use log::{debug, error, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// A population of genomes.
///
/// The population owns its random number generator,
/// so a population created through [`Population::with_seed`]
/// evolves identically on every run.
#[derive(Clone, Serialize, Deserialize)]
pub struct Population<C, H, G> {
    species: Vec<Species<G>>,
    history: H,
    rng: ChaCha8Rng,
    generation: usize,
    species_count: usize,
    distance_threshold: f32,
    highest_fitness: f32,
    generations_without_improvement: usize,
    leftover: f32,
    population_config: PopulationConfig,
    genetic_config: C,
}

impl<C, H, G> Population<C, H, G>
where
    H: InnovationHistory<Config = C>,
    G: Genome<InnovationHistory = H, Config = C> + Clone,
{
    /// Creates a new population using the passed configurations,
    /// seeded from system entropy.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// [`Genome`]: crate::Genome
    ///
    /// # Examples
    /// ```
    /// use neuroevo::{Population, PopulationConfig};
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use std::num::NonZeroUsize;
    ///
    /// let pop_config = PopulationConfig::with_size(NonZeroUsize::new(30).unwrap());
    /// let genetic_config = GeneticConfig::with_shape(3, 2);
    ///
    /// // Any `Genome` will do; here, the neural network genome.
    /// let population = Population::<_, _, G>::new(pop_config, genetic_config);
    /// assert_eq!(population.genomes().count(), 30);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: C) -> Population<C, H, G> {
        Self::with_rng(population_config, genetic_config, ChaCha8Rng::from_entropy())
    }

    /// Creates a new population whose random decisions
    /// are all drawn from a generator seeded with `seed`.
    pub fn with_seed(
        population_config: PopulationConfig,
        genetic_config: C,
        seed: u64,
    ) -> Population<C, H, G> {
        Self::with_rng(
            population_config,
            genetic_config,
            ChaCha8Rng::seed_from_u64(seed),
        )
    }

    fn with_rng(
        population_config: PopulationConfig,
        genetic_config: C,
        mut rng: ChaCha8Rng,
    ) -> Population<C, H, G> {
        let mut history = H::new(&genetic_config);
        let genomes: Vec<G> = (0..population_config.size.get())
            .map(|_| G::new(&genetic_config, &mut history, &mut rng))
            .collect();
        let mut population = Population {
            species: vec![],
            history,
            rng,
            generation: 0,
            species_count: 0,
            distance_threshold: population_config.distance_threshold,
            highest_fitness: 0.0,
            generations_without_improvement: 0,
            leftover: 0.0,
            population_config,
            genetic_config,
        };
        for genome in genomes {
            population.speciate(genome, None);
        }
        population
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator.
    ///
    /// Evaluators receive a mutable reference so that
    /// genomes may run their networks. Negative and NaN
    /// fitness values are clamped to 0.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::{Population, PopulationConfig};
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome};
    ///
    /// let mut population = Population::<_, _, NNGenome>::with_seed(
    ///     PopulationConfig::default(),
    ///     GeneticConfig::with_shape(2, 2),
    ///     7,
    /// );
    ///
    /// population.evaluate_fitness(|g| {
    ///     // Networks preferring the first action are given higher scores.
    ///     match g.activate(&[1.0, 0.0]) {
    ///         Ok(output) => output.classification[0],
    ///         Err(_) => 0.0,
    ///     }
    /// });
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&mut G) -> f32,
    {
        for member in self.species.iter_mut().flat_map(|s| &mut s.members) {
            let fitness = sanitize_fitness(evaluator(&mut member.genome));
            member.genome.set_fitness(fitness);
        }
    }

    /// Like [`evaluate_fitness`], but evaluates genomes
    /// concurrently on rayon's global thread pool.
    ///
    /// [`evaluate_fitness`]: Population::evaluate_fitness
    pub fn evaluate_fitness_par<E>(&mut self, evaluator: E)
    where
        G: Send,
        E: Fn(&mut G) -> f32 + Sync,
    {
        self.species
            .par_iter_mut()
            .flat_map(|s| s.members.par_iter_mut())
            .for_each(|member| {
                let fitness = sanitize_fitness(evaluator(&mut member.genome));
                member.genome.set_fitness(fitness);
            });
    }

    /// Evolves the population by one generation: fitness is shared
    /// within species, offspring quotas are computed and every species
    /// breeds its quota, after which the offspring are speciated and
    /// replace the current generation.
    ///
    /// Fitness must have been assigned to every genome beforehand.
    ///
    /// # Errors
    /// Returns an error if the population is empty or degenerate
    /// (its average shared fitness is not a positive number), if
    /// mating fails, or if the species with the largest quota did not
    /// survive breeding.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::{Population, PopulationConfig};
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::<_, _, NNGenome>::with_seed(
    ///     PopulationConfig::with_size(NonZeroUsize::new(20).unwrap()),
    ///     GeneticConfig::with_shape(2, 1),
    ///     3,
    /// );
    ///
    /// population.evaluate_fitness(|g| g.connections().count() as f32);
    ///
    /// if let Err(e) = population.evolve() {
    ///     eprintln!("{}", e);
    /// }
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.genomes().count(), 20);
    /// ```
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        if self.species.iter().all(Species::is_empty) {
            return Err(EvolutionError::EmptyPopulation);
        }

        self.adapt_distance_threshold();
        for species in &mut self.species {
            species.adjust_fitness(&self.population_config);
        }
        self.assign_expected_offspring()?;
        self.allot_offspring();
        self.mark_population_champion();
        self.track_improvement();
        self.species.sort_by(species::by_decreasing_offspring);

        let best_species = self.species.first().map(Species::id);
        for species in &mut self.species {
            species.remove_marked();
        }

        let offspring = OffspringFactory::new(
            &self.species,
            &mut self.history,
            &self.genetic_config,
            &self.population_config,
            &mut self.rng,
        )
        .generate_offspring()?;

        self.replace_generation(offspring);

        debug!(
            "generation {}: {} species, threshold {:.2}, sizes {:?}",
            self.generation,
            self.species.len(),
            self.distance_threshold,
            self.species.iter().map(Species::len).collect::<Vec<_>>()
        );

        if let Some(best) = best_species {
            if !self.species.iter().any(|s| s.id() == best) {
                error!("best species {:?} died out during breeding", best);
                return Err(EvolutionError::LostBestSpecies(best));
            }
        }

        self.history.new_generation();
        self.generation += 1;
        Ok(())
    }

    /// Moves the compatibility threshold towards
    /// the configured target species count.
    fn adapt_distance_threshold(&mut self) {
        let target = self.population_config.target_species_count;
        if target == 0 || self.generation <= 1 {
            return;
        }
        let step = self.population_config.distance_threshold_step;
        if self.species.len() < target {
            self.distance_threshold -= step;
        } else if self.species.len() > target {
            self.distance_threshold += step;
        }
        self.distance_threshold = self
            .distance_threshold
            .max(self.population_config.min_distance_threshold);
    }

    /// Sets every member's expected offspring to its shared
    /// fitness relative to the population average.
    fn assign_expected_offspring(&mut self) -> Result<(), EvolutionError> {
        let (total, count) = self
            .species
            .iter()
            .flat_map(|s| s.members())
            .fold((0.0, 0usize), |(t, c), m| (t + m.adjusted_fitness, c + 1));
        let average = total / count as f32;
        if !(average > 0.0 && average.is_finite()) {
            return Err(EvolutionError::DegeneratePopulation);
        }
        for member in self.species.iter_mut().flat_map(|s| &mut s.members) {
            member.expected_offspring = member.adjusted_fitness / average;
        }
        Ok(())
    }

    /// Computes every species' quota and corrects
    /// the total to match the population size.
    fn allot_offspring(&mut self) {
        let size = self.population_config.size.get();
        let mut leftover = self.leftover;
        match self.population_config.offspring_allotment {
            OffspringAllotment::Classic => {
                for species in &mut self.species {
                    leftover = species.count_offspring(leftover);
                }
            }
            OffspringAllotment::AverageFitness => {
                let total_average: f32 = self
                    .species
                    .iter()
                    .map(Species::average_adjusted_fitness)
                    .sum();
                for species in &mut self.species {
                    leftover = species.count_offspring_by_average(leftover, total_average, size);
                }
            }
        }
        self.leftover = leftover;

        let total: usize = self.species.iter().map(Species::expected_offspring).sum();
        if total < size {
            let best = self.best_species_index();
            self.species[best].expected_offspring += 1;
            if total + 1 < size {
                // Too many species were starved (usually by stagnation
                // penalties), so only the best one reproduces.
                for species in &mut self.species {
                    species.expected_offspring = 0;
                }
                self.species[best].expected_offspring = size;
            }
        } else if total > size {
            let scaled: Vec<f32> = self
                .species
                .iter()
                .map(|s| s.expected_offspring as f32 * size as f32 / total as f32)
                .collect();
            for (species, quota) in self.species.iter_mut().zip(round_retain_sum(&scaled)) {
                species.expected_offspring = quota;
            }
        }
    }

    /// Index of the species with the largest quota, the first one on ties.
    fn best_species_index(&self) -> usize {
        let mut best = 0;
        for (i, species) in self.species.iter().enumerate() {
            if species.expected_offspring > self.species[best].expected_offspring {
                best = i;
            }
        }
        best
    }

    /// Flags the best genome of the population and makes sure
    /// its species is allowed to reproduce.
    fn mark_population_champion(&mut self) {
        // Members are sorted by decreasing fitness, so every
        // species' champion is its first member.
        let Some(champion_species) = self.champion_species_index() else {
            return;
        };
        if let Some(member) = self.species[champion_species].members.first_mut() {
            member.population_champion = true;
            member.champion_offspring = self.population_config.population_champion_offspring;
        }
        if self.species[champion_species].expected_offspring == 0 {
            let donor = self.best_species_index();
            if self.species[donor].expected_offspring > 0 {
                self.species[donor].expected_offspring -= 1;
                self.species[champion_species].expected_offspring += 1;
            }
        }
    }

    fn champion_species_index(&self) -> Option<usize> {
        self.species
            .iter()
            .enumerate()
            .filter(|(_, s)| !s.is_empty())
            .max_by(|(_, s1), (_, s2)| {
                s1.current_best_fitness()
                    .total_cmp(&s2.current_best_fitness())
            })
            .map(|(i, _)| i)
    }

    /// Records fitness improvements and narrows reproduction to
    /// the top species once the population has stagnated for too long.
    fn track_improvement(&mut self) {
        let Some(champion_species) = self.champion_species_index() else {
            return;
        };
        let best = self.species[champion_species].current_best_fitness();
        if best > self.highest_fitness {
            info!(
                "new highest fitness {} (previously {}) in generation {}",
                best, self.highest_fitness, self.generation
            );
            self.highest_fitness = best;
            self.generations_without_improvement = 0;
            return;
        }
        self.generations_without_improvement += 1;

        let patience = self.population_config.stagnation_threshold.get()
            + self.population_config.delta_coding_margin;
        if self.generations_without_improvement > patience {
            self.generations_without_improvement = 0;
            self.delta_coding();
        }
    }

    /// Gives the whole population to the (at most) two
    /// best species, split between their champions.
    fn delta_coding(&mut self) {
        let size = self.population_config.size.get();
        let mut ranking: Vec<usize> = (0..self.species.len())
            .filter(|i| !self.species[*i].is_empty())
            .collect();
        ranking.sort_by(|a, b| {
            self.species[*b]
                .current_best_fitness()
                .total_cmp(&self.species[*a].current_best_fitness())
        });
        let quotas = match ranking.len() {
            0 => return,
            1 => vec![size],
            _ => vec![size / 2, size - size / 2],
        };

        for species in &mut self.species {
            species.expected_offspring = 0;
            for member in &mut species.members {
                member.population_champion = false;
                member.champion_offspring = 0;
            }
        }
        for (index, quota) in ranking.into_iter().zip(quotas) {
            let species = &mut self.species[index];
            species.expected_offspring = quota;
            species.age_of_last_improvement = species.age;
            if let Some(champion) = species.members.first_mut() {
                champion.champion_offspring = quota;
            }
        }
        info!(
            "population stagnated for over {} generations, reproducing only the top species",
            self.population_config.stagnation_threshold.get()
                + self.population_config.delta_coding_margin
        );
    }

    /// Replaces every species' members with the offspring,
    /// speciating each child. Species left without members
    /// go extinct; the rest age by one generation.
    fn replace_generation(&mut self, offspring: Vec<(SpeciesID, G)>) {
        for species in &mut self.species {
            species.members.clear();
        }
        for (parent_species, child) in offspring {
            self.speciate(child, Some(parent_species));
        }
        self.species.retain(|s| !s.is_empty());
        for species in &mut self.species {
            species.advance_age();
        }
    }

    /// Assigns a genome to the first species whose representative
    /// lies within the distance threshold, trying `preferred` first.
    /// Founds a new species if none is compatible.
    fn speciate(&mut self, genome: G, preferred: Option<SpeciesID>) {
        let preferred = preferred.and_then(|id| self.species.iter().position(|s| s.id() == id));
        let candidates =
            preferred
                .into_iter()
                .chain((0..self.species.len()).filter(|i| Some(*i) != preferred));
        for i in candidates {
            if self.species[i].genetic_distance(&genome, &self.genetic_config)
                < self.distance_threshold
            {
                self.species[i].add_genome(genome);
                return;
            }
        }
        let id = SpeciesID(self.species_count);
        self.species_count += 1;
        self.species.push(Species::new(id, genome));
    }

    /// Resets the population to an initial randomized state,
    /// continuing to draw from the same random number generator.
    /// Used primarily in case of population degeneration, e.g.
    /// when fitness scores overflow and no offspring can be allotted.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::{Population, PopulationConfig};
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome as G};
    ///
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::default(),
    ///     GeneticConfig::with_shape(2, 1),
    /// );
    ///
    /// population.evaluate_fitness(|_| f32::INFINITY);
    /// if population.evolve().is_err() {
    ///     population.reset();
    /// }
    /// assert_eq!(population.generation(), 0);
    /// assert!(population.evolve().is_ok());
    /// ```
    pub fn reset(&mut self)
    where
        C: Clone,
    {
        *self = Population::with_rng(
            self.population_config.clone(),
            self.genetic_config.clone(),
            self.rng.clone(),
        );
    }

    /// Returns the currently best-performing genome,
    /// or `None` if the population is empty.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::{Genome, Population, PopulationConfig};
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome as G};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::<_, _, G>::new(
    ///     PopulationConfig::with_size(NonZeroUsize::new(20).unwrap()),
    ///     GeneticConfig::with_shape(1, 1),
    /// );
    ///
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(move |_| {
    ///     fitness += 10.0;
    ///     fitness
    /// });
    ///
    /// assert_eq!(population.champion().unwrap().fitness(), 20.0 * 10.0);
    /// ```
    pub fn champion(&self) -> Option<&G> {
        self.genomes()
            .max_by(|g1, g2| g1.fitness().total_cmp(&g2.fitness()))
    }

    /// Returns an iterator over all current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.species.iter().flat_map(|s| s.genomes())
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the current compatibility distance threshold,
    /// which drifts towards the target species count.
    pub fn distance_threshold(&self) -> f32 {
        self.distance_threshold
    }

    /// Returns the highest fitness seen so far, across generations.
    pub fn highest_fitness(&self) -> f32 {
        self.highest_fitness
    }

    /// Returns the configuration the population evolves under.
    pub fn config(&self) -> &PopulationConfig {
        &self.population_config
    }
}

fn sanitize_fitness(fitness: f32) -> f32 {
    if fitness >= 0.0 {
        fitness
    } else {
        warn!("fitness {} clamped to 0", fitness);
        0.0
    }
}

/// Rounds all values to positive whole numbers
/// while preserving their order and sum, assuming it is also whole.
/// Rounding is done in the manner that minimizes
/// the average error to the original set of values.
fn round_retain_sum(values: &[f32]) -> Vec<usize> {
    let total_sum = values.iter().sum::<f32>().round() as usize;
    let mut truncated: Vec<(usize, usize, f32)> = values
        .iter()
        .enumerate()
        .map(|(i, f)| {
            let u = f.floor();
            (i, u as usize, f - u)
        })
        .collect();
    let truncated_sum: usize = truncated.iter().map(|(_, u, _)| *u).sum();
    let remainder = total_sum.saturating_sub(truncated_sum).min(truncated.len());
    // Sort in decreasing order of error
    truncated.sort_by(|a, b| b.2.total_cmp(&a.2));
    for (_, u, _) in &mut truncated[..remainder] {
        *u += 1;
    }
    truncated.sort_by_key(|(i, ..)| *i);
    truncated.iter().map(|(_, u, _)| *u).collect()
}

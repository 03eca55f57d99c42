use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Strategy used to turn shared fitness into
/// per-species offspring quotas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OffspringAllotment {
    /// Every member contributes `shared fitness / average shared fitness`
    /// offspring; fractional parts accumulate into a leftover that is
    /// carried from species to species and across generations.
    Classic,
    /// Each species receives a share of the population proportional to
    /// its average shared fitness relative to the sum of all species'
    /// averages, with the same leftover carrying.
    AverageFitness,
}

/// Configuration data for population generation
/// and evolution.
///
/// Deserialization fills unspecified fields
/// from [`PopulationConfig::default`].
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Number of species the distance threshold is adapted towards.
    /// If zero, the threshold stays fixed.
    pub target_species_count: usize,
    /// Initial compatibility distance threshold, beyond which
    /// genomes are considered as belonging to different species.
    pub distance_threshold: f32,
    /// Amount by which the threshold is moved each generation
    /// while the species count is off target.
    pub distance_threshold_step: f32,
    /// Lowest value the adapted threshold may take.
    pub min_distance_threshold: f32,
    /// Top % of each species which can participate
    /// in mating. At least one member always survives.
    pub survival_threshold: f32,
    /// Number of generations without improvement
    /// before a species is considered _stagnated_.
    pub stagnation_threshold: NonZeroUsize,
    /// Multiplier applied to the fitness of
    /// stagnated species' members.
    pub stagnation_penalty: f32,
    /// Multiplier applied to the fitness of members
    /// of young species.
    pub age_significance: f32,
    /// Species up to this age count as young.
    pub young_species_age: usize,
    /// Lower bound on a member's adjusted fitness
    /// before it is shared among its species.
    pub min_adjusted_fitness: f32,
    /// Chance that an offspring is produced
    /// by mutation alone.
    pub mutation_without_crossover_chance: f32,
    /// Chance that a crossover child is left unmutated.
    /// Children of identical parents are always mutated.
    pub crossover_without_mutation_chance: f32,
    /// Chance that genomes from different species
    /// will be selected to mate.
    pub interspecies_mating_chance: f32,
    /// Number of draws made looking for a non-empty
    /// foreign species during interspecies mating.
    pub interspecies_mating_attempts: usize,
    /// Bonus offspring granted to the population champion.
    pub population_champion_offspring: usize,
    /// How many of the population champion's offspring
    /// are unmodified clones.
    pub population_champion_clones: usize,
    /// Generations beyond the [`stagnation_threshold`] without a
    /// new best fitness before reproduction is narrowed to the
    /// top species.
    ///
    /// [`stagnation_threshold`]: PopulationConfig::stagnation_threshold
    pub delta_coding_margin: usize,
    /// Offspring quota strategy.
    pub offspring_allotment: OffspringAllotment,
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(150).unwrap_or(NonZeroUsize::MIN),
            target_species_count: 5,
            distance_threshold: 3.0,
            distance_threshold_step: 0.3,
            min_distance_threshold: 0.3,
            survival_threshold: 0.2,
            stagnation_threshold: NonZeroUsize::new(15).unwrap_or(NonZeroUsize::MIN),
            stagnation_penalty: 0.01,
            age_significance: 1.0,
            young_species_age: 10,
            min_adjusted_fitness: 0.0001,
            mutation_without_crossover_chance: 0.25,
            crossover_without_mutation_chance: 0.25,
            interspecies_mating_chance: 0.001,
            interspecies_mating_attempts: 5,
            population_champion_offspring: 3,
            population_champion_clones: 1,
            delta_coding_margin: 5,
            offspring_allotment: OffspringAllotment::Classic,
        }
    }
}

impl PopulationConfig {
    /// Returns the default configuration with
    /// the population size set to `size`.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::PopulationConfig;
    /// use std::num::NonZeroUsize;
    ///
    /// let config = PopulationConfig::with_size(NonZeroUsize::new(50).unwrap());
    /// assert_eq!(config.size.get(), 50);
    /// assert_eq!(config.distance_threshold, 3.0);
    /// ```
    pub fn with_size(size: NonZeroUsize) -> PopulationConfig {
        PopulationConfig {
            size,
            ..PopulationConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_documents_fill_defaults() {
        let config: PopulationConfig =
            serde_json::from_str(r#"{ "size": 40, "offspring_allotment": "AverageFitness" }"#)
                .unwrap();
        assert_eq!(config.size.get(), 40);
        assert_eq!(config.offspring_allotment, OffspringAllotment::AverageFitness);
        assert_eq!(config.stagnation_threshold.get(), 15);
        assert_eq!(config.stagnation_penalty, 0.01);
    }

    #[test]
    fn zero_size_is_rejected() {
        assert!(serde_json::from_str::<PopulationConfig>(r#"{ "size": 0 }"#).is_err());
    }
}

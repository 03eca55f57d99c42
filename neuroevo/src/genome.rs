use rand::Rng;

use std::error::Error;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// Randomness is always supplied by the caller, so a seeded
/// generator reproduces a run exactly.
///
/// [`Population`]: crate::Population
pub trait Genome: Sized {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Returns a freshly generated genome.
    fn new<R: Rng + ?Sized>(
        config: &Self::Config,
        history: &mut Self::InnovationHistory,
        rng: &mut R,
    ) -> Self;

    /// Returns the compatibility distance between two genomes.
    /// Must be symmetric, and 0 for identical genomes.
    fn genetic_distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Breeds a child from two parents.
    ///
    /// # Errors
    /// Implementations should fail if the parents
    /// cannot be aligned (e.g. they were generated
    /// for different tasks).
    fn mate<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    ) -> Result<Self, Box<dyn Error + Send + Sync>>;

    /// Mutates the genome in place. Population champions
    /// are passed `population_champion = true`, so that
    /// implementations may protect their topology.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        population_champion: bool,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Stores the score assigned by the evaluator.
    ///
    /// Populations clamp negative and NaN values
    /// to 0 before calling this.
    fn set_fitness(&mut self, fitness: f32);

    /// Returns the last stored score.
    fn fitness(&self) -> f32;
}

/// Population-wide record of structural innovations,
/// letting genomes that independently undergo the same
/// mutation be aligned later on.
///
/// What counts as an innovation is up to the [`Genome`]
/// implementation; the population only creates the history
/// and marks generation boundaries.
pub trait InnovationHistory {
    type Config;

    fn new(config: &Self::Config) -> Self;

    /// Called by the population once a generation
    /// has been bred. Identical mutations are only
    /// expected to share innovation numbers within
    /// a single generation.
    fn new_generation(&mut self);
}

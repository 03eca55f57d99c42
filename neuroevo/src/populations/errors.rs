use super::SpeciesID;

use std::error::Error;

use thiserror::Error;

/// Errors surfaced by [`Population::evolve`].
///
/// [`Population::evolve`]: crate::Population::evolve
#[derive(Debug, Error)]
pub enum EvolutionError {
    /// The population has no members left to breed from.
    #[error("attempted evolution on empty population")]
    EmptyPopulation,
    /// The average shared fitness was not a positive finite number.
    #[error("attempted evolution on degenerate population")]
    DegeneratePopulation,
    /// The species that received the most offspring vanished
    /// during breeding.
    #[error("lost best species {0:?} during breeding")]
    LostBestSpecies(SpeciesID),
    /// The genome implementation refused to mate two parents.
    #[error("mating failed: {0}")]
    Mating(#[source] Box<dyn Error + Send + Sync>),
}

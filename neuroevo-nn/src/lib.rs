//! # neuroevo-nn
//! A neural network implementation of the [`neuroevo`] crate's `Genome` trait.
//!
//! Provides an [`NNGenome`] type usable in `neuroevo` `Population`s. Its
//! input nodes are named features, grouped by the entity they describe,
//! and its outputs are split into classification nodes, one per action,
//! and regression nodes, one per action parameter. Networks may be
//! recurrent, keeping state between activations until flushed, which
//! suits agents choosing an action at every step of a running program.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
//!
//! # Example usage: Evolution of a XOR classifier
//! ```
//! use neuroevo::{Population, PopulationConfig};
//! use neuroevo_nn::genomics::{GeneticConfig, NNGenome};
//! use std::num::NonZeroUsize;
//!
//! // Action 0 answers "false", action 1 answers "true".
//! fn evaluate_xor(genome: &mut NNGenome) -> f32 {
//!     let cases = [([0.0, 0.0], 0), ([0.0, 1.0], 1), ([1.0, 0.0], 1), ([1.0, 1.0], 0)];
//!     let mut fitness: f32 = 0.0;
//!     for (input, expected) in cases {
//!         genome.flush_node_values();
//!         match genome.activate(&input) {
//!             Ok(output) => fitness += output.classification[expected],
//!             Err(_) => return 0.0,
//!         }
//!     }
//!     fitness.powi(2)
//! }
//!
//! let genetic_config = GeneticConfig {
//!     add_node_chance: 0.03,
//!     add_connection_chance: 0.05,
//!     recurrent_connection_chance: 0.0,
//!     weight_average_chance: 0.4,
//!     ..GeneticConfig::with_shape(2, 2)
//! };
//! let population_config = PopulationConfig {
//!     distance_threshold: 3.0,
//!     survival_threshold: 0.2,
//!     ..PopulationConfig::with_size(NonZeroUsize::new(100).unwrap())
//! };
//!
//! let mut population = Population::<_, _, NNGenome>::with_seed(population_config, genetic_config, 1);
//! for _ in 0..20 {
//!     population.evaluate_fitness(evaluate_xor);
//!     if let Err(e) = population.evolve() {
//!         eprintln!("{}", e);
//!         break;
//!     }
//! }
//! population.evaluate_fitness(evaluate_xor);
//! if let Some(champion) = population.champion() {
//!     println!("Best genome: {}", serde_json::to_string(champion).unwrap());
//! }
//! ```

pub mod genomics;
pub mod networks;

/// Identifier type used to designate historically
/// identical mutations for the purposes of
/// genome comparison and genetic tracking.
pub type Innovation = usize;

//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! The evolution engine is genome-agnostic: any structure implementing
//! the [`Genome`] trait can be speciated, bred and selected by a
//! [`Population`]. A neural network genome with classification and
//! regression outputs, as used for action selection, is supplied by
//! the `neuroevo-nn` crate.
//!
//! All randomness is drawn from a generator owned by the population,
//! so seeded runs are reproducible. Progress is reported through the
//! [`log`](https://docs.rs/log) facade; install any logger to see it.
//!
//! # Example usage: choosing the larger of two inputs, using `neuroevo-nn`
//! ```
//! use neuroevo::{Population, PopulationConfig};
//! use neuroevo_nn::genomics::{GeneticConfig, NNGenome};
//! use std::num::NonZeroUsize;
//!
//! fn evaluate(genome: &mut NNGenome) -> f32 {
//!     let cases = [([0.9, 0.1], 0), ([0.2, 0.7], 1), ([0.6, 0.3], 0), ([0.1, 0.4], 1)];
//!     let mut score = 0.0;
//!     for (input, expected) in cases {
//!         genome.flush_node_values();
//!         match genome.activate(&input) {
//!             Ok(output) => score += output.classification[expected],
//!             // Networks without a path from the inputs to the outputs
//!             // are not viable.
//!             Err(_) => return 0.0,
//!         }
//!     }
//!     score
//! }
//!
//! let mut population = Population::<_, _, NNGenome>::with_seed(
//!     PopulationConfig::with_size(NonZeroUsize::new(50).unwrap()),
//!     GeneticConfig::with_shape(2, 2),
//!     42,
//! );
//!
//! for _ in 0..10 {
//!     population.evaluate_fitness(evaluate);
//!     if let Err(e) = population.evolve() {
//!         eprintln!("{}", e);
//!         break;
//!     }
//! }
//! assert_eq!(population.genomes().count(), 50);
//! ```

mod genome;
mod populations;
#[cfg(test)]
mod testing;

pub use genome::*;
pub use populations::*;

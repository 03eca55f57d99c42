//! A minimal genome used to exercise the population machinery
//! without depending on a network implementation.
use crate::{Genome, InnovationHistory};

use rand::Rng;

use std::error::Error;

#[derive(Clone, Debug)]
pub(crate) struct VectorConfig {
    pub(crate) len: usize,
    pub(crate) mutation_power: f32,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct GenerationCounter {
    pub(crate) generations: usize,
}

impl InnovationHistory for GenerationCounter {
    type Config = VectorConfig;

    fn new(_: &VectorConfig) -> Self {
        GenerationCounter::default()
    }

    fn new_generation(&mut self) {
        self.generations += 1;
    }
}

/// A genome made of real-valued traits. Distance is
/// the summed absolute difference between traits.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct VectorGenome {
    pub(crate) traits: Vec<f32>,
    pub(crate) fitness: f32,
}

impl VectorGenome {
    pub(crate) fn with_fitness(fitness: f32) -> VectorGenome {
        VectorGenome {
            traits: vec![0.0; 3],
            fitness,
        }
    }
}

impl Genome for VectorGenome {
    type Config = VectorConfig;
    type InnovationHistory = GenerationCounter;

    fn new<R: Rng + ?Sized>(config: &VectorConfig, _: &mut GenerationCounter, rng: &mut R) -> Self {
        VectorGenome {
            traits: (0..config.len).map(|_| rng.gen_range(-1.0..=1.0)).collect(),
            fitness: 0.0,
        }
    }

    fn genetic_distance(first: &Self, second: &Self, _: &VectorConfig) -> f32 {
        first
            .traits
            .iter()
            .zip(&second.traits)
            .map(|(a, b)| (a - b).abs())
            .sum()
    }

    fn mate<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        _: &mut GenerationCounter,
        _: &VectorConfig,
        rng: &mut R,
    ) -> Result<Self, Box<dyn Error + Send + Sync>> {
        if parent1.traits.len() != parent2.traits.len() {
            return Err("trait count mismatch".into());
        }
        Ok(VectorGenome {
            traits: parent1
                .traits
                .iter()
                .zip(&parent2.traits)
                .map(|(a, b)| if rng.gen::<bool>() { *a } else { *b })
                .collect(),
            fitness: 0.0,
        })
    }

    fn mutate<R: Rng + ?Sized>(
        &mut self,
        _: bool,
        _: &mut GenerationCounter,
        config: &VectorConfig,
        rng: &mut R,
    ) {
        if self.traits.is_empty() {
            return;
        }
        let i = rng.gen_range(0..self.traits.len());
        self.traits[i] += rng.gen_range(-1.0..=1.0) * config.mutation_power;
    }

    fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    fn fitness(&self) -> f32 {
        self.fitness
    }
}

pub(crate) fn vector_config() -> VectorConfig {
    VectorConfig {
        len: 4,
        mutation_power: 0.5,
    }
}

use neuroevo::logging::{EvolutionLogger, ReportingLevel, Stats};
use neuroevo::{Genome, Population, PopulationConfig};
use neuroevo_nn::genomics::{GeneticConfig, History, NNGenome};

use log::{info, warn};
use rayon::prelude::*;

use std::error::Error;
use std::fs;
use std::num::NonZeroUsize;

const CASES: [([f32; 2], usize); 4] = [
    ([0.0, 0.0], 0),
    ([0.0, 1.0], 1),
    ([1.0, 0.0], 1),
    ([1.0, 1.0], 0),
];
const MAX_FITNESS: f32 = 16.0;
const GENERATIONS: usize = 100;
const RUNS: u64 = 100;

/// Scores the probability given to the right answer,
/// action 0 being "false" and action 1 "true".
fn evaluate_xor(genome: &mut NNGenome) -> f32 {
    let mut fitness: f32 = 0.0;
    for (input, expected) in CASES {
        genome.flush_node_values();
        match genome.activate(&input) {
            Ok(output) => fitness += output.classification[expected],
            Err(_) => return 0.0,
        }
    }
    fitness.powi(2)
}

fn solves_xor(genome: &NNGenome) -> bool {
    let mut genome = genome.clone();
    CASES.iter().all(|(input, expected)| {
        genome.flush_node_values();
        matches!(genome.activate(input), Ok(output) if output.selected_action() == Some(*expected))
    })
}

/// Reads the genetic config from the RON file named by the
/// first argument, if any. Missing fields take their defaults.
fn genetic_config() -> Result<GeneticConfig, Box<dyn Error>> {
    let defaults = GeneticConfig {
        recurrent_connection_chance: 0.0,
        ..GeneticConfig::with_shape(2, 2)
    };
    match std::env::args().nth(1) {
        Some(path) => {
            let config: GeneticConfig = ron::from_str(&fs::read_to_string(&path)?)?;
            if config.input_count() != 2 || config.classification_count() != 2 {
                return Err(format!("{} must describe 2 inputs and 2 actions", path).into());
            }
            info!("loaded genetic config from {}", path);
            Ok(config)
        }
        None => Ok(defaults),
    }
}

/// Evolves a population until some genome classifies every case
/// correctly. Returns the generation and the solution, if found.
fn run(
    seed: u64,
    population_config: &PopulationConfig,
    genetic_config: &GeneticConfig,
) -> Option<(usize, NNGenome)> {
    let mut population = Population::<_, History, NNGenome>::with_seed(
        population_config.clone(),
        genetic_config.clone(),
        seed,
    );
    let mut logger = EvolutionLogger::new(ReportingLevel::NoGenomes);
    for _ in 0..GENERATIONS {
        population.evaluate_fitness_par(evaluate_xor);
        logger.log(
            &population,
            &|g: &NNGenome| [g.fitness(), g.nodes().count() as f32],
            ["fitness", "nodes"],
        );
        if let Some(champion) = population.champion().filter(|c| solves_xor(c)) {
            return Some((population.generation(), champion.clone()));
        }
        if let Err(e) = population.evolve() {
            warn!("run {} stopped: {}", seed, e);
            population.reset();
        }
    }
    if let Some(last) = logger.iter().last() {
        info!("run {} failed, last snapshot:\n{}", seed, last);
    }
    None
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let genetic_config = genetic_config()?;
    let population_config = PopulationConfig {
        distance_threshold: 3.0,
        survival_threshold: 0.2,
        ..PopulationConfig::with_size(NonZeroUsize::new(150).unwrap())
    };

    let results: Vec<_> = (0..RUNS)
        .into_par_iter()
        .map(|seed| run(seed, &population_config, &genetic_config))
        .collect();

    let generations = Stats::from(
        results
            .iter()
            .filter_map(|r| r.as_ref().map(|(generation, _)| *generation as f32)),
    );
    let failures = results.iter().filter(|r| r.is_none()).count();
    println!(
        "Successful run generation count {:?}, {}% failure rate over {} runs",
        generations,
        failures as f32 * 100.0 / RUNS as f32,
        RUNS
    );

    if let Some((_, solution)) = results
        .into_iter()
        .flatten()
        .min_by_key(|(_, genome)| genome.nodes().count())
    {
        println!("Smallest solution (fitness {:.2} of {}):", solution.fitness(), MAX_FITNESS);
        println!("{}", ron::to_string(&solution)?);
    }
    Ok(())
}

use super::{Population, SpeciesID};

use crate::genome::{Genome, InnovationHistory};

use std::fmt;

/// How many genomes an [`EvolutionLogger`] copies into each snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Every genome, grouped by species.
    AllGenomes,
    /// The best genome of each species.
    SpeciesChampions,
    /// The best genome overall.
    PopulationChampion,
    /// Statistics only.
    NoGenomes,
}

/// Summary of one generation, taken before it was evolved.
#[derive(Clone, Debug)]
pub struct Log<G> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<G>,
    pub species_count: usize,
    pub distance_threshold: f32,
    pub highest_fitness: f32,
    pub genome_stats: Vec<(String, Stats)>,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Log {{")?;
        writeln!(f, "\tgeneration_number: {}", self.generation_number)?;
        writeln!(f, "\tspecies_count: {}", self.species_count)?;
        writeln!(f, "\tdistance_threshold: {}", self.distance_threshold)?;
        writeln!(f, "\thighest_fitness: {}", self.highest_fitness)?;
        for (name, stats) in &self.genome_stats {
            writeln!(f, "\t{}: {:?}", name, stats)?;
        }
        write!(f, "}}")
    }
}

/// Order statistics and mean of a sample.
#[derive(Clone, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence,
    /// or `None` if the sequence is empty.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied()).unwrap();
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Option<Stats> {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return None;
        }
        data.sort_by(f32::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Some(Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        })
    }
}

/// The genomes copied into a [`Log`], as
/// chosen by its [`ReportingLevel`].
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<G> {
    /// `(species, members, generations without improvement)`.
    Species(Vec<(SpeciesID, Vec<G>, usize)>),
    /// `(species, champion, generations without improvement)`.
    SpeciesChampions(Vec<(SpeciesID, G, usize)>),
    /// The population champion.
    PopulationChampion(G),
    /// Empty.
    None,
}

/// Collects a [`Log`] per call to [`log`](EvolutionLogger::log).
///
/// Unlike the `log` records emitted during evolution,
/// snapshots are kept in memory for later analysis.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome + Clone> EvolutionLogger<G> {
    /// Creates an empty logger.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::logging::{EvolutionLogger, ReportingLevel};
    /// use neuroevo_nn::genomics::NNGenome as G;
    ///
    /// // Any `Genome` will do; here, the neural network genome.
    /// let logger = EvolutionLogger::<G>::new(ReportingLevel::NoGenomes);
    /// assert_eq!(logger.iter().count(), 0);
    /// ```
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Appends a snapshot of `population`.
    ///
    /// `genome_stat_extractor` maps each genome to `N` values,
    /// summarized per position into [`Stats`] and labelled
    /// with the matching entry of `stat_names`.
    ///
    /// # Examples
    /// ```
    /// use neuroevo::logging::{EvolutionLogger, ReportingLevel};
    /// use neuroevo::{Genome, Population, PopulationConfig};
    /// use neuroevo_nn::genomics::{GeneticConfig, NNGenome as G};
    ///
    /// // Any `Genome` will do; here, the neural network genome.
    /// let mut logger = EvolutionLogger::<G>::new(ReportingLevel::PopulationChampion);
    /// let population = Population::new(PopulationConfig::default(), GeneticConfig::with_shape(2, 1));
    ///
    /// // Snapshot the initial generation.
    /// logger.log(&population, &|g: &G| [g.fitness(), g.connections().count() as f32], ["fitness", "size"]);
    /// assert_eq!(logger.iter().next().unwrap().genome_stats.len(), 2);
    /// ```
    pub fn log<C, H, GSE, const N: usize>(
        &mut self,
        population: &Population<C, H, G>,
        genome_stat_extractor: &GSE,
        stat_names: [&str; N],
    ) where
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
        GSE: Fn(&G) -> [f32; N],
    {
        let stats: Vec<[f32; N]> = population.genomes().map(genome_stat_extractor).collect();
        let genome_stats = stat_names
            .iter()
            .map(|name| name.to_string())
            .zip(unzip_n_vecs(stats.into_iter()))
            .filter_map(|(name, data)| Stats::from(data.into_iter()).map(|s| (name, s)))
            .collect();
        let generation_sample = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                population
                    .species()
                    .map(|s| (s.id(), s.genomes().cloned().collect(), s.time_stagnated()))
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .species()
                    .filter_map(|s| s.champion().map(|c| (s.id(), c.clone(), s.time_stagnated())))
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => match population.champion() {
                Some(champion) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };
        self.logs.push(Log {
            generation_number: population.generation(),
            generation_sample,
            species_count: population.species().count(),
            distance_threshold: population.distance_threshold(),
            highest_fitness: population.highest_fitness(),
            genome_stats,
        })
    }

    /// Returns the snapshots, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }
}

fn unzip_n_vecs<T: Clone, const N: usize>(iter: impl Iterator<Item = [T; N]>) -> Vec<Vec<T>> {
    let mut vecs = vec![Vec::default(); N];
    for items in iter {
        for (vec, item) in vecs.iter_mut().zip(items) {
            vec.push(item);
        }
    }
    vecs
}

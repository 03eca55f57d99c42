use crate::populations::PopulationConfig;
use crate::Genome;

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;

/// Species identifier. Identifiers are handed out
/// by the population in order of creation and
/// are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize);

/// A genome together with the per-generation
/// bookkeeping its species keeps about it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Member<G> {
    pub(super) genome: G,
    pub(super) adjusted_fitness: f32,
    pub(super) expected_offspring: f32,
    pub(super) death_mark: bool,
    pub(super) population_champion: bool,
    pub(super) champion_offspring: usize,
}

impl<G: Genome> Member<G> {
    pub(super) fn new(genome: G) -> Member<G> {
        Member {
            genome,
            adjusted_fitness: 0.0,
            expected_offspring: 0.0,
            death_mark: false,
            population_champion: false,
            champion_offspring: 0,
        }
    }

    /// Returns the member's genome.
    pub fn genome(&self) -> &G {
        &self.genome
    }

    /// Returns the member's fitness after stagnation
    /// penalties, age bonuses and sharing.
    pub fn adjusted_fitness(&self) -> f32 {
        self.adjusted_fitness
    }

    /// Returns the (fractional) number of offspring
    /// this member accounts for.
    pub fn expected_offspring(&self) -> f32 {
        self.expected_offspring
    }

    /// Returns whether the member is excluded from reproduction.
    pub fn has_death_mark(&self) -> bool {
        self.death_mark
    }

    /// Returns whether the member is the population's champion.
    pub fn is_population_champion(&self) -> bool {
        self.population_champion
    }
}

/// Species are collections of reproductively
/// compatible (within a certain [compatibility distance])
/// genomes. Membership is determined by calculating
/// the distance to a _representative_, which is the
/// founding genome for a new species and the species'
/// champion thereafter.
///
/// Species will stagnate after [`stagnation_threshold`]
/// generations without improving their best fitness,
/// and will thereafter be penalized during reproduction.
///
/// [compatibility distance]: PopulationConfig::distance_threshold
/// [`stagnation_threshold`]: PopulationConfig::stagnation_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species<G> {
    id: SpeciesID,
    pub(super) members: Vec<Member<G>>,
    pub(super) representative: G,
    pub(super) age: usize,
    pub(super) age_of_last_improvement: usize,
    pub(super) all_time_best_fitness: f32,
    pub(super) current_best_fitness: f32,
    pub(super) expected_offspring: usize,
    pub(super) novel: bool,
}

impl<G: Genome + Clone> Species<G> {
    /// Creates a new species with the specified ID and
    /// founding member, which also becomes the representative.
    pub fn new(id: SpeciesID, founder: G) -> Species<G> {
        Species {
            id,
            representative: founder.clone(),
            members: vec![Member::new(founder)],
            age: 1,
            age_of_last_improvement: 1,
            all_time_best_fitness: 0.0,
            current_best_fitness: 0.0,
            expected_offspring: 0,
            novel: true,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    /// Returns the compatibility distance between the species'
    /// representative and `other`.
    pub fn genetic_distance<C>(&self, other: &G, config: &C) -> f32
    where
        G: Genome<Config = C>,
    {
        G::genetic_distance(&self.representative, other, config)
    }

    /// Adds a genome to the species.
    pub fn add_genome(&mut self, genome: G) {
        self.members.push(Member::new(genome));
    }

    /// Returns an iterator over the species' genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &G> {
        self.members.iter().map(|m| &m.genome)
    }

    /// Returns an iterator over the species' members
    /// and their reproduction bookkeeping.
    pub fn members(&self) -> impl Iterator<Item = &Member<G>> {
        self.members.iter()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns whether the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the species' age in generations.
    /// Species are born with age 1.
    pub fn age(&self) -> usize {
        self.age
    }

    /// Returns the number of generations since the species'
    /// best fitness last improved.
    pub fn time_stagnated(&self) -> usize {
        self.age.saturating_sub(self.age_of_last_improvement)
    }

    /// Returns the best fitness any member of the species
    /// has ever achieved.
    pub fn all_time_best_fitness(&self) -> f32 {
        self.all_time_best_fitness
    }

    /// Returns the best fitness among current members.
    pub fn current_best_fitness(&self) -> f32 {
        self.current_best_fitness
    }

    /// Returns the number of offspring allotted to
    /// the species in the last evolution step.
    pub fn expected_offspring(&self) -> usize {
        self.expected_offspring
    }

    /// Returns whether the species was founded
    /// during the last generation.
    pub fn is_novel(&self) -> bool {
        self.novel
    }

    /// Returns the currently best-performing genome,
    /// or `None` if the species is empty.
    pub fn champion(&self) -> Option<&G> {
        self.members
            .iter()
            .map(|m| &m.genome)
            .max_by(|g1, g2| g1.fitness().total_cmp(&g2.fitness()))
    }

    /// Computes every member's shared fitness: stagnated
    /// species are penalized, young species boosted, and
    /// the result is floored and divided by the species'
    /// size. Afterwards the members are sorted and the
    /// kill candidates marked.
    pub(super) fn adjust_fitness(&mut self, config: &PopulationConfig) {
        let mut age_debt = (self.age as i64 - self.age_of_last_improvement as i64 + 1)
            - config.stagnation_threshold.get() as i64;
        if age_debt == 0 {
            age_debt = 1;
        }

        let size = self.members.len() as f32;
        for member in &mut self.members {
            let mut fitness = member.genome.fitness();
            if age_debt >= 1 {
                fitness *= config.stagnation_penalty;
            }
            if self.age <= config.young_species_age {
                fitness *= config.age_significance;
            }
            if fitness <= 0.0 || fitness.is_nan() {
                fitness = config.min_adjusted_fitness;
            }
            member.adjusted_fitness = fitness / size;
            member.death_mark = false;
            member.population_champion = false;
            member.champion_offspring = 0;
        }

        self.mark_kill_candidates(config);
    }

    /// Sorts members by decreasing raw fitness, records
    /// improvements and marks every member past the
    /// survivor count as unfit for reproduction.
    fn mark_kill_candidates(&mut self, config: &PopulationConfig) {
        self.sort_members_by_decreasing_fitness();

        if let Some(champion) = self.members.first() {
            let best = champion.genome.fitness();
            self.current_best_fitness = best;
            if best > self.all_time_best_fitness {
                self.all_time_best_fitness = best;
                self.age_of_last_improvement = self.age;
            }
            self.representative = champion.genome.clone();
        }

        let survivors = self.count_survivors(config);
        for member in self.members.iter_mut().skip(survivors) {
            member.death_mark = true;
        }
    }

    pub(super) fn sort_members_by_decreasing_fitness(&mut self) {
        self.members
            .sort_by(|m1, m2| m2.genome.fitness().total_cmp(&m1.genome.fitness()));
    }

    /// Classic NEAT quota: sums the whole part of every member's
    /// expected offspring and converts the accumulated fractional
    /// parts whenever they exceed 1. Returns the new leftover.
    pub(super) fn count_offspring(&mut self, mut leftover: f32) -> f32 {
        let mut expected = 0;
        for member in &self.members {
            let whole = member.expected_offspring.floor();
            expected += whole as usize;
            leftover += member.expected_offspring - whole;
            if leftover > 1.0 {
                let extra = leftover.floor();
                expected += extra as usize;
                leftover -= extra;
            }
        }
        self.expected_offspring = expected;
        leftover
    }

    /// Average-fitness quota: the species' share of the population
    /// follows its average shared fitness relative to `total_average`,
    /// the sum of all species' averages. Returns the new leftover.
    pub(super) fn count_offspring_by_average(
        &mut self,
        mut leftover: f32,
        total_average: f32,
        population_size: usize,
    ) -> f32 {
        let expected = if total_average > 0.0 {
            self.average_adjusted_fitness() / total_average * population_size as f32
        } else {
            0.0
        };
        let whole = expected.floor();
        self.expected_offspring = whole as usize;
        leftover += expected - whole;
        if leftover >= 1.0 {
            let extra = leftover.floor();
            self.expected_offspring += extra as usize;
            leftover -= extra;
        }
        leftover
    }

    /// Returns the mean shared fitness of the members.
    pub fn average_adjusted_fitness(&self) -> f32 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.members.iter().map(|m| m.adjusted_fitness).sum::<f32>() / self.members.len() as f32
    }

    pub(super) fn count_survivors(&self, config: &PopulationConfig) -> usize {
        (config.survival_threshold * self.members.len() as f32).floor() as usize + 1
    }

    /// Removes members marked as unfit for reproduction.
    pub(super) fn remove_marked(&mut self) {
        self.members.retain(|m| !m.death_mark);
    }

    /// Ages the species by one generation, unless it was founded
    /// during the last one.
    pub(super) fn advance_age(&mut self) {
        if self.novel {
            self.novel = false;
        } else {
            self.age += 1;
        }
    }
}

/// Orders two species by their allotted offspring, most first.
pub(super) fn by_decreasing_offspring<G>(a: &Species<G>, b: &Species<G>) -> Ordering {
    b.expected_offspring.cmp(&a.expected_offspring)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::VectorGenome;

    fn species_with_fitnesses(fitnesses: &[f32]) -> Species<VectorGenome> {
        let mut genomes = fitnesses.iter().map(|f| VectorGenome::with_fitness(*f));
        let mut species = Species::new(SpeciesID(0), genomes.next().unwrap());
        for g in genomes {
            species.add_genome(g);
        }
        species
    }

    #[test]
    fn adjusted_fitness_is_shared() {
        let mut species = species_with_fitnesses(&[4.0, 2.0]);
        species.adjust_fitness(&PopulationConfig::default());
        let adjusted: Vec<f32> = species.members().map(|m| m.adjusted_fitness()).collect();
        assert_eq!(adjusted, vec![2.0, 1.0]);
    }

    #[test]
    fn non_positive_fitness_is_floored() {
        let config = PopulationConfig::default();
        let mut species = species_with_fitnesses(&[0.0]);
        species.adjust_fitness(&config);
        assert_eq!(species.members[0].adjusted_fitness, config.min_adjusted_fitness);
    }

    #[test]
    fn stagnated_species_are_penalized() {
        let config = PopulationConfig::default();
        let mut species = species_with_fitnesses(&[10.0]);
        species.age = 40;
        species.age_of_last_improvement = 20;
        species.all_time_best_fitness = 50.0;
        species.adjust_fitness(&config);
        assert_eq!(species.members[0].adjusted_fitness, 10.0 * config.stagnation_penalty);
    }

    #[test]
    fn kill_candidates_leave_a_survivor() {
        let config = PopulationConfig {
            survival_threshold: 0.0,
            ..PopulationConfig::default()
        };
        let mut species = species_with_fitnesses(&[1.0, 3.0, 2.0]);
        species.adjust_fitness(&config);
        let marks: Vec<bool> = species.members().map(|m| m.has_death_mark()).collect();
        assert_eq!(marks, vec![false, true, true]);
        assert_eq!(species.members[0].genome.fitness(), 3.0);
        assert_eq!(species.representative().fitness(), 3.0);
        assert_eq!(species.all_time_best_fitness(), 3.0);
    }

    #[test]
    fn classic_quota_carries_leftover() {
        let mut species = species_with_fitnesses(&[1.0, 1.0, 1.0]);
        for m in &mut species.members {
            m.expected_offspring = 1.4;
        }
        let leftover = species.count_offspring(0.0);
        // 3 whole offspring, plus 1 once the fractions exceed 1.
        assert_eq!(species.expected_offspring(), 4);
        assert!((leftover - 0.2).abs() < 1e-5);
    }

    #[test]
    fn average_quota_carries_leftover() {
        let mut species = species_with_fitnesses(&[1.0, 1.0]);
        for m in &mut species.members {
            m.adjusted_fitness = 0.5;
        }
        let leftover = species.count_offspring_by_average(0.75, 1.0, 10);
        // 5.0 expected, leftover stays below 1.
        assert_eq!(species.expected_offspring(), 5);
        assert!((leftover - 0.75).abs() < 1e-5);
        let leftover = species.count_offspring_by_average(0.75, 1.5, 10);
        // 3.333.. expected; 0.75 + 0.333.. spills over.
        assert_eq!(species.expected_offspring(), 4);
        assert!((leftover - 0.0833).abs() < 1e-3);
    }

    #[test]
    fn novel_species_skip_one_aging_step() {
        let mut species = species_with_fitnesses(&[1.0]);
        species.advance_age();
        assert_eq!(species.age(), 1);
        species.advance_age();
        assert_eq!(species.age(), 2);
    }
}

use super::{EvolutionError, PopulationConfig, Species, SpeciesID};
use crate::Genome;

use rand::Rng;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of breeding a population's
/// offspring according to the specified configs
/// and the quotas stored in each species.
pub(super) struct OffspringFactory<'a, G: Genome, R: ?Sized> {
    species: &'a [Species<G>],
    history: &'a mut G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
    rng: &'a mut R,
}

impl<'a, G, R> OffspringFactory<'a, G, R>
where
    G: Genome + Clone,
    R: Rng + ?Sized,
{
    pub(super) fn new(
        species: &'a [Species<G>],
        history: &'a mut G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
        rng: &'a mut R,
    ) -> OffspringFactory<'a, G, R> {
        OffspringFactory {
            species,
            history,
            genetic_config,
            population_config,
            rng,
        }
    }

    /// Breeds every species' allotted offspring. Each child is
    /// returned alongside the ID of the species that bred it.
    ///
    /// Species members must be sorted by decreasing fitness
    /// and stripped of their unfit members.
    pub(super) fn generate_offspring(&mut self) -> Result<Vec<(SpeciesID, G)>, EvolutionError> {
        let mut offspring = Vec::with_capacity(self.population_config.size.get());
        for species_index in 0..self.species.len() {
            self.breed(species_index, &mut offspring)?;
        }
        Ok(offspring)
    }

    /// Produces a species' quota: a clone of the champion first,
    /// then the population champion's extra offspring if it belongs
    /// to the species, then mutated or mated children.
    fn breed(
        &mut self,
        species_index: usize,
        offspring: &mut Vec<(SpeciesID, G)>,
    ) -> Result<(), EvolutionError> {
        let all_species: &'a [Species<G>] = self.species;
        let species = &all_species[species_index];
        let Some(champion) = species.members.first() else {
            return Ok(());
        };

        let mut champion_offspring = champion.champion_offspring;
        let mut champion_clones = 0;
        for child_index in 0..species.expected_offspring {
            let mut child = if child_index == 0 {
                champion.genome.clone()
            } else if champion_offspring > 0 {
                champion_offspring -= 1;
                let mut child = champion.genome.clone();
                if champion_clones < self.population_config.population_champion_clones {
                    champion_clones += 1;
                } else {
                    child.mutate(true, self.history, self.genetic_config, self.rng);
                }
                child
            } else if species.len() == 1
                || self.rng.gen::<f32>() < self.population_config.mutation_without_crossover_chance
            {
                let parent = &species.members[self.rng.gen_range(0..species.len())].genome;
                let mut child = parent.clone();
                child.mutate(false, self.history, self.genetic_config, self.rng);
                child
            } else {
                self.mate(species_index)?
            };
            child.set_fitness(0.0);
            offspring.push((species.id(), child));
        }
        Ok(())
    }

    /// Mates a random member of the species with either another
    /// random member or, rarely, the champion of another species.
    fn mate(&mut self, species_index: usize) -> Result<G, EvolutionError> {
        let all_species: &'a [Species<G>] = self.species;
        let species = &all_species[species_index];
        let parent1 = &species.members[self.rng.gen_range(0..species.len())].genome;
        let parent2 = self
            .choose_foreign_parent(species_index)
            .unwrap_or_else(|| &species.members[self.rng.gen_range(0..species.len())].genome);

        let mut child = G::mate(
            parent1,
            parent2,
            self.history,
            self.genetic_config,
            self.rng,
        )
        .map_err(EvolutionError::Mating)?;

        if self.rng.gen::<f32>() > self.population_config.crossover_without_mutation_chance
            || G::genetic_distance(parent1, parent2, self.genetic_config) == 0.0
        {
            child.mutate(false, self.history, self.genetic_config, self.rng);
        }
        Ok(child)
    }

    /// With the configured chance, draws other species looking
    /// for a non-empty one and returns its champion.
    fn choose_foreign_parent(&mut self, species_index: usize) -> Option<&'a G> {
        let species: &'a [Species<G>] = self.species;
        if species.len() < 2
            || self.rng.gen::<f32>() >= self.population_config.interspecies_mating_chance
        {
            return None;
        }
        for _ in 0..self.population_config.interspecies_mating_attempts {
            let other = self.rng.gen_range(0..species.len());
            if other == species_index {
                continue;
            }
            if let Some(member) = species[other].members.first() {
                return Some(&member.genome);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{vector_config, GenerationCounter, VectorGenome};

    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn species(id: usize, fitnesses: &[f32], quota: usize) -> Species<VectorGenome> {
        let mut genomes = fitnesses.iter().map(|f| VectorGenome {
            traits: vec![*f; 4],
            fitness: *f,
        });
        let mut species = Species::new(SpeciesID(id), genomes.next().unwrap());
        for g in genomes {
            species.add_genome(g);
        }
        species.sort_members_by_decreasing_fitness();
        species.expected_offspring = quota;
        species
    }

    fn breed(species: &[Species<VectorGenome>]) -> Vec<(SpeciesID, VectorGenome)> {
        let mut history = GenerationCounter::default();
        let config = vector_config();
        let population_config = PopulationConfig::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        OffspringFactory::new(species, &mut history, &config, &population_config, &mut rng)
            .generate_offspring()
            .unwrap()
    }

    #[test]
    fn quotas_are_met() {
        let offspring = breed(&[species(0, &[3.0, 2.0, 1.0], 5), species(1, &[1.0], 2)]);
        assert_eq!(offspring.len(), 7);
        assert_eq!(offspring.iter().filter(|(id, _)| *id == SpeciesID(0)).count(), 5);
        assert!(offspring.iter().all(|(_, g)| g.fitness == 0.0));
    }

    #[test]
    fn champion_is_cloned_first() {
        let offspring = breed(&[species(0, &[1.0, 4.0], 3)]);
        assert_eq!(offspring[0].1.traits, vec![4.0; 4]);
    }

    #[test]
    fn population_champion_gets_clones() {
        let mut s = species(0, &[2.0, 1.0], 4);
        s.members[0].champion_offspring = 3;
        let offspring = breed(&[s]);
        // The elitism clone plus one configured clone are exact copies,
        // the remaining champion offspring are mutated.
        let clones = offspring
            .iter()
            .filter(|(_, g)| g.traits == vec![2.0; 4])
            .count();
        assert_eq!(clones, 2);
        assert_eq!(offspring.len(), 4);
    }

    #[test]
    fn empty_species_breed_nothing() {
        let mut s = species(0, &[1.0], 3);
        s.members.clear();
        assert!(breed(&[s]).is_empty());
    }
}

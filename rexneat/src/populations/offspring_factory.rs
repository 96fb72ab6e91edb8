use super::{fitness_of, GenomeId, PopulationConfig, Species};
use crate::rng::Chance;
use crate::Genome;

use rand::seq::SliceRandom;
use rand::Rng;

use std::collections::BTreeMap;

/// Auxiliary type for offspring generation.
/// Handles all the tasks of generating a population's
/// offspring according to the specified configs
/// and allotted offspring.
pub(super) struct OffspringFactory<'a, G: Genome> {
    species: &'a [Species<G>],
    genomes: &'a BTreeMap<GenomeId, G>,
    history: &'a mut G::InnovationHistory,
    genetic_config: &'a G::Config,
    population_config: &'a PopulationConfig,
    champion: GenomeId,
}

impl<'a, G: Genome> OffspringFactory<'a, G> {
    pub(super) fn new(
        species: &'a [Species<G>],
        genomes: &'a BTreeMap<GenomeId, G>,
        history: &'a mut G::InnovationHistory,
        genetic_config: &'a G::Config,
        population_config: &'a PopulationConfig,
        champion: GenomeId,
    ) -> OffspringFactory<'a, G> {
        OffspringFactory {
            species,
            genomes,
            history,
            genetic_config,
            population_config,
            champion,
        }
    }

    /// Generate the allotted offspring. Elites keep their IDs,
    /// every other child is numbered from `next_genome_id`.
    pub(super) fn generate_offspring<R: Rng + ?Sized>(
        &mut self,
        allotted_offspring: &[usize],
        next_genome_id: &mut u64,
        rng: &mut R,
    ) -> BTreeMap<GenomeId, G> {
        let ranked: Vec<Vec<GenomeId>> = self
            .species
            .iter()
            .map(|s| s.ranked_members(self.genomes))
            .collect();
        let parent_pools: Vec<&[GenomeId]> = self
            .species
            .iter()
            .zip(&ranked)
            .map(|(s, r)| &r[..s.count_survivors(self.population_config).min(r.len())])
            .collect();

        let mut offspring = BTreeMap::new();
        for (species_index, &allotted) in allotted_offspring.iter().enumerate() {
            let species = &self.species[species_index];
            let members = &ranked[species_index];
            let mut elite = species.count_elite(self.population_config, allotted);
            if allotted > 0 && members.first() == Some(&self.champion) {
                elite = elite.max(1);
            }

            self.add_species_elite(&mut offspring, &members[..elite]);
            for _ in elite..allotted {
                if let Some(child) = self.breed(species_index, &parent_pools, rng) {
                    offspring.insert(GenomeId(*next_genome_id), child);
                    *next_genome_id += 1;
                }
            }
        }

        offspring
    }

    /// Add the top "elite" members of the species
    /// to the offspring, unchanged.
    fn add_species_elite(&self, offspring: &mut BTreeMap<GenomeId, G>, elite: &[GenomeId]) {
        for id in elite {
            if let Some(genome) = self.genomes.get(id) {
                let mut genome = genome.clone();
                genome.clear_fitness();
                offspring.insert(*id, genome);
            }
        }
    }

    /// Produce a single child of the species,
    /// asexually or by mating two parents.
    fn breed<R: Rng + ?Sized>(
        &mut self,
        species_index: usize,
        parent_pools: &[&[GenomeId]],
        rng: &mut R,
    ) -> Option<G> {
        let genomes = self.genomes;
        let parent1 = parent_pools[species_index]
            .choose(rng)
            .and_then(|id| genomes.get(id))?;

        let mut child = if rng.chance(self.population_config.asexual_reproduction_chance) {
            let mut child = parent1.clone();
            child.mutate(self.history, self.genetic_config, rng);
            child
        } else {
            let parent2 = Self::choose_second_parent(
                species_index,
                parent_pools,
                self.population_config,
                rng,
            )
            .and_then(|id| genomes.get(&id))?;
            let mut child = if rng.chance(self.population_config.crossover_chance) {
                G::mate(parent1, parent2, self.genetic_config, rng)
            } else if fitness_of(parent2) > fitness_of(parent1) {
                parent2.clone()
            } else {
                parent1.clone()
            };
            if rng.chance(G::child_mutation_chance(self.genetic_config)) {
                child.mutate(self.history, self.genetic_config, rng);
            }
            child
        };
        child.clear_fitness();
        Some(child)
    }

    /// Choose a parent from the current species' survivors,
    /// or from those of another randomly selected species.
    fn choose_second_parent<R: Rng + ?Sized>(
        species_index: usize,
        parent_pools: &[&[GenomeId]],
        population_config: &PopulationConfig,
        rng: &mut R,
    ) -> Option<GenomeId> {
        let pool_index = if parent_pools.len() > 1
            && rng.chance(population_config.interspecies_mating_chance)
        {
            let other = rng.gen_range(0..parent_pools.len() - 1);
            if other >= species_index {
                other + 1
            } else {
                other
            }
        } else {
            species_index
        };
        parent_pools[pool_index].choose(rng).copied()
    }
}

//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;
mod offspring_factory;
mod snapshot;
mod species;

use crate::{Genome, InnovationHistory};
pub use config::{check_probability, PopulationConfig};
pub use errors::{ConfigError, EvolutionError, SnapshotError};
use offspring_factory::OffspringFactory;
pub use snapshot::{load_genome, save_genome};
pub use species::{Species, SpeciesId};

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::fmt;

/// Genome identifier, unique within a run.
/// Elites carried over into the next generation
/// keep their ID; every other offspring gets a new one.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GenomeId(pub u64);

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a population stands in its
/// evaluate → evolve cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    /// Freshly created, restored, or just evolved.
    AwaitingEvaluation,
    /// Every genome has a fitness value.
    Evaluated,
}

/// A population of genomes.
#[derive(Serialize, Deserialize)]
pub struct Population<C, H, G> {
    genomes: BTreeMap<GenomeId, G>,
    species: Vec<Species<G>>,
    history: H,
    generation: usize,
    next_genome_id: u64,
    next_species_id: u64,
    phase: Phase,
    #[serde(with = "crate::rng::chacha_state")]
    rng: ChaCha8Rng,
    population_config: PopulationConfig,
    genetic_config: C,
}

impl<C, H, G> Population<C, H, G>
where
    G: Genome<InnovationHistory = H, Config = C>,
    H: InnovationHistory<Config = C>,
{
    /// Creates a new population using the passed configurations.
    ///
    /// The type of `genetic_config` depends on the implementation
    /// of [`Genome`], and is effectively opaque to the population.
    ///
    /// [`Genome`]: crate::Genome
    pub fn new(population_config: PopulationConfig, genetic_config: C) -> Population<C, H, G> {
        Self::populate(vec![], population_config, genetic_config)
    }

    /// Creates a new population using the passed configurations,
    /// and seeds it with the specified genomes, which receive the
    /// lowest genome IDs. If the number of seed genomes is not
    /// as large as the configured population size, the remaining
    /// space is filled with fresh genomes.
    ///
    /// Returns `None` if there are more seed genomes
    /// than the configured population size.
    pub fn new_seeded(
        seed_genomes: Vec<G>,
        population_config: PopulationConfig,
        genetic_config: C,
    ) -> Option<Population<C, H, G>> {
        if seed_genomes.len() > population_config.size.get() {
            return None;
        }
        Some(Self::populate(seed_genomes, population_config, genetic_config))
    }

    fn populate(
        seed_genomes: Vec<G>,
        population_config: PopulationConfig,
        genetic_config: C,
    ) -> Population<C, H, G> {
        let size = population_config.size.get();
        let mut rng = match population_config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let mut history = H::new(&genetic_config);

        let mut genomes = BTreeMap::new();
        for (i, mut genome) in seed_genomes.into_iter().enumerate() {
            genome.register_innovations(&mut history);
            genome.clear_fitness();
            genomes.insert(GenomeId(i as u64), genome);
        }
        for i in genomes.len()..size {
            genomes.insert(GenomeId(i as u64), G::new(&genetic_config, &mut rng));
        }

        let mut population = Population {
            genomes,
            species: vec![],
            history,
            generation: 0,
            next_genome_id: size as u64,
            next_species_id: 0,
            phase: Phase::AwaitingEvaluation,
            rng,
            population_config,
            genetic_config,
        };
        population.speciate();
        population
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator, in
    /// ascending genome ID order.
    ///
    /// Missing, negative or non-finite fitness values
    /// are logged and replaced by 0.
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(GenomeId, &G) -> Option<f32>,
    {
        for (id, genome) in self.genomes.iter_mut() {
            let fitness = sanitize_fitness(*id, evaluator(*id, genome));
            genome.set_fitness(fitness);
        }
        self.phase = Phase::Evaluated;
    }

    /// Evaluates the fitness of each genome on the rayon
    /// thread pool. Each worker only reads its genome; the
    /// results are applied once every evaluation is done.
    pub fn par_evaluate_fitness<E>(&mut self, evaluator: E)
    where
        E: Fn(GenomeId, &G) -> Option<f32> + Sync + Send,
        G: Sync,
    {
        let fitnesses: Vec<(GenomeId, Option<f32>)> = self
            .genomes
            .par_iter()
            .map(|(id, genome)| (*id, evaluator(*id, genome)))
            .collect();
        for (id, fitness) in fitnesses {
            if let Some(genome) = self.genomes.get_mut(&id) {
                genome.set_fitness(sanitize_fitness(id, fitness));
            }
        }
        self.phase = Phase::Evaluated;
    }

    /// Evolves the population by culling stagnant species,
    /// mating the best performing genomes of each species,
    /// and re-speciating the offspring.
    ///
    /// # Errors
    /// Returns an error if the generation has not been evaluated,
    /// the configuration is invalid, every species was culled,
    /// or the offspring count does not match the population size.
    pub fn evolve(&mut self) -> Result<(), EvolutionError> {
        self.population_config.validate()?;
        if self.phase != Phase::Evaluated {
            return Err(EvolutionError::NotEvaluated);
        }
        let champion = self
            .champion()
            .map(|(id, _)| id)
            .ok_or(EvolutionError::NoSurvivingSpecies)?;

        // Species are only replaced once the offspring are
        // known to be valid, so a failed call leaves them intact.
        let survivors = self.surviving_species(champion);
        if survivors.is_empty() {
            return Err(EvolutionError::NoSurvivingSpecies);
        }

        let allotted_offspring = self.allot_offspring(&survivors, champion);
        let offspring = OffspringFactory::new(
            &survivors,
            &self.genomes,
            &mut self.history,
            &self.genetic_config,
            &self.population_config,
            champion,
        )
        .generate_offspring(&allotted_offspring, &mut self.next_genome_id, &mut self.rng);

        let expected = self.population_config.size.get();
        if offspring.len() != expected {
            return Err(EvolutionError::PopulationDrift {
                expected,
                found: offspring.len(),
            });
        }

        let best_fitness = self.champion().and_then(|(_, g)| g.fitness()).unwrap_or(0.0);
        self.species = survivors;
        self.genomes = offspring;
        self.generation += 1;
        self.speciate();
        self.phase = Phase::AwaitingEvaluation;
        info!(
            "generation {} bred: {} species, previous best fitness {:.3}",
            self.generation,
            self.species.len(),
            best_fitness
        );
        Ok(())
    }

    /// Returns a copy of the species with updated stagnation
    /// records, without those that are stagnant and do not
    /// hold the population champion.
    fn surviving_species(&self, champion: GenomeId) -> Vec<Species<G>> {
        let generation = self.generation;
        let config = &self.population_config;
        let mut species = self.species.clone();
        for s in &mut species {
            s.update_stagnation(&self.genomes, generation);
        }
        species.retain(|s| {
            let keep = !s.is_stagnant(generation, config) || s.members().any(|id| id == champion);
            if !keep {
                debug!(
                    "species {} culled after {} generations without improvement",
                    s.id(),
                    s.time_stagnated(generation)
                );
            }
            keep
        });
        species
    }

    /// Allot the number of offspring for each species,
    /// proportionally to their adjusted fitness.
    fn allot_offspring(&self, species: &[Species<G>], champion: GenomeId) -> Vec<usize> {
        let adjusted: Vec<f32> = species
            .iter()
            .map(|s| s.adjusted_fitness(&self.genomes))
            .collect();
        let shares: Vec<f64> = if adjusted.iter().any(|f| *f > 0.0) {
            adjusted.iter().map(|f| *f as f64).collect()
        } else {
            species.iter().map(|s| s.len() as f64).collect()
        };
        let mut allotted = apportion(&shares, &adjusted, self.population_config.size.get());

        let champion_species = species
            .iter()
            .position(|s| s.members().any(|id| id == champion));
        if let Some(index) = champion_species {
            if allotted[index] == 0 {
                let donor = (0..allotted.len()).max_by_key(|&i| (allotted[i], Reverse(i)));
                if let Some(donor) = donor {
                    allotted[donor] -= 1;
                    allotted[index] += 1;
                }
            }
        }
        allotted
    }

    /// Assigns every genome to a species based on genetic
    /// distance to species representatives, founding new
    /// species as needed, then drops empty species and
    /// elects new representatives.
    fn speciate(&mut self) {
        for species in &mut self.species {
            species.members.clear();
        }
        let threshold = self.population_config.compatibility_threshold;
        for (id, genome) in &self.genomes {
            let compatible = self
                .species
                .iter_mut()
                .find(|s| s.genetic_distance(genome, &self.genetic_config) <= threshold);
            match compatible {
                Some(species) => species.members.push(*id),
                None => {
                    let species_id = SpeciesId(self.next_species_id);
                    self.next_species_id += 1;
                    debug!("species {} founded by genome {}", species_id, id);
                    self.species
                        .push(Species::new(species_id, *id, genome.clone(), self.generation));
                }
            }
        }
        self.species.retain(|s| {
            if s.is_empty() {
                debug!("species {} went extinct", s.id());
            }
            !s.is_empty()
        });
        for species in &mut self.species {
            species.elect_representative(&self.genomes, &self.genetic_config);
        }
    }

    /// Resets the population to an initial randomized state.
    /// Used primarily in case of population degeneration.
    pub fn reset(&mut self)
    where
        C: Clone,
    {
        *self = Population::new(self.population_config.clone(), self.genetic_config.clone());
    }

    /// Returns the currently best-performing genome
    /// and its ID, the lowest ID winning ties.
    pub fn champion(&self) -> Option<(GenomeId, &G)> {
        self.genomes
            .iter()
            .min_by(|(id1, g1), (id2, g2)| species::rank(**id1, *g1, **id2, *g2))
            .map(|(id, genome)| (*id, genome))
    }

    /// Returns all current genomes, by ID.
    pub fn genomes(&self) -> &BTreeMap<GenomeId, G> {
        &self.genomes
    }

    /// Returns the genome with the specified ID, if it is alive.
    pub fn genome(&self, id: GenomeId) -> Option<&G> {
        self.genomes.get(&id)
    }

    /// Returns an iterator over all current species,
    /// in ascending ID order.
    pub fn species(&self) -> impl Iterator<Item = &Species<G>> {
        self.species.iter()
    }

    /// Returns the species the genome belongs to.
    pub fn species_of(&self, id: GenomeId) -> Option<&Species<G>> {
        self.species.iter().find(|s| s.members().any(|m| m == id))
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's innovation history.
    pub fn history(&self) -> &H {
        &self.history
    }

    /// Returns the current phase of the evaluation cycle.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    pub fn genetic_config(&self) -> &C {
        &self.genetic_config
    }
}

/// Fitness of a genome, with unevaluated genomes counting as 0.
pub(crate) fn fitness_of<G: Genome>(genome: &G) -> f32 {
    genome.fitness().unwrap_or(0.0)
}

fn sanitize_fitness(id: GenomeId, fitness: Option<f32>) -> f32 {
    match fitness {
        Some(f) if f.is_finite() && f >= 0.0 => f,
        Some(f) => {
            warn!("genome {} reported invalid fitness {}, using 0", id, f);
            0.0
        }
        None => {
            warn!("genome {} reported no fitness, using 0", id);
            0.0
        }
    }
}

/// Splits `total` into whole parts proportional to `shares`,
/// giving leftovers to the largest fractional parts. Ties go
/// to the higher `tiebreak` value, then to the lower index.
fn apportion(shares: &[f64], tiebreak: &[f32], total: usize) -> Vec<usize> {
    if shares.is_empty() {
        return vec![];
    }
    let sum: f64 = shares.iter().sum();
    let quotas: Vec<f64> = if sum > 0.0 {
        shares.iter().map(|s| s * total as f64 / sum).collect()
    } else {
        vec![total as f64 / shares.len() as f64; shares.len()]
    };
    let mut allotted: Vec<usize> = quotas.iter().map(|q| q.floor() as usize).collect();
    let remainder = total.saturating_sub(allotted.iter().sum());

    let mut order: Vec<usize> = (0..quotas.len()).collect();
    order.sort_by(|&a, &b| {
        let fraction_a = quotas[a] - quotas[a].floor();
        let fraction_b = quotas[b] - quotas[b].floor();
        fraction_b
            .total_cmp(&fraction_a)
            .then(tiebreak[b].total_cmp(&tiebreak[a]))
            .then(a.cmp(&b))
    });
    for i in 0..remainder {
        allotted[order[i % order.len()]] += 1;
    }
    allotted
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use rand::Rng;

    use std::num::NonZeroUsize;

    /// A one-dimensional genome, whose distance
    /// is the difference between values.
    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Scalar {
        pub value: f32,
        pub fitness: Option<f32>,
    }

    impl Scalar {
        pub fn at(value: f32) -> Scalar {
            Scalar {
                value,
                fitness: None,
            }
        }
    }

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub(crate) struct ScalarConfig {
        pub spread: f32,
        pub step: f32,
    }

    /// Counts mutations.
    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    pub(crate) struct Mutations(pub usize);

    impl InnovationHistory for Mutations {
        type Config = ScalarConfig;

        fn new(_config: &ScalarConfig) -> Mutations {
            Mutations(0)
        }
    }

    impl Genome for Scalar {
        type Config = ScalarConfig;
        type InnovationHistory = Mutations;

        fn new<R: Rng + ?Sized>(config: &ScalarConfig, rng: &mut R) -> Scalar {
            Scalar::at(rng.gen_range(-1.0f32..=1.0) * config.spread)
        }

        fn genetic_distance(first: &Scalar, second: &Scalar, _config: &ScalarConfig) -> f32 {
            (first.value - second.value).abs()
        }

        fn mate<R: Rng + ?Sized>(
            parent1: &Scalar,
            parent2: &Scalar,
            _config: &ScalarConfig,
            _rng: &mut R,
        ) -> Scalar {
            Scalar::at((parent1.value + parent2.value) / 2.0)
        }

        fn mutate<R: Rng + ?Sized>(
            &mut self,
            history: &mut Mutations,
            config: &ScalarConfig,
            _rng: &mut R,
        ) {
            self.value += config.step;
            history.0 += 1;
        }

        fn set_fitness(&mut self, fitness: f32) {
            self.fitness = Some(fitness);
        }

        fn clear_fitness(&mut self) {
            self.fitness = None;
        }

        fn fitness(&self) -> Option<f32> {
            self.fitness
        }

        fn size(&self) -> usize {
            1
        }
    }

    pub(crate) type ScalarPopulation = Population<ScalarConfig, Mutations, Scalar>;

    pub(crate) fn population(config: PopulationConfig) -> ScalarPopulation {
        Population::new(
            config,
            ScalarConfig {
                spread: 1.0,
                step: 0.5,
            },
        )
    }

    fn breeding_config(size: usize, compatibility_threshold: f32) -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(size).unwrap(),
            compatibility_threshold,
            elitism: 1,
            survival_threshold: 0.5,
            stagnation_limit: 100,
            asexual_reproduction_chance: 0.5,
            crossover_chance: 0.5,
            interspecies_mating_chance: 0.1,
            seed: Some(1),
        }
    }

    fn assert_consistent(population: &ScalarPopulation, size: usize) {
        assert_eq!(population.genomes().len(), size);
        let mut members: Vec<GenomeId> = population.species().flat_map(|s| s.members()).collect();
        members.sort();
        assert_eq!(members, population.genomes().keys().copied().collect::<Vec<_>>());
        assert!(population
            .species()
            .zip(population.species().skip(1))
            .all(|(a, b)| a.id() < b.id()));
    }

    #[test]
    fn size_is_constant_with_single_species() {
        let mut population = population(breeding_config(10, 100.0));
        for generation in 0..5 {
            population.evaluate_fitness(|_, g| Some(g.value + 10.0));
            population.evolve().unwrap();
            assert_eq!(population.generation(), generation + 1);
            assert_eq!(population.species().count(), 1);
            assert_consistent(&population, 10);
        }
    }

    #[test]
    fn size_is_constant_with_many_species() {
        let mut population = population(breeding_config(30, 0.1));
        assert!(population.species().count() > 1);
        for _ in 0..5 {
            population.evaluate_fitness(|id, _| Some((id.0 % 7) as f32));
            population.evolve().unwrap();
            assert_consistent(&population, 30);
        }
    }

    #[test]
    fn evolve_requires_evaluation() {
        let mut population = population(breeding_config(5, 100.0));
        assert_eq!(population.phase(), Phase::AwaitingEvaluation);
        assert_eq!(population.evolve(), Err(EvolutionError::NotEvaluated));

        population.evaluate_fitness(|_, _| Some(1.0));
        assert_eq!(population.phase(), Phase::Evaluated);
        assert_eq!(population.evolve(), Ok(()));
        assert_eq!(population.evolve(), Err(EvolutionError::NotEvaluated));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut population = population(PopulationConfig {
            crossover_chance: -0.5,
            ..breeding_config(5, 100.0)
        });
        population.evaluate_fitness(|_, _| Some(1.0));
        assert!(matches!(
            population.evolve(),
            Err(EvolutionError::InvalidConfig(_))
        ));
    }

    #[test]
    fn champion_survives_unchanged() {
        let mut population = population(PopulationConfig {
            elitism: 0,
            asexual_reproduction_chance: 1.0,
            ..breeding_config(12, 0.3)
        });
        population.evaluate_fitness(|_, g| Some(g.value + 2.0));
        let (champion_id, champion) = population.champion().unwrap();
        let champion_value = champion.value;

        population.evolve().unwrap();
        let survivor = population.genome(champion_id).unwrap();
        assert_eq!(survivor.value, champion_value);
        assert_eq!(survivor.fitness, None);
        // Every other genome is a mutated copy with a fresh ID.
        assert!(population
            .genomes()
            .keys()
            .filter(|id| **id != champion_id)
            .all(|id| id.0 >= 12));
    }

    #[test]
    fn invalid_fitness_is_replaced_by_zero() {
        let mut population = population(breeding_config(4, 100.0));
        population.evaluate_fitness(|id, _| match id.0 {
            0 => None,
            1 => Some(f32::NAN),
            2 => Some(-3.0),
            _ => Some(f32::INFINITY),
        });
        assert!(population.genomes().values().all(|g| g.fitness == Some(0.0)));
    }

    #[test]
    fn parallel_evaluation_matches_sequential() {
        let mut sequential = population(breeding_config(20, 0.5));
        let mut parallel = population(breeding_config(20, 0.5));
        sequential.evaluate_fitness(|id, g| Some(g.value.abs() * id.0 as f32));
        parallel.par_evaluate_fitness(|id, g| Some(g.value.abs() * id.0 as f32));
        assert_eq!(sequential.genomes(), parallel.genomes());
        assert_eq!(parallel.phase(), Phase::Evaluated);
    }

    #[test]
    fn evolution_is_deterministic_for_fixed_seed() {
        let run = || {
            let mut population = population(breeding_config(25, 0.4));
            for _ in 0..4 {
                population.evaluate_fitness(|_, g| Some(g.value + 5.0));
                population.evolve().unwrap();
            }
            (
                population.genomes().clone(),
                population.species().map(|s| s.id()).collect::<Vec<_>>(),
            )
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn stagnant_species_without_champion_is_removed() {
        let seeds = vec![
            Scalar::at(0.0),
            Scalar::at(0.1),
            Scalar::at(10.0),
            Scalar::at(10.1),
        ];
        let config = PopulationConfig {
            size: NonZeroUsize::new(4).unwrap(),
            compatibility_threshold: 0.5,
            survival_threshold: 1.0,
            stagnation_limit: 0,
            asexual_reproduction_chance: 0.5,
            crossover_chance: 0.5,
            seed: Some(9),
            ..PopulationConfig::zero()
        };
        let mut population: ScalarPopulation =
            Population::new_seeded(seeds, config, ScalarConfig::default()).unwrap();
        assert_eq!(population.species().count(), 2);

        let fitness = |_: GenomeId, g: &Scalar| Some(if g.value < 5.0 { 5.0 } else { 1.0 });
        population.evaluate_fitness(fitness);
        population.evolve().unwrap();
        assert_eq!(
            population.species().map(|s| s.len()).collect::<Vec<_>>(),
            vec![3, 1]
        );

        // Neither species improves, but only the second lacks the champion.
        population.evaluate_fitness(fitness);
        population.evolve().unwrap();
        let species: Vec<_> = population.species().collect();
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].id(), SpeciesId(0));
        assert!(population.genomes().values().all(|g| g.value < 5.0));
        assert_consistent(&population, 4);
    }

    #[test]
    fn culling_leaves_current_species_untouched() {
        let seeds = vec![
            Scalar::at(0.0),
            Scalar::at(0.1),
            Scalar::at(10.0),
            Scalar::at(10.1),
        ];
        let config = PopulationConfig {
            size: NonZeroUsize::new(4).unwrap(),
            compatibility_threshold: 0.5,
            survival_threshold: 1.0,
            stagnation_limit: 0,
            asexual_reproduction_chance: 0.5,
            crossover_chance: 0.5,
            seed: Some(9),
            ..PopulationConfig::zero()
        };
        let mut population: ScalarPopulation =
            Population::new_seeded(seeds, config, ScalarConfig::default()).unwrap();
        population.evaluate_fitness(|_, g| Some(if g.value < 5.0 { 5.0 } else { 1.0 }));
        population.evolve().unwrap();

        population.evaluate_fitness(|_, g| Some(if g.value < 5.0 { 6.0 } else { 1.0 }));
        let champion = population.champion().unwrap().0;
        let survivors = population.surviving_species(champion);
        assert_eq!(survivors.len(), 1);
        assert_eq!(survivors[0].id(), SpeciesId(0));
        assert_eq!(survivors[0].best_fitness(), Some(6.0));
        assert_eq!(survivors[0].last_improved(), 1);

        let species: Vec<_> = population.species().collect();
        assert_eq!(
            species.iter().map(|s| s.len()).collect::<Vec<_>>(),
            vec![3, 1]
        );
        assert_eq!(species[0].best_fitness(), Some(5.0));
        assert_eq!(species[0].last_improved(), 0);
        assert_eq!(species[1].best_fitness(), Some(1.0));
    }

    #[test]
    fn seeding() {
        let seeds = vec![Scalar::at(42.0), Scalar::at(43.0)];
        let population: ScalarPopulation = Population::new_seeded(
            seeds.clone(),
            breeding_config(5, 0.5),
            ScalarConfig::default(),
        )
        .unwrap();
        assert_eq!(population.genome(GenomeId(0)), Some(&seeds[0]));
        assert_eq!(population.genome(GenomeId(1)), Some(&seeds[1]));
        assert_eq!(population.genomes().len(), 5);

        let overfull: Option<ScalarPopulation> = Population::new_seeded(
            vec![Scalar::at(0.0); 6],
            breeding_config(5, 0.5),
            ScalarConfig::default(),
        );
        assert!(overfull.is_none());
    }

    #[test]
    fn apportion_largest_remainder() {
        let shares = [5.25, 9.5, 2.75, 1.25, 2.25, 2.75, 6.25, 1.0, 1.0];
        let allotted = apportion(&shares, &[0.0; 9], 32);
        assert_eq!(allotted.iter().sum::<usize>(), 32);
        assert_eq!(allotted, [5, 10, 3, 1, 2, 3, 6, 1, 1]);

        assert_eq!(apportion(&[1.0, 1.0, 1.0], &[0.0; 3], 10), [4, 3, 3]);
        assert_eq!(apportion(&[1.0, 1.0, 1.0], &[0.0, 0.0, 1.0], 10), [3, 3, 4]);
        assert_eq!(apportion(&[0.0, 0.0], &[0.0; 2], 3), [2, 1]);
    }

    #[test]
    fn zero_fitness_is_apportioned_by_member_count() {
        let mut population = population(breeding_config(12, 0.2));
        population.evaluate_fitness(|_, _| Some(0.0));
        let champion = population.champion().unwrap().0;
        let species: Vec<_> = population.species().cloned().collect();
        let allotted = population.allot_offspring(&species, champion);
        let expected: Vec<usize> = population.species().map(|s| s.len()).collect();
        assert_eq!(allotted, expected);
    }
}

use rand::Rng;

/// An interface for genomes that can be evolved by a [`Population`].
///
/// The population never looks inside a genome: structure, crossover
/// and mutation are left to the implementor, while the population
/// handles identity, speciation and selection.
///
/// [`Population`]: crate::Population
pub trait Genome: Clone {
    type Config;
    type InnovationHistory: InnovationHistory<Config = Self::Config>;

    /// Returns a genome with the minimal initial topology
    /// and randomized parameters.
    fn new<R: Rng + ?Sized>(config: &Self::Config, rng: &mut R) -> Self;

    /// Returns the genetic (compatibility) distance between two genomes.
    ///
    /// Must be symmetric, and zero for identical genomes.
    fn genetic_distance(first: &Self, second: &Self, config: &Self::Config) -> f32;

    /// Combines two genomes and returns a "child" genome.
    /// No new structure may be introduced.
    fn mate<R: Rng + ?Sized>(
        parent1: &Self,
        parent2: &Self,
        config: &Self::Config,
        rng: &mut R,
    ) -> Self;

    /// Applies the configured mutations to the genome,
    /// registering structural innovations in `history`.
    fn mutate<R: Rng + ?Sized>(
        &mut self,
        history: &mut Self::InnovationHistory,
        config: &Self::Config,
        rng: &mut R,
    );

    /// Chance that a child produced by sexual reproduction
    /// is passed through [`mutate`](Genome::mutate).
    /// Asexual offspring are always mutated.
    fn child_mutation_chance(_config: &Self::Config) -> f32 {
        1.0
    }

    /// Makes `history` aware of the structure carried by a genome
    /// that was created outside of it, e.g. loaded from disk,
    /// so that later innovations do not collide with it.
    fn register_innovations(&self, _history: &mut Self::InnovationHistory) {}

    /// Sets the genome's fitness value.
    ///
    /// Should make sure that the fitness value is ≥0;
    /// the population sanitizes it before calling this.
    fn set_fitness(&mut self, fitness: f32);

    /// Forgets the genome's fitness, e.g. when it is
    /// carried over into a new generation.
    fn clear_fitness(&mut self);

    /// Returns the genome's fitness value, if it has been evaluated.
    fn fitness(&self) -> Option<f32>;

    /// Returns a measure of the genome's size, used for
    /// logging statistics.
    fn size(&self) -> usize;
}

/// An Innovation History is used to keep track
/// of genetic innovations throughout successive
/// generations of genomes.
///
/// The exact function and utility of the
/// InnovationHistory is left to the implementor.
pub trait InnovationHistory {
    type Config;

    fn new(config: &Self::Config) -> Self;
}

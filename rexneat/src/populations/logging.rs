use super::{fitness_of, Population, SpeciesId};

use crate::genome::{Genome, InnovationHistory};

use serde::{Deserialize, Serialize};

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportingLevel {
    /// Clones the entire population.
    AllGenomes,
    /// Clones species and their champions.
    SpeciesChampions,
    /// Clones only the population champion.
    PopulationChampion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of a population.
#[derive(Clone, Debug)]
pub struct Log<G> {
    pub generation_number: usize,
    pub generation_sample: GenerationMemberRecord<G>,
    pub species_count: usize,
    pub fitness: Stats,
    pub size: Stats,
}

impl<G> fmt::Display for Log<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration_number: {:?}\n\
            \tspecies_count: {:?}\n\
            \tfitness: {:?}\n\
            \tsize: {:?}\n\
            }}",
            &self.generation_number, &self.species_count, &self.fitness, &self.size,
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// An empty sequence yields all zeros.
    ///
    /// # Examples
    /// ```
    /// use rexneat::logging::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f32>) -> Stats {
        let mut data: Vec<f32> = data.collect();
        if data.is_empty() {
            return Stats::default();
        }
        data.sort_unstable_by(f32::total_cmp);
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f32>() / data.len() as f32,
            median,
        }
    }
}

/// A reporting-level dependant store
/// of genomes from a population.
#[derive(Clone, Debug)]
pub enum GenerationMemberRecord<G> {
    /// Species IDs, genomes and stagnation level.
    Species(Vec<(SpeciesId, Vec<G>, usize)>),
    /// Only species IDs, species champions, and stagnation level.
    SpeciesChampions(Vec<(SpeciesId, G, usize)>),
    /// Only population champion.
    PopulationChampion(G),
    /// Empty.
    None,
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug)]
pub struct EvolutionLogger<G> {
    reporting_level: ReportingLevel,
    logs: Vec<Log<G>>,
}

impl<G: Genome> EvolutionLogger<G> {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger<G> {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of a population. Should be called
    /// after evaluation and before evolution, so that
    /// fitness statistics are meaningful.
    pub fn log<C, H>(&mut self, population: &Population<C, H, G>)
    where
        H: InnovationHistory<Config = C>,
        G: Genome<InnovationHistory = H, Config = C>,
    {
        let generation = population.generation();
        let genomes = population.genomes();
        let sample = match self.reporting_level {
            ReportingLevel::AllGenomes => GenerationMemberRecord::Species(
                population
                    .species()
                    .map(|s| {
                        (
                            s.id(),
                            s.members().filter_map(|id| population.genome(id)).cloned().collect(),
                            s.time_stagnated(generation),
                        )
                    })
                    .collect(),
            ),
            ReportingLevel::SpeciesChampions => GenerationMemberRecord::SpeciesChampions(
                population
                    .species()
                    .filter_map(|s| {
                        s.champion(genomes)
                            .map(|(_, g)| (s.id(), g.clone(), s.time_stagnated(generation)))
                    })
                    .collect(),
            ),
            ReportingLevel::PopulationChampion => match population.champion() {
                Some((_, champion)) => GenerationMemberRecord::PopulationChampion(champion.clone()),
                None => GenerationMemberRecord::None,
            },
            ReportingLevel::NoGenomes => GenerationMemberRecord::None,
        };
        self.logs.push(Log {
            generation_number: generation,
            generation_sample: sample,
            species_count: population.species().count(),
            fitness: Stats::from(genomes.values().map(fitness_of)),
            size: Stats::from(genomes.values().map(|g| g.size() as f32)),
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log<G>> {
        self.logs.iter()
    }

    /// Returns the most recent snapshot.
    pub fn last(&self) -> Option<&Log<G>> {
        self.logs.last()
    }
}

use super::{fitness_of, GenomeId, PopulationConfig};
use crate::Genome;

use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Species identifier. Allocated in increasing
/// order as species are founded, and never reused
/// within a run.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SpeciesId(pub u64);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by calculating
/// the genetic distance to a _representative_,
/// which is re-elected every generation as the member
/// closest to the previous representative.
///
/// Species stagnate after [`stagnation_limit`]
/// generations without improving their best fitness,
/// and are thereafter removed during reproduction
/// unless they hold the population champion.
///
/// Species do not own their members; they hold the
/// [`GenomeId`]s of genomes stored in the population.
///
/// [genetic distance]: PopulationConfig::compatibility_threshold
/// [`stagnation_limit`]: PopulationConfig::stagnation_limit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species<G> {
    id: SpeciesId,
    pub(super) members: Vec<GenomeId>,
    representative: G,
    representative_id: GenomeId,
    best_fitness: Option<f32>,
    last_improved: usize,
    created: usize,
}

impl<G: Genome> Species<G> {
    /// Creates a new species founded by the specified genome,
    /// which becomes its representative and only member.
    pub fn new(id: SpeciesId, founder_id: GenomeId, founder: G, generation: usize) -> Species<G> {
        Species {
            id,
            members: vec![founder_id],
            representative: founder,
            representative_id: founder_id,
            best_fitness: None,
            last_improved: generation,
            created: generation,
        }
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesId {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &G {
        &self.representative
    }

    /// Returns the ID the representative had when it was elected.
    /// The genome may no longer be part of the population.
    pub fn representative_id(&self) -> GenomeId {
        self.representative_id
    }

    /// Returns the genetic distance between the species'
    /// representative and `other`.
    pub fn genetic_distance<C>(&self, other: &G, config: &C) -> f32
    where
        G: Genome<Config = C>,
    {
        G::genetic_distance(&self.representative, other, config)
    }

    /// Returns an iterator over the IDs of the species' members.
    pub fn members(&self) -> impl Iterator<Item = GenomeId> + '_ {
        self.members.iter().copied()
    }

    /// Returns the number of members.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// Returns `true` if the species has no members.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Returns the generation in which the species was founded.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Returns the best member fitness ever recorded.
    pub fn best_fitness(&self) -> Option<f32> {
        self.best_fitness
    }

    /// Returns the generation in which the species last improved.
    pub fn last_improved(&self) -> usize {
        self.last_improved
    }

    /// Returns the number of generations the species
    /// has gone without improving, as of `generation`.
    pub fn time_stagnated(&self, generation: usize) -> usize {
        generation.saturating_sub(self.last_improved)
    }

    /// Returns whether the species is stagnant as of `generation`.
    pub fn is_stagnant(&self, generation: usize, config: &PopulationConfig) -> bool {
        self.time_stagnated(generation) > config.stagnation_limit
    }

    /// Returns the species' _member-count adjusted_
    /// fitness. I.e., the average of the species'
    /// genomes' fitnesses.
    pub fn adjusted_fitness(&self, genomes: &BTreeMap<GenomeId, G>) -> f32 {
        if self.members.is_empty() {
            return 0.0;
        }
        self.member_genomes(genomes)
            .map(|(_, g)| fitness_of(g))
            .sum::<f32>()
            / self.members.len() as f32
    }

    /// Returns the currently best-performing member,
    /// the lowest ID winning ties.
    pub fn champion<'a>(&self, genomes: &'a BTreeMap<GenomeId, G>) -> Option<(GenomeId, &'a G)> {
        self.member_genomes(genomes)
            .min_by(|(id1, g1), (id2, g2)| rank(*id1, *g1, *id2, *g2))
    }

    /// Returns the member IDs ordered from fittest
    /// to least fit, lower IDs first on ties.
    pub(super) fn ranked_members(&self, genomes: &BTreeMap<GenomeId, G>) -> Vec<GenomeId> {
        let mut ranked: Vec<(GenomeId, &G)> = self.member_genomes(genomes).collect();
        ranked.sort_by(|(id1, g1), (id2, g2)| rank(*id1, *g1, *id2, *g2));
        ranked.into_iter().map(|(id, _)| id).collect()
    }

    /// Updates the species' record of maximum
    /// fitness, to keep track of stagnation.
    pub(super) fn update_stagnation(&mut self, genomes: &BTreeMap<GenomeId, G>, generation: usize) {
        let best = self
            .member_genomes(genomes)
            .map(|(_, g)| fitness_of(g))
            .max_by(f32::total_cmp);
        if let Some(best) = best {
            if self.best_fitness.map_or(true, |record| best > record) {
                self.best_fitness = Some(best);
                self.last_improved = generation;
            }
        }
    }

    /// Elects the member closest to the previous
    /// representative as the new representative.
    pub(super) fn elect_representative<C>(&mut self, genomes: &BTreeMap<GenomeId, G>, config: &C)
    where
        G: Genome<Config = C>,
    {
        let closest = self
            .member_genomes(genomes)
            .map(|(id, g)| (id, g, self.genetic_distance(g, config)))
            .min_by(|(id1, _, d1), (id2, _, d2)| d1.total_cmp(d2).then(id1.cmp(id2)))
            .map(|(id, g, _)| (id, g.clone()));
        if let Some((id, genome)) = closest {
            self.representative = genome;
            self.representative_id = id;
        }
    }

    /// Returns the number of members copied unchanged
    /// into a brood of size `allotted`.
    pub(super) fn count_elite(&self, config: &PopulationConfig, allotted: usize) -> usize {
        self.members.len().min(config.elitism).min(allotted)
    }

    /// Returns the number of top members eligible for mating.
    pub(super) fn count_survivors(&self, config: &PopulationConfig) -> usize {
        ((self.members.len() as f32 * config.survival_threshold).ceil() as usize)
            .clamp(1, self.members.len().max(1))
    }

    fn member_genomes<'s, 'g: 's>(
        &'s self,
        genomes: &'g BTreeMap<GenomeId, G>,
    ) -> impl Iterator<Item = (GenomeId, &'g G)> + 's {
        self.members
            .iter()
            .filter_map(move |id| genomes.get(id).map(|g| (*id, g)))
    }
}

/// Fitter genomes first, lower IDs first among equals.
pub(super) fn rank<G: Genome>(id1: GenomeId, g1: &G, id2: GenomeId, g2: &G) -> Ordering {
    fitness_of(g2)
        .total_cmp(&fitness_of(g1))
        .then(id1.cmp(&id2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::populations::tests::{Scalar, ScalarConfig};

    fn genomes(fitnesses: &[f32]) -> BTreeMap<GenomeId, Scalar> {
        fitnesses
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let mut g = Scalar::at(i as f32);
                g.fitness = Some(*f);
                (GenomeId(i as u64), g)
            })
            .collect()
    }

    fn species_of(genomes: &BTreeMap<GenomeId, Scalar>) -> Species<Scalar> {
        let mut species = Species::new(SpeciesId(0), GenomeId(0), genomes[&GenomeId(0)].clone(), 0);
        species.members = genomes.keys().copied().collect();
        species
    }

    #[test]
    fn champion_prefers_lowest_id_on_ties() {
        let genomes = genomes(&[1.0, 4.0, 2.0, 4.0]);
        let species = species_of(&genomes);
        assert_eq!(species.champion(&genomes).map(|(id, _)| id), Some(GenomeId(1)));
        assert_eq!(
            species.ranked_members(&genomes),
            vec![GenomeId(1), GenomeId(3), GenomeId(2), GenomeId(0)]
        );
    }

    #[test]
    fn adjusted_fitness_is_mean() {
        let genomes = genomes(&[1.0, 2.0, 6.0]);
        let species = species_of(&genomes);
        assert_eq!(species.adjusted_fitness(&genomes), 3.0);
    }

    #[test]
    fn stagnation_clock() {
        let mut genomes = genomes(&[1.0, 2.0]);
        let mut species = species_of(&genomes);
        let config = PopulationConfig {
            stagnation_limit: 2,
            ..PopulationConfig::zero()
        };

        species.update_stagnation(&genomes, 0);
        assert_eq!(species.best_fitness(), Some(2.0));
        for generation in 1..=2 {
            species.update_stagnation(&genomes, generation);
            assert!(!species.is_stagnant(generation, &config));
        }
        species.update_stagnation(&genomes, 3);
        assert!(species.is_stagnant(3, &config));

        genomes.get_mut(&GenomeId(0)).unwrap().fitness = Some(3.0);
        species.update_stagnation(&genomes, 4);
        assert_eq!(species.last_improved(), 4);
        assert!(!species.is_stagnant(4, &config));
    }

    #[test]
    fn representative_is_closest_member() {
        let mut genomes = genomes(&[0.0, 0.0, 0.0]);
        genomes.insert(GenomeId(7), Scalar::at(0.9));
        let mut species = Species::new(SpeciesId(0), GenomeId(9), Scalar::at(0.92), 0);
        species.members = genomes.keys().copied().collect();
        species.elect_representative(&genomes, &ScalarConfig::default());
        assert_eq!(species.representative_id(), GenomeId(7));
    }

    #[test]
    fn survivors_and_elite() {
        let genomes = genomes(&[0.0; 5]);
        let species = species_of(&genomes);
        let config = PopulationConfig {
            elitism: 3,
            survival_threshold: 0.3,
            ..PopulationConfig::zero()
        };
        assert_eq!(species.count_survivors(&config), 2);
        assert_eq!(species.count_elite(&config, 2), 2);
        assert_eq!(species.count_elite(&config, 10), 3);
        let config = PopulationConfig {
            survival_threshold: 0.0,
            ..config
        };
        assert_eq!(species.count_survivors(&config), 1);
    }
}

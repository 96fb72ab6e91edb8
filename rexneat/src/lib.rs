//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! The crate is generic over the evolved representation: any type
//! implementing [`Genome`] can be grouped into species, selected and
//! bred by a [`Population`]. A neural network-based genome
//! representation, with the innovation history, mutation operators and
//! network evaluators used to control an endless-runner agent, is
//! supplied by the `rexneat-nn` crate.
//!
//! A population moves through a fixed cycle:
//! 1. every genome is scored by [`Population::evaluate_fitness`]
//!    (or [`Population::par_evaluate_fitness`] on the rayon pool),
//! 2. [`Population::evolve`] culls stagnant species, apportions
//!    offspring, breeds them and re-speciates the new generation.
//!
//! Runs are reproducible: with [`PopulationConfig::seed`] set, every
//! random decision is drawn from one seeded generator, whose state is
//! part of the population snapshot written by [`Population::save`].

mod genome;
mod populations;
pub mod rng;

pub use genome::*;
pub use populations::*;

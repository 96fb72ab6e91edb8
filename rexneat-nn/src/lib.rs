//! # RexNEAT-NN
//! A neural network-based implementation of the [`rexneat`] crate's `Genome` trait.
//!
//! Provides an [`NNGenome`] type usable in `rexneat` `Population`s, two neural
//! network implementations which can be generated from an [`NNGenome`], and a
//! [`Controller`] that drives an endless-runner agent with them:
//! - [`FeedForwardNetwork`]: acyclic networks evaluated in one pass over a
//!   cached topological order.
//! - [`RecurrentNetwork`]: arbitrary networks advanced one step per activation,
//!   keeping state between steps.
//!
//! [`NNGenome`]: crate::genomics::NNGenome
//! [`Controller`]: crate::controller::Controller
//! [`FeedForwardNetwork`]: crate::networks::FeedForwardNetwork
//! [`RecurrentNetwork`]: crate::networks::RecurrentNetwork
//!
//! # Example usage: evolving an obstacle reflex
//! ```
//! use rexneat::{Population, PopulationConfig};
//! use rexneat_nn::{
//!     controller::{Action, Controller, Sensors},
//!     genomics::{GeneticConfig, History, NNGenome},
//! };
//! use std::num::NonZeroUsize;
//!
//! // Rewards jumping when an obstacle is close, and running otherwise.
//! fn evaluate(controller: &mut Controller, id: rexneat::GenomeId, genome: &NNGenome) -> f32 {
//!     (0..=10)
//!         .map(|d| d as f32 / 10.0)
//!         .filter(|&distance| {
//!             let sensors = Sensors { distance, obstacle_type: 0.2, ..Sensors::default() };
//!             let expected = if distance < 0.3 { Action::Jump } else { Action::Run };
//!             controller.action(id, genome, &sensors) == expected
//!         })
//!         .count() as f32
//! }
//!
//! let genetic_config = GeneticConfig::default();
//! let population_config = PopulationConfig {
//!     size: NonZeroUsize::new(30).unwrap(),
//!     seed: Some(42),
//!     ..PopulationConfig::default()
//! };
//!
//! let mut population = Population::<_, History, NNGenome>::new(population_config, genetic_config.clone());
//! let mut controller = Controller::new(genetic_config);
//!
//! for _ in 0..5 {
//!     population.evaluate_fitness(|id, genome| Some(evaluate(&mut controller, id, genome)));
//!     population.evolve().unwrap();
//!     controller.retain(|id| population.genome(id).is_some());
//! }
//!
//! assert_eq!(population.genomes().len(), 30);
//! assert_eq!(population.generation(), 5);
//! ```

pub mod controller;
pub mod genomics;
pub mod networks;

/// Innovation number of a connection gene.
pub type Innovation = usize;
/// Node identifier: negative for sensors, `0..output_count`
/// for actuators, and above for hidden nodes.
pub type NodeId = i64;

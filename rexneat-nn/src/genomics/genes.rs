use crate::genomics::GeneticConfig;
use crate::{Innovation, NodeId};

use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Connection genes are the principal components of genomes.
/// They are created between two nodes, and become
/// network connections in the genome's phenotype.
///
/// A gene is identified by its `(source, target)` pair, which
/// maps to the same innovation number everywhere in a run.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    source: NodeId,
    target: NodeId,
    weight: f32,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, -1, 3, 2.5);
    /// assert_eq!(gene.endpoints(), (-1, 3));
    /// assert!(gene.enabled());
    /// ```
    pub fn new(innovation: Innovation, source: NodeId, target: NodeId, weight: f32) -> ConnectionGene {
        ConnectionGene {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight within the configured bound.
    pub(super) fn random_weight<R: Rng + ?Sized>(config: &GeneticConfig, rng: &mut R) -> f32 {
        if config.weight_bound > 0.0 {
            rng.gen_range(-config.weight_bound..=config.weight_bound)
        } else {
            0.0
        }
    }

    /// Replaces the gene's weight with a random value.
    pub fn randomize_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight = Self::random_weight(config, rng);
    }

    /// Randomly perturbs the gene's weight by at most
    /// `weight_mutation_power`, staying within `weight_bound`.
    pub fn perturb_weight<R: Rng + ?Sized>(&mut self, config: &GeneticConfig, rng: &mut R) {
        self.weight = perturb(self.weight, config, rng);
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn source(&self) -> NodeId {
        self.source
    }

    pub fn target(&self) -> NodeId {
        self.target
    }

    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

/// Adds a bounded uniform delta to `value`.
pub(super) fn perturb<R: Rng + ?Sized>(value: f32, config: &GeneticConfig, rng: &mut R) -> f32 {
    let delta = if config.weight_mutation_power > 0.0 {
        rng.gen_range(-config.weight_mutation_power..=config.weight_mutation_power)
    } else {
        0.0
    };
    (value + delta).clamp(-config.weight_bound, config.weight_bound)
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

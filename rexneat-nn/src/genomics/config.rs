use crate::genomics::{ActivationType, AggregationType};

use rexneat::{check_probability, ConfigError};
use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation
/// and inter-genome operations.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]; [`validate`]
/// reports those that are not.
///
/// [`validate`]: GeneticConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Activation function of hidden and output nodes.
    pub activation: ActivationType,
    /// Aggregation rule of hidden and output nodes.
    pub aggregation: AggregationType,
    /// Weight of disjoint genes in genetic distance (c1).
    pub disjoint_gene_factor: f32,
    /// Weight of excess genes in genetic distance (c2).
    pub excess_gene_factor: f32,
    /// Weight of the mean matching-gene weight difference
    /// in genetic distance (c3).
    pub common_weight_factor: f32,
    /// Genomes smaller than this are not size-normalized
    /// when computing genetic distance.
    pub normalization_floor: usize,
    /// Maximum magnitude of connection weights and node biases.
    pub weight_bound: f32,
    /// Magnitude of bound on weight mutation uniform distribution.
    pub weight_mutation_power: f32,
    /// Per-connection chance of its weight being replaced.
    pub weight_replace_chance: f32,
    /// Per-connection chance of its weight being perturbed, if not replaced.
    pub weight_perturb_chance: f32,
    /// Per-node chance of its bias being perturbed.
    pub bias_perturb_chance: f32,
    /// Chance of a node addition mutation taking place.
    pub add_node_chance: f32,
    /// Chance of a connection addition mutation taking place.
    pub add_connection_chance: f32,
    /// Chance of a random connection being enabled or disabled.
    pub toggle_enable_chance: f32,
    /// Maximum number of connection addition attempts before
    /// mutation gives up.
    pub max_add_connection_attempts: usize,
    /// Chance of child mutation during mating.
    pub child_mutation_chance: f32,
    /// Chance that common gene weights are averaged during mating,
    /// instead of copying the weight from a randomly chosen parent.
    pub mate_by_averaging_chance: f32,
    /// Chance that a gene disabled in either parent
    /// is disabled in the child.
    pub disable_inherited_chance: f32,
    /// Whether genomes must stay acyclic.
    pub feed_forward: bool,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, false, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig {
    ///     // Specify some values here...
    ///     add_node_chance: 0.5,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// assert!(cfg.validate().is_ok());
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            activation: ActivationType::Sigmoid,
            aggregation: AggregationType::Sum,
            disjoint_gene_factor: 0.0,
            excess_gene_factor: 0.0,
            common_weight_factor: 0.0,
            normalization_floor: 0,
            weight_bound: 0.0,
            weight_mutation_power: 0.0,
            weight_replace_chance: 0.0,
            weight_perturb_chance: 0.0,
            bias_perturb_chance: 0.0,
            add_node_chance: 0.0,
            add_connection_chance: 0.0,
            toggle_enable_chance: 0.0,
            max_add_connection_attempts: 0,
            child_mutation_chance: 0.0,
            mate_by_averaging_chance: 0.0,
            disable_inherited_chance: 0.0,
            feed_forward: false,
        }
    }

    /// Checks every probability lies in [0, 1] and
    /// every magnitude is non-negative.
    ///
    /// # Examples
    /// ```
    /// use rexneat_nn::genomics::GeneticConfig;
    ///
    /// let cfg = GeneticConfig {
    ///     weight_bound: -1.0,
    ///     ..GeneticConfig::default()
    /// };
    /// assert!(cfg.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("weight_replace_chance", self.weight_replace_chance),
            ("weight_perturb_chance", self.weight_perturb_chance),
            ("bias_perturb_chance", self.bias_perturb_chance),
            ("add_node_chance", self.add_node_chance),
            ("add_connection_chance", self.add_connection_chance),
            ("toggle_enable_chance", self.toggle_enable_chance),
            ("child_mutation_chance", self.child_mutation_chance),
            ("mate_by_averaging_chance", self.mate_by_averaging_chance),
            ("disable_inherited_chance", self.disable_inherited_chance),
        ] {
            check_probability(field, value)?;
        }
        for (field, value) in [
            ("disjoint_gene_factor", self.disjoint_gene_factor),
            ("excess_gene_factor", self.excess_gene_factor),
            ("common_weight_factor", self.common_weight_factor),
            ("weight_bound", self.weight_bound),
            ("weight_mutation_power", self.weight_mutation_power),
        ] {
            if !(value >= 0.0 && value.is_finite()) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.add_connection_chance > 0.0 && self.max_add_connection_attempts == 0 {
            return Err(ConfigError::Zero {
                field: "max_add_connection_attempts",
            });
        }
        Ok(())
    }
}

impl Default for GeneticConfig {
    /// Values suited to the endless-runner controller:
    /// 12 sensors, 3 actuators, sigmoid feed-forward networks.
    fn default() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(12).unwrap_or(NonZeroUsize::MIN),
            output_count: NonZeroUsize::new(3).unwrap_or(NonZeroUsize::MIN),
            activation: ActivationType::Sigmoid,
            aggregation: AggregationType::Sum,
            disjoint_gene_factor: 1.0,
            excess_gene_factor: 1.0,
            common_weight_factor: 0.4,
            normalization_floor: 20,
            weight_bound: 30.0,
            weight_mutation_power: 0.5,
            weight_replace_chance: 0.1,
            weight_perturb_chance: 0.8,
            bias_perturb_chance: 0.7,
            add_node_chance: 0.03,
            add_connection_chance: 0.05,
            toggle_enable_chance: 0.01,
            max_add_connection_attempts: 20,
            child_mutation_chance: 0.8,
            mate_by_averaging_chance: 0.4,
            disable_inherited_chance: 0.75,
            feed_forward: true,
        }
    }
}

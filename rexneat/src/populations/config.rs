use super::ConfigError;

use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Use
/// [`validate`] to check a configuration
/// before running a population with it.
///
/// [`validate`]: PopulationConfig::validate
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub compatibility_threshold: f32,
    /// Top n of each species which is copied
    /// as-is to the next generation. The population
    /// champion is always copied, even if this is 0.
    pub elitism: usize,
    /// Top fraction of each species which can
    /// participate in mating.
    pub survival_threshold: f32,
    /// Number of generations without a fitness increase
    /// after which a species is considered _stagnated_
    /// and removed (unless it holds the population champion).
    pub stagnation_limit: usize,
    /// Chance that an offspring is a mutated copy of
    /// a single parent.
    pub asexual_reproduction_chance: f32,
    /// Chance that two selected parents are actually
    /// recombined, instead of copying the fitter one.
    pub crossover_chance: f32,
    /// Chance that the second parent is taken from
    /// a different species.
    pub interspecies_mating_chance: f32,
    /// Seed for the population's random number generator.
    /// If `None`, the generator is seeded from entropy.
    pub seed: Option<u64>,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, empty, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use rexneat::PopulationConfig;
    ///
    /// let cfg1 = PopulationConfig::zero();
    ///
    /// let cfg2 = PopulationConfig {
    ///     // Specify some values here...
    ///     stagnation_limit: 15,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            compatibility_threshold: 0.0,
            elitism: 0,
            survival_threshold: 0.0,
            stagnation_limit: 0,
            asexual_reproduction_chance: 0.0,
            crossover_chance: 0.0,
            interspecies_mating_chance: 0.0,
            seed: None,
        }
    }

    /// Checks that every field holds a usable value.
    ///
    /// # Errors
    /// Returns the first offending field.
    ///
    /// # Examples
    /// ```
    /// use rexneat::PopulationConfig;
    ///
    /// assert!(PopulationConfig::default().validate().is_ok());
    /// assert!(PopulationConfig {
    ///     survival_threshold: 1.5,
    ///     ..PopulationConfig::default()
    /// }
    /// .validate()
    /// .is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.compatibility_threshold >= 0.0 && self.compatibility_threshold.is_finite()) {
            return Err(ConfigError::OutOfRange {
                field: "compatibility_threshold",
                value: self.compatibility_threshold,
            });
        }
        for (field, value) in [
            ("survival_threshold", self.survival_threshold),
            ("asexual_reproduction_chance", self.asexual_reproduction_chance),
            ("crossover_chance", self.crossover_chance),
            ("interspecies_mating_chance", self.interspecies_mating_chance),
        ] {
            check_probability(field, value)?;
        }
        Ok(())
    }
}

impl Default for PopulationConfig {
    fn default() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::new(50).unwrap_or(NonZeroUsize::MIN),
            compatibility_threshold: 3.0,
            elitism: 2,
            survival_threshold: 0.2,
            stagnation_limit: 15,
            asexual_reproduction_chance: 0.25,
            crossover_chance: 0.75,
            interspecies_mating_chance: 0.001,
            seed: None,
        }
    }
}

/// Fails if `value` is not a probability.
pub fn check_probability(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange { field, value })
    }
}

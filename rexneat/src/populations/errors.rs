use thiserror::Error;

use std::path::PathBuf;

/// Failures of a call to [`Population::evolve`].
///
/// [`Population::evolve`]: crate::Population::evolve
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvolutionError {
    #[error("attempted evolution before the generation was evaluated")]
    NotEvaluated,
    #[error("every species was culled due to stagnation")]
    NoSurvivingSpecies,
    #[error("offspring count {found} does not match the population size {expected}")]
    PopulationDrift { expected: usize, found: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
}

/// A configuration field holds an unusable value.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} = {value} is out of range")]
    OutOfRange { field: &'static str, value: f32 },
    #[error("{field} must not be zero")]
    Zero { field: &'static str },
}

/// Failures while saving or restoring population snapshots.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("no snapshot found at {0:?}")]
    NotFound(PathBuf),
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
    #[error("failed to encode snapshot: {0}")]
    Encode(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

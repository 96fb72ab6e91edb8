use crate::NodeId;

use thiserror::Error;

/// Reasons a connection cannot be added to a genome.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeneValidityError {
    #[error("connection {0:?} already exists")]
    DuplicateConnection((NodeId, NodeId)),
    #[error("node {0} is not part of the genome")]
    MissingNode(NodeId),
    #[error("connection into sensor {0}")]
    SensorTarget(NodeId),
    #[error("self-loop on node {0}")]
    SelfLoop(NodeId),
    #[error("connection {0:?} would create a cycle")]
    Cycle((NodeId, NodeId)),
}

/// Reasons a node cannot be added to a genome.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeValidityError {
    #[error("node {0} already exists")]
    DuplicateNode(NodeId),
    #[error("node {0} has an id reserved for another node type")]
    WrongIdRange(NodeId),
}

/// Structural mutations that found nothing to do.
/// [`NNGenome::mutate`] skips these silently.
///
/// [`NNGenome::mutate`]: crate::genomics::NNGenome
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    #[error("no valid connection found after {0} attempts")]
    NoConnectionFound(usize),
    #[error("genome has no enabled connection to split")]
    NothingToSplit,
    #[error("genome has no connections")]
    NoConnections,
}

/// Failures while activating a network.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("expected {expected} inputs, got {found}")]
    InputCount { expected: usize, found: usize },
    #[error("input {index} is not finite")]
    NonFiniteInput { index: usize },
    #[error("output {index} is not finite")]
    NonFiniteOutput { index: usize },
    #[error("genome contains a cycle through node {0}")]
    Cyclic(NodeId),
}

use crate::Innovation;

use thiserror::Error;

/// Reasons a node or connection cannot be inserted
/// into a genome, or two genomes cannot be mated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenomeError {
    #[error("duplicate node insertion with id {0}")]
    DuplicateNodeId(Innovation),
    #[error("duplicate connection insertion with innovation {0}")]
    DuplicateInnovation(Innovation),
    #[error("connection {0} shadows a connection of the same kind between {1} -> {2}")]
    DuplicateConnection(Innovation, Innovation, Innovation),
    #[error("connection insertion between nonexistent endpoint(s) {0} -> {1}")]
    NonexistentEndpoints(Innovation, Innovation),
    #[error("connection insertion with sensor node {0} as target")]
    SensorTarget(Innovation),
    #[error("parents have different inputs or outputs")]
    ShapeMismatch,
}

/// Reasons a structural mutation left the genome unchanged.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationError {
    #[error("no viable connection found in {0} attempts")]
    ConnectionAttemptsExhausted(usize),
    #[error("no enabled connection from a non-bias node to split")]
    NoSplittableConnection,
}

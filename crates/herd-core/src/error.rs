//! Simulation errors. Any of these aborts the run.

use crate::components::PersonId;
use crate::config::ConfigError;

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// A dead individual was handed to the interaction engine.
    #[error("individual {id} is dead and cannot take part in an interaction")]
    DeadParticipant { id: PersonId },
    #[error("no individual with id {id}")]
    UnknownIndividual { id: PersonId },
    /// The run already reached a stop condition.
    #[error("the simulation has already ended")]
    RunEnded,
    #[error("{0} resource is missing from the world")]
    MissingResource(&'static str),
    #[error("random source unavailable: {0}")]
    RandomSource(#[from] rand::Error),
    /// Writing events or output files failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

//! Shared event types and serialization for the herd immunity simulation.
//!
//! This crate contains pure data structures with no simulation logic.
//! It is a dependency for the simulation engine and anything that reads its
//! event logs.

pub mod event;
pub mod stats;

// Re-export event types
pub use event::*;

// Re-export statistics types
pub use stats::{PopulationCounts, RunStats};

//! Herd Immunity Simulation Engine Library
//!
//! An agent-based model of a virus spreading through a fixed population with
//! partial vaccination. Each step every infected individual meets random
//! living individuals, then faces a mortality draw. The run ends once nobody
//! is alive, everyone alive is vaccinated, or nobody alive is infected.
//!
//! # Modules
//!
//! - [`components`]: Individual health state and the virus resource
//! - [`setup`]: Population spawning and roster queries
//! - [`systems`]: Interaction engine and time-step driver
//! - [`simulation`]: The run loop and its stop conditions
//! - [`events`]: Event recorders (JSONL file, in memory)
//! - [`config`]: TOML configuration
//! - [`output`]: Run statistics

pub mod components;
pub mod config;
pub mod error;
pub mod events;
pub mod output;
pub mod setup;
pub mod simulation;
pub mod systems;

pub use components::*;
pub use config::{
    ConfigError, OutputConfig, PopulationConfig, RunConfig, SimulationConfig, VaccinationDraw,
    VirusConfig,
};
pub use error::SimError;
pub use events::{EventLogger, EventRecorder, EventStream, PendingEvents};
pub use simulation::{seeded_rng, RunState, RunSummary, Simulation};

// Re-export the event record types used in the public API
pub use herd_events::{
    Event, EventPayload, EventType, PopulationCounts, RunStats, StepSummary, StopReason,
};

//! Simulation Systems
//!
//! The interaction engine and the time-step driver built on it.

pub mod interaction;
pub mod step;

pub use interaction::{interact, InteractionOutcome};
pub use step::{resolve_survival, run_step, StepOutcome};

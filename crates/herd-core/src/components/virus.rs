//! Virus Resource
//!
//! The pathogen spreading through the population. Inserted once into the
//! world before the population is spawned and only ever read afterwards.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Virus {
    /// Identifier used only for reporting
    pub name: String,
    /// Probability that a contact with a susceptible individual transmits
    pub reproduction_rate: f64,
    /// Probability that an infected individual dies at the end of a step
    pub mortality_rate: f64,
}

impl Virus {
    pub fn new(name: impl Into<String>, reproduction_rate: f64, mortality_rate: f64) -> Self {
        Self {
            name: name.into(),
            reproduction_rate,
            mortality_rate,
        }
    }
}

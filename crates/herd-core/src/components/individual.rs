//! Individual Components
//!
//! Components carried by every population member: a stable id and a single
//! health state.

use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Marker component identifying an entity as a population member
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Individual;

/// Unique identifier for an individual, consecutive from 0 in creation order
#[derive(
    Component, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct PersonId(pub usize);

impl std::fmt::Display for PersonId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Health state of an individual.
///
/// Vaccinated individuals are fully protected, so there is no way to be both
/// vaccinated and infected. Only infected individuals die, and death is final.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    #[default]
    Susceptible,
    /// Vaccinated at creation, or immune after resisting an exposure
    Vaccinated,
    Infected,
    Dead,
}

impl Health {
    pub fn is_alive(&self) -> bool {
        !matches!(self, Health::Dead)
    }

    pub fn is_vaccinated(&self) -> bool {
        matches!(self, Health::Vaccinated)
    }

    /// Alive and currently infected.
    pub fn is_infected(&self) -> bool {
        matches!(self, Health::Infected)
    }

    /// Infects a susceptible individual. Returns false and leaves the state
    /// untouched for anyone else.
    pub fn infect(&mut self) -> bool {
        if *self == Health::Susceptible {
            *self = Health::Infected;
            true
        } else {
            false
        }
    }

    /// Grants immunity to a susceptible individual.
    pub fn immunize(&mut self) -> bool {
        if *self == Health::Susceptible {
            *self = Health::Vaccinated;
            true
        } else {
            false
        }
    }

    /// Kills an infected individual.
    pub fn die(&mut self) -> bool {
        if *self == Health::Infected {
            *self = Health::Dead;
            true
        } else {
            false
        }
    }
}

/// Everything needed to spawn a population member
#[derive(Bundle, Debug, Clone)]
pub struct IndividualBundle {
    pub marker: Individual,
    pub id: PersonId,
    pub health: Health,
}

impl IndividualBundle {
    pub fn new(id: usize, health: Health) -> Self {
        Self {
            marker: Individual,
            id: PersonId(id),
            health,
        }
    }
}

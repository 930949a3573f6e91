//! Interaction Engine
//!
//! Resolves a single contact between an infected actor and a target.

use bevy_ecs::prelude::*;
use rand::Rng;

use herd_events::InteractionRecord;

use crate::components::{Health, PersonId, Virus};
use crate::error::SimError;
use crate::setup::Population;

/// What a single contact did to its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionOutcome {
    /// Target was vaccinated; nothing changed
    BlockedByVaccination,
    /// Target was susceptible and is now infected
    Transmitted,
    /// Target was susceptible, resisted, and is now immune
    Immunized,
    /// Target was already infected; nothing changed
    AlreadyInfected,
}

impl InteractionOutcome {
    pub fn transmitted(self) -> bool {
        self == InteractionOutcome::Transmitted
    }

    pub fn to_record(self, actor: PersonId, target: PersonId) -> InteractionRecord {
        InteractionRecord {
            actor_id: actor.0,
            target_id: target.0,
            already_infected: self == InteractionOutcome::AlreadyInfected,
            vaccinated: self == InteractionOutcome::BlockedByVaccination,
            transmitted: self == InteractionOutcome::Transmitted,
        }
    }
}

/// Resolve one contact between `actor` and `target`.
///
/// Both must be alive; a dead participant is a caller bug and is reported as
/// `SimError::DeadParticipant` without touching any state. Only the target
/// can change. An actor meeting itself is already infected, so self-contact
/// always resolves to `AlreadyInfected`.
pub fn interact<R: Rng + ?Sized>(
    world: &mut World,
    actor: PersonId,
    target: PersonId,
    rng: &mut R,
) -> Result<InteractionOutcome, SimError> {
    living(world, actor)?;
    let (target_entity, target_health) = living(world, target)?;

    let outcome = match target_health {
        Health::Vaccinated => InteractionOutcome::BlockedByVaccination,
        Health::Infected => InteractionOutcome::AlreadyInfected,
        Health::Susceptible => {
            let reproduction_rate = world
                .get_resource::<Virus>()
                .ok_or(SimError::MissingResource("Virus"))?
                .reproduction_rate;
            let draw: f64 = rng.gen();
            let mut health = world
                .get_mut::<Health>(target_entity)
                .ok_or(SimError::UnknownIndividual { id: target })?;
            if draw <= reproduction_rate {
                health.infect();
                InteractionOutcome::Transmitted
            } else {
                health.immunize();
                InteractionOutcome::Immunized
            }
        }
        Health::Dead => return Err(SimError::DeadParticipant { id: target }),
    };

    Ok(outcome)
}

/// Fetch a living individual's entity and health.
fn living(world: &World, id: PersonId) -> Result<(Entity, Health), SimError> {
    let entity = world
        .get_resource::<Population>()
        .ok_or(SimError::MissingResource("Population"))?
        .entity(id)
        .ok_or(SimError::UnknownIndividual { id })?;
    let health = *world
        .get::<Health>(entity)
        .ok_or(SimError::UnknownIndividual { id })?;
    if health.is_alive() {
        Ok((entity, health))
    } else {
        Err(SimError::DeadParticipant { id })
    }
}

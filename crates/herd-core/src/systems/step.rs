//! Time-Step Driver
//!
//! One step: every individual infected at the start of the step makes a fixed
//! number of contacts, then each of them survives or dies.

use bevy_ecs::prelude::*;
use rand::Rng;
use tracing::trace;

use herd_events::{EventPayload, SurvivalRecord};

use super::interaction::interact;
use crate::components::{Health, PersonId, Virus};
use crate::error::SimError;
use crate::events::{EventRecorder, EventStream};
use crate::setup::{alive_ids, infected_ids, Population};

/// Changes produced by one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepOutcome {
    pub new_infections: usize,
    pub deaths: usize,
}

/// Run one step of the epidemic.
///
/// The infected set and the pool of contact targets are both captured before
/// the first contact. Individuals infected during this step neither spread
/// nor face the mortality draw until the next one. Targets are drawn
/// uniformly from everyone alive, the actor included.
pub fn run_step<R, L>(
    world: &mut World,
    step: u64,
    interactions_per_step: u32,
    rng: &mut R,
    events: &mut EventStream<L>,
) -> Result<StepOutcome, SimError>
where
    R: Rng + ?Sized,
    L: EventRecorder,
{
    let alive = alive_ids(world);
    let infected = infected_ids(world);
    let mut outcome = StepOutcome::default();

    for &actor in &infected {
        for _ in 0..interactions_per_step {
            let target = alive[rng.gen_range(0..alive.len())];
            let result = interact(world, actor, target, rng)?;
            trace!(step, %actor, %target, ?result, "interaction");
            if result.transmitted() {
                outcome.new_infections += 1;
            }
            events.emit(step, EventPayload::Interaction(result.to_record(actor, target)))?;
        }
    }

    let mortality_rate = world
        .get_resource::<Virus>()
        .ok_or(SimError::MissingResource("Virus"))?
        .mortality_rate;
    for &person in &infected {
        let died = resolve_survival(world, person, mortality_rate, rng)?;
        if died {
            outcome.deaths += 1;
        }
        events.emit(
            step,
            EventPayload::SurvivalCheck(SurvivalRecord {
                person_id: person.0,
                died,
            }),
        )?;
    }

    Ok(outcome)
}

/// Draw whether an infected individual dies this step. Survivors stay
/// infected.
pub fn resolve_survival<R: Rng + ?Sized>(
    world: &mut World,
    person: PersonId,
    mortality_rate: f64,
    rng: &mut R,
) -> Result<bool, SimError> {
    let entity = world
        .get_resource::<Population>()
        .ok_or(SimError::MissingResource("Population"))?
        .entity(person)
        .ok_or(SimError::UnknownIndividual { id: person })?;
    let mut health = world
        .get_mut::<Health>(entity)
        .ok_or(SimError::UnknownIndividual { id: person })?;
    if !health.is_alive() {
        return Err(SimError::DeadParticipant { id: person });
    }

    let draw: f64 = rng.gen();
    Ok(draw < mortality_rate && health.die())
}

//! Population Spawning
//!
//! Builds the initial roster: the first `initial_infected` individuals start
//! infected, every later one is vaccinated or left susceptible by an
//! independent draw.

use bevy_ecs::prelude::*;
use rand::Rng;

use herd_events::PopulationCounts;

use crate::components::{Health, IndividualBundle, PersonId};
use crate::config::{ConfigError, PopulationConfig};

/// Population roster, indexed by `PersonId`.
///
/// The roster never grows or shrinks after spawning; only the `Health` of its
/// members changes.
#[derive(Resource, Debug, Default)]
pub struct Population {
    roster: Vec<Entity>,
}

impl Population {
    pub fn len(&self) -> usize {
        self.roster.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn entity(&self, id: PersonId) -> Option<Entity> {
        self.roster.get(id.0).copied()
    }

    /// Ids paired with their health, in id order.
    pub fn iter_health<'w>(
        &'w self,
        world: &'w World,
    ) -> impl Iterator<Item = (PersonId, Health)> + 'w {
        self.roster.iter().enumerate().filter_map(move |(index, &entity)| {
            world
                .get::<Health>(entity)
                .map(|health| (PersonId(index), *health))
        })
    }
}

/// Spawn the whole population into the world and register its roster.
///
/// The infected are assigned first, so the requested count always wins over
/// the vaccination draw.
pub fn spawn_population<R: Rng + ?Sized>(
    world: &mut World,
    config: &PopulationConfig,
    rng: &mut R,
) -> Result<PopulationCounts, ConfigError> {
    config.validate()?;

    let mut roster = Vec::with_capacity(config.size);
    for index in 0..config.size {
        let health = if index < config.initial_infected {
            Health::Infected
        } else {
            let draw: f64 = rng.gen();
            if config
                .vaccination_draw
                .is_vaccinated(draw, config.vaccination_fraction)
            {
                Health::Vaccinated
            } else {
                Health::Susceptible
            }
        };
        roster.push(world.spawn(IndividualBundle::new(index, health)).id());
    }

    world.insert_resource(Population { roster });
    Ok(count_health(world))
}

/// Look up the health of one individual.
pub fn health_of(world: &World, id: PersonId) -> Option<Health> {
    let entity = world.get_resource::<Population>()?.entity(id)?;
    world.get::<Health>(entity).copied()
}

/// Tally the population by health state.
pub fn count_health(world: &World) -> PopulationCounts {
    let mut counts = PopulationCounts::default();
    let Some(population) = world.get_resource::<Population>() else {
        return counts;
    };
    for (_, health) in population.iter_health(world) {
        match health {
            Health::Susceptible => counts.susceptible += 1,
            Health::Vaccinated => counts.vaccinated += 1,
            Health::Infected => counts.infected += 1,
            Health::Dead => counts.dead += 1,
        }
    }
    counts
}

/// Ids of all living individuals, in id order.
pub fn alive_ids(world: &World) -> Vec<PersonId> {
    ids_where(world, |health| health.is_alive())
}

/// Ids of all living infected individuals, in id order.
pub fn infected_ids(world: &World) -> Vec<PersonId> {
    ids_where(world, |health| health.is_infected())
}

fn ids_where(world: &World, predicate: impl Fn(&Health) -> bool) -> Vec<PersonId> {
    let Some(population) = world.get_resource::<Population>() else {
        return Vec::new();
    };
    population
        .iter_health(world)
        .filter(|(_, health)| predicate(health))
        .map(|(id, _)| id)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::VaccinationDraw;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    fn population_config(
        size: usize,
        vaccination_fraction: f64,
        initial_infected: usize,
    ) -> PopulationConfig {
        PopulationConfig {
            size,
            vaccination_fraction,
            initial_infected,
            vaccination_draw: VaccinationDraw::Fraction,
        }
    }

    #[test]
    fn test_infected_get_lowest_ids() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(42);
        spawn_population(&mut world, &population_config(20, 0.5, 4), &mut rng).unwrap();

        assert_eq!(
            infected_ids(&world),
            vec![PersonId(0), PersonId(1), PersonId(2), PersonId(3)]
        );
        for id in 4..20 {
            let health = health_of(&world, PersonId(id)).unwrap();
            assert!(matches!(health, Health::Susceptible | Health::Vaccinated));
        }
    }

    #[test]
    fn test_ids_are_consecutive() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(1);
        spawn_population(&mut world, &population_config(50, 0.3, 1), &mut rng).unwrap();

        let population = world.resource::<Population>();
        assert_eq!(population.len(), 50);
        for expected in 0..50 {
            let entity = population.entity(PersonId(expected)).unwrap();
            assert_eq!(world.get::<PersonId>(entity), Some(&PersonId(expected)));
        }
        assert!(population.entity(PersonId(50)).is_none());
    }

    #[test]
    fn test_full_vaccination_keeps_requested_infected() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(9);
        let counts =
            spawn_population(&mut world, &population_config(50, 1.0, 1), &mut rng).unwrap();

        assert_eq!(counts.infected, 1);
        assert_eq!(counts.vaccinated, 49);
        assert_eq!(counts.susceptible, 0);
    }

    #[test]
    fn test_zero_vaccination() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(9);
        let counts =
            spawn_population(&mut world, &population_config(30, 0.0, 2), &mut rng).unwrap();

        assert_eq!(counts.infected, 2);
        assert_eq!(counts.vaccinated, 0);
        assert_eq!(counts.susceptible, 28);
    }

    #[test]
    fn test_legacy_draw_inverts_fraction() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(9);
        let config = PopulationConfig {
            vaccination_draw: VaccinationDraw::Legacy,
            ..population_config(50, 1.0, 1)
        };
        let counts = spawn_population(&mut world, &config, &mut rng).unwrap();

        assert_eq!(counts.vaccinated, 0);
        assert_eq!(counts.susceptible, 49);
    }

    #[test]
    fn test_vaccination_fraction_is_roughly_honored() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(2024);
        let counts =
            spawn_population(&mut world, &population_config(10_001, 0.7, 1), &mut rng).unwrap();

        let share = counts.vaccinated as f64 / 10_000.0;
        assert!((share - 0.7).abs() < 0.03, "vaccinated share was {share}");
    }

    #[test]
    fn test_rejects_more_infected_than_people() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(0);
        let result = spawn_population(&mut world, &population_config(3, 0.5, 4), &mut rng);

        assert!(matches!(result, Err(ConfigError::TooManyInfected { .. })));
        assert!(world.get_resource::<Population>().is_none());
    }

    #[test]
    fn test_counts_without_population() {
        let world = World::new();
        assert_eq!(count_health(&world), PopulationCounts::default());
        assert!(alive_ids(&world).is_empty());
    }
}

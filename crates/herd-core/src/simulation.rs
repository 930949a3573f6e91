//! Simulation Loop
//!
//! Owns the world, the generator and the event stream, runs steps until the
//! epidemic can no longer change, and keeps the run totals.

use bevy_ecs::prelude::*;
use rand::rngs::{OsRng, SmallRng};
use rand::SeedableRng;
use tracing::{debug, info, warn};

use herd_events::{
    EventPayload, PopulationCounts, RunEnded, RunMetadata, RunStats, StepSummary, StopReason,
};

use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::events::{EventRecorder, EventStream};
use crate::output::StatsCollector;
use crate::setup::{count_health, spawn_population};
use crate::systems::run_step;

/// Build the run's generator: seeded when a seed is given, from the OS
/// otherwise.
pub fn seeded_rng(seed: Option<u64>) -> Result<SmallRng, SimError> {
    match seed {
        Some(seed) => Ok(SmallRng::seed_from_u64(seed)),
        None => Ok(SmallRng::from_rng(OsRng)?),
    }
}

/// Running totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunState {
    /// Steps completed so far
    pub step: u64,
    /// Everyone ever infected, the dead included
    pub total_infected: usize,
    pub total_dead: usize,
}

/// Final tallies of a finished run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_steps: u64,
    pub total_infected: usize,
    pub total_dead: usize,
    pub stop_reason: StopReason,
    pub final_counts: PopulationCounts,
}

pub struct Simulation<L: EventRecorder> {
    world: World,
    rng: SmallRng,
    events: EventStream<L>,
    config: SimulationConfig,
    state: RunState,
    stats: StatsCollector,
    started: bool,
    /// Set once the run has ended; no further steps or events after that.
    ended: Option<RunSummary>,
}

impl<L: EventRecorder> Simulation<L> {
    /// Validate the config and spawn the population.
    pub fn new(config: SimulationConfig, mut rng: SmallRng, recorder: L) -> Result<Self, SimError> {
        config.validate()?;

        let mut world = World::new();
        world.insert_resource(config.virus());
        let counts = spawn_population(&mut world, &config.population, &mut rng)?;
        info!(
            population = config.population.size,
            infected = counts.infected,
            vaccinated = counts.vaccinated,
            susceptible = counts.susceptible,
            "Spawned population"
        );

        Ok(Self {
            world,
            rng,
            events: EventStream::new(recorder),
            stats: StatsCollector::new(counts.infected),
            state: RunState {
                step: 0,
                total_infected: counts.infected,
                total_dead: counts.dead,
            },
            config,
            started: false,
            ended: None,
        })
    }

    /// Build a simulation whose generator follows `config.simulation.seed`.
    pub fn from_config(config: SimulationConfig, recorder: L) -> Result<Self, SimError> {
        let rng = seeded_rng(config.simulation.seed)?;
        Self::new(config, rng, recorder)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn counts(&self) -> PopulationCounts {
        count_health(&self.world)
    }

    pub fn recorder(&self) -> &L {
        self.events.recorder()
    }

    pub fn into_recorder(self) -> L {
        self.events.into_recorder()
    }

    /// The final tallies, once the run has ended.
    pub fn summary(&self) -> Option<&RunSummary> {
        self.ended.as_ref()
    }

    /// Why the run should stop now, or `None` while it can still change.
    ///
    /// Only the living count: the run continues while someone is alive, some
    /// living individual is unvaccinated, and some living individual is
    /// infected. The step ceiling is checked last.
    pub fn stop_reason(&self) -> Option<StopReason> {
        let counts = self.counts();
        if counts.alive() == 0 {
            return Some(StopReason::EveryoneDead);
        }
        if counts.unvaccinated_alive() == 0 {
            return Some(StopReason::EveryoneVaccinated);
        }
        if counts.infected == 0 {
            return Some(StopReason::NoActiveInfection);
        }
        match self.config.simulation.max_steps {
            Some(max_steps) if self.state.step >= max_steps => Some(StopReason::StepLimit),
            _ => None,
        }
    }

    /// Run a single step and report its totals.
    ///
    /// Fails with [`SimError::RunEnded`] once [`Simulation::run`] has finished.
    pub fn step(&mut self) -> Result<StepSummary, SimError> {
        if self.ended.is_some() {
            return Err(SimError::RunEnded);
        }
        self.start()?;

        let step = self.state.step + 1;
        let outcome = run_step(
            &mut self.world,
            step,
            self.config.simulation.interactions_per_step,
            &mut self.rng,
            &mut self.events,
        )?;

        let counts = self.counts();
        self.state.step = step;
        self.state.total_infected += outcome.new_infections;
        self.state.total_dead = counts.dead;

        let summary = StepSummary {
            step,
            new_infections: outcome.new_infections,
            new_deaths: outcome.deaths,
            infected_alive: counts.infected,
            total_dead: counts.dead,
        };
        debug!(
            step,
            new_infections = summary.new_infections,
            new_deaths = summary.new_deaths,
            infected = summary.infected_alive,
            dead = summary.total_dead,
            "Step complete"
        );
        self.stats.record_step(&summary);
        self.events.emit(step, EventPayload::StepSummary(summary.clone()))?;
        Ok(summary)
    }

    /// Run steps until a stop condition holds.
    ///
    /// An ended run returns its final tallies again without emitting events.
    pub fn run(&mut self) -> Result<RunSummary, SimError> {
        if let Some(summary) = &self.ended {
            return Ok(summary.clone());
        }
        self.start()?;

        let stop_reason = loop {
            if let Some(reason) = self.stop_reason() {
                break reason;
            }
            self.step()?;
        };

        if stop_reason == StopReason::StepLimit {
            warn!(
                steps = self.state.step,
                "Stopped at the step limit while the epidemic was still active"
            );
        }

        let summary = RunSummary {
            total_steps: self.state.step,
            total_infected: self.state.total_infected,
            total_dead: self.state.total_dead,
            stop_reason,
            final_counts: self.counts(),
        };
        self.events.emit(
            self.state.step,
            EventPayload::RunEnded(RunEnded {
                total_steps: summary.total_steps,
                stop_reason,
                total_infected: summary.total_infected,
                total_dead: summary.total_dead,
            }),
        )?;
        self.events.flush()?;

        info!(
            steps = summary.total_steps,
            infected = summary.total_infected,
            dead = summary.total_dead,
            reason = %stop_reason,
            "The simulation has ended"
        );
        self.ended = Some(summary.clone());
        Ok(summary)
    }

    /// Statistics for a finished run.
    pub fn stats(&self, summary: &RunSummary) -> RunStats {
        self.stats.generate_stats(
            &self.config.virus.name,
            self.config.population.size,
            summary,
        )
    }

    /// Emit the run metadata once, before anything else.
    fn start(&mut self) -> Result<(), SimError> {
        if self.started {
            return Ok(());
        }
        self.started = true;

        let config = &self.config;
        info!(
            virus = %config.virus.name,
            reproduction_rate = config.virus.reproduction_rate,
            mortality_rate = config.virus.mortality_rate,
            "Starting simulation"
        );
        self.events.emit(
            0,
            EventPayload::RunMetadata(RunMetadata {
                population_size: config.population.size,
                vaccination_fraction: config.population.vaccination_fraction,
                virus_name: config.virus.name.clone(),
                mortality_rate: config.virus.mortality_rate,
                reproduction_rate: config.virus.reproduction_rate,
                initial_infected: config.population.initial_infected,
            }),
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::PendingEvents;
    use herd_events::EventType;

    fn config(
        size: usize,
        initial_infected: usize,
        vaccination_fraction: f64,
        reproduction_rate: f64,
        mortality_rate: f64,
    ) -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.virus.reproduction_rate = reproduction_rate;
        config.virus.mortality_rate = mortality_rate;
        config.population.size = size;
        config.population.initial_infected = initial_infected;
        config.population.vaccination_fraction = vaccination_fraction;
        config.simulation.seed = Some(42);
        config
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let result = Simulation::from_config(config(5, 6, 0.0, 0.5, 0.5), PendingEvents::new());
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn test_metadata_emitted_once_first() {
        let mut sim =
            Simulation::from_config(config(20, 1, 0.5, 0.5, 0.0), PendingEvents::new()).unwrap();
        sim.step().unwrap();
        sim.step().unwrap();

        let events = sim.recorder().events();
        assert_eq!(events[0].event_type(), EventType::RunMetadata);
        assert_eq!(events[0].step, 0);
        let metadata_count = events
            .iter()
            .filter(|e| e.event_type() == EventType::RunMetadata)
            .count();
        assert_eq!(metadata_count, 1);
    }

    #[test]
    fn test_step_summary_matches_counts() {
        let mut sim =
            Simulation::from_config(config(100, 2, 0.3, 0.4, 0.2), PendingEvents::new()).unwrap();
        let summary = sim.step().unwrap();
        let counts = sim.counts();

        assert_eq!(summary.step, 1);
        assert_eq!(summary.infected_alive, counts.infected);
        assert_eq!(summary.total_dead, counts.dead);
        assert_eq!(sim.state().total_infected, 2 + summary.new_infections);
        assert_eq!(counts.total(), 100);

        let last = sim.recorder().events().last().unwrap();
        assert_eq!(last.payload, EventPayload::StepSummary(summary));
    }

    #[test]
    fn test_stop_reason_before_any_step() {
        // One infected among fully vaccinated people is still unvaccinated
        // and alive, so the run has not ended yet.
        let sim =
            Simulation::from_config(config(50, 1, 1.0, 0.5, 1.0), PendingEvents::new()).unwrap();
        assert_eq!(sim.stop_reason(), None);
    }

    #[test]
    fn test_step_limit() {
        let mut config = config(50, 1, 1.0, 0.5, 0.0);
        config.simulation.max_steps = Some(3);
        let mut sim = Simulation::from_config(config, PendingEvents::new()).unwrap();

        let summary = sim.run().unwrap();
        assert_eq!(summary.stop_reason, StopReason::StepLimit);
        assert_eq!(summary.total_steps, 3);
        assert_eq!(summary.final_counts.infected, 1);
    }

    #[test]
    fn test_run_ends_with_run_ended_event() {
        let mut sim =
            Simulation::from_config(config(10, 10, 0.0, 1.0, 1.0), PendingEvents::new()).unwrap();
        let summary = sim.run().unwrap();

        let last = sim.recorder().events().last().unwrap();
        assert_eq!(
            last.payload,
            EventPayload::RunEnded(RunEnded {
                total_steps: summary.total_steps,
                stop_reason: summary.stop_reason,
                total_infected: summary.total_infected,
                total_dead: summary.total_dead,
            })
        );
    }

    #[test]
    fn test_ended_run_stays_ended() {
        let mut sim =
            Simulation::from_config(config(200, 3, 0.5, 0.3, 0.3), PendingEvents::new()).unwrap();
        assert!(sim.summary().is_none());
        let first = sim.run().unwrap();
        let event_count = sim.recorder().len();

        let second = sim.run().unwrap();
        assert_eq!(first, second);
        assert_eq!(sim.summary(), Some(&first));
        assert!(matches!(sim.step(), Err(SimError::RunEnded)));

        let events = sim.recorder().events();
        assert_eq!(events.len(), event_count);
        assert_eq!(events.last().unwrap().event_type(), EventType::RunEnded);
        let run_ended_count = events
            .iter()
            .filter(|e| e.event_type() == EventType::RunEnded)
            .count();
        assert_eq!(run_ended_count, 1);
        assert_eq!(sim.state().step, first.total_steps);
    }

    #[test]
    fn test_stats_follow_history() {
        let mut sim =
            Simulation::from_config(config(200, 3, 0.5, 0.3, 0.3), PendingEvents::new()).unwrap();
        let summary = sim.run().unwrap();
        let stats = sim.stats(&summary);

        assert_eq!(stats.step_history.len() as u64, summary.total_steps);
        assert_eq!(stats.total_dead, summary.total_dead);
        assert!(stats.peak_infected >= 3);
    }

    #[test]
    fn test_seeded_rng_is_reproducible() {
        use rand::Rng;
        let mut a = seeded_rng(Some(5)).unwrap();
        let mut b = seeded_rng(Some(5)).unwrap();
        assert_eq!(a.gen::<u64>(), b.gen::<u64>());
        assert!(seeded_rng(None).is_ok());
    }
}

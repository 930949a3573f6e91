//! Event Types
//!
//! Structured records emitted by the simulation: run metadata, interactions,
//! survival checks, per-step summaries and the end-of-run record.

use serde::{Deserialize, Serialize};

/// Primary event type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    RunMetadata,
    Interaction,
    SurvivalCheck,
    StepSummary,
    RunEnded,
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Nobody is left alive.
    EveryoneDead,
    /// Every living individual is vaccinated.
    EveryoneVaccinated,
    /// No living individual carries the infection.
    NoActiveInfection,
    /// The configured step ceiling was reached first.
    StepLimit,
}

impl std::fmt::Display for StopReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            StopReason::EveryoneDead => "everyone is dead",
            StopReason::EveryoneVaccinated => "everyone alive is vaccinated",
            StopReason::NoActiveInfection => "nobody alive is infected",
            StopReason::StepLimit => "step limit reached",
        };
        f.write_str(text)
    }
}

/// Parameters of a run, emitted once before the first step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub population_size: usize,
    pub vaccination_fraction: f64,
    pub virus_name: String,
    pub mortality_rate: f64,
    pub reproduction_rate: f64,
    pub initial_infected: usize,
}

/// One contact between an infected actor and a target.
///
/// At most one of the three flags is set. All three clear means the target
/// was exposed, resisted, and is now immune.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub actor_id: usize,
    pub target_id: usize,
    pub already_infected: bool,
    pub vaccinated: bool,
    pub transmitted: bool,
}

/// Outcome of the end-of-step mortality draw for one infected individual.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SurvivalRecord {
    pub person_id: usize,
    pub died: bool,
}

/// Totals after one step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepSummary {
    pub step: u64,
    pub new_infections: usize,
    pub new_deaths: usize,
    /// Living individuals currently infected
    pub infected_alive: usize,
    pub total_dead: usize,
}

/// Final record of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunEnded {
    pub total_steps: u64,
    pub stop_reason: StopReason,
    pub total_infected: usize,
    pub total_dead: usize,
}

/// Event-specific data, tagged by `event_type` in the serialized form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum EventPayload {
    RunMetadata(RunMetadata),
    Interaction(InteractionRecord),
    SurvivalCheck(SurvivalRecord),
    StepSummary(StepSummary),
    RunEnded(RunEnded),
}

/// A complete simulation event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier (e.g., "evt_00000042")
    pub event_id: String,
    /// Step the event belongs to; 0 before the first step
    pub step: u64,
    #[serde(flatten)]
    pub payload: EventPayload,
}

impl Event {
    pub fn new(event_id: impl Into<String>, step: u64, payload: EventPayload) -> Self {
        Self {
            event_id: event_id.into(),
            step,
            payload,
        }
    }

    /// Returns the category of this event.
    pub fn event_type(&self) -> EventType {
        match self.payload {
            EventPayload::RunMetadata(_) => EventType::RunMetadata,
            EventPayload::Interaction(_) => EventType::Interaction,
            EventPayload::SurvivalCheck(_) => EventType::SurvivalCheck,
            EventPayload::StepSummary(_) => EventType::StepSummary,
            EventPayload::RunEnded(_) => EventType::RunEnded,
        }
    }

    /// Serializes the event to a JSON line (for JSONL format).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an event from a JSON line.
    pub fn from_jsonl(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line)
    }
}

/// Generates an event ID with the given sequence number.
pub fn generate_event_id(sequence: u64) -> String {
    format!("evt_{:08}", sequence)
}

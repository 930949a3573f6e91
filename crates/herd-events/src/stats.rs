//! Statistics Types
//!
//! Serializable population tallies and whole-run statistics.

use serde::{Deserialize, Serialize};

use crate::{StepSummary, StopReason};

/// Number of individuals in each health state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PopulationCounts {
    pub susceptible: usize,
    pub vaccinated: usize,
    pub infected: usize,
    pub dead: usize,
}

impl PopulationCounts {
    pub fn alive(&self) -> usize {
        self.susceptible + self.vaccinated + self.infected
    }

    pub fn total(&self) -> usize {
        self.alive() + self.dead
    }

    /// Living individuals without vaccine protection (susceptible or infected).
    pub fn unvaccinated_alive(&self) -> usize {
        self.susceptible + self.infected
    }
}

/// Overall statistics for one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub virus_name: String,
    pub population_size: usize,
    pub total_steps: u64,
    pub total_infected: usize,
    pub total_dead: usize,
    pub stop_reason: StopReason,
    pub final_counts: PopulationCounts,
    /// Share of the population ever infected
    pub attack_rate: f64,
    /// Deaths over individuals ever infected
    pub case_fatality: f64,
    pub peak_infected: usize,
    pub peak_step: u64,
    pub step_history: Vec<StepSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_partition_population() {
        let counts = PopulationCounts {
            susceptible: 3,
            vaccinated: 5,
            infected: 2,
            dead: 4,
        };
        assert_eq!(counts.alive(), 10);
        assert_eq!(counts.total(), 14);
        assert_eq!(counts.unvaccinated_alive(), 5);
    }
}

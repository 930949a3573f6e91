//! Statistics Output
//!
//! Collects per-step summaries during a run and writes the final statistics
//! for analysis.

use std::fs;
use std::path::Path;

use herd_events::{RunStats, StepSummary};

use crate::simulation::RunSummary;

/// Accumulates step summaries during a run
#[derive(Debug, Clone, Default)]
pub struct StatsCollector {
    pub step_history: Vec<StepSummary>,
    pub peak_infected: usize,
    pub peak_step: u64,
}

impl StatsCollector {
    /// Start collecting with the infected count before the first step.
    pub fn new(initial_infected: usize) -> Self {
        Self {
            step_history: Vec::new(),
            peak_infected: initial_infected,
            peak_step: 0,
        }
    }

    /// Record the summary of one step
    pub fn record_step(&mut self, summary: &StepSummary) {
        if summary.infected_alive > self.peak_infected {
            self.peak_infected = summary.infected_alive;
            self.peak_step = summary.step;
        }
        self.step_history.push(summary.clone());
    }

    /// Generate final statistics
    pub fn generate_stats(
        &self,
        virus_name: &str,
        population_size: usize,
        summary: &RunSummary,
    ) -> RunStats {
        let attack_rate = if population_size > 0 {
            summary.total_infected as f64 / population_size as f64
        } else {
            0.0
        };
        let case_fatality = if summary.total_infected > 0 {
            summary.total_dead as f64 / summary.total_infected as f64
        } else {
            0.0
        };

        RunStats {
            virus_name: virus_name.to_string(),
            population_size,
            total_steps: summary.total_steps,
            total_infected: summary.total_infected,
            total_dead: summary.total_dead,
            stop_reason: summary.stop_reason,
            final_counts: summary.final_counts,
            attack_rate,
            case_fatality,
            peak_infected: self.peak_infected,
            peak_step: self.peak_step,
            step_history: self.step_history.clone(),
        }
    }
}

/// Write statistics to the given file, creating its directory if needed
pub fn write_stats(path: impl AsRef<Path>, stats: &RunStats) -> std::io::Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let json = serde_json::to_string_pretty(stats)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

    fs::write(path, json)?;
    Ok(())
}

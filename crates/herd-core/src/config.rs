//! Configuration System
//!
//! Loads run parameters from a TOML file. Every table is optional and falls
//! back to the defaults below, so a config file only needs the values it
//! changes.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::components::Virus;

/// Default config file path
pub const DEFAULT_CONFIG_PATH: &str = "herd.toml";

/// Contacts made by each infected individual per step
pub const DEFAULT_INTERACTIONS_PER_STEP: u32 = 100;

/// Top-level configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SimulationConfig {
    pub virus: VirusConfig,
    pub population: PopulationConfig,
    pub simulation: RunConfig,
    pub output: OutputConfig,
}

/// Pathogen parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirusConfig {
    pub name: String,
    pub reproduction_rate: f64,
    pub mortality_rate: f64,
}

impl Default for VirusConfig {
    fn default() -> Self {
        Self {
            name: "Ebola".to_string(),
            reproduction_rate: 0.25,
            mortality_rate: 0.70,
        }
    }
}

/// How a non-infected individual's initial vaccination is drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VaccinationDraw {
    /// Vaccinated with probability `vaccination_fraction`. This inverts the
    /// classic draw kept as [`VaccinationDraw::Legacy`].
    #[default]
    Fraction,
    /// Vaccinated when the uniform draw exceeds `vaccination_fraction`,
    /// i.e. with probability `1 - vaccination_fraction`
    Legacy,
}

impl VaccinationDraw {
    /// Decides vaccination from a uniform draw in [0, 1).
    pub fn is_vaccinated(self, draw: f64, vaccination_fraction: f64) -> bool {
        match self {
            VaccinationDraw::Fraction => draw < vaccination_fraction,
            VaccinationDraw::Legacy => draw > vaccination_fraction,
        }
    }
}

/// Population construction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PopulationConfig {
    pub size: usize,
    pub vaccination_fraction: f64,
    pub initial_infected: usize,
    pub vaccination_draw: VaccinationDraw,
}

impl Default for PopulationConfig {
    fn default() -> Self {
        Self {
            size: 1000,
            vaccination_fraction: 0.9,
            initial_infected: 1,
            vaccination_draw: VaccinationDraw::Fraction,
        }
    }
}

/// Loop parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    /// Seed for the run's generator; drawn from the OS when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub interactions_per_step: u32,
    /// Safety ceiling on the number of steps
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_steps: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            seed: None,
            interactions_per_step: DEFAULT_INTERACTIONS_PER_STEP,
            max_steps: None,
        }
    }
}

/// Where to write results. Nothing is written for an absent path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub events_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stats_path: Option<PathBuf>,
}

impl SimulationConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_str(&content)
    }

    /// Parses configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Returns the configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Builds the virus resource described by this config.
    pub fn virus(&self) -> Virus {
        Virus::new(
            self.virus.name.clone(),
            self.virus.reproduction_rate,
            self.virus.mortality_rate,
        )
    }

    /// Rejects parameter combinations the simulation cannot honor.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("reproduction_rate", self.virus.reproduction_rate)?;
        check_rate("mortality_rate", self.virus.mortality_rate)?;
        self.population.validate()
    }
}

impl PopulationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_rate("vaccination_fraction", self.vaccination_fraction)?;
        if self.size == 0 {
            return Err(ConfigError::EmptyPopulation);
        }
        if self.initial_infected == 0 {
            return Err(ConfigError::NoInitialInfection);
        }
        if self.initial_infected > self.size {
            return Err(ConfigError::TooManyInfected {
                initial_infected: self.initial_infected,
                population_size: self.size,
            });
        }
        Ok(())
    }
}

fn check_rate(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::RateOutOfRange { name, value })
    }
}

/// Configuration error type
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{name} must be between 0 and 1, got {value}")]
    RateOutOfRange { name: &'static str, value: f64 },
    #[error("population size must be at least 1")]
    EmptyPopulation,
    #[error("at least one individual must start infected")]
    NoInitialInfection,
    #[error("cannot infect {initial_infected} individuals in a population of {population_size}")]
    TooManyInfected {
        initial_infected: usize,
        population_size: usize,
    },
}

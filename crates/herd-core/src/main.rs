//! Herd Immunity Simulation
//!
//! Runs the simulation from positional parameters, a TOML config file, or
//! both, and writes the event log and statistics when asked to.

use clap::Parser;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use herd_core::config::{SimulationConfig, VaccinationDraw, DEFAULT_CONFIG_PATH};
use herd_core::output::write_stats;
use herd_core::{EventLogger, SimError, Simulation};

/// Command line arguments for the simulation
#[derive(Parser, Debug)]
#[command(name = "herd_immunity")]
#[command(about = "Simulates a virus spreading through a partially vaccinated population")]
struct Args {
    /// Name of the virus (used for reporting only)
    virus_name: Option<String>,

    /// Probability that a contact with a susceptible individual transmits
    reproduction_rate: Option<f64>,

    /// Probability that an infected individual dies each step
    mortality_rate: Option<f64>,

    /// Number of individuals
    population_size: Option<usize>,

    /// Fraction of the population vaccinated at the start.
    ///
    /// Each non-infected individual is vaccinated with this probability. This
    /// inverts the classic draw, which vaccinated with probability
    /// 1 - fraction; pass --legacy-vaccination-draw to get that behaviour.
    vaccination_fraction: Option<f64>,

    /// Number of individuals infected at the start
    initial_infected: Option<usize>,

    /// TOML config file (defaults to herd.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many steps even if the epidemic is still active
    #[arg(long)]
    max_steps: Option<u64>,

    /// Contacts made by each infected individual per step
    #[arg(long)]
    interactions_per_step: Option<u32>,

    /// Write the event log (JSONL) to this file
    #[arg(long)]
    events: Option<PathBuf>,

    /// Write run statistics (JSON) to this file
    #[arg(long)]
    stats: Option<PathBuf>,

    /// Vaccinate with probability 1 - fraction (the classic inverted draw)
    /// instead of the default probability = fraction
    #[arg(long)]
    legacy_vaccination_draw: bool,

    /// Log every step
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), SimError> {
    let config = build_config(&args)?;

    let logger = match &config.output.events_path {
        Some(path) => {
            ensure_parent_dir(path)?;
            EventLogger::new(path)?
        }
        None => EventLogger::null(),
    };

    println!("Herd Immunity Simulation");
    println!("========================");
    println!("Virus: {}", config.virus.name);
    println!("Reproduction rate: {}", config.virus.reproduction_rate);
    println!("Mortality rate: {}", config.virus.mortality_rate);
    println!("Population: {}", config.population.size);
    println!(
        "Vaccination fraction: {} ({})",
        config.population.vaccination_fraction,
        match config.population.vaccination_draw {
            VaccinationDraw::Fraction => "vaccinated with this probability",
            VaccinationDraw::Legacy => "legacy draw, vaccinated with 1 - this probability",
        }
    );
    println!("Initially infected: {}", config.population.initial_infected);
    match config.simulation.seed {
        Some(seed) => println!("Seed: {}", seed),
        None => println!("Seed: random"),
    }
    println!();

    let events_path = config.output.events_path.clone();
    let stats_path = config.output.stats_path.clone();
    let mut sim = Simulation::from_config(config, logger)?;
    let summary = sim.run()?;

    println!();
    println!("The simulation has ended after {} steps.", summary.total_steps);
    println!("Reason: {}", summary.stop_reason);
    println!("Total infected: {}", summary.total_infected);
    println!("Total dead: {}", summary.total_dead);
    println!(
        "Survivors: {} ({} vaccinated or immune)",
        summary.final_counts.alive(),
        summary.final_counts.vaccinated
    );

    if let Some(path) = events_path {
        println!(
            "Wrote {} events to {}",
            sim.recorder().event_count(),
            path.display()
        );
    }
    if let Some(path) = stats_path {
        write_stats(&path, &sim.stats(&summary))?;
        println!("Wrote statistics to {}", path.display());
    }

    Ok(())
}

/// Config file first, then command line overrides.
fn build_config(args: &Args) -> Result<SimulationConfig, SimError> {
    let mut config = match &args.config {
        Some(path) => SimulationConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            SimulationConfig::load(DEFAULT_CONFIG_PATH)?
        }
        None => SimulationConfig::default(),
    };

    if let Some(name) = &args.virus_name {
        config.virus.name = name.clone();
    }
    if let Some(rate) = args.reproduction_rate {
        config.virus.reproduction_rate = rate;
    }
    if let Some(rate) = args.mortality_rate {
        config.virus.mortality_rate = rate;
    }
    if let Some(size) = args.population_size {
        config.population.size = size;
    }
    if let Some(fraction) = args.vaccination_fraction {
        config.population.vaccination_fraction = fraction;
    }
    if let Some(count) = args.initial_infected {
        config.population.initial_infected = count;
    }
    if args.legacy_vaccination_draw {
        config.population.vaccination_draw = VaccinationDraw::Legacy;
    }
    if let Some(seed) = args.seed {
        config.simulation.seed = Some(seed);
    }
    if let Some(max_steps) = args.max_steps {
        config.simulation.max_steps = Some(max_steps);
    }
    if let Some(count) = args.interactions_per_step {
        config.simulation.interactions_per_step = count;
    }
    if let Some(path) = &args.events {
        config.output.events_path = Some(path.clone());
    }
    if let Some(path) = &args.stats {
        config.output.stats_path = Some(path.clone());
    }

    config.validate()?;
    Ok(config)
}

fn ensure_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_help_describes_vaccination_draw() {
        let mut command = Args::command();
        let help = command.render_long_help().to_string();
        assert!(help.contains("inverts the classic draw"));
        assert!(help.contains("--legacy-vaccination-draw"));
    }

    #[test]
    fn test_vaccination_draw_flag() {
        let args = Args::parse_from(["herd_immunity", "Flu", "0.3", "0.1", "100", "0.9", "2"]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.population.vaccination_draw, VaccinationDraw::Fraction);
        assert_eq!(config.population.vaccination_fraction, 0.9);
        assert_eq!(config.population.initial_infected, 2);

        let args = Args::parse_from([
            "herd_immunity",
            "Flu",
            "0.3",
            "0.1",
            "100",
            "0.9",
            "2",
            "--legacy-vaccination-draw",
        ]);
        let config = build_config(&args).unwrap();
        assert_eq!(config.population.vaccination_draw, VaccinationDraw::Legacy);
    }
}

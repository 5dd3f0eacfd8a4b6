//! EV Extractor CLI Application
//!
//! Command-line front end for the ev-extractor library. Loads a behavioral
//! events file, applies one task's extraction rules, and writes the design
//! output as JSON for the downstream GLM design-matrix builder. A TOML
//! batch mode processes many (events, task) units in parallel, logging and
//! skipping failed units rather than aborting the run.

use anyhow::{Context, Result};
use clap::Parser;
use ev_extractor::{DesignOutput, EventTable, Extractor};
use rayon::prelude::*;
use std::path::{Path, PathBuf};

mod config;

use config::UnitConfig;

/// EV Extractor - Build GLM design variables from task event files
#[derive(Parser, Debug)]
#[command(name = "ev-extractor-cli")]
#[command(about = "Extract GLM explanatory variables from behavioral event files", long_about = None)]
#[command(version)]
struct Args {
    /// Path to a tab-delimited events file
    #[arg(short, long, value_name = "FILE")]
    events: Option<PathBuf>,

    /// Task identifier (e.g. stopSignal, ANT, WATT3, beta)
    #[arg(short, long, value_name = "TASK")]
    task: Option<String>,

    /// Include the response-time regressor
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, value_name = "BOOL")]
    regress_rt: bool,

    /// Output file for the design JSON (default: stdout)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Path to a batch configuration file (TOML)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbosity level (can be repeated: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.quiet);

    log::info!("EV Extractor CLI v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Using extractor library v{}", ev_extractor::VERSION);

    if let (Some(events), Some(task)) = (&args.events, &args.task) {
        single_unit_mode(events, task, args.regress_rt, args.output.as_deref())
    } else if let Some(config_path) = &args.config {
        batch_mode(config_path)
    } else {
        println!("EV Extractor - No input specified");
        println!("\nQuick Start:");
        println!("  ev-extractor-cli --events sub-01_task-stopSignal_events.tsv --task stopSignal");
        println!("  ev-extractor-cli --events events.tsv --task beta --regress-rt false");
        println!("\nFor batch runs:");
        println!("  ev-extractor-cli --config batch.toml");
        println!("\nUse --help for more options");
        Ok(())
    }
}

/// Map -v/-q flags to an env_logger filter
fn init_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

/// Extract one (events, task) unit and write the design
fn single_unit_mode(
    events: &Path,
    task: &str,
    regress_rt: bool,
    output: Option<&Path>,
) -> Result<()> {
    let table = EventTable::from_path(events)
        .with_context(|| format!("Failed to load events file {:?}", events))?;

    let extractor = Extractor::new();
    let design = extractor
        .build_named(&table, task, regress_rt)
        .with_context(|| format!("Extraction failed for task '{}'", task))?;

    log::info!(
        "Extracted {} conditions from {} trials",
        design.len(),
        table.len()
    );
    write_design(&design, output)
}

/// Process every unit of a batch config, in parallel, skipping failures
fn batch_mode(config_path: &Path) -> Result<()> {
    let config = config::load_config(config_path)?;
    let extractor = Extractor::new();

    let failures: usize = config
        .units
        .par_iter()
        .map(|unit| match process_unit(&extractor, unit) {
            Ok(conditions) => {
                log::info!(
                    "{:?} ({}): {} conditions",
                    unit.events,
                    unit.task,
                    conditions
                );
                0
            }
            Err(e) => {
                log::error!("{:?} ({}): {:#}", unit.events, unit.task, e);
                1
            }
        })
        .sum();

    if failures > 0 {
        anyhow::bail!("{} of {} units failed", failures, config.units.len());
    }
    log::info!("All {} units completed", config.units.len());
    Ok(())
}

/// Extract one batch unit and write its design next to the events file
fn process_unit(extractor: &Extractor, unit: &UnitConfig) -> Result<usize> {
    let table = EventTable::from_path(&unit.events)?;
    let design = extractor.build_named(&table, &unit.task, unit.regress_rt)?;

    let output = unit
        .output
        .clone()
        .unwrap_or_else(|| unit.events.with_extension("design.json"));
    write_design(&design, Some(&output))?;
    Ok(design.len())
}

/// Serialize a design to JSON, to a file or stdout
fn write_design(design: &DesignOutput, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(design).context("Failed to serialize design")?;
    match output {
        Some(path) => {
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write design to {:?}", path))?;
            log::info!("Design written to {:?}", path);
        }
        None => println!("{}", json),
    }
    Ok(())
}

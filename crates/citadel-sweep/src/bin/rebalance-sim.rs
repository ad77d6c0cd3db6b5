//! rebalance-sim CLI
//!
//! Runs silo rebalancing experiments and prints their results.
//!
//! Usage:
//!   rebalance-sim sweep [preset] [--json]
//!   rebalance-sim run <silos> [preset] [--json]
//!   rebalance-sim damping [max_cycles] [min_silos] [max_silos] [--json]
//!   rebalance-sim config <file.json> [--json]

use std::process::ExitCode;

use citadel_rebalance::{DampingParams, DampingSchedule};
use citadel_sweep::{format_schedule, Error, Preset, Result, ScenarioReport, Sweep};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn print_usage() {
    eprintln!("rebalance-sim - Entropy-driven silo rebalancing experiments");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  rebalance-sim sweep [preset] [--json]          Run a preset over 1-5 silos");
    eprintln!("  rebalance-sim run <silos> [preset] [--json]    Run a preset for one cluster size");
    eprintln!("  rebalance-sim damping [cycles] [min] [max]     Tabulate the damping schedule");
    eprintln!("  rebalance-sim config <file.json> [--json]      Run a sweep described in JSON");
    eprintln!();
    eprintln!("Presets: activation, activation-and-memory (default), memory-constraint");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  REBALANCE_MAX_CYCLES       Override max cycles");
    eprintln!("  REBALANCE_STALE_CYCLES     Override stale cycles needed to converge");
    eprintln!("  REBALANCE_STALE_THRESHOLD  Override entropy stale threshold");
    eprintln!("  REBALANCE_DAMPING          on/off");
    eprintln!("  RUST_LOG                   Log filter (logs go to stderr)");
}

fn parse_arg<T: std::str::FromStr>(args: &[&str], index: usize, name: &str) -> Result<Option<T>> {
    args.get(index)
        .map(|s| {
            s.parse()
                .map_err(|_| Error::Usage(format!("{} must be a number, got '{}'", name, s)))
        })
        .transpose()
}

fn preset_arg(args: &[&str], index: usize) -> Result<Preset> {
    args.get(index)
        .map(|s| s.parse())
        .unwrap_or(Ok(Preset::ActivationAndMemory))
}

fn print_reports(reports: &[ScenarioReport], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(reports)?);
    } else {
        for report in reports {
            println!("{}", report);
            println!();
        }
    }
    Ok(())
}

fn run(args: &[&str], json: bool) -> Result<()> {
    let Some(&command) = args.first() else {
        return Err(Error::Usage("missing command".into()));
    };

    match command {
        "sweep" => {
            let sweep = preset_arg(args, 1)?.sweep().with_env_overrides()?;
            print_reports(&sweep.run()?, json)
        }
        "run" => {
            let silos: usize = parse_arg(args, 1, "silos")?
                .ok_or_else(|| Error::Usage("run requires a silo count".into()))?;
            let sweep = preset_arg(args, 2)?
                .sweep()
                .only(silos)
                .with_env_overrides()?;
            print_reports(&sweep.run()?, json)
        }
        "damping" => {
            let cycles = parse_arg(args, 1, "max_cycles")?.unwrap_or(20);
            let min_silos = parse_arg(args, 2, "min_silos")?.unwrap_or(2);
            let max_silos = parse_arg(args, 3, "max_silos")?.unwrap_or(10);
            let schedule = DampingSchedule::tabulate(
                DampingParams::SCHEDULE_STUDY,
                cycles,
                min_silos,
                max_silos,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(&schedule)?);
            } else {
                print!("{}", format_schedule(&schedule));
            }
            Ok(())
        }
        "config" => {
            let path = args
                .get(1)
                .ok_or_else(|| Error::Usage("config requires a file path".into()))?;
            let sweep = Sweep::from_file(path)?.with_env_overrides()?;
            print_reports(&sweep.run()?, json)
        }
        other => Err(Error::Usage(format!("unknown command '{}'", other))),
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rebalance_sim=info,citadel_rebalance=info,citadel_sweep=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let json = raw.iter().any(|a| a == "--json");
    let args: Vec<&str> = raw
        .iter()
        .map(String::as_str)
        .filter(|a| *a != "--json")
        .collect();

    match run(&args, json) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Usage(msg)) => {
            eprintln!("Error: {}", msg);
            eprintln!();
            print_usage();
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

//! Scenario reports: the series and scalars a charting layer consumes.

use std::fmt;

use citadel_rebalance::{DampingSchedule, RunSummary, SimulationConfig, SimulationResult};
use serde::{Deserialize, Serialize};

/// Per-cycle series of one run, one entry per recorded cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    pub cycles: Vec<usize>,
    /// `loads[i]` is the load history of silo `i`.
    pub loads: Vec<Vec<f64>>,
    pub alpha: Vec<f64>,
    pub entropy: Vec<f64>,
    pub damping: Vec<f64>,
}

impl Series {
    pub fn from_result(result: &SimulationResult) -> Self {
        Self {
            cycles: result.cycles(),
            loads: (0..result.initial_loads.len())
                .map(|i| result.node_series(i))
                .collect(),
            alpha: result.alpha_series(),
            entropy: result.entropy_series(),
            damping: result.damping_series(),
        }
    }
}

/// Everything reported for one cluster size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub config: SimulationConfig,
    pub summary: RunSummary,
    pub initial_loads: Vec<f64>,
    pub final_loads: Vec<f64>,
    pub series: Series,
}

impl ScenarioReport {
    pub fn new(config: SimulationConfig, result: &SimulationResult) -> Self {
        Self {
            summary: result.summary(&config),
            config,
            initial_loads: result.initial_loads.clone(),
            final_loads: result.final_loads.clone(),
            series: Series::from_result(result),
        }
    }
}

impl fmt::Display for ScenarioReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = &self.summary;
        writeln!(
            f,
            "Silos = {} | Total Cycles = {} | Stale Cycles = {} | {:?}",
            s.silos, s.total_cycles, self.config.max_stale_cycles, s.outcome
        )?;
        writeln!(
            f,
            "  H_start={:.4} H_end={:.4} H_max={:.4} alpha_start={:.4} alpha_end={:.4}",
            s.initial_entropy, s.final_entropy, s.max_entropy, s.alpha_start, s.alpha_end
        )?;
        for (i, (initial, fin)) in self.initial_loads.iter().zip(&self.final_loads).enumerate() {
            write!(f, "  Silo {} (Initial={}, Final={}", i + 1, initial, fin)?;
            if let Some(weights) = &self.config.capacity_weights {
                write!(f, ", Rel. Mem. Usage={}", weights[i])?;
            }
            writeln!(f, ")")?;
        }
        write!(f, "  Idealized Equilibrium={:.0}", s.ideal_load)
    }
}

/// Text table of a damping schedule: one row per silo count.
pub fn format_schedule(schedule: &DampingSchedule) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "cycle_rate={} silo_rate={}\n",
        schedule.params.cycle_rate, schedule.params.silo_rate
    ));

    out.push_str("growth     ");
    for g in &schedule.growth {
        out.push_str(&format!(" {:.3}", g));
    }
    out.push('\n');

    for ((silos, attenuation), row) in schedule
        .silos
        .iter()
        .zip(&schedule.attenuation)
        .zip(&schedule.factor)
    {
        out.push_str(&format!("S={:<3} {:.3}", silos, attenuation));
        for v in row {
            out.push_str(&format!(" {:.3}", v));
        }
        out.push('\n');
    }
    out
}

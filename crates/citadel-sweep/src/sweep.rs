//! Sweeps over cluster sizes.
//!
//! A sweep runs one simulation per silo count in `min_silos..=max_silos`,
//! each on its own worker thread. Runs share nothing but the immutable base
//! configuration, and reports come back in silo-count order.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::thread;

use citadel_rebalance::{
    capacity_profile, DampingParams, EntropyWeighting, LogBase, RebalancingEngine,
    SimulationConfig, WeightReducer,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};
use crate::report::ScenarioReport;

/// Capacity weights applied to each run in a sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapacityMode {
    /// Plain activation balancing, no weights.
    #[default]
    None,
    /// All silos weighted 1.
    Uniform,
    /// Skewed weights from [`capacity_profile`].
    Profile,
}

impl CapacityMode {
    fn weights(self, silos: usize) -> Result<Option<Vec<f64>>> {
        Ok(match self {
            CapacityMode::None => None,
            CapacityMode::Uniform => Some(vec![1.0; silos]),
            CapacityMode::Profile => Some(capacity_profile(silos)?),
        })
    }
}

/// Named parameter sets for the three rebalancing experiments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Undamped, unweighted, 40 cycles.
    Activation,
    /// Damped, harmonic-weighted, 140 cycles.
    ActivationAndMemory,
    /// Undamped, arithmetic-weighted, base-2 entropy, 30 cycles.
    MemoryConstraint,
}

impl Preset {
    pub const ALL: [Preset; 3] = [
        Preset::Activation,
        Preset::ActivationAndMemory,
        Preset::MemoryConstraint,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Preset::Activation => "activation",
            Preset::ActivationAndMemory => "activation-and-memory",
            Preset::MemoryConstraint => "memory-constraint",
        }
    }

    /// The sweep this preset describes, over 1-5 silos.
    pub fn sweep(&self) -> Sweep {
        let base = SimulationConfig::default().with_stale_detection(10, 1e-4);
        let (base, capacity) = match self {
            Preset::Activation => (
                base.with_max_cycles(40).with_adaptive_damping(false),
                CapacityMode::None,
            ),
            Preset::ActivationAndMemory => (
                base.with_max_cycles(140)
                    .with_adaptive_damping(true)
                    .with_damping_params(DampingParams::DEFAULT)
                    .with_weight_reducer(WeightReducer::Harmonic),
                CapacityMode::Uniform,
            ),
            Preset::MemoryConstraint => (
                base.with_max_cycles(30)
                    .with_stale_detection(5, 1e-4)
                    .with_adaptive_damping(false)
                    .with_log_base(LogBase::Binary)
                    .with_weight_reducer(WeightReducer::Arithmetic)
                    .with_entropy_weighting(EntropyWeighting::Plain),
                CapacityMode::Uniform,
            ),
        };

        Sweep {
            min_silos: 1,
            max_silos: 5,
            base,
            capacity,
        }
    }
}

impl FromStr for Preset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Preset::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| {
                let names: Vec<_> = Preset::ALL.iter().map(|p| p.name()).collect();
                Error::Usage(format!(
                    "unknown preset '{}', expected one of: {}",
                    s,
                    names.join(", ")
                ))
            })
    }
}

/// A set of runs over consecutive cluster sizes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sweep {
    pub min_silos: usize,
    pub max_silos: usize,
    /// Shared parameters. `node_count` and `capacity_weights` are set per run.
    pub base: SimulationConfig,
    #[serde(default)]
    pub capacity: CapacityMode,
}

impl Default for Sweep {
    fn default() -> Self {
        Preset::ActivationAndMemory.sweep()
    }
}

impl Sweep {
    /// Load a sweep from a JSON file. Missing config fields take defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Restrict to a single cluster size.
    pub fn only(mut self, silos: usize) -> Self {
        self.min_silos = silos;
        self.max_silos = silos;
        self
    }

    /// Apply `REBALANCE_*` environment overrides to the base configuration.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key lookup. Unset keys leave fields as they are.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        fn parse<T: FromStr>(key: &str, value: &str) -> Result<T> {
            value
                .trim()
                .parse()
                .map_err(|_| Error::Usage(format!("{} has invalid value '{}'", key, value)))
        }

        if let Some(v) = lookup("REBALANCE_MAX_CYCLES") {
            self.base.max_cycles = parse("REBALANCE_MAX_CYCLES", &v)?;
        }
        if let Some(v) = lookup("REBALANCE_STALE_CYCLES") {
            self.base.max_stale_cycles = parse("REBALANCE_STALE_CYCLES", &v)?;
        }
        if let Some(v) = lookup("REBALANCE_STALE_THRESHOLD") {
            self.base.entropy_stale_threshold = parse("REBALANCE_STALE_THRESHOLD", &v)?;
        }
        if let Some(v) = lookup("REBALANCE_DAMPING") {
            self.base.use_adaptive_damping = match v.trim() {
                "on" | "true" | "1" => true,
                "off" | "false" | "0" => false,
                other => {
                    return Err(Error::Usage(format!(
                        "REBALANCE_DAMPING has invalid value '{}', expected on/off",
                        other
                    )))
                }
            };
        }
        Ok(self)
    }

    /// Per-run configurations, validated, in silo-count order.
    pub fn configs(&self) -> Result<Vec<SimulationConfig>> {
        if self.min_silos == 0 || self.min_silos > self.max_silos {
            return Err(Error::Usage(format!(
                "invalid silo range {}..={}",
                self.min_silos, self.max_silos
            )));
        }

        (self.min_silos..=self.max_silos)
            .map(|silos| {
                let mut config = self.base.clone().with_node_count(silos);
                config.capacity_weights = self.capacity.weights(silos)?;
                config.validate()?;
                Ok(config)
            })
            .collect()
    }

    /// Run every configuration in parallel, at most one thread per core.
    pub fn run(&self) -> Result<Vec<ScenarioReport>> {
        let configs = self.configs()?;
        let workers = thread::available_parallelism().map_or(1, |n| n.get());

        let mut reports = Vec::with_capacity(configs.len());
        for batch in configs.chunks(workers) {
            thread::scope(|scope| -> Result<()> {
                let handles: Vec<_> = batch
                    .iter()
                    .map(|config| {
                        let config = config.clone();
                        (config.node_count, scope.spawn(move || run_one(config)))
                    })
                    .collect();

                for (silos, handle) in handles {
                    reports.push(handle.join().map_err(|_| Error::WorkerPanicked(silos))??);
                }
                Ok(())
            })?;
        }
        Ok(reports)
    }
}

fn run_one(config: SimulationConfig) -> Result<ScenarioReport> {
    let engine = RebalancingEngine::new(config)?;
    let result = engine.run_scenario()?;
    let report = ScenarioReport::new(engine.config().clone(), &result);

    info!(
        silos = report.summary.silos,
        cycles = report.summary.total_cycles,
        outcome = ?report.summary.outcome,
        alpha_end = report.summary.alpha_end,
        "scenario finished"
    );
    Ok(report)
}

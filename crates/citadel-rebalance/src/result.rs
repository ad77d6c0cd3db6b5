//! Cycle history and run results.

use crate::config::SimulationConfig;
use crate::entropy::{entropy, max_entropy};
use crate::LoadVector;

/// Engine state. `Converged` and `Exhausted` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RunState {
    Running,
    /// Entropy stayed flat for `max_stale_cycles` consecutive cycles.
    Converged,
    /// Hit `max_cycles` first.
    Exhausted,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RunState::Running)
    }
}

/// What happened in one cycle, captured before that cycle's transfers.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CycleRecord {
    pub cycle: usize,
    /// Loads at the start of the cycle.
    pub loads: LoadVector,
    /// `load_i - optimal_i` at the start of the cycle.
    pub deviations: Vec<f64>,
    pub entropy: f64,
    /// Entropy over maximum entropy.
    pub alpha: f64,
    /// Damping factor for this cycle (1.0 when damping is off).
    pub damping: f64,
}

/// Outcome of a complete run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationResult {
    pub initial_loads: LoadVector,
    pub final_loads: LoadVector,
    pub history: Vec<CycleRecord>,
    /// Cycles actually run, including the terminating one.
    pub total_cycles: usize,
    pub outcome: RunState,
}

/// Scalar values a presentation layer shows next to the series.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RunSummary {
    pub silos: usize,
    pub initial_entropy: f64,
    pub final_entropy: f64,
    pub max_entropy: f64,
    pub alpha_start: f64,
    pub alpha_end: f64,
    /// Initial total load spread evenly.
    pub ideal_load: f64,
    pub total_cycles: usize,
    pub outcome: RunState,
}

impl SimulationResult {
    pub fn converged(&self) -> bool {
        self.outcome == RunState::Converged
    }

    /// Cycle indices, one per record.
    pub fn cycles(&self) -> Vec<usize> {
        self.history.iter().map(|r| r.cycle).collect()
    }

    /// Load of silo `node` over time. Empty if `node` is out of range.
    pub fn node_series(&self, node: usize) -> Vec<f64> {
        self.history
            .iter()
            .filter_map(|r| r.loads.get(node).copied())
            .collect()
    }

    pub fn alpha_series(&self) -> Vec<f64> {
        self.history.iter().map(|r| r.alpha).collect()
    }

    pub fn entropy_series(&self) -> Vec<f64> {
        self.history.iter().map(|r| r.entropy).collect()
    }

    pub fn damping_series(&self) -> Vec<f64> {
        self.history.iter().map(|r| r.damping).collect()
    }

    /// Derive summary values using the same weighting as the run.
    pub fn summary(&self, config: &SimulationConfig) -> RunSummary {
        let silos = self.initial_loads.len();
        let weighting = config.entropy_weights();

        RunSummary {
            silos,
            initial_entropy: entropy(&self.initial_loads, weighting, config.log_base),
            final_entropy: entropy(&self.final_loads, weighting, config.log_base),
            max_entropy: max_entropy(silos, config.log_base),
            alpha_start: self.history.first().map_or(0.0, |r| r.alpha),
            alpha_end: self.history.last().map_or(0.0, |r| r.alpha),
            ideal_load: self.initial_loads.iter().sum::<f64>() / silos.max(1) as f64,
            total_cycles: self.total_cycles,
            outcome: self.outcome,
        }
    }
}

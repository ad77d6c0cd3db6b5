//! Simulation configuration.

use crate::damping::DampingParams;
use crate::entropy::{EntropyWeighting, LogBase, WeightReducer, Weighting};
use crate::error::{Error, Result};

/// Parameters for one simulation run. Immutable once the engine holds it.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SimulationConfig {
    /// Number of silos (S).
    pub node_count: usize,
    /// Hard upper bound on cycles run.
    pub max_cycles: usize,
    /// Consecutive stale cycles that count as convergence.
    pub max_stale_cycles: usize,
    /// Entropy change below which a cycle counts as stale.
    pub entropy_stale_threshold: f64,
    /// Relative capacity per silo. `None` means all silos are equal.
    pub capacity_weights: Option<Vec<f64>>,
    /// Whether the weights also scale the entropy measure.
    pub entropy_weighting: EntropyWeighting,
    /// Scale transfers by the adaptive damping factor.
    pub use_adaptive_damping: bool,
    /// Rates for the damping factor.
    pub damping: DampingParams,
    /// Logarithm base for entropy.
    pub log_base: LogBase,
    /// How capacity weights reduce to the reference weight.
    pub weight_reducer: WeightReducer,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            node_count: 5,
            max_cycles: 140,
            max_stale_cycles: 10,
            entropy_stale_threshold: 1e-4,
            capacity_weights: None,
            entropy_weighting: EntropyWeighting::Capacity,
            use_adaptive_damping: true,
            damping: DampingParams::default(),
            log_base: LogBase::Natural,
            weight_reducer: WeightReducer::Harmonic,
        }
    }
}

impl SimulationConfig {
    /// Default configuration for a cluster of `node_count` silos.
    pub fn for_silos(node_count: usize) -> Self {
        Self {
            node_count,
            ..Self::default()
        }
    }

    pub fn with_node_count(mut self, node_count: usize) -> Self {
        self.node_count = node_count;
        self
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_stale_detection(mut self, max_stale_cycles: usize, threshold: f64) -> Self {
        self.max_stale_cycles = max_stale_cycles;
        self.entropy_stale_threshold = threshold;
        self
    }

    pub fn with_capacity_weights(mut self, weights: Vec<f64>) -> Self {
        self.capacity_weights = Some(weights);
        self
    }

    pub fn without_capacity_weights(mut self) -> Self {
        self.capacity_weights = None;
        self
    }

    pub fn with_entropy_weighting(mut self, weighting: EntropyWeighting) -> Self {
        self.entropy_weighting = weighting;
        self
    }

    pub fn with_adaptive_damping(mut self, enabled: bool) -> Self {
        self.use_adaptive_damping = enabled;
        self
    }

    pub fn with_damping_params(mut self, damping: DampingParams) -> Self {
        self.damping = damping;
        self
    }

    pub fn with_log_base(mut self, log_base: LogBase) -> Self {
        self.log_base = log_base;
        self
    }

    pub fn with_weight_reducer(mut self, reducer: WeightReducer) -> Self {
        self.weight_reducer = reducer;
        self
    }

    /// Damping factor applied in `cycle`, or 1.0 when damping is off.
    #[inline]
    pub fn damping_factor(&self, cycle: usize) -> f64 {
        if self.use_adaptive_damping {
            self.damping.factor(cycle, self.node_count)
        } else {
            1.0
        }
    }

    /// Reference weight `M`, or 1.0 when unweighted.
    pub fn reference_weight(&self) -> f64 {
        match &self.capacity_weights {
            Some(w) => self.weight_reducer.reduce(w),
            None => 1.0,
        }
    }

    /// Weights for the entropy measure, or `None` for plain entropy.
    pub fn entropy_weights(&self) -> Option<Weighting<'_>> {
        match self.entropy_weighting {
            EntropyWeighting::Capacity => self
                .capacity_weights
                .as_deref()
                .map(|w| Weighting::new(w, self.weight_reducer)),
            EntropyWeighting::Plain => None,
        }
    }

    /// Check every field. Called by the engine before any cycle runs.
    pub fn validate(&self) -> Result<()> {
        if self.node_count == 0 {
            return Err(Error::invalid("node_count must be at least 1"));
        }
        if self.max_cycles == 0 {
            return Err(Error::invalid("max_cycles must be positive"));
        }
        if self.max_stale_cycles == 0 {
            return Err(Error::invalid("max_stale_cycles must be positive"));
        }
        if !(self.entropy_stale_threshold.is_finite() && self.entropy_stale_threshold > 0.0) {
            return Err(Error::invalid(format!(
                "entropy_stale_threshold must be positive and finite, got {}",
                self.entropy_stale_threshold
            )));
        }
        if let Some(weights) = &self.capacity_weights {
            if weights.len() != self.node_count {
                return Err(Error::invalid(format!(
                    "expected {} capacity weights, got {}",
                    self.node_count,
                    weights.len()
                )));
            }
            if let Some((i, w)) = weights
                .iter()
                .enumerate()
                .find(|(_, w)| !(w.is_finite() && **w > 0.0))
            {
                return Err(Error::invalid(format!(
                    "capacity weight {} must be positive and finite, got {}",
                    i, w
                )));
            }
        }
        if self.use_adaptive_damping {
            let DampingParams {
                cycle_rate,
                silo_rate,
            } = self.damping;
            if !(cycle_rate.is_finite() && cycle_rate > 0.0)
                || !(silo_rate.is_finite() && silo_rate > 0.0)
            {
                return Err(Error::invalid(format!(
                    "damping rates must be positive and finite, got cycle_rate={} silo_rate={}",
                    cycle_rate, silo_rate
                )));
            }
        }
        Ok(())
    }
}

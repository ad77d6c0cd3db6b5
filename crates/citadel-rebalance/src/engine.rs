//! The rebalancing loop.
//!
//! Each cycle the engine measures how far every silo is from its
//! capacity-weighted target, records the entropy of the distribution, and
//! moves whole units of load between adjacent silos. Transfers are scaled by
//! `alpha` (entropy over maximum entropy) and by the damping factor.
//!
//! # Termination
//!
//! A cycle is *stale* when entropy moved by less than
//! `entropy_stale_threshold` since the previous cycle. After
//! `max_stale_cycles` consecutive stale cycles the run is `Converged` and the
//! final cycle applies no transfers. Otherwise the run is `Exhausted` after
//! `max_cycles` cycles. Either way the loop is bounded by `max_cycles`.
//!
//! The first cycle compares against the entropy of the initial vector, so it
//! always counts as stale.

use tracing::{debug, trace};

use crate::config::SimulationConfig;
use crate::entropy::{entropy, max_entropy};
use crate::error::{Error, Result};
use crate::result::{CycleRecord, RunState, SimulationResult};
use crate::scenario::initial_loads;
use crate::LoadVector;

/// Runs rebalancing simulations for one validated configuration.
#[derive(Debug, Clone)]
pub struct RebalancingEngine {
    config: SimulationConfig,
    /// Per-silo weights, all ones when the config has none.
    weights: Vec<f64>,
    reference_weight: f64,
    max_entropy: f64,
}

impl RebalancingEngine {
    /// Validate `config` and build an engine for it.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;

        let weights = config
            .capacity_weights
            .clone()
            .unwrap_or_else(|| vec![1.0; config.node_count]);
        let reference_weight = config.reference_weight();
        let max_entropy = max_entropy(config.node_count, config.log_base);

        Ok(Self {
            config,
            weights,
            reference_weight,
            max_entropy,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Maximum entropy for this cluster size.
    pub fn max_entropy(&self) -> f64 {
        self.max_entropy
    }

    /// Run from the built-in starting distribution for the configured size.
    pub fn run_scenario(&self) -> Result<SimulationResult> {
        self.run(initial_loads(self.config.node_count)?)
    }

    /// Run to completion from `initial`.
    pub fn run(&self, initial: LoadVector) -> Result<SimulationResult> {
        let mut run = self.start(initial)?;
        while !run.step().is_terminal() {}
        Ok(run.finish())
    }

    /// Begin a run that the caller advances with [`Run::step`].
    pub fn start(&self, initial: LoadVector) -> Result<Run<'_>> {
        let silos = self.config.node_count;
        if initial.len() != silos {
            return Err(Error::invalid(format!(
                "expected {} initial loads, got {}",
                silos,
                initial.len()
            )));
        }
        if let Some((i, n)) = initial
            .iter()
            .enumerate()
            .find(|(_, n)| !(n.is_finite() && **n >= 0.0))
        {
            return Err(Error::invalid(format!(
                "initial load {} must be non-negative and finite, got {}",
                i, n
            )));
        }

        debug!(
            silos,
            max_cycles = self.config.max_cycles,
            weighted = self.config.capacity_weights.is_some(),
            damping = self.config.use_adaptive_damping,
            "starting rebalancing run"
        );

        let previous_entropy = self.entropy(&initial);
        Ok(Run {
            engine: self,
            loads: initial.clone(),
            initial,
            history: Vec::new(),
            previous_entropy,
            stale_cycles: 0,
            cycle: 0,
            state: RunState::Running,
        })
    }

    /// Entropy of `loads` under this engine's weighting and log base.
    pub fn entropy(&self, loads: &[f64]) -> f64 {
        entropy(loads, self.config.entropy_weights(), self.config.log_base)
    }

    /// Target load per silo: `(N / S) * (M / w_i)` with `N` the current total.
    pub fn optimal_loads(&self, loads: &[f64]) -> Vec<f64> {
        let total: f64 = loads.iter().sum();
        let fair_share = total / self.config.node_count as f64;
        self.weights
            .iter()
            .map(|w| fair_share * (self.reference_weight / w))
            .collect()
    }

    /// `load_i - optimal_i` for every silo.
    pub fn deviations(&self, loads: &[f64]) -> Vec<f64> {
        loads
            .iter()
            .zip(self.optimal_loads(loads))
            .map(|(n, opt)| n - opt)
            .collect()
    }

    /// Apply one round of pairwise transfers, then floor every load at zero.
    ///
    /// For each adjacent pair `(i, i+1)` the transfer is
    /// `round(scale * (dev_i - dev_{i+1}) / 2)` units from `i` to `i+1`.
    /// Each transfer conserves the total; only the floor can change it.
    /// A NaN transfer skips its pair.
    pub fn transfer(&self, loads: &mut [f64], deviations: &[f64], scale: f64) -> Result<()> {
        if loads.len() != deviations.len() {
            return Err(Error::invalid(format!(
                "expected {} deviations, got {}",
                loads.len(),
                deviations.len()
            )));
        }
        apply_transfers(loads, deviations, scale);
        Ok(())
    }
}

fn apply_transfers(loads: &mut [f64], deviations: &[f64], scale: f64) {
    for i in 0..loads.len().saturating_sub(1) {
        let dev_diff = deviations[i] - deviations[i + 1];
        let delta = scale * (dev_diff / 2.0);
        if delta.is_nan() {
            trace!(pair = i, "skipping NaN transfer");
            continue;
        }
        let delta = delta.round_ties_even();
        loads[i] -= delta;
        loads[i + 1] += delta;
    }
    for n in loads.iter_mut() {
        *n = n.max(0.0);
    }
}

/// An in-progress run.
#[derive(Debug)]
pub struct Run<'e> {
    engine: &'e RebalancingEngine,
    initial: LoadVector,
    loads: LoadVector,
    history: Vec<CycleRecord>,
    previous_entropy: f64,
    stale_cycles: usize,
    /// Index of the next cycle to run.
    cycle: usize,
    state: RunState,
}

impl<'e> Run<'e> {
    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn loads(&self) -> &[f64] {
        &self.loads
    }

    pub fn history(&self) -> &[CycleRecord] {
        &self.history
    }

    /// Consecutive stale cycles seen so far.
    pub fn stale_cycles(&self) -> usize {
        self.stale_cycles
    }

    /// Run one cycle. Does nothing once the run is terminal.
    pub fn step(&mut self) -> RunState {
        if self.state.is_terminal() {
            return self.state;
        }

        let engine = self.engine;
        let config = &engine.config;
        let cycle = self.cycle;

        let deviations = engine.deviations(&self.loads);
        let entropy = engine.entropy(&self.loads);
        let alpha = if engine.max_entropy != 0.0 {
            entropy / engine.max_entropy
        } else {
            0.0
        };
        let damping = config.damping_factor(cycle);

        self.history.push(CycleRecord {
            cycle,
            loads: self.loads.clone(),
            deviations,
            entropy,
            alpha,
            damping,
        });

        if (entropy - self.previous_entropy).abs() < config.entropy_stale_threshold {
            self.stale_cycles += 1;
        } else {
            self.stale_cycles = 0;
        }
        self.previous_entropy = entropy;

        trace!(cycle, entropy, alpha, damping, stale = self.stale_cycles, "cycle");

        // A single silo has nothing to balance against.
        if config.node_count == 1 || self.stale_cycles >= config.max_stale_cycles {
            return self.terminate(RunState::Converged);
        }

        let record = &self.history[self.history.len() - 1];
        apply_transfers(&mut self.loads, &record.deviations, alpha * damping);

        self.cycle += 1;
        if self.cycle >= config.max_cycles {
            return self.terminate(RunState::Exhausted);
        }
        self.state
    }

    fn terminate(&mut self, state: RunState) -> RunState {
        self.state = state;
        debug!(
            silos = self.engine.config.node_count,
            cycles = self.history.len(),
            outcome = ?state,
            entropy = self.previous_entropy,
            "rebalancing run finished"
        );
        state
    }

    /// Consume the run and produce its result.
    ///
    /// Normally called after the run is terminal; an unfinished run reports
    /// itself as `Running`.
    pub fn finish(self) -> SimulationResult {
        SimulationResult {
            total_cycles: self.history.len(),
            initial_loads: self.initial,
            final_loads: self.loads,
            history: self.history,
            outcome: self.state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entropy::{LogBase, WeightReducer};

    fn undamped(silos: usize) -> SimulationConfig {
        SimulationConfig::for_silos(silos).with_adaptive_damping(false)
    }

    #[test]
    fn single_silo_converges_immediately() {
        let engine = RebalancingEngine::new(SimulationConfig::for_silos(1)).unwrap();
        let result = engine.run_scenario().unwrap();

        assert_eq!(result.outcome, RunState::Converged);
        assert_eq!(result.total_cycles, 1);
        assert_eq!(result.history[0].cycle, 0);
        assert_eq!(result.history[0].entropy, 0.0);
        assert_eq!(result.history[0].alpha, 0.0);
        assert_eq!(result.final_loads, vec![100.0]);
    }

    #[test]
    fn two_silos_settle_at_half() {
        let config = undamped(2)
            .with_max_cycles(40)
            .with_stale_detection(10, 1e-4);
        let engine = RebalancingEngine::new(config).unwrap();
        let result = engine.run(vec![900.0, 10.0]).unwrap();

        assert!(result.converged());
        assert!(result.total_cycles < 40);
        assert_eq!(result.final_loads, vec![455.0, 455.0]);

        let hot = result.node_series(0);
        let cold = result.node_series(1);
        assert!(hot.windows(2).all(|w| w[1] <= w[0]));
        assert!(cold.windows(2).all(|w| w[1] >= w[0]));
        assert!(hot.iter().all(|&n| n >= 455.0));
        assert!(cold.iter().all(|&n| n <= 455.0));
    }

    #[test]
    fn exhausts_when_threshold_unreachable() {
        let config = SimulationConfig::for_silos(5)
            .with_max_cycles(5)
            .with_stale_detection(10, 1e-4);
        let engine = RebalancingEngine::new(config).unwrap();
        let result = engine.run_scenario().unwrap();

        assert_eq!(result.outcome, RunState::Exhausted);
        assert_eq!(result.total_cycles, 5);
        assert_eq!(result.cycles(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn damping_blocks_first_cycle() {
        let engine = RebalancingEngine::new(SimulationConfig::for_silos(3)).unwrap();
        let mut run = engine.start(vec![800.0, 10.0, 100.0]).unwrap();
        run.step();
        assert_eq!(run.loads(), &[800.0, 10.0, 100.0]);
        assert_eq!(run.history()[0].damping, 0.0);

        run.step();
        assert_ne!(run.loads(), &[800.0, 10.0, 100.0]);
    }

    #[test]
    fn step_is_idempotent_after_termination() {
        let engine = RebalancingEngine::new(SimulationConfig::for_silos(1)).unwrap();
        let mut run = engine.start(vec![5.0]).unwrap();
        assert_eq!(run.step(), RunState::Converged);
        assert_eq!(run.step(), RunState::Converged);
        assert_eq!(run.history().len(), 1);
    }

    #[test]
    fn rejects_mismatched_initial_loads() {
        let engine = RebalancingEngine::new(SimulationConfig::for_silos(3)).unwrap();
        assert!(engine.run(vec![1.0, 2.0]).is_err());
        assert!(engine.run(vec![1.0, -2.0, 3.0]).is_err());
        assert!(engine.run(vec![1.0, f64::NAN, 3.0]).is_err());
    }

    #[test]
    fn rejects_invalid_config() {
        assert!(RebalancingEngine::new(SimulationConfig::for_silos(0)).is_err());
        assert!(RebalancingEngine::new(SimulationConfig::default().with_max_cycles(0)).is_err());
        let mismatched = SimulationConfig::for_silos(3).with_capacity_weights(vec![1.0, 2.0]);
        assert!(matches!(
            RebalancingEngine::new(mismatched),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn optimal_loads_follow_capacity() {
        let config = SimulationConfig::for_silos(2)
            .with_capacity_weights(vec![1.0, 3.0])
            .with_weight_reducer(WeightReducer::Arithmetic);
        let engine = RebalancingEngine::new(config).unwrap();
        // N/S = 50, M = 2
        let optimal = engine.optimal_loads(&[60.0, 40.0]);
        assert!((optimal[0] - 100.0).abs() < 1e-12);
        assert!((optimal[1] - 100.0 / 3.0).abs() < 1e-12);

        let dev = engine.deviations(&[60.0, 40.0]);
        assert!((dev[0] + 40.0).abs() < 1e-12);
    }

    #[test]
    fn transfer_conserves_without_floor() {
        let engine = RebalancingEngine::new(undamped(4)).unwrap();
        let mut loads = vec![70.0, 10.0, 10.0, 10.0];
        let dev = engine.deviations(&loads);
        engine.transfer(&mut loads, &dev, 0.8).unwrap();
        assert_eq!(loads.iter().sum::<f64>(), 100.0);
        assert!(loads.iter().all(|n| n.fract() == 0.0));
    }

    #[test]
    fn transfer_skips_nan_pairs() {
        let engine = RebalancingEngine::new(undamped(3)).unwrap();
        let mut loads = vec![10.0, 20.0, 30.0];
        engine.transfer(&mut loads, &[f64::NAN, 0.0, 0.0], 1.0).unwrap();
        // Pair (0,1) skipped, pair (1,2) has zero difference.
        assert_eq!(loads, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn transfer_rejects_short_deviations() {
        let engine = RebalancingEngine::new(undamped(3)).unwrap();
        let mut loads = vec![10.0, 20.0, 30.0];
        assert!(matches!(
            engine.transfer(&mut loads, &[1.0, 2.0], 1.0),
            Err(Error::InvalidArgument(_))
        ));
        assert_eq!(loads, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn transfer_rounds_half_to_even() {
        let engine = RebalancingEngine::new(undamped(2)).unwrap();
        // delta = 1.0 * (5 - 0) / 2 = 2.5 → 2
        let mut loads = vec![10.0, 10.0];
        engine.transfer(&mut loads, &[5.0, 0.0], 1.0).unwrap();
        assert_eq!(loads, vec![8.0, 12.0]);
    }

    #[test]
    fn binary_log_gives_same_alpha() {
        let natural = RebalancingEngine::new(undamped(4)).unwrap();
        let binary =
            RebalancingEngine::new(undamped(4).with_log_base(LogBase::Binary)).unwrap();
        let a = natural.run_scenario().unwrap();
        let b = binary.run_scenario().unwrap();

        assert_eq!(a.final_loads, b.final_loads);
        for (x, y) in a.alpha_series().iter().zip(b.alpha_series()) {
            assert!((x - y).abs() < 1e-9);
        }
        assert!((binary.max_entropy() - 2.0).abs() < 1e-12);
    }
}

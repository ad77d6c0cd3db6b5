//! Citadel Silo Rebalancing
//!
//! Simulates how a fixed pool of activations spreads across a cluster of
//! silos under an iterative, entropy-driven rebalancing rule.
//!
//! # Model
//!
//! Every cycle each silo's load is compared with its target
//! `(N / S) * (M / w_i)`, where `w_i` is the silo's relative capacity and `M`
//! is the reduced reference weight. Adjacent silos exchange half their
//! deviation difference, scaled by:
//!
//! - **alpha**: `H / H_max`, the normalized entropy of the distribution
//! - **damping**: `(1 - e^(-kc)) / (1 + r(S - 1))`, a ramp that starts at
//!   zero and shrinks with cluster size
//!
//! Transfers are whole units. The run stops when entropy has been flat for
//! `max_stale_cycles` consecutive cycles, or after `max_cycles`.
//!
//! # Usage
//!
//! ```
//! use citadel_rebalance::{RebalancingEngine, SimulationConfig};
//!
//! let config = SimulationConfig::for_silos(2).with_adaptive_damping(false);
//! let engine = RebalancingEngine::new(config).unwrap();
//! let result = engine.run(vec![900.0, 10.0]).unwrap();
//!
//! assert!(result.converged());
//! assert_eq!(result.final_loads, vec![455.0, 455.0]);
//! ```

mod config;
mod damping;
mod engine;
mod entropy;
mod error;
mod result;
mod scenario;

pub use config::SimulationConfig;
pub use damping::{DampingParams, DampingSchedule};
pub use engine::{RebalancingEngine, Run};
pub use entropy::{entropy, max_entropy, EntropyWeighting, LogBase, WeightReducer, Weighting};
pub use error::{Error, Result};
pub use result::{CycleRecord, RunState, RunSummary, SimulationResult};
pub use scenario::{capacity_profile, initial_loads, BASE_LOAD};

/// Load per silo, indexed `0..S`.
pub type LoadVector = Vec<f64>;

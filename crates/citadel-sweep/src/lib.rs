//! Citadel Rebalancing Sweeps
//!
//! Drives [`citadel_rebalance`] over a range of cluster sizes and turns each
//! run into a [`ScenarioReport`]: per-silo load series, alpha and entropy
//! series, and the summary scalars shown next to them.
//!
//! # Usage
//!
//! ```
//! use citadel_sweep::Preset;
//!
//! let reports = Preset::Activation.sweep().run().unwrap();
//! assert_eq!(reports.len(), 5);
//! assert!(reports.iter().all(|r| r.summary.total_cycles <= 40));
//! ```

mod error;
mod report;
mod sweep;

pub use error::{Error, Result};
pub use report::{format_schedule, ScenarioReport, Series};
pub use sweep::{CapacityMode, Preset, Sweep};

//! Adaptive damping of per-cycle load transfers.
//!
//! The damping factor throttles how much load may move in one cycle:
//!
//! ```text
//! growth(c)            = 1 - exp(-cycle_rate * c)
//! silo_attenuation(S)  = 1 / (1 + silo_rate * (S - 1))
//! factor(c, S)         = growth(c) * silo_attenuation(S)
//! ```
//!
//! Early cycles ramp up from zero, and larger clusters take smaller steps
//! because more silos compete for the same load.

use crate::error::{Error, Result};

/// Rate constants for the damping schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DampingParams {
    /// How quickly the growth term approaches 1 as cycles accumulate.
    pub cycle_rate: f64,
    /// How strongly each additional silo shrinks the step size.
    pub silo_rate: f64,
}

impl DampingParams {
    /// Rates used by the activation-and-memory experiment.
    pub const DEFAULT: Self = Self {
        cycle_rate: 0.1,
        silo_rate: 0.5,
    };

    /// Faster ramp used when tabulating the schedule on its own.
    pub const SCHEDULE_STUDY: Self = Self {
        cycle_rate: 0.2,
        silo_rate: 0.5,
    };

    /// Create from explicit rates.
    pub const fn new(cycle_rate: f64, silo_rate: f64) -> Self {
        Self {
            cycle_rate,
            silo_rate,
        }
    }

    /// Ramp-up term, 0 at cycle 0 and approaching 1.
    #[inline]
    pub fn growth(&self, cycle: usize) -> f64 {
        1.0 - (-self.cycle_rate * cycle as f64).exp()
    }

    /// Cluster-size term, 1 for a single silo and shrinking with `silos`.
    #[inline]
    pub fn silo_attenuation(&self, silos: usize) -> f64 {
        1.0 / (1.0 + self.silo_rate * silos.saturating_sub(1) as f64)
    }

    /// Combined damping factor for `cycle` in a cluster of `silos`.
    #[inline]
    pub fn factor(&self, cycle: usize, silos: usize) -> f64 {
        self.growth(cycle) * self.silo_attenuation(silos)
    }
}

impl Default for DampingParams {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Tabulated damping schedule for charting.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DampingSchedule {
    pub params: DampingParams,
    /// Cycle indices, starting at 1.
    pub cycles: Vec<usize>,
    /// Silo counts covered by the table.
    pub silos: Vec<usize>,
    /// `growth(c)` for each entry of `cycles`.
    pub growth: Vec<f64>,
    /// `silo_attenuation(S)` for each entry of `silos`.
    pub attenuation: Vec<f64>,
    /// `factor[s][c]`: one row per silo count, one column per cycle.
    pub factor: Vec<Vec<f64>>,
}

impl DampingSchedule {
    /// Evaluate the schedule for cycles `1..=max_cycles` and silo counts
    /// `min_silos..=max_silos`.
    ///
    /// A cluster has at least one silo, so `min_silos` must be positive and
    /// no greater than `max_silos`.
    pub fn tabulate(
        params: DampingParams,
        max_cycles: usize,
        min_silos: usize,
        max_silos: usize,
    ) -> Result<Self> {
        if min_silos == 0 || min_silos > max_silos {
            return Err(Error::invalid(format!(
                "silo range must satisfy 1 <= min <= max, got {}..={}",
                min_silos, max_silos
            )));
        }

        let cycles: Vec<usize> = (1..=max_cycles).collect();
        let silos: Vec<usize> = (min_silos..=max_silos).collect();

        let growth = cycles.iter().map(|&c| params.growth(c)).collect();
        let attenuation = silos.iter().map(|&s| params.silo_attenuation(s)).collect();
        let factor = silos
            .iter()
            .map(|&s| cycles.iter().map(|&c| params.factor(c, s)).collect())
            .collect();

        Ok(Self {
            params,
            cycles,
            silos,
            growth,
            attenuation,
            factor,
        })
    }

    /// The factor row for a given silo count, if tabulated.
    pub fn row(&self, silos: usize) -> Option<&[f64]> {
        self.silos
            .iter()
            .position(|&s| s == silos)
            .map(|i| self.factor[i].as_slice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_at_first_cycle() {
        let p = DampingParams::default();
        for s in 1..=10 {
            assert_eq!(p.factor(0, s), 0.0);
        }
    }

    #[test]
    fn strictly_increasing_in_cycles() {
        let p = DampingParams::default();
        for s in 1..=8 {
            let mut prev = p.factor(0, s);
            for c in 1..60 {
                let f = p.factor(c, s);
                assert!(f > prev, "factor({}, {}) = {} not above {}", c, s, f, prev);
                prev = f;
            }
        }
    }

    #[test]
    fn strictly_decreasing_in_silos() {
        let p = DampingParams::default();
        for c in 1..30 {
            let mut prev = p.factor(c, 1);
            for s in 2..=12 {
                let f = p.factor(c, s);
                assert!(f < prev);
                prev = f;
            }
        }
    }

    #[test]
    fn bounded_by_one() {
        let p = DampingParams::SCHEDULE_STUDY;
        for c in 0..500 {
            let f = p.factor(c, 1);
            assert!((0.0..=1.0).contains(&f));
        }
        assert_eq!(p.silo_attenuation(1), 1.0);
        // 1 / (1 + 0.5 * 2)
        assert!((p.silo_attenuation(3) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn schedule_shape() {
        let table = DampingSchedule::tabulate(DampingParams::SCHEDULE_STUDY, 20, 2, 10).unwrap();
        assert_eq!(table.cycles.len(), 20);
        assert_eq!(table.silos, (2..=10).collect::<Vec<_>>());
        assert_eq!(table.factor.len(), 9);
        assert!(table.factor.iter().all(|row| row.len() == 20));

        let row = table.row(4).unwrap();
        let p = DampingParams::SCHEDULE_STUDY;
        assert!((row[0] - p.factor(1, 4)).abs() < 1e-15);
        assert!(table.row(11).is_none());
    }

    #[test]
    fn schedule_needs_a_silo() {
        let p = DampingParams::SCHEDULE_STUDY;
        assert!(matches!(
            DampingSchedule::tabulate(p, 20, 0, 10),
            Err(Error::InvalidArgument(_))
        ));
        assert!(DampingSchedule::tabulate(p, 20, 5, 4).is_err());
        assert_eq!(DampingSchedule::tabulate(p, 20, 1, 1).unwrap().factor.len(), 1);
    }
}

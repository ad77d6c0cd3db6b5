//! Hand-picked starting distributions.
//!
//! Clusters of 1-5 silos start from a fixed, deliberately skewed table.
//! Larger clusters start with one hot silo holding `10 * (S - 1)` and every
//! other silo holding `10`.

use crate::error::{Error, Result};
use crate::LoadVector;

/// Load held by each cold silo in generated scenarios.
pub const BASE_LOAD: f64 = 10.0;

/// Fixed starting loads for small clusters, indexed by `S - 1`.
const SCENARIOS: [&[f64]; 5] = [
    &[100.0],
    &[900.0, 10.0],
    &[800.0, 10.0, 100.0],
    &[70.0, 10.0, 10.0, 10.0],
    &[700.0, 120.0, 340.0, 1200.0, 2500.0],
];

/// Uneven capacity pattern for weighted scenarios.
const CAPACITY_PATTERN: [f64; 5] = [1.0, 1.5, 2.0, 1.3, 2.2];

/// Starting load vector for a cluster of `silos` nodes.
///
/// # Examples
///
/// ```
/// use citadel_rebalance::initial_loads;
///
/// assert_eq!(initial_loads(2).unwrap(), vec![900.0, 10.0]);
/// assert_eq!(initial_loads(7).unwrap(), vec![60.0, 10.0, 10.0, 10.0, 10.0, 10.0, 10.0]);
/// ```
pub fn initial_loads(silos: usize) -> Result<LoadVector> {
    match silos {
        0 => Err(Error::invalid("silo count must be at least 1")),
        s if s <= SCENARIOS.len() => Ok(SCENARIOS[s - 1].to_vec()),
        s => {
            let mut loads = vec![BASE_LOAD; s];
            loads[0] = BASE_LOAD * (s - 1) as f64;
            Ok(loads)
        }
    }
}

/// Skewed capacity weights for a cluster of `silos` nodes.
///
/// The five-entry pattern repeats for clusters larger than five.
pub fn capacity_profile(silos: usize) -> Result<Vec<f64>> {
    if silos == 0 {
        return Err(Error::invalid("silo count must be at least 1"));
    }
    Ok(CAPACITY_PATTERN.iter().copied().cycle().take(silos).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_silos_rejected() {
        assert!(matches!(initial_loads(0), Err(Error::InvalidArgument(_))));
        assert!(capacity_profile(0).is_err());
    }

    #[test]
    fn fixed_table() {
        assert_eq!(initial_loads(1).unwrap(), vec![100.0]);
        assert_eq!(initial_loads(3).unwrap(), vec![800.0, 10.0, 100.0]);
        assert_eq!(initial_loads(4).unwrap(), vec![70.0, 10.0, 10.0, 10.0]);
        assert_eq!(
            initial_loads(5).unwrap(),
            vec![700.0, 120.0, 340.0, 1200.0, 2500.0]
        );
    }

    #[test]
    fn generated_has_one_hot_silo() {
        let loads = initial_loads(12).unwrap();
        assert_eq!(loads.len(), 12);
        assert_eq!(loads[0], 110.0);
        assert!(loads[1..].iter().all(|&n| n == BASE_LOAD));
    }

    #[test]
    fn length_and_sign_hold() {
        for s in 1..=64 {
            let loads = initial_loads(s).unwrap();
            assert_eq!(loads.len(), s);
            assert!(loads.iter().all(|&n| n >= 0.0));
        }
    }

    #[test]
    fn capacity_profile_cycles() {
        assert_eq!(capacity_profile(2).unwrap(), vec![1.0, 1.5]);
        let p = capacity_profile(7).unwrap();
        assert_eq!(p, vec![1.0, 1.5, 2.0, 1.3, 2.2, 1.0, 1.5]);
        assert!(p.iter().all(|&w| w > 0.0));
    }
}

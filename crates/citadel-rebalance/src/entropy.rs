//! Shannon entropy of a load distribution.
//!
//! Plain variant: `p_i = n_i / N`.
//! Capacity-weighted variant: `p_i = (n_i / N) * (m_i / M)` where `M` is a
//! reference scalar reduced from the weights (see [`WeightReducer`]).
//!
//! `H = -Σ p_i log_b(p_i)` over nonzero `p_i`. An all-zero vector has no
//! distribution and is defined to have entropy 0.

/// Logarithm base used for entropy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum LogBase {
    /// Nats.
    #[default]
    Natural,
    /// Bits.
    Binary,
}

impl LogBase {
    #[inline]
    pub fn log(self, x: f64) -> f64 {
        match self {
            LogBase::Natural => x.ln(),
            LogBase::Binary => x.log2(),
        }
    }
}

/// How capacity weights are reduced to the reference scalar `M`.
///
/// The two modes give different convergence targets for skewed weights, so
/// the choice is always explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WeightReducer {
    /// `len / Σ(1/w)`. Weights are capacities (memory-constrained runs).
    #[default]
    Harmonic,
    /// `Σw / len`. Weights are a plain average weighting.
    Arithmetic,
}

impl WeightReducer {
    /// Reduce `weights` to a single reference value.
    ///
    /// Returns NaN for an empty slice.
    pub fn reduce(self, weights: &[f64]) -> f64 {
        let len = weights.len() as f64;
        match self {
            WeightReducer::Harmonic => len / weights.iter().map(|w| 1.0 / w).sum::<f64>(),
            WeightReducer::Arithmetic => weights.iter().sum::<f64>() / len,
        }
    }
}

/// Whether capacity weights also shape the entropy measure.
///
/// Targets always follow the weights. Entropy either scales each share by
/// `w_i / M` or measures the raw activation spread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EntropyWeighting {
    /// `p_i = (n_i / N) * (w_i / M)`.
    #[default]
    Capacity,
    /// `p_i = n_i / N`, weights ignored.
    Plain,
}

/// Capacity weights paired with their reference scalar.
#[derive(Debug, Clone, Copy)]
pub struct Weighting<'a> {
    pub weights: &'a [f64],
    pub reference: f64,
}

impl<'a> Weighting<'a> {
    pub fn new(weights: &'a [f64], reducer: WeightReducer) -> Self {
        Self {
            weights,
            reference: reducer.reduce(weights),
        }
    }
}

/// Entropy of `loads`, optionally capacity-weighted.
///
/// # Panics
///
/// If `weighting.weights` is not as long as `loads`.
pub fn entropy(loads: &[f64], weighting: Option<Weighting<'_>>, base: LogBase) -> f64 {
    if let Some(w) = weighting {
        assert_eq!(
            w.weights.len(),
            loads.len(),
            "one capacity weight per silo"
        );
    }

    let total: f64 = loads.iter().sum();
    if total == 0.0 {
        return 0.0;
    }

    let h: f64 = loads
        .iter()
        .enumerate()
        .map(|(i, &n)| {
            let share = n / total;
            match weighting {
                Some(w) => share * (w.weights[i] / w.reference),
                None => share,
            }
        })
        .filter(|&p| p > 0.0)
        .map(|p| p * base.log(p))
        .sum();

    -h
}

/// Maximum entropy for `silos` nodes, reached at perfect uniformity.
#[inline]
pub fn max_entropy(silos: usize, base: LogBase) -> f64 {
    base.log(silos as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn uniform_is_maximal() {
        for s in 1..=10 {
            let loads = vec![42.0; s];
            let h = entropy(&loads, None, LogBase::Natural);
            assert!((h - max_entropy(s, LogBase::Natural)).abs() < EPS);

            let h2 = entropy(&loads, None, LogBase::Binary);
            assert!((h2 - (s as f64).log2()).abs() < EPS);
        }
    }

    #[test]
    fn single_nonzero_is_zero() {
        assert_eq!(entropy(&[0.0, 0.0, 17.0, 0.0], None, LogBase::Natural), 0.0);
        assert_eq!(entropy(&[100.0], None, LogBase::Binary), 0.0);
    }

    #[test]
    fn all_zero_is_zero_not_nan() {
        let h = entropy(&[0.0, 0.0, 0.0], None, LogBase::Natural);
        assert_eq!(h, 0.0);
        let w = [1.0, 2.0, 3.0];
        let h = entropy(
            &[0.0, 0.0, 0.0],
            Some(Weighting::new(&w, WeightReducer::Harmonic)),
            LogBase::Natural,
        );
        assert_eq!(h, 0.0);
    }

    #[test]
    fn non_uniform_is_below_maximum() {
        let cases: [&[f64]; 4] = [
            &[1.0, 2.0],
            &[455.0, 456.0],
            &[700.0, 120.0, 340.0, 1200.0, 2500.0],
            &[10.0, 10.0, 10.0, 11.0],
        ];
        for loads in cases {
            let h = entropy(loads, None, LogBase::Natural);
            assert!(h < max_entropy(loads.len(), LogBase::Natural) - 1e-9);
        }
    }

    #[test]
    #[should_panic(expected = "one capacity weight per silo")]
    fn short_weights_rejected() {
        let w = [1.0, 2.0];
        entropy(
            &[1.0, 2.0, 3.0],
            Some(Weighting::new(&w, WeightReducer::Arithmetic)),
            LogBase::Natural,
        );
    }

    #[test]
    fn known_two_node_value() {
        // p = (0.75, 0.25) → H = 0.811278... bits
        let h = entropy(&[3.0, 1.0], None, LogBase::Binary);
        assert!((h - 0.811_278_124_459_132_9).abs() < 1e-12);
    }

    #[test]
    fn equal_weights_match_plain() {
        let loads = [700.0, 120.0, 340.0, 1200.0, 2500.0];
        let w = [1.0; 5];
        let plain = entropy(&loads, None, LogBase::Natural);
        for reducer in [WeightReducer::Harmonic, WeightReducer::Arithmetic] {
            let weighted = entropy(&loads, Some(Weighting::new(&w, reducer)), LogBase::Natural);
            assert!((plain - weighted).abs() < EPS);
        }
    }

    #[test]
    fn reducers_differ_on_skewed_weights() {
        let w = [1.0, 1.5, 2.0, 1.3, 2.2];
        let h = WeightReducer::Harmonic.reduce(&w);
        let a = WeightReducer::Arithmetic.reduce(&w);
        assert!((a - 1.6).abs() < EPS);
        assert!(h < a, "harmonic {} should be below arithmetic {}", h, a);

        // Equal weights collapse both to the common value.
        assert!((WeightReducer::Harmonic.reduce(&[2.0; 4]) - 2.0).abs() < EPS);
        assert!((WeightReducer::Arithmetic.reduce(&[2.0; 4]) - 2.0).abs() < EPS);
    }
}

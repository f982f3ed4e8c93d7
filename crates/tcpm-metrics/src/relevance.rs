//! Sigmoid relevance function φ(y) over a continuous target domain.

use std::fmt;
use std::str::FromStr;

use crate::error::MetricError;

/// Which tail of the target domain holds the rare, high-relevance values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Extreme {
    /// Values below the threshold are relevant.
    Low,
    /// Values above the threshold are relevant.
    High,
    /// Values outside a `(low, high)` threshold pair are relevant.
    Both,
}

impl Extreme {
    /// Return the lowercase name used in configuration and output.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
            Self::Both => "both",
        }
    }
}

impl fmt::Display for Extreme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Extreme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            "both" => Ok(Self::Both),
            other => Err(format!("unknown extreme {other:?} (expected low, high, or both)")),
        }
    }
}

/// Domain threshold(s) `c` at which relevance equals 0.5.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    /// A single threshold, used with [`Extreme::Low`] or [`Extreme::High`].
    Single(f64),
    /// A `(low, high)` pair, used with [`Extreme::Both`]. Requires `low <= high`.
    Pair {
        /// Threshold of the low tail.
        low: f64,
        /// Threshold of the high tail.
        high: f64,
    },
}

/// Compute the sigmoid steepness `s` for threshold `c`.
///
/// `s = sign * ln(1/delta - 1) / |c * decay|`, with `sign = -1` for the low
/// side and `+1` otherwise.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`MetricError::NonFiniteParameter`] | `c` or `decay` is NaN or infinite |
/// | [`MetricError::ZeroThreshold`] | `c == 0` |
/// | [`MetricError::ZeroDecay`] | `decay == 0` |
/// | [`MetricError::InvalidDelta`] | `delta` not in (0, 1) |
pub fn compute_steepness(c: f64, decay: f64, delta: f64, low: bool) -> Result<f64, MetricError> {
    if !c.is_finite() {
        return Err(MetricError::NonFiniteParameter { name: "threshold", value: c });
    }
    if !decay.is_finite() {
        return Err(MetricError::NonFiniteParameter { name: "decay", value: decay });
    }
    if c == 0.0 {
        return Err(MetricError::ZeroThreshold);
    }
    if decay == 0.0 {
        return Err(MetricError::ZeroDecay);
    }
    if !(delta > 0.0 && delta < 1.0) {
        return Err(MetricError::InvalidDelta { delta });
    }
    let sign = if low { -1.0 } else { 1.0 };
    Ok(sign * (1.0 / delta - 1.0).ln() / (c * decay).abs())
}

#[inline]
fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sigmoid {
    centre: f64,
    steepness: f64,
}

impl Sigmoid {
    #[inline]
    fn eval(self, y: f64) -> f64 {
        sigmoid(self.steepness * (y - self.centre))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    OneSided(Sigmoid),
    TwoSided {
        low: Sigmoid,
        high: Sigmoid,
        midpoint: f64,
    },
}

/// Relevance function φ mapping a target value to a relevance in [0, 1].
///
/// Immutable after construction; safe to share across threads.
///
/// - One-sided: `φ(y) = sigmoid(s * (y - c))`, decreasing for
///   [`Extreme::Low`] and increasing for [`Extreme::High`].
/// - Two-sided: values at or below the midpoint `(c_low + c_high) / 2` use
///   the low-side sigmoid, values above it use the high-side sigmoid, giving
///   a valley of low relevance between the two thresholds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RelevanceFunction {
    extreme: Extreme,
    threshold: Threshold,
    shape: Shape,
}

impl RelevanceFunction {
    /// Build a relevance function.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::ThresholdShapeMismatch`] | `Both` without a pair, or `Low`/`High` with a pair |
    /// | [`MetricError::InvertedThresholds`] | pair with `low > high` |
    /// | errors of [`compute_steepness`] | invalid `c`, `decay`, or `delta` |
    pub fn new(
        threshold: Threshold,
        extreme: Extreme,
        decay: f64,
        delta: f64,
    ) -> Result<Self, MetricError> {
        let shape = match (extreme, threshold) {
            (Extreme::Low | Extreme::High, Threshold::Single(c)) => {
                let low = extreme == Extreme::Low;
                Shape::OneSided(Sigmoid {
                    centre: c,
                    steepness: compute_steepness(c, decay, delta, low)?,
                })
            }
            (Extreme::Both, Threshold::Pair { low, high }) => {
                if low > high {
                    return Err(MetricError::InvertedThresholds { low, high });
                }
                Shape::TwoSided {
                    low: Sigmoid {
                        centre: low,
                        steepness: compute_steepness(low, decay, delta, true)?,
                    },
                    high: Sigmoid {
                        centre: high,
                        steepness: compute_steepness(high, decay, delta, false)?,
                    },
                    midpoint: (low + high) / 2.0,
                }
            }
            (Extreme::Both, Threshold::Single(_)) => {
                return Err(MetricError::ThresholdShapeMismatch {
                    extreme: "both",
                    expected: "a (low, high) pair",
                });
            }
            (Extreme::Low | Extreme::High, Threshold::Pair { .. }) => {
                return Err(MetricError::ThresholdShapeMismatch {
                    extreme: extreme.as_str(),
                    expected: "a single",
                });
            }
        };
        Ok(Self { extreme, threshold, shape })
    }

    /// Relevance of a single target value.
    #[must_use]
    pub fn phi(&self, y: f64) -> f64 {
        match self.shape {
            Shape::OneSided(s) => s.eval(y),
            Shape::TwoSided { low, high, midpoint } => {
                if y <= midpoint {
                    low.eval(y)
                } else {
                    high.eval(y)
                }
            }
        }
    }

    /// Relevance of every value in `ys`.
    #[must_use]
    pub fn phi_batch(&self, ys: &[f64]) -> Vec<f64> {
        ys.iter().map(|&y| self.phi(y)).collect()
    }

    /// Return the configured extreme side.
    #[must_use]
    pub fn extreme(&self) -> Extreme {
        self.extreme
    }

    /// Return the configured threshold(s).
    #[must_use]
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Return the sigmoid steepness: one value for a one-sided function,
    /// `(s_low, s_high)` for a two-sided one.
    #[must_use]
    pub fn steepness(&self) -> (f64, Option<f64>) {
        match self.shape {
            Shape::OneSided(s) => (s.steepness, None),
            Shape::TwoSided { low, high, .. } => (low.steepness, Some(high.steepness)),
        }
    }
}

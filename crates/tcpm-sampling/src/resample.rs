//! Bounded-retry oversampling with an inclusive target clamp.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{error, info, instrument, warn};

use crate::error::{OversampleError, SamplingError};
use crate::rows::LearningRows;

/// A source of synthetic extreme-valued training rows.
///
/// A failed call is retryable: [`ResampleConfig::run`] invokes it again with a
/// freshly seeded generator until it succeeds or the attempt ceiling is hit.
pub trait Oversampler {
    /// Produce an oversampled table from `rows`.
    ///
    /// # Errors
    ///
    /// Any [`OversampleError`]; the caller decides whether to retry.
    fn oversample(
        &self,
        rows: &LearningRows,
        rng: &mut ChaCha8Rng,
    ) -> Result<LearningRows, OversampleError>;
}

/// Inclusive `[lower, upper]` bounds on the target. Either side may be open.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TargetBounds {
    lower: Option<f64>,
    upper: Option<f64>,
}

impl TargetBounds {
    /// Create bounds.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidBounds`] if a bound is NaN or `lower > upper`.
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Result<Self, SamplingError> {
        let nan = lower.is_some_and(f64::is_nan) || upper.is_some_and(f64::is_nan);
        let inverted = matches!((lower, upper), (Some(lo), Some(hi)) if lo > hi);
        if nan || inverted {
            return Err(SamplingError::InvalidBounds { lower, upper });
        }
        Ok(Self { lower, upper })
    }

    /// Bounds that accept every value.
    #[must_use]
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Return true when `y` lies inside the bounds, endpoints included.
    #[must_use]
    pub fn contains(&self, y: f64) -> bool {
        self.lower.is_none_or(|lo| y >= lo) && self.upper.is_none_or(|hi| y <= hi)
    }

    /// Return true when neither side is bounded.
    #[must_use]
    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Lower bound, if any.
    #[must_use]
    pub fn lower(&self) -> Option<f64> {
        self.lower
    }

    /// Upper bound, if any.
    #[must_use]
    pub fn upper(&self) -> Option<f64> {
        self.upper
    }
}

/// Drop rows whose target falls outside `bounds` and re-key the survivors by position.
#[must_use]
pub fn clamp_rows(rows: &LearningRows, bounds: &TargetBounds) -> LearningRows {
    rows.retain_by_target(|y| bounds.contains(y)).into_positional()
}

/// Result of a successful [`ResampleConfig::run`].
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleOutcome {
    /// Clamped, positionally keyed rows.
    pub rows: LearningRows,
    /// Attempts used, counting the successful one.
    pub attempts: usize,
    /// Synthetic rows removed by the clamp.
    pub n_dropped: usize,
}

/// Configuration for bounded-retry resampling.
///
/// # Defaults
///
/// | Parameter      | Default   |
/// |----------------|-----------|
/// | `max_attempts` | 100       |
/// | `bounds`       | unbounded |
/// | `seed`         | 42        |
#[derive(Debug, Clone, PartialEq)]
pub struct ResampleConfig {
    max_attempts: usize,
    bounds: TargetBounds,
    seed: u64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        Self {
            max_attempts: 100,
            bounds: TargetBounds::unbounded(),
            seed: 42,
        }
    }
}

impl ResampleConfig {
    /// Create a config with an attempt ceiling.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::InvalidMaxAttempts`] if `max_attempts` is zero.
    pub fn new(max_attempts: usize) -> Result<Self, SamplingError> {
        if max_attempts == 0 {
            return Err(SamplingError::InvalidMaxAttempts { max_attempts });
        }
        Ok(Self {
            max_attempts,
            ..Self::default()
        })
    }

    /// Set the target clamp applied to successful output.
    #[must_use]
    pub fn with_bounds(mut self, bounds: TargetBounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Set the base seed. Attempt `i` (zero-based) uses `seed + i`.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the attempt ceiling.
    #[must_use]
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    /// Return the clamp bounds.
    #[must_use]
    pub fn bounds(&self) -> TargetBounds {
        self.bounds
    }

    /// Return the base seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Run `oversampler` on `rows` until it succeeds, then clamp the output.
    ///
    /// Attempts are sequential. Each gets its own generator so a retry sees a
    /// different random draw while the whole run stays reproducible.
    ///
    /// # Errors
    ///
    /// Returns [`SamplingError::ResampleExhausted`] with the last underlying
    /// message when every attempt fails. An attempt whose output is emptied
    /// by the clamp counts as failed.
    #[instrument(skip_all, fields(max_attempts = self.max_attempts, n_rows = rows.n_rows()))]
    pub fn run<O: Oversampler + ?Sized>(
        &self,
        oversampler: &O,
        rows: &LearningRows,
    ) -> Result<ResampleOutcome, SamplingError> {
        let mut last_error = String::new();
        for attempt in 1..=self.max_attempts {
            let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(attempt as u64 - 1));
            match oversampler.oversample(rows, &mut rng) {
                Ok(resampled) => {
                    let clamped = clamp_rows(&resampled, &self.bounds);
                    if clamped.n_rows() == 0 {
                        let e = OversampleError::EmptyAfterClamp {
                            n_resampled: resampled.n_rows(),
                        };
                        warn!(attempt, error = %e, "resampling attempt failed");
                        last_error = e.to_string();
                        continue;
                    }
                    let n_dropped = resampled.n_rows() - clamped.n_rows();
                    info!(
                        attempts = attempt,
                        n_resampled = resampled.n_rows(),
                        n_kept = clamped.n_rows(),
                        n_dropped,
                        "resampling succeeded"
                    );
                    return Ok(ResampleOutcome {
                        rows: clamped,
                        attempts: attempt,
                        n_dropped,
                    });
                }
                Err(e) => {
                    warn!(attempt, error = %e, "resampling attempt failed");
                    last_error = e.to_string();
                }
            }
        }
        error!(attempts = self.max_attempts, last_error = %last_error, "resampling exhausted");
        Err(SamplingError::ResampleExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }
}

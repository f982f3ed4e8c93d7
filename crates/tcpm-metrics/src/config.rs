//! Configuration builder for the precision/recall/F-score engine.

use crate::accuracy::{AccuracyIndicator, AlphaMode};
use crate::engine::PrecisionRecallFscore;
use crate::error::MetricError;
use crate::relevance::{Extreme, RelevanceFunction, Threshold};

/// Configuration for [`PrecisionRecallFscore`].
///
/// Construct via [`PrecisionRecallConfig::new`], chain `with_*` methods, then
/// call [`build`](PrecisionRecallConfig::build). All parameters are validated
/// at build time so that an invalid configuration never produces scores.
///
/// # Defaults
///
/// | Parameter      | Default |
/// |----------------|---------|
/// | `decay`        | 0.5     |
/// | `delta`        | 1e-4    |
/// | `k`            | 8.0     |
/// | `use_smoother` | true    |
/// | `beta`         | 0.5     |
#[derive(Debug, Clone, PartialEq)]
pub struct PrecisionRecallConfig {
    pub(crate) relevance_cutoff: f64,
    pub(crate) tolerance: f64,
    pub(crate) threshold: Threshold,
    pub(crate) extreme: Extreme,
    pub(crate) decay: f64,
    pub(crate) delta: f64,
    pub(crate) k: f64,
    pub(crate) use_smoother: bool,
    pub(crate) beta: f64,
}

impl PrecisionRecallConfig {
    /// Create a config from the required domain parameters.
    ///
    /// - `relevance_cutoff` is `tE`: predictions or truths with `φ >= tE`
    ///   enter the precision/recall sums.
    /// - `tolerance` is `tL`, the largest absolute error still counted as
    ///   accurate.
    /// - `threshold` and `extreme` shape the relevance function.
    #[must_use]
    pub fn new(relevance_cutoff: f64, tolerance: f64, threshold: Threshold, extreme: Extreme) -> Self {
        Self {
            relevance_cutoff,
            tolerance,
            threshold,
            extreme,
            decay: 0.5,
            delta: 1e-4,
            k: 8.0,
            use_smoother: true,
            beta: 0.5,
        }
    }

    /// Set the sigmoid decay.
    #[must_use]
    pub fn with_decay(mut self, decay: f64) -> Self {
        self.decay = decay;
        self
    }

    /// Set delta, the relevance reached at distance `|c * decay|` from the threshold.
    #[must_use]
    pub fn with_delta(mut self, delta: f64) -> Self {
        self.delta = delta;
        self
    }

    /// Set the smoothing sharpness `k` used by the smoothed accuracy indicator.
    #[must_use]
    pub fn with_smoothing(mut self, k: f64) -> Self {
        self.k = k;
        self
    }

    /// Choose between the smoothed (`true`) and hard (`false`) accuracy indicator.
    #[must_use]
    pub fn with_smoother(mut self, use_smoother: bool) -> Self {
        self.use_smoother = use_smoother;
        self
    }

    /// Set the F-score beta.
    #[must_use]
    pub fn with_beta(mut self, beta: f64) -> Self {
        self.beta = beta;
        self
    }

    /// Return the relevance cutoff `tE`.
    #[must_use]
    pub fn relevance_cutoff(&self) -> f64 {
        self.relevance_cutoff
    }

    /// Return the loss tolerance `tL`.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Return the threshold(s).
    #[must_use]
    pub fn threshold(&self) -> Threshold {
        self.threshold
    }

    /// Return the extreme side.
    #[must_use]
    pub fn extreme(&self) -> Extreme {
        self.extreme
    }

    /// Return the sigmoid decay.
    #[must_use]
    pub fn decay(&self) -> f64 {
        self.decay
    }

    /// Return delta.
    #[must_use]
    pub fn delta(&self) -> f64 {
        self.delta
    }

    /// Return the smoothing sharpness.
    #[must_use]
    pub fn smoothing(&self) -> f64 {
        self.k
    }

    /// Return whether the smoothed indicator is used.
    #[must_use]
    pub fn use_smoother(&self) -> bool {
        self.use_smoother
    }

    /// Return beta.
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }

    /// Validate the configuration and build the immutable engine.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::InvalidRelevanceCutoff`] | `tE` outside [0, 1] |
    /// | [`MetricError::InvalidBeta`] | `beta` outside [0, 1] |
    /// | [`MetricError::InvalidTolerance`] | `tL <= 0` or non-finite |
    /// | [`MetricError::InvalidSmoothing`] | `k < 0` or non-finite with the smoother enabled |
    /// | [`MetricError::ZeroThreshold`], [`MetricError::ZeroDecay`], [`MetricError::InvalidDelta`] | degenerate sigmoid |
    /// | [`MetricError::ThresholdShapeMismatch`], [`MetricError::InvertedThresholds`] | threshold shape inconsistent with `extreme` |
    pub fn build(&self) -> Result<PrecisionRecallFscore, MetricError> {
        if !(0.0..=1.0).contains(&self.relevance_cutoff) {
            return Err(MetricError::InvalidRelevanceCutoff {
                cutoff: self.relevance_cutoff,
            });
        }
        if !(0.0..=1.0).contains(&self.beta) {
            return Err(MetricError::InvalidBeta { beta: self.beta });
        }
        let mode = if self.use_smoother {
            AlphaMode::Smoothed { k: self.k }
        } else {
            AlphaMode::Hard
        };
        let accuracy = AccuracyIndicator::new(self.tolerance, mode)?;
        let relevance = RelevanceFunction::new(self.threshold, self.extreme, self.decay, self.delta)?;
        Ok(PrecisionRecallFscore::new(
            relevance,
            accuracy,
            self.relevance_cutoff,
            self.beta,
        ))
    }
}

//! Accuracy indicator α(y_true, y_pred) with hard and smoothed variants.

use crate::error::MetricError;

/// How a loss inside the tolerance band is credited.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaMode {
    /// `1` when `|y_true - y_pred| <= tL`, otherwise `0`.
    Hard,
    /// Hard indicator scaled by `1 - exp(-k * ((L - tL) / tL)^2)`.
    Smoothed {
        /// Smoothing sharpness, `k >= 0`.
        k: f64,
    },
}

/// Graded correctness of a prediction relative to a tolerance `tL`.
///
/// The smoothed variant is never larger than the hard one and drops to
/// exactly zero at `L == tL`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyIndicator {
    tolerance: f64,
    mode: AlphaMode,
}

impl AccuracyIndicator {
    /// Build an indicator with tolerance `tL`.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::InvalidTolerance`] | `tolerance` is not finite and strictly positive |
    /// | [`MetricError::InvalidSmoothing`] | smoothed mode with negative or non-finite `k` |
    pub fn new(tolerance: f64, mode: AlphaMode) -> Result<Self, MetricError> {
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(MetricError::InvalidTolerance { tolerance });
        }
        if let AlphaMode::Smoothed { k } = mode
            && !(k.is_finite() && k >= 0.0)
        {
            return Err(MetricError::InvalidSmoothing { k });
        }
        Ok(Self { tolerance, mode })
    }

    /// Absolute loss of a single prediction.
    #[inline]
    #[must_use]
    pub fn loss(y_true: f64, y_pred: f64) -> f64 {
        (y_true - y_pred).abs()
    }

    /// Hard indicator: `1.0` when the loss is within tolerance.
    #[inline]
    #[must_use]
    pub fn indicator(&self, y_true: f64, y_pred: f64) -> f64 {
        if Self::loss(y_true, y_pred) <= self.tolerance {
            1.0
        } else {
            0.0
        }
    }

    /// Accuracy of a single prediction under the configured mode.
    #[must_use]
    pub fn alpha(&self, y_true: f64, y_pred: f64) -> f64 {
        let hard = self.indicator(y_true, y_pred);
        match self.mode {
            AlphaMode::Hard => hard,
            AlphaMode::Smoothed { k } => {
                if hard == 0.0 {
                    return 0.0;
                }
                let scaled = (Self::loss(y_true, y_pred) - self.tolerance) / self.tolerance;
                hard * (1.0 - (-k * scaled * scaled).exp())
            }
        }
    }

    /// Element-wise accuracy over paired slices. Extra elements of the longer
    /// slice are ignored; callers validate lengths.
    #[must_use]
    pub fn alpha_batch(&self, y_true: &[f64], y_pred: &[f64]) -> Vec<f64> {
        y_true
            .iter()
            .zip(y_pred)
            .map(|(&t, &p)| self.alpha(t, p))
            .collect()
    }

    /// Return the tolerance `tL`.
    #[must_use]
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Return the alpha mode.
    #[must_use]
    pub fn mode(&self) -> AlphaMode {
        self.mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn smooth(k: f64) -> AccuracyIndicator {
        AccuracyIndicator::new(2.0, AlphaMode::Smoothed { k }).unwrap()
    }

    fn hard() -> AccuracyIndicator {
        AccuracyIndicator::new(2.0, AlphaMode::Hard).unwrap()
    }

    #[test]
    fn perfect_prediction_is_fully_accurate() {
        assert_eq!(hard().alpha(7.0, 7.0), 1.0);
        // With L = 0 the smoothing term is 1 - e^{-k}.
        let a = smooth(8.0).alpha(7.0, 7.0);
        assert!((a - (1.0 - (-8.0_f64).exp())).abs() < 1e-15);
        assert!(a > 0.999, "alpha = {a}");
    }

    #[test]
    fn boundary_loss_is_zero_when_smoothed() {
        assert_eq!(hard().alpha(10.0, 12.0), 1.0);
        assert_eq!(smooth(8.0).alpha(10.0, 12.0), 0.0);
    }

    #[test]
    fn outside_tolerance_is_zero() {
        assert_eq!(hard().alpha(10.0, 12.5), 0.0);
        assert_eq!(smooth(8.0).alpha(10.0, 7.5), 0.0);
    }

    #[test]
    fn smoothed_never_exceeds_hard() {
        let h = hard();
        let s = smooth(8.0);
        for i in 0..=40 {
            let pred = 10.0 + (i as f64 - 20.0) * 0.15;
            let (ah, as_) = (h.alpha(10.0, pred), s.alpha(10.0, pred));
            assert!(as_ <= ah, "pred {pred}: smooth {as_} > hard {ah}");
            assert!((0.0..=1.0).contains(&as_));
        }
    }

    #[test]
    fn smoothed_decreases_toward_boundary() {
        let s = smooth(8.0);
        let near = s.alpha(10.0, 10.2);
        let far = s.alpha(10.0, 11.8);
        assert!(near > far, "near {near} <= far {far}");
    }

    #[test]
    fn zero_sharpness_credits_nothing() {
        assert_eq!(smooth(0.0).alpha(3.0, 3.0), 0.0);
    }

    #[test]
    fn batch_matches_scalar() {
        let s = smooth(8.0);
        let t = [1.0, 2.0, 3.0];
        let p = [1.0, 3.0, 9.0];
        let batch = s.alpha_batch(&t, &p);
        for (i, a) in batch.iter().enumerate() {
            assert_eq!(*a, s.alpha(t[i], p[i]));
        }
    }

    #[test]
    fn invalid_tolerance_rejected() {
        for tol in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = AccuracyIndicator::new(tol, AlphaMode::Hard).unwrap_err();
            assert!(matches!(err, MetricError::InvalidTolerance { .. }), "tol {tol}");
        }
    }

    #[test]
    fn negative_sharpness_rejected() {
        let err = AccuracyIndicator::new(1.0, AlphaMode::Smoothed { k: -1.0 }).unwrap_err();
        assert!(matches!(err, MetricError::InvalidSmoothing { .. }));
    }
}

//! Conventional regression error metrics reported alongside precision/recall.

use crate::engine::validate_pair;
use crate::error::MetricError;

/// Point-error summary of a prediction batch.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegressionReport {
    /// Coefficient of determination. `NaN` when `y_true` is constant.
    pub r2: f64,
    /// Mean absolute error.
    pub mae: f64,
    /// Mean squared error.
    pub mse: f64,
    /// Mean relative error `|y_true - y_pred| / |y_true|` over samples with
    /// non-zero truth. `NaN` when every truth is zero.
    pub mre: f64,
    /// Number of scored samples.
    pub n_samples: usize,
}

impl RegressionReport {
    /// Compute the report for a prediction batch.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::LengthMismatch`] | arrays differ in length |
    /// | [`MetricError::EmptyInput`] | arrays are empty |
    /// | [`MetricError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn from_predictions(y_true: &[f64], y_pred: &[f64]) -> Result<Self, MetricError> {
        validate_pair(y_true, y_pred)?;
        let n = y_true.len() as f64;

        let mean_true = y_true.iter().sum::<f64>() / n;
        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut tot_sum = 0.0;
        let mut rel_sum = 0.0;
        let mut rel_count = 0usize;
        for (&t, &p) in y_true.iter().zip(y_pred) {
            let err = t - p;
            abs_sum += err.abs();
            sq_sum += err * err;
            tot_sum += (t - mean_true).powi(2);
            if t != 0.0 {
                rel_sum += err.abs() / t.abs();
                rel_count += 1;
            }
        }

        let r2 = if tot_sum == 0.0 {
            f64::NAN
        } else {
            1.0 - sq_sum / tot_sum
        };
        let mre = if rel_count == 0 {
            f64::NAN
        } else {
            rel_sum / rel_count as f64
        };

        Ok(Self {
            r2,
            mae: abs_sum / n,
            mse: sq_sum / n,
            mre,
            n_samples: y_true.len(),
        })
    }
}

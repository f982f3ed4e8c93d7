//! Precision, recall and F-beta score for regression (Torgo & Ribeiro, 2009).

use crate::accuracy::AccuracyIndicator;
use crate::error::MetricError;
use crate::relevance::RelevanceFunction;

/// Precision, recall and F-score of one prediction batch.
///
/// A `NaN` field means the metric is undefined for the batch (no value
/// cleared the relevance cutoff). Rank it as the worst outcome, never as zero.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct RegressionScores {
    /// Relevance-weighted accuracy over predictions with `φ(y_pred) >= tE`.
    pub precision: f64,
    /// Relevance-weighted accuracy over ground truths with `φ(y_true) >= tE`.
    pub recall: f64,
    /// F-beta combination of `precision` and `recall`.
    pub fscore: f64,
}

impl RegressionScores {
    /// Return true when all three metrics are defined.
    #[must_use]
    pub fn is_defined(&self) -> bool {
        !(self.precision.is_nan() || self.recall.is_nan() || self.fscore.is_nan())
    }
}

/// Validate a `(y_true, y_pred)` pair of arrays.
pub(crate) fn validate_pair(y_true: &[f64], y_pred: &[f64]) -> Result<(), MetricError> {
    if y_true.len() != y_pred.len() {
        return Err(MetricError::LengthMismatch {
            n_true: y_true.len(),
            n_pred: y_pred.len(),
        });
    }
    if y_true.is_empty() {
        return Err(MetricError::EmptyInput);
    }
    if let Some(index) = y_true.iter().position(|v| !v.is_finite()) {
        return Err(MetricError::NonFiniteValue { array: "y_true", index });
    }
    if let Some(index) = y_pred.iter().position(|v| !v.is_finite()) {
        return Err(MetricError::NonFiniteValue { array: "y_pred", index });
    }
    Ok(())
}

/// F-beta combination. Undefined inputs give `NaN`; two zero inputs give `0`.
#[must_use]
pub fn f_beta(precision: f64, recall: f64, beta: f64) -> f64 {
    if precision.is_nan() || recall.is_nan() {
        return f64::NAN;
    }
    let beta_sq = beta * beta;
    let denominator = beta_sq * precision + recall;
    if denominator == 0.0 {
        return 0.0;
    }
    (beta_sq + 1.0) * precision * recall / denominator
}

/// Immutable precision/recall/F-score scorer for imbalanced regression.
///
/// Built from a [`PrecisionRecallConfig`](crate::PrecisionRecallConfig). Every
/// method is a pure function of its inputs, so one instance can be shared by
/// reference across threads scoring different cross-validation folds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrecisionRecallFscore {
    relevance: RelevanceFunction,
    accuracy: AccuracyIndicator,
    relevance_cutoff: f64,
    beta: f64,
}

impl PrecisionRecallFscore {
    pub(crate) fn new(
        relevance: RelevanceFunction,
        accuracy: AccuracyIndicator,
        relevance_cutoff: f64,
        beta: f64,
    ) -> Self {
        Self {
            relevance,
            accuracy,
            relevance_cutoff,
            beta,
        }
    }

    /// Sum `alpha * φ` and `φ` over the samples whose reference value clears
    /// the cutoff, and return their ratio.
    fn weighted_accuracy(&self, y_true: &[f64], y_pred: &[f64], reference: &[f64]) -> f64 {
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        for ((&t, &p), &r) in y_true.iter().zip(y_pred).zip(reference) {
            let phi = self.relevance.phi(r);
            if phi >= self.relevance_cutoff {
                numerator += self.accuracy.alpha(t, p) * phi;
                denominator += phi;
            }
        }
        if denominator == 0.0 {
            return f64::NAN;
        }
        numerator / denominator
    }

    /// Precision for regression. `NaN` when no prediction is relevant.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`MetricError::LengthMismatch`] | arrays differ in length |
    /// | [`MetricError::EmptyInput`] | arrays are empty |
    /// | [`MetricError::NonFiniteValue`] | any value is NaN or infinite |
    pub fn precision(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64, MetricError> {
        validate_pair(y_true, y_pred)?;
        Ok(self.weighted_accuracy(y_true, y_pred, y_pred))
    }

    /// Recall for regression. `NaN` when no ground truth is relevant.
    ///
    /// # Errors
    ///
    /// Same as [`precision`](Self::precision).
    pub fn recall(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64, MetricError> {
        validate_pair(y_true, y_pred)?;
        Ok(self.weighted_accuracy(y_true, y_pred, y_true))
    }

    /// F-beta score from independently computed precision and recall.
    ///
    /// # Errors
    ///
    /// Same as [`precision`](Self::precision).
    pub fn fscore(&self, y_true: &[f64], y_pred: &[f64]) -> Result<f64, MetricError> {
        Ok(self.evaluate(y_true, y_pred)?.fscore)
    }

    /// Compute precision, recall and F-score in one pass over validation.
    ///
    /// # Errors
    ///
    /// Same as [`precision`](Self::precision).
    pub fn evaluate(&self, y_true: &[f64], y_pred: &[f64]) -> Result<RegressionScores, MetricError> {
        validate_pair(y_true, y_pred)?;
        let precision = self.weighted_accuracy(y_true, y_pred, y_pred);
        // Recall weights by the truth's relevance, never the prediction's.
        let recall = self.weighted_accuracy(y_true, y_pred, y_true);
        Ok(RegressionScores {
            precision,
            recall,
            fscore: f_beta(precision, recall, self.beta),
        })
    }

    /// Return the relevance function.
    #[must_use]
    pub fn relevance(&self) -> &RelevanceFunction {
        &self.relevance
    }

    /// Return the accuracy indicator.
    #[must_use]
    pub fn accuracy(&self) -> &AccuracyIndicator {
        &self.accuracy
    }

    /// Return the relevance cutoff `tE`.
    #[must_use]
    pub fn relevance_cutoff(&self) -> f64 {
        self.relevance_cutoff
    }

    /// Return beta.
    #[must_use]
    pub fn beta(&self) -> f64 {
        self.beta
    }
}

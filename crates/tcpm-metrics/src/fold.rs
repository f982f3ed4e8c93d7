//! Parallel scoring of cross-validation folds with a shared engine.

use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::engine::{PrecisionRecallFscore, RegressionScores};
use crate::error::MetricError;

/// Held-out truths and predictions of one cross-validation fold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoldPredictions {
    /// Ground-truth targets.
    pub y_true: Vec<f64>,
    /// Model predictions, parallel to `y_true`.
    pub y_pred: Vec<f64>,
}

/// Aggregate of per-fold scores.
///
/// Means are taken over the folds where the metric is defined; undefined
/// folds are counted, not averaged in as zero.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct FoldSummary {
    /// Scores for each fold, in input order.
    pub folds: Vec<RegressionScores>,
    /// Mean precision over folds with defined precision.
    pub mean_precision: f64,
    /// Mean recall over folds with defined recall.
    pub mean_recall: f64,
    /// Mean F-score over folds with defined F-score.
    pub mean_fscore: f64,
    /// Population standard deviation of the defined F-scores.
    pub std_fscore: f64,
    /// Number of folds whose F-score is undefined.
    pub n_undefined: usize,
}

fn nan_mean(values: impl Iterator<Item = f64>) -> (f64, usize) {
    let (sum, count) = values
        .filter(|v| !v.is_nan())
        .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
    if count == 0 {
        (f64::NAN, 0)
    } else {
        (sum / count as f64, count)
    }
}

impl FoldSummary {
    /// Summarise already computed fold scores.
    #[must_use]
    pub fn from_scores(folds: Vec<RegressionScores>) -> Self {
        let (mean_precision, _) = nan_mean(folds.iter().map(|s| s.precision));
        let (mean_recall, _) = nan_mean(folds.iter().map(|s| s.recall));
        let (mean_fscore, n_defined) = nan_mean(folds.iter().map(|s| s.fscore));
        let std_fscore = if n_defined == 0 {
            f64::NAN
        } else {
            let variance = folds
                .iter()
                .map(|s| s.fscore)
                .filter(|v| !v.is_nan())
                .map(|v| (v - mean_fscore).powi(2))
                .sum::<f64>()
                / n_defined as f64;
            variance.sqrt()
        };
        let n_undefined = folds.len() - n_defined;
        Self {
            folds,
            mean_precision,
            mean_recall,
            mean_fscore,
            std_fscore,
            n_undefined,
        }
    }
}

/// Score every fold in parallel and summarise.
///
/// # Errors
///
/// Returns the first [`MetricError`] raised by a fold with invalid input.
#[instrument(skip_all, fields(n_folds = folds.len()))]
pub fn score_folds(
    engine: &PrecisionRecallFscore,
    folds: &[FoldPredictions],
) -> Result<FoldSummary, MetricError> {
    let scores = folds
        .par_iter()
        .enumerate()
        .map(|(fold, f)| -> Result<RegressionScores, MetricError> {
            let s = engine.evaluate(&f.y_true, &f.y_pred)?;
            debug!(fold, precision = s.precision, recall = s.recall, fscore = s.fscore, "fold scored");
            Ok(s)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let summary = FoldSummary::from_scores(scores);
    info!(
        mean_fscore = summary.mean_fscore,
        n_undefined = summary.n_undefined,
        "fold scoring complete"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PrecisionRecallConfig;
    use crate::relevance::{Extreme, Threshold};

    fn engine() -> PrecisionRecallFscore {
        PrecisionRecallConfig::new(0.5, 5.0, Threshold::Single(30.0), Extreme::High)
            .with_smoother(false)
            .build()
            .unwrap()
    }

    fn fold(y_true: &[f64], y_pred: &[f64]) -> FoldPredictions {
        FoldPredictions {
            y_true: y_true.to_vec(),
            y_pred: y_pred.to_vec(),
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let e = engine();
        let folds = vec![
            fold(&[60.0, 10.0, 45.0], &[58.0, 12.0, 20.0]),
            fold(&[70.0, 35.0, 5.0], &[71.0, 50.0, 6.0]),
            fold(&[90.0, 80.0], &[88.0, 40.0]),
        ];
        let summary = score_folds(&e, &folds).unwrap();
        for (f, s) in folds.iter().zip(&summary.folds) {
            assert_eq!(*s, e.evaluate(&f.y_true, &f.y_pred).unwrap());
        }
        assert_eq!(summary.n_undefined, 0);
    }

    #[test]
    fn undefined_folds_are_counted_not_zeroed() {
        let e = engine();
        let folds = vec![
            fold(&[60.0, 40.0], &[60.0, 40.0]),
            // No prediction is relevant: precision and F-score undefined.
            fold(&[60.0, 10.0], &[10.0, 12.0]),
        ];
        let summary = score_folds(&e, &folds).unwrap();
        assert_eq!(summary.n_undefined, 1);
        assert_eq!(summary.mean_fscore, 1.0);
        assert_eq!(summary.std_fscore, 0.0);
        assert!(summary.folds[1].fscore.is_nan());
    }

    #[test]
    fn all_undefined_gives_nan_summary() {
        let summary = FoldSummary::from_scores(vec![RegressionScores {
            precision: f64::NAN,
            recall: f64::NAN,
            fscore: f64::NAN,
        }]);
        assert!(summary.mean_fscore.is_nan());
        assert!(summary.std_fscore.is_nan());
        assert_eq!(summary.n_undefined, 1);
    }

    #[test]
    fn invalid_fold_propagates_error() {
        let folds = vec![fold(&[1.0], &[1.0]), fold(&[1.0, 2.0], &[1.0])];
        let err = score_folds(&engine(), &folds).unwrap_err();
        assert!(matches!(err, MetricError::LengthMismatch { .. }));
    }
}

//! Feature scaling: per-column standardization and per-row L2 normalization.

use crate::error::SamplingError;
use crate::rows::LearningRows;

/// Per-column standardizer fitted on a training partition.
///
/// Uses population standard deviation (divides by n, not n-1). Columns with
/// zero variance are centred but not rescaled.
#[derive(Debug, Clone, PartialEq)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    /// Learn column means and standard deviations.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SamplingError::EmptyDataset`] | `rows` has zero rows |
    pub fn fit(rows: &LearningRows) -> Result<Self, SamplingError> {
        let n_rows = rows.n_rows();
        if n_rows == 0 {
            return Err(SamplingError::EmptyDataset);
        }
        let n = n_rows as f64;
        let n_features = rows.n_features();

        let mut mean = vec![0.0; n_features];
        for row in rows.features() {
            for (m, &x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = vec![0.0; n_features];
        for row in rows.features() {
            for ((s, &x), &m) in scale.iter_mut().zip(row).zip(&mean) {
                *s += (x - m).powi(2);
            }
        }
        for s in &mut scale {
            let std = (*s / n).sqrt();
            *s = if std == 0.0 { 1.0 } else { std };
        }

        Ok(Self { mean, scale })
    }

    /// Apply `(x - mean) / scale` column-wise, keeping keys and targets.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SamplingError::FeatureCountMismatch`] | `rows` has a different width than the fitted data |
    pub fn transform(&self, rows: &LearningRows) -> Result<LearningRows, SamplingError> {
        if rows.n_features() != self.mean.len() {
            return Err(SamplingError::FeatureCountMismatch {
                row: 0,
                expected: self.mean.len(),
                got: rows.n_features(),
            });
        }
        let features = rows
            .features()
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&self.mean)
                    .zip(&self.scale)
                    .map(|((&x, &m), &s)| (x - m) / s)
                    .collect()
            })
            .collect();
        LearningRows::new(rows.keys().to_vec(), features, rows.target().to_vec())
    }

    /// Fitted column means.
    #[must_use]
    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    /// Fitted column scales (1.0 for constant columns).
    #[must_use]
    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

/// Rescale every row to unit L2 norm. All-zero rows are left unchanged.
///
/// # Errors
///
/// Returns [`SamplingError::EmptyDataset`] for a table with zero rows.
pub fn normalize_rows(rows: &LearningRows) -> Result<LearningRows, SamplingError> {
    let features = rows
        .features()
        .iter()
        .map(|row| {
            let norm = row.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm == 0.0 {
                row.clone()
            } else {
                row.iter().map(|x| x / norm).collect()
            }
        })
        .collect();
    LearningRows::new(rows.keys().to_vec(), features, rows.target().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn train() -> LearningRows {
        LearningRows::positional(
            vec![vec![1.0, 5.0], vec![2.0, 5.0], vec![3.0, 5.0]],
            vec![0.0, 1.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn fit_uses_population_std() {
        let scaler = StandardScaler::fit(&train()).unwrap();
        assert_eq!(scaler.mean(), &[2.0, 5.0]);
        let expected = (2.0_f64 / 3.0).sqrt();
        assert!((scaler.scale()[0] - expected).abs() < 1e-12);
    }

    #[test]
    fn constant_column_is_centred_only() {
        let scaler = StandardScaler::fit(&train()).unwrap();
        assert_eq!(scaler.scale()[1], 1.0);
        let out = scaler.transform(&train()).unwrap();
        assert!(out.features().iter().all(|row| row[1] == 0.0));
    }

    #[test]
    fn transform_applies_training_statistics() {
        let scaler = StandardScaler::fit(&train()).unwrap();
        let test = LearningRows::positional(vec![vec![2.0, 7.0]], vec![9.0]).unwrap();
        let out = scaler.transform(&test).unwrap();
        assert_eq!(out.features()[0], vec![0.0, 2.0]);
        assert_eq!(out.target(), &[9.0]);
    }

    #[test]
    fn width_mismatch_rejected() {
        let scaler = StandardScaler::fit(&train()).unwrap();
        let narrow = LearningRows::positional(vec![vec![1.0]], vec![1.0]).unwrap();
        assert!(matches!(
            scaler.transform(&narrow),
            Err(SamplingError::FeatureCountMismatch { expected: 2, got: 1, .. })
        ));
    }

    #[test]
    fn rows_get_unit_norm() {
        let rows = LearningRows::positional(vec![vec![3.0, 4.0], vec![0.0, 0.0]], vec![1.0, 2.0]).unwrap();
        let out = normalize_rows(&rows).unwrap();
        assert_eq!(out.features()[0], vec![0.6, 0.8]);
        assert_eq!(out.features()[1], vec![0.0, 0.0]);
    }
}

//! In-memory learning rows: feature vectors plus a continuous target.

use crate::error::SamplingError;

/// Feature rows with a real-valued target, keyed per row.
///
/// This is the in-memory form of the persisted `x0..xN, y` record table.
/// Original rows are keyed by entity id; resampled rows by position.
#[derive(Debug, Clone, PartialEq)]
pub struct LearningRows {
    keys: Vec<String>,
    features: Vec<Vec<f64>>,
    target: Vec<f64>,
    n_features: usize,
}

impl LearningRows {
    /// Build validated rows from parallel keys, features, and targets.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SamplingError::LengthMismatch`] | keys, features, and target differ in length |
    /// | [`SamplingError::EmptyDataset`] | zero rows |
    /// | [`SamplingError::FeatureCountMismatch`] | rows have inconsistent widths |
    /// | [`SamplingError::NonFiniteFeature`] | a feature is NaN or infinite |
    /// | [`SamplingError::NonFiniteTarget`] | a target is NaN or infinite |
    pub fn new(
        keys: Vec<String>,
        features: Vec<Vec<f64>>,
        target: Vec<f64>,
    ) -> Result<Self, SamplingError> {
        if keys.len() != target.len() || features.len() != target.len() {
            return Err(SamplingError::LengthMismatch {
                n_ids: keys.len(),
                n_values: target.len().min(features.len()),
            });
        }
        if features.is_empty() {
            return Err(SamplingError::EmptyDataset);
        }
        let n_features = features[0].len();
        for (row, values) in features.iter().enumerate() {
            if values.len() != n_features {
                return Err(SamplingError::FeatureCountMismatch {
                    row,
                    expected: n_features,
                    got: values.len(),
                });
            }
            if let Some(column) = values.iter().position(|v| !v.is_finite()) {
                return Err(SamplingError::NonFiniteFeature { row, column });
            }
        }
        if let Some(index) = target.iter().position(|v| !v.is_finite()) {
            return Err(SamplingError::NonFiniteTarget { index });
        }
        Ok(Self {
            keys,
            features,
            target,
            n_features,
        })
    }

    /// Build rows keyed by position (`"0"`, `"1"`, …).
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn positional(features: Vec<Vec<f64>>, target: Vec<f64>) -> Result<Self, SamplingError> {
        let keys = (0..target.len()).map(|i| i.to_string()).collect();
        Self::new(keys, features, target)
    }

    /// Row keys.
    #[must_use]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    /// Feature matrix, row-major.
    #[must_use]
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    /// Target column.
    #[must_use]
    pub fn target(&self) -> &[f64] {
        &self.target
    }

    /// Number of rows.
    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    /// Number of feature columns.
    #[must_use]
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Keep only the rows whose target satisfies `keep`, preserving order and keys.
    ///
    /// May return an empty table.
    #[must_use]
    pub fn retain_by_target(&self, keep: impl Fn(f64) -> bool) -> Self {
        let mut out = Self {
            keys: Vec::new(),
            features: Vec::new(),
            target: Vec::new(),
            n_features: self.n_features,
        };
        for i in 0..self.n_rows() {
            if keep(self.target[i]) {
                out.keys.push(self.keys[i].clone());
                out.features.push(self.features[i].clone());
                out.target.push(self.target[i]);
            }
        }
        out
    }

    /// Gather the rows at `indices`, in the given order. Out-of-range indices are skipped.
    #[must_use]
    pub fn select(&self, indices: &[usize]) -> Self {
        let mut out = Self {
            keys: Vec::with_capacity(indices.len()),
            features: Vec::with_capacity(indices.len()),
            target: Vec::with_capacity(indices.len()),
            n_features: self.n_features,
        };
        for &i in indices.iter().filter(|&&i| i < self.n_rows()) {
            out.keys.push(self.keys[i].clone());
            out.features.push(self.features[i].clone());
            out.target.push(self.target[i]);
        }
        out
    }

    /// Replace the keys with positional ones.
    #[must_use]
    pub fn into_positional(mut self) -> Self {
        self.keys = (0..self.target.len()).map(|i| i.to_string()).collect();
        self
    }
}

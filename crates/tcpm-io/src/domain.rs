//! Domain types for tcpm-io.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tcpm_metrics::{Extreme, FoldPredictions, PrecisionRecallConfig, Threshold};
use tcpm_sampling::{EntityId, LearningRows, RareSide, SamplingError, TargetSeries};

use crate::IoError;

/// A validated experiment name for output file naming.
///
/// Must match `[a-zA-Z0-9_-]+`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentName(String);

impl ExperimentName {
    /// Parse and validate an experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::InvalidExperimentName`] if the name is empty or
    /// contains characters outside `[a-zA-Z0-9_-]`.
    pub fn new(name: impl Into<String>) -> Result<Self, IoError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(IoError::InvalidExperimentName { name });
        }
        Ok(Self(name))
    }

    /// Return the experiment name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExperimentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-target defaults for the three challenge outcomes studied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetPreset {
    /// Average submission score; low scores are rare.
    AvgScore,
    /// Registrant count; large counts are rare.
    NumberOfRegistration,
    /// Submissions per registrant; high ratios are rare.
    SubRegRatio,
}

impl TargetPreset {
    /// Every preset, in CLI listing order.
    pub const ALL: [Self; 3] = [Self::AvgScore, Self::NumberOfRegistration, Self::SubRegRatio];

    /// CLI name of the preset.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::AvgScore => "avg-score",
            Self::NumberOfRegistration => "number-of-registration",
            Self::SubRegRatio => "sub-reg-ratio",
        }
    }

    /// Domain threshold separating rare from typical values.
    #[must_use]
    pub fn threshold(self) -> f64 {
        match self {
            Self::AvgScore => 90.0,
            Self::NumberOfRegistration => 30.0,
            Self::SubRegRatio => 0.25,
        }
    }

    /// Side of the threshold holding the rare values.
    #[must_use]
    pub fn rare_side(self) -> RareSide {
        match self {
            Self::AvgScore => RareSide::Low,
            Self::NumberOfRegistration | Self::SubRegRatio => RareSide::High,
        }
    }

    /// Extreme side for the relevance function.
    #[must_use]
    pub fn extreme(self) -> Extreme {
        self.rare_side().into()
    }

    /// Inclusive clamp applied to resampled targets.
    #[must_use]
    pub fn clamp(self) -> (Option<f64>, Option<f64>) {
        match self {
            Self::AvgScore => (Some(0.0), Some(100.0)),
            Self::NumberOfRegistration => (Some(0.0), None),
            Self::SubRegRatio => (Some(0.0), Some(1.0)),
        }
    }

    /// Loss tolerance `tL`.
    #[must_use]
    pub fn tolerance(self) -> f64 {
        match self {
            Self::AvgScore | Self::NumberOfRegistration => 5.0,
            Self::SubRegRatio => 0.05,
        }
    }

    /// Relevance cutoff `tE`.
    #[must_use]
    pub fn relevance_cutoff(self) -> f64 {
        0.5
    }

    /// Metric configuration with this preset's fields and library defaults elsewhere.
    #[must_use]
    pub fn metric_config(self) -> PrecisionRecallConfig {
        PrecisionRecallConfig::new(
            self.relevance_cutoff(),
            self.tolerance(),
            Threshold::Single(self.threshold()),
            self.extreme(),
        )
    }
}

impl fmt::Display for TargetPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TargetPreset {
    type Err = IoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name() == s)
            .ok_or_else(|| IoError::UnknownPreset { name: s.to_string() })
    }
}

/// A learning table read from CSV: entity-keyed feature rows plus a named target.
///
/// Produced by [`LearningTableReader`](crate::LearningTableReader).
#[derive(Debug, Clone)]
pub struct LearningTable {
    feature_names: Vec<String>,
    target_name: String,
    rows: LearningRows,
}

impl LearningTable {
    pub(crate) fn new(feature_names: Vec<String>, target_name: String, rows: LearningRows) -> Self {
        Self {
            feature_names,
            target_name,
            rows,
        }
    }

    /// Feature column names in file order.
    #[must_use]
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// Name of the target column.
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_name
    }

    /// Rows keyed by entity id.
    #[must_use]
    pub fn rows(&self) -> &LearningRows {
        &self.rows
    }

    /// Number of entities.
    #[must_use]
    pub fn n_samples(&self) -> usize {
        self.rows.n_rows()
    }

    /// The target column as a validated series.
    ///
    /// # Errors
    ///
    /// Propagates [`SamplingError`] from id or series validation.
    pub fn target_series(&self) -> Result<TargetSeries, SamplingError> {
        let ids = self
            .rows
            .keys()
            .iter()
            .map(|k| EntityId::new(k.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        TargetSeries::new(ids, self.rows.target().to_vec())
    }
}

/// Paired ground truth and predictions read from CSV, with optional fold labels.
///
/// Produced by [`PredictionReader`](crate::PredictionReader).
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionSet {
    /// Entity ids in file order.
    pub entity_ids: Vec<String>,
    /// Ground-truth targets.
    pub y_true: Vec<f64>,
    /// Model predictions.
    pub y_pred: Vec<f64>,
    /// Fold label per row, when the file has a `fold` column.
    pub folds: Option<Vec<String>>,
}

impl PredictionSet {
    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.y_true.len()
    }

    /// Return true when there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.y_true.is_empty()
    }

    /// Group rows by fold label, sorted by label. `None` without a fold column.
    #[must_use]
    pub fn by_fold(&self) -> Option<Vec<(String, FoldPredictions)>> {
        let folds = self.folds.as_ref()?;
        let mut grouped: BTreeMap<&str, FoldPredictions> = BTreeMap::new();
        for ((label, &t), &p) in folds.iter().zip(&self.y_true).zip(&self.y_pred) {
            let fold = grouped.entry(label.as_str()).or_default();
            fold.y_true.push(t);
            fold.y_pred.push(p);
        }
        Some(
            grouped
                .into_iter()
                .map(|(label, fold)| (label.to_string(), fold))
                .collect(),
        )
    }
}

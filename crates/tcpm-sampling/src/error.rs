/// Broad classification of a [`SamplingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingErrorKind {
    /// Invalid splitter, scaler, or resampler parameters.
    Configuration,
    /// Malformed target series or feature rows.
    InvalidInput,
    /// A stratification side is empty or too small for the requested split.
    DataSufficiency,
    /// The oversampler failed on every allowed attempt.
    ResampleExhausted,
}

/// Errors from target validation, splitting, scaling, and resampling.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SamplingError {
    /// Returned when a target series or row table has zero entries.
    #[error("dataset has zero rows")]
    EmptyDataset,

    /// Returned when ids and values have different lengths.
    #[error("{n_ids} entity ids but {n_values} target values")]
    LengthMismatch {
        /// Number of entity ids.
        n_ids: usize,
        /// Number of target values.
        n_values: usize,
    },

    /// Returned when an entity id is the empty string.
    #[error("entity id at position {index} is empty")]
    EmptyEntityId {
        /// Zero-based position of the empty id.
        index: usize,
    },

    /// Returned when the same entity id appears twice.
    #[error("duplicate entity id \"{id}\": first at {first}, again at {second}")]
    DuplicateEntityId {
        /// The duplicated id.
        id: String,
        /// Zero-based position of the first occurrence.
        first: usize,
        /// Zero-based position of the second occurrence.
        second: usize,
    },

    /// Returned when a target value is NaN or infinite.
    #[error("non-finite target value at row {index}")]
    NonFiniteTarget {
        /// Zero-based row index.
        index: usize,
    },

    /// Returned when a feature value is NaN or infinite.
    #[error("non-finite feature value at row {row}, column {column}")]
    NonFiniteFeature {
        /// Zero-based row index.
        row: usize,
        /// Zero-based feature column.
        column: usize,
    },

    /// Returned when a row has a different number of features than expected.
    #[error("row {row} has {got} features, expected {expected}")]
    FeatureCountMismatch {
        /// Zero-based row index.
        row: usize,
        /// Expected number of features.
        expected: usize,
        /// Actual number of features.
        got: usize,
    },

    /// Returned when the split threshold is NaN or infinite.
    #[error("split threshold must be finite, got {threshold}")]
    NonFiniteThreshold {
        /// The invalid threshold.
        threshold: f64,
    },

    /// Returned when the test size is zero or leaves no training rows.
    #[error("test size {test_size} must be in [1, {n_samples})")]
    InvalidTestSize {
        /// The requested test size.
        test_size: usize,
        /// Number of entities in the series.
        n_samples: usize,
    },

    /// Returned when one side of the threshold has no members.
    #[error("{side} side of threshold {threshold} has no members")]
    EmptySide {
        /// `"minority"` or `"majority"`.
        side: &'static str,
        /// The split threshold.
        threshold: f64,
    },

    /// Returned when a side has fewer members than its test quota.
    #[error("{side} side needs {requested} test members but has only {available}")]
    InsufficientSide {
        /// `"minority"` or `"majority"`.
        side: &'static str,
        /// Members the split wanted to sample.
        requested: usize,
        /// Members available on that side.
        available: usize,
    },

    /// Returned when a retry policy allows zero attempts.
    #[error("max_attempts must be at least 1, got {max_attempts}")]
    InvalidMaxAttempts {
        /// The invalid attempt ceiling.
        max_attempts: usize,
    },

    /// Returned when clamp bounds are NaN or inverted.
    #[error("invalid target bounds [{lower:?}, {upper:?}]")]
    InvalidBounds {
        /// Lower bound, if any.
        lower: Option<f64>,
        /// Upper bound, if any.
        upper: Option<f64>,
    },

    /// Returned when the oversampler neighbour count is zero.
    #[error("k_neighbors must be at least 1, got {k}")]
    InvalidNeighbors {
        /// The invalid neighbour count.
        k: usize,
    },

    /// Returned when the rare-row relevance cutoff is outside [0, 1].
    #[error("rare cutoff must be in [0, 1], got {cutoff}")]
    InvalidRareCutoff {
        /// The invalid cutoff.
        cutoff: f64,
    },

    /// Returned when the oversampler failed on every allowed attempt.
    #[error("resampling failed after {attempts} attempts: {last_error}")]
    ResampleExhausted {
        /// Number of attempts made.
        attempts: usize,
        /// Message of the last oversampler error.
        last_error: String,
    },
}

impl SamplingError {
    /// Classify this error.
    #[must_use]
    pub fn kind(&self) -> SamplingErrorKind {
        match self {
            Self::NonFiniteThreshold { .. }
            | Self::InvalidTestSize { .. }
            | Self::InvalidMaxAttempts { .. }
            | Self::InvalidBounds { .. }
            | Self::InvalidNeighbors { .. }
            | Self::InvalidRareCutoff { .. } => SamplingErrorKind::Configuration,
            Self::EmptySide { .. } | Self::InsufficientSide { .. } => {
                SamplingErrorKind::DataSufficiency
            }
            Self::ResampleExhausted { .. } => SamplingErrorKind::ResampleExhausted,
            _ => SamplingErrorKind::InvalidInput,
        }
    }
}

/// Retryable failure of a single oversampling attempt.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum OversampleError {
    /// Returned when fewer than two rows are rare, leaving no neighbour to interpolate with.
    #[error("need at least 2 rare rows to synthesize, found {n_rare}")]
    TooFewRare {
        /// Number of rare rows found.
        n_rare: usize,
    },

    /// Returned when every row is rare, so there is nothing to undersample.
    #[error("no common rows: every target is rare")]
    NoCommonRows,

    /// Returned when a synthetic row contains a NaN or infinite value.
    #[error("synthetic row {row} has a non-finite value")]
    NonFiniteSynthetic {
        /// Zero-based index of the synthetic row.
        row: usize,
    },

    /// Returned when the target clamp removes every resampled row.
    #[error("clamp removed all {n_resampled} resampled rows")]
    EmptyAfterClamp {
        /// Rows produced before clamping.
        n_resampled: usize,
    },

    /// Returned by external oversamplers that reject the input for their own reasons.
    #[error("oversampler rejected input: {0}")]
    Rejected(String),
}

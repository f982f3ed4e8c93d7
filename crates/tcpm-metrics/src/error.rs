/// Broad classification of a [`MetricError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricErrorKind {
    /// Invalid relevance or accuracy parameters, raised at construction.
    Configuration,
    /// Invalid arrays passed to a scoring call.
    InvalidInput,
}

/// Errors from relevance, accuracy and precision/recall computation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricError {
    /// Returned when a relevance threshold `c` is zero.
    #[error("relevance threshold must be non-zero")]
    ZeroThreshold,

    /// Returned when the sigmoid decay is zero.
    #[error("decay must be non-zero")]
    ZeroDecay,

    /// Returned when a relevance parameter is NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NonFiniteParameter {
        /// Name of the offending parameter.
        name: &'static str,
        /// The value provided.
        value: f64,
    },

    /// Returned when delta is not in the open interval (0, 1).
    #[error("delta must be in (0, 1), got {delta}")]
    InvalidDelta {
        /// The invalid delta value provided.
        delta: f64,
    },

    /// Returned when a two-sided threshold pair is inverted.
    #[error("lower threshold {low} exceeds upper threshold {high}")]
    InvertedThresholds {
        /// The lower threshold provided.
        low: f64,
        /// The upper threshold provided.
        high: f64,
    },

    /// Returned when the threshold shape does not match the extreme side.
    #[error("extreme {extreme} requires {expected} threshold")]
    ThresholdShapeMismatch {
        /// The configured extreme side.
        extreme: &'static str,
        /// Description of the expected threshold shape.
        expected: &'static str,
    },

    /// Returned when the loss tolerance `tL` is not strictly positive.
    #[error("tolerance must be strictly positive, got {tolerance}")]
    InvalidTolerance {
        /// The invalid tolerance value provided.
        tolerance: f64,
    },

    /// Returned when the smoothing sharpness `k` is negative or non-finite.
    #[error("smoothing sharpness must be finite and non-negative, got {k}")]
    InvalidSmoothing {
        /// The invalid sharpness value provided.
        k: f64,
    },

    /// Returned when beta is outside [0, 1].
    #[error("beta must be in [0, 1], got {beta}")]
    InvalidBeta {
        /// The invalid beta value provided.
        beta: f64,
    },

    /// Returned when the relevance cutoff `tE` is outside [0, 1].
    #[error("relevance cutoff must be in [0, 1], got {cutoff}")]
    InvalidRelevanceCutoff {
        /// The invalid cutoff value provided.
        cutoff: f64,
    },

    /// Returned when `y_true` and `y_pred` have different lengths.
    #[error("y_true has {n_true} values but y_pred has {n_pred}")]
    LengthMismatch {
        /// Length of `y_true`.
        n_true: usize,
        /// Length of `y_pred`.
        n_pred: usize,
    },

    /// Returned when empty arrays are scored.
    #[error("cannot score an empty prediction batch")]
    EmptyInput,

    /// Returned when an input value is NaN or infinite.
    #[error("non-finite value in {array} at index {index}")]
    NonFiniteValue {
        /// Which array contained the value (`y_true` or `y_pred`).
        array: &'static str,
        /// Position of the first non-finite value found.
        index: usize,
    },
}

impl MetricError {
    /// Classify this error as a configuration or input problem.
    #[must_use]
    pub fn kind(&self) -> MetricErrorKind {
        match self {
            Self::LengthMismatch { .. } | Self::EmptyInput | Self::NonFiniteValue { .. } => {
                MetricErrorKind::InvalidInput
            }
            _ => MetricErrorKind::Configuration,
        }
    }
}

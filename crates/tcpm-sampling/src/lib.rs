//! Stratified threshold splitting and extreme-value resampling.
//!
//! Splits a target series so rare values keep a fair share of the test set,
//! standardizes features on the training partition, and wraps any
//! oversampler in a bounded retry loop with an inclusive target clamp. A
//! SMOTER-style oversampler is included.

mod error;
mod resample;
mod rows;
mod scale;
mod series;
mod smoter;
mod split;

pub use error::{OversampleError, SamplingError, SamplingErrorKind};
pub use resample::{Oversampler, ResampleConfig, ResampleOutcome, TargetBounds, clamp_rows};
pub use rows::LearningRows;
pub use scale::{StandardScaler, normalize_rows};
pub use series::{EntityId, TargetSeries};
pub use smoter::{SamplingMethod, Smoter, SmoterConfig};
pub use split::{RareSide, SplitResult, StratifiedSplitConfig};

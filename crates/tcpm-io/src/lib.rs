//! File I/O, validation, presets, and JSON artifacts for the tcpm pipeline.

mod domain;
mod error;
mod reader;
mod writer;

pub use domain::{ExperimentName, LearningTable, PredictionSet, TargetPreset};
pub use error::IoError;
pub use reader::{LearningTableReader, PredictionReader};
pub use writer::{ArtifactKind, ArtifactWriter, ScoreSettings, read_learning_rows};

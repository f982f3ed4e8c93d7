//! I/O error types for tcpm-io.

use std::path::PathBuf;

use tcpm_sampling::SamplingError;

/// Errors from CSV parsing, artifact serialization, and preset lookup.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when an input CSV cannot be opened.
    #[error("cannot open {path}")]
    FileNotFound {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the csv crate rejects a record.
    #[error("malformed CSV in {path} near byte {offset}")]
    CsvParse {
        /// Path to the CSV file.
        path: PathBuf,
        /// Byte position reported by the parser.
        offset: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when a CSV or artifact holds no rows.
    #[error("no rows in {path}")]
    EmptyDataset {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when a row is wider or narrower than the header.
    #[error("inconsistent row length in {path}: row {row_index} (entity {entity_id}) has {got} columns, expected {expected}")]
    InconsistentRowLength {
        /// Path to the CSV file.
        path: PathBuf,
        /// Data row index, header excluded.
        row_index: usize,
        /// Entity id of the offending row.
        entity_id: String,
        /// Header width.
        expected: usize,
        /// Width of this row.
        got: usize,
    },

    /// Returned when a numeric cell is NaN, Inf, or not a float.
    #[error("non-finite value in {path}: row {row_index}, column \"{column}\", raw value \"{raw}\"")]
    NonFiniteValue {
        /// Path to the CSV file.
        path: PathBuf,
        /// Data row index, header excluded.
        row_index: usize,
        /// Header name of the column.
        column: String,
        /// The raw string that failed to parse.
        raw: String,
    },

    /// Returned when a row has an empty entity id.
    #[error("empty entity id in {path} at row {row_index}")]
    EmptyEntityId {
        /// Path to the CSV file.
        path: PathBuf,
        /// Data row index, header excluded.
        row_index: usize,
    },

    /// Returned when the same entity id appears more than once.
    #[error("duplicate entity id \"{entity_id}\" in {path}: first at row {first_row}, again at row {second_row}")]
    DuplicateEntityId {
        /// Path to the CSV file.
        path: PathBuf,
        /// The duplicated id.
        entity_id: String,
        /// Row of the first occurrence.
        first_row: usize,
        /// Row of the repeat.
        second_row: usize,
    },

    /// Returned when a required column is absent from the header.
    #[error("column \"{column}\" not found in header of {path}")]
    MissingColumn {
        /// Path to the CSV file.
        path: PathBuf,
        /// The column that was looked up.
        column: String,
    },

    /// Returned when the learning table has only the id and target columns.
    #[error("no feature columns in {path}")]
    NoFeatureColumns {
        /// Path to the CSV file.
        path: PathBuf,
    },

    /// Returned when an experiment name is empty or not `[a-zA-Z0-9_-]+`.
    #[error("experiment name \"{name}\" must be non-empty and use only [a-zA-Z0-9_-]")]
    InvalidExperimentName {
        /// The invalid name.
        name: String,
    },

    /// Returned when a preset name is not recognised.
    #[error("unknown target preset \"{name}\" (expected avg-score, number-of-registration or sub-reg-ratio)")]
    UnknownPreset {
        /// The unrecognised name.
        name: String,
    },

    /// Returned when the artifact directory cannot be created.
    #[error("failed to create directory {path}")]
    OutputDirCreate {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact file cannot be written.
    #[error("failed to write {path}")]
    WriteFile {
        /// Target path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when an artifact cannot be encoded as JSON.
    #[error("cannot serialize artifact for {path}")]
    Serialize {
        /// Destination path.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when a learning-data artifact is not valid JSON of the expected shape.
    #[error("cannot parse artifact {path}")]
    ParseArtifact {
        /// Path to the artifact.
        path: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// Returned when an artifact record lacks `y` or has a non-`x<i>` field.
    #[error("malformed record \"{key}\" in {path}: {reason}")]
    MalformedRecord {
        /// Path to the artifact.
        path: PathBuf,
        /// Row key of the record.
        key: String,
        /// What was wrong with it.
        reason: String,
    },

    /// Returned when parsed rows fail target or feature validation.
    #[error(transparent)]
    Sampling(#[from] SamplingError),
}

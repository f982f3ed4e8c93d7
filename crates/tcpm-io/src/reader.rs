//! CSV readers for learning tables and prediction files.

use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use tcpm_sampling::LearningRows;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::{LearningTable, PredictionSet};

fn open_csv(path: &Path) -> Result<csv::Reader<File>, IoError> {
    let file = File::open(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    // flexible(true) lets the row-length check below report the entity id
    // instead of a bare CsvParse error.
    Ok(csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file))
}

fn csv_error(path: &Path, e: csv::Error) -> IoError {
    IoError::CsvParse {
        path: path.to_path_buf(),
        offset: e.position().map_or(0, |p| p.byte()),
        source: e,
    }
}

/// Shared row checks: column count, non-empty id, unique id.
struct RowValidator<'a> {
    path: &'a Path,
    expected_cols: usize,
    seen: HashMap<String, usize>,
}

impl<'a> RowValidator<'a> {
    fn new(path: &'a Path, expected_cols: usize) -> Self {
        Self {
            path,
            expected_cols,
            seen: HashMap::new(),
        }
    }

    fn check(&mut self, row_index: usize, record: &StringRecord) -> Result<String, IoError> {
        let entity_id = record.get(0).unwrap_or("").to_string();
        if record.len() != self.expected_cols {
            return Err(IoError::InconsistentRowLength {
                path: self.path.to_path_buf(),
                row_index,
                entity_id,
                expected: self.expected_cols,
                got: record.len(),
            });
        }
        if entity_id.is_empty() {
            return Err(IoError::EmptyEntityId {
                path: self.path.to_path_buf(),
                row_index,
            });
        }
        if let Some(&first_row) = self.seen.get(&entity_id) {
            return Err(IoError::DuplicateEntityId {
                path: self.path.to_path_buf(),
                entity_id,
                first_row,
                second_row: row_index,
            });
        }
        self.seen.insert(entity_id.clone(), row_index);
        Ok(entity_id)
    }

    fn parse(
        &self,
        row_index: usize,
        record: &StringRecord,
        col: usize,
        column: &str,
    ) -> Result<f64, IoError> {
        let raw = record.get(col).unwrap_or("");
        match raw.parse::<f64>() {
            Ok(v) if v.is_finite() => Ok(v),
            _ => Err(IoError::NonFiniteValue {
                path: self.path.to_path_buf(),
                row_index,
                column: column.to_string(),
                raw: raw.to_string(),
            }),
        }
    }
}

fn find_column(path: &Path, header: &StringRecord, column: &str) -> Result<usize, IoError> {
    header
        .iter()
        .position(|h| h == column)
        .ok_or_else(|| IoError::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

/// Reads a challenge learning table from CSV.
///
/// Expected CSV format:
/// - Header row required; the first column is the entity id
/// - `entity_id,feature1,...,featureN,target` (the target may sit at any position
///   and is chosen by name)
/// - One row per challenge, all rows with the same number of columns
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::MissingColumn`] | Target column not in header |
/// | [`IoError::NoFeatureColumns`] | Only id and target columns |
/// | [`IoError::EmptyDataset`] | Zero data rows after header |
/// | [`IoError::InconsistentRowLength`] | Row has different column count than header |
/// | [`IoError::EmptyEntityId`] | Blank id cell |
/// | [`IoError::DuplicateEntityId`] | Same id appears twice |
/// | [`IoError::NonFiniteValue`] | Cell is NaN, Inf, or unparseable float |
pub struct LearningTableReader {
    path: PathBuf,
    target_column: String,
}

impl LearningTableReader {
    /// Create a reader for `path` that takes the target from `target_column`.
    pub fn new(path: &Path, target_column: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            target_column: target_column.to_string(),
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display(), target = %self.target_column))]
    pub fn read(&self) -> Result<LearningTable, IoError> {
        let mut rdr = open_csv(&self.path)?;
        let header = rdr.headers().map_err(|e| csv_error(&self.path, e))?.clone();
        let expected_cols = header.len();
        debug!(expected_cols, "read CSV header");

        let target_col = find_column(&self.path, &header, &self.target_column)?;
        let feature_cols: Vec<usize> = (1..expected_cols).filter(|&c| c != target_col).collect();
        if target_col == 0 || feature_cols.is_empty() {
            return Err(IoError::NoFeatureColumns {
                path: self.path.clone(),
            });
        }
        let feature_names: Vec<String> = feature_cols.iter().map(|&c| header[c].to_string()).collect();

        let mut validator = RowValidator::new(&self.path, expected_cols);
        let mut keys = Vec::new();
        let mut features = Vec::new();
        let mut target = Vec::new();

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;
            let entity_id = validator.check(row_index, &record)?;
            let row = feature_cols
                .iter()
                .map(|&c| validator.parse(row_index, &record, c, &header[c]))
                .collect::<Result<Vec<f64>, IoError>>()?;
            target.push(validator.parse(row_index, &record, target_col, &self.target_column)?);
            keys.push(entity_id);
            features.push(row);
        }

        if keys.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let rows = LearningRows::new(keys, features, target)?;
        info!(
            n_samples = rows.n_rows(),
            n_features = rows.n_features(),
            "learning table loaded"
        );
        Ok(LearningTable::new(feature_names, self.target_column.clone(), rows))
    }
}

/// Reads paired ground truth and predictions from CSV.
///
/// Expected CSV format: `entity_id,y_true,y_pred[,fold]`. Columns other than
/// the id are located by name, so their order is free.
///
/// # Errors
///
/// Same table as [`LearningTableReader`], with [`IoError::MissingColumn`]
/// for an absent `y_true` or `y_pred`.
pub struct PredictionReader {
    path: PathBuf,
}

impl PredictionReader {
    /// Create a reader for the given CSV file path.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read and validate the CSV file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<PredictionSet, IoError> {
        let mut rdr = open_csv(&self.path)?;
        let header = rdr.headers().map_err(|e| csv_error(&self.path, e))?.clone();
        let true_col = find_column(&self.path, &header, "y_true")?;
        let pred_col = find_column(&self.path, &header, "y_pred")?;
        let fold_col = header.iter().position(|h| h == "fold");
        debug!(has_folds = fold_col.is_some(), "read CSV header");

        let mut validator = RowValidator::new(&self.path, header.len());
        let mut entity_ids = Vec::new();
        let mut y_true = Vec::new();
        let mut y_pred = Vec::new();
        let mut folds = fold_col.map(|_| Vec::new());

        for (row_index, result) in rdr.records().enumerate() {
            let record = result.map_err(|e| csv_error(&self.path, e))?;
            entity_ids.push(validator.check(row_index, &record)?);
            y_true.push(validator.parse(row_index, &record, true_col, "y_true")?);
            y_pred.push(validator.parse(row_index, &record, pred_col, "y_pred")?);
            if let (Some(col), Some(labels)) = (fold_col, folds.as_mut()) {
                labels.push(record.get(col).unwrap_or("").to_string());
            }
        }

        if entity_ids.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        info!(n_rows = entity_ids.len(), "predictions loaded");
        Ok(PredictionSet {
            entity_ids,
            y_true,
            y_pred,
            folds,
        })
    }
}

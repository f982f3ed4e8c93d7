//! JSON artifacts: learning-data tables and score reports.
//!
//! A learning-data artifact is a JSON object keyed by row key; each value is
//! a record `{"x0": .., "x1": .., ..., "y": ..}`. Rows and record fields keep
//! their in-memory order on disk.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tcpm_metrics::{FoldSummary, RegressionReport, RegressionScores};
use tcpm_sampling::LearningRows;
use tracing::{debug, info, instrument};

use crate::IoError;
use crate::domain::ExperimentName;

/// Which learning-data artifact to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// Held-out test rows, keyed by entity id.
    Test,
    /// Training rows before resampling, keyed by entity id.
    TrainOriginal,
    /// Clamped resampler output, keyed by position.
    TrainResample,
}

impl ArtifactKind {
    fn suffix(self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::TrainOriginal => "train_original",
            Self::TrainResample => "train_resample",
        }
    }
}

/// Writes learning-data and score artifacts to JSON files.
///
/// Creates the output directory on construction if it does not exist.
/// Output files are named `{experiment}_test.json`,
/// `{experiment}_train_original.json`, `{experiment}_train_resample.json`
/// and `{experiment}_score.json`.
pub struct ArtifactWriter {
    output_dir: PathBuf,
    experiment: ExperimentName,
}

impl ArtifactWriter {
    /// Create a new writer targeting the given directory and experiment name.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::OutputDirCreate`] if the directory cannot be created.
    #[instrument(skip_all, fields(dir = %output_dir.display(), experiment = %experiment))]
    pub fn new(output_dir: &Path, experiment: ExperimentName) -> Result<Self, IoError> {
        fs::create_dir_all(output_dir).map_err(|e| IoError::OutputDirCreate {
            path: output_dir.to_path_buf(),
            source: e,
        })?;
        debug!("output directory ready");
        Ok(Self {
            output_dir: output_dir.to_path_buf(),
            experiment,
        })
    }

    /// Path of the artifact of the given kind.
    #[must_use]
    pub fn path_for(&self, kind: ArtifactKind) -> PathBuf {
        self.output_dir
            .join(format!("{}_{}.json", self.experiment.as_str(), kind.suffix()))
    }

    /// Path of the score artifact.
    #[must_use]
    pub fn score_path(&self) -> PathBuf {
        self.output_dir
            .join(format!("{}_score.json", self.experiment.as_str()))
    }

    /// Write `rows` as a learning-data artifact and return its path.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all, fields(kind = kind.suffix(), n_rows = rows.n_rows()))]
    pub fn write_rows(&self, kind: ArtifactKind, rows: &LearningRows) -> Result<PathBuf, IoError> {
        let path = self.path_for(kind);
        write_json(&path, &RecordTable(rows))?;
        info!(path = %path.display(), "learning data written");
        Ok(path)
    }

    /// Write a score report to `{experiment}_score.json`. Undefined metrics become `null`.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::Serialize`] or [`IoError::WriteFile`].
    #[instrument(skip_all)]
    pub fn write_score(
        &self,
        settings: &ScoreSettings,
        overall: &RegressionScores,
        report: &RegressionReport,
        folds: Option<(&[String], &FoldSummary)>,
    ) -> Result<PathBuf, IoError> {
        let path = self.score_path();
        let folds = folds.map(|(labels, summary)| FoldsArtifact {
            per_fold: labels
                .iter()
                .zip(&summary.folds)
                .map(|(label, scores)| FoldEntry {
                    fold: label.as_str(),
                    precision: scores.precision,
                    recall: scores.recall,
                    fscore: scores.fscore,
                })
                .collect(),
            mean_precision: summary.mean_precision,
            mean_recall: summary.mean_recall,
            mean_fscore: summary.mean_fscore,
            std_fscore: summary.std_fscore,
            n_undefined: summary.n_undefined,
        });
        let artifact = ScoreArtifact {
            experiment: self.experiment.as_str(),
            settings,
            overall,
            regression: report,
            folds,
        };
        write_json(&path, &artifact)?;
        info!(path = %path.display(), "score written");
        Ok(path)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), IoError> {
    let json = serde_json::to_string_pretty(value).map_err(|e| IoError::Serialize {
        path: path.to_path_buf(),
        source: e,
    })?;
    fs::write(path, json).map_err(|e| IoError::WriteFile {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read a learning-data artifact back into rows, keeping file order.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::ParseArtifact`] | Not a JSON object of numeric records |
/// | [`IoError::MalformedRecord`] | Record lacks `y` or has a field other than `x<i>` |
/// | [`IoError::Sampling`] | Rows fail width, finiteness or emptiness checks |
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_learning_rows(path: &Path) -> Result<LearningRows, IoError> {
    let text = fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let entries: OrderedEntries = serde_json::from_str(&text).map_err(|e| IoError::ParseArtifact {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut keys = Vec::with_capacity(entries.0.len());
    let mut features = Vec::with_capacity(entries.0.len());
    let mut target = Vec::with_capacity(entries.0.len());
    for (key, fields) in entries.0 {
        let malformed = |reason: String| IoError::MalformedRecord {
            path: path.to_path_buf(),
            key: key.clone(),
            reason,
        };
        let y = fields
            .0
            .iter()
            .find_map(|(name, value)| (name == "y").then_some(*value))
            .ok_or_else(|| malformed("missing \"y\"".to_string()))?;
        let mut row = vec![f64::NAN; fields.0.len() - 1];
        for (name, value) in fields.0 {
            if name == "y" {
                continue;
            }
            let slot = name
                .strip_prefix('x')
                .and_then(|i| i.parse::<usize>().ok())
                .and_then(|i| row.get_mut(i))
                .ok_or_else(|| malformed(format!("unexpected field \"{name}\"")))?;
            *slot = value;
        }
        keys.push(key);
        features.push(row);
        target.push(y);
    }

    let rows = LearningRows::new(keys, features, target)?;
    info!(n_rows = rows.n_rows(), n_features = rows.n_features(), "learning data read");
    Ok(rows)
}

/// Echo of the metric configuration stored alongside the scores.
#[derive(Debug, Clone, Serialize)]
pub struct ScoreSettings {
    /// Preset name, if one was used.
    pub preset: Option<String>,
    /// Threshold(s) of the relevance function.
    pub thresholds: Vec<f64>,
    /// `low`, `high` or `both`.
    pub extreme: String,
    /// Relevance cutoff `tE`.
    pub relevance_cutoff: f64,
    /// Loss tolerance `tL`.
    pub tolerance: f64,
    /// F-score beta.
    pub beta: f64,
    /// Whether the smoothed accuracy indicator was used.
    pub smoothed: bool,
}

// --- Serialization helpers ---

/// Borrowed rows serialized as an ordered `{key: {x0.., y}}` object.
struct RecordTable<'a>(&'a LearningRows);

struct Record<'a> {
    features: &'a [f64],
    y: f64,
}

impl Serialize for RecordTable<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rows = self.0;
        let mut map = serializer.serialize_map(Some(rows.n_rows()))?;
        for ((key, features), &y) in rows.keys().iter().zip(rows.features()).zip(rows.target()) {
            map.serialize_entry(key, &Record { features, y })?;
        }
        map.end()
    }
}

impl Serialize for Record<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.features.len() + 1))?;
        for (i, x) in self.features.iter().enumerate() {
            map.serialize_entry(&format!("x{i}"), x)?;
        }
        map.serialize_entry("y", &self.y)?;
        map.end()
    }
}

/// A JSON object read as key/value pairs in document order.
struct Ordered<V>(Vec<(String, V)>);

type OrderedEntries = Ordered<Ordered<f64>>;

impl<'de, V: Deserialize<'de>> Deserialize<'de> for Ordered<V> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor<V>(std::marker::PhantomData<V>);

        impl<'de, V: Deserialize<'de>> Visitor<'de> for OrderedVisitor<V> {
            type Value = Ordered<V>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::with_capacity(access.size_hint().unwrap_or(0));
                let mut seen = HashSet::new();
                while let Some((key, value)) = access.next_entry::<String, V>()? {
                    if !seen.insert(key.clone()) {
                        return Err(de::Error::custom(format!("duplicate key \"{key}\"")));
                    }
                    entries.push((key, value));
                }
                Ok(Ordered(entries))
            }
        }

        deserializer.deserialize_map(OrderedVisitor(std::marker::PhantomData))
    }
}

#[derive(Serialize)]
struct ScoreArtifact<'a> {
    experiment: &'a str,
    settings: &'a ScoreSettings,
    overall: &'a RegressionScores,
    regression: &'a RegressionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    folds: Option<FoldsArtifact<'a>>,
}

#[derive(Serialize)]
struct FoldsArtifact<'a> {
    per_fold: Vec<FoldEntry<'a>>,
    mean_precision: f64,
    mean_recall: f64,
    mean_fscore: f64,
    std_fscore: f64,
    n_undefined: usize,
}

#[derive(Serialize)]
struct FoldEntry<'a> {
    fold: &'a str,
    precision: f64,
    recall: f64,
    fscore: f64,
}

//! End-to-end integration tests: CSV -> split -> resample -> JSON -> read back.

use std::fs;
use std::path::{Path, PathBuf};

use tcpm_io::{
    ArtifactKind, ArtifactWriter, ExperimentName, IoError, LearningTableReader, PredictionReader,
    ScoreSettings, TargetPreset, read_learning_rows,
};
use tcpm_metrics::{RegressionReport, score_folds};
use tcpm_sampling::{
    ResampleConfig, SmoterConfig, StandardScaler, StratifiedSplitConfig, TargetBounds,
};
use tempfile::TempDir;

/// Path to the test fixture directory.
fn fixture_path(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

#[test]
fn build_dataset_round_trip() {
    // 1. Read CSV
    let table = LearningTableReader::new(&fixture_path("challenges.csv"), "avg_score")
        .read()
        .expect("fixture should parse");
    assert_eq!(table.n_samples(), 40);
    assert_eq!(table.feature_names().len(), 3);

    // 2. Stratified split around the avg-score preset
    let preset = TargetPreset::AvgScore;
    let series = table.target_series().unwrap();
    let split = StratifiedSplitConfig::new(preset.threshold(), preset.rare_side(), 10)
        .unwrap()
        .split(&series)
        .unwrap();
    // 10 scores below 90, 30 at or above: multiple 3, minority quota floor(10 / 4) = 2.
    assert_eq!(split.minority_size, 10);
    assert_eq!(split.minority_test_size, 2);
    assert_eq!(split.majority_test_size, 8);

    // 3. Scale on the training partition only
    let train = table.rows().select(&split.train);
    let test = table.rows().select(&split.test);
    let scaler = StandardScaler::fit(&train).unwrap();
    let train = scaler.transform(&train).unwrap();
    let test = scaler.transform(&test).unwrap();

    // 4. Write test and original-train artifacts
    let dir = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(dir.path(), ExperimentName::new("avg_score_meta").unwrap()).unwrap();
    let test_path = writer.write_rows(ArtifactKind::Test, &test).unwrap();
    let train_path = writer.write_rows(ArtifactKind::TrainOriginal, &train).unwrap();

    // 5. Resample, clamp, write
    let engine = preset.metric_config().build().unwrap();
    let smoter = SmoterConfig::new(*engine.relevance()).build().unwrap();
    let (lower, upper) = preset.clamp();
    let outcome = ResampleConfig::new(10)
        .unwrap()
        .with_bounds(TargetBounds::new(lower, upper).unwrap())
        .run(&smoter, &train)
        .unwrap();
    let resample_path = writer
        .write_rows(ArtifactKind::TrainResample, &outcome.rows)
        .unwrap();

    // 6. Read everything back
    assert_eq!(read_learning_rows(&test_path).unwrap(), test);
    assert_eq!(read_learning_rows(&train_path).unwrap(), train);
    let resampled = read_learning_rows(&resample_path).unwrap();
    assert_eq!(resampled, outcome.rows);
    assert_eq!(resampled.keys()[0], "0");
    assert!(resampled.target().iter().all(|&y| (0.0..=100.0).contains(&y)));
    // 8 rare training rows grow to the 22 common ones; common shrinks to 8.
    assert_eq!(resampled.n_rows(), 30);

    // Test keys are entity ids from the source table.
    let test_json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&test_path).unwrap()).unwrap();
    let test_ids = test_json.as_object().unwrap();
    assert_eq!(test_ids.len(), 10);
    for id in split.test_ids(&series) {
        assert!(test_ids.contains_key(id.as_str()), "missing {id}");
    }

    // Original-train keys are the training entity ids, in split order.
    let train_keys: Vec<&str> = split.train_ids(&series).iter().map(|id| id.as_str()).collect();
    assert_eq!(train.keys(), train_keys.as_slice());
}

#[test]
fn score_round_trip() {
    let predictions = PredictionReader::new(&fixture_path("predictions.csv"))
        .read()
        .unwrap();
    assert_eq!(predictions.len(), 30);

    let preset = TargetPreset::AvgScore;
    let engine = preset.metric_config().build().unwrap();
    let overall = engine.evaluate(&predictions.y_true, &predictions.y_pred).unwrap();
    let report = RegressionReport::from_predictions(&predictions.y_true, &predictions.y_pred).unwrap();

    let by_fold = predictions.by_fold().unwrap();
    let (labels, folds): (Vec<String>, Vec<_>) = by_fold.into_iter().unzip();
    assert_eq!(labels, vec!["0", "1", "2"]);
    let summary = score_folds(&engine, &folds).unwrap();

    let settings = ScoreSettings {
        preset: Some(preset.name().to_string()),
        thresholds: vec![preset.threshold()],
        extreme: preset.extreme().to_string(),
        relevance_cutoff: preset.relevance_cutoff(),
        tolerance: preset.tolerance(),
        beta: engine.beta(),
        smoothed: true,
    };
    let dir = TempDir::new().unwrap();
    let writer = ArtifactWriter::new(dir.path(), ExperimentName::new("avg_score_eval").unwrap()).unwrap();
    let path = writer
        .write_score(&settings, &overall, &report, Some((labels.as_slice(), &summary)))
        .unwrap();

    let content: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(content["experiment"], "avg_score_eval");
    assert_eq!(content["settings"]["preset"], "avg-score");
    assert_eq!(content["regression"]["n_samples"], 30);
    let per_fold = content["folds"]["per_fold"].as_array().unwrap();
    assert_eq!(per_fold.len(), 3);
    assert_eq!(per_fold[2]["fold"], "2");
    // Fold 0 holds every low-score truth, so its recall is defined.
    assert!(per_fold[0]["recall"].is_number());
}

#[test]
fn reader_fixture_files_match_expected_errors() {
    let read = |name: &str| LearningTableReader::new(&fixture_path(name), "avg_score").read();

    let result = read("empty.csv");
    assert!(
        matches!(result, Err(IoError::EmptyDataset { .. })),
        "empty.csv should give EmptyDataset, got: {result:?}"
    );

    let result = read("jagged.csv");
    assert!(
        matches!(result, Err(IoError::InconsistentRowLength { .. })),
        "jagged.csv should give InconsistentRowLength, got: {result:?}"
    );

    let result = read("nan.csv");
    assert!(
        matches!(result, Err(IoError::NonFiniteValue { .. })),
        "nan.csv should give NonFiniteValue, got: {result:?}"
    );

    let result = read("inf.csv");
    assert!(
        matches!(result, Err(IoError::NonFiniteValue { .. })),
        "inf.csv should give NonFiniteValue, got: {result:?}"
    );

    let result = read("duplicate_ids.csv");
    assert!(
        matches!(result, Err(IoError::DuplicateEntityId { .. })),
        "duplicate_ids.csv should give DuplicateEntityId, got: {result:?}"
    );
}

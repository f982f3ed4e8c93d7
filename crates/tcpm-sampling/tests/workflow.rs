//! End-to-end split, scale and resample workflow on a synthetic challenge table.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tcpm_metrics::{Extreme, RelevanceFunction, Threshold};
use tcpm_sampling::{
    EntityId, LearningRows, OversampleError, Oversampler, RareSide, ResampleConfig,
    SamplingErrorKind, SmoterConfig, StandardScaler, StratifiedSplitConfig, TargetBounds,
    TargetSeries,
};

// ---------------------------------------------------------------------------
// Helper: registration counts with a rare high tail
// ---------------------------------------------------------------------------

/// 120 challenges, 3 features each; one in six draws 40+ registrants.
fn make_table(seed: u64) -> (TargetSeries, Vec<Vec<f64>>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ids = Vec::new();
    let mut values = Vec::new();
    let mut features = Vec::new();
    for i in 0..120 {
        let y = if i % 6 == 0 {
            40.0 + rng.r#gen::<f64>() * 60.0
        } else {
            rng.r#gen::<f64>() * 25.0
        };
        ids.push(EntityId::new(format!("3000{i:03}")).unwrap());
        values.push(y);
        features.push(vec![y / 10.0 + rng.r#gen::<f64>(), rng.r#gen::<f64>() * 5.0, 1.0]);
    }
    (TargetSeries::new(ids, values).unwrap(), features)
}

fn subset(series: &TargetSeries, features: &[Vec<f64>], idx: &[usize]) -> LearningRows {
    LearningRows::new(
        idx.iter().map(|&i| series.ids()[i].to_string()).collect(),
        idx.iter().map(|&i| features[i].clone()).collect(),
        idx.iter().map(|&i| series.values()[i]).collect(),
    )
    .unwrap()
}

// ---------------------------------------------------------------------------
// a) full workflow
// ---------------------------------------------------------------------------

#[test]
fn split_scale_resample_clamp() {
    let (series, features) = make_table(42);
    let split = StratifiedSplitConfig::new(30.0, RareSide::High, 24)
        .unwrap()
        .split(&series)
        .unwrap();
    assert_eq!(split.minority_size, 20);
    // majority_multiple = 5, minority quota = floor(24 / 6) = 4
    assert_eq!(split.minority_test_size, 4);
    assert_eq!(split.test.len() + split.train.len(), 120);

    let train = subset(&series, &features, &split.train);
    let test = subset(&series, &features, &split.test);
    let scaler = StandardScaler::fit(&train).unwrap();
    let train = scaler.transform(&train).unwrap();
    let test = scaler.transform(&test).unwrap();
    assert_eq!(test.keys().len(), 24);
    assert_eq!(test.keys()[0], series.ids()[split.test[0]].as_str());

    let relevance = RelevanceFunction::new(Threshold::Single(30.0), Extreme::High, 0.5, 1e-4).unwrap();
    let smoter = SmoterConfig::new(relevance).build().unwrap();
    let bounds = TargetBounds::new(Some(0.0), None).unwrap();
    let outcome = ResampleConfig::new(5)
        .unwrap()
        .with_bounds(bounds)
        .run(&smoter, &train)
        .unwrap();

    assert_eq!(outcome.attempts, 1);
    assert!(outcome.rows.target().iter().all(|&y| y >= 0.0));
    assert_eq!(outcome.rows.keys()[0], "0");
    let n_rare = outcome
        .rows
        .target()
        .iter()
        .filter(|&&y| relevance.phi(y) >= 0.5)
        .count();
    assert!(n_rare * 2 > outcome.rows.n_rows(), "rare rows should dominate after resampling");
}

// ---------------------------------------------------------------------------
// b) retry policy around an unreliable oversampler
// ---------------------------------------------------------------------------

/// Rejects any attempt whose generator's first draw is below one half.
struct CoinFlip;

impl Oversampler for CoinFlip {
    fn oversample(
        &self,
        rows: &LearningRows,
        rng: &mut ChaCha8Rng,
    ) -> Result<LearningRows, OversampleError> {
        if rng.r#gen::<f64>() < 0.5 {
            return Err(OversampleError::Rejected("singular matrix".to_string()));
        }
        let target = rows.target().iter().map(|y| y * 2.0 - 50.0).collect();
        LearningRows::positional(rows.features().to_vec(), target)
            .map_err(|e| OversampleError::Rejected(e.to_string()))
    }
}

#[test]
fn retries_are_reproducible() {
    let rows = LearningRows::positional(
        vec![vec![0.0], vec![1.0], vec![2.0]],
        vec![10.0, 40.0, 80.0],
    )
    .unwrap();
    let bounds = TargetBounds::new(Some(0.0), Some(100.0)).unwrap();
    let cfg = ResampleConfig::new(64).unwrap().with_bounds(bounds).with_seed(3);
    let a = cfg.run(&CoinFlip, &rows).unwrap();
    let b = cfg.run(&CoinFlip, &rows).unwrap();
    assert_eq!(a, b);
    // Targets map to -30, 30 and 110; only 30 is inside [0, 100].
    assert_eq!(a.rows.target(), &[30.0]);
    assert_eq!(a.n_dropped, 2);
}

#[test]
fn smoter_without_rare_rows_exhausts() {
    let rows = LearningRows::positional(vec![vec![0.0], vec![1.0]], vec![1.0, 2.0]).unwrap();
    let relevance = RelevanceFunction::new(Threshold::Single(30.0), Extreme::High, 0.5, 1e-4).unwrap();
    let smoter = SmoterConfig::new(relevance).build().unwrap();
    let err = ResampleConfig::new(3).unwrap().run(&smoter, &rows).unwrap_err();
    assert_eq!(err.kind(), SamplingErrorKind::ResampleExhausted);
    assert!(err.to_string().contains("after 3 attempts"));
}

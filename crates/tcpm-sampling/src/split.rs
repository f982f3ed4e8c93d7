//! Stratified train/test splitting around a rare-value threshold.

use std::fmt;
use std::str::FromStr;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, instrument};

use tcpm_metrics::Extreme;

use crate::error::SamplingError;
use crate::series::{EntityId, TargetSeries};

/// Which side of the threshold holds the rare (minority) values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RareSide {
    /// Values strictly below the threshold are rare.
    Low,
    /// Values strictly above the threshold are rare.
    High,
}

impl RareSide {
    /// Return the lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl fmt::Display for RareSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RareSide {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "high" => Ok(Self::High),
            other => Err(format!("unknown rare side {other:?} (expected low or high)")),
        }
    }
}

/// The one-sided relevance extreme matching a rare side.
impl From<RareSide> for Extreme {
    fn from(side: RareSide) -> Self {
        match side {
            RareSide::Low => Extreme::Low,
            RareSide::High => Extreme::High,
        }
    }
}

/// Configuration for a stratified threshold split.
///
/// Construct via [`StratifiedSplitConfig::new`], then chain `with_seed` if desired.
///
/// # Defaults
///
/// | Parameter | Default |
/// |-----------|---------|
/// | `seed`    | 42      |
#[derive(Debug, Clone, PartialEq)]
pub struct StratifiedSplitConfig {
    threshold: f64,
    rare_side: RareSide,
    test_size: usize,
    seed: u64,
}

/// Disjoint, exhaustive train/test partition of a target series.
///
/// Indices refer to positions in the source series and are sorted ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitResult {
    /// Positions assigned to training.
    pub train: Vec<usize>,
    /// Positions assigned to testing.
    pub test: Vec<usize>,
    /// Number of minority members in the series.
    pub minority_size: usize,
    /// Number of majority members in the series (including values equal to the threshold).
    pub majority_size: usize,
    /// Minority members sampled into the test set.
    pub minority_test_size: usize,
    /// Majority members sampled into the test set.
    pub majority_test_size: usize,
}

impl SplitResult {
    /// Entity ids of the training set.
    #[must_use]
    pub fn train_ids<'a>(&self, series: &'a TargetSeries) -> Vec<&'a EntityId> {
        self.train.iter().map(|&i| &series.ids()[i]).collect()
    }

    /// Entity ids of the test set.
    #[must_use]
    pub fn test_ids<'a>(&self, series: &'a TargetSeries) -> Vec<&'a EntityId> {
        self.test.iter().map(|&i| &series.ids()[i]).collect()
    }
}

impl StratifiedSplitConfig {
    /// Create a split config.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SamplingError::NonFiniteThreshold`] | `threshold` is NaN or infinite |
    /// | [`SamplingError::InvalidTestSize`] | `test_size` is zero |
    pub fn new(threshold: f64, rare_side: RareSide, test_size: usize) -> Result<Self, SamplingError> {
        if !threshold.is_finite() {
            return Err(SamplingError::NonFiniteThreshold { threshold });
        }
        if test_size == 0 {
            return Err(SamplingError::InvalidTestSize {
                test_size,
                n_samples: 0,
            });
        }
        Ok(Self {
            threshold,
            rare_side,
            test_size,
            seed: 42,
        })
    }

    /// Set the random seed for sampling.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Return the threshold.
    #[must_use]
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Return the rare side.
    #[must_use]
    pub fn rare_side(&self) -> RareSide {
        self.rare_side
    }

    /// Return the requested test size.
    #[must_use]
    pub fn test_size(&self) -> usize {
        self.test_size
    }

    /// Return the seed.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Split the series into train and test positions.
    ///
    /// Values equal to the threshold join the majority side. The minority
    /// test quota is `floor(N / (floor(majority / minority) + 1))`, the
    /// majority quota is the remainder, and each side is sampled uniformly
    /// without replacement.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SamplingError::InvalidTestSize`] | `test_size >= series.len()` |
    /// | [`SamplingError::EmptySide`] | minority or majority side is empty |
    /// | [`SamplingError::InsufficientSide`] | a side has fewer members than its quota |
    #[instrument(skip_all, fields(threshold = self.threshold, rare_side = %self.rare_side, test_size = self.test_size))]
    pub fn split(&self, series: &TargetSeries) -> Result<SplitResult, SamplingError> {
        let n_samples = series.len();
        if self.test_size >= n_samples {
            return Err(SamplingError::InvalidTestSize {
                test_size: self.test_size,
                n_samples,
            });
        }

        let mut minority = Vec::new();
        let mut majority = Vec::new();
        for (i, &y) in series.values().iter().enumerate() {
            let rare = match self.rare_side {
                RareSide::Low => y < self.threshold,
                RareSide::High => y > self.threshold,
            };
            if rare {
                minority.push(i);
            } else {
                majority.push(i);
            }
        }
        debug!(minority = minority.len(), majority = majority.len(), "partitioned series");

        if minority.is_empty() {
            return Err(SamplingError::EmptySide {
                side: "minority",
                threshold: self.threshold,
            });
        }
        if majority.is_empty() {
            return Err(SamplingError::EmptySide {
                side: "majority",
                threshold: self.threshold,
            });
        }

        let majority_multiple = majority.len() / minority.len();
        let minority_test_size = self.test_size / (majority_multiple + 1);
        let majority_test_size = self.test_size - minority_test_size;

        if minority_test_size > minority.len() {
            return Err(SamplingError::InsufficientSide {
                side: "minority",
                requested: minority_test_size,
                available: minority.len(),
            });
        }
        if majority_test_size > majority.len() {
            return Err(SamplingError::InsufficientSide {
                side: "majority",
                requested: majority_test_size,
                available: majority.len(),
            });
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        minority.shuffle(&mut rng);
        majority.shuffle(&mut rng);

        let mut in_test = vec![false; n_samples];
        for &i in minority[..minority_test_size].iter().chain(&majority[..majority_test_size]) {
            in_test[i] = true;
        }
        let (test, train): (Vec<usize>, Vec<usize>) = (0..n_samples).partition(|&i| in_test[i]);

        info!(
            n_train = train.len(),
            n_test = test.len(),
            majority_multiple,
            minority_test_size,
            majority_test_size,
            "stratified split complete"
        );

        Ok(SplitResult {
            train,
            test,
            minority_size: minority.len(),
            majority_size: majority.len(),
            minority_test_size,
            majority_test_size,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> TargetSeries {
        let ids = (0..values.len())
            .map(|i| EntityId::new(format!("c{i}")).unwrap())
            .collect();
        TargetSeries::new(ids, values.to_vec()).unwrap()
    }

    fn scenario() -> TargetSeries {
        series(&[10.0, 10.0, 10.0, 50.0, 50.0, 90.0, 90.0, 90.0, 90.0, 95.0])
    }

    #[test]
    fn worked_example_quotas() {
        let cfg = StratifiedSplitConfig::new(60.0, RareSide::High, 4).unwrap();
        let result = cfg.split(&scenario()).unwrap();
        assert_eq!(result.minority_size, 5);
        assert_eq!(result.majority_size, 5);
        assert_eq!(result.minority_test_size, 2);
        assert_eq!(result.majority_test_size, 2);
        assert_eq!(result.test.len(), 4);
        assert_eq!(result.test.iter().filter(|&&i| i >= 5).count(), 2);
        assert_eq!(result.test.iter().filter(|&&i| i < 5).count(), 2);
    }

    #[test]
    fn partition_is_disjoint_and_exhaustive() {
        let cfg = StratifiedSplitConfig::new(60.0, RareSide::High, 4).unwrap().with_seed(7);
        let result = cfg.split(&scenario()).unwrap();
        let mut all: Vec<usize> = result.train.iter().chain(&result.test).copied().collect();
        all.sort_unstable();
        assert_eq!(all, (0..10).collect::<Vec<_>>());
        assert!(result.train.iter().all(|i| !result.test.contains(i)));
        assert!(result.train.windows(2).all(|w| w[0] < w[1]));
        assert!(result.test.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn ties_join_the_majority() {
        // Rare side low: 60 is not strictly below 60, so it is majority.
        let s = series(&[10.0, 60.0, 60.0, 70.0, 80.0, 90.0]);
        let cfg = StratifiedSplitConfig::new(60.0, RareSide::Low, 2).unwrap();
        let result = cfg.split(&s).unwrap();
        assert_eq!(result.minority_size, 1);
        assert_eq!(result.majority_size, 5);
        // majority_multiple = 5, minority quota = floor(2 / 6) = 0
        assert_eq!(result.minority_test_size, 0);
        assert_eq!(result.majority_test_size, 2);
    }

    #[test]
    fn stratification_over_represents_minority() {
        // 10 rare of 100; population ratio 0.1.
        let values: Vec<f64> = (0..100).map(|i| if i % 10 == 0 { 100.0 } else { 1.0 }).collect();
        let cfg = StratifiedSplitConfig::new(50.0, RareSide::High, 21).unwrap();
        let result = cfg.split(&series(&values)).unwrap();
        // majority_multiple = 9, minority quota = floor(21 / 10) = 2
        assert_eq!(result.minority_test_size, 2);
        assert_eq!(result.test.len(), 21);
        let rare_in_test = result.test.iter().filter(|&&i| values[i] > 50.0).count();
        assert_eq!(rare_in_test, 2);
    }

    #[test]
    fn same_seed_same_split() {
        let cfg = StratifiedSplitConfig::new(60.0, RareSide::High, 4).unwrap().with_seed(9);
        assert_eq!(cfg.split(&scenario()).unwrap(), cfg.split(&scenario()).unwrap());
    }

    #[test]
    fn empty_minority_is_data_sufficiency_error() {
        let cfg = StratifiedSplitConfig::new(200.0, RareSide::High, 4).unwrap();
        let err = cfg.split(&scenario()).unwrap_err();
        assert!(matches!(err, SamplingError::EmptySide { side: "minority", .. }));
        assert_eq!(err.kind(), crate::SamplingErrorKind::DataSufficiency);
    }

    #[test]
    fn empty_majority_rejected() {
        let cfg = StratifiedSplitConfig::new(0.0, RareSide::High, 4).unwrap();
        let err = cfg.split(&scenario()).unwrap_err();
        assert!(matches!(err, SamplingError::EmptySide { side: "majority", .. }));
    }

    #[test]
    fn oversized_test_rejected() {
        let cfg = StratifiedSplitConfig::new(60.0, RareSide::High, 10).unwrap();
        assert!(matches!(
            cfg.split(&scenario()),
            Err(SamplingError::InvalidTestSize { test_size: 10, n_samples: 10 })
        ));
    }

    #[test]
    fn insufficient_side_rejected() {
        // Minority 3, majority 2, multiple 0, so the minority quota is 4 > 3.
        let s = series(&[100.0, 100.0, 100.0, 1.0, 1.0]);
        let cfg = StratifiedSplitConfig::new(50.0, RareSide::High, 4).unwrap();
        let err = cfg.split(&s).unwrap_err();
        assert_eq!(
            err,
            SamplingError::InsufficientSide {
                side: "minority",
                requested: 4,
                available: 3
            }
        );
    }

    #[test]
    fn zero_test_size_rejected() {
        assert!(StratifiedSplitConfig::new(1.0, RareSide::Low, 0).is_err());
        assert!(StratifiedSplitConfig::new(f64::NAN, RareSide::Low, 3).is_err());
    }

    #[test]
    fn rare_side_maps_to_extreme() {
        assert_eq!(Extreme::from(RareSide::Low), Extreme::Low);
        assert_eq!(Extreme::from(RareSide::High), Extreme::High);
        assert_eq!("low".parse::<RareSide>().unwrap(), RareSide::Low);
        assert!("both".parse::<RareSide>().is_err());
    }
}

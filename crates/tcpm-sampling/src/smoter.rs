//! SMOTER-style oversampling of rare target values.

use rand::Rng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;
use rayon::iter::{IndexedParallelIterator, IntoParallelRefIterator, ParallelIterator};
use tcpm_metrics::RelevanceFunction;
use tracing::debug;

use crate::error::{OversampleError, SamplingError};
use crate::resample::Oversampler;
use crate::rows::LearningRows;

/// How far to move the rare/common row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingMethod {
    /// Grow rare rows and shrink common rows toward their midpoint count.
    Balance,
    /// Grow rare rows to the common count and shrink common rows to the rare count.
    Extreme,
}

/// Configuration for [`Smoter`].
///
/// # Defaults
///
/// | Parameter     | Default   |
/// |---------------|-----------|
/// | `rare_cutoff` | 0.5       |
/// | `k_neighbors` | 5         |
/// | `method`      | `Extreme` |
#[derive(Debug, Clone, PartialEq)]
pub struct SmoterConfig {
    relevance: RelevanceFunction,
    rare_cutoff: f64,
    k_neighbors: usize,
    method: SamplingMethod,
}

impl SmoterConfig {
    /// Start a config around the relevance function that labels rows as rare.
    #[must_use]
    pub fn new(relevance: RelevanceFunction) -> Self {
        Self {
            relevance,
            rare_cutoff: 0.5,
            k_neighbors: 5,
            method: SamplingMethod::Extreme,
        }
    }

    /// Rows with `φ(y) >= rare_cutoff` are rare.
    ///
    /// At the default cutoff a target equal to the relevance threshold has
    /// `φ = 0.5` and counts as rare here, matching the metric's `φ >= tE`.
    /// [`StratifiedSplitConfig`](crate::StratifiedSplitConfig) instead puts
    /// such ties on the majority side.
    #[must_use]
    pub fn with_rare_cutoff(mut self, rare_cutoff: f64) -> Self {
        self.rare_cutoff = rare_cutoff;
        self
    }

    /// Number of rare neighbours considered per seed row.
    #[must_use]
    pub fn with_k_neighbors(mut self, k_neighbors: usize) -> Self {
        self.k_neighbors = k_neighbors;
        self
    }

    /// Set the sampling method.
    #[must_use]
    pub fn with_method(mut self, method: SamplingMethod) -> Self {
        self.method = method;
        self
    }

    /// Validate and build the oversampler.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`SamplingError::InvalidRareCutoff`] | cutoff outside [0, 1] |
    /// | [`SamplingError::InvalidNeighbors`] | `k_neighbors == 0` |
    pub fn build(&self) -> Result<Smoter, SamplingError> {
        if !(0.0..=1.0).contains(&self.rare_cutoff) {
            return Err(SamplingError::InvalidRareCutoff {
                cutoff: self.rare_cutoff,
            });
        }
        if self.k_neighbors == 0 {
            return Err(SamplingError::InvalidNeighbors { k: 0 });
        }
        Ok(Smoter {
            relevance: self.relevance,
            rare_cutoff: self.rare_cutoff,
            k_neighbors: self.k_neighbors,
            method: self.method,
        })
    }
}

/// Synthetic minority oversampler for regression targets.
///
/// New rows interpolate between a rare seed and one of its nearest rare
/// neighbours; the target is the distance-weighted mix of the two parents.
#[derive(Debug, Clone, PartialEq)]
pub struct Smoter {
    relevance: RelevanceFunction,
    rare_cutoff: f64,
    k_neighbors: usize,
    method: SamplingMethod,
}

fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt()
}

impl Smoter {
    /// Target `(rare, common)` row counts for the configured method.
    fn target_counts(&self, n_rare: usize, n_common: usize) -> (usize, usize) {
        match self.method {
            SamplingMethod::Extreme => (n_common, n_rare.max(1)),
            SamplingMethod::Balance => {
                let mid = (n_rare + n_common) / 2;
                (mid.max(n_rare), mid.min(n_common).max(1))
            }
        }
    }

    /// For each rare row, the positions (within `rare`) of its nearest rare neighbours.
    fn neighbours(&self, rows: &LearningRows, rare: &[usize]) -> Vec<Vec<usize>> {
        let features = rows.features();
        let k = self.k_neighbors.min(rare.len() - 1);
        rare.par_iter()
            .enumerate()
            .map(|(a, &i)| {
                let mut dists: Vec<(f64, usize)> = rare
                    .iter()
                    .enumerate()
                    .filter(|&(b, _)| b != a)
                    .map(|(b, &j)| (euclidean(&features[i], &features[j]), b))
                    .collect();
                dists.sort_by(|x, y| x.0.total_cmp(&y.0).then(x.1.cmp(&y.1)));
                dists.into_iter().take(k).map(|(_, b)| b).collect()
            })
            .collect()
    }

    /// Return the relevance function.
    #[must_use]
    pub fn relevance(&self) -> &RelevanceFunction {
        &self.relevance
    }

    /// Return the sampling method.
    #[must_use]
    pub fn method(&self) -> SamplingMethod {
        self.method
    }
}

impl Oversampler for Smoter {
    fn oversample(
        &self,
        rows: &LearningRows,
        rng: &mut ChaCha8Rng,
    ) -> Result<LearningRows, OversampleError> {
        let (rare, common): (Vec<usize>, Vec<usize>) = (0..rows.n_rows())
            .partition(|&i| self.relevance.phi(rows.target()[i]) >= self.rare_cutoff);
        if rare.len() < 2 {
            return Err(OversampleError::TooFewRare { n_rare: rare.len() });
        }
        if common.is_empty() {
            return Err(OversampleError::NoCommonRows);
        }
        if self.method == SamplingMethod::Extreme && rare.len() >= common.len() {
            debug!(n_rare = rare.len(), n_common = common.len(), "rare rows already dominate");
            return Ok(rows.clone().into_positional());
        }

        let (rare_target, common_target) = self.target_counts(rare.len(), common.len());
        let n_synthetic = rare_target - rare.len();
        debug!(
            n_rare = rare.len(),
            n_common = common.len(),
            n_synthetic,
            common_target,
            "oversampling plan"
        );

        let mut kept_common = common;
        kept_common.shuffle(rng);
        kept_common.truncate(common_target);
        kept_common.sort_unstable();

        let neighbours = self.neighbours(rows, &rare);
        let features = rows.features();
        let target = rows.target();

        let mut out_features = Vec::with_capacity(rare.len() + kept_common.len() + n_synthetic);
        let mut out_target = Vec::with_capacity(out_features.capacity());
        let mut original: Vec<usize> = rare.iter().chain(&kept_common).copied().collect();
        original.sort_unstable();
        for &i in &original {
            out_features.push(features[i].clone());
            out_target.push(target[i]);
        }

        for row in 0..n_synthetic {
            let a = rng.gen_range(0..rare.len());
            let b = neighbours[a][rng.gen_range(0..neighbours[a].len())];
            let (seed, nb) = (rare[a], rare[b]);
            let gap: f64 = rng.r#gen();
            let synthetic: Vec<f64> = features[seed]
                .iter()
                .zip(&features[nb])
                .map(|(&s, &n)| s + gap * (n - s))
                .collect();
            let d_seed = euclidean(&synthetic, &features[seed]);
            let d_nb = euclidean(&synthetic, &features[nb]);
            let y = if d_seed + d_nb == 0.0 {
                target[seed]
            } else {
                (d_nb * target[seed] + d_seed * target[nb]) / (d_seed + d_nb)
            };
            if !y.is_finite() || synthetic.iter().any(|v| !v.is_finite()) {
                return Err(OversampleError::NonFiniteSynthetic { row });
            }
            out_features.push(synthetic);
            out_target.push(y);
        }

        LearningRows::positional(out_features, out_target)
            .map_err(|e| OversampleError::Rejected(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use tcpm_metrics::{Extreme, Threshold};

    use super::*;

    fn high_relevance(c: f64) -> RelevanceFunction {
        RelevanceFunction::new(Threshold::Single(c), Extreme::High, 0.5, 1e-4).unwrap()
    }

    /// 8 common rows around 10 and 3 rare rows around 100.
    fn skewed() -> LearningRows {
        let mut features = Vec::new();
        let mut target = Vec::new();
        for i in 0..8 {
            features.push(vec![i as f64, 1.0]);
            target.push(10.0 + i as f64);
        }
        for (i, y) in [(20.0, 100.0), (21.0, 110.0), (23.0, 120.0)] {
            features.push(vec![i, 5.0]);
            target.push(y);
        }
        LearningRows::positional(features, target).unwrap()
    }

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn extreme_swaps_counts() {
        let smoter = SmoterConfig::new(high_relevance(50.0)).build().unwrap();
        let out = smoter.oversample(&skewed(), &mut rng()).unwrap();
        let relevance = high_relevance(50.0);
        let n_rare = out.target().iter().filter(|&&y| relevance.phi(y) >= 0.5).count();
        assert_eq!(n_rare, 8);
        assert_eq!(out.n_rows(), 8 + 3);
        assert_eq!(out.keys()[0], "0");
    }

    #[test]
    fn balance_meets_in_the_middle() {
        let smoter = SmoterConfig::new(high_relevance(50.0))
            .with_method(SamplingMethod::Balance)
            .build()
            .unwrap();
        let out = smoter.oversample(&skewed(), &mut rng()).unwrap();
        // (3 + 8) / 2 = 5 of each.
        assert_eq!(out.n_rows(), 10);
    }

    #[test]
    fn synthetic_targets_stay_between_parents() {
        let smoter = SmoterConfig::new(high_relevance(50.0)).build().unwrap();
        let out = smoter.oversample(&skewed(), &mut rng()).unwrap();
        for &y in &out.target()[6..] {
            assert!((100.0..=120.0).contains(&y), "synthetic target {y}");
        }
    }

    #[test]
    fn target_at_threshold_is_rare() {
        let smoter = SmoterConfig::new(high_relevance(50.0)).build().unwrap();
        let rows = LearningRows::positional(
            vec![vec![0.0], vec![1.0], vec![2.0], vec![3.0]],
            vec![10.0, 11.0, 12.0, 50.0],
        )
        .unwrap();
        // phi(50) == 0.5 clears the default cutoff.
        assert_eq!(
            smoter.oversample(&rows, &mut rng()).unwrap_err(),
            OversampleError::TooFewRare { n_rare: 1 }
        );
    }

    #[test]
    fn same_seed_same_output() {
        let smoter = SmoterConfig::new(high_relevance(50.0)).build().unwrap();
        let a = smoter.oversample(&skewed(), &mut rng()).unwrap();
        let b = smoter.oversample(&skewed(), &mut rng()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn single_rare_row_is_retryable_error() {
        let smoter = SmoterConfig::new(high_relevance(115.0)).build().unwrap();
        assert_eq!(
            smoter.oversample(&skewed(), &mut rng()).unwrap_err(),
            OversampleError::TooFewRare { n_rare: 1 }
        );
    }

    #[test]
    fn all_rare_is_error() {
        let smoter = SmoterConfig::new(high_relevance(1.0)).build().unwrap();
        assert_eq!(
            smoter.oversample(&skewed(), &mut rng()).unwrap_err(),
            OversampleError::NoCommonRows
        );
    }

    #[test]
    fn invalid_config_rejected() {
        let cfg = SmoterConfig::new(high_relevance(50.0));
        assert!(cfg.clone().with_k_neighbors(0).build().is_err());
        assert!(cfg.with_rare_cutoff(1.5).build().is_err());
    }
}

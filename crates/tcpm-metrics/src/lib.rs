//! Precision, recall and F-score for imbalanced regression.
//!
//! Implements the relevance-weighted generalisation of classification
//! precision/recall to continuous targets described by Torgo & Ribeiro
//! (2009): a sigmoid relevance function, a tolerance-based accuracy
//! indicator, and an immutable scorer safe to share across threads.
//! Pure math, zero I/O.

mod accuracy;
mod config;
mod engine;
mod error;
mod fold;
mod regression;
mod relevance;
mod select;

pub use accuracy::{AccuracyIndicator, AlphaMode};
pub use config::PrecisionRecallConfig;
pub use engine::{PrecisionRecallFscore, RegressionScores, f_beta};
pub use error::{MetricError, MetricErrorKind};
pub use fold::{FoldPredictions, FoldSummary, score_folds};
pub use regression::RegressionReport;
pub use relevance::{Extreme, RelevanceFunction, Threshold, compute_steepness};
pub use select::{best_candidate, compare_scores, rank_candidates};

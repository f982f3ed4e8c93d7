use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use tcpm_io::{
    ArtifactKind, ArtifactWriter, ExperimentName, LearningTableReader, PredictionReader,
    ScoreSettings, TargetPreset,
};
use tcpm_metrics::{
    Extreme, FoldSummary, PrecisionRecallConfig, RegressionReport, RegressionScores,
    RelevanceFunction, Threshold, score_folds,
};
use tcpm_sampling::{
    RareSide, ResampleConfig, SamplingMethod, SmoterConfig, StandardScaler, StratifiedSplitConfig,
    TargetBounds, normalize_rows,
};

#[derive(Parser)]
#[command(name = "tcpm")]
#[command(about = "Imbalanced-regression datasets and precision/recall scoring for challenge outcomes")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

/// Oversampler tuning for `build-dataset`.
#[derive(Args, Debug, Clone)]
struct ResampleArgs {
    /// Maximum oversampling attempts before giving up
    #[arg(long, default_value_t = 100)]
    max_attempts: usize,

    /// Rare neighbours considered per synthetic row
    #[arg(long, default_value_t = 5)]
    k_neighbors: usize,

    /// Rows with relevance at or above this value count as rare (ties at the threshold included)
    #[arg(long, default_value_t = 0.5)]
    rare_cutoff: f64,

    /// Oversampling method: "extreme" or "balance"
    #[arg(long, default_value = "extreme")]
    method: String,
}

/// Metric parameters for `score`. Unset fields fall back to the preset.
#[derive(Args, Debug, Clone)]
struct MetricArgs {
    /// Domain threshold (lower threshold when --extreme both)
    #[arg(long)]
    threshold: Option<f64>,

    /// Upper threshold, required with --extreme both
    #[arg(long)]
    upper_threshold: Option<f64>,

    /// Extreme side: "low", "high" or "both"
    #[arg(long)]
    extreme: Option<String>,

    /// Relevance cutoff tE in [0, 1]
    #[arg(long)]
    relevance_cutoff: Option<f64>,

    /// Loss tolerance tL (> 0)
    #[arg(long)]
    tolerance: Option<f64>,

    /// Sigmoid decay
    #[arg(long, default_value_t = 0.5)]
    decay: f64,

    /// Relevance reached at distance |threshold * decay|, in (0, 1)
    #[arg(long, default_value_t = 1e-4)]
    delta: f64,

    /// Smoothing sharpness k (>= 0)
    #[arg(long, default_value_t = 8.0)]
    smoothing: f64,

    /// Use the hard accuracy indicator instead of the smoothed one
    #[arg(long, default_value_t = false)]
    hard_alpha: bool,

    /// F-score beta in [0, 1]
    #[arg(long, default_value_t = 0.5)]
    beta: f64,
}

#[derive(Subcommand)]
enum Command {
    /// Split a learning table, scale it, and write original and resampled training sets
    BuildDataset {
        /// Path to the learning table CSV
        #[arg(long)]
        data: PathBuf,

        /// Name of the target column
        #[arg(long)]
        target: String,

        /// Number of entities in the test set
        #[arg(long)]
        test_size: usize,

        /// Experiment name for output files (must match [a-zA-Z0-9_-]+)
        #[arg(long)]
        experiment: String,

        /// Target preset: "avg-score", "number-of-registration" or "sub-reg-ratio"
        #[arg(long)]
        preset: Option<String>,

        /// Split threshold (overrides the preset)
        #[arg(long)]
        threshold: Option<f64>,

        /// Rare side: "low" or "high" (overrides the preset)
        #[arg(long)]
        rare_side: Option<String>,

        /// Inclusive lower clamp on resampled targets (overrides the preset)
        #[arg(long)]
        lower_bound: Option<f64>,

        /// Inclusive upper clamp on resampled targets (overrides the preset)
        #[arg(long)]
        upper_bound: Option<f64>,

        /// Rescale every feature row to unit L2 norm after standardization
        #[arg(long, default_value_t = false)]
        normalize: bool,

        /// Output directory for artifact files
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        resample: ResampleArgs,
    },

    /// Score predictions with precision, recall and F-score for regression
    Score {
        /// Path to the predictions CSV (entity_id,y_true,y_pred[,fold])
        #[arg(long)]
        predictions: PathBuf,

        /// Target preset supplying threshold, side, tolerance and cutoff
        #[arg(long)]
        preset: Option<String>,

        /// Experiment name; when set, the score is also written to a file
        #[arg(long)]
        experiment: Option<String>,

        /// Output directory for the score file
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,

        #[command(flatten)]
        metric: MetricArgs,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct BuildDatasetOutput {
    experiment: String,
    target: String,
    n_samples: usize,
    n_features: usize,
    n_train: usize,
    n_test: usize,
    minority_size: usize,
    majority_size: usize,
    minority_test_size: usize,
    majority_test_size: usize,
    resample_attempts: usize,
    n_resampled: usize,
    n_dropped: usize,
    artifacts: Vec<String>,
}

#[derive(Serialize)]
struct ScoreOutput {
    experiment: Option<String>,
    n_samples: usize,
    overall: RegressionScores,
    regression: RegressionReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    folds: Option<FoldOutput>,
}

#[derive(Serialize)]
struct FoldOutput {
    labels: Vec<String>,
    #[serde(flatten)]
    summary: FoldSummary,
}

fn parse_preset(s: Option<&str>) -> Result<Option<TargetPreset>> {
    s.map(|name| name.parse::<TargetPreset>().context("invalid --preset"))
        .transpose()
}

fn parse_rare_side(s: &str) -> Result<RareSide> {
    s.parse().map_err(anyhow::Error::msg)
}

fn parse_extreme(s: &str) -> Result<Extreme> {
    s.parse().map_err(anyhow::Error::msg)
}

fn parse_method(s: &str) -> Result<SamplingMethod> {
    match s {
        "extreme" => Ok(SamplingMethod::Extreme),
        "balance" => Ok(SamplingMethod::Balance),
        other => anyhow::bail!("unknown sampling method: {other} (expected extreme or balance)"),
    }
}

/// Take the explicit flag, else the preset's value, else fail naming the flag.
fn resolve<T>(flag: Option<T>, preset: Option<T>, name: &str) -> Result<T> {
    flag.or(preset)
        .with_context(|| format!("--{name} is required when no --preset is given"))
}

fn metric_config(preset: Option<TargetPreset>, args: &MetricArgs) -> Result<PrecisionRecallConfig> {
    let extreme = match args.extreme.as_deref() {
        Some(s) => Some(parse_extreme(s)?),
        None => None,
    };
    let extreme = resolve(extreme, preset.map(TargetPreset::extreme), "extreme")?;
    let low = resolve(args.threshold, preset.map(TargetPreset::threshold), "threshold")?;
    let threshold = if extreme == Extreme::Both {
        let high = args
            .upper_threshold
            .context("--upper-threshold is required with --extreme both")?;
        Threshold::Pair { low, high }
    } else {
        if args.upper_threshold.is_some() {
            warn!("--upper-threshold ignored for one-sided relevance");
        }
        Threshold::Single(low)
    };
    let cutoff = resolve(
        args.relevance_cutoff,
        preset.map(TargetPreset::relevance_cutoff),
        "relevance-cutoff",
    )?;
    let tolerance = resolve(args.tolerance, preset.map(TargetPreset::tolerance), "tolerance")?;

    Ok(PrecisionRecallConfig::new(cutoff, tolerance, threshold, extreme)
        .with_decay(args.decay)
        .with_delta(args.delta)
        .with_smoothing(args.smoothing)
        .with_smoother(!args.hard_alpha)
        .with_beta(args.beta))
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::BuildDataset {
            data,
            target,
            test_size,
            experiment,
            preset,
            threshold,
            rare_side,
            lower_bound,
            upper_bound,
            normalize,
            output_dir,
            resample,
        } => {
            let experiment_name = ExperimentName::new(experiment.clone())?;
            let preset = parse_preset(preset.as_deref())?;
            let rare_side = rare_side.as_deref().map(parse_rare_side).transpose()?;
            let threshold = resolve(threshold, preset.map(TargetPreset::threshold), "threshold")?;
            let rare_side = resolve(rare_side, preset.map(TargetPreset::rare_side), "rare-side")?;
            let (preset_lower, preset_upper) = preset.map_or((None, None), TargetPreset::clamp);
            let bounds = TargetBounds::new(lower_bound.or(preset_lower), upper_bound.or(preset_upper))
                .context("invalid clamp bounds")?;
            let method = parse_method(&resample.method)?;

            // 1. Read learning table
            let table = LearningTableReader::new(&data, &target)
                .read()
                .context("failed to read learning table CSV")?;
            let series = table.target_series().context("invalid target column")?;

            // 2. Stratified split
            let split = StratifiedSplitConfig::new(threshold, rare_side, test_size)?
                .with_seed(cli.seed)
                .split(&series)
                .context("stratified split failed")?;

            // 3. Scale on the training partition only
            let train = table.rows().select(&split.train);
            let test = table.rows().select(&split.test);
            let scaler = StandardScaler::fit(&train).context("failed to fit scaler")?;
            let mut train = scaler.transform(&train)?;
            let mut test = scaler.transform(&test)?;
            if normalize {
                train = normalize_rows(&train)?;
                test = normalize_rows(&test)?;
                info!("rows normalized to unit length");
            }

            // 4. Write test and original-train artifacts
            let writer = ArtifactWriter::new(&output_dir, experiment_name)?;
            let mut artifacts = vec![
                writer.write_rows(ArtifactKind::Test, &test)?,
                writer.write_rows(ArtifactKind::TrainOriginal, &train)?,
            ];

            // 5. Resample with bounded retry, clamp, write
            let relevance = RelevanceFunction::new(
                Threshold::Single(threshold),
                rare_side.into(),
                0.5,
                1e-4,
            )
            .context("cannot build relevance function for this threshold")?;
            let smoter = SmoterConfig::new(relevance)
                .with_rare_cutoff(resample.rare_cutoff)
                .with_k_neighbors(resample.k_neighbors)
                .with_method(method)
                .build()?;
            let outcome = ResampleConfig::new(resample.max_attempts)?
                .with_bounds(bounds)
                .with_seed(cli.seed)
                .run(&smoter, &train)
                .context("resampling failed")?;
            artifacts.push(writer.write_rows(ArtifactKind::TrainResample, &outcome.rows)?);

            // 6. Print summary
            let output = BuildDatasetOutput {
                experiment,
                target: table.target_name().to_string(),
                n_samples: table.n_samples(),
                n_features: table.feature_names().len(),
                n_train: split.train.len(),
                n_test: split.test.len(),
                minority_size: split.minority_size,
                majority_size: split.majority_size,
                minority_test_size: split.minority_test_size,
                majority_test_size: split.majority_test_size,
                resample_attempts: outcome.attempts,
                n_resampled: outcome.rows.n_rows(),
                n_dropped: outcome.n_dropped,
                artifacts: artifacts.iter().map(|p| p.display().to_string()).collect(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Score {
            predictions,
            preset,
            experiment,
            output_dir,
            metric,
        } => {
            let preset = parse_preset(preset.as_deref())?;
            let config = metric_config(preset, &metric)?;
            let engine = config.build().context("invalid metric configuration")?;

            // 1. Read predictions
            let set = PredictionReader::new(&predictions)
                .read()
                .context("failed to read predictions CSV")?;

            // 2. Overall scores
            let overall = engine.evaluate(&set.y_true, &set.y_pred)?;
            let regression = RegressionReport::from_predictions(&set.y_true, &set.y_pred)?;
            if !overall.is_defined() {
                warn!("precision or recall undefined: no value cleared the relevance cutoff");
            }
            info!(
                precision = overall.precision,
                recall = overall.recall,
                fscore = overall.fscore,
                "overall scores"
            );

            // 3. Per-fold scores
            let folds = match set.by_fold() {
                Some(by_fold) => {
                    let (labels, folds): (Vec<String>, Vec<_>) = by_fold.into_iter().unzip();
                    let summary = score_folds(&engine, &folds).context("fold scoring failed")?;
                    Some(FoldOutput { labels, summary })
                }
                None => None,
            };

            // 4. Optional score artifact
            if let Some(name) = &experiment {
                let writer = ArtifactWriter::new(&output_dir, ExperimentName::new(name.as_str())?)?;
                let thresholds = match config.threshold() {
                    Threshold::Single(c) => vec![c],
                    Threshold::Pair { low, high } => vec![low, high],
                };
                let settings = ScoreSettings {
                    preset: preset.map(|p| p.name().to_string()),
                    thresholds,
                    extreme: config.extreme().to_string(),
                    relevance_cutoff: config.relevance_cutoff(),
                    tolerance: config.tolerance(),
                    beta: config.beta(),
                    smoothed: config.use_smoother(),
                };
                writer.write_score(
                    &settings,
                    &overall,
                    &regression,
                    folds.as_ref().map(|f| (f.labels.as_slice(), &f.summary)),
                )?;
            }

            // 5. Print summary
            let output = ScoreOutput {
                experiment,
                n_samples: set.len(),
                overall,
                regression,
                folds,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(())
}

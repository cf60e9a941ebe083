//! clr-sweep CLI Module
//!
//! Command-line interface: load a dataset, preprocess it, build the
//! configuration grid and hand it to the evaluation engine.

use clap::Parser;
use colored::*;
use std::path::PathBuf;
use std::time::Instant;

use crate::config::SweepConfig;
use crate::datasets::{Dataset, DatasetLoader, FileDatasetLoader};
use crate::dispatch::{results_destination, Dispatcher};
use crate::error::SweepError;
use crate::evaluation::CrossValidationEngine;
use crate::grid::{default_families, ConfigurationRegistry, SweepData};
use crate::preprocessing::Preprocessor;
use crate::random::RandomSource;

/// Seed stream of the fold assignment
const EVALUATION_STREAM: u64 = 0xE7A1;

// ─── Styling helpers ───────────────────────────────────────────────────────────

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn kv(key: &str, val: &str) {
    println!("  {:<16} {}", muted(key), val.white());
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "clr-sweep")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Hyperparameter sweep over linear, kernel, forest and clusterwise regressors")]
#[command(long_about = None)]
pub struct Cli {
    /// Dataset to sweep (boston, abalone)
    #[arg(long)]
    pub dataset: String,

    /// Seed for the row permutation and every estimator [default: 0]
    #[arg(long)]
    pub seed: Option<u64>,

    /// Directory holding the dataset files [default: data]
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Directory the results CSV is written to [default: results]
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Number of cross-validation folds [default: 5]
    #[arg(long)]
    pub cv_folds: Option<usize>,

    /// Members per bagged ensemble [default: 10]
    #[arg(long)]
    pub ensemble_size: Option<usize>,

    /// Trees per random forest [default: 100]
    #[arg(long)]
    pub forest_size: Option<usize>,

    /// JSON configuration file; flags override its values
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Worker threads for evaluation
    #[arg(long)]
    pub n_jobs: Option<usize>,

    /// Build the grid and list its keys without evaluating
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Merge the optional config file with the command-line flags
    pub fn to_config(&self) -> crate::error::Result<SweepConfig> {
        let mut config = match &self.config {
            Some(path) => SweepConfig::from_json_file(path)?,
            None => SweepConfig::default(),
        };
        config.dataset = self.dataset.clone();
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
        if let Some(folds) = self.cv_folds {
            config.cv_folds = folds;
        }
        if let Some(n) = self.ensemble_size {
            config.ensemble_size = n;
        }
        if let Some(n) = self.forest_size {
            config.forest_size = n;
        }
        if self.n_jobs.is_some() {
            config.n_jobs = self.n_jobs;
        }
        config.validate()?;
        Ok(config)
    }
}

// ─── Commands ──────────────────────────────────────────────────────────────────

/// Run one sweep. An unsupported dataset is reported and is not an error.
pub fn run(cli: Cli) -> anyhow::Result<()> {
    let dataset = match cli.dataset.parse::<Dataset>() {
        Ok(dataset) => dataset,
        Err(SweepError::UnsupportedDataset(_)) => {
            println!("Dataset is not supported");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let config = cli.to_config()?;

    section(&format!("Sweep {}", dataset.name()));
    kv("Seed", &config.seed.to_string());
    kv("Folds", &config.cv_folds.to_string());

    step_run("Loading data");
    let start = Instant::now();
    let loader = FileDatasetLoader::new(&config.data_dir);
    let raw = loader.load(dataset)?;
    step_done(&format!(
        "{} rows × {} cols in {:?}",
        raw.descriptor.n_samples,
        raw.descriptor.n_features,
        start.elapsed()
    ));

    step_run("Preprocessing");
    let mut rng = RandomSource::new(config.seed);
    let preprocessor = Preprocessor::with_config(config.preprocessing());
    let descriptor = raw.descriptor.clone();
    let processed = preprocessor.run(raw.x, raw.y, &mut rng)?;
    step_done("scaled to [-1, 1]");

    step_run("Building configuration grid");
    let registry = ConfigurationRegistry::new(default_families(&config, &descriptor))
        .with_random_source(&rng);
    let set = registry.build(SweepData::new(processed.x, processed.y)?)?;
    step_done(&format!("{} configurations", set.len()));

    if cli.dry_run {
        section("Configurations");
        for (family, count) in set.family_counts() {
            kv(family, &count.to_string());
        }
        println!();
        for key in set.keys() {
            println!("  {}", key);
        }
        println!();
        return Ok(());
    }

    let destination = results_destination(&config.results_dir, dataset);
    step_run(&format!("Evaluating → {}", destination.display()));
    let start = Instant::now();
    let engine = CrossValidationEngine::new(config.cv_folds)
        .with_seed(rng.derive_seed(EVALUATION_STREAM))
        .with_n_jobs(config.n_jobs);
    let report = Dispatcher::new(engine).dispatch(&set, &destination)?;
    step_done(&format!("{:?}", start.elapsed()));

    println!();
    if let Some(best) = report.best() {
        kv("Best", &best.key.cyan().to_string());
        if let Some(test) = best.test {
            kv("Test MSE", &format!("{:.4}", test.mse));
            kv("Test R²", &format!("{:.4}", test.r2));
        }
    }
    if report.n_failed() > 0 {
        kv("Failed", &report.n_failed().to_string().yellow().to_string());
    }
    println!();

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_dataset_is_clean() {
        let cli = Cli::try_parse_from(["clr-sweep", "--dataset", "mnist"]).unwrap();
        assert!(run(cli).is_ok());
    }

    #[test]
    fn test_dataset_is_required() {
        assert!(Cli::try_parse_from(["clr-sweep"]).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = Cli::try_parse_from([
            "clr-sweep",
            "--dataset",
            "boston",
            "--seed",
            "3",
            "--cv-folds",
            "4",
            "--ensemble-size",
            "2",
        ])
        .unwrap();
        let config = cli.to_config().unwrap();
        assert_eq!(config.dataset, "boston");
        assert_eq!(config.seed, 3);
        assert_eq!(config.cv_folds, 4);
        assert_eq!(config.ensemble_size, 2);
        assert_eq!(config.forest_size, 100);
    }

    #[test]
    fn test_invalid_flags_rejected() {
        let cli = Cli::try_parse_from(["clr-sweep", "--dataset", "boston", "--cv-folds", "1"]).unwrap();
        assert!(matches!(cli.to_config(), Err(SweepError::ConfigError(_))));
    }

    #[test]
    fn test_missing_data_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let cli = Cli::try_parse_from([
            "clr-sweep",
            "--dataset",
            "abalone",
            "--data-dir",
            dir.path().to_str().unwrap(),
        ])
        .unwrap();
        assert!(run(cli).is_err());
    }
}

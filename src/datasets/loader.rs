//! Dataset loading from the data directory

use super::{Dataset, RawDataset};
use crate::error::{Result, SweepError};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::info;

/// Number of equally spaced edges used to bin abalone height
const HEIGHT_BIN_EDGES: usize = 10;
const HEIGHT_BIN_MAX: f64 = 0.3;

/// Sex codes in the order their one-hot columns are emitted
const ABALONE_SEX_CODES: [&str; 3] = ["F", "I", "M"];

/// Source of raw datasets
pub trait DatasetLoader {
    /// Load features, target and descriptor for `dataset`
    fn load(&self, dataset: Dataset) -> Result<RawDataset>;
}

/// Loads datasets from CSV files in a data directory
///
/// - `boston.csv`: header row, last column is the target
/// - `abalone.data`: no header, sex code, seven measurements, ring count
#[derive(Debug, Clone)]
pub struct FileDatasetLoader {
    data_dir: PathBuf,
}

impl FileDatasetLoader {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Path of the file backing `dataset`
    pub fn path_for(&self, dataset: Dataset) -> PathBuf {
        match dataset {
            Dataset::Boston => self.data_dir.join("boston.csv"),
            Dataset::Abalone => self.data_dir.join("abalone.data"),
        }
    }

    fn read_csv(path: &Path, has_header: bool) -> Result<DataFrame> {
        if !path.exists() {
            return Err(SweepError::DataError(format!(
                "dataset file not found: {}",
                path.display()
            )));
        }
        let df = CsvReadOptions::default()
            .with_has_header(has_header)
            .with_infer_schema_length(Some(1000))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;
        Ok(df)
    }

    fn load_boston(&self) -> Result<RawDataset> {
        let df = Self::read_csv(&self.path_for(Dataset::Boston), true)?;
        if df.width() < 2 {
            return Err(SweepError::DataError(
                "boston.csv needs at least one feature and a target column".to_string(),
            ));
        }

        let n_features = df.width() - 1;
        let columns = (0..n_features)
            .map(|j| numeric_column(&df, j))
            .collect::<Result<Vec<_>>>()?;
        let x = stack_columns(&columns, df.height())?;
        let y = Array1::from_vec(numeric_column(&df, n_features)?);

        RawDataset::new(Dataset::Boston, x, y)
    }

    fn load_abalone(&self) -> Result<RawDataset> {
        let df = Self::read_csv(&self.path_for(Dataset::Abalone), false)?;
        if df.width() != 9 {
            return Err(SweepError::DataError(format!(
                "abalone.data should have 9 columns, found {}",
                df.width()
            )));
        }

        let mut columns = (1..8)
            .map(|j| numeric_column(&df, j))
            .collect::<Result<Vec<_>>>()?;
        columns.extend(one_hot(&string_column(&df, 0)?, &ABALONE_SEX_CODES)?);

        let edges = linspace(0.0, HEIGHT_BIN_MAX, HEIGHT_BIN_EDGES);
        let height_bins: Vec<f64> = columns[2].iter().map(|&v| digitize(v, &edges)).collect();
        columns.push(height_bins);

        let x = stack_columns(&columns, df.height())?;
        let y = Array1::from_vec(numeric_column(&df, 8)?);

        RawDataset::new(Dataset::Abalone, x, y)
    }
}

impl DatasetLoader for FileDatasetLoader {
    fn load(&self, dataset: Dataset) -> Result<RawDataset> {
        let raw = match dataset {
            Dataset::Boston => self.load_boston()?,
            Dataset::Abalone => self.load_abalone()?,
        };
        info!(
            dataset = %dataset,
            samples = raw.descriptor.n_samples,
            features = raw.descriptor.n_features,
            "Loaded dataset"
        );
        Ok(raw)
    }
}

fn numeric_column(df: &DataFrame, idx: usize) -> Result<Vec<f64>> {
    let series = df.get_columns()[idx].as_materialized_series();
    let casted = series.cast(&DataType::Float64)?;
    casted
        .f64()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                SweepError::DataError(format!("missing value in column {} at row {}", idx, row))
            })
        })
        .collect()
}

fn string_column(df: &DataFrame, idx: usize) -> Result<Vec<String>> {
    let series = df.get_columns()[idx].as_materialized_series();
    series
        .str()?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.map(|s| s.trim().to_string()).ok_or_else(|| {
                SweepError::DataError(format!("missing value in column {} at row {}", idx, row))
            })
        })
        .collect()
}

/// One indicator column per code, in the given order
fn one_hot(values: &[String], codes: &[&str]) -> Result<Vec<Vec<f64>>> {
    if let Some(unknown) = values.iter().find(|v| !codes.contains(&v.as_str())) {
        return Err(SweepError::DataError(format!("unknown category '{}'", unknown)));
    }
    Ok(codes
        .iter()
        .map(|code| {
            values
                .iter()
                .map(|v| if v == code { 1.0 } else { 0.0 })
                .collect()
        })
        .collect())
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Bin index of `value` for increasing `edges`: the number of edges `<= value`
fn digitize(value: f64, edges: &[f64]) -> f64 {
    edges.iter().filter(|&&e| e <= value).count() as f64
}

fn stack_columns(columns: &[Vec<f64>], n_rows: usize) -> Result<Array2<f64>> {
    let n_cols = columns.len();
    let mut x = Array2::zeros((n_rows, n_cols));
    for (j, column) in columns.iter().enumerate() {
        if column.len() != n_rows {
            return Err(SweepError::ShapeError {
                expected: format!("{} rows", n_rows),
                actual: format!("{} rows in column {}", column.len(), j),
            });
        }
        for (i, &v) in column.iter().enumerate() {
            x[[i, j]] = v;
        }
    }
    Ok(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digitize_matches_edge_count() {
        let edges = linspace(0.0, 0.3, 10);
        assert_eq!(digitize(-0.01, &edges), 0.0);
        assert_eq!(digitize(0.0, &edges), 1.0);
        assert_eq!(digitize(0.05, &edges), 2.0);
        assert_eq!(digitize(0.3, &edges), 10.0);
        assert_eq!(digitize(1.13, &edges), 10.0);
    }

    #[test]
    fn test_linspace_endpoints() {
        let edges = linspace(0.0, 0.3, 10);
        assert_eq!(edges.len(), 10);
        assert_eq!(edges[0], 0.0);
        assert!((edges[9] - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_one_hot_sorted_codes() {
        let values: Vec<String> = ["M", "F", "I", "M"].iter().map(|s| s.to_string()).collect();
        let cols = one_hot(&values, &ABALONE_SEX_CODES).unwrap();
        assert_eq!(cols[0], vec![0.0, 1.0, 0.0, 0.0]);
        assert_eq!(cols[1], vec![0.0, 0.0, 1.0, 0.0]);
        assert_eq!(cols[2], vec![1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_one_hot_rejects_unknown() {
        let values = vec!["X".to_string()];
        assert!(one_hot(&values, &ABALONE_SEX_CODES).is_err());
    }

    #[test]
    fn test_missing_file() {
        let loader = FileDatasetLoader::new("/nonexistent/data");
        let err = loader.load(Dataset::Boston).unwrap_err();
        assert!(matches!(err, SweepError::DataError(_)));
    }
}

//! Exploratory summary of the engineered table: describe-style statistics,
//! missing-value shares and the numeric correlation matrix.

use crate::error::Result;
use crate::utils::{column_f64, is_numeric_dtype};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

pub const REPORT_FILE: &str = "eda_report.json";
pub const CORRELATION_FILE: &str = "correlation_matrix.csv";

/// Describe-style statistics of one numeric column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub count: usize,
    pub mean: Option<f64>,
    /// Sample standard deviation.
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q25: Option<f64>,
    pub median: Option<f64>,
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MissingShare {
    pub column: String,
    pub percent: f64,
}

/// Pearson correlations over pairwise-complete rows. `None` where undefined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdaSummary {
    pub rows: usize,
    pub columns: usize,
    pub numeric: Vec<ColumnStats>,
    /// Sorted by share, highest first.
    pub missing: Vec<MissingShare>,
    /// Only computed when the target column is numeric.
    pub correlation: Option<CorrelationMatrix>,
}

impl EdaSummary {
    pub fn from_frame(df: &DataFrame, target_column: &str) -> Result<Self> {
        let height = df.height();

        let mut numeric_names = Vec::new();
        let mut numeric_values = Vec::new();
        let mut missing = Vec::new();

        for col in df.get_columns() {
            let name = col.name().to_string();
            let percent = if height == 0 {
                0.0
            } else {
                col.null_count() as f64 / height as f64 * 100.0
            };
            if is_numeric_dtype(col.dtype()) {
                numeric_values.push(column_f64(df, &name)?);
                numeric_names.push(name.clone());
            }
            missing.push(MissingShare {
                column: name,
                percent,
            });
        }
        missing.sort_by(|a, b| b.percent.total_cmp(&a.percent));

        let numeric = numeric_names
            .iter()
            .zip(&numeric_values)
            .map(|(name, values)| describe(name, values))
            .collect();

        let correlation = numeric_names
            .iter()
            .any(|n| n == target_column)
            .then(|| correlation_matrix(&numeric_names, &numeric_values));

        Ok(Self {
            rows: height,
            columns: df.width(),
            numeric,
            missing,
            correlation,
        })
    }

    /// Plain-text rendering for terminal output.
    pub fn render_table(&self, max_missing: usize) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Shape: {} rows x {} columns", self.rows, self.columns);
        let _ = writeln!(
            out,
            "{:<24} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
            "column", "count", "mean", "std", "min", "25%", "50%", "75%", "max"
        );
        for stats in &self.numeric {
            let _ = writeln!(
                out,
                "{:<24} {:>7} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12} {:>12}",
                truncate(&stats.name, 24),
                stats.count,
                fmt_stat(stats.mean),
                fmt_stat(stats.std),
                fmt_stat(stats.min),
                fmt_stat(stats.q25),
                fmt_stat(stats.median),
                fmt_stat(stats.q75),
                fmt_stat(stats.max),
            );
        }

        let _ = writeln!(out, "\nMissing values percent:");
        for share in self.missing.iter().take(max_missing) {
            let _ = writeln!(out, "  {:<24} {:>6.2}%", truncate(&share.column, 24), share.percent);
        }
        out
    }

    /// Write the summary as `eda_report.json`, and the correlation matrix as
    /// `correlation_matrix.csv` when one was computed.
    pub fn write_reports(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        fs::create_dir_all(dir)?;
        let mut written = Vec::new();

        let report_path = dir.join(REPORT_FILE);
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(self)?.as_bytes())?;
        info!("Report saved: {}", report_path.display());
        written.push(report_path);

        if let Some(matrix) = &self.correlation {
            let csv_path = dir.join(CORRELATION_FILE);
            fs::write(&csv_path, matrix.to_csv())?;
            info!("Correlation matrix saved: {}", csv_path.display());
            written.push(csv_path);
        }

        Ok(written)
    }
}

impl CorrelationMatrix {
    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.columns.iter().position(|c| c == a)?;
        let j = self.columns.iter().position(|c| c == b)?;
        self.values[i][j]
    }

    pub fn to_csv(&self) -> String {
        let mut out = format!(",{}\n", self.columns.join(","));
        for (name, row) in self.columns.iter().zip(&self.values) {
            out.push_str(name);
            for value in row {
                out.push(',');
                if let Some(v) = value {
                    let _ = write!(out, "{:.6}", v);
                }
            }
            out.push('\n');
        }
        out
    }
}

fn describe(name: &str, values: &[Option<f64>]) -> ColumnStats {
    let mut observed: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|v| v.is_finite())
        .collect();
    observed.sort_by(f64::total_cmp);

    let count = observed.len();
    let mean = (count > 0).then(|| observed.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|m| {
        (observed.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (count - 1) as f64).sqrt()
    });

    ColumnStats {
        name: name.to_string(),
        count,
        mean,
        std,
        min: observed.first().copied(),
        q25: quantile(&observed, 0.25),
        median: quantile(&observed, 0.5),
        q75: quantile(&observed, 0.75),
        max: observed.last().copied(),
    }
}

/// Linear-interpolation quantile of sorted values.
fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

fn correlation_matrix(names: &[String], values: &[Vec<Option<f64>>]) -> CorrelationMatrix {
    let k = names.len();
    let mut matrix = vec![vec![None; k]; k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&values[i], &values[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }
    CorrelationMatrix {
        columns: names.to_vec(),
        values: matrix,
    }
}

fn pearson(a: &[Option<f64>], b: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = a
        .iter()
        .zip(b)
        .filter_map(|(x, y)| Some((x.filter(|v| v.is_finite())?, y.filter(|v| v.is_finite())?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        sxy += (x - mean_x) * (y - mean_y);
        sxx += (x - mean_x).powi(2);
        syy += (y - mean_y).powi(2);
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

fn fmt_stat(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max - 1).collect();
        format!("{}~", cut)
    }
}

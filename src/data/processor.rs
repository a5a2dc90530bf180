//! Data Processor Module
//! Column classification, null accounting, value counts and the overview report.

use crate::stats::{NumericSummary, StatsCalculator};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use std::collections::HashMap;
use thiserror::Error;

/// Categorical columns with value counts in the overview.
const MAX_CATEGORICAL_COLUMNS: usize = 10;
/// Values listed per categorical column.
const TOP_VALUES: usize = 10;
/// Leading values sampled when sniffing datetime columns.
const DATETIME_SAMPLE: usize = 100;
/// Table cells are cut to this many characters.
pub const CELL_MAX_CHARS: usize = 50;

const DATE_FORMATS: [&str; 4] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
];

#[derive(Error, Debug)]
pub enum ProcessorError {
    #[error("Polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("Column not found: {0}")]
    MissingColumn(String),
}

/// Everything the overview panel shows about a DataFrame.
#[derive(Debug, Clone, Default)]
pub struct DataInfo {
    pub rows: usize,
    pub columns: Vec<String>,
    pub dtypes: Vec<(String, String)>,
    pub null_counts: Vec<(String, usize)>,
    pub null_percentages: HashMap<String, f64>,
    pub numeric_columns: Vec<String>,
    pub categorical_columns: Vec<String>,
    pub datetime_columns: Vec<String>,
    pub numeric_stats: HashMap<String, NumericSummary>,
    pub categorical_counts: Vec<(String, Vec<(String, usize)>)>,
}

impl DataInfo {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns.len())
    }
}

fn is_numeric(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Float32
            | DataType::Float64
            | DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
    )
}

fn looks_like_datetime(text: &str) -> bool {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text).is_ok()
        || DATETIME_FORMATS
            .iter()
            .any(|fmt| NaiveDateTime::parse_from_str(text, fmt).is_ok())
        || DATE_FORMATS
            .iter()
            .any(|fmt| NaiveDate::parse_from_str(text, fmt).is_ok())
}

/// Display text for a single value; nulls render as empty.
pub fn any_value_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::String(s) => s.to_string(),
        AnyValue::StringOwned(s) => s.to_string(),
        other => other.to_string(),
    }
}

/// Truncate text to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}

/// Handles data inspection and summary operations.
pub struct DataProcessor;

impl DataProcessor {
    /// Detect columns that contain numeric data.
    pub fn detect_numeric_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| is_numeric(col.dtype()))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Detect columns that contain categorical (text) data.
    pub fn detect_categorical_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| matches!(col.dtype(), DataType::String | DataType::Categorical(_, _)))
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Detect text columns whose leading values all parse as dates.
    pub fn detect_datetime_columns(df: &DataFrame) -> Vec<String> {
        df.get_columns()
            .iter()
            .filter(|col| col.dtype() == &DataType::String)
            .filter(|col| {
                let Ok(ca) = col.str() else {
                    return false;
                };
                let sample: Vec<&str> = ca.into_iter().flatten().take(DATETIME_SAMPLE).collect();
                !sample.is_empty() && sample.iter().all(|v| looks_like_datetime(v))
            })
            .map(|col| col.name().to_string())
            .collect()
    }

    /// Count occurrences of each non-null value, most frequent first.
    pub fn value_counts(
        df: &DataFrame,
        column: &str,
        limit: usize,
    ) -> Result<Vec<(String, usize)>, ProcessorError> {
        let col = df
            .column(column)
            .map_err(|_| ProcessorError::MissingColumn(column.to_string()))?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for i in 0..col.len() {
            let value = col.get(i)?;
            if value.is_null() {
                continue;
            }
            *counts.entry(any_value_text(&value)).or_default() += 1;
        }

        let mut counts: Vec<(String, usize)> = counts.into_iter().collect();
        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(limit);
        Ok(counts)
    }

    /// Pearson correlation matrix for numeric columns.
    ///
    /// Returns the column names and a row-major matrix; empty when fewer
    /// than two numeric columns exist.
    pub fn correlation_matrix(df: &DataFrame) -> (Vec<String>, Vec<Vec<f64>>) {
        let numeric = Self::detect_numeric_columns(df);
        if numeric.len() < 2 {
            return (Vec::new(), Vec::new());
        }

        let series: Vec<Vec<Option<f64>>> = numeric
            .iter()
            .map(|name| StatsCalculator::column_options(df, name))
            .collect();

        let matrix = series
            .iter()
            .map(|a| {
                series
                    .iter()
                    .map(|b| {
                        let (xs, ys): (Vec<f64>, Vec<f64>) = a
                            .iter()
                            .zip(b.iter())
                            .filter_map(|(x, y)| match (x, y) {
                                (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some((*x, *y)),
                                _ => None,
                            })
                            .unzip();
                        StatsCalculator::pearson(&xs, &ys)
                    })
                    .collect()
            })
            .collect();

        (numeric, matrix)
    }

    /// Get comprehensive information about a DataFrame.
    pub fn dataframe_info(df: &DataFrame) -> DataInfo {
        let rows = df.height();
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let dtypes = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.dtype().to_string()))
            .collect();

        let null_counts: Vec<(String, usize)> = df
            .get_columns()
            .iter()
            .map(|c| (c.name().to_string(), c.null_count()))
            .collect();

        let null_percentages = null_counts
            .iter()
            .map(|(name, count)| {
                let pct = if rows == 0 {
                    0.0
                } else {
                    *count as f64 / rows as f64 * 100.0
                };
                (name.clone(), pct)
            })
            .collect();

        let numeric_columns = Self::detect_numeric_columns(df);
        let categorical_columns = Self::detect_categorical_columns(df);
        let datetime_columns = Self::detect_datetime_columns(df);
        let numeric_stats = StatsCalculator::describe_columns_parallel(df, &numeric_columns);

        let categorical_counts = categorical_columns
            .iter()
            .take(MAX_CATEGORICAL_COLUMNS)
            .filter_map(|name| {
                Self::value_counts(df, name, TOP_VALUES)
                    .ok()
                    .map(|counts| (name.clone(), counts))
            })
            .collect();

        DataInfo {
            rows,
            columns,
            dtypes,
            null_counts,
            null_percentages,
            numeric_columns,
            categorical_columns,
            datetime_columns,
            numeric_stats,
            categorical_counts,
        }
    }

    /// Render the overview report shown in the Overview panel.
    pub fn render_overview(info: &DataInfo) -> String {
        let mut lines = vec![
            "DATA OVERVIEW".to_string(),
            "=".repeat(80),
            String::new(),
            format!(
                "SHAPE: {} rows × {} columns",
                format_thousands(info.rows as u64),
                format_thousands(info.columns.len() as u64)
            ),
            String::new(),
            format!("COLUMNS ({}):", info.columns.len()),
            info.columns.join(", "),
            String::new(),
            "DATA TYPES:".to_string(),
        ];
        for (col, dtype) in &info.dtypes {
            lines.push(format!("  {}: {}", col, dtype));
        }

        if !info.datetime_columns.is_empty() {
            lines.push(String::new());
            lines.push(format!("DATE COLUMNS: {}", info.datetime_columns.join(", ")));
        }

        lines.push(String::new());
        lines.push("NULL VALUES:".to_string());
        for (col, count) in &info.null_counts {
            if *count > 0 {
                let pct = info.null_percentages.get(col).copied().unwrap_or(0.0);
                lines.push(format!(
                    "  {}: {} ({:.2}%)",
                    col,
                    format_thousands(*count as u64),
                    pct
                ));
            }
        }

        if !info.numeric_stats.is_empty() {
            lines.push(String::new());
            lines.push("NUMERIC STATISTICS:".to_string());
            for col in &info.numeric_columns {
                if let Some(stats) = info.numeric_stats.get(col) {
                    lines.push(String::new());
                    lines.push(format!("  {}:", col));
                    lines.push(format!("    Mean: {:.2}", stats.mean));
                    lines.push(format!("    Std: {:.2}", stats.std));
                    lines.push(format!("    Min: {:.2}", stats.min));
                    lines.push(format!("    Max: {:.2}", stats.max));
                }
            }
        }

        if !info.categorical_counts.is_empty() {
            lines.push(String::new());
            lines.push("CATEGORICAL VALUE COUNTS (Top 10):".to_string());
            for (col, counts) in &info.categorical_counts {
                lines.push(String::new());
                lines.push(format!("  {}:", col));
                for (value, count) in counts {
                    lines.push(format!("    {}: {}", value, format_thousands(*count as u64)));
                }
            }
        }

        lines.push(String::new());
        lines.join("\n")
    }

    /// Display text of one cell, truncated for the table view.
    pub fn cell_text(df: &DataFrame, row: usize, column: usize) -> String {
        df.get_columns()
            .get(column)
            .and_then(|col| col.get(row).ok())
            .map(|v| truncate_chars(&any_value_text(&v), CELL_MAX_CHARS))
            .unwrap_or_default()
    }

    /// Row indices whose cells contain `term` (case-insensitive), capped at `limit`.
    pub fn search_rows(df: &DataFrame, term: &str, limit: usize) -> Vec<usize> {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return (0..df.height().min(limit)).collect();
        }

        (0..df.height())
            .filter(|&row| {
                df.get_columns().iter().any(|col| {
                    col.get(row)
                        .map(|v| any_value_text(&v).to_lowercase().contains(&term))
                        .unwrap_or(false)
                })
            })
            .take(limit)
            .collect()
    }
}

/// Format an integer with comma thousands separators.
pub fn format_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> DataFrame {
        DataFrame::new(vec![
            Column::new("city".into(), vec![Some("Oslo"), Some("Rome"), Some("Oslo"), None]),
            Column::new("temp".into(), vec![Some(1.0), Some(20.0), Some(3.0), Some(4.0)]),
            Column::new("visits".into(), vec![Some(2i64), Some(4), None, Some(8)]),
            Column::new(
                "seen".into(),
                vec![Some("2024-01-02"), Some("2024-02-03"), None, Some("2024-03-04")],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn classifies_columns() {
        let df = sample();
        assert_eq!(DataProcessor::detect_numeric_columns(&df), vec!["temp", "visits"]);
        assert_eq!(
            DataProcessor::detect_categorical_columns(&df),
            vec!["city", "seen"]
        );
        assert_eq!(DataProcessor::detect_datetime_columns(&df), vec!["seen"]);
    }

    #[test]
    fn info_counts_nulls() {
        let info = DataProcessor::dataframe_info(&sample());
        assert_eq!(info.shape(), (4, 4));
        assert!(info.null_counts.contains(&("city".to_string(), 1)));
        assert_eq!(info.null_percentages["visits"], 25.0);
        assert_eq!(info.numeric_stats["visits"].count, 3);
    }

    #[test]
    fn value_counts_order_by_frequency_then_value() {
        let counts = DataProcessor::value_counts(&sample(), "city", 10).unwrap();
        assert_eq!(
            counts,
            vec![("Oslo".to_string(), 2), ("Rome".to_string(), 1)]
        );
        assert!(DataProcessor::value_counts(&sample(), "nope", 10).is_err());
    }

    #[test]
    fn correlation_needs_two_numeric_columns() {
        let (names, matrix) = DataProcessor::correlation_matrix(&sample());
        assert_eq!(names, vec!["temp", "visits"]);
        assert!((matrix[0][0] - 1.0).abs() < 1e-9);
        assert_eq!(matrix[0][1], matrix[1][0]);

        let single = DataFrame::new(vec![Column::new("x".into(), vec![1.0, 2.0])]).unwrap();
        assert!(DataProcessor::correlation_matrix(&single).0.is_empty());
    }

    #[test]
    fn overview_lists_only_columns_with_nulls() {
        let info = DataProcessor::dataframe_info(&sample());
        let text = DataProcessor::render_overview(&info);
        assert!(text.starts_with("DATA OVERVIEW"));
        assert!(text.contains("SHAPE: 4 rows × 4 columns"));
        assert!(text.contains("  city: 1 (25.00%)"));
        assert!(!text.contains("  temp: 0"));
        assert!(text.contains("    Mean: 7.00"));
        assert!(text.contains("    Oslo: 2"));
        assert!(text.contains("DATE COLUMNS: seen"));
        assert!(text.ends_with(": 1\n"));
    }

    #[test]
    fn cells_render_nulls_empty_and_truncate() {
        let long = "x".repeat(80);
        let df = DataFrame::new(vec![Column::new(
            "t".into(),
            vec![Some(long.as_str()), None],
        )])
        .unwrap();
        assert_eq!(DataProcessor::cell_text(&df, 0, 0).chars().count(), CELL_MAX_CHARS);
        assert_eq!(DataProcessor::cell_text(&df, 1, 0), "");
    }

    #[test]
    fn search_matches_any_cell() {
        let df = sample();
        assert_eq!(DataProcessor::search_rows(&df, "oslo", 1000), vec![0, 2]);
        assert_eq!(DataProcessor::search_rows(&df, "", 2), vec![0, 1]);
    }

    #[test]
    fn thousands_separator() {
        assert_eq!(format_thousands(0), "0");
        assert_eq!(format_thousands(999), "999");
        assert_eq!(format_thousands(1234567), "1,234,567");
    }
}

//! Chart Data Builder
//! Turns DataFrame columns into plot-ready series for each chart kind.

use crate::data::{any_value_text, DataProcessor};
use crate::stats::{HistogramBin, StatsCalculator};
use polars::prelude::*;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

/// Categories shown in a bar chart.
pub const BAR_TOP_N: usize = 20;
/// Slices shown in a pie chart.
pub const PIE_TOP_N: usize = 10;
/// Histogram bin count.
pub const HISTOGRAM_BINS: usize = 30;

static NEXT_CHART_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Column not found: {0}")]
    MissingColumn(String),
    #[error("Column '{0}' has no numeric values")]
    NotNumeric(String),
    #[error("Need at least 2 numeric columns for heatmap")]
    NotEnoughNumericColumns,
    #[error("Failed to render chart: {0}")]
    Render(String),
    #[error("Failed to open chart: {0}")]
    Open(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
    Histogram,
    Scatter,
    Heatmap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 6] = [
        ChartKind::Line,
        ChartKind::Bar,
        ChartKind::Pie,
        ChartKind::Histogram,
        ChartKind::Scatter,
        ChartKind::Heatmap,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            ChartKind::Line => "Line",
            ChartKind::Bar => "Bar",
            ChartKind::Pie => "Pie",
            ChartKind::Histogram => "Histogram",
            ChartKind::Scatter => "Scatter",
            ChartKind::Heatmap => "Heatmap",
        }
    }
}

/// Where a generated chart is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartTarget {
    /// Drawn inside the window with egui_plot.
    #[default]
    Embedded,
    /// Rendered to SVG and opened with the system viewer.
    Browser,
}

/// Plot-ready data for one chart.
#[derive(Debug, Clone)]
pub enum ChartSeries {
    /// Line and scatter charts. `x_labels` is set when x is categorical
    /// and points are placed at row positions.
    Xy {
        points: Vec<[f64; 2]>,
        x_labels: Option<Vec<String>>,
    },
    /// Bar and pie charts.
    Categories {
        labels: Vec<String>,
        counts: Vec<f64>,
    },
    Histogram {
        bins: Vec<HistogramBin>,
    },
    Heatmap {
        names: Vec<String>,
        matrix: Vec<Vec<f64>>,
    },
}

#[derive(Debug, Clone)]
pub struct ChartData {
    pub id: u64,
    pub kind: ChartKind,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: ChartSeries,
    /// X values are unix timestamps in seconds.
    pub time_x: bool,
}

impl ChartData {
    pub fn new(
        kind: ChartKind,
        title: impl Into<String>,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
        series: ChartSeries,
    ) -> Self {
        Self {
            id: NEXT_CHART_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            title: title.into(),
            x_label: x_label.into(),
            y_label: y_label.into(),
            series,
            time_x: false,
        }
    }

    pub fn with_time_axis(mut self) -> Self {
        self.time_x = true;
        self
    }
}

fn is_numeric(df: &DataFrame, column: &str) -> bool {
    DataProcessor::detect_numeric_columns(df)
        .iter()
        .any(|c| c == column)
}

fn require_column<'a>(df: &'a DataFrame, column: &str) -> Result<&'a Column, ChartError> {
    df.column(column)
        .map_err(|_| ChartError::MissingColumn(column.to_string()))
}

/// Builds chart data from a loaded DataFrame.
pub struct ChartBuilder;

impl ChartBuilder {
    pub fn build(
        df: &DataFrame,
        kind: ChartKind,
        x_col: &str,
        y_col: &str,
    ) -> Result<ChartData, ChartError> {
        match kind {
            ChartKind::Line => {
                let title = format!("Line Chart: {} over {}", y_col, x_col);
                Self::xy(df, kind, x_col, y_col, title)
            }
            ChartKind::Scatter => {
                let title = format!("Scatter Plot: {} vs {}", y_col, x_col);
                Self::xy(df, kind, x_col, y_col, title)
            }
            ChartKind::Bar => {
                let title = format!("Bar Chart: {}", y_col);
                Self::categories(df, kind, y_col, BAR_TOP_N, title)
            }
            ChartKind::Pie => {
                let title = format!("Pie Chart: {}", y_col);
                Self::categories(df, kind, y_col, PIE_TOP_N, title)
            }
            ChartKind::Histogram => Self::histogram(df, y_col),
            ChartKind::Heatmap => Self::heatmap(df),
        }
    }

    fn xy(
        df: &DataFrame,
        kind: ChartKind,
        x_col: &str,
        y_col: &str,
        title: String,
    ) -> Result<ChartData, ChartError> {
        let x_column = require_column(df, x_col)?;
        require_column(df, y_col)?;
        if !is_numeric(df, y_col) {
            return Err(ChartError::NotNumeric(y_col.to_string()));
        }

        let ys = StatsCalculator::column_options(df, y_col);
        let x_numeric = is_numeric(df, x_col);

        let (points, x_labels) = if x_numeric {
            let xs = StatsCalculator::column_options(df, x_col);
            let points = xs
                .iter()
                .zip(ys.iter())
                .filter_map(|(x, y)| match (x, y) {
                    (Some(x), Some(y)) if !x.is_nan() && !y.is_nan() => Some([*x, *y]),
                    _ => None,
                })
                .collect();
            (points, None)
        } else {
            let mut points = Vec::new();
            let mut labels = Vec::new();
            for (row, y) in ys.iter().enumerate() {
                let Some(y) = y.filter(|y| !y.is_nan()) else {
                    continue;
                };
                let label = x_column
                    .get(row)
                    .map(|v| any_value_text(&v))
                    .unwrap_or_default();
                points.push([labels.len() as f64, y]);
                labels.push(label);
            }
            (points, Some(labels))
        };

        if points.is_empty() {
            return Err(ChartError::NotNumeric(y_col.to_string()));
        }

        Ok(ChartData::new(
            kind,
            title,
            x_col,
            y_col,
            ChartSeries::Xy { points, x_labels },
        ))
    }

    fn categories(
        df: &DataFrame,
        kind: ChartKind,
        y_col: &str,
        limit: usize,
        title: String,
    ) -> Result<ChartData, ChartError> {
        require_column(df, y_col)?;
        let counts = DataProcessor::value_counts(df, y_col, limit)
            .map_err(|_| ChartError::MissingColumn(y_col.to_string()))?;

        let (labels, counts): (Vec<String>, Vec<f64>) =
            counts.into_iter().map(|(v, c)| (v, c as f64)).unzip();

        Ok(ChartData::new(
            kind,
            title,
            y_col,
            "Count",
            ChartSeries::Categories { labels, counts },
        ))
    }

    fn histogram(df: &DataFrame, y_col: &str) -> Result<ChartData, ChartError> {
        require_column(df, y_col)?;
        if !is_numeric(df, y_col) {
            return Err(ChartError::NotNumeric(y_col.to_string()));
        }
        let values = StatsCalculator::column_values(df, y_col);
        if values.is_empty() {
            return Err(ChartError::NotNumeric(y_col.to_string()));
        }

        Ok(ChartData::new(
            ChartKind::Histogram,
            format!("Histogram: {}", y_col),
            y_col,
            "Frequency",
            ChartSeries::Histogram {
                bins: StatsCalculator::histogram(&values, HISTOGRAM_BINS),
            },
        ))
    }

    fn heatmap(df: &DataFrame) -> Result<ChartData, ChartError> {
        let (names, matrix) = DataProcessor::correlation_matrix(df);
        if names.len() < 2 {
            return Err(ChartError::NotEnoughNumericColumns);
        }

        Ok(ChartData::new(
            ChartKind::Heatmap,
            "Correlation Heatmap",
            "",
            "",
            ChartSeries::Heatmap { names, matrix },
        ))
    }
}

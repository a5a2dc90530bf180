//! Statistics Calculator Module
//! Descriptive statistics, correlation and histogram binning for numeric columns.

use polars::prelude::*;
use rayon::prelude::*;
use statrs::statistics::Statistics;
use std::collections::HashMap;

/// Summary of a numeric column, pandas `describe()` style.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub max: f64,
}

impl Default for NumericSummary {
    fn default() -> Self {
        Self {
            count: 0,
            mean: f64::NAN,
            std: f64::NAN,
            min: f64::NAN,
            p25: f64::NAN,
            p50: f64::NAN,
            p75: f64::NAN,
            max: f64::NAN,
        }
    }
}

/// One histogram bin, `[start, end)` except the last which is closed.
#[derive(Debug, Clone, PartialEq)]
pub struct HistogramBin {
    pub start: f64,
    pub end: f64,
    pub count: usize,
}

impl HistogramBin {
    pub fn center(&self) -> f64 {
        (self.start + self.end) / 2.0
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }
}

/// Handles statistical calculations with multi-threading support.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Compute descriptive statistics for an array of values.
    pub fn describe(values: &[f64]) -> NumericSummary {
        let n = values.len();
        if n == 0 {
            return NumericSummary::default();
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        NumericSummary {
            count: n,
            mean: values.mean(),
            std: values.std_dev(),
            min: values.min(),
            p25: Self::percentile(&sorted, 25.0),
            p50: Self::percentile(&sorted, 50.0),
            p75: Self::percentile(&sorted, 75.0),
            max: values.max(),
        }
    }

    /// Calculate percentile using linear interpolation (NumPy compatible).
    pub fn percentile(sorted_values: &[f64], p: f64) -> f64 {
        let n = sorted_values.len();
        if n == 0 {
            return f64::NAN;
        }
        if n == 1 {
            return sorted_values[0];
        }

        let rank = (p / 100.0) * (n - 1) as f64;
        let lower = rank.floor() as usize;
        let upper = (rank.ceil() as usize).min(n - 1);
        let frac = rank - lower as f64;

        if lower == upper {
            sorted_values[lower]
        } else {
            sorted_values[lower] * (1.0 - frac) + sorted_values[upper] * frac
        }
    }

    /// Column values cast to f64, keeping row alignment.
    pub fn column_options(df: &DataFrame, column: &str) -> Vec<Option<f64>> {
        df.column(column)
            .ok()
            .and_then(|col| col.cast(&DataType::Float64).ok())
            .and_then(|col| col.f64().ok().map(|ca| ca.into_iter().collect()))
            .unwrap_or_default()
    }

    /// Non-null, non-NaN values of a column as f64.
    pub fn column_values(df: &DataFrame, column: &str) -> Vec<f64> {
        Self::column_options(df, column)
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .collect()
    }

    /// Compute summaries for the given columns in parallel.
    pub fn describe_columns_parallel(
        df: &DataFrame,
        columns: &[String],
    ) -> HashMap<String, NumericSummary> {
        columns
            .par_iter()
            .map(|name| {
                let values = Self::column_values(df, name);
                (name.clone(), Self::describe(&values))
            })
            .collect()
    }

    /// Pearson correlation coefficient.
    pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
        let n = xs.len().min(ys.len());
        if n < 2 {
            return f64::NAN;
        }

        let mx = xs[..n].iter().sum::<f64>() / n as f64;
        let my = ys[..n].iter().sum::<f64>() / n as f64;

        let mut cov = 0.0;
        let mut vx = 0.0;
        let mut vy = 0.0;
        for (x, y) in xs[..n].iter().zip(&ys[..n]) {
            let dx = x - mx;
            let dy = y - my;
            cov += dx * dy;
            vx += dx * dx;
            vy += dy * dy;
        }

        if vx == 0.0 || vy == 0.0 {
            return f64::NAN;
        }
        cov / (vx.sqrt() * vy.sqrt())
    }

    /// Split values into `bins` equal-width bins between min and max.
    pub fn histogram(values: &[f64], bins: usize) -> Vec<HistogramBin> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() || bins == 0 {
            return Vec::new();
        }

        let min = finite.iter().copied().fold(f64::INFINITY, f64::min);
        let max = finite.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        if min == max {
            return vec![HistogramBin {
                start: min - 0.5,
                end: max + 0.5,
                count: finite.len(),
            }];
        }

        let width = (max - min) / bins as f64;
        let mut result: Vec<HistogramBin> = (0..bins)
            .map(|i| HistogramBin {
                start: min + i as f64 * width,
                end: min + (i + 1) as f64 * width,
                count: 0,
            })
            .collect();

        for v in finite {
            let idx = (((v - min) / width).floor() as usize).min(bins - 1);
            result[idx].count += 1;
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn describe_matches_pandas() {
        // pandas.Series([1, 2, 3, 4, 10]).describe()
        let s = StatsCalculator::describe(&[4.0, 1.0, 10.0, 3.0, 2.0]);
        assert_eq!(s.count, 5);
        assert!(close(s.mean, 4.0));
        assert!(close(s.std, 3.5355339059327378));
        assert!(close(s.min, 1.0));
        assert!(close(s.p25, 2.0));
        assert!(close(s.p50, 3.0));
        assert!(close(s.p75, 4.0));
        assert!(close(s.max, 10.0));
    }

    #[test]
    fn describe_empty_is_nan() {
        let s = StatsCalculator::describe(&[]);
        assert_eq!(s.count, 0);
        assert!(s.mean.is_nan());
        assert!(s.max.is_nan());
    }

    #[test]
    fn percentile_interpolates() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert!(close(StatsCalculator::percentile(&sorted, 25.0), 1.75));
        assert!(close(StatsCalculator::percentile(&sorted, 50.0), 2.5));
        assert!(close(StatsCalculator::percentile(&[7.0], 90.0), 7.0));
    }

    #[test]
    fn column_values_skip_nulls() {
        let df = DataFrame::new(vec![Column::new(
            "v".into(),
            vec![Some(1i64), None, Some(3)],
        )])
        .unwrap();
        assert_eq!(StatsCalculator::column_values(&df, "v"), vec![1.0, 3.0]);
        assert!(StatsCalculator::column_values(&df, "missing").is_empty());
    }

    #[test]
    fn parallel_describe_covers_every_column() {
        let df = DataFrame::new(vec![
            Column::new("a".into(), vec![1.0, 2.0, 3.0]),
            Column::new("b".into(), vec![10i64, 20, 30]),
        ])
        .unwrap();
        let stats =
            StatsCalculator::describe_columns_parallel(&df, &["a".to_string(), "b".to_string()]);
        assert_eq!(stats.len(), 2);
        assert!(close(stats["b"].mean, 20.0));
    }

    #[test]
    fn pearson_perfect_and_degenerate() {
        assert!(close(
            StatsCalculator::pearson(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.0]),
            1.0
        ));
        assert!(close(
            StatsCalculator::pearson(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]),
            -1.0
        ));
        assert!(StatsCalculator::pearson(&[1.0, 1.0], &[1.0, 2.0]).is_nan());
        assert!(StatsCalculator::pearson(&[1.0], &[1.0]).is_nan());
    }

    #[test]
    fn histogram_bins_include_max() {
        let bins = StatsCalculator::histogram(&[0.0, 1.0, 2.0, 3.0, 4.0], 4);
        assert_eq!(bins.len(), 4);
        assert_eq!(bins.iter().map(|b| b.count).sum::<usize>(), 5);
        assert_eq!(bins[3].count, 2);
        assert!(close(bins[0].width(), 1.0));
    }

    #[test]
    fn histogram_constant_values() {
        let bins = StatsCalculator::histogram(&[5.0, 5.0], 30);
        assert_eq!(bins.len(), 1);
        assert_eq!(bins[0].count, 2);
        assert!(close(bins[0].center(), 5.0));
    }
}

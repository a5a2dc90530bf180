//! Stats module - descriptive statistics

mod calculator;

pub use calculator::{HistogramBin, NumericSummary, StatsCalculator};

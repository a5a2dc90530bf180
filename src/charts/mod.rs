//! Charts module - chart data and rendering

mod builder;
mod plotter;
mod renderer;

pub use builder::{ChartBuilder, ChartData, ChartError, ChartKind, ChartSeries, ChartTarget};
pub use plotter::{ChartPlotter, PALETTE};
pub use renderer::StaticChartRenderer;

//! Marketing performance reporting — the summary engine, the dashboard's
//! channel views, chart series, and summary exports.

pub mod chart;
pub mod export;
pub mod summary;
pub mod views;

pub use chart::{chart_series, BarChart, Series};
pub use summary::{build_summary, SummaryRow, Totals};
pub use views::{build_view, view_rows, View, ViewReport};

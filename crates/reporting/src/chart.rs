//! Grouped bar chart series for the dashboard. The chart itself is drawn
//! client-side; this only shapes the numbers.

use std::collections::{BTreeMap, BTreeSet};

use insights_core::Metric;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::summary::SummaryRow;
use crate::views::View;

/// Series name used when a view is not split by market.
pub const ALL_MARKETS: &str = "All Markets";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Series {
    pub name: String,
    pub x: Vec<String>,
    /// `None` where the value is undefined (zero denominator).
    pub y: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BarChart {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub barmode: String,
    pub series: Vec<Series>,
}

impl BarChart {
    pub fn is_empty(&self) -> bool {
        self.series.iter().all(|s| s.x.is_empty())
    }
}

fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

/// Build the chart for a view: channel views put channels on the x-axis
/// with one series per market; the monthly view plots one series by month.
pub fn chart_series(view: View, rows: &[SummaryRow], metric: Metric) -> BarChart {
    match view {
        View::Monthly => BarChart {
            title: format!("{metric} by Month"),
            x_label: "Month".to_string(),
            y_label: metric.label().to_string(),
            barmode: "group".to_string(),
            series: vec![Series {
                name: ALL_MARKETS.to_string(),
                x: rows
                    .iter()
                    .map(|r| r.month.clone().unwrap_or_default())
                    .collect(),
                y: rows.iter().map(|r| finite(r.metric(metric))).collect(),
            }],
        },
        _ => {
            let channels: BTreeSet<&str> =
                rows.iter().filter_map(|r| r.channel.as_deref()).collect();
            let mut by_market: BTreeMap<&str, BTreeMap<&str, f64>> = BTreeMap::new();
            for row in rows {
                if let (Some(market), Some(channel)) = (row.market.as_deref(), row.channel.as_deref()) {
                    by_market
                        .entry(market)
                        .or_default()
                        .insert(channel, row.metric(metric));
                }
            }

            let series = by_market
                .into_iter()
                .map(|(market, values)| {
                    let (x, y) = channels
                        .iter()
                        .filter_map(|c| values.get(c).map(|v| (c.to_string(), finite(*v))))
                        .unzip();
                    Series {
                        name: market.to_string(),
                        x,
                        y,
                    }
                })
                .collect();

            BarChart {
                title: format!("{metric} by Channel and Market"),
                x_label: "Channel".to_string(),
                y_label: metric.label().to_string(),
                barmode: "group".to_string(),
                series,
            }
        }
    }
}

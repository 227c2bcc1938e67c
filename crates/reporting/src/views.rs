//! Dashboard views — the channel tabs and the monthly trend, each a
//! [`build_summary`] call plus a channel-class filter and a metric choice.

use std::fmt;
use std::str::FromStr;

use insights_core::{
    ChannelClass, ChannelTaxonomy, Dimension, InsightsError, InsightsResult, Metric,
};
use insights_ingest::{EventTable, Selection};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::chart::{chart_series, BarChart};
use crate::summary::{build_summary, SummaryRow, Totals};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Paid,
    OwnedEarned,
    Unclassified,
    Monthly,
}

impl View {
    pub const ALL: [View; 4] = [View::Paid, View::OwnedEarned, View::Unclassified, View::Monthly];

    pub fn slug(&self) -> &'static str {
        match self {
            View::Paid => "paid",
            View::OwnedEarned => "owned_earned",
            View::Unclassified => "unclassified",
            View::Monthly => "monthly",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            View::Paid => ChannelClass::Paid.display_name(),
            View::OwnedEarned => ChannelClass::OwnedEarned.display_name(),
            View::Unclassified => ChannelClass::Unclassified.display_name(),
            View::Monthly => "Monthly Trend",
        }
    }

    /// Channel class the view is restricted to; `None` for views that do
    /// not group by channel.
    pub fn channel_class(&self) -> Option<ChannelClass> {
        match self {
            View::Paid => Some(ChannelClass::Paid),
            View::OwnedEarned => Some(ChannelClass::OwnedEarned),
            View::Unclassified => Some(ChannelClass::Unclassified),
            View::Monthly => None,
        }
    }

    pub fn group_by(&self) -> &'static [Dimension] {
        match self {
            View::Monthly => &[Dimension::Month],
            _ => &[Dimension::Market, Dimension::Channel],
        }
    }

    /// Metrics the view's selector offers. Owned/earned channels carry no
    /// spend, so cost-based metrics are left out.
    pub fn metrics(&self) -> &'static [Metric] {
        match self {
            View::OwnedEarned => &Metric::UNPAID,
            _ => &Metric::ALL,
        }
    }

    pub fn default_metric(&self) -> Metric {
        self.metrics()[0]
    }

    /// Resolve the requested metric, falling back to the view's default.
    pub fn resolve_metric(&self, requested: Option<Metric>) -> InsightsResult<Metric> {
        match requested {
            None => Ok(self.default_metric()),
            Some(metric) if self.metrics().contains(&metric) => Ok(metric),
            Some(metric) => Err(InsightsError::InvalidMetric {
                metric: metric.label().to_string(),
                view: self.slug().to_string(),
            }),
        }
    }

    /// Views offered under the given taxonomy.
    pub fn available(taxonomy: &ChannelTaxonomy) -> Vec<View> {
        View::ALL
            .into_iter()
            .filter(|v| *v != View::Unclassified || taxonomy.surface_unclassified())
            .collect()
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for View {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "paid" => Ok(View::Paid),
            "owned" | "owned_earned" | "earned" => Ok(View::OwnedEarned),
            "unclassified" => Ok(View::Unclassified),
            "monthly" | "month" => Ok(View::Monthly),
            _ => Err(InsightsError::InvalidView(s.to_string())),
        }
    }
}

/// Everything a dashboard tab needs for one render.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ViewReport {
    pub view: View,
    pub title: String,
    pub metric: Metric,
    pub rows: Vec<SummaryRow>,
    pub totals: Totals,
    pub chart: BarChart,
}

/// Summary rows for a view, already restricted to its channel class.
pub fn view_rows(
    table: &EventTable,
    selection: &Selection,
    taxonomy: &ChannelTaxonomy,
    view: View,
) -> InsightsResult<Vec<SummaryRow>> {
    if view == View::Unclassified && !taxonomy.surface_unclassified() {
        return Err(InsightsError::InvalidView(view.slug().to_string()));
    }

    let filtered = table.filter(selection);
    let summary = build_summary(&filtered, view.group_by())?;

    let rows: Vec<SummaryRow> = match view.channel_class() {
        Some(class) => summary
            .into_iter()
            .filter(|row| {
                row.channel
                    .as_deref()
                    .is_some_and(|c| taxonomy.classify(c) == class)
            })
            .collect(),
        None => summary,
    };

    debug!(view = %view, rows = rows.len(), selected = filtered.len(), "View computed");
    Ok(rows)
}

/// Recompute a view from scratch for the current selection and metric.
pub fn build_view(
    table: &EventTable,
    selection: &Selection,
    taxonomy: &ChannelTaxonomy,
    view: View,
    metric: Option<Metric>,
) -> InsightsResult<ViewReport> {
    let metric = view.resolve_metric(metric)?;
    let rows = view_rows(table, selection, taxonomy, view)?;
    let totals = Totals::of(&rows);
    let chart = chart_series(view, &rows, metric);

    Ok(ViewReport {
        view,
        title: view.title().to_string(),
        metric,
        rows,
        totals,
        chart,
    })
}

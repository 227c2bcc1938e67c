//! Summary engine — groups events by dimension, sums the raw measures, and
//! derives the efficiency ratios.
//!
//! Conventions:
//! - A missing numeric cell contributes zero to its own sum; the rest of
//!   the row still counts.
//! - A row missing any grouping value is left out of that grouping.
//! - Ratios use plain `f64` division, so a zero denominator yields `inf` or
//!   `NaN` and never an error.
//! - Sums and ratios are rounded to 2 decimals; output is sorted by key.

use std::collections::BTreeMap;

use insights_core::{Dimension, EventRecord, InsightsError, InsightsResult, Metric};
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

/// One aggregated group. Only the grouped dimensions are populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SummaryRow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    pub total_visits: f64,
    pub cost: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub new_conversions: f64,
    /// Revenue / Cost. `null` in JSON when undefined.
    pub roas: f64,
    /// Cost / New Conversions.
    pub cac: f64,
    /// Cost / Conversions.
    pub cpp: f64,
    /// Revenue / Conversions.
    pub aov: f64,
    pub return_conversions: f64,
}

impl SummaryRow {
    fn from_totals(key: &GroupKey, group_by: &[Dimension], t: &Accumulator) -> Self {
        let mut row = Self::derive(t);
        for (dim, value) in group_by.iter().zip(key.0.iter()) {
            let value = Some(value.clone());
            match dim {
                Dimension::Market => row.market = value,
                Dimension::Channel => row.channel = value,
                Dimension::Month => row.month = value,
            }
        }
        row
    }

    fn derive(t: &Accumulator) -> Self {
        Self {
            market: None,
            channel: None,
            month: None,
            total_visits: round2(t.visits),
            cost: round2(t.cost),
            conversions: round2(t.conversions),
            revenue: round2(t.revenue),
            new_conversions: round2(t.new_conversions),
            roas: round2(t.revenue / t.cost),
            cac: round2(t.cost / t.new_conversions),
            cpp: round2(t.cost / t.conversions),
            aov: round2(t.revenue / t.conversions),
            return_conversions: round2(t.conversions - t.new_conversions),
        }
    }

    /// Value of a dimension for this row, if it was grouped on.
    pub fn dimension(&self, dim: Dimension) -> Option<&str> {
        match dim {
            Dimension::Market => self.market.as_deref(),
            Dimension::Channel => self.channel.as_deref(),
            Dimension::Month => self.month.as_deref(),
        }
    }

    pub fn metric(&self, metric: Metric) -> f64 {
        match metric {
            Metric::Roas => self.roas,
            Metric::Cac => self.cac,
            Metric::Cpp => self.cpp,
            Metric::Aov => self.aov,
            Metric::Conversions => self.conversions,
            Metric::NewConversions => self.new_conversions,
            Metric::ReturnConversions => self.return_conversions,
            Metric::Revenue => self.revenue,
            Metric::Cost => self.cost,
            Metric::TotalVisits => self.total_visits,
        }
    }
}

/// Grand totals across a set of summary rows, with ratios recomputed from
/// the summed measures rather than averaged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Totals {
    pub groups: usize,
    pub total_visits: f64,
    pub cost: f64,
    pub conversions: f64,
    pub revenue: f64,
    pub new_conversions: f64,
    pub roas: f64,
    pub cac: f64,
    pub cpp: f64,
    pub aov: f64,
    pub return_conversions: f64,
}

impl Totals {
    pub fn of(rows: &[SummaryRow]) -> Self {
        let mut acc = Accumulator::default();
        for row in rows {
            acc.visits += row.total_visits;
            acc.cost += row.cost;
            acc.conversions += row.conversions;
            acc.revenue += row.revenue;
            acc.new_conversions += row.new_conversions;
        }
        let d = SummaryRow::derive(&acc);
        Self {
            groups: rows.len(),
            total_visits: d.total_visits,
            cost: d.cost,
            conversions: d.conversions,
            revenue: d.revenue,
            new_conversions: d.new_conversions,
            roas: d.roas,
            cac: d.cac,
            cpp: d.cpp,
            aov: d.aov,
            return_conversions: d.return_conversions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey(Vec<String>);

#[derive(Debug, Clone, Default)]
struct Accumulator {
    visits: f64,
    cost: f64,
    conversions: f64,
    revenue: f64,
    new_conversions: f64,
}

impl Accumulator {
    fn add(&mut self, record: &EventRecord) {
        self.visits += record.visits.unwrap_or(0.0);
        self.cost += record.cost.unwrap_or(0.0);
        self.conversions += record.conversions.unwrap_or(0.0);
        self.revenue += record.revenue.unwrap_or(0.0);
        self.new_conversions += record.new_conversions.unwrap_or(0.0);
    }
}

/// Round to 2 decimal places, ties to even. Non-finite values are returned
/// unchanged.
pub fn round2(value: f64) -> f64 {
    if value.is_finite() {
        (value * 100.0).round_ties_even() / 100.0
    } else {
        value
    }
}

/// Drop repeated dimensions, keeping the first occurrence.
fn dedup_dimensions(group_by: &[Dimension]) -> Vec<Dimension> {
    let mut seen = Vec::with_capacity(group_by.len());
    for dim in group_by {
        if !seen.contains(dim) {
            seen.push(*dim);
        }
    }
    seen
}

/// Aggregate `rows` into one summary row per distinct combination of the
/// `group_by` dimensions.
pub fn build_summary(
    rows: &[&EventRecord],
    group_by: &[Dimension],
) -> InsightsResult<Vec<SummaryRow>> {
    if group_by.is_empty() {
        return Err(InsightsError::EmptyGrouping);
    }
    let group_by = dedup_dimensions(group_by);

    let mut groups: BTreeMap<GroupKey, Accumulator> = BTreeMap::new();
    let mut skipped = 0usize;

    for record in rows {
        let key: Option<Vec<String>> = group_by.iter().map(|d| record.dimension(*d)).collect();
        match key {
            Some(key) => groups.entry(GroupKey(key)).or_default().add(record),
            None => skipped += 1,
        }
    }

    debug!(
        rows = rows.len(),
        groups = groups.len(),
        skipped,
        group_by = ?group_by,
        "Summary built"
    );

    Ok(groups
        .iter()
        .map(|(key, totals)| SummaryRow::from_totals(key, &group_by, totals))
        .collect())
}

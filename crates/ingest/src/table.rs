//! Immutable in-memory table of cleaned events and the market/month
//! selection applied before aggregation.

use std::collections::BTreeSet;

use insights_core::text::{split_list, title_case};
use insights_core::EventRecord;
use serde::{Deserialize, Serialize};

use crate::loader::LoadReport;

/// Filter option standing for a missing market or month.
pub const BLANK_OPTION: &str = "(blank)";

/// The loaded export. Built once at startup and shared read-only.
#[derive(Debug, Clone, Default)]
pub struct EventTable {
    rows: Vec<EventRecord>,
    report: LoadReport,
}

impl EventTable {
    pub fn new(rows: Vec<EventRecord>, report: LoadReport) -> Self {
        Self { rows, report }
    }

    /// Build a table from rows that are already clean.
    pub fn from_rows(rows: Vec<EventRecord>) -> Self {
        let report = LoadReport {
            rows: rows.len(),
            ..Default::default()
        };
        Self { rows, report }
    }

    pub fn rows(&self) -> &[EventRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Distinct markets present, sorted. These are the market filter options.
    pub fn markets(&self) -> Vec<String> {
        distinct(self.rows.iter().filter_map(|r| r.market.clone()))
    }

    /// Distinct `YYYY-MM` months present, sorted.
    pub fn months(&self) -> Vec<String> {
        distinct(self.rows.iter().filter_map(|r| r.month()))
    }

    /// Market filter options: the distinct markets plus [`BLANK_OPTION`]
    /// when some rows have no market.
    pub fn market_options(&self) -> Vec<String> {
        with_blank(self.markets(), self.rows.iter().any(|r| r.market.is_none()))
    }

    /// Month filter options: the distinct months plus [`BLANK_OPTION`] when
    /// some rows have no usable date.
    pub fn month_options(&self) -> Vec<String> {
        with_blank(self.months(), self.rows.iter().any(|r| r.date.is_none()))
    }

    pub fn channels(&self) -> Vec<String> {
        distinct(self.rows.iter().filter_map(|r| r.channel.clone()))
    }

    /// Rows matching the selection, in input order.
    pub fn filter(&self, selection: &Selection) -> Vec<&EventRecord> {
        self.rows.iter().filter(|r| selection.matches(r)).collect()
    }
}

fn distinct(values: impl Iterator<Item = String>) -> Vec<String> {
    values.collect::<BTreeSet<_>>().into_iter().collect()
}

fn with_blank(mut options: Vec<String>, has_missing: bool) -> Vec<String> {
    if has_missing {
        options.push(BLANK_OPTION.to_string());
    }
    options
}

fn is_blank_option(value: &str) -> bool {
    value.eq_ignore_ascii_case(BLANK_OPTION)
}

fn list_matches(list: &[String], value: Option<&str>) -> bool {
    match value {
        Some(value) => list.iter().any(|s| s == value),
        None => list.iter().any(|s| is_blank_option(s)),
    }
}

/// Market and month filter. `None` selects everything; an explicit list
/// selects only rows whose value is in it, so an empty list selects nothing.
/// Rows missing the value match only a list holding [`BLANK_OPTION`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub markets: Option<Vec<String>>,
    pub months: Option<Vec<String>>,
}

impl Selection {
    pub fn all() -> Self {
        Self::default()
    }

    /// Restrict to the given markets. Values are normalized like the export,
    /// so `UK` selects rows cleaned to `Uk`.
    pub fn with_markets<I, S>(mut self, markets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.markets = Some(
            markets
                .into_iter()
                .map(|m| {
                    let m = m.as_ref().trim();
                    if is_blank_option(m) {
                        BLANK_OPTION.to_string()
                    } else {
                        title_case(m)
                    }
                })
                .filter(|m| !m.is_empty())
                .collect(),
        );
        self
    }

    pub fn with_months<I, S>(mut self, months: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.months = Some(
            months
                .into_iter()
                .map(|m| m.as_ref().trim().to_string())
                .filter(|m| !m.is_empty())
                .collect(),
        );
        self
    }

    /// Build from comma-separated query values. An absent parameter selects
    /// everything; a present but blank one selects nothing.
    pub fn from_lists(markets: Option<&str>, months: Option<&str>) -> Self {
        let mut selection = Self::all();
        if let Some(markets) = markets {
            selection = selection.with_markets(split_list(markets));
        }
        if let Some(months) = months {
            selection = selection.with_months(split_list(months));
        }
        selection
    }

    /// Build from individual values, one per repeated query key. Values are
    /// taken whole, so a market containing a comma still matches. Blank
    /// values are dropped, leaving an empty list that selects nothing.
    pub fn from_values(markets: Option<Vec<String>>, months: Option<Vec<String>>) -> Self {
        let mut selection = Self::all();
        if let Some(markets) = markets {
            selection = selection.with_markets(markets);
        }
        if let Some(months) = months {
            selection = selection.with_months(months);
        }
        selection
    }

    pub fn is_all(&self) -> bool {
        self.markets.is_none() && self.months.is_none()
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        let market_ok = match &self.markets {
            None => true,
            Some(list) => list_matches(list, record.market.as_deref()),
        };
        let month_ok = match &self.months {
            None => true,
            Some(list) => list_matches(list, record.month().as_deref()),
        };
        market_ok && month_ok
    }
}

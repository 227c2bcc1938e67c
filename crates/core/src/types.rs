use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

use crate::error::InsightsError;

/// One cleaned row of the marketing-performance export.
///
/// Categorical fields are title-cased and trimmed; any field that could not
/// be read is `None`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub market: Option<String>,
    pub channel: Option<String>,
    pub source: Option<String>,
    pub campaign: Option<String>,
    pub date: Option<NaiveDate>,
    pub visits: Option<f64>,
    pub cost: Option<f64>,
    pub conversions: Option<f64>,
    pub revenue: Option<f64>,
    pub new_conversions: Option<f64>,
}

impl EventRecord {
    /// Year-month key (`YYYY-MM`) derived from the date.
    pub fn month(&self) -> Option<String> {
        self.date
            .map(|d| format!("{:04}-{:02}", d.year(), d.month()))
    }

    /// Value of a grouping dimension for this row.
    pub fn dimension(&self, dim: Dimension) -> Option<String> {
        match dim {
            Dimension::Market => self.market.clone(),
            Dimension::Channel => self.channel.clone(),
            Dimension::Month => self.month(),
        }
    }
}

/// Columns a summary can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Market,
    Channel,
    Month,
}

impl Dimension {
    pub const ALL: [Dimension; 3] = [Dimension::Market, Dimension::Channel, Dimension::Month];

    /// Column heading used in exports.
    pub fn column(&self) -> &'static str {
        match self {
            Dimension::Market => "Market",
            Dimension::Channel => "Channel",
            Dimension::Month => "Month",
        }
    }

    /// Parse a comma-separated grouping such as `market,channel`.
    pub fn parse_list(value: &str) -> Result<Vec<Dimension>, InsightsError> {
        crate::text::split_list(value)
            .iter()
            .map(|s| s.parse())
            .collect()
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for Dimension {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "market" => Ok(Dimension::Market),
            "channel" => Ok(Dimension::Channel),
            "month" | "date_year_month" | "date-month" => Ok(Dimension::Month),
            _ => Err(InsightsError::InvalidDimension(s.to_string())),
        }
    }
}

/// Values that can be plotted from a summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Metric {
    #[serde(rename = "ROAS")]
    Roas,
    #[serde(rename = "CAC")]
    Cac,
    #[serde(rename = "CPP")]
    Cpp,
    #[serde(rename = "AOV")]
    Aov,
    #[serde(rename = "Conversions")]
    Conversions,
    #[serde(rename = "New Conversions")]
    NewConversions,
    #[serde(rename = "Return Conversions")]
    ReturnConversions,
    #[serde(rename = "Revenue")]
    Revenue,
    #[serde(rename = "Cost")]
    Cost,
    #[serde(rename = "Total Visits")]
    TotalVisits,
}

impl Metric {
    /// Every metric, in the order the paid-channel selector lists them.
    pub const ALL: [Metric; 10] = [
        Metric::Roas,
        Metric::Cac,
        Metric::Cpp,
        Metric::Aov,
        Metric::Conversions,
        Metric::NewConversions,
        Metric::ReturnConversions,
        Metric::Revenue,
        Metric::Cost,
        Metric::TotalVisits,
    ];

    /// Metrics that make sense for channels with no media spend.
    pub const UNPAID: [Metric; 5] = [
        Metric::Conversions,
        Metric::NewConversions,
        Metric::ReturnConversions,
        Metric::Revenue,
        Metric::TotalVisits,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Metric::Roas => "ROAS",
            Metric::Cac => "CAC",
            Metric::Cpp => "CPP",
            Metric::Aov => "AOV",
            Metric::Conversions => "Conversions",
            Metric::NewConversions => "New Conversions",
            Metric::ReturnConversions => "Return Conversions",
            Metric::Revenue => "Revenue",
            Metric::Cost => "Cost",
            Metric::TotalVisits => "Total Visits",
        }
    }

    /// Summary column name (`New_Conversions`).
    pub fn column(&self) -> &'static str {
        match self {
            Metric::NewConversions => "New_Conversions",
            Metric::ReturnConversions => "Return_Conversions",
            Metric::TotalVisits => "Total_Visits",
            other => other.label(),
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace('_', " ").to_ascii_lowercase();
        Metric::ALL
            .into_iter()
            .find(|m| m.label().to_ascii_lowercase() == wanted)
            .ok_or_else(|| InsightsError::InvalidMetric {
                metric: s.to_string(),
                view: "any".to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_key_from_date() {
        let record = EventRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 17),
            ..Default::default()
        };
        assert_eq!(record.month().as_deref(), Some("2024-03"));
        assert_eq!(EventRecord::default().month(), None);
    }

    #[test]
    fn test_dimension_parse() {
        assert_eq!("Market".parse::<Dimension>().unwrap(), Dimension::Market);
        assert_eq!("date_year_month".parse::<Dimension>().unwrap(), Dimension::Month);
        assert!("source".parse::<Dimension>().is_err());
        assert_eq!(
            Dimension::parse_list("market, channel").unwrap(),
            vec![Dimension::Market, Dimension::Channel]
        );
    }

    #[test]
    fn test_metric_parse_both_forms() {
        assert_eq!("roas".parse::<Metric>().unwrap(), Metric::Roas);
        assert_eq!("New_Conversions".parse::<Metric>().unwrap(), Metric::NewConversions);
        assert_eq!("Total Visits".parse::<Metric>().unwrap(), Metric::TotalVisits);
        assert!("CTR".parse::<Metric>().is_err());
    }

    #[test]
    fn test_metric_serializes_as_label() {
        let json = serde_json::to_string(&Metric::ReturnConversions).unwrap();
        assert_eq!(json, "\"Return Conversions\"");
        assert_eq!(Metric::ReturnConversions.column(), "Return_Conversions");
    }
}

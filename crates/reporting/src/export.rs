//! Summary export — CSV and JSON downloads and a plain-text table for the
//! command line.

use insights_core::{Dimension, InsightsError, InsightsResult, Metric};

use crate::summary::SummaryRow;

/// Measure columns in export order.
pub const MEASURE_COLUMNS: [Metric; 10] = [
    Metric::TotalVisits,
    Metric::Cost,
    Metric::Conversions,
    Metric::Revenue,
    Metric::NewConversions,
    Metric::Roas,
    Metric::Cac,
    Metric::Cpp,
    Metric::Aov,
    Metric::ReturnConversions,
];

/// Format a summary value. Money and ratios keep two decimals; counts are
/// printed as-is. Undefined values print as `NaN` or `inf`.
pub fn format_value(metric: Metric, value: f64) -> String {
    match metric {
        Metric::TotalVisits
        | Metric::Conversions
        | Metric::NewConversions
        | Metric::ReturnConversions => format!("{value}"),
        _ => format!("{value:.2}"),
    }
}

pub fn header(group_by: &[Dimension]) -> Vec<String> {
    group_by
        .iter()
        .map(|d| d.column().to_string())
        .chain(MEASURE_COLUMNS.iter().map(|m| m.column().to_string()))
        .collect()
}

fn cells(row: &SummaryRow, group_by: &[Dimension]) -> Vec<String> {
    group_by
        .iter()
        .map(|d| row.dimension(*d).unwrap_or_default().to_string())
        .chain(MEASURE_COLUMNS.iter().map(|m| format_value(*m, row.metric(*m))))
        .collect()
}

pub fn to_csv(rows: &[SummaryRow], group_by: &[Dimension]) -> InsightsResult<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header(group_by))?;
    for row in rows {
        writer.write_record(cells(row, group_by))?;
    }
    let bytes = writer.into_inner().map_err(|e| InsightsError::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| InsightsError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Pretty JSON array. Undefined ratios become `null`.
pub fn to_json(rows: &[SummaryRow]) -> InsightsResult<String> {
    Ok(serde_json::to_string_pretty(rows)?)
}

/// Aligned text table, dimensions left-aligned and numbers right-aligned.
pub fn to_table(rows: &[SummaryRow], group_by: &[Dimension]) -> String {
    let header = header(group_by);
    let body: Vec<Vec<String>> = rows.iter().map(|r| cells(r, group_by)).collect();

    let widths: Vec<usize> = (0..header.len())
        .map(|i| {
            body.iter()
                .map(|r| r[i].chars().count())
                .chain(std::iter::once(header[i].chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    let dims = group_by.len();
    let render = |line: &[String]| -> String {
        line.iter()
            .enumerate()
            .map(|(i, cell)| {
                if i < dims {
                    format!("{cell:<width$}", width = widths[i])
                } else {
                    format!("{cell:>width$}", width = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };

    let mut out = render(&header);
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.push('\n');
    for line in &body {
        out.push_str(&render(line));
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<SummaryRow> {
        vec![
            SummaryRow {
                market: Some("Uk".to_string()),
                channel: Some("Paid Social".to_string()),
                month: None,
                total_visits: 1500.0,
                cost: 150.0,
                conversions: 15.0,
                revenue: 750.0,
                new_conversions: 6.0,
                roas: 5.0,
                cac: 25.0,
                cpp: 10.0,
                aov: 50.0,
                return_conversions: 9.0,
            },
            SummaryRow {
                market: Some("Us".to_string()),
                channel: Some("Email, Newsletter".to_string()),
                month: None,
                total_visits: 10.0,
                cost: 0.0,
                conversions: 0.0,
                revenue: 0.0,
                new_conversions: 0.0,
                roas: f64::NAN,
                cac: f64::NAN,
                cpp: f64::NAN,
                aov: f64::NAN,
                return_conversions: 0.0,
            },
        ]
    }

    const GROUP: [Dimension; 2] = [Dimension::Market, Dimension::Channel];

    #[test]
    fn test_csv_header_and_rows() {
        let csv = to_csv(&sample(), &GROUP).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next().unwrap(),
            "Market,Channel,Total_Visits,Cost,Conversions,Revenue,New_Conversions,ROAS,CAC,CPP,AOV,Return_Conversions"
        );
        assert_eq!(
            lines.next().unwrap(),
            "Uk,Paid Social,1500,150.00,15,750.00,6,5.00,25.00,10.00,50.00,9"
        );
        let undefined = lines.next().unwrap();
        assert!(undefined.starts_with("Us,\"Email, Newsletter\",10,0.00"));
        assert!(undefined.contains("NaN,NaN,NaN,NaN"));
    }

    #[test]
    fn test_json_undefined_is_null() {
        let json: serde_json::Value = serde_json::from_str(&to_json(&sample()).unwrap()).unwrap();
        assert_eq!(json[0]["roas"], 5.0);
        assert!(json[1]["roas"].is_null());
        assert!(json[0].get("month").is_none());
    }

    #[test]
    fn test_table_alignment() {
        let table = to_table(&sample(), &GROUP);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Market  Channel"));
        assert!(lines[1].chars().all(|c| c == '-'));
        assert!(lines[2].starts_with("Uk      Paid Social"));
        assert!(lines[3].contains("NaN"));
    }
}

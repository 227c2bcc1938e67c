//! Semicolon CSV reader for the performance export.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};
use insights_core::text::clean_category;
use insights_core::{EventRecord, InsightsError, InsightsResult};
use serde::Serialize;
use tracing::{info, warn};

use crate::coerce::{parse_date, parse_number};
use crate::table::EventTable;

pub const COL_DATE: &str = "Date";
pub const COL_MARKET: &str = "Market";
pub const COL_CHANNEL: &str = "Channel";
pub const COL_SOURCE: &str = "Source";
pub const COL_CAMPAIGN: &str = "Campaign";
pub const COL_VISITS: &str = "Visits";
pub const COL_COST: &str = "Cost";
pub const COL_CONVERSIONS: &str = "Fospha Attribution Conversions";
pub const COL_REVENUE: &str = "Fospha Attribution Revenue";
pub const COL_NEW_CONVERSIONS: &str = "Fospha Attribution New Conversions";

/// Header names the export must carry. Extra columns are ignored.
pub const REQUIRED_COLUMNS: [&str; 10] = [
    COL_DATE,
    COL_MARKET,
    COL_CHANNEL,
    COL_SOURCE,
    COL_CAMPAIGN,
    COL_VISITS,
    COL_COST,
    COL_CONVERSIONS,
    COL_REVENUE,
    COL_NEW_CONVERSIONS,
];

const NUMERIC_COLUMNS: [&str; 5] = [
    COL_VISITS,
    COL_COST,
    COL_CONVERSIONS,
    COL_REVENUE,
    COL_NEW_CONVERSIONS,
];

/// What happened while loading: row counts and how many cells were coerced
/// to missing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct LoadReport {
    pub rows: usize,
    pub missing_dates: usize,
    /// Cells that were present but could not be read as numbers, by column.
    pub uncoercible: BTreeMap<String, usize>,
    pub ignored_columns: Vec<String>,
}

impl LoadReport {
    pub fn uncoercible_total(&self) -> usize {
        self.uncoercible.values().sum()
    }
}

/// Positions of the required columns within the header row.
struct ColumnIndex {
    positions: [usize; REQUIRED_COLUMNS.len()],
}

impl ColumnIndex {
    fn from_header(header: &ByteRecord) -> InsightsResult<(Self, Vec<String>)> {
        let names: Vec<String> = header
            .iter()
            .map(|h| {
                String::from_utf8_lossy(h)
                    .trim_start_matches('\u{feff}')
                    .trim()
                    .to_string()
            })
            .collect();

        let mut positions = [0usize; REQUIRED_COLUMNS.len()];
        let mut missing = Vec::new();
        for (slot, required) in REQUIRED_COLUMNS.iter().enumerate() {
            match names.iter().position(|n| n == required) {
                Some(pos) => positions[slot] = pos,
                None => missing.push(required.to_string()),
            }
        }
        if !missing.is_empty() {
            return Err(InsightsError::MissingColumns(missing));
        }

        let ignored = names
            .into_iter()
            .filter(|n| !REQUIRED_COLUMNS.contains(&n.as_str()))
            .collect();

        Ok((Self { positions }, ignored))
    }

    fn cell<'r>(&self, record: &'r ByteRecord, column: &str) -> std::borrow::Cow<'r, str> {
        let slot = REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .unwrap_or_default();
        let raw = record.get(self.positions[slot]).unwrap_or_default();
        String::from_utf8_lossy(raw)
    }
}

/// Load and clean the export at `path`.
pub fn load_csv(path: impl AsRef<Path>, delimiter: u8) -> InsightsResult<EventTable> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| {
        InsightsError::Io(std::io::Error::new(
            e.kind(),
            format!("cannot open {}: {e}", path.display()),
        ))
    })?;
    let table = load_reader(file, delimiter)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        markets = table.markets().len(),
        months = table.months().len(),
        "Export loaded"
    );
    Ok(table)
}

/// Load and clean an export from any reader.
pub fn load_reader<R: Read>(reader: R, delimiter: u8) -> InsightsResult<EventTable> {
    let mut csv = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header = csv.byte_headers()?.clone();
    if header.is_empty() {
        return Err(InsightsError::MissingColumns(
            REQUIRED_COLUMNS.iter().map(|c| c.to_string()).collect(),
        ));
    }
    let (columns, ignored_columns) = ColumnIndex::from_header(&header)?;

    let mut report = LoadReport {
        ignored_columns,
        ..Default::default()
    };
    let mut rows = Vec::new();
    let mut record = ByteRecord::new();

    while csv.read_byte_record(&mut record)? {
        if record.iter().all(|cell| cell.iter().all(u8::is_ascii_whitespace)) {
            continue;
        }
        rows.push(clean_row(&columns, &record, &mut report));
    }
    report.rows = rows.len();

    if report.missing_dates > 0 {
        warn!(rows = report.missing_dates, "Rows with unreadable dates");
    }
    for (column, count) in &report.uncoercible {
        warn!(column = %column, cells = count, "Numeric cells coerced to missing");
    }

    Ok(EventTable::new(rows, report))
}

fn clean_row(columns: &ColumnIndex, record: &ByteRecord, report: &mut LoadReport) -> EventRecord {
    let date_cell = columns.cell(record, COL_DATE);
    let date = parse_date(&date_cell);
    if date.is_none() {
        report.missing_dates += 1;
    }

    let mut numbers = [None; NUMERIC_COLUMNS.len()];
    for (slot, column) in NUMERIC_COLUMNS.iter().enumerate() {
        let cell = columns.cell(record, column);
        numbers[slot] = parse_number(&cell);
        if numbers[slot].is_none() && !cell.trim().is_empty() {
            *report.uncoercible.entry(column.to_string()).or_default() += 1;
        }
    }
    let [visits, cost, conversions, revenue, new_conversions] = numbers;

    EventRecord {
        market: clean_category(&columns.cell(record, COL_MARKET)),
        channel: clean_category(&columns.cell(record, COL_CHANNEL)),
        source: clean_category(&columns.cell(record, COL_SOURCE)),
        campaign: clean_category(&columns.cell(record, COL_CAMPAIGN)),
        date,
        visits,
        cost,
        conversions,
        revenue,
        new_conversions,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Date;Market;Channel;Source;Campaign;Visits;Cost;\
Fospha Attribution Conversions;Fospha Attribution Revenue;Fospha Attribution New Conversions";

    fn load(body: &str) -> InsightsResult<EventTable> {
        let input = format!("{HEADER}\n{body}");
        load_reader(input.as_bytes(), b';')
    }

    #[test]
    fn test_load_and_clean_rows() {
        let table = load(
            "2024-01-15; uk ;paid social;meta;Spring Sale;1000;100;10;500;4\n\
             2024-02-01;US;EMAIL;klaviyo;newsletter;200;0;3;90;1\n",
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let first = &table.rows()[0];
        assert_eq!(first.market.as_deref(), Some("Uk"));
        assert_eq!(first.channel.as_deref(), Some("Paid Social"));
        assert_eq!(first.source.as_deref(), Some("Meta"));
        assert_eq!(first.month().as_deref(), Some("2024-01"));
        assert_eq!(first.cost, Some(100.0));
        assert_eq!(first.new_conversions, Some(4.0));

        let second = &table.rows()[1];
        assert_eq!(second.channel.as_deref(), Some("Email"));
        assert_eq!(second.cost, Some(0.0));
    }

    #[test]
    fn test_bad_cells_become_missing() {
        let table = load("garbage;UK;Paid Social;x;y;abc;;n/a;500;4\n").unwrap();

        let row = &table.rows()[0];
        assert_eq!(row.date, None);
        assert_eq!(row.visits, None);
        assert_eq!(row.cost, None);
        assert_eq!(row.conversions, None);
        assert_eq!(row.revenue, Some(500.0));

        let report = table.report();
        assert_eq!(report.missing_dates, 1);
        assert_eq!(report.uncoercible.get(COL_VISITS), Some(&1));
        assert_eq!(report.uncoercible.get(COL_CONVERSIONS), Some(&1));
        // Blank cells are missing but not counted as coercion failures.
        assert_eq!(report.uncoercible.get(COL_COST), None);
        assert_eq!(report.uncoercible_total(), 2);
    }

    #[test]
    fn test_short_rows_and_blank_lines() {
        let table = load("2024-01-15;UK;Paid Social\n;;;;;;;;;\n").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.rows()[0].cost, None);
        assert_eq!(table.rows()[0].channel.as_deref(), Some("Paid Social"));
    }

    #[test]
    fn test_missing_columns_is_fatal() {
        let input = "Date;Market;Channel\n2024-01-01;UK;Email\n";
        match load_reader(input.as_bytes(), b';') {
            Err(InsightsError::MissingColumns(cols)) => {
                assert!(cols.contains(&"Cost".to_string()));
                assert!(cols.contains(&COL_NEW_CONVERSIONS.to_string()));
                assert!(!cols.contains(&"Market".to_string()));
            }
            other => panic!("expected MissingColumns, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_input_is_fatal() {
        assert!(matches!(
            load_reader("".as_bytes(), b';'),
            Err(InsightsError::MissingColumns(_))
        ));
    }

    #[test]
    fn test_extra_and_reordered_columns() {
        let input = "Notes;Cost;Visits;Campaign;Source;Channel;Market;Date;\
Fospha Attribution New Conversions;Fospha Attribution Revenue;Fospha Attribution Conversions\n\
hello;50;500;c;s;Paid Shopping;DE;2024-03-02;2;250;5\n";
        let table = load_reader(input.as_bytes(), b';').unwrap();
        let row = &table.rows()[0];
        assert_eq!(row.market.as_deref(), Some("De"));
        assert_eq!(row.cost, Some(50.0));
        assert_eq!(row.conversions, Some(5.0));
        assert_eq!(row.new_conversions, Some(2.0));
        assert_eq!(table.report().ignored_columns, vec!["Notes".to_string()]);
    }

    #[test]
    fn test_load_csv_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "2024-01-15;UK;Paid Social;meta;c;1000;100;10;500;4").unwrap();
        let table = load_csv(file.path(), b';').unwrap();
        assert_eq!(table.len(), 1);
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "device unplugged"))
        }
    }

    #[test]
    fn test_read_failure_keeps_csv_source() {
        let err = load_reader(FailingReader, b';').unwrap_err();
        assert!(matches!(err, InsightsError::Csv(_)));
        let source = std::error::Error::source(&err).expect("csv error attached");
        assert!(source.to_string().contains("device unplugged"));
    }

    #[test]
    fn test_load_csv_missing_file() {
        let err = load_csv("/definitely/not/here.csv", b';').unwrap_err();
        assert!(matches!(err, InsightsError::Io(_)));
        assert!(err.to_string().contains("/definitely/not/here.csv"));
    }
}

//! Best-effort coercion of raw cells. Nothing here fails: a value that
//! cannot be read becomes `None`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%Y.%m.%d"];

/// Month-first forms are tried before day-first ones, so `03/04/2024` is
/// 4 March; `13/04/2024` can only be day-first and parses as 13 April.
const AMBIGUOUS_DATE_FORMATS: &[&str] = &[
    "%m/%d/%Y", "%d/%m/%Y", "%m-%d-%Y", "%d-%m-%Y", "%m.%d.%Y", "%d.%m.%Y",
];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
];

/// Parse a date cell permissively.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()) {
        return compact_date(value);
    }

    DATE_FORMATS
        .iter()
        .chain(AMBIGUOUS_DATE_FORMATS)
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        })
}

/// `YYYYMMDD`.
fn compact_date(value: &str) -> Option<NaiveDate> {
    let year = value[..4].parse().ok()?;
    let month = value[4..6].parse().ok()?;
    let day = value[6..].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse a numeric cell. Accepts a single decimal comma (`12,5`); empty
/// cells, text and non-finite values are missing.
pub fn parse_number(raw: &str) -> Option<f64> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = value.parse::<f64>().ok().or_else(|| {
        if value.matches(',').count() == 1 && !value.contains('.') {
            value.replace(',', ".").parse::<f64>().ok()
        } else {
            None
        }
    })?;

    parsed.is_finite().then_some(parsed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[test]
    fn test_parse_iso_dates() {
        assert_eq!(parse_date("2024-01-31"), ymd(2024, 1, 31));
        assert_eq!(parse_date(" 2024/02/05 "), ymd(2024, 2, 5));
        assert_eq!(parse_date("20240315"), ymd(2024, 3, 15));
    }

    #[test]
    fn test_parse_ambiguous_dates_month_first() {
        assert_eq!(parse_date("03/04/2024"), ymd(2024, 3, 4));
        assert_eq!(parse_date("13/04/2024"), ymd(2024, 4, 13));
        assert_eq!(parse_date("25.12.2023"), ymd(2023, 12, 25));
    }

    #[test]
    fn test_parse_datetimes() {
        assert_eq!(parse_date("2024-01-31 10:15:00"), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31T10:15:00"), ymd(2024, 1, 31));
        assert_eq!(parse_date("2024-01-31T10:15:00+02:00"), ymd(2024, 1, 31));
    }

    #[test]
    fn test_unparseable_dates_are_missing() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("not a date"), None);
        assert_eq!(parse_date("2024-13-45"), None);
    }

    #[test]
    fn test_parse_numbers() {
        assert_eq!(parse_number("100"), Some(100.0));
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number("12,5"), Some(12.5));
        assert_eq!(parse_number("-3"), Some(-3.0));
    }

    #[test]
    fn test_uncoercible_numbers_are_missing() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
        assert_eq!(parse_number("1,234.50"), None);
        assert_eq!(parse_number("1,2,3"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
    }
}

//! Sensor feed CSV export parser.
//!
//! The feed service exports one row per sample:
//!
//! ```text
//! created_at,entry_id,field1
//! 2024-05-01 06:30:00 UTC,1,42.5
//! ```
//!
//! Columns are located by header name. Timestamps are accepted as RFC 3339
//! or as `YYYY-MM-DD HH:MM:SS UTC`, and re-expressed in the feed's fixed
//! local offset. The value cell is passed through untouched; deciding what
//! a blank or "N/A" means is the normalizer's job.

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

use crate::model::{RawValue, Reading};

pub const TIMESTAMP_COLUMN: &str = "created_at";
pub const VALUE_COLUMN: &str = "field1";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IngestError {
    #[error("feed has no header row")]
    MissingHeader,
    #[error("feed header has no '{0}' column")]
    MissingColumn(&'static str),
}

/// Readings parsed from one feed export.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedFeed {
    pub readings: Vec<Reading>,
    /// Data rows dropped because their timestamp could not be parsed or the
    /// row was too short.
    pub skipped_rows: usize,
}

/// Parses a feed timestamp into `offset`.
pub fn parse_timestamp(s: &str, offset: FixedOffset) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&offset));
    }
    let naive = s.strip_suffix("UTC").unwrap_or(s).trim();
    NaiveDateTime::parse_from_str(naive, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc).with_timezone(&offset))
}

fn cell(field: &str) -> &str {
    field.trim().trim_matches('"')
}

pub fn parse_feed_csv(csv: &str, offset: FixedOffset) -> Result<ParsedFeed, IngestError> {
    let mut lines = csv.lines().filter(|l| !l.trim().is_empty());
    let header: Vec<&str> = lines
        .next()
        .ok_or(IngestError::MissingHeader)?
        .split(',')
        .map(cell)
        .collect();

    let ts_col = header
        .iter()
        .position(|h| *h == TIMESTAMP_COLUMN)
        .ok_or(IngestError::MissingColumn(TIMESTAMP_COLUMN))?;
    let value_col = header
        .iter()
        .position(|h| *h == VALUE_COLUMN)
        .ok_or(IngestError::MissingColumn(VALUE_COLUMN))?;

    let mut readings = Vec::new();
    let mut skipped_rows = 0;

    for line in lines {
        let fields: Vec<&str> = line.split(',').collect();
        let Some(timestamp) = fields
            .get(ts_col)
            .and_then(|f| parse_timestamp(cell(f), offset))
        else {
            skipped_rows += 1;
            continue;
        };
        // A row cut short before the value column is a missing value, not a
        // bad row: the sample time is still known.
        let raw_percent = fields
            .get(value_col)
            .map(|f| RawValue::from(cell(f)))
            .unwrap_or(RawValue::Missing);
        readings.push(Reading {
            timestamp,
            raw_percent,
        });
    }

    Ok(ParsedFeed {
        readings,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(19_800).unwrap()
    }

    const FEED: &str = "created_at,entry_id,field1
2024-05-01 06:30:00 UTC,1,42.5
2024-05-01 06:30:20 UTC,2,
2024-05-01T06:30:40+00:00,3,N/A
garbage,4,40
2024-05-01 06:31:00 UTC,5
";

    #[test]
    fn test_rows_parse_into_feed_offset() {
        let feed = parse_feed_csv(FEED, ist()).expect("valid header");
        assert_eq!(feed.readings.len(), 4);
        assert_eq!(
            feed.readings[0].timestamp,
            ist().with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
        assert_eq!(feed.readings[0].raw_percent, RawValue::Text("42.5".to_string()));
    }

    #[test]
    fn test_blank_and_placeholder_values_are_kept_raw() {
        let feed = parse_feed_csv(FEED, ist()).unwrap();
        assert_eq!(feed.readings[1].raw_percent, RawValue::Missing);
        assert_eq!(feed.readings[2].raw_percent, RawValue::Text("N/A".to_string()));
        assert_eq!(feed.readings[3].raw_percent, RawValue::Missing, "short row");
    }

    #[test]
    fn test_unparseable_timestamp_rows_are_skipped_and_counted() {
        let feed = parse_feed_csv(FEED, ist()).unwrap();
        assert_eq!(feed.skipped_rows, 1);
    }

    #[test]
    fn test_columns_located_by_name() {
        let csv = "field1,created_at\n55,2024-05-01 00:00:00 UTC\n";
        let feed = parse_feed_csv(csv, ist()).unwrap();
        assert_eq!(feed.readings.len(), 1);
        assert_eq!(feed.readings[0].raw_percent.as_percent(), Some(55.0));
    }

    #[test]
    fn test_missing_header_or_column_is_an_error() {
        assert_eq!(parse_feed_csv("", ist()), Err(IngestError::MissingHeader));
        assert_eq!(
            parse_feed_csv("created_at,entry_id\n", ist()),
            Err(IngestError::MissingColumn(VALUE_COLUMN))
        );
    }

    #[test]
    fn test_header_only_feed_is_empty() {
        let feed = parse_feed_csv("created_at,entry_id,field1\n", ist()).unwrap();
        assert!(feed.readings.is_empty());
        assert_eq!(feed.skipped_rows, 0);
    }
}

//! Raw fill percentage → absolute volume.

use chrono::FixedOffset;

use crate::config::MalformedPolicy;
use crate::model::{NormalizedPoint, Reading};

/// Result of normalizing one tank's readings.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub points: Vec<NormalizedPoint>,
    /// Readings whose value was not a finite number.
    pub malformed: usize,
}

/// Converts a fill percentage to liters, clamped to `[0, capacity]`.
pub fn percent_to_liters(percent: f64, capacity_liters: f64) -> f64 {
    (percent / 100.0 * capacity_liters).clamp(0.0, capacity_liters)
}

/// Normalizes readings in input order, re-expressing timestamps in `offset`.
///
/// Never fails. Malformed values become 0 L under `ZeroFill` (one output
/// point per reading) or are dropped under `Skip`.
pub fn normalize(
    readings: &[Reading],
    capacity_liters: f64,
    offset: FixedOffset,
    policy: MalformedPolicy,
) -> Normalized {
    let mut points = Vec::with_capacity(readings.len());
    let mut malformed = 0;

    for reading in readings {
        let percent = match reading.raw_percent.as_percent() {
            Some(p) => p,
            None => {
                malformed += 1;
                match policy {
                    MalformedPolicy::ZeroFill => 0.0,
                    MalformedPolicy::Skip => continue,
                }
            }
        };
        points.push(NormalizedPoint {
            timestamp: reading.timestamp.with_timezone(&offset),
            volume_liters: percent_to_liters(percent, capacity_liters),
        });
    }

    Normalized { points, malformed }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawValue;
    use chrono::{DateTime, TimeZone, Utc};

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(5 * 3600 + 30 * 60).unwrap()
    }

    fn at(minute: u32) -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, minute, 0).unwrap().fixed_offset()
    }

    fn readings(values: &[RawValue]) -> Vec<Reading> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| Reading {
                timestamp: at(i as u32),
                raw_percent: v.clone(),
            })
            .collect()
    }

    #[test]
    fn test_percent_scales_by_capacity() {
        assert_eq!(percent_to_liters(20.0, 10_000.0), 2_000.0);
        assert_eq!(percent_to_liters(100.0, 15_000.0), 15_000.0);
    }

    #[test]
    fn test_out_of_range_percent_is_clamped() {
        assert_eq!(percent_to_liters(130.0, 10_000.0), 10_000.0);
        assert_eq!(percent_to_liters(-4.0, 10_000.0), 0.0);
    }

    #[test]
    fn test_zero_fill_keeps_length_and_counts_malformed() {
        let input = readings(&[
            RawValue::Number(50.0),
            RawValue::Text("N/A".to_string()),
            RawValue::Missing,
            RawValue::Text("25".to_string()),
        ]);
        let out = normalize(&input, 1_000.0, ist(), MalformedPolicy::ZeroFill);
        let volumes: Vec<f64> = out.points.iter().map(|p| p.volume_liters).collect();
        assert_eq!(volumes, vec![500.0, 0.0, 0.0, 250.0]);
        assert_eq!(out.malformed, 2);
    }

    #[test]
    fn test_skip_policy_drops_malformed_readings() {
        let input = readings(&[
            RawValue::Number(50.0),
            RawValue::Text("N/A".to_string()),
            RawValue::Number(40.0),
        ]);
        let out = normalize(&input, 1_000.0, ist(), MalformedPolicy::Skip);
        assert_eq!(out.points.len(), 2);
        assert_eq!(out.malformed, 1);
        assert_eq!(out.points[1].timestamp, at(2), "surviving points keep their timestamps");
    }

    #[test]
    fn test_timestamps_are_expressed_in_feed_offset() {
        let input = readings(&[RawValue::Number(10.0)]);
        let out = normalize(&input, 1_000.0, ist(), MalformedPolicy::ZeroFill);
        let ts = out.points[0].timestamp;
        assert_eq!(ts, at(0), "same instant");
        assert_eq!(ts.offset().local_minus_utc(), 19_800);
        assert_eq!(ts.format("%H:%M").to_string(), "17:30");
    }

    #[test]
    fn test_empty_input_gives_empty_output() {
        let out = normalize(&[], 1_000.0, ist(), MalformedPolicy::ZeroFill);
        assert!(out.points.is_empty());
        assert_eq!(out.malformed, 0);
    }
}

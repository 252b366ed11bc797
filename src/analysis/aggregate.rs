//! Hourly and daily flow aggregation.
//!
//! Buckets are keyed by the floor of each point's timestamp in its own
//! offset, which the normalizer has already set to the feed's local time.
//! Keys are unique and come out in chronological order even when the input
//! timestamps are not monotonic.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, Timelike};
use serde::Serialize;

use crate::model::{FlowBucket, FlowPoint};

/// Aggregation period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    Hour,
    Day,
}

/// Everything the aggregator derives from one flow series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageSummary {
    pub hourly: Vec<FlowBucket>,
    pub daily: Vec<FlowBucket>,
    /// Mean of daily usage totals. `None` when there are no days.
    pub average_daily_usage: Option<f64>,
    /// Hour with the most usage, earliest on ties. `None` when there are no
    /// hours.
    pub peak_usage_hour: Option<FlowBucket>,
    pub total_inflow: f64,
    pub total_usage: f64,
}

/// Floors `ts` to the start of its hour or day, keeping its offset.
pub fn period_start(ts: DateTime<FixedOffset>, period: Period) -> DateTime<FixedOffset> {
    let floored = match period {
        Period::Hour => ts.with_minute(0),
        Period::Day => ts.with_hour(0).and_then(|t| t.with_minute(0)),
    };
    floored
        .and_then(|t| t.with_second(0))
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(ts)
}

/// Sums inflow and usage per period, in chronological order.
pub fn bucket(points: &[FlowPoint], period: Period) -> Vec<FlowBucket> {
    let mut buckets: BTreeMap<DateTime<FixedOffset>, (f64, f64)> = BTreeMap::new();
    for p in points {
        let entry = buckets
            .entry(period_start(p.timestamp, period))
            .or_insert((0.0, 0.0));
        entry.0 += p.inflow_liters;
        entry.1 += p.usage_liters;
    }
    buckets
        .into_iter()
        .map(|(period_start, (total_inflow, total_usage))| FlowBucket {
            period_start,
            total_inflow,
            total_usage,
        })
        .collect()
}

/// Mean of the buckets' usage totals, or `None` for an empty set.
pub fn average_usage(buckets: &[FlowBucket]) -> Option<f64> {
    if buckets.is_empty() {
        return None;
    }
    let total: f64 = buckets.iter().map(|b| b.total_usage).sum();
    Some(total / buckets.len() as f64)
}

/// Bucket with the highest usage; the earliest wins a tie.
pub fn peak_usage(buckets: &[FlowBucket]) -> Option<FlowBucket> {
    buckets.iter().fold(None, |best: Option<FlowBucket>, b| match best {
        Some(current)
            if current.total_usage > b.total_usage
                || (current.total_usage == b.total_usage
                    && current.period_start <= b.period_start) =>
        {
            Some(current)
        }
        _ => Some(*b),
    })
}

pub fn summarize(points: &[FlowPoint]) -> UsageSummary {
    let hourly = bucket(points, Period::Hour);
    let daily = bucket(points, Period::Day);
    UsageSummary {
        average_daily_usage: average_usage(&daily),
        peak_usage_hour: peak_usage(&hourly),
        total_inflow: points.iter().map(|p| p.inflow_liters).sum(),
        total_usage: points.iter().map(|p| p.usage_liters).sum(),
        hourly,
        daily,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TrendLabel;
    use chrono::TimeZone;

    fn ist() -> FixedOffset {
        FixedOffset::east_opt(19_800).unwrap()
    }

    fn local(d: u32, h: u32, m: u32) -> DateTime<FixedOffset> {
        ist().with_ymd_and_hms(2024, 5, d, h, m, 0).unwrap()
    }

    fn flow(ts: DateTime<FixedOffset>, inflow: f64, usage: f64) -> FlowPoint {
        FlowPoint {
            timestamp: ts,
            trend: TrendLabel::Ambiguous,
            inflow_liters: inflow,
            usage_liters: usage,
        }
    }

    #[test]
    fn test_period_start_floors_in_local_time() {
        let ts = local(1, 0, 45) + chrono::Duration::seconds(17);
        assert_eq!(period_start(ts, Period::Hour), local(1, 0, 0));
        assert_eq!(period_start(ts, Period::Day), local(1, 0, 0));
        assert_eq!(period_start(local(1, 23, 59), Period::Day), local(1, 0, 0));
    }

    #[test]
    fn test_local_midnight_splits_days_not_utc_midnight() {
        // 00:15 IST on May 2 is still May 1 in UTC.
        let points = [flow(local(1, 23, 50), 0.0, 10.0), flow(local(2, 0, 15), 0.0, 5.0)];
        let daily = bucket(&points, Period::Day);
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[1].period_start, local(2, 0, 0));
        assert_eq!(daily[1].total_usage, 5.0);
    }

    #[test]
    fn test_buckets_are_chronological_for_unordered_input() {
        let points = [
            flow(local(1, 14, 5), 1.0, 0.0),
            flow(local(1, 12, 30), 0.0, 2.0),
            flow(local(1, 14, 50), 3.0, 0.0),
            flow(local(1, 12, 10), 0.0, 4.0),
        ];
        let hourly = bucket(&points, Period::Hour);
        assert_eq!(hourly.len(), 2);
        assert_eq!(hourly[0].period_start, local(1, 12, 0));
        assert_eq!(hourly[0].total_usage, 6.0);
        assert_eq!(hourly[1].total_inflow, 4.0);
    }

    #[test]
    fn test_peak_tie_goes_to_earliest_hour() {
        let points = [
            flow(local(1, 8, 0), 0.0, 50.0),
            flow(local(1, 9, 0), 0.0, 80.0),
            flow(local(1, 10, 0), 0.0, 80.0),
        ];
        let peak = peak_usage(&bucket(&points, Period::Hour)).expect("has buckets");
        assert_eq!(peak.period_start, local(1, 9, 0));
    }

    #[test]
    fn test_average_daily_usage_over_days_present() {
        let points = [
            flow(local(1, 8, 0), 0.0, 300.0),
            flow(local(1, 9, 0), 0.0, 100.0),
            flow(local(3, 9, 0), 0.0, 200.0),
        ];
        let summary = summarize(&points);
        assert_eq!(summary.daily.len(), 2, "no bucket for the empty day in between");
        assert_eq!(summary.average_daily_usage, Some(300.0));
        assert_eq!(summary.total_usage, 600.0);
    }

    #[test]
    fn test_empty_flow_has_no_average_and_no_peak() {
        let summary = summarize(&[]);
        assert!(summary.hourly.is_empty());
        assert!(summary.daily.is_empty());
        assert_eq!(summary.average_daily_usage, None);
        assert_eq!(summary.peak_usage_hour, None);
        assert_eq!(summary.total_inflow, 0.0);
    }

    #[test]
    fn test_hourly_totals_conserve_point_totals() {
        let points: Vec<FlowPoint> = (0..300)
            .map(|i| {
                let ts = local(1, 0, 0) + chrono::Duration::seconds(97 * i);
                if i % 3 == 0 {
                    flow(ts, 0.25 * i as f64, 0.0)
                } else {
                    flow(ts, 0.0, 0.5)
                }
            })
            .collect();
        let summary = summarize(&points);
        let hourly_usage: f64 = summary.hourly.iter().map(|b| b.total_usage).sum();
        let hourly_inflow: f64 = summary.hourly.iter().map(|b| b.total_inflow).sum();
        assert!((hourly_usage - summary.total_usage).abs() < 1e-9);
        assert!((hourly_inflow - summary.total_inflow).abs() < 1e-9);
    }
}

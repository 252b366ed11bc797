//! Per-tank evaluation pipeline.
//!
//! `evaluate_tank` runs every stage in order over one tank's readings and
//! returns plain data. Nothing is cached between calls: the same readings
//! and config always produce the same report. Tanks share no state, so
//! `evaluate_fleet` runs them in parallel.

use chrono::{DateTime, FixedOffset};
use rayon::prelude::*;
use serde::Serialize;

use crate::alert::refill;
use crate::analysis::aggregate::{self, UsageSummary};
use crate::analysis::{flow, normalize, smoothing, trend};
use crate::config::PipelineConfig;
use crate::logging::{self, Stage};
use crate::model::{FlowPoint, Reading, RefillSignal, SmoothedPoint, Tank};

/// Everything derived for one tank in one evaluation pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TankReport {
    pub tank_id: String,
    pub capacity_liters: f64,
    pub series: Vec<SmoothedPoint>,
    pub flow: Vec<FlowPoint>,
    pub usage: UsageSummary,
    /// `None` when there were too few points to judge.
    pub refill: Option<RefillSignal>,
    pub malformed_readings: usize,
    pub last_reading_at: Option<DateTime<FixedOffset>>,
}

/// A tank together with its already-fetched readings.
#[derive(Debug, Clone)]
pub struct TankFeed {
    pub tank: Tank,
    pub readings: Vec<Reading>,
}

/// Number of places where a timestamp is earlier than its predecessor.
fn count_out_of_order(series: &[SmoothedPoint]) -> usize {
    series
        .windows(2)
        .filter(|w| w[1].timestamp < w[0].timestamp)
        .count()
}

pub fn evaluate_tank(tank: &Tank, readings: &[Reading], config: &PipelineConfig) -> TankReport {
    let id = tank.id();

    let normalized = normalize::normalize(
        readings,
        tank.capacity_liters(),
        config.feed_offset(),
        config.malformed_policy,
    );
    logging::log_malformed_readings(id, normalized.malformed, readings.len(), config.malformed_policy);

    let series = smoothing::smooth(&normalized.points, config.smoothing_window);
    let out_of_order = count_out_of_order(&series);
    if out_of_order > 0 {
        logging::warn(
            Stage::Smooth,
            Some(id),
            &format!("{} out-of-order timestamp(s) in feed", out_of_order),
        );
    }

    let labels = trend::classify(&series, config.trend_lag, config.slope_threshold);
    let flow = flow::decompose(&series, &labels);
    let usage = aggregate::summarize(&flow);
    logging::debug(
        Stage::Aggregate,
        Some(id),
        &format!(
            "{} points, {} hourly / {} daily buckets, usage {:.1} L, inflow {:.1} L",
            series.len(),
            usage.hourly.len(),
            usage.daily.len(),
            usage.total_usage,
            usage.total_inflow
        ),
    );

    let refill = refill::evaluate(tank, &series, &flow, &config.refill);
    match &refill {
        Some(signal) => logging::log_refill_signal(signal),
        None => logging::debug(Stage::Refill, Some(id), "too few points for a refill signal"),
    }

    TankReport {
        tank_id: id.to_string(),
        capacity_liters: tank.capacity_liters(),
        last_reading_at: series.iter().map(|p| p.timestamp).max(),
        malformed_readings: normalized.malformed,
        series,
        flow,
        usage,
        refill,
    }
}

/// Evaluates every feed, one rayon task per tank. Reports come back in
/// input order.
pub fn evaluate_fleet(feeds: &[TankFeed], config: &PipelineConfig) -> Vec<TankReport> {
    feeds
        .par_iter()
        .map(|feed| evaluate_tank(&feed.tank, &feed.readings, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RawValue, RefillSeverity, TrendLabel};
    use chrono::{Duration, TimeZone, Utc};

    fn t0() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap().fixed_offset()
    }

    fn tank(capacity: f64) -> Tank {
        Tank::new("MT3 - Tank 1", capacity).unwrap()
    }

    fn readings(percents: &[f64]) -> Vec<Reading> {
        percents
            .iter()
            .enumerate()
            .map(|(i, &p)| Reading::new(t0() + Duration::seconds(20 * i as i64), p))
            .collect()
    }

    #[test]
    fn test_empty_feed_gives_empty_report() {
        let report = evaluate_tank(&tank(10_000.0), &[], &PipelineConfig::default());
        assert!(report.series.is_empty());
        assert!(report.flow.is_empty());
        assert!(report.usage.hourly.is_empty());
        assert_eq!(report.usage.average_daily_usage, None);
        assert_eq!(report.usage.peak_usage_hour, None);
        assert_eq!(report.refill, None);
        assert_eq!(report.last_reading_at, None);
    }

    #[test]
    fn test_report_series_are_parallel() {
        let report = evaluate_tank(
            &tank(10_000.0),
            &readings(&[50.0, 49.0, 48.0, 47.0, 46.0, 45.0, 44.0, 43.0]),
            &PipelineConfig::default(),
        );
        assert_eq!(report.series.len(), 8);
        assert_eq!(report.flow.len(), 8);
        assert_eq!(report.flow[7].trend, TrendLabel::Usage);
        assert!(report.flow[7].usage_liters > 0.0);
    }

    #[test]
    fn test_last_reading_is_latest_instant_even_out_of_order() {
        let mut input = readings(&[10.0, 20.0, 30.0]);
        input.swap(1, 2);
        let report = evaluate_tank(&tank(1_000.0), &input, &PipelineConfig::default());
        assert_eq!(report.last_reading_at, Some(t0() + Duration::seconds(40)));
        assert_eq!(count_out_of_order(&report.series), 1);
    }

    #[test]
    fn test_malformed_count_is_reported() {
        let mut input = readings(&[40.0, 40.0]);
        input.push(Reading::new(t0() + Duration::seconds(60), RawValue::from("N/A")));
        let report = evaluate_tank(&tank(1_000.0), &input, &PipelineConfig::default());
        assert_eq!(report.malformed_readings, 1);
        assert_eq!(report.series[2].volume_liters, 0.0);
    }

    #[test]
    fn test_fleet_preserves_input_order() {
        let feeds: Vec<TankFeed> = (0..6)
            .map(|i| TankFeed {
                tank: Tank::new(format!("tank-{}", i), 1_000.0 * (i + 1) as f64).unwrap(),
                readings: readings(&[20.0; 60]),
            })
            .collect();
        let reports = evaluate_fleet(&feeds, &PipelineConfig::default());
        let ids: Vec<_> = reports.iter().map(|r| r.tank_id.as_str()).collect();
        assert_eq!(ids, vec!["tank-0", "tank-1", "tank-2", "tank-3", "tank-4", "tank-5"]);
        for r in &reports {
            // 20% is under the low mark, but a static level is not draining.
            assert_eq!(
                r.refill.as_ref().map(|s| s.severity),
                Some(RefillSeverity::NotNeeded),
                "unexpected refill signal for {}",
                r.tank_id
            );
        }
    }
}

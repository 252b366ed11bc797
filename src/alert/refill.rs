//! Refill recommendation.
//!
//! Looks at a fixed number of the most recent points (count-based, not
//! time-based, so irregular sampling only stretches the window) and combines
//! the depletion rate over that window with the tank's current level.
//!
//! Decision, in order:
//! - level below the critical fraction → Critical (if the tier is enabled)
//! - rate above threshold and level below the low fraction → Recommended
//! - otherwise → NotNeeded
//!
//! Fewer than two points in the window gives no signal at all.

use crate::config::{LevelSource, RateMethod, RefillConfig};
use crate::logging::{self, Stage};
use crate::model::{FlowPoint, RefillSeverity, RefillSignal, SmoothedPoint, Tank};

/// Trailing `len` elements of `items`.
fn tail<T>(items: &[T], len: usize) -> &[T] {
    &items[items.len().saturating_sub(len)..]
}

/// Smoothed level drop per second across `window`.
///
/// Positive while draining. Returns 0 when the window spans no time
/// (duplicate or out-of-order timestamps) and `None` for fewer than two
/// points.
pub fn level_drop_rate(window: &[SmoothedPoint]) -> Option<f64> {
    let (first, last) = match window {
        [first, .., last] => (first, last),
        _ => return None,
    };
    let span_secs = (last.timestamp - first.timestamp).num_milliseconds() as f64 / 1000.0;
    if span_secs > 0.0 {
        Some((first.smoothed_liters - last.smoothed_liters) / span_secs)
    } else {
        Some(0.0)
    }
}

/// Mean decomposed usage per sample across `window`, or `None` for fewer
/// than two points.
pub fn mean_usage_rate(window: &[FlowPoint]) -> Option<f64> {
    if window.len() < 2 {
        return None;
    }
    Some(window.iter().map(|p| p.usage_liters).sum::<f64>() / window.len() as f64)
}

/// Classifies a level and rate against the configured thresholds.
pub fn severity_for(level: f64, rate: f64, capacity_liters: f64, config: &RefillConfig) -> RefillSeverity {
    let critical_level =
        config.critical_tier && level < config.critical_level_fraction * capacity_liters;
    let low_level = level < config.low_level_fraction * capacity_liters;
    let high_usage_rate = rate > config.rate_threshold;

    if critical_level {
        RefillSeverity::Critical
    } else if high_usage_rate && low_level {
        RefillSeverity::Recommended
    } else {
        RefillSeverity::NotNeeded
    }
}

/// Evaluates the refill signal for one tank.
///
/// `series` and `flow` are the tank's full smoothed and flow sequences; only
/// the trailing `config.window_len` points are used. Returns `None` when the
/// window holds fewer than two points.
pub fn evaluate(
    tank: &Tank,
    series: &[SmoothedPoint],
    flow: &[FlowPoint],
    config: &RefillConfig,
) -> Option<RefillSignal> {
    let latest = series.last()?;
    let rate = match config.rate_method {
        RateMethod::LevelDrop => {
            let window = tail(series, config.window_len);
            let rate = level_drop_rate(window)?;
            if rate == 0.0 && window[0].timestamp >= window[window.len() - 1].timestamp {
                logging::debug(
                    Stage::Refill,
                    Some(tank.id()),
                    "refill window spans no time, depletion rate taken as 0",
                );
            }
            rate
        }
        RateMethod::MeanUsage => mean_usage_rate(tail(flow, config.window_len))?,
    };

    let current_level = match config.level_source {
        LevelSource::LatestReading => latest.volume_liters,
        LevelSource::Smoothed => latest.smoothed_liters,
    };

    let severity = severity_for(current_level, rate, tank.capacity_liters(), config);
    Some(RefillSignal {
        tank_id: tank.id().to_string(),
        current_level,
        depletion_rate: rate,
        recommended: severity != RefillSeverity::NotNeeded,
        severity,
    })
}

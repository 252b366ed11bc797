//! Lagged-slope trend classification.
//!
//! For point `i` the slope is `smoothed[i] - smoothed[i - lag]`. Above the
//! dead band it is inflow, below its negative it is usage, inside it is
//! ambiguous. Points without a usable reference `lag` steps back are
//! Unknown. O(1) per point; no regression.

use crate::model::{SmoothedPoint, TrendLabel};

/// Labels a single slope against the dead band `threshold`.
pub fn classify_slope(slope: f64, threshold: f64) -> TrendLabel {
    if !slope.is_finite() {
        TrendLabel::Unknown
    } else if slope > threshold {
        TrendLabel::Inflow
    } else if slope < -threshold {
        TrendLabel::Usage
    } else {
        TrendLabel::Ambiguous
    }
}

/// Labels every point of the smoothed series. Output is parallel to input.
pub fn classify(series: &[SmoothedPoint], lag: usize, threshold: f64) -> Vec<TrendLabel> {
    series
        .iter()
        .enumerate()
        .map(|(i, point)| {
            if lag == 0 || i < lag {
                return TrendLabel::Unknown;
            }
            let reference = series[i - lag].smoothed_liters;
            classify_slope(point.smoothed_liters - reference, threshold)
        })
        .collect()
}

//! Trailing moving average over the volume series.
//!
//! Entry `i` is the mean of the trailing `min(i + 1, window)` volumes, so the
//! window expands over the first readings and then slides. A running sum
//! keeps the whole pass O(n).

use crate::model::{NormalizedPoint, SmoothedPoint};

/// Smooths `points` with a trailing window of `window` readings.
///
/// A window of 0 is treated as 1 (no smoothing).
pub fn smooth(points: &[NormalizedPoint], window: usize) -> Vec<SmoothedPoint> {
    let window = window.max(1);
    let mut out = Vec::with_capacity(points.len());
    let mut sum = 0.0;

    for (i, point) in points.iter().enumerate() {
        sum += point.volume_liters;
        if i >= window {
            sum -= points[i - window].volume_liters;
        }
        let count = (i + 1).min(window);
        out.push(SmoothedPoint {
            timestamp: point.timestamp,
            volume_liters: point.volume_liters,
            smoothed_liters: sum / count as f64,
        });
    }

    out
}

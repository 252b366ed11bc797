//! Flow decomposition.
//!
//! Splits the first difference of the smoothed series into non-negative
//! inflow and usage, gated by the trend label. A single linear scan carrying
//! only the previous smoothed value.

use crate::model::{FlowPoint, SmoothedPoint, TrendLabel};

/// Decomposes `series` into flow points, one per input point.
///
/// A delta only counts when it agrees with the label: inflow needs an
/// Inflow label and a positive delta, usage a Usage label and a negative
/// one. Disagreements, Ambiguous, Unknown and the first point all
/// contribute zero to both sides.
///
/// `labels` is expected to be parallel to `series`; missing labels are
/// treated as Unknown.
pub fn decompose(series: &[SmoothedPoint], labels: &[TrendLabel]) -> Vec<FlowPoint> {
    let mut out = Vec::with_capacity(series.len());
    let mut previous: Option<f64> = None;

    for (i, point) in series.iter().enumerate() {
        let trend = labels.get(i).copied().unwrap_or(TrendLabel::Unknown);
        let delta = previous.map(|p| point.smoothed_liters - p);
        previous = Some(point.smoothed_liters);

        let (inflow_liters, usage_liters) = match (trend, delta) {
            (TrendLabel::Inflow, Some(d)) if d > 0.0 => (d, 0.0),
            (TrendLabel::Usage, Some(d)) if d < 0.0 => (0.0, -d),
            _ => (0.0, 0.0),
        };

        out.push(FlowPoint {
            timestamp: point.timestamp,
            trend,
            inflow_liters,
            usage_liters,
        });
    }

    out
}

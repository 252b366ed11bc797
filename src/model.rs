//! Core data types for the tank monitoring service.
//!
//! This module defines the shared domain model imported by all other modules.
//! It contains no analysis and no I/O, only types and the one validation rule
//! that belongs to the data itself (a tank must have a positive capacity).

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// The raw value cell of a sensor sample, as delivered by the feed.
///
/// Feeds occasionally deliver blanks or placeholder text ("N/A", "nan")
/// instead of a number, so the value is kept in whatever form it arrived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

impl RawValue {
    /// Returns the fill percentage if the value is a finite number.
    ///
    /// Text is trimmed and parsed as a float. NaN and infinities count as
    /// malformed, same as unparseable text and missing cells.
    pub fn as_percent(&self) -> Option<f64> {
        let value = match self {
            RawValue::Number(v) => *v,
            RawValue::Text(s) => s.trim().parse::<f64>().ok()?,
            RawValue::Missing => return None,
        };
        value.is_finite().then_some(value)
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            RawValue::Missing
        } else {
            RawValue::Text(value.to_string())
        }
    }
}

/// A single timestamped sample from a tank's fill-level sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub timestamp: DateTime<FixedOffset>,
    pub raw_percent: RawValue,
}

impl Reading {
    pub fn new(timestamp: DateTime<FixedOffset>, raw_percent: impl Into<RawValue>) -> Self {
        Self {
            timestamp,
            raw_percent: raw_percent.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tank configuration
// ---------------------------------------------------------------------------

/// Static configuration for one monitored tank.
///
/// Constructed through [`Tank::new`], which rejects non-positive capacities.
/// Fields are private so a `Tank` can never hold an invalid capacity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Tank {
    id: String,
    capacity_liters: f64,
}

impl Tank {
    pub fn new(id: impl Into<String>, capacity_liters: f64) -> Result<Self, TankError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(TankError::EmptyId);
        }
        if !capacity_liters.is_finite() || capacity_liters <= 0.0 {
            return Err(TankError::InvalidCapacity {
                id,
                capacity: capacity_liters,
            });
        }
        Ok(Self {
            id,
            capacity_liters,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity_liters(&self) -> f64 {
        self.capacity_liters
    }
}

// ---------------------------------------------------------------------------
// Derived series
// ---------------------------------------------------------------------------

/// A reading converted to an absolute volume, always within `[0, capacity]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub volume_liters: f64,
}

/// One entry of the smoothed series, parallel to the normalized input.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SmoothedPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub volume_liters: f64,
    pub smoothed_liters: f64,
}

/// Direction of the level trend at one point of the smoothed series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendLabel {
    /// Not enough history behind this point to compute a lagged slope.
    Unknown,
    Inflow,
    Usage,
    /// Slope within the dead band: static tank, or filling and draining at once.
    Ambiguous,
}

impl std::fmt::Display for TrendLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrendLabel::Unknown => write!(f, "unknown"),
            TrendLabel::Inflow => write!(f, "inflow"),
            TrendLabel::Usage => write!(f, "usage"),
            TrendLabel::Ambiguous => write!(f, "ambiguous"),
        }
    }
}

/// Non-negative inflow and usage attributed to one point.
///
/// At most one of `inflow_liters` / `usage_liters` is non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowPoint {
    pub timestamp: DateTime<FixedOffset>,
    pub trend: TrendLabel,
    pub inflow_liters: f64,
    pub usage_liters: f64,
}

/// Flow totals for one hour or one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FlowBucket {
    pub period_start: DateTime<FixedOffset>,
    pub total_inflow: f64,
    pub total_usage: f64,
}

// ---------------------------------------------------------------------------
// Refill signal
// ---------------------------------------------------------------------------

/// Refill advisory levels, in ascending order of urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillSeverity {
    NotNeeded,
    Recommended,
    Critical,
}

impl std::fmt::Display for RefillSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefillSeverity::NotNeeded => write!(f, "not needed"),
            RefillSeverity::Recommended => write!(f, "recommended"),
            RefillSeverity::Critical => write!(f, "critical"),
        }
    }
}

/// Outcome of one refill evaluation over the most recent window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefillSignal {
    pub tank_id: String,
    pub current_level: f64,
    /// Liters per second for the level-drop method, liters per sample for
    /// the mean-usage method. Positive means the tank is draining.
    pub depletion_rate: f64,
    pub recommended: bool,
    pub severity: RefillSeverity,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised when constructing a [`Tank`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TankError {
    #[error("tank '{id}' has invalid capacity {capacity} L (must be a positive number)")]
    InvalidCapacity { id: String, capacity: f64 },
    #[error("tank id must not be empty")]
    EmptyId,
}

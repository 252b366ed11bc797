//! Structured logging for the tank monitoring service.
//!
//! Thin facade over `tracing`: every record carries the pipeline stage that
//! emitted it and, when there is one, the tank id. `init_logger` installs a
//! `tracing-subscriber` formatter; `RUST_LOG` overrides the configured level.
//!
//! The analysis stages are pure and log nothing per point. Anomalies they
//! absorb are summarised once per evaluation through the helpers at the
//! bottom of this module.

use std::fmt;

use tracing_subscriber::EnvFilter;

use crate::config::MalformedPolicy;
use crate::model::RefillSignal;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn as_filter(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warning => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Ingest,
    Normalize,
    Smooth,
    Aggregate,
    Refill,
    Config,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Ingest => write!(f, "INGEST"),
            Stage::Normalize => write!(f, "NORM"),
            Stage::Smooth => write!(f, "SMOOTH"),
            Stage::Aggregate => write!(f, "AGG"),
            Stage::Refill => write!(f, "REFILL"),
            Stage::Config => write!(f, "CONFIG"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialisation
// ---------------------------------------------------------------------------

/// Installs the global subscriber. Safe to call more than once; later calls
/// are ignored (tests and the binary may both try).
pub fn init_logger(min_level: LogLevel, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(min_level.as_filter()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false);

    let result = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    if result.is_err() {
        tracing::debug!("logger already initialised");
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

pub fn info(stage: Stage, tank_id: Option<&str>, message: &str) {
    tracing::info!(stage = %stage, tank = tank_id.unwrap_or("-"), "{}", message);
}

pub fn warn(stage: Stage, tank_id: Option<&str>, message: &str) {
    tracing::warn!(stage = %stage, tank = tank_id.unwrap_or("-"), "{}", message);
}

pub fn error(stage: Stage, tank_id: Option<&str>, message: &str) {
    tracing::error!(stage = %stage, tank = tank_id.unwrap_or("-"), "{}", message);
}

pub fn debug(stage: Stage, tank_id: Option<&str>, message: &str) {
    tracing::debug!(stage = %stage, tank = tank_id.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Evaluation summaries
// ---------------------------------------------------------------------------

/// Level at which a batch of malformed readings is reported.
///
/// Zero-filled readings look like a drained tank downstream, so they are a
/// warning. Skipped readings only thin out the series.
pub fn malformed_level(count: usize, policy: MalformedPolicy) -> Option<LogLevel> {
    match (count, policy) {
        (0, _) => None,
        (_, MalformedPolicy::ZeroFill) => Some(LogLevel::Warning),
        (_, MalformedPolicy::Skip) => Some(LogLevel::Info),
    }
}

pub fn log_malformed_readings(tank_id: &str, count: usize, total: usize, policy: MalformedPolicy) {
    let action = match policy {
        MalformedPolicy::ZeroFill => "treated as empty",
        MalformedPolicy::Skip => "skipped",
    };
    let message = format!("{}/{} readings malformed, {}", count, total, action);
    match malformed_level(count, policy) {
        Some(LogLevel::Warning) => warn(Stage::Normalize, Some(tank_id), &message),
        Some(_) => info(Stage::Normalize, Some(tank_id), &message),
        None => {}
    }
}

pub fn log_refill_signal(signal: &RefillSignal) {
    use crate::model::RefillSeverity;

    let message = format!(
        "refill {}: level {:.2} L, depletion {:.3}",
        signal.severity, signal.current_level, signal.depletion_rate
    );
    match signal.severity {
        RefillSeverity::Critical => error(Stage::Refill, Some(&signal.tank_id), &message),
        RefillSeverity::Recommended => warn(Stage::Refill, Some(&signal.tank_id), &message),
        RefillSeverity::NotNeeded => debug(Stage::Refill, Some(&signal.tank_id), &message),
    }
}

/// Logs the outcome of a fleet evaluation.
pub fn log_run_summary(total: usize, evaluated: usize, failed: usize) {
    let message = format!(
        "Evaluation complete: {}/{} tanks evaluated, {} failed",
        evaluated, total, failed
    );

    if failed == 0 {
        info(Stage::System, None, &message);
    } else if evaluated == 0 {
        error(Stage::System, None, &message);
    } else {
        warn(Stage::System, None, &message);
    }
}

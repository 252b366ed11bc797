//! Monitor configuration loaded from TOML.
//!
//! Every tunable of the pipeline lives here: smoothing window, trend lag and
//! dead band, refill thresholds, and the tank list itself. Deployments have
//! disagreed on these values (rate thresholds anywhere from 0.05 to 1.0 L/s,
//! with or without a critical tier), so nothing below is hard-coded in the
//! analysis code.
//!
//! ## Loading order
//!
//! 1. `TANKMON_CONFIG` environment variable (path to a TOML file; may come
//!    from `.env`)
//! 2. `tankmon.toml` in the current working directory
//! 3. Built-in defaults, with no tanks configured
//!
//! A file that exists but fails to parse or validate is an error, not a
//! silent fallback: a bad capacity would make every derived volume wrong.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};

use crate::logging::{self, Stage};
use crate::model::{Tank, TankError};

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "TANKMON_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const DEFAULT_CONFIG_FILE: &str = "tankmon.toml";

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MonitorConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub tanks: Vec<TankConfig>,
}

/// Parameters shared by every tank's pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Trailing moving-average window, in readings.
    pub smoothing_window: usize,
    /// Distance, in readings, between the two ends of the trend slope.
    pub trend_lag: usize,
    /// Dead band (liters) within which a lagged slope is Ambiguous.
    pub slope_threshold: f64,
    /// Fixed offset of the feed's local time. 330 = UTC+5:30.
    pub utc_offset_minutes: i32,
    pub malformed_policy: MalformedPolicy,
    /// A feed whose newest reading is older than this is reported stale.
    pub stale_after_minutes: u64,
    pub refill: RefillConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            smoothing_window: 50,
            trend_lag: 5,
            slope_threshold: 0.01,
            utc_offset_minutes: 330,
            malformed_policy: MalformedPolicy::ZeroFill,
            stale_after_minutes: 60,
            refill: RefillConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// The feed's local offset. Falls back to UTC if the configured minutes
    /// are out of range (rejected by `validate` for loaded configs).
    pub fn feed_offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| Utc.fix())
    }
}

/// What to do with a reading whose value is not a finite number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MalformedPolicy {
    /// Treat the reading as an empty tank. Matches the historical behaviour,
    /// but a bad reading then looks like a sudden drain.
    ZeroFill,
    /// Drop the reading before smoothing.
    Skip,
}

/// How the refill advisor measures depletion over its window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RateMethod {
    /// Smoothed level drop across the window divided by elapsed seconds (L/s).
    LevelDrop,
    /// Mean decomposed usage per sample across the window (L/sample).
    MeanUsage,
}

/// Which value counts as the tank's current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelSource {
    /// Newest smoothed value. Lags real drops by up to half a window, but a
    /// single zero-filled reading cannot pull it to empty.
    Smoothed,
    /// Newest normalized (unsmoothed) volume.
    LatestReading,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefillConfig {
    /// Number of most recent points the advisor looks at (~15 min at 20 s).
    pub window_len: usize,
    /// Depletion rate above which usage counts as high, in `rate_method` units.
    pub rate_threshold: f64,
    pub rate_method: RateMethod,
    pub level_source: LevelSource,
    /// Fraction of capacity under which the level counts as low.
    pub low_level_fraction: f64,
    /// Fraction of capacity under which a refill is critical.
    pub critical_level_fraction: f64,
    /// Disables the critical tier entirely when false.
    pub critical_tier: bool,
}

impl Default for RefillConfig {
    fn default() -> Self {
        Self {
            window_len: 45,
            rate_threshold: 0.05,
            rate_method: RateMethod::LevelDrop,
            level_source: LevelSource::Smoothed,
            low_level_fraction: 0.3,
            critical_level_fraction: 0.15,
            critical_tier: true,
        }
    }
}

/// One `[[tanks]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TankConfig {
    pub id: String,
    pub capacity_liters: f64,
    /// Feed export read by the batch runner. Not used by the pipeline.
    #[serde(default)]
    pub feed_path: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config I/O error ({path}): {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("config parse error ({origin}): {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("config validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),
    #[error(transparent)]
    Tank(#[from] TankError),
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl MonitorConfig {
    /// Loads configuration using the search order in the module docs.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let config = Self::load_from_file(Path::new(&path))?;
            logging::info(
                Stage::Config,
                None,
                &format!("Loaded {} tank(s) from {}", config.tanks.len(), path),
            );
            return Ok(config);
        }

        let local = Path::new(DEFAULT_CONFIG_FILE);
        if local.exists() {
            let config = Self::load_from_file(local)?;
            logging::info(
                Stage::Config,
                None,
                &format!("Loaded {} tank(s) from ./{}", config.tanks.len(), DEFAULT_CONFIG_FILE),
            );
            return Ok(config);
        }

        logging::info(
            Stage::Config,
            None,
            &format!("No {} found, using built-in defaults", DEFAULT_CONFIG_FILE),
        );
        Ok(Self::default())
    }

    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&contents, &path.display().to_string())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        Self::parse(contents, "<inline>")
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(contents).map_err(|source| ConfigError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every parameter and tank entry, reporting all problems at once.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let p = &self.pipeline;
        let r = &p.refill;
        let mut errors: Vec<String> = Vec::new();

        if p.smoothing_window == 0 {
            errors.push("pipeline.smoothing_window must be at least 1".to_string());
        }
        if p.trend_lag == 0 {
            errors.push("pipeline.trend_lag must be at least 1".to_string());
        }
        if !p.slope_threshold.is_finite() || p.slope_threshold < 0.0 {
            errors.push(format!(
                "pipeline.slope_threshold must be a non-negative number, got {}",
                p.slope_threshold
            ));
        }
        if p.utc_offset_minutes.unsigned_abs() >= 24 * 60 {
            errors.push(format!(
                "pipeline.utc_offset_minutes must be within ±1439, got {}",
                p.utc_offset_minutes
            ));
        }
        if r.window_len < 2 {
            errors.push(format!(
                "pipeline.refill.window_len must be at least 2, got {}",
                r.window_len
            ));
        }
        if !r.rate_threshold.is_finite() {
            errors.push("pipeline.refill.rate_threshold must be finite".to_string());
        }
        for (name, value) in [
            ("low_level_fraction", r.low_level_fraction),
            ("critical_level_fraction", r.critical_level_fraction),
        ] {
            if !(value > 0.0 && value <= 1.0) {
                errors.push(format!(
                    "pipeline.refill.{} must be in (0, 1], got {}",
                    name, value
                ));
            }
        }
        if r.critical_tier && r.critical_level_fraction >= r.low_level_fraction {
            errors.push(format!(
                "pipeline.refill.critical_level_fraction ({}) must be below low_level_fraction ({})",
                r.critical_level_fraction, r.low_level_fraction
            ));
        }

        let mut seen = HashSet::new();
        for tank in &self.tanks {
            if !seen.insert(tank.id.as_str()) {
                errors.push(format!("duplicate tank id '{}'", tank.id));
            }
            if let Err(e) = Tank::new(tank.id.as_str(), tank.capacity_liters) {
                errors.push(e.to_string());
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Builds validated [`Tank`] values in config order.
    pub fn build_tanks(&self) -> Result<Vec<Tank>, ConfigError> {
        self.tanks
            .iter()
            .map(|t| Tank::new(t.id.as_str(), t.capacity_liters).map_err(ConfigError::from))
            .collect()
    }
}

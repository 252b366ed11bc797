//! Registry of configured tanks.
//!
//! Built from `MonitorConfig` at startup and passed to whoever needs it.
//! There is no process-wide tank table; two registries with different tanks
//! can coexist (tests rely on this).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{ConfigError, MonitorConfig};
use crate::model::Tank;

#[derive(Debug, Clone)]
struct Entry {
    tank: Tank,
    feed_path: Option<PathBuf>,
}

/// Configured tanks in config order, with lookup by id.
#[derive(Debug, Clone, Default)]
pub struct TankRegistry {
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
}

impl TankRegistry {
    /// Builds the registry, rejecting invalid capacities and duplicate ids.
    pub fn from_config(config: &MonitorConfig) -> Result<Self, ConfigError> {
        let mut registry = Self::default();
        for (tank, tank_config) in config.build_tanks()?.into_iter().zip(&config.tanks) {
            registry.insert(tank, tank_config.feed_path.clone())?;
        }
        Ok(registry)
    }

    pub fn insert(&mut self, tank: Tank, feed_path: Option<PathBuf>) -> Result<(), ConfigError> {
        if self.index.contains_key(tank.id()) {
            return Err(ConfigError::Validation(vec![format!(
                "duplicate tank id '{}'",
                tank.id()
            )]));
        }
        self.index.insert(tank.id().to_string(), self.entries.len());
        self.entries.push(Entry { tank, feed_path });
        Ok(())
    }

    pub fn feed_path(&self, id: &str) -> Option<&Path> {
        self.index
            .get(id)
            .and_then(|&i| self.entries[i].feed_path.as_deref())
    }

    pub fn tanks(&self) -> impl Iterator<Item = &Tank> {
        self.entries.iter().map(|e| &e.tank)
    }

    pub fn ids(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tank.id()).collect()
    }

    /// Total capacity across all tanks, in liters.
    pub fn total_capacity_liters(&self) -> f64 {
        self.entries.iter().map(|e| e.tank.capacity_liters()).sum()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

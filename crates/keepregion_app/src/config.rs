//! Application configuration.
//!
//! Read from `config.json` in the data directory. A missing file is written
//! with defaults; an unreadable one falls back to defaults.

use std::fs;
use std::path::Path;

use anyhow::Result;
use keepregion_model::MAX_RADIUS;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Configuration file name inside the data directory.
pub const CONFIG_FILE_NAME: &str = "config.json";

/// Default maximum radius for regular users.
pub const DEFAULT_MAX_RADIUS: u32 = 16;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Limits enforced by the command layer.
    #[serde(default)]
    pub limits: Limits,
}

/// Numeric limits consumed by the command layer only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Limits {
    /// Largest radius a regular user may declare.
    #[serde(default = "default_max_radius")]
    pub max_radius: u32,
    /// Largest radius an admin may declare; `max_radius` when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_radius_admin: Option<u32>,
    /// Region cap for regular users; `0` means unlimited.
    #[serde(default)]
    pub max_regions_total: usize,
}

fn default_max_radius() -> u32 {
    DEFAULT_MAX_RADIUS
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_radius: DEFAULT_MAX_RADIUS,
            max_radius_admin: None,
            max_regions_total: 0,
        }
    }
}

impl Limits {
    /// The largest radius the caller may use, never above [`MAX_RADIUS`].
    #[must_use]
    pub fn allowed_radius(&self, admin: bool) -> u32 {
        let configured = if admin {
            self.max_radius_admin.unwrap_or(self.max_radius)
        } else {
            self.max_radius
        };
        configured.min(MAX_RADIUS)
    }

    /// Returns `true` if a regular user may not add another region.
    #[must_use]
    pub fn region_cap_reached(&self, total: usize) -> bool {
        self.max_regions_total > 0 && total >= self.max_regions_total
    }
}

impl AppConfig {
    /// Load `config.json` from `dir`, writing defaults if it does not exist.
    #[must_use]
    pub fn load_or_init(dir: &Path) -> Self {
        let path = dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            let config = Self::default();
            info!(path = %path.display(), "writing default configuration");
            if let Err(e) = config.write(&path) {
                warn!(path = %path.display(), error = %e, "failed to write default configuration");
            }
            return config;
        }

        match Self::read(&path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid configuration, using defaults");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}

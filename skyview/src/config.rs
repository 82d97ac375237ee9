//! Viewer tuning parameters.
//!
//! Stored as pretty-printed JSON, by default at `~/.skyview/config.json`.
//! Every field has a default, so a partial file (or none at all) is valid.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::arc::DEFAULT_ARC_SEGMENTS;
use crate::celestial::{
    DEFAULT_DISK_MAGNITUDE_CUTOFF, DEFAULT_DISK_ROTATION_DEG, DEFAULT_HORIZON_DEG,
};
use crate::picking::{DEFAULT_MAX_PICK_MAGNITUDE, DEFAULT_MIN_SELECTION_DISTANCE};
use crate::view::{DEFAULT_FOV_DEG, MAX_FOV_DEG, MIN_FOV_DEG};

/// File name of the config inside the store directory
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunable parameters for the views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SkyConfig {
    /// Radius of the star sphere in world units
    pub sphere_radius: f64,
    /// Samples per constellation arc
    pub arc_segments: usize,
    /// Pick radius in pixels
    pub min_selection_distance: f64,
    /// Faintest pickable magnitude
    pub max_pick_magnitude: f64,
    /// Disk horizon threshold in degrees
    pub horizon_deg: f64,
    /// Faintest magnitude drawn on the disk
    pub disk_magnitude_cutoff: f64,
    /// Disk azimuth rotation in degrees
    pub disk_rotation_deg: f64,
    /// Initial vertical field of view in degrees
    pub fov_deg: f64,
    pub min_fov_deg: f64,
    pub max_fov_deg: f64,
}

impl Default for SkyConfig {
    fn default() -> Self {
        Self {
            sphere_radius: 1000.0,
            arc_segments: DEFAULT_ARC_SEGMENTS,
            min_selection_distance: DEFAULT_MIN_SELECTION_DISTANCE,
            max_pick_magnitude: DEFAULT_MAX_PICK_MAGNITUDE,
            horizon_deg: DEFAULT_HORIZON_DEG,
            disk_magnitude_cutoff: DEFAULT_DISK_MAGNITUDE_CUTOFF,
            disk_rotation_deg: DEFAULT_DISK_ROTATION_DEG,
            fov_deg: DEFAULT_FOV_DEG,
            min_fov_deg: MIN_FOV_DEG,
            max_fov_deg: MAX_FOV_DEG,
        }
    }
}

impl SkyConfig {
    /// Default location (~/.skyview/config.json)
    pub fn default_path() -> Option<PathBuf> {
        let home = std::env::var("HOME").ok()?;
        Some(PathBuf::from(home).join(".skyview").join(CONFIG_FILE_NAME))
    }

    /// Load and validate a config file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise return defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sphere_radius.is_nan() || self.sphere_radius <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "sphere_radius must be positive, got {}",
                self.sphere_radius
            )));
        }
        let fov_ok = self.min_fov_deg > 0.0
            && self.min_fov_deg <= self.max_fov_deg
            && self.max_fov_deg < 180.0;
        if !fov_ok {
            return Err(ConfigError::Invalid(format!(
                "fov bounds {}..{} are not a valid range",
                self.min_fov_deg, self.max_fov_deg
            )));
        }
        if self.min_selection_distance < 0.0 {
            return Err(ConfigError::Invalid(
                "min_selection_distance must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

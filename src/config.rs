use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::emission::MAX_PARTICLES;
use crate::error::ConfigError;
use crate::particles::{FoamParams, FountainParams, RenderOptions, SiteTransform};

/// Capacity and tunables used for every foam emitter the system creates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FoamSettings {
    pub capacity: usize,
    #[serde(flatten)]
    pub params: FoamParams,
}

impl Default for FoamSettings {
    fn default() -> Self {
        Self {
            capacity: 200,
            params: FoamParams::default(),
        }
    }
}

/// Capacity and tunables used for every fountain emitter the system creates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FountainSettings {
    pub capacity: usize,
    #[serde(flatten)]
    pub params: FountainParams,
}

impl Default for FountainSettings {
    fn default() -> Self {
        Self {
            capacity: 25,
            params: FountainParams::default(),
        }
    }
}

/// Effects configuration, usually loaded from TOML
///
/// ```toml
/// seed = 42
///
/// [fountain]
/// capacity = 25
/// height_threshold = 0.05
/// clash_resolution = "buffered"
///
/// [fountain.damping]
/// law = "time_scaled"
/// retention = 0.8
/// reference_dt = 0.016666668
///
/// [sites]
/// scale = [2.0, 1.0, 2.0]
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsConfig {
    /// Base seed for every emitter's generator; entropy when absent
    pub seed: Option<u64>,
    pub foam: FoamSettings,
    pub fountain: FountainSettings,
    pub render: RenderOptions,
    pub sites: SiteTransform,
}

impl EffectsConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: EffectsConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&raw)?;
        log::info!("Loaded effects config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let result = check_capacity("foam", self.foam.capacity)
            .and_then(|_| check_capacity("fountain", self.fountain.capacity))
            .and_then(|_| self.foam.params.validate())
            .and_then(|_| self.fountain.params.validate())
            .and_then(|_| {
                if self.sites.scale.is_finite() {
                    Ok(())
                } else {
                    Err("site scale must be finite".to_string())
                }
            });

        result.map_err(|reason| {
            log::warn!("Rejected effects config: {}", reason);
            ConfigError::Invalid(reason)
        })
    }
}

fn check_capacity(kind: &str, capacity: usize) -> Result<(), String> {
    if capacity > MAX_PARTICLES {
        return Err(format!("{kind} capacity {capacity} exceeds the limit of {MAX_PARTICLES}"));
    }
    Ok(())
}

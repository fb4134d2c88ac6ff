use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::core::{
    DEFAULT_BOUNDARY_MARGIN_M, DEFAULT_MAX_EVENTS_PER_PROCESS, DEFAULT_MAX_GEOFENCES,
};
use crate::geofence::GeofenceRegion;
use crate::processing::DistanceModel;
use crate::validation::FixValidationConfig;

/// Provider-wide configuration parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Capacity of the geofence registry
    pub max_geofences: usize,
    /// Bound on driver events handled by one `process()` call
    pub max_events_per_process: usize,
    /// Width of the boundary band around each region's radius (meters)
    pub boundary_margin_m: f64,
    /// Distance formula for geofence classification
    pub distance_model: DistanceModel,
    /// Size of the producer-side event buffer
    pub event_queue_capacity: usize,
    /// Fix plausibility checks
    pub validation: FixValidationConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            max_geofences: DEFAULT_MAX_GEOFENCES,
            max_events_per_process: DEFAULT_MAX_EVENTS_PER_PROCESS,
            boundary_margin_m: DEFAULT_BOUNDARY_MARGIN_M,
            distance_model: DistanceModel::GreatCircle,
            event_queue_capacity: 64,
            validation: FixValidationConfig::default(),
        }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid {parameter} = {value}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        value: String,
        reason: &'static str,
    },
}

fn read_file(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })
}

impl ProviderConfig {
    /// Parse and validate a JSON document
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = read_file(path.as_ref())?;
        Self::from_json_str(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_events_per_process == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "max_events_per_process",
                value: self.max_events_per_process.to_string(),
                reason: "must be at least 1",
            });
        }

        if !self.boundary_margin_m.is_finite() || self.boundary_margin_m < 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "boundary_margin_m",
                value: self.boundary_margin_m.to_string(),
                reason: "must be a finite, non-negative distance",
            });
        }

        if self.event_queue_capacity == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "event_queue_capacity",
                value: self.event_queue_capacity.to_string(),
                reason: "must be at least 1",
            });
        }

        let altitude = self.validation.max_abs_altitude_m;
        if !altitude.is_finite() || altitude <= 0.0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "validation.max_abs_altitude_m",
                value: altitude.to_string(),
                reason: "must be a positive distance",
            });
        }

        Ok(())
    }
}

/// A geofence set stored as JSON: `{ "geofences": [ ... ] }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceSetFile {
    pub geofences: Vec<GeofenceRegion>,
}

impl GeofenceSetFile {
    /// Parse a geofence set. Ids are checked while parsing; geometry and
    /// capacity are checked when the set is configured.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = read_file(path.as_ref())?;
        Self::from_json_str(&json)
    }
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::Fix;

/// Configuration for fix plausibility checks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixValidationConfig {
    /// Minimum satellites (all constellations) for a fix to count as valid
    pub min_satellites: u32,
    /// Largest believable altitude magnitude (meters)
    pub max_abs_altitude_m: f64,
}

impl Default for FixValidationConfig {
    fn default() -> Self {
        Self {
            min_satellites: 0,
            max_abs_altitude_m: 50_000.0,
        }
    }
}

/// Reasons a fix is not usable as a position
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FixRejection {
    #[error("receiver reported no position solution")]
    NoSolution,
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
    #[error("latitude {0} outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("longitude {0} outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("altitude {altitude_m} m exceeds {limit_m} m")]
    AltitudeOutOfRange { altitude_m: f64, limit_m: f64 },
    #[error("{count} satellites used, at least {required} required")]
    TooFewSatellites { count: u32, required: u32 },
}

/// Checks fixes from the driver before they are stored or evaluated
#[derive(Debug, Clone, Default)]
pub struct FixValidator {
    config: FixValidationConfig,
}

impl FixValidator {
    pub fn new(config: FixValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FixValidationConfig {
        &self.config
    }

    /// Ok when the fix can be used as a position
    pub fn check(&self, fix: &Fix) -> Result<(), FixRejection> {
        if !fix.valid {
            return Err(FixRejection::NoSolution);
        }

        for (field, value) in [
            ("latitude", fix.latitude),
            ("longitude", fix.longitude),
            ("altitude", fix.altitude),
        ] {
            if !value.is_finite() {
                return Err(FixRejection::NonFinite { field });
            }
        }

        if fix.latitude.abs() > 90.0 {
            return Err(FixRejection::LatitudeOutOfRange(fix.latitude));
        }
        if fix.longitude.abs() > 180.0 {
            return Err(FixRejection::LongitudeOutOfRange(fix.longitude));
        }
        if fix.altitude.abs() > self.config.max_abs_altitude_m {
            return Err(FixRejection::AltitudeOutOfRange {
                altitude_m: fix.altitude,
                limit_m: self.config.max_abs_altitude_m,
            });
        }

        if fix.satellite_count() < self.config.min_satellites {
            return Err(FixRejection::TooFewSatellites {
                count: fix.satellite_count(),
                required: self.config.min_satellites,
            });
        }

        Ok(())
    }

    /// The fix as the pipeline should see it: implausible fixes lose their
    /// valid flag, everything else passes through unchanged
    pub fn sanitize(&self, fix: Fix) -> (Fix, Option<FixRejection>) {
        match self.check(&fix) {
            Ok(()) => (fix, None),
            Err(rejection) => (Fix { valid: false, ..fix }, Some(rejection)),
        }
    }
}

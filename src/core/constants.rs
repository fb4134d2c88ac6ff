//! Receiver limits and geodesy constants

/// Layout version stamped into every `Fix` produced by this crate
pub const FIX_LAYOUT_VERSION: u32 = 1;

/// Maximum length of a geofence identifier, in bytes
pub const GEOFENCE_ID_MAX_SIZE: usize = 32;

/// Default number of geofence regions a registry accepts
pub const DEFAULT_MAX_GEOFENCES: usize = 8;

/// Default bound on driver events drained by a single `process()` call
pub const DEFAULT_MAX_EVENTS_PER_PROCESS: usize = 16;

/// Default width of the boundary band on either side of a region's radius (meters)
pub const DEFAULT_BOUNDARY_MARGIN_M: f64 = 5.0;

/// Mean Earth radius (IUGG), used for great-circle distances (meters)
pub const EARTH_MEAN_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude, used by the planar approximation
pub const METERS_PER_DEGREE: f64 = 111_320.0;

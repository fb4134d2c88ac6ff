//! Geofence configuration errors

use thiserror::Error;

/// Reasons a geofence configuration is rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeofenceError {
    #[error("geofence id is {len} bytes, maximum is {max}")]
    IdTooLong { len: usize, max: usize },
    #[error("geofence id is empty")]
    EmptyId,
    #[error("geofence id {id:?} appears more than once")]
    DuplicateId { id: String },
    #[error("geofence {id:?}: radius {radius_m} m is not a positive finite value")]
    InvalidRadius { id: String, radius_m: f64 },
    #[error("geofence {id:?}: radius {radius_m} m does not exceed the {margin_m} m boundary margin")]
    RadiusWithinMargin { id: String, radius_m: f64, margin_m: f64 },
    #[error("geofence {id:?}: center ({latitude}, {longitude}) is not a valid coordinate")]
    InvalidCenter { id: String, latitude: f64, longitude: f64 },
    #[error("{requested} geofences requested, capacity is {capacity}")]
    MaxExceeded { requested: usize, capacity: usize },
    #[error("not enough memory to stage {requested} geofences")]
    NoMemory { requested: usize },
}

//! Geofence regions, their registry and transition evaluation

pub mod error;
pub mod region;
pub mod registry;
pub mod evaluator;

pub use error::GeofenceError;
pub use region::{Expiration, GeofenceId, GeofenceRegion, GeofenceStatus, TransitionMask};
pub use registry::{ActiveRegion, GeofenceRegistry, StagedGeofences};
pub use evaluator::{GeofenceEvaluator, TransitionEvent};

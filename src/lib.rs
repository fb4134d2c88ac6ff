//! GNSS Location Provider
//!
//! A hardware-independent location provider for GNSS receivers. A chip
//! driver behind the `GnssDriver` trait feeds decoded fixes into a pipeline
//! that keeps the latest valid location, evaluates circular geofences for
//! enter, exit and dwell transitions, and delivers both to host callbacks.

pub mod core;
pub mod hardware;
pub mod validation;
pub mod processing;
pub mod geofence;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use core::{Fix, GpsTime, PowerMode, FIX_LAYOUT_VERSION, GEOFENCE_ID_MAX_SIZE};
pub use hardware::{
    event_feed, DriverError, DriverEvent, DriverResult, EventFeed, EventProducer, GeofenceResponse,
    GnssDriver, MockDriver,
};
pub use geofence::{
    Expiration, GeofenceError, GeofenceEvaluator, GeofenceId, GeofenceRegion, GeofenceRegistry,
    GeofenceStatus, TransitionEvent, TransitionMask,
};
pub use processing::{DistanceModel, LocationStore};
pub use validation::{FixValidationConfig, FixValidator};
pub use api::{
    Clock, CommandSender, ErrorCode, GpsProvider, ManualClock, ProviderCommand, ProviderError,
    ProviderResult, ProviderState, SystemClock,
};
pub use utils::{ConfigError, GeofenceSetFile, ProviderConfig};

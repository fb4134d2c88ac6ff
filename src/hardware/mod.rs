//! Hardware abstraction layer for GNSS chip drivers
//! 
//! The provider depends only on the `GnssDriver` trait. Concrete vendor
//! drivers parse the receiver wire protocol on their own and hand decoded
//! events to the provider through `poll_event`.

pub mod driver;
pub mod feed;
pub mod mock;
pub mod error;

pub use driver::GnssDriver;
pub use feed::{event_feed, EventFeed, EventProducer, FeedError};
pub use mock::{MockDriver, MockDriverStats};
pub use error::{DriverError, DriverResult};

use crate::core::Fix;

/// Acknowledgements the receiver sends for geofence commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeofenceResponse {
    /// Region configuration accepted by the chip
    ConfigOk,
    /// Region configuration refused by the chip
    ConfigFailed,
    /// Geofence status query answered
    RequestOk,
    /// Geofence status query failed
    RequestFailed,
}

impl GeofenceResponse {
    pub fn is_success(&self) -> bool {
        matches!(self, GeofenceResponse::ConfigOk | GeofenceResponse::RequestOk)
    }
}

/// Decoded event handed from the driver to the provider
#[derive(Debug, Clone, PartialEq)]
pub enum DriverEvent {
    /// A position report, valid or not
    Fix(Fix),
    /// Response to an earlier geofence command
    GeofenceResponse(GeofenceResponse),
}

impl From<Fix> for DriverEvent {
    fn from(fix: Fix) -> Self {
        DriverEvent::Fix(fix)
    }
}

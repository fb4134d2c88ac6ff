//! Provider result codes, errors and lifecycle state

use thiserror::Error;

use crate::geofence::GeofenceError;
use crate::hardware::DriverError;

/// Wire-level status codes shared with chip drivers and host applications.
///
/// The values up to `OdoNotImplemented` match the receiver's native codes.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    None = 0,
    GeofencesCfg = 1,
    GeofencesReq = 2,
    GeofenceNotImplemented = 3,
    LogCfg = 4,
    LogStart = 5,
    LogStop = 6,
    LogErase = 7,
    LogReqStatus = 8,
    LogReqQuery = 9,
    LogNotImplemented = 10,
    OdoStart = 11,
    OdoStop = 12,
    OdoReset = 13,
    OdoNotImplemented = 14,
    GeofenceMaxExceeded = 15,
    NoMemory = 16,
    /// Driver failure outside the geofence, log and odometer families
    DriverFault = 17,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    pub fn from_u32(code: u32) -> Option<Self> {
        let code = match code {
            0 => ErrorCode::None,
            1 => ErrorCode::GeofencesCfg,
            2 => ErrorCode::GeofencesReq,
            3 => ErrorCode::GeofenceNotImplemented,
            4 => ErrorCode::LogCfg,
            5 => ErrorCode::LogStart,
            6 => ErrorCode::LogStop,
            7 => ErrorCode::LogErase,
            8 => ErrorCode::LogReqStatus,
            9 => ErrorCode::LogReqQuery,
            10 => ErrorCode::LogNotImplemented,
            11 => ErrorCode::OdoStart,
            12 => ErrorCode::OdoStop,
            13 => ErrorCode::OdoReset,
            14 => ErrorCode::OdoNotImplemented,
            15 => ErrorCode::GeofenceMaxExceeded,
            16 => ErrorCode::NoMemory,
            17 => ErrorCode::DriverFault,
            _ => return None,
        };
        Some(code)
    }
}

/// Errors returned by `GpsProvider`
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// The driver has no geofencing capability at all
    #[error("geofencing is not implemented by this driver")]
    GeofenceNotImplemented,
    /// The region set failed validation; the previous set is still active
    #[error("geofence configuration rejected: {0}")]
    GeofenceConfig(#[from] GeofenceError),
    /// The driver refused a validated region set
    #[error("driver refused geofence configuration: {0}")]
    GeofenceConfigRefused(#[source] DriverError),
    #[error("geofence request failed: {0}")]
    GeofenceRequest(#[source] DriverError),
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),
}

impl ProviderError {
    /// Numeric code for this error. Vendor status codes surfaced by the
    /// driver are returned as-is.
    pub fn code(&self) -> u32 {
        match self {
            ProviderError::GeofenceNotImplemented => ErrorCode::GeofenceNotImplemented.as_u32(),
            ProviderError::GeofenceConfig(GeofenceError::MaxExceeded { .. }) => {
                ErrorCode::GeofenceMaxExceeded.as_u32()
            }
            ProviderError::GeofenceConfig(GeofenceError::NoMemory { .. }) => ErrorCode::NoMemory.as_u32(),
            ProviderError::GeofenceConfig(_) => ErrorCode::GeofencesCfg.as_u32(),
            ProviderError::GeofenceConfigRefused(e) => {
                e.status_code().unwrap_or(ErrorCode::GeofencesCfg.as_u32())
            }
            ProviderError::GeofenceRequest(e) => {
                e.status_code().unwrap_or(ErrorCode::GeofencesReq.as_u32())
            }
            ProviderError::Driver(e) => e.status_code().unwrap_or(ErrorCode::DriverFault.as_u32()),
        }
    }
}

/// Result type for provider operations
pub type ProviderResult<T> = Result<T, ProviderError>;

/// Provider lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProviderState {
    /// Receiver in low-power hibernation; `process()` does nothing
    #[default]
    Hibernating,
    /// Receiver producing fixes
    Active,
}

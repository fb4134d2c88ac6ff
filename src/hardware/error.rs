//! Driver error types

use thiserror::Error;

/// Errors surfaced by a chip driver
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// The driver has no implementation for this operation
    #[error("{operation} is not supported by this driver")]
    Unsupported { operation: &'static str },
    /// Vendor status code, passed through to callers untouched
    #[error("driver reported status code {code}")]
    Status { code: u32 },
    /// Link to the receiver lost
    #[error("receiver link lost")]
    LinkLost,
    /// Receiver data could not be decoded
    #[error("malformed receiver data: {details}")]
    Malformed { details: String },
}

impl DriverError {
    /// The vendor status code, if the driver surfaced one
    pub fn status_code(&self) -> Option<u32> {
        match self {
            DriverError::Status { code } => Some(*code),
            _ => None,
        }
    }
}

/// Result type for driver operations
pub type DriverResult<T> = Result<T, DriverError>;

//! Configuration loading

pub mod config;

pub use config::{ConfigError, GeofenceSetFile, ProviderConfig};

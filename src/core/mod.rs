//! Core types and constants for the GNSS location provider

pub mod types;
pub mod constants;

pub use types::*;
pub use constants::*;

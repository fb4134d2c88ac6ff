//! Plausibility checks applied to fixes before they reach the pipeline

pub mod fix;

pub use fix::{FixRejection, FixValidationConfig, FixValidator};

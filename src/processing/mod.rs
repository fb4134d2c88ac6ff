//! Fix storage and geodesic helpers used by the event pipeline

pub mod store;
pub mod distance;

pub use store::LocationStore;
pub use distance::{great_circle_distance_m, planar_distance_m, DistanceModel};

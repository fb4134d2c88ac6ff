//! Distances between geodetic points

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::core::{EARTH_MEAN_RADIUS_M, METERS_PER_DEGREE};

/// Distance formula used to classify fixes against regions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceModel {
    /// Spherical great-circle distance
    #[default]
    GreatCircle,
    /// Equirectangular approximation; cheaper, fine for small regions
    Planar,
}

impl DistanceModel {
    /// Distance in meters between two (latitude, longitude) points in degrees
    pub fn distance_m(&self, from: (f64, f64), to: (f64, f64)) -> f64 {
        match self {
            DistanceModel::GreatCircle => great_circle_distance_m(from.0, from.1, to.0, to.1),
            DistanceModel::Planar => planar_distance_m(from.0, from.1, to.0, to.1),
        }
    }
}

/// Unit vector from the Earth's center through a point
fn unit_vector(lat_deg: f64, lon_deg: f64) -> Vector3<f64> {
    let (lat, lon) = (lat_deg.to_radians(), lon_deg.to_radians());
    Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

/// Great-circle distance on a sphere of mean Earth radius.
///
/// The central angle comes from atan2(|a x b|, a . b), which stays accurate
/// for both very short and near-antipodal separations.
pub fn great_circle_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let a = unit_vector(lat1, lon1);
    let b = unit_vector(lat2, lon2);
    let angle = a.cross(&b).norm().atan2(a.dot(&b));
    EARTH_MEAN_RADIUS_M * angle
}

/// Equirectangular distance, scaling longitude by the mean latitude
pub fn planar_distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let mut lon_diff = lon2 - lon1;
    if lon_diff > 180.0 {
        lon_diff -= 360.0;
    } else if lon_diff < -180.0 {
        lon_diff += 360.0;
    }

    let mean_lat = ((lat1 + lat2) / 2.0).to_radians();
    let north = (lat2 - lat1) * METERS_PER_DEGREE;
    let east = lon_diff * METERS_PER_DEGREE * mean_lat.cos();
    (north * north + east * east).sqrt()
}

//! Geofence region description

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use crate::core::GEOFENCE_ID_MAX_SIZE;
use crate::geofence::GeofenceError;

/// Region identifier: 1 to `GEOFENCE_ID_MAX_SIZE` bytes of UTF-8.
///
/// Oversize ids are rejected at construction, never truncated.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct GeofenceId(String);

impl GeofenceId {
    pub fn new(id: impl Into<String>) -> Result<Self, GeofenceError> {
        let id = id.into();
        if id.is_empty() {
            return Err(GeofenceError::EmptyId);
        }
        if id.len() > GEOFENCE_ID_MAX_SIZE {
            return Err(GeofenceError::IdTooLong {
                len: id.len(),
                max: GEOFENCE_ID_MAX_SIZE,
            });
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for GeofenceId {
    type Error = GeofenceError;

    fn try_from(id: String) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl TryFrom<&str> for GeofenceId {
    type Error = GeofenceError;

    fn try_from(id: &str) -> Result<Self, Self::Error> {
        Self::new(id)
    }
}

impl From<GeofenceId> for String {
    fn from(id: GeofenceId) -> Self {
        id.0
    }
}

impl AsRef<str> for GeofenceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GeofenceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.0)
    }
}

/// Bitset over the transition kinds a region reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransitionMask(u8);

impl TransitionMask {
    pub const NONE: Self = Self(0);
    pub const DWELL: Self = Self(1);
    pub const ENTER: Self = Self(2);
    pub const EXIT: Self = Self(4);
    pub const ALL: Self = Self(1 | 2 | 4);

    /// Build from raw bits, ignoring unknown ones
    pub fn from_bits_truncate(bits: u8) -> Self {
        Self(bits & Self::ALL.0)
    }

    pub fn bits(&self) -> u8 {
        self.0
    }

    /// True when every bit of `other` is set in `self`
    pub fn contains(&self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

impl BitOr for TransitionMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for TransitionMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Position of the receiver relative to a region
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeofenceStatus {
    /// Not yet classified since configuration or reset
    #[default]
    Unknown = 0,
    Outside = 1,
    /// Within the boundary margin of the radius
    Boundary = 2,
    Inside = 3,
}

/// How long a region stays active after configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Expiration {
    #[default]
    Never,
    AfterMs(u64),
}

impl Expiration {
    /// Negative durations mean "never expire"
    pub fn from_millis(duration_ms: i64) -> Self {
        if duration_ms < 0 {
            Expiration::Never
        } else {
            Expiration::AfterMs(duration_ms as u64)
        }
    }

    /// Absolute deadline for a region configured at `configured_at_ms`
    pub fn deadline_from(&self, configured_at_ms: u64) -> Option<u64> {
        match self {
            Expiration::Never => None,
            Expiration::AfterMs(duration) => Some(configured_at_ms.saturating_add(*duration)),
        }
    }
}

/// Circular region monitored for enter, exit and dwell transitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeofenceRegion {
    pub id: GeofenceId,
    /// Center latitude in decimal degrees
    pub latitude: f64,
    /// Center longitude in decimal degrees
    pub longitude: f64,
    pub radius_m: f64,
    #[serde(default)]
    pub expiration: Expiration,
    /// Time a region must stay inside before dwell fires (milliseconds)
    #[serde(default)]
    pub responsiveness_ms: u32,
    pub transitions: TransitionMask,
}

impl GeofenceRegion {
    /// Region reporting every transition kind, never expiring
    pub fn new(id: GeofenceId, latitude: f64, longitude: f64, radius_m: f64) -> Self {
        Self {
            id,
            latitude,
            longitude,
            radius_m,
            expiration: Expiration::Never,
            responsiveness_ms: 0,
            transitions: TransitionMask::ALL,
        }
    }

    /// Like `new`, validating the id
    pub fn circle(id: &str, latitude: f64, longitude: f64, radius_m: f64) -> Result<Self, GeofenceError> {
        Ok(Self::new(GeofenceId::new(id)?, latitude, longitude, radius_m))
    }

    pub fn with_expiration(mut self, expiration: Expiration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn with_responsiveness_ms(mut self, responsiveness_ms: u32) -> Self {
        self.responsiveness_ms = responsiveness_ms;
        self
    }

    pub fn with_transitions(mut self, transitions: TransitionMask) -> Self {
        self.transitions = transitions;
        self
    }

    /// Check geometry; the id is already valid by construction
    pub fn validate(&self) -> Result<(), GeofenceError> {
        if !self.radius_m.is_finite() || self.radius_m <= 0.0 {
            return Err(GeofenceError::InvalidRadius {
                id: self.id.to_string(),
                radius_m: self.radius_m,
            });
        }

        let latitude_ok = self.latitude.is_finite() && self.latitude.abs() <= 90.0;
        let longitude_ok = self.longitude.is_finite() && self.longitude.abs() <= 180.0;
        if !latitude_ok || !longitude_ok {
            return Err(GeofenceError::InvalidCenter {
                id: self.id.to_string(),
                latitude: self.latitude,
                longitude: self.longitude,
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_length_limit() {
        let max = "x".repeat(GEOFENCE_ID_MAX_SIZE);
        assert!(GeofenceId::new(max.clone()).is_ok());

        let oversize = format!("{}y", max);
        assert_eq!(
            GeofenceId::new(oversize),
            Err(GeofenceError::IdTooLong { len: GEOFENCE_ID_MAX_SIZE + 1, max: GEOFENCE_ID_MAX_SIZE })
        );
        assert_eq!(GeofenceId::new(""), Err(GeofenceError::EmptyId));
    }

    #[test]
    fn test_id_deserialization_rejects_oversize() {
        let json = format!("\"{}\"", "a".repeat(40));
        assert!(serde_json::from_str::<GeofenceId>(&json).is_err());

        let id: GeofenceId = serde_json::from_str("\"home\"").unwrap();
        assert_eq!(id.as_str(), "home");
    }

    #[test]
    fn test_transition_mask() {
        let mask = TransitionMask::ENTER | TransitionMask::EXIT;
        assert!(mask.contains(TransitionMask::ENTER));
        assert!(mask.contains(TransitionMask::EXIT));
        assert!(!mask.contains(TransitionMask::DWELL));
        assert_eq!(mask.bits(), 6);
        assert_eq!(TransitionMask::from_bits_truncate(0xff), TransitionMask::ALL);
        assert!(TransitionMask::NONE.is_empty());
    }

    #[test]
    fn test_status_codes_match_receiver() {
        assert_eq!(GeofenceStatus::Unknown as u8, 0);
        assert_eq!(GeofenceStatus::Outside as u8, 1);
        assert_eq!(GeofenceStatus::Boundary as u8, 2);
        assert_eq!(GeofenceStatus::Inside as u8, 3);
    }

    #[test]
    fn test_expiration() {
        assert_eq!(Expiration::from_millis(-1), Expiration::Never);
        assert_eq!(Expiration::from_millis(500), Expiration::AfterMs(500));
        assert_eq!(Expiration::Never.deadline_from(1000), None);
        assert_eq!(Expiration::AfterMs(500).deadline_from(1000), Some(1500));
    }

    #[test]
    fn test_region_validation() {
        let region = GeofenceRegion::circle("home", 45.0, 7.0, 100.0).unwrap();
        assert!(region.validate().is_ok());

        let zero_radius = GeofenceRegion::circle("home", 45.0, 7.0, 0.0).unwrap();
        assert!(matches!(zero_radius.validate(), Err(GeofenceError::InvalidRadius { .. })));

        let bad_center = GeofenceRegion::circle("home", 91.0, 7.0, 10.0).unwrap();
        assert!(matches!(bad_center.validate(), Err(GeofenceError::InvalidCenter { .. })));

        let nan_radius = GeofenceRegion::circle("home", 45.0, 7.0, f64::NAN).unwrap();
        assert!(nan_radius.validate().is_err());
    }

    #[test]
    fn test_region_from_json() {
        let json = r#"{
            "id": "office",
            "latitude": 47.6,
            "longitude": -122.3,
            "radius_m": 150.0,
            "expiration": { "after_ms": 60000 },
            "transitions": 3
        }"#;
        let region: GeofenceRegion = serde_json::from_str(json).unwrap();
        assert_eq!(region.id.as_str(), "office");
        assert_eq!(region.expiration, Expiration::AfterMs(60_000));
        assert_eq!(region.responsiveness_ms, 0);
        assert_eq!(region.transitions, TransitionMask::DWELL | TransitionMask::ENTER);
    }
}

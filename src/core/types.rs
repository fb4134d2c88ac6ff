//! Core data types shared by the driver boundary and the event pipeline

use serde::{Deserialize, Serialize};

use crate::core::constants::FIX_LAYOUT_VERSION;

/// Power mode selection, applied by the driver on the next `start()`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerMode {
    /// High-accuracy operation, typically 1 Hz updates
    #[default]
    Full,
    /// Longer hibernation periods between updates
    Low,
}

/// GPS time: weeks since 1980-01-06 and milliseconds into the current week
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GpsTime {
    pub week: u16,
    /// Time of week (milliseconds)
    pub tow_ms: u32,
}

/// One position/time report from the receiver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fix {
    /// Layout version of this structure
    pub version: u32,
    /// Whether the receiver had a position solution
    pub valid: bool,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Altitude above mean sea level (meters)
    pub altitude: f64,
    /// GPS satellites used in the solution
    pub num_gps_svs: u32,
    /// GLONASS satellites used in the solution
    pub num_glonass_svs: u32,
    pub gps_time: GpsTime,
    /// UTC time (milliseconds since the Unix epoch)
    pub utc_time_ms: u64,
}

impl Fix {
    /// Create a valid fix at the given coordinates
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            version: FIX_LAYOUT_VERSION,
            valid: true,
            latitude,
            longitude,
            altitude,
            num_gps_svs: 0,
            num_glonass_svs: 0,
            gps_time: GpsTime::default(),
            utc_time_ms: 0,
        }
    }

    /// A report without a position solution
    pub fn invalid() -> Self {
        Self {
            valid: false,
            ..Self::new(0.0, 0.0, 0.0)
        }
    }

    pub fn with_satellites(mut self, gps: u32, glonass: u32) -> Self {
        self.num_gps_svs = gps;
        self.num_glonass_svs = glonass;
        self
    }

    pub fn with_gps_time(mut self, week: u16, tow_ms: u32) -> Self {
        self.gps_time = GpsTime { week, tow_ms };
        self
    }

    pub fn with_utc_time(mut self, utc_time_ms: u64) -> Self {
        self.utc_time_ms = utc_time_ms;
        self
    }

    /// Total satellites used across constellations, saturating on corrupt counts
    pub fn satellite_count(&self) -> u32 {
        self.num_gps_svs.saturating_add(self.num_glonass_svs)
    }
}

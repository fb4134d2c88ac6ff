//! Mock chip driver for testing and development

use crate::core::{Fix, PowerMode};
use crate::geofence::GeofenceRegion;
use crate::hardware::{
    event_feed, DriverError, DriverEvent, DriverResult, EventFeed, EventProducer,
    GeofenceResponse, GnssDriver,
};

/// `ioctl` command that copies the mock's device info into `arg`
pub const IOCTL_READ_DEVICE_INFO: u32 = 0x01;

/// `ioctl` return value for commands the mock does not know
pub const IOCTL_UNKNOWN_COMMAND: u32 = u32::MAX;

/// Counters of the calls the provider made into the mock
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MockDriverStats {
    pub reset_calls: u32,
    pub start_calls: u32,
    pub stop_calls: u32,
    pub ioctl_calls: u32,
    pub config_calls: u32,
    pub request_calls: u32,
    pub immediate_requests: u32,
    pub events_polled: u32,
}

/// Mock driver producing scripted event sequences
pub struct MockDriver {
    producer: EventProducer,
    feed: EventFeed,
    staged_power_mode: PowerMode,
    power_mode: PowerMode,
    hibernating: bool,
    device_info: Option<String>,
    geofencing_supported: bool,
    accept_power_modes: bool,
    config_failure: Option<DriverError>,
    request_failure: Option<DriverError>,
    poll_failure: Option<DriverError>,
    reset_failure: Option<DriverError>,
    configured_geofences: Vec<GeofenceRegion>,
    last_fix: Option<Fix>,
    stats: MockDriverStats,
}

impl MockDriver {
    /// Create a new mock driver with the given event buffer capacity
    pub fn new(capacity: usize) -> Self {
        let (producer, feed) = event_feed(capacity);

        Self {
            producer,
            feed,
            staged_power_mode: PowerMode::Full,
            power_mode: PowerMode::Full,
            hibernating: true,
            device_info: Some("MockGNSS v1.0".to_string()),
            geofencing_supported: true,
            accept_power_modes: true,
            config_failure: None,
            request_failure: None,
            poll_failure: None,
            reset_failure: None,
            configured_geofences: Vec::new(),
            last_fix: None,
            stats: MockDriverStats::default(),
        }
    }

    /// Mock without geofencing capability
    pub fn without_geofencing(capacity: usize) -> Self {
        Self {
            geofencing_supported: false,
            ..Self::new(capacity)
        }
    }

    /// Handle for feeding events from a producer context
    pub fn producer(&self) -> EventProducer {
        self.producer.clone()
    }

    /// Queue a fix as if the receiver had just reported it
    pub fn push_fix(&mut self, fix: Fix) {
        if self.producer.push_fix(fix).is_err() {
            tracing::warn!("mock event buffer full, fix dropped");
        }
    }

    pub fn push_event(&mut self, event: DriverEvent) {
        if self.producer.push(event).is_err() {
            tracing::warn!("mock event buffer full, event dropped");
        }
    }

    pub fn set_device_info(&mut self, info: Option<&str>) {
        self.device_info = info.map(str::to_string);
    }

    /// Make `set_power_mode` report failure
    pub fn reject_power_modes(&mut self, reject: bool) {
        self.accept_power_modes = !reject;
    }

    /// Make every subsequent `config_geofences` fail with `error`
    pub fn fail_geofence_config(&mut self, error: Option<DriverError>) {
        self.config_failure = error;
    }

    pub fn fail_geofence_request(&mut self, error: Option<DriverError>) {
        self.request_failure = error;
    }

    /// Make the next `poll_event` fail once
    pub fn fail_next_poll(&mut self, error: DriverError) {
        self.poll_failure = Some(error);
    }

    /// Make the next `reset` fail once, leaving the mock as it was
    pub fn fail_next_reset(&mut self, error: DriverError) {
        self.reset_failure = Some(error);
    }

    pub fn stats(&self) -> MockDriverStats {
        self.stats
    }

    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    pub fn is_hibernating(&self) -> bool {
        self.hibernating
    }

    /// Regions most recently accepted by `config_geofences`
    pub fn configured_geofences(&self) -> &[GeofenceRegion] {
        &self.configured_geofences
    }
}

impl Default for MockDriver {
    fn default() -> Self {
        Self::new(64)
    }
}

impl GnssDriver for MockDriver {
    fn set_power_mode(&mut self, mode: PowerMode) -> bool {
        if self.accept_power_modes {
            self.staged_power_mode = mode;
        }
        self.accept_power_modes
    }

    fn reset(&mut self) -> DriverResult<()> {
        self.stats.reset_calls += 1;
        if let Some(error) = self.reset_failure.take() {
            return Err(error);
        }
        // A hardware reset loses whatever the UART had buffered
        self.feed.clear();
        self.last_fix = None;
        self.hibernating = true;
        Ok(())
    }

    fn start(&mut self) -> DriverResult<()> {
        self.stats.start_calls += 1;
        self.power_mode = self.staged_power_mode;
        self.hibernating = false;
        Ok(())
    }

    fn stop(&mut self) -> DriverResult<()> {
        self.stats.stop_calls += 1;
        self.hibernating = true;
        Ok(())
    }

    fn poll_event(&mut self) -> DriverResult<Option<DriverEvent>> {
        if let Some(error) = self.poll_failure.take() {
            return Err(error);
        }

        let dropped = self.feed.take_new_drops();
        if dropped > 0 {
            tracing::warn!(dropped, "mock receiver overran its event buffer");
        }

        let event = self.feed.try_next();
        if let Some(event) = &event {
            self.stats.events_polled += 1;
            if let DriverEvent::Fix(fix) = event {
                if fix.valid {
                    self.last_fix = Some(fix.clone());
                }
            }
        }
        Ok(event)
    }

    fn request_immediate_location(&mut self) -> DriverResult<()> {
        self.stats.immediate_requests += 1;
        if let Some(fix) = self.last_fix.clone() {
            self.push_fix(fix);
        }
        Ok(())
    }

    fn ioctl(&mut self, command: u32, arg: &mut [u8]) -> u32 {
        self.stats.ioctl_calls += 1;
        match command {
            IOCTL_READ_DEVICE_INFO => {
                let info = self.device_info.as_deref().unwrap_or("").as_bytes();
                let len = info.len().min(arg.len());
                arg[..len].copy_from_slice(&info[..len]);
                len as u32
            }
            _ => IOCTL_UNKNOWN_COMMAND,
        }
    }

    fn device_info(&self) -> Option<&str> {
        self.device_info.as_deref()
    }

    fn is_geofencing_supported(&self) -> bool {
        self.geofencing_supported
    }

    fn config_geofences(&mut self, regions: &[GeofenceRegion]) -> DriverResult<()> {
        if !self.geofencing_supported {
            return Err(DriverError::Unsupported { operation: "config_geofences" });
        }
        self.stats.config_calls += 1;

        if let Some(error) = self.config_failure.clone() {
            self.push_event(DriverEvent::GeofenceResponse(GeofenceResponse::ConfigFailed));
            return Err(error);
        }

        self.configured_geofences = regions.to_vec();
        self.push_event(DriverEvent::GeofenceResponse(GeofenceResponse::ConfigOk));
        Ok(())
    }

    fn geofence_request(&mut self) -> DriverResult<()> {
        if !self.geofencing_supported {
            return Err(DriverError::Unsupported { operation: "geofence_request" });
        }
        self.stats.request_calls += 1;

        if let Some(error) = self.request_failure.clone() {
            self.push_event(DriverEvent::GeofenceResponse(GeofenceResponse::RequestFailed));
            return Err(error);
        }

        self.push_event(DriverEvent::GeofenceResponse(GeofenceResponse::RequestOk));
        Ok(())
    }
}

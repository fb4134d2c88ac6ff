//! GPS provider facade
//!
//! `GpsProvider` composes the location store, geofence registry, evaluator
//! and dispatcher over an injected chip driver. All pipeline work happens in
//! `process()`, which the host calls repeatedly from its main loop:
//!
//! ```no_run
//! use gnss_provider::{GpsProvider, MockDriver, PowerMode};
//!
//! let mut gps = GpsProvider::new(MockDriver::default());
//! gps.set_power_mode(PowerMode::Low);
//! gps.on_location_update(|fix| println!("{:.6}, {:.6}", fix.latitude, fix.longitude));
//!
//! gps.reset().unwrap();
//! gps.start().unwrap();
//! loop {
//!     gps.process().unwrap();
//!     # break;
//! }
//! gps.stop().unwrap();
//! ```
//!
//! `process()` must not be called reentrantly or from two threads at once;
//! the `&mut self` receiver enforces this.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use tracing::{debug, info, warn};

use crate::api::callback::EventDispatcher;
use crate::api::clock::{Clock, SystemClock};
use crate::api::command::{CommandSender, ProviderCommand};
use crate::api::types::{ProviderError, ProviderResult, ProviderState};
use crate::core::{Fix, PowerMode};
use crate::geofence::{
    GeofenceEvaluator, GeofenceRegion, GeofenceRegistry, GeofenceStatus, TransitionEvent,
};
use crate::hardware::{DriverEvent, GeofenceResponse, GnssDriver};
use crate::processing::LocationStore;
use crate::utils::{ConfigError, ProviderConfig};
use crate::validation::FixValidator;

/// Stable entry point over a swappable chip driver
pub struct GpsProvider<D: GnssDriver, C: Clock = SystemClock> {
    driver: D,
    clock: C,
    config: ProviderConfig,
    state: ProviderState,
    power_mode: PowerMode,
    store: LocationStore,
    registry: GeofenceRegistry,
    evaluator: GeofenceEvaluator,
    validator: FixValidator,
    dispatcher: EventDispatcher,
    last_geofence_response: Option<GeofenceResponse>,
    command_tx: Sender<ProviderCommand>,
    command_rx: Receiver<ProviderCommand>,
}

impl<D: GnssDriver> GpsProvider<D, SystemClock> {
    /// Provider with default configuration and the system clock
    pub fn new(driver: D) -> Self {
        Self::build(driver, ProviderConfig::default(), SystemClock::new())
    }
}

impl<D: GnssDriver, C: Clock> GpsProvider<D, C> {
    /// Provider with explicit configuration and time source
    pub fn with_config(driver: D, config: ProviderConfig, clock: C) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(driver, config, clock))
    }

    fn build(driver: D, config: ProviderConfig, clock: C) -> Self {
        let (command_tx, command_rx) = mpsc::channel();

        Self {
            registry: GeofenceRegistry::with_boundary_margin(config.max_geofences, config.boundary_margin_m),
            evaluator: GeofenceEvaluator::new(config.boundary_margin_m, config.distance_model),
            validator: FixValidator::new(config.validation.clone()),
            driver,
            clock,
            config,
            state: ProviderState::Hibernating,
            power_mode: PowerMode::default(),
            store: LocationStore::new(),
            dispatcher: EventDispatcher::new(),
            last_geofence_response: None,
            command_tx,
            command_rx,
        }
    }

    // ---------------------------------------------------------------------
    // Lifecycle
    // ---------------------------------------------------------------------

    /// Stage a power mode for the next `start()`. Returns the driver's verdict.
    pub fn set_power_mode(&mut self, mode: PowerMode) -> bool {
        let accepted = self.driver.set_power_mode(mode);
        if accepted {
            self.power_mode = mode;
            debug!(?mode, "power mode staged");
        } else {
            warn!(?mode, "driver rejected power mode");
        }
        accepted
    }

    /// Most recently accepted power mode
    pub fn power_mode(&self) -> PowerMode {
        self.power_mode
    }

    /// Hardware reset into hibernation. Location availability is cleared;
    /// configured geofences and callbacks are kept, but every region goes
    /// back to `Unknown` so the next fix only re-establishes a baseline.
    ///
    /// If the driver fails to reset, the provider is left untouched.
    pub fn reset(&mut self) -> ProviderResult<()> {
        self.driver.reset()?;
        self.state = ProviderState::Hibernating;
        self.store.reset();
        self.registry.reset_evaluation();
        info!("receiver reset into hibernation");
        Ok(())
    }

    /// Start producing fixes. Calling it while active does nothing.
    pub fn start(&mut self) -> ProviderResult<()> {
        if self.state == ProviderState::Active {
            debug!("start ignored, already active");
            return Ok(());
        }
        self.driver.start()?;
        self.state = ProviderState::Active;
        info!(power_mode = ?self.power_mode, "receiver started");
        Ok(())
    }

    /// Put the receiver into hibernation. Calling it while hibernating does nothing.
    pub fn stop(&mut self) -> ProviderResult<()> {
        if self.state == ProviderState::Hibernating {
            debug!("stop ignored, already hibernating");
            return Ok(());
        }
        self.driver.stop()?;
        self.state = ProviderState::Hibernating;
        info!("receiver stopped");
        Ok(())
    }

    pub fn state(&self) -> ProviderState {
        self.state
    }

    // ---------------------------------------------------------------------
    // Processing
    // ---------------------------------------------------------------------

    /// Drain up to `max_events_per_process` driver events through the
    /// pipeline and apply commands queued by callbacks.
    ///
    /// Returns the number of driver events handled; does nothing unless active.
    pub fn process(&mut self) -> ProviderResult<usize> {
        if self.state != ProviderState::Active {
            return Ok(0);
        }

        let mut handled = 0;
        let mut failure = None;
        while handled < self.config.max_events_per_process {
            let event = match self.driver.poll_event() {
                Ok(Some(event)) => event,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "driver failed while draining events");
                    failure = Some(e);
                    break;
                }
            };
            handled += 1;

            match event {
                DriverEvent::Fix(fix) => self.handle_fix(fix),
                DriverEvent::GeofenceResponse(response) => self.handle_geofence_response(response),
            }
        }

        self.apply_pending_commands();

        match failure {
            Some(e) => Err(e.into()),
            None => Ok(handled),
        }
    }

    fn handle_fix(&mut self, fix: Fix) {
        let reported_valid = fix.valid;
        let (fix, rejection) = self.validator.sanitize(fix);
        if let Some(rejection) = rejection {
            if reported_valid {
                warn!(%rejection, "discarding implausible fix");
            } else {
                debug!("receiver has no position solution");
            }
        }

        self.store.update(fix.clone());
        if !fix.valid {
            return;
        }

        let now_ms = self.clock.now_ms();
        let expired = self.registry.expire_and_prune(now_ms);
        for id in &expired {
            info!(geofence = %id, "geofence expired");
        }

        let events = self.evaluator.evaluate(&fix, &mut self.registry, now_ms);

        self.dispatcher.dispatch_location(&fix);
        for event in &events {
            debug!(
                geofence = %event.region.id,
                transition = event.bitmap.bits(),
                distance_m = event.distance_m,
                "geofence transition"
            );
            self.dispatcher.dispatch_geofence(event);
        }
    }

    fn handle_geofence_response(&mut self, response: GeofenceResponse) {
        if response.is_success() {
            debug!(?response, "geofence acknowledgement");
        } else {
            warn!(?response, "receiver reported geofence failure");
        }
        self.last_geofence_response = Some(response);
    }

    /// Handle for queuing device commands from callbacks or other code
    pub fn command_sender(&self) -> CommandSender {
        CommandSender::new(self.command_tx.clone())
    }

    /// Apply queued commands in order, at most `max_events_per_process` per
    /// call; the rest stay queued for the next call. Failures are logged and
    /// skipped. Returns the number of commands applied.
    pub fn apply_pending_commands(&mut self) -> usize {
        let mut applied = 0;
        while applied < self.config.max_events_per_process {
            let command = match self.command_rx.try_recv() {
                Ok(command) => command,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            };
            applied += 1;

            debug!(?command, "applying queued command");
            let result = match command {
                ProviderCommand::Start => self.start(),
                ProviderCommand::Stop => self.stop(),
                ProviderCommand::Reset => self.reset(),
                ProviderCommand::SetPowerMode(mode) => {
                    self.set_power_mode(mode);
                    Ok(())
                }
                ProviderCommand::GeofenceRequest => self.geofence_request(),
                ProviderCommand::RequestImmediateLocation => self.request_immediate_location(),
                ProviderCommand::Ioctl { command, mut arg } => {
                    let ret = self.ioctl(command, &mut arg);
                    debug!(command, ret, "queued ioctl completed");
                    Ok(())
                }
            };
            if let Err(e) = result {
                warn!(error = %e, code = e.code(), "queued command failed");
            }
        }
        applied
    }

    // ---------------------------------------------------------------------
    // Location
    // ---------------------------------------------------------------------

    /// True once a valid fix has arrived since the last reset
    pub fn location_available(&self) -> bool {
        self.store.location_available()
    }

    /// Last valid fix, if any
    pub fn last_location(&self) -> Option<&Fix> {
        self.store.latest()
    }

    /// Most recent report from the receiver, even one without a solution
    pub fn last_report(&self) -> Option<&Fix> {
        self.store.last_report()
    }

    /// Ask a hibernating receiver for a fix; it is delivered by a later `process()`
    pub fn request_immediate_location(&mut self) -> ProviderResult<()> {
        self.driver.request_immediate_location()?;
        Ok(())
    }

    /// Register the location callback, replacing any previous one
    pub fn on_location_update<F>(&mut self, callback: F)
    where
        F: FnMut(&Fix) + Send + 'static,
    {
        self.dispatcher.register_location_callback(Box::new(callback));
    }

    // ---------------------------------------------------------------------
    // Geofencing
    // ---------------------------------------------------------------------

    pub fn is_geofencing_supported(&self) -> bool {
        self.driver.is_geofencing_supported()
    }

    /// Replace the active geofence set.
    ///
    /// All-or-nothing: on any error the previous set stays active.
    pub fn config_geofences(&mut self, regions: Vec<GeofenceRegion>) -> ProviderResult<()> {
        if !self.driver.is_geofencing_supported() {
            return Err(ProviderError::GeofenceNotImplemented);
        }

        let staged = self
            .registry
            .stage(regions, self.clock.now_ms())
            .map_err(|e| {
                warn!(error = %e, "geofence configuration rejected");
                ProviderError::GeofenceConfig(e)
            })?;

        self.driver
            .config_geofences(staged.regions())
            .map_err(|e| {
                warn!(error = %e, "driver refused geofence configuration");
                ProviderError::GeofenceConfigRefused(e)
            })?;

        let count = staged.len();
        self.registry.commit(staged);
        info!(count, "geofences configured");
        Ok(())
    }

    /// Query geofence status on the receiver; the answer arrives as an
    /// acknowledgement during a later `process()`
    pub fn geofence_request(&mut self) -> ProviderResult<()> {
        if !self.driver.is_geofencing_supported() {
            return Err(ProviderError::GeofenceNotImplemented);
        }
        self.driver
            .geofence_request()
            .map_err(ProviderError::GeofenceRequest)
    }

    /// Currently configured regions, in configuration order
    pub fn geofences(&self) -> Vec<&GeofenceRegion> {
        self.registry.regions().collect()
    }

    pub fn geofence_status(&self, id: &str) -> Option<GeofenceStatus> {
        self.registry.status_of(id)
    }

    pub fn registry(&self) -> &GeofenceRegistry {
        &self.registry
    }

    /// Latest geofence acknowledgement from the receiver
    pub fn last_geofence_response(&self) -> Option<GeofenceResponse> {
        self.last_geofence_response
    }

    /// Register the geofence transition callback, replacing any previous one
    pub fn on_geofences_trigger<F>(&mut self, callback: F)
    where
        F: FnMut(&TransitionEvent) + Send + 'static,
    {
        self.dispatcher.register_geofence_callback(Box::new(callback));
    }

    // ---------------------------------------------------------------------
    // Device
    // ---------------------------------------------------------------------

    /// Vendor escape hatch, passed straight through to the driver
    pub fn ioctl(&mut self, command: u32, arg: &mut [u8]) -> u32 {
        self.driver.ioctl(command, arg)
    }

    pub fn have_device_info(&self) -> bool {
        self.driver.device_info().is_some()
    }

    pub fn device_info(&self) -> Option<&str> {
        self.driver.device_info()
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

impl<D: GnssDriver, C: Clock> Drop for GpsProvider<D, C> {
    fn drop(&mut self) {
        if self.state == ProviderState::Active {
            if let Err(e) = self.driver.stop() {
                warn!(error = %e, "failed to stop receiver on drop");
            }
        }
    }
}

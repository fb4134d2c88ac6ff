//! Chip driver interface

use crate::core::PowerMode;
use crate::geofence::GeofenceRegion;
use crate::hardware::{DriverError, DriverEvent, DriverResult};

/// Hardware abstraction trait for GNSS chip drivers
pub trait GnssDriver {
    /// Stage a power mode; it takes effect on the next `start()`.
    /// Returns whether the driver accepted the mode.
    fn set_power_mode(&mut self, mode: PowerMode) -> bool;

    /// Hardware reset into hibernation, ready for `start()`
    fn reset(&mut self) -> DriverResult<()>;

    /// Leave hibernation and begin producing fixes
    fn start(&mut self) -> DriverResult<()>;

    /// Enter hibernation
    fn stop(&mut self) -> DriverResult<()>;

    /// Take the next decoded event from the driver's buffer.
    /// Returns Ok(None) when nothing is pending; must never block.
    fn poll_event(&mut self) -> DriverResult<Option<DriverEvent>>;

    /// Ask a hibernating receiver for a fix now; it arrives as a later event
    fn request_immediate_location(&mut self) -> DriverResult<()>;

    /// Vendor-specific escape hatch. Semantics belong to the driver.
    fn ioctl(&mut self, command: u32, arg: &mut [u8]) -> u32;

    /// Version string or other identifier, once the receiver has reported one
    fn device_info(&self) -> Option<&str>;

    fn is_geofencing_supported(&self) -> bool {
        false
    }

    /// Push a validated region set down to the chip
    fn config_geofences(&mut self, _regions: &[GeofenceRegion]) -> DriverResult<()> {
        Err(DriverError::Unsupported { operation: "config_geofences" })
    }

    /// Query geofence status on the chip
    fn geofence_request(&mut self) -> DriverResult<()> {
        Err(DriverError::Unsupported { operation: "geofence_request" })
    }
}

/// Forward every driver call through a pointer type
macro_rules! forward_driver {
    ($($target:ty),*) => {$(
        impl<D: GnssDriver + ?Sized> GnssDriver for $target {
            fn set_power_mode(&mut self, mode: PowerMode) -> bool {
                (**self).set_power_mode(mode)
            }

            fn reset(&mut self) -> DriverResult<()> {
                (**self).reset()
            }

            fn start(&mut self) -> DriverResult<()> {
                (**self).start()
            }

            fn stop(&mut self) -> DriverResult<()> {
                (**self).stop()
            }

            fn poll_event(&mut self) -> DriverResult<Option<DriverEvent>> {
                (**self).poll_event()
            }

            fn request_immediate_location(&mut self) -> DriverResult<()> {
                (**self).request_immediate_location()
            }

            fn ioctl(&mut self, command: u32, arg: &mut [u8]) -> u32 {
                (**self).ioctl(command, arg)
            }

            fn device_info(&self) -> Option<&str> {
                (**self).device_info()
            }

            fn is_geofencing_supported(&self) -> bool {
                (**self).is_geofencing_supported()
            }

            fn config_geofences(&mut self, regions: &[GeofenceRegion]) -> DriverResult<()> {
                (**self).config_geofences(regions)
            }

            fn geofence_request(&mut self) -> DriverResult<()> {
                (**self).geofence_request()
            }
        }
    )*};
}

forward_driver!(Box<D>, &mut D);

//! Callback registration and synchronous dispatch
//! 
//! Callbacks run inside `GpsProvider::process()`. They must not block or do
//! long-running work. They receive an immutable view of the fix or event and
//! cannot reach back into the provider; device commands go through a
//! `CommandSender` and are applied once dispatch is over.

use std::fmt;

use crate::core::Fix;
use crate::geofence::TransitionEvent;

/// Callback function type for location updates
pub type LocationCallback = Box<dyn FnMut(&Fix) + Send>;

/// Callback function type for geofence transitions
pub type GeofenceCallback = Box<dyn FnMut(&TransitionEvent) + Send>;

/// Routes notifications to at most one callback per kind
#[derive(Default)]
pub struct EventDispatcher {
    location: Option<LocationCallback>,
    geofence: Option<GeofenceCallback>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the location callback, replacing any previous one
    pub fn register_location_callback(&mut self, callback: LocationCallback) {
        if self.location.replace(callback).is_some() {
            tracing::debug!("replaced location callback");
        }
    }

    /// Register the geofence callback, replacing any previous one
    pub fn register_geofence_callback(&mut self, callback: GeofenceCallback) {
        if self.geofence.replace(callback).is_some() {
            tracing::debug!("replaced geofence callback");
        }
    }

    pub fn has_location_callback(&self) -> bool {
        self.location.is_some()
    }

    pub fn has_geofence_callback(&self) -> bool {
        self.geofence.is_some()
    }

    /// Returns whether a callback received the fix
    pub fn dispatch_location(&mut self, fix: &Fix) -> bool {
        match self.location.as_mut() {
            Some(callback) => {
                callback(fix);
                true
            }
            None => false,
        }
    }

    /// Returns whether a callback received the event
    pub fn dispatch_geofence(&mut self, event: &TransitionEvent) -> bool {
        match self.geofence.as_mut() {
            Some(callback) => {
                callback(event);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("location", &self.location.is_some())
            .field("geofence", &self.geofence.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::{GeofenceRegion, GeofenceStatus, TransitionMask};
    use std::sync::{Arc, Mutex};

    fn sample_event() -> TransitionEvent {
        TransitionEvent {
            region: GeofenceRegion::circle("gate", 0.0, 0.0, 10.0).unwrap(),
            distance_m: 3.0,
            bitmap: TransitionMask::ENTER,
            status: GeofenceStatus::Inside,
        }
    }

    #[test]
    fn test_no_callback_is_noop() {
        let mut dispatcher = EventDispatcher::new();
        assert!(!dispatcher.dispatch_location(&Fix::new(1.0, 1.0, 0.0)));
        assert!(!dispatcher.dispatch_geofence(&sample_event()));
    }

    #[test]
    fn test_location_dispatch() {
        let received = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&received);

        let mut dispatcher = EventDispatcher::new();
        dispatcher.register_location_callback(Box::new(move |fix: &Fix| {
            sink.lock().unwrap().push(fix.latitude);
        }));

        assert!(dispatcher.dispatch_location(&Fix::new(1.0, 0.0, 0.0)));
        assert!(dispatcher.dispatch_location(&Fix::new(2.0, 0.0, 0.0)));
        assert_eq!(*received.lock().unwrap(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_reregistration_replaces() {
        let first = Arc::new(Mutex::new(0));
        let second = Arc::new(Mutex::new(0));

        let mut dispatcher = EventDispatcher::new();
        let counter = Arc::clone(&first);
        dispatcher.register_geofence_callback(Box::new(move |_: &TransitionEvent| *counter.lock().unwrap() += 1));
        dispatcher.dispatch_geofence(&sample_event());

        let counter = Arc::clone(&second);
        dispatcher.register_geofence_callback(Box::new(move |_: &TransitionEvent| *counter.lock().unwrap() += 1));
        dispatcher.dispatch_geofence(&sample_event());
        dispatcher.dispatch_geofence(&sample_event());

        assert_eq!(*first.lock().unwrap(), 1);
        assert_eq!(*second.lock().unwrap(), 2);
        assert!(dispatcher.has_geofence_callback());
        assert!(!dispatcher.has_location_callback());
    }
}

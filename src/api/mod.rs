//! Provider API
//!
//! `GpsProvider` is the single entry point the host talks to. Results are
//! delivered through registered callbacks from inside `process()`.

pub mod types;
pub mod clock;
pub mod callback;
pub mod command;
pub mod provider;

pub use types::{ErrorCode, ProviderError, ProviderResult, ProviderState};
pub use clock::{Clock, ManualClock, SystemClock};
pub use callback::{EventDispatcher, GeofenceCallback, LocationCallback};
pub use command::{CommandSender, ProviderCommand};
pub use provider::GpsProvider;

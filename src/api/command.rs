//! Deferred device commands
//! 
//! A `CommandSender` can be captured by callbacks or handed to other code
//! that must not hold the provider. Commands queue up and run in FIFO order
//! after the current dispatch finishes.

use std::sync::mpsc::Sender;

use crate::core::PowerMode;

/// A device command applied later by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderCommand {
    Start,
    Stop,
    Reset,
    SetPowerMode(PowerMode),
    GeofenceRequest,
    RequestImmediateLocation,
    /// Fire-and-forget vendor command; the return value is only logged
    Ioctl { command: u32, arg: Vec<u8> },
}

/// Cloneable handle queuing commands for a provider
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<ProviderCommand>,
}

impl CommandSender {
    pub(crate) fn new(tx: Sender<ProviderCommand>) -> Self {
        Self { tx }
    }

    /// Queue a command. Returns false if the provider no longer exists.
    pub fn send(&self, command: ProviderCommand) -> bool {
        self.tx.send(command).is_ok()
    }
}

//! Most recent fix reported by the receiver

use crate::core::Fix;

/// Holds the latest valid fix and the latest report of any kind
#[derive(Debug, Clone, Default)]
pub struct LocationStore {
    latest_valid: Option<Fix>,
    last_report: Option<Fix>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a report. Invalid reports never displace the last valid fix.
    pub fn update(&mut self, fix: Fix) {
        if fix.valid {
            self.latest_valid = Some(fix.clone());
        }
        self.last_report = Some(fix);
    }

    /// Latest valid fix since the last reset
    pub fn latest(&self) -> Option<&Fix> {
        self.latest_valid.as_ref()
    }

    /// Latest report, valid or not
    pub fn last_report(&self) -> Option<&Fix> {
        self.last_report.as_ref()
    }

    pub fn location_available(&self) -> bool {
        self.latest_valid.is_some()
    }

    /// Back to "no fix available"
    pub fn reset(&mut self) {
        self.latest_valid = None;
        self.last_report = None;
    }
}

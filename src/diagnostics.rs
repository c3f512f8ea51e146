//! Runtime diagnostics.
//!
//! [`RelayStats`] counts what the relay did since startup. The relay keeps
//! one instance, logs it on shutdown, and hands it back from `Relay::run`.

use log::info;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayStats {
    pub accepted: u64,
    pub rejected: u64,
    pub dropped: u64,
    pub lines: u64,
    pub broadcasts: u64,
    pub failed_sends: u64,
    pub overrides: u64,
    pub line_overflows: u64,
    /// Highest number of simultaneously connected clients.
    pub peak_clients: usize,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn note_clients(&mut self, connected: usize) {
        self.peak_clients = self.peak_clients.max(connected);
    }

    pub fn log_summary(&self) {
        info!(
            "STATS | accepted={} rejected={} dropped={} peak={} | lines={} broadcasts={} \
             failed_sends={} overrides={} overflows={}",
            self.accepted,
            self.rejected,
            self.dropped,
            self.peak_clients,
            self.lines,
            self.broadcasts,
            self.failed_sends,
            self.overrides,
            self.line_overflows,
        );
    }
}

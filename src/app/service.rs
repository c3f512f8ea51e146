//! Presence service: the per-line pipeline.
//!
//! [`PresenceService`] owns the decision rules and the override memory.
//! Each report line flows Parser → Override poll → Decision Engine here;
//! the state source and event sink are injected at the call site, so the
//! whole pipeline is testable with mock adapters.
//!
//! ```text
//!  OverrideSource ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                     │     PresenceService      │
//!      report line ──▶│ parse · observe · decide │ ──▶ Verdict
//!                     └──────────────────────────┘
//! ```

use log::{debug, info};

use crate::config::{DecisionRules, RelayConfig};
use crate::presence::{OverrideState, Verdict, decide, parse_report};

use super::events::AppEvent;
use super::ports::{EventSink, OverrideSource};

pub struct PresenceService {
    rules: DecisionRules,
    max_devices: usize,
    state: OverrideState,
}

impl PresenceService {
    pub fn new(config: &RelayConfig) -> Self {
        Self {
            rules: config.rules.clone(),
            max_devices: config.max_devices,
            state: OverrideState::new(),
        }
    }

    /// Reduce one report line to a verdict.
    ///
    /// The source is polled exactly once, and the override memory is
    /// updated with that poll's result before returning.
    pub fn process_line(
        &mut self,
        slot: usize,
        line: &str,
        source: &mut impl OverrideSource,
        sink: &mut impl EventSink,
    ) -> Verdict {
        debug!("slot {} <- {}", slot, line);
        sink.emit(&AppEvent::ReportReceived { slot, line });

        let report = parse_report(line, self.max_devices);
        let observed = source.poll();
        let prev = self.state.last();
        let (verdict, next) = decide(&report, observed, self.state, &self.rules);
        self.state = next;

        if verdict.is_override() {
            info!(
                "state symbol changed: {:?} -> {:?}, override level {}",
                prev,
                observed,
                verdict.level()
            );
        }

        sink.emit(&AppEvent::Decided {
            verdict,
            swing: report.swing,
            devices: report.devices.len(),
        });
        verdict
    }

    /// Last observed state symbol.
    pub fn override_state(&self) -> OverrideState {
        self.state
    }
}

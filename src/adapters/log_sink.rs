//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured relay events through the
//! `log` facade (stderr via `env_logger` in the binary). Lines are tagged
//! `TAG | ...` so they grep well next to the library's own diagnostics.

use log::{debug, info, warn};

use crate::app::events::{AppEvent, DropReason};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`].
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent<'_>) {
        match event {
            AppEvent::Listening(addr) => {
                info!("START | listening on {}", addr);
            }
            AppEvent::ClientConnected { slot, peer } => {
                info!("CONN  | slot {} <- {}", slot, peer);
            }
            AppEvent::ClientRejected { peer } => {
                warn!("REJECT | {} (all slots taken)", peer);
            }
            AppEvent::ClientDropped { slot, peer, reason } => match reason {
                DropReason::Eof => info!("DROP  | slot {} ({}) closed by peer", slot, peer),
                DropReason::ReadError(kind) => {
                    warn!("DROP  | slot {} ({}) read failed: {:?}", slot, peer, kind)
                }
                DropReason::SendFailed => {
                    warn!("DROP  | slot {} ({}) send failed", slot, peer)
                }
            },
            AppEvent::ReportReceived { slot, line } => {
                debug!("REPORT | slot {} | {} bytes", slot, line.len());
            }
            AppEvent::Decided {
                verdict,
                swing,
                devices,
            } => {
                let tag = if verdict.is_override() { "OVERRIDE" } else { "DECIDE" };
                info!(
                    "{} | {} | level={} swing={} devices={}",
                    tag,
                    verdict,
                    verdict.level(),
                    swing,
                    devices
                );
            }
            AppEvent::Broadcast {
                level,
                delivered,
                failed,
            } => {
                if *failed > 0 {
                    warn!(
                        "SEND  | level {} to {} clients, {} failed",
                        level, delivered, failed
                    );
                } else {
                    debug!("SEND  | level {} to {} clients", level, delivered);
                }
            }
            AppEvent::LineOverflow { slot } => {
                warn!("REPORT | slot {} line too long, discarded", slot);
            }
            AppEvent::Shutdown => {
                info!("STOP  | shutdown requested");
            }
        }
    }
}

//! Port traits: the boundary between the presence domain and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PresenceService (domain)
//! ```
//!
//! Driven adapters (state file, log output, report mirror) implement these
//! traits. The [`PresenceService`](super::service::PresenceService) takes
//! them as generics at each call, so the domain core never touches the
//! filesystem directly.

use super::events::AppEvent;

// ───────────────────────────────────────────────────────────────
// Override source (driven adapter: state file → domain)
// ───────────────────────────────────────────────────────────────

/// Polled once per processed report line.
pub trait OverrideSource {
    /// Current state symbol, or `None` when nothing could be read.
    /// Failures are never reported any other way.
    fn poll(&mut self) -> Option<char>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / mirroring)
// ───────────────────────────────────────────────────────────────

/// The relay emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent<'_>);
}

/// Deliver to both sinks, first `A` then `B`.
impl<A: EventSink, B: EventSink> EventSink for (A, B) {
    fn emit(&mut self, event: &AppEvent<'_>) {
        self.0.emit(event);
        self.1.emit(event);
    }
}

/// An absent optional sink swallows everything.
impl<S: EventSink> EventSink for Option<S> {
    fn emit(&mut self, event: &AppEvent<'_>) {
        if let Some(sink) = self {
            sink.emit(event);
        }
    }
}

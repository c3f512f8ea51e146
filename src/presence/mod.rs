//! Presence domain: reports, override edges, and the decision engine.
//!
//! ```text
//!   line ──▶ parse_report ──▶ PresenceReport ─┐
//!                                             ├──▶ decide ──▶ Verdict
//!   state-file poll ──▶ OverrideState ────────┘
//! ```
//!
//! Nothing in here performs I/O.

pub mod decision;
pub mod override_watch;
pub mod report;

pub use decision::{Verdict, decide};
pub use override_watch::{Edge, OverrideState};
pub use report::{DeviceReading, PresenceReport, parse_report};

//! Relay: TCP fan-out of presence levels.
//!
//! ```text
//!  report clients ──▶ Relay (io_task) ──▶ LineFramer (codec)
//!                         │                    │ line
//!                         │                    ▼
//!                         │             PresenceService
//!                         │                    │ level
//!                         ▼                    ▼
//!                   SlotTable (slots) ◀── broadcast
//! ```
//!
//! Every connected client is both a potential reporter and a receiver of
//! every decided level.

pub mod broadcast;
pub mod codec;
pub mod io_task;
pub mod slots;
pub mod transport;

pub use broadcast::{FanoutOutcome, broadcast};
pub use codec::LineFramer;
pub use io_task::Relay;
pub use slots::{ClientSlot, SlotTable};
pub use transport::Transport;

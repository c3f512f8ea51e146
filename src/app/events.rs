//! Outbound application events.
//!
//! The relay and the [`PresenceService`](super::service::PresenceService)
//! emit these through the [`EventSink`](super::ports::EventSink) port.
//! Adapters on the other side decide what to do with them, such as
//! logging them or mirroring the last report to disk.

use std::io;
use std::net::SocketAddr;

use crate::presence::Verdict;

/// Why a client slot was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    /// Peer closed its side.
    Eof,
    /// Receive failed.
    ReadError(io::ErrorKind),
    /// Outbound queue overflowed or a write failed.
    SendFailed,
}

/// Structured events emitted by the relay core.
#[derive(Debug, Clone)]
pub enum AppEvent<'a> {
    /// Listener bound and accepting.
    Listening(SocketAddr),

    /// A connection took a free slot.
    ClientConnected { slot: usize, peer: SocketAddr },

    /// A connection arrived while every slot was taken and was closed.
    ClientRejected { peer: SocketAddr },

    /// A slot was closed and freed.
    ClientDropped {
        slot: usize,
        peer: SocketAddr,
        reason: DropReason,
    },

    /// One complete report line arrived on `slot`.
    ReportReceived { slot: usize, line: &'a str },

    /// A report was reduced to a verdict.
    Decided {
        verdict: Verdict,
        swing: i32,
        devices: usize,
    },

    /// A level went out to every live slot.
    Broadcast {
        level: i32,
        delivered: usize,
        failed: usize,
    },

    /// Partial line exceeded the line limit and was discarded.
    LineOverflow { slot: usize },

    /// Orderly shutdown started.
    Shutdown,
}

//! Broadcast fan-out of a decided level to every live slot.

use super::codec::encode_level;
use super::slots::SlotTable;
use super::transport::Transport;

/// Result of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanoutOutcome {
    /// Slots that took the line (written or queued).
    pub delivered: usize,
    /// Slots marked failed by this fan-out.
    pub failed: usize,
}

/// Queue `"{level}\n"` on every live slot and flush without blocking.
///
/// A slot that cannot take the line is marked failed and delivery
/// continues with the others. Failed slots are left in the table for the
/// caller to reap.
pub fn broadcast<T: Transport>(level: i32, slots: &mut SlotTable<T>) -> FanoutOutcome {
    let line = encode_level(level);
    let mut outcome = FanoutOutcome::default();

    for (_, slot) in slots.iter_mut() {
        if slot.is_failed() {
            continue;
        }
        if slot.enqueue(line.as_bytes()) && slot.flush() {
            outcome.delivered += 1;
        } else {
            outcome.failed += 1;
        }
    }
    outcome
}

//! Client slot table.
//!
//! A fixed number of slots, each either free (`None`) or holding exactly
//! one live connection with its own framer and outbound queue.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;

use super::codec::LineFramer;
use super::transport::Transport;

// ── ClientSlot ───────────────────────────────────────────────

pub struct ClientSlot<T> {
    transport: T,
    peer: SocketAddr,
    framer: LineFramer,
    outbound: VecDeque<u8>,
    max_outbound: usize,
    failed: bool,
}

impl<T: Transport> ClientSlot<T> {
    pub fn new(transport: T, peer: SocketAddr, max_line_len: usize, max_outbound: usize) -> Self {
        Self {
            transport,
            peer,
            framer: LineFramer::new(max_line_len),
            outbound: VecDeque::new(),
            max_outbound,
            failed: false,
        }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn framer_mut(&mut self) -> &mut LineFramer {
        &mut self.framer
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn mark_failed(&mut self) {
        self.failed = true;
    }

    /// Bytes queued but not yet accepted by the transport.
    pub fn pending_output(&self) -> usize {
        self.outbound.len()
    }

    /// Queue `bytes` for sending. Marks the slot failed and returns
    /// `false` if the queue limit would be exceeded.
    pub fn enqueue(&mut self, bytes: &[u8]) -> bool {
        if self.outbound.len() + bytes.len() > self.max_outbound {
            self.failed = true;
            return false;
        }
        self.outbound.extend(bytes);
        true
    }

    /// Write as much queued output as the transport takes without blocking.
    /// Returns `false` (and marks the slot failed) on a hard write failure.
    pub fn flush(&mut self) -> bool {
        while !self.outbound.is_empty() {
            let (head, _) = self.outbound.as_slices();
            match self.transport.write(head) {
                Ok(0) => {
                    self.failed = true;
                    return false;
                }
                Ok(n) => {
                    self.outbound.drain(..n);
                }
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(_) => {
                    self.failed = true;
                    return false;
                }
            }
        }
        true
    }
}

// ── SlotTable ────────────────────────────────────────────────

pub struct SlotTable<T> {
    slots: Vec<Option<ClientSlot<T>>>,
}

impl<T: Transport> SlotTable<T> {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Occupied slots.
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Install `slot` in the lowest free index. Hands it back when full.
    pub fn admit(&mut self, slot: ClientSlot<T>) -> Result<usize, ClientSlot<T>> {
        match self.slots.iter().position(Option::is_none) {
            Some(idx) => {
                self.slots[idx] = Some(slot);
                Ok(idx)
            }
            None => Err(slot),
        }
    }

    pub fn get(&self, idx: usize) -> Option<&ClientSlot<T>> {
        self.slots.get(idx).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, idx: usize) -> Option<&mut ClientSlot<T>> {
        self.slots.get_mut(idx).and_then(Option::as_mut)
    }

    /// Free `idx`, returning the connection it held.
    pub fn remove(&mut self, idx: usize) -> Option<ClientSlot<T>> {
        self.slots.get_mut(idx).and_then(Option::take)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &ClientSlot<T>)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|s| (i, s)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut ClientSlot<T>)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(i, s)| s.as_mut().map(|s| (i, s)))
    }

    /// Free every slot marked failed.
    pub fn reap_failed(&mut self) -> Vec<(usize, ClientSlot<T>)> {
        let mut reaped = Vec::new();
        for (idx, entry) in self.slots.iter_mut().enumerate() {
            if entry.as_ref().is_some_and(ClientSlot::is_failed) {
                if let Some(slot) = entry.take() {
                    reaped.push((idx, slot));
                }
            }
        }
        reaped
    }

    /// Free every slot, returning how many were occupied.
    pub fn clear(&mut self) -> usize {
        self.slots.iter_mut().filter_map(Option::take).count()
    }
}

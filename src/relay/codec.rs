//! Newline line framer.
//!
//! Wire format (inbound and outbound):
//! ```text
//! ┌──────────────────────────────┬────┐
//! │ UTF-8 text (no '\n' inside)  │ \n │   optional '\r' before '\n'
//! └──────────────────────────────┴────┘
//! ```
//!
//! The framer accumulates incoming bytes and yields complete lines. A
//! single receive may carry part of a line, exactly one line, or several
//! lines back to back; the unterminated tail is kept across calls.

use std::collections::VecDeque;

/// Streaming line decoder, one per connection.
#[derive(Debug)]
pub struct LineFramer {
    partial: Vec<u8>,
    ready: VecDeque<String>,
    max_line_len: usize,
    /// Inside an oversized line; drop bytes up to the next '\n'.
    discarding: bool,
    overflows: u64,
}

impl LineFramer {
    pub fn new(max_line_len: usize) -> Self {
        Self {
            partial: Vec::new(),
            ready: VecDeque::new(),
            max_line_len,
            discarding: false,
            overflows: 0,
        }
    }

    /// Append received bytes. Complete lines become available through
    /// [`next_line`](Self::next_line).
    pub fn push(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let (segment, terminated, rest) = match data.iter().position(|&b| b == b'\n') {
                Some(i) => (&data[..i], true, &data[i + 1..]),
                None => (data, false, &data[data.len()..]),
            };
            data = rest;

            if self.discarding {
                self.discarding = !terminated;
                continue;
            }

            if self.partial.len() + segment.len() > self.max_line_len {
                self.partial.clear();
                self.overflows += 1;
                self.discarding = !terminated;
                continue;
            }

            self.partial.extend_from_slice(segment);
            if terminated {
                self.finish_line();
            }
        }
    }

    /// Next complete line, without its terminator.
    pub fn next_line(&mut self) -> Option<String> {
        self.ready.pop_front()
    }

    /// Push `data` and drain every line it completed.
    pub fn feed(&mut self, data: &[u8]) -> impl Iterator<Item = String> + '_ {
        self.push(data);
        core::iter::from_fn(move || self.next_line())
    }

    /// Bytes held for the current unterminated line.
    pub fn pending(&self) -> usize {
        self.partial.len()
    }

    /// Lines dropped for exceeding the length limit.
    pub fn overflows(&self) -> u64 {
        self.overflows
    }

    fn finish_line(&mut self) {
        let line = self.partial.strip_suffix(b"\r").unwrap_or(&self.partial[..]);
        if !line.is_empty() {
            self.ready.push_back(String::from_utf8_lossy(line).into_owned());
        }
        self.partial.clear();
    }
}

/// Encode a broadcast level as one outbound line.
pub fn encode_level(level: i32) -> String {
    format!("{level}\n")
}

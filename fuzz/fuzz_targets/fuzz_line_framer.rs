//! Fuzz target: `LineFramer::push` / `next_line`
//!
//! Splits arbitrary input at a fuzzer-chosen point and feeds both halves.
//! Lines must never contain a delimiter, never be empty, and never exceed
//! the configured limit; the unterminated tail must stay within it too.
//!
//! cargo fuzz run fuzz_line_framer

#![no_main]

use libfuzzer_sys::fuzz_target;
use presence_relay::relay::codec::LineFramer;

const LIMIT: usize = 64;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let at = usize::from(split).min(rest.len());
    let mut framer = LineFramer::new(LIMIT);

    for chunk in [&rest[..at], &rest[at..]] {
        for line in framer.feed(chunk) {
            assert!(!line.is_empty());
            assert!(!line.contains('\n'));
            // Lossy decoding may widen bytes into U+FFFD (3 bytes each).
            assert!(line.len() <= LIMIT * 3);
        }
        assert!(framer.pending() <= LIMIT);
    }
});

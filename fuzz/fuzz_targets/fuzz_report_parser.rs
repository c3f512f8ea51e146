//! Fuzz target: `parse_report` + `decide`
//!
//! Any line must parse without panicking, respect the device bound, and
//! reduce to a level inside the configured table.
//!
//! cargo fuzz run fuzz_report_parser

#![no_main]

use libfuzzer_sys::fuzz_target;
use presence_relay::config::DecisionRules;
use presence_relay::presence::{OverrideState, decide, parse_report};

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    let report = parse_report(&line, 8);
    assert!(report.devices.len() <= 8);
    for device in &report.devices {
        assert!(device.id.len() <= 19);
    }

    let rules = DecisionRules::default();
    let (verdict, state) = decide(&report, None, OverrideState::new(), &rules);
    assert!((-1..=3).contains(&verdict.level()));
    assert_eq!(state, OverrideState::new());
});

//! Integration tests for the PresenceService → decision pipeline.
//!
//! Drive report lines through the service with scripted override polls and
//! check the verdicts and emitted events.

use presence_relay::config::{DecisionRules, OverrideRule, RelayConfig, ThresholdBand};
use presence_relay::presence::Verdict;
use presence_relay::app::service::PresenceService;

use crate::mock_source::{RecordingSink, ScriptedSource};

const NEAR: &str = r#"{"swing":0,"rssi":-35,"found":1}"#;

fn run(lines: &[&str], polls: &[Option<char>]) -> (Vec<i32>, RecordingSink) {
    let mut svc = PresenceService::new(&RelayConfig::default());
    let mut source = ScriptedSource::new(polls);
    let mut sink = RecordingSink::default();
    let levels = lines
        .iter()
        .enumerate()
        .map(|(i, line)| svc.process_line(i, line, &mut source, &mut sink).level())
        .collect();
    assert_eq!(source.polls, lines.len(), "one poll per line");
    (levels, sink)
}

// ── Threshold table ──────────────────────────────────────────

#[test]
fn threshold_levels() {
    let (levels, _) = run(
        &[
            r#"{"rssi":-35,"found":1}"#,
            r#"{"rssi":-50,"found":1}"#,
            r#"{"rssi":-100,"found":1}"#,
            r#"{"rssi":-1000,"found":1}"#,
            r#"{"rssi":-35,"found":0}"#,
        ],
        &[],
    );
    assert_eq!(levels, vec![1, 2, 3, 0, 0]);
}

#[test]
fn representative_is_strongest_found_device() {
    let (levels, sink) = run(
        &[r#"{"swing":2,"devices":[{"mac":"a","rssi":-70,"found":1},{"mac":"b","rssi":-45,"found":1}]}"#],
        &[],
    );
    assert_eq!(levels, vec![2]);
    assert_eq!(sink.verdicts, vec![Verdict::Proximity(2)]);
}

// ── Override edge ────────────────────────────────────────────

#[test]
fn neutral_to_symbol_fires_once() {
    let (levels, _) = run(
        &[NEAR, NEAR, NEAR, NEAR, NEAR],
        &[Some('0'), Some('0'), Some('A'), Some('A'), Some('A')],
    );
    assert_eq!(levels, vec![1, 1, 4, 1, 1]);
}

#[test]
fn unreadable_source_keeps_memory() {
    // '0', then two failed polls, then 'B': the edge is still from neutral.
    let (levels, sink) = run(&[NEAR, NEAR, NEAR, NEAR], &[Some('0'), None, None, Some('B')]);
    assert_eq!(levels, vec![1, 1, 1, 5]);
    assert_eq!(
        sink.verdicts.last(),
        Some(&Verdict::Override {
            symbol: 'B',
            level: 5
        })
    );
}

#[test]
fn first_observation_counts_as_leaving_neutral() {
    let (levels, _) = run(&[NEAR, NEAR], &[Some('A'), Some('A')]);
    assert_eq!(levels, vec![4, 1]);
}

#[test]
fn switching_between_symbols_does_not_fire() {
    let (levels, _) = run(&[NEAR, NEAR, NEAR], &[Some('0'), Some('A'), Some('B')]);
    assert_eq!(levels, vec![1, 4, 1]);
}

// ── Malformed input ──────────────────────────────────────────

#[test]
fn malformed_lines_decide_nothing_detected() {
    let (levels, sink) = run(
        &[r#"{"rssi":abc}"#, r#"{"rssi":-35,"found":1"#, "garbage", NEAR],
        &[],
    );
    assert_eq!(levels, vec![0, 0, 0, 1]);
    assert_eq!(sink.lines.len(), 4);
    assert_eq!(sink.lines[2], "garbage");
}

// ── Custom rules ─────────────────────────────────────────────

#[test]
fn configured_rules_replace_defaults() {
    let config = RelayConfig {
        rules: DecisionRules {
            thresholds: vec![
                ThresholdBand {
                    above_dbm: -60,
                    level: 7,
                },
                ThresholdBand {
                    above_dbm: -90,
                    level: 8,
                },
            ],
            selection_floor_dbm: -128,
            overrides: vec![OverrideRule {
                symbol: 'X',
                level: 9,
            }],
            neutral_symbol: '-',
        },
        ..RelayConfig::default()
    };
    assert!(config.validate().is_ok());

    let mut svc = PresenceService::new(&config);
    let mut source = ScriptedSource::new(&[Some('-'), None, Some('X')]);
    let mut sink = RecordingSink::default();

    let levels: Vec<i32> = [
        r#"{"rssi":-50,"found":1}"#,
        r#"{"rssi":-95,"found":1}"#,
        r#"{"rssi":-50,"found":1}"#,
    ]
    .iter()
    .map(|l| svc.process_line(0, l, &mut source, &mut sink).level())
    .collect();

    // -95 is above the floor but below every band.
    assert_eq!(levels, vec![7, -1, 9]);
    assert_eq!(
        sink.verdicts.iter().filter(|v| v.is_override()).count(),
        1
    );
}

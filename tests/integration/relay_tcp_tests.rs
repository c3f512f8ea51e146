//! Relay tests over real loopback sockets.

use std::fs;
use std::io::ErrorKind;
use std::thread;
use std::time::Duration;

use presence_relay::adapters::report_mirror::ReportMirror;
use presence_relay::adapters::state_file::FileOverrideSource;

use crate::mock_source::{Client, NullSink, RunningRelay, join, test_config};

fn start_default() -> RunningRelay {
    let config = test_config();
    let source = FileOverrideSource::new(config.state_file.clone());
    RunningRelay::start(config, source, NullSink)
}

// ── Fan-out ──────────────────────────────────────────────────

#[test]
fn every_client_receives_each_level() {
    let relay = start_default();
    let mut clients = Vec::new();
    for _ in 0..3 {
        join(&mut clients, relay.addr);
    }

    clients[1].send("{\"rssi\":-35,\"found\":1}\n");
    for c in &mut clients {
        assert_eq!(c.read_level(), 1);
    }

    let stats = relay.stop();
    assert_eq!(stats.accepted, 3);
    assert_eq!(stats.lines, 4);
}

#[test]
fn closed_client_does_not_stop_fanout() {
    let relay = start_default();
    let mut clients = Vec::new();
    for _ in 0..3 {
        join(&mut clients, relay.addr);
    }

    drop(clients.remove(0));
    clients[0].send("{\"swing\":0,\"rssi\":-50,\"found\":1}\n");
    for c in &mut clients {
        assert_eq!(c.read_level(), 2);
    }

    clients[1].send("{\"rssi\":-100,\"found\":1}\n");
    for c in &mut clients {
        assert_eq!(c.read_level(), 3);
    }
    relay.stop();
}

// ── Capacity ─────────────────────────────────────────────────

#[test]
fn extra_client_is_rejected_when_full() {
    let config = crate::mock_source::test_config();
    let source = FileOverrideSource::new(config.state_file.clone());
    let relay = RunningRelay::start(
        presence_relay::config::RelayConfig {
            max_clients: 2,
            ..config
        },
        source,
        NullSink,
    );

    let mut clients = Vec::new();
    join(&mut clients, relay.addr);
    join(&mut clients, relay.addr);

    let mut extra = Client::connect(relay.addr);
    let mut line = String::new();
    match extra.read_raw(&mut line) {
        Ok(n) => assert_eq!(n, 0, "rejected client got data: {line:?}"),
        Err(e) => assert!(
            matches!(e.kind(), ErrorKind::ConnectionReset | ErrorKind::ConnectionAborted),
            "unexpected error {e}"
        ),
    }

    // Admitted clients are unaffected.
    clients[0].send("{\"rssi\":-20,\"found\":1}\n");
    for c in &mut clients {
        assert_eq!(c.read_level(), 1);
    }

    let stats = relay.stop();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.rejected, 1);
}

// ── Framing and parsing ──────────────────────────────────────

#[test]
fn line_split_across_reads_is_reassembled() {
    let relay = start_default();
    let mut clients = Vec::new();
    join(&mut clients, relay.addr);

    clients[0].send("{\"rssi\":-3");
    thread::sleep(Duration::from_millis(100));
    clients[0].send("5,\"found\":1}\n");
    assert_eq!(clients[0].read_level(), 1);

    let stats = relay.stop();
    assert_eq!(stats.lines, 2);
}

#[test]
fn malformed_report_yields_zero_and_keeps_connection() {
    let relay = start_default();
    let mut clients = Vec::new();
    join(&mut clients, relay.addr);

    clients[0].send("{\"rssi\":abc}\n");
    assert_eq!(clients[0].read_level(), 0);

    clients[0].send("{\"rssi\":-100,\"found\":1}\r\n");
    assert_eq!(clients[0].read_level(), 3);

    let stats = relay.stop();
    assert_eq!(stats.dropped, 0);
}

#[test]
fn multi_device_report_uses_strongest_found() {
    let relay = start_default();
    let mut clients = Vec::new();
    join(&mut clients, relay.addr);

    clients[0].send(concat!(
        r#"{"swing":3,"devices":["#,
        r#"{"mac":"AA:BB:CC:DD:EE:01","rssi":-70,"found":1},"#,
        r#"{"mac":"AA:BB:CC:DD:EE:02","rssi":-45,"found":1},"#,
        r#"{"mac":"AA:BB:CC:DD:EE:03","rssi":-10,"found":0}]}"#,
        "\n"
    ));
    assert_eq!(clients[0].read_level(), 2);
    relay.stop();
}

#[test]
fn broken_report_still_uses_entries_before_the_damage() {
    let relay = start_default();
    let mut clients = Vec::new();
    join(&mut clients, relay.addr);

    clients[0].send(concat!(
        r#"{"swing":0,"devices":[{"mac":"a","rssi":-30,"found":1},"#,
        r#"{"mac":"b","rssi":abc,"found":1}]}"#,
        "\n"
    ));
    assert_eq!(clients[0].read_level(), 1);

    // Cut off inside the second entry.
    clients[0].send("{\"swing\":0,\"devices\":[{\"mac\":\"a\",\"rssi\":-50,\"found\":1},{\"mac\":\"b\",\"rssi\":-4\n");
    assert_eq!(clients[0].read_level(), 2);

    let stats = relay.stop();
    assert_eq!(stats.dropped, 0);
}

// ── Override state file ──────────────────────────────────────

#[test]
fn state_file_edge_overrides_once() {
    let dir = tempfile::tempdir().unwrap();
    let state = dir.path().join("command.txt");
    fs::write(&state, "0").unwrap();

    let config = presence_relay::config::RelayConfig {
        state_file: state.clone(),
        ..test_config()
    };
    let relay = RunningRelay::start(config, FileOverrideSource::new(&state), NullSink);
    let mut clients = Vec::new();
    join(&mut clients, relay.addr);

    let near = "{\"rssi\":-35,\"found\":1}\n";

    fs::write(&state, "A\n").unwrap();
    clients[0].send(near);
    assert_eq!(clients[0].read_level(), 4);

    // Held symbol does not re-fire.
    clients[0].send(near);
    assert_eq!(clients[0].read_level(), 1);

    fs::write(&state, "0").unwrap();
    clients[0].send(near);
    assert_eq!(clients[0].read_level(), 1);

    fs::write(&state, "B").unwrap();
    clients[0].send(near);
    assert_eq!(clients[0].read_level(), 5);

    fs::write(&state, "0").unwrap();
    clients[0].send(near);
    assert_eq!(clients[0].read_level(), 1);

    // Unmapped symbol still fires, with the "no signal" level.
    fs::write(&state, "C").unwrap();
    clients[0].send(near);
    assert_eq!(clients[0].read_level(), -1);

    let stats = relay.stop();
    assert_eq!(stats.overrides, 3);
}

// ── Report mirror ────────────────────────────────────────────

#[test]
fn report_mirror_holds_latest_line() {
    let dir = tempfile::tempdir().unwrap();
    let mirror = dir.path().join("received_data.txt");

    let config = test_config();
    let source = FileOverrideSource::new(config.state_file.clone());
    let relay = RunningRelay::start(config, source, ReportMirror::new(&mirror));
    let mut clients = Vec::new();
    join(&mut clients, relay.addr);

    clients[0].send("{\"swing\":7,\"rssi\":-60,\"found\":1}\n");
    assert_eq!(clients[0].read_level(), 3);
    assert_eq!(
        fs::read_to_string(&mirror).unwrap(),
        "{\"swing\":7,\"rssi\":-60,\"found\":1}\n"
    );
    relay.stop();
}

// ── Shutdown ─────────────────────────────────────────────────

#[test]
fn shutdown_closes_every_client() {
    let relay = start_default();
    let mut clients = Vec::new();
    join(&mut clients, relay.addr);
    join(&mut clients, relay.addr);

    let stats = relay.stop();
    assert_eq!(stats.accepted, 2);
    assert_eq!(stats.peak_clients, 2);

    let mut line = String::new();
    for c in &mut clients {
        match c.read_raw(&mut line) {
            Ok(n) => assert_eq!(n, 0),
            Err(e) => assert_eq!(e.kind(), ErrorKind::ConnectionReset),
        }
    }
}

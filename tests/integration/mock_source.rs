//! Mock adapters and a threaded relay harness for integration tests.

use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use presence_relay::app::events::AppEvent;
use presence_relay::app::ports::{EventSink, OverrideSource};
use presence_relay::config::RelayConfig;
use presence_relay::diagnostics::RelayStats;
use presence_relay::presence::Verdict;
use presence_relay::relay::Relay;

// ── Override sources ──────────────────────────────────────────

/// Replays a fixed sequence of poll results, then reports nothing.
pub struct ScriptedSource {
    script: VecDeque<Option<char>>,
    pub polls: usize,
}

impl ScriptedSource {
    pub fn new(script: &[Option<char>]) -> Self {
        Self {
            script: script.iter().copied().collect(),
            polls: 0,
        }
    }
}

impl OverrideSource for ScriptedSource {
    fn poll(&mut self) -> Option<char> {
        self.polls += 1;
        self.script.pop_front().flatten()
    }
}

// ── Event sinks ───────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub lines: Vec<String>,
    pub verdicts: Vec<Verdict>,
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent<'_>) {
        match event {
            AppEvent::ReportReceived { line, .. } => self.lines.push((*line).to_owned()),
            AppEvent::Decided { verdict, .. } => self.verdicts.push(*verdict),
            _ => {}
        }
    }
}

pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &AppEvent<'_>) {}
}

// ── Relay harness ─────────────────────────────────────────────

pub fn test_config() -> RelayConfig {
    RelayConfig {
        bind_address: Ipv4Addr::LOCALHOST.into(),
        port: 0,
        tick_ms: 20,
        state_file: "/nonexistent/presence-relay/command.txt".into(),
        ..RelayConfig::default()
    }
}

/// A relay serving on its own thread.
pub struct RunningRelay {
    pub addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    handle: JoinHandle<RelayStats>,
}

impl RunningRelay {
    pub fn start<S, E>(config: RelayConfig, source: S, sink: E) -> Self
    where
        S: OverrideSource + Send + 'static,
        E: EventSink + Send + 'static,
    {
        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let (tx, rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let relay = Relay::bind(&config, source, sink).expect("bind relay");
            tx.send(relay.local_addr()).expect("report address");
            relay.run(&flag).expect("relay run")
        });

        let addr = rx.recv().expect("relay started");
        Self {
            addr,
            shutdown,
            handle,
        }
    }

    pub fn stop(self) -> RelayStats {
        self.shutdown.store(true, Ordering::Relaxed);
        self.handle.join().expect("relay thread")
    }
}

// ── Clients ───────────────────────────────────────────────────

pub struct Client {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl Client {
    pub fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("read timeout");
        let reader = BufReader::new(stream.try_clone().expect("clone stream"));
        Self { stream, reader }
    }

    pub fn send(&mut self, text: &str) {
        self.stream.write_all(text.as_bytes()).expect("send");
        self.stream.flush().expect("flush");
    }

    /// Raw next line; `Ok(0)` on EOF.
    pub fn read_raw(&mut self, buf: &mut String) -> std::io::Result<usize> {
        buf.clear();
        self.reader.read_line(buf)
    }

    /// Next broadcast level.
    pub fn read_level(&mut self) -> i32 {
        let mut line = String::new();
        let n = self.read_raw(&mut line).expect("read level");
        assert!(n > 0, "relay closed the connection");
        line.trim_end().parse().expect("numeric level")
    }
}

/// Connect a new client and wait until the relay has admitted it: the
/// newcomer sends an empty report, and every client (old and new) must
/// see the resulting level 0.
pub fn join(clients: &mut Vec<Client>, addr: SocketAddr) {
    let mut client = Client::connect(addr);
    client.send("{}\n");
    clients.push(client);
    for c in clients.iter_mut() {
        assert_eq!(c.read_level(), 0);
    }
}

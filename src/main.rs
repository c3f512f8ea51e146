//! Presence relay: main entry point.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                    Adapters (outer ring)                     │
//! │                                                              │
//! │  FileOverrideSource     LogEventSink      ReportMirror       │
//! │  (OverrideSource)       (EventSink)       (EventSink, opt.)  │
//! │                                                              │
//! │  ─────────────── Port Trait Boundary ───────────────────     │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │  Relay (TCP fan-out) · PresenceService (pure logic)    │  │
//! │  └────────────────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Configuration: defaults → `--config` JSON file → CLI flags / env vars.
//! SIGINT or SIGTERM stops the relay after closing every connection.

use std::net::IpAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use presence_relay::RelayConfig;
use presence_relay::adapters::log_sink::LogEventSink;
use presence_relay::adapters::report_mirror::ReportMirror;
use presence_relay::adapters::state_file::FileOverrideSource;
use presence_relay::relay::Relay;

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

// ── CLI ───────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "presence-relay", version, about)]
struct Cli {
    /// JSON configuration file.
    #[arg(long, env = "PRESENCE_CONFIG")]
    config: Option<PathBuf>,

    /// Address to listen on.
    #[arg(long, env = "PRESENCE_BIND")]
    bind: Option<IpAddr>,

    /// TCP port to listen on.
    #[arg(short, long, env = "PRESENCE_PORT")]
    port: Option<u16>,

    #[arg(long, env = "PRESENCE_MAX_CLIENTS")]
    max_clients: Option<usize>,

    #[arg(long, env = "PRESENCE_MAX_DEVICES")]
    max_devices: Option<usize>,

    /// File polled for the override state symbol.
    #[arg(long, env = "PRESENCE_STATE_FILE")]
    state_file: Option<PathBuf>,

    /// Mirror the latest report line into this file.
    #[arg(long, env = "PRESENCE_REPORT_MIRROR")]
    report_mirror: Option<PathBuf>,

    /// Default log filter; RUST_LOG takes precedence.
    #[arg(long, env = "PRESENCE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn load_config(&self) -> Result<RelayConfig> {
        let mut config = match &self.config {
            Some(path) => RelayConfig::from_file(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => RelayConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.bind_address = bind;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(n) = self.max_clients {
            config.max_clients = n;
        }
        if let Some(n) = self.max_devices {
            config.max_devices = n;
        }
        if let Some(path) = &self.state_file {
            config.state_file = path.clone();
        }
        if let Some(path) = &self.report_mirror {
            config.report_mirror = Some(path.clone());
        }

        config.validate().context("invalid configuration")?;
        Ok(config)
    }
}

// ── Signals ───────────────────────────────────────────────────

#[cfg(unix)]
extern "C" fn on_signal(_signal: nix::libc::c_int) {
    SHUTDOWN.store(true, Ordering::Relaxed);
}

#[cfg(unix)]
fn install_signal_handlers() -> Result<()> {
    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, sigaction};

    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for signal in [Signal::SIGINT, Signal::SIGTERM] {
        // SAFETY: the handler only stores to an atomic.
        unsafe { sigaction(signal, &action) }
            .with_context(|| format!("installing {:?} handler", signal))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn install_signal_handlers() -> Result<()> {
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&cli.log_level))
        .init();

    let config = cli.load_config()?;
    install_signal_handlers()?;

    let source = FileOverrideSource::new(&config.state_file);
    let sink = (LogEventSink::new(), config.report_mirror.clone().map(ReportMirror::new));

    info!(
        "presence-relay {} | state file {}",
        env!("CARGO_PKG_VERSION"),
        config.state_file.display()
    );

    let relay = Relay::bind(&config, source, sink).context("starting relay")?;
    let stats = relay.run(&SHUTDOWN).context("relay stopped")?;

    info!(
        "presence-relay exiting after {} lines from {} clients",
        stats.lines, stats.accepted
    );
    Ok(())
}

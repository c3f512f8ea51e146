//! Relay I/O loop: readiness-driven multi-client TCP server.
//!
//! One thread, one future. Each pass builds the readiness set, waits until
//! at least one member is ready, then services *every* member that was
//! ready in that poll pass before building the next set.
//!
//! ```text
//!  ┌──────────────────────────────────────────────────────────────┐
//!  │  futures_lite::future::block_on                              │
//!  │                                                              │
//!  │   listener.readable ─┐                                       │
//!  │   slot[i].readable ──┤                                       │
//!  │   slot[i].writable ──┼──▶ poll pass ──▶ Vec<Wake> ──▶ service │
//!  │   (queued output)    │                                       │
//!  │   tick timer ────────┘   (shutdown flag checked per pass)    │
//!  │                                                              │
//!  │   line ──▶ PresenceService ──▶ Verdict ──▶ broadcast(level)   │
//!  └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Reactor readiness comes from `async-io-mini`; all reads and writes are
//! non-blocking calls on the underlying std sockets.

use core::future::Future;
use core::pin::Pin;
use core::task::Poll;
use core::time::Duration;
use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};

use async_io_mini::{Async, Timer};
use futures_lite::future;
use log::{debug, info, warn};

use crate::app::events::{AppEvent, DropReason};
use crate::app::ports::{EventSink, OverrideSource};
use crate::app::service::PresenceService;
use crate::config::RelayConfig;
use crate::diagnostics::RelayStats;
use crate::error::{Error, Result};

use super::broadcast::broadcast;
use super::slots::{ClientSlot, SlotTable};
use super::transport::Transport;

const READ_BUF_SIZE: usize = 1024;

type Client = Async<TcpStream>;

/// One ready member of the readiness set.
enum Wake {
    Listener(io::Result<()>),
    Readable(usize, io::Result<()>),
    Writable(usize, io::Result<()>),
    Tick,
}

type Waiter<'a> = Pin<Box<dyn Future<Output = Wake> + 'a>>;

pub struct Relay<S, E> {
    listener: Async<TcpListener>,
    local_addr: SocketAddr,
    slots: SlotTable<Client>,
    service: PresenceService,
    source: S,
    sink: E,
    stats: RelayStats,
    max_line_len: usize,
    max_outbound: usize,
    tick: Duration,
}

impl<S: OverrideSource, E: EventSink> Relay<S, E> {
    /// Validate `config`, bind and listen.
    pub fn bind(config: &RelayConfig, source: S, mut sink: E) -> Result<Self> {
        config.validate()?;

        let addr = config.listen_addr();
        let bind_err = |source| Error::Bind { addr, source };
        let std_listener = TcpListener::bind(addr).map_err(bind_err)?;
        let local_addr = std_listener.local_addr().map_err(bind_err)?;
        // The first registration spawns the reactor thread, which inherits
        // this mask and so never sees SIGINT/SIGTERM.
        let listener =
            with_shutdown_signals_blocked(|| Async::new(std_listener)).map_err(bind_err)?;

        info!(
            "relay: listening on {} ({} slots, {} devices/report)",
            local_addr, config.max_clients, config.max_devices
        );
        sink.emit(&AppEvent::Listening(local_addr));

        Ok(Self {
            listener,
            local_addr,
            slots: SlotTable::new(config.max_clients),
            service: PresenceService::new(config),
            source,
            sink,
            stats: RelayStats::new(),
            max_line_len: config.max_line_len,
            max_outbound: config.max_outbound_bytes,
            tick: Duration::from_millis(config.tick_ms),
        })
    }

    /// Address actually bound (resolves port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until `shutdown` is raised or the listener fails.
    ///
    /// The listener and every client connection are closed before this
    /// returns.
    pub fn run(mut self, shutdown: &AtomicBool) -> Result<RelayStats> {
        let served = future::block_on(self.serve(shutdown));

        self.sink.emit(&AppEvent::Shutdown);
        let open = self.slots.clear();
        debug!(
            "relay: closed {} client connection(s), last state symbol {:?}",
            open,
            self.service.override_state().last()
        );
        self.stats.log_summary();

        let stats = self.stats.clone();
        drop(self);
        served.map(|()| stats)
    }

    async fn serve(&mut self, shutdown: &AtomicBool) -> Result<()> {
        let mut scratch = [0u8; READ_BUF_SIZE];

        while !shutdown.load(Ordering::Relaxed) {
            let wakes = self.wait().await;
            for wake in wakes {
                match wake {
                    Wake::Listener(Ok(())) => self.accept_one(),
                    Wake::Listener(Err(e)) if e.kind() == io::ErrorKind::Interrupted => {}
                    Wake::Listener(Err(e)) => return Err(Error::Listener(e)),
                    Wake::Readable(idx, ready) => self.on_readable(idx, ready, &mut scratch),
                    Wake::Writable(idx, ready) => self.on_writable(idx, ready),
                    Wake::Tick => {}
                }
            }
            self.reap();
        }
        Ok(())
    }

    // ── Readiness set ────────────────────────────────────────

    /// Wait for the readiness set and return every member that was ready
    /// in the same poll pass.
    async fn wait(&self) -> Vec<Wake> {
        let mut waiters: Vec<Waiter<'_>> = Vec::with_capacity(2 + 2 * self.slots.capacity());

        let listener = &self.listener;
        waiters.push(Box::pin(async move { Wake::Listener(listener.readable().await) }));

        for (idx, slot) in self.slots.iter() {
            let stream = slot.transport();
            waiters.push(Box::pin(async move {
                Wake::Readable(idx, stream.readable().await)
            }));
            if slot.pending_output() > 0 {
                waiters.push(Box::pin(async move {
                    Wake::Writable(idx, stream.writable().await)
                }));
            }
        }

        let tick = self.tick;
        waiters.push(Box::pin(async move {
            Timer::after(tick).await;
            Wake::Tick
        }));

        future::poll_fn(move |cx| {
            let mut ready = Vec::new();
            for waiter in waiters.iter_mut() {
                if let Poll::Ready(wake) = waiter.as_mut().poll(cx) {
                    ready.push(wake);
                }
            }
            if ready.is_empty() {
                Poll::Pending
            } else {
                Poll::Ready(ready)
            }
        })
        .await
    }

    // ── Listener ─────────────────────────────────────────────

    fn accept_one(&mut self) {
        let (stream, peer) = match self.listener.get_ref().accept() {
            Ok(conn) => conn,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                return;
            }
            Err(e) => {
                warn!("relay: accept failed: {}", e);
                return;
            }
        };

        if self.slots.is_full() {
            // Dropping the stream closes it.
            drop(stream);
            self.stats.rejected += 1;
            self.sink.emit(&AppEvent::ClientRejected { peer });
            return;
        }

        let stream = match Async::new(stream) {
            Ok(s) => s,
            Err(e) => {
                warn!("relay: cannot register {}: {}", peer, e);
                return;
            }
        };

        let slot = ClientSlot::new(stream, peer, self.max_line_len, self.max_outbound);
        if let Ok(idx) = self.slots.admit(slot) {
            self.stats.accepted += 1;
            self.stats.note_clients(self.slots.len());
            self.sink.emit(&AppEvent::ClientConnected { slot: idx, peer });
        }
    }

    // ── Client slots ─────────────────────────────────────────

    fn on_readable(&mut self, idx: usize, ready: io::Result<()>, scratch: &mut [u8]) {
        if let Err(e) = ready {
            if e.kind() != io::ErrorKind::Interrupted {
                self.close(idx, DropReason::ReadError(e.kind()));
            }
            return;
        }

        let Some(slot) = self.slots.get_mut(idx) else {
            return;
        };
        let n = match slot.transport_mut().read(scratch) {
            Ok(0) => {
                self.close(idx, DropReason::Eof);
                return;
            }
            Ok(n) => n,
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) =>
            {
                return;
            }
            Err(e) => {
                self.close(idx, DropReason::ReadError(e.kind()));
                return;
            }
        };

        let framer = slot.framer_mut();
        let before = framer.overflows();
        framer.push(&scratch[..n]);
        let overflowed = framer.overflows() - before;
        if overflowed > 0 {
            self.stats.line_overflows += overflowed;
            self.sink.emit(&AppEvent::LineOverflow { slot: idx });
        }

        // The slot may be reaped mid-way if its own send fails.
        while let Some(line) = self
            .slots
            .get_mut(idx)
            .and_then(|slot| slot.framer_mut().next_line())
        {
            self.handle_line(idx, &line);
        }
    }

    fn on_writable(&mut self, idx: usize, ready: io::Result<()>) {
        let Some(slot) = self.slots.get_mut(idx) else {
            return;
        };
        match ready {
            Ok(()) => {
                slot.flush();
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(_) => slot.mark_failed(),
        }
    }

    fn handle_line(&mut self, idx: usize, line: &str) {
        let verdict = self
            .service
            .process_line(idx, line, &mut self.source, &mut self.sink);
        self.stats.lines += 1;
        if verdict.is_override() {
            self.stats.overrides += 1;
        }

        let level = verdict.level();
        let outcome = broadcast(level, &mut self.slots);
        self.stats.broadcasts += 1;
        self.stats.failed_sends += outcome.failed as u64;
        self.sink.emit(&AppEvent::Broadcast {
            level,
            delivered: outcome.delivered,
            failed: outcome.failed,
        });
        self.reap();
    }

    fn close(&mut self, idx: usize, reason: DropReason) {
        if let Some(slot) = self.slots.remove(idx) {
            self.stats.dropped += 1;
            self.sink.emit(&AppEvent::ClientDropped {
                slot: idx,
                peer: slot.peer(),
                reason,
            });
        }
    }

    fn reap(&mut self) {
        for (idx, slot) in self.slots.reap_failed() {
            self.stats.dropped += 1;
            self.sink.emit(&AppEvent::ClientDropped {
                slot: idx,
                peer: slot.peer(),
                reason: DropReason::SendFailed,
            });
        }
    }
}

// ── Signal mask ──────────────────────────────────────────────

/// Run `f` with SIGINT and SIGTERM blocked on the calling thread, then
/// restore the previous mask. Threads spawned inside `f` keep the block.
#[cfg(unix)]
fn with_shutdown_signals_blocked<T>(f: impl FnOnce() -> T) -> T {
    use nix::sys::signal::{SigSet, SigmaskHow, Signal, pthread_sigmask};

    let mut blocked = SigSet::empty();
    blocked.add(Signal::SIGINT);
    blocked.add(Signal::SIGTERM);

    let mut previous = SigSet::empty();
    if let Err(e) = pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&blocked), Some(&mut previous)) {
        warn!("relay: cannot block shutdown signals: {}", e);
        return f();
    }

    let out = f();

    if let Err(e) = pthread_sigmask(SigmaskHow::SIG_SETMASK, Some(&previous), None) {
        warn!("relay: cannot restore signal mask: {}", e);
    }
    out
}

#[cfg(not(unix))]
fn with_shutdown_signals_blocked<T>(f: impl FnOnce() -> T) -> T {
    f()
}

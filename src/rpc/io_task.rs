//! Socket workers: receive/dispatch and the outbound pipe.
//!
//! Two OS threads share one [`Transport`]:
//!
//! ```text
//!  ┌──────────────────────────── receive worker ───────────────────────────┐
//!  │ gate.wait_running ─▶ reconnect? ─▶ heartbeat? ─▶ recv (≤1 s) ─▶ dispatch│
//!  └───────────────────────────────────────────────────────────┬───────────┘
//!                                                              │ replies
//!                                                              ▼
//!  ┌──────────────────────────── pipe worker ──────────────────────────────┐
//!  │ Pipe::drain_with ─▶ send_to (errors swallowed per datagram)           │
//!  └───────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The receive timeout keeps the heartbeat, reconnect and pause checks
//! responsive.  Reconnect probes are the one send that bypasses the queue;
//! they go out under the pipe lock so they never interleave with a drain.
//!
//! Connection states:
//!
//! ```text
//!  Disconnected ──probe──▶ ProbeSent ──ack──▶ Connected
//!        ▲                                       │
//!        └─────────────── reset notice ──────────┘  (reconnect after delay)
//! ```

use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info, warn};

use super::codec::{Inbound, decode_inbound, frame_outbound};
use super::dispatcher::Dispatcher;
use super::opcode::{CONNECTION, PROBE};
use super::transport::{MAX_DATAGRAM, Transport};
use crate::app::context::EngineContext;
use crate::app::events::EngineEvent;

// ── Connection state ─────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    ProbeSent(SocketAddr),
    Connected(SocketAddr),
}

#[derive(Default)]
struct LinkInner {
    state: LinkState,
    endpoint: Option<SocketAddr>,
    /// Host the user asked for, not yet probed.
    requested: Option<String>,
    /// Host of the latest connection, for reconnects after a reset.
    last_host: Option<String>,
    reconnect_at: Option<Instant>,
    /// `None` means due now.
    next_heartbeat: Option<Instant>,
}

/// Remote endpoint plus the heartbeat and reconnect bookkeeping.
#[derive(Default)]
pub struct Link {
    inner: Mutex<LinkInner>,
}

impl Link {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, LinkInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Where replies-to-nobody and broadcasts go.  `None` until a probe.
    pub fn endpoint(&self) -> Option<SocketAddr> {
        self.lock().endpoint
    }

    pub fn state(&self) -> LinkState {
        self.lock().state
    }

    /// Ask the receive worker to probe `host`.
    pub fn request_connect(&self, host: String) {
        let mut inner = self.lock();
        inner.last_host = Some(host.clone());
        inner.requested = Some(host);
    }

    /// A pending explicit request, or the last host once a scheduled
    /// reconnect is due.
    pub fn take_reconnect(&self, now: Instant) -> Option<String> {
        let mut inner = self.lock();
        if let Some(host) = inner.requested.take() {
            inner.reconnect_at = None;
            return Some(host);
        }
        match inner.reconnect_at {
            Some(at) if now >= at => {
                inner.reconnect_at = None;
                inner.last_host.clone()
            }
            _ => None,
        }
    }

    /// A probe went out to `addr`; it is now the endpoint.
    pub fn probe_sent(&self, addr: SocketAddr, now: Instant, heartbeat: Duration) {
        let mut inner = self.lock();
        inner.endpoint = Some(addr);
        inner.state = LinkState::ProbeSent(addr);
        inner.next_heartbeat = Some(now + heartbeat);
    }

    /// The server acknowledged.  Returns the endpoint if this completed a
    /// probe.
    pub fn acknowledged(&self) -> Option<SocketAddr> {
        let mut inner = self.lock();
        match inner.state {
            LinkState::ProbeSent(addr) => {
                inner.state = LinkState::Connected(addr);
                Some(addr)
            }
            _ => None,
        }
    }

    /// The server dropped us; reconnect after `delay`.
    pub fn reset(&self, now: Instant, delay: Duration) {
        let mut inner = self.lock();
        inner.state = LinkState::Disconnected;
        inner.reconnect_at = Some(now + delay);
    }

    /// Endpoint to send a heartbeat to, if one is due.
    pub fn heartbeat_due(&self, now: Instant, interval: Duration) -> Option<SocketAddr> {
        let mut inner = self.lock();
        let endpoint = inner.endpoint?;
        if inner.next_heartbeat.is_none_or(|at| now >= at) {
            inner.next_heartbeat = Some(now + interval);
            Some(endpoint)
        } else {
            None
        }
    }

    /// Send a heartbeat as soon as the receive worker runs again.
    pub fn reset_heartbeat(&self) {
        self.lock().next_heartbeat = None;
    }
}

/// Host name to resolve for the datagram endpoint: scheme, path and any
/// explicit port are dropped.
pub fn server_host(host: &str) -> &str {
    let host = host.split_once("://").map_or(host, |(_, rest)| rest);
    let host = host.split('/').next().unwrap_or(host);
    if host.parse::<std::net::IpAddr>().is_ok() {
        return host;
    }
    match host.rsplit_once(':') {
        Some((name, port)) if port.chars().all(|c| c.is_ascii_digit()) => name,
        _ => host,
    }
}

// ── Receive worker ───────────────────────────────────────────

/// Spawn the receive/dispatch worker.
pub fn spawn_receiver<T: Transport + 'static>(
    ctx: Arc<EngineContext>,
    transport: Arc<T>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("phoneiot-rx".into())
        .spawn(move || run_receiver(&ctx, &*transport))
}

fn run_receiver<T: Transport>(ctx: &Arc<EngineContext>, transport: &T) {
    info!("RX: receive worker started");
    let dispatcher = Dispatcher::new(Arc::clone(ctx));
    let mut buf = vec![0u8; MAX_DATAGRAM];

    loop {
        if !ctx.gate.is_running() {
            ctx.link.reset_heartbeat();
        }
        if !ctx.gate.wait_running() {
            break;
        }

        let now = Instant::now();
        if let Some(host) = ctx.link.take_reconnect(now) {
            reconnect(ctx, transport, &host);
        }
        if let Some(endpoint) = ctx.link.heartbeat_due(now, ctx.config.heartbeat_interval()) {
            ctx.send_to(endpoint, &[CONNECTION]);
        }

        match transport.recv_from(&mut buf) {
            Ok(None) => {}
            Ok(Some((len, source))) => handle_datagram(ctx, &dispatcher, &buf[..len], source),
            Err(e) => {
                warn!("RX: socket error: {e}");
                thread::sleep(ctx.config.error_backoff());
            }
        }
    }
    info!("RX: receive worker stopped");
}

/// Decode one datagram and act on it.  Replies go back to its source.
pub fn handle_datagram(
    ctx: &EngineContext,
    dispatcher: &Dispatcher,
    packet: &[u8],
    source: SocketAddr,
) {
    match decode_inbound(packet) {
        None => debug!("RX: dropped {}-byte datagram from {source}", packet.len()),
        Some(Inbound::ConnectAck) => {
            if let Some(endpoint) = ctx.link.acknowledged() {
                info!("LINK: connected to {endpoint}");
                ctx.events.emit(&EngineEvent::Connected(endpoint));
            }
        }
        Some(Inbound::ConnectionReset) => {
            warn!(
                "LINK: server reset the connection, reconnecting in {:?}",
                ctx.config.reconnect_delay()
            );
            ctx.link.reset(Instant::now(), ctx.config.reconnect_delay());
            ctx.events.emit(&EngineEvent::ConnectionReset);
        }
        Some(Inbound::Command(cmd)) => {
            if let Some(reply) = dispatcher.handle(&cmd) {
                ctx.send_to(source, &reply);
            }
        }
    }
}

/// Resolve `host` and send it a connection probe.
fn reconnect<T: Transport>(ctx: &EngineContext, transport: &T, host: &str) {
    let name = server_host(host);
    let port = ctx.resolver.resolve_port(host);
    let Some(addr) = (name, port)
        .to_socket_addrs()
        .ok()
        .and_then(|mut addrs| addrs.next())
    else {
        warn!("LINK: cannot resolve {name}");
        ctx.events
            .emit(&EngineEvent::EndpointUnreachable(host.to_string()));
        return;
    };

    let probe = frame_outbound(ctx.identity.bytes(), &[CONNECTION, PROBE]);
    if let Err(e) = ctx.pipe.with_exclusive(|| transport.send_to(&probe, addr)) {
        warn!("LINK: probe to {addr} failed: {e}");
        ctx.events
            .emit(&EngineEvent::EndpointUnreachable(host.to_string()));
        return;
    }

    ctx.link
        .probe_sent(addr, Instant::now(), ctx.config.heartbeat_interval());
    info!("LINK: probe sent to {addr}");
    ctx.events.emit(&EngineEvent::ProbeSent(addr));
}

// ── Pipe worker ──────────────────────────────────────────────

/// Spawn the pipe worker that drains the outbound queue onto the socket.
pub fn spawn_pipe<T: Transport + 'static>(
    ctx: Arc<EngineContext>,
    transport: Arc<T>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("phoneiot-pipe".into())
        .spawn(move || {
            info!("PIPE: send worker started");
            while ctx.pipe.drain_with(|datagram| {
                if let Err(e) = transport.send_to(&datagram.bytes, datagram.dest) {
                    debug!("PIPE: send to {} failed: {e}", datagram.dest);
                }
            }) {}
            info!("PIPE: send worker stopped");
        })
}

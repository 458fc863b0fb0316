//! In-memory transport and recording adapters for integration tests.
//!
//! Tests inject datagrams "from the server" and wait for what the engine
//! sends back.  Every sent packet is recorded with its destination.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

use phoneiot::adapters::image_codec::JpegImageCodec;
use phoneiot::adapters::headless::HeadlessRenderer;
use phoneiot::adapters::resolver::StaticPortResolver;
use phoneiot::adapters::storage::SettingsStore;
use phoneiot::adapters::time::SystemClock;
use phoneiot::app::events::EngineEvent;
use phoneiot::app::ports::{EventSink, StoragePort};
use phoneiot::app::service::Collaborators;
use phoneiot::rpc::codec::{OUTBOUND_HEADER_SIZE, encode_command};
use phoneiot::rpc::transport::Transport;

pub const PW: u64 = 0x00C0_FFEE;
pub const SERVER_PORT: u16 = 1976;

/// How long a test waits for the engine before giving up.
pub const PATIENCE: Duration = Duration::from_secs(3);

pub fn server() -> SocketAddr {
    ([127, 0, 0, 1], SERVER_PORT).into()
}

// ── MockTransport ─────────────────────────────────────────────

#[derive(Default)]
pub struct MockTransport {
    inbound: Mutex<VecDeque<(Vec<u8>, SocketAddr)>>,
    arrived: Condvar,
    sent: Mutex<Vec<(Vec<u8>, SocketAddr)>>,
    sent_cv: Condvar,
}

#[allow(dead_code)]
impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Deliver a raw datagram to the engine.
    pub fn inject(&self, packet: Vec<u8>, from: SocketAddr) {
        self.inbound.lock().unwrap().push_back((packet, from));
        self.arrived.notify_all();
    }

    /// Deliver an authenticated command from the server.
    pub fn command(&self, opcode: u8, fields: &[u8]) {
        self.inject(encode_command(opcode, PW, fields), server());
    }

    /// Content (outbound header stripped) of every sent packet.
    pub fn sent(&self) -> Vec<(Vec<u8>, SocketAddr)> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|(p, to)| (p[OUTBOUND_HEADER_SIZE..].to_vec(), *to))
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&[u8]) -> bool) -> usize {
        self.sent().iter().filter(|(c, _)| pred(c)).count()
    }

    /// Wait until at least `n` sent packets satisfy `pred`; returns the
    /// latest match.
    pub fn wait_nth(
        &self,
        n: usize,
        pred: impl Fn(&[u8], SocketAddr) -> bool,
    ) -> Option<(Vec<u8>, SocketAddr)> {
        let deadline = Instant::now() + PATIENCE;
        let mut sent = self.sent.lock().unwrap();
        loop {
            let matches: Vec<_> = sent
                .iter()
                .map(|(p, to)| (p[OUTBOUND_HEADER_SIZE..].to_vec(), *to))
                .filter(|(c, to)| pred(c, *to))
                .collect();
            if matches.len() >= n {
                return matches.last().cloned();
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            sent = self.sent_cv.wait_timeout(sent, deadline - now).unwrap().0;
        }
    }

    pub fn wait_for(&self, pred: impl Fn(&[u8], SocketAddr) -> bool) -> Option<(Vec<u8>, SocketAddr)> {
        self.wait_nth(1, pred)
    }

    /// Wait for a reply to the server whose content is exactly `expected`.
    pub fn wait_reply(&self, expected: &[u8]) -> bool {
        self.wait_for(|c, to| c == expected && to == server()).is_some()
    }
}

impl Transport for MockTransport {
    type Error = io::Error;

    fn send_to(&self, buf: &[u8], dest: SocketAddr) -> io::Result<usize> {
        self.sent.lock().unwrap().push((buf.to_vec(), dest));
        self.sent_cv.notify_all();
        Ok(buf.len())
    }

    fn recv_from(&self, buf: &mut [u8]) -> io::Result<Option<(usize, SocketAddr)>> {
        let inbound = self.inbound.lock().unwrap();
        let (mut inbound, _) = self
            .arrived
            .wait_timeout_while(inbound, Duration::from_millis(20), |q| q.is_empty())
            .unwrap();
        let Some((packet, from)) = inbound.pop_front() else {
            return Ok(None);
        };
        let len = packet.len().min(buf.len());
        buf[..len].copy_from_slice(&packet[..len]);
        Ok(Some((len, from)))
    }
}

// ── Recording event sink ──────────────────────────────────────

#[derive(Default)]
pub struct RecordingEvents {
    events: Mutex<Vec<EngineEvent>>,
    changed: Condvar,
}

#[allow(dead_code)]
impl RecordingEvents {
    pub fn all(&self) -> Vec<EngineEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn wait_for(&self, pred: impl Fn(&EngineEvent) -> bool) -> bool {
        let deadline = Instant::now() + PATIENCE;
        let mut events = self.events.lock().unwrap();
        loop {
            if events.iter().any(&pred) {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            events = self.changed.wait_timeout(events, deadline - now).unwrap().0;
        }
    }
}

impl EventSink for RecordingEvents {
    fn emit(&self, event: &EngineEvent) {
        self.events.lock().unwrap().push(event.clone());
        self.changed.notify_all();
    }
}

// ── Wiring ────────────────────────────────────────────────────

/// Collaborators over a 720×1200 headless screen and the given storage.
pub fn collaborators(events: Arc<RecordingEvents>, storage: Box<dyn StoragePort>) -> Collaborators {
    Collaborators {
        render: Arc::new(HeadlessRenderer::new(720.0, 1200.0)),
        events,
        images: Arc::new(JpegImageCodec),
        resolver: Arc::new(StaticPortResolver(SERVER_PORT)),
        clock: Arc::new(SystemClock),
        storage,
        microphone: None,
    }
}

#[allow(dead_code)]
pub fn memory_storage() -> Box<dyn StoragePort> {
    Box::new(SettingsStore::in_memory())
}

/// Fields of an "add button" command at 10%,10% sized 20%×10%.
pub fn button_fields(id: &[u8], text: &str) -> Vec<u8> {
    let mut f = Vec::new();
    for v in [10.0f32, 10.0, 20.0, 10.0] {
        f.extend_from_slice(&v.to_be_bytes());
    }
    f.extend_from_slice(&0xFF33_66CCu32.to_be_bytes());
    f.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
    f.extend_from_slice(&1.0f32.to_be_bytes());
    f.extend_from_slice(&[0, 0, id.len() as u8]);
    f.extend_from_slice(id);
    f.extend_from_slice(text.as_bytes());
    f
}

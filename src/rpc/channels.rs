//! Inter-worker synchronisation: the outbound pipe and the run gate.
//!
//! ```text
//! ┌──────────────┐                ┌──────────────┐
//! │  Receiver    │──┐             │              │
//! ├──────────────┤  │  Datagram   │  Pipe worker │──▶ socket
//! │  Broadcaster │──┼───▶ Pipe ──▶│  (drains)    │
//! ├──────────────┤  │             │              │
//! │  UI thread   │──┘             └──────────────┘
//! └──────────────┘
//! ```
//!
//! Both types are a mutex plus condvar.  `close()` wakes every waiter and
//! makes all later waits return immediately, which is how workers stop.

use std::net::SocketAddr;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// One framed packet waiting to be sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    pub dest: SocketAddr,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct PipeState {
    queue: Vec<Datagram>,
    closed: bool,
}

/// Outbound queue drained as a whole each time the pipe worker wakes.
#[derive(Default)]
pub struct Pipe {
    state: Mutex<PipeState>,
    ready: Condvar,
}

impl Pipe {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, PipeState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queue a datagram.  Dropped once the pipe is closed.
    pub fn push(&self, datagram: Datagram) {
        let mut state = self.lock();
        if state.closed {
            return;
        }
        state.queue.push(datagram);
        drop(state);
        self.ready.notify_one();
    }

    /// Block until something is queued, then pass every queued datagram to
    /// `send` in FIFO order with the queue lock held.  Returns `false` once
    /// the pipe is closed.
    pub fn drain_with(&self, mut send: impl FnMut(&Datagram)) -> bool {
        let mut state = self.lock();
        while state.queue.is_empty() && !state.closed {
            state = self
                .ready
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        if state.closed {
            return false;
        }
        for datagram in &state.queue {
            send(datagram);
        }
        state.queue.clear();
        true
    }

    /// Run `f` while holding the queue lock, so nothing the pipe worker
    /// sends can interleave with it.
    pub fn with_exclusive<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock();
        f()
    }

    pub fn pending(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.queue.clear();
        drop(state);
        self.ready.notify_all();
    }
}

#[derive(Default)]
struct GateState {
    running: bool,
    closed: bool,
}

/// "Sensors running" flag.  Workers park on it while the app is
/// backgrounded.
#[derive(Default)]
pub struct RunGate {
    state: Mutex<GateState>,
    changed: Condvar,
}

impl RunGate {
    /// A new gate starts stopped.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_running(&self, running: bool) {
        self.lock().running = running;
        self.changed.notify_all();
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Block until running.  Returns `false` if the gate is closed.
    pub fn wait_running(&self) -> bool {
        let mut state = self.lock();
        while !state.running && !state.closed {
            state = self
                .changed
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
        !state.closed
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    fn datagram(tag: u8) -> Datagram {
        Datagram {
            dest: ([127, 0, 0, 1], 1976).into(),
            bytes: vec![tag],
        }
    }

    #[test]
    fn drain_is_fifo_and_empties_queue() {
        let pipe = Pipe::new();
        pipe.push(datagram(1));
        pipe.push(datagram(2));
        let mut seen = Vec::new();
        assert!(pipe.drain_with(|d| seen.push(d.bytes[0])));
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(pipe.pending(), 0);
    }

    #[test]
    fn close_wakes_blocked_drain() {
        let pipe = Arc::new(Pipe::new());
        let worker = {
            let pipe = pipe.clone();
            thread::spawn(move || pipe.drain_with(|_| {}))
        };
        thread::sleep(Duration::from_millis(20));
        pipe.close();
        assert!(!worker.join().unwrap());
        pipe.push(datagram(3));
        assert_eq!(pipe.pending(), 0);
    }

    #[test]
    fn gate_blocks_until_running() {
        let gate = Arc::new(RunGate::new());
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait_running())
        };
        thread::sleep(Duration::from_millis(20));
        gate.set_running(true);
        assert!(waiter.join().unwrap());
    }

    #[test]
    fn closed_gate_releases_waiters() {
        let gate = Arc::new(RunGate::new());
        let waiter = {
            let gate = gate.clone();
            thread::spawn(move || gate.wait_running())
        };
        gate.close();
        assert!(!waiter.join().unwrap());
        assert!(gate.is_closed());
    }
}

//! Sensor broadcast scheduler.
//!
//! The server asks for sensor updates by sending one period per feature it
//! is interested in.  Only the fastest matters: a full snapshot carries every
//! sensor.  [`UpdateThrottle`] keeps that period and the next deadline; the
//! broadcast worker sleeps on it and wakes early when a faster period
//! arrives.
//!
//! ```text
//!  'p' [500, 2000, 500] ──▶ UpdateThrottle { period: 500ms, next } ──notify──┐
//!                                                                           ▼
//!                  ┌──────────── broadcast worker ────────────────────────────┐
//!                  │ wait_due() ─▶ gate.wait_running() ─▶ snapshot ─▶ pipe   │
//!                  └──────────────────────────────────────────────────────────┘
//! ```
//!
//! When a new period replaces the old one, the pending deadline is shifted by
//! the difference (`next - old + new`), so a slower period never brings the
//! next snapshot forward.  A throttle that was idle fires immediately.

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{debug, info};

use crate::app::context::EngineContext;
use crate::rpc::stream::encode_snapshot;

#[derive(Default)]
struct ThrottleState {
    /// `None` is an infinite period: never fire.
    period: Option<Duration>,
    next: Option<Instant>,
    closed: bool,
}

/// Shared `(period, next deadline)` pair.
#[derive(Default)]
pub struct UpdateThrottle {
    state: Mutex<ThrottleState>,
    changed: Condvar,
}

impl UpdateThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ThrottleState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn period(&self) -> Option<Duration> {
        self.lock().period
    }

    pub fn next_due(&self) -> Option<Instant> {
        self.lock().next
    }

    /// Apply a set of requested periods in milliseconds.  Non-positive
    /// entries are ignored; no positive entry stops the broadcast.
    pub fn set_periods(&self, periods: &[i32]) {
        self.set_periods_at(periods, Instant::now());
    }

    pub fn set_periods_at(&self, periods: &[i32], now: Instant) {
        let period = periods
            .iter()
            .copied()
            .filter(|&p| p > 0)
            .min()
            .map(|p| Duration::from_millis(p as u64));

        let mut state = self.lock();
        let next = period.map(|new| match (state.next, state.period) {
            (Some(next), Some(old)) => next.checked_sub(old).map_or(now, |start| start + new),
            _ => now,
        });
        state.next = next;
        state.period = period;
        debug!("STREAM: period {:?}", period);
        drop(state);
        self.changed.notify_all();
    }

    /// Block until the next snapshot is due, then schedule the following
    /// one.  Returns `false` once closed.
    pub fn wait_due(&self) -> bool {
        let mut state = self.lock();
        loop {
            if state.closed {
                return false;
            }
            let Some(next) = state.next else {
                state = self
                    .changed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
                continue;
            };
            let now = Instant::now();
            if now < next {
                state = self
                    .changed
                    .wait_timeout(state, next - now)
                    .unwrap_or_else(PoisonError::into_inner)
                    .0;
                continue;
            }
            state.next = state.period.map(|p| now + p);
            return true;
        }
    }

    pub fn close(&self) {
        self.lock().closed = true;
        self.changed.notify_all();
    }
}

/// Spawn the broadcast worker.
pub fn spawn_broadcaster(ctx: Arc<EngineContext>) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("phoneiot-stream".into())
        .spawn(move || {
            info!("STREAM: broadcaster started");
            let mut timestamp: i32 = 0;
            while ctx.throttle.wait_due() && ctx.gate.wait_running() {
                let readings = ctx.sensors.read_all();
                ctx.send_to_remote(&encode_snapshot(timestamp, &readings));
                timestamp = timestamp.wrapping_add(1);
            }
            info!("STREAM: broadcaster stopped");
        })
}

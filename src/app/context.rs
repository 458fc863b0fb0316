//! Shared engine state.
//!
//! One [`EngineContext`] is built at start-up and shared by `Arc` between
//! the receive, pipe, broadcast and sampler workers and the UI-facing
//! [`Engine`](super::service::Engine).  Every field synchronizes itself, so
//! the context is read-only after construction.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use log::trace;

use super::ports::{Clock, EventSink, ImageCodec, PortResolver, RenderSink};
use crate::adapters::device_id::DeviceIdentity;
use crate::config::EngineConfig;
use crate::controls::interaction::PointerTracker;
use crate::controls::registry::Registry;
use crate::rpc::auth::SessionPassword;
use crate::rpc::channels::{Datagram, Pipe, RunGate};
use crate::rpc::codec::frame_outbound;
use crate::rpc::io_task::Link;
use crate::scheduler::UpdateThrottle;
use crate::sensors::SensorHub;

pub struct EngineContext {
    pub config: EngineConfig,
    pub identity: DeviceIdentity,
    pub password: SessionPassword,
    pub link: Link,
    /// Sensors running.  Workers park on it while paused.
    pub gate: Arc<RunGate>,
    pub pipe: Pipe,
    pub throttle: UpdateThrottle,
    pub registry: Registry,
    pub pointers: PointerTracker,
    pub sensors: SensorHub,

    pub render: Arc<dyn RenderSink>,
    pub events: Arc<dyn EventSink>,
    pub images: Arc<dyn ImageCodec>,
    pub resolver: Arc<dyn PortResolver>,
}

impl EngineContext {
    /// Fresh state: no endpoint, no controls, sensors stopped, no broadcast
    /// period.
    pub fn new(
        config: EngineConfig,
        identity: DeviceIdentity,
        clock: Arc<dyn Clock>,
        render: Arc<dyn RenderSink>,
        events: Arc<dyn EventSink>,
        images: Arc<dyn ImageCodec>,
        resolver: Arc<dyn PortResolver>,
    ) -> Self {
        let password = SessionPassword::new(
            clock,
            Duration::from_millis(config.password_validity_ms),
            config.initial_password,
        );
        Self {
            registry: Registry::new(config.max_controls, Arc::clone(&render)),
            identity,
            password,
            link: Link::new(),
            gate: Arc::new(RunGate::new()),
            pipe: Pipe::new(),
            throttle: UpdateThrottle::new(),
            pointers: PointerTracker::new(),
            sensors: SensorHub::new(),
            config,
            render,
            events,
            images,
            resolver,
        }
    }

    /// Queue `content` for `dest` behind the outbound header.
    pub fn send_to(&self, dest: SocketAddr, content: &[u8]) {
        trace!("PIPE: {} bytes to {dest}", content.len());
        self.pipe.push(Datagram {
            dest,
            bytes: frame_outbound(self.identity.bytes(), content),
        });
    }

    /// Queue `content` for the remote endpoint.  Dropped while there is none.
    pub fn send_to_remote(&self, content: &[u8]) {
        match self.link.endpoint() {
            Some(dest) => self.send_to(dest, content),
            None => trace!("PIPE: no endpoint, dropped {} bytes", content.len()),
        }
    }
}

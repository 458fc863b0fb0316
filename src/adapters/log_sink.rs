//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing engine events to the `log` facade.
//! A phone front end would implement the same trait to show toasts and the
//! connection status line.

use log::{info, warn};

use crate::app::events::EngineEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`EngineEvent`].
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&self, event: &EngineEvent) {
        match event {
            EngineEvent::DeviceIdReady(id) => info!("DEVICE | id={id}"),
            EngineEvent::PasswordChanged(pw) => info!("AUTH | password={pw:08x}"),
            EngineEvent::ProbeSent(addr) => info!("LINK | probing {addr}"),
            EngineEvent::Connected(addr) => info!("LINK | connected to {addr}"),
            EngineEvent::ConnectionReset => warn!("LINK | connection reset by server"),
            EngineEvent::EndpointUnreachable(host) => {
                warn!("LINK | failed to connect to {host}")
            }
            EngineEvent::SensorsRunning(true) => info!("SENSORS | running"),
            EngineEvent::SensorsRunning(false) => info!("SENSORS | paused"),
        }
    }
}

//! Outbound engine events.
//!
//! The [`Engine`](super::service::Engine) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them, such as logging them or refreshing the
//! connection status line.

use std::net::SocketAddr;

/// Structured events emitted by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// The device id is known (loaded or freshly generated).
    DeviceIdReady(String),

    /// A new session password is in effect.
    PasswordChanged(u64),

    /// A reconnect probe was sent to this server.
    ProbeSent(SocketAddr),

    /// The server acknowledged us.
    Connected(SocketAddr),

    /// The server reset the connection; a reconnect is scheduled.
    ConnectionReset,

    /// The server could not be resolved or probed.
    EndpointUnreachable(String),

    /// Sensors were stopped or restarted.
    SensorsRunning(bool),
}

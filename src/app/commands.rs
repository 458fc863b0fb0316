//! Inbound commands to the engine.
//!
//! These represent actions requested by the local user interface that the
//! [`Engine`](super::service::Engine) interprets and acts upon.

/// Commands that the UI can send into the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    /// Resolve and probe this server host; it becomes the remote endpoint.
    Connect(String),

    /// Ask the current server to drop and re-establish our session.
    ResetConnection,

    /// Replace the session password immediately.
    RegeneratePassword,

    /// Persist whether sensors keep running while the app is backgrounded.
    SetRunInBackground(bool),

    /// The app went to the background.
    Pause,

    /// The app returned to the foreground.
    Resume,
}

//! Port traits: the hexagonal boundary between the protocol engine and the
//! phone it runs on.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Engine (protocol core)
//! ```
//!
//! Rendering, settings persistence, image coding and the server port lookup
//! are collaborators outside the engine.  Each one is reached through a trait
//! here so the dispatcher and workers can be driven entirely from tests.
//!
//! All ports are shared between the receive, pipe and broadcast workers, so
//! every trait is `Send + Sync` and takes `&self` unless it mutates storage.

use crate::rpc::image::Image;

// ───────────────────────────────────────────────────────────────
// Render port (driven adapter: engine → screen)
// ───────────────────────────────────────────────────────────────

/// Size of the drawing surface in device pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Base text size in pixels; font sizes on the wire are multiples of it.
    pub fn base_font_size(&self) -> f32 {
        30.0 * (self.height / 1200.0)
    }
}

/// The engine tells the renderer when the control set changed.  The renderer
/// pulls the controls it needs from the registry on its own thread.
pub trait RenderSink: Send + Sync {
    /// Current viewport; geometry of new controls is resolved against it.
    fn viewport(&self) -> Viewport;

    /// A control was added, removed or changed state.
    fn request_redraw(&self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: engine → notices / logging)
// ───────────────────────────────────────────────────────────────

/// The engine emits structured [`EngineEvent`](super::events::EngineEvent)s
/// through this port.  Adapters decide where they go (log, toast, status bar).
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &super::events::EngineEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: engine ↔ settings)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for the device id and user preferences.
///
/// Keys are namespaced to prevent collisions between subsystems.
pub trait StoragePort: Send {
    /// Read a value.  Returns the number of bytes written to `buf`.
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Wall-clock source used for session password expiry.
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Image codec port
// ───────────────────────────────────────────────────────────────

/// Converts between wire blobs (standard image files) and decoded bitmaps.
pub trait ImageCodec: Send + Sync {
    fn decode(&self, blob: &[u8]) -> Result<Image, crate::error::ImageError>;
    fn encode(&self, image: &Image) -> Result<Vec<u8>, crate::error::ImageError>;
}

// ───────────────────────────────────────────────────────────────
// Port resolver
// ───────────────────────────────────────────────────────────────

/// Learns which UDP port a server host listens on.
///
/// Implementations never fail: any lookup problem yields the configured
/// default port.
pub trait PortResolver: Send + Sync {
    fn resolve_port(&self, host: &str) -> u16;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Stored value does not fit the caller's buffer.
    BufferTooSmall,
    /// Generic I/O error.
    IoError,
    /// The backing file could not be decoded.
    Corrupted,
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::BufferTooSmall => write!(f, "buffer too small"),
            Self::IoError => write!(f, "I/O error"),
            Self::Corrupted => write!(f, "storage corrupted"),
        }
    }
}

impl std::error::Error for StorageError {}

//! Unified error types for the PhoneIoT engine.
//!
//! A single `Error` enum that every subsystem can convert into, keeping
//! start-up and adapter error handling uniform.  Inbound packet problems are
//! not errors: malformed or unauthenticated datagrams are
//! dropped by the dispatcher without a reply.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level engine error
// ---------------------------------------------------------------------------

/// Every fallible engine operation funnels into this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// An outbound message could not be encoded.
    Codec(CodecError),
    /// The datagram socket failed.
    Transport(TransportError),
    /// The settings store failed.
    Storage(crate::app::ports::StorageError),
    /// An image blob could not be decoded or encoded.
    Image(ImageError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Codec(e) => write!(f, "codec: {e}"),
            Self::Transport(e) => write!(f, "transport: {e}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Image(e) => write!(f, "image: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Codec errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecError {
    /// A length-prefixed field exceeds the one-byte length cap.
    FieldTooLong,
    /// A control id is empty or longer than 255 bytes.
    InvalidId,
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FieldTooLong => write!(f, "length-prefixed field exceeds 255 bytes"),
            Self::InvalidId => write!(f, "invalid control id"),
        }
    }
}

impl std::error::Error for CodecError {}

impl From<CodecError> for Error {
    fn from(e: CodecError) -> Self {
        Self::Codec(e)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Binding the local UDP port failed.
    Bind(String),
    /// The server host name could not be resolved to a socket address.
    Resolve(String),
    /// A send on the socket failed.
    Send(String),
    /// A receive on the socket failed for a reason other than a timeout.
    Receive(String),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bind(e) => write!(f, "bind failed: {e}"),
            Self::Resolve(host) => write!(f, "cannot resolve {host}"),
            Self::Send(e) => write!(f, "send failed: {e}"),
            Self::Receive(e) => write!(f, "receive failed: {e}"),
        }
    }
}

impl std::error::Error for TransportError {}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e)
    }
}

// ---------------------------------------------------------------------------
// Image errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageError {
    /// The blob is not in a recognised image format.
    UnknownFormat,
    /// The blob claims a known format but fails to decode.
    Corrupt,
    /// Zero-sized, or larger than the decoder limits allow.
    BadDimensions,
    /// The encoder rejected the bitmap.
    Encode,
    /// Even a single pixel does not fit the reply.
    TooLarge,
}

impl fmt::Display for ImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownFormat => write!(f, "unknown image format"),
            Self::Corrupt => write!(f, "image data corrupt"),
            Self::BadDimensions => write!(f, "bad dimensions"),
            Self::Encode => write!(f, "encoding failed"),
            Self::TooLarge => write!(f, "image does not fit a datagram"),
        }
    }
}

impl std::error::Error for ImageError {}

impl From<ImageError> for Error {
    fn from(e: ImageError) -> Self {
        Self::Image(e)
    }
}

impl From<crate::app::ports::StorageError> for Error {
    fn from(e: crate::app::ports::StorageError) -> Self {
        Self::Storage(e)
    }
}

/// Convenience alias used throughout the engine.
pub type Result<T> = core::result::Result<T, Error>;

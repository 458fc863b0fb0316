//! Application core: engine wiring around the protocol.
//!
//! This module holds the shared [`context::EngineContext`] every worker is
//! built from, the [`service::Engine`] that owns the workers, and the
//! commands/events exchanged with the user interface.  All interaction with
//! the phone happens through **port traits** defined in [`ports`], keeping
//! this layer fully testable without a screen, camera or network.

pub mod commands;
pub mod context;
pub mod events;
pub mod ports;
pub mod service;

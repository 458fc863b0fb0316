//! Datagram protocol subsystem.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Protocol stack                        │
//! │                                                              │
//! │  ┌───────────┐   ┌──────────┐   ┌────────────────────────┐   │
//! │  │ Transport │──▶│  Codec   │──▶│ Dispatcher             │   │
//! │  │ (UDP)     │   │ + auth   │   │ → Registry · Sensors   │   │
//! │  └───────────┘   └──────────┘   └────────────────────────┘   │
//! │       ▲                                    │ replies         │
//! │       │              ┌─────────────────────┘                 │
//! │       │              ▼                                       │
//! │  ┌───────────┐   ┌──────────┐   ┌────────────────────────┐   │
//! │  │ Transport │◀──│   Pipe   │◀──│ Stream (snapshots)     │   │
//! │  │ (send)    │   │ (queue)  │   │ UI events, heartbeats  │   │
//! │  └───────────┘   └──────────┘   └────────────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`io_task`] runs the receive and pipe workers and tracks the link to
//! the server.

pub mod auth;
pub mod channels;
pub mod codec;
pub mod dispatcher;
pub mod image;
pub mod io_task;
pub mod messages;
pub mod opcode;
pub mod stream;
pub mod transport;

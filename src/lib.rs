//! PhoneIoT device engine library.
//!
//! Exposes the protocol engine, the control model and the host adapters for
//! the daemon binary and for integration testing.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod controls;
pub mod error;
pub mod rpc;
pub mod scheduler;
pub mod sensors;

//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that drives the engine end to end over
//! an in-memory transport.  Nothing here touches a real socket.

mod engine_tests;
mod mock_transport;
mod protocol_tests;

//! Integration test utilities
//!
//! Spawns a local WebSocket server with scripted routes so the socket
//! manager can be exercised against a real transport.

pub mod helpers;

pub use helpers::*;

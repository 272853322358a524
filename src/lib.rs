//! VR controller to desktop input bridge.
//!
//! Clients stream controller state over WebSocket; the bridge translates it
//! into keyboard and mouse actuation on the host and mirrors every raw
//! payload to all other connected clients.

pub mod actuate;
pub mod config;
pub mod engine;
pub mod focus;
pub mod relay;

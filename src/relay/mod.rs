//! WebSocket relay: listener, per-connection sessions and wire messages.
//!
//! Every connected client is a session. Sessions share one translation
//! engine and one focus flag; each additionally owns its own pointer filter
//! and scroll gates, so pointer smoothing never mixes streams from two
//! clients. Raw payloads are mirrored verbatim to all other sessions before
//! any local routing.

pub mod message;
pub mod server;
pub mod session;

pub use server::{run, SessionRegistry};
pub use session::Session;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("failed to bind websocket listener on {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
}

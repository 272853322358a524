//! WebSocket listener and session registry.
//!
//! The server accepts plain TCP connections, upgrades each to a WebSocket
//! and hands it to its own session task. The registry tracks the outbound
//! sender of every live session so any session can mirror its raw messages
//! to all peers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::actuate::Actuator;
use crate::config::BridgeConfig;
use crate::engine::SharedEngine;
use crate::relay::session::Session;
use crate::relay::RelayError;

/// Outbound handles of all live sessions, keyed by session id.
#[derive(Default)]
pub struct SessionRegistry {
    senders: Mutex<HashMap<u64, mpsc::UnboundedSender<String>>>,
}

impl SessionRegistry {
    pub fn insert(&self, id: u64, tx: mpsc::UnboundedSender<String>) {
        self.lock().insert(id, tx);
    }

    pub fn remove(&self, id: u64) {
        self.lock().remove(&id);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Queues `text` on every session except the sender. A peer whose queue
    /// is gone is evicted on the spot instead of poisoning later broadcasts.
    pub fn broadcast(&self, sender: u64, text: &str) {
        let mut senders = self.lock();
        let stale: Vec<u64> = senders
            .iter()
            .filter(|(id, _)| **id != sender)
            .filter(|(_, tx)| tx.send(text.to_string()).is_err())
            .map(|(id, _)| *id)
            .collect();

        for id in stale {
            warn!("evicting session {} with a closed outbound queue", id);
            senders.remove(&id);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<u64, mpsc::UnboundedSender<String>>> {
        match self.senders.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

/// Runs the accept loop until `cancel` fires. Each accepted connection gets
/// its own task; a failed handshake only costs that connection.
pub async fn run(
    config: &BridgeConfig,
    engine: SharedEngine,
    actuator: Arc<dyn Actuator>,
    focus: watch::Receiver<bool>,
    cancel: CancellationToken,
) -> Result<(), RelayError> {
    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| RelayError::Bind {
            addr: config.listen_addr.clone(),
            source: e,
        })?;
    info!("listening on ws://{}", config.listen_addr);

    let registry = Arc::new(SessionRegistry::default());
    let next_id = AtomicU64::new(1);
    let sensitivity = config.mouse_sensitivity;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("relay server shutting down");
                return Ok(());
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, peer)) => {
                        let id = next_id.fetch_add(1, Ordering::Relaxed);
                        tokio::spawn(handle_connection(
                            stream,
                            peer,
                            id,
                            engine.clone(),
                            actuator.clone(),
                            focus.clone(),
                            registry.clone(),
                            sensitivity,
                        ));
                    }
                    Err(e) => error!("failed to accept connection: {}", e),
                }
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    id: u64,
    engine: SharedEngine,
    actuator: Arc<dyn Actuator>,
    focus: watch::Receiver<bool>,
    registry: Arc<SessionRegistry>,
    sensitivity: f32,
) {
    let ws = match tokio_tungstenite::accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("websocket handshake from {} failed: {}", peer, e);
            return;
        }
    };

    let (tx, mut outbound) = mpsc::unbounded_channel();
    registry.insert(id, tx);
    info!(
        "session {} connected from {} ({} active)",
        id,
        peer,
        registry.len()
    );

    let mut session = Session::new(
        id,
        engine,
        actuator,
        focus,
        registry.clone(),
        sensitivity,
    );
    session.start();
    let (mut sink, mut messages) = ws.split();

    loop {
        tokio::select! {
            mirrored = outbound.recv() => {
                match mirrored {
                    Some(text) => {
                        if sink.send(Message::text(text)).await.is_err() {
                            warn!("session {} outbound send failed", id);
                            break;
                        }
                    }
                    // Evicted from the registry by a peer broadcast.
                    None => break,
                }
            }
            inbound = messages.next() => {
                match inbound {
                    Some(Ok(Message::Text(text))) => session.handle_text(text.as_str()).await,
                    Some(Ok(Message::Ping(payload))) => {
                        let _ = sink.send(Message::Pong(payload)).await;
                    }
                    Some(Ok(Message::Close(_))) | None => {
                        info!("session {} closed by peer", id);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!("session {} transport error: {}", id, e);
                        break;
                    }
                }
            }
        }
    }

    session.finish();
    info!("session {} ended ({} active)", id, registry.len());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn broadcast_skips_the_sender() {
        let registry = SessionRegistry::default();
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry.insert(1, tx_a);
        registry.insert(2, tx_b);

        registry.broadcast(1, "hello");

        assert!(rx_a.try_recv().is_err());
        assert_eq!(rx_b.try_recv().unwrap(), "hello");
    }

    #[test]
    fn broadcast_evicts_closed_peers() {
        let registry = SessionRegistry::default();
        let (tx_a, rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();
        registry.insert(1, tx_a);
        registry.insert(2, tx_b);
        drop(rx_a);

        registry.broadcast(2, "ping");
        assert_eq!(registry.len(), 1);

        // The healthy peer still receives later broadcasts.
        registry.broadcast(1, "pong");
        assert_eq!(rx_b.try_recv().unwrap(), "pong");
    }
}

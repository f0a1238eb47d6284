//! Connection registry for the relay server
//!
//! This module tracks every open WebSocket connection and the outbound queue
//! that feeds its writer task:
//! - Connection lifecycle (open, close) and capacity enforcement
//! - Opaque connection identifier generation
//! - Routing of addressed server events to the right queue
//!
//! Room membership lives in the room directory; the registry only knows who
//! is connected and how to reach them.

use log::{debug, info, warn};
use rand::distributions::Alphanumeric;
use rand::Rng;
use shared::{ConnectionId, ServerEvent};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::sync::mpsc;

const CONNECTION_ID_LEN: usize = 20;

/// Generates a random opaque identifier for a new connection.
pub fn new_connection_id() -> ConnectionId {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(CONNECTION_ID_LEN)
        .map(char::from)
        .collect()
}

/// Represents a connected client and the queue feeding its socket
#[derive(Debug)]
pub struct Client {
    /// Identifier assigned when the socket was accepted
    pub id: ConnectionId,
    /// Peer address, for logging
    pub addr: SocketAddr,
    pub connected_at: Instant,
    sender: mpsc::UnboundedSender<ServerEvent>,
}

impl Client {
    pub fn new(id: ConnectionId, addr: SocketAddr, sender: mpsc::UnboundedSender<ServerEvent>) -> Self {
        Self {
            id,
            addr,
            connected_at: Instant::now(),
            sender,
        }
    }

    /// Queues an event for the writer task. Returns false once the socket is gone.
    pub fn send(&self, event: ServerEvent) -> bool {
        self.sender.send(event).is_ok()
    }
}

/// Manages all open connections
///
/// The ClientManager enforces the server's connection cap and owns the
/// outbound queues. Dropping a client's entry drops its queue sender, which
/// ends the writer task and closes the socket.
pub struct ClientManager {
    clients: HashMap<ConnectionId, Client>,
    max_clients: usize,
}

impl ClientManager {
    /// Creates a new client manager with the specified capacity limit
    pub fn new(max_clients: usize) -> Self {
        Self {
            clients: HashMap::new(),
            max_clients,
        }
    }

    /// Registers a newly accepted connection
    ///
    /// Returns false if the server is at capacity; the caller is expected
    /// to drop the connection.
    pub fn add_client(
        &mut self,
        id: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<ServerEvent>,
    ) -> bool {
        if self.clients.len() >= self.max_clients {
            warn!("Rejecting {} from {}: server full", id, addr);
            return false;
        }

        info!("Client {} connected from {}", id, addr);
        self.clients.insert(id.clone(), Client::new(id, addr, sender));
        true
    }

    /// Removes a connection. Returns true if it was registered.
    pub fn remove_client(&mut self, id: &str) -> bool {
        if let Some(client) = self.clients.remove(id) {
            info!(
                "Client {} disconnected after {:.1}s",
                client.id,
                client.connected_at.elapsed().as_secs_f32()
            );
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.clients.contains_key(id)
    }

    /// Queues an event for one connection
    ///
    /// Delivery is best effort: unknown or closed connections are logged
    /// and skipped, never affecting other connections.
    pub fn send_to(&self, id: &str, event: ServerEvent) -> bool {
        match self.clients.get(id) {
            Some(client) => {
                let name = event.name();
                let sent = client.send(event);
                if !sent {
                    debug!("Dropping {} for closed connection {}", name, id);
                }
                sent
            }
            None => {
                warn!("No connection {} for {}", id, event.name());
                false
            }
        }
    }

    /// Returns the number of currently connected clients
    pub fn len(&self) -> usize {
        self.clients.len()
    }

    /// Returns true if no clients are currently connected
    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

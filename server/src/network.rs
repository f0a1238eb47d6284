//! Server network layer handling WebSocket connections and event dispatch

use crate::client_manager::{new_connection_id, ClientManager};
use crate::directory::{RoomDirectory, RoomStore};
use crate::relay::{Outbound, SessionRelay};
use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientEvent, ConnectionId, ServerEvent, Welcome};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Messages sent from connection tasks to the main server loop
#[derive(Debug)]
pub enum ServerMessage {
    ConnectionOpened {
        conn: ConnectionId,
        addr: SocketAddr,
        sender: mpsc::UnboundedSender<ServerEvent>,
    },
    EventReceived {
        conn: ConnectionId,
        event: ClientEvent,
    },
    ConnectionClosed {
        conn: ConnectionId,
    },
    Shutdown,
}

/// Relay server: one listener task, one reader and one writer task per
/// connection, and a single main loop that owns all room state.
pub struct Server<S: RoomStore = RoomDirectory> {
    listener: Option<TcpListener>,
    local_addr: SocketAddr,
    clients: ClientManager,
    relay: SessionRelay<S>,

    server_tx: mpsc::UnboundedSender<ServerMessage>,
    server_rx: mpsc::UnboundedReceiver<ServerMessage>,
}

impl Server<RoomDirectory> {
    pub async fn bind(addr: &str, max_clients: usize) -> std::io::Result<Self> {
        Self::with_store(addr, max_clients, RoomDirectory::new()).await
    }
}

impl<S: RoomStore> Server<S> {
    pub async fn with_store(addr: &str, max_clients: usize, store: S) -> std::io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        let local_addr = listener.local_addr()?;
        info!("Server listening on {}", local_addr);

        let (server_tx, server_rx) = mpsc::unbounded_channel();

        Ok(Server {
            listener: Some(listener),
            local_addr,
            clients: ClientManager::new(max_clients),
            relay: SessionRelay::new(store),
            server_tx,
            server_rx,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Sender that can stop the main loop with [`ServerMessage::Shutdown`].
    pub fn shutdown_handle(&self) -> mpsc::UnboundedSender<ServerMessage> {
        self.server_tx.clone()
    }

    /// Spawns task that accepts connections and hands each to its own task
    fn spawn_listener(&mut self) {
        let Some(listener) = self.listener.take() else {
            return;
        };
        let server_tx = self.server_tx.clone();

        tokio::spawn(async move {
            loop {
                match listener.accept().await {
                    Ok((stream, addr)) => {
                        tokio::spawn(handle_connection(stream, addr, server_tx.clone()));
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                        tokio::time::sleep(Duration::from_millis(10)).await;
                    }
                }
            }
        });
    }

    /// Processes one message from the connection tasks. Returns false on shutdown.
    fn handle_message(&mut self, message: ServerMessage) -> bool {
        match message {
            ServerMessage::ConnectionOpened { conn, addr, sender } => {
                if self.clients.add_client(conn.clone(), addr, sender.clone()) {
                    self.clients
                        .send_to(&conn, ServerEvent::Welcome(Welcome { id: conn.clone() }));
                } else {
                    let _ = sender.send(ServerEvent::RoomError("Server full".to_string()));
                }
            }
            ServerMessage::EventReceived { conn, event } => {
                if !self.clients.contains(&conn) {
                    warn!("Event from unregistered connection {}", conn);
                    return true;
                }
                let outbound = self.relay.handle_event(&conn, event);
                self.dispatch(outbound);
            }
            ServerMessage::ConnectionClosed { conn } => {
                if self.clients.remove_client(&conn) {
                    let outbound = self.relay.handle_disconnect(&conn);
                    self.dispatch(outbound);
                }
            }
            ServerMessage::Shutdown => {
                info!("Server shutting down");
                return false;
            }
        }
        true
    }

    fn dispatch(&self, outbound: Vec<Outbound>) {
        for Outbound { to, event } in outbound {
            self.clients.send_to(&to, event);
        }
    }

    /// Main server loop; every event is handled to completion before the next
    pub async fn run(mut self) -> std::io::Result<()> {
        self.spawn_listener();
        info!("Server started successfully");

        while let Some(message) = self.server_rx.recv().await {
            if !self.handle_message(message) {
                break;
            }
        }

        Ok(())
    }
}

/// Upgrades a TCP stream, registers it with the main loop and pumps frames
/// in both directions until either side closes.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    server_tx: mpsc::UnboundedSender<ServerMessage>,
) {
    let ws_stream = match accept_async(stream).await {
        Ok(ws) => ws,
        Err(e) => {
            warn!("WebSocket handshake with {} failed: {}", addr, e);
            return;
        }
    };

    let conn = new_connection_id();
    let (mut write, mut read) = ws_stream.split();
    let (sender, mut outbound_rx) = mpsc::unbounded_channel::<ServerEvent>();

    if server_tx
        .send(ServerMessage::ConnectionOpened {
            conn: conn.clone(),
            addr,
            sender,
        })
        .is_err()
    {
        return;
    }

    let writer_conn = conn.clone();
    tokio::spawn(async move {
        while let Some(event) = outbound_rx.recv().await {
            let text = match event.to_json() {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to encode {}: {}", event.name(), e);
                    continue;
                }
            };
            if let Err(e) = write.send(Message::text(text)).await {
                debug!("Send to {} failed: {}", writer_conn, e);
                break;
            }
        }
        let _ = write.close().await;
    });

    while let Some(frame) = read.next().await {
        match frame {
            Ok(Message::Text(text)) => match ClientEvent::from_json(text.as_str()) {
                Ok(event) => {
                    let message = ServerMessage::EventReceived {
                        conn: conn.clone(),
                        event,
                    };
                    if server_tx.send(message).is_err() {
                        break;
                    }
                }
                Err(e) => warn!("Malformed event from {}: {}", conn, e),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Read from {} failed: {}", conn, e);
                break;
            }
        }
    }

    let _ = server_tx.send(ServerMessage::ConnectionClosed { conn });
}

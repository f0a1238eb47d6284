//! WebSocket transport to the relay server.
//!
//! The render loop owns the main thread, so the socket lives on its own
//! thread with a current-thread tokio runtime. The two sides talk over
//! unbounded channels and the game polls for events once per frame.

use futures_util::{SinkExt, StreamExt};
use log::{debug, error, info, warn};
use shared::{ClientEvent, ServerEvent};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to start network thread: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("network thread has stopped")]
    Closed,
}

/// What the network thread reports back to the game.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Received(ServerEvent),
    ConnectFailed(String),
    Disconnected(String),
    /// Every reconnection attempt failed; the thread has exited.
    GaveUp,
}

/// Bounded reconnection schedule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Consecutive failed attempts tolerated after the first one.
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            delay: Duration::from_millis(1000),
        }
    }
}

pub struct Transport {
    outbound: mpsc::UnboundedSender<ClientEvent>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Transport {
    /// Starts the network thread and begins connecting to `url`.
    pub fn spawn(url: impl Into<String>, retry: RetryPolicy) -> Result<Self, TransportError> {
        let url = url.into();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        let (outbound, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("transport".to_string())
            .spawn(move || runtime.block_on(run_transport(url, retry, outbound_rx, inbound_tx)))?;

        Ok(Self { outbound, inbound })
    }

    pub fn send(&self, event: ClientEvent) -> Result<(), TransportError> {
        self.outbound.send(event).map_err(|_| TransportError::Closed)
    }

    /// Next pending event, without blocking.
    pub fn poll(&mut self) -> Option<TransportEvent> {
        self.inbound.try_recv().ok()
    }
}

enum SessionEnd {
    /// The game dropped its [`Transport`].
    Abandoned,
    Lost(String),
}

async fn run_transport(
    url: String,
    retry: RetryPolicy,
    mut outbound_rx: mpsc::UnboundedReceiver<ClientEvent>,
    inbound_tx: mpsc::UnboundedSender<TransportEvent>,
) {
    let mut failures = 0;

    loop {
        match connect_async(url.as_str()).await {
            Ok((ws_stream, _)) => {
                failures = 0;
                info!("Connected to {}", url);
                if inbound_tx.send(TransportEvent::Connected).is_err() {
                    return;
                }

                match pump(ws_stream, &mut outbound_rx, &inbound_tx).await {
                    SessionEnd::Abandoned => return,
                    SessionEnd::Lost(reason) => {
                        warn!("Disconnected from server: {}", reason);
                        if inbound_tx.send(TransportEvent::Disconnected(reason)).is_err() {
                            return;
                        }
                    }
                }
            }
            Err(e) => {
                failures += 1;
                warn!("Connection attempt {} to {} failed: {}", failures, url, e);
                if inbound_tx
                    .send(TransportEvent::ConnectFailed(e.to_string()))
                    .is_err()
                {
                    return;
                }
                if failures > retry.attempts {
                    error!("Giving up on {} after {} attempts", url, failures);
                    let _ = inbound_tx.send(TransportEvent::GaveUp);
                    return;
                }
            }
        }

        // Membership does not survive a reconnect, so stale requests are dropped.
        while outbound_rx.try_recv().is_ok() {}

        tokio::time::sleep(retry.delay).await;
        if inbound_tx.is_closed() {
            return;
        }
    }
}

async fn pump(
    ws_stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    outbound_rx: &mut mpsc::UnboundedReceiver<ClientEvent>,
    inbound_tx: &mpsc::UnboundedSender<TransportEvent>,
) -> SessionEnd {
    let (mut write, mut read) = ws_stream.split();

    loop {
        tokio::select! {
            outgoing = outbound_rx.recv() => match outgoing {
                Some(event) => match event.to_json() {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::text(text)).await {
                            return SessionEnd::Lost(e.to_string());
                        }
                    }
                    Err(e) => error!("Failed to encode {:?}: {}", event, e),
                },
                None => {
                    let _ = write.close().await;
                    return SessionEnd::Abandoned;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => match ServerEvent::from_json(text.as_str()) {
                    Ok(event) => {
                        debug!("Received {}", event.name());
                        if inbound_tx.send(TransportEvent::Received(event)).is_err() {
                            let _ = write.close().await;
                            return SessionEnd::Abandoned;
                        }
                    }
                    Err(e) => warn!("Malformed event from server: {}", e),
                },
                Some(Ok(Message::Close(_))) | None => {
                    return SessionEnd::Lost("server closed the connection".to_string());
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => return SessionEnd::Lost(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn unused_port() -> u16 {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    }

    #[test]
    fn test_default_retry_policy() {
        let retry = RetryPolicy::default();
        assert_eq!(retry.attempts, 5);
        assert_eq!(retry.delay, Duration::from_millis(1000));
    }

    #[test]
    fn test_gives_up_after_bounded_attempts() {
        let url = format!("ws://127.0.0.1:{}", unused_port());
        let retry = RetryPolicy {
            attempts: 2,
            delay: Duration::from_millis(10),
        };
        let mut transport = Transport::spawn(url, retry).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        let mut failures = 0;
        let mut gave_up = false;
        while Instant::now() < deadline && !gave_up {
            match transport.poll() {
                Some(TransportEvent::ConnectFailed(_)) => failures += 1,
                Some(TransportEvent::GaveUp) => gave_up = true,
                Some(other) => panic!("unexpected {:?}", other),
                None => std::thread::sleep(Duration::from_millis(5)),
            }
        }

        assert!(gave_up);
        assert_eq!(failures, 3);
    }

    #[test]
    fn test_send_after_thread_exit_fails() {
        let url = format!("ws://127.0.0.1:{}", unused_port());
        let retry = RetryPolicy {
            attempts: 0,
            delay: Duration::from_millis(1),
        };
        let mut transport = Transport::spawn(url, retry).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while Instant::now() < deadline {
            if let Some(TransportEvent::GaveUp) = transport.poll() {
                break;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        // The receiver is dropped once the thread returns.
        std::thread::sleep(Duration::from_millis(50));

        assert!(matches!(
            transport.send(ClientEvent::CreateRoom),
            Err(TransportError::Closed)
        ));
    }
}

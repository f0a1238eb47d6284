//! # Room Relay Server Library
//!
//! This library provides the session relay for the cooperative rope
//! platformer. The server groups connections into two-player rooms under
//! short shareable codes and forwards movement between the members of each
//! room. It does not simulate physics: every client is authoritative over
//! its own position and the server trusts what it reports.
//!
//! ## Core Responsibilities
//!
//! ### Room Directory
//! Owns the mapping from room codes to rooms. Rooms are created on request,
//! admit a second player on join, and are destroyed when their host leaves
//! or disconnects.
//!
//! ### Session Relay
//! Translates each inbound connection event into directory calls and
//! addresses the resulting notifications to the right audience:
//! - the sender only (`roomCreated`, `roomJoined`, `roomError`)
//! - every other room member (`playerJoined`, `playerMoved`)
//! - the remaining members after a departure (`playerDisconnected`, `roomClosed`)
//!
//! ## Architecture Design
//!
//! ### Single-Threaded Event Loop
//! Connection tasks only decode frames and forward them over a channel. One
//! main loop owns the directory and handles each event to completion before
//! the next, so room state needs no locking.
//!
//! ### WebSocket Transport
//! Events are JSON objects (`{"event": ..., "data": ...}`) carried in text
//! frames. Movement is fire-and-forget: no acknowledgement, sequencing or
//! buffering.
//!
//! ## Module Organization
//!
//! ### Directory Module (`directory`)
//! - `RoomStore` trait the relay is generic over
//! - In-memory `RoomDirectory` with code generation and spawn slots
//!
//! ### Relay Module (`relay`)
//! - Pure event handlers returning addressed `Outbound` messages
//!
//! ### Client Manager Module (`client_manager`)
//! - Connection registry, capacity limit and outbound queues
//!
//! ### Network Module (`network`)
//! - Listener, per-connection reader/writer tasks and the main loop
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use server::network::Server;
//!
//! #[tokio::main]
//! async fn main() -> std::io::Result<()> {
//!     // Bind to the address with room for 256 simultaneous connections
//!     let server = Server::bind("127.0.0.1:3000", 256).await?;
//!     server.run().await
//! }
//! ```

pub mod client_manager;
pub mod directory;
pub mod network;
pub mod relay;

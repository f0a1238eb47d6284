//! # Game Client Library
//!
//! This library provides the client side of the cooperative rope
//! platformer. Each client simulates its own player locally, reports the
//! result to the relay server every frame, and draws its partner wherever
//! the partner last said they were. A rope of fixed maximum length keeps the
//! two players together.
//!
//! ## Architecture Overview
//!
//! ### Local Authority
//! The client never waits for the server before moving its own player.
//! Gravity, jumping and collision all run locally at the display rate, and
//! the resulting position is sent as a fire-and-forget `playerMove`.
//!
//! ### Last-Write-Wins Reconciliation
//! Incoming `playerMoved` events overwrite the partner's position outright.
//! There is no interpolation, sequencing or replay: the newest report wins.
//!
//! ### Symmetric Rope
//! After local physics, both endpoints are pulled toward each other so they
//! are never further apart than the rope allows. The correction to the
//! partner is local only and gets overwritten by their next report.
//!
//! ## Module Organization
//!
//! ### World Module (`world`)
//! - Platforms, bobbing platforms and rocks
//! - Bounding volumes refreshed in place every tick
//!
//! ### Physics Module (`physics`)
//! - Per-tick movement, jump and gravity
//! - Platform snapping, rock push-out, landing probe and ground clamp
//!
//! ### Rope Module (`rope`)
//! - Distance constraint and the drawn curve
//!
//! ### Camera Module (`camera`)
//! - Mouse-driven orbit camera and the movement basis it defines
//!
//! ### Session Module (`session`)
//! - Connection and room state, partner tracking, status line
//!
//! ### Network Module (`network`)
//! - WebSocket transport on a background thread with bounded reconnects
//!
//! ### Input and Rendering Modules (`input`, `rendering`)
//! - Keyboard and mouse sampling, and the macroquad presentation layer
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use client::camera::CameraRig;
//! use client::game::Game;
//! use client::network::{RetryPolicy, Transport};
//! use client::physics::{MoveInput, PhysicsConfig};
//! use client::world::World;
//! use std::time::Instant;
//!
//! let url = "ws://127.0.0.1:3000";
//! let mut transport = Transport::spawn(url, RetryPolicy::default()).unwrap();
//! let mut game = Game::new(PhysicsConfig::default(), World::generate(42), CameraRig::default(), url);
//!
//! // One frame
//! while let Some(event) = transport.poll() {
//!     game.handle_transport(event);
//! }
//! if let Some(report) = game.tick(&MoveInput::default(), (0.0, 0.0), 0.0, Instant::now()) {
//!     transport.send(report).unwrap();
//! }
//! ```

pub mod camera;
pub mod game;
pub mod input;
pub mod network;
pub mod physics;
pub mod rendering;
pub mod rope;
pub mod session;
pub mod world;

//! Event messages exchanged over the persistent client-server connection.
//!
//! Every frame is a JSON object `{"event": <name>, "data": <payload>}`.
//! Payload-less events omit `data`.

use crate::math::Vec3;
use serde::{Deserialize, Serialize};

/// Opaque identifier the server assigns to each connection.
pub type ConnectionId = String;

/// Server-side player record, also the wire shape of player announcements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: ConnectionId,
    pub position: Vec3,
    pub rotation: Vec3,
    pub color: u32,
}

impl Player {
    pub fn new(id: ConnectionId, position: Vec3, color: u32) -> Self {
        Self {
            id,
            position,
            rotation: Vec3::ZERO,
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerMove {
    pub room_code: String,
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Events sent by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    CreateRoom,
    JoinRoom(String),
    PlayerMove(PlayerMove),
    LeaveRoom(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Welcome {
    pub id: ConnectionId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomCreated {
    // Missing codes decode as empty so the client can report malformed data.
    #[serde(default)]
    pub room_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomJoined {
    pub room_code: String,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerMoved {
    pub id: ConnectionId,
    pub position: Vec3,
    pub rotation: Vec3,
}

/// Events sent by the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Welcome(Welcome),
    RoomCreated(RoomCreated),
    RoomJoined(RoomJoined),
    PlayerJoined(Player),
    PlayerMoved(PlayerMoved),
    PlayerDisconnected(ConnectionId),
    RoomClosed,
    RoomError(String),
}

impl ClientEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

impl ServerEvent {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Wire name of the event, used for logging.
    pub fn name(&self) -> &'static str {
        match self {
            ServerEvent::Welcome(_) => "welcome",
            ServerEvent::RoomCreated(_) => "roomCreated",
            ServerEvent::RoomJoined(_) => "roomJoined",
            ServerEvent::PlayerJoined(_) => "playerJoined",
            ServerEvent::PlayerMoved(_) => "playerMoved",
            ServerEvent::PlayerDisconnected(_) => "playerDisconnected",
            ServerEvent::RoomClosed => "roomClosed",
            ServerEvent::RoomError(_) => "roomError",
        }
    }
}

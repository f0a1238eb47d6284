//! Client view of the room session
//!
//! This module reconciles server events with local state:
//! - Connection and room membership tracking
//! - The remote partner's authoritative-by-last-write position
//! - Room creation watchdog
//! - The status line shown to the player
//!
//! It never touches the network itself. Requests come back as
//! [`ClientEvent`]s for the caller to send.

use log::{debug, error, info, trace, warn};
use shared::{
    normalize_room_code, ClientEvent, ConnectionId, Player, PlayerMove, PlayerMoved, RoomCreated,
    RoomJoined, ServerEvent, Vec3, Welcome, HOST_COLOR,
};
use std::time::{Duration, Instant};
use thiserror::Error;

/// How long a create request may go unanswered.
pub const CREATE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    #[error("Not connected to server")]
    NotConnected,
    #[error("Room creation timed out. Please try again.")]
    CreationTimeout,
    #[error("Invalid room data received")]
    MalformedRoomData,
    #[error("Please enter a room code")]
    EmptyRoomCode,
    #[error("Already in room {0}")]
    AlreadyInRoom(String),
    #[error("{0}")]
    Room(String),
}

/// The other player in the room, as last reported by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePlayer {
    pub id: ConnectionId,
    pub position: Vec3,
    pub rotation: Vec3,
    pub color: u32,
}

impl From<Player> for RemotePlayer {
    fn from(player: Player) -> Self {
        Self {
            id: player.id,
            position: player.position,
            rotation: player.rotation,
            color: player.color,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Connection {
    Disconnected,
    Connected { id: ConnectionId },
}

pub struct Session {
    connection: Connection,
    room_code: Option<String>,
    remote: Option<RemotePlayer>,
    local_color: u32,
    create_deadline: Option<Instant>,
    status: String,
}

impl Session {
    pub fn new() -> Self {
        Self {
            connection: Connection::Disconnected,
            room_code: None,
            remote: None,
            local_color: HOST_COLOR,
            create_deadline: None,
            status: "Connecting to server...".to_string(),
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.connection, Connection::Connected { .. })
    }

    pub fn connection_id(&self) -> Option<&str> {
        match &self.connection {
            Connection::Connected { id } => Some(id),
            Connection::Disconnected => None,
        }
    }

    pub fn room_code(&self) -> Option<&str> {
        self.room_code.as_deref()
    }

    pub fn remote(&self) -> Option<&RemotePlayer> {
        self.remote.as_ref()
    }

    pub fn remote_mut(&mut self) -> Option<&mut RemotePlayer> {
        self.remote.as_mut()
    }

    /// Colour the server assigned to us in the current room. Rooms we
    /// create always give us the host slot.
    pub fn local_color(&self) -> u32 {
        self.local_color
    }

    pub fn is_creating(&self) -> bool {
        self.create_deadline.is_some()
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn set_status(&mut self, status: impl Into<String>) {
        self.status = status.into();
    }

    /// Builds a create request and arms the creation watchdog.
    pub fn request_create(&mut self, now: Instant) -> Result<ClientEvent, SessionError> {
        if !self.is_connected() {
            return Err(self.fail(SessionError::NotConnected));
        }
        if let Some(code) = &self.room_code {
            let err = SessionError::AlreadyInRoom(code.clone());
            return Err(self.fail(err));
        }

        self.create_deadline = Some(now + CREATE_TIMEOUT);
        self.status = "Creating room...".to_string();
        Ok(ClientEvent::CreateRoom)
    }

    pub fn request_join(&mut self, code: &str) -> Result<ClientEvent, SessionError> {
        if !self.is_connected() {
            return Err(self.fail(SessionError::NotConnected));
        }
        let code = normalize_room_code(code);
        if code.is_empty() {
            return Err(self.fail(SessionError::EmptyRoomCode));
        }
        if let Some(current) = &self.room_code {
            let err = SessionError::AlreadyInRoom(current.clone());
            return Err(self.fail(err));
        }

        self.status = "Joining room...".to_string();
        Ok(ClientEvent::JoinRoom(code))
    }

    /// Leaves the current room, forgetting the partner. Returns the request
    /// to send, if there was a room to leave.
    pub fn leave(&mut self) -> Option<ClientEvent> {
        self.remote = None;
        self.create_deadline = None;
        let code = self.room_code.take()?;
        info!("Leaving room {}", code);
        Some(ClientEvent::LeaveRoom(code))
    }

    /// Position report for this tick, when connected and in a room.
    pub fn outbound_move(&self, position: Vec3, rotation: Vec3) -> Option<ClientEvent> {
        if !self.is_connected() {
            return None;
        }
        let room_code = self.room_code.clone()?;
        Some(ClientEvent::PlayerMove(PlayerMove {
            room_code,
            position,
            rotation,
        }))
    }

    /// Fires the creation watchdog once its deadline has passed.
    pub fn check_timeout(&mut self, now: Instant) -> Result<(), SessionError> {
        match self.create_deadline {
            Some(deadline) if now >= deadline => {
                self.create_deadline = None;
                warn!("Room creation timed out");
                Err(self.fail(SessionError::CreationTimeout))
            }
            _ => Ok(()),
        }
    }

    /// The socket went away: membership does not survive a reconnect.
    pub fn on_transport_lost(&mut self) {
        self.connection = Connection::Disconnected;
        self.room_code = None;
        self.remote = None;
        self.create_deadline = None;
        self.status = "Disconnected from server".to_string();
    }

    /// Applies one server event to local state.
    pub fn apply(&mut self, event: ServerEvent) -> Result<(), SessionError> {
        match event {
            ServerEvent::Welcome(Welcome { id }) => {
                info!("Connected to server with ID: {}", id);
                self.connection = Connection::Connected { id };
                self.status = "Connected to server".to_string();
            }
            ServerEvent::RoomCreated(RoomCreated { room_code }) => {
                self.create_deadline = None;
                if room_code.is_empty() {
                    error!("Invalid room data received");
                    return Err(self.fail(SessionError::MalformedRoomData));
                }
                info!("Room created successfully with code: {}", room_code);
                self.room_code = Some(room_code);
                self.local_color = HOST_COLOR;
                self.status = "Room created! Share this code with others".to_string();
            }
            ServerEvent::RoomJoined(RoomJoined { room_code, players }) => {
                info!("Joined room: {}", room_code);
                self.create_deadline = None;
                self.room_code = Some(room_code);
                self.status = "Successfully joined room!".to_string();

                let own_id = self.connection_id().map(str::to_owned);
                for player in players {
                    if Some(player.id.as_str()) == own_id.as_deref() {
                        self.local_color = player.color;
                    } else {
                        self.remote = Some(player.into());
                    }
                }
            }
            ServerEvent::PlayerJoined(player) => {
                info!("Player joined: {}", player.id);
                self.status = "Another player joined!".to_string();
                self.remote = Some(player.into());
            }
            ServerEvent::PlayerMoved(PlayerMoved {
                id,
                position,
                rotation,
            }) => match self.remote.as_mut() {
                Some(remote) if remote.id == id => {
                    trace!("Player moved: {} {:?}", id, position);
                    remote.position = position;
                    remote.rotation = rotation;
                }
                _ => debug!("Ignoring move for unknown player {}", id),
            },
            ServerEvent::PlayerDisconnected(id) => {
                info!("Player disconnected: {}", id);
                self.status = "A player has left the room".to_string();
                if self.remote.as_ref().is_some_and(|r| r.id == id) {
                    self.remote = None;
                }
            }
            ServerEvent::RoomError(message) => {
                error!("Room error: {}", message);
                self.create_deadline = None;
                return Err(self.fail(SessionError::Room(message)));
            }
            ServerEvent::RoomClosed => {
                info!("Room closed");
                self.room_code = None;
                self.remote = None;
                self.status = "Room has been closed by the host".to_string();
            }
        }
        Ok(())
    }

    fn fail(&mut self, err: SessionError) -> SessionError {
        self.status = format!("Error: {}", err);
        err
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(id: &str) -> Session {
        let mut session = Session::new();
        session
            .apply(ServerEvent::Welcome(Welcome { id: id.to_string() }))
            .unwrap();
        session
    }

    fn player(id: &str, x: f32, color: u32) -> Player {
        Player::new(id.to_string(), Vec3::new(x, 1.0, 0.0), color)
    }

    fn joined(session: &mut Session) {
        session
            .apply(ServerEvent::RoomJoined(RoomJoined {
                room_code: "ABC123".to_string(),
                players: vec![player("host", 0.0, 0x00ff00), player("me", 3.0, 0xff0000)],
            }))
            .unwrap();
    }

    #[test]
    fn test_requests_require_connection() {
        let mut session = Session::new();
        assert_eq!(
            session.request_create(Instant::now()),
            Err(SessionError::NotConnected)
        );
        assert_eq!(
            session.request_join("ABC123"),
            Err(SessionError::NotConnected)
        );
        assert_eq!(session.status(), "Error: Not connected to server");
    }

    #[test]
    fn test_join_normalizes_and_rejects_empty() {
        let mut session = connected("me");
        assert_eq!(session.request_join("   "), Err(SessionError::EmptyRoomCode));
        assert_eq!(
            session.request_join(" abc123 "),
            Ok(ClientEvent::JoinRoom("ABC123".to_string()))
        );
    }

    #[test]
    fn test_room_created_sets_code() {
        let mut session = connected("me");
        session.request_create(Instant::now()).unwrap();
        assert!(session.is_creating());

        session
            .apply(ServerEvent::RoomCreated(RoomCreated {
                room_code: "XYZ789".to_string(),
            }))
            .unwrap();

        assert_eq!(session.room_code(), Some("XYZ789"));
        assert!(!session.is_creating());
        assert!(session.remote().is_none());
    }

    #[test]
    fn test_malformed_room_created_is_an_error() {
        let mut session = connected("me");
        session.request_create(Instant::now()).unwrap();

        let result = session.apply(ServerEvent::RoomCreated(RoomCreated {
            room_code: String::new(),
        }));

        assert_eq!(result, Err(SessionError::MalformedRoomData));
        assert_eq!(session.room_code(), None);
        assert_eq!(session.status(), "Error: Invalid room data received");
    }

    #[test]
    fn test_creation_watchdog() {
        let mut session = connected("me");
        let start = Instant::now();
        session.request_create(start).unwrap();

        assert_eq!(session.check_timeout(start + Duration::from_secs(1)), Ok(()));
        assert_eq!(
            session.check_timeout(start + CREATE_TIMEOUT),
            Err(SessionError::CreationTimeout)
        );
        // Fires once.
        assert_eq!(session.check_timeout(start + CREATE_TIMEOUT * 2), Ok(()));
    }

    #[test]
    fn test_room_error_disarms_watchdog() {
        let mut session = connected("me");
        let start = Instant::now();
        session.request_create(start).unwrap();

        let result = session.apply(ServerEvent::RoomError("Failed to create room".to_string()));

        assert_eq!(
            result,
            Err(SessionError::Room("Failed to create room".to_string()))
        );
        assert_eq!(session.status(), "Error: Failed to create room");
        assert_eq!(session.check_timeout(start + CREATE_TIMEOUT), Ok(()));
    }

    #[test]
    fn test_room_joined_creates_remote_excluding_self() {
        let mut session = connected("me");
        joined(&mut session);

        assert_eq!(session.room_code(), Some("ABC123"));
        let remote = session.remote().unwrap();
        assert_eq!(remote.id, "host");
        assert_eq!(remote.color, 0x00ff00);
        assert_eq!(remote.position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_local_color_follows_assigned_slot() {
        let mut session = connected("me");
        assert_eq!(session.local_color(), HOST_COLOR);

        joined(&mut session);

        assert_eq!(session.local_color(), 0xff0000);
        assert_ne!(session.local_color(), session.remote().unwrap().color);
    }

    #[test]
    fn test_player_joined_creates_remote() {
        let mut session = connected("host");
        session
            .apply(ServerEvent::RoomCreated(RoomCreated {
                room_code: "ABC123".to_string(),
            }))
            .unwrap();
        session
            .apply(ServerEvent::PlayerJoined(player("guest", 3.0, 0xff0000)))
            .unwrap();

        assert_eq!(session.remote().unwrap().id, "guest");
        assert_eq!(session.status(), "Another player joined!");
    }

    #[test]
    fn test_player_moved_is_last_write_wins() {
        let mut session = connected("me");
        joined(&mut session);

        for x in [1.0, 2.0, 5.0] {
            session
                .apply(ServerEvent::PlayerMoved(PlayerMoved {
                    id: "host".to_string(),
                    position: Vec3::new(x, 1.0, 1.0),
                    rotation: Vec3::new(0.0, 0.5, 0.0),
                }))
                .unwrap();
        }

        let remote = session.remote().unwrap();
        assert_eq!(remote.position, Vec3::new(5.0, 1.0, 1.0));
        assert_eq!(remote.rotation, Vec3::new(0.0, 0.5, 0.0));
    }

    #[test]
    fn test_player_moved_for_other_id_is_ignored() {
        let mut session = connected("me");
        joined(&mut session);

        session
            .apply(ServerEvent::PlayerMoved(PlayerMoved {
                id: "stranger".to_string(),
                position: Vec3::new(9.0, 9.0, 9.0),
                rotation: Vec3::ZERO,
            }))
            .unwrap();

        assert_eq!(session.remote().unwrap().position, Vec3::new(0.0, 1.0, 0.0));
    }

    #[test]
    fn test_player_disconnected_drops_remote() {
        let mut session = connected("me");
        joined(&mut session);

        session
            .apply(ServerEvent::PlayerDisconnected("host".to_string()))
            .unwrap();

        assert!(session.remote().is_none());
        assert_eq!(session.room_code(), Some("ABC123"));
        assert_eq!(session.status(), "A player has left the room");
    }

    #[test]
    fn test_room_closed_clears_membership() {
        let mut session = connected("me");
        joined(&mut session);

        session.apply(ServerEvent::RoomClosed).unwrap();

        assert_eq!(session.room_code(), None);
        assert!(session.remote().is_none());
        assert!(session.outbound_move(Vec3::ZERO, Vec3::ZERO).is_none());
    }

    #[test]
    fn test_transport_loss_clears_everything() {
        let mut session = connected("me");
        joined(&mut session);

        session.on_transport_lost();

        assert!(!session.is_connected());
        assert_eq!(session.room_code(), None);
        assert!(session.remote().is_none());
        assert_eq!(session.status(), "Disconnected from server");
    }

    #[test]
    fn test_outbound_move_only_in_room() {
        let mut session = connected("me");
        assert!(session.outbound_move(Vec3::ZERO, Vec3::ZERO).is_none());

        joined(&mut session);
        let event = session
            .outbound_move(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.0, 0.25, 0.0))
            .unwrap();
        assert_eq!(
            event,
            ClientEvent::PlayerMove(PlayerMove {
                room_code: "ABC123".to_string(),
                position: Vec3::new(1.0, 2.0, 3.0),
                rotation: Vec3::new(0.0, 0.25, 0.0),
            })
        );
    }

    #[test]
    fn test_leave_emits_once() {
        let mut session = connected("me");
        joined(&mut session);

        assert_eq!(
            session.leave(),
            Some(ClientEvent::LeaveRoom("ABC123".to_string()))
        );
        assert!(session.remote().is_none());
        assert_eq!(session.leave(), None);
    }

    #[test]
    fn test_cannot_create_while_in_room() {
        let mut session = connected("me");
        joined(&mut session);

        assert_eq!(
            session.request_create(Instant::now()),
            Err(SessionError::AlreadyInRoom("ABC123".to_string()))
        );
    }
}

//! Room directory: the owned mapping from room codes to live sessions.
//!
//! The directory is a plain value handed to the relay rather than ambient
//! state, so every operation can be exercised without a transport. All
//! mutation happens on the server's single event-handling task.

use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use shared::{
    generate_room_code, normalize_room_code, ConnectionId, Player, Vec3, MAX_PLAYERS_PER_ROOM,
    SPAWN_SLOTS,
};
use std::collections::HashMap;
use thiserror::Error;

/// Upper bound on code regeneration when a fresh code collides.
const MAX_CODE_ATTEMPTS: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room not found")]
    NotFound(String),
    #[error("Room is full")]
    Full(String),
    #[error("Already in room {0}")]
    AlreadyInRoom(String),
    #[error("Failed to create room")]
    CodeSpaceExhausted,
}

/// A session grouping up to two connections under a shared code.
#[derive(Debug, Clone)]
pub struct Room {
    pub code: String,
    pub host: ConnectionId,
    players: HashMap<ConnectionId, Player>,
}

impl Room {
    fn new(code: String, host: ConnectionId) -> Self {
        Self {
            code,
            host,
            players: HashMap::new(),
        }
    }

    /// Adds a player in the first free spawn slot.
    fn admit(&mut self, conn: &str) -> Result<Player, RoomError> {
        if self.is_full() {
            return Err(RoomError::Full(self.code.clone()));
        }
        let slot = SPAWN_SLOTS
            .iter()
            .find(|slot| !self.players.values().any(|p| p.color == slot.color))
            .ok_or_else(|| RoomError::Full(self.code.clone()))?;

        let player = Player::new(conn.to_string(), slot.position, slot.color);
        self.players.insert(conn.to_string(), player.clone());
        Ok(player)
    }

    pub fn contains(&self, conn: &str) -> bool {
        self.players.contains_key(conn)
    }

    pub fn player(&self, conn: &str) -> Option<&Player> {
        self.players.get(conn)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= MAX_PLAYERS_PER_ROOM
    }

    /// Snapshot of every player, host first.
    pub fn player_list(&self) -> Vec<Player> {
        let mut players: Vec<Player> = self.players.values().cloned().collect();
        players.sort_by_key(|p| (p.id != self.host, p.id.clone()));
        players
    }

    pub fn member_ids(&self) -> Vec<ConnectionId> {
        self.players.keys().cloned().collect()
    }

    pub fn members_except(&self, conn: &str) -> Vec<ConnectionId> {
        self.players
            .keys()
            .filter(|id| id.as_str() != conn)
            .cloned()
            .collect()
    }

    /// Overwrites a member's transform. Returns false for non-members.
    pub fn update_player(&mut self, conn: &str, position: Vec3, rotation: Vec3) -> bool {
        match self.players.get_mut(conn) {
            Some(player) => {
                player.position = position;
                player.rotation = rotation;
                true
            }
            None => false,
        }
    }
}

/// Room state returned from a successful create or join.
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub code: String,
    pub players: Vec<Player>,
    pub joined: Player,
}

/// Outcome of removing a member from a room.
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// The host left; the room no longer exists.
    RoomClosed {
        code: String,
        remaining: Vec<ConnectionId>,
    },
    PlayerLeft {
        code: String,
        remaining: Vec<ConnectionId>,
    },
}

/// Storage interface the session relay depends on.
pub trait RoomStore {
    /// Creates a room hosted by `host` and admits the host.
    fn create(&mut self, host: &str) -> Result<RoomSnapshot, RoomError>;

    /// Admits `conn` into the room with the (case-insensitive) `code`.
    fn join(&mut self, code: &str, conn: &str) -> Result<RoomSnapshot, RoomError>;

    /// Removes `conn` from the room. `None` when it was not a member.
    fn remove(&mut self, code: &str, conn: &str) -> Option<Removal>;

    fn get(&self, code: &str) -> Option<&Room>;

    fn get_mut(&mut self, code: &str) -> Option<&mut Room>;

    /// Code of the room `conn` currently belongs to.
    fn room_of(&self, conn: &str) -> Option<String>;
}

/// In-memory room directory.
///
/// Rooms live until their host leaves or disconnects; there is no expiry.
pub struct RoomDirectory {
    rooms: HashMap<String, Room>,
    memberships: HashMap<ConnectionId, String>,
    rng: StdRng,
}

impl RoomDirectory {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministic code generation for tests.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rooms: HashMap::new(),
            memberships: HashMap::new(),
            rng,
        }
    }

    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    fn fresh_code(&mut self) -> Result<String, RoomError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_room_code(&mut self.rng);
            if !self.rooms.contains_key(&code) {
                return Ok(code);
            }
        }
        Err(RoomError::CodeSpaceExhausted)
    }
}

impl Default for RoomDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl RoomStore for RoomDirectory {
    fn create(&mut self, host: &str) -> Result<RoomSnapshot, RoomError> {
        if let Some(existing) = self.memberships.get(host) {
            return Err(RoomError::AlreadyInRoom(existing.clone()));
        }

        let code = self.fresh_code()?;
        let mut room = Room::new(code.clone(), host.to_string());
        let joined = room.admit(host)?;
        let players = room.player_list();

        self.rooms.insert(code.clone(), room);
        self.memberships.insert(host.to_string(), code.clone());
        info!("Room {} created by {}", code, host);

        Ok(RoomSnapshot {
            code,
            players,
            joined,
        })
    }

    fn join(&mut self, code: &str, conn: &str) -> Result<RoomSnapshot, RoomError> {
        let code = normalize_room_code(code);
        if let Some(existing) = self.memberships.get(conn) {
            return Err(RoomError::AlreadyInRoom(existing.clone()));
        }

        let room = self
            .rooms
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let joined = room.admit(conn)?;
        let players = room.player_list();

        self.memberships.insert(conn.to_string(), code.clone());
        info!("Player {} joined room {} ({} players)", conn, code, players.len());

        Ok(RoomSnapshot {
            code,
            players,
            joined,
        })
    }

    fn remove(&mut self, code: &str, conn: &str) -> Option<Removal> {
        let code = normalize_room_code(code);
        let room = self.rooms.get_mut(&code)?;
        room.players.remove(conn)?;
        self.memberships.remove(conn);

        if room.host == conn {
            let remaining = room.member_ids();
            for member in &remaining {
                self.memberships.remove(member);
            }
            self.rooms.remove(&code);
            info!("Room {} closed", code);
            Some(Removal::RoomClosed { code, remaining })
        } else {
            let remaining = room.member_ids();
            info!("Player {} left room {}", conn, code);
            Some(Removal::PlayerLeft { code, remaining })
        }
    }

    fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(&normalize_room_code(code))
    }

    fn get_mut(&mut self, code: &str) -> Option<&mut Room> {
        self.rooms.get_mut(&normalize_room_code(code))
    }

    fn room_of(&self, conn: &str) -> Option<String> {
        self.memberships.get(conn).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::{is_valid_room_code, GUEST_COLOR, HOST_COLOR};

    #[test]
    fn test_create_room_admits_host() {
        let mut dir = RoomDirectory::with_seed(1);
        let snapshot = dir.create("host").unwrap();

        assert!(is_valid_room_code(&snapshot.code));
        assert_eq!(snapshot.players.len(), 1);
        assert_eq!(snapshot.joined.id, "host");
        assert_eq!(snapshot.joined.color, HOST_COLOR);
        assert_eq!(snapshot.joined.position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(dir.room_of("host"), Some(snapshot.code.clone()));
        assert_eq!(dir.get(&snapshot.code).unwrap().host, "host");
    }

    #[test]
    fn test_join_assigns_second_slot() {
        let mut dir = RoomDirectory::with_seed(2);
        let code = dir.create("host").unwrap().code;
        let snapshot = dir.join(&code.to_lowercase(), "guest").unwrap();

        assert_eq!(snapshot.code, code);
        assert_eq!(snapshot.players.len(), 2);
        assert_eq!(snapshot.players[0].id, "host");
        assert_eq!(snapshot.joined.color, GUEST_COLOR);
        assert_eq!(snapshot.joined.position, Vec3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn test_join_unknown_room() {
        let mut dir = RoomDirectory::with_seed(3);
        let result = dir.join("NOPE00", "guest");

        assert_eq!(result, Err(RoomError::NotFound("NOPE00".to_string())));
        assert!(dir.is_empty());
        assert_eq!(dir.room_of("guest"), None);
    }

    #[test]
    fn test_join_full_room_leaves_room_untouched() {
        let mut dir = RoomDirectory::with_seed(4);
        let code = dir.create("host").unwrap().code;
        assert!(!dir.get(&code).unwrap().is_full());
        dir.join(&code, "guest").unwrap();
        assert!(dir.get(&code).unwrap().is_full());

        let result = dir.join(&code, "third");
        assert_eq!(result, Err(RoomError::Full(code.clone())));
        assert_eq!(dir.get(&code).unwrap().len(), 2);
        assert_eq!(dir.room_of("third"), None);
    }

    #[test]
    fn test_connection_belongs_to_one_room() {
        let mut dir = RoomDirectory::with_seed(5);
        let first = dir.create("a").unwrap().code;
        let second = dir.create("b").unwrap().code;

        assert_eq!(dir.create("a"), Err(RoomError::AlreadyInRoom(first.clone())));
        assert_eq!(dir.join(&second, "a"), Err(RoomError::AlreadyInRoom(first)));
    }

    #[test]
    fn test_guest_leaving_keeps_room() {
        let mut dir = RoomDirectory::with_seed(6);
        let code = dir.create("host").unwrap().code;
        dir.join(&code, "guest").unwrap();

        let removal = dir.remove(&code, "guest");
        assert_eq!(
            removal,
            Some(Removal::PlayerLeft {
                code: code.clone(),
                remaining: vec!["host".to_string()],
            })
        );
        assert_eq!(dir.get(&code).unwrap().len(), 1);
        assert_eq!(dir.room_of("guest"), None);
    }

    #[test]
    fn test_rejoin_after_guest_leaves_reuses_slot() {
        let mut dir = RoomDirectory::with_seed(7);
        let code = dir.create("host").unwrap().code;
        dir.join(&code, "guest").unwrap();
        dir.remove(&code, "guest");

        let snapshot = dir.join(&code, "other").unwrap();
        assert_eq!(snapshot.joined.color, GUEST_COLOR);
    }

    #[test]
    fn test_host_leaving_closes_room() {
        let mut dir = RoomDirectory::with_seed(8);
        let code = dir.create("host").unwrap().code;
        dir.join(&code, "guest").unwrap();

        let removal = dir.remove(&code, "host");
        assert_eq!(
            removal,
            Some(Removal::RoomClosed {
                code: code.clone(),
                remaining: vec!["guest".to_string()],
            })
        );
        assert!(dir.get(&code).is_none());
        assert_eq!(dir.room_of("guest"), None);
        assert_eq!(dir.join(&code, "late"), Err(RoomError::NotFound(code)));
    }

    #[test]
    fn test_remove_non_member_is_noop() {
        let mut dir = RoomDirectory::with_seed(9);
        let code = dir.create("host").unwrap().code;

        assert_eq!(dir.remove(&code, "stranger"), None);
        assert_eq!(dir.remove("ZZZZZZ", "host"), None);
        assert_eq!(dir.get(&code).unwrap().len(), 1);
    }

    #[test]
    fn test_update_player_only_for_members() {
        let mut dir = RoomDirectory::with_seed(10);
        let code = dir.create("host").unwrap().code;
        let room = dir.get_mut(&code).unwrap();

        assert!(room.update_player("host", Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO));
        assert!(!room.update_player("stranger", Vec3::ZERO, Vec3::ZERO));
        assert_eq!(
            dir.get(&code).unwrap().player("host").unwrap().position,
            Vec3::new(1.0, 2.0, 3.0)
        );
    }

    #[test]
    fn test_codes_are_unique_across_rooms() {
        let mut dir = RoomDirectory::with_seed(11);
        let mut codes = std::collections::HashSet::new();
        for i in 0..200 {
            let code = dir.create(&format!("host-{}", i)).unwrap().code;
            assert!(codes.insert(code));
        }
        assert_eq!(dir.len(), 200);
    }
}

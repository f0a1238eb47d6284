pub mod math;
pub mod protocol;

pub use math::Vec3;
pub use protocol::{
    ClientEvent, ConnectionId, Player, PlayerMove, PlayerMoved, RoomCreated, RoomJoined,
    ServerEvent, Welcome,
};

use rand::Rng;

pub const ROOM_CODE_LEN: usize = 6;
pub const ROOM_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
pub const MAX_PLAYERS_PER_ROOM: usize = 2;

pub const HOST_COLOR: u32 = 0x00ff00;
pub const GUEST_COLOR: u32 = 0xff0000;

/// Where a player appears when admitted to a room, and how it is tinted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnSlot {
    pub position: Vec3,
    pub color: u32,
}

/// Slot 0 belongs to the host; joiners take the first free slot.
pub const SPAWN_SLOTS: [SpawnSlot; MAX_PLAYERS_PER_ROOM] = [
    SpawnSlot {
        position: Vec3::new(0.0, 1.0, 0.0),
        color: HOST_COLOR,
    },
    SpawnSlot {
        position: Vec3::new(3.0, 1.0, 0.0),
        color: GUEST_COLOR,
    },
];

pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ROOM_CODE_LEN)
        .map(|_| ROOM_CODE_ALPHABET[rng.gen_range(0..ROOM_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Room codes are case-insensitive on input.
pub fn normalize_room_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

pub fn is_valid_room_code(code: &str) -> bool {
    code.len() == ROOM_CODE_LEN && code.bytes().all(|b| ROOM_CODE_ALPHABET.contains(&b))
}

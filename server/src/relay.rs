//! Session relay: turns per-connection events into directory calls and
//! addresses the resulting notifications.
//!
//! The relay never touches sockets. Each handler returns the list of
//! [`Outbound`] messages to deliver, which keeps it testable with nothing but
//! a [`RoomStore`].

use crate::directory::{Removal, RoomStore};
use log::{debug, info, trace, warn};
use shared::{
    ClientEvent, ConnectionId, PlayerMove, PlayerMoved, RoomCreated, RoomJoined, ServerEvent,
};

/// A server event addressed to a single connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: ConnectionId,
    pub event: ServerEvent,
}

impl Outbound {
    pub fn new(to: impl Into<ConnectionId>, event: ServerEvent) -> Self {
        Self {
            to: to.into(),
            event,
        }
    }
}

pub struct SessionRelay<S: RoomStore> {
    store: S,
}

impl<S: RoomStore> SessionRelay<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Handles one inbound event from `conn` to completion.
    pub fn handle_event(&mut self, conn: &str, event: ClientEvent) -> Vec<Outbound> {
        match event {
            ClientEvent::CreateRoom => self.create_room(conn),
            ClientEvent::JoinRoom(code) => self.join_room(conn, &code),
            ClientEvent::PlayerMove(movement) => self.player_move(conn, movement),
            ClientEvent::LeaveRoom(code) => self.leave_room(conn, &code),
        }
    }

    /// Connection drops funnel into the same removal path as `leaveRoom`.
    pub fn handle_disconnect(&mut self, conn: &str) -> Vec<Outbound> {
        match self.store.room_of(conn) {
            Some(code) => self.leave_room(conn, &code),
            None => Vec::new(),
        }
    }

    fn create_room(&mut self, conn: &str) -> Vec<Outbound> {
        match self.store.create(conn) {
            Ok(snapshot) => vec![Outbound::new(
                conn,
                ServerEvent::RoomCreated(RoomCreated {
                    room_code: snapshot.code,
                }),
            )],
            Err(e) => {
                warn!("Create room failed for {}: {}", conn, e);
                vec![Outbound::new(conn, ServerEvent::RoomError(e.to_string()))]
            }
        }
    }

    fn join_room(&mut self, conn: &str, code: &str) -> Vec<Outbound> {
        let snapshot = match self.store.join(code, conn) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!("Join {} failed for {}: {}", code, conn, e);
                return vec![Outbound::new(conn, ServerEvent::RoomError(e.to_string()))];
            }
        };

        let mut outbound = vec![Outbound::new(
            conn,
            ServerEvent::RoomJoined(RoomJoined {
                room_code: snapshot.code.clone(),
                players: snapshot.players.clone(),
            }),
        )];

        for player in snapshot.players.iter().filter(|p| p.id != conn) {
            outbound.push(Outbound::new(
                player.id.clone(),
                ServerEvent::PlayerJoined(snapshot.joined.clone()),
            ));
        }

        outbound
    }

    fn player_move(&mut self, conn: &str, movement: PlayerMove) -> Vec<Outbound> {
        let Some(room) = self.store.get_mut(&movement.room_code) else {
            trace!("Move from {} for unknown room {}", conn, movement.room_code);
            return Vec::new();
        };

        if !room.update_player(conn, movement.position, movement.rotation) {
            trace!("Move from non-member {} in room {}", conn, room.code);
            return Vec::new();
        }

        trace!("Player {} moved in room {}: {:?}", conn, room.code, movement.position);

        let moved = ServerEvent::PlayerMoved(PlayerMoved {
            id: conn.to_string(),
            position: movement.position,
            rotation: movement.rotation,
        });

        room.members_except(conn)
            .into_iter()
            .map(|to| Outbound::new(to, moved.clone()))
            .collect()
    }

    fn leave_room(&mut self, conn: &str, code: &str) -> Vec<Outbound> {
        match self.store.remove(code, conn) {
            Some(Removal::RoomClosed { code, remaining }) => {
                info!("Host {} left, closing room {}", conn, code);
                remaining
                    .into_iter()
                    .map(|to| Outbound::new(to, ServerEvent::RoomClosed))
                    .collect()
            }
            Some(Removal::PlayerLeft { remaining, .. }) => remaining
                .into_iter()
                .map(|to| Outbound::new(to, ServerEvent::PlayerDisconnected(conn.to_string())))
                .collect(),
            None => Vec::new(),
        }
    }
}

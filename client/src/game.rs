//! Per-frame orchestration of the client.
//!
//! A tick runs in a fixed order: watchdog, camera look, world refresh,
//! local physics, rope constraint, camera follow, rope curve and finally the
//! outbound position report.

use crate::camera::CameraRig;
use crate::network::TransportEvent;
use crate::physics::{self, LocalPlayer, MoveInput, PhysicsConfig, Support};
use crate::rope::{apply_rope_constraint, RopeCurve};
use crate::session::{RemotePlayer, Session, SessionError};
use crate::world::World;
use log::{debug, info, warn};
use shared::{ClientEvent, ServerEvent, Vec3};
use std::time::Instant;

/// Where the local player appears when first connected.
pub const INITIAL_SPAWN: Vec3 = Vec3::new(0.0, 10.0, 0.0);
/// Where the local player is put back after returning to the menu.
pub const MENU_SPAWN: Vec3 = Vec3::new(0.0, 1.0, 0.0);

pub struct Game {
    config: PhysicsConfig,
    world: World,
    camera: CameraRig,
    session: Session,
    local: Option<LocalPlayer>,
    rope: RopeCurve,
    server_url: String,
    paused: bool,
}

impl Game {
    pub fn new(
        config: PhysicsConfig,
        world: World,
        camera: CameraRig,
        server_url: impl Into<String>,
    ) -> Self {
        Self {
            config,
            world,
            camera,
            session: Session::new(),
            local: None,
            rope: RopeCurve::new(),
            server_url: server_url.into(),
            paused: false,
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn local(&self) -> Option<&LocalPlayer> {
        self.local.as_ref()
    }

    pub fn remote(&self) -> Option<&RemotePlayer> {
        self.session.remote()
    }

    /// Rope polyline, present only while both players exist.
    pub fn rope_points(&self) -> Option<&[Vec3]> {
        match (&self.local, self.session.remote()) {
            (Some(_), Some(_)) => Some(self.rope.points()),
            _ => None,
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn handle_transport(&mut self, event: TransportEvent) {
        match event {
            TransportEvent::Connected => {
                debug!("Socket open, waiting for welcome");
            }
            TransportEvent::Received(event) => self.handle_server_event(event),
            TransportEvent::ConnectFailed(reason) => {
                debug!("Connection error: {}", reason);
                self.session.set_status(format!(
                    "Connection error. Please make sure the server is running on {}",
                    self.server_url
                ));
            }
            TransportEvent::Disconnected(reason) => {
                info!("Disconnected from server: {}", reason);
                self.session.on_transport_lost();
            }
            TransportEvent::GaveUp => {
                self.session.on_transport_lost();
                self.session
                    .set_status(format!("Unable to reach server at {}", self.server_url));
            }
        }
    }

    fn handle_server_event(&mut self, event: ServerEvent) {
        let welcomed = matches!(event, ServerEvent::Welcome(_));
        if let Err(e) = self.session.apply(event) {
            warn!("{}", e);
        }
        if welcomed && self.local.is_none() {
            self.local = Some(LocalPlayer::new(INITIAL_SPAWN, &self.config));
        }
    }

    pub fn request_create(&mut self, now: Instant) -> Result<ClientEvent, SessionError> {
        self.session.request_create(now)
    }

    pub fn request_join(&mut self, code: &str) -> Result<ClientEvent, SessionError> {
        self.session.request_join(code)
    }

    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    /// Resets the local player and leaves the room. Returns the leave
    /// request to send, if any.
    pub fn return_to_menu(&mut self) -> Option<ClientEvent> {
        self.paused = false;
        if let Some(local) = self.local.as_mut() {
            local.reset(MENU_SPAWN);
        }
        self.session.leave()
    }

    /// Advances one frame. `time` is seconds since start. Returns the
    /// position report to send, if any.
    pub fn tick(
        &mut self,
        input: &MoveInput,
        look: (f32, f32),
        time: f64,
        now: Instant,
    ) -> Option<ClientEvent> {
        if let Err(e) = self.session.check_timeout(now) {
            warn!("{}", e);
        }
        if self.paused {
            return None;
        }

        self.camera.look(look.0, look.1);
        self.world.refresh(time);

        let local = self.local.as_mut()?;
        let support = physics::step(local, input, &self.camera.basis(), &self.world, &self.config);
        if support == Support::Probe {
            debug!("Landing probe caught player at {:?}", local.position);
        }

        let remote = self.session.remote_mut();
        let remote_position = match remote {
            Some(remote) => {
                apply_rope_constraint(
                    &mut local.position,
                    &mut remote.position,
                    self.config.max_rope_length,
                );
                Some(remote.position)
            }
            None => None,
        };

        local.rotation = Vec3::new(0.0, self.camera.yaw, 0.0);
        self.camera.follow(local.position, remote_position);

        if let Some(remote_position) = remote_position {
            self.rope.update(local.position, remote_position);
        }

        self.session.outbound_move(local.position, local.rotation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::Platform;
    use assert_approx_eq::assert_approx_eq;
    use shared::{Player, RoomCreated, Welcome};

    fn test_game() -> Game {
        let world = World::new(
            vec![Platform::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(40.0, 1.0, 40.0))],
            Vec::new(),
        );
        Game::new(PhysicsConfig::default(), world, CameraRig::default(), "ws://test")
    }

    fn receive(game: &mut Game, event: ServerEvent) {
        game.handle_transport(TransportEvent::Received(event));
    }

    fn welcomed(id: &str) -> Game {
        let mut game = test_game();
        game.handle_transport(TransportEvent::Connected);
        receive(&mut game, ServerEvent::Welcome(Welcome { id: id.to_string() }));
        game
    }

    fn in_room_with_partner(partner_at: Vec3) -> Game {
        let mut game = welcomed("host");
        receive(
            &mut game,
            ServerEvent::RoomCreated(RoomCreated {
                room_code: "ABC123".to_string(),
            }),
        );
        receive(
            &mut game,
            ServerEvent::PlayerJoined(Player::new("guest".to_string(), partner_at, 0xff0000)),
        );
        game
    }

    #[test]
    fn test_local_player_created_once_on_welcome() {
        let mut game = test_game();
        assert!(game.local().is_none());

        receive(&mut game, ServerEvent::Welcome(Welcome { id: "a".to_string() }));
        assert_eq!(game.local().unwrap().position, INITIAL_SPAWN);

        game.tick(&MoveInput::default(), (0.0, 0.0), 0.0, Instant::now());
        let moved = game.local().unwrap().position;

        game.handle_transport(TransportEvent::Disconnected("gone".to_string()));
        receive(&mut game, ServerEvent::Welcome(Welcome { id: "b".to_string() }));
        assert_eq!(game.local().unwrap().position, moved);
    }

    #[test]
    fn test_tick_without_room_sends_nothing() {
        let mut game = welcomed("a");
        let out = game.tick(&MoveInput::default(), (0.0, 0.0), 0.0, Instant::now());
        assert!(out.is_none());
    }

    #[test]
    fn test_tick_in_room_reports_position_and_yaw() {
        let mut game = in_room_with_partner(Vec3::new(3.0, 3.0, 0.0));
        let out = game.tick(&MoveInput::default(), (100.0, 0.0), 0.0, Instant::now());

        match out {
            Some(ClientEvent::PlayerMove(movement)) => {
                assert_eq!(movement.room_code, "ABC123");
                assert_eq!(movement.position, game.local().unwrap().position);
                assert_approx_eq!(movement.rotation.y, -0.2);
            }
            other => panic!("expected playerMove, got {:?}", other),
        }
    }

    #[test]
    fn test_rope_limits_separation_each_tick() {
        let mut game = in_room_with_partner(Vec3::new(0.0, 3.0, 0.0));
        // Land the local player on the platform first.
        for _ in 0..60 {
            game.tick(&MoveInput::default(), (0.0, 0.0), 0.0, Instant::now());
        }

        receive(
            &mut game,
            ServerEvent::PlayerMoved(shared::PlayerMoved {
                id: "guest".to_string(),
                position: Vec3::new(15.0, 3.0, 0.0),
                rotation: Vec3::ZERO,
            }),
        );
        game.tick(&MoveInput::default(), (0.0, 0.0), 0.0, Instant::now());

        let local = game.local().unwrap().position;
        let remote = game.remote().unwrap().position;
        assert_approx_eq!(local.distance(&remote), 5.0, 1e-3);
        assert!(game.rope_points().is_some());
    }

    #[test]
    fn test_partner_leaving_removes_rope() {
        let mut game = in_room_with_partner(Vec3::new(2.0, 3.0, 0.0));
        game.tick(&MoveInput::default(), (0.0, 0.0), 0.0, Instant::now());
        assert!(game.rope_points().is_some());

        receive(&mut game, ServerEvent::PlayerDisconnected("guest".to_string()));

        assert!(game.remote().is_none());
        assert!(game.rope_points().is_none());
    }

    #[test]
    fn test_pause_freezes_simulation() {
        let mut game = in_room_with_partner(Vec3::new(2.0, 3.0, 0.0));
        game.toggle_pause();
        let before = game.local().unwrap().position;

        let out = game.tick(&MoveInput::default(), (50.0, 50.0), 0.0, Instant::now());

        assert!(out.is_none());
        assert_eq!(game.local().unwrap().position, before);
        assert_eq!(game.camera().yaw, 0.0);
    }

    #[test]
    fn test_return_to_menu_resets_and_leaves() {
        let mut game = in_room_with_partner(Vec3::new(2.0, 3.0, 0.0));
        game.toggle_pause();

        let out = game.return_to_menu();

        assert_eq!(out, Some(ClientEvent::LeaveRoom("ABC123".to_string())));
        assert!(!game.is_paused());
        assert_eq!(game.local().unwrap().position, MENU_SPAWN);
        assert!(game.remote().is_none());
        assert!(game.session().room_code().is_none());
    }

    #[test]
    fn test_connect_failure_sets_status() {
        let mut game = test_game();
        game.handle_transport(TransportEvent::ConnectFailed("refused".to_string()));
        assert_eq!(
            game.session().status(),
            "Connection error. Please make sure the server is running on ws://test"
        );
    }
}

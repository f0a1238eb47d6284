use crate::game::Game;
use macroquad::prelude::*;
use shared::Vec3 as WorldVec3;

const SKY: Color = Color::new(0.53, 0.81, 0.92, 1.0);
const GROUND: Color = Color::new(0.2, 0.55, 0.2, 1.0);
const PLATFORM: Color = Color::new(0.55, 0.45, 0.33, 1.0);
const ROCK: Color = Color::new(0.5, 0.5, 0.5, 1.0);
const ROPE: Color = Color::new(0.55, 0.27, 0.07, 1.0);
const STATUS: Color = Color::new(1.0, 0.92, 0.23, 1.0);
const GROUND_HALF_SIZE: f32 = 50.0;

/// Overlay state owned by the input layer.
#[derive(Debug, Clone, Default)]
pub struct Hud<'a> {
    pub code_entry: Option<&'a str>,
    pub pointer_locked: bool,
}

fn to_mq(v: WorldVec3) -> macroquad::math::Vec3 {
    vec3(v.x, v.y, v.z)
}

fn hex_color(hex: u32) -> Color {
    Color::from_rgba(
        ((hex >> 16) & 0xff) as u8,
        ((hex >> 8) & 0xff) as u8,
        (hex & 0xff) as u8,
        255,
    )
}

#[derive(Debug, Default)]
pub struct Renderer;

impl Renderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, game: &Game, hud: &Hud) {
        clear_background(SKY);

        let camera = game.camera();
        set_camera(&Camera3D {
            position: to_mq(camera.position()),
            target: to_mq(camera.position() + camera.forward()),
            up: vec3(0.0, 1.0, 0.0),
            ..Default::default()
        });

        self.draw_world(game);
        self.draw_players(game);

        if let Some(points) = game.rope_points() {
            for pair in points.windows(2) {
                draw_line_3d(to_mq(pair[0]), to_mq(pair[1]), ROPE);
            }
        }

        set_default_camera();
        self.draw_ui(game, hud);
    }

    fn draw_world(&self, game: &Game) {
        draw_plane(
            vec3(0.0, 0.0, 0.0),
            vec2(GROUND_HALF_SIZE, GROUND_HALF_SIZE),
            None,
            GROUND,
        );

        let world = game.world();
        for (platform, bounds) in world.platforms().iter().zip(world.platform_bounds()) {
            let size = to_mq(platform.half_extents * 2.0);
            draw_cube(to_mq(bounds.center()), size, None, PLATFORM);
            draw_cube_wires(to_mq(bounds.center()), size, DARKBROWN);
        }

        for rock in world.rocks() {
            draw_sphere(to_mq(rock.position), rock.radius, None, ROCK);
        }
    }

    fn draw_players(&self, game: &Game) {
        let config = game.config();
        let size = vec3(config.player_width, config.player_height, config.player_depth);

        if let Some(local) = game.local() {
            let color = hex_color(game.session().local_color());
            draw_cube(to_mq(local.position), size, None, color);
            draw_cube_wires(to_mq(local.position), size, BLACK);
        }

        if let Some(remote) = game.remote() {
            draw_cube(to_mq(remote.position), size, None, hex_color(remote.color));
            draw_cube_wires(to_mq(remote.position), size, BLACK);
        }
    }

    fn draw_ui(&self, game: &Game, hud: &Hud) {
        let session = game.session();

        draw_rectangle(10.0, 10.0, 420.0, 90.0, Color::new(0.0, 0.0, 0.0, 0.5));
        let connection = match session.connection_id() {
            Some(id) => format!("Connected as {}", id),
            None => "Offline".to_string(),
        };
        draw_text(&connection, 20.0, 32.0, 20.0, WHITE);

        if let Some(code) = session.room_code() {
            draw_text(&format!("Room Code: {}", code), 20.0, 56.0, 24.0, WHITE);
        } else {
            draw_text("C: create room   J: join room", 20.0, 56.0, 20.0, LIGHTGRAY);
        }
        draw_text(session.status(), 20.0, 84.0, 18.0, STATUS);

        if let Some(code) = hud.code_entry {
            let (x, y) = (screen_width() / 2.0 - 160.0, screen_height() / 2.0 - 40.0);
            draw_rectangle(x, y, 320.0, 80.0, Color::new(0.0, 0.0, 0.0, 0.7));
            draw_text("Enter room code", x + 20.0, y + 28.0, 22.0, WHITE);
            draw_text(&format!("{}_", code), x + 20.0, y + 62.0, 32.0, STATUS);
            return;
        }

        if game.is_paused() {
            let (x, y) = (screen_width() / 2.0 - 150.0, screen_height() / 2.0 - 70.0);
            draw_rectangle(x, y, 300.0, 140.0, Color::new(0.0, 0.0, 0.0, 0.8));
            draw_text("Game Paused", x + 70.0, y + 40.0, 30.0, WHITE);
            draw_text("Esc: resume game", x + 50.0, y + 80.0, 22.0, LIGHTGRAY);
            draw_text("L: return to menu", x + 50.0, y + 110.0, 22.0, LIGHTGRAY);
        } else if !hud.pointer_locked {
            let (x, y) = (screen_width() / 2.0 - 140.0, screen_height() / 2.0 - 60.0);
            draw_rectangle(x, y, 280.0, 120.0, Color::new(0.0, 0.0, 0.0, 0.5));
            draw_text("Click to play", x + 70.0, y + 30.0, 24.0, WHITE);
            draw_text("WASD to move", x + 70.0, y + 55.0, 20.0, WHITE);
            draw_text("SPACE to jump", x + 70.0, y + 80.0, 20.0, WHITE);
            draw_text("Mouse to look around", x + 40.0, y + 105.0, 20.0, WHITE);
        }
    }
}

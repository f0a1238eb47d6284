use clap::Parser;
use client::camera::{CameraRig, DEFAULT_SENSITIVITY};
use client::game::Game;
use client::input::InputManager;
use client::network::{RetryPolicy, Transport, TransportEvent};
use client::physics::PhysicsConfig;
use client::rendering::{Hud, Renderer};
use client::world::World;
use log::{error, info, warn};
use macroquad::prelude::{get_time, next_frame};
use macroquad::window::Conf;
use shared::ClientEvent;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Relay server URL
    #[arg(short = 's', long, default_value = "ws://127.0.0.1:3000")]
    server: String,

    /// Downward acceleration per tick
    #[arg(long, default_value = "0.05")]
    gravity: f32,

    /// Upward velocity applied on jump
    #[arg(long, default_value = "1.0")]
    jump_force: f32,

    /// Radians of camera rotation per pixel of mouse movement
    #[arg(long, default_value_t = DEFAULT_SENSITIVITY)]
    sensitivity: f32,

    /// Seed for world generation; both players should use the same one
    #[arg(long, default_value = "42")]
    seed: u64,

    /// Create a room as soon as the server welcomes us
    #[arg(long, conflicts_with = "join")]
    create: bool,

    /// Join this room as soon as the server welcomes us
    #[arg(long)]
    join: Option<String>,

    /// Reconnection attempts before giving up
    #[arg(long, default_value = "5")]
    reconnect_attempts: u32,

    /// Delay between reconnection attempts in milliseconds
    #[arg(long, default_value = "1000")]
    reconnect_delay_ms: u64,
}

fn window_conf() -> Conf {
    Conf {
        window_title: "Tethered".to_string(),
        window_width: 1280,
        window_height: 720,
        ..Default::default()
    }
}

fn send(transport: &Transport, event: ClientEvent) {
    if let Err(e) = transport.send(event) {
        warn!("Dropping outbound event: {}", e);
    }
}

#[macroquad::main(window_conf)]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    info!("Starting client...");
    info!("Connecting to: {}", args.server);
    info!("Controls: WASD to move, Space to jump, mouse to look, Esc to pause");

    let retry = RetryPolicy {
        attempts: args.reconnect_attempts,
        delay: Duration::from_millis(args.reconnect_delay_ms),
    };
    let mut transport = match Transport::spawn(args.server.clone(), retry) {
        Ok(transport) => transport,
        Err(e) => {
            error!("Failed to start networking: {}", e);
            return;
        }
    };

    let config = PhysicsConfig {
        gravity: args.gravity,
        jump_force: args.jump_force,
        ..PhysicsConfig::default()
    };
    let mut game = Game::new(
        config,
        World::generate(args.seed),
        CameraRig::new(args.sensitivity),
        args.server.clone(),
    );
    let mut input_manager = InputManager::new();
    let renderer = Renderer::new();

    let mut pending_create = args.create;
    let mut pending_join = args.join;

    loop {
        while let Some(event) = transport.poll() {
            let welcomed = matches!(event, TransportEvent::Received(shared::ServerEvent::Welcome(_)));
            game.handle_transport(event);

            if welcomed && pending_create {
                pending_create = false;
                if let Ok(request) = game.request_create(Instant::now()) {
                    send(&transport, request);
                }
            }
            if welcomed {
                if let Some(code) = pending_join.take() {
                    if let Ok(request) = game.request_join(&code) {
                        send(&transport, request);
                    }
                }
            }
        }

        let frame = input_manager.update(game.is_paused());

        if frame.toggle_pause {
            game.toggle_pause();
        }
        if frame.leave_room {
            if let Some(request) = game.return_to_menu() {
                send(&transport, request);
            }
        }
        if frame.create_room {
            if let Ok(request) = game.request_create(Instant::now()) {
                send(&transport, request);
            }
        }
        if let Some(code) = frame.join_room {
            if let Ok(request) = game.request_join(&code) {
                send(&transport, request);
            }
        }

        if let Some(report) = game.tick(&frame.movement, frame.look, get_time(), Instant::now()) {
            send(&transport, report);
        }

        let code_entry = input_manager.code_entry();
        let hud = Hud {
            code_entry: code_entry.is_active().then(|| code_entry.text()),
            pointer_locked: input_manager.pointer_locked(),
        };
        renderer.render(&game, &hud);

        next_frame().await;
    }
}

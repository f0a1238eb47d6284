//! Local player simulation: movement, jumping, gravity and collision.
//!
//! All quantities are per tick; the engine assumes a fixed display-driven
//! rate and does not scale by elapsed time.

use crate::world::{Aabb, World};
use shared::Vec3;

/// Tuning for the local simulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsConfig {
    pub gravity: f32,
    pub jump_force: f32,
    pub move_speed: f32,
    /// Horizontal push per held direction added at takeoff.
    pub jump_momentum: f32,
    pub player_width: f32,
    pub player_height: f32,
    pub player_depth: f32,
    /// Distance below the player center searched for a landing surface.
    pub landing_probe: f32,
    /// Corrections smaller than this are ignored.
    pub correction_epsilon: f32,
    pub max_rope_length: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: 0.05,
            jump_force: 1.0,
            move_speed: 0.15,
            jump_momentum: 0.2,
            player_width: 1.0,
            player_height: 1.0,
            player_depth: 0.6,
            landing_probe: 2.0,
            correction_epsilon: 0.01,
            max_rope_length: 5.0,
        }
    }
}

impl PhysicsConfig {
    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(
            self.player_width / 2.0,
            self.player_height / 2.0,
            self.player_depth / 2.0,
        )
    }

    /// Height of the player center when standing on the ground plane.
    pub fn ground_rest(&self) -> f32 {
        self.player_height / 2.0
    }
}

/// Movement intent sampled for one tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MoveInput {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    /// Set only on the tick the jump key went down.
    pub jump: bool,
}

/// Horizontal movement frame derived from the camera.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Basis {
    pub forward: Vec3,
    pub right: Vec3,
}

impl Basis {
    /// Flattens a view direction onto the ground plane.
    pub fn from_view(view: Vec3) -> Self {
        let forward = view.flatten();
        Self {
            forward,
            right: forward.cross(&Vec3::UP).normalize(),
        }
    }
}

impl Default for Basis {
    fn default() -> Self {
        Self::from_view(Vec3::new(0.0, 0.0, -1.0))
    }
}

/// What held the player up at the end of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Support {
    Airborne,
    Platform,
    Rock,
    Probe,
    Ground,
}

impl Support {
    pub fn is_grounded(self) -> bool {
        self != Support::Airborne
    }
}

#[derive(Debug, Clone)]
pub struct LocalPlayer {
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Vec3,
    pub jumping: bool,
    half_extents: Vec3,
    bounds: Aabb,
}

impl LocalPlayer {
    pub fn new(position: Vec3, config: &PhysicsConfig) -> Self {
        let half_extents = config.half_extents();
        Self {
            position,
            velocity: Vec3::ZERO,
            rotation: Vec3::ZERO,
            jumping: false,
            half_extents,
            bounds: Aabb::from_center(position, half_extents),
        }
    }

    /// Puts the player back at `position` at rest.
    pub fn reset(&mut self, position: Vec3) {
        self.position = position;
        self.velocity = Vec3::ZERO;
        self.jumping = false;
        self.refresh_bounds();
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    fn refresh_bounds(&mut self) {
        self.bounds.set_center(self.position, self.half_extents);
    }

    fn land_on(&mut self, top: f32) {
        self.position.y = top + self.half_extents.y;
        self.velocity.y = 0.0;
        self.jumping = false;
        self.refresh_bounds();
    }
}

/// Advances the player by one tick against `world`.
pub fn step(
    player: &mut LocalPlayer,
    input: &MoveInput,
    basis: &Basis,
    world: &World,
    config: &PhysicsConfig,
) -> Support {
    player.velocity.x = 0.0;
    player.velocity.z = 0.0;

    let mut horizontal = Vec3::ZERO;
    if input.forward {
        horizontal += basis.forward;
    }
    if input.back {
        horizontal -= basis.forward;
    }
    if input.right {
        horizontal += basis.right;
    }
    if input.left {
        horizontal -= basis.right;
    }
    player.velocity += horizontal * config.move_speed;

    if input.jump && !player.jumping {
        player.velocity.y = config.jump_force;
        player.velocity += jump_momentum(input, basis, config);
        player.jumping = true;
    }

    player.velocity.y -= config.gravity;
    player.position += player.velocity;
    player.refresh_bounds();

    let mut support = resolve_platforms(player, world);
    if resolve_rocks(player, world, config) {
        support = Support::Rock;
    }

    if support == Support::Airborne && player.velocity.y < 0.0 && probe_landing(player, world, config) {
        support = Support::Probe;
    }

    if support == Support::Airborne && player.position.y <= config.ground_rest() {
        player.land_on(0.0);
        support = Support::Ground;
    }

    if support == Support::Airborne {
        player.jumping = true;
    }

    support
}

/// Extra takeoff push along the dominant held direction.
fn jump_momentum(input: &MoveInput, basis: &Basis, config: &PhysicsConfig) -> Vec3 {
    let bias = config.jump_momentum;
    let mut momentum = Vec3::ZERO;

    if input.forward {
        momentum += basis.forward * bias;
    } else if input.back {
        momentum -= basis.forward * bias;
    }

    if input.right {
        momentum += basis.right * bias;
    } else if input.left {
        momentum -= basis.right * bias;
    }

    momentum
}

/// Snaps onto any intersected platform whose top the player is above.
fn resolve_platforms(player: &mut LocalPlayer, world: &World) -> Support {
    let mut support = Support::Airborne;
    for platform in world.platform_bounds() {
        if player.bounds.intersects(platform) && player.position.y > platform.max.y {
            player.land_on(platform.max.y);
            support = Support::Platform;
        }
    }
    support
}

/// Pushes the player out of rocks along the axis of least overlap.
/// Returns true if the player ended up standing on one.
fn resolve_rocks(player: &mut LocalPlayer, world: &World, config: &PhysicsConfig) -> bool {
    let mut standing = false;

    for (rock, bounds) in world.rock_volumes() {
        if !player.bounds.intersects(bounds) {
            continue;
        }

        let p = player.bounds;
        let overlap_x = (p.max.x - bounds.min.x).min(bounds.max.x - p.min.x);
        let overlap_y = (p.max.y - bounds.min.y).min(bounds.max.y - p.min.y);
        let overlap_z = (p.max.z - bounds.min.z).min(bounds.max.z - p.min.z);
        let least = overlap_x.min(overlap_y).min(overlap_z);

        if least == overlap_y && player.position.y > rock.position.y {
            player.land_on(bounds.max.y);
            standing = true;
            continue;
        }

        // Vertical overlap from below still resolves sideways.
        let half = player.half_extents;
        if overlap_x <= overlap_z {
            let target = if player.position.x < rock.position.x {
                bounds.min.x - half.x
            } else {
                bounds.max.x + half.x
            };
            if (target - player.position.x).abs() > config.correction_epsilon {
                player.position.x = target;
                player.velocity.x = 0.0;
            }
        } else {
            let target = if player.position.z < rock.position.z {
                bounds.min.z - half.z
            } else {
                bounds.max.z + half.z
            };
            if (target - player.position.z).abs() > config.correction_epsilon {
                player.position.z = target;
                player.velocity.z = 0.0;
            }
        }
        player.refresh_bounds();
    }

    standing
}

/// Catches fast falls that skipped past a platform surface this tick.
fn probe_landing(player: &mut LocalPlayer, world: &World, config: &PhysicsConfig) -> bool {
    let probe = player.position - Vec3::new(0.0, config.landing_probe, 0.0);
    for platform in world.platform_bounds() {
        if platform.contains_point(probe) {
            player.land_on(platform.max.y);
            return true;
        }
    }
    false
}

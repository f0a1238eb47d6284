//! Static and moving world geometry the local player collides with.
//!
//! Bounding volumes are allocated once when the world is built and
//! recomputed in place by [`World::refresh`] at the start of every tick, so
//! collision checks never allocate.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shared::Vec3;

/// Base radius of a rock before scaling.
pub const ROCK_BASE_RADIUS: f32 = 2.0;

const PLATFORM_SPACING: f32 = 15.0;
const PLATFORM_MIN_HEIGHT: f32 = 2.0;
const GENERATED_PLATFORMS: usize = 8;
const ROCK_COUNT: usize = 15;
const ROCK_SPREAD: f32 = 35.0;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Aabb {
    pub fn from_center(center: Vec3, half_extents: Vec3) -> Self {
        let mut aabb = Aabb::default();
        aabb.set_center(center, half_extents);
        aabb
    }

    /// Recomputes the box in place.
    pub fn set_center(&mut self, center: Vec3, half_extents: Vec3) {
        self.min = center - half_extents;
        self.max = center + half_extents;
    }

    pub fn center(&self) -> Vec3 {
        self.min.midpoint(&self.max)
    }

    /// Strict overlap; boxes that only touch do not intersect.
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
            && self.min.z < other.max.z
            && self.max.z > other.min.z
    }

    pub fn contains_point(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}

/// Vertical bobbing of a platform as a pure function of time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Oscillation {
    pub origin_y: f32,
    pub amplitude: f32,
    /// Angular speed in radians per second.
    pub speed: f32,
}

impl Oscillation {
    pub fn height_at(&self, time: f64) -> f32 {
        self.origin_y + self.amplitude * (time * self.speed as f64).sin() as f32
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Platform {
    pub position: Vec3,
    pub half_extents: Vec3,
    pub oscillation: Option<Oscillation>,
}

impl Platform {
    pub fn new(position: Vec3, size: Vec3) -> Self {
        Self {
            position,
            half_extents: size.scale(0.5),
            oscillation: None,
        }
    }

    pub fn oscillating(position: Vec3, size: Vec3, amplitude: f32, speed: f32) -> Self {
        Self {
            oscillation: Some(Oscillation {
                origin_y: position.y,
                amplitude,
                speed,
            }),
            ..Self::new(position, size)
        }
    }

    pub fn center_at(&self, time: f64) -> Vec3 {
        match &self.oscillation {
            Some(osc) => Vec3::new(self.position.x, osc.height_at(time), self.position.z),
            None => self.position,
        }
    }
}

/// A convex obstacle approximated by the cube enclosing its radius.
#[derive(Debug, Clone, PartialEq)]
pub struct Rock {
    pub position: Vec3,
    pub radius: f32,
}

impl Rock {
    pub fn new(position: Vec3, scale: f32) -> Self {
        Self {
            position,
            radius: ROCK_BASE_RADIUS * scale,
        }
    }

    pub fn half_extents(&self) -> Vec3 {
        Vec3::new(self.radius, self.radius, self.radius)
    }
}

pub struct World {
    platforms: Vec<Platform>,
    rocks: Vec<Rock>,
    platform_bounds: Vec<Aabb>,
    rock_bounds: Vec<Aabb>,
}

impl World {
    pub fn new(platforms: Vec<Platform>, rocks: Vec<Rock>) -> Self {
        let platform_bounds = platforms
            .iter()
            .map(|p| Aabb::from_center(p.center_at(0.0), p.half_extents))
            .collect();
        let rock_bounds = rocks
            .iter()
            .map(|r| Aabb::from_center(r.position, r.half_extents()))
            .collect();

        Self {
            platforms,
            rocks,
            platform_bounds,
            rock_bounds,
        }
    }

    /// Builds the course: a cross of starting platforms, platforms grown
    /// outward from random existing ones, a bobbing platform and rocks.
    pub fn generate(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut platforms = vec![
            Platform::new(Vec3::new(0.0, 2.0, 0.0), Vec3::new(8.0, 1.0, 8.0)),
            Platform::new(Vec3::new(12.0, 2.0, 0.0), Vec3::new(6.0, 1.0, 6.0)),
            Platform::new(Vec3::new(-12.0, 2.0, 0.0), Vec3::new(6.0, 1.0, 6.0)),
            Platform::new(Vec3::new(0.0, 2.0, 12.0), Vec3::new(6.0, 1.0, 6.0)),
            Platform::new(Vec3::new(0.0, 2.0, -12.0), Vec3::new(6.0, 1.0, 6.0)),
        ];

        let directions = [(1.0, 0.0), (-1.0, 0.0), (0.0, 1.0), (0.0, -1.0)];
        for _ in 0..GENERATED_PLATFORMS {
            let base = platforms[rng.gen_range(0..platforms.len())].position;
            let (dx, dz) = directions[rng.gen_range(0..directions.len())];
            let y = (base.y + (rng.gen::<f32>() - 0.5) * 4.0).max(PLATFORM_MIN_HEIGHT);
            let size = 5.0 + rng.gen::<f32>() * 3.0;

            platforms.push(Platform::new(
                Vec3::new(base.x + dx * PLATFORM_SPACING, y, base.z + dz * PLATFORM_SPACING),
                Vec3::new(size, 0.5, size),
            ));
        }

        platforms.push(Platform::oscillating(
            Vec3::new(-PLATFORM_SPACING * 2.0, 4.0, -PLATFORM_SPACING * 2.0),
            Vec3::new(5.0, 0.5, 5.0),
            1.5,
            1.0,
        ));

        let rocks = (0..ROCK_COUNT)
            .map(|_| {
                let x = (rng.gen::<f32>() - 0.5) * ROCK_SPREAD * 2.0;
                let z = (rng.gen::<f32>() - 0.5) * ROCK_SPREAD * 2.0;
                let scale = 0.5 + rng.gen::<f32>() * 1.5;
                Rock::new(Vec3::new(x, 1.0, z), scale)
            })
            .collect();

        Self::new(platforms, rocks)
    }

    /// Moves oscillating platforms to their position at `time` (seconds).
    pub fn refresh(&mut self, time: f64) {
        for (platform, bounds) in self.platforms.iter().zip(self.platform_bounds.iter_mut()) {
            if platform.oscillation.is_some() {
                bounds.set_center(platform.center_at(time), platform.half_extents);
            }
        }
    }

    pub fn platforms(&self) -> &[Platform] {
        &self.platforms
    }

    pub fn rocks(&self) -> &[Rock] {
        &self.rocks
    }

    pub fn platform_bounds(&self) -> &[Aabb] {
        &self.platform_bounds
    }

    pub fn rock_bounds(&self) -> &[Aabb] {
        &self.rock_bounds
    }

    /// Pairs of rocks with their bounding boxes.
    pub fn rock_volumes(&self) -> impl Iterator<Item = (&Rock, &Aabb)> {
        self.rocks.iter().zip(self.rock_bounds.iter())
    }
}

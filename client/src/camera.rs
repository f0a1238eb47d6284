//! Third-person orbit camera driven by mouse deltas.

use crate::physics::Basis;
use shared::Vec3;
use std::f32::consts::FRAC_PI_3;

pub const DEFAULT_SENSITIVITY: f32 = 0.002;
const CAMERA_HEIGHT: f32 = 5.0;
const CAMERA_DISTANCE: f32 = 10.0;

#[derive(Debug, Clone)]
pub struct CameraRig {
    pub yaw: f32,
    pub pitch: f32,
    pub sensitivity: f32,
    position: Vec3,
}

impl CameraRig {
    pub fn new(sensitivity: f32) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            sensitivity,
            position: Vec3::new(0.0, CAMERA_HEIGHT, CAMERA_DISTANCE),
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Applies a pointer movement in pixels. Pitch is clamped so the view
    /// never flips.
    pub fn look(&mut self, dx: f32, dy: f32) {
        if !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.yaw -= dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(-FRAC_PI_3, FRAC_PI_3);
    }

    /// Unit view direction.
    pub fn forward(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();
        Vec3::new(-sin_yaw * cos_pitch, sin_pitch, -cos_yaw * cos_pitch)
    }

    pub fn basis(&self) -> Basis {
        Basis::from_view(self.forward())
    }

    /// Offset from the follow target, rotated by pitch then yaw.
    pub fn offset(&self) -> Vec3 {
        let (sin_yaw, cos_yaw) = self.yaw.sin_cos();
        let (sin_pitch, cos_pitch) = self.pitch.sin_cos();

        let y = CAMERA_HEIGHT * cos_pitch - CAMERA_DISTANCE * sin_pitch;
        let z = CAMERA_HEIGHT * sin_pitch + CAMERA_DISTANCE * cos_pitch;

        Vec3::new(z * sin_yaw, y, z * cos_yaw)
    }

    /// Frames the local player, or the midpoint of both players when a
    /// partner is present. Non-finite results leave the camera where it was.
    pub fn follow(&mut self, local: Vec3, remote: Option<Vec3>) -> bool {
        let target = match remote {
            Some(remote) => local.midpoint(&remote),
            None => local,
        };
        let candidate = target + self.offset();
        if !candidate.is_finite() {
            return false;
        }
        self.position = candidate;
        true
    }
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVITY)
    }
}

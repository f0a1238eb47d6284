//! Rope between the two players: a symmetric distance limit plus the
//! sagging curve drawn between them.

use shared::Vec3;

/// Number of segments in the drawn rope.
pub const ROPE_SEGMENTS: usize = 10;
/// Upward bow at the middle of the drawn rope.
pub const ROPE_BOW: f32 = 0.5;

/// Pulls both endpoints toward each other so they are at most `max_length`
/// apart. Each side moves half of the excess, so the midpoint is preserved.
/// Returns true if a correction was applied.
pub fn apply_rope_constraint(local: &mut Vec3, remote: &mut Vec3, max_length: f32) -> bool {
    let distance = local.distance(remote);
    if distance <= max_length || !distance.is_finite() {
        return false;
    }

    let direction = (*remote - *local).normalize();
    let correction = direction * ((distance - max_length) / 2.0);
    *local += correction;
    *remote -= correction;
    true
}

/// Polyline of the drawn rope, refreshed in place every tick.
#[derive(Debug, Clone)]
pub struct RopeCurve {
    points: [Vec3; ROPE_SEGMENTS + 1],
}

impl RopeCurve {
    pub fn new() -> Self {
        Self {
            points: [Vec3::ZERO; ROPE_SEGMENTS + 1],
        }
    }

    /// Interpolates from `start` to `end`, bowing the interior points upward.
    pub fn update(&mut self, start: Vec3, end: Vec3) {
        for (i, point) in self.points.iter_mut().enumerate() {
            let t = i as f32 / ROPE_SEGMENTS as f32;
            *point = start.lerp(&end, t);
            point.y += (t * std::f32::consts::PI).sin() * ROPE_BOW;
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

impl Default for RopeCurve {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_within_length_is_untouched() {
        let mut a = Vec3::new(0.0, 1.0, 0.0);
        let mut b = Vec3::new(3.0, 1.0, 0.0);

        assert!(!apply_rope_constraint(&mut a, &mut b, 5.0));
        assert_eq!(a, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(b, Vec3::new(3.0, 1.0, 0.0));
    }

    #[test]
    fn test_overstretched_rope_is_pulled_to_max_length() {
        let mut a = Vec3::new(0.0, 1.0, 0.0);
        let mut b = Vec3::new(9.0, 4.0, -2.0);
        let midpoint = a.midpoint(&b);

        assert!(apply_rope_constraint(&mut a, &mut b, 5.0));

        assert_approx_eq!(a.distance(&b), 5.0, 1e-4);
        let after = a.midpoint(&b);
        assert_approx_eq!(after.x, midpoint.x, 1e-4);
        assert_approx_eq!(after.y, midpoint.y, 1e-4);
        assert_approx_eq!(after.z, midpoint.z, 1e-4);
    }

    #[test]
    fn test_each_side_moves_half_the_excess() {
        let mut a = Vec3::new(0.0, 0.0, 0.0);
        let mut b = Vec3::new(7.0, 0.0, 0.0);

        apply_rope_constraint(&mut a, &mut b, 5.0);

        assert_approx_eq!(a.x, 1.0);
        assert_approx_eq!(b.x, 6.0);
    }

    #[test]
    fn test_curve_endpoints_and_bow() {
        let mut curve = RopeCurve::new();
        let start = Vec3::new(0.0, 1.0, 0.0);
        let end = Vec3::new(0.0, 1.0, 4.0);

        curve.update(start, end);
        let points = curve.points();

        assert_eq!(points.len(), ROPE_SEGMENTS + 1);
        assert_approx_eq!(points[0].x, 0.0);
        assert_approx_eq!(points[0].z, 0.0);
        assert_approx_eq!(points[ROPE_SEGMENTS].y, 1.0, 1e-5);
        assert_approx_eq!(points[ROPE_SEGMENTS].z, 4.0);

        let middle = points[ROPE_SEGMENTS / 2];
        assert_approx_eq!(middle.x, 0.0);
        assert_approx_eq!(middle.y, start.y + ROPE_BOW);
        assert_approx_eq!(middle.z, 2.0);
    }

    #[test]
    fn test_curve_bows_up_not_sideways() {
        let mut curve = RopeCurve::new();
        curve.update(Vec3::new(-2.0, 3.0, 0.0), Vec3::new(2.0, 3.0, 0.0));

        for point in &curve.points()[1..ROPE_SEGMENTS] {
            assert!(point.y > 3.0);
            assert_approx_eq!(point.z, 0.0);
        }
    }
}

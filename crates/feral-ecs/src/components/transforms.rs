use crate::Component;
use cgmath::{Quaternion, Rad, Rotation3, Vector3, Zero};
use feral_core::{forward, wrap_angle};
use feral_macro::Component;

/// Resolved placement of a creature: feet position plus a heading.
///
/// Creatures only turn around the vertical axis. Yaw `0.0` faces `+Z`.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct Pos3 {
    pub pos: Vector3<f32>,
    /// Radians, kept in `[-PI, PI]`.
    pub yaw: f32,
}

impl Pos3 {
    pub fn new(pos: Vector3<f32>) -> Self {
        Self::new_with_yaw(pos, 0.0)
    }

    pub fn new_with_yaw(pos: Vector3<f32>, yaw: f32) -> Self {
        Self { pos, yaw: wrap_angle(yaw) }
    }

    pub fn forward(&self) -> Vector3<f32> {
        forward(self.yaw)
    }

    /// Heading as a quaternion for renderers.
    pub fn rotation(&self) -> Quaternion<f32> {
        Quaternion::from_angle_y(Rad(self.yaw))
    }

    /// Distance on the ground plane, ignoring height.
    pub fn planar_distance(&self, other: Vector3<f32>) -> f32 {
        let dx = other.x - self.pos.x;
        let dz = other.z - self.pos.z;
        (dx * dx + dz * dz).sqrt()
    }
}

impl Default for Pos3 {
    fn default() -> Self {
        Self::new(Vector3::zero())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Rotation};
    use std::f32::consts::PI;

    #[test]
    fn test_yaw_is_wrapped() {
        let t = Pos3::new_with_yaw(Vector3::zero(), 3.0 * PI);
        assert!((t.yaw.abs() - PI).abs() < 1e-5);
    }

    #[test]
    fn test_quaternion_matches_forward() {
        let t = Pos3::new_with_yaw(Vector3::new(1.0, 2.0, 3.0), 0.6);
        let rotated = t.rotation().rotate_vector(Vector3::unit_z());
        assert!((rotated - t.forward()).magnitude() < 1e-5);
    }

    #[test]
    fn test_planar_distance_ignores_height() {
        let t = Pos3::new(Vector3::new(0.0, 5.0, 0.0));
        assert!((t.planar_distance(Vector3::new(3.0, -2.0, 4.0)) - 5.0).abs() < 1e-5);
        assert_eq!(Pos3::default().yaw, 0.0);
    }
}

//! Core functionalities for the feral behavior engine.

#![forbid(unsafe_code)]

pub mod config;

use std::f32::consts::{PI, TAU};

/// Type alias for a duration which can be used to represent time intervals.
pub type Dt = std::time::Duration;

/// Distance below which two points are considered to coincide.
pub const POSITION_EPSILON: f32 = 1e-5;

/// Wraps an angle in radians into the `[-PI, PI]` range.
///
/// # Arguments
///
/// * `angle` - The angle to wrap.
///
/// # Returns
///
/// The equivalent angle inside `[-PI, PI]`. Non-finite input is returned as `0.0`.
pub fn wrap_angle(angle: f32) -> f32 {
    if !angle.is_finite() {
        return 0.0;
    }
    if (-PI..=PI).contains(&angle) {
        return angle;
    }

    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    // rem_euclid can land exactly on -PI for inputs equal to PI
    if wrapped <= -PI { PI } else { wrapped }
}

/// Shortest signed difference `to - from`, wrapped to `[-PI, PI]`.
pub fn angle_difference(from: f32, to: f32) -> f32 {
    wrap_angle(to - from)
}

/// Yaw that faces from `from` towards `to` on the XZ plane.
///
/// Yaw `0.0` faces `+Z`, positive yaw turns towards `+X`.
pub fn heading_to(from: cgmath::Vector3<f32>, to: cgmath::Vector3<f32>) -> Option<f32> {
    let dx = to.x - from.x;
    let dz = to.z - from.z;
    if dx * dx + dz * dz < POSITION_EPSILON * POSITION_EPSILON {
        return None;
    }
    Some(dx.atan2(dz))
}

/// Unit forward vector on the XZ plane for the given yaw.
pub fn forward(yaw: f32) -> cgmath::Vector3<f32> {
    cgmath::Vector3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Horizontal (XZ) distance between two points.
pub fn horizontal_distance(a: cgmath::Vector3<f32>, b: cgmath::Vector3<f32>) -> f32 {
    let dx = a.x - b.x;
    let dz = a.z - b.z;
    (dx * dx + dz * dz).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector3;

    #[test]
    fn test_wrap_angle_range() {
        for i in -40..40 {
            let angle = i as f32 * 0.7;
            let wrapped = wrap_angle(angle);
            assert!((-PI..=PI).contains(&wrapped), "{angle} wrapped to {wrapped}");
            assert!(((wrapped - angle) / TAU - ((wrapped - angle) / TAU).round()).abs() < 1e-4);
        }
    }

    #[test]
    fn test_wrap_angle_non_finite() {
        assert_eq!(wrap_angle(f32::NAN), 0.0);
        assert_eq!(wrap_angle(f32::INFINITY), 0.0);
    }

    #[test]
    fn test_angle_difference_takes_short_way() {
        let diff = angle_difference(PI - 0.1, -PI + 0.1);
        assert!((diff - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_heading_to_axes() {
        let origin = Vector3::new(0.0, 0.0, 0.0);
        let east = heading_to(origin, Vector3::new(1.0, 0.0, 0.0)).unwrap();
        let north = heading_to(origin, Vector3::new(0.0, 5.0, 1.0)).unwrap();
        assert!((east - PI / 2.0).abs() < 1e-6);
        assert!(north.abs() < 1e-6);
        assert!(heading_to(origin, origin).is_none());
    }

    #[test]
    fn test_forward_matches_heading() {
        let yaw = 0.8;
        let f = forward(yaw);
        let back = heading_to(Vector3::new(0.0, 0.0, 0.0), f).unwrap();
        assert!((back - yaw).abs() < 1e-5);
    }
}

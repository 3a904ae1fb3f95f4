//! Heading smoothing, sensor-fan avoidance and collision-aware stepping.
//!
//! Everything here is a free function of its inputs. Headings are yaw angles in
//! radians where `0.0` faces `+Z` and positive values turn towards `+X`.

use super::collision::{CollisionQuery, Obstacle, footprint_margin};
use cgmath::Vector3;
use feral_core::{angle_difference, heading_to, wrap_angle};
use log::trace;

/// Sensor fan offsets in degrees, in evaluation order.
pub const SENSOR_FAN_DEGREES: [f32; 5] = [0.0, 30.0, -30.0, 45.0, -45.0];

/// Score added to a sensor whose ray is blocked.
const BLOCKED_PENALTY: f32 = 1000.0;

/// Rotates `current_rot` towards the heading that faces `target_pos`.
///
/// # Arguments
///
/// * `current_rot` - Current yaw.
/// * `target_pos` - Point to look at.
/// * `current_pos` - Position of the turning entity.
/// * `dt` - Seconds since the last tick.
/// * `rate` - Fraction of the remaining angle covered per second.
///
/// # Returns
///
/// The new yaw in `[-PI, PI]`. When the target sits on top of the entity the
/// current heading is kept.
pub fn smooth_look_at(
    current_rot: f32,
    target_pos: Vector3<f32>,
    current_pos: Vector3<f32>,
    dt: f32,
    rate: f32,
) -> f32 {
    match heading_to(current_pos, target_pos) {
        Some(target_rot) => turn_towards(current_rot, target_rot, dt, rate),
        None => wrap_angle(current_rot),
    }
}

/// Rotates `current_rot` towards `target_rot` along the shortest arc.
///
/// Advances by `min(1, rate * dt)` of the wrapped difference, so the result
/// never overshoots and lands exactly on the target once `rate * dt >= 1`.
pub fn turn_towards(current_rot: f32, target_rot: f32, dt: f32, rate: f32) -> f32 {
    let usable = dt.is_finite() && rate.is_finite() && target_rot.is_finite();
    if !usable || dt <= 0.0 || rate <= 0.0 {
        return wrap_angle(current_rot);
    }

    let t = rate * dt;
    if t >= 1.0 {
        return wrap_angle(target_rot);
    }
    wrap_angle(current_rot + angle_difference(current_rot, target_rot) * t)
}

/// Picks a heading that steers around obstacles ahead.
///
/// # Arguments
///
/// * `pos` - Feet position of the entity.
/// * `rot` - Current yaw.
/// * `size` - Full size of the entity box.
/// * `obstacles` - Obstacles to test the sensors against.
/// * `look_ahead` - Sensor length.
/// * `query` - World queries for the sensor rays.
///
/// # Returns
///
/// `rot` unchanged if the way ahead is clear. Otherwise the best sensor of the
/// fan, where a blocked sensor costs [`BLOCKED_PENALTY`] and every degree away
/// from the current heading costs one. Ties go to the earlier sensor.
pub fn avoidance_steering(
    pos: Vector3<f32>,
    rot: f32,
    size: Vector3<f32>,
    obstacles: &[Obstacle],
    look_ahead: f32,
    query: &CollisionQuery,
) -> f32 {
    if !query.ray_blocked(pos, rot, size, obstacles, look_ahead) {
        return rot;
    }

    let mut best_offset = 0.0_f32;
    let mut best_score = f32::INFINITY;
    for offset_deg in SENSOR_FAN_DEGREES {
        let offset = offset_deg.to_radians();
        let blocked = query.ray_blocked(pos, rot + offset, size, obstacles, look_ahead);
        let score = if blocked { BLOCKED_PENALTY } else { 0.0 } + offset_deg.abs();
        if score < best_score {
            best_score = score;
            best_offset = offset;
        }
    }

    trace!("Avoidance picked offset {:.0} deg (score {best_score})", best_offset.to_degrees());
    wrap_angle(rot + best_offset)
}

/// Steps forward along `rot`, sliding along obstacles.
///
/// # Arguments
///
/// * `pos` - Feet position of the entity.
/// * `rot` - Yaw to move along.
/// * `speed` - Units per second.
/// * `dt` - Seconds since the last tick.
/// * `size` - Full size of the entity box.
/// * `obstacles` - Obstacles to respect.
/// * `query` - World queries for bounds and collision.
///
/// # Returns
///
/// The first of the full step, the X-only slide and the Z-only slide that
/// stays inside the world and does not collide, or `pos` if none does.
pub fn next_position(
    pos: Vector3<f32>,
    rot: f32,
    speed: f32,
    dt: f32,
    size: Vector3<f32>,
    obstacles: &[Obstacle],
    query: &CollisionQuery,
) -> Vector3<f32> {
    let velocity = feral_core::forward(rot) * speed;
    next_position_with_velocity(pos, velocity, dt, size, obstacles, query)
}

/// Same as [`next_position`] for an arbitrary horizontal velocity.
pub fn next_position_with_velocity(
    pos: Vector3<f32>,
    velocity: Vector3<f32>,
    dt: f32,
    size: Vector3<f32>,
    obstacles: &[Obstacle],
    query: &CollisionQuery,
) -> Vector3<f32> {
    let step_x = velocity.x * dt;
    let step_z = velocity.z * dt;
    if !(step_x.is_finite() && step_z.is_finite()) || (step_x == 0.0 && step_z == 0.0) {
        return pos;
    }

    let margin = footprint_margin(size);
    let candidates = [
        Vector3::new(pos.x + step_x, pos.y, pos.z + step_z),
        Vector3::new(pos.x + step_x, pos.y, pos.z),
        Vector3::new(pos.x, pos.y, pos.z + step_z),
    ];

    candidates
        .into_iter()
        .find(|candidate| {
            query.is_within_bounds(*candidate, margin)
                && !query.check_box_collision(*candidate, size, obstacles)
        })
        .unwrap_or(pos)
}

/// Critically damped approach of `current` towards `target`.
///
/// # Arguments
///
/// * `current` - Current value.
/// * `target` - Value to approach.
/// * `velocity` - Rate of change carried between calls.
/// * `smooth_time` - Rough time to reach the target.
/// * `dt` - Seconds since the last call.
///
/// # Returns
///
/// The new value. It never passes the target.
pub fn smooth_damp(
    current: f32,
    target: f32,
    velocity: &mut f32,
    smooth_time: f32,
    dt: f32,
) -> f32 {
    if !(dt.is_finite() && dt > 0.0) || !target.is_finite() {
        return current;
    }

    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let exp = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);
    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * exp;
    let mut output = target + (change + temp) * exp;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

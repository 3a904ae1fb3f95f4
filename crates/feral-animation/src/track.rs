//! Keyframe tracks sampled by action progress.

use super::{InterpolationMode, Keyframe};
use cgmath::Vector3;

/// Rotation curve of one joint, keyed on action progress.
#[derive(Debug, Clone, Default)]
pub struct AnimationTrack {
    keyframes: Vec<Keyframe>,
}

impl AnimationTrack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a track from `(time, rotation)` pairs with linear interpolation.
    pub fn from_points(points: &[(f32, Vector3<f32>)]) -> Self {
        let mut track = Self::new();
        for (time, value) in points {
            track.add_keyframe(Keyframe::new(*time, *value));
        }
        track
    }

    /// Keys stay ordered by time. Equal times keep insertion order.
    pub fn add_keyframe(&mut self, keyframe: Keyframe) -> &mut Self {
        let at = self.keyframes.partition_point(|k| k.time <= keyframe.time);
        self.keyframes.insert(at, keyframe);
        self
    }

    /// Time of the last key.
    pub fn duration(&self) -> f32 {
        self.keyframes.last().map_or(0.0, |k| k.time)
    }

    pub fn keyframe_count(&self) -> usize {
        self.keyframes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keyframes.is_empty()
    }

    /// Value at `time`. The end keys are held outside the keyed range.
    pub fn sample(&self, time: f32) -> Option<Vector3<f32>> {
        let first = self.keyframes.first()?;
        let last = self.keyframes.last()?;

        if time <= first.time {
            return Some(first.value);
        }
        if time >= last.time {
            return Some(last.value);
        }

        self.keyframes
            .windows(2)
            .find(|pair| time >= pair[0].time && time <= pair[1].time)
            .map(|pair| interpolate_between(&pair[0], &pair[1], time))
    }
}

fn interpolate_between(from: &Keyframe, to: &Keyframe, time: f32) -> Vector3<f32> {
    let duration = to.time - from.time;
    if duration <= 0.0 {
        return from.value;
    }

    let t = (time - from.time) / duration;
    let t = match from.interpolation {
        InterpolationMode::Step => 0.0,
        InterpolationMode::Linear => t,
        InterpolationMode::Smooth => t * t * (3.0 - 2.0 * t),
    };
    from.value + (to.value - from.value) * t
}

//! Procedural animation driven by behavior output.
//!
//! This crate supports:
//! - Full-body override poses (ragdoll, death, ledge-climb, item pickup)
//! - A locomotion layer driven by a gait phase
//! - A masked action layer sampled from keyframe tracks
//! - An independent eye blink

#![forbid(unsafe_code)]

pub mod action;
pub mod animator;
pub mod flags;
pub mod mask;
pub mod track;

pub use action::{Action, ActionClip};
pub use animator::{Animator, BLINK_DURATION, BLINK_INTERVAL};
pub use flags::{Override, StateFlags};
pub use mask::AnimationMask;
pub use track::AnimationTrack;

use cgmath::Vector3;

/// A joint of the procedural rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Joint {
    Root,
    Torso,
    Head,
    LeftArm,
    RightArm,
    LeftForearm,
    RightForearm,
    LeftLeg,
    RightLeg,
    Tail,
}

impl Joint {
    pub const ALL: [Joint; 10] = [
        Joint::Root,
        Joint::Torso,
        Joint::Head,
        Joint::LeftArm,
        Joint::RightArm,
        Joint::LeftForearm,
        Joint::RightForearm,
        Joint::LeftLeg,
        Joint::RightLeg,
        Joint::Tail,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// Local transform of a joint relative to its rest pose.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JointTransform {
    /// Euler rotation in radians, applied as pitch (x), yaw (y), roll (z).
    pub rotation: Vector3<f32>,
    /// Translation from the rest position.
    pub offset: Vector3<f32>,
}

impl JointTransform {
    pub const REST: JointTransform = JointTransform {
        rotation: Vector3::new(0.0, 0.0, 0.0),
        offset: Vector3::new(0.0, 0.0, 0.0),
    };

    pub fn rotated(rotation: Vector3<f32>) -> Self {
        Self {
            rotation,
            offset: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl Default for JointTransform {
    fn default() -> Self {
        Self::REST
    }
}

/// Output of the animator: one transform per joint plus the facial channels.
#[derive(Debug, Clone, PartialEq)]
pub struct Pose {
    joints: [JointTransform; Joint::ALL.len()],
    /// Eyelid closure, `0.0` open and `1.0` shut.
    pub eyelid: f32,
}

impl Pose {
    pub fn get(&self, joint: Joint) -> &JointTransform {
        &self.joints[joint.index()]
    }

    pub fn set(&mut self, joint: Joint, transform: JointTransform) {
        self.joints[joint.index()] = transform;
    }

    pub fn set_rotation(&mut self, joint: Joint, rotation: Vector3<f32>) {
        self.joints[joint.index()].rotation = rotation;
    }

    /// Resets every joint to rest, leaving the facial channels alone.
    pub fn reset_body(&mut self) {
        self.joints = [JointTransform::REST; Joint::ALL.len()];
    }

    pub fn iter(&self) -> impl Iterator<Item = (Joint, &JointTransform)> {
        Joint::ALL.iter().map(|j| (*j, &self.joints[j.index()]))
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            joints: [JointTransform::REST; Joint::ALL.len()],
            eyelid: 0.0,
        }
    }
}

/// Different interpolation modes for animation keyframes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InterpolationMode {
    /// Linear interpolation between keyframes
    Linear,
    /// Step interpolation (no smoothing)
    Step,
    /// Ease in and out with a smoothstep curve
    Smooth,
}

/// A keyframe of a joint rotation track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    /// Normalized time, `0.0..=1.0` through the action.
    pub time: f32,
    /// Euler rotation at this time.
    pub value: Vector3<f32>,
    /// Interpolation mode to use when transitioning from this keyframe
    pub interpolation: InterpolationMode,
}

impl Keyframe {
    pub fn new(time: f32, value: Vector3<f32>) -> Self {
        Self {
            time,
            value,
            interpolation: InterpolationMode::Linear,
        }
    }

    pub fn with_interpolation(mut self, interpolation: InterpolationMode) -> Self {
        self.interpolation = interpolation;
        self
    }
}

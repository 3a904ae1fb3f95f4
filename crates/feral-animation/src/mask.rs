use super::Joint;
use std::collections::HashMap;

/// Mask defining which joints an action layer drives.
#[derive(Debug, Clone, Default)]
pub struct AnimationMask {
    /// Joints that are included (if empty, all joints are included).
    pub included: Vec<Joint>,
    /// Joints that are excluded.
    pub excluded: Vec<Joint>,
    /// Weight multiplier per joint.
    pub weights: HashMap<Joint, f32>,
}

impl AnimationMask {
    /// Creates a new empty mask that affects all joints.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mask that only affects specific joints.
    ///
    /// # Arguments
    ///
    /// * `joints` - The list of joints to include.
    ///
    /// # Returns
    ///
    /// A new [`AnimationMask`] instance.
    pub fn include_only(joints: Vec<Joint>) -> Self {
        Self {
            included: joints,
            ..Self::default()
        }
    }

    /// Creates a mask that excludes specific joints.
    pub fn exclude(joints: Vec<Joint>) -> Self {
        Self {
            excluded: joints,
            ..Self::default()
        }
    }

    /// Torso, head and both arms. The legs stay with locomotion.
    pub fn upper_body() -> Self {
        Self::include_only(vec![
            Joint::Torso,
            Joint::Head,
            Joint::LeftArm,
            Joint::RightArm,
            Joint::LeftForearm,
            Joint::RightForearm,
        ])
    }

    pub fn arms() -> Self {
        Self::include_only(vec![
            Joint::LeftArm,
            Joint::RightArm,
            Joint::LeftForearm,
            Joint::RightForearm,
        ])
    }

    /// Checks if a joint is affected by this mask.
    pub fn affects(&self, joint: Joint) -> bool {
        if self.excluded.contains(&joint) {
            return false;
        }

        self.included.is_empty() || self.included.contains(&joint)
    }

    /// Gets the weight multiplier for a joint, `0.0` when masked out.
    pub fn weight(&self, joint: Joint) -> f32 {
        if !self.affects(joint) {
            return 0.0;
        }

        self.weights.get(&joint).copied().unwrap_or(1.0)
    }

    /// Sets the weight for a specific joint, clamped to `0.0..=1.0`.
    pub fn set_weight(&mut self, joint: Joint, weight: f32) {
        self.weights.insert(joint, weight.clamp(0.0, 1.0));
    }
}

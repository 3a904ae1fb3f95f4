//! Keyframed upper-body actions.

use super::{InterpolationMode, Joint, Keyframe, Pose};
use crate::mask::AnimationMask;
use crate::track::AnimationTrack;
use cgmath::Vector3;

/// Upper-body action played over locomotion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Swing,
    BowDraw,
    SpellCast,
    Interact,
}

/// Tracks of an action plus the joints it takes over from locomotion.
#[derive(Debug, Clone)]
pub struct ActionClip {
    pub action: Action,
    pub mask: AnimationMask,
    tracks: Vec<(Joint, AnimationTrack)>,
}

impl ActionClip {
    pub fn new(action: Action, mask: AnimationMask) -> Self {
        Self {
            action,
            mask,
            tracks: Vec::new(),
        }
    }

    pub fn with_track(mut self, joint: Joint, track: AnimationTrack) -> Self {
        self.tracks.retain(|(j, _)| *j != joint);
        self.tracks.push((joint, track));
        self
    }

    pub fn track(&self, joint: Joint) -> Option<&AnimationTrack> {
        self.tracks.iter().find(|(j, _)| *j == joint).map(|(_, t)| t)
    }

    /// Built-in clip for an action.
    pub fn for_action(action: Action) -> Self {
        match action {
            Action::Swing => Self::swing(),
            Action::BowDraw => Self::bow_draw(),
            Action::SpellCast => Self::spell_cast(),
            Action::Interact => Self::interact(),
        }
    }

    /// Wind up overhead, strike through and recover.
    fn swing() -> Self {
        let mut arm = AnimationTrack::new();
        arm.add_keyframe(Keyframe::new(0.0, Vector3::new(0.0, 0.0, 0.0)))
            .add_keyframe(
                Keyframe::new(0.3, Vector3::new(-2.2, 0.0, 0.3))
                    .with_interpolation(InterpolationMode::Smooth),
            )
            .add_keyframe(Keyframe::new(0.55, Vector3::new(0.9, 0.0, -0.2)))
            .add_keyframe(Keyframe::new(1.0, Vector3::new(0.0, 0.0, 0.0)));

        Self::new(Action::Swing, AnimationMask::upper_body())
            .with_track(Joint::RightArm, arm)
            .with_track(
                Joint::RightForearm,
                AnimationTrack::from_points(&[
                    (0.0, Vector3::new(0.0, 0.0, 0.0)),
                    (0.3, Vector3::new(-0.8, 0.0, 0.0)),
                    (0.55, Vector3::new(-0.1, 0.0, 0.0)),
                    (1.0, Vector3::new(0.0, 0.0, 0.0)),
                ]),
            )
            .with_track(
                Joint::Torso,
                AnimationTrack::from_points(&[
                    (0.0, Vector3::new(0.0, 0.0, 0.0)),
                    (0.3, Vector3::new(0.0, 0.35, 0.0)),
                    (0.55, Vector3::new(0.15, -0.4, 0.0)),
                    (1.0, Vector3::new(0.0, 0.0, 0.0)),
                ]),
            )
    }

    /// Raise the bow, draw to the cheek and hold, then release.
    fn bow_draw() -> Self {
        Self::new(Action::BowDraw, AnimationMask::upper_body())
            .with_track(
                Joint::LeftArm,
                AnimationTrack::from_points(&[
                    (0.0, Vector3::new(0.0, 0.0, 0.0)),
                    (0.25, Vector3::new(-1.5, 0.0, 0.0)),
                    (0.9, Vector3::new(-1.5, 0.0, 0.0)),
                    (1.0, Vector3::new(-0.6, 0.0, 0.0)),
                ]),
            )
            .with_track(
                Joint::RightArm,
                AnimationTrack::from_points(&[
                    (0.0, Vector3::new(0.0, 0.0, 0.0)),
                    (0.25, Vector3::new(-1.4, 0.0, 0.0)),
                    (0.8, Vector3::new(-1.4, -0.6, 0.0)),
                    (0.85, Vector3::new(-1.3, 0.2, 0.0)),
                    (1.0, Vector3::new(-0.4, 0.0, 0.0)),
                ]),
            )
            .with_track(
                Joint::RightForearm,
                AnimationTrack::from_points(&[
                    (0.0, Vector3::new(0.0, 0.0, 0.0)),
                    (0.8, Vector3::new(-1.8, 0.0, 0.0)),
                    (0.85, Vector3::new(-0.2, 0.0, 0.0)),
                    (1.0, Vector3::new(0.0, 0.0, 0.0)),
                ]),
            )
            .with_track(
                Joint::Torso,
                AnimationTrack::from_points(&[
                    (0.0, Vector3::new(0.0, 0.0, 0.0)),
                    (0.25, Vector3::new(0.0, 0.5, 0.0)),
                    (1.0, Vector3::new(0.0, 0.2, 0.0)),
                ]),
            )
    }

    /// Both arms forward, gathering and then thrusting.
    fn spell_cast() -> Self {
        let gather = [
            (0.0, Vector3::new(0.0, 0.0, 0.0)),
            (0.4, Vector3::new(-0.9, 0.0, 0.6)),
            (0.7, Vector3::new(-1.6, 0.0, 0.1)),
            (1.0, Vector3::new(0.0, 0.0, 0.0)),
        ];
        let mirrored = gather.map(|(t, v)| (t, Vector3::new(v.x, v.y, -v.z)));

        Self::new(Action::SpellCast, AnimationMask::arms())
            .with_track(Joint::RightArm, AnimationTrack::from_points(&gather))
            .with_track(Joint::LeftArm, AnimationTrack::from_points(&mirrored))
    }

    /// Reach down and forward with the right hand.
    fn interact() -> Self {
        let mask = AnimationMask::include_only(vec![Joint::RightArm, Joint::RightForearm]);
        Self::new(Action::Interact, mask)
            .with_track(
                Joint::RightArm,
                AnimationTrack::from_points(&[
                    (0.0, Vector3::new(0.0, 0.0, 0.0)),
                    (0.5, Vector3::new(-1.1, 0.0, 0.0)),
                    (1.0, Vector3::new(0.0, 0.0, 0.0)),
                ]),
            )
    }

    /// Overrides the masked joints of `pose` with the clip sampled at `progress`.
    ///
    /// Masked joints without a track are driven back to rest, so locomotion
    /// never leaks into a channel the action owns.
    pub fn apply(&self, pose: &mut Pose, progress: f32) {
        let progress = progress.clamp(0.0, 1.0);

        for joint in Joint::ALL {
            let weight = self.mask.weight(joint);
            if weight <= 0.0 {
                continue;
            }

            let target = self
                .track(joint)
                .and_then(|t| t.sample(progress))
                .unwrap_or(Vector3::new(0.0, 0.0, 0.0));
            if weight >= 1.0 {
                pose.set_rotation(joint, target);
            } else {
                let current = pose.get(joint).rotation;
                pose.set_rotation(joint, current + (target - current) * weight);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_has_a_clip() {
        for action in [Action::Swing, Action::BowDraw, Action::SpellCast, Action::Interact] {
            let clip = ActionClip::for_action(action);
            assert_eq!(clip.action, action);
            assert!(clip.tracks.iter().all(|(j, _)| clip.mask.affects(*j)));
        }
    }

    #[test]
    fn test_apply_leaves_unmasked_joints() {
        let mut pose = Pose::default();
        pose.set_rotation(Joint::LeftLeg, Vector3::new(0.5, 0.0, 0.0));
        pose.set_rotation(Joint::Head, Vector3::new(0.2, 0.0, 0.0));

        ActionClip::for_action(Action::Swing).apply(&mut pose, 0.3);

        assert_eq!(pose.get(Joint::LeftLeg).rotation, Vector3::new(0.5, 0.0, 0.0));
        assert_eq!(pose.get(Joint::RightArm).rotation, Vector3::new(-2.2, 0.0, 0.3));
        // Head is in the upper body mask without a track.
        assert_eq!(pose.get(Joint::Head).rotation, Vector3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn test_partial_weight_blends() {
        let mut mask = AnimationMask::include_only(vec![Joint::RightArm]);
        mask.set_weight(Joint::RightArm, 0.5);
        let clip = ActionClip::new(Action::Interact, mask).with_track(
            Joint::RightArm,
            AnimationTrack::from_points(&[(0.0, Vector3::new(-1.0, 0.0, 0.0))]),
        );

        let mut pose = Pose::default();
        pose.set_rotation(Joint::RightArm, Vector3::new(1.0, 0.0, 0.0));
        clip.apply(&mut pose, 0.5);
        assert_eq!(pose.get(Joint::RightArm).rotation, Vector3::new(0.0, 0.0, 0.0));
    }

    fn held(value: Vector3<f32>) -> AnimationTrack {
        AnimationTrack::from_points(&[(0.0, value)])
    }

    #[test]
    fn test_with_track_replaces() {
        let clip = ActionClip::new(Action::Swing, AnimationMask::arms())
            .with_track(Joint::LeftArm, held(Vector3::new(1.0, 0.0, 0.0)))
            .with_track(Joint::LeftArm, held(Vector3::new(2.0, 0.0, 0.0)));
        let sampled = clip.track(Joint::LeftArm).and_then(|t| t.sample(0.0));
        assert_eq!(sampled, Some(Vector3::new(2.0, 0.0, 0.0)));
    }
}

use crate::action::{Action, ActionClip};
use crate::flags::{Override, StateFlags};
use crate::{Joint, JointTransform, Pose};
use cgmath::{InnerSpace, Vector2, Vector3};
use feral_core::Dt;
use feral_ecs::Component;
use feral_macro::Component;
use log::debug;
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

/// Seconds between two blinks.
pub const BLINK_INTERVAL: f32 = 6.0;
/// Seconds the eyelid takes to close and open again.
pub const BLINK_DURATION: f32 = 0.15;

/// Planar speed below which the body idles.
const MOVING_THRESHOLD: f32 = 0.05;
/// Gait radians per meter travelled.
const STRIDE_FREQUENCY: f32 = 2.2;
const WALK_AMPLITUDE: f32 = 0.45;
const RUN_AMPLITUDE: f32 = 0.8;
const BREATH_RATE: f32 = 1.6;

/// Procedural animator producing a [`Pose`] from body state.
///
/// The animator holds no entity identity: the same flags, timings and inputs
/// always produce the same pose.
#[derive(Component, Debug, Clone)]
pub struct Animator {
    pose: Pose,
    /// Gait cycle position in radians.
    gait_phase: f32,
    breath_phase: f32,
    blink_clock: f32,
    /// Seconds into the current blink.
    blink: Option<f32>,
    clips: HashMap<Action, ActionClip>,
}

impl Default for Animator {
    fn default() -> Self {
        Self::new()
    }
}

impl Animator {
    /// Creates an animator with the built-in action clips.
    pub fn new() -> Self {
        let clips = [Action::Swing, Action::BowDraw, Action::SpellCast, Action::Interact]
            .into_iter()
            .map(|action| (action, ActionClip::for_action(action)))
            .collect();

        Self {
            pose: Pose::default(),
            gait_phase: 0.0,
            breath_phase: 0.0,
            blink_clock: 0.0,
            blink: None,
            clips,
        }
    }

    /// Starts the blink cycle `offset` seconds in, so neighbours do not blink together.
    pub fn with_blink_offset(mut self, offset: f32) -> Self {
        self.blink_clock = offset.rem_euclid(BLINK_INTERVAL);
        self
    }

    /// Replaces the clip played for `clip.action`.
    pub fn set_clip(&mut self, clip: ActionClip) {
        debug!("Replacing the {:?} clip", clip.action);
        self.clips.insert(clip.action, clip);
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn gait_phase(&self) -> f32 {
        self.gait_phase
    }

    /// Advances the animation by one frame.
    ///
    /// # Arguments
    ///
    /// * `flags` - Body state for this frame.
    /// * `dt` - The duration since the last frame.
    /// * `movement` - Planar velocity of the body.
    /// * `run` - Whether the body moves at a run.
    ///
    /// # Returns
    ///
    /// The updated pose.
    pub fn animate(
        &mut self,
        flags: &StateFlags,
        dt: Dt,
        movement: Vector2<f32>,
        run: bool,
    ) -> &Pose {
        let dt = dt.as_secs_f32();
        self.update_blink(dt);
        self.pose.reset_body();

        if let Some(state) = flags.full_body {
            self.apply_override(state);
            return &self.pose;
        }

        let speed = if movement.x.is_finite() && movement.y.is_finite() {
            movement.magnitude()
        } else {
            0.0
        };

        if flags.jumping || !flags.grounded {
            self.jump_tuck();
        } else if speed > MOVING_THRESHOLD {
            self.gait(dt, speed, run);
        } else {
            self.idle(dt);
        }

        if let Some((action, progress)) = flags.action
            && let Some(clip) = self.clips.get(&action)
        {
            clip.apply(&mut self.pose, progress);
        }

        &self.pose
    }

    fn update_blink(&mut self, dt: f32) {
        self.blink_clock += dt;
        if self.blink_clock >= BLINK_INTERVAL {
            self.blink_clock -= BLINK_INTERVAL;
            self.blink = Some(self.blink_clock);
        } else if let Some(elapsed) = self.blink.as_mut() {
            *elapsed += dt;
        }

        self.pose.eyelid = match self.blink {
            Some(elapsed) if elapsed < BLINK_DURATION => (PI * elapsed / BLINK_DURATION).sin(),
            _ => 0.0,
        };
        if self.blink.is_some_and(|elapsed| elapsed >= BLINK_DURATION) {
            self.blink = None;
        }
    }

    fn apply_override(&mut self, state: Override) {
        let pose = &mut self.pose;
        match state {
            Override::Ragdoll => {
                pose.set_rotation(Joint::Root, Vector3::new(0.0, 0.0, FRAC_PI_2));
                pose.set_rotation(Joint::LeftArm, Vector3::new(0.0, 0.0, 1.2));
                pose.set_rotation(Joint::RightArm, Vector3::new(0.0, 0.0, -1.2));
                pose.set_rotation(Joint::LeftLeg, Vector3::new(0.0, 0.0, 0.4));
                pose.set_rotation(Joint::RightLeg, Vector3::new(0.0, 0.0, -0.4));
            }
            Override::Death { progress } => {
                let p = progress.clamp(0.0, 1.0);
                pose.set_rotation(Joint::Root, Vector3::new(0.0, 0.0, p * FRAC_PI_2));
                pose.set_rotation(Joint::Head, Vector3::new(0.4 * p, 0.0, 0.0));
                pose.set_rotation(Joint::LeftArm, Vector3::new(0.0, 0.0, 0.6 * p));
                pose.set_rotation(Joint::RightArm, Vector3::new(0.0, 0.0, -0.6 * p));
            }
            Override::LedgeClimb { progress } => {
                let p = progress.clamp(0.0, 1.0);
                let reach = Vector3::new(-2.8 * (1.0 - p), 0.0, 0.0);
                pose.set_rotation(Joint::LeftArm, reach);
                pose.set_rotation(Joint::RightArm, reach);
                pose.set_rotation(Joint::LeftLeg, Vector3::new(-1.2 * (PI * p).sin(), 0.0, 0.0));
                pose.set(
                    Joint::Root,
                    JointTransform {
                        rotation: Vector3::new(0.0, 0.0, 0.0),
                        offset: Vector3::new(0.0, p, 0.0),
                    },
                );
            }
            Override::ItemPickup { progress } => {
                let bend = (PI * progress.clamp(0.0, 1.0)).sin();
                pose.set_rotation(Joint::Torso, Vector3::new(1.0 * bend, 0.0, 0.0));
                pose.set_rotation(Joint::RightArm, Vector3::new(-0.8 * bend, 0.0, 0.0));
                pose.set_rotation(Joint::LeftLeg, Vector3::new(-0.5 * bend, 0.0, 0.0));
                pose.set_rotation(Joint::RightLeg, Vector3::new(-0.5 * bend, 0.0, 0.0));
            }
        }
    }

    fn jump_tuck(&mut self) {
        let pose = &mut self.pose;
        pose.set_rotation(Joint::LeftLeg, Vector3::new(-0.9, 0.0, 0.0));
        pose.set_rotation(Joint::RightLeg, Vector3::new(-0.9, 0.0, 0.0));
        pose.set_rotation(Joint::LeftArm, Vector3::new(-0.5, 0.0, 0.3));
        pose.set_rotation(Joint::RightArm, Vector3::new(-0.5, 0.0, -0.3));
    }

    fn gait(&mut self, dt: f32, speed: f32, run: bool) {
        self.gait_phase = (self.gait_phase + dt * speed * STRIDE_FREQUENCY).rem_euclid(TAU);
        let amplitude = if run { RUN_AMPLITUDE } else { WALK_AMPLITUDE };
        let swing = self.gait_phase.sin() * amplitude;

        let pose = &mut self.pose;
        pose.set_rotation(Joint::LeftLeg, Vector3::new(swing, 0.0, 0.0));
        pose.set_rotation(Joint::RightLeg, Vector3::new(-swing, 0.0, 0.0));
        pose.set_rotation(Joint::LeftArm, Vector3::new(-0.6 * swing, 0.0, 0.0));
        pose.set_rotation(Joint::RightArm, Vector3::new(0.6 * swing, 0.0, 0.0));
        pose.set_rotation(Joint::Tail, Vector3::new(0.0, 0.5 * swing, 0.0));
        if run {
            pose.set_rotation(Joint::Torso, Vector3::new(0.15, 0.0, 0.0));
        }
        pose.set(
            Joint::Root,
            JointTransform {
                rotation: Vector3::new(0.0, 0.0, 0.0),
                offset: Vector3::new(0.0, 0.05 * amplitude * self.gait_phase.sin().abs(), 0.0),
            },
        );
    }

    fn idle(&mut self, dt: f32) {
        self.breath_phase = (self.breath_phase + dt * BREATH_RATE).rem_euclid(TAU);
        let breath = self.breath_phase.sin();

        let pose = &mut self.pose;
        pose.set_rotation(Joint::Torso, Vector3::new(0.03 * breath, 0.0, 0.0));
        pose.set_rotation(Joint::LeftArm, Vector3::new(0.0, 0.0, 0.02 * breath));
        pose.set_rotation(Joint::RightArm, Vector3::new(0.0, 0.0, -0.02 * breath));
    }
}

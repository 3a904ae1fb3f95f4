use crate::action::Action;
use feral_ecs::components::archetype::AttackStyle;
use feral_ecs::components::behavior::BehaviorIntent;

/// Full-body states that replace every layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Override {
    Ragdoll,
    /// Falling over, `progress` from `0.0` standing to `1.0` on the side.
    Death { progress: f32 },
    LedgeClimb { progress: f32 },
    ItemPickup { progress: f32 },
}

/// Body state the animator reacts to for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateFlags {
    pub grounded: bool,
    pub jumping: bool,
    /// Upper-body action and how far through it the body is, `0.0..=1.0`.
    pub action: Option<(Action, f32)>,
    pub full_body: Option<Override>,
}

impl StateFlags {
    pub fn grounded() -> Self {
        Self {
            grounded: true,
            ..Self::default()
        }
    }

    pub fn with_action(mut self, action: Action, progress: f32) -> Self {
        self.action = Some((action, progress.clamp(0.0, 1.0)));
        self
    }

    pub fn with_override(mut self, state: Override) -> Self {
        self.full_body = Some(state);
        self
    }
}

impl From<AttackStyle> for Action {
    fn from(style: AttackStyle) -> Self {
        match style {
            AttackStyle::Swing => Action::Swing,
            AttackStyle::BowDraw => Action::BowDraw,
            AttackStyle::SpellCast => Action::SpellCast,
        }
    }
}

impl From<&BehaviorIntent> for StateFlags {
    fn from(intent: &BehaviorIntent) -> Self {
        let mut flags = StateFlags::grounded();

        if intent.dead {
            // Creatures report death once, the fall itself is driven by the caller.
            return flags.with_override(Override::Death { progress: 1.0 });
        }
        if intent.attacking {
            flags = flags.with_action(intent.attack_style.into(), intent.attack_progress);
        }
        flags
    }
}

use crate::Entity;
use crate::components::Tick;
use crate::components::behavior::{Behavior, TickContext, TickReport};
use crate::components::fsm::BehaviorPhase;
use crate::components::lifecycle::{DamageOutcome, Vitals};
use crate::components::targets::{TargetKind, TargetSnapshot};
use crate::components::transforms::Pos3;
use feral_core::Dt;
use log::info;

/// A creature in the world: a behavior plus the vitals it lives and dies by.
#[derive(Debug)]
pub struct Creature {
    id: Entity,
    name: String,
    behavior: Box<dyn Behavior>,
    vitals: Vitals,
}

impl Creature {
    /// Creates a new creature.
    ///
    /// # Arguments
    ///
    /// * `id` - The entity identifier.
    /// * `name` - Display name used in logs.
    /// * `behavior` - The behavior driving the creature.
    /// * `vitals` - Health and corpse state.
    ///
    /// # Returns
    ///
    /// A new [`Creature`] instance.
    pub fn new(
        id: Entity,
        name: impl Into<String>,
        behavior: Box<dyn Behavior>,
        vitals: Vitals,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            behavior,
            vitals,
        }
    }

    pub fn id(&self) -> Entity {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn behavior(&self) -> &dyn Behavior {
        self.behavior.as_ref()
    }

    pub fn vitals(&self) -> &Vitals {
        &self.vitals
    }

    pub fn phase(&self) -> BehaviorPhase {
        self.behavior.phase()
    }

    pub fn transform(&self) -> Pos3 {
        self.behavior.transform()
    }

    pub fn is_dead(&self) -> bool {
        self.vitals.is_dead()
    }

    /// Advances vitals timers and the behavior by one tick.
    pub fn update(&mut self, ctx: &TickContext<'_>, dt: Dt) -> TickReport {
        self.vitals.on_tick(dt);
        self.behavior.update(ctx, dt)
    }

    /// Applies damage, forcing the behavior into its terminal phase on a kill.
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        let outcome = self.vitals.take_damage(amount);
        if outcome == DamageOutcome::Killed {
            info!("{} {} killed", self.name, self.id);
            self.behavior.force_dead();
        }
        outcome
    }

    /// Kills the creature outright.
    ///
    /// # Returns
    ///
    /// `false` if it was already dead.
    pub fn die(&mut self) -> bool {
        if !self.vitals.die() {
            return false;
        }
        self.behavior.force_dead();
        true
    }

    /// Harvests the corpse. See [`Vitals::mark_as_skinned`].
    pub fn mark_as_skinned(&mut self) -> bool {
        self.vitals.mark_as_skinned()
    }

    /// What other creatures see of this one.
    pub fn snapshot(&self) -> TargetSnapshot {
        TargetSnapshot {
            id: self.id,
            position: self.behavior.transform().pos,
            is_dead: self.vitals.is_dead(),
            kind: TargetKind::Creature,
            faction: self.behavior.archetype().faction,
        }
    }
}

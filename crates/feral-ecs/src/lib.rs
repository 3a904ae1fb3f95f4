//! Creature behavior, steering and lifecycle for the feral engine.
//!
//! The crate is organised around plain components owned by a [`creature::Creature`]:
//! a [`components::behavior::BehaviorController`] that runs the combat state machine,
//! the collision and steering kernels it moves with, and the
//! [`components::lifecycle::Vitals`] that track damage and death.
//! A [`world::World`] owns creatures and ticks them against read-only snapshots.

#![forbid(unsafe_code)]

pub mod components;
pub mod creature;
pub mod errors;
pub mod intents;
pub mod utils;
pub mod world;

/// Marker trait for data owned by an entity.
pub trait Component: Send + Sync + 'static {}

/// Identifier of an entity inside a [`world::World`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Entity(pub u32);

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub mod prelude {
    pub use crate::components::archetype::{
        ArchetypeDescriptor, AttackStyle, DeathStyle, Faction, LootMaterial, PhaseLabels,
    };
    pub use crate::components::behavior::{
        Behavior, BehaviorController, BehaviorIntent, Hit, TickContext, TickReport,
    };
    pub use crate::components::collision::{
        AABBCollisionBox, AnalyticTerrain, CollisionQuery, FlatTerrain, Footprint, Obstacle,
        ObstacleKind, Terrain, WorldBounds,
    };
    pub use crate::components::fsm::{BehaviorPhase, PhaseMachine, StateIdentifier};
    pub use crate::components::lifecycle::{DamageOutcome, Tint, Vitals};
    pub use crate::components::targets::{Observer, TargetKind, TargetSnapshot, acquire_target};
    pub use crate::components::Tick;
    pub use crate::components::transforms::Pos3;
    pub use crate::creature::Creature;
    pub use crate::errors::{SimulationError, SimulationResult};
    pub use crate::intents::{Intent, IntentReceiver, IntentSender, create_intent_channel};
    pub use crate::utils::CreatureBuilder;
    pub use crate::world::World;
    pub use crate::{Component, Entity};
}

use crate::Entity;
use crate::components::behavior::{TickContext, TickReport};
use crate::components::collision::{CollisionQuery, Obstacle};
use crate::components::lifecycle::DamageOutcome;
use crate::components::targets::TargetSnapshot;
use crate::creature::Creature;
use crate::errors::{SimulationError, SimulationResult};
use crate::intents::{Intent, IntentReceiver, IntentSender, create_intent_channel};
use feral_core::Dt;
use feral_core::config::{Config, WorldConfig};
use log::{debug, trace};

/// Owns the creatures, the static geometry and the event channel of a simulation.
///
/// Each [`World::tick`] first freezes the positions of every actor into a
/// snapshot list and only then updates the creatures against it, so no
/// creature ever sees another one half way through its tick.
#[derive(Debug)]
pub struct World {
    seed: u64,
    next_id: u32,
    query: CollisionQuery,
    obstacles: Vec<Obstacle>,
    creatures: Vec<Creature>,
    /// Actors the world does not own, such as players, updated by the caller.
    external: Vec<TargetSnapshot>,
    snapshots: Vec<TargetSnapshot>,
    sender: IntentSender,
    receiver: IntentReceiver,
    ticks: u64,
}

impl World {
    /// Creates an empty world.
    ///
    /// # Arguments
    ///
    /// * `config` - Bounds and terrain.
    /// * `seed` - Root seed every creature's random source is derived from.
    ///
    /// # Returns
    ///
    /// The world, or [`SimulationError::InvalidBounds`].
    pub fn new(config: &WorldConfig, seed: u64) -> SimulationResult<Self> {
        let query = CollisionQuery::from_config(config)?;
        let (sender, receiver) = create_intent_channel();

        Ok(Self {
            seed,
            next_id: 0,
            query,
            obstacles: Vec::new(),
            creatures: Vec::new(),
            external: Vec::new(),
            snapshots: Vec::new(),
            sender,
            receiver,
            ticks: 0,
        })
    }

    pub fn from_config(config: &Config) -> SimulationResult<Self> {
        Self::new(&config.world, config.seed)
    }

    /// Reserves a new entity identifier.
    pub fn create_entity(&mut self) -> Entity {
        let entity = Entity(self.next_id);
        self.next_id += 1;
        entity
    }

    /// Seed for the random source of `entity`, stable for a given world seed.
    pub fn seed_for(&self, entity: Entity) -> u64 {
        self.seed ^ u64::from(entity.0).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
    }

    pub fn query(&self) -> &CollisionQuery {
        &self.query
    }

    pub fn add_obstacle(&mut self, obstacle: Obstacle) {
        self.obstacles.push(obstacle);
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn sender(&self) -> IntentSender {
        self.sender.clone()
    }

    pub fn receiver(&self) -> IntentReceiver {
        self.receiver.clone()
    }

    /// Takes every pending event.
    pub fn drain_intents(&self) -> Vec<Intent> {
        self.receiver.try_recv_all()
    }

    pub(crate) fn insert(&mut self, creature: Creature) {
        self.creatures.push(creature);
    }

    pub fn creatures(&self) -> &[Creature] {
        &self.creatures
    }

    pub fn creature(&self, entity: Entity) -> Option<&Creature> {
        self.creatures.iter().find(|c| c.id() == entity)
    }

    pub fn creature_mut(&mut self, entity: Entity) -> Option<&mut Creature> {
        self.creatures.iter_mut().find(|c| c.id() == entity)
    }

    /// Removes a creature, typically a harvested corpse.
    pub fn remove(&mut self, entity: Entity) -> SimulationResult<Creature> {
        let index = self
            .creatures
            .iter()
            .position(|c| c.id() == entity)
            .ok_or(SimulationError::UnknownEntity(entity))?;
        debug!("Removing {} {entity}", self.creatures[index].name());
        Ok(self.creatures.remove(index))
    }

    /// Replaces or adds the snapshot of an actor the world does not own.
    pub fn set_external(&mut self, snapshot: TargetSnapshot) {
        match self.external.iter_mut().find(|s| s.id == snapshot.id) {
            Some(existing) => *existing = snapshot,
            None => self.external.push(snapshot),
        }
    }

    pub fn clear_external(&mut self) {
        self.external.clear();
    }

    /// Snapshot list the last tick was run against.
    pub fn snapshots(&self) -> &[TargetSnapshot] {
        &self.snapshots
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Advances every creature by one tick.
    ///
    /// # Arguments
    ///
    /// * `dt` - Duration of the tick.
    ///
    /// # Returns
    ///
    /// The report of every creature, in update order.
    pub fn tick(&mut self, dt: Dt) -> Vec<(Entity, TickReport)> {
        self.snapshots.clear();
        self.snapshots.extend(self.external.iter().copied());
        self.snapshots.extend(self.creatures.iter().map(Creature::snapshot));

        let World {
            creatures,
            query,
            obstacles,
            snapshots,
            ..
        } = &mut *self;
        let ctx = TickContext::new(query, obstacles, snapshots);

        let reports = creatures
            .iter_mut()
            .map(|creature| (creature.id(), creature.update(&ctx, dt)))
            .collect();

        self.ticks += 1;
        trace!("Tick {} done for {} creatures", self.ticks, self.creatures.len());
        reports
    }

    /// Damages a creature owned by the world and reports its death.
    pub fn apply_damage(&mut self, entity: Entity, amount: f32) -> SimulationResult<DamageOutcome> {
        let creature = self
            .creature_mut(entity)
            .ok_or(SimulationError::UnknownEntity(entity))?;
        let outcome = creature.take_damage(amount);

        if outcome == DamageOutcome::Killed {
            self.sender.send_died(entity);
        }
        Ok(outcome)
    }

    /// Harvests a corpse owned by the world.
    pub fn skin(&mut self, entity: Entity) -> SimulationResult<bool> {
        let creature = self
            .creature_mut(entity)
            .ok_or(SimulationError::UnknownEntity(entity))?;
        Ok(creature.mark_as_skinned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::archetype::ArchetypeDescriptor;
    use crate::components::fsm::BehaviorPhase;
    use crate::utils::CreatureBuilder;
    use cgmath::Vector3;
    use std::time::Duration;

    fn world() -> World {
        World::new(&WorldConfig::square(40.0), 42).unwrap()
    }

    fn dt() -> Dt {
        Duration::from_secs_f32(1.0 / 60.0)
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        assert!(matches!(
            World::new(&WorldConfig::square(-1.0), 1),
            Err(SimulationError::InvalidBounds(_))
        ));
    }

    #[test]
    fn test_tick_uses_previous_positions() {
        let mut world = world();
        let wolf = CreatureBuilder::new(&mut world).at(0.0, 0.0).build().unwrap();
        let goblin = CreatureBuilder::new(&mut world)
            .archetype(ArchetypeDescriptor::goblin())
            .at(30.0, 30.0)
            .build()
            .unwrap();

        for _ in 0..5 {
            let before: Vec<_> = [wolf, goblin]
                .iter()
                .map(|e| world.creature(*e).unwrap().transform().pos)
                .collect();
            world.tick(dt());

            let seen: Vec<_> = world.snapshots().iter().map(|s| s.position).collect();
            assert_eq!(seen, before);
        }
    }

    #[test]
    fn test_external_target_is_hunted() {
        let mut world = world();
        let wolf = CreatureBuilder::new(&mut world).at(0.0, 0.0).build().unwrap();
        world.set_external(TargetSnapshot::player(Entity(1000), Vector3::new(8.0, 0.0, 0.0)));

        world.tick(dt());
        assert_eq!(world.creature(wolf).unwrap().phase(), BehaviorPhase::Pursue);

        world.clear_external();
        world.tick(dt());
        assert_eq!(world.creature(wolf).unwrap().phase(), BehaviorPhase::Patrol);
    }

    #[test]
    fn test_rival_factions_fight() {
        let mut world = world();
        let wolf = CreatureBuilder::new(&mut world).at(0.0, 0.0).build().unwrap();
        let goblin = CreatureBuilder::new(&mut world)
            .archetype(ArchetypeDescriptor::goblin())
            .at(3.0, 0.0)
            .build()
            .unwrap();

        let mut hits = Vec::new();
        for _ in 0..(60 * 15) {
            world.tick(dt());
            for intent in world.drain_intents() {
                if let Intent::HitLanded { target, damage, .. } = intent {
                    hits.push(target);
                    let _ = world.apply_damage(target, damage);
                }
            }
        }

        assert!(hits.contains(&wolf) || hits.contains(&goblin));
    }

    #[test]
    fn test_apply_damage_reports_death() {
        let mut world = world();
        let wolf = CreatureBuilder::new(&mut world).at(0.0, 0.0).build().unwrap();

        let outcome = world.apply_damage(wolf, 1000.0).unwrap();
        assert_eq!(outcome, DamageOutcome::Killed);
        assert_eq!(world.drain_intents(), vec![Intent::Died { entity: wolf }]);

        assert_eq!(world.apply_damage(wolf, 5.0).unwrap(), DamageOutcome::Ignored);
        assert!(world.drain_intents().is_empty());

        assert!(world.skin(wolf).unwrap());
        assert!(!world.skin(wolf).unwrap());
        assert!(world.remove(wolf).is_ok());
    }

    #[test]
    fn test_unknown_entity() {
        let mut world = world();
        assert!(matches!(
            world.apply_damage(Entity(77), 1.0),
            Err(SimulationError::UnknownEntity(Entity(77)))
        ));
        assert!(world.remove(Entity(77)).is_err());
        assert!(world.skin(Entity(77)).is_err());
    }

    #[test]
    fn test_seeds_differ_per_entity() {
        let world = world();
        assert_ne!(world.seed_for(Entity(0)), world.seed_for(Entity(1)));
        assert_eq!(world.seed_for(Entity(5)), world.seed_for(Entity(5)));
    }
}

use crate::Entity;
use crate::components::archetype::ArchetypeDescriptor;
use crate::components::behavior::BehaviorController;
use crate::components::collision::footprint_margin;
use crate::components::lifecycle::Vitals;
use crate::creature::Creature;
use crate::errors::{SimulationError, SimulationResult};
use crate::world::World;
use cgmath::Vector3;
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Builder for spawning creatures into a [`World`].
pub struct CreatureBuilder<'a> {
    /// The world to spawn the creature in.
    world: &'a mut World,
    archetype: Option<ArchetypeDescriptor>,
    name: Option<String>,
    x: f32,
    z: f32,
    yaw: f32,
    seed: Option<u64>,
}

impl<'a> CreatureBuilder<'a> {
    /// Creates a new builder instance.
    ///
    /// # Arguments
    ///
    /// * `world` - The world to spawn the creature in.
    ///
    /// # Returns
    ///
    /// A new [`CreatureBuilder`] instance.
    pub fn new(world: &'a mut World) -> Self {
        Self {
            world,
            archetype: None,
            name: None,
            x: 0.0,
            z: 0.0,
            yaw: 0.0,
            seed: None,
        }
    }

    pub fn archetype(mut self, archetype: ArchetypeDescriptor) -> Self {
        self.archetype = Some(archetype);
        self
    }

    /// Display name, defaults to the archetype name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Spawn point on the XZ plane. The height is taken from the ground.
    pub fn at(mut self, x: f32, z: f32) -> Self {
        self.x = x;
        self.z = z;
        self
    }

    pub fn facing(mut self, yaw: f32) -> Self {
        self.yaw = yaw;
        self
    }

    /// Overrides the seed the world would derive for this creature.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validates the spawn and adds the creature to the world.
    ///
    /// # Returns
    ///
    /// The new [`Entity`], or an error if the archetype is inconsistent or the
    /// spawn point is outside the world or inside an obstacle.
    pub fn build(self) -> SimulationResult<Entity> {
        let archetype = self.archetype.unwrap_or_else(|| {
            warn!("No archetype given, spawning a wolf...");
            ArchetypeDescriptor::wolf()
        });
        archetype.validate()?;
        let name = self.name.unwrap_or_else(|| archetype.name.clone());

        let world = self.world;
        let size = archetype.collision_size;
        let terrain = world.query().terrain_height(self.x, self.z);
        let mut position = Vector3::new(self.x, terrain, self.z);
        if !world.query().is_within_bounds(position, footprint_margin(size)) {
            return Err(SimulationError::InvalidSpawn {
                name,
                reason: format!("({}, {}) is outside the world", self.x, self.z),
            });
        }
        position.y = world.query().get_ground_height(position, world.obstacles());
        if world.query().check_box_collision(position, size, world.obstacles()) {
            return Err(SimulationError::InvalidSpawn {
                name,
                reason: format!("({}, {}) is inside an obstacle", self.x, self.z),
            });
        }

        let entity = world.create_entity();
        let seed = self.seed.unwrap_or_else(|| world.seed_for(entity));
        let vitals = Vitals::from_archetype(&archetype);
        let rng = StdRng::seed_from_u64(seed);
        let mut controller = BehaviorController::new(entity, archetype, position, self.yaw, rng)?
            .with_sender(world.sender());
        controller.snap_to_ground(world.query(), world.obstacles());

        info!(
            "Spawned {name} {entity} at ({:.1}, {:.1}, {:.1})",
            position.x, position.y, position.z
        );
        world.insert(Creature::new(entity, name, Box::new(controller), vitals));
        Ok(entity)
    }
}

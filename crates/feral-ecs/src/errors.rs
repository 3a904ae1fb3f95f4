use crate::Entity;
use thiserror::Error;

/// Errors reported by the simulation API.
///
/// Nothing inside a tick fails: degenerate input degrades gracefully. These
/// errors cover misuse at the boundary, such as spawning an inconsistent
/// archetype or addressing an entity the world does not own.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The entity is not owned by the world.
    #[error("Unknown entity: {0}")]
    UnknownEntity(Entity),
    /// An archetype descriptor violates one of its constraints.
    #[error("Invalid archetype '{name}': {reason}")]
    InvalidArchetype {
        /// Name of the offending archetype.
        name: String,
        /// Which constraint failed.
        reason: String,
    },
    /// The world bounds cannot be used for containment tests.
    #[error("Invalid world bounds: {0}")]
    InvalidBounds(String),
    /// A spawn position is outside the world or inside an obstacle.
    #[error("Invalid spawn position for '{name}': {reason}")]
    InvalidSpawn {
        /// Name of the creature being spawned.
        name: String,
        /// Why the position was rejected.
        reason: String,
    },
}

/// Type alias for a result type that can contain a [`SimulationError`].
pub type SimulationResult<T> = Result<T, SimulationError>;

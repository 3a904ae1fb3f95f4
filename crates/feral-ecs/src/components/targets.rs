use super::archetype::Faction;
use crate::Entity;
use cgmath::Vector3;
use feral_core::horizontal_distance;

/// What kind of actor a target is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    Player,
    Creature,
    Npc,
}

/// Read-only view of a potential target, taken from the previous tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    pub id: Entity,
    pub position: Vector3<f32>,
    pub is_dead: bool,
    pub kind: TargetKind,
    pub faction: Faction,
}

impl TargetSnapshot {
    /// Snapshot of a living player.
    pub fn player(id: Entity, position: Vector3<f32>) -> Self {
        Self {
            id,
            position,
            is_dead: false,
            kind: TargetKind::Player,
            faction: Faction::Player,
        }
    }

    pub fn new(id: Entity, position: Vector3<f32>, kind: TargetKind, faction: Faction) -> Self {
        Self {
            id,
            position,
            is_dead: false,
            kind,
            faction,
        }
    }

    pub fn dead(mut self) -> Self {
        self.is_dead = true;
        self
    }

    fn is_well_formed(&self) -> bool {
        self.position.x.is_finite() && self.position.y.is_finite() && self.position.z.is_finite()
    }
}

/// Who is looking for a target and how far they look.
#[derive(Debug, Clone, Copy)]
pub struct Observer {
    pub id: Entity,
    pub faction: Faction,
    pub position: Vector3<f32>,
    /// Weighted distance under which a new target is eligible.
    pub radius: f32,
    /// The target currently hunted, kept up to `tracking_radius`.
    pub tracked: Option<Entity>,
    pub tracking_radius: f32,
    /// Multiplier applied to the distance of anything that is not a player.
    pub non_player_weight: f32,
}

impl Observer {
    /// Distance used for ranking, with non-player targets pushed further away.
    pub fn weighted_distance(&self, target: &TargetSnapshot) -> f32 {
        let distance = horizontal_distance(self.position, target.position);
        match target.kind {
            TargetKind::Player => distance,
            TargetKind::Creature | TargetKind::Npc => distance * self.non_player_weight,
        }
    }

    /// Largest weighted distance at which `target` stays eligible.
    pub fn radius_for(&self, target: &TargetSnapshot) -> f32 {
        if self.tracked == Some(target.id) {
            self.tracking_radius.max(self.radius)
        } else {
            self.radius
        }
    }

    /// Whether the snapshot may be hunted at all, regardless of distance.
    pub fn can_target(&self, target: &TargetSnapshot) -> bool {
        !target.is_dead
            && target.id != self.id
            && target.faction != self.faction
            && target.is_well_formed()
    }
}

/// Picks the nearest eligible target inside the observer's radius.
///
/// # Arguments
///
/// * `observer` - The entity looking for a target.
/// * `targets` - Snapshot list of the previous tick.
///
/// # Returns
///
/// The target with the smallest weighted distance, if any is inside its radius.
/// Only the tracked target gets the wider tracking radius. On equal distances
/// the earlier snapshot wins.
pub fn acquire_target<'a>(
    observer: &Observer,
    targets: &'a [TargetSnapshot],
) -> Option<&'a TargetSnapshot> {
    targets
        .iter()
        .filter(|t| observer.can_target(t))
        .map(|t| (observer.weighted_distance(t), t))
        .filter(|(distance, t)| *distance <= observer.radius_for(t))
        .fold(None, |best: Option<(f32, &TargetSnapshot)>, (distance, t)| match best {
            Some((best_distance, _)) if best_distance <= distance => best,
            _ => Some((distance, t)),
        })
        .map(|(_, t)| t)
}

/// Finds the snapshot of a specific entity.
pub fn find_target(targets: &[TargetSnapshot], id: Entity) -> Option<&TargetSnapshot> {
    targets.iter().find(|t| t.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wolf_at_origin(radius: f32) -> Observer {
        Observer {
            id: Entity(1),
            faction: Faction::Wild,
            position: Vector3::new(0.0, 0.0, 0.0),
            radius,
            tracked: None,
            tracking_radius: radius,
            non_player_weight: 1.5,
        }
    }

    #[test]
    fn test_target_outside_radius_ignored() {
        let targets = [TargetSnapshot::player(Entity(9), Vector3::new(30.0, 0.0, 0.0))];
        assert!(acquire_target(&wolf_at_origin(18.0), &targets).is_none());
    }

    #[test]
    fn test_nearest_target_wins() {
        let targets = [
            TargetSnapshot::player(Entity(9), Vector3::new(10.0, 0.0, 0.0)),
            TargetSnapshot::player(Entity(10), Vector3::new(0.0, 0.0, -6.0)),
        ];
        let found = acquire_target(&wolf_at_origin(18.0), &targets).unwrap();
        assert_eq!(found.id, Entity(10));
    }

    #[test]
    fn test_skips_dead_self_and_allies() {
        let targets = [
            TargetSnapshot::player(Entity(9), Vector3::new(1.0, 0.0, 0.0)).dead(),
            TargetSnapshot::new(
                Entity(1),
                Vector3::new(0.5, 0.0, 0.0),
                TargetKind::Creature,
                Faction::Goblinoid,
            ),
            TargetSnapshot::new(
                Entity(3),
                Vector3::new(2.0, 0.0, 0.0),
                TargetKind::Creature,
                Faction::Wild,
            ),
            TargetSnapshot::player(Entity(4), Vector3::new(f32::NAN, 0.0, 0.0)),
        ];
        assert!(acquire_target(&wolf_at_origin(18.0), &targets).is_none());
    }

    #[test]
    fn test_non_player_distance_is_weighted() {
        let targets = [
            TargetSnapshot::new(
                Entity(5),
                Vector3::new(8.0, 0.0, 0.0),
                TargetKind::Npc,
                Faction::Villager,
            ),
            TargetSnapshot::player(Entity(6), Vector3::new(11.0, 0.0, 0.0)),
        ];
        // the villager is closer, but 8 * 1.5 = 12 ranks it behind the player
        let found = acquire_target(&wolf_at_origin(18.0), &targets).unwrap();
        assert_eq!(found.id, Entity(6));

        // weighted out of range on its own
        let lone = [targets[0]];
        assert!(acquire_target(&wolf_at_origin(11.0), &lone).is_none());
    }

    #[test]
    fn test_tracking_radius_only_covers_tracked_target() {
        let observer = Observer {
            tracked: Some(Entity(9)),
            tracking_radius: 26.0,
            ..wolf_at_origin(18.0)
        };
        let tracked = TargetSnapshot::player(Entity(9), Vector3::new(22.0, 0.0, 0.0));
        let stranger = TargetSnapshot::player(Entity(10), Vector3::new(0.0, 0.0, 20.0));

        // the stranger is nearer but was never inside the awareness radius
        let both = [stranger, tracked];
        assert_eq!(acquire_target(&observer, &both).map(|t| t.id), Some(Entity(9)));

        let after_death = [stranger, tracked.dead()];
        assert!(acquire_target(&observer, &after_death).is_none());
    }

    #[test]
    fn test_empty_list() {
        assert!(acquire_target(&wolf_at_origin(18.0), &[]).is_none());
        assert!(find_target(&[], Entity(1)).is_none());
    }
}

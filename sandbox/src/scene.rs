use anyhow::Context;
use cgmath::{Vector2, Vector3};
use feral_ecs::prelude::*;
use rand::Rng;
use rand::rngs::StdRng;

/// Scatters trees, rocks and a wooden deck over the world.
pub fn populate_obstacles(world: &mut World, rng: &mut StdRng) {
    let half = world.query().bounds().extent().1.x * 0.9;

    for _ in 0..24 {
        let center = Vector2::new(rng.random_range(-half..half), rng.random_range(-half..half));
        if center.x.abs() < 6.0 && center.y.abs() < 6.0 {
            continue;
        }
        let base = world.query().terrain_height(center.x, center.y);
        let tree = Obstacle::hard_cylinder(center, rng.random_range(0.3..0.7), 6.0, base);
        world.add_obstacle(if rng.random::<f32>() < 0.3 { tree.as_landmark() } else { tree });
    }

    for _ in 0..10 {
        let center = Vector2::new(rng.random_range(-half..half), rng.random_range(-half..half));
        let base = world.query().terrain_height(center.x, center.y);
        let size = Vector3::new(
            rng.random_range(1.0..3.0),
            rng.random_range(0.5..1.5),
            rng.random_range(1.0..3.0),
        );
        world.add_obstacle(Obstacle::hard_box(center, size, base));
    }

    for _ in 0..6 {
        let center = Vector2::new(rng.random_range(-half..half), rng.random_range(-half..half));
        let base = world.query().terrain_height(center.x, center.y);
        let bush = Obstacle::hard_cylinder(center, 1.2, 1.0, base).with_kind(ObstacleKind::Soft);
        world.add_obstacle(bush);
    }

    world.add_obstacle(Obstacle::ground_platform(Vector2::new(-12.0, 12.0), 6.0, 4.0, 0.4, 0.4));
}

/// Spawns a few packs of every preset, retrying points that land inside obstacles.
pub fn populate_creatures(world: &mut World, rng: &mut StdRng) -> anyhow::Result<Vec<Entity>> {
    let half = world.query().bounds().extent().1.x * 0.8;
    let packs = [
        ("wolf", 3),
        ("bear", 1),
        ("boar", 2),
        ("spider", 2),
        ("goblin", 3),
        ("skeleton_archer", 2),
        ("forest_spirit", 1),
    ];

    let mut spawned = Vec::new();
    for (preset, count) in packs {
        let archetype = ArchetypeDescriptor::preset(preset)
            .with_context(|| format!("Unknown archetype preset {preset}"))?;
        let den = Vector2::new(rng.random_range(-half..half), rng.random_range(-half..half));

        for n in 0..count {
            let entity = (0..8).find_map(|_| {
                let x = den.x + rng.random_range(-3.0..3.0);
                let z = den.y + rng.random_range(-3.0..3.0);
                CreatureBuilder::new(world)
                    .archetype(archetype.clone())
                    .named(format!("{preset}_{n}"))
                    .at(x, z)
                    .facing(rng.random_range(-std::f32::consts::PI..std::f32::consts::PI))
                    .build()
                    .ok()
            });

            match entity {
                Some(entity) => spawned.push(entity),
                None => log::warn!("Could not find room for {preset}_{n}"),
            }
        }
    }

    Ok(spawned)
}

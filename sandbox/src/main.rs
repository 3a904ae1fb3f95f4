mod scene;

use cgmath::{Vector2, Vector3};
use env_logger::Env;
use feral_animation::{Animator, Override, StateFlags};
use feral_core::config::{Config, Pond};
use feral_ecs::prelude::*;
use log::{debug, info};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::collections::HashMap;

const PLAYER: Entity = Entity(u32::MAX);
const PLAYER_MAX_HEALTH: f32 = 150.0;
/// Radius of the circle the scripted player walks.
const PLAYER_ORBIT: f32 = 20.0;
const PLAYER_SPEED: f32 = 3.0;
const REPORT_EVERY: u64 = 300;

fn main() -> anyhow::Result<()> {
    let env = Env::default()
        .filter_or("RUST_LOG", "info")
        .write_style_or("RUST_LOG_STYLE", "auto");
    env_logger::init_from_env(env);

    let mut config = Config::from_env();
    config.world = config
        .world
        .with_pond(Pond::new(Vector2::new(15.0, -10.0), 6.0, 1.5))
        .with_pond(Pond::new(Vector2::new(-25.0, -20.0), 4.0, 1.0));
    info!(
        "Running {} ticks at {} Hz with seed {}",
        config.ticks, config.tick_rate_hz, config.seed
    );

    let mut world = World::from_config(&config)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    scene::populate_obstacles(&mut world, &mut rng);
    let spawned = scene::populate_creatures(&mut world, &mut rng)?;
    info!("Spawned {} creatures", spawned.len());

    let mut animators: HashMap<Entity, Animator> = spawned
        .iter()
        .map(|e| (*e, Animator::new().with_blink_offset(e.0 as f32 * 1.7)))
        .collect();

    let dt = config.dt();
    let mut player_health = PLAYER_MAX_HEALTH;
    let mut player_angle = 0.0_f32;
    let mut kills = 0;

    for _ in 0..config.ticks {
        player_angle += PLAYER_SPEED / PLAYER_ORBIT * dt.as_secs_f32();
        let (sin, cos) = player_angle.sin_cos();
        let player = Vector3::new(PLAYER_ORBIT * cos, 0.0, PLAYER_ORBIT * sin);
        let snapshot = TargetSnapshot::player(PLAYER, player);
        world.set_external(if player_health > 0.0 { snapshot } else { snapshot.dead() });

        for (entity, report) in world.tick(dt) {
            let Some(animator) = animators.get_mut(&entity) else {
                continue;
            };
            let mut flags = StateFlags::from(&report.intent);
            if report.intent.dead
                && let Some(creature) = world.creature(entity)
            {
                flags.full_body = Some(Override::Death {
                    progress: creature.vitals().death_progress(),
                });
            }
            let movement = Vector2::new(report.intent.speed, 0.0);
            animator.animate(&flags, dt, movement, report.intent.running);
        }

        for intent in world.drain_intents() {
            match intent {
                Intent::HitLanded { attacker, target, damage } if target == PLAYER => {
                    player_health = (player_health - damage).max(0.0);
                    debug!("{attacker} hit the player for {damage:.0}, {player_health:.0} left");
                }
                Intent::HitLanded { target, damage, .. } => {
                    if world.apply_damage(target, damage)? == DamageOutcome::Killed {
                        kills += 1;
                    }
                }
                Intent::Died { entity } => info!("{entity} died"),
                Intent::Teleported { entity, from, to } => {
                    info!(
                        "{entity} freed itself from ({:.1}, {:.1}) to ({:.1}, {:.1})",
                        from.x, from.z, to.x, to.z
                    )
                }
            }
        }

        if world.tick_count() % REPORT_EVERY == 0 {
            report(&world, player_health);
        }
    }

    let corpses: Vec<Entity> =
        world.creatures().iter().filter(|c| c.is_dead()).map(Creature::id).collect();
    for entity in corpses {
        let material = world.creature(entity).and_then(|c| c.vitals().lootable());
        if let Some(material) = material
            && world.skin(entity)?
        {
            let creature = world.remove(entity)?;
            animators.remove(&entity);
            info!("Harvested {material} from {} {entity}", creature.name());
        }
    }

    info!(
        "Done after {} ticks: {kills} kills, {} creatures left, player at {player_health:.0}/{PLAYER_MAX_HEALTH:.0}",
        world.tick_count(),
        world.creatures().len()
    );
    Ok(())
}

fn report(world: &World, player_health: f32) {
    let mut phases: HashMap<BehaviorPhase, usize> = HashMap::new();
    for creature in world.creatures() {
        *phases.entry(creature.phase()).or_default() += 1;
    }

    let mut summary: Vec<_> = phases.into_iter().collect();
    summary.sort_by_key(|(phase, _)| phase.to_string());
    let summary: Vec<String> = summary.iter().map(|(phase, n)| format!("{phase}={n}")).collect();
    info!(
        "Tick {}: {} | player {player_health:.0}",
        world.tick_count(),
        summary.join(" ")
    );
}

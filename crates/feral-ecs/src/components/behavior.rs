//! The per-creature combat and patrol controller.
//!
//! One [`BehaviorController`] drives one creature. Every tick runs in a fixed
//! order: target acquisition, phase transitions, movement, then the animation
//! intent is assembled from the resulting state. Archetype differences are
//! pure data carried by the [`ArchetypeDescriptor`].

use super::archetype::{ArchetypeDescriptor, AttackStyle};
use super::collision::{CollisionQuery, Obstacle, footprint_margin};
use super::fsm::{BehaviorPhase, PhaseMachine};
use super::steering::{
    avoidance_steering, next_position, next_position_with_velocity, smooth_damp, smooth_look_at,
    turn_towards,
};
use super::targets::{Observer, TargetSnapshot, acquire_target};
use super::transforms::Pos3;
use crate::errors::SimulationResult;
use crate::intents::IntentSender;
use crate::{Component, Entity};
use cgmath::{InnerSpace, Vector3};
use feral_core::{Dt, POSITION_EPSILON, heading_to, horizontal_distance, wrap_angle};
use feral_macro::Component;
use log::{debug, info, trace, warn};
use rand::Rng;
use rand::rngs::StdRng;
use std::f32::consts::{FRAC_PI_4, PI, TAU};

/// Distance at which a patrol waypoint counts as reached.
pub const WAYPOINT_REACHED_RADIUS: f32 = 1.5;
/// Stuck time after which the route is regenerated, and the interval between regenerations.
pub const SOFT_REPATH_AFTER: f32 = 1.5;
/// Stuck time after which the creature is teleported to a free spot.
pub const TELEPORT_AFTER: f32 = 10.0;
/// Extra distance beyond `attack_range` at which a strike still connects.
pub const ATTACK_REACH: f32 = 0.5;

/// Share of the commanded step that has to be covered to not count as stuck.
const STUCK_PROGRESS_RATIO: f32 = 0.1;
const VERTICAL_SMOOTH_TIME: f32 = 0.12;
/// Ground speed under which the body is considered standing.
const MOVING_SPEED: f32 = 0.05;

/// Read-only inputs shared by every creature during a tick.
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub query: &'a CollisionQuery,
    pub obstacles: &'a [Obstacle],
    /// Positions of the previous tick.
    pub targets: &'a [TargetSnapshot],
}

impl<'a> TickContext<'a> {
    pub fn new(
        query: &'a CollisionQuery,
        obstacles: &'a [Obstacle],
        targets: &'a [TargetSnapshot],
    ) -> Self {
        Self {
            query,
            obstacles,
            targets,
        }
    }
}

/// A strike that connected. Resolving the damage is up to the caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub target: Entity,
    pub damage: f32,
}

/// What the animation layer needs to know about a creature this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BehaviorIntent {
    pub phase: BehaviorPhase,
    /// Archetype name of the phase.
    pub label: &'static str,
    /// Seconds spent in the phase.
    pub state_timer: f32,
    /// Measured horizontal speed.
    pub speed: f32,
    pub moving: bool,
    pub running: bool,
    pub attacking: bool,
    /// `0.0..=1.0` through the current strike.
    pub attack_progress: f32,
    pub attack_style: AttackStyle,
    pub combo: u32,
    pub dead: bool,
}

/// Output of a single [`Behavior::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    pub transform: Pos3,
    pub intent: BehaviorIntent,
    pub hit: Option<Hit>,
}

/// Autonomous behavior owned by a creature.
pub trait Behavior: std::fmt::Debug + Send + Sync {
    /// Advances the behavior by one tick.
    fn update(&mut self, ctx: &TickContext<'_>, dt: Dt) -> TickReport;

    /// Moves the behavior into its terminal phase.
    fn force_dead(&mut self);

    fn phase(&self) -> BehaviorPhase;

    fn transform(&self) -> Pos3;

    /// Places the creature somewhere else without running any movement checks.
    fn teleport(&mut self, position: Vector3<f32>);

    /// Animation intent of the current state.
    fn intent(&self) -> BehaviorIntent;

    fn archetype(&self) -> &ArchetypeDescriptor;
}

/// Archetype driven state machine for one creature.
#[derive(Component, Debug)]
pub struct BehaviorController {
    id: Entity,
    archetype: ArchetypeDescriptor,
    transform: Pos3,
    machine: PhaseMachine<BehaviorPhase>,
    attack_cooldown: f32,
    target: Option<Entity>,
    waypoint: Option<Vector3<f32>>,
    patrol_timer: f32,
    /// `1.0` or `-1.0`, direction of the orbit while engaged.
    strafe_sign: f32,
    duel_timer: f32,
    /// Where the current retreat started.
    retreat_origin: Vector3<f32>,
    combo_count: u32,
    hit_fired: bool,
    stuck_timer: f32,
    next_repath_at: f32,
    commanded_speed: f32,
    ground_speed: f32,
    vertical_velocity: f32,
    rng: StdRng,
    sender: Option<IntentSender>,
}

impl BehaviorController {
    /// Creates a controller patrolling from `position`.
    ///
    /// # Arguments
    ///
    /// * `id` - The entity this controller drives.
    /// * `archetype` - Tuning of the creature class. It is validated here.
    /// * `position` - Spawn position, with the height already resolved.
    /// * `yaw` - Initial heading.
    /// * `rng` - Random source for waypoints, duel timers and strafing.
    ///
    /// # Returns
    ///
    /// The controller, or the archetype validation error.
    pub fn new(
        id: Entity,
        archetype: ArchetypeDescriptor,
        position: Vector3<f32>,
        yaw: f32,
        rng: StdRng,
    ) -> SimulationResult<Self> {
        archetype.validate()?;

        Ok(Self {
            id,
            archetype,
            transform: Pos3::new_with_yaw(position, yaw),
            machine: PhaseMachine::new(BehaviorPhase::Patrol),
            attack_cooldown: 0.0,
            target: None,
            waypoint: None,
            patrol_timer: 0.0,
            strafe_sign: 1.0,
            duel_timer: 0.0,
            retreat_origin: position,
            combo_count: 0,
            hit_fired: false,
            stuck_timer: 0.0,
            next_repath_at: SOFT_REPATH_AFTER,
            commanded_speed: 0.0,
            ground_speed: 0.0,
            vertical_velocity: 0.0,
            rng,
            sender: None,
        })
    }

    /// Reports hits and teleports through the given channel as well.
    pub fn with_sender(mut self, sender: IntentSender) -> Self {
        self.sender = Some(sender);
        self
    }

    pub fn id(&self) -> Entity {
        self.id
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn waypoint(&self) -> Option<Vector3<f32>> {
        self.waypoint
    }

    pub fn attack_cooldown(&self) -> f32 {
        self.attack_cooldown
    }

    pub fn combo_count(&self) -> u32 {
        self.combo_count
    }

    pub fn state_timer(&self) -> f32 {
        self.machine.time_in_state()
    }

    pub fn previous_phase(&self) -> Option<BehaviorPhase> {
        self.machine.previous()
    }

    /// Seconds the creature has been commanded to move without making progress.
    pub fn stuck_time(&self) -> f32 {
        self.stuck_timer
    }

    /// Puts the feet on the ground right away. Only meant for spawning.
    pub fn snap_to_ground(&mut self, query: &CollisionQuery, obstacles: &[Obstacle]) {
        self.transform.pos.y = query.get_ground_height(self.transform.pos, obstacles);
        self.vertical_velocity = 0.0;
    }

    fn enter(&mut self, next: BehaviorPhase) {
        let current = self.machine.current();
        if !self.machine.transition_to(next) {
            return;
        }

        debug!(
            "{} {}: {} -> {}",
            self.archetype.name,
            self.id,
            self.archetype.label(current),
            self.archetype.label(next)
        );
        self.reset_stuck();

        match next {
            BehaviorPhase::Engage => {
                let (min, max) = (self.archetype.duel_time_min, self.archetype.duel_time_max);
                self.duel_timer = self.rng.random_range(min..=max);
                self.strafe_sign = if self.rng.random::<bool>() { 1.0 } else { -1.0 };
            }
            BehaviorPhase::Attack => {
                self.combo_count += 1;
                self.hit_fired = false;
            }
            BehaviorPhase::Patrol => {
                self.waypoint = None;
                self.patrol_timer = 0.0;
            }
            BehaviorPhase::Disengage => self.retreat_origin = self.transform.pos,
            BehaviorPhase::Idle | BehaviorPhase::Pursue | BehaviorPhase::Dead => {}
        }
    }

    fn reset_stuck(&mut self) {
        self.stuck_timer = 0.0;
        self.next_repath_at = SOFT_REPATH_AFTER;
    }

    fn ready_to_attack(&self) -> bool {
        self.duel_timer <= 0.0 && self.attack_cooldown <= 0.0
    }

    fn acquire(&mut self, targets: &[TargetSnapshot]) -> Option<TargetSnapshot> {
        let observer = Observer {
            id: self.id,
            faction: self.archetype.faction,
            position: self.transform.pos,
            radius: self.archetype.awareness_radius,
            tracked: self.target,
            tracking_radius: self.archetype.disengage_radius,
            non_player_weight: self.archetype.non_player_weight,
        };

        let found = acquire_target(&observer, targets).copied();
        let acquired = found.map(|t| t.id);
        if acquired != self.target {
            match acquired {
                Some(id) => trace!("{} {} tracks {id}", self.archetype.name, self.id),
                None => trace!("{} {} lost its target", self.archetype.name, self.id),
            }
        }
        self.target = acquired;
        found
    }

    fn update_transitions(
        &mut self,
        tracked: Option<&TargetSnapshot>,
        ctx: &TickContext<'_>,
        dt: f32,
    ) {
        let distance = tracked.map(|t| horizontal_distance(self.transform.pos, t.position));
        let time = self.machine.time_in_state();

        match (self.machine.current(), distance) {
            (BehaviorPhase::Idle | BehaviorPhase::Patrol, Some(_)) => {
                self.enter(BehaviorPhase::Pursue)
            }
            (BehaviorPhase::Idle, None) => {
                if time >= self.archetype.idle_duration {
                    self.enter(BehaviorPhase::Patrol);
                }
            }
            (BehaviorPhase::Patrol, None) => self.update_route(ctx, dt),
            (BehaviorPhase::Pursue | BehaviorPhase::Engage | BehaviorPhase::Disengage, None) => {
                self.enter(BehaviorPhase::Patrol)
            }
            (BehaviorPhase::Pursue, Some(d)) => {
                if d <= self.archetype.engage_radius {
                    self.enter(BehaviorPhase::Engage);
                }
            }
            (BehaviorPhase::Engage, Some(d)) => {
                self.duel_timer = (self.duel_timer - dt).max(0.0);
                if d > self.archetype.engage_exit_radius {
                    self.enter(BehaviorPhase::Pursue);
                } else if self.ready_to_attack() && d <= self.archetype.attack_range {
                    self.combo_count = 0;
                    self.enter(BehaviorPhase::Attack);
                }
            }
            (BehaviorPhase::Attack, _) => {
                if time >= self.archetype.attack_duration {
                    self.finish_attack(distance);
                }
            }
            (BehaviorPhase::Disengage, Some(d)) => {
                let covered = horizontal_distance(self.retreat_origin, self.transform.pos);
                if time >= self.archetype.retreat_duration
                    || covered >= self.archetype.retreat_distance
                {
                    if d <= self.archetype.engage_exit_radius {
                        self.enter(BehaviorPhase::Engage);
                    } else {
                        self.enter(BehaviorPhase::Pursue);
                    }
                }
            }
            (BehaviorPhase::Dead, _) => {}
        }
    }

    fn finish_attack(&mut self, distance: Option<f32>) {
        match distance {
            Some(d)
                if self.combo_count < self.archetype.combo_cap
                    && d <= self.archetype.attack_range =>
            {
                self.enter(BehaviorPhase::Attack);
            }
            Some(_) => {
                self.attack_cooldown = self.archetype.attack_cooldown;
                self.combo_count = 0;
                self.enter(BehaviorPhase::Disengage);
            }
            None => {
                self.attack_cooldown = self.archetype.attack_cooldown;
                self.combo_count = 0;
                self.enter(BehaviorPhase::Patrol);
            }
        }
    }

    fn update_route(&mut self, ctx: &TickContext<'_>, dt: f32) {
        self.patrol_timer += dt;
        let Some(waypoint) = self.waypoint else {
            return;
        };

        if horizontal_distance(self.transform.pos, waypoint) < WAYPOINT_REACHED_RADIUS {
            if self.rng.random::<f32>() < self.archetype.idle_chance {
                self.enter(BehaviorPhase::Idle);
                self.waypoint = None;
            } else {
                self.pick_waypoint(ctx);
            }
        } else if self.patrol_timer >= self.archetype.patrol_timeout {
            trace!("{} {} gave up on its waypoint", self.archetype.name, self.id);
            self.pick_waypoint(ctx);
        }
    }

    fn pick_waypoint(&mut self, ctx: &TickContext<'_>) {
        let margin = footprint_margin(self.archetype.collision_size);
        let y = self.transform.pos.y;
        self.patrol_timer = 0.0;

        let landmarks: Vec<&Obstacle> = ctx
            .obstacles
            .iter()
            .filter(|o| o.landmark && o.bounds.is_valid())
            .collect();
        if !landmarks.is_empty() && self.rng.random::<f32>() < self.archetype.landmark_bias {
            let landmark = landmarks[self.rng.random_range(0..landmarks.len())];
            let center = landmark.bounds.center();
            let angle = self.rng.random_range(0.0..TAU);
            let radius = landmark.footprint_radius() + margin + self.rng.random_range(0.5..2.0);
            let candidate =
                Vector3::new(center.x + angle.sin() * radius, y, center.z + angle.cos() * radius);
            if ctx.query.is_within_bounds(candidate, margin) {
                self.waypoint = Some(candidate);
                return;
            }
        }

        self.waypoint = ctx
            .query
            .bounds()
            .sample_point(&mut self.rng, margin)
            .map(|p| Vector3::new(p.x, y, p.y));
    }

    fn integrate(
        &mut self,
        tracked: Option<&TargetSnapshot>,
        ctx: &TickContext<'_>,
        dt: f32,
    ) -> Option<Hit> {
        self.commanded_speed = 0.0;

        match (self.machine.current(), tracked) {
            (BehaviorPhase::Patrol, _) => {
                if self.waypoint.is_none() {
                    self.pick_waypoint(ctx);
                }
                if let Some(waypoint) = self.waypoint {
                    self.travel_towards(waypoint, self.archetype.patrol_speed, ctx, dt);
                }
                None
            }
            (BehaviorPhase::Pursue, Some(target)) => {
                self.travel_towards(target.position, self.archetype.chase_speed, ctx, dt);
                None
            }
            (BehaviorPhase::Engage, Some(target)) => {
                self.circle(target.position, ctx, dt);
                None
            }
            (BehaviorPhase::Attack, _) => self.strike(tracked, ctx, dt),
            (BehaviorPhase::Disengage, Some(target)) => {
                self.retreat_from(target.position, ctx, dt);
                None
            }
            _ => None,
        }
    }

    fn travel_towards(&mut self, goal: Vector3<f32>, speed: f32, ctx: &TickContext<'_>, dt: f32) {
        let pos = self.transform.pos;
        let Some(desired) = heading_to(pos, goal) else {
            return;
        };

        let size = self.archetype.collision_size;
        let look_ahead = self.archetype.look_ahead;
        let steer = avoidance_steering(pos, desired, size, ctx.obstacles, look_ahead, ctx.query);
        self.transform.yaw = turn_towards(self.transform.yaw, steer, dt, self.archetype.turn_rate);
        self.commanded_speed = speed;
        let yaw = self.transform.yaw;
        self.transform.pos = next_position(pos, yaw, speed, dt, size, ctx.obstacles, ctx.query);
    }

    fn circle(&mut self, target: Vector3<f32>, ctx: &TickContext<'_>, dt: f32) {
        let pos = self.transform.pos;
        let rate = self.archetype.turn_rate;
        self.transform.yaw = smooth_look_at(self.transform.yaw, target, pos, dt, rate);

        let to_target = Vector3::new(target.x - pos.x, 0.0, target.z - pos.z);
        let distance = to_target.magnitude();
        if distance < POSITION_EPSILON {
            return;
        }
        let inward = to_target / distance;

        let direction = if self.ready_to_attack() {
            inward
        } else {
            let tangent = Vector3::new(inward.z, 0.0, -inward.x) * self.strafe_sign;
            let radial = if distance < self.archetype.strafe_near {
                -1.0
            } else if distance > self.archetype.strafe_far {
                1.0
            } else {
                0.0
            };
            (tangent + inward * radial).normalize()
        };

        let speed = self.archetype.engage_speed;
        self.commanded_speed = speed;
        let next = next_position_with_velocity(
            pos,
            direction * speed,
            dt,
            self.archetype.collision_size,
            ctx.obstacles,
            ctx.query,
        );
        if next == pos {
            self.strafe_sign = -self.strafe_sign;
        }
        self.transform.pos = next;
    }

    fn strike(
        &mut self,
        tracked: Option<&TargetSnapshot>,
        ctx: &TickContext<'_>,
        dt: f32,
    ) -> Option<Hit> {
        let target = tracked?;
        let pos = self.transform.pos;
        let time = self.machine.time_in_state();
        let distance = horizontal_distance(pos, target.position);
        let rate = self.archetype.turn_rate;
        self.transform.yaw = smooth_look_at(self.transform.yaw, target.position, pos, dt, rate);

        let (lunge_start, lunge_end) = self.archetype.lunge_window;
        let lunge_speed = self.archetype.lunge_speed;
        if lunge_speed > 0.0
            && (lunge_start..=lunge_end).contains(&time)
            && distance > self.archetype.attack_range * 0.5
        {
            self.commanded_speed = lunge_speed;
            self.transform.pos = next_position(
                pos,
                self.transform.yaw,
                lunge_speed,
                dt,
                self.archetype.collision_size,
                ctx.obstacles,
                ctx.query,
            );
        }

        let (hit_start, hit_end) = self.archetype.hit_window;
        if self.hit_fired
            || !(hit_start..=hit_end).contains(&time)
            || distance > self.archetype.attack_range + ATTACK_REACH
        {
            return None;
        }

        self.hit_fired = true;
        let hit = Hit {
            target: target.id,
            damage: self.archetype.attack_damage,
        };
        trace!("{} {} hits {} for {}", self.archetype.name, self.id, hit.target, hit.damage);
        if let Some(sender) = &self.sender {
            sender.send_hit(self.id, hit.target, hit.damage);
        }
        Some(hit)
    }

    fn retreat_from(&mut self, threat: Vector3<f32>, ctx: &TickContext<'_>, dt: f32) {
        let pos = self.transform.pos;
        let rate = self.archetype.turn_rate;
        self.transform.yaw = smooth_look_at(self.transform.yaw, threat, pos, dt, rate);

        let yaw = self.transform.yaw;
        let away = heading_to(threat, pos).unwrap_or_else(|| wrap_angle(yaw + PI));
        let size = self.archetype.collision_size;
        let look_ahead = self.archetype.look_ahead;
        let steer = avoidance_steering(pos, away, size, ctx.obstacles, look_ahead, ctx.query);

        let speed = self.archetype.retreat_speed;
        self.commanded_speed = speed;
        self.transform.pos = next_position_with_velocity(
            pos,
            feral_core::forward(steer) * speed,
            dt,
            size,
            ctx.obstacles,
            ctx.query,
        );
    }

    fn detect_stuck(&mut self, before: Vector3<f32>, ctx: &TickContext<'_>, dt: f32) {
        let moved = horizontal_distance(before, self.transform.pos);
        let expected = (self.commanded_speed * dt * STUCK_PROGRESS_RATIO).max(POSITION_EPSILON);
        if self.commanded_speed == 0.0 || moved >= expected {
            self.reset_stuck();
            return;
        }

        self.stuck_timer += dt;
        if self.stuck_timer >= TELEPORT_AFTER {
            self.recover_by_teleport(ctx);
        } else if self.stuck_timer >= self.next_repath_at {
            self.next_repath_at += SOFT_REPATH_AFTER;
            self.soft_repath(ctx);
        }
    }

    fn soft_repath(&mut self, ctx: &TickContext<'_>) {
        debug!(
            "{} {} stuck for {:.1}s, repathing",
            self.archetype.name, self.id, self.stuck_timer
        );

        match self.machine.current() {
            BehaviorPhase::Idle | BehaviorPhase::Patrol => self.pick_waypoint(ctx),
            _ => {
                self.strafe_sign = -self.strafe_sign;
                let nudge = self.rng.random_range(-FRAC_PI_4..=FRAC_PI_4);
                self.transform.yaw = wrap_angle(self.transform.yaw + nudge);
            }
        }
        self.machine.reset_timer();
    }

    fn recover_by_teleport(&mut self, ctx: &TickContext<'_>) {
        let from = self.transform.pos;
        let found = ctx.query.find_unstuck_position(
            from,
            self.archetype.collision_size,
            ctx.obstacles,
            &mut self.rng,
        );

        match found {
            Some(to) => {
                info!("{} {} unstuck by teleport {from:?} -> {to:?}", self.archetype.name, self.id);
                self.teleport(to);
                self.enter(BehaviorPhase::Patrol);
                if let Some(sender) = &self.sender {
                    sender.send_teleported(self.id, from, to);
                }
            }
            None => {
                warn!("{} {} is stuck with no free spot nearby", self.archetype.name, self.id);
                self.stuck_timer = TELEPORT_AFTER - SOFT_REPATH_AFTER;
                self.next_repath_at = TELEPORT_AFTER;
            }
        }
    }

    fn resolve_vertical(&mut self, ctx: &TickContext<'_>, dt: f32) {
        let ground = ctx.query.get_ground_height(self.transform.pos, ctx.obstacles);
        self.transform.pos.y = smooth_damp(
            self.transform.pos.y,
            ground,
            &mut self.vertical_velocity,
            VERTICAL_SMOOTH_TIME,
            dt,
        );
    }

    fn report(&self, hit: Option<Hit>) -> TickReport {
        TickReport {
            transform: self.transform,
            intent: self.intent(),
            hit,
        }
    }
}

impl Behavior for BehaviorController {
    fn update(&mut self, ctx: &TickContext<'_>, dt: Dt) -> TickReport {
        let seconds = dt.as_secs_f32();
        if self.machine.is_finished() || seconds <= 0.0 {
            return self.report(None);
        }

        self.machine.tick(dt);
        self.attack_cooldown = (self.attack_cooldown - seconds).max(0.0);

        let tracked = self.acquire(ctx.targets);
        self.update_transitions(tracked.as_ref(), ctx, seconds);

        let before = self.transform.pos;
        let hit = self.integrate(tracked.as_ref(), ctx, seconds);
        self.ground_speed = horizontal_distance(before, self.transform.pos) / seconds;
        self.detect_stuck(before, ctx, seconds);
        self.resolve_vertical(ctx, seconds);

        self.report(hit)
    }

    fn force_dead(&mut self) {
        let current = self.machine.current();
        if !self.machine.transition_to(BehaviorPhase::Dead) {
            return;
        }

        debug!("{} {}: {} -> dead", self.archetype.name, self.id, self.archetype.label(current));
        self.target = None;
        self.waypoint = None;
        self.commanded_speed = 0.0;
        self.ground_speed = 0.0;
        self.combo_count = 0;
        self.reset_stuck();
    }

    fn phase(&self) -> BehaviorPhase {
        self.machine.current()
    }

    fn transform(&self) -> Pos3 {
        self.transform
    }

    fn teleport(&mut self, position: Vector3<f32>) {
        self.transform.pos = position;
        self.vertical_velocity = 0.0;
        self.reset_stuck();
    }

    fn intent(&self) -> BehaviorIntent {
        let phase = self.machine.current();
        let attacking = phase == BehaviorPhase::Attack;
        let moving = self.ground_speed > MOVING_SPEED;
        let state_timer = self.machine.time_in_state();

        BehaviorIntent {
            phase,
            label: self.archetype.label(phase),
            state_timer,
            speed: self.ground_speed,
            moving,
            running: moving && self.commanded_speed > self.archetype.patrol_speed + 1e-3,
            attacking,
            attack_progress: if attacking {
                (state_timer / self.archetype.attack_duration).clamp(0.0, 1.0)
            } else {
                0.0
            },
            attack_style: self.archetype.attack_style,
            combo: self.combo_count,
            dead: phase == BehaviorPhase::Dead,
        }
    }

    fn archetype(&self) -> &ArchetypeDescriptor {
        &self.archetype
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::collision::{FlatTerrain, WorldBounds};
    use crate::intents::{Intent, create_intent_channel};
    use cgmath::Vector2;
    use rand::SeedableRng;
    use std::f32::consts::PI;
    use std::time::Duration;

    fn query() -> CollisionQuery {
        CollisionQuery::new(WorldBounds::Square { half_extent: 60.0 }, Box::new(FlatTerrain(0.0)))
    }

    fn tick() -> Dt {
        Duration::from_secs_f32(1.0 / 60.0)
    }

    fn wolf_at(x: f32, z: f32) -> BehaviorController {
        BehaviorController::new(
            Entity(1),
            ArchetypeDescriptor::wolf(),
            Vector3::new(x, 0.0, z),
            0.0,
            StdRng::seed_from_u64(5),
        )
        .unwrap()
    }

    fn player_at(x: f32, z: f32) -> TargetSnapshot {
        TargetSnapshot::player(Entity(100), Vector3::new(x, 0.0, z))
    }

    fn step(
        controller: &mut BehaviorController,
        query: &CollisionQuery,
        obstacles: &[Obstacle],
        targets: &[TargetSnapshot],
        dt: Dt,
    ) -> TickReport {
        controller.update(&TickContext::new(query, obstacles, targets), dt)
    }

    /// Four walls touching the wolf's body box on every side.
    fn cage() -> Vec<Obstacle> {
        vec![
            Obstacle::hard_box(Vector2::new(0.9, 0.0), Vector3::new(1.0, 2.0, 4.0), 0.0),
            Obstacle::hard_box(Vector2::new(-0.9, 0.0), Vector3::new(1.0, 2.0, 4.0), 0.0),
            Obstacle::hard_box(Vector2::new(0.0, 1.2), Vector3::new(4.0, 2.0, 1.0), 0.0),
            Obstacle::hard_box(Vector2::new(0.0, -1.2), Vector3::new(4.0, 2.0, 1.0), 0.0),
        ]
    }

    #[test]
    fn test_rejects_invalid_archetype() {
        let mut archetype = ArchetypeDescriptor::wolf();
        archetype.engage_radius = 30.0;
        let origin = Vector3::new(0.0, 0.0, 0.0);
        let result =
            BehaviorController::new(Entity(1), archetype, origin, 0.0, StdRng::seed_from_u64(1));
        assert!(result.is_err());
    }

    #[test]
    fn test_far_target_keeps_patrolling() {
        let query = query();
        let mut wolf = wolf_at(0.0, 0.0);
        let targets = [player_at(30.0, 0.0)];

        for _ in 0..10 {
            let report = step(&mut wolf, &query, &[], &targets, tick());
            assert_eq!(report.intent.phase, BehaviorPhase::Patrol);
        }
        assert!(wolf.target().is_none());
        assert!(wolf.waypoint().is_some());
    }

    #[test]
    fn test_target_in_awareness_starts_pursuit_same_tick() {
        let query = query();
        let mut wolf = wolf_at(0.0, 0.0);
        let report = step(&mut wolf, &query, &[], &[player_at(10.0, 0.0)], tick());

        assert_eq!(report.intent.phase, BehaviorPhase::Pursue);
        assert_eq!(report.intent.label, "chase");
        assert_eq!(report.intent.state_timer, 0.0);
        assert_eq!(wolf.target(), Some(Entity(100)));
    }

    #[test]
    fn test_close_target_engages_then_attacks() {
        let query = query();
        let targets = [player_at(0.0, 0.0)];
        let mut wolf = wolf_at(0.0, 10.0);

        step(&mut wolf, &query, &[], &targets, tick());
        assert_eq!(wolf.phase(), BehaviorPhase::Pursue);

        wolf.teleport(Vector3::new(0.0, 0.0, 2.0));
        step(&mut wolf, &query, &[], &targets, tick());
        assert_eq!(wolf.phase(), BehaviorPhase::Engage);

        let mut elapsed = 0.0;
        while wolf.phase() == BehaviorPhase::Engage && elapsed < 4.0 {
            step(&mut wolf, &query, &[], &targets, tick());
            elapsed += 1.0 / 60.0;
        }

        assert_eq!(wolf.phase(), BehaviorPhase::Attack);
        assert_eq!(wolf.previous_phase(), Some(BehaviorPhase::Engage));
        assert_eq!(wolf.attack_cooldown(), 0.0);
        assert!(elapsed >= ArchetypeDescriptor::wolf().duel_time_min - 0.02);
    }

    #[test]
    fn test_losing_target_returns_to_patrol_within_one_tick() {
        let query = query();
        let mut wolf = wolf_at(0.0, 10.0);
        step(&mut wolf, &query, &[], &[player_at(0.0, 0.0)], tick());
        assert_eq!(wolf.phase(), BehaviorPhase::Pursue);

        let report = step(&mut wolf, &query, &[], &[], tick());
        assert_eq!(report.intent.phase, BehaviorPhase::Patrol);
        assert!(wolf.target().is_none());

        let mut wolf = wolf_at(0.0, 10.0);
        step(&mut wolf, &query, &[], &[player_at(0.0, 0.0)], tick());
        let report = step(&mut wolf, &query, &[], &[player_at(0.0, 0.0).dead()], tick());
        assert_eq!(report.intent.phase, BehaviorPhase::Patrol);
    }

    #[test]
    fn test_pursuit_hysteresis() {
        let query = query();
        let targets = [player_at(0.0, 0.0)];
        let mut wolf = wolf_at(0.0, 10.0);
        step(&mut wolf, &query, &[], &targets, tick());

        // beyond awareness but inside the disengage radius
        wolf.teleport(Vector3::new(0.0, 0.0, 22.0));
        step(&mut wolf, &query, &[], &targets, tick());
        assert_eq!(wolf.phase(), BehaviorPhase::Pursue);

        wolf.teleport(Vector3::new(0.0, 0.0, 40.0));
        step(&mut wolf, &query, &[], &targets, tick());
        assert_eq!(wolf.phase(), BehaviorPhase::Patrol);

        // not re-acquired from the gap between the two radii
        wolf.teleport(Vector3::new(0.0, 0.0, 22.0));
        step(&mut wolf, &query, &[], &targets, tick());
        assert_eq!(wolf.phase(), BehaviorPhase::Patrol);
    }

    #[test]
    fn test_fight_respects_cooldown_and_hit_window() {
        let query = query();
        let targets = [player_at(0.0, 0.0)];
        let archetype = ArchetypeDescriptor::wolf();
        let (sender, receiver) = create_intent_channel();
        let mut wolf = wolf_at(0.0, 3.0).with_sender(sender);

        let mut previous = wolf.phase();
        let mut hits = 0;
        let mut hits_this_strike = 0;
        let mut saw_combo = false;
        let mut saw_disengage = false;

        for _ in 0..(60 * 20) {
            let report = step(&mut wolf, &query, &[], &targets, tick());
            let phase = report.intent.phase;

            if phase == BehaviorPhase::Attack && report.intent.state_timer == 0.0 {
                if previous == BehaviorPhase::Engage {
                    assert_eq!(wolf.attack_cooldown(), 0.0);
                }
                if previous == BehaviorPhase::Attack {
                    saw_combo = true;
                }
                hits_this_strike = 0;
            }
            if previous == BehaviorPhase::Attack && phase == BehaviorPhase::Disengage {
                assert!(wolf.attack_cooldown() > 0.0);
                saw_disengage = true;
            }
            if let Some(hit) = report.hit {
                assert_eq!(hit.target, Entity(100));
                let (start, end) = archetype.hit_window;
                assert!((start..=end).contains(&report.intent.state_timer));
                hits += 1;
                hits_this_strike += 1;
                assert!(hits_this_strike <= 1);
            }
            assert!(report.intent.combo <= archetype.combo_cap);
            previous = phase;
        }

        assert!(hits > 0);
        assert!(saw_combo);
        assert!(saw_disengage);
        let sent = receiver
            .try_recv_all()
            .into_iter()
            .filter(|i| matches!(i, Intent::HitLanded { .. }))
            .count();
        assert_eq!(sent, hits);
    }

    #[test]
    fn test_stuck_creature_repaths() {
        let query = query();
        let obstacles = cage();
        let mut archetype = ArchetypeDescriptor::wolf();
        archetype.idle_chance = 0.0;
        let mut wolf = BehaviorController::new(
            Entity(1),
            archetype,
            Vector3::new(0.0, 0.0, 0.0),
            0.0,
            StdRng::seed_from_u64(9),
        )
        .unwrap();
        let dt = Duration::from_millis(100);

        step(&mut wolf, &query, &obstacles, &[], dt);
        let first_waypoint = wolf.waypoint();
        assert!(first_waypoint.is_some());

        for _ in 0..15 {
            step(&mut wolf, &query, &obstacles, &[], dt);
        }

        assert_eq!(wolf.phase(), BehaviorPhase::Patrol);
        assert_ne!(wolf.waypoint(), first_waypoint);
        assert!(wolf.state_timer() <= 0.1 + 1e-4);
        assert!(horizontal_distance(wolf.transform().pos, Vector3::new(0.0, 0.0, 0.0)) < 1e-4);
    }

    #[test]
    fn test_stuck_creature_teleports() {
        let query = query();
        let obstacles = cage();
        let (sender, receiver) = create_intent_channel();
        let mut wolf = wolf_at(0.0, 0.0).with_sender(sender);
        let dt = Duration::from_millis(100);

        let mut teleported_at = None;
        for i in 0..140 {
            step(&mut wolf, &query, &obstacles, &[], dt);
            let escaped = horizontal_distance(wolf.transform().pos, Vector3::new(0.0, 0.0, 0.0));
            if teleported_at.is_none() && escaped > 0.9 {
                teleported_at = Some(i);
            }
        }

        let tick_index = teleported_at.expect("creature never escaped the cage");
        assert!(tick_index >= 98, "teleported too early at tick {tick_index}");
        assert!(
            receiver
                .try_recv_all()
                .iter()
                .any(|i| matches!(i, Intent::Teleported { entity: Entity(1), .. }))
        );
    }

    #[test]
    fn test_dead_controller_is_inert() {
        let query = query();
        let mut wolf = wolf_at(5.0, 5.0);
        wolf.force_dead();
        let before = wolf.transform();

        for _ in 0..30 {
            let report = step(&mut wolf, &query, &[], &[player_at(6.0, 5.0)], tick());
            assert!(report.intent.dead);
            assert_eq!(report.intent.phase, BehaviorPhase::Dead);
            assert!(report.hit.is_none());
        }
        assert_eq!(wolf.transform(), before);
        assert_eq!(wolf.state_timer(), 0.0);

        wolf.force_dead();
        assert_eq!(wolf.phase(), BehaviorPhase::Dead);
    }

    #[test]
    fn test_vertical_position_is_smoothed() {
        let bounds = WorldBounds::Square { half_extent: 60.0 };
        let query = CollisionQuery::new(bounds, Box::new(FlatTerrain(1.0)));
        let mut wolf = wolf_at(0.0, 0.0);

        let report = step(&mut wolf, &query, &[], &[], tick());
        assert!(report.transform.pos.y > 0.0 && report.transform.pos.y < 1.0);

        for _ in 0..120 {
            step(&mut wolf, &query, &[], &[], tick());
        }
        assert!((wolf.transform().pos.y - 1.0).abs() < 1e-3);
    }

    fn controller(
        archetype: ArchetypeDescriptor,
        position: Vector3<f32>,
        yaw: f32,
    ) -> BehaviorController {
        let rng = StdRng::seed_from_u64(11);
        BehaviorController::new(Entity(1), archetype, position, yaw, rng).unwrap()
    }

    /// Ticks a retreating creature until it leaves DISENGAGE.
    ///
    /// Returns the phase timer and ground covered on the last retreating tick,
    /// plus the phase that followed.
    fn run_retreat(mut creature: BehaviorController) -> (f32, f32, BehaviorPhase) {
        let query = query();
        let targets = [player_at(0.0, 0.0)];
        let start = creature.transform().pos;
        creature.enter(BehaviorPhase::Disengage);

        let (mut timer, mut covered) = (0.0, 0.0);
        for _ in 0..600 {
            let report = step(&mut creature, &query, &[], &targets, tick());
            if report.intent.phase != BehaviorPhase::Disengage {
                return (timer, covered, report.intent.phase);
            }
            timer = report.intent.state_timer;
            covered = horizontal_distance(start, report.transform.pos);
        }
        panic!("retreat never ended");
    }

    #[test]
    fn test_walks_under_overhead_obstacle() {
        let query = query();
        let branch = [Obstacle::hard_box(Vector2::new(0.0, 0.0), Vector3::new(8.0, 1.0, 8.0), 3.0)];
        let mut wolf = wolf_at(0.0, 0.0);
        let size = wolf.archetype().collision_size;

        for _ in 0..120 {
            let report = step(&mut wolf, &query, &branch, &[], tick());
            assert!(report.transform.pos.y.abs() < 1e-3, "lifted to {}", report.transform.pos.y);
            assert!(!query.check_box_collision(report.transform.pos, size, &branch));
        }
    }

    #[test]
    fn test_new_target_needs_awareness_radius() {
        let query = query();
        let mut wolf = wolf_at(0.0, 0.0);
        let hunted = TargetSnapshot::player(Entity(100), Vector3::new(10.0, 0.0, 0.0));
        step(&mut wolf, &query, &[], &[hunted], tick());
        assert_eq!(wolf.target(), Some(Entity(100)));

        // inside the disengage radius, but never noticed
        let bystander = TargetSnapshot::player(Entity(200), Vector3::new(-22.0, 0.0, 0.0));
        let report = step(&mut wolf, &query, &[], &[hunted.dead(), bystander], tick());
        assert_eq!(report.intent.phase, BehaviorPhase::Patrol);
        assert_eq!(wolf.target(), None);
    }

    #[test]
    fn test_lunge_inside_window_until_half_range() {
        let query = query();
        let targets = [player_at(0.0, 0.0)];
        let start = Vector3::new(0.0, 0.0, 2.0);
        let mut wolf = controller(ArchetypeDescriptor::wolf(), start, PI);
        wolf.enter(BehaviorPhase::Attack);

        let mut settled = None;
        for _ in 0..24 {
            let report = step(&mut wolf, &query, &[], &targets, tick());
            assert_eq!(report.intent.phase, BehaviorPhase::Attack);
            let timer = report.intent.state_timer;
            if timer < 0.09 {
                assert!(horizontal_distance(start, report.transform.pos) < 1e-5);
            }
            if timer > 0.32 && settled.is_none() {
                settled = Some(report.transform.pos);
            }
        }

        let end = wolf.transform().pos;
        let distance = horizontal_distance(end, Vector3::new(0.0, 0.0, 0.0));
        assert!(distance > 1.0 && distance <= 1.25 + 1e-4, "stopped at {distance}");
        assert!(settled.is_some_and(|p| horizontal_distance(p, end) < 1e-6));

        // already within half the attack range, no lunge at all
        let close = Vector3::new(0.0, 0.0, 1.0);
        let mut wolf = controller(ArchetypeDescriptor::wolf(), close, PI);
        wolf.enter(BehaviorPhase::Attack);
        for _ in 0..24 {
            step(&mut wolf, &query, &[], &targets, tick());
        }
        assert!(horizontal_distance(close, wolf.transform().pos) < 1e-5);
    }

    #[test]
    fn test_retreat_ends_by_duration_then_engages() {
        let mut archetype = ArchetypeDescriptor::wolf();
        archetype.retreat_distance = 50.0;
        let wolf = controller(archetype, Vector3::new(0.0, 0.0, 1.0), 0.0);
        let (timer, covered, next) = run_retreat(wolf);

        assert!((0.75..=0.82).contains(&timer), "left after {timer}");
        assert!((2.9..=3.4).contains(&covered), "covered {covered}");
        assert_eq!(next, BehaviorPhase::Engage);
    }

    #[test]
    fn test_retreat_ends_by_distance_then_pursues() {
        let mut archetype = ArchetypeDescriptor::wolf();
        archetype.retreat_duration = 5.0;
        archetype.retreat_distance = 2.0;
        let wolf = controller(archetype, Vector3::new(0.0, 0.0, 5.0), 0.0);
        let (timer, covered, next) = run_retreat(wolf);

        assert!(timer < 0.6, "left after {timer}");
        assert!((1.9..=2.1).contains(&covered), "covered {covered}");
        assert_eq!(next, BehaviorPhase::Pursue);
    }

    #[test]
    fn test_ranged_retreat_is_visible() {
        // the archer starts inside its aiming band, further than its retreat distance
        let archer = ArchetypeDescriptor::skeleton_archer();
        let duration = archer.retreat_duration;
        let archer = controller(archer, Vector3::new(0.0, 0.0, 10.0), 0.0);
        let (timer, covered, next) = run_retreat(archer);

        assert!(timer > duration - 0.05, "left after {timer}");
        assert!(covered > 2.0);
        assert_eq!(next, BehaviorPhase::Engage);
    }

    #[test]
    fn test_reached_waypoint_rests_then_patrols() {
        let query = query();
        let mut archetype = ArchetypeDescriptor::wolf();
        archetype.idle_chance = 1.0;
        let idle_duration = archetype.idle_duration;
        let mut wolf = controller(archetype, Vector3::new(0.0, 0.0, 0.0), 0.0);
        wolf.waypoint = Some(Vector3::new(0.0, 0.0, 1.0));

        let report = step(&mut wolf, &query, &[], &[], tick());
        assert_eq!(report.intent.phase, BehaviorPhase::Idle);
        assert!(wolf.waypoint().is_none());

        let mut rested = 0.0;
        let mut report = report;
        while report.intent.phase == BehaviorPhase::Idle {
            rested = report.intent.state_timer;
            assert!(!report.intent.moving);
            assert!(rested < idle_duration + 0.1);
            report = step(&mut wolf, &query, &[], &[], tick());
        }

        assert_eq!(report.intent.phase, BehaviorPhase::Patrol);
        assert_eq!(wolf.previous_phase(), Some(BehaviorPhase::Idle));
        assert!(rested > idle_duration - 0.05);
        assert!(wolf.waypoint().is_some());
    }

    #[test]
    fn test_waypoints_gather_around_landmarks() {
        let query = query();
        let mut archetype = ArchetypeDescriptor::wolf();
        archetype.landmark_bias = 1.0;
        let margin = footprint_margin(archetype.collision_size);
        let obstacles = [
            Obstacle::hard_cylinder(Vector2::new(20.0, -15.0), 1.0, 5.0, 0.0).as_landmark(),
            Obstacle::hard_box(Vector2::new(-30.0, 30.0), Vector3::new(2.0, 2.0, 2.0), 0.0),
        ];
        let ctx = TickContext::new(&query, &obstacles, &[]);
        let mut wolf = controller(archetype, Vector3::new(0.0, 0.0, 0.0), 0.0);

        for _ in 0..20 {
            wolf.pick_waypoint(&ctx);
            let waypoint = wolf.waypoint().unwrap();
            let distance = horizontal_distance(waypoint, Vector3::new(20.0, 0.0, -15.0));
            assert!(distance >= 1.0 + margin + 0.5 - 1e-3, "{distance}");
            assert!(distance <= 1.0 + margin + 2.0 + 1e-3, "{distance}");
        }
    }

    #[test]
    fn test_strafe_keeps_to_band() {
        let query = query();
        let targets = [player_at(0.0, 0.0)];
        let circle_for = |z: f32, ticks: usize| {
            let start = Vector3::new(0.0, 0.0, z);
            let mut wolf = controller(ArchetypeDescriptor::wolf(), start, PI);
            wolf.enter(BehaviorPhase::Engage);
            let mut distances = Vec::new();
            let mut travelled = 0.0;
            let mut last = start;
            for _ in 0..ticks {
                let report = step(&mut wolf, &query, &[], &targets, tick());
                assert_eq!(report.intent.phase, BehaviorPhase::Engage);
                travelled += horizontal_distance(last, report.transform.pos);
                last = report.transform.pos;
                distances.push(horizontal_distance(last, Vector3::new(0.0, 0.0, 0.0)));
            }
            (distances, travelled)
        };

        // too far, pulled in
        let (far, _) = circle_for(5.5, 30);
        assert!(far.last().is_some_and(|d| *d < 5.0));

        // too close, pushed out
        let (near, _) = circle_for(1.0, 30);
        assert!(near.last().is_some_and(|d| *d > 1.8));

        // inside the band, only the orbit
        let (band, travelled) = circle_for(2.75, 30);
        assert!(band.iter().all(|d| (2.0..=3.5).contains(d)), "{band:?}");
        assert!(travelled > 1.0);
    }

    #[test]
    fn test_same_seed_same_path() {
        let query = query();
        let mut a = wolf_at(0.0, 0.0);
        let mut b = wolf_at(0.0, 0.0);
        for _ in 0..200 {
            step(&mut a, &query, &[], &[], tick());
            step(&mut b, &query, &[], &[], tick());
        }
        assert_eq!(a.transform(), b.transform());
    }
}

use super::fsm::{BehaviorPhase, StateIdentifier};
use crate::Component;
use crate::errors::{SimulationError, SimulationResult};
use cgmath::Vector3;
use feral_macro::Component;

/// Side a creature fights for. Targets of the same faction are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Faction {
    Player,
    Wild,
    Goblinoid,
    Undead,
    Fey,
    Villager,
}

/// Material handed out when a corpse is harvested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LootMaterial {
    Pelt,
    Hide,
    Chitin,
    Bone,
    Cloth,
    Essence,
}

impl std::fmt::Display for LootMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            LootMaterial::Pelt => "pelt",
            LootMaterial::Hide => "hide",
            LootMaterial::Chitin => "chitin",
            LootMaterial::Bone => "bone",
            LootMaterial::Cloth => "cloth",
            LootMaterial::Essence => "essence",
        };
        f.write_str(name)
    }
}

/// Which upper-body action a strike plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttackStyle {
    /// Bites, claws and weapon swings.
    Swing,
    BowDraw,
    SpellCast,
}

/// How the body falls when the creature dies.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeathStyle {
    /// Rotated onto its side in one step.
    Instant,
    /// Falls over continuously for `duration` seconds.
    Animated { duration: f32 },
}

/// Archetype specific names for the canonical phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseLabels {
    pub idle: &'static str,
    pub patrol: &'static str,
    pub pursue: &'static str,
    pub engage: &'static str,
    pub attack: &'static str,
    pub disengage: &'static str,
    pub dead: &'static str,
}

impl PhaseLabels {
    /// The name this archetype uses for `phase`.
    pub fn label(&self, phase: BehaviorPhase) -> &'static str {
        match phase {
            BehaviorPhase::Idle => self.idle,
            BehaviorPhase::Patrol => self.patrol,
            BehaviorPhase::Pursue => self.pursue,
            BehaviorPhase::Engage => self.engage,
            BehaviorPhase::Attack => self.attack,
            BehaviorPhase::Disengage => self.disengage,
            BehaviorPhase::Dead => self.dead,
        }
    }
}

impl Default for PhaseLabels {
    fn default() -> Self {
        Self {
            idle: BehaviorPhase::Idle.as_str(),
            patrol: BehaviorPhase::Patrol.as_str(),
            pursue: BehaviorPhase::Pursue.as_str(),
            engage: BehaviorPhase::Engage.as_str(),
            attack: BehaviorPhase::Attack.as_str(),
            disengage: BehaviorPhase::Disengage.as_str(),
            dead: BehaviorPhase::Dead.as_str(),
        }
    }
}

/// Tuning constants of one creature class.
///
/// Distances are in world units, durations in seconds, speeds in units per
/// second. The values are hand tuned per class and carry no shared derivation.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct ArchetypeDescriptor {
    pub name: String,
    pub faction: Faction,
    pub labels: PhaseLabels,
    /// Full width, height and depth of the body box.
    pub collision_size: Vector3<f32>,

    pub patrol_speed: f32,
    pub chase_speed: f32,
    pub engage_speed: f32,
    pub retreat_speed: f32,
    pub lunge_speed: f32,
    /// Fraction of the remaining heading error removed per second.
    pub turn_rate: f32,
    /// Length of the avoidance sensors.
    pub look_ahead: f32,

    /// A target closer than this is acquired.
    pub awareness_radius: f32,
    /// A tracked target further than this is lost.
    pub disengage_radius: f32,
    /// Pursuit turns into circling below this distance.
    pub engage_radius: f32,
    /// Circling turns back into pursuit above this distance.
    pub engage_exit_radius: f32,
    pub attack_range: f32,
    pub strafe_near: f32,
    pub strafe_far: f32,

    pub duel_time_min: f32,
    pub duel_time_max: f32,
    pub attack_duration: f32,
    pub attack_cooldown: f32,
    /// Part of the strike, measured from its start, where the body lunges forward.
    pub lunge_window: (f32, f32),
    /// Part of the strike where a hit can land.
    pub hit_window: (f32, f32),
    /// Strikes chained before backing off. `1` disables combos.
    pub combo_cap: u32,
    pub attack_style: AttackStyle,

    pub retreat_duration: f32,
    /// Ground covered since the retreat began that ends it early.
    pub retreat_distance: f32,

    /// Multiplier applied to the distance of non-player targets.
    pub non_player_weight: f32,
    pub patrol_timeout: f32,
    /// Chance of resting when a waypoint is reached.
    pub idle_chance: f32,
    pub idle_duration: f32,
    /// Chance that a new waypoint is placed next to a landmark.
    pub landmark_bias: f32,

    pub max_health: f32,
    pub attack_damage: f32,
    pub loot_material: LootMaterial,
    pub death_style: DeathStyle,
}

impl ArchetypeDescriptor {
    /// Grey wolf. Fast, fragile, chains bites.
    pub fn wolf() -> Self {
        Self {
            name: "wolf".to_string(),
            faction: Faction::Wild,
            labels: PhaseLabels {
                pursue: "chase",
                engage: "circle",
                attack: "bite",
                disengage: "recover",
                ..Default::default()
            },
            collision_size: Vector3::new(0.8, 1.0, 1.4),
            patrol_speed: 2.5,
            chase_speed: 6.5,
            engage_speed: 3.5,
            retreat_speed: 4.0,
            lunge_speed: 8.0,
            turn_rate: 6.0,
            look_ahead: 3.0,
            awareness_radius: 18.0,
            disengage_radius: 26.0,
            engage_radius: 4.0,
            engage_exit_radius: 6.0,
            attack_range: 2.5,
            strafe_near: 2.0,
            strafe_far: 3.5,
            duel_time_min: 0.8,
            duel_time_max: 2.0,
            attack_duration: 0.9,
            attack_cooldown: 1.2,
            lunge_window: (0.1, 0.3),
            hit_window: (0.45, 0.65),
            combo_cap: 2,
            attack_style: AttackStyle::Swing,
            retreat_duration: 0.8,
            retreat_distance: 5.0,
            non_player_weight: 1.5,
            patrol_timeout: 12.0,
            idle_chance: 0.25,
            idle_duration: 2.5,
            landmark_bias: 0.3,
            max_health: 40.0,
            attack_damage: 8.0,
            loot_material: LootMaterial::Pelt,
            death_style: DeathStyle::Instant,
        }
    }

    /// Brown bear. Slow to anger, hits hard, single swipes.
    pub fn bear() -> Self {
        Self {
            name: "bear".to_string(),
            labels: PhaseLabels {
                engage: "stand",
                attack: "maul",
                ..Default::default()
            },
            collision_size: Vector3::new(1.4, 1.6, 2.2),
            patrol_speed: 1.8,
            chase_speed: 5.0,
            engage_speed: 2.0,
            retreat_speed: 2.5,
            lunge_speed: 5.0,
            turn_rate: 3.0,
            look_ahead: 4.0,
            awareness_radius: 12.0,
            disengage_radius: 20.0,
            engage_radius: 4.5,
            engage_exit_radius: 6.5,
            attack_range: 3.0,
            strafe_near: 2.5,
            strafe_far: 4.0,
            duel_time_min: 1.2,
            duel_time_max: 2.5,
            attack_duration: 1.3,
            attack_cooldown: 2.2,
            lunge_window: (0.2, 0.45),
            hit_window: (0.45, 0.65),
            combo_cap: 1,
            retreat_duration: 1.0,
            retreat_distance: 4.0,
            idle_chance: 0.45,
            idle_duration: 4.0,
            max_health: 140.0,
            attack_damage: 22.0,
            loot_material: LootMaterial::Hide,
            death_style: DeathStyle::Animated { duration: 1.2 },
            ..Self::wolf()
        }
    }

    /// Wild boar. Charges straight in and backs off far.
    pub fn boar() -> Self {
        Self {
            name: "boar".to_string(),
            labels: PhaseLabels {
                engage: "paw",
                attack: "charge",
                disengage: "wheel",
                ..Default::default()
            },
            collision_size: Vector3::new(0.9, 0.9, 1.5),
            patrol_speed: 2.0,
            chase_speed: 6.0,
            engage_speed: 2.5,
            retreat_speed: 5.0,
            lunge_speed: 11.0,
            turn_rate: 4.0,
            awareness_radius: 14.0,
            disengage_radius: 20.0,
            engage_radius: 5.0,
            engage_exit_radius: 7.5,
            attack_range: 3.0,
            strafe_near: 3.0,
            strafe_far: 4.5,
            attack_duration: 1.0,
            attack_cooldown: 1.8,
            lunge_window: (0.05, 0.4),
            combo_cap: 1,
            retreat_duration: 1.4,
            retreat_distance: 7.0,
            max_health: 60.0,
            attack_damage: 14.0,
            loot_material: LootMaterial::Hide,
            ..Self::wolf()
        }
    }

    /// Giant spider. Keeps distance and strikes in flurries.
    pub fn spider() -> Self {
        Self {
            name: "spider".to_string(),
            labels: PhaseLabels {
                patrol: "skitter",
                pursue: "stalk",
                attack: "flurry",
                ..Default::default()
            },
            collision_size: Vector3::new(1.6, 0.8, 1.6),
            patrol_speed: 2.2,
            chase_speed: 5.5,
            engage_speed: 4.0,
            awareness_radius: 16.0,
            disengage_radius: 22.0,
            combo_cap: 3,
            attack_duration: 0.7,
            hit_window: (0.45, 0.6),
            lunge_window: (0.05, 0.2),
            attack_cooldown: 1.6,
            non_player_weight: 1.0,
            max_health: 35.0,
            attack_damage: 6.0,
            loot_material: LootMaterial::Chitin,
            death_style: DeathStyle::Animated { duration: 0.6 },
            ..Self::wolf()
        }
    }

    /// Goblin raider. Humanoid, guards before swinging.
    pub fn goblin() -> Self {
        Self {
            name: "goblin".to_string(),
            faction: Faction::Goblinoid,
            labels: PhaseLabels {
                engage: "guard",
                attack: "swing",
                disengage: "backstep",
                ..Default::default()
            },
            collision_size: Vector3::new(0.7, 1.3, 0.7),
            patrol_speed: 2.0,
            chase_speed: 5.0,
            engage_speed: 2.5,
            retreat_speed: 3.0,
            lunge_speed: 4.0,
            turn_rate: 8.0,
            look_ahead: 2.5,
            awareness_radius: 15.0,
            disengage_radius: 22.0,
            engage_radius: 3.5,
            engage_exit_radius: 5.0,
            attack_range: 2.0,
            strafe_near: 1.5,
            strafe_far: 3.0,
            duel_time_min: 0.6,
            duel_time_max: 1.6,
            attack_duration: 0.8,
            attack_cooldown: 1.0,
            lunge_window: (0.1, 0.25),
            combo_cap: 2,
            non_player_weight: 1.2,
            landmark_bias: 0.6,
            max_health: 30.0,
            attack_damage: 7.0,
            loot_material: LootMaterial::Cloth,
            ..Self::wolf()
        }
    }

    /// Skeleton archer. Holds a wide band and draws from afar.
    pub fn skeleton_archer() -> Self {
        Self {
            name: "skeleton_archer".to_string(),
            faction: Faction::Undead,
            labels: PhaseLabels {
                engage: "aim",
                attack: "draw",
                ..Default::default()
            },
            collision_size: Vector3::new(0.7, 1.7, 0.7),
            patrol_speed: 1.5,
            chase_speed: 3.5,
            engage_speed: 2.0,
            retreat_speed: 2.5,
            lunge_speed: 0.0,
            turn_rate: 5.0,
            awareness_radius: 22.0,
            disengage_radius: 30.0,
            engage_radius: 12.0,
            engage_exit_radius: 15.0,
            attack_range: 14.0,
            strafe_near: 8.0,
            strafe_far: 12.0,
            duel_time_min: 1.0,
            duel_time_max: 2.2,
            attack_duration: 1.2,
            attack_cooldown: 2.0,
            lunge_window: (0.0, 0.0),
            hit_window: (0.45, 0.65),
            combo_cap: 1,
            attack_style: AttackStyle::BowDraw,
            retreat_duration: 1.0,
            retreat_distance: 4.0,
            non_player_weight: 1.0,
            idle_chance: 0.1,
            max_health: 25.0,
            attack_damage: 9.0,
            loot_material: LootMaterial::Bone,
            death_style: DeathStyle::Animated { duration: 0.8 },
            ..Self::wolf()
        }
    }

    /// Forest spirit. Drifts slowly and casts from mid range.
    pub fn forest_spirit() -> Self {
        Self {
            name: "forest_spirit".to_string(),
            faction: Faction::Fey,
            labels: PhaseLabels {
                patrol: "drift",
                engage: "weave",
                attack: "cast",
                disengage: "fade",
                ..Default::default()
            },
            collision_size: Vector3::new(0.6, 1.8, 0.6),
            patrol_speed: 1.2,
            chase_speed: 3.0,
            engage_speed: 2.2,
            retreat_speed: 3.5,
            lunge_speed: 0.0,
            turn_rate: 2.5,
            awareness_radius: 20.0,
            disengage_radius: 28.0,
            engage_radius: 9.0,
            engage_exit_radius: 12.0,
            attack_range: 10.0,
            strafe_near: 6.0,
            strafe_far: 9.0,
            duel_time_min: 1.5,
            duel_time_max: 3.0,
            attack_duration: 1.5,
            attack_cooldown: 2.5,
            lunge_window: (0.0, 0.0),
            hit_window: (0.45, 0.65),
            combo_cap: 1,
            attack_style: AttackStyle::SpellCast,
            retreat_duration: 1.5,
            retreat_distance: 6.0,
            non_player_weight: 2.0,
            idle_chance: 0.5,
            idle_duration: 3.0,
            landmark_bias: 0.8,
            max_health: 50.0,
            attack_damage: 12.0,
            loot_material: LootMaterial::Essence,
            death_style: DeathStyle::Animated { duration: 2.0 },
            ..Self::wolf()
        }
    }

    /// Looks up a preset by name.
    pub fn preset(name: &str) -> Option<Self> {
        let descriptor = match name {
            "wolf" => Self::wolf(),
            "bear" => Self::bear(),
            "boar" => Self::boar(),
            "spider" => Self::spider(),
            "goblin" => Self::goblin(),
            "skeleton_archer" => Self::skeleton_archer(),
            "forest_spirit" => Self::forest_spirit(),
            _ => return None,
        };
        Some(descriptor)
    }

    /// Names accepted by [`ArchetypeDescriptor::preset`].
    pub fn preset_names() -> &'static [&'static str] {
        &["wolf", "bear", "boar", "spider", "goblin", "skeleton_archer", "forest_spirit"]
    }

    /// Display name of a phase for this archetype.
    pub fn label(&self, phase: BehaviorPhase) -> &'static str {
        self.labels.label(phase)
    }

    /// Checks the constraints the behavior relies on.
    ///
    /// # Returns
    ///
    /// [`SimulationError::InvalidArchetype`] naming the first violated constraint.
    pub fn validate(&self) -> SimulationResult<()> {
        let fail = |reason: &str| {
            Err(SimulationError::InvalidArchetype {
                name: self.name.clone(),
                reason: reason.to_string(),
            })
        };

        let scalars = [
            self.patrol_speed,
            self.chase_speed,
            self.engage_speed,
            self.retreat_speed,
            self.lunge_speed,
            self.turn_rate,
            self.look_ahead,
            self.awareness_radius,
            self.disengage_radius,
            self.engage_radius,
            self.engage_exit_radius,
            self.attack_range,
            self.strafe_near,
            self.strafe_far,
            self.duel_time_min,
            self.duel_time_max,
            self.attack_duration,
            self.attack_cooldown,
            self.lunge_window.0,
            self.lunge_window.1,
            self.hit_window.0,
            self.hit_window.1,
            self.retreat_duration,
            self.retreat_distance,
            self.non_player_weight,
            self.patrol_timeout,
            self.idle_chance,
            self.idle_duration,
            self.landmark_bias,
            self.max_health,
            self.attack_damage,
        ];
        if scalars.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return fail("every tuning value must be finite and non-negative");
        }

        let size = self.collision_size;
        let finite = size.x.is_finite() && size.y.is_finite() && size.z.is_finite();
        if !finite || !(size.x > 0.0 && size.y > 0.0 && size.z > 0.0) {
            return fail("collision size must be positive");
        }
        if !(self.engage_radius > 0.0 && self.engage_radius < self.awareness_radius) {
            return fail("engage radius must be positive and below the awareness radius");
        }
        if self.awareness_radius > self.disengage_radius {
            return fail("awareness radius must not exceed the disengage radius");
        }
        if self.engage_exit_radius <= self.engage_radius {
            return fail("engage exit radius must exceed the engage radius");
        }
        if self.attack_range <= 0.0 {
            return fail("attack range must be positive");
        }
        if self.strafe_near > self.strafe_far {
            return fail("strafe band is inverted");
        }
        if self.duel_time_min > self.duel_time_max {
            return fail("duel time range is inverted");
        }
        if self.attack_duration <= 0.0 {
            return fail("attack duration must be positive");
        }
        for (window, what) in [(self.lunge_window, "lunge"), (self.hit_window, "hit")] {
            if window.0 > window.1 || window.1 > self.attack_duration {
                return fail(&format!("{what} window must be ordered and fit inside the attack"));
            }
        }
        if self.combo_cap == 0 {
            return fail("combo cap must be at least 1");
        }
        if self.idle_chance > 1.0 || self.landmark_bias > 1.0 {
            return fail("chances must lie in [0, 1]");
        }
        if self.non_player_weight == 0.0 || self.max_health == 0.0 || self.patrol_timeout == 0.0 {
            return fail("weights, health and timeouts must be positive");
        }
        if let DeathStyle::Animated { duration } = self.death_style
            && !(duration.is_finite() && duration > 0.0)
        {
            return fail("animated death needs a positive duration");
        }

        Ok(())
    }
}

impl Default for ArchetypeDescriptor {
    fn default() -> Self {
        Self::wolf()
    }
}

use super::Tick;
use super::archetype::{ArchetypeDescriptor, DeathStyle, LootMaterial};
use crate::Component;
use feral_core::Dt;
use feral_macro::Component;
use log::{debug, info};
use std::f32::consts::FRAC_PI_2;

/// Seconds the model stays tinted after taking a hit.
pub const HIT_FLASH_DURATION: f32 = 0.15;

/// Colour override requested from the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tint {
    Normal,
    HitFlash,
    Skinned,
}

/// Result of a [`Vitals::take_damage`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Already dead or the amount was not a positive number.
    Ignored,
    Damaged,
    /// This hit brought health to zero.
    Killed,
}

/// Health, death and corpse state of a creature.
#[derive(Component, Debug, Clone)]
pub struct Vitals {
    health: f32,
    max_health: f32,
    dead: bool,
    /// Remaining seconds of hit feedback.
    hit_flash: f32,
    health_bar_visible: bool,
    loot_material: LootMaterial,
    lootable: Option<LootMaterial>,
    tint: Tint,
    death_style: DeathStyle,
    /// `0.0` upright, `1.0` resting on its side.
    death_progress: f32,
}

impl Vitals {
    /// Creates full-health vitals.
    ///
    /// # Arguments
    ///
    /// * `max_health` - Starting and maximum health.
    /// * `loot_material` - What the corpse yields once harvested.
    /// * `death_style` - How the body falls.
    ///
    /// # Returns
    ///
    /// A new [`Vitals`] instance.
    pub fn new(max_health: f32, loot_material: LootMaterial, death_style: DeathStyle) -> Self {
        let max_health = if max_health.is_finite() { max_health.max(0.0) } else { 0.0 };
        Self {
            health: max_health,
            max_health,
            dead: false,
            hit_flash: 0.0,
            health_bar_visible: false,
            loot_material,
            lootable: None,
            tint: Tint::Normal,
            death_style,
            death_progress: 0.0,
        }
    }

    pub fn from_archetype(archetype: &ArchetypeDescriptor) -> Self {
        Self::new(archetype.max_health, archetype.loot_material, archetype.death_style)
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn tint(&self) -> Tint {
        self.tint
    }

    pub fn is_flashing(&self) -> bool {
        self.hit_flash > 0.0
    }

    pub fn health_bar_visible(&self) -> bool {
        self.health_bar_visible
    }

    /// Material the corpse can still be harvested for.
    pub fn lootable(&self) -> Option<LootMaterial> {
        self.lootable
    }

    pub fn death_progress(&self) -> f32 {
        self.death_progress
    }

    /// Roll of the body around its forward axis, in radians.
    pub fn death_roll(&self) -> f32 {
        self.death_progress * FRAC_PI_2
    }

    /// Whether the body has finished falling.
    pub fn is_resting(&self) -> bool {
        self.dead && self.death_progress >= 1.0
    }

    /// Applies damage and starts the hit flash.
    ///
    /// # Arguments
    ///
    /// * `amount` - Health to remove. Non-positive or non-finite amounts are ignored.
    ///
    /// # Returns
    ///
    /// What the hit did. Dead vitals always report [`DamageOutcome::Ignored`].
    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead || !(amount.is_finite() && amount > 0.0) {
            return DamageOutcome::Ignored;
        }

        self.health = (self.health - amount).max(0.0);
        self.hit_flash = HIT_FLASH_DURATION;
        self.tint = Tint::HitFlash;
        self.health_bar_visible = true;
        debug!("Took {amount} damage, {}/{} left", self.health, self.max_health);

        if self.health <= 0.0 {
            self.die();
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged
        }
    }

    /// Marks the creature dead and turns it into a lootable corpse.
    ///
    /// # Returns
    ///
    /// `false` if it was already dead, in which case nothing changes.
    pub fn die(&mut self) -> bool {
        if self.dead {
            return false;
        }

        self.dead = true;
        self.health = 0.0;
        self.health_bar_visible = false;
        self.lootable = Some(self.loot_material);
        self.death_progress = match self.death_style {
            DeathStyle::Instant => 1.0,
            DeathStyle::Animated { .. } => 0.0,
        };
        info!("Died, corpse yields {}", self.loot_material);
        true
    }

    /// Harvests the corpse.
    ///
    /// # Returns
    ///
    /// `true` the first time it is called on a dead creature. Living creatures
    /// and already skinned corpses are left untouched.
    pub fn mark_as_skinned(&mut self) -> bool {
        if self.lootable.take().is_none() {
            return false;
        }
        self.tint = Tint::Skinned;
        self.hit_flash = 0.0;
        true
    }
}

impl Tick for Vitals {
    fn on_tick(&mut self, dt: Dt) {
        let dt = dt.as_secs_f32();

        if self.hit_flash > 0.0 {
            self.hit_flash = (self.hit_flash - dt).max(0.0);
            if self.hit_flash == 0.0 && self.tint == Tint::HitFlash {
                self.tint = Tint::Normal;
            }
        }

        if self.dead
            && self.death_progress < 1.0
            && let DeathStyle::Animated { duration } = self.death_style
        {
            self.death_progress = if duration > 0.0 {
                (self.death_progress + dt / duration).min(1.0)
            } else {
                1.0
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn wolf_vitals() -> Vitals {
        Vitals::new(10.0, LootMaterial::Pelt, DeathStyle::Instant)
    }

    #[test]
    fn test_damage_starts_flash() {
        let mut vitals = wolf_vitals();
        assert_eq!(vitals.take_damage(4.0), DamageOutcome::Damaged);
        assert_eq!(vitals.health(), 6.0);
        assert_eq!(vitals.tint(), Tint::HitFlash);
        assert!(vitals.health_bar_visible());

        vitals.on_tick(Duration::from_millis(100));
        assert!(vitals.is_flashing());
        vitals.on_tick(Duration::from_millis(100));
        assert!(!vitals.is_flashing());
        assert_eq!(vitals.tint(), Tint::Normal);
    }

    #[test]
    fn test_overkill_clamps_and_kills() {
        let mut vitals = wolf_vitals();
        assert_eq!(vitals.take_damage(15.0), DamageOutcome::Killed);
        assert_eq!(vitals.health(), 0.0);
        assert!(vitals.is_dead());
        assert!(!vitals.health_bar_visible());
        assert_eq!(vitals.lootable(), Some(LootMaterial::Pelt));

        assert_eq!(vitals.take_damage(5.0), DamageOutcome::Ignored);
        assert_eq!(vitals.health(), 0.0);
    }

    #[test]
    fn test_die_is_idempotent() {
        let mut vitals = wolf_vitals();
        assert!(vitals.die());
        assert!(!vitals.die());
        assert!(vitals.is_dead());
        assert!(vitals.is_resting());
    }

    #[test]
    fn test_bad_amounts_ignored() {
        let mut vitals = wolf_vitals();
        for amount in [0.0, -3.0, f32::NAN, f32::INFINITY] {
            assert_eq!(vitals.take_damage(amount), DamageOutcome::Ignored);
        }
        assert_eq!(vitals.health(), 10.0);
        assert!(!vitals.is_flashing());
    }

    #[test]
    fn test_skinning_only_once_and_only_dead() {
        let mut vitals = wolf_vitals();
        assert!(!vitals.mark_as_skinned());

        vitals.die();
        assert!(vitals.mark_as_skinned());
        assert_eq!(vitals.tint(), Tint::Skinned);
        assert_eq!(vitals.lootable(), None);

        assert!(!vitals.mark_as_skinned());
        assert_eq!(vitals.tint(), Tint::Skinned);
    }

    #[test]
    fn test_animated_fall_rests_after_duration() {
        let style = DeathStyle::Animated { duration: 1.0 };
        let mut vitals = Vitals::new(5.0, LootMaterial::Hide, style);
        vitals.take_damage(5.0);
        assert_eq!(vitals.death_progress(), 0.0);
        assert!(!vitals.is_resting());

        for _ in 0..5 {
            vitals.on_tick(Duration::from_millis(100));
        }
        assert!((vitals.death_progress() - 0.5).abs() < 1e-4);

        for _ in 0..10 {
            vitals.on_tick(Duration::from_millis(100));
        }
        assert!(vitals.is_resting());
        assert!((vitals.death_roll() - FRAC_PI_2).abs() < 1e-6);
    }

    #[test]
    fn test_flash_does_not_override_skinned_tint() {
        let mut vitals = wolf_vitals();
        vitals.take_damage(20.0);
        vitals.mark_as_skinned();
        vitals.on_tick(Duration::from_secs(1));
        assert_eq!(vitals.tint(), Tint::Skinned);
    }
}

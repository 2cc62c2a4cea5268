//! Stat-bearing components: combat stats, weapon stats, physics body.
//!
//! These are the data-heavy components the combat pipeline reads and writes.
//! All writes clamp rather than error: health never goes negative, cooldowns
//! never go negative, knockback resistance stays in `[0, 1]`. A dead entity's
//! stats are frozen (no further damage, no stamina regeneration).

use bitflags::bitflags;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::component::{Component, ComponentKey, KeyedComponent, UpdateCtx};
use crate::effects::Effects;
use crate::events::GameEvent;

/// Cooldown substituted for a negative or non-finite weapon cooldown, in
/// seconds.
pub const MIN_COOLDOWN: f32 = 0.05;

bitflags! {
    /// Status flags tracked on [`CombatStats`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct StatusFlags: u8 {
        /// Health has reached zero. Terminal; damage and regeneration stop.
        const DEAD = 1 << 0;
        /// The death event has been published. At-most-once latch.
        const DEATH_ANNOUNCED = 1 << 1;
    }
}

/// Result of a damage application against [`CombatStats`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// True if the health value actually changed.
    pub changed: bool,
    /// True exactly once per entity lifetime: the application that brought
    /// health to zero.
    pub died: bool,
    /// Health after the application.
    pub health: f32,
}

// =============================================================================
// CombatStats
// =============================================================================

/// Health, stamina and base attack for a combat-capable entity.
///
/// Every damage write in the simulation funnels through
/// [`CombatStats::apply_damage`]; nothing mutates health directly. Stamina is
/// optional (zero `max_stamina` disables it) and regenerates during `update`.
///
/// # Example
///
/// ```
/// use duskfall_core::entity::CombatStats;
///
/// let mut stats = CombatStats::new(100.0, 20.0);
/// let outcome = stats.apply_damage(30.0);
/// assert!(outcome.changed);
/// assert!(!outcome.died);
/// assert!((stats.health() - 70.0).abs() < f32::EPSILON);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatStats {
    health: f32,
    max_health: f32,
    base_attack: f32,
    stamina: f32,
    max_stamina: f32,
    stamina_regen: f32,
    flags: StatusFlags,
}

impl CombatStats {
    /// Creates stats at full health with the given base attack.
    ///
    /// A non-positive or non-finite `max_health` is clamped to 1.
    #[must_use]
    pub fn new(max_health: f32, base_attack: f32) -> Self {
        let max_health = if max_health.is_finite() && max_health > 0.0 {
            max_health
        } else {
            warn!(max_health, "invalid max health, clamping to 1");
            1.0
        };
        Self {
            health: max_health,
            max_health,
            base_attack: base_attack.max(0.0),
            stamina: 0.0,
            max_stamina: 0.0,
            stamina_regen: 0.0,
            flags: StatusFlags::empty(),
        }
    }

    /// Adds a stamina pool that starts full and regenerates at
    /// `regen_per_second`.
    #[must_use]
    pub fn with_stamina(mut self, max_stamina: f32, regen_per_second: f32) -> Self {
        self.max_stamina = max_stamina.max(0.0);
        self.stamina = self.max_stamina;
        self.stamina_regen = regen_per_second.max(0.0);
        self
    }

    /// Current health. Never negative.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Unarmed attack value, used when the entity carries no weapon.
    #[must_use]
    pub const fn base_attack(&self) -> f32 {
        self.base_attack
    }

    /// Current stamina.
    #[must_use]
    pub const fn stamina(&self) -> f32 {
        self.stamina
    }

    /// Maximum stamina. Zero means the entity has no stamina pool.
    #[must_use]
    pub const fn max_stamina(&self) -> f32 {
        self.max_stamina
    }

    /// True once health has reached zero.
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.flags.contains(StatusFlags::DEAD)
    }

    /// Current status flags.
    #[must_use]
    pub const fn flags(&self) -> StatusFlags {
        self.flags
    }

    /// Applies damage, clamping health at zero.
    ///
    /// Non-positive or non-finite amounts are discarded. Damage against an
    /// already-dead entity is a no-op, so `died` is reported exactly once
    /// per entity lifetime.
    pub fn apply_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.is_dead() || !amount.is_finite() || amount <= 0.0 {
            return DamageOutcome {
                changed: false,
                died: false,
                health: self.health,
            };
        }
        self.health = (self.health - amount).max(0.0);
        let died = self.health == 0.0;
        if died {
            self.flags.insert(StatusFlags::DEAD);
        }
        DamageOutcome {
            changed: true,
            died,
            health: self.health,
        }
    }

    /// Writes health directly, clamped at zero. Maximum health is a display
    /// reference, not a ceiling, so overheal writes stand.
    ///
    /// Returns true if the value changed. Writing zero kills the entity
    /// through the same latch as [`CombatStats::apply_damage`].
    pub fn set_health(&mut self, value: f32) -> bool {
        if !value.is_finite() {
            warn!(value, "discarding non-finite health write");
            return false;
        }
        let clamped = value.max(0.0);
        if (clamped - self.health).abs() < f32::EPSILON {
            return false;
        }
        self.health = clamped;
        if self.health == 0.0 {
            self.flags.insert(StatusFlags::DEAD);
        }
        true
    }

    /// Writes maximum health. Current health is left alone; shrinking the
    /// maximum below it simply leaves the entity overhealed.
    pub fn set_max_health(&mut self, value: f32) -> bool {
        if !value.is_finite() || value <= 0.0 {
            warn!(value, "discarding invalid max health write");
            return false;
        }
        if (value - self.max_health).abs() < f32::EPSILON {
            return false;
        }
        self.max_health = value;
        true
    }

    /// Spends stamina if enough is available. Returns false (and spends
    /// nothing) otherwise.
    pub fn spend_stamina(&mut self, amount: f32) -> bool {
        if !amount.is_finite() || amount < 0.0 {
            return false;
        }
        if self.stamina >= amount {
            self.stamina -= amount;
            true
        } else {
            false
        }
    }

    /// Marks the death event as published. Returns true exactly once, on the
    /// first call after death.
    pub(crate) fn announce_death(&mut self) -> bool {
        if self.is_dead() && !self.flags.contains(StatusFlags::DEATH_ANNOUNCED) {
            self.flags.insert(StatusFlags::DEATH_ANNOUNCED);
            true
        } else {
            false
        }
    }
}

impl Component for CombatStats {
    fn key(&self) -> ComponentKey {
        ComponentKey::Stats
    }

    // Stats regenerate before behavior components read them.
    fn priority(&self) -> i32 {
        -100
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>, fx: &mut Effects) {
        if self.is_dead() || self.max_stamina <= 0.0 || self.stamina >= self.max_stamina {
            return;
        }
        let before = self.stamina;
        self.stamina = (self.stamina + self.stamina_regen * ctx.dt).min(self.max_stamina);
        if (self.stamina - before).abs() > f32::EPSILON {
            fx.publish_entity(
                ctx.id,
                GameEvent::StaminaChanged {
                    value: self.stamina,
                },
            );
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl KeyedComponent for CombatStats {
    const KEY: ComponentKey = ComponentKey::Stats;
}

// =============================================================================
// WeaponStats
// =============================================================================

/// Weapon attack value, upgrade track and firing cooldown.
///
/// Upgrading doubles the attack value until the stage cap; further upgrade
/// calls are logged no-ops. `disable_damage` zeroes the effective attack
/// value (a training-dummy switch) without touching the stored value.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeaponStats {
    base_attack: f32,
    cooldown: f32,
    cooldown_remaining: f32,
    damage_multiplier: f32,
    upgrade_stage: u8,
    max_upgrade_stage: u8,
    /// Suppresses dealt damage while set; contact and despawn behavior is
    /// unaffected.
    pub disable_damage: bool,
}

impl WeaponStats {
    /// Creates a weapon at stage 1 with the given attack value and cooldown.
    ///
    /// Any cooldown ≥ 0 is valid (zero fires every tick); negative or
    /// non-finite input is clamped up to [`MIN_COOLDOWN`] with a warning.
    #[must_use]
    pub fn new(base_attack: f32, cooldown: f32) -> Self {
        let cooldown = if cooldown.is_finite() && cooldown >= 0.0 {
            cooldown
        } else {
            warn!(cooldown, "invalid weapon cooldown, clamping");
            MIN_COOLDOWN
        };
        Self {
            base_attack: base_attack.max(0.0),
            cooldown,
            cooldown_remaining: 0.0,
            damage_multiplier: 1.0,
            upgrade_stage: 1,
            max_upgrade_stage: 4,
            disable_damage: false,
        }
    }

    /// Overrides the upgrade stage cap (minimum 1).
    #[must_use]
    pub fn with_max_stage(mut self, max_stage: u8) -> Self {
        self.max_upgrade_stage = max_stage.max(1);
        self
    }

    /// Sets a damage multiplier applied on top of the upgraded attack value.
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f32) -> Self {
        self.damage_multiplier = multiplier.max(0.0);
        self
    }

    /// Stored (pre-multiplier) attack value.
    #[must_use]
    pub const fn base_attack(&self) -> f32 {
        self.base_attack
    }

    /// Current upgrade stage, starting at 1.
    #[must_use]
    pub const fn upgrade_stage(&self) -> u8 {
        self.upgrade_stage
    }

    /// Effective attack value: zero while damage is disabled, otherwise the
    /// stored value times the multiplier.
    #[must_use]
    pub fn attack_value(&self) -> f32 {
        if self.disable_damage {
            0.0
        } else {
            self.base_attack * self.damage_multiplier
        }
    }

    /// Doubles the attack value and advances one stage.
    ///
    /// Returns false (a logged no-op) once the stage cap is reached.
    pub fn upgrade(&mut self) -> bool {
        if self.upgrade_stage >= self.max_upgrade_stage {
            warn!(
                stage = self.upgrade_stage,
                "weapon already at maximum upgrade stage"
            );
            return false;
        }
        self.base_attack *= 2.0;
        self.upgrade_stage += 1;
        debug!(
            stage = self.upgrade_stage,
            attack = self.base_attack,
            "weapon upgraded"
        );
        true
    }

    /// Consumes the cooldown if it has elapsed. Returns false while still
    /// cooling down.
    pub fn try_fire(&mut self) -> bool {
        if self.cooldown_remaining > 0.0 {
            return false;
        }
        self.cooldown_remaining = self.cooldown;
        true
    }

    /// True while the weapon is cooling down.
    #[must_use]
    pub fn is_cooling_down(&self) -> bool {
        self.cooldown_remaining > 0.0
    }
}

impl Component for WeaponStats {
    fn key(&self) -> ComponentKey {
        ComponentKey::Weapon
    }

    fn priority(&self) -> i32 {
        -90
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {
        if self.cooldown_remaining > 0.0 {
            self.cooldown_remaining = (self.cooldown_remaining - ctx.dt).max(0.0);
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl KeyedComponent for WeaponStats {
    const KEY: ComponentKey = ComponentKey::Weapon;
}

// =============================================================================
// PhysicsBody
// =============================================================================

/// Velocity integration and knockback susceptibility.
///
/// The body integrates its entity's position each tick and decays velocity
/// exponentially by `damping`. Knockback impulses land here (via
/// [`Effect::Impulse`](crate::effects::Effect)), already scaled by
/// `knockback_resistance`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhysicsBody {
    /// Current velocity in units per second.
    pub velocity: Vec2,
    knockback_resistance: f32,
    damping: f32,
}

impl PhysicsBody {
    /// Creates a body at rest. `knockback_resistance` is clamped to
    /// `[0, 1]`: 0 takes full knockback, 1 is immovable.
    #[must_use]
    pub fn new(knockback_resistance: f32) -> Self {
        Self {
            velocity: Vec2::ZERO,
            knockback_resistance: knockback_resistance.clamp(0.0, 1.0),
            damping: 0.0,
        }
    }

    /// Sets an exponential velocity decay rate, per second.
    #[must_use]
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping.max(0.0);
        self
    }

    /// Knockback resistance in `[0, 1]`.
    #[must_use]
    pub const fn knockback_resistance(&self) -> f32 {
        self.knockback_resistance
    }

    /// Adds a velocity impulse.
    pub fn apply_impulse(&mut self, impulse: Vec2) {
        self.velocity += impulse;
    }
}

impl Component for PhysicsBody {
    fn key(&self) -> ComponentKey {
        ComponentKey::Physics
    }

    // Integrates after behavior components have written velocity.
    fn priority(&self) -> i32 {
        100
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {
        if self.velocity != Vec2::ZERO {
            ctx.entity.translate(self.velocity * ctx.dt);
            if self.damping > 0.0 {
                self.velocity *= (-self.damping * ctx.dt).exp();
                if self.velocity.length_squared() < 1e-6 {
                    self.velocity = Vec2::ZERO;
                }
            }
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl KeyedComponent for PhysicsBody {
    const KEY: ComponentKey = ComponentKey::Physics;
}

// =============================================================================
// Tests
// =============================================================================

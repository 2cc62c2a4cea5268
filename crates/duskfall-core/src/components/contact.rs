//! Contact resolution: damage, knockback, projectile consumption.
//!
//! A [`ContactResponse`] reacts to collision events reported by the host's
//! physics. Strikes damage on every contact begin; projectiles additionally
//! consume themselves on a damaging contact, optionally spawning a one-shot
//! explosion effect.

use glam::Vec2;
use tracing::{debug, warn};

use crate::component::{Component, ComponentKey, KeyedComponent, SpawnCtx, UpdateCtx};
use crate::components::effect::OneShotEffect;
use crate::effects::Effects;
use crate::entity::{CombatStats, EntityTag, PhysicsBody, WeaponStats};
use crate::events::{GameEvent, Topic};
use crate::world::Blueprint;

/// Computes the knockback impulse for one contact.
///
/// Direction is from attacker toward defender (falling back to `+X` when the
/// two positions coincide); magnitude is `force * (1 - resistance)`. Returns
/// `None` when the result would not move the defender: non-positive force,
/// or resistance at or above 1.
#[must_use]
pub fn knockback_impulse(
    attacker: Vec2,
    defender: Vec2,
    force: f32,
    resistance: f32,
) -> Option<Vec2> {
    if !force.is_finite() || force <= 0.0 {
        return None;
    }
    let magnitude = force * (1.0 - resistance.clamp(0.0, 1.0));
    if magnitude <= 0.0 {
        return None;
    }
    let direction = (defender - attacker).try_normalize().unwrap_or(Vec2::X);
    Some(direction * magnitude)
}

/// Explosion payload for an explosive projectile.
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    /// Asset key of the explosion animation, checked against the resource
    /// provider before spawning.
    pub asset: String,
    /// Fallback lifetime of the spawned effect, in seconds.
    pub lifetime: f32,
}

/// How the owner behaves on contact.
#[derive(Debug, Clone, PartialEq)]
pub enum ContactKind {
    /// Persistent attacker: damages on every contact begin, never consumed.
    Strike,
    /// Consumed by its first damaging contact; may leave an explosion
    /// effect behind.
    Projectile {
        /// Explosion to spawn at the impact point, if any.
        explosion: Option<Explosion>,
    },
}

/// Collision reaction: damage eligible targets, knock them back, and (for
/// projectiles) self-despawn.
///
/// The damage amount comes from the owner's weapon (effective attack value)
/// or, lacking one, its combat stats' base attack. A weapon with damage
/// disabled still despawns a projectile on contact; only the damage is
/// suppressed.
#[derive(Debug, Clone)]
pub struct ContactResponse {
    kind: ContactKind,
    knockback_force: f32,
    damages: Vec<EntityTag>,
}

impl ContactResponse {
    /// Creates a response that damages entities carrying any of `damages`.
    #[must_use]
    pub fn new(kind: ContactKind, damages: Vec<EntityTag>) -> Self {
        Self {
            kind,
            knockback_force: 0.0,
            damages,
        }
    }

    /// Adds knockback with the given force (clamped at zero).
    #[must_use]
    pub fn with_knockback(mut self, force: f32) -> Self {
        self.knockback_force = force.max(0.0);
        self
    }

    /// Knockback force applied on damaging contact.
    #[must_use]
    pub const fn knockback_force(&self) -> f32 {
        self.knockback_force
    }

    /// The contact behavior kind.
    #[must_use]
    pub const fn kind(&self) -> &ContactKind {
        &self.kind
    }

    fn spawn_explosion(
        explosion: &Explosion,
        position: Vec2,
        ctx: &mut UpdateCtx<'_>,
        fx: &mut Effects,
    ) {
        if let Some(resources) = ctx.services.resources.as_mut() {
            if !resources.is_ready(&explosion.asset) {
                // Request now so a later projectile finds it loaded.
                resources.request(&explosion.asset);
                warn!(asset = %explosion.asset, "explosion asset not ready, skipping effect");
                return;
            }
        }
        fx.spawn(
            Blueprint::new(EntityTag::Effect, position)
                .with(OneShotEffect::new(explosion.asset.clone(), explosion.lifetime)),
        );
    }
}

impl Component for ContactResponse {
    fn key(&self) -> ComponentKey {
        ComponentKey::Contact
    }

    fn spawned(&mut self, ctx: &mut SpawnCtx<'_>) {
        ctx.subscribe(Topic::CollisionStart);
    }

    fn on_event(&mut self, event: &GameEvent, ctx: &mut UpdateCtx<'_>, fx: &mut Effects) {
        let GameEvent::CollisionStart { other } = event else {
            return;
        };
        let Some(target) = ctx.view.get(*other) else {
            return;
        };
        if !self.damages.contains(&target.tag()) {
            return;
        }

        let amount = ctx
            .entity
            .component::<WeaponStats>()
            .map(WeaponStats::attack_value)
            .or_else(|| {
                ctx.entity
                    .component::<CombatStats>()
                    .map(CombatStats::base_attack)
            })
            .unwrap_or(0.0);

        if amount > 0.0 {
            fx.damage(*other, amount, Some(ctx.id));
        } else {
            debug!(attacker = %ctx.id, target = %other, "contact damage suppressed");
        }

        if self.knockback_force > 0.0 {
            let resistance = target
                .component::<PhysicsBody>()
                .map_or(1.0, PhysicsBody::knockback_resistance);
            if let Some(impulse) = knockback_impulse(
                ctx.entity.position(),
                target.position(),
                self.knockback_force,
                resistance,
            ) {
                fx.impulse(*other, impulse);
            }
        }

        if let ContactKind::Projectile { explosion } = &self.kind {
            // Consumed regardless of whether damage landed.
            ctx.entity.flag_removal();
            if let Some(explosion) = explosion {
                let position = ctx.entity.position();
                Self::spawn_explosion(explosion, position, ctx, fx);
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

impl KeyedComponent for ContactResponse {
    const KEY: ComponentKey = ComponentKey::Contact;
}

#[cfg(test)]
mod tests {
    use super::*;

    mod knockback_tests {
        use super::*;

        #[test]
        fn direction_is_attacker_to_defender() {
            let impulse =
                knockback_impulse(Vec2::ZERO, Vec2::new(0.0, 3.0), 10.0, 0.0).unwrap();
            assert!((impulse - Vec2::new(0.0, 10.0)).length() < 1e-5);
        }

        #[test]
        fn resistance_scales_magnitude() {
            let impulse =
                knockback_impulse(Vec2::ZERO, Vec2::new(1.0, 0.0), 10.0, 0.75).unwrap();
            assert!((impulse.length() - 2.5).abs() < 1e-5);
        }

        #[test]
        fn full_resistance_yields_none() {
            assert!(knockback_impulse(Vec2::ZERO, Vec2::new(1.0, 0.0), 10.0, 1.0).is_none());
            assert!(knockback_impulse(Vec2::ZERO, Vec2::new(1.0, 0.0), 10.0, 5.0).is_none());
        }

        #[test]
        fn non_positive_force_yields_none() {
            assert!(knockback_impulse(Vec2::ZERO, Vec2::ONE, 0.0, 0.0).is_none());
            assert!(knockback_impulse(Vec2::ZERO, Vec2::ONE, -3.0, 0.0).is_none());
        }

        #[test]
        fn coincident_positions_fall_back_to_x() {
            let impulse = knockback_impulse(Vec2::ONE, Vec2::ONE, 8.0, 0.5).unwrap();
            assert!((impulse - Vec2::new(4.0, 0.0)).length() < 1e-5);
        }
    }

    mod response_tests {
        use super::*;

        #[test]
        fn knockback_force_clamps_at_zero() {
            let response =
                ContactResponse::new(ContactKind::Strike, vec![EntityTag::Player])
                    .with_knockback(-5.0);
            assert!(response.knockback_force().abs() < f32::EPSILON);
        }
    }
}

//! Component trait and lifecycle plumbing.
//!
//! Components are the behavior units of the simulation. Each one is attached
//! to exactly one entity, keyed by [`ComponentKey`], and moves through a
//! strict lifecycle: `spawned` once when its entity enters the world, then
//! `update` every tick in ascending priority order, then `disposed` exactly
//! once when the entity (or the component) is removed at a safe point.
//!
//! During `update` and `on_event` a component receives [`UpdateCtx`], which
//! gives it mutable access to its own entity (including sibling components)
//! and read-only access to the rest of the registry. Mutations that touch
//! other entities or the registry's structure go through
//! [`Effects`](crate::effects::Effects) instead and apply at the end-of-tick
//! safe point.

use std::any::Any;
use std::fmt;

use crate::collab::Services;
use crate::effects::Effects;
use crate::entity::{Entity, EntityId};
use crate::events::{EventScope, GameEvent, Topic};
use crate::world::WorldView;

// =============================================================================
// Keys and lifecycle
// =============================================================================

/// Identifies a component kind within an entity.
///
/// An entity holds at most one component per key. Keys also name listeners in
/// the subscription table, so detaching a component releases exactly its own
/// subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ComponentKey {
    /// Combat stats (health, stamina, base attack).
    Stats,
    /// Weapon stats (attack value, upgrades, cooldown).
    Weapon,
    /// Physics body (velocity, knockback resistance).
    Physics,
    /// Contact response (damage on collision).
    Contact,
    /// Reward payout on death.
    Reward,
    /// Boss charge-attack state machine.
    ChargeSkill,
    /// Subsidiary patrol AI.
    Patrol,
    /// Wave orchestration.
    WaveDirector,
    /// One-shot effect lifetime.
    EffectLifetime,
    /// Extension point for game-specific components.
    Custom(&'static str),
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stats => write!(f, "stats"),
            Self::Weapon => write!(f, "weapon"),
            Self::Physics => write!(f, "physics"),
            Self::Contact => write!(f, "contact"),
            Self::Reward => write!(f, "reward"),
            Self::ChargeSkill => write!(f, "chargeSkill"),
            Self::Patrol => write!(f, "patrol"),
            Self::WaveDirector => write!(f, "waveDirector"),
            Self::EffectLifetime => write!(f, "effectLifetime"),
            Self::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// Lifecycle state of an attached component.
///
/// The world drives transitions: `Uncreated → Active` when the entity's
/// spawn hooks run, `Active → Disposed` at the removal safe point. `spawned`
/// and `disposed` each fire at most once per attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// Attached, spawn hook not yet run. Not updated, receives no events.
    Uncreated,
    /// Live: updated every tick, receives subscribed events.
    Active,
    /// Dispose hook has run. Terminal.
    Disposed,
}

// =============================================================================
// Contexts
// =============================================================================

/// Per-call context handed to [`Component::update`] and
/// [`Component::on_event`].
///
/// The component's own entity is borrowed mutably (the component itself is
/// temporarily out of its slot, so sibling access cannot alias it); the rest
/// of the registry is visible read-only through `view`.
pub struct UpdateCtx<'a> {
    /// Read-only view of every other entity in the registry.
    pub view: WorldView<'a>,
    /// The entity this component is attached to.
    pub entity: &'a mut Entity,
    /// External collaborators (animation, resources).
    pub services: &'a mut Services,
    /// Id of the entity being updated.
    pub id: EntityId,
    /// Delta time for this tick, in seconds.
    pub dt: f32,
    /// Current tick count.
    pub tick: u64,
}

/// Context handed to [`Component::spawned`].
///
/// Spawn hooks initialize component state and register event subscriptions;
/// the requests are applied by the world after the hook returns.
pub struct SpawnCtx<'a> {
    /// The entity this component was just attached to.
    pub entity: &'a mut Entity,
    requests: Vec<(EventScope, Topic)>,
}

impl<'a> SpawnCtx<'a> {
    pub(crate) fn new(entity: &'a mut Entity) -> Self {
        Self {
            entity,
            requests: Vec::new(),
        }
    }

    /// Subscribes the component to `topic` events on its own entity's channel.
    pub fn subscribe(&mut self, topic: Topic) {
        let scope = EventScope::Entity(self.entity.id());
        self.requests.push((scope, topic));
    }

    /// Subscribes the component to `topic` events on the global channel.
    pub fn subscribe_global(&mut self, topic: Topic) {
        self.requests.push((EventScope::Global, topic));
    }

    /// Subscribes the component to `topic` events on another entity's channel.
    pub fn subscribe_to(&mut self, entity: EntityId, topic: Topic) {
        self.requests.push((EventScope::Entity(entity), topic));
    }

    pub(crate) fn take_requests(&mut self) -> Vec<(EventScope, Topic)> {
        std::mem::take(&mut self.requests)
    }
}

// =============================================================================
// Component trait
// =============================================================================

/// An attachable behavior unit.
///
/// Implementations override the hooks they need; every hook has a no-op
/// default except [`Component::key`] and the `Any` plumbing.
///
/// # Contract
///
/// - `spawned` runs once, before the first `update`
/// - `update` runs every tick while the component and its entity are enabled,
///   in ascending [`Component::priority`] order within the entity
/// - `on_event` runs for events matching a subscription made in `spawned`
/// - `disposed` runs once at the removal safe point; after it the component
///   is never called again
pub trait Component: fmt::Debug + 'static {
    /// The key this component is stored and subscribed under.
    fn key(&self) -> ComponentKey;

    /// Update ordering within the entity; lower runs first. Ties break on
    /// key order.
    fn priority(&self) -> i32 {
        0
    }

    /// Called once when the component's entity enters the world (or when the
    /// component is attached to an already-live entity).
    fn spawned(&mut self, _ctx: &mut SpawnCtx<'_>) {}

    /// Called every tick.
    fn update(&mut self, _ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {}

    /// Called for each event matching one of this component's subscriptions.
    fn on_event(&mut self, _event: &GameEvent, _ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {}

    /// Called once when the component is removed at a safe point.
    fn disposed(&mut self) {}

    /// Upcast for typed downcasting via [`Entity::component`].
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for typed downcasting via [`Entity::component_mut`].
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// A component kind with a statically known key.
///
/// Implemented by every concrete component in this crate; enables the typed
/// [`Entity::component`] lookup without naming the key at the call site.
pub trait KeyedComponent: Component + Sized {
    /// The key instances of this type are stored under.
    const KEY: ComponentKey;
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod key_tests {
        use super::*;

        #[test]
        fn keys_are_ordered_and_hashable() {
            let mut keys = vec![
                ComponentKey::WaveDirector,
                ComponentKey::Stats,
                ComponentKey::Custom("aaa"),
            ];
            keys.sort();
            assert_eq!(keys[0], ComponentKey::Stats);
        }

        #[test]
        fn display_names() {
            assert_eq!(ComponentKey::Stats.to_string(), "stats");
            assert_eq!(ComponentKey::ChargeSkill.to_string(), "chargeSkill");
            assert_eq!(ComponentKey::Custom("probe").to_string(), "probe");
        }
    }

    mod spawn_ctx_tests {
        use super::*;
        use crate::entity::{Entity, EntityTag};
        use glam::Vec2;

        #[test]
        fn subscriptions_are_collected() {
            let mut entity = Entity::new(EntityId::new(5), EntityTag::Enemy, Vec2::ZERO);
            let mut ctx = SpawnCtx::new(&mut entity);
            ctx.subscribe(Topic::Death);
            ctx.subscribe_global(Topic::Unlock);
            ctx.subscribe_to(EntityId::new(9), Topic::CollisionStart);

            let requests = ctx.take_requests();
            assert_eq!(
                requests,
                vec![
                    (EventScope::Entity(EntityId::new(5)), Topic::Death),
                    (EventScope::Global, Topic::Unlock),
                    (EventScope::Entity(EntityId::new(9)), Topic::CollisionStart),
                ]
            );
            assert!(ctx.take_requests().is_empty());
        }
    }
}

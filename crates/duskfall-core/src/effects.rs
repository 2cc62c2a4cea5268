//! Deferred mutation queue.
//!
//! Components never mutate other entities or the registry's structure
//! directly: while the tick loop iterates, such writes would invalidate the
//! iteration (and, in Rust terms, alias the borrow). Instead they queue
//! [`Effect`]s here; the world applies the queue at the end-of-tick safe
//! point, after every component's `update` has run.
//!
//! Event publication rides the same struct but drains earlier: events raised
//! during a component call are dispatched synchronously at the next component
//! boundary, still within the same tick.

use std::collections::VecDeque;

use glam::Vec2;

use crate::entity::EntityId;
use crate::events::{EventScope, GameEvent};
use crate::world::Blueprint;

/// A deferred world mutation, applied at the end-of-tick safe point.
#[derive(Debug)]
pub enum Effect {
    /// Flag an entity for removal; it is reaped at the safe point.
    Despawn(EntityId),
    /// Spawn a new entity from a blueprint.
    Spawn(Blueprint),
    /// Apply damage to an entity's combat stats.
    Damage {
        /// Entity taking the damage.
        target: EntityId,
        /// Damage amount; non-positive amounts are discarded on apply.
        amount: f32,
        /// Attacking entity, when there is one (used for kill attribution).
        source: Option<EntityId>,
    },
    /// Add a velocity impulse to an entity's physics body.
    Impulse {
        /// Entity receiving the impulse.
        target: EntityId,
        /// Velocity delta, already scaled by knockback resistance.
        impulse: Vec2,
    },
    /// Credit currency to a beneficiary's ledger balance.
    Credit {
        /// Entity whose balance is credited.
        beneficiary: EntityId,
        /// Amount to add.
        amount: u64,
    },
}

/// Accumulator for deferred mutations and pending events, handed to every
/// component hook.
#[derive(Debug, Default)]
pub struct Effects {
    queued: Vec<Effect>,
    events: VecDeque<(EventScope, GameEvent)>,
}

impl Effects {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an arbitrary effect.
    pub fn push(&mut self, effect: Effect) {
        self.queued.push(effect);
    }

    /// Flags `entity` for removal at the safe point.
    pub fn despawn(&mut self, entity: EntityId) {
        self.queued.push(Effect::Despawn(entity));
    }

    /// Queues a blueprint spawn.
    pub fn spawn(&mut self, blueprint: Blueprint) {
        self.queued.push(Effect::Spawn(blueprint));
    }

    /// Queues damage against `target`.
    pub fn damage(&mut self, target: EntityId, amount: f32, source: Option<EntityId>) {
        self.queued.push(Effect::Damage {
            target,
            amount,
            source,
        });
    }

    /// Queues a velocity impulse on `target`.
    pub fn impulse(&mut self, target: EntityId, impulse: Vec2) {
        self.queued.push(Effect::Impulse { target, impulse });
    }

    /// Queues a currency credit.
    pub fn credit(&mut self, beneficiary: EntityId, amount: u64) {
        self.queued.push(Effect::Credit {
            beneficiary,
            amount,
        });
    }

    /// Publishes an event on an entity's channel.
    pub fn publish_entity(&mut self, entity: EntityId, event: GameEvent) {
        self.events.push_back((EventScope::Entity(entity), event));
    }

    /// Publishes an event on the global broadcast channel.
    pub fn publish_global(&mut self, event: GameEvent) {
        self.events.push_back((EventScope::Global, event));
    }

    /// Publishes an event on an explicit scope.
    pub fn publish(&mut self, scope: EventScope, event: GameEvent) {
        self.events.push_back((scope, event));
    }

    /// Pops the oldest undispatched event, if any.
    pub(crate) fn pop_event(&mut self) -> Option<(EventScope, GameEvent)> {
        self.events.pop_front()
    }

    /// Takes the queued mutations, leaving the accumulator's event side
    /// untouched.
    pub(crate) fn take_queued(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.queued)
    }

    /// Returns true if no mutations and no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queued.is_empty() && self.events.is_empty()
    }

    /// Returns the number of queued mutations.
    #[must_use]
    pub fn queued_len(&self) -> usize {
        self.queued.len()
    }
}

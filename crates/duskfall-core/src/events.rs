//! Typed event vocabulary and subscription bookkeeping.
//!
//! Events are the notification channel between the simulation core and its
//! collaborators (UI, audio, animation) as well as between components on the
//! same entity (death → reward payout). The vocabulary is small and fixed, so
//! it is a tagged union rather than string-keyed topics; every event maps to
//! a [`Topic`] used for subscription keying.
//!
//! # Delivery contract
//!
//! Dispatch is synchronous and single-threaded. Events raised during a tick
//! are delivered within the same tick, at component boundaries, in
//! subscription order. Listeners registered during an in-flight dispatch are
//! not guaranteed to be invoked within that same dispatch pass (the
//! subscriber list is snapshotted before delivery).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::component::ComponentKey;
use crate::entity::EntityId;

// =============================================================================
// Events and topics
// =============================================================================

/// A notification raised by the simulation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// An entity's health was written; carries the new value.
    UpdateHealth {
        /// Health after the write (never negative).
        value: f32,
    },
    /// An entity's maximum health was written; carries the new value.
    UpdateMaxHealth {
        /// Maximum health after the write.
        value: f32,
    },
    /// An entity's stamina changed; carries the new value.
    StaminaChanged {
        /// Stamina after the change.
        value: f32,
    },
    /// An entity's health reached zero. Raised at most once per entity
    /// lifetime.
    Death,
    /// The physics collaborator reported a contact beginning with `other`.
    CollisionStart {
        /// The other entity in the contact pair.
        other: EntityId,
    },
    /// The physics collaborator reported a contact ending with `other`.
    CollisionEnd {
        /// The other entity in the contact pair.
        other: EntityId,
    },
    /// External cancellation of an in-flight skill; reverts the skill to its
    /// initial state on its next update.
    SkillCancelled,
    /// Begins (or restarts) a wave session on a wave director entity.
    WaveSessionStart,
    /// Cross-entity broadcast keyed by a shared identifier (e.g. a gate
    /// unlock). Delivered on the global channel.
    Unlock {
        /// Shared identifier naming what was unlocked.
        key: String,
    },
}

impl GameEvent {
    /// Returns the subscription topic for this event.
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::UpdateHealth { .. } => Topic::UpdateHealth,
            Self::UpdateMaxHealth { .. } => Topic::UpdateMaxHealth,
            Self::StaminaChanged { .. } => Topic::StaminaChanged,
            Self::Death => Topic::Death,
            Self::CollisionStart { .. } => Topic::CollisionStart,
            Self::CollisionEnd { .. } => Topic::CollisionEnd,
            Self::SkillCancelled => Topic::SkillCancelled,
            Self::WaveSessionStart => Topic::WaveSessionStart,
            Self::Unlock { .. } => Topic::Unlock,
        }
    }
}

/// Subscription key for a class of [`GameEvent`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Topic {
    /// Health writes.
    UpdateHealth,
    /// Maximum-health writes.
    UpdateMaxHealth,
    /// Stamina changes.
    StaminaChanged,
    /// Entity death.
    Death,
    /// Contact begin.
    CollisionStart,
    /// Contact end.
    CollisionEnd,
    /// Skill cancellation.
    SkillCancelled,
    /// Wave session start.
    WaveSessionStart,
    /// Global unlock broadcast.
    Unlock,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::UpdateHealth => "updateHealth",
            Self::UpdateMaxHealth => "updateMaxHealth",
            Self::StaminaChanged => "staminaChanged",
            Self::Death => "death",
            Self::CollisionStart => "collisionStart",
            Self::CollisionEnd => "collisionEnd",
            Self::SkillCancelled => "skillCancelled",
            Self::WaveSessionStart => "waveSessionStart",
            Self::Unlock => "unlock",
        };
        write!(f, "{name}")
    }
}

/// Where an event is published: a single entity's channel or the global
/// broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventScope {
    /// The per-entity channel of the given entity.
    Entity(EntityId),
    /// The cross-entity broadcast channel.
    Global,
}

// =============================================================================
// Subscriptions
// =============================================================================

/// A component registered to receive events: the entity it lives on plus its
/// component key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Subscriber {
    /// Entity the listening component is attached to.
    pub entity: EntityId,
    /// Key of the listening component on that entity.
    pub key: ComponentKey,
}

/// Topic-keyed multimap of subscribers, per scope.
///
/// Subscribers are stored in registration order and delivery follows that
/// order. The table is owned by the world so that detaching a component (or
/// despawning its entity) reliably releases every subscription it created.
#[derive(Debug, Default)]
pub struct SubscriptionTable {
    subs: BTreeMap<(EventScope, Topic), Vec<Subscriber>>,
}

impl SubscriptionTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `subscriber` for `topic` events on `scope`.
    ///
    /// Duplicate registrations are collapsed; a component listens to a given
    /// (scope, topic) pair at most once.
    pub fn subscribe(&mut self, scope: EventScope, topic: Topic, subscriber: Subscriber) {
        let entry = self.subs.entry((scope, topic)).or_default();
        if !entry.contains(&subscriber) {
            entry.push(subscriber);
        }
    }

    /// Returns a snapshot of the subscribers for `topic` on `scope`, in
    /// registration order.
    #[must_use]
    pub fn subscribers(&self, scope: EventScope, topic: Topic) -> Vec<Subscriber> {
        self.subs.get(&(scope, topic)).cloned().unwrap_or_default()
    }

    /// Removes every subscription held by components of `entity`, and every
    /// channel scoped to `entity`.
    pub fn purge_entity(&mut self, entity: EntityId) {
        self.subs.retain(|(scope, _), _| *scope != EventScope::Entity(entity));
        for subs in self.subs.values_mut() {
            subs.retain(|s| s.entity != entity);
        }
        self.subs.retain(|_, subs| !subs.is_empty());
    }

    /// Removes every subscription held by one component.
    pub fn purge_component(&mut self, entity: EntityId, key: ComponentKey) {
        for subs in self.subs.values_mut() {
            subs.retain(|s| !(s.entity == entity && s.key == key));
        }
        self.subs.retain(|_, subs| !subs.is_empty());
    }

    /// Returns the total number of live subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subs.values().map(Vec::len).sum()
    }

    /// Returns true if no subscriptions are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subs.is_empty()
    }
}

/// A dispatched event, recorded for external listeners (UI, audio, tests).
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    /// Tick on which the event was dispatched.
    pub tick: u64,
    /// Channel the event was published on.
    pub scope: EventScope,
    /// The event itself.
    pub event: GameEvent,
}

// =============================================================================
// Tests
// =============================================================================

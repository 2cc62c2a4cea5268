//! Entity types for the simulation core.
//!
//! This module provides:
//! - [`EntityId`]: unique identifier, ordered for deterministic iteration
//! - [`EntityTag`]: coarse classification used by queries and contact rules
//! - [`Entity`]: a position plus a type-keyed set of components
//!
//! # Component storage
//!
//! Each entity holds at most one component per [`ComponentKey`]. Components
//! are stored in slots that track lifecycle state, an update-ordering
//! priority, and an enabled flag (used to suspend subsidiary behaviors such
//! as the boss patrol AI without detaching them). Slot contents are taken out
//! during their own `update()`/`on_event()` call, which is why a component
//! never observes itself through [`Entity::component`].

pub mod stats;

use std::collections::BTreeMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

pub use stats::{CombatStats, PhysicsBody, StatusFlags, WeaponStats};

use crate::component::{Component, ComponentKey, KeyedComponent, LifecycleState};
use crate::error::CoreError;

// =============================================================================
// EntityId
// =============================================================================

/// Unique identifier for an entity.
///
/// `EntityId` is a newtype wrapper around `u64`. IDs are assigned
/// monotonically by the world and are immutable once assigned.
///
/// # Ordering
///
/// Entity IDs are ordered by their numeric value, which is what gives the
/// registry its deterministic iteration order.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

impl From<EntityId> for u64 {
    fn from(id: EntityId) -> Self {
        id.0
    }
}

// =============================================================================
// EntityTag
// =============================================================================

/// Coarse entity classification.
///
/// Tags drive registry queries (the wave director scans for live `Enemy`
/// entities, the boss skill looks for the nearest `Player`) and contact
/// rules (what a projectile is allowed to damage).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// The player character.
    Player,
    /// A regular enemy, counted by the wave director's liveness scan.
    Enemy,
    /// A boss enemy driving a timed attack state machine.
    Boss,
    /// An in-flight projectile.
    Projectile,
    /// A transient, self-disposing visual effect.
    Effect,
    /// A non-spatial orchestration entity (wave director).
    Director,
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player => write!(f, "Player"),
            Self::Enemy => write!(f, "Enemy"),
            Self::Boss => write!(f, "Boss"),
            Self::Projectile => write!(f, "Projectile"),
            Self::Effect => write!(f, "Effect"),
            Self::Director => write!(f, "Director"),
        }
    }
}

// =============================================================================
// Component slots
// =============================================================================

/// Storage slot for one attached component.
///
/// The slot survives while its component is temporarily taken out for an
/// `update()` or `on_event()` call, so sibling lookups during that window
/// simply see the component as absent.
#[derive(Debug)]
pub(crate) struct ComponentSlot {
    pub(crate) priority: i32,
    pub(crate) enabled: bool,
    pub(crate) state: LifecycleState,
    pub(crate) component: Option<Box<dyn Component>>,
}

// =============================================================================
// Entity
// =============================================================================

/// An addressable simulation object.
///
/// An entity combines a unique [`EntityId`], an [`EntityTag`], a 2D position,
/// an enabled flag, a pending-removal flag, and its component slots. Entities
/// are constructed by the world from a [`Blueprint`](crate::world::Blueprint);
/// structural removal is always deferred via the pending-removal flag and
/// reaped at the world's safe point.
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    position: Vec2,
    enabled: bool,
    pending_removal: bool,
    slots: BTreeMap<ComponentKey, ComponentSlot>,
}

impl Entity {
    /// Creates a bare entity with no components.
    #[must_use]
    pub fn new(id: EntityId, tag: EntityTag, position: Vec2) -> Self {
        Self {
            id,
            tag,
            position,
            enabled: true,
            pending_removal: false,
            slots: BTreeMap::new(),
        }
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns the entity's position.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Writes the entity's position.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Moves the entity by `delta`.
    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    /// Returns true if the entity participates in updates and queries.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Enables or disables the entity. Disabled entities are skipped by the
    /// update loop and excluded from registry queries.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Returns true if the entity is flagged for removal at the next safe
    /// point.
    #[must_use]
    pub const fn is_pending_removal(&self) -> bool {
        self.pending_removal
    }

    /// Flags the entity for removal at the next safe point. Safe to call
    /// from inside the entity's own update or event handlers.
    pub fn flag_removal(&mut self) {
        self.pending_removal = true;
    }

    // -------------------------------------------------------------------------
    // Component access
    // -------------------------------------------------------------------------

    /// Attaches a component, keyed by [`Component::key`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateComponent`] if a component with the same
    /// key is already attached.
    pub fn attach(&mut self, component: Box<dyn Component>) -> Result<(), CoreError> {
        let key = component.key();
        if self.slots.contains_key(&key) {
            return Err(CoreError::DuplicateComponent { id: self.id, key });
        }
        self.slots.insert(
            key,
            ComponentSlot {
                priority: component.priority(),
                enabled: true,
                state: LifecycleState::Uncreated,
                component: Some(component),
            },
        );
        Ok(())
    }

    /// Returns true if a component with `key` is attached.
    #[must_use]
    pub fn has(&self, key: ComponentKey) -> bool {
        self.slots.contains_key(&key)
    }

    /// Fetches a typed component by its key, O(log n) in the slot count.
    ///
    /// Returns `None` if absent, or if the component is currently taken out
    /// for its own update/event call.
    #[must_use]
    pub fn component<C: KeyedComponent>(&self) -> Option<&C> {
        self.slots
            .get(&C::KEY)?
            .component
            .as_deref()?
            .as_any()
            .downcast_ref::<C>()
    }

    /// Mutable variant of [`Entity::component`].
    #[must_use]
    pub fn component_mut<C: KeyedComponent>(&mut self) -> Option<&mut C> {
        self.slots
            .get_mut(&C::KEY)?
            .component
            .as_deref_mut()?
            .as_any_mut()
            .downcast_mut::<C>()
    }

    /// Enables or disables one component without detaching it.
    ///
    /// Returns false if no such component is attached. Used by the boss skill
    /// to suspend and resume its subsidiary patrol AI.
    pub fn set_component_enabled(&mut self, key: ComponentKey, enabled: bool) -> bool {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.enabled = enabled;
            true
        } else {
            false
        }
    }

    /// Returns the enabled flag of a component, if attached.
    #[must_use]
    pub fn component_enabled(&self, key: ComponentKey) -> Option<bool> {
        self.slots.get(&key).map(|s| s.enabled)
    }

    /// Returns the lifecycle state of a component, if attached.
    #[must_use]
    pub fn lifecycle(&self, key: ComponentKey) -> Option<LifecycleState> {
        self.slots.get(&key).map(|s| s.state)
    }

    /// Returns attached component keys in `(priority, key)` ascending order,
    /// i.e. the order their `update()` hooks run within a tick.
    #[must_use]
    pub fn update_order(&self) -> Vec<ComponentKey> {
        let mut keys: Vec<(i32, ComponentKey)> = self
            .slots
            .iter()
            .map(|(key, slot)| (slot.priority, *key))
            .collect();
        keys.sort_unstable();
        keys.into_iter().map(|(_, key)| key).collect()
    }

    // -------------------------------------------------------------------------
    // Slot plumbing (world-internal)
    // -------------------------------------------------------------------------

    /// Takes an active, enabled component out of its slot for an update or
    /// event call.
    pub(crate) fn take_active(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        let slot = self.slots.get_mut(&key)?;
        if slot.state == LifecycleState::Active && slot.enabled {
            slot.component.take()
        } else {
            None
        }
    }

    /// Takes a component regardless of lifecycle state (spawn/dispose hooks).
    pub(crate) fn take_any(&mut self, key: ComponentKey) -> Option<Box<dyn Component>> {
        self.slots.get_mut(&key)?.component.take()
    }

    /// Returns a taken component to its slot.
    pub(crate) fn put_back(&mut self, key: ComponentKey, component: Box<dyn Component>) {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.component = Some(component);
        }
    }

    /// Transitions a component's lifecycle state.
    pub(crate) fn set_lifecycle(&mut self, key: ComponentKey, state: LifecycleState) {
        if let Some(slot) = self.slots.get_mut(&key) {
            slot.state = state;
        }
    }

    /// Removes a component slot entirely (for detach/despawn).
    pub(crate) fn remove_slot(&mut self, key: ComponentKey) -> Option<ComponentSlot> {
        self.slots.remove(&key)
    }

    /// Returns all attached keys.
    pub(crate) fn keys(&self) -> Vec<ComponentKey> {
        self.slots.keys().copied().collect()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::{Component, ComponentKey, UpdateCtx};
    use crate::effects::Effects;

    #[derive(Debug)]
    struct Marker {
        key: ComponentKey,
        priority: i32,
    }

    impl Component for Marker {
        fn key(&self) -> ComponentKey {
            self.key
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn update(&mut self, _ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {}
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    }

    impl crate::component::KeyedComponent for Marker {
        const KEY: ComponentKey = ComponentKey::Custom("marker");
    }

    fn marker(priority: i32) -> Box<Marker> {
        Box::new(Marker {
            key: ComponentKey::Custom("marker"),
            priority,
        })
    }

    mod entity_id_tests {
        use super::*;

        #[test]
        fn new_creates_id_with_value() {
            let id = EntityId::new(42);
            assert_eq!(id.as_u64(), 42);
        }

        #[test]
        fn ordering() {
            let mut ids = vec![EntityId::new(3), EntityId::new(1), EntityId::new(2)];
            ids.sort();
            assert_eq!(
                ids,
                vec![EntityId::new(1), EntityId::new(2), EntityId::new(3)]
            );
        }

        #[test]
        fn debug_and_display_formats() {
            let id = EntityId::new(7);
            assert_eq!(format!("{id:?}"), "EntityId(7)");
            assert_eq!(format!("{id}"), "7");
        }

        #[test]
        fn conversions() {
            let id: EntityId = 9u64.into();
            let raw: u64 = id.into();
            assert_eq!(raw, 9);
        }

        #[test]
        fn serialization_roundtrip() {
            let id = EntityId::new(12345);
            let json = serde_json::to_string(&id).unwrap();
            let restored: EntityId = serde_json::from_str(&json).unwrap();
            assert_eq!(id, restored);
        }
    }

    mod entity_tests {
        use super::*;

        #[test]
        fn new_entity_defaults() {
            let entity = Entity::new(EntityId::new(1), EntityTag::Enemy, Vec2::new(3.0, 4.0));
            assert_eq!(entity.id(), EntityId::new(1));
            assert_eq!(entity.tag(), EntityTag::Enemy);
            assert_eq!(entity.position(), Vec2::new(3.0, 4.0));
            assert!(entity.is_enabled());
            assert!(!entity.is_pending_removal());
        }

        #[test]
        fn position_writes() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Player, Vec2::ZERO);
            entity.set_position(Vec2::new(10.0, 0.0));
            entity.translate(Vec2::new(0.0, 5.0));
            assert_eq!(entity.position(), Vec2::new(10.0, 5.0));
        }

        #[test]
        fn flag_removal_is_sticky() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Projectile, Vec2::ZERO);
            entity.flag_removal();
            assert!(entity.is_pending_removal());
        }

        #[test]
        fn attach_rejects_duplicate_key() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Enemy, Vec2::ZERO);
            entity.attach(marker(0)).unwrap();
            let err = entity.attach(marker(1)).unwrap_err();
            assert!(matches!(err, CoreError::DuplicateComponent { .. }));
        }

        #[test]
        fn typed_fetch_roundtrip() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Enemy, Vec2::ZERO);
            entity.attach(marker(3)).unwrap();
            let fetched = entity.component::<Marker>().unwrap();
            assert_eq!(fetched.priority, 3);
            entity.component_mut::<Marker>().unwrap().priority = 5;
            assert_eq!(entity.component::<Marker>().unwrap().priority, 5);
        }

        #[test]
        fn fetch_missing_returns_none() {
            let entity = Entity::new(EntityId::new(1), EntityTag::Enemy, Vec2::ZERO);
            assert!(entity.component::<Marker>().is_none());
        }

        #[test]
        fn update_order_sorts_by_priority_then_key() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Boss, Vec2::ZERO);
            entity
                .attach(Box::new(Marker {
                    key: ComponentKey::Patrol,
                    priority: 10,
                }))
                .unwrap();
            entity
                .attach(Box::new(Marker {
                    key: ComponentKey::ChargeSkill,
                    priority: 5,
                }))
                .unwrap();
            assert_eq!(
                entity.update_order(),
                vec![ComponentKey::ChargeSkill, ComponentKey::Patrol]
            );
        }

        #[test]
        fn component_enabled_toggle() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Boss, Vec2::ZERO);
            entity.attach(marker(0)).unwrap();
            assert_eq!(
                entity.component_enabled(ComponentKey::Custom("marker")),
                Some(true)
            );
            assert!(entity.set_component_enabled(ComponentKey::Custom("marker"), false));
            assert_eq!(
                entity.component_enabled(ComponentKey::Custom("marker")),
                Some(false)
            );
            assert!(!entity.set_component_enabled(ComponentKey::Stats, true));
        }

        #[test]
        fn take_active_respects_lifecycle_and_enabled() {
            let mut entity = Entity::new(EntityId::new(1), EntityTag::Enemy, Vec2::ZERO);
            let key = ComponentKey::Custom("marker");
            entity.attach(marker(0)).unwrap();

            // Uncreated components are not updated.
            assert!(entity.take_active(key).is_none());

            entity.set_lifecycle(key, LifecycleState::Active);
            let taken = entity.take_active(key).unwrap();
            // While taken, the typed fetch sees nothing.
            assert!(entity.component::<Marker>().is_none());
            entity.put_back(key, taken);
            assert!(entity.component::<Marker>().is_some());

            entity.set_component_enabled(key, false);
            assert!(entity.take_active(key).is_none());
        }
    }
}

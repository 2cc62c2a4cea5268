//! Authoritative entity registry and tick loop.
//!
//! The [`World`] owns every entity, the subscription table, the tick clock
//! and the collaborator slots. One call to [`World::step`] advances the
//! simulation one tick:
//!
//! 1. the clock advances and supplies the tick's delta
//! 2. every enabled entity updates its components in ascending priority
//!    order; events raised so far are dispatched after each entity
//! 3. the deferred effect queue flushes at the safe point, interleaving
//!    event dispatch until both are empty
//! 4. entities flagged for removal are reaped (dispose hooks, subscription
//!    purge)
//!
//! Iteration order is the `BTreeMap` key order of [`EntityId`], which makes a
//! session fully deterministic given the same spawn sequence.

use std::collections::BTreeMap;

use glam::Vec2;
use tracing::{debug, error, info, warn};

use crate::clock::TickClock;
use crate::collab::{AnimationDriver, ResourceProvider, Services};
use crate::component::{Component, ComponentKey, KeyedComponent, LifecycleState, SpawnCtx, UpdateCtx};
use crate::components::contact::{knockback_impulse, ContactResponse};
use crate::effects::{Effect, Effects};
use crate::entity::{CombatStats, Entity, EntityId, EntityTag, PhysicsBody, WeaponStats};
use crate::error::CoreError;
use crate::events::{EventRecord, EventScope, GameEvent, Subscriber, SubscriptionTable};

/// Upper bound on events dispatched per drain pass. A cascade deeper than
/// this is a feedback loop; the remainder is dropped with an error log.
const MAX_EVENT_CASCADE: usize = 256;

/// Upper bound on flush passes per safe point (spawns can queue further
/// effects).
const MAX_FLUSH_PASSES: usize = 32;

// =============================================================================
// Blueprint
// =============================================================================

/// A recipe for one entity: tag, initial position, components.
///
/// Blueprints are how everything enters the world, whether spawned directly
/// by the host or queued from inside a tick (projectile explosions, wave
/// enemies).
///
/// # Example
///
/// ```
/// use duskfall_core::{Blueprint, EntityTag};
/// use duskfall_core::entity::CombatStats;
/// use glam::Vec2;
///
/// let enemy = Blueprint::new(EntityTag::Enemy, Vec2::new(4.0, 0.0))
///     .with(CombatStats::new(30.0, 5.0));
/// ```
#[derive(Debug)]
pub struct Blueprint {
    tag: EntityTag,
    position: Vec2,
    components: Vec<Box<dyn Component>>,
}

impl Blueprint {
    /// Starts a blueprint with no components.
    #[must_use]
    pub fn new(tag: EntityTag, position: Vec2) -> Self {
        Self {
            tag,
            position,
            components: Vec::new(),
        }
    }

    /// Adds a component. A second component with the same key replaces the
    /// first with a warning.
    #[must_use]
    pub fn with<C: Component>(self, component: C) -> Self {
        self.with_boxed(Box::new(component))
    }

    /// Boxed variant of [`Blueprint::with`].
    #[must_use]
    pub fn with_boxed(mut self, component: Box<dyn Component>) -> Self {
        let key = component.key();
        if let Some(slot) = self.components.iter_mut().find(|c| c.key() == key) {
            warn!(%key, "blueprint already carries this component, replacing");
            *slot = component;
        } else {
            self.components.push(component);
        }
        self
    }

    /// The tag the spawned entity will carry.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// The position the spawned entity will start at.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }
}

// =============================================================================
// WorldView
// =============================================================================

/// Read-only window over the registry, handed to components during their own
/// update.
///
/// The entity currently being updated is absent from the view, so queries
/// from inside a component never observe its own (temporarily inconsistent)
/// entity.
#[derive(Clone, Copy)]
pub struct WorldView<'a> {
    entities: &'a BTreeMap<EntityId, Entity>,
}

impl<'a> WorldView<'a> {
    pub(crate) fn new(entities: &'a BTreeMap<EntityId, Entity>) -> Self {
        Self { entities }
    }

    /// Fetches an entity by id.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&'a Entity> {
        self.entities.get(&id)
    }

    /// Iterates every entity in id order.
    pub fn iter(&self) -> impl Iterator<Item = &'a Entity> {
        self.entities.values()
    }

    /// Returns an entity's position, if it exists.
    #[must_use]
    pub fn position_of(&self, id: EntityId) -> Option<Vec2> {
        self.entities.get(&id).map(Entity::position)
    }

    /// True if `entity` counts as alive: enabled, not flagged for removal,
    /// and (when it carries combat stats) not dead.
    #[must_use]
    pub fn is_alive(entity: &Entity) -> bool {
        if !entity.is_enabled() || entity.is_pending_removal() {
            return false;
        }
        entity
            .component::<CombatStats>()
            .map_or(true, |stats| !stats.is_dead())
    }

    /// True if any live entity carries `tag`.
    #[must_use]
    pub fn any_alive_with_tag(&self, tag: EntityTag) -> bool {
        self.entities
            .values()
            .any(|e| e.tag() == tag && Self::is_alive(e))
    }

    /// Number of live entities carrying `tag`.
    #[must_use]
    pub fn count_alive_with_tag(&self, tag: EntityTag) -> usize {
        self.entities
            .values()
            .filter(|e| e.tag() == tag && Self::is_alive(e))
            .count()
    }

    /// Nearest live entity carrying `tag`, by Euclidean distance from
    /// `from`. Linear scan; id order breaks distance ties.
    #[must_use]
    pub fn nearest_with_tag(&self, tag: EntityTag, from: Vec2) -> Option<&'a Entity> {
        let mut best: Option<(f32, &Entity)> = None;
        for entity in self.entities.values() {
            if entity.tag() != tag || !Self::is_alive(entity) {
                continue;
            }
            let dist = entity.position().distance_squared(from);
            match best {
                Some((best_dist, _)) if best_dist <= dist => {}
                _ => best = Some((dist, entity)),
            }
        }
        best.map(|(_, e)| e)
    }
}

// =============================================================================
// World
// =============================================================================

/// The simulation world: entity registry, tick loop, event plumbing.
pub struct World {
    entities: BTreeMap<EntityId, Entity>,
    next_id: u64,
    clock: TickClock,
    subscriptions: SubscriptionTable,
    event_log: Vec<EventRecord>,
    services: Services,
    ledger: BTreeMap<EntityId, u64>,
}

impl World {
    /// Creates an empty world ticking at the given delta.
    #[must_use]
    pub fn new(dt: f32) -> Self {
        Self {
            entities: BTreeMap::new(),
            next_id: 1,
            clock: TickClock::new(dt),
            subscriptions: SubscriptionTable::new(),
            event_log: Vec::new(),
            services: Services::default(),
            ledger: BTreeMap::new(),
        }
    }

    /// The world's clock.
    #[must_use]
    pub const fn clock(&self) -> &TickClock {
        &self.clock
    }

    /// Current tick count.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.clock.tick()
    }

    /// Number of entities in the registry (including those flagged for
    /// removal but not yet reaped).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// True if the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Read-only view over the whole registry.
    #[must_use]
    pub fn view(&self) -> WorldView<'_> {
        WorldView::new(&self.entities)
    }

    /// Fetches an entity by id.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable fetch of an entity by id.
    #[must_use]
    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// Typed component fetch on an entity.
    #[must_use]
    pub fn component<C: KeyedComponent>(&self, id: EntityId) -> Option<&C> {
        self.entities.get(&id)?.component::<C>()
    }

    /// Typed mutable component fetch on an entity.
    #[must_use]
    pub fn component_mut<C: KeyedComponent>(&mut self, id: EntityId) -> Option<&mut C> {
        self.entities.get_mut(&id)?.component_mut::<C>()
    }

    /// Currency balance credited to an entity.
    #[must_use]
    pub fn balance(&self, id: EntityId) -> u64 {
        self.ledger.get(&id).copied().unwrap_or(0)
    }

    /// Registers the animation collaborator.
    pub fn set_animation_driver(&mut self, driver: Box<dyn AnimationDriver>) {
        self.services.animation = Some(driver);
    }

    /// Registers the resource collaborator.
    pub fn set_resource_provider(&mut self, provider: Box<dyn ResourceProvider>) {
        self.services.resources = Some(provider);
    }

    /// Events dispatched so far. Cleared by [`World::take_event_log`].
    #[must_use]
    pub fn event_log(&self) -> &[EventRecord] {
        &self.event_log
    }

    /// Drains the dispatched-event log for external listeners.
    pub fn take_event_log(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.event_log)
    }

    // -------------------------------------------------------------------------
    // Structural operations
    // -------------------------------------------------------------------------

    /// Spawns an entity from a blueprint, running every component's spawn
    /// hook, and returns its id.
    pub fn spawn(&mut self, blueprint: Blueprint) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;

        let mut entity = Entity::new(id, blueprint.tag(), blueprint.position());
        for component in blueprint.components {
            // Blueprint::with already de-duplicated keys.
            if let Err(err) = entity.attach(component) {
                error!(%err, "dropping blueprint component");
            }
        }
        self.run_spawn_hooks(&mut entity);
        debug!(%id, tag = %entity.tag(), "entity spawned");
        self.entities.insert(id, entity);
        id
    }

    /// Flags an entity for removal at the next safe point.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if `id` is not in the registry.
    pub fn despawn(&mut self, id: EntityId) -> Result<(), CoreError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        entity.flag_removal();
        Ok(())
    }

    /// Attaches a component to a live entity, running its spawn hook
    /// immediately.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if `id` is not in the registry,
    /// or [`CoreError::DuplicateComponent`] if the key is taken.
    pub fn attach(&mut self, id: EntityId, component: Box<dyn Component>) -> Result<(), CoreError> {
        let mut entity = self
            .entities
            .remove(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        let result = entity.attach(component);
        if result.is_ok() {
            self.run_spawn_hooks(&mut entity);
        }
        self.entities.insert(id, entity);
        result
    }

    /// Detaches a component, running its dispose hook and releasing its
    /// subscriptions. Returns false if no such component was attached.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if `id` is not in the registry.
    pub fn detach(&mut self, id: EntityId, key: ComponentKey) -> Result<bool, CoreError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        let Some(mut slot) = entity.remove_slot(key) else {
            return Ok(false);
        };
        if slot.state == LifecycleState::Active {
            if let Some(component) = slot.component.as_mut() {
                component.disposed();
            }
        }
        self.subscriptions.purge_component(id, key);
        Ok(true)
    }

    /// Runs spawn hooks for any still-uncreated components on `entity`,
    /// applying the subscriptions they request.
    fn run_spawn_hooks(&mut self, entity: &mut Entity) {
        let id = entity.id();
        for key in entity.keys() {
            if entity.lifecycle(key) != Some(LifecycleState::Uncreated) {
                continue;
            }
            let Some(mut component) = entity.take_any(key) else {
                continue;
            };
            let requests = {
                let mut ctx = SpawnCtx::new(entity);
                component.spawned(&mut ctx);
                ctx.take_requests()
            };
            entity.put_back(key, component);
            entity.set_lifecycle(key, LifecycleState::Active);
            for (scope, topic) in requests {
                self.subscriptions
                    .subscribe(scope, topic, Subscriber { entity: id, key });
            }
        }
    }

    // -------------------------------------------------------------------------
    // Tick loop
    // -------------------------------------------------------------------------

    /// Advances the simulation one tick.
    pub fn step(&mut self) {
        let dt = self.clock.advance();
        let tick = self.clock.tick();
        let mut fx = Effects::new();

        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        for id in ids {
            let Some(mut entity) = self.entities.remove(&id) else {
                // Reaped mid-tick; nothing to do.
                continue;
            };
            if entity.is_enabled() && !entity.is_pending_removal() {
                for key in entity.update_order() {
                    let Some(mut component) = entity.take_active(key) else {
                        continue;
                    };
                    {
                        let mut ctx = UpdateCtx {
                            view: WorldView::new(&self.entities),
                            entity: &mut entity,
                            services: &mut self.services,
                            id,
                            dt,
                            tick,
                        };
                        component.update(&mut ctx, &mut fx);
                    }
                    entity.put_back(key, component);
                }
            }
            self.entities.insert(id, entity);
            self.drain_events(&mut fx);
        }

        self.flush(&mut fx);
    }

    /// Dispatches every pending event, including those raised by the
    /// handlers themselves, bounded by [`MAX_EVENT_CASCADE`].
    fn drain_events(&mut self, fx: &mut Effects) {
        let mut dispatched = 0usize;
        while let Some((scope, event)) = fx.pop_event() {
            dispatched += 1;
            if dispatched > MAX_EVENT_CASCADE {
                error!(?scope, topic = %event.topic(), "event cascade limit hit, dropping remainder");
                while fx.pop_event().is_some() {}
                return;
            }
            self.event_log.push(EventRecord {
                tick: self.clock.tick(),
                scope,
                event: event.clone(),
            });
            for sub in self.subscriptions.subscribers(scope, event.topic()) {
                let Some(mut entity) = self.entities.remove(&sub.entity) else {
                    continue;
                };
                if entity.is_enabled() && !entity.is_pending_removal() {
                    if let Some(mut component) = entity.take_active(sub.key) {
                        {
                            let mut ctx = UpdateCtx {
                                view: WorldView::new(&self.entities),
                                entity: &mut entity,
                                services: &mut self.services,
                                id: sub.entity,
                                dt: self.clock.dt(),
                                tick: self.clock.tick(),
                            };
                            component.on_event(&event, &mut ctx, fx);
                        }
                        entity.put_back(sub.key, component);
                    }
                }
                self.entities.insert(sub.entity, entity);
            }
        }
    }

    /// Applies the deferred mutation queue until quiescent, then reaps
    /// flagged entities. This is the end-of-tick safe point.
    fn flush(&mut self, fx: &mut Effects) {
        for pass in 0.. {
            self.drain_events(fx);
            let queued = fx.take_queued();
            if queued.is_empty() && fx.is_empty() {
                break;
            }
            if pass >= MAX_FLUSH_PASSES {
                error!(dropped = queued.len(), "flush pass limit hit, dropping remaining effects");
                break;
            }
            for effect in queued {
                self.apply_effect(effect, fx);
            }
        }
        self.reap();
    }

    fn apply_effect(&mut self, effect: Effect, fx: &mut Effects) {
        match effect {
            Effect::Despawn(id) => {
                if let Some(entity) = self.entities.get_mut(&id) {
                    entity.flag_removal();
                }
            }
            Effect::Spawn(blueprint) => {
                self.spawn(blueprint);
            }
            Effect::Damage {
                target,
                amount,
                source,
            } => {
                self.apply_damage(target, amount, source, fx);
            }
            Effect::Impulse { target, impulse } => {
                if let Some(body) = self.component_mut::<PhysicsBody>(target) {
                    body.apply_impulse(impulse);
                } else {
                    debug!(%target, "impulse against entity without physics body, ignored");
                }
            }
            Effect::Credit {
                beneficiary,
                amount,
            } => {
                *self.ledger.entry(beneficiary).or_insert(0) += amount;
            }
        }
    }

    /// Canonical damage application: clamps through
    /// [`CombatStats::apply_damage`], publishes the health write, and
    /// publishes death at most once.
    fn apply_damage(
        &mut self,
        target: EntityId,
        amount: f32,
        source: Option<EntityId>,
        fx: &mut Effects,
    ) {
        let Some(entity) = self.entities.get_mut(&target) else {
            debug!(%target, "damage against despawned entity, ignored");
            return;
        };
        let Some(stats) = entity.component_mut::<CombatStats>() else {
            debug!(%target, "damage against entity without combat stats, ignored");
            return;
        };
        let outcome = stats.apply_damage(amount);
        if !outcome.changed {
            return;
        }
        fx.publish_entity(
            target,
            GameEvent::UpdateHealth {
                value: outcome.health,
            },
        );
        if outcome.died && stats.announce_death() {
            info!(%target, source = ?source, "entity died");
            fx.publish_entity(target, GameEvent::Death);
        }
    }

    /// Removes flagged entities: dispose hooks in key order, subscription
    /// purge, then the registry entry itself.
    fn reap(&mut self) {
        let doomed: Vec<EntityId> = self
            .entities
            .iter()
            .filter(|(_, e)| e.is_pending_removal())
            .map(|(id, _)| *id)
            .collect();
        for id in doomed {
            if let Some(mut entity) = self.entities.remove(&id) {
                for key in entity.keys() {
                    if let Some(mut slot) = entity.remove_slot(key) {
                        if slot.state == LifecycleState::Active {
                            if let Some(component) = slot.component.as_mut() {
                                component.disposed();
                            }
                        }
                    }
                }
                self.subscriptions.purge_entity(id);
                debug!(%id, "entity reaped");
            }
        }
    }

    // -------------------------------------------------------------------------
    // Combat entry points
    // -------------------------------------------------------------------------

    /// Resolves a direct strike from `attacker` against `target`.
    ///
    /// The damage amount comes from the attacker's weapon (effective attack
    /// value) or, lacking one, its combat stats' base attack. A strike with
    /// no attacker is invalid input and becomes a warned no-op rather than
    /// free damage. Knockback applies if the attacker carries a contact
    /// response with a positive force and the target a physics body.
    pub fn hit(&mut self, target: EntityId, attacker: Option<EntityId>) {
        let Some(attacker) = attacker else {
            warn!(%target, "hit with no attacker, ignored");
            return;
        };
        let Some(source) = self.entities.get(&attacker) else {
            warn!(%target, %attacker, "hit from despawned attacker, ignored");
            return;
        };
        let amount = source
            .component::<WeaponStats>()
            .map(WeaponStats::attack_value)
            .or_else(|| source.component::<CombatStats>().map(CombatStats::base_attack));
        let Some(amount) = amount else {
            warn!(%attacker, "attacker has neither weapon nor combat stats, ignored");
            return;
        };
        let force = source
            .component::<ContactResponse>()
            .map_or(0.0, ContactResponse::knockback_force);
        let attacker_pos = source.position();

        let mut fx = Effects::new();
        fx.damage(target, amount, Some(attacker));
        if force > 0.0 {
            if let Some(defender) = self.entities.get(&target) {
                let resistance = defender
                    .component::<PhysicsBody>()
                    .map_or(1.0, PhysicsBody::knockback_resistance);
                if let Some(impulse) =
                    knockback_impulse(attacker_pos, defender.position(), force, resistance)
                {
                    fx.impulse(target, impulse);
                }
            }
        }
        self.flush(&mut fx);
    }

    /// Reports a contact beginning between `a` and `b`. Both entities
    /// receive a collision event naming the other; contact responses resolve
    /// synchronously.
    pub fn collision_started(&mut self, a: EntityId, b: EntityId) {
        let mut fx = Effects::new();
        fx.publish_entity(a, GameEvent::CollisionStart { other: b });
        fx.publish_entity(b, GameEvent::CollisionStart { other: a });
        self.flush(&mut fx);
    }

    /// Reports a contact ending between `a` and `b`.
    pub fn collision_ended(&mut self, a: EntityId, b: EntityId) {
        let mut fx = Effects::new();
        fx.publish_entity(a, GameEvent::CollisionEnd { other: b });
        fx.publish_entity(b, GameEvent::CollisionEnd { other: a });
        self.flush(&mut fx);
    }

    /// Publishes an event and resolves it (and anything it cascades into)
    /// immediately.
    pub fn publish(&mut self, scope: EventScope, event: GameEvent) {
        let mut fx = Effects::new();
        fx.publish(scope, event);
        self.flush(&mut fx);
    }

    /// Writes an entity's health directly, publishing the health write and
    /// the death event through the same latch as damage.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if `id` is not in the registry.
    pub fn set_health(&mut self, id: EntityId, value: f32) -> Result<(), CoreError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        let Some(stats) = entity.component_mut::<CombatStats>() else {
            warn!(%id, "health write against entity without combat stats, ignored");
            return Ok(());
        };
        if !stats.set_health(value) {
            return Ok(());
        }
        let health = stats.health();
        let died = stats.announce_death();
        let mut fx = Effects::new();
        fx.publish_entity(id, GameEvent::UpdateHealth { value: health });
        if died {
            info!(%id, "entity died");
            fx.publish_entity(id, GameEvent::Death);
        }
        self.flush(&mut fx);
        Ok(())
    }

    /// Writes an entity's maximum health, publishing the change.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::UnknownEntity`] if `id` is not in the registry.
    pub fn set_max_health(&mut self, id: EntityId, value: f32) -> Result<(), CoreError> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(CoreError::UnknownEntity(id))?;
        let Some(stats) = entity.component_mut::<CombatStats>() else {
            warn!(%id, "max health write against entity without combat stats, ignored");
            return Ok(());
        };
        if !stats.set_max_health(value) {
            return Ok(());
        }
        let value = stats.max_health();
        let mut fx = Effects::new();
        fx.publish_entity(id, GameEvent::UpdateMaxHealth { value });
        self.flush(&mut fx);
        Ok(())
    }

    /// Upgrades an entity's weapon one stage. Returns false if the entity
    /// has no weapon or the weapon is at its cap.
    pub fn upgrade_weapon(&mut self, id: EntityId) -> bool {
        match self.component_mut::<WeaponStats>(id) {
            Some(weapon) => weapon.upgrade(),
            None => {
                warn!(%id, "upgrade against entity without weapon, ignored");
                false
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(crate::clock::DEFAULT_DT)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn enemy(max_health: f32) -> Blueprint {
        Blueprint::new(EntityTag::Enemy, Vec2::ZERO).with(CombatStats::new(max_health, 5.0))
    }

    mod registry_tests {
        use super::*;

        #[test]
        fn spawn_assigns_monotonic_ids() {
            let mut world = World::new(1.0 / 60.0);
            let a = world.spawn(enemy(10.0));
            let b = world.spawn(enemy(10.0));
            assert!(a < b);
            assert_eq!(world.len(), 2);
        }

        #[test]
        fn despawn_defers_until_step() {
            let mut world = World::new(1.0 / 60.0);
            let id = world.spawn(enemy(10.0));
            world.despawn(id).unwrap();
            // Still present until the safe point.
            assert_eq!(world.len(), 1);
            world.step();
            assert_eq!(world.len(), 0);
        }

        #[test]
        fn despawn_unknown_errors() {
            let mut world = World::new(1.0 / 60.0);
            assert_eq!(
                world.despawn(EntityId::new(99)),
                Err(CoreError::UnknownEntity(EntityId::new(99)))
            );
        }

        #[test]
        fn attach_duplicate_errors() {
            let mut world = World::new(1.0 / 60.0);
            let id = world.spawn(enemy(10.0));
            let err = world
                .attach(id, Box::new(CombatStats::new(5.0, 1.0)))
                .unwrap_err();
            assert!(matches!(err, CoreError::DuplicateComponent { .. }));
        }

        #[test]
        fn detach_reports_presence() {
            let mut world = World::new(1.0 / 60.0);
            let id = world.spawn(enemy(10.0));
            assert!(world.detach(id, ComponentKey::Stats).unwrap());
            assert!(!world.detach(id, ComponentKey::Stats).unwrap());
        }
    }

    mod combat_tests {
        use super::*;

        #[test]
        fn hit_uses_attacker_base_attack() {
            let mut world = World::new(1.0 / 60.0);
            let attacker = world.spawn(Blueprint::new(EntityTag::Player, Vec2::ZERO)
                .with(CombatStats::new(100.0, 20.0)));
            let target = world.spawn(enemy(100.0));

            world.hit(target, Some(attacker));

            let stats = world.component::<CombatStats>(target).unwrap();
            assert!((stats.health() - 80.0).abs() < f32::EPSILON);
        }

        #[test]
        fn hit_prefers_weapon_over_base_attack() {
            let mut world = World::new(1.0 / 60.0);
            let attacker = world.spawn(
                Blueprint::new(EntityTag::Player, Vec2::ZERO)
                    .with(CombatStats::new(100.0, 20.0))
                    .with(WeaponStats::new(35.0, 0.5)),
            );
            let target = world.spawn(enemy(100.0));

            world.hit(target, Some(attacker));

            let stats = world.component::<CombatStats>(target).unwrap();
            assert!((stats.health() - 65.0).abs() < f32::EPSILON);
        }

        #[test]
        fn hit_without_attacker_is_a_no_op() {
            let mut world = World::new(1.0 / 60.0);
            let target = world.spawn(enemy(100.0));

            world.hit(target, None);

            let stats = world.component::<CombatStats>(target).unwrap();
            assert!((stats.health() - 100.0).abs() < f32::EPSILON);
        }

        #[test]
        fn lethal_hit_publishes_death_once() {
            let mut world = World::new(1.0 / 60.0);
            let attacker = world.spawn(Blueprint::new(EntityTag::Player, Vec2::ZERO)
                .with(CombatStats::new(100.0, 50.0)));
            let target = world.spawn(enemy(40.0));

            world.hit(target, Some(attacker));
            world.hit(target, Some(attacker));

            let deaths = world
                .event_log()
                .iter()
                .filter(|r| r.event == GameEvent::Death && r.scope == EventScope::Entity(target))
                .count();
            assert_eq!(deaths, 1);
        }

        #[test]
        fn set_health_publishes_update() {
            let mut world = World::new(1.0 / 60.0);
            let id = world.spawn(enemy(100.0));
            world.set_health(id, 55.0).unwrap();

            assert!(world.event_log().iter().any(|r| matches!(
                r.event,
                GameEvent::UpdateHealth { value } if (value - 55.0).abs() < f32::EPSILON
            )));
        }

        #[test]
        fn set_health_to_zero_kills_through_the_latch() {
            let mut world = World::new(1.0 / 60.0);
            let id = world.spawn(enemy(100.0));
            world.set_health(id, 0.0).unwrap();
            world.set_health(id, 0.0).unwrap();

            let deaths = world
                .event_log()
                .iter()
                .filter(|r| r.event == GameEvent::Death)
                .count();
            assert_eq!(deaths, 1);
        }
    }

    mod view_tests {
        use super::*;

        #[test]
        fn nearest_with_tag_picks_closest_live() {
            let mut world = World::new(1.0 / 60.0);
            let far = world.spawn(Blueprint::new(EntityTag::Player, Vec2::new(10.0, 0.0)));
            let near = world.spawn(Blueprint::new(EntityTag::Player, Vec2::new(2.0, 0.0)));
            let _ = far;

            let found = world.view().nearest_with_tag(EntityTag::Player, Vec2::ZERO);
            assert_eq!(found.map(Entity::id), Some(near));
        }

        #[test]
        fn dead_entities_are_not_alive() {
            let mut world = World::new(1.0 / 60.0);
            let id = world.spawn(enemy(10.0));
            world.set_health(id, 0.0).unwrap();

            assert!(!world.view().any_alive_with_tag(EntityTag::Enemy));
            // Still in the registry (death does not despawn by itself).
            assert!(world.entity(id).is_some());
        }

        #[test]
        fn disabled_entities_are_excluded() {
            let mut world = World::new(1.0 / 60.0);
            let id = world.spawn(enemy(10.0));
            world.entity_mut(id).unwrap().set_enabled(false);

            assert_eq!(world.view().count_alive_with_tag(EntityTag::Enemy), 0);
        }
    }
}

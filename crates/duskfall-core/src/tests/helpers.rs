//! Test helper functions and scripted collaborator stubs.
//!
//! Factories here use a 0.25s tick. Quarter-second deltas and durations are
//! exact in binary floating point, so timer assertions land on precise tick
//! counts: 3 steps of dwell is exactly 0.75 seconds.

use std::cell::RefCell;
use std::rc::Rc;

use glam::Vec2;

use crate::collab::{AnimationDriver, ResourceProvider};
use crate::components::{
    ChargeConfig, ChargeSkill, ContactKind, ContactResponse, PatrolAi, RewardOnDeath,
};
use crate::entity::{CombatStats, EntityId, EntityTag, PhysicsBody, WeaponStats};
use crate::world::{Blueprint, World};

/// Tick delta used throughout the suite. Exact in binary.
pub const TEST_DT: f32 = 0.25;

/// Installs a test-writer subscriber so `RUST_LOG=debug cargo test` shows
/// the core's tracing output. Only the first call wins; later calls are
/// no-ops.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Creates a world ticking at [`TEST_DT`].
pub fn test_world() -> World {
    init_tracing();
    World::new(TEST_DT)
}

/// Steps a world `n` times.
pub fn tick(world: &mut World, n: usize) {
    for _ in 0..n {
        world.step();
    }
}

// =============================================================================
// Entity factories
// =============================================================================

/// Spawns a player with 100 health, base attack 20, and a stamina pool.
pub fn spawn_player(world: &mut World, position: Vec2) -> EntityId {
    world.spawn(
        Blueprint::new(EntityTag::Player, position)
            .with(CombatStats::new(100.0, 20.0).with_stamina(50.0, 10.0))
            .with(PhysicsBody::new(0.5)),
    )
}

/// Spawns a player carrying a weapon and a striking contact response.
pub fn spawn_armed_player(world: &mut World, position: Vec2) -> EntityId {
    world.spawn(
        Blueprint::new(EntityTag::Player, position)
            .with(CombatStats::new(100.0, 20.0))
            .with(WeaponStats::new(20.0, 0.5))
            .with(
                ContactResponse::new(ContactKind::Strike, vec![EntityTag::Enemy])
                    .with_knockback(8.0),
            ),
    )
}

/// Spawns an enemy with the given health and a physics body.
pub fn spawn_enemy(world: &mut World, position: Vec2, health: f32) -> EntityId {
    world.spawn(
        Blueprint::new(EntityTag::Enemy, position)
            .with(CombatStats::new(health, 5.0))
            .with(PhysicsBody::new(0.5)),
    )
}

/// Charge tuning in binary-exact quarter-second timings: 3 ticks of dwell,
/// 2 of prep, 3 of charge (1 unit of travel each), 4 of cooldown.
pub fn test_charge_config() -> ChargeConfig {
    ChargeConfig {
        trigger_range: 5.0,
        dwell_time: 0.75,
        prep_duration: 0.5,
        charge_speed: 4.0,
        charge_duration: 0.75,
        cooldown_duration: 1.0,
        target_tag: EntityTag::Player,
        return_anchor: None,
        return_speed: 2.0,
    }
}

/// Spawns a boss at the origin with a charge skill and an (idle) patrol AI.
pub fn spawn_boss(world: &mut World, config: ChargeConfig) -> EntityId {
    world.spawn(
        Blueprint::new(EntityTag::Boss, Vec2::ZERO)
            .with(CombatStats::new(500.0, 30.0))
            .with(ChargeSkill::new(config))
            .with(PatrolAi::new(Vec2::ZERO, Vec2::new(1.0, 0.0), 0.0)),
    )
}

/// Spawns a boss and a player standing inside the boss's trigger range.
///
/// Returns `(boss, player)`.
pub fn setup_boss_scenario(world: &mut World) -> (EntityId, EntityId) {
    let boss = spawn_boss(world, test_charge_config());
    let player = spawn_player(world, Vec2::new(3.0, 0.0));
    (boss, player)
}

/// Spawns a projectile that damages enemies, with optional knockback.
pub fn spawn_projectile(world: &mut World, position: Vec2, knockback: f32) -> EntityId {
    world.spawn(
        Blueprint::new(EntityTag::Projectile, position)
            .with(WeaponStats::new(15.0, 0.5))
            .with(
                ContactResponse::new(
                    ContactKind::Projectile { explosion: None },
                    vec![EntityTag::Enemy],
                )
                .with_knockback(knockback),
            ),
    )
}

/// Spawns an enemy carrying a death reward for `beneficiary`.
pub fn spawn_rewarding_enemy(
    world: &mut World,
    position: Vec2,
    beneficiary: EntityId,
    amount: u64,
) -> EntityId {
    world.spawn(
        Blueprint::new(EntityTag::Enemy, position)
            .with(CombatStats::new(30.0, 5.0))
            .with(RewardOnDeath::new(beneficiary, amount)),
    )
}

// =============================================================================
// Scripted collaborators
// =============================================================================

/// Animation stub whose finished flag the test flips from outside.
pub struct StubAnimations {
    /// Shared finished flag.
    pub finished: Rc<RefCell<bool>>,
    /// Record of every `start` call.
    pub started: Rc<RefCell<Vec<(EntityId, String)>>>,
}

impl StubAnimations {
    /// Creates the stub plus the handles the test keeps.
    #[allow(clippy::type_complexity)]
    pub fn new(finished: bool) -> (Self, Rc<RefCell<bool>>, Rc<RefCell<Vec<(EntityId, String)>>>) {
        let finished = Rc::new(RefCell::new(finished));
        let started = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                finished: Rc::clone(&finished),
                started: Rc::clone(&started),
            },
            finished,
            started,
        )
    }
}

impl AnimationDriver for StubAnimations {
    fn start(&mut self, entity: EntityId, name: &str) {
        self.started.borrow_mut().push((entity, name.to_string()));
    }

    fn is_finished(&self, _entity: EntityId) -> bool {
        *self.finished.borrow()
    }
}

/// Resource stub with a scripted readiness flag and a request log.
pub struct StubResources {
    /// Shared readiness flag.
    pub ready: Rc<RefCell<bool>>,
    /// Record of every requested asset key.
    pub requested: Rc<RefCell<Vec<String>>>,
}

impl StubResources {
    /// Creates the stub plus the handles the test keeps.
    #[allow(clippy::type_complexity)]
    pub fn new(ready: bool) -> (Self, Rc<RefCell<bool>>, Rc<RefCell<Vec<String>>>) {
        let ready = Rc::new(RefCell::new(ready));
        let requested = Rc::new(RefCell::new(Vec::new()));
        (
            Self {
                ready: Rc::clone(&ready),
                requested: Rc::clone(&requested),
            },
            ready,
            requested,
        )
    }
}

impl ResourceProvider for StubResources {
    fn is_ready(&self, key: &str) -> bool {
        let _ = key;
        *self.ready.borrow()
    }

    fn request(&mut self, key: &str) {
        self.requested.borrow_mut().push(key.to_string());
    }
}

/// Collects live enemy ids, in id order.
pub fn enemy_ids(world: &World) -> Vec<EntityId> {
    world
        .view()
        .iter()
        .filter(|e| e.tag() == EntityTag::Enemy)
        .map(|e| e.id())
        .collect()
}

//! Collaborator seams: the traits the host game implements.
//!
//! The simulation core never renders, loads assets, or decides what a wave
//! contains. Those concerns live behind the traits here; the world holds at
//! most one implementation of each and every call site tolerates its absence
//! (missing collaborators degrade to logged no-ops, never panics).

use glam::Vec2;

use crate::entity::EntityId;
use crate::world::Blueprint;

/// Drives entity animations on behalf of the core.
///
/// One-shot effect entities start their animation through this trait and
/// self-dispose once [`AnimationDriver::is_finished`] reports completion.
pub trait AnimationDriver {
    /// Starts (or restarts) the named animation on an entity.
    fn start(&mut self, entity: EntityId, name: &str);

    /// Returns true once the entity's current animation has completed.
    /// An entity with no running animation is reported finished.
    fn is_finished(&self, entity: EntityId) -> bool;
}

/// Answers asset-readiness queries for gameplay that depends on loaded
/// content (e.g. an explosion effect sprite).
pub trait ResourceProvider {
    /// Returns true if the asset named by `key` is loaded and usable.
    fn is_ready(&self, key: &str) -> bool;

    /// Requests that the asset named by `key` be loaded. Idempotent.
    fn request(&mut self, key: &str);
}

/// Parameters the wave director hands to its spawner for one wave.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveRequest {
    /// Zero-based index of the wave being spawned.
    pub wave: u32,
    /// Number of enemies the director asks for.
    pub count: u32,
    /// Difficulty multiplier, escalating per wave.
    pub scaling: f32,
    /// Center of the spawn area.
    pub origin: Vec2,
}

/// Builds the enemy blueprints for one wave.
///
/// The director owns pacing (when a wave starts, how it escalates); the
/// spawner owns composition (which enemies, where exactly). Returning fewer
/// or more blueprints than `request.count` is allowed.
pub trait WaveSpawner {
    /// Produces the blueprints to spawn for `request`.
    fn build_wave(&mut self, request: &WaveRequest) -> Vec<Blueprint>;
}

/// The world's collaborator slots.
///
/// All slots are optional; gameplay that needs an absent collaborator
/// degrades gracefully.
#[derive(Default)]
pub struct Services {
    /// Animation playback, if the host registered a driver.
    pub animation: Option<Box<dyn AnimationDriver>>,
    /// Asset readiness, if the host registered a provider.
    pub resources: Option<Box<dyn ResourceProvider>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("animation", &self.animation.is_some())
            .field("resources", &self.resources.is_some())
            .finish()
    }
}

//! Enemy-wave orchestration.
//!
//! The [`WaveDirector`] sits on a non-spatial director entity and paces an
//! escalating series of enemy waves. A session starts on a
//! [`WaveSessionStart`](crate::events::GameEvent::WaveSessionStart) event and
//! spawns its first wave immediately. Each subsequent wave is gated on
//! clearance: once no live enemy remains, a delay timer arms, and the next
//! wave spawns when it expires. An enemy appearing during the delay (a
//! straggler summoned by a dying one, say) disarms the timer. After the last
//! wave clears, the session ends. A start event arriving while a session is
//! still running is ignored; only a fresh or completed director restarts.
//!
//! Composition is delegated: the director asks its
//! [`WaveSpawner`](crate::collab::WaveSpawner) for blueprints and queues them
//! through the effect queue. Without a spawner the director quietly spawns
//! nothing, which keeps headless tests cheap.

use std::fmt;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use crate::collab::{WaveRequest, WaveSpawner};
use crate::component::{Component, ComponentKey, KeyedComponent, SpawnCtx, UpdateCtx};
use crate::components::reward::RewardOnDeath;
use crate::effects::Effects;
use crate::entity::{CombatStats, EntityId, EntityTag, PhysicsBody};
use crate::events::{GameEvent, Topic};
use crate::world::Blueprint;

/// Pacing parameters for a wave session.
#[derive(Debug, Clone, PartialEq)]
pub struct WaveConfig {
    /// Number of waves in a session.
    pub max_waves: u32,
    /// Enemy count requested for the first wave.
    pub base_count: u32,
    /// Extra enemies requested per subsequent wave.
    pub count_step: u32,
    /// Difficulty multiplier increase per wave (wave 0 is 1.0).
    pub scaling_step: f32,
    /// Seconds between a wave clearing and the next one spawning.
    pub clear_delay: f32,
    /// Tag counted by the clearance scan.
    pub enemy_tag: EntityTag,
    /// Center of the spawn area handed to the spawner.
    pub origin: Vec2,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            max_waves: 3,
            base_count: 4,
            count_step: 2,
            scaling_step: 0.25,
            clear_delay: 3.0,
            enemy_tag: EntityTag::Enemy,
            origin: Vec2::ZERO,
        }
    }
}

/// Wave pacing component.
pub struct WaveDirector {
    config: WaveConfig,
    spawner: Option<Box<dyn WaveSpawner>>,
    next_wave: u32,
    scaling: f32,
    gate: Option<f32>,
    session_active: bool,
}

impl WaveDirector {
    /// Creates an idle director; nothing happens until a session starts.
    #[must_use]
    pub fn new(config: WaveConfig) -> Self {
        Self {
            config,
            spawner: None,
            next_wave: 0,
            scaling: 1.0,
            gate: None,
            session_active: false,
        }
    }

    /// Attaches the wave composition collaborator.
    #[must_use]
    pub fn with_spawner(mut self, spawner: Box<dyn WaveSpawner>) -> Self {
        self.spawner = Some(spawner);
        self
    }

    /// Index of the next wave to spawn (equals the number spawned so far).
    #[must_use]
    pub const fn waves_spawned(&self) -> u32 {
        self.next_wave
    }

    /// Current difficulty multiplier.
    #[must_use]
    pub const fn scaling(&self) -> f32 {
        self.scaling
    }

    /// True while a session is running.
    #[must_use]
    pub const fn is_session_active(&self) -> bool {
        self.session_active
    }

    /// Remaining clearance delay, if the gate is armed.
    #[must_use]
    pub const fn gate_remaining(&self) -> Option<f32> {
        self.gate
    }

    fn start_session(&mut self, fx: &mut Effects) {
        // A start arriving mid-session is ignored; only a fresh or completed
        // director resets and spawns.
        if self.session_active && self.next_wave < self.config.max_waves {
            debug!(wave = self.next_wave, "wave session already running, start ignored");
            return;
        }
        info!(max_waves = self.config.max_waves, "wave session started");
        self.next_wave = 0;
        self.scaling = 1.0;
        self.gate = None;
        self.session_active = true;
        self.spawn_wave(fx);
    }

    fn spawn_wave(&mut self, fx: &mut Effects) {
        if self.next_wave >= self.config.max_waves {
            return;
        }
        let request = WaveRequest {
            wave: self.next_wave,
            count: self.config.base_count + self.config.count_step * self.next_wave,
            scaling: self.scaling,
            origin: self.config.origin,
        };
        if let Some(spawner) = self.spawner.as_mut() {
            let blueprints = spawner.build_wave(&request);
            info!(
                wave = request.wave,
                count = blueprints.len(),
                scaling = request.scaling,
                "wave spawned"
            );
            for blueprint in blueprints {
                fx.spawn(blueprint);
            }
        } else {
            debug!(wave = request.wave, "no wave spawner registered");
        }
        self.next_wave += 1;
        self.scaling += self.config.scaling_step;
    }
}

impl fmt::Debug for WaveDirector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WaveDirector")
            .field("config", &self.config)
            .field("spawner", &self.spawner.is_some())
            .field("next_wave", &self.next_wave)
            .field("scaling", &self.scaling)
            .field("gate", &self.gate)
            .field("session_active", &self.session_active)
            .finish()
    }
}

impl Component for WaveDirector {
    fn key(&self) -> ComponentKey {
        ComponentKey::WaveDirector
    }

    fn spawned(&mut self, ctx: &mut SpawnCtx<'_>) {
        ctx.subscribe(Topic::WaveSessionStart);
    }

    fn on_event(&mut self, event: &GameEvent, _ctx: &mut UpdateCtx<'_>, fx: &mut Effects) {
        if *event == GameEvent::WaveSessionStart {
            self.start_session(fx);
        }
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>, fx: &mut Effects) {
        if !self.session_active {
            return;
        }
        if ctx.view.any_alive_with_tag(self.config.enemy_tag) {
            // A straggler disarms the gate.
            self.gate = None;
            return;
        }
        if self.next_wave >= self.config.max_waves {
            info!(waves = self.next_wave, "wave session complete");
            self.session_active = false;
            self.gate = None;
            return;
        }
        match self.gate {
            None => self.gate = Some(self.config.clear_delay),
            Some(remaining) => {
                let remaining = remaining - ctx.dt;
                if remaining <= 0.0 {
                    self.gate = None;
                    self.spawn_wave(fx);
                } else {
                    self.gate = Some(remaining);
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

impl KeyedComponent for WaveDirector {
    const KEY: ComponentKey = ComponentKey::WaveDirector;
}

// =============================================================================
// BasicWaveSpawner
// =============================================================================

/// Deterministic default spawner: scatters stat-scaled enemies in a disc
/// around the request origin.
///
/// Positions come from a seeded [`ChaCha8Rng`], so two sessions with the same
/// seed and the same requests place identical enemies.
pub struct BasicWaveSpawner {
    rng: ChaCha8Rng,
    radius: f32,
    base_health: f32,
    base_attack: f32,
    reward: Option<(EntityId, u64)>,
}

impl BasicWaveSpawner {
    /// Creates a spawner scattering enemies within `radius` of the origin.
    #[must_use]
    pub fn new(seed: u64, radius: f32, base_health: f32, base_attack: f32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            radius: radius.max(0.0),
            base_health,
            base_attack,
            reward: Some((EntityId::new(1), 10)),
        }
    }

    /// Sets (or clears) the death reward attached to every spawned enemy.
    #[must_use]
    pub fn with_reward(mut self, reward: Option<(EntityId, u64)>) -> Self {
        self.reward = reward;
        self
    }
}

impl WaveSpawner for BasicWaveSpawner {
    fn build_wave(&mut self, request: &WaveRequest) -> Vec<Blueprint> {
        let mut blueprints = Vec::with_capacity(request.count as usize);
        for _ in 0..request.count {
            let angle = self.rng.gen::<f32>() * std::f32::consts::TAU;
            // sqrt keeps the disc density uniform.
            let distance = self.rng.gen::<f32>().sqrt() * self.radius;
            let position = request.origin + Vec2::new(angle.cos(), angle.sin()) * distance;

            let mut blueprint = Blueprint::new(EntityTag::Enemy, position)
                .with(CombatStats::new(
                    self.base_health * request.scaling,
                    self.base_attack * request.scaling,
                ))
                .with(PhysicsBody::new(0.2));
            if let Some((beneficiary, amount)) = self.reward {
                blueprint = blueprint.with(RewardOnDeath::new(beneficiary, amount));
            }
            blueprints.push(blueprint);
        }
        blueprints
    }
}

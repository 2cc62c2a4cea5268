//! Boss charge-attack state machine.
//!
//! The skill loops `Patrol → Prep → Charging → (Return) → Cooldown → Patrol`.
//! While patrolling it watches for a target lingering inside the trigger
//! range; once the dwell accumulator fills, it snapshots the target's
//! position, suspends the subsidiary patrol AI, telegraphs for the prep
//! duration, then charges in a straight line toward the snapshot. Charges
//! aim at where the target *was* at commit time, so a moving target can
//! dodge.
//!
//! External cancellation arrives as a
//! [`SkillCancelled`](crate::events::GameEvent::SkillCancelled) event and
//! takes effect at the top of the skill's next update, short-circuiting
//! whatever timer was in flight.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::component::{Component, ComponentKey, KeyedComponent, SpawnCtx, UpdateCtx};
use crate::effects::Effects;
use crate::entity::EntityTag;
use crate::events::{GameEvent, Topic};

/// Phase of the charge-attack loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargePhase {
    /// Watching for a target inside the trigger range.
    Patrol,
    /// Telegraphing; the target position is locked.
    Prep,
    /// Moving in a straight line toward the locked position.
    Charging,
    /// Walking back to the return anchor after a charge.
    Return,
    /// Waiting out the cooldown before watching again.
    Cooldown,
}

/// Tuning for one charge skill.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeConfig {
    /// Radius inside which a target accumulates dwell time.
    pub trigger_range: f32,
    /// Seconds a target must linger in range before a charge commits.
    pub dwell_time: f32,
    /// Telegraph duration before movement starts.
    pub prep_duration: f32,
    /// Charge movement speed, units per second.
    pub charge_speed: f32,
    /// How long the charge movement lasts.
    pub charge_duration: f32,
    /// Cooldown after the sequence before the skill can trigger again.
    pub cooldown_duration: f32,
    /// Tag of the entities this skill charges at.
    pub target_tag: EntityTag,
    /// Position to walk back to after a charge; `None` skips the return
    /// phase and cools down in place.
    pub return_anchor: Option<Vec2>,
    /// Walking speed during the return phase.
    pub return_speed: f32,
}

impl Default for ChargeConfig {
    fn default() -> Self {
        Self {
            trigger_range: 6.0,
            dwell_time: 1.0,
            prep_duration: 0.8,
            charge_speed: 14.0,
            charge_duration: 0.6,
            cooldown_duration: 2.5,
            target_tag: EntityTag::Player,
            return_anchor: None,
            return_speed: 4.0,
        }
    }
}

/// The charge-attack skill component.
#[derive(Debug, Clone)]
pub struct ChargeSkill {
    config: ChargeConfig,
    phase: ChargePhase,
    timer: f32,
    dwell: f32,
    locked_target: Option<Vec2>,
    velocity: Vec2,
    cancel_requested: bool,
}

impl ChargeSkill {
    /// Creates the skill in its patrol phase.
    #[must_use]
    pub fn new(config: ChargeConfig) -> Self {
        Self {
            config,
            phase: ChargePhase::Patrol,
            timer: 0.0,
            dwell: 0.0,
            locked_target: None,
            velocity: Vec2::ZERO,
            cancel_requested: false,
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> ChargePhase {
        self.phase
    }

    /// Accumulated dwell time of the current candidate target.
    #[must_use]
    pub const fn dwell(&self) -> f32 {
        self.dwell
    }

    /// Position snapshot the current sequence is aimed at, if one is locked.
    #[must_use]
    pub const fn locked_target(&self) -> Option<Vec2> {
        self.locked_target
    }

    /// The skill's tuning.
    #[must_use]
    pub const fn config(&self) -> &ChargeConfig {
        &self.config
    }

    fn reset_to_patrol(&mut self, ctx: &mut UpdateCtx<'_>) {
        self.phase = ChargePhase::Patrol;
        self.timer = 0.0;
        self.dwell = 0.0;
        self.locked_target = None;
        self.velocity = Vec2::ZERO;
        ctx.entity.set_component_enabled(ComponentKey::Patrol, true);
    }

    fn enter_cooldown(&mut self) {
        self.velocity = Vec2::ZERO;
        self.locked_target = None;
        self.timer = self.config.cooldown_duration;
        self.phase = ChargePhase::Cooldown;
    }
}

impl Component for ChargeSkill {
    fn key(&self) -> ComponentKey {
        ComponentKey::ChargeSkill
    }

    // Runs before the patrol AI so a suspend in this tick takes effect
    // immediately.
    fn priority(&self) -> i32 {
        -10
    }

    fn spawned(&mut self, ctx: &mut SpawnCtx<'_>) {
        ctx.subscribe(Topic::SkillCancelled);
    }

    fn on_event(&mut self, event: &GameEvent, _ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {
        if *event == GameEvent::SkillCancelled {
            self.cancel_requested = true;
        }
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {
        if self.cancel_requested {
            self.cancel_requested = false;
            if self.phase != ChargePhase::Patrol {
                info!(id = %ctx.id, phase = ?self.phase, "charge skill cancelled");
                self.reset_to_patrol(ctx);
                return;
            }
        }

        match self.phase {
            ChargePhase::Patrol => {
                let position = ctx.entity.position();
                let in_range = ctx
                    .view
                    .nearest_with_tag(self.config.target_tag, position)
                    .filter(|t| t.position().distance(position) <= self.config.trigger_range);
                let Some(target) = in_range else {
                    self.dwell = 0.0;
                    return;
                };
                self.dwell += ctx.dt;
                if self.dwell >= self.config.dwell_time {
                    // Aim is frozen here; the target can still dodge.
                    self.locked_target = Some(target.position());
                    self.dwell = 0.0;
                    self.timer = self.config.prep_duration;
                    self.phase = ChargePhase::Prep;
                    ctx.entity.set_component_enabled(ComponentKey::Patrol, false);
                    info!(id = %ctx.id, target = %target.id(), "charge committed");
                }
            }
            ChargePhase::Prep => {
                self.timer -= ctx.dt;
                if self.timer <= 0.0 {
                    let aim = self.locked_target.unwrap_or_else(|| ctx.entity.position());
                    let direction = (aim - ctx.entity.position())
                        .try_normalize()
                        .unwrap_or(Vec2::X);
                    self.velocity = direction * self.config.charge_speed;
                    self.timer = self.config.charge_duration;
                    self.phase = ChargePhase::Charging;
                    debug!(id = %ctx.id, "charge launched");
                }
            }
            ChargePhase::Charging => {
                ctx.entity.translate(self.velocity * ctx.dt);
                self.timer -= ctx.dt;
                if self.timer <= 0.0 {
                    if self.config.return_anchor.is_some() {
                        self.velocity = Vec2::ZERO;
                        self.phase = ChargePhase::Return;
                    } else {
                        self.enter_cooldown();
                    }
                }
            }
            ChargePhase::Return => {
                // Unwrap-free: Return is only entered when an anchor exists.
                let Some(anchor) = self.config.return_anchor else {
                    self.enter_cooldown();
                    return;
                };
                let delta = anchor - ctx.entity.position();
                let step = self.config.return_speed.max(0.0) * ctx.dt;
                if delta.length() <= step || step <= 0.0 {
                    ctx.entity.set_position(anchor);
                    self.enter_cooldown();
                } else {
                    ctx.entity.translate(delta.normalize() * step);
                }
            }
            ChargePhase::Cooldown => {
                self.timer -= ctx.dt;
                if self.timer <= 0.0 {
                    self.reset_to_patrol(ctx);
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

impl KeyedComponent for ChargeSkill {
    const KEY: ComponentKey = ComponentKey::ChargeSkill;
}

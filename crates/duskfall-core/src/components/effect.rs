//! One-shot visual effects.

use tracing::debug;

use crate::component::{Component, ComponentKey, KeyedComponent, UpdateCtx};
use crate::effects::Effects;

/// A transient effect entity that plays one animation and removes itself.
///
/// On its first update the effect starts its animation through the
/// [`AnimationDriver`](crate::collab::AnimationDriver); it flags its entity
/// for removal once the driver reports the animation finished, or after
/// `lifetime` seconds when no driver is registered (the fallback also caps a
/// driver that never finishes).
#[derive(Debug, Clone)]
pub struct OneShotEffect {
    animation: String,
    lifetime: f32,
    elapsed: f32,
    started: bool,
}

impl OneShotEffect {
    /// Creates an effect playing `animation` with a fallback lifetime in
    /// seconds (clamped to a minimum of one tick's worth of time).
    #[must_use]
    pub fn new(animation: impl Into<String>, lifetime: f32) -> Self {
        Self {
            animation: animation.into(),
            lifetime: lifetime.max(crate::clock::DEFAULT_DT),
            elapsed: 0.0,
            started: false,
        }
    }

    /// Animation asset key this effect plays.
    #[must_use]
    pub fn animation(&self) -> &str {
        &self.animation
    }
}

impl Component for OneShotEffect {
    fn key(&self) -> ComponentKey {
        ComponentKey::EffectLifetime
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {
        if !self.started {
            self.started = true;
            if let Some(driver) = ctx.services.animation.as_mut() {
                driver.start(ctx.id, &self.animation);
            }
            return;
        }

        self.elapsed += ctx.dt;
        let animation_done = ctx
            .services
            .animation
            .as_ref()
            .map_or(false, |driver| driver.is_finished(ctx.id));
        if animation_done || self.elapsed >= self.lifetime {
            debug!(id = %ctx.id, animation = %self.animation, "one-shot effect finished");
            ctx.entity.flag_removal();
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl KeyedComponent for OneShotEffect {
    const KEY: ComponentKey = ComponentKey::EffectLifetime;
}

//! Back-and-forth patrol movement.

use glam::Vec2;

use crate::component::{Component, ComponentKey, KeyedComponent, UpdateCtx};
use crate::effects::Effects;

/// Walks the owning entity between two waypoints.
///
/// The boss charge skill suspends this component while an attack sequence is
/// in flight (via the component enabled flag) and resumes it afterwards.
#[derive(Debug, Clone)]
pub struct PatrolAi {
    a: Vec2,
    b: Vec2,
    speed: f32,
    heading_to_b: bool,
}

impl PatrolAi {
    /// Creates a patrol between `a` and `b` at `speed` units per second
    /// (clamped at zero).
    #[must_use]
    pub fn new(a: Vec2, b: Vec2, speed: f32) -> Self {
        Self {
            a,
            b,
            speed: speed.max(0.0),
            heading_to_b: true,
        }
    }

    /// Current waypoint the patrol is heading toward.
    #[must_use]
    pub const fn destination(&self) -> Vec2 {
        if self.heading_to_b {
            self.b
        } else {
            self.a
        }
    }
}

impl Component for PatrolAi {
    fn key(&self) -> ComponentKey {
        ComponentKey::Patrol
    }

    fn update(&mut self, ctx: &mut UpdateCtx<'_>, _fx: &mut Effects) {
        if self.speed <= 0.0 {
            return;
        }
        let target = self.destination();
        let delta = target - ctx.entity.position();
        let step = self.speed * ctx.dt;
        if delta.length() <= step {
            ctx.entity.set_position(target);
            self.heading_to_b = !self.heading_to_b;
        } else {
            ctx.entity.translate(delta.normalize() * step);
        }
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl KeyedComponent for PatrolAi {
    const KEY: ComponentKey = ComponentKey::Patrol;
}

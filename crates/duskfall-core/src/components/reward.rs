//! Death reward payout.

use tracing::debug;

use crate::component::{Component, ComponentKey, KeyedComponent, SpawnCtx, UpdateCtx};
use crate::effects::Effects;
use crate::entity::EntityId;
use crate::events::{GameEvent, Topic};

/// Credits a beneficiary when the owning entity dies.
///
/// The payout is latched: however many death notifications arrive, the
/// credit is queued at most once per entity lifetime.
#[derive(Debug, Clone)]
pub struct RewardOnDeath {
    beneficiary: EntityId,
    amount: u64,
    paid: bool,
}

impl RewardOnDeath {
    /// Creates a reward paying `amount` to `beneficiary` on death.
    #[must_use]
    pub const fn new(beneficiary: EntityId, amount: u64) -> Self {
        Self {
            beneficiary,
            amount,
            paid: false,
        }
    }

    /// True once the reward has been queued.
    #[must_use]
    pub const fn is_paid(&self) -> bool {
        self.paid
    }
}

impl Component for RewardOnDeath {
    fn key(&self) -> ComponentKey {
        ComponentKey::Reward
    }

    fn spawned(&mut self, ctx: &mut SpawnCtx<'_>) {
        ctx.subscribe(Topic::Death);
    }

    fn on_event(&mut self, event: &GameEvent, ctx: &mut UpdateCtx<'_>, fx: &mut Effects) {
        if *event != GameEvent::Death || self.paid {
            return;
        }
        self.paid = true;
        debug!(
            fallen = %ctx.id,
            beneficiary = %self.beneficiary,
            amount = self.amount,
            "death reward paid"
        );
        fx.credit(self.beneficiary, self.amount);
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
        self
    }
}

impl KeyedComponent for RewardOnDeath {
    const KEY: ComponentKey = ComponentKey::Reward;
}

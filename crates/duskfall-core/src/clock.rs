//! Tick clock supplying monotonic per-tick delta time.
//!
//! Every timed behavior in the simulation (dwell, prep, charge, cooldown,
//! fuse, wave delay) is an explicit accumulator advanced by the clock's delta
//! each tick. There are no timer threads and no blocking waits; the clock is
//! the single time source for the whole simulation session.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Default per-tick delta when none (or an invalid one) is configured.
pub const DEFAULT_DT: f32 = 1.0 / 60.0;

/// Fixed-step simulation clock.
///
/// The clock owns the tick counter and the accumulated session time. The
/// per-tick delta is fixed for the lifetime of a session, which keeps the
/// simulation deterministic: the same entity setup stepped the same number of
/// times always produces the same timings.
///
/// # Example
///
/// ```
/// use duskfall_core::clock::TickClock;
///
/// let mut clock = TickClock::new(1.0 / 60.0);
/// assert_eq!(clock.tick(), 0);
///
/// let dt = clock.advance();
/// assert!((dt - 1.0 / 60.0).abs() < f32::EPSILON);
/// assert_eq!(clock.tick(), 1);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickClock {
    dt: f32,
    tick: u64,
    elapsed: f32,
}

impl TickClock {
    /// Creates a clock with the given per-tick delta in seconds.
    ///
    /// A non-positive or non-finite delta is invalid input from the caller
    /// and is replaced by [`DEFAULT_DT`] with a warning rather than rejected.
    #[must_use]
    pub fn new(dt: f32) -> Self {
        let dt = if dt.is_finite() && dt > 0.0 {
            dt
        } else {
            warn!(dt, "invalid tick delta, falling back to default");
            DEFAULT_DT
        };
        Self {
            dt,
            tick: 0,
            elapsed: 0.0,
        }
    }

    /// Advances the clock by one tick and returns the delta for that tick.
    pub fn advance(&mut self) -> f32 {
        self.tick += 1;
        self.elapsed += self.dt;
        self.dt
    }

    /// Returns the fixed per-tick delta in seconds.
    #[must_use]
    pub const fn dt(&self) -> f32 {
        self.dt
    }

    /// Returns the current tick count.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Returns the accumulated session time in seconds.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_DT)
    }
}

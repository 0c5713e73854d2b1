//! Tick-rate model
//!
//! Each node runs its scheduling loop at an independently sampled rate,
//! which is what produces the clock skew the simulation studies.

use std::time::Duration;

use rand::Rng;

/// Slowest allowed rate (ticks per second)
pub const MIN_TICKS_PER_SEC: u32 = 1;
/// Fastest allowed rate (ticks per second)
pub const MAX_TICKS_PER_SEC: u32 = 6;

/// Clock rate in ticks per second
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickRate(u32);

impl TickRate {
    /// Create a rate, clamped into `[MIN_TICKS_PER_SEC, MAX_TICKS_PER_SEC]`
    pub fn new(ticks_per_second: u32) -> Self {
        TickRate(ticks_per_second.clamp(MIN_TICKS_PER_SEC, MAX_TICKS_PER_SEC))
    }

    /// Sample a rate uniformly from the allowed range
    pub fn sample(rng: &mut impl Rng) -> Self {
        TickRate(rng.gen_range(MIN_TICKS_PER_SEC..=MAX_TICKS_PER_SEC))
    }

    #[inline]
    pub fn ticks_per_second(self) -> u32 {
        self.0
    }

    /// Duration of one tick
    pub fn period(self) -> Duration {
        Duration::from_secs_f64(1.0 / self.0 as f64)
    }
}

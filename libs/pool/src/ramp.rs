//! Amplification ramping schedule.
//!
//! `A` moves linearly in time between a scheduled start and end; reads
//! interpolate against the injected clock, so no timer infrastructure exists.
//! Stopping a ramp freezes `A` at the currently interpolated value.

use serde::{Deserialize, Serialize};

/// Linear `A` interpolation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmplificationRamp {
    pub initial_a: u64,
    pub target_a: u64,
    pub start_time: u64,
    pub end_time: u64,
}

impl AmplificationRamp {
    /// A flat schedule holding `a` indefinitely.
    pub fn flat(a: u64) -> Self {
        Self {
            initial_a: a,
            target_a: a,
            start_time: 0,
            end_time: 0,
        }
    }

    /// The interpolated amplification at `now`, clamped to the ramp window.
    pub fn current(&self, now: u64) -> u64 {
        if now >= self.end_time {
            return self.target_a;
        }
        if now <= self.start_time {
            return self.initial_a;
        }
        let elapsed = (now - self.start_time) as u128;
        let total = (self.end_time - self.start_time) as u128;
        if self.target_a >= self.initial_a {
            let delta = (self.target_a - self.initial_a) as u128;
            self.initial_a + (delta * elapsed / total) as u64
        } else {
            let delta = (self.initial_a - self.target_a) as u128;
            self.initial_a - (delta * elapsed / total) as u64
        }
    }

    /// Begin a new linear ramp from the value interpolated at `now`.
    pub fn schedule(&mut self, now: u64, target_a: u64, end_time: u64) {
        *self = Self {
            initial_a: self.current(now),
            target_a,
            start_time: now,
            end_time,
        };
    }

    /// Freeze at the value interpolated at `now`; future reads stay there.
    pub fn stop(&mut self, now: u64) {
        let frozen = self.current(now);
        *self = Self::flat(frozen);
    }
}

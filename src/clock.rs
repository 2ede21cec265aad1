//! Wrapping microsecond clock used for inter-frame silence detection
//!
//! Timestamps are 32-bit microsecond counter values, like the free-running
//! timers found on microcontrollers. The counter wraps roughly every 71.6
//! minutes; [`Timestamp::elapsed_since`] stays correct across one wrap.

use std::cell::Cell;
use std::time::{Duration, Instant};

/// Reading of a wrapping 32-bit microsecond counter
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Timestamp(u32);

impl Timestamp {
    /// Timestamp from a raw counter value
    #[inline]
    pub const fn from_micros(micros: u32) -> Self {
        Self(micros)
    }

    /// Raw counter value
    #[inline]
    pub const fn as_micros(self) -> u32 {
        self.0
    }

    /// Time from `earlier` to `self`, assuming less than one full counter period passed.
    #[inline]
    pub fn elapsed_since(self, earlier: Timestamp) -> Duration {
        Duration::from_micros(u64::from(self.0.wrapping_sub(earlier.0)))
    }
}

/// Source of timestamps
pub trait Clock {
    /// Current counter value
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Clock backed by [`std::time::Instant`], truncated to a 32-bit counter
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> Timestamp {
        // Truncation is the wrap
        Timestamp(self.origin.elapsed().as_micros() as u32)
    }
}

/// Manually advanced clock for tests and simulations
#[derive(Debug, Default)]
pub struct ManualClock {
    micros: Cell<u32>,
}

impl ManualClock {
    /// Clock starting at `micros`
    pub fn starting_at(micros: u32) -> Self {
        Self {
            micros: Cell::new(micros),
        }
    }

    /// Move the counter forward, wrapping like hardware
    pub fn advance(&self, by: Duration) {
        let step = by.as_micros() as u32;
        self.micros.set(self.micros.get().wrapping_add(step));
    }

    /// Set the counter
    pub fn set(&self, micros: u32) {
        self.micros.set(micros);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp(self.micros.get())
    }
}

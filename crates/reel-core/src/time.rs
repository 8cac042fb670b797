//! Monotonic microsecond time.
//!
//! Recorded packets carry [`Micros`] timestamps relative to an arbitrary
//! epoch; playback remaps them onto the caller's clock through a computed
//! offset. Sessions never read a clock themselves; every time-dependent
//! operation takes `now: Micros`, which keeps the subsystem deterministic
//! under test. Production callers sample a [`SystemClock`] once per tick.

use std::fmt;
use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::time::Instant;

/// A monotonic microsecond clock value with an arbitrary epoch.
///
/// Signed so that offsets (virtual time minus wall time) and backward
/// seek targets are representable without a separate duration type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Micros(pub i64);

impl Micros {
    /// Microseconds per second.
    pub const PER_SEC: i64 = 1_000_000;

    /// Zero point.
    pub const ZERO: Micros = Micros(0);

    /// Whole seconds as microseconds.
    pub fn from_secs(secs: i64) -> Micros {
        Micros(secs * Self::PER_SEC)
    }

    /// Value in (fractional) seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::PER_SEC as f64
    }
}

impl Add for Micros {
    type Output = Micros;

    fn add(self, rhs: Micros) -> Micros {
        Micros(self.0 + rhs.0)
    }
}

impl AddAssign for Micros {
    fn add_assign(&mut self, rhs: Micros) {
        self.0 += rhs.0;
    }
}

impl Sub for Micros {
    type Output = Micros;

    fn sub(self, rhs: Micros) -> Micros {
        Micros(self.0 - rhs.0)
    }
}

impl SubAssign for Micros {
    fn sub_assign(&mut self, rhs: Micros) {
        self.0 -= rhs.0;
    }
}

impl fmt::Display for Micros {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}us", self.0)
    }
}

/// A source of monotonic microsecond time.
pub trait Clock {
    /// The current clock value.
    fn now(&self) -> Micros;
}

/// Monotonic clock anchored at construction time.
///
/// Backed by [`Instant`], so the epoch is the moment the clock was created
/// and values never go backward.
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose epoch is "now".
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Micros {
        Micros(self.origin.elapsed().as_micros() as i64)
    }
}

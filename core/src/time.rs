//! Simulated clock values and countdown timers.

use std::{ops::Add, time::Duration};

use serde::{Deserialize, Serialize};

/// Point on the simulated timeline, measured from world creation.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SimTime(Duration);

impl SimTime {
    /// Start of the simulated timeline.
    pub const ZERO: Self = Self(Duration::ZERO);

    /// Creates a timestamp located `elapsed` after world creation.
    #[must_use]
    pub const fn from_elapsed(elapsed: Duration) -> Self {
        Self(elapsed)
    }

    /// Creates a timestamp from whole milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Time elapsed since world creation.
    #[must_use]
    pub const fn elapsed(&self) -> Duration {
        self.0
    }

    /// Time remaining until `deadline`, or zero once it has passed.
    #[must_use]
    pub fn until(&self, deadline: SimTime) -> Duration {
        deadline.0.saturating_sub(self.0)
    }

    /// Time that passed since `earlier`, or zero if `earlier` lies ahead.
    #[must_use]
    pub fn since(&self, earlier: SimTime) -> Duration {
        self.0.saturating_sub(earlier.0)
    }
}

impl Add<Duration> for SimTime {
    type Output = SimTime;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(rhs))
    }
}

/// Timer that accumulates elapsed time until it exceeds a duration.
///
/// The timer reports completion only once the accumulated time is strictly
/// greater than the duration, so a 150ms timer survives a tick that lands
/// exactly on 150ms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CountdownTimer {
    duration: Duration,
    counter: Duration,
    over: bool,
}

impl CountdownTimer {
    /// Creates a running timer.
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            counter: Duration::ZERO,
            over: false,
        }
    }

    /// Advances the timer, returning `true` on the update that completes it.
    pub fn update(&mut self, dt: Duration) -> bool {
        if self.over {
            return false;
        }
        self.counter = self.counter.saturating_add(dt);
        if self.counter > self.duration {
            self.over = true;
            return true;
        }
        false
    }

    /// Rewinds the timer to zero and clears its completion flag.
    pub fn restart(&mut self) {
        self.counter = Duration::ZERO;
        self.over = false;
    }

    /// Reports whether the timer has completed.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.over
    }

    /// Time left before the timer completes.
    #[must_use]
    pub fn time_left(&self) -> Duration {
        self.duration.saturating_sub(self.counter)
    }

    /// Configured duration.
    #[must_use]
    pub const fn duration(&self) -> Duration {
        self.duration
    }
}

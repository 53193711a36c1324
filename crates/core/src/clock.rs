// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for retry deadlines, lease expiry and wait timing

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync + 'static {
    fn now(&self) -> Instant;

    /// Time elapsed since `earlier`, saturating at zero
    fn since(&self, earlier: Instant) -> Duration {
        self.now().saturating_duration_since(earlier)
    }
}

/// Real system clock
#[derive(Clone, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone, Debug)]
pub struct FakeClock {
    current: Arc<Mutex<Instant>>,
}

impl FakeClock {
    pub fn new() -> Self {
        Self {
            current: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current += duration;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now(&self) -> Instant {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Measures a single span of time against a [`Clock`]
///
/// Stopping is sticky: once stopped, later calls return the first
/// measurement.
#[derive(Clone, Debug)]
pub struct Stopwatch {
    started: Instant,
    stopped: Option<Duration>,
}

impl Stopwatch {
    pub fn start(clock: &impl Clock) -> Self {
        Self {
            started: clock.now(),
            stopped: None,
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started
    }

    /// Stop the stopwatch and return the measured duration
    pub fn stop(&mut self, clock: &impl Clock) -> Duration {
        *self.stopped.get_or_insert_with(|| clock.since(self.started))
    }

    /// Duration so far, or the stopped duration
    pub fn elapsed(&self, clock: &impl Clock) -> Duration {
        self.stopped.unwrap_or_else(|| clock.since(self.started))
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;

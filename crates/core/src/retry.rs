// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Retry policy for whole acquisition attempts
//!
//! Only quorum failures are retried. The delay before retry `n` is
//! `min(cap, multiplier * 2^(n-1))` plus uniform jitter.

use crate::config::{LockOptions, RetryConfig};
use crate::error::LockError;
use rand::Rng;
use std::time::{Duration, Instant};

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryAction {
    /// Sleep, then run another attempt
    Retry { after: Duration },
    /// Surface the error to the caller
    GiveUp,
}

/// Backoff policy derived from [`LockOptions`]
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub config: RetryConfig,
    pub max_retries: Option<u32>,
}

/// Retry bookkeeping for one `acquire()` call
#[derive(Debug, Clone)]
pub struct RetryState {
    pub retries: u32,
    pub started: Instant,
}

impl RetryState {
    pub fn new(started: Instant) -> Self {
        Self {
            retries: 0,
            started,
        }
    }

    pub fn record_retry(&mut self) {
        self.retries += 1;
    }
}

impl RetryPolicy {
    pub fn new(config: RetryConfig, max_retries: Option<u32>) -> Self {
        Self {
            config,
            max_retries,
        }
    }

    pub fn from_options(options: &LockOptions) -> Self {
        Self::new(options.retry.clone(), options.effective_max_retries())
    }

    /// Exponential part of the delay before retry number `retry` (1-based)
    pub fn backoff(&self, retry: u32) -> Duration {
        let cap = self.config.backoff_cap;
        let exponent = retry.saturating_sub(1).min(31);
        self.config
            .backoff_multiplier
            .checked_mul(1u32 << exponent)
            .map_or(cap, |d| d.min(cap))
    }

    /// Uniform jitter within the configured bounds
    pub fn jitter(&self, rng: &mut impl Rng) -> Duration {
        let min = duration_nanos(self.config.jitter_min);
        let max = duration_nanos(self.config.jitter_max);
        if min >= max {
            return self.config.jitter_min;
        }
        Duration::from_nanos(rng.gen_range(min..=max))
    }

    pub fn delay(&self, retry: u32, rng: &mut impl Rng) -> Duration {
        self.backoff(retry) + self.jitter(rng)
    }

    /// Decide whether the attempt that failed with `error` gets a retry
    pub fn next_action(
        &self,
        state: &RetryState,
        error: &LockError,
        now: Instant,
        rng: &mut impl Rng,
    ) -> RetryAction {
        if !error.is_retryable() {
            return RetryAction::GiveUp;
        }

        if self.max_retries.is_some_and(|max| state.retries >= max) {
            return RetryAction::GiveUp;
        }

        if now.saturating_duration_since(state.started) >= self.config.max_cumulative_delay {
            return RetryAction::GiveUp;
        }

        RetryAction::Retry {
            after: self.delay(state.retries + 1, rng),
        }
    }
}

fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;

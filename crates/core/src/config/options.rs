// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock options
//!
//! Every knob a [`crate::Lock`] understands, with defaults, validation and
//! TOML loading.

use crate::error::LockError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Lease duration requested for the lock of locks
const META_LOCK_EXPIRE: Duration = Duration::from_secs(60);

/// Backoff parameters for whole acquisition attempts
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Stop retrying once this much time has passed since the first attempt
    #[serde(with = "humantime_serde")]
    pub max_cumulative_delay: Duration,
    /// Base of the exponential backoff
    #[serde(with = "humantime_serde")]
    pub backoff_multiplier: Duration,
    /// Ceiling for the exponential part of the delay
    #[serde(with = "humantime_serde")]
    pub backoff_cap: Duration,
    #[serde(with = "humantime_serde")]
    pub jitter_min: Duration,
    #[serde(with = "humantime_serde")]
    pub jitter_max: Duration,
    /// Retries after the first attempt; `Some(0)` tries exactly once
    pub max_retries: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_cumulative_delay: Duration::from_secs(60),
            backoff_multiplier: Duration::from_millis(50),
            backoff_cap: Duration::from_secs(5),
            jitter_min: Duration::ZERO,
            jitter_max: Duration::from_millis(100),
            max_retries: None,
        }
    }
}

/// Options for a [`crate::Lock`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockOptions {
    /// Lease duration hint passed to the backend
    #[serde(with = "humantime_serde")]
    pub expire: Duration,
    /// Ask the backend to keep renewing held leases
    pub auto_renewal: bool,
    /// Per-potential acquire timeout; `None` blocks indefinitely and zero
    /// makes a single non-blocking try
    #[serde(with = "humantime_serde")]
    pub timeout: Option<Duration>,
    /// Quorum for requirements wrapped from raw items
    pub need: usize,
    /// When false, a failed attempt is never retried
    pub block: bool,
    pub retry: RetryConfig,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            expire: Duration::from_secs(120),
            auto_renewal: true,
            timeout: None,
            need: 1,
            block: true,
            retry: RetryConfig::default(),
        }
    }
}

/// The subset of options a backend sees when creating a lock
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockParams {
    pub expire: Duration,
    pub auto_renewal: bool,
}

impl LockOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from TOML and validate them
    pub fn from_toml_str(source: &str) -> Result<Self, LockError> {
        let options: LockOptions =
            toml::from_str(source).map_err(|e| LockError::InvalidOptions(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    pub fn with_expire(mut self, expire: Duration) -> Self {
        self.expire = expire;
        self
    }

    pub fn with_auto_renewal(mut self, auto_renewal: bool) -> Self {
        self.auto_renewal = auto_renewal;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_need(mut self, need: usize) -> Self {
        self.need = need;
        self
    }

    pub fn with_block(mut self, block: bool) -> Self {
        self.block = block;
        self
    }

    /// Shorthand for `with_block(false)`: one attempt, no retries.
    /// Per-potential waiting still follows `timeout`.
    pub fn non_blocking(self) -> Self {
        self.with_block(false)
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = Some(max_retries);
        self
    }

    pub fn with_max_cumulative_delay(mut self, delay: Duration) -> Self {
        self.retry.max_cumulative_delay = delay;
        self
    }

    pub fn with_backoff(mut self, multiplier: Duration, cap: Duration) -> Self {
        self.retry.backoff_multiplier = multiplier;
        self.retry.backoff_cap = cap;
        self
    }

    pub fn with_jitter(mut self, min: Duration, max: Duration) -> Self {
        self.retry.jitter_min = min;
        self.retry.jitter_max = max;
        self
    }

    pub fn validate(&self) -> Result<(), LockError> {
        if self.expire.is_zero() {
            return Err(LockError::InvalidOptions(
                "expire must be greater than zero".to_string(),
            ));
        }
        if self.retry.jitter_min > self.retry.jitter_max {
            return Err(LockError::InvalidOptions(format!(
                "jitter_min ({:?}) exceeds jitter_max ({:?})",
                self.retry.jitter_min, self.retry.jitter_max
            )));
        }
        Ok(())
    }

    /// Retry bound after applying `block`
    pub fn effective_max_retries(&self) -> Option<u32> {
        if self.block {
            self.retry.max_retries
        } else {
            Some(0)
        }
    }

    /// `(blocking, timeout)` for each per-potential backend call
    pub fn acquire_mode(&self) -> (bool, Option<Duration>) {
        match self.timeout {
            Some(t) if t.is_zero() => (false, None),
            timeout => (true, timeout),
        }
    }

    /// Parameters for resource locks
    pub fn lock_params(&self) -> LockParams {
        LockParams {
            expire: self.expire,
            auto_renewal: self.auto_renewal,
        }
    }

    /// Parameters for the lock of locks
    pub fn meta_lock_params(&self) -> LockParams {
        LockParams {
            expire: META_LOCK_EXPIRE,
            auto_renewal: self.timeout.is_some(),
        }
    }
}

#[cfg(test)]
#[path = "options_tests.rs"]
mod tests;

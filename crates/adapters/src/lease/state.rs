// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lease state machine for a single key
//!
//! A lease is free or held by one holder until it expires. Expired leases
//! are reclaimed by the next acquirer.

use quorum_core::{Clock, HolderId};
use std::time::{Duration, Instant};

/// Lease state
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaseState {
    /// Lease is available
    Free,
    /// Lease is held until `expires_at`
    Held {
        holder: HolderId,
        expires_at: Instant,
    },
}

/// Inputs that drive lease transitions
#[derive(Clone, Debug)]
pub enum LeaseInput {
    Acquire { holder: HolderId, ttl: Duration },
    /// Extend the holder's lease by `ttl` from now
    Renew { holder: HolderId, ttl: Duration },
    Release { holder: HolderId },
}

/// What a transition did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LeaseOutcome {
    Granted,
    /// Granted after taking over an expired lease
    Reclaimed { previous: HolderId },
    Denied { current: HolderId },
    Renewed,
    Released,
    /// The input's holder does not hold the lease
    NotHeld,
}

impl LeaseOutcome {
    pub fn is_granted(&self) -> bool {
        matches!(self, LeaseOutcome::Granted | LeaseOutcome::Reclaimed { .. })
    }
}

/// A keyed lease
#[derive(Clone, Debug)]
pub struct Lease {
    pub state: LeaseState,
}

impl Default for Lease {
    fn default() -> Self {
        Self::new()
    }
}

impl Lease {
    pub fn new() -> Self {
        Self {
            state: LeaseState::Free,
        }
    }

    pub fn holder(&self) -> Option<&HolderId> {
        match &self.state {
            LeaseState::Free => None,
            LeaseState::Held { holder, .. } => Some(holder),
        }
    }

    pub fn is_expired(&self, clock: &impl Clock) -> bool {
        match &self.state {
            LeaseState::Free => false,
            LeaseState::Held { expires_at, .. } => clock.now() >= *expires_at,
        }
    }

    /// Held by someone and not yet expired
    pub fn is_live(&self, clock: &impl Clock) -> bool {
        self.holder().is_some() && !self.is_expired(clock)
    }

    /// Whether `holder` holds a live lease
    pub fn is_held_by(&self, holder: &HolderId, clock: &impl Clock) -> bool {
        self.holder() == Some(holder) && !self.is_expired(clock)
    }

    /// Pure state transition function
    pub fn transition(&self, input: LeaseInput, clock: &impl Clock) -> (Lease, LeaseOutcome) {
        let now = clock.now();
        let held = |holder: HolderId, ttl: Duration| Lease {
            state: LeaseState::Held {
                holder,
                expires_at: now + ttl,
            },
        };

        match (input, &self.state) {
            (LeaseInput::Acquire { holder, ttl }, LeaseState::Free) => {
                (held(holder, ttl), LeaseOutcome::Granted)
            }
            (LeaseInput::Acquire { holder, ttl }, LeaseState::Held { holder: current, .. }) => {
                if *current == holder && !self.is_expired(clock) {
                    (held(holder, ttl), LeaseOutcome::Granted)
                } else if self.is_expired(clock) {
                    let previous = current.clone();
                    (held(holder, ttl), LeaseOutcome::Reclaimed { previous })
                } else {
                    let current = current.clone();
                    (self.clone(), LeaseOutcome::Denied { current })
                }
            }
            (LeaseInput::Renew { holder, ttl }, LeaseState::Held { holder: current, .. })
                if *current == holder && !self.is_expired(clock) =>
            {
                (held(holder, ttl), LeaseOutcome::Renewed)
            }
            (LeaseInput::Release { holder }, LeaseState::Held { holder: current, .. })
                if *current == holder =>
            {
                // A lapsed lease nobody reclaimed yet still counts as ours
                (Lease::new(), LeaseOutcome::Released)
            }
            (LeaseInput::Renew { .. } | LeaseInput::Release { .. }, _) => {
                (self.clone(), LeaseOutcome::NotHeld)
            }
        }
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;

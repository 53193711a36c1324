// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quorum group of potentials
//!
//! A requirement is satisfied once `need` of its potentials are fulfilled,
//! and fails as soon as too few untried-or-fulfilled potentials remain.

use crate::error::LockError;
use crate::potential::{display_key, KeyGen, Potential, TagGen};
use crate::tags::Tags;
use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

/// Derived resolution state of a requirement
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequirementState {
    Pending,
    Fulfilled,
    Rejected,
}

/// Either a raw item or a prepared potential
pub enum Candidate<T> {
    Item(T),
    Potential(Potential<T>),
}

impl<T> From<Potential<T>> for Candidate<T> {
    fn from(potential: Potential<T>) -> Self {
        Candidate::Potential(potential)
    }
}

/// An ordered OR-group of potentials with a quorum threshold
#[derive(Clone)]
pub struct Requirement<T = String> {
    potentials: Vec<Potential<T>>,
    need: usize,
    state: RequirementState,
    key_gen: KeyGen<T>,
    tag_gen: Option<TagGen<T>>,
    tags: Tags,
}

impl<T: fmt::Display + 'static> Requirement<T> {
    /// Empty requirement keyed by each item's display form, `need = 1`
    pub fn new() -> Self {
        Self::with_key_gen_arc(display_key())
    }

    /// Requirement over `items`, `need = 1`
    pub fn of(items: impl IntoIterator<Item = T>) -> Self {
        Self::new().items(items)
    }
}

impl<T: fmt::Display + 'static> Default for Requirement<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Requirement<T> {
    /// Empty requirement whose raw items are keyed by `key_gen`
    pub fn with_key_gen(key_gen: impl Fn(&T) -> String + Send + Sync + 'static) -> Self {
        Self::with_key_gen_arc(Arc::new(key_gen))
    }

    fn with_key_gen_arc(key_gen: KeyGen<T>) -> Self {
        Self {
            potentials: Vec::new(),
            need: 1,
            state: RequirementState::Pending,
            key_gen,
            tag_gen: None,
            tags: Tags::new(),
        }
    }

    pub fn with_need(mut self, need: usize) -> Self {
        self.need = need;
        self
    }

    /// Tags derived for every raw item added afterwards
    pub fn with_tag_gen(mut self, tag_gen: impl Fn(&T) -> Tags + Send + Sync + 'static) -> Self {
        self.tag_gen = Some(Arc::new(tag_gen));
        self
    }

    /// Base tags for every raw item added afterwards
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags = tags;
        self
    }

    pub fn items(mut self, items: impl IntoIterator<Item = T>) -> Self {
        for item in items {
            self.add_item(item);
        }
        self
    }

    pub fn potential(mut self, potential: Potential<T>) -> Self {
        self.add_potential(potential);
        self
    }

    /// Append a candidate, wrapping raw items with this requirement's generators
    pub fn add(&mut self, candidate: Candidate<T>) -> &mut Self {
        let potential = match candidate {
            Candidate::Potential(p) => p,
            Candidate::Item(item) => {
                Potential::build(item, &self.key_gen, self.tag_gen.as_ref(), &self.tags)
            }
        };
        self.potentials.push(potential);
        self
    }

    pub fn add_item(&mut self, item: T) -> &mut Self {
        self.add(Candidate::Item(item))
    }

    pub fn add_potential(&mut self, potential: Potential<T>) -> &mut Self {
        self.add(Candidate::Potential(potential))
    }

    pub fn need(&self) -> usize {
        self.need
    }

    pub fn state(&self) -> RequirementState {
        self.state
    }

    pub fn is_fulfilled(&self) -> bool {
        self.state == RequirementState::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.state == RequirementState::Rejected
    }

    pub fn potentials(&self) -> &[Potential<T>] {
        &self.potentials
    }

    pub(crate) fn potential_mut(&mut self, index: usize) -> Option<&mut Potential<T>> {
        self.potentials.get_mut(index)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.potentials.iter().map(|p| p.key())
    }

    /// `(fulfilled, rejected)` counts
    pub fn counts(&self) -> (usize, usize) {
        self.potentials
            .iter()
            .fold((0, 0), |(fulfilled, rejected), p| {
                (
                    fulfilled + usize::from(p.is_fulfilled()),
                    rejected + usize::from(p.is_rejected()),
                )
            })
    }

    /// Potentials not yet rejected
    pub fn remaining(&self) -> usize {
        let (_, rejected) = self.counts();
        self.potentials.len() - rejected
    }

    /// Recompute state from the potentials
    ///
    /// Fails with [`LockError::RequirementNotMet`] once the quorum can no
    /// longer be reached; callers must stop trying this requirement.
    pub fn validate(&mut self) -> Result<RequirementState, LockError> {
        let (fulfilled, _) = self.counts();
        if fulfilled >= self.need {
            self.state = RequirementState::Fulfilled;
            return Ok(self.state);
        }

        let remaining = self.remaining();
        if remaining < self.need {
            self.state = RequirementState::Rejected;
            return Err(LockError::RequirementNotMet {
                remaining,
                need: self.need,
            });
        }

        self.state = RequirementState::Pending;
        Ok(self.state)
    }

    /// Indices in acquisition order: shuffled unknown keys, then known-held keys
    pub fn prioritised_order(&self, known_locked: &HashSet<String>) -> Vec<usize> {
        self.prioritised_order_with(known_locked, &mut rand::thread_rng())
    }

    pub fn prioritised_order_with(
        &self,
        known_locked: &HashSet<String>,
        rng: &mut impl Rng,
    ) -> Vec<usize> {
        let (mut unknown, known): (Vec<usize>, Vec<usize>) = (0..self.potentials.len())
            .partition(|&i| !known_locked.contains(self.potentials[i].key()));
        unknown.shuffle(rng);
        unknown.extend(known);
        unknown
    }

    pub fn prioritised_potentials(&self, known_locked: &HashSet<String>) -> Vec<&Potential<T>> {
        self.prioritised_order(known_locked)
            .into_iter()
            .map(|i| &self.potentials[i])
            .collect()
    }

    /// Fulfilled potentials in insertion order
    pub fn fulfilled(&self) -> Vec<&Potential<T>> {
        self.potentials.iter().filter(|p| p.is_fulfilled()).collect()
    }

    pub fn fulfilled_items(&self) -> impl Iterator<Item = &T> {
        self.potentials
            .iter()
            .filter(|p| p.is_fulfilled())
            .map(|p| p.item())
    }

    pub fn fulfilled_count(&self) -> usize {
        self.counts().0
    }

    /// The `index`-th fulfilled item, in insertion order
    pub fn get(&self, index: usize) -> Option<&T> {
        self.fulfilled_items().nth(index)
    }

    pub fn reset(&mut self) {
        self.state = RequirementState::Pending;
        for p in &mut self.potentials {
            p.reset();
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Requirement<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requirement")
            .field("need", &self.need)
            .field("state", &self.state)
            .field("potentials", &self.potentials)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "requirement_tests.rs"]
mod tests;

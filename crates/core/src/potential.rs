// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single candidate resource and its resolution status
//!
//! Status moves `Untried -> Fulfilled` or `Untried -> Rejected` at most once
//! per acquisition attempt. Resolving an already-resolved potential is a
//! no-op that returns `false`; only [`Potential::reset`] makes it untried
//! again. The key is derived once at construction and never changes.

use crate::tags::{TagValue, Tags, KEY_TAG};
use std::fmt;
use std::sync::Arc;

/// Derives a potential's identity key from its item
pub type KeyGen<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

/// Derives extra metric tags from an item
pub type TagGen<T> = Arc<dyn Fn(&T) -> Tags + Send + Sync>;

/// Identity key generator for displayable items
pub fn display_key<T: fmt::Display + 'static>() -> KeyGen<T> {
    Arc::new(|item: &T| item.to_string())
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PotentialStatus {
    Untried,
    Fulfilled,
    Rejected,
}

/// A candidate resource within a [`crate::Requirement`]
#[derive(Clone, Debug)]
pub struct Potential<T> {
    key: String,
    tags: Tags,
    item: T,
    status: PotentialStatus,
}

impl<T: fmt::Display> Potential<T> {
    /// Wrap an item, using its display form as the key
    pub fn new(item: T) -> Self {
        let key = item.to_string();
        Self::with_key(item, key)
    }
}

impl<T> Potential<T> {
    /// Wrap an item under an explicit key
    pub fn with_key(item: T, key: impl Into<String>) -> Self {
        let key = key.into();
        let mut tags = Tags::new();
        tags.insert(KEY_TAG.to_string(), TagValue::Str(key.clone()));
        Self {
            key,
            tags,
            item,
            status: PotentialStatus::Untried,
        }
    }

    /// Wrap an item, deriving its key with `key_gen`
    pub fn with_key_gen(item: T, key_gen: impl Fn(&T) -> String) -> Self {
        let key = key_gen(&item);
        Self::with_key(item, key)
    }

    pub(crate) fn build(
        item: T,
        key_gen: &KeyGen<T>,
        tag_gen: Option<&TagGen<T>>,
        tags: &Tags,
    ) -> Self {
        let key = key_gen(&item);
        let potential = Self::with_key(item, key).with_tags(tags.clone());
        match tag_gen {
            Some(tag_gen) => {
                let derived = tag_gen(&potential.item);
                potential.with_tags(derived)
            }
            None => potential,
        }
    }

    /// Merge extra tags; the `key` tag always reflects the potential's key
    pub fn with_tags(mut self, tags: Tags) -> Self {
        self.tags.extend(tags);
        self.tags
            .insert(KEY_TAG.to_string(), TagValue::Str(self.key.clone()));
        self
    }

    /// Merge tags derived from the item
    pub fn with_tag_gen(self, tag_gen: impl Fn(&T) -> Tags) -> Self {
        let derived = tag_gen(&self.item);
        self.with_tags(derived)
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn tags(&self) -> &Tags {
        &self.tags
    }

    pub fn item(&self) -> &T {
        &self.item
    }

    pub fn into_item(self) -> T {
        self.item
    }

    pub fn status(&self) -> PotentialStatus {
        self.status
    }

    pub fn is_fulfilled(&self) -> bool {
        self.status == PotentialStatus::Fulfilled
    }

    pub fn is_rejected(&self) -> bool {
        self.status == PotentialStatus::Rejected
    }

    pub fn is_resolved(&self) -> bool {
        self.status != PotentialStatus::Untried
    }

    /// Mark as fulfilled; returns false if already resolved
    pub fn fulfill(&mut self) -> bool {
        self.resolve(PotentialStatus::Fulfilled)
    }

    /// Mark as rejected; returns false if already resolved
    pub fn reject(&mut self) -> bool {
        self.resolve(PotentialStatus::Rejected)
    }

    pub fn reset(&mut self) {
        self.status = PotentialStatus::Untried;
    }

    fn resolve(&mut self, status: PotentialStatus) -> bool {
        if self.is_resolved() {
            return false;
        }
        self.status = status;
        true
    }
}

#[cfg(test)]
#[path = "potential_tests.rs"]
mod tests;

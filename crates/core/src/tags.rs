// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Metric attribution tags

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Tag name under which every potential records its key
pub const KEY_TAG: &str = "key";

/// A scalar tag value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagValue::Bool(b) => write!(f, "{}", b),
            TagValue::Int(i) => write!(f, "{}", i),
            TagValue::Float(x) => write!(f, "{}", x),
            TagValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for TagValue {
    fn from(value: &str) -> Self {
        TagValue::Str(value.to_string())
    }
}

impl From<String> for TagValue {
    fn from(value: String) -> Self {
        TagValue::Str(value)
    }
}

impl From<bool> for TagValue {
    fn from(value: bool) -> Self {
        TagValue::Bool(value)
    }
}

impl From<i64> for TagValue {
    fn from(value: i64) -> Self {
        TagValue::Int(value)
    }
}

impl From<i32> for TagValue {
    fn from(value: i32) -> Self {
        TagValue::Int(i64::from(value))
    }
}

impl From<u32> for TagValue {
    fn from(value: u32) -> Self {
        TagValue::Int(i64::from(value))
    }
}

impl From<f64> for TagValue {
    fn from(value: f64) -> Self {
        TagValue::Float(value)
    }
}

/// Ordered tag map attached to potentials and reporter calls
pub type Tags = BTreeMap<String, TagValue>;

/// Build a [`Tags`] map from `(name, value)` pairs
pub fn tags<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Tags
where
    K: Into<String>,
    V: Into<TagValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_display_as_scalars() {
        assert_eq!(TagValue::from("gpu").to_string(), "gpu");
        assert_eq!(TagValue::from(3).to_string(), "3");
        assert_eq!(TagValue::from(true).to_string(), "true");
        assert_eq!(TagValue::from(1.5).to_string(), "1.5");
    }

    #[test]
    fn tags_builds_ordered_map() {
        let t = tags([("zone", "eu"), ("kind", "gpu")]);
        let names: Vec<_> = t.keys().cloned().collect();
        assert_eq!(names, vec!["kind".to_string(), "zone".to_string()]);
    }
}

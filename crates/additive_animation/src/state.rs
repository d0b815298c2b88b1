//! Keyed numeric state vectors
//!
//! A [`StateVector`] maps property names (`"x"`, `"opacity"`, ...) to values.
//! Keys keep their insertion order so renders and snapshots are stable.

use crate::error::{AnimationError, Result};
use indexmap::IndexMap;
use std::ops::Index;

/// A mapping from property names to numeric values
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StateVector {
    values: IndexMap<String, f64>,
}

impl StateVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: add or replace a value
    pub fn with(mut self, key: impl Into<String>, value: f64) -> Self {
        self.insert(key, value);
        self
    }

    /// Insert a value, returning the previous one for that key
    pub fn insert(&mut self, key: impl Into<String>, value: f64) -> Option<f64> {
        self.values.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut f64)> {
        self.values.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Check that both vectors track exactly the same keys (order ignored)
    pub fn has_same_keys(&self, other: &Self) -> bool {
        self.first_key_difference(other).is_none()
    }

    /// Absolute per-key distance to `other`, for keys present in both
    pub fn distance(&self, other: &Self) -> StateVector {
        self.values
            .iter()
            .filter_map(|(key, value)| {
                other
                    .get(key)
                    .map(|theirs| (key.clone(), (theirs - value).abs()))
            })
            .collect()
    }

    /// First key present in one vector but not the other
    pub(crate) fn first_key_difference<'a>(&'a self, other: &'a Self) -> Option<&'a str> {
        self.keys()
            .find(|key| !other.contains_key(key))
            .or_else(|| other.keys().find(|key| !self.contains_key(key)))
    }

    /// Reject NaN and infinite values
    pub(crate) fn ensure_finite(&self) -> Result<()> {
        match self.values.iter().find(|(_, v)| !v.is_finite()) {
            Some((key, _)) => Err(AnimationError::NonFiniteValue { key: key.clone() }),
            None => Ok(()),
        }
    }
}

impl Index<&str> for StateVector {
    type Output = f64;

    fn index(&self, key: &str) -> &f64 {
        &self.values[key]
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for StateVector {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl<K: Into<String>, const N: usize> From<[(K, f64); N]> for StateVector {
    fn from(pairs: [(K, f64); N]) -> Self {
        pairs.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_keep_insertion_order() {
        let state = StateVector::new().with("y", 2.0).with("x", 1.0);
        let keys: Vec<&str> = state.keys().collect();
        assert_eq!(keys, vec!["y", "x"]);
        assert_eq!(state["x"], 1.0);
    }

    #[test]
    fn test_same_keys_ignores_order() {
        let a = StateVector::from([("x", 0.0), ("y", 0.0)]);
        let b = StateVector::from([("y", 5.0), ("x", 3.0)]);
        let c = StateVector::from([("x", 0.0), ("z", 0.0)]);

        assert!(a.has_same_keys(&b));
        assert!(!a.has_same_keys(&c));
        assert_eq!(a.first_key_difference(&c), Some("y"));
    }

    #[test]
    fn test_subset_is_not_same_keys() {
        let a = StateVector::from([("x", 0.0)]);
        let b = StateVector::from([("x", 0.0), ("y", 0.0)]);
        assert_eq!(a.first_key_difference(&b), Some("y"));
    }

    #[test]
    fn test_distance() {
        let a = StateVector::from([("x", 10.0), ("y", -5.0)]);
        let b = StateVector::from([("x", 4.0), ("y", 5.0)]);
        let d = a.distance(&b);
        assert_eq!(d["x"], 6.0);
        assert_eq!(d["y"], 10.0);
    }

    #[test]
    fn test_ensure_finite() {
        let ok = StateVector::from([("x", 1.0)]);
        assert!(ok.ensure_finite().is_ok());

        let bad = StateVector::from([("x", 1.0), ("opacity", f64::NAN)]);
        assert_eq!(
            bad.ensure_finite(),
            Err(AnimationError::NonFiniteValue {
                key: "opacity".into()
            })
        );
    }
}

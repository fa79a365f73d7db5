use codetree_metrics::{CanonicalKey, MetricRegistry};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Value returned by [`MetricStore::get_or_default`] for a metric that is
/// not present.
pub const MISSING_METRIC: f64 = -1.0;

/// Named numeric metric values of a single node, keyed by canonical name.
///
/// Writes pass through an injected [`MetricRegistry`]; a write whose name is
/// empty, whose value is NaN or infinite, or whose name fails
/// canonicalization is dropped with a warn-level diagnostic instead of
/// failing the caller.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricStore {
    values: HashMap<String, f64>,
}

impl MetricStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `value` under the canonical form of `name`, overwriting any
    /// prior value. Invalid writes are dropped.
    pub fn add(&mut self, registry: &dyn MetricRegistry, name: &str, value: f64) {
        let Some(key) = Self::validate(registry, name, value) else {
            return;
        };
        self.values.insert(key.into_string(), value);
    }

    /// Add `delta` to the stored value, behaving as [`MetricStore::add`]
    /// when no prior value exists. Invalid writes are dropped.
    pub fn increment(&mut self, registry: &dyn MetricRegistry, name: &str, delta: f64) {
        let Some(key) = Self::validate(registry, name, delta) else {
            return;
        };
        *self.values.entry(key.into_string()).or_insert(0.0) += delta;
    }

    fn validate(registry: &dyn MetricRegistry, name: &str, value: f64) -> Option<CanonicalKey> {
        if name.is_empty() {
            log::warn!("dropping metric write: empty name");
            return None;
        }
        if !value.is_finite() {
            log::warn!("dropping metric `{name}`: value {value} is not finite");
            return None;
        }
        let key = registry.canonicalize(name);
        if key.is_none() {
            log::warn!("dropping metric `{name}`: not a registered metric name");
        }
        key
    }

    /// Stored value under `name`, if present.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Stored value under `name`, or [`MISSING_METRIC`] with a diagnostic
    /// when absent.
    #[must_use]
    pub fn get_or_default(&self, name: &str) -> f64 {
        self.get(name).unwrap_or_else(|| {
            log::warn!("metric `{name}` is not present; returning {MISSING_METRIC}");
            MISSING_METRIC
        })
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Names of all stored metrics, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Fold `other` into self; `other`'s values win on conflicting names.
    pub fn merge_from(&mut self, other: MetricStore) {
        for (name, value) in other.values {
            self.values.insert(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codetree_metrics::{MetricCatalog, OpenRegistry};
    use pretty_assertions::assert_eq;

    #[test]
    fn add_stores_under_canonical_name() {
        let registry = MetricCatalog::new().register("LOC").alias("lines", "LOC");
        let mut store = MetricStore::new();
        store.add(&registry, "lines", 42.0);
        assert_eq!(store.get("LOC"), Some(42.0));
        assert!(!store.contains("lines"));
    }

    #[test]
    fn add_overwrites_prior_value() {
        let mut store = MetricStore::new();
        store.add(&OpenRegistry, "LOC", 10.0);
        store.add(&OpenRegistry, "LOC", 20.0);
        assert_eq!(store.get("LOC"), Some(20.0));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalid_writes_leave_the_store_unchanged() {
        let mut store = MetricStore::new();
        store.add(&OpenRegistry, "", 1.0);
        store.add(&OpenRegistry, "LOC", f64::NAN);
        store.add(&OpenRegistry, "LOC", f64::INFINITY);
        store.add(&OpenRegistry, "LOC", f64::NEG_INFINITY);
        let registry = MetricCatalog::new();
        store.add(&registry, "unregistered", 1.0);
        assert!(store.is_empty());
    }

    #[test]
    fn increment_without_prior_value_behaves_as_add() {
        let mut store = MetricStore::new();
        store.increment(&OpenRegistry, "NOA", 3.0);
        assert_eq!(store.get("NOA"), Some(3.0));
    }

    #[test]
    fn increment_adds_to_existing_value() {
        let mut store = MetricStore::new();
        store.add(&OpenRegistry, "NOA", 3.0);
        store.increment(&OpenRegistry, "NOA", 2.5);
        assert_eq!(store.get("NOA"), Some(5.5));
    }

    #[test]
    fn get_or_default_reports_missing_metrics() {
        let store = MetricStore::new();
        assert_eq!(store.get_or_default("LOC"), MISSING_METRIC);
    }

    #[test]
    fn merge_prefers_incoming_values() {
        let mut mine = MetricStore::new();
        mine.add(&OpenRegistry, "LOC", 10.0);
        mine.add(&OpenRegistry, "NOA", 1.0);
        let mut theirs = MetricStore::new();
        theirs.add(&OpenRegistry, "LOC", 99.0);
        theirs.add(&OpenRegistry, "McCC", 4.0);
        mine.merge_from(theirs);
        assert_eq!(mine.get("LOC"), Some(99.0));
        assert_eq!(mine.get("NOA"), Some(1.0));
        assert_eq!(mine.get("McCC"), Some(4.0));
    }
}

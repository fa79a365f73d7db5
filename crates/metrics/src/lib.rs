//! # Codetree Metrics
//!
//! Metric-name canonicalization for the codetree model.
//!
//! Every metric write in the model passes through a [`MetricRegistry`]: the
//! raw name a producer used is resolved to its [`CanonicalKey`] before the
//! value is stored, and a name the registry does not know is dropped by the
//! caller. This keeps metric maps comparable across pipeline stages that
//! spell the same metric differently ("LOC", "loc", "lines_of_code").
//!
//! The registry is a value the caller injects (`&dyn MetricRegistry`) into
//! each write path; nothing here is process-global.
//!
//! Two implementations are provided:
//!
//! - [`MetricCatalog`]: an explicit catalog of registered names and their
//!   aliases, resolved case-insensitively. This is the production shape: the
//!   pipeline registers the metrics its analyzers emit.
//! - [`OpenRegistry`]: accepts any non-empty name as its own canonical key.
//!   Useful for tests and for stages that re-ingest already-canonical data.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Canonical key of a registered metric name.
///
/// Obtained only through [`MetricRegistry::canonicalize`]; the inner string
/// is the exact spelling metric maps are keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// The canonical spelling.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, yielding the canonical spelling.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves raw metric names to their canonical keys.
pub trait MetricRegistry: Send + Sync {
    /// Resolve `name` to its canonical key, or `None` when the name is not
    /// registered. Callers drop the write on `None`.
    fn canonicalize(&self, name: &str) -> Option<CanonicalKey>;
}

/// Registry backed by an explicit catalog of metric names and aliases.
///
/// Lookups trim surrounding whitespace and are case-insensitive; the
/// canonical spelling is returned exactly as registered.
#[derive(Debug, Clone, Default)]
pub struct MetricCatalog {
    /// Lowercased alias -> canonical spelling.
    by_alias: HashMap<String, String>,
}

impl MetricCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: register a metric under its canonical spelling.
    #[must_use]
    pub fn register(mut self, canonical: impl Into<String>) -> Self {
        let canonical = canonical.into();
        self.by_alias
            .insert(canonical.to_lowercase(), canonical.clone());
        self
    }

    /// Builder: register an additional spelling for an already-registered
    /// canonical name. The alias resolves even if the canonical name was
    /// never registered on its own.
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>, canonical: impl Into<String>) -> Self {
        self.by_alias
            .insert(alias.into().to_lowercase(), canonical.into());
        self
    }

    /// Number of resolvable spellings (canonical names plus aliases).
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_alias.len()
    }

    /// True when nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_alias.is_empty()
    }
}

impl MetricRegistry for MetricCatalog {
    fn canonicalize(&self, name: &str) -> Option<CanonicalKey> {
        let key = name.trim().to_lowercase();
        if key.is_empty() {
            return None;
        }
        self.by_alias.get(&key).cloned().map(CanonicalKey)
    }
}

/// Registry that treats any non-empty trimmed name as already canonical.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenRegistry;

impl MetricRegistry for OpenRegistry {
    fn canonicalize(&self, name: &str) -> Option<CanonicalKey> {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(CanonicalKey(trimmed.to_string()))
        }
    }
}

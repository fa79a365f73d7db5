use serde::{Deserialize, Serialize};

/// Kind of a non-owning edge between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelationshipKind {
    /// Source depends on target (call, reference, import).
    Dependency,
    /// Source holds or uses target structurally.
    Association,
    /// Source extends target.
    Generalization,
    /// Source implements target.
    Realization,
}

/// Non-owning edge between two nodes, identified by their qualified
/// identifiers.
///
/// Relationship edges live beside the containment tree, are unconstrained
/// (they may form cycles), and are never followed by cloning or extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub kind: RelationshipKind,
    pub source: String,
    pub target: String,
}

impl Relationship {
    pub fn new(kind: RelationshipKind, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            kind,
            source: source.into(),
            target: target.into(),
        }
    }

    /// True when either endpoint is `qid`.
    #[must_use]
    pub fn connects(&self, qid: &str) -> bool {
        self.source == qid || self.target == qid
    }
}

//! # Codetree Model
//!
//! In-memory model of an analyzed codebase: a containment tree of projects,
//! modules, namespaces, files, types, methods, fields and statements, each
//! annotated with named numeric metric values, exchanged between analysis
//! pipeline stages as JSON documents.
//!
//! ## Architecture
//!
//! ```text
//! per-file producers
//!     │  decode_file / build nodes (metric writes pass a MetricRegistry)
//!     │
//!     ├──> SharedTree::update_file ── monitor-style upsert
//!     │                                   │
//!     │                                   ▼
//!     │                             CodeTree (owns one root Project)
//!     │                                   │
//!     └──> TreeUtils (borrowed view) ─────┤
//!            ├─ indices: all_projects / all_files / all_types / all_methods
//!            ├─ directed search: find_project / find_file / find_method ...
//!            ├─ find_parent: kind-dispatched parent resolution
//!            └─ extract_tree: skeleton path + deep-cloned target subtree
//!                                   │
//!                                   ▼
//!            codec: encode_* / decode_* (identifier-keyed JSON child maps)
//! ```
//!
//! Containment runs Project → Module/Namespace/File → Type → Method/Field →
//! Statement; children point back at their container only by identifier
//! string. Relationship edges (dependency, association, generalization,
//! realization) live beside the tree and are never traversed by cloning or
//! extraction.

mod codec;
mod error;
mod kinds;
mod metrics;
mod node;
mod relationship;
mod span;
mod tree;
mod utils;

pub use codec::{
    decode_file, decode_project, decode_tree, encode_file, encode_project, encode_tree,
};
pub use error::{ModelError, Result};
pub use kinds::{Field, Method, Module, Namespace, Project, SourceFile, Statement, TypeNode};
pub use metrics::{MetricStore, MISSING_METRIC};
pub use node::{CodeNode, NodeKind, NodeRef};
pub use relationship::{Relationship, RelationshipKind};
pub use span::Span;
pub use tree::{CodeTree, SharedTree};
pub use utils::{TreeUtils, METHOD_SEPARATOR};

// Registry surface, re-exported so consumers of the model need one import.
pub use codetree_metrics::{CanonicalKey, MetricCatalog, MetricRegistry, OpenRegistry};

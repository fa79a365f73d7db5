use crate::error::{ModelError, Result};
use crate::kinds::{Field, Method, Module, Namespace, Project, SourceFile, Statement, TypeNode};
use crate::metrics::MetricStore;
use codetree_metrics::MetricRegistry;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant tag of a node kind.
///
/// Traversal, parent resolution and extraction dispatch on this tag instead
/// of inspecting concrete types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Project,
    Module,
    Namespace,
    File,
    Type,
    Method,
    Field,
    Statement,
}

impl NodeKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::Module => "module",
            Self::Namespace => "namespace",
            Self::File => "file",
            Self::Type => "type",
            Self::Method => "method",
            Self::Field => "field",
            Self::Statement => "statement",
        }
    }

    /// True for kinds that own child collections.
    #[must_use]
    pub const fn is_container(self) -> bool {
        !matches!(self, Self::Field | Self::Statement)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity, naming, parent linkage and metric storage shared by every node
/// kind.
///
/// The qualified identifier is fixed at construction and globally unique
/// within a tree. The parent key is a weak back-reference: only the
/// identifier string of the logically containing node is stored, never a
/// pointer, so ownership always runs root-to-leaf.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeCore {
    qid: String,
    name: String,
    parent: Option<String>,
    metrics: MetricStore,
}

impl NodeCore {
    pub(crate) fn new(qid: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let qid = qid.into();
        if qid.is_empty() {
            return Err(ModelError::EmptyIdentifier);
        }
        Ok(Self {
            qid,
            name: name.into(),
            parent: None,
            metrics: MetricStore::new(),
        })
    }

    pub fn qid(&self) -> &str {
        &self.qid
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn parent(&self) -> Option<&str> {
        self.parent.as_deref()
    }

    /// Point this node at its logical container. Self-parenting is rejected.
    pub fn set_parent(&mut self, id: impl Into<String>) -> Result<()> {
        let id = id.into();
        if id == self.qid {
            return Err(ModelError::SelfParent { qid: id });
        }
        self.parent = Some(id);
        Ok(())
    }

    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    pub fn metrics(&self) -> &MetricStore {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricStore {
        &mut self.metrics
    }

    pub(crate) fn set_metrics(&mut self, metrics: MetricStore) {
        self.metrics = metrics;
    }

    /// Fold `other`'s identity-independent content into self: the name (when
    /// `other` carries one) and the metrics, `other`'s values winning on
    /// conflict. The qualified identifier and parent key keep this node's
    /// position in its tree.
    pub(crate) fn update_from(&mut self, other: NodeCore) {
        if !other.name.is_empty() {
            self.name = other.name;
        }
        self.metrics.merge_from(other.metrics);
    }
}

/// Uniform capability contract shared by every node kind.
pub trait CodeNode {
    /// Kind discriminant, used by the dispatch tables.
    fn kind(&self) -> NodeKind;

    fn core(&self) -> &NodeCore;

    fn core_mut(&mut self) -> &mut NodeCore;

    /// Qualified identifier: globally unique within a tree, immutable after
    /// construction.
    fn qid(&self) -> &str {
        self.core().qid()
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    /// Identifier of the logically containing node, when one is declared.
    fn parent_key(&self) -> Option<&str> {
        self.core().parent()
    }

    fn has_parent(&self) -> bool {
        self.core().parent().is_some()
    }

    /// Declare the logical container. Fails with
    /// [`ModelError::SelfParent`] when `id` equals this node's identifier.
    fn set_parent_key(&mut self, id: impl Into<String>) -> Result<()>
    where
        Self: Sized,
    {
        self.core_mut().set_parent(id)
    }

    fn clear_parent_key(&mut self) {
        self.core_mut().clear_parent();
    }

    fn metrics(&self) -> &MetricStore {
        self.core().metrics()
    }

    /// Store a metric value under the canonical form of `name`; invalid or
    /// unregistered writes are dropped.
    fn add_metric(&mut self, registry: &dyn MetricRegistry, name: &str, value: f64) {
        self.core_mut().metrics_mut().add(registry, name, value);
    }

    /// Add `delta` to a stored metric, behaving as `add_metric` when no
    /// prior value exists.
    fn increment_metric(&mut self, registry: &dyn MetricRegistry, name: &str, delta: f64) {
        self.core_mut().metrics_mut().increment(registry, name, delta);
    }

    /// Stored metric value, if present.
    fn metric(&self, name: &str) -> Option<f64> {
        self.core().metrics().get(name)
    }

    /// Stored metric value, or [`crate::MISSING_METRIC`] with a diagnostic
    /// when absent.
    fn metric_or_default(&self, name: &str) -> f64 {
        self.core().metrics().get_or_default(name)
    }

    fn has_metric(&self, name: &str) -> bool {
        self.core().metrics().contains(name)
    }

    /// Names of all stored metrics, in no particular order.
    fn metric_names(&self) -> Vec<&str> {
        self.core().metrics().names().collect()
    }
}

/// Borrowed view of any node, tagged by kind.
///
/// This is the dynamic currency of the traversal engine: parent resolution
/// and extraction accept and produce `NodeRef`s so one dispatch table covers
/// all eight kinds.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Project(&'a Project),
    Module(&'a Module),
    Namespace(&'a Namespace),
    File(&'a SourceFile),
    Type(&'a TypeNode),
    Method(&'a Method),
    Field(&'a Field),
    Statement(&'a Statement),
}

impl<'a> NodeRef<'a> {
    #[must_use]
    pub fn kind(self) -> NodeKind {
        match self {
            Self::Project(_) => NodeKind::Project,
            Self::Module(_) => NodeKind::Module,
            Self::Namespace(_) => NodeKind::Namespace,
            Self::File(_) => NodeKind::File,
            Self::Type(_) => NodeKind::Type,
            Self::Method(_) => NodeKind::Method,
            Self::Field(_) => NodeKind::Field,
            Self::Statement(_) => NodeKind::Statement,
        }
    }

    #[must_use]
    pub fn qid(self) -> &'a str {
        match self {
            Self::Project(n) => n.qid(),
            Self::Module(n) => n.qid(),
            Self::Namespace(n) => n.qid(),
            Self::File(n) => n.qid(),
            Self::Type(n) => n.qid(),
            Self::Method(n) => n.qid(),
            Self::Field(n) => n.qid(),
            Self::Statement(n) => n.qid(),
        }
    }

    #[must_use]
    pub fn name(self) -> &'a str {
        match self {
            Self::Project(n) => n.name(),
            Self::Module(n) => n.name(),
            Self::Namespace(n) => n.name(),
            Self::File(n) => n.name(),
            Self::Type(n) => n.name(),
            Self::Method(n) => n.name(),
            Self::Field(n) => n.name(),
            Self::Statement(n) => n.name(),
        }
    }

    #[must_use]
    pub fn parent_key(self) -> Option<&'a str> {
        match self {
            Self::Project(n) => n.parent_key(),
            Self::Module(n) => n.parent_key(),
            Self::Namespace(n) => n.parent_key(),
            Self::File(n) => n.parent_key(),
            Self::Type(n) => n.parent_key(),
            Self::Method(n) => n.parent_key(),
            Self::Field(n) => n.parent_key(),
            Self::Statement(n) => n.parent_key(),
        }
    }
}

impl<'a> From<&'a Project> for NodeRef<'a> {
    fn from(node: &'a Project) -> Self {
        Self::Project(node)
    }
}

impl<'a> From<&'a Module> for NodeRef<'a> {
    fn from(node: &'a Module) -> Self {
        Self::Module(node)
    }
}

impl<'a> From<&'a Namespace> for NodeRef<'a> {
    fn from(node: &'a Namespace) -> Self {
        Self::Namespace(node)
    }
}

impl<'a> From<&'a SourceFile> for NodeRef<'a> {
    fn from(node: &'a SourceFile) -> Self {
        Self::File(node)
    }
}

impl<'a> From<&'a TypeNode> for NodeRef<'a> {
    fn from(node: &'a TypeNode) -> Self {
        Self::Type(node)
    }
}

impl<'a> From<&'a Method> for NodeRef<'a> {
    fn from(node: &'a Method) -> Self {
        Self::Method(node)
    }
}

impl<'a> From<&'a Field> for NodeRef<'a> {
    fn from(node: &'a Field) -> Self {
        Self::Field(node)
    }
}

impl<'a> From<&'a Statement> for NodeRef<'a> {
    fn from(node: &'a Statement) -> Self {
        Self::Statement(node)
    }
}

//! The eight node kinds of the containment tree.
//!
//! Containment runs Project → Module/Namespace/File → Type → Method/Field →
//! Statement. Child collections are maps keyed by the child's qualified
//! identifier, matching the identifier-keyed child maps of the wire format.
//! Parents are referenced back only by identifier string.
//!
//! Copying is two explicit operations per kind: `Clone` produces a deep copy
//! of the whole subtree, `clone_no_children` a copy with the same identity,
//! metrics and range but empty child collections. Extraction uses both.

use crate::error::{ModelError, Result};
use crate::node::{CodeNode, NodeCore, NodeKind};
use crate::span::Span;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

macro_rules! impl_code_node {
    ($ty:ty, $kind:expr) => {
        impl CodeNode for $ty {
            fn kind(&self) -> NodeKind {
                $kind
            }

            fn core(&self) -> &NodeCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut NodeCore {
                &mut self.core
            }
        }
    };
}

/// Merge `theirs` into `mine` by qualified identifier: known children are
/// folded with `fold`, unknown ones appended.
fn merge_children<T>(mine: &mut HashMap<String, T>, theirs: HashMap<String, T>, fold: fn(&mut T, T)) {
    for (qid, child) in theirs {
        match mine.entry(qid) {
            Entry::Occupied(mut entry) => fold(entry.get_mut(), child),
            Entry::Vacant(entry) => {
                entry.insert(child);
            }
        }
    }
}

fn upsert_child<T>(children: &mut HashMap<String, T>, qid: String, incoming: T, fold: fn(&mut T, T)) {
    match children.entry(qid) {
        Entry::Occupied(mut entry) => fold(entry.get_mut(), incoming),
        Entry::Vacant(entry) => {
            entry.insert(incoming);
        }
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// Root (or nested) project: owns subprojects, modules, namespaces and files.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    core: NodeCore,
    start: usize,
    subprojects: HashMap<String, Project>,
    modules: HashMap<String, Module>,
    namespaces: HashMap<String, Namespace>,
    files: HashMap<String, SourceFile>,
}

impl Project {
    /// A project named after its identifier, starting at line 0.
    pub fn new(qid: impl Into<String>) -> Result<Self> {
        let qid = qid.into();
        let core = NodeCore::new(qid.clone(), qid)?;
        Ok(Self {
            core,
            start: 0,
            subprojects: HashMap::new(),
            modules: HashMap::new(),
            namespaces: HashMap::new(),
            files: HashMap::new(),
        })
    }

    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    pub fn set_start(&mut self, start: usize) {
        self.start = start;
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.core.set_name(name);
    }

    pub fn add_subproject(&mut self, child: Project) {
        self.subprojects.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn subproject(&self, qid: &str) -> Option<&Project> {
        self.subprojects.get(qid)
    }

    pub fn subproject_mut(&mut self, qid: &str) -> Option<&mut Project> {
        self.subprojects.get_mut(qid)
    }

    pub fn remove_subproject(&mut self, qid: &str) -> Option<Project> {
        self.subprojects.remove(qid)
    }

    pub fn subprojects(&self) -> impl Iterator<Item = &Project> {
        self.subprojects.values()
    }

    /// Find-or-create the subproject entry for `incoming`, folding its
    /// content in.
    pub fn upsert_subproject(&mut self, incoming: Project) {
        upsert_child(
            &mut self.subprojects,
            incoming.qid().to_string(),
            incoming,
            Project::update,
        );
    }

    pub fn add_module(&mut self, child: Module) {
        self.modules.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn module(&self, qid: &str) -> Option<&Module> {
        self.modules.get(qid)
    }

    pub fn module_mut(&mut self, qid: &str) -> Option<&mut Module> {
        self.modules.get_mut(qid)
    }

    pub fn remove_module(&mut self, qid: &str) -> Option<Module> {
        self.modules.remove(qid)
    }

    pub fn modules(&self) -> impl Iterator<Item = &Module> {
        self.modules.values()
    }

    pub fn add_namespace(&mut self, child: Namespace) {
        self.namespaces.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn namespace(&self, qid: &str) -> Option<&Namespace> {
        self.namespaces.get(qid)
    }

    pub fn remove_namespace(&mut self, qid: &str) -> Option<Namespace> {
        self.namespaces.remove(qid)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    pub fn add_file(&mut self, child: SourceFile) {
        self.files.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn file(&self, qid: &str) -> Option<&SourceFile> {
        self.files.get(qid)
    }

    pub fn remove_file(&mut self, qid: &str) -> Option<SourceFile> {
        self.files.remove(qid)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Find-or-create the file entry for `incoming`, folding its content in.
    pub fn upsert_file(&mut self, incoming: SourceFile) {
        upsert_child(
            &mut self.files,
            incoming.qid().to_string(),
            incoming,
            SourceFile::update,
        );
    }

    /// Fold `other` into self: metrics and name per [`NodeCore::update_from`],
    /// the start line overwritten, children merged or appended by qualified
    /// identifier.
    pub fn update(&mut self, other: Project) {
        self.core.update_from(other.core);
        self.start = other.start;
        merge_children(&mut self.subprojects, other.subprojects, Project::update);
        merge_children(&mut self.modules, other.modules, Module::update);
        merge_children(&mut self.namespaces, other.namespaces, Namespace::update);
        merge_children(&mut self.files, other.files, SourceFile::update);
    }

    /// Copy with identical identity, metrics and start line but no children.
    #[must_use]
    pub fn clone_no_children(&self) -> Project {
        Self {
            core: self.core.clone(),
            start: self.start,
            subprojects: HashMap::new(),
            modules: HashMap::new(),
            namespaces: HashMap::new(),
            files: HashMap::new(),
        }
    }
}

impl_code_node!(Project, NodeKind::Project);

// ---------------------------------------------------------------------------
// Module
// ---------------------------------------------------------------------------

/// Build-level grouping of files inside a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    core: NodeCore,
    span: Span,
    files: HashMap<String, SourceFile>,
}

impl Module {
    pub fn new(qid: impl Into<String>) -> Result<Self> {
        let qid = qid.into();
        let core = NodeCore::new(qid.clone(), qid)?;
        Ok(Self {
            core,
            span: Span::default(),
            files: HashMap::new(),
        })
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.core.set_name(name);
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn add_file(&mut self, child: SourceFile) {
        self.files.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn file(&self, qid: &str) -> Option<&SourceFile> {
        self.files.get(qid)
    }

    pub fn remove_file(&mut self, qid: &str) -> Option<SourceFile> {
        self.files.remove(qid)
    }

    pub fn files(&self) -> impl Iterator<Item = &SourceFile> {
        self.files.values()
    }

    /// Find-or-create the file entry for `incoming`, folding its content in.
    pub fn upsert_file(&mut self, incoming: SourceFile) {
        upsert_child(
            &mut self.files,
            incoming.qid().to_string(),
            incoming,
            SourceFile::update,
        );
    }

    pub fn update(&mut self, other: Module) {
        self.core.update_from(other.core);
        self.span = other.span;
        merge_children(&mut self.files, other.files, SourceFile::update);
    }

    #[must_use]
    pub fn clone_no_children(&self) -> Module {
        Self {
            core: self.core.clone(),
            span: self.span,
            files: HashMap::new(),
        }
    }
}

impl_code_node!(Module, NodeKind::Module);

// ---------------------------------------------------------------------------
// Namespace
// ---------------------------------------------------------------------------

/// Logical grouping of types, nested arbitrarily deep under a project.
#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    core: NodeCore,
    namespaces: HashMap<String, Namespace>,
    types: HashMap<String, TypeNode>,
}

impl Namespace {
    pub fn new(qid: impl Into<String>) -> Result<Self> {
        let qid = qid.into();
        let core = NodeCore::new(qid.clone(), qid)?;
        Ok(Self {
            core,
            namespaces: HashMap::new(),
            types: HashMap::new(),
        })
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.core.set_name(name);
    }

    pub fn add_namespace(&mut self, child: Namespace) {
        self.namespaces.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn namespace(&self, qid: &str) -> Option<&Namespace> {
        self.namespaces.get(qid)
    }

    pub fn remove_namespace(&mut self, qid: &str) -> Option<Namespace> {
        self.namespaces.remove(qid)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace> {
        self.namespaces.values()
    }

    pub fn add_type(&mut self, child: TypeNode) {
        self.types.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn type_node(&self, qid: &str) -> Option<&TypeNode> {
        self.types.get(qid)
    }

    pub fn remove_type(&mut self, qid: &str) -> Option<TypeNode> {
        self.types.remove(qid)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.types.values()
    }

    pub fn update(&mut self, other: Namespace) {
        self.core.update_from(other.core);
        merge_children(&mut self.namespaces, other.namespaces, Namespace::update);
        merge_children(&mut self.types, other.types, TypeNode::update);
    }

    #[must_use]
    pub fn clone_no_children(&self) -> Namespace {
        Self {
            core: self.core.clone(),
            namespaces: HashMap::new(),
            types: HashMap::new(),
        }
    }
}

impl_code_node!(Namespace, NodeKind::Namespace);

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// An analyzed source file; the unit per-file producers submit.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceFile {
    core: NodeCore,
    span: Span,
    types: HashMap<String, TypeNode>,
}

impl SourceFile {
    /// A file named after its identifier (conventionally its path).
    pub fn new(qid: impl Into<String>, span: Span) -> Result<Self> {
        let qid = qid.into();
        let core = NodeCore::new(qid.clone(), qid)?;
        Ok(Self {
            core,
            span,
            types: HashMap::new(),
        })
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.core.set_name(name);
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn add_type(&mut self, child: TypeNode) {
        self.types.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn type_node(&self, qid: &str) -> Option<&TypeNode> {
        self.types.get(qid)
    }

    pub fn remove_type(&mut self, qid: &str) -> Option<TypeNode> {
        self.types.remove(qid)
    }

    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.types.values()
    }

    pub fn update(&mut self, other: SourceFile) {
        self.core.update_from(other.core);
        self.span = other.span;
        merge_children(&mut self.types, other.types, TypeNode::update);
    }

    #[must_use]
    pub fn clone_no_children(&self) -> SourceFile {
        Self {
            core: self.core.clone(),
            span: self.span,
            types: HashMap::new(),
        }
    }
}

impl_code_node!(SourceFile, NodeKind::File);

// ---------------------------------------------------------------------------
// TypeNode
// ---------------------------------------------------------------------------

/// A class, struct, interface or other type declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeNode {
    core: NodeCore,
    span: Span,
    fields: HashMap<String, Field>,
    methods: HashMap<String, Method>,
}

impl TypeNode {
    pub fn new(qid: impl Into<String>, name: impl Into<String>, span: Span) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName {
                kind: NodeKind::Type,
            });
        }
        Ok(Self {
            core: NodeCore::new(qid, name)?,
            span,
            fields: HashMap::new(),
            methods: HashMap::new(),
        })
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn add_field(&mut self, child: Field) {
        self.fields.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn field(&self, qid: &str) -> Option<&Field> {
        self.fields.get(qid)
    }

    pub fn remove_field(&mut self, qid: &str) -> Option<Field> {
        self.fields.remove(qid)
    }

    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.fields.values()
    }

    pub fn add_method(&mut self, child: Method) {
        self.methods.insert(child.qid().to_string(), child);
    }

    /// Look up a method by its compound qualified identifier
    /// (`"<ownerTypeQid>#<localKey>"`).
    #[must_use]
    pub fn method(&self, qid: &str) -> Option<&Method> {
        self.methods.get(qid)
    }

    pub fn remove_method(&mut self, qid: &str) -> Option<Method> {
        self.methods.remove(qid)
    }

    pub fn methods(&self) -> impl Iterator<Item = &Method> {
        self.methods.values()
    }

    pub fn update(&mut self, other: TypeNode) {
        self.core.update_from(other.core);
        self.span = other.span;
        merge_children(&mut self.fields, other.fields, Field::update);
        merge_children(&mut self.methods, other.methods, Method::update);
    }

    #[must_use]
    pub fn clone_no_children(&self) -> TypeNode {
        Self {
            core: self.core.clone(),
            span: self.span,
            fields: HashMap::new(),
            methods: HashMap::new(),
        }
    }
}

impl_code_node!(TypeNode, NodeKind::Type);

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// A method or free function, owning its analyzed statements.
#[derive(Debug, Clone, PartialEq)]
pub struct Method {
    core: NodeCore,
    span: Span,
    is_constructor: bool,
    is_accessor: bool,
    is_abstract: bool,
    statements: HashMap<String, Statement>,
}

impl Method {
    pub fn new(qid: impl Into<String>, name: impl Into<String>, span: Span) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName {
                kind: NodeKind::Method,
            });
        }
        Ok(Self {
            core: NodeCore::new(qid, name)?,
            span,
            is_constructor: false,
            is_accessor: false,
            is_abstract: false,
            statements: HashMap::new(),
        })
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    /// Builder: mark as a constructor.
    #[must_use]
    pub fn with_constructor(mut self, flag: bool) -> Self {
        self.is_constructor = flag;
        self
    }

    /// Builder: mark as a getter/setter accessor.
    #[must_use]
    pub fn with_accessor(mut self, flag: bool) -> Self {
        self.is_accessor = flag;
        self
    }

    /// Builder: mark as abstract.
    #[must_use]
    pub fn with_abstract(mut self, flag: bool) -> Self {
        self.is_abstract = flag;
        self
    }

    #[must_use]
    pub fn is_constructor(&self) -> bool {
        self.is_constructor
    }

    #[must_use]
    pub fn is_accessor(&self) -> bool {
        self.is_accessor
    }

    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    pub fn add_statement(&mut self, child: Statement) {
        self.statements.insert(child.qid().to_string(), child);
    }

    #[must_use]
    pub fn statement(&self, qid: &str) -> Option<&Statement> {
        self.statements.get(qid)
    }

    pub fn remove_statement(&mut self, qid: &str) -> Option<Statement> {
        self.statements.remove(qid)
    }

    pub fn statements(&self) -> impl Iterator<Item = &Statement> {
        self.statements.values()
    }

    pub fn update(&mut self, other: Method) {
        self.core.update_from(other.core);
        self.span = other.span;
        self.is_constructor = other.is_constructor;
        self.is_accessor = other.is_accessor;
        self.is_abstract = other.is_abstract;
        merge_children(&mut self.statements, other.statements, Statement::update);
    }

    #[must_use]
    pub fn clone_no_children(&self) -> Method {
        Self {
            core: self.core.clone(),
            span: self.span,
            is_constructor: self.is_constructor,
            is_accessor: self.is_accessor,
            is_abstract: self.is_abstract,
            statements: HashMap::new(),
        }
    }
}

impl_code_node!(Method, NodeKind::Method);

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A field or attribute declaration. Leaf kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    core: NodeCore,
    span: Span,
}

impl Field {
    pub fn new(qid: impl Into<String>, name: impl Into<String>, span: Span) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName {
                kind: NodeKind::Field,
            });
        }
        Ok(Self {
            core: NodeCore::new(qid, name)?,
            span,
        })
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn update(&mut self, other: Field) {
        self.core.update_from(other.core);
        self.span = other.span;
    }

    #[must_use]
    pub fn clone_no_children(&self) -> Field {
        self.clone()
    }
}

impl_code_node!(Field, NodeKind::Field);

// ---------------------------------------------------------------------------
// Statement
// ---------------------------------------------------------------------------

/// A single analyzed statement inside a method. Leaf kind.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    core: NodeCore,
    span: Span,
}

impl Statement {
    pub fn new(qid: impl Into<String>) -> Result<Self> {
        let qid = qid.into();
        let core = NodeCore::new(qid.clone(), qid)?;
        Ok(Self {
            core,
            span: Span::default(),
        })
    }

    /// Builder: set the source range.
    #[must_use]
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    #[must_use]
    pub fn span(&self) -> Span {
        self.span
    }

    pub fn set_span(&mut self, span: Span) {
        self.span = span;
    }

    pub fn update(&mut self, other: Statement) {
        self.core.update_from(other.core);
        self.span = other.span;
    }

    #[must_use]
    pub fn clone_no_children(&self) -> Statement {
        self.clone()
    }
}

impl_code_node!(Statement, NodeKind::Statement);

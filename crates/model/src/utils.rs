//! Traversal, query, extraction and merge engine.
//!
//! [`TreeUtils`] is a stateless view borrowed from a [`CodeTree`]: indices
//! are computed on demand over the whole reachable containment tree, never
//! cached. The merge/upsert operations mutate the tree and therefore live on
//! [`CodeTree`] itself; the borrow checker keeps reads and folds from
//! overlapping on the same instance.

use crate::error::{ModelError, Result};
use crate::kinds::{Method, Module, Namespace, Project, SourceFile, TypeNode};
use crate::node::{CodeNode, NodeKind, NodeRef};
use crate::tree::CodeTree;
use std::collections::{HashSet, VecDeque};

/// Separator between the owning type identifier and the local method key in
/// compound method identifiers (`"<ownerTypeQid>#<localKey>"`).
pub const METHOD_SEPARATOR: char = '#';

/// Stateless query engine bound to one [`CodeTree`].
#[derive(Debug, Clone, Copy)]
pub struct TreeUtils<'a> {
    tree: &'a CodeTree,
}

/// Content attachable to a project while rebuilding an extraction path.
enum PathContent {
    Subproject(Project),
    Module(Module),
    Namespace(Namespace),
    File(SourceFile),
}

impl<'a> TreeUtils<'a> {
    pub(crate) fn new(tree: &'a CodeTree) -> Self {
        Self { tree }
    }

    // ------------------------------------------------------------------
    // Indices
    // ------------------------------------------------------------------

    /// The root plus every transitively nested subproject, deduplicated,
    /// in no particular order.
    pub fn all_projects(&self) -> Vec<&'a Project> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        let mut queue: VecDeque<&'a Project> = VecDeque::new();
        queue.extend(self.tree.root());
        while let Some(project) = queue.pop_front() {
            if seen.insert(project.qid()) {
                queue.extend(project.subprojects());
                out.push(project);
            }
        }
        out
    }

    /// Every file reachable from the root: direct project files plus the
    /// files of every module of every project.
    pub fn all_files(&self) -> Vec<&'a SourceFile> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for project in self.all_projects() {
            for file in project.files() {
                if seen.insert(file.qid()) {
                    out.push(file);
                }
            }
            for module in project.modules() {
                for file in module.files() {
                    if seen.insert(file.qid()) {
                        out.push(file);
                    }
                }
            }
        }
        out
    }

    /// Every type of every reachable file.
    pub fn all_types(&self) -> Vec<&'a TypeNode> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for file in self.all_files() {
            for node in file.types() {
                if seen.insert(node.qid()) {
                    out.push(node);
                }
            }
        }
        out
    }

    /// Every method of every reachable type.
    pub fn all_methods(&self) -> Vec<&'a Method> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        for node in self.all_types() {
            for method in node.methods() {
                if seen.insert(method.qid()) {
                    out.push(method);
                }
            }
        }
        out
    }

    // ------------------------------------------------------------------
    // Directed search
    // ------------------------------------------------------------------

    /// Breadth-first search over the subproject tree starting at the root.
    pub fn find_project(&self, qid: &str) -> Option<&'a Project> {
        if qid.is_empty() {
            return None;
        }
        let mut queue: VecDeque<&'a Project> = VecDeque::new();
        queue.extend(self.tree.root());
        while let Some(project) = queue.pop_front() {
            if project.qid() == qid {
                return Some(project);
            }
            queue.extend(project.subprojects());
        }
        None
    }

    /// Direct module containment, checked per project.
    pub fn find_module(&self, qid: &str) -> Option<&'a Module> {
        if qid.is_empty() {
            return None;
        }
        self.all_projects()
            .into_iter()
            .find_map(|project| project.module(qid))
    }

    /// Per project: direct file containment first, then each of its
    /// modules'.
    pub fn find_file(&self, qid: &str) -> Option<&'a SourceFile> {
        if qid.is_empty() {
            return None;
        }
        for project in self.all_projects() {
            if let Some(file) = project.file(qid) {
                return Some(file);
            }
            for module in project.modules() {
                if let Some(file) = module.file(qid) {
                    return Some(file);
                }
            }
        }
        None
    }

    /// Linear scan of [`TreeUtils::all_types`].
    pub fn find_type(&self, qid: &str) -> Option<&'a TypeNode> {
        if qid.is_empty() {
            return None;
        }
        self.all_types().into_iter().find(|node| node.qid() == qid)
    }

    /// Resolve a compound method identifier: the part before
    /// [`METHOD_SEPARATOR`] names the owning type, which is then asked for
    /// the method. `None` when the identifier cannot be split or the type
    /// is not in the tree.
    pub fn find_method(&self, compound: &str) -> Option<&'a Method> {
        let (owner, _local) = compound.split_once(METHOD_SEPARATOR)?;
        self.find_type(owner)?.method(compound)
    }

    /// Resolve the logical container of `node`, each kind through the
    /// addressing namespace its parent key lives in.
    pub fn find_parent(&self, node: NodeRef<'_>) -> Option<NodeRef<'a>> {
        let parent = node.parent_key()?;
        match node.kind() {
            NodeKind::Field | NodeKind::Method => self.find_type(parent).map(NodeRef::Type),
            NodeKind::Statement => self.find_method(parent).map(NodeRef::Method),
            NodeKind::Type => self.find_file(parent).map(NodeRef::File),
            NodeKind::File => self
                .find_project(parent)
                .map(NodeRef::Project)
                .or_else(|| self.find_module(parent).map(NodeRef::Module)),
            NodeKind::Module | NodeKind::Namespace | NodeKind::Project => {
                self.find_project(parent).map(NodeRef::Project)
            }
        }
    }

    // ------------------------------------------------------------------
    // Extraction
    // ------------------------------------------------------------------

    /// Build a new tree holding the minimal ancestor skeleton from the
    /// forest root down to `node`, with `node`'s own subtree deep-cloned
    /// and every sibling off the path omitted.
    ///
    /// The forest root itself yields a copy of the whole tree. `None` when
    /// the ancestor chain cannot be resolved (a dangling parent key).
    pub fn extract_tree(&self, node: NodeRef<'_>) -> Option<CodeTree> {
        if let NodeRef::Project(project) = node {
            if project.parent_key().is_none() {
                return Some(self.tree.clone());
            }
        }

        let (content, container) = self.path_content(node)?;

        // Ancestor projects, bottom-up, ending at a parentless root.
        let mut ancestors: Vec<&Project> = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.find_project(&container)?;
        loop {
            if !seen.insert(current.qid()) {
                return None;
            }
            ancestors.push(current);
            match current.parent_key() {
                Some(key) => current = self.find_project(key)?,
                None => break,
            }
        }

        // Rebuild: the containing project receives the content chain, every
        // further ancestor wraps the previous level as its only subproject.
        let mut levels = ancestors.into_iter();
        let mut rebuilt = levels.next().map(Project::clone_no_children)?;
        match content {
            PathContent::Subproject(child) => rebuilt.add_subproject(child),
            PathContent::Module(child) => rebuilt.add_module(child),
            PathContent::Namespace(child) => rebuilt.add_namespace(child),
            PathContent::File(child) => rebuilt.add_file(child),
        }
        for ancestor in levels {
            let mut shell = ancestor.clone_no_children();
            shell.add_subproject(rebuilt);
            rebuilt = shell;
        }

        let mut extracted = CodeTree::new();
        extracted.set_root_node(rebuilt);
        Some(extracted)
    }

    /// The deep-cloned target wrapped in shallow copies of its non-project
    /// owners, plus the identifier of the project that receives it.
    fn path_content(&self, node: NodeRef<'_>) -> Option<(PathContent, String)> {
        match node {
            NodeRef::Project(project) => {
                let parent = project.parent_key()?.to_string();
                Some((PathContent::Subproject(project.clone()), parent))
            }
            NodeRef::Module(module) => {
                let parent = module.parent_key()?.to_string();
                Some((PathContent::Module(module.clone()), parent))
            }
            NodeRef::Namespace(namespace) => {
                let parent = namespace.parent_key()?.to_string();
                Some((PathContent::Namespace(namespace.clone()), parent))
            }
            NodeRef::File(file) => self.wrap_file(file.clone()),
            NodeRef::Type(node) => {
                let file = self.find_file(node.parent_key()?)?;
                let mut shell = file.clone_no_children();
                shell.add_type(node.clone());
                self.wrap_file(shell)
            }
            NodeRef::Method(method) => {
                let owner = self.find_type(method.parent_key()?)?;
                let mut shell = owner.clone_no_children();
                shell.add_method(method.clone());
                self.wrap_type(shell)
            }
            NodeRef::Field(field) => {
                let owner = self.find_type(field.parent_key()?)?;
                let mut shell = owner.clone_no_children();
                shell.add_field(field.clone());
                self.wrap_type(shell)
            }
            NodeRef::Statement(statement) => {
                let method = self.find_method(statement.parent_key()?)?;
                let mut method_shell = method.clone_no_children();
                method_shell.add_statement(statement.clone());
                let owner = self.find_type(method.parent_key()?)?;
                let mut type_shell = owner.clone_no_children();
                type_shell.add_method(method_shell);
                self.wrap_type(type_shell)
            }
        }
    }

    /// Wrap an assembled type into a shallow copy of its owning file.
    fn wrap_type(&self, node: TypeNode) -> Option<(PathContent, String)> {
        let file = self.find_file(node.parent_key()?)?;
        let mut shell = file.clone_no_children();
        shell.add_type(node);
        self.wrap_file(shell)
    }

    /// Resolve an assembled file's container: a project directly, or a
    /// module whose shallow copy then carries the file.
    fn wrap_file(&self, file: SourceFile) -> Option<(PathContent, String)> {
        let parent = file.parent_key()?.to_string();
        if self.find_project(&parent).is_some() {
            return Some((PathContent::File(file), parent));
        }
        let module = self.find_module(&parent)?;
        let mut shell = module.clone_no_children();
        shell.add_file(file);
        let project = shell.parent_key()?.to_string();
        Some((PathContent::Module(shell), project))
    }
}

// ---------------------------------------------------------------------------
// Merge / upsert
// ---------------------------------------------------------------------------

impl CodeTree {
    /// Fold `other` into this tree.
    ///
    /// An empty tree adopts `other`'s root; a root that declares this
    /// tree's root as parent is attached as a subproject; an identical root
    /// is folded via `update`. Unrelated roots are ignored.
    pub fn merge(&mut self, mut other: CodeTree) {
        let Some(incoming) = other.take_root() else {
            return;
        };
        let edges = other.take_relationships();
        match self.take_root() {
            None => {
                self.set_root_node(incoming);
                self.extend_relationships(edges);
            }
            Some(mut root) => {
                if incoming.parent_key() == Some(root.qid()) {
                    root.add_subproject(incoming);
                    self.extend_relationships(edges);
                } else if incoming.qid() == root.qid() {
                    root.update(incoming);
                    self.extend_relationships(edges);
                } else {
                    log::debug!(
                        "merge: root `{}` is unrelated to tree root `{}`; ignoring",
                        incoming.qid(),
                        root.qid()
                    );
                }
                self.set_root_node(root);
            }
        }
    }

    /// Upsert of one analyzed file.
    ///
    /// The container is resolved from the file's parent key (a project
    /// first, then a module) and the file entry is created when absent and
    /// folded otherwise. Resolve-and-fold is one step; see
    /// [`crate::SharedTree`] for the concurrent form.
    pub fn update_file(&mut self, file: SourceFile) -> Result<()> {
        let Some(parent) = file.parent_key().map(str::to_owned) else {
            return Err(ModelError::MissingParentKey {
                qid: file.qid().to_string(),
            });
        };
        if let Some(project) = self.find_project_mut(&parent) {
            project.upsert_file(file);
            return Ok(());
        }
        if let Some(module) = self.find_module_mut(&parent) {
            module.upsert_file(file);
            return Ok(());
        }
        Err(ModelError::UnresolvedParent {
            qid: file.qid().to_string(),
            parent,
        })
    }

    /// Upsert of one project subtree.
    ///
    /// With a parent key the incoming project is created or folded under
    /// that project; without one it targets the root (adopted when the tree
    /// is empty, folded when the identifiers match).
    pub fn update_root_project(&mut self, project: Project) -> Result<()> {
        match project.parent_key().map(str::to_owned) {
            Some(parent) => {
                if let Some(container) = self.find_project_mut(&parent) {
                    container.upsert_subproject(project);
                    return Ok(());
                }
                Err(ModelError::UnresolvedParent {
                    qid: project.qid().to_string(),
                    parent,
                })
            }
            None => match self.take_root() {
                None => {
                    self.set_root_node(project);
                    Ok(())
                }
                Some(mut root) => {
                    let outcome = if root.qid() == project.qid() {
                        root.update(project);
                        Ok(())
                    } else {
                        Err(ModelError::RootMismatch {
                            qid: project.qid().to_string(),
                            root: root.qid().to_string(),
                        })
                    };
                    self.set_root_node(root);
                    outcome
                }
            },
        }
    }

    /// Descend to a project by the qid path recorded from an immutable
    /// search.
    fn find_project_mut(&mut self, qid: &str) -> Option<&mut Project> {
        let mut path = Vec::new();
        if !project_path(self.root()?, qid, &mut path) {
            return None;
        }
        let mut current = self.root_mut()?;
        for key in path.iter().skip(1) {
            current = current.subproject_mut(key)?;
        }
        Some(current)
    }

    fn find_module_mut(&mut self, qid: &str) -> Option<&mut Module> {
        let owner = self
            .utils()
            .all_projects()
            .into_iter()
            .find(|project| project.module(qid).is_some())
            .map(|project| project.qid().to_string())?;
        self.find_project_mut(&owner)?.module_mut(qid)
    }
}

/// Depth-first search recording the root-to-target qid path.
fn project_path(project: &Project, qid: &str, path: &mut Vec<String>) -> bool {
    path.push(project.qid().to_string());
    if project.qid() == qid {
        return true;
    }
    for sub in project.subprojects() {
        if project_path(sub, qid, path) {
            return true;
        }
    }
    path.pop();
    false
}

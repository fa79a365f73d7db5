use crate::error::Result;
use crate::kinds::{Project, SourceFile};
use crate::relationship::Relationship;
use crate::utils::TreeUtils;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Handle owning one containment tree rooted at a [`Project`], plus the
/// relationship edges layered outside it.
///
/// Two trees compare equal when their roots are structurally equal over the
/// whole containment subtree; relationship edges do not participate.
#[derive(Debug, Clone, Default)]
pub struct CodeTree {
    root: Option<Project>,
    relationships: Vec<Relationship>,
}

impl CodeTree {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a fresh root project with the given identifier.
    pub fn set_root(&mut self, key: &str) -> Result<()> {
        self.root = Some(Project::new(key)?);
        Ok(())
    }

    /// Install a caller-supplied root verbatim.
    pub fn set_root_node(&mut self, project: Project) {
        self.root = Some(project);
    }

    #[must_use]
    pub fn root(&self) -> Option<&Project> {
        self.root.as_ref()
    }

    pub fn root_mut(&mut self) -> Option<&mut Project> {
        self.root.as_mut()
    }

    pub fn take_root(&mut self) -> Option<Project> {
        self.root.take()
    }

    #[must_use]
    pub fn has_root(&self) -> bool {
        self.root.is_some()
    }

    /// Utilities view bound to this tree.
    #[must_use]
    pub fn utils(&self) -> TreeUtils<'_> {
        TreeUtils::new(self)
    }

    pub fn add_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    #[must_use]
    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub(crate) fn take_relationships(&mut self) -> Vec<Relationship> {
        std::mem::take(&mut self.relationships)
    }

    pub(crate) fn extend_relationships(&mut self, edges: Vec<Relationship>) {
        self.relationships.extend(edges);
    }

    /// Drop every edge between `a` and `b` (either direction); returns how
    /// many were removed.
    pub fn remove_relationships_between(&mut self, a: &str, b: &str) -> usize {
        let before = self.relationships.len();
        self.relationships.retain(|edge| {
            !(edge.source == a && edge.target == b || edge.source == b && edge.target == a)
        });
        before - self.relationships.len()
    }
}

impl PartialEq for CodeTree {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root
    }
}

/// Cloneable handle sharing one [`CodeTree`] between ingestion producers.
///
/// `update_file`, `update_root_project` and `merge` each hold the tree lock
/// for the whole resolve-or-create-then-fold step, so independent per-file
/// producers can submit completed subtrees concurrently without racing to
/// create duplicate containers for the same key. Reads go through
/// [`SharedTree::with_read`] or [`SharedTree::snapshot`].
#[derive(Debug, Clone, Default)]
pub struct SharedTree {
    inner: Arc<Mutex<CodeTree>>,
}

impl SharedTree {
    #[must_use]
    pub fn new(tree: CodeTree) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tree)),
        }
    }

    /// A producer that panicked mid-fold cannot leave a torn tree (folds
    /// complete before the guard drops), so a poisoned lock is recovered.
    fn lock(&self) -> MutexGuard<'_, CodeTree> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Upsert of one analyzed file, as a single critical section.
    pub fn update_file(&self, file: SourceFile) -> Result<()> {
        self.lock().update_file(file)
    }

    /// Upsert of one project subtree, as a single critical section.
    pub fn update_root_project(&self, project: Project) -> Result<()> {
        self.lock().update_root_project(project)
    }

    /// Fold a whole tree in, as a single critical section.
    pub fn merge(&self, other: CodeTree) {
        self.lock().merge(other);
    }

    /// Run a read-only closure under the lock.
    pub fn with_read<R>(&self, f: impl FnOnce(&CodeTree) -> R) -> R {
        f(&self.lock())
    }

    /// Deep copy of the current tree state.
    #[must_use]
    pub fn snapshot(&self) -> CodeTree {
        self.lock().clone()
    }

    /// Recover the tree, cloning when other handles are still alive.
    #[must_use]
    pub fn into_inner(self) -> CodeTree {
        match Arc::try_unwrap(self.inner) {
            Ok(mutex) => mutex.into_inner().unwrap_or_else(PoisonError::into_inner),
            Err(shared) => shared.lock().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }
}

use super::{DataModel, Update};
use crate::binding::Binding;
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

/// Bucket that reads and writes are attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyScope {
    /// Reads made while resolving a node's own properties
    Core,
    /// Reads made while resolving a node's descendants
    Children,
}

#[derive(Debug, Default, Clone)]
struct DependencySets {
    reads: HashSet<Binding>,
    writes: HashSet<Binding>,
}

#[derive(Debug, Default)]
struct TrackedSets {
    all: DependencySets,
    core: DependencySets,
    children: DependencySets,
}

impl TrackedSets {
    fn scoped(&self, scope: DependencyScope) -> &DependencySets {
        match scope {
            DependencyScope::Core => &self.core,
            DependencyScope::Children => &self.children,
        }
    }

    fn scoped_mut(&mut self, scope: DependencyScope) -> &mut DependencySets {
        match scope {
            DependencyScope::Core => &mut self.core,
            DependencyScope::Children => &mut self.children,
        }
    }
}

/// Data model decorator that records which bindings were read and written.
///
/// Every access is attributed to the overall sets and to the active
/// [`DependencyScope`]. The active scope only changes through
/// [`DependencyModel::track_scope`], whose guard restores the previous scope
/// when dropped.
pub struct DependencyModel {
    root: Rc<dyn DataModel>,
    sets: RefCell<TrackedSets>,
    scope: Cell<DependencyScope>,
}

/// Restores the previously active scope when dropped
#[must_use = "the scope is reset as soon as the guard is dropped"]
pub struct ScopeGuard<'a> {
    model: &'a DependencyModel,
    previous: DependencyScope,
}

impl Drop for ScopeGuard<'_> {
    fn drop(&mut self) {
        self.model.scope.set(self.previous);
    }
}

impl DependencyModel {
    /// Wrap `root`, starting in the core scope
    pub fn new(root: Rc<dyn DataModel>) -> Self {
        Self {
            root,
            sets: RefCell::new(TrackedSets::default()),
            scope: Cell::new(DependencyScope::Core),
        }
    }

    /// The model being tracked
    pub fn root(&self) -> &Rc<dyn DataModel> {
        &self.root
    }

    /// Scope currently receiving reads and writes
    pub fn current_scope(&self) -> DependencyScope {
        self.scope.get()
    }

    /// Attribute accesses to `scope` until the returned guard is dropped
    pub fn track_scope(&self, scope: DependencyScope) -> ScopeGuard<'_> {
        let previous = self.scope.replace(scope);
        ScopeGuard {
            model: self,
            previous,
        }
    }

    /// Bindings read, either overall or within one scope
    pub fn get_dependencies(&self, scope: Option<DependencyScope>) -> HashSet<Binding> {
        let sets = self.sets.borrow();
        match scope {
            Some(scope) => sets.scoped(scope).reads.clone(),
            None => sets.all.reads.clone(),
        }
    }

    /// Bindings written, either overall or within one scope
    pub fn get_modified(&self, scope: Option<DependencyScope>) -> HashSet<Binding> {
        let sets = self.sets.borrow();
        match scope {
            Some(scope) => sets.scoped(scope).writes.clone(),
            None => sets.all.writes.clone(),
        }
    }

    /// Whether `binding` has been read
    pub fn reads_binding(&self, binding: &Binding) -> bool {
        self.sets.borrow().all.reads.contains(binding)
    }

    /// Whether `binding` has been written
    pub fn writes_binding(&self, binding: &Binding) -> bool {
        self.sets.borrow().all.writes.contains(binding)
    }

    /// Register a read made on behalf of a descendant node
    pub fn add_child_read_dep(&self, binding: Binding) {
        self.add_read_dep(binding, DependencyScope::Children);
    }

    /// Forget everything recorded so far and return to the core scope
    pub fn reset(&self) {
        *self.sets.borrow_mut() = TrackedSets::default();
        self.scope.set(DependencyScope::Core);
    }

    fn add_read_dep(&self, binding: Binding, scope: DependencyScope) {
        let mut sets = self.sets.borrow_mut();
        sets.scoped_mut(scope).reads.insert(binding.clone());
        sets.all.reads.insert(binding);
    }

    fn add_write_dep(&self, binding: Binding, scope: DependencyScope) {
        let mut sets = self.sets.borrow_mut();
        sets.scoped_mut(scope).writes.insert(binding.clone());
        sets.all.writes.insert(binding);
    }
}

impl fmt::Debug for DependencyModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyModel")
            .field("scope", &self.scope.get())
            .field("sets", &self.sets.borrow())
            .finish()
    }
}

impl DataModel for DependencyModel {
    fn get(&self, binding: &Binding) -> Value {
        self.add_read_dep(binding.clone(), self.scope.get());
        self.root.get(binding)
    }

    fn set(&self, transaction: Vec<(Binding, Value)>) -> Vec<Update> {
        for (binding, _) in &transaction {
            self.add_write_dep(binding.clone(), self.scope.get());
        }
        self.root.set(transaction)
    }
}

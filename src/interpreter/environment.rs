use crate::value::Value;
use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

/// Represents a single scope level in the environment.
type Scope = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScopeKind {
    /// Session-wide top level.
    Global,
    /// Parameters and locals of one function call.
    Frame,
    /// `if`/`while`/`for` bodies.
    Block,
}

#[derive(Debug)]
struct ScopeNode {
    vars: RefCell<Scope>,
    parent: Option<Environment>,
    kind: ScopeKind,
}

/// A chain of scopes. Cloning an `Environment` shares it: a closure holding a
/// clone sees every later binding made through any other handle.
///
/// Mutation is crate-private, so a handle given to the host is a read-only view.
#[derive(Debug, Clone)]
pub struct Environment {
    node: Rc<ScopeNode>,
}

impl Environment {
    pub fn new() -> Self {
        Self::with_kind(ScopeKind::Global, None)
    }

    fn with_kind(kind: ScopeKind, parent: Option<Environment>) -> Self {
        Self {
            node: Rc::new(ScopeNode {
                vars: RefCell::new(IndexMap::new()),
                parent,
                kind,
            }),
        }
    }

    /// Fresh scope for a block body nested in this one.
    pub(crate) fn child_block(&self) -> Self {
        Self::with_kind(ScopeKind::Block, Some(self.clone()))
    }

    /// Fresh call frame whose parent is a closure's captured environment.
    pub(crate) fn child_frame(&self) -> Self {
        Self::with_kind(ScopeKind::Frame, Some(self.clone()))
    }

    /// Bind a name in this (innermost) scope.
    pub(crate) fn define(&self, name: impl Into<String>, value: Value) {
        self.node.vars.borrow_mut().insert(name.into(), value);
    }

    /// Rebind `name` where it already lives among the enclosing block scopes,
    /// stopping at the nearest frame or the global scope; otherwise bind here.
    pub(crate) fn assign(&self, name: &str, value: Value) {
        let mut scope = self;
        loop {
            if scope.node.vars.borrow().contains_key(name) {
                scope.node.vars.borrow_mut().insert(name.to_string(), value);
                return;
            }
            match (&scope.node.kind, &scope.node.parent) {
                (ScopeKind::Block, Some(parent)) => scope = parent,
                _ => break,
            }
        }
        self.define(name, value);
    }

    /// Get a variable, searching from innermost to outermost scope.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.node.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.node.parent.as_ref().and_then(|parent| parent.get(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of scopes between this one and the global scope, inclusive.
    pub fn depth(&self) -> usize {
        1 + self.node.parent.as_ref().map_or(0, Environment::depth)
    }

    /// Visible bindings, inner scopes shadowing outer ones, in definition order
    /// of the outermost scope first.
    pub fn bindings(&self) -> Vec<(String, Value)> {
        let mut result: IndexMap<String, Value> = match &self.node.parent {
            Some(parent) => parent.bindings().into_iter().collect(),
            None => IndexMap::new(),
        };
        for (name, value) in self.node.vars.borrow().iter() {
            result.insert(name.clone(), value.clone());
        }
        result.into_iter().collect()
    }

    /// Copy of this scope's own bindings, for rolling back a failed line.
    pub(crate) fn snapshot(&self) -> Scope {
        self.node.vars.borrow().clone()
    }

    pub(crate) fn restore(&self, scope: Scope) {
        *self.node.vars.borrow_mut() = scope;
    }

    /// Drop every binding in this scope. Closures stored here hold the scope
    /// alive through their captured environment, so this breaks that cycle.
    pub(crate) fn clear(&self) {
        self.node.vars.borrow_mut().clear();
    }

    /// True when both handles point at the same scope.
    pub fn ptr_eq(&self, other: &Environment) -> bool {
        Rc::ptr_eq(&self.node, &other.node)
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

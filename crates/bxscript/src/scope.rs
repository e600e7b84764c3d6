//! Lexical scopes.
//!
//! A scope is an insertion-ordered name table plus an optional parent handle.
//! Scopes live on the heap like every other compound value because closures
//! keep them alive past their lexical extent, and a scope can transitively
//! reference itself through a stored closure.

use indexmap::IndexMap;

use crate::{
    exception::{RunError, RunResult},
    heap::{Heap, HeapId},
    value::Value,
};

#[derive(Debug, Default)]
pub(crate) struct Scope {
    pub parent: Option<HeapId>,
    bindings: IndexMap<String, Value>,
}

impl Scope {
    pub fn new(parent: Option<HeapId>) -> Self {
        Self {
            parent,
            bindings: IndexMap::new(),
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.bindings.get(name).copied()
    }

    pub fn has(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) {
        self.bindings.insert(name.into(), value);
    }

    /// Bindings in declaration order. Module objects are built from this.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.bindings.iter()
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.bindings.values()
    }
}

/// Allocates a child scope of `parent`.
pub(crate) fn child_scope(heap: &mut Heap, parent: HeapId) -> HeapId {
    heap.alloc_scope(Scope::new(Some(parent)))
}

/// Declares a new binding in `scope` itself. Redeclaring a name already
/// bound in the same scope is a NameError; shadowing an outer binding is
/// fine.
pub(crate) fn declare(heap: &mut Heap, scope: HeapId, name: &str, value: Value) -> RunResult<()> {
    if heap.scope(scope).has(name) {
        return Err(RunError::name_error(heap, format!("variable redefined: {name}")));
    }
    heap.scope_mut(scope).insert(name, value);
    Ok(())
}

/// Assigns to an existing binding, walking up the parent chain to find the
/// scope that declared it. Assigning an undeclared name is a NameError.
pub(crate) fn assign(heap: &mut Heap, scope: HeapId, name: &str, value: Value) -> RunResult<()> {
    let mut current = scope;
    loop {
        if heap.scope(current).has(name) {
            heap.scope_mut(current).insert(name, value);
            return Ok(());
        }
        match heap.scope(current).parent {
            Some(parent) => current = parent,
            None => return Err(RunError::name_error(heap, format!("variable undefined: {name}"))),
        }
    }
}

/// Resolves a name by walking up the parent chain.
pub(crate) fn lookup(heap: &mut Heap, scope: HeapId, name: &str) -> RunResult<Value> {
    lookup_opt(heap, scope, name)
        .ok_or_else(|| RunError::name_error(heap, format!("variable undefined: {name}")))
}

/// Like [`lookup`] but without raising, used for optional names like `this`.
pub(crate) fn lookup_opt(heap: &Heap, scope: HeapId, name: &str) -> Option<Value> {
    let mut current = scope;
    loop {
        if let Some(value) = heap.scope(current).get(name) {
            return Some(value);
        }
        current = heap.scope(current).parent?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exception::ErrorKind;

    #[test]
    fn declare_then_lookup() {
        let mut heap = Heap::new();
        let global = heap.alloc_scope(Scope::new(None));
        declare(&mut heap, global, "x", Value::Number(1.0)).unwrap();
        let v = lookup(&mut heap, global, "x").unwrap();
        assert_eq!(v.as_number(), Some(1.0));
    }

    #[test]
    fn redeclaration_in_same_scope_fails() {
        let mut heap = Heap::new();
        let global = heap.alloc_scope(Scope::new(None));
        declare(&mut heap, global, "x", Value::Null).unwrap();
        let err = declare(&mut heap, global, "x", Value::Null).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameError);
    }

    #[test]
    fn shadowing_in_child_scope_is_allowed() {
        let mut heap = Heap::new();
        let global = heap.alloc_scope(Scope::new(None));
        declare(&mut heap, global, "x", Value::Number(1.0)).unwrap();
        let inner = child_scope(&mut heap, global);
        declare(&mut heap, inner, "x", Value::Number(2.0)).unwrap();
        assert_eq!(lookup(&mut heap, inner, "x").unwrap().as_number(), Some(2.0));
        assert_eq!(lookup(&mut heap, global, "x").unwrap().as_number(), Some(1.0));
    }

    #[test]
    fn assign_updates_the_declaring_scope() {
        let mut heap = Heap::new();
        let global = heap.alloc_scope(Scope::new(None));
        declare(&mut heap, global, "x", Value::Number(1.0)).unwrap();
        let inner = child_scope(&mut heap, global);
        assign(&mut heap, inner, "x", Value::Number(5.0)).unwrap();
        assert_eq!(lookup(&mut heap, global, "x").unwrap().as_number(), Some(5.0));
    }

    #[test]
    fn assign_undeclared_fails() {
        let mut heap = Heap::new();
        let global = heap.alloc_scope(Scope::new(None));
        let err = assign(&mut heap, global, "nope", Value::Null).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NameError);
    }
}

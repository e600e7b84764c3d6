//! Arena heap for compound runtime values.
//!
//! Strings, arrays, objects, functions, bound natives and lexical scopes all
//! live in one slab indexed by copyable [`HeapId`] handles. Immediate values
//! (null, bool, number) never touch the heap.
//!
//! Reclamation is mark-and-sweep from an explicit root set. Collection only
//! runs at quiescent points (between event-loop tasks and after a top-level
//! run), never while the evaluator holds handles on its call stack, so a live
//! `HeapId` is always valid. Cyclic graphs, which closures create routinely
//! (scope -> function -> scope), are collected like anything else.

use indexmap::IndexMap;

use crate::{
    scope::Scope,
    types::str::Str,
    value::{Function, NativeMethod, Value},
};

/// Unique identifier for a value stored on the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct HeapId(u32);

impl HeapId {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("heap index exceeds u32"))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// The payload of one heap slot.
#[derive(Debug)]
pub(crate) enum HeapData {
    Str(Str),
    Array(Vec<Value>),
    /// Own properties in insertion order.
    Object(IndexMap<String, Value>),
    Function(Function),
    Native(NativeMethod),
    Scope(Scope),
}

impl HeapData {
    /// Static name of this variant, used in heap statistics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Str(_) => "Str",
            Self::Array(_) => "Array",
            Self::Object(_) => "Object",
            Self::Function(_) => "Function",
            Self::Native(_) => "Native",
            Self::Scope(_) => "Scope",
        }
    }
}

/// Slab arena with a free list and mark-and-sweep collection.
#[derive(Debug, Default)]
pub(crate) struct Heap {
    slots: Vec<Option<HeapData>>,
    free: Vec<HeapId>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, data: HeapData) -> HeapId {
        if let Some(id) = self.free.pop() {
            self.slots[id.index()] = Some(data);
            id
        } else {
            let id = HeapId::new(self.slots.len());
            self.slots.push(Some(data));
            id
        }
    }

    /// Allocates a string value.
    pub fn alloc_str(&mut self, text: impl Into<String>) -> Value {
        Value::Ref(self.alloc(HeapData::Str(Str::new(text.into()))))
    }

    pub fn alloc_array(&mut self, elements: Vec<Value>) -> Value {
        Value::Ref(self.alloc(HeapData::Array(elements)))
    }

    pub fn alloc_object(&mut self, properties: IndexMap<String, Value>) -> Value {
        Value::Ref(self.alloc(HeapData::Object(properties)))
    }

    pub fn alloc_scope(&mut self, scope: Scope) -> HeapId {
        self.alloc(HeapData::Scope(scope))
    }

    /// Allocates a host function bound to the given receiver.
    pub fn alloc_native(&mut self, func: crate::modules::NativeFn, this: Value) -> Value {
        Value::Ref(self.alloc(HeapData::Native(NativeMethod { func, this })))
    }

    /// # Panics
    /// Panics when the slot was swept, which would mean a root was missing
    /// from a previous collection.
    pub fn get(&self, id: HeapId) -> &HeapData {
        self.slots[id.index()].as_ref().expect("access to a swept heap slot")
    }

    pub fn get_mut(&mut self, id: HeapId) -> &mut HeapData {
        self.slots[id.index()].as_mut().expect("access to a swept heap slot")
    }

    /// Convenience accessor for scope slots.
    pub fn scope(&self, id: HeapId) -> &Scope {
        match self.get(id) {
            HeapData::Scope(scope) => scope,
            other => panic!("expected scope slot, found {}", other.type_name()),
        }
    }

    pub fn scope_mut(&mut self, id: HeapId) -> &mut Scope {
        match self.get_mut(id) {
            HeapData::Scope(scope) => scope,
            other => panic!("expected scope slot, found {}", other.type_name()),
        }
    }

    /// Number of live objects, for tests and diagnostics.
    #[cfg(test)]
    pub fn live_objects(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Mark-and-sweep collection from the given roots.
    ///
    /// Every heap object reachable from a root survives; everything else is
    /// swept and its slot recycled. The caller is responsible for passing a
    /// complete root set, which is why collection is confined to quiescent
    /// points where the full set is known.
    pub fn collect(&mut self, roots: impl IntoIterator<Item = HeapId>) {
        let mut marked = vec![false; self.slots.len()];
        let mut worklist: Vec<HeapId> = roots.into_iter().collect();
        while let Some(id) = worklist.pop() {
            let index = id.index();
            if marked[index] {
                continue;
            }
            marked[index] = true;
            if let Some(data) = &self.slots[index] {
                trace_children(data, &mut worklist);
            }
        }
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_some() && !marked[index] {
                *slot = None;
                self.free.push(HeapId::new(index));
            }
        }
    }
}

/// Pushes every heap reference held by `data` onto the worklist.
fn trace_children(data: &HeapData, worklist: &mut Vec<HeapId>) {
    fn push_value(value: &Value, worklist: &mut Vec<HeapId>) {
        if let Value::Ref(id) = value {
            worklist.push(*id);
        }
    }
    match data {
        HeapData::Str(_) => {}
        HeapData::Array(elements) => {
            for element in elements {
                push_value(element, worklist);
            }
        }
        HeapData::Object(properties) => {
            for value in properties.values() {
                push_value(value, worklist);
            }
        }
        HeapData::Function(function) => worklist.push(function.scope),
        HeapData::Native(native) => push_value(&native.this, worklist),
        HeapData::Scope(scope) => {
            if let Some(parent) = scope.parent {
                worklist.push(parent);
            }
            for value in scope.values() {
                push_value(value, worklist);
            }
        }
    }
}

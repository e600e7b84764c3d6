//! Per-kind prototype objects and the global kind binders.
//!
//! Every value kind has one process-wide mutable prototype object, consulted
//! when a property miss occurs on a value of that kind. Script code reaches
//! a prototype through its kind binder, e.g. `String.prototype.hello =
//! function() { ... }`, and the new method is immediately visible on every
//! string, past and future.

use crate::{
    exception::RunResult,
    heap::{Heap, HeapData, HeapId},
    modules::NativeFn,
    scope::{self, Scope},
    types::{array::ArrayStatic, object::ObjectStatic, str::StringStatic},
    value::{Function, Value},
};

/// Handles of the six kind prototypes. Created once per interpreter and
/// rooted for the interpreter's lifetime.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Prototypes {
    pub string: HeapId,
    pub number: HeapId,
    pub boolean: HeapId,
    pub array: HeapId,
    pub object: HeapId,
    pub function: HeapId,
}

impl Prototypes {
    pub fn new(heap: &mut Heap) -> Self {
        let mut alloc_proto = || {
            let Value::Ref(id) = heap.alloc_object(indexmap::IndexMap::new()) else {
                unreachable!()
            };
            id
        };
        let protos = Self {
            string: alloc_proto(),
            number: alloc_proto(),
            boolean: alloc_proto(),
            array: alloc_proto(),
            object: alloc_proto(),
            function: alloc_proto(),
        };
        // numeric limits live on the prototype so plain numbers reach them
        if let HeapData::Object(properties) = heap.get_mut(protos.number) {
            properties.insert("MAX_VALUE".to_owned(), Value::Number(f64::MAX));
            properties.insert("MIN_VALUE".to_owned(), Value::Number(f64::MIN_POSITIVE));
        }
        protos
    }

    /// All prototype handles, for the garbage-collection root set.
    pub fn ids(&self) -> [HeapId; 6] {
        [self.string, self.number, self.boolean, self.array, self.object, self.function]
    }
}

/// Looks up `key` on a prototype object, one step deep.
///
/// A hit that is a script function is wrapped into a distinct callable whose
/// call-time scope binds `this` to the receiver; the original function and
/// its closure stay untouched. Native functions and plain values return
/// as-is.
pub(crate) fn proto_lookup(heap: &mut Heap, proto: HeapId, receiver: Value, key: &str) -> Option<Value> {
    let HeapData::Object(properties) = heap.get(proto) else {
        unreachable!("prototype handle must be an object")
    };
    let found = properties.get(key).copied()?;
    Some(bind_receiver(heap, found, receiver))
}

/// Rebinds a prototype-resolved method to its receiver.
pub(crate) fn bind_receiver(heap: &mut Heap, method: Value, receiver: Value) -> Value {
    let Value::Ref(method_id) = method else { return method };
    let HeapData::Function(function) = heap.get(method_id) else {
        return method;
    };
    let def = function.def.clone();
    let closure = function.scope;
    let mut this_scope = Scope::new(Some(closure));
    this_scope.insert("this", receiver);
    let this_scope = heap.alloc_scope(this_scope);
    Value::Ref(heap.alloc(HeapData::Function(Function { def, scope: this_scope })))
}

/// Creates the kind binder objects (`String`, `Number`, `Boolean`, `Array`,
/// `Object`, `Function`) and declares them in the global scope. Each binder
/// exposes its kind's prototype plus the kind's static functions.
pub(crate) fn install_binders(heap: &mut Heap, protos: &Prototypes, globals: HeapId) -> RunResult<()> {
    let binders: [(&str, HeapId, Vec<(&str, NativeFn)>); 6] = [
        (
            "String",
            protos.string,
            vec![("fromCharCode", NativeFn::StringStatic(StringStatic::FromCharCode))],
        ),
        ("Number", protos.number, vec![]),
        ("Boolean", protos.boolean, vec![]),
        (
            "Array",
            protos.array,
            vec![("isArray", NativeFn::ArrayStatic(ArrayStatic::IsArray))],
        ),
        (
            "Object",
            protos.object,
            vec![
                ("keys", NativeFn::ObjectStatic(ObjectStatic::Keys)),
                ("remove", NativeFn::ObjectStatic(ObjectStatic::Remove)),
            ],
        ),
        ("Function", protos.function, vec![]),
    ];
    for (name, proto, statics) in binders {
        let mut properties = indexmap::IndexMap::new();
        properties.insert("prototype".to_owned(), Value::Ref(proto));
        for (static_name, func) in statics {
            let native = heap.alloc_native(func, Value::Null);
            properties.insert(static_name.to_owned(), native);
        }
        let binder = heap.alloc_object(properties);
        scope::declare(heap, globals, name, binder)?;
    }
    Ok(())
}

//! Object values: own-property access and the `Object` binder statics.

use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::{Heap, HeapData, HeapId},
    protos::{Prototypes, proto_lookup},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum ObjectStatic {
    #[strum(serialize = "keys")]
    Keys,
    #[strum(serialize = "remove")]
    Remove,
}

/// Property read on an object: the own property wins, otherwise the Object
/// prototype is consulted, otherwise Null.
///
/// The prototype object itself never consults the prototype, which would be
/// a lookup into itself.
pub(crate) fn get(heap: &mut Heap, protos: &Prototypes, id: HeapId, key: &str) -> RunResult<Value> {
    let HeapData::Object(properties) = heap.get(id) else {
        unreachable!("object get on a non-object slot")
    };
    if let Some(value) = properties.get(key) {
        return Ok(*value);
    }
    if id != protos.object
        && let Some(value) = proto_lookup(heap, protos.object, Value::Ref(id), key)
    {
        return Ok(value);
    }
    Ok(Value::Null)
}

pub(crate) fn set(heap: &mut Heap, id: HeapId, key: &str, value: Value) {
    let HeapData::Object(properties) = heap.get_mut(id) else {
        unreachable!("object set on a non-object slot")
    };
    properties.insert(key.to_owned(), value);
}

/// Dispatches `Object.keys` and `Object.remove`.
pub(crate) fn call_static(heap: &mut Heap, func: ObjectStatic, args: &[Value]) -> RunResult<Value> {
    let object_id = match args.first() {
        Some(Value::Ref(id)) if matches!(heap.get(*id), HeapData::Object(_)) => *id,
        _ => {
            return Err(RunError::type_error(heap, format!("Object.{func} expects an object")));
        }
    };
    match func {
        ObjectStatic::Keys => {
            let HeapData::Object(properties) = heap.get(object_id) else {
                unreachable!()
            };
            let keys: Vec<String> = properties.keys().cloned().collect();
            let values: Vec<Value> = keys.into_iter().map(|k| heap.alloc_str(k)).collect();
            Ok(heap.alloc_array(values))
        }
        ObjectStatic::Remove => {
            // every string argument after the object names a key to drop
            let mut keys = Vec::new();
            for arg in &args[1..] {
                if let Some(key) = arg.as_str(heap) {
                    keys.push(key.to_owned());
                }
            }
            let HeapData::Object(properties) = heap.get_mut(object_id) else {
                unreachable!()
            };
            for key in keys {
                properties.shift_remove(&key);
            }
            Ok(Value::Null)
        }
    }
}

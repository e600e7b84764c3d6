//! Public value type for crossing the embedding boundary.
//!
//! `Object` owns all its data and needs no heap: converting out of the
//! interpreter deep-copies arrays and objects, and functions cross as
//! opaque markers. This is what `Runner::run` and `ReplSession::execute`
//! hand back to the host.

use std::fmt;

use crate::{
    heap::{Heap, HeapData},
    value::Value,
};

/// Conversion depth bound; beyond it (only reachable with self-referential
/// graphs) the remainder collapses to Null.
const MAX_DEPTH: usize = 64;

/// An owned snapshot of a runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Object {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Object>),
    /// Own properties in insertion order.
    Record(Vec<(String, Object)>),
    /// A script function; its body does not cross the boundary.
    Function,
    /// A host function.
    NativeFunction,
}

impl Object {
    pub(crate) fn from_value(value: Value, heap: &Heap) -> Self {
        Self::from_value_at(value, heap, 0)
    }

    fn from_value_at(value: Value, heap: &Heap, depth: usize) -> Self {
        if depth > MAX_DEPTH {
            return Self::Null;
        }
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::Ref(id) => match heap.get(id) {
                HeapData::Str(s) => Self::String(s.as_str().to_owned()),
                HeapData::Array(elements) => Self::Array(
                    elements
                        .iter()
                        .map(|element| Self::from_value_at(*element, heap, depth + 1))
                        .collect(),
                ),
                HeapData::Object(properties) => Self::Record(
                    properties
                        .iter()
                        .map(|(key, item)| (key.clone(), Self::from_value_at(*item, heap, depth + 1)))
                        .collect(),
                ),
                HeapData::Function(_) => Self::Function,
                HeapData::Native(_) => Self::NativeFunction,
                HeapData::Scope(_) => unreachable!("scopes are not script-visible values"),
            },
        }
    }

    /// Builds the runtime value for an `Object` handed in by the host.
    pub(crate) fn to_value(&self, heap: &mut Heap) -> Value {
        match self {
            Self::Null | Self::Function | Self::NativeFunction => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(*n),
            Self::String(s) => heap.alloc_str(s.clone()),
            Self::Array(items) => {
                let elements: Vec<Value> = items.iter().map(|item| item.to_value(heap)).collect();
                heap.alloc_array(elements)
            }
            Self::Record(entries) => {
                let mut properties = indexmap::IndexMap::new();
                for (key, item) in entries {
                    let value = item.to_value(heap);
                    properties.insert(key.clone(), value);
                }
                heap.alloc_object(properties)
            }
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl fmt::Display for Object {
    /// Matches the script-observable display strings.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => f.write_str(if *b { "true" } else { "false" }),
            Self::Number(n) => f.write_str(&crate::types::number::number_to_string(*n)),
            Self::String(s) => f.write_str(s),
            Self::Array(items) => {
                f.write_str("[")?;
                for (index, item) in items.iter().enumerate() {
                    if index > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Record(_) => f.write_str("[object Object]"),
            Self::Function => f.write_str("[function]"),
            Self::NativeFunction => f.write_str("[native code]"),
        }
    }
}

//! Runtime value representation.
//!
//! `Value` is a small copyable tag: the immediate kinds are stored inline and
//! every compound kind lives on the heap behind a `Ref` handle. Keeping the
//! value itself `Copy` means scopes, arrays and argument vectors can shuffle
//! values freely without touching the heap.

use std::rc::Rc;

use strum::Display;

use crate::{
    ast::FunctionDef,
    exception::{RunError, RunResult},
    heap::{Heap, HeapData, HeapId},
    modules::NativeFn,
    types::number::number_to_string,
};

/// Maximum nesting depth for structural equality over arrays and objects.
/// Self-referential graphs would otherwise recurse forever; crossing the
/// limit raises a catchable RangeError.
const MAX_EQ_DEPTH: usize = 64;

/// A runtime value. Shared-reference semantics for every compound kind.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Value {
    Null,
    Bool(bool),
    Number(f64),
    Ref(HeapId),
}

/// The observable kind of a value, used for dispatch and error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum Kind {
    #[strum(serialize = "null")]
    Null,
    #[strum(serialize = "bool")]
    Bool,
    #[strum(serialize = "number")]
    Number,
    #[strum(serialize = "string")]
    Str,
    #[strum(serialize = "array")]
    Array,
    #[strum(serialize = "object")]
    Object,
    #[strum(serialize = "function")]
    Function,
    #[strum(serialize = "native function")]
    Native,
}

/// A script function value: the shared definition plus the captured scope.
#[derive(Debug)]
pub(crate) struct Function {
    pub def: Rc<FunctionDef>,
    /// The environment the literal was evaluated in. Calls create a child of
    /// this scope.
    pub scope: HeapId,
}

/// A host function, optionally bound to a receiver.
///
/// Kind-method lookups (`"abc".indexOf`, `arr.push`) produce a `Native` whose
/// `this` is the receiver; module functions are bound to `Null`.
#[derive(Debug, Clone, Copy)]
pub(crate) struct NativeMethod {
    pub func: NativeFn,
    pub this: Value,
}

impl Value {
    pub fn kind(self, heap: &Heap) -> Kind {
        match self {
            Self::Null => Kind::Null,
            Self::Bool(_) => Kind::Bool,
            Self::Number(_) => Kind::Number,
            Self::Ref(id) => match heap.get(id) {
                HeapData::Str(_) => Kind::Str,
                HeapData::Array(_) => Kind::Array,
                HeapData::Object(_) => Kind::Object,
                HeapData::Function(_) => Kind::Function,
                HeapData::Native(_) => Kind::Native,
                HeapData::Scope(_) => unreachable!("scopes are not script-visible values"),
            },
        }
    }

    /// Truthiness: null is false, numbers by nonzero, strings and arrays by
    /// non-emptiness, objects by having at least one own property, functions
    /// always true.
    pub fn is_truthy(self, heap: &Heap) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(b) => b,
            Self::Number(n) => n != 0.0,
            Self::Ref(id) => match heap.get(id) {
                HeapData::Str(s) => !s.is_empty(),
                HeapData::Array(elements) => !elements.is_empty(),
                HeapData::Object(properties) => !properties.is_empty(),
                HeapData::Function(_) | HeapData::Native(_) => true,
                HeapData::Scope(_) => unreachable!("scopes are not script-visible values"),
            },
        }
    }

    /// The display string, as observed by string concatenation, bracket-key
    /// coercion and `IO.println`.
    pub fn display(self, heap: &Heap) -> String {
        match self {
            Self::Null => "null".to_owned(),
            Self::Bool(b) => if b { "true" } else { "false" }.to_owned(),
            Self::Number(n) => number_to_string(n),
            Self::Ref(id) => match heap.get(id) {
                HeapData::Str(s) => s.as_str().to_owned(),
                HeapData::Array(elements) => {
                    let parts: Vec<String> = elements.iter().map(|e| e.display(heap)).collect();
                    format!("[{}]", parts.join(", "))
                }
                HeapData::Object(_) => "[object Object]".to_owned(),
                HeapData::Function(_) => "[function]".to_owned(),
                HeapData::Native(_) => "[native code]".to_owned(),
                HeapData::Scope(_) => unreachable!("scopes are not script-visible values"),
            },
        }
    }

    /// Reads the string content when this value is a string.
    pub fn as_str(self, heap: &Heap) -> Option<&str> {
        if let Self::Ref(id) = self
            && let HeapData::Str(s) = heap.get(id)
        {
            return Some(s.as_str());
        }
        None
    }

    pub fn as_number(self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n),
            _ => None,
        }
    }
}

/// Structural equality.
///
/// Same-kind comparison for the scalar kinds, element-wise for arrays,
/// key/value-wise over own properties for objects, reference identity for
/// functions and natives. Cross-kind comparison is always false.
pub(crate) fn values_equal(heap: &mut Heap, left: Value, right: Value) -> RunResult<bool> {
    values_equal_at(heap, left, right, 0)
}

fn values_equal_at(heap: &mut Heap, left: Value, right: Value, depth: usize) -> RunResult<bool> {
    if depth > MAX_EQ_DEPTH {
        return Err(RunError::range_error(heap, "equality recursion limit exceeded"));
    }
    match (left, right) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Number(a), Value::Number(b)) => Ok(a == b),
        (Value::Ref(a), Value::Ref(b)) => {
            if a == b {
                return Ok(true);
            }
            // collect the element pairs first so the recursion below does
            // not overlap the heap borrow
            let pairs: Vec<(Value, Option<Value>)> = match (heap.get(a), heap.get(b)) {
                (HeapData::Str(s1), HeapData::Str(s2)) => return Ok(s1.as_str() == s2.as_str()),
                (HeapData::Array(e1), HeapData::Array(e2)) => {
                    if e1.len() != e2.len() {
                        return Ok(false);
                    }
                    e1.iter().copied().zip(e2.iter().copied().map(Some)).collect()
                }
                (HeapData::Object(p1), HeapData::Object(p2)) => {
                    if p1.len() != p2.len() {
                        return Ok(false);
                    }
                    p1.iter().map(|(key, value)| (*value, p2.get(key).copied())).collect()
                }
                // distinct handles: functions and natives compare by identity
                _ => return Ok(false),
            };
            for (left, right) in pairs {
                let Some(right) = right else { return Ok(false) };
                if !values_equal_at(heap, left, right, depth + 1)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        _ => Ok(false),
    }
}

//! Json module: parse and stringify against the runtime value model.

use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::{Heap, HeapData},
    modules::{NativeFn, module_object},
    value::Value,
};

/// Maximum nesting accepted when stringifying, which is what bounds work on
/// self-referential object graphs.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum JsonFn {
    #[strum(serialize = "parse")]
    Parse,
    #[strum(serialize = "stringify")]
    Stringify,
}

pub(crate) fn install(heap: &mut Heap) -> Value {
    module_object(
        heap,
        &[
            ("parse", NativeFn::Json(JsonFn::Parse)),
            ("stringify", NativeFn::Json(JsonFn::Stringify)),
        ],
    )
}

pub(crate) fn call(heap: &mut Heap, func: JsonFn, args: &[Value]) -> RunResult<Value> {
    match func {
        JsonFn::Parse => {
            let Some(text) = args.first().and_then(|a| a.as_str(heap)).map(str::to_owned) else {
                return Err(RunError::type_error(heap, "Json.parse expects a string"));
            };
            match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(json) => Ok(json_to_value(heap, &json)),
                Err(err) => Err(RunError::host_error(heap, format!("Json.parse: {err}"))),
            }
        }
        JsonFn::Stringify => {
            let value = args.first().copied().unwrap_or(Value::Null);
            let json = value_to_json(heap, value, 0)?;
            let text = json.to_string();
            Ok(heap.alloc_str(text))
        }
    }
}

fn json_to_value(heap: &mut Heap, json: &serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(*b),
        serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => heap.alloc_str(s.clone()),
        serde_json::Value::Array(items) => {
            let elements: Vec<Value> = items.iter().map(|item| json_to_value(heap, item)).collect();
            heap.alloc_array(elements)
        }
        serde_json::Value::Object(entries) => {
            let mut properties = indexmap::IndexMap::new();
            for (key, item) in entries {
                let value = json_to_value(heap, item);
                properties.insert(key.clone(), value);
            }
            heap.alloc_object(properties)
        }
    }
}

fn value_to_json(heap: &mut Heap, value: Value, depth: usize) -> RunResult<serde_json::Value> {
    if depth > MAX_DEPTH {
        return Err(RunError::range_error(heap, "Json.stringify nesting too deep"));
    }
    match value {
        Value::Null => Ok(serde_json::Value::Null),
        Value::Bool(b) => Ok(serde_json::Value::Bool(b)),
        Value::Number(n) => {
            // integral values serialize without a decimal point, matching
            // the script-visible number display
            if n == n.trunc() && n.is_finite() && n.abs() < 9.007_199_254_740_992e15 {
                Ok(serde_json::Value::Number(serde_json::Number::from(n as i64)))
            } else {
                Ok(serde_json::Number::from_f64(n).map_or(serde_json::Value::Null, serde_json::Value::Number))
            }
        }
        Value::Ref(id) => match heap.get(id) {
            HeapData::Str(s) => Ok(serde_json::Value::String(s.as_str().to_owned())),
            HeapData::Array(elements) => {
                let snapshot = elements.clone();
                let mut items = Vec::with_capacity(snapshot.len());
                for element in snapshot {
                    items.push(value_to_json(heap, element, depth + 1)?);
                }
                Ok(serde_json::Value::Array(items))
            }
            HeapData::Object(properties) => {
                let snapshot: Vec<(String, Value)> = properties.iter().map(|(k, v)| (k.clone(), *v)).collect();
                let mut entries = serde_json::Map::new();
                for (key, item) in snapshot {
                    entries.insert(key, value_to_json(heap, item, depth + 1)?);
                }
                Ok(serde_json::Value::Object(entries))
            }
            HeapData::Function(_) | HeapData::Native(_) => {
                Err(RunError::type_error(heap, "Json.stringify cannot serialize a function"))
            }
            HeapData::Scope(_) => unreachable!("scopes are not script-visible values"),
        },
    }
}

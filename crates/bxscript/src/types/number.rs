//! Number formatting and the methods reachable on number values.

use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::Heap,
    modules::NativeFn,
    protos::{Prototypes, proto_lookup},
    value::Value,
};

/// The script-observable decimal rendering of a number.
///
/// Integral values within exact-double range print without a decimal point;
/// everything else uses the shortest round-trip form with a redundant `.0`
/// suffix stripped, so `3.14` and `10` both survive a round trip through
/// their own display strings.
pub(crate) fn number_to_string(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_owned();
    }
    if value == value.trunc() && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let mut buffer = ryu::Buffer::new();
    let text = buffer.format(value);
    text.strip_suffix(".0").unwrap_or(text).to_owned()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum NumMethod {
    #[strum(serialize = "toFixed")]
    ToFixed,
    #[strum(serialize = "toString")]
    ToString,
}

/// Property read on a number value: `toFixed`/`toString`, then the Number
/// prototype.
pub(crate) fn get(heap: &mut Heap, protos: &Prototypes, value: f64, key: &str) -> RunResult<Value> {
    let receiver = Value::Number(value);
    match key {
        "toFixed" => Ok(heap.alloc_native(NativeFn::Number(NumMethod::ToFixed), receiver)),
        "toString" => Ok(heap.alloc_native(NativeFn::Number(NumMethod::ToString), receiver)),
        _ => {
            if let Some(found) = proto_lookup(heap, protos.number, receiver, key) {
                return Ok(found);
            }
            Err(RunError::type_error(
                heap,
                format!("cannot read property '{key}' of number"),
            ))
        }
    }
}

pub(crate) fn call(heap: &mut Heap, method: NumMethod, this: Value, args: &[Value]) -> RunResult<Value> {
    let Value::Number(value) = this else {
        unreachable!("number method bound to a non-number receiver")
    };
    match method {
        NumMethod::ToFixed => {
            let Some(Value::Number(precision)) = args.first() else {
                return Err(RunError::type_error(heap, "toFixed expects a numeric precision"));
            };
            let precision = *precision as i64;
            if !(0..=100).contains(&precision) {
                return Err(RunError::range_error(heap, "toFixed precision must be between 0 and 100"));
            }
            let text = format!("{value:.prec$}", prec = precision as usize);
            Ok(heap.alloc_str(text))
        }
        NumMethod::ToString => {
            let text = number_to_string(value);
            Ok(heap.alloc_str(text))
        }
    }
}

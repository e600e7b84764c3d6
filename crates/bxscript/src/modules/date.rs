//! Date module.
//!
//! Timestamps are epoch milliseconds as plain numbers. `Date.from` parses a
//! `"yyyy-MM-dd HH:mm:ss"` text into a date object carrying its timestamp
//! plus a bound `format` method, so `Date.from(text).format(fmt)` reads
//! naturally in script code.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::{Heap, HeapData},
    modules::{NativeFn, module_object},
    value::Value,
};

const DEFAULT_PATTERN: &str = "yyyy-MM-dd HH:mm:ss";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum DateFn {
    #[strum(serialize = "now")]
    Now,
    #[strum(serialize = "sleep")]
    Sleep,
    #[strum(serialize = "format")]
    Format,
    #[strum(serialize = "from")]
    From,
    /// The `format` method bound on objects returned by `Date.from`.
    #[strum(serialize = "format")]
    BoundFormat,
}

pub(crate) fn install(heap: &mut Heap) -> Value {
    module_object(
        heap,
        &[
            ("now", NativeFn::Date(DateFn::Now)),
            ("sleep", NativeFn::Date(DateFn::Sleep)),
            ("format", NativeFn::Date(DateFn::Format)),
            ("from", NativeFn::Date(DateFn::From)),
        ],
    )
}

/// Rewrites the script-facing pattern tokens into a strftime format.
/// Tokens: yyyy, MM, dd, HH, hh, mm, ss.
fn to_strftime(pattern: &str) -> String {
    pattern
        .replace('%', "%%")
        .replace("yyyy", "%Y")
        .replace("MM", "%m")
        .replace("dd", "%d")
        .replace("HH", "%H")
        .replace("hh", "%I")
        .replace("mm", "%M")
        .replace("ss", "%S")
}

fn pattern_arg(heap: &Heap, args: &[Value], index: usize) -> String {
    args.get(index)
        .and_then(|a| a.as_str(heap))
        .map_or_else(|| DEFAULT_PATTERN.to_owned(), str::to_owned)
}

pub(crate) fn call(heap: &mut Heap, func: DateFn, this: Value, args: &[Value]) -> RunResult<Value> {
    match func {
        DateFn::Now => {
            let millis = Utc::now().timestamp_millis() as f64;
            Ok(Value::Number(millis))
        }
        DateFn::Sleep => {
            if let Some(Value::Number(ms)) = args.first()
                && *ms > 0.0
            {
                std::thread::sleep(std::time::Duration::from_millis(*ms as u64));
            }
            Ok(Value::Null)
        }
        DateFn::Format => {
            let Some(Value::Number(millis)) = args.first() else {
                return Err(RunError::type_error(heap, "Date.format expects a timestamp in milliseconds"));
            };
            let pattern = to_strftime(&pattern_arg(heap, args, 1));
            let Some(moment) = Local.timestamp_millis_opt(*millis as i64).single() else {
                return Err(RunError::range_error(heap, "Date.format timestamp out of range"));
            };
            let text = moment.format(&pattern).to_string();
            Ok(heap.alloc_str(text))
        }
        DateFn::From => {
            let Some(text) = args.first().and_then(|a| a.as_str(heap)).map(str::to_owned) else {
                return Err(RunError::type_error(heap, "Date.from expects a string"));
            };
            let Some(parsed) = parse_datetime(&text) else {
                return Err(RunError::host_error(heap, format!("Date.from: unrecognized date '{text}'")));
            };
            let millis = parsed.and_utc().timestamp_millis() as f64;
            let mut properties = indexmap::IndexMap::new();
            properties.insert("millis".to_owned(), Value::Number(millis));
            let date_object = heap.alloc_object(properties);
            let format_method = heap.alloc_native(NativeFn::Date(DateFn::BoundFormat), date_object);
            let Value::Ref(object_id) = date_object else { unreachable!() };
            if let HeapData::Object(properties) = heap.get_mut(object_id) {
                properties.insert("format".to_owned(), format_method);
            }
            Ok(date_object)
        }
        DateFn::BoundFormat => {
            let millis = bound_millis(heap, this)
                .ok_or_else(|| RunError::type_error(heap, "format must be called on a date object"))?;
            let pattern = to_strftime(&pattern_arg(heap, args, 0));
            let Some(moment) = DateTime::from_timestamp_millis(millis as i64) else {
                return Err(RunError::range_error(heap, "date timestamp out of range"));
            };
            let text = moment.naive_utc().format(&pattern).to_string();
            Ok(heap.alloc_str(text))
        }
    }
}

fn bound_millis(heap: &Heap, this: Value) -> Option<f64> {
    let Value::Ref(id) = this else { return None };
    let HeapData::Object(properties) = heap.get(id) else {
        return None;
    };
    properties.get("millis")?.as_number()
}

/// Accepts `yyyy-MM-dd HH:mm:ss` and the date-only prefix.
fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(full) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Some(full);
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
}

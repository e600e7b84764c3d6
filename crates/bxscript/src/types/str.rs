//! String values and their built-in methods.
//!
//! A string keeps both its UTF-8 text and the decoded code-point sequence:
//! indexing, `length` and every positional method work in code points, while
//! concatenation and display reuse the text.

use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::{Heap, HeapData, HeapId},
    modules::NativeFn,
    protos::{Prototypes, proto_lookup},
    value::Value,
};

/// True when a property key looks like a non-negative integer index. Keys
/// with signs, dots or any non-digit character fall through to method and
/// prototype lookup instead.
fn index_key(key: &str) -> Option<usize> {
    if key.is_empty() || !key.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    key.parse().ok()
}

#[derive(Debug)]
pub(crate) struct Str {
    text: String,
    chars: Vec<char>,
}

impl Str {
    pub fn new(text: String) -> Self {
        let chars = text.chars().collect();
        Self { text, chars }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Length in code points, not bytes.
    pub fn char_count(&self) -> usize {
        self.chars.len()
    }

    pub fn char_at(&self, index: usize) -> Option<char> {
        self.chars.get(index).copied()
    }

    pub fn chars(&self) -> &[char] {
        &self.chars
    }
}

/// Built-in string methods, dispatched through the native-function bridge
/// with the receiver bound as `this`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum StrMethod {
    #[strum(serialize = "indexOf")]
    IndexOf,
    #[strum(serialize = "startsWith")]
    StartsWith,
    #[strum(serialize = "endsWith")]
    EndsWith,
    #[strum(serialize = "lastIndexOf")]
    LastIndexOf,
    #[strum(serialize = "charCodeAt")]
    CharCodeAt,
    #[strum(serialize = "substr")]
    Substr,
}

const METHODS: &[(&str, StrMethod)] = &[
    ("indexOf", StrMethod::IndexOf),
    ("startsWith", StrMethod::StartsWith),
    ("endsWith", StrMethod::EndsWith),
    ("lastIndexOf", StrMethod::LastIndexOf),
    ("charCodeAt", StrMethod::CharCodeAt),
    ("substr", StrMethod::Substr),
];

/// Static functions on the `String` binder object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum StringStatic {
    #[strum(serialize = "fromCharCode")]
    FromCharCode,
}

/// Property read on a string value.
///
/// An all-digit key indexes by code point and yields a one-character string,
/// or Null out of range. `length` and the built-in methods come next, then
/// the String prototype.
pub(crate) fn get(heap: &mut Heap, protos: &Prototypes, id: HeapId, key: &str) -> RunResult<Value> {
    let receiver = Value::Ref(id);
    let HeapData::Str(s) = heap.get(id) else {
        unreachable!("string get on a non-string slot")
    };
    let char_count = s.char_count();
    let indexed = index_key(key).map(|index| s.char_at(index));
    if let Some(slot) = indexed {
        return Ok(match slot {
            Some(c) => heap.alloc_str(c.to_string()),
            None => Value::Null,
        });
    }
    if key == "length" {
        return Ok(Value::Number(char_count as f64));
    }
    if let Some((_, method)) = METHODS.iter().find(|(name, _)| *name == key) {
        return Ok(heap.alloc_native(NativeFn::Str(*method), receiver));
    }
    if let Some(value) = proto_lookup(heap, protos.string, receiver, key) {
        return Ok(value);
    }
    Err(RunError::type_error(
        heap,
        format!("cannot read property '{key}' of string"),
    ))
}

fn this_chars(heap: &Heap, this: Value) -> Vec<char> {
    if let Value::Ref(id) = this
        && let HeapData::Str(s) = heap.get(id)
    {
        return s.chars().to_vec();
    }
    unreachable!("string method bound to a non-string receiver")
}

fn arg_chars(heap: &mut Heap, method: StrMethod, args: &[Value]) -> RunResult<Vec<char>> {
    match args.first().and_then(|a| a.as_str(heap)) {
        Some(s) => Ok(s.chars().collect()),
        None => Err(RunError::type_error(heap, format!("{method} expects a string argument"))),
    }
}

/// Dispatches a bound string method.
pub(crate) fn call(heap: &mut Heap, method: StrMethod, this: Value, args: &[Value]) -> RunResult<Value> {
    let chars = this_chars(heap, this);
    match method {
        StrMethod::IndexOf => {
            let needle = arg_chars(heap, method, args)?;
            let start = match args.get(1) {
                Some(Value::Number(n)) => (*n).max(0.0) as usize,
                _ => 0,
            };
            Ok(Value::Number(find_forward(&chars, &needle, start)))
        }
        StrMethod::LastIndexOf => {
            let needle = arg_chars(heap, method, args)?;
            Ok(Value::Number(find_backward(&chars, &needle)))
        }
        StrMethod::StartsWith => {
            let prefix = arg_chars(heap, method, args)?;
            Ok(Value::Bool(chars.len() >= prefix.len() && chars[..prefix.len()] == prefix[..]))
        }
        StrMethod::EndsWith => {
            let suffix = arg_chars(heap, method, args)?;
            Ok(Value::Bool(
                chars.len() >= suffix.len() && chars[chars.len() - suffix.len()..] == suffix[..],
            ))
        }
        StrMethod::CharCodeAt => {
            let code = match args.first() {
                Some(Value::Number(n)) if *n >= 0.0 => chars.get(*n as usize).map(|c| f64::from(u32::from(*c))),
                _ => None,
            };
            Ok(Value::Number(code.unwrap_or(f64::NAN)))
        }
        StrMethod::Substr => {
            let (Some(Value::Number(start)), Some(Value::Number(end))) = (args.first(), args.get(1)) else {
                return Err(RunError::type_error(heap, "substr(start, end) expects two numbers"));
            };
            let len = chars.len();
            let start = (*start).max(0.0) as usize;
            let end = (*end).max(0.0) as usize;
            let start = start.min(len);
            let end = end.min(len);
            if start > end {
                return Err(RunError::range_error(heap, "substr: start must not exceed end"));
            }
            let text: String = chars[start..end].iter().collect();
            Ok(heap.alloc_str(text))
        }
    }
}

/// `String.fromCharCode(...)`: builds a string from numeric code points.
/// Non-number arguments are skipped, invalid code points become U+FFFD.
pub(crate) fn call_static(heap: &mut Heap, func: StringStatic, args: &[Value]) -> RunResult<Value> {
    match func {
        StringStatic::FromCharCode => {
            let mut text = String::new();
            for arg in args {
                if let Value::Number(n) = arg {
                    let c = char::from_u32(*n as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
                    text.push(c);
                }
            }
            Ok(heap.alloc_str(text))
        }
    }
}

/// Code-point index of `needle` in `haystack` at or after `start`, or -1.
fn find_forward(haystack: &[char], needle: &[char], start: usize) -> f64 {
    if needle.is_empty() {
        return start.min(haystack.len()) as f64;
    }
    if needle.len() > haystack.len() {
        return -1.0;
    }
    for i in start..=(haystack.len() - needle.len()) {
        if haystack[i..i + needle.len()] == needle[..] {
            return i as f64;
        }
    }
    -1.0
}

fn find_backward(haystack: &[char], needle: &[char]) -> f64 {
    if needle.is_empty() {
        return haystack.len() as f64;
    }
    if needle.len() > haystack.len() {
        return -1.0;
    }
    for i in (0..=(haystack.len() - needle.len())).rev() {
        if haystack[i..i + needle.len()] == needle[..] {
            return i as f64;
        }
    }
    -1.0
}

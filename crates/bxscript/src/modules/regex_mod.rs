//! Regex module backed by the `regex` crate.

use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::Heap,
    modules::{NativeFn, module_object},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum RegexFn {
    #[strum(serialize = "match")]
    Match,
    #[strum(serialize = "replace")]
    Replace,
}

pub(crate) fn install(heap: &mut Heap) -> Value {
    module_object(
        heap,
        &[
            ("match", NativeFn::Regex(RegexFn::Match)),
            ("replace", NativeFn::Regex(RegexFn::Replace)),
        ],
    )
}

fn string_arg(heap: &mut Heap, func: RegexFn, args: &[Value], index: usize) -> RunResult<String> {
    match args.get(index).and_then(|a| a.as_str(heap)) {
        Some(s) => Ok(s.to_owned()),
        None => Err(RunError::type_error(heap, format!("Regex.{func} expects string arguments"))),
    }
}

fn compile(heap: &mut Heap, pattern: &str) -> RunResult<regex::Regex> {
    regex::Regex::new(pattern).map_err(|err| RunError::host_error(heap, format!("invalid pattern: {err}")))
}

pub(crate) fn call(heap: &mut Heap, func: RegexFn, args: &[Value]) -> RunResult<Value> {
    match func {
        RegexFn::Match => {
            let text = string_arg(heap, func, args, 0)?;
            let pattern = string_arg(heap, func, args, 1)?;
            let re = compile(heap, &pattern)?;
            Ok(Value::Bool(re.is_match(&text)))
        }
        RegexFn::Replace => {
            let text = string_arg(heap, func, args, 0)?;
            let pattern = string_arg(heap, func, args, 1)?;
            let replacement = string_arg(heap, func, args, 2)?;
            let re = compile(heap, &pattern)?;
            let replaced = re.replace_all(&text, replacement.as_str()).into_owned();
            Ok(heap.alloc_str(replaced))
        }
    }
}

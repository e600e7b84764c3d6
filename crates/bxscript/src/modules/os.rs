//! OS module: platform name, environment variables, shell commands.

use std::process::Command;

use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    heap::Heap,
    modules::{NativeFn, module_object},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum OsFn {
    #[strum(serialize = "platform")]
    Platform,
    #[strum(serialize = "getEnv")]
    GetEnv,
    #[strum(serialize = "exec")]
    Exec,
}

pub(crate) fn install(heap: &mut Heap) -> Value {
    module_object(
        heap,
        &[
            ("platform", NativeFn::Os(OsFn::Platform)),
            ("getEnv", NativeFn::Os(OsFn::GetEnv)),
            ("exec", NativeFn::Os(OsFn::Exec)),
        ],
    )
}

fn platform_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "linux"
    }
}

pub(crate) fn call(heap: &mut Heap, func: OsFn, args: &[Value]) -> RunResult<Value> {
    match func {
        OsFn::Platform => Ok(heap.alloc_str(platform_name())),
        OsFn::GetEnv => {
            let Some(name) = args.first().and_then(|a| a.as_str(heap)).map(str::to_owned) else {
                return Err(RunError::type_error(heap, "OS.getEnv expects a variable name"));
            };
            Ok(match std::env::var(&name) {
                Ok(value) => heap.alloc_str(value),
                Err(_) => Value::Null,
            })
        }
        OsFn::Exec => {
            let Some(command) = args.first().and_then(|a| a.as_str(heap)).map(str::to_owned) else {
                return Err(RunError::type_error(heap, "OS.exec expects a command string"));
            };
            let output = if cfg!(target_os = "windows") {
                Command::new("cmd").args(["/C", &command]).output()
            } else {
                Command::new("sh").args(["-c", &command]).output()
            };
            let output = output.map_err(|err| RunError::host_error(heap, format!("OS.exec: {err}")))?;
            let code = output.status.code().map_or(-1.0, f64::from);
            let stdout = heap.alloc_str(String::from_utf8_lossy(&output.stdout).into_owned());
            let stderr = heap.alloc_str(String::from_utf8_lossy(&output.stderr).into_owned());
            let mut properties = indexmap::IndexMap::new();
            properties.insert("code".to_owned(), Value::Number(code));
            properties.insert("stdout".to_owned(), stdout);
            properties.insert("stderr".to_owned(), stderr);
            Ok(heap.alloc_object(properties))
        }
    }
}

//! Host standard-library modules and the native-function bridge.
//!
//! Every host function the runtime exposes is one variant of [`NativeFn`],
//! grouped by module. Calling convention: the argument vector is advisory,
//! missing arguments read as Null and extras are ignored; kind mismatches
//! raise catchable TypeErrors. Asynchronous functions return Null
//! synchronously and deliver their result through the event loop.

pub(crate) mod crypt;
pub(crate) mod date;
pub(crate) mod io_mod;
pub(crate) mod json_mod;
pub(crate) mod math;
pub(crate) mod net;
pub(crate) mod os;
pub(crate) mod regex_mod;
pub(crate) mod thread_mod;

use crate::{
    exception::RunResult,
    interp::Interp,
    io::PrintWriter,
    scope,
    types::{
        array::{ArrMethod, ArrayStatic},
        number::NumMethod,
        object::ObjectStatic,
        str::{StrMethod, StringStatic},
    },
    value::Value,
};

/// Every native function callable from script code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NativeFn {
    /// Bound string methods.
    Str(StrMethod),
    /// Bound array methods.
    Array(ArrMethod),
    /// Bound number methods.
    Number(NumMethod),
    StringStatic(StringStatic),
    ArrayStatic(ArrayStatic),
    ObjectStatic(ObjectStatic),
    Io(io_mod::IoFn),
    Math(math::MathFn),
    Json(json_mod::JsonFn),
    Date(date::DateFn),
    Os(os::OsFn),
    Http(net::HttpFn),
    Crypt(crypt::CryptFn),
    Regex(regex_mod::RegexFn),
    Thread(thread_mod::ThreadFn),
}

/// Invokes a native function on the interpreter thread.
pub(crate) fn call_native(
    interp: &mut Interp,
    print: &mut dyn PrintWriter,
    func: NativeFn,
    this: Value,
    args: &[Value],
) -> RunResult<Value> {
    match func {
        NativeFn::Str(method) => crate::types::str::call(&mut interp.heap, method, this, args),
        NativeFn::Array(method) => crate::types::array::call(&mut interp.heap, method, this, args),
        NativeFn::Number(method) => crate::types::number::call(&mut interp.heap, method, this, args),
        NativeFn::StringStatic(f) => crate::types::str::call_static(&mut interp.heap, f, args),
        NativeFn::ArrayStatic(f) => crate::types::array::call_static(&mut interp.heap, f, args),
        NativeFn::ObjectStatic(f) => crate::types::object::call_static(&mut interp.heap, f, args),
        NativeFn::Io(f) => io_mod::call(&mut interp.heap, print, f, args),
        NativeFn::Math(f) => math::call(&mut interp.heap, f, args),
        NativeFn::Json(f) => json_mod::call(&mut interp.heap, f, args),
        NativeFn::Date(f) => date::call(&mut interp.heap, f, this, args),
        NativeFn::Os(f) => os::call(&mut interp.heap, f, args),
        NativeFn::Http(f) => net::call(interp, f, args),
        NativeFn::Crypt(f) => crypt::call(&mut interp.heap, f, args),
        NativeFn::Regex(f) => regex_mod::call(&mut interp.heap, f, args),
        NativeFn::Thread(f) => thread_mod::call(interp, f, args),
    }
}

/// Builds every standard-library module object and declares it in the global
/// scope. Runs once per interpreter, before any script executes.
pub(crate) fn install_stdlib(interp: &mut Interp) -> RunResult<()> {
    let heap = &mut interp.heap;
    let modules: [(&str, Value); 9] = [
        ("IO", io_mod::install(heap)),
        ("Math", math::install(heap)),
        ("Json", json_mod::install(heap)),
        ("Date", date::install(heap)),
        ("OS", os::install(heap)),
        ("Http", net::install(heap)),
        ("Crypt", crypt::install(heap)),
        ("Regex", regex_mod::install(heap)),
        ("Thread", thread_mod::install(heap)),
    ];
    for (name, module) in modules {
        scope::declare(&mut interp.heap, interp.globals, name, module)?;
    }
    Ok(())
}

/// Builds a module object from `(name, native)` pairs. The natives are
/// unbound, so `this` is Null when they run.
pub(crate) fn module_object(heap: &mut crate::heap::Heap, entries: &[(&str, NativeFn)]) -> Value {
    let mut properties = indexmap::IndexMap::new();
    for (name, func) in entries {
        let native = heap.alloc_native(*func, Value::Null);
        properties.insert((*name).to_owned(), native);
    }
    heap.alloc_object(properties)
}

//! Console output module.

use strum::Display;

use crate::{
    exception::RunResult,
    heap::Heap,
    io::PrintWriter,
    modules::{NativeFn, module_object},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum IoFn {
    #[strum(serialize = "println")]
    Println,
}

pub(crate) fn install(heap: &mut Heap) -> Value {
    module_object(heap, &[("println", NativeFn::Io(IoFn::Println))])
}

pub(crate) fn call(heap: &mut Heap, print: &mut dyn PrintWriter, func: IoFn, args: &[Value]) -> RunResult<Value> {
    match func {
        IoFn::Println => {
            let parts: Vec<String> = args.iter().map(|a| a.display(heap)).collect();
            print.stdout_line(&parts.join(", "));
            Ok(Value::Null)
        }
    }
}

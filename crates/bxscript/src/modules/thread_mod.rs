//! Thread module.
//!
//! `sleep` blocks the interpreter thread. `invoke` defers a callback: a
//! worker thread optionally sleeps, then posts the callback to the event
//! loop, so the callback runs on the interpreter thread in a later drain
//! cycle.

use std::time::Duration;

use strum::Display;

use crate::{
    exception::{RunError, RunResult},
    interp::Interp,
    modules::{NativeFn, module_object},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum ThreadFn {
    #[strum(serialize = "sleep")]
    Sleep,
    #[strum(serialize = "invoke")]
    Invoke,
}

pub(crate) fn install(heap: &mut crate::heap::Heap) -> Value {
    module_object(
        heap,
        &[
            ("sleep", NativeFn::Thread(ThreadFn::Sleep)),
            ("invoke", NativeFn::Thread(ThreadFn::Invoke)),
        ],
    )
}

pub(crate) fn call(interp: &mut Interp, func: ThreadFn, args: &[Value]) -> RunResult<Value> {
    match func {
        ThreadFn::Sleep => {
            if let Some(Value::Number(ms)) = args.first()
                && *ms > 0.0
            {
                std::thread::sleep(Duration::from_millis(*ms as u64));
            }
            Ok(Value::Null)
        }
        ThreadFn::Invoke => {
            let callback = args.first().copied().unwrap_or(Value::Null);
            if !interp.is_callable(callback) {
                return Err(RunError::type_error(&mut interp.heap, "Thread.invoke expects a callback function"));
            }
            let delay = match args.get(1) {
                Some(Value::Number(ms)) if *ms > 0.0 => Some(Duration::from_millis(*ms as u64)),
                _ => None,
            };
            let event_loop = interp.event_loop.clone();
            event_loop.add_active();
            std::thread::spawn(move || {
                if let Some(delay) = delay {
                    std::thread::sleep(delay);
                }
                event_loop.enqueue(callback, vec![]);
                event_loop.remove_active();
            });
            Ok(Value::Null)
        }
    }
}

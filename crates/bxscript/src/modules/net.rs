//! Http module.
//!
//! Requests run on worker threads; the script-visible call returns Null
//! immediately and the callback receives a `{status, body, error}` response
//! object through the event loop, on the interpreter thread. The worker
//! builds the response as plain data, never as heap values.

use strum::Display;

use crate::{
    event_loop::TaskArg,
    exception::{RunError, RunResult},
    interp::Interp,
    modules::{NativeFn, module_object},
    value::Value,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub(crate) enum HttpFn {
    #[strum(serialize = "get")]
    Get,
    #[strum(serialize = "post")]
    Post,
}

pub(crate) fn install(heap: &mut crate::heap::Heap) -> Value {
    module_object(
        heap,
        &[
            ("get", NativeFn::Http(HttpFn::Get)),
            ("post", NativeFn::Http(HttpFn::Post)),
        ],
    )
}

fn response_record(status: f64, body: Option<String>, error: Option<String>) -> TaskArg {
    TaskArg::Record(vec![
        ("status".to_owned(), TaskArg::Number(status)),
        ("body".to_owned(), body.map_or(TaskArg::Null, TaskArg::Str)),
        ("error".to_owned(), error.map_or(TaskArg::Null, TaskArg::Str)),
    ])
}

/// Blocking request, executed on the worker thread.
fn perform(method: HttpFn, url: &str, body: Option<&str>) -> TaskArg {
    let request = match method {
        HttpFn::Get => ureq::get(url),
        HttpFn::Post => ureq::post(url),
    };
    let result = match (method, body) {
        (HttpFn::Post, Some(payload)) => request.send_string(payload),
        _ => request.call(),
    };
    match result {
        Ok(response) => {
            let status = f64::from(response.status());
            match response.into_string() {
                Ok(text) => response_record(status, Some(text), None),
                Err(err) => response_record(status, None, Some(format!("read failed: {err}"))),
            }
        }
        // non-2xx still delivers the body so scripts can inspect it
        Err(ureq::Error::Status(code, response)) => {
            let text = response.into_string().unwrap_or_default();
            response_record(f64::from(code), Some(text), None)
        }
        Err(err) => response_record(-1.0, None, Some(err.to_string())),
    }
}

pub(crate) fn call(interp: &mut Interp, func: HttpFn, args: &[Value]) -> RunResult<Value> {
    let Some(url) = args.first().and_then(|a| a.as_str(&interp.heap)).map(str::to_owned) else {
        return Err(RunError::type_error(
            &mut interp.heap,
            format!("Http.{func} expects a url string"),
        ));
    };
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(RunError::host_error(
            &mut interp.heap,
            format!("Http.{func}: invalid url '{url}'"),
        ));
    }
    let (body, callback_index) = match func {
        HttpFn::Get => (None, 1),
        HttpFn::Post => {
            let payload = args.get(1).copied().unwrap_or(Value::Null).display(&interp.heap);
            (Some(payload), 2)
        }
    };
    let callback = args.get(callback_index).copied().unwrap_or(Value::Null);
    if !interp.is_callable(callback) {
        return Err(RunError::type_error(
            &mut interp.heap,
            format!("Http.{func} expects a callback function"),
        ));
    }

    let event_loop = interp.event_loop.clone();
    event_loop.add_active();
    std::thread::spawn(move || {
        let response = perform(func, &url, body.as_deref());
        event_loop.enqueue(callback, vec![response]);
        event_loop.remove_active();
    });
    Ok(Value::Null)
}

//! Single-threaded event loop with thread-safe enqueue.
//!
//! Asynchronous host functions hand their callback to a worker thread; the
//! worker posts results back here and the interpreter thread drains the
//! queue. Script code therefore only ever observes cooperative scheduling:
//! a task runs to completion before the next one starts.
//!
//! Workers never touch the value heap. Anything a worker produces crosses
//! back as a [`TaskArg`] tree of plain Rust data, which the interpreter
//! converts into real values at dispatch time. Values the worker merely
//! forwards (such as the callback itself) are opaque copyable handles.

use std::{
    collections::VecDeque,
    sync::{
        Mutex,
        atomic::{AtomicI64, Ordering},
    },
};

use crate::{heap::HeapId, value::Value};

/// Argument payload for a queued task.
///
/// `Value` forwards an existing interpreter value unchanged. The remaining
/// variants carry raw data produced off-thread and become heap values when
/// the task is dispatched.
#[derive(Debug)]
pub(crate) enum TaskArg {
    Value(Value),
    Null,
    Bool(bool),
    Number(f64),
    Str(String),
    /// Becomes an Object value with the given properties in order.
    Record(Vec<(String, TaskArg)>),
}

/// A deferred callback invocation.
#[derive(Debug)]
pub(crate) struct Task {
    pub callback: Value,
    pub args: Vec<TaskArg>,
}

/// FIFO task queue plus a counter of in-flight background work.
///
/// The queue keeps the process alive while it is non-empty; the active-task
/// counter keeps it alive while workers are still running and have not yet
/// enqueued their results.
#[derive(Debug, Default)]
pub(crate) struct EventLoop {
    queue: Mutex<VecDeque<Task>>,
    active_tasks: AtomicI64,
}

impl EventLoop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a task. Callable from any thread.
    pub fn enqueue(&self, callback: Value, args: Vec<TaskArg>) {
        let mut queue = self.queue.lock().expect("event loop queue poisoned");
        queue.push_back(Task { callback, args });
    }

    /// Marks the start of background work outside the queue.
    pub fn add_active(&self) {
        self.active_tasks.fetch_add(1, Ordering::SeqCst);
    }

    /// Marks the end of background work started with [`Self::add_active`].
    pub fn remove_active(&self) {
        self.active_tasks.fetch_sub(1, Ordering::SeqCst);
    }

    /// Number of in-flight background workers.
    ///
    /// While this is positive, a worker may hold value handles that are not
    /// yet visible in the queue, so garbage collection must not run.
    pub fn active_count(&self) -> i64 {
        self.active_tasks.load(Ordering::SeqCst)
    }

    pub fn has_pending(&self) -> bool {
        !self.queue.lock().expect("event loop queue poisoned").is_empty()
    }

    /// True while there is queued or in-flight asynchronous work.
    pub fn should_keep_alive(&self) -> bool {
        self.active_tasks.load(Ordering::SeqCst) > 0 || self.has_pending()
    }

    /// Clears the queue and zeroes the counter. Test support.
    pub fn reset(&self) {
        self.queue.lock().expect("event loop queue poisoned").clear();
        self.active_tasks.store(0, Ordering::SeqCst);
    }

    /// Removes and returns every currently queued task.
    ///
    /// Tasks enqueued while the batch executes land in the emptied queue and
    /// run in the next drain cycle, which is what gives "enqueue during a
    /// task runs next cycle" ordering.
    pub fn take_batch(&self) -> VecDeque<Task> {
        let mut queue = self.queue.lock().expect("event loop queue poisoned");
        std::mem::take(&mut *queue)
    }

    /// Puts unexecuted tasks back at the front, preserving their order ahead
    /// of anything enqueued meanwhile. Used when a dispatch budget expires.
    pub fn requeue_front(&self, tasks: VecDeque<Task>) {
        let mut queue = self.queue.lock().expect("event loop queue poisoned");
        for task in tasks.into_iter().rev() {
            queue.push_front(task);
        }
    }

    /// Heap handles currently reachable from the queue. These are garbage
    /// collection roots: a queued callback and its forwarded arguments must
    /// survive until the task runs.
    pub fn queued_heap_ids(&self) -> Vec<HeapId> {
        let queue = self.queue.lock().expect("event loop queue poisoned");
        let mut ids = Vec::new();
        for task in queue.iter() {
            if let Value::Ref(id) = task.callback {
                ids.push(id);
            }
            for arg in &task.args {
                collect_arg_ids(arg, &mut ids);
            }
        }
        ids
    }
}

fn collect_arg_ids(arg: &TaskArg, ids: &mut Vec<HeapId>) {
    match arg {
        TaskArg::Value(Value::Ref(id)) => ids.push(*id),
        TaskArg::Record(fields) => {
            for (_, field) in fields {
                collect_arg_ids(field, ids);
            }
        }
        _ => {}
    }
}

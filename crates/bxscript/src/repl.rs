//! Persistent interactive session.
//!
//! A `ReplSession` keeps one interpreter alive across `execute` calls:
//! globals, prototypes, loaded modules and pending event-loop work all
//! persist from line to line. The command-line REPL is a thin loop over
//! this type, and tests drive it directly.

use std::path::PathBuf;

use crate::{
    exception::Exception,
    interp::Interp,
    io::PrintWriter,
    object::Object,
    parse,
    scope::lookup_opt,
};

pub struct ReplSession {
    interp: Interp,
    script_name: String,
}

impl Default for ReplSession {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplSession {
    #[must_use]
    pub fn new() -> Self {
        Self {
            interp: Interp::new(),
            script_name: "<repl>".to_owned(),
        }
    }

    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Overrides the base directory for module resolution.
    pub fn set_module_root(&mut self, root: impl Into<PathBuf>) {
        self.interp.module_root = Some(root.into());
    }

    /// Parses and executes one input in the persistent global scope,
    /// returning the value of its last expression statement.
    pub fn execute(&mut self, code: &str, print: &mut dyn PrintWriter) -> Result<Object, Exception> {
        let program = parse::parse(code).map_err(Exception::from)?;
        let globals = self.interp.globals;
        let result = match self.interp.eval_program(&program, globals, print) {
            Ok(value) => Object::from_value(value, &self.interp.heap),
            Err(error) => {
                let exception = self.interp.to_exception(&error);
                self.interp.collect_garbage();
                return Err(exception);
            }
        };
        self.interp.collect_garbage();
        Ok(result)
    }

    /// Dispatches the event loop once with no time budget.
    pub fn drain_events(&mut self, print: &mut dyn PrintWriter) {
        self.interp.dispatch(None, print);
        self.interp.collect_garbage();
    }

    /// Runs the event loop until no queued or background work remains.
    pub fn run_loop(&mut self, print: &mut dyn PrintWriter) {
        self.interp.run_loop(print);
    }

    /// True while asynchronous work is still pending.
    #[must_use]
    pub fn should_keep_alive(&self) -> bool {
        self.interp.event_loop.should_keep_alive()
    }

    /// Creates or overwrites a global binding with a host-provided value.
    pub fn set_global(&mut self, name: &str, value: &Object) {
        let value = value.to_value(&mut self.interp.heap);
        let globals = self.interp.globals;
        self.interp.heap.scope_mut(globals).insert(name, value);
    }

    /// Reads a global binding, for inspection from the host.
    #[must_use]
    pub fn global(&self, name: &str) -> Option<Object> {
        let value = lookup_opt(&self.interp.heap, self.interp.globals, name)?;
        Some(Object::from_value(value, &self.interp.heap))
    }

    /// Clears the event loop and the module caches. The global scope
    /// survives; this is the reset point test harnesses use between cases.
    /// Deliberately no collection here: a worker interrupted mid-flight may
    /// still enqueue its callback, which must stay valid.
    pub fn reset(&mut self) {
        self.interp.event_loop.reset();
        self.interp.module_cache.clear();
        self.interp.ast_cache.clear();
    }
}

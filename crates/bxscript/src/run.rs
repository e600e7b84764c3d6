//! One-shot execution interface.

use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    ast::Program,
    exception::{CompileError, Exception},
    interp::Interp,
    io::PrintWriter,
    object::Object,
    parse,
};

/// Parses a script up front and runs it on demand.
///
/// Parsing failures surface from [`Runner::new`] before anything executes.
/// Each `run` call uses a fresh interpreter, so a `Runner` can execute the
/// same program repeatedly without state bleeding between runs.
///
/// # Example
/// ```
/// use bxscript::{NoPrint, Runner};
///
/// let runner = Runner::new("1 + 2;", "example.bx").unwrap();
/// let result = runner.run(&mut NoPrint).unwrap();
/// assert_eq!(result, bxscript::Object::Number(3.0));
/// ```
#[derive(Debug)]
pub struct Runner {
    program: Rc<Program>,
    script_name: String,
    module_root: Option<PathBuf>,
}

impl Runner {
    /// Parses `code`. `script_name` is used in diagnostics only.
    pub fn new(code: impl Into<String>, script_name: &str) -> Result<Self, CompileError> {
        let code = code.into();
        let program = parse::parse(&code)?;
        Ok(Self {
            program: Rc::new(program),
            script_name: script_name.to_owned(),
            module_root: None,
        })
    }

    #[must_use]
    pub fn script_name(&self) -> &str {
        &self.script_name
    }

    /// Overrides the base directory for module resolution. `std.*` imports
    /// resolve under `<root>/lib`, everything else under `<root>`.
    pub fn set_module_root(&mut self, root: impl Into<PathBuf>) {
        self.module_root = Some(root.into());
    }

    /// Executes the program and returns its result, without driving the
    /// event loop. Deferred callbacks enqueued by the program stay pending.
    pub fn run(&self, print: &mut dyn PrintWriter) -> Result<Object, Exception> {
        self.run_inner(print, false)
    }

    /// Executes the program, then drives the event loop until every queued
    /// task has run and all background work has finished.
    pub fn run_to_completion(&self, print: &mut dyn PrintWriter) -> Result<Object, Exception> {
        self.run_inner(print, true)
    }

    fn run_inner(&self, print: &mut dyn PrintWriter, drive_loop: bool) -> Result<Object, Exception> {
        let mut interp = Interp::new();
        interp.module_root = self.module_root.clone();
        let globals = interp.globals;
        let result = match interp.eval_program(&self.program, globals, print) {
            Ok(value) => Object::from_value(value, &interp.heap),
            Err(error) => return Err(interp.to_exception(&error)),
        };
        if drive_loop {
            interp.run_loop(print);
        }
        Ok(result)
    }
}

//! Module loading: `import a.b.c as alias;`.
//!
//! Paths starting with `std` resolve under `<executable dir>/lib`, anything
//! else under the working directory. Both bases can be redirected with
//! `module_root` so embedders and tests get deterministic resolution. A
//! module file is parsed once and its module object cached by absolute
//! path; re-imports bind the cached object.

use std::path::PathBuf;
use std::rc::Rc;

use crate::{
    ast::Import,
    exception::{RunError, RunResult},
    heap::HeapId,
    interp::Interp,
    io::PrintWriter,
    parse,
    scope::{self, Scope},
    value::Value,
};

const MODULE_EXTENSION: &str = "bx";

impl Interp {
    /// Resolves a dotted import path to an absolute file path.
    fn resolve_module_path(&mut self, import: &Import) -> RunResult<PathBuf> {
        let dotted = import.path.join(".");
        let mut base = if import.path[0] == "std" {
            match &self.module_root {
                Some(root) => root.join("lib"),
                None => {
                    let exe_dir = std::env::current_exe()
                        .ok()
                        .and_then(|exe| exe.parent().map(PathBuf::from));
                    match exe_dir {
                        Some(dir) => dir.join("lib"),
                        None => PathBuf::from("lib"),
                    }
                }
            }
        } else {
            match &self.module_root {
                Some(root) => root.clone(),
                None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            }
        };
        let segments = if import.path[0] == "std" {
            &import.path[1..]
        } else {
            &import.path[..]
        };
        for segment in segments {
            base.push(segment);
        }
        base.set_extension(MODULE_EXTENSION);
        if !base.is_file() {
            return Err(RunError::module_error(
                &mut self.heap,
                format!("module not found: {dotted} ({})", base.display()),
            ));
        }
        Ok(base.canonicalize().unwrap_or(base))
    }

    /// Loads one import and binds its alias in `scope`.
    pub(crate) fn load_import(&mut self, import: &Import, scope: HeapId, print: &mut dyn PrintWriter) -> RunResult<()> {
        let path = self.resolve_module_path(import)?;
        if let Some(cached) = self.module_cache.get(&path).copied() {
            return scope::declare(&mut self.heap, scope, &import.alias, cached);
        }

        let dotted = import.path.join(".");
        let source = std::fs::read_to_string(&path)
            .map_err(|err| RunError::module_error(&mut self.heap, format!("cannot read module {dotted}: {err}")))?;
        let program = match self.ast_cache.get(&path) {
            Some(program) => program.clone(),
            None => {
                let program = parse::parse(&source)
                    .map_err(|err| RunError::module_error(&mut self.heap, format!("in module {dotted}: {err}")))?;
                let program = Rc::new(program);
                self.ast_cache.insert(path.clone(), program.clone());
                program
            }
        };

        // the module body runs in a child of the importing scope, so it sees
        // the standard global bindings
        let module_scope = self.heap.alloc_scope(Scope::new(Some(scope)));
        if let Err(error) = self.eval_program(&program, module_scope, print) {
            let detail = self.render_error(&error);
            return Err(RunError::module_error(
                &mut self.heap,
                format!("error in module {dotted}: {detail}"),
            ));
        }

        // every top-level binding of the module, in declaration order,
        // becomes an own property of the module object
        let exports: Vec<(String, Value)> = self
            .heap
            .scope(module_scope)
            .iter()
            .map(|(name, value)| (name.clone(), *value))
            .collect();
        let mut properties = indexmap::IndexMap::new();
        for (name, value) in exports {
            properties.insert(name, value);
        }
        let module_object = self.heap.alloc_object(properties);
        self.module_cache.insert(path, module_object);
        scope::declare(&mut self.heap, scope, &import.alias, module_object)
    }
}

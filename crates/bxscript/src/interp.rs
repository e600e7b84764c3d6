//! Tree-walking evaluator.
//!
//! The interpreter owns the heap, the prototype table, the global scope, the
//! module caches and a handle to the event loop. Statement execution
//! produces a [`Flow`]: either a normal value or one of the three unwinding
//! signals, which propagate up the statement tree until the construct that
//! consumes them (function call for Return, the innermost loop for Break and
//! Continue). Runtime errors travel separately as `Err`, so signals can
//! never leak into a scope or property store.

use std::{
    path::PathBuf,
    rc::Rc,
    sync::Arc,
    time::{Duration, Instant},
};

use ahash::AHashMap;
use smallvec::SmallVec;

use crate::{
    ast::{AssignOp, BinaryOp, Expr, FunctionDef, Program, Stmt, UnaryOp},
    event_loop::{EventLoop, TaskArg},
    exception::{ErrorKind, RunError, RunResult},
    heap::{Heap, HeapData, HeapId},
    io::PrintWriter,
    modules,
    protos::{self, Prototypes, proto_lookup},
    scope::{self, Scope, child_scope},
    types,
    value::{Function, Value, values_equal},
};

/// Script call depth limit. Crossing it raises a catchable RangeError
/// instead of overflowing the host stack.
const MAX_CALL_DEPTH: usize = 200;

/// Sleep interval between empty polls of the event loop.
const IDLE_POLL: Duration = Duration::from_millis(10);

/// Result of executing one statement.
#[derive(Debug)]
pub(crate) enum Flow {
    Value(Value),
    Return(Value),
    Break,
    Continue,
}

/// The interpreter state for one session.
pub(crate) struct Interp {
    pub heap: Heap,
    pub protos: Prototypes,
    pub globals: HeapId,
    pub event_loop: Arc<EventLoop>,
    /// Absolute module path to its cached module object.
    pub module_cache: AHashMap<PathBuf, Value>,
    /// Absolute module path to its parsed program, kept so re-imports never
    /// re-parse and function definitions stay shared.
    pub ast_cache: AHashMap<PathBuf, Rc<Program>>,
    /// Base directory for module resolution. Defaults to the working
    /// directory; embedders and tests override it.
    pub module_root: Option<PathBuf>,
    call_depth: usize,
}

impl Interp {
    /// Creates an interpreter with the kind binders and standard-library
    /// modules bound in a fresh global scope.
    pub fn new() -> Self {
        let mut heap = Heap::new();
        let protos = Prototypes::new(&mut heap);
        let globals = heap.alloc_scope(Scope::new(None));
        let mut interp = Self {
            heap,
            protos,
            globals,
            event_loop: Arc::new(EventLoop::new()),
            module_cache: AHashMap::new(),
            ast_cache: AHashMap::new(),
            module_root: None,
            call_depth: 0,
        };
        let protos = interp.protos;
        protos::install_binders(&mut interp.heap, &protos, globals).expect("global binder setup must not collide");
        modules::install_stdlib(&mut interp).expect("stdlib setup must not collide");
        interp
    }

    /// True when `value` can be the target of a call.
    pub fn is_callable(&self, value: Value) -> bool {
        matches!(value, Value::Ref(id) if matches!(self.heap.get(id), HeapData::Function(_) | HeapData::Native(_)))
    }

    fn alloc_function(&mut self, def: Rc<FunctionDef>, scope: HeapId) -> Value {
        Value::Ref(self.heap.alloc(HeapData::Function(Function { def, scope })))
    }

    // ----- program -----

    /// Runs a program in `scope`: imports first, then function hoisting,
    /// then the body. The result is the value of the last executed top-level
    /// expression statement, or Null.
    pub fn eval_program(
        &mut self,
        program: &Program,
        scope: HeapId,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        for import in &program.imports {
            self.load_import(import, scope, print)?;
        }
        for stmt in &program.body {
            if let Stmt::Function(def) = stmt {
                let name = def.name.clone().expect("function statements are named");
                let function = self.alloc_function(def.clone(), scope);
                scope::declare(&mut self.heap, scope, &name, function)?;
            }
        }
        let mut last = Value::Null;
        for stmt in &program.body {
            let flow = self.exec_stmt(stmt, scope, print)?;
            if let (Flow::Value(value), Stmt::Expr(_)) = (flow, stmt) {
                last = value;
            }
        }
        Ok(last)
    }

    // ----- statements -----

    fn exec_stmt(&mut self, stmt: &Stmt, scope: HeapId, print: &mut dyn PrintWriter) -> RunResult<Flow> {
        match stmt {
            Stmt::Block(statements) => {
                let block_scope = child_scope(&mut self.heap, scope);
                let mut last = Value::Null;
                for stmt in statements {
                    match self.exec_stmt(stmt, block_scope, print)? {
                        Flow::Value(value) => last = value,
                        signal => return Ok(signal),
                    }
                }
                Ok(Flow::Value(last))
            }
            Stmt::Expr(expr) => Ok(Flow::Value(self.eval_expr(expr, scope, print)?)),
            Stmt::Variable(declarations) => {
                for declaration in declarations {
                    self.eval_expr(declaration, scope, print)?;
                }
                Ok(Flow::Value(Value::Null))
            }
            Stmt::If { test, then, otherwise } => {
                let condition = self.eval_expr(test, scope, print)?;
                if condition.is_truthy(&self.heap) {
                    self.exec_stmt(then, scope, print)
                } else if let Some(otherwise) = otherwise {
                    self.exec_stmt(otherwise, scope, print)
                } else {
                    Ok(Flow::Value(Value::Null))
                }
            }
            Stmt::For {
                init,
                test,
                update,
                body,
            } => self.exec_for(init.as_ref(), test.as_ref(), update.as_ref(), body, scope, print),
            Stmt::ForIn { target, source, body } => self.exec_for_in(target, source, body, scope, print),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, scope, print)?,
                    None => Value::Null,
                };
                Ok(Flow::Return(value))
            }
            Stmt::Break => Ok(Flow::Break),
            Stmt::Continue => Ok(Flow::Continue),
            Stmt::Throw(expr) => {
                let value = self.eval_expr(expr, scope, print)?;
                Err(RunError::thrown(value))
            }
            Stmt::Try {
                body,
                catch_name,
                catch_body,
                finally,
            } => self.exec_try(body, catch_name, catch_body, finally.as_deref(), scope, print),
            Stmt::Function(def) => {
                // already bound when this statement was hoisted; anywhere
                // else it binds at its document position
                let name = def.name.as_deref().expect("function statements are named");
                if !self.heap.scope(scope).has(name) {
                    let function = self.alloc_function(def.clone(), scope);
                    let name = name.to_owned();
                    scope::declare(&mut self.heap, scope, &name, function)?;
                }
                Ok(Flow::Value(Value::Null))
            }
        }
    }

    fn exec_for(
        &mut self,
        init: Option<&Expr>,
        test: Option<&Expr>,
        update: Option<&Expr>,
        body: &Stmt,
        scope: HeapId,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Flow> {
        // the loop scope holds `for (let i = ...)` bindings, shared by every
        // iteration; each iteration gets its own child scope around the body
        let loop_scope = child_scope(&mut self.heap, scope);
        if let Some(init) = init {
            self.eval_expr(init, loop_scope, print)?;
        }
        loop {
            let iteration_scope = child_scope(&mut self.heap, loop_scope);
            if let Some(test) = test {
                let condition = self.eval_expr(test, iteration_scope, print)?;
                if !condition.is_truthy(&self.heap) {
                    break;
                }
            }
            match self.exec_stmt(body, iteration_scope, print)? {
                Flow::Break => break,
                Flow::Continue | Flow::Value(_) => {}
                signal @ Flow::Return(_) => return Ok(signal),
            }
            if let Some(update) = update {
                self.eval_expr(update, iteration_scope, print)?;
            }
        }
        Ok(Flow::Value(Value::Null))
    }

    fn exec_for_in(
        &mut self,
        target: &Expr,
        source: &Expr,
        body: &Stmt,
        scope: HeapId,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Flow> {
        let source_value = self.eval_expr(source, scope, print)?;
        // snapshot the iteration space up front so mutation inside the body
        // cannot invalidate it
        let keys: Vec<Value> = match source_value {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Array(elements) => (0..elements.len()).map(|i| Value::Number(i as f64)).collect(),
                HeapData::Object(properties) => {
                    let names: Vec<String> = properties.keys().cloned().collect();
                    names.into_iter().map(|name| self.heap.alloc_str(name)).collect()
                }
                _ => {
                    return Err(RunError::type_error(
                        &mut self.heap,
                        "for-in source must be an array or object",
                    ));
                }
            },
            _ => {
                return Err(RunError::type_error(
                    &mut self.heap,
                    "for-in source must be an array or object",
                ));
            }
        };
        for key in keys {
            let iteration_scope = child_scope(&mut self.heap, scope);
            match target {
                Expr::Variable { name, .. } => scope::declare(&mut self.heap, iteration_scope, name, key)?,
                Expr::Ident(name) => scope::assign(&mut self.heap, iteration_scope, name, key)?,
                Expr::Dot { object, name } => {
                    let object = self.eval_expr(object, iteration_scope, print)?;
                    self.set_member(object, name, key)?;
                }
                Expr::Bracket { object, index } => {
                    let object = self.eval_expr(object, iteration_scope, print)?;
                    let index = self.eval_expr(index, iteration_scope, print)?;
                    let index_key = index.display(&self.heap);
                    self.set_member(object, &index_key, key)?;
                }
                _ => unreachable!("parser restricts for-in targets"),
            }
            match self.exec_stmt(body, iteration_scope, print)? {
                Flow::Break => break,
                Flow::Continue | Flow::Value(_) => {}
                signal @ Flow::Return(_) => return Ok(signal),
            }
        }
        Ok(Flow::Value(Value::Null))
    }

    fn exec_try(
        &mut self,
        body: &Stmt,
        catch_name: &str,
        catch_body: &Stmt,
        finally: Option<&Stmt>,
        scope: HeapId,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Flow> {
        let mut outcome = match self.exec_stmt(body, scope, print) {
            Err(error) => {
                let catch_scope = child_scope(&mut self.heap, scope);
                scope::declare(&mut self.heap, catch_scope, catch_name, error.value)?;
                self.exec_stmt(catch_body, catch_scope, print)
            }
            ok => ok,
        };
        if let Some(finally) = finally {
            // the cleanup block runs on every path; its own signals and
            // errors replace the pending outcome
            match self.exec_stmt(finally, scope, print)? {
                Flow::Value(_) => {}
                signal => outcome = Ok(signal),
            }
        }
        outcome
    }

    // ----- expressions -----

    fn eval_expr(&mut self, expr: &Expr, scope: HeapId, print: &mut dyn PrintWriter) -> RunResult<Value> {
        match expr {
            Expr::Null => Ok(Value::Null),
            Expr::Bool(value) => Ok(Value::Bool(*value)),
            Expr::Number(text) => match text.parse::<f64>() {
                Ok(number) => Ok(Value::Number(number)),
                Err(_) => Err(RunError::type_error(
                    &mut self.heap,
                    format!("invalid numeric literal: {text}"),
                )),
            },
            Expr::Str(text) => Ok(self.heap.alloc_str(text.clone())),
            Expr::Ident(name) => scope::lookup(&mut self.heap, scope, name),
            Expr::This => scope::lookup(&mut self.heap, scope, "this"),
            Expr::Array(elements) => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    values.push(self.eval_expr(element, scope, print)?);
                }
                Ok(self.heap.alloc_array(values))
            }
            Expr::Object(entries) => {
                let mut properties = indexmap::IndexMap::new();
                for (key, value_expr) in entries {
                    let value = self.eval_expr(value_expr, scope, print)?;
                    // duplicate keys: last one wins
                    properties.insert(key.clone(), value);
                }
                Ok(self.heap.alloc_object(properties))
            }
            Expr::Function(def) => Ok(self.alloc_function(def.clone(), scope)),
            Expr::Sequence(exprs) => {
                let mut last = Value::Null;
                for expr in exprs {
                    last = self.eval_expr(expr, scope, print)?;
                }
                Ok(last)
            }
            Expr::Variable { name, init } => {
                let value = match init {
                    Some(init) => self.eval_expr(init, scope, print)?,
                    None => Value::Null,
                };
                scope::declare(&mut self.heap, scope, name, value)?;
                Ok(value)
            }
            Expr::Conditional { test, then, otherwise } => {
                let condition = self.eval_expr(test, scope, print)?;
                if condition.is_truthy(&self.heap) {
                    self.eval_expr(then, scope, print)
                } else {
                    self.eval_expr(otherwise, scope, print)
                }
            }
            Expr::Unary { op, operand, postfix } => self.eval_unary(*op, operand, *postfix, scope, print),
            Expr::Binary { op, left, right } => match op {
                BinaryOp::And => {
                    let left = self.eval_expr(left, scope, print)?;
                    if left.is_truthy(&self.heap) {
                        self.eval_expr(right, scope, print)
                    } else {
                        Ok(left)
                    }
                }
                BinaryOp::Or => {
                    let left = self.eval_expr(left, scope, print)?;
                    if left.is_truthy(&self.heap) {
                        Ok(left)
                    } else {
                        self.eval_expr(right, scope, print)
                    }
                }
                _ => {
                    let left = self.eval_expr(left, scope, print)?;
                    let right = self.eval_expr(right, scope, print)?;
                    self.apply_binary(*op, left, right)
                }
            },
            Expr::Assign { op, target, value } => self.eval_assign(*op, target, value, scope, print),
            Expr::Dot { object, name } => {
                let object = self.eval_expr(object, scope, print)?;
                self.get_member(object, name)
            }
            Expr::Bracket { object, index } => {
                let object = self.eval_expr(object, scope, print)?;
                let index = self.eval_expr(index, scope, print)?;
                let key = index.display(&self.heap);
                self.get_member(object, &key)
            }
            Expr::Call { callee, args } => {
                let callee = self.eval_expr(callee, scope, print)?;
                let mut values: SmallVec<[Value; 8]> = SmallVec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(arg, scope, print)?);
                }
                self.call_function(callee, &values, print)
            }
        }
    }

    fn eval_unary(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        postfix: bool,
        scope: HeapId,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        match op {
            UnaryOp::Not => {
                let value = self.eval_expr(operand, scope, print)?;
                Ok(Value::Bool(!value.is_truthy(&self.heap)))
            }
            UnaryOp::Plus | UnaryOp::Minus => {
                let value = self.eval_expr(operand, scope, print)?;
                let Some(number) = value.as_number() else {
                    return Err(RunError::type_error(&mut self.heap, format!("unary '{op}' requires a number")));
                };
                Ok(Value::Number(if op == UnaryOp::Minus { -number } else { number }))
            }
            UnaryOp::Increment | UnaryOp::Decrement => self.eval_step(op, operand, postfix, scope, print),
            UnaryOp::Delete => self.eval_delete(operand, scope, print),
        }
    }

    /// `++x`, `x++`, `--x`, `x--` over the three l-value shapes.
    fn eval_step(
        &mut self,
        op: UnaryOp,
        operand: &Expr,
        postfix: bool,
        scope: HeapId,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        let delta = if op == UnaryOp::Increment { 1.0 } else { -1.0 };
        let step = |heap: &mut Heap, current: Value| -> RunResult<(Value, Value)> {
            let Some(number) = current.as_number() else {
                return Err(RunError::type_error(heap, format!("'{op}' requires a numeric operand")));
            };
            Ok((current, Value::Number(number + delta)))
        };
        let (old, new) = match operand {
            Expr::Ident(name) => {
                let current = scope::lookup(&mut self.heap, scope, name)?;
                let (old, new) = step(&mut self.heap, current)?;
                scope::assign(&mut self.heap, scope, name, new)?;
                (old, new)
            }
            Expr::Dot { object, name } => {
                let object = self.eval_expr(object, scope, print)?;
                let current = self.get_member(object, name)?;
                let (old, new) = step(&mut self.heap, current)?;
                self.set_member(object, name, new)?;
                (old, new)
            }
            Expr::Bracket { object, index } => {
                let object = self.eval_expr(object, scope, print)?;
                let index = self.eval_expr(index, scope, print)?;
                let key = index.display(&self.heap);
                let current = self.get_member(object, &key)?;
                let (old, new) = step(&mut self.heap, current)?;
                self.set_member(object, &key, new)?;
                (old, new)
            }
            _ => {
                return Err(RunError::type_error(
                    &mut self.heap,
                    format!("invalid operand for '{op}'"),
                ));
            }
        };
        Ok(if postfix { old } else { new })
    }

    /// `delete o.k` and `delete o[k]`: removes an own property from an
    /// object, evaluating to whether it existed.
    fn eval_delete(&mut self, operand: &Expr, scope: HeapId, print: &mut dyn PrintWriter) -> RunResult<Value> {
        let (object, key) = match operand {
            Expr::Dot { object, name } => (self.eval_expr(object, scope, print)?, name.clone()),
            Expr::Bracket { object, index } => {
                let object = self.eval_expr(object, scope, print)?;
                let index = self.eval_expr(index, scope, print)?;
                let key = index.display(&self.heap);
                (object, key)
            }
            _ => {
                return Err(RunError::type_error(
                    &mut self.heap,
                    "delete requires a property reference",
                ));
            }
        };
        let Value::Ref(id) = object else {
            return Err(RunError::type_error(&mut self.heap, "delete target must be an object"));
        };
        if !matches!(self.heap.get(id), HeapData::Object(_)) {
            return Err(RunError::type_error(&mut self.heap, "delete target must be an object"));
        }
        let HeapData::Object(properties) = self.heap.get_mut(id) else {
            unreachable!("checked above")
        };
        Ok(Value::Bool(properties.shift_remove(&key).is_some()))
    }

    fn eval_assign(
        &mut self,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        scope: HeapId,
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        let rhs = self.eval_expr(value, scope, print)?;
        match target {
            Expr::Ident(name) => {
                let new = match op {
                    AssignOp::Assign => rhs,
                    AssignOp::Compound(binary) => {
                        let old = scope::lookup(&mut self.heap, scope, name)?;
                        self.apply_binary(binary, old, rhs)?
                    }
                };
                scope::assign(&mut self.heap, scope, name, new)?;
                Ok(new)
            }
            Expr::Dot { object, name } => {
                let object = self.eval_expr(object, scope, print)?;
                let new = match op {
                    AssignOp::Assign => rhs,
                    AssignOp::Compound(binary) => {
                        let old = self.get_member(object, name)?;
                        self.apply_binary(binary, old, rhs)?
                    }
                };
                self.set_member(object, name, new)?;
                Ok(new)
            }
            Expr::Bracket { object, index } => {
                let object = self.eval_expr(object, scope, print)?;
                let index = self.eval_expr(index, scope, print)?;
                let key = index.display(&self.heap);
                let new = match op {
                    AssignOp::Assign => rhs,
                    AssignOp::Compound(binary) => {
                        let old = self.get_member(object, &key)?;
                        self.apply_binary(binary, old, rhs)?
                    }
                };
                self.set_member(object, &key, new)?;
                Ok(new)
            }
            _ => Err(RunError::type_error(&mut self.heap, "invalid assignment target")),
        }
    }

    fn apply_binary(&mut self, op: BinaryOp, left: Value, right: Value) -> RunResult<Value> {
        if let (Value::Number(l), Value::Number(r)) = (left, right) {
            let result = match op {
                BinaryOp::Add => Value::Number(l + r),
                BinaryOp::Sub => Value::Number(l - r),
                BinaryOp::Mul => Value::Number(l * r),
                BinaryOp::Div => {
                    if r == 0.0 {
                        return Err(RunError::arithmetic_error(&mut self.heap, "division by zero"));
                    }
                    Value::Number(l / r)
                }
                BinaryOp::Rem => Value::Number(l % r),
                BinaryOp::Lt => Value::Bool(l < r),
                BinaryOp::LtEq => Value::Bool(l <= r),
                BinaryOp::Gt => Value::Bool(l > r),
                BinaryOp::GtEq => Value::Bool(l >= r),
                BinaryOp::Eq => Value::Bool(l == r),
                BinaryOp::NotEq => Value::Bool(l != r),
                BinaryOp::Shl | BinaryOp::Shr => {
                    return Err(RunError::type_error(&mut self.heap, "shift operators are reserved"));
                }
                BinaryOp::And | BinaryOp::Or => unreachable!("logical operators short-circuit in eval_expr"),
            };
            return Ok(result);
        }
        match op {
            // `+` concatenates when either side is a string
            BinaryOp::Add
                if left.as_str(&self.heap).is_some() || right.as_str(&self.heap).is_some() =>
            {
                let text = format!("{}{}", left.display(&self.heap), right.display(&self.heap));
                Ok(self.heap.alloc_str(text))
            }
            BinaryOp::Eq => Ok(Value::Bool(values_equal(&mut self.heap, left, right)?)),
            BinaryOp::NotEq => Ok(Value::Bool(!values_equal(&mut self.heap, left, right)?)),
            BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
                let message = format!(
                    "relational '{op}' requires numbers, found {} and {}",
                    left.kind(&self.heap),
                    right.kind(&self.heap)
                );
                Err(RunError::type_error(&mut self.heap, message))
            }
            _ => {
                let message = format!(
                    "unsupported operation: {} {op} {}",
                    left.kind(&self.heap),
                    right.kind(&self.heap)
                );
                Err(RunError::type_error(&mut self.heap, message))
            }
        }
    }

    // ----- member access -----

    /// Property read, dispatched on the receiver kind.
    pub fn get_member(&mut self, object: Value, key: &str) -> RunResult<Value> {
        let protos = self.protos;
        match object {
            Value::Number(number) => types::number::get(&mut self.heap, &protos, number, key),
            Value::Bool(_) => {
                if let Some(found) = proto_lookup(&mut self.heap, protos.boolean, object, key) {
                    return Ok(found);
                }
                Err(RunError::type_error(
                    &mut self.heap,
                    format!("cannot read property '{key}' of bool"),
                ))
            }
            Value::Null => Err(RunError::type_error(
                &mut self.heap,
                format!("cannot read property '{key}' of null"),
            )),
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Str(_) => types::str::get(&mut self.heap, &protos, id, key),
                HeapData::Array(_) => types::array::get(&mut self.heap, &protos, id, key),
                HeapData::Object(_) => types::object::get(&mut self.heap, &protos, id, key),
                HeapData::Function(_) => {
                    if let Some(found) = proto_lookup(&mut self.heap, protos.function, object, key) {
                        return Ok(found);
                    }
                    Err(RunError::type_error(
                        &mut self.heap,
                        format!("cannot read property '{key}' of function"),
                    ))
                }
                HeapData::Native(_) => Err(RunError::type_error(
                    &mut self.heap,
                    format!("cannot read property '{key}' of native function"),
                )),
                HeapData::Scope(_) => unreachable!("scopes are not script-visible values"),
            },
        }
    }

    /// Property write. Objects take any key; arrays only integer indices;
    /// everything else is read-only.
    pub fn set_member(&mut self, object: Value, key: &str, value: Value) -> RunResult<()> {
        match object {
            Value::Ref(id) => match self.heap.get(id) {
                HeapData::Object(_) => {
                    types::object::set(&mut self.heap, id, key, value);
                    Ok(())
                }
                HeapData::Array(_) => types::array::set(&mut self.heap, id, key, value),
                _ => {
                    let kind = object.kind(&self.heap);
                    Err(RunError::type_error(
                        &mut self.heap,
                        format!("cannot set property '{key}' on {kind}"),
                    ))
                }
            },
            _ => {
                let kind = object.kind(&self.heap);
                Err(RunError::type_error(
                    &mut self.heap,
                    format!("cannot set property '{key}' on {kind}"),
                ))
            }
        }
    }

    // ----- calls -----

    /// Invokes a callable value. Arguments bind positionally: missing ones
    /// read as Null, extras are dropped.
    pub fn call_function(&mut self, callee: Value, args: &[Value], print: &mut dyn PrintWriter) -> RunResult<Value> {
        let Value::Ref(id) = callee else {
            let display = callee.display(&self.heap);
            return Err(RunError::type_error(
                &mut self.heap,
                format!("attempted to call a non-function: {display}"),
            ));
        };
        match self.heap.get(id) {
            HeapData::Function(function) => {
                let def = function.def.clone();
                let closure = function.scope;
                self.call_script_function(&def, closure, args, print)
            }
            HeapData::Native(native) => {
                let native = *native;
                modules::call_native(self, print, native.func, native.this, args)
            }
            _ => {
                let display = callee.display(&self.heap);
                Err(RunError::type_error(
                    &mut self.heap,
                    format!("attempted to call a non-function: {display}"),
                ))
            }
        }
    }

    fn call_script_function(
        &mut self,
        def: &FunctionDef,
        closure: HeapId,
        args: &[Value],
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(RunError::range_error(&mut self.heap, "call stack overflow"));
        }
        self.call_depth += 1;
        let result = self.run_function_body(def, closure, args, print);
        self.call_depth -= 1;
        result
    }

    fn run_function_body(
        &mut self,
        def: &FunctionDef,
        closure: HeapId,
        args: &[Value],
        print: &mut dyn PrintWriter,
    ) -> RunResult<Value> {
        let call_scope = child_scope(&mut self.heap, closure);
        for (index, param) in def.params.iter().enumerate() {
            let value = args.get(index).copied().unwrap_or(Value::Null);
            scope::declare(&mut self.heap, call_scope, param, value)?;
        }
        // the body runs in its own scope so `let` may shadow parameters
        let body_scope = child_scope(&mut self.heap, call_scope);
        for stmt in &def.body {
            match self.exec_stmt(stmt, body_scope, print)? {
                Flow::Return(value) => return Ok(value),
                Flow::Value(_) => {}
                Flow::Break | Flow::Continue => {
                    unreachable!("parser rejects break/continue outside loops")
                }
            }
        }
        Ok(Value::Null)
    }

    // ----- event loop -----

    fn task_arg_to_value(&mut self, arg: TaskArg) -> Value {
        match arg {
            TaskArg::Value(value) => value,
            TaskArg::Null => Value::Null,
            TaskArg::Bool(b) => Value::Bool(b),
            TaskArg::Number(n) => Value::Number(n),
            TaskArg::Str(text) => self.heap.alloc_str(text),
            TaskArg::Record(fields) => {
                let mut properties = indexmap::IndexMap::new();
                for (name, field) in fields {
                    let value = self.task_arg_to_value(field);
                    properties.insert(name, value);
                }
                self.heap.alloc_object(properties)
            }
        }
    }

    /// Drains the queue once on the interpreter thread.
    ///
    /// With a budget, dispatch stops once the elapsed time crosses it and
    /// puts the unexecuted remainder back at the front of the queue in
    /// order. A callback that raises is logged, never propagated; later
    /// tasks still run. Returns whether any task executed.
    pub fn dispatch(&mut self, budget: Option<Duration>, print: &mut dyn PrintWriter) -> bool {
        let mut batch = self.event_loop.take_batch();
        if batch.is_empty() {
            return false;
        }
        let start = Instant::now();
        while let Some(task) = batch.pop_front() {
            let args: Vec<Value> = task.args.into_iter().map(|arg| self.task_arg_to_value(arg)).collect();
            if let Err(error) = self.call_function(task.callback, &args, print) {
                self.log_uncaught(&error, print);
            }
            if let Some(budget) = budget
                && start.elapsed() >= budget
                && !batch.is_empty()
            {
                self.event_loop.requeue_front(batch);
                return true;
            }
        }
        true
    }

    /// Runs the event loop until no queued or in-flight work remains.
    pub fn run_loop(&mut self, print: &mut dyn PrintWriter) {
        while self.event_loop.should_keep_alive() {
            let ran = self.dispatch(None, print);
            self.collect_garbage();
            if !ran && self.event_loop.should_keep_alive() {
                std::thread::sleep(IDLE_POLL);
            }
        }
    }

    /// The display form of an in-flight error, e.g. for logs.
    pub fn render_error(&self, error: &RunError) -> String {
        error.value.display(&self.heap)
    }

    /// Converts an in-flight error to its public form.
    pub fn to_exception(&self, error: &RunError) -> crate::exception::Exception {
        crate::exception::Exception::new(error.kind, self.render_error(error))
    }

    /// Mark-and-sweep over everything reachable from the global scope, the
    /// prototypes, the module cache and the event-loop queue.
    ///
    /// Only called at quiescent points; the evaluator never holds heap
    /// handles across a collection.
    pub fn collect_garbage(&mut self) {
        // a worker between add_active and enqueue may hold the only handle
        // to its callback, invisible to the root set
        if self.event_loop.active_count() > 0 {
            return;
        }
        let mut roots: Vec<HeapId> = vec![self.globals];
        roots.extend(self.protos.ids());
        roots.extend(self.module_cache.values().filter_map(|value| match value {
            Value::Ref(id) => Some(*id),
            _ => None,
        }));
        roots.extend(self.event_loop.queued_heap_ids());
        self.heap.collect(roots);
    }

    /// Errors raised at the top of an event-loop task use the UserThrow kind
    /// check to decide logging shape; everything shares this helper so tests
    /// can rely on one format.
    pub fn log_uncaught(&self, error: &RunError, print: &mut dyn PrintWriter) {
        let message = self.render_error(error);
        let prefix = if error.kind == ErrorKind::UserThrow {
            "uncaught"
        } else {
            "error"
        };
        print.stderr_line(&format!("\x1b[1;31m[{prefix}]\x1b[0m {message}"));
    }
}

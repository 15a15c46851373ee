use std::collections::HashMap;
use std::rc::Rc;

use crate::{
    ast::{
        ast::{FnBody, FunctionUnit, NodeId, Prototype},
        expressions::Expr,
        statements::Stmt,
    },
    resolver::resolver::{Location, ResolutionTable},
};

use super::{Backend, LoweringError, RuntimeError, Value};

/// Infix operators the evaluator handles natively; anything else
/// dispatches to a `binary<sym>` definition.
const BUILTIN_BINOPS: [char; 6] = ['+', '-', '*', '/', '<', '>'];

pub type NativeFn = fn(&[Value]) -> Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Handle(usize);

struct LoweredFn {
    prototype: Prototype,
    /// None for externs, which dispatch to the native library by name
    /// when called.
    body: Option<FnBody>,
    symbols: ResolutionTable,
}

enum Unit {
    Named(String),
    Anonymous(Rc<LoweredFn>),
}

/// Reference implementation of the backend contract: lowering validates
/// calls and operator uses against the resident functions, execution
/// walks the tree. Named definitions stay resident after their handle is
/// released; anonymous units are dropped with theirs.
pub struct Interp {
    functions: HashMap<String, Rc<LoweredFn>>,
    globals: HashMap<String, Value>,
    natives: HashMap<&'static str, (usize, NativeFn)>,
    units: HashMap<usize, Unit>,
    next_handle: usize,
}

impl Interp {
    pub fn new() -> Self {
        let mut natives: HashMap<&'static str, (usize, NativeFn)> = HashMap::new();
        natives.insert("sin", (1, native_sin));
        natives.insert("cos", (1, native_cos));
        natives.insert("sqrt", (1, native_sqrt));
        natives.insert("fabs", (1, native_fabs));
        natives.insert("pow", (2, native_pow));
        natives.insert("putchard", (1, native_putchard));
        natives.insert("printd", (1, native_printd));

        Interp {
            functions: HashMap::new(),
            globals: HashMap::new(),
            natives,
            units: HashMap::new(),
            next_handle: 0,
        }
    }

    pub fn global(&self, name: &str) -> Option<Value> {
        self.globals.get(name).copied()
    }

    /// Arity of a callee as the validator sees it, with the unit being
    /// lowered counting as resident so recursion checks out.
    fn callee_arity(&self, unit: &FunctionUnit, name: &str) -> Option<usize> {
        if name == unit.prototype.name {
            return Some(unit.prototype.arity());
        }
        if let Some(function) = self.functions.get(name) {
            return Some(function.prototype.arity());
        }
        self.natives.get(name).map(|(arity, _)| *arity)
    }

    fn validate_expr(&self, unit: &FunctionUnit, expr: &Expr) -> Result<(), LoweringError> {
        match expr {
            Expr::Number { .. } | Expr::Variable { .. } => Ok(()),
            Expr::Unary { op, operand, .. } => {
                let name = format!("unary{}", op);
                if self.callee_arity(unit, &name).is_none() {
                    return Err(LoweringError::new(format!("unknown unary operator '{}'", op)));
                }
                self.validate_expr(unit, operand)
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                if !BUILTIN_BINOPS.contains(op) {
                    let name = format!("binary{}", op);
                    if self.callee_arity(unit, &name).is_none() {
                        return Err(LoweringError::new(format!(
                            "invalid use of binary operator '{}'",
                            op
                        )));
                    }
                }
                self.validate_expr(unit, lhs)?;
                self.validate_expr(unit, rhs)
            }
            Expr::Call { callee, args, .. } => {
                match self.callee_arity(unit, callee) {
                    None => {
                        return Err(LoweringError::new(format!(
                            "unknown function referenced: {}",
                            callee
                        )))
                    }
                    Some(arity) if arity != args.len() => {
                        return Err(LoweringError::new(format!(
                            "incorrect number of arguments passed to {}: expected {}, got {}",
                            callee,
                            arity,
                            args.len()
                        )))
                    }
                    Some(_) => {}
                }

                for arg in args {
                    self.validate_expr(unit, arg)?;
                }
                Ok(())
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.validate_expr(unit, cond)?;
                self.validate_expr(unit, then_branch)?;
                self.validate_expr(unit, else_branch)
            }
            Expr::For {
                start, end, step, body, ..
            } => {
                self.validate_expr(unit, start)?;
                self.validate_expr(unit, end)?;
                if let Some(step) = step {
                    self.validate_expr(unit, step)?;
                }
                self.validate_expr(unit, body)
            }
            Expr::VarIn { bindings, body, .. } => {
                for binding in bindings {
                    if let Some(init) = &binding.init {
                        self.validate_expr(unit, init)?;
                    }
                }
                self.validate_expr(unit, body)
            }
        }
    }

    fn validate_stmt(&self, unit: &FunctionUnit, stmt: &Stmt) -> Result<(), LoweringError> {
        match stmt {
            Stmt::VarDecl { init, .. } => self.validate_expr(unit, init),
            Stmt::Assign { value, .. } => self.validate_expr(unit, value),
            Stmt::Return { value, .. } => self.validate_expr(unit, value),
            Stmt::Expression { expr, .. } => self.validate_expr(unit, expr),
            Stmt::Block { body, .. } => {
                for stmt in body {
                    self.validate_stmt(unit, stmt)?;
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                self.validate_expr(unit, cond)?;
                self.validate_stmt(unit, then_body)?;
                if let Some(else_body) = else_body {
                    self.validate_stmt(unit, else_body)?;
                }
                Ok(())
            }
            Stmt::For {
                start, end, step, body, ..
            } => {
                self.validate_expr(unit, start)?;
                self.validate_expr(unit, end)?;
                if let Some(step) = step {
                    self.validate_expr(unit, step)?;
                }
                self.validate_stmt(unit, body)
            }
        }
    }

    fn call_by_name(&mut self, name: &str, args: &[Value]) -> Result<Value, RuntimeError> {
        let function = match self.functions.get(name) {
            Some(function) => Rc::clone(function),
            None => {
                return Err(RuntimeError::new(format!(
                    "unresolved symbol at runtime: {}",
                    name
                )))
            }
        };

        self.call_function(&function, args)
    }

    fn call_function(&mut self, function: &LoweredFn, args: &[Value]) -> Result<Value, RuntimeError> {
        let body = match &function.body {
            Some(body) => body,
            // Extern: dispatch into the native library.
            None => {
                let name = function.prototype.name.as_str();
                return match self.natives.get(name) {
                    Some((arity, native)) if *arity == args.len() => Ok(native(args)),
                    Some((arity, _)) => Err(RuntimeError::new(format!(
                        "native {} takes {} arguments, got {}",
                        name,
                        arity,
                        args.len()
                    ))),
                    None => Err(RuntimeError::new(format!(
                        "unresolved symbol at runtime: {}",
                        name
                    ))),
                };
            }
        };

        // Arguments land in slots 0..n, matching the resolver's binding
        // order for parameters.
        let mut locals = vec![0.0; function.symbols.local_slots.max(args.len())];
        locals[..args.len()].copy_from_slice(args);

        match body {
            FnBody::Expr(expr) => self.eval_expr(function, &mut locals, expr),
            FnBody::Block(stmts) => {
                let mut last = 0.0;
                for stmt in stmts {
                    match self.eval_stmt(function, &mut locals, stmt)? {
                        Flow::Return(value) => return Ok(value),
                        Flow::Value(value) => last = value,
                    }
                }
                Ok(last)
            }
        }
    }

    fn eval_expr(
        &mut self,
        function: &LoweredFn,
        locals: &mut Vec<Value>,
        expr: &Expr,
    ) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Number { value, .. } => Ok(*value),
            Expr::Variable { id, name, .. } => match function.symbols.location_of(*id) {
                Some(Location::Local(slot)) => Ok(locals[*slot]),
                Some(Location::Global(global)) => {
                    self.globals.get(global).copied().ok_or_else(|| {
                        RuntimeError::new(format!("unresolved symbol at runtime: {}", global))
                    })
                }
                None => Err(RuntimeError::new(format!(
                    "unresolved symbol at runtime: {}",
                    name
                ))),
            },
            Expr::Unary { op, operand, .. } => {
                let value = self.eval_expr(function, locals, operand)?;
                self.call_by_name(&format!("unary{}", op), &[value])
            }
            Expr::Binary { op, lhs, rhs, .. } => {
                let left = self.eval_expr(function, locals, lhs)?;
                let right = self.eval_expr(function, locals, rhs)?;

                match op {
                    '+' => Ok(left + right),
                    '-' => Ok(left - right),
                    '*' => Ok(left * right),
                    '/' => Ok(left / right),
                    '<' => Ok(if left < right { 1.0 } else { 0.0 }),
                    '>' => Ok(if left > right { 1.0 } else { 0.0 }),
                    _ => self.call_by_name(&format!("binary{}", op), &[left, right]),
                }
            }
            Expr::Call { callee, args, .. } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval_expr(function, locals, arg)?);
                }
                self.call_by_name(callee, &values)
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                if self.eval_expr(function, locals, cond)? != 0.0 {
                    self.eval_expr(function, locals, then_branch)
                } else {
                    self.eval_expr(function, locals, else_branch)
                }
            }
            Expr::For {
                var_id,
                var_name,
                start,
                end,
                step,
                body,
                ..
            } => {
                let slot = match function.symbols.location_of(*var_id) {
                    Some(Location::Local(slot)) => *slot,
                    _ => {
                        return Err(RuntimeError::new(format!(
                            "unresolved symbol at runtime: {}",
                            var_name
                        )))
                    }
                };

                let start_value = self.eval_expr(function, locals, start)?;
                locals[slot] = start_value;

                // The body runs before the first end-condition check, and
                // the condition sees the pre-increment value.
                loop {
                    self.eval_expr(function, locals, body)?;

                    let step_value = match step {
                        Some(step) => self.eval_expr(function, locals, step)?,
                        None => 1.0,
                    };
                    let end_value = self.eval_expr(function, locals, end)?;

                    locals[slot] += step_value;

                    if end_value == 0.0 {
                        break;
                    }
                }

                Ok(0.0)
            }
            Expr::VarIn { bindings, body, .. } => {
                for binding in bindings {
                    let value = match &binding.init {
                        Some(init) => self.eval_expr(function, locals, init)?,
                        None => 0.0,
                    };
                    let slot = match function.symbols.location_of(binding.id) {
                        Some(Location::Local(slot)) => *slot,
                        _ => {
                            return Err(RuntimeError::new(format!(
                                "unresolved symbol at runtime: {}",
                                binding.name
                            )))
                        }
                    };
                    locals[slot] = value;
                }

                self.eval_expr(function, locals, body)
            }
        }
    }

    fn eval_stmt(
        &mut self,
        function: &LoweredFn,
        locals: &mut Vec<Value>,
        stmt: &Stmt,
    ) -> Result<Flow, RuntimeError> {
        match stmt {
            Stmt::VarDecl { id, name, init, .. } => {
                let value = self.eval_expr(function, locals, init)?;
                self.store(function, locals, *id, name, value)?;
                Ok(Flow::Value(value))
            }
            Stmt::Assign {
                id, name, value, ..
            } => {
                let value = self.eval_expr(function, locals, value)?;
                self.store(function, locals, *id, name, value)?;
                Ok(Flow::Value(value))
            }
            Stmt::Return { value, .. } => {
                let value = self.eval_expr(function, locals, value)?;
                Ok(Flow::Return(value))
            }
            Stmt::Expression { expr, .. } => {
                Ok(Flow::Value(self.eval_expr(function, locals, expr)?))
            }
            Stmt::Block { body, .. } => {
                let mut last = 0.0;
                for stmt in body {
                    match self.eval_stmt(function, locals, stmt)? {
                        Flow::Return(value) => return Ok(Flow::Return(value)),
                        Flow::Value(value) => last = value,
                    }
                }
                Ok(Flow::Value(last))
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                if self.eval_expr(function, locals, cond)? != 0.0 {
                    self.eval_stmt(function, locals, then_body)
                } else if let Some(else_body) = else_body {
                    self.eval_stmt(function, locals, else_body)
                } else {
                    Ok(Flow::Value(0.0))
                }
            }
            Stmt::For {
                var_id,
                var_name,
                start,
                end,
                step,
                body,
                ..
            } => {
                let slot = match function.symbols.location_of(*var_id) {
                    Some(Location::Local(slot)) => *slot,
                    _ => {
                        return Err(RuntimeError::new(format!(
                            "unresolved symbol at runtime: {}",
                            var_name
                        )))
                    }
                };

                let start_value = self.eval_expr(function, locals, start)?;
                locals[slot] = start_value;

                loop {
                    if let Flow::Return(value) = self.eval_stmt(function, locals, body)? {
                        return Ok(Flow::Return(value));
                    }

                    let step_value = match step {
                        Some(step) => self.eval_expr(function, locals, step)?,
                        None => 1.0,
                    };
                    let end_value = self.eval_expr(function, locals, end)?;

                    locals[slot] += step_value;

                    if end_value == 0.0 {
                        break;
                    }
                }

                Ok(Flow::Value(0.0))
            }
        }
    }

    fn store(
        &mut self,
        function: &LoweredFn,
        locals: &mut [Value],
        id: NodeId,
        name: &str,
        value: Value,
    ) -> Result<(), RuntimeError> {
        match function.symbols.location_of(id) {
            Some(Location::Local(slot)) => {
                locals[*slot] = value;
                Ok(())
            }
            Some(Location::Global(global)) => {
                self.globals.insert(global.clone(), value);
                Ok(())
            }
            None => Err(RuntimeError::new(format!(
                "unresolved symbol at runtime: {}",
                name
            ))),
        }
    }
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}

enum Flow {
    Value(Value),
    Return(Value),
}

impl Backend for Interp {
    type Handle = Handle;

    fn lower(
        &mut self,
        unit: &FunctionUnit,
        symbols: &ResolutionTable,
    ) -> Result<Self::Handle, LoweringError> {
        if let Some(body) = &unit.body {
            match body {
                FnBody::Expr(expr) => self.validate_expr(unit, expr)?,
                FnBody::Block(stmts) => {
                    for stmt in stmts {
                        self.validate_stmt(unit, stmt)?;
                    }
                }
            }
        }

        let lowered = Rc::new(LoweredFn {
            prototype: unit.prototype.clone(),
            body: unit.body.clone(),
            symbols: symbols.clone(),
        });

        let handle = self.next_handle;
        self.next_handle += 1;

        if unit.prototype.is_anonymous() {
            self.units.insert(handle, Unit::Anonymous(lowered));
        } else {
            let name = unit.prototype.name.clone();
            self.functions.insert(name.clone(), lowered);
            self.units.insert(handle, Unit::Named(name));
        }

        Ok(Handle(handle))
    }

    fn execute(&mut self, handle: &Self::Handle) -> Result<Value, RuntimeError> {
        let function = match self.units.get(&handle.0) {
            Some(Unit::Anonymous(function)) => Rc::clone(function),
            Some(Unit::Named(name)) => match self.functions.get(name) {
                Some(function) => Rc::clone(function),
                None => {
                    return Err(RuntimeError::new(format!(
                        "unresolved symbol at runtime: {}",
                        name
                    )))
                }
            },
            None => return Err(RuntimeError::new("stale unit handle")),
        };

        if function.prototype.arity() != 0 {
            return Err(RuntimeError::new(format!(
                "{} takes arguments and cannot run as a unit",
                function.prototype.name
            )));
        }

        self.call_function(&function, &[])
    }

    /// Frees the unit's tracking entry. Named definitions remain
    /// callable; an anonymous unit's body is dropped with its handle.
    fn release(&mut self, handle: Self::Handle) {
        self.units.remove(&handle.0);
    }
}

fn native_sin(args: &[Value]) -> Value {
    args[0].sin()
}

fn native_cos(args: &[Value]) -> Value {
    args[0].cos()
}

fn native_sqrt(args: &[Value]) -> Value {
    args[0].sqrt()
}

fn native_fabs(args: &[Value]) -> Value {
    args[0].abs()
}

fn native_pow(args: &[Value]) -> Value {
    args[0].powf(args[1])
}

/// putchard - putchar that takes a double and returns 0.
fn native_putchard(args: &[Value]) -> Value {
    eprint!("{}", args[0] as u8 as char);
    0.0
}

/// printd - prints a double followed by a newline, returning 0.
fn native_printd(args: &[Value]) -> Value {
    eprintln!("{}", args[0]);
    0.0
}

use std::collections::HashMap;

use crate::{
    ast::{
        ast::{FnBody, FunctionUnit, NodeId},
        expressions::Expr,
        statements::Stmt,
    },
    driver::state::ProgramState,
    errors::errors::{Error, ErrorImpl},
};

/// Storage location a name resolves to: a frame-local slot within the
/// current unit, or a persistent global addressed by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    Local(usize),
    Global(String),
}

/// Per-unit output of symbol resolution, keyed on parser node ids. Maps
/// every variable use and binding site to its storage location and
/// records how many local slots the lowered unit needs.
#[derive(Debug, Clone, Default)]
pub struct ResolutionTable {
    locations: HashMap<NodeId, Location>,
    pub local_slots: usize,
    /// Globals declared by this unit; the driver persists them once the
    /// unit has executed.
    pub globals_declared: Vec<String>,
}

impl ResolutionTable {
    pub fn record(&mut self, id: NodeId, location: Location) {
        self.locations.insert(id, location);
    }

    pub fn location_of(&self, id: NodeId) -> Option<&Location> {
        self.locations.get(&id)
    }
}

/// Stack of lexical frames. Binding a name pushes onto that name's
/// shadow stack; leaving a frame unbinds exactly the names the frame
/// introduced, restoring whatever they shadowed. Lookup therefore always
/// sees the innermost live binding. Slots are allocated from a per-unit
/// arena and never reused within the unit.
pub struct ScopeStack {
    frames: Vec<Frame>,
    bindings: HashMap<String, Vec<usize>>,
    next_slot: usize,
}

struct Frame {
    label: String,
    names: Vec<String>,
}

impl ScopeStack {
    pub fn new() -> Self {
        ScopeStack {
            frames: vec![],
            bindings: HashMap::new(),
            next_slot: 0,
        }
    }

    /// Pushes a new empty frame.
    pub fn enter(&mut self, label: &str) {
        self.frames.push(Frame {
            label: label.to_string(),
            names: vec![],
        });
    }

    /// Pops the innermost frame, removing the bindings it introduced.
    pub fn leave(&mut self) {
        if let Some(frame) = self.frames.pop() {
            for name in frame.names {
                if let Some(stack) = self.bindings.get_mut(&name) {
                    stack.pop();
                    if stack.is_empty() {
                        self.bindings.remove(&name);
                    }
                }
            }
        }
    }

    /// Binds a name in the innermost frame, shadowing any outer binding
    /// of the same name for the lifetime of the frame. Returns the slot
    /// allocated to the binding.
    pub fn bind(&mut self, name: &str) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;

        self.bindings
            .entry(name.to_string())
            .or_default()
            .push(slot);
        if let Some(frame) = self.frames.last_mut() {
            frame.names.push(name.to_string());
        }

        slot
    }

    /// Innermost visible binding of `name`, if any.
    pub fn resolve(&self, name: &str) -> Option<usize> {
        self.bindings.get(name).and_then(|stack| stack.last().copied())
    }

    pub fn current_scope(&self) -> Option<&str> {
        self.frames.last().map(|frame| frame.label.as_str())
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn slot_count(&self) -> usize {
        self.next_slot
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        ScopeStack::new()
    }
}

struct Resolver<'a> {
    scopes: ScopeStack,
    table: ResolutionTable,
    state: &'a ProgramState,
    /// True for wrapped top-level units, whose top-level declarations
    /// create persistent globals instead of frame locals.
    anonymous: bool,
}

/// Resolves one unit against the persistent program state: parameters
/// are bound in the function's top frame, every variable use and binding
/// site is mapped to a storage location, and callees are checked against
/// the registered prototypes.
pub fn resolve_unit(unit: &FunctionUnit, state: &ProgramState) -> Result<ResolutionTable, Error> {
    let body = match &unit.body {
        Some(body) => body,
        // Extern declarations carry no body to resolve.
        None => return Ok(ResolutionTable::default()),
    };

    let mut resolver = Resolver {
        scopes: ScopeStack::new(),
        table: ResolutionTable::default(),
        state,
        anonymous: unit.prototype.is_anonymous(),
    };

    resolver.scopes.enter(&unit.prototype.name);
    for param in &unit.prototype.params {
        resolver.scopes.bind(param);
    }

    match body {
        FnBody::Expr(expr) => resolver.resolve_expr(expr)?,
        FnBody::Block(stmts) => {
            for stmt in stmts {
                resolver.resolve_stmt(stmt, true)?;
            }
        }
    }

    resolver.scopes.leave();
    resolver.table.local_slots = resolver.scopes.slot_count();
    Ok(resolver.table)
}

impl Resolver<'_> {
    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), Error> {
        match expr {
            Expr::Number { .. } => Ok(()),
            Expr::Variable { id, name, span } => {
                let location = self.lookup(name).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::VariableNotDeclared {
                            variable: name.clone(),
                        },
                        span.start.clone(),
                    )
                })?;
                self.table.record(*id, location);
                Ok(())
            }
            // Whether `unary<sym>` / `binary<sym>` exists is checked by
            // the lowering collaborator, not here.
            Expr::Unary { operand, .. } => self.resolve_expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.resolve_expr(lhs)?;
                self.resolve_expr(rhs)
            }
            Expr::Call { callee, args, span } => {
                for arg in args {
                    self.resolve_expr(arg)?;
                }

                if !self.state.has_function(callee) {
                    return Err(Error::new(
                        ErrorImpl::FunctionNotDeclared {
                            function: callee.clone(),
                        },
                        span.start.clone(),
                    ));
                }
                Ok(())
            }
            Expr::If {
                cond,
                then_branch,
                else_branch,
                ..
            } => {
                self.resolve_expr(cond)?;
                self.resolve_expr(then_branch)?;
                self.resolve_expr(else_branch)
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
                // The start value is evaluated outside the loop scope.
                self.resolve_expr(start)?;

                self.scopes.enter("for");
                let slot = self.scopes.bind(var_name);
                self.table.record(*var_id, Location::Local(slot));

                self.resolve_expr(end)?;
                if let Some(step) = step {
                    self.resolve_expr(step)?;
                }
                self.resolve_expr(body)?;

                self.scopes.leave();
                Ok(())
            }
            Expr::VarIn { bindings, body, .. } => {
                self.scopes.enter("var");

                // Each initializer is resolved before its own name is
                // bound, so `var x = x in ...` sees the outer `x` while
                // later bindings in the list see earlier ones.
                for binding in bindings {
                    if let Some(init) = &binding.init {
                        self.resolve_expr(init)?;
                    }
                    let slot = self.scopes.bind(&binding.name);
                    self.table.record(binding.id, Location::Local(slot));
                }

                self.resolve_expr(body)?;
                self.scopes.leave();
                Ok(())
            }
        }
    }

    fn resolve_stmt(&mut self, stmt: &Stmt, at_top: bool) -> Result<(), Error> {
        match stmt {
            Stmt::VarDecl { id, name, init, .. } => {
                self.resolve_expr(init)?;

                if self.anonymous && at_top {
                    // Top-level declaration of an interactive unit:
                    // becomes a persistent global.
                    self.table.record(*id, Location::Global(name.clone()));
                    self.table.globals_declared.push(name.clone());
                } else {
                    let slot = self.scopes.bind(name);
                    self.table.record(*id, Location::Local(slot));
                }
                Ok(())
            }
            Stmt::Assign {
                id, name, value, span,
            } => {
                self.resolve_expr(value)?;

                let location = self.lookup(name).ok_or_else(|| {
                    Error::new(
                        ErrorImpl::VariableNotDeclared {
                            variable: name.clone(),
                        },
                        span.start.clone(),
                    )
                })?;
                self.table.record(*id, location);
                Ok(())
            }
            Stmt::Return { value, .. } => self.resolve_expr(value),
            Stmt::Expression { expr, .. } => self.resolve_expr(expr),
            Stmt::Block { body, .. } => {
                self.scopes.enter("block");
                for stmt in body {
                    self.resolve_stmt(stmt, false)?;
                }
                self.scopes.leave();
                Ok(())
            }
            Stmt::If {
                cond,
                then_body,
                else_body,
                ..
            } => {
                self.resolve_expr(cond)?;
                self.resolve_stmt(then_body, false)?;
                if let Some(else_body) = else_body {
                    self.resolve_stmt(else_body, false)?;
                }
                Ok(())
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
                self.resolve_expr(start)?;

                self.scopes.enter("for");
                let slot = self.scopes.bind(var_name);
                self.table.record(*var_id, Location::Local(slot));

                self.resolve_expr(end)?;
                if let Some(step) = step {
                    self.resolve_expr(step)?;
                }
                self.resolve_stmt(body, false)?;

                self.scopes.leave();
                Ok(())
            }
        }
    }

    /// Innermost local binding first, then the persistent globals.
    fn lookup(&self, name: &str) -> Option<Location> {
        if let Some(slot) = self.scopes.resolve(name) {
            return Some(Location::Local(slot));
        }

        if self.state.has_global(name) {
            return Some(Location::Global(name.to_string()));
        }

        None
    }
}

use thiserror::Error as ThisError;

use crate::{
    ast::{
        ast::{FnBody, FunctionUnit, Prototype, ANON_UNIT_NAME},
        statements::Stmt,
    },
    backend::{Backend, LoweringError, RuntimeError, Value},
    errors::errors::Error,
    get_line_at_position,
    lexer::tokens::TokenKind,
    parser::{
        lookups::{Arity, OperatorTable},
        parser::{parse_unit, ParsedUnit, Parser},
    },
    resolver::resolver::resolve_unit,
};

use super::state::ProgramState;

/// Why a unit was abandoned. Every variant is local to one unit; the
/// driver always recovers and goes on to the next one.
#[derive(ThisError, Debug)]
pub enum UnitError {
    #[error("{0}")]
    Parse(Error),
    #[error("{0}")]
    Resolution(Error),
    #[error("{0}")]
    Lowering(LoweringError),
    #[error("{0}")]
    Runtime(RuntimeError),
}

/// What one unit produced: a value for executed expressions and
/// statements, a registration for definitions and externs, or the error
/// that abandoned it.
#[derive(Debug)]
pub enum UnitOutcome {
    Evaluated(Value),
    Defined(String),
    Declared(String),
    Failed(UnitError),
}

/// The unit driver: parse one top-level construct, resolve its symbols,
/// hand it to the lowering collaborator, execute it if it is a bare
/// expression or statement, and fold the results back into persistent
/// state for the units that follow.
///
/// Per unit the driver steps Idle -> Parsing -> Resolving ->
/// Lowering+Executing -> Idle; definitions and externs skip the
/// execution sub-state. End of input observed in Idle terminates a run.
pub struct Driver<B: Backend> {
    ops: OperatorTable,
    state: ProgramState,
    backend: B,
}

impl<B: Backend> Driver<B> {
    pub fn new(backend: B) -> Self {
        Driver {
            ops: OperatorTable::new(),
            state: ProgramState::new(),
            backend,
        }
    }

    pub fn state(&self) -> &ProgramState {
        &self.state
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.ops
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Processes every unit in `source` strictly in order. Operator and
    /// prototype registrations persist across calls, so a later `run`
    /// can use functions defined by an earlier one.
    pub fn run(&mut self, source: &str) -> Vec<UnitOutcome> {
        let mut parser = Parser::new(source.to_string(), None);
        let mut outcomes = vec![];

        loop {
            // Idle: stray separators are skipped, end of input stops.
            match parser.current_token_kind() {
                TokenKind::EOF => break,
                TokenKind::Semicolon => {
                    parser.advance();
                    continue;
                }
                _ => {}
            }

            match self.run_unit(&mut parser) {
                Ok(outcome) => outcomes.push(outcome),
                Err(error) => {
                    self.report(source, &error);
                    if matches!(error, UnitError::Parse(_)) {
                        // Discard the offending lookahead token; parsing
                        // resumes at the next top-level construct.
                        parser.advance();
                    }
                    outcomes.push(UnitOutcome::Failed(error));
                }
            }
        }

        outcomes
    }

    fn run_unit(&mut self, parser: &mut Parser) -> Result<UnitOutcome, UnitError> {
        let parsed = parse_unit(parser, &self.ops).map_err(UnitError::Parse)?;

        match parsed {
            ParsedUnit::Definition(unit) => self.handle_definition(unit),
            ParsedUnit::Extern(unit) => self.handle_extern(unit),
            ParsedUnit::TopLevel(stmt) => self.handle_top_level(stmt),
        }
    }

    /// Registers a prototype and any operator table entry it carries.
    /// This happens at function-definition time, before the body is
    /// lowered, so recursive bodies resolve and the operator is usable
    /// by everything parsed afterwards. Registrations are not rolled
    /// back when the body fails; a later caller finds the prototype and
    /// the failure surfaces at its own lowering.
    fn integrate_prototype(&mut self, prototype: &Prototype) -> Result<(), UnitError> {
        if let Some(symbol) = prototype.operator_symbol() {
            let arity = if prototype.is_unary_op() {
                Arity::Unary
            } else {
                Arity::Binary
            };
            self.ops
                .define(symbol, arity, prototype.precedence)
                .map_err(UnitError::Parse)?;
        }

        self.state.register_function(prototype.clone());
        Ok(())
    }

    fn handle_definition(&mut self, unit: FunctionUnit) -> Result<UnitOutcome, UnitError> {
        self.integrate_prototype(&unit.prototype)?;

        let symbols = resolve_unit(&unit, &self.state).map_err(UnitError::Resolution)?;
        self.backend
            .lower(&unit, &symbols)
            .map_err(UnitError::Lowering)?;

        Ok(UnitOutcome::Defined(unit.prototype.name))
    }

    fn handle_extern(&mut self, unit: FunctionUnit) -> Result<UnitOutcome, UnitError> {
        self.integrate_prototype(&unit.prototype)?;

        let symbols = resolve_unit(&unit, &self.state).map_err(UnitError::Resolution)?;
        self.backend
            .lower(&unit, &symbols)
            .map_err(UnitError::Lowering)?;

        Ok(UnitOutcome::Declared(unit.prototype.name))
    }

    fn handle_top_level(&mut self, stmt: Stmt) -> Result<UnitOutcome, UnitError> {
        // Wrap the bare construct in an anonymous zero-argument
        // prototype so it lowers like any other unit.
        let span = stmt.span().clone();
        let body = match stmt {
            Stmt::Expression { expr, .. } => FnBody::Expr(expr),
            other => FnBody::Block(vec![other]),
        };
        let unit = FunctionUnit {
            prototype: Prototype::new(ANON_UNIT_NAME.to_string(), vec![]),
            body: Some(body),
            span,
        };

        let symbols = resolve_unit(&unit, &self.state).map_err(UnitError::Resolution)?;
        let globals = symbols.globals_declared.clone();

        let handle = self
            .backend
            .lower(&unit, &symbols)
            .map_err(UnitError::Lowering)?;
        let result = self.backend.execute(&handle).map_err(UnitError::Runtime);
        // The anonymous unit's backing resources go away either way;
        // persistent registrations stay.
        self.backend.release(handle);
        let value = result?;

        for name in globals {
            self.state.register_global(name);
        }

        Ok(UnitOutcome::Evaluated(value))
    }

    /// One diagnostic line per abandoned unit.
    fn report(&self, source: &str, error: &UnitError) {
        match error {
            UnitError::Parse(error) | UnitError::Resolution(error) => {
                let (line, _, _) = get_line_at_position(source, error.get_position().0);
                eprintln!("Error: {} at line {}", error, line);
            }
            UnitError::Lowering(error) => eprintln!("Error: {}", error),
            UnitError::Runtime(error) => eprintln!("Error: {}", error),
        }
    }
}

//! Unit tests for the scope resolver.
//!
//! Covers the shadow-and-restore frame discipline, slot allocation for
//! parameters and scoped bindings, global resolution against persistent
//! state, and the unresolved-name error paths.

use crate::ast::{
    ast::{FnBody, FunctionUnit, Prototype, ANON_UNIT_NAME},
    statements::Stmt,
};
use crate::driver::state::ProgramState;
use crate::parser::{
    lookups::OperatorTable,
    parser::{parse_unit, ParsedUnit, Parser},
};

use super::resolver::{resolve_unit, Location, ScopeStack};

fn parse_definition(source: &str) -> FunctionUnit {
    let mut parser = Parser::new(source.to_string(), None);
    let ops = OperatorTable::new();
    match parse_unit(&mut parser, &ops).unwrap() {
        ParsedUnit::Definition(unit) => unit,
        other => panic!("expected a definition, got {:?}", other),
    }
}

fn parse_anonymous(source: &str) -> FunctionUnit {
    let mut parser = Parser::new(source.to_string(), None);
    let ops = OperatorTable::new();
    let stmt = match parse_unit(&mut parser, &ops).unwrap() {
        ParsedUnit::TopLevel(stmt) => stmt,
        other => panic!("expected a top-level statement, got {:?}", other),
    };

    let span = stmt.span().clone();
    let body = match stmt {
        Stmt::Expression { expr, .. } => FnBody::Expr(expr),
        other => FnBody::Block(vec![other]),
    };
    FunctionUnit {
        prototype: Prototype::new(ANON_UNIT_NAME.to_string(), vec![]),
        body: Some(body),
        span,
    }
}

#[test]
fn test_scope_stack_shadow_and_restore() {
    let mut scopes = ScopeStack::new();

    scopes.enter("outer");
    let outer = scopes.bind("x");
    assert_eq!(scopes.resolve("x"), Some(outer));

    scopes.enter("inner");
    let inner = scopes.bind("x");
    assert_ne!(inner, outer);
    assert_eq!(scopes.resolve("x"), Some(inner));

    scopes.leave();
    assert_eq!(scopes.resolve("x"), Some(outer));

    scopes.leave();
    assert_eq!(scopes.resolve("x"), None);
}

#[test]
fn test_scope_stack_leave_removes_only_own_bindings() {
    let mut scopes = ScopeStack::new();

    scopes.enter("outer");
    let a = scopes.bind("a");
    scopes.enter("inner");
    scopes.bind("b");
    scopes.leave();

    assert_eq!(scopes.resolve("a"), Some(a));
    assert_eq!(scopes.resolve("b"), None);
}

#[test]
fn test_scope_stack_tracks_current_frame() {
    let mut scopes = ScopeStack::new();
    assert_eq!(scopes.current_scope(), None);

    scopes.enter("f");
    scopes.enter("for");
    assert_eq!(scopes.current_scope(), Some("for"));
    assert_eq!(scopes.depth(), 2);

    scopes.leave();
    assert_eq!(scopes.current_scope(), Some("f"));
}

#[test]
fn test_resolve_parameters_to_leading_slots() {
    let state = ProgramState::new();
    let unit = parse_definition("def add(a b) a+b;");

    let table = resolve_unit(&unit, &state).unwrap();
    assert_eq!(table.local_slots, 2);
}

#[test]
fn test_resolve_unknown_variable_fails() {
    let state = ProgramState::new();
    let unit = parse_definition("def broken(a) a + b;");

    let error = resolve_unit(&unit, &state).unwrap_err();
    assert_eq!(error.get_error_name(), "VariableNotDeclared");
}

#[test]
fn test_resolve_unknown_callee_fails() {
    let state = ProgramState::new();
    let unit = parse_anonymous("missing(1);");

    let error = resolve_unit(&unit, &state).unwrap_err();
    assert_eq!(error.get_error_name(), "FunctionNotDeclared");
}

#[test]
fn test_resolve_callee_against_persistent_state() {
    let mut state = ProgramState::new();
    state.register_function(Prototype::new(
        "add".to_string(),
        vec!["a".to_string(), "b".to_string()],
    ));

    let unit = parse_anonymous("add(2, 3);");
    assert!(resolve_unit(&unit, &state).is_ok());
}

#[test]
fn test_resolve_recursive_definition() {
    let mut state = ProgramState::new();
    let unit = parse_definition("def fib(n) if n < 2 then n else fib(n-1) + fib(n-2);");

    // The driver registers the prototype before resolving the body.
    state.register_function(unit.prototype.clone());
    assert!(resolve_unit(&unit, &state).is_ok());
}

#[test]
fn test_resolve_var_in_allocates_fresh_slot() {
    let state = ProgramState::new();
    let unit = parse_definition("def shadowed(x) var x = 2 in x;");

    let table = resolve_unit(&unit, &state).unwrap();
    // Parameter slot plus the shadowing binding's slot.
    assert_eq!(table.local_slots, 2);
}

#[test]
fn test_resolve_var_in_initializer_sees_outer_binding() {
    let state = ProgramState::new();
    // The initializer references the parameter, not the new binding.
    let unit = parse_definition("def wrap(x) var x = x + 1 in x;");

    assert!(resolve_unit(&unit, &state).is_ok());
}

#[test]
fn test_resolve_loop_variable_scoped_to_body() {
    let state = ProgramState::new();
    let unit = parse_definition("def count(n) for i = 0, i < n in i;");

    assert!(resolve_unit(&unit, &state).is_ok());

    // The induction variable is not visible outside the loop.
    let leaked = parse_definition("def leak(n) (for i = 0, i < n in i) + i;");
    assert!(resolve_unit(&leaked, &state).is_err());
}

#[test]
fn test_resolve_top_level_declaration_becomes_global() {
    let state = ProgramState::new();
    let unit = parse_anonymous("var g = 5;");

    let table = resolve_unit(&unit, &state).unwrap();
    assert_eq!(table.globals_declared, vec!["g".to_string()]);
}

#[test]
fn test_resolve_declaration_in_block_stays_local() {
    let state = ProgramState::new();
    let unit = parse_anonymous("{ var x = 1; x = 2; }");

    let table = resolve_unit(&unit, &state).unwrap();
    assert!(table.globals_declared.is_empty());
    assert_eq!(table.local_slots, 1);
}

#[test]
fn test_resolve_global_reference() {
    let mut state = ProgramState::new();
    state.register_global("g".to_string());

    let unit = parse_anonymous("g + 1;");
    let table = resolve_unit(&unit, &state).unwrap();

    // The only name resolves outside the frame stack.
    assert_eq!(table.local_slots, 0);
}

#[test]
fn test_resolve_extern_unit_is_trivial() {
    let state = ProgramState::new();
    let unit = FunctionUnit {
        prototype: Prototype::new("sin".to_string(), vec!["x".to_string()]),
        body: None,
        span: crate::Span {
            start: crate::Position::null(),
            end: crate::Position::null(),
        },
    };

    let table = resolve_unit(&unit, &state).unwrap();
    assert_eq!(table.local_slots, 0);
}

#[test]
fn test_resolve_records_local_location() {
    let state = ProgramState::new();
    let unit = parse_definition("def id(x) x;");

    let table = resolve_unit(&unit, &state).unwrap();
    match &unit.body {
        Some(FnBody::Expr(crate::ast::expressions::Expr::Variable { id, .. })) => {
            assert_eq!(table.location_of(*id), Some(&Location::Local(0)));
        }
        other => panic!("expected variable body, got {:?}", other),
    }
}

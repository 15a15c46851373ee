//! Unit tests for the parser module.
//!
//! This module contains tests for parsing various language constructs
//! including:
//! - Expression precedence and associativity
//! - Control flow expressions and statements
//! - Definitions, operator overloads, and extern declarations
//! - Statement disambiguation and error cases

use crate::ast::{
    ast::{FnBody, FunctionUnit},
    expressions::Expr,
    statements::Stmt,
};
use crate::errors::errors::Error;

use super::{
    lookups::{Arity, OperatorTable},
    parser::{parse_unit, ParsedUnit, Parser},
};

fn parse_one(source: &str) -> Result<ParsedUnit, Error> {
    let mut parser = Parser::new(source.to_string(), Some("test.zest".to_string()));
    let ops = OperatorTable::new();
    parse_unit(&mut parser, &ops)
}

fn parse_expr_stmt(source: &str) -> Expr {
    match parse_one(source).unwrap() {
        ParsedUnit::TopLevel(Stmt::Expression { expr, .. }) => expr,
        other => panic!("expected an expression statement, got {:?}", other),
    }
}

fn parse_definition(source: &str) -> FunctionUnit {
    match parse_one(source).unwrap() {
        ParsedUnit::Definition(unit) => unit,
        other => panic!("expected a definition, got {:?}", other),
    }
}

#[test]
fn test_parse_number_literal() {
    match parse_expr_stmt("42;") {
        Expr::Number { value, .. } => assert_eq!(value, 42.0),
        other => panic!("expected number, got {:?}", other),
    }
}

#[test]
fn test_parse_malformed_number_value() {
    // Greedy lexing keeps `1.2.3` as one literal; the value is the
    // longest parseable prefix.
    match parse_expr_stmt("1.2.3;") {
        Expr::Number { value, .. } => assert_eq!(value, 1.2),
        other => panic!("expected number, got {:?}", other),
    }
}

#[test]
fn test_parse_lower_then_higher_precedence_nests_right() {
    // `+` binds looser than `*`, so 1 + 2 * 3 parses as 1 + (2 * 3).
    match parse_expr_stmt("1 + 2 * 3;") {
        Expr::Binary { op: '+', rhs, .. } => match *rhs {
            Expr::Binary { op: '*', .. } => {}
            other => panic!("expected nested `*`, got {:?}", other),
        },
        other => panic!("expected `+` at the root, got {:?}", other),
    }
}

#[test]
fn test_parse_higher_then_lower_precedence_nests_left() {
    // 1 * 2 + 3 parses as (1 * 2) + 3.
    match parse_expr_stmt("1 * 2 + 3;") {
        Expr::Binary { op: '+', lhs, .. } => match *lhs {
            Expr::Binary { op: '*', .. } => {}
            other => panic!("expected nested `*`, got {:?}", other),
        },
        other => panic!("expected `+` at the root, got {:?}", other),
    }
}

#[test]
fn test_parse_equal_precedence_is_left_associative() {
    // 1 - 2 - 3 parses as (1 - 2) - 3.
    match parse_expr_stmt("1 - 2 - 3;") {
        Expr::Binary { op: '-', lhs, rhs, .. } => {
            assert!(matches!(*lhs, Expr::Binary { op: '-', .. }));
            assert!(matches!(*rhs, Expr::Number { .. }));
        }
        other => panic!("expected `-` at the root, got {:?}", other),
    }
}

#[test]
fn test_parse_parenthesized_expression() {
    // (1 + 2) * 3 keeps the grouping.
    match parse_expr_stmt("(1 + 2) * 3;") {
        Expr::Binary { op: '*', lhs, .. } => {
            assert!(matches!(*lhs, Expr::Binary { op: '+', .. }));
        }
        other => panic!("expected `*` at the root, got {:?}", other),
    }
}

#[test]
fn test_parse_undefined_operator_stops_climbing() {
    // `~` has no table entry, so `1 ~ 2;` cannot parse as one statement.
    assert!(parse_one("1 ~ 2;").is_err());
}

#[test]
fn test_parse_user_defined_operator_with_custom_table() {
    let mut parser = Parser::new("5 ~ 2;".to_string(), None);
    let mut ops = OperatorTable::new();
    ops.define('~', Arity::Binary, 15).unwrap();

    match parse_unit(&mut parser, &ops).unwrap() {
        ParsedUnit::TopLevel(Stmt::Expression {
            expr: Expr::Binary { op: '~', .. },
            ..
        }) => {}
        other => panic!("expected `~` application, got {:?}", other),
    }
}

#[test]
fn test_parse_stacked_unary_prefixes() {
    match parse_expr_stmt("!!x;") {
        Expr::Unary { op: '!', operand, .. } => {
            assert!(matches!(*operand, Expr::Unary { op: '!', .. }));
        }
        other => panic!("expected stacked unary, got {:?}", other),
    }
}

#[test]
fn test_parse_call_with_arguments() {
    match parse_expr_stmt("add(2, 3);") {
        Expr::Call { callee, args, .. } => {
            assert_eq!(callee, "add");
            assert_eq!(args.len(), 2);
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_parse_call_without_arguments() {
    match parse_expr_stmt("ready();") {
        Expr::Call { callee, args, .. } => {
            assert_eq!(callee, "ready");
            assert!(args.is_empty());
        }
        other => panic!("expected call, got {:?}", other),
    }
}

#[test]
fn test_parse_if_expression() {
    match parse_expr_stmt("if x then 1 else 2;") {
        Expr::If { .. } => {}
        other => panic!("expected if expression, got {:?}", other),
    }
}

#[test]
fn test_parse_if_expression_requires_else() {
    assert!(parse_one("if x then 1;").is_err());
}

#[test]
fn test_parse_for_expression_with_step() {
    match parse_expr_stmt("for i = 1, i < 10, 2 in i;") {
        Expr::For { var_name, step, .. } => {
            assert_eq!(var_name, "i");
            assert!(step.is_some());
        }
        other => panic!("expected for expression, got {:?}", other),
    }
}

#[test]
fn test_parse_var_in_expression() {
    // Accepted without a trailing semicolon at end of input.
    match parse_expr_stmt("var x = 1 in x + 1") {
        Expr::VarIn { bindings, .. } => {
            assert_eq!(bindings.len(), 1);
            assert_eq!(bindings[0].name, "x");
        }
        other => panic!("expected var-in expression, got {:?}", other),
    }
}

#[test]
fn test_parse_var_in_with_binding_list() {
    match parse_expr_stmt("var a = 1, b, c = 3 in a + b + c;") {
        Expr::VarIn { bindings, .. } => {
            assert_eq!(bindings.len(), 3);
            assert!(bindings[0].init.is_some());
            assert!(bindings[1].init.is_none());
        }
        other => panic!("expected var-in expression, got {:?}", other),
    }
}

#[test]
fn test_parse_var_declaration_statement() {
    match parse_one("var x = 42;").unwrap() {
        ParsedUnit::TopLevel(Stmt::VarDecl { name, .. }) => assert_eq!(name, "x"),
        other => panic!("expected declaration, got {:?}", other),
    }
}

#[test]
fn test_parse_var_declaration_requires_initializer() {
    assert!(parse_one("var x;").is_err());
}

#[test]
fn test_parse_assignment_statement() {
    match parse_one("x = 42;").unwrap() {
        ParsedUnit::TopLevel(Stmt::Assign { name, .. }) => assert_eq!(name, "x"),
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_parse_bare_identifier_is_expression_statement() {
    // Identifier not followed by `=` falls through to an expression
    // statement.
    match parse_one("x;").unwrap() {
        ParsedUnit::TopLevel(Stmt::Expression {
            expr: Expr::Variable { name, .. },
            ..
        }) => assert_eq!(name, "x"),
        other => panic!("expected expression statement, got {:?}", other),
    }
}

#[test]
fn test_parse_identifier_expression_continues_climbing() {
    match parse_one("x + 1;").unwrap() {
        ParsedUnit::TopLevel(Stmt::Expression {
            expr: Expr::Binary { op: '+', .. },
            ..
        }) => {}
        other => panic!("expected binary expression statement, got {:?}", other),
    }
}

#[test]
fn test_parse_block_statement() {
    match parse_one("{ var x = 1; x = 2; }").unwrap() {
        ParsedUnit::TopLevel(Stmt::Block { body, .. }) => assert_eq!(body.len(), 2),
        other => panic!("expected block, got {:?}", other),
    }
}

#[test]
fn test_parse_if_statement_with_optional_else() {
    match parse_one("if x { y = 1; }").unwrap() {
        ParsedUnit::TopLevel(Stmt::If { else_body, .. }) => assert!(else_body.is_none()),
        other => panic!("expected if statement, got {:?}", other),
    }

    match parse_one("if x { y = 1; } else { y = 2; }").unwrap() {
        ParsedUnit::TopLevel(Stmt::If { else_body, .. }) => assert!(else_body.is_some()),
        other => panic!("expected if statement, got {:?}", other),
    }
}

#[test]
fn test_parse_for_statement_with_block_body() {
    match parse_one("for i = 0, i < 3 in { total = total + i; }").unwrap() {
        ParsedUnit::TopLevel(Stmt::For { var_name, .. }) => assert_eq!(var_name, "i"),
        other => panic!("expected for statement, got {:?}", other),
    }
}

#[test]
fn test_parse_definition_with_expression_body() {
    let unit = parse_definition("def add(a b) a+b;");

    assert_eq!(unit.prototype.name, "add");
    assert_eq!(unit.prototype.params, vec!["a".to_string(), "b".to_string()]);
    assert!(!unit.prototype.is_operator);
    assert!(matches!(unit.body, Some(FnBody::Expr(_))));
}

#[test]
fn test_parse_definition_with_block_body() {
    let unit = parse_definition("def max(a b) { if a < b { return b; } return a; }");

    assert_eq!(unit.prototype.name, "max");
    match unit.body {
        Some(FnBody::Block(body)) => assert_eq!(body.len(), 2),
        other => panic!("expected block body, got {:?}", other),
    }
}

#[test]
fn test_parse_binary_operator_definition() {
    let unit = parse_definition("def binary~ 15 (a b) a-b;");

    assert_eq!(unit.prototype.name, "binary~");
    assert!(unit.prototype.is_binary_op());
    assert_eq!(unit.prototype.operator_symbol(), Some('~'));
    assert_eq!(unit.prototype.precedence, 15);
}

#[test]
fn test_parse_operator_definition_without_def_keyword() {
    let unit = parse_definition("binary ~ 15 (a b) a-b;");

    assert_eq!(unit.prototype.name, "binary~");
    assert_eq!(unit.prototype.precedence, 15);
}

#[test]
fn test_parse_binary_operator_default_precedence() {
    let unit = parse_definition("def binary| (a b) a+b;");

    assert_eq!(unit.prototype.precedence, 30);
}

#[test]
fn test_parse_unary_operator_definition() {
    let unit = parse_definition("def unary!(v) if v then 0 else 1;");

    assert_eq!(unit.prototype.name, "unary!");
    assert!(unit.prototype.is_unary_op());
}

#[test]
fn test_parse_operator_precedence_out_of_range() {
    assert!(parse_one("def binary~ 101 (a b) a-b;").is_err());
    assert!(parse_one("def binary~ 0 (a b) a-b;").is_err());
}

#[test]
fn test_parse_operator_arity_mismatch() {
    assert!(parse_one("def binary~ 15 (a) a;").is_err());
    assert!(parse_one("def unary! (a b) a;").is_err());
}

#[test]
fn test_parse_extern_declaration() {
    match parse_one("extern sin(x);").unwrap() {
        ParsedUnit::Extern(unit) => {
            assert_eq!(unit.prototype.name, "sin");
            assert_eq!(unit.prototype.params.len(), 1);
            assert!(unit.body.is_none());
        }
        other => panic!("expected extern, got {:?}", other),
    }
}

#[test]
fn test_parse_unclosed_paren_is_error() {
    assert!(parse_one("(1+").is_err());
}

#[test]
fn test_parse_missing_close_paren_in_call() {
    assert!(parse_one("add(1, 2;").is_err());
}

#[test]
fn test_operator_table_rejects_out_of_range_precedence() {
    let mut ops = OperatorTable::new();

    assert!(ops.define('~', Arity::Binary, 0).is_err());
    assert!(ops.define('~', Arity::Binary, 101).is_err());
    assert!(ops.define('~', Arity::Binary, 100).is_ok());
}

#[test]
fn test_operator_table_redefinition_is_last_write_wins() {
    let mut ops = OperatorTable::new();

    ops.define('^', Arity::Binary, 50).unwrap();
    ops.define('^', Arity::Binary, 70).unwrap();

    assert_eq!(ops.get('^').unwrap().precedence, 70);
}

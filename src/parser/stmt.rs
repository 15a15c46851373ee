use crate::{
    ast::{
        ast::{FnBody, FunctionUnit, NodeId, Prototype},
        expressions::{Expr, VarBinding},
        statements::Stmt,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::numeric_value, tokens::TokenKind},
    Position, Span,
};

use super::{
    expr::{parse_binary_rhs, parse_expr, parse_identifier_suffix},
    lookups::{OperatorTable, DEFAULT_BINARY_PRECEDENCE},
    parser::Parser,
};

pub fn parse_stmt(parser: &mut Parser, ops: &OperatorTable) -> Result<Stmt, Error> {
    if let Some(handler) = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied()
    {
        return handler(parser, ops);
    }

    let expr = parse_expr(parser, ops)?;
    expect_statement_end(parser)?;

    let span = expr.span().clone();
    Ok(Stmt::Expression { expr, span })
}

/// Statements end with `;`. A trailing statement at end of input is
/// accepted without one, so interactive input like `x+1` evaluates as is.
fn expect_statement_end(parser: &mut Parser) -> Result<(), Error> {
    match parser.current_token_kind() {
        TokenKind::Semicolon => {
            parser.advance();
            Ok(())
        }
        TokenKind::EOF => Ok(()),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken {
                token: parser.current_token().value.clone(),
            },
            parser.get_position(),
        )),
    }
}

/// `var` opens either a declaration statement (`var x = e;`) or a
/// scoped-binding expression (`var x = e in body`). The shared prefix is
/// parsed first and the next token decides which one this is.
pub fn parse_var_stmt(parser: &mut Parser, ops: &OperatorTable) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("expected identifier during variable declaration"),
        },
        parser.get_position(),
    );
    let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;
    let id = parser.advance_id();

    let init = if parser.current_token_kind() == TokenKind::Assign {
        parser.advance();
        Some(parse_expr(parser, ops)?)
    } else {
        None
    };

    match parser.current_token_kind() {
        TokenKind::In | TokenKind::Comma => {
            let first = VarBinding { id, name, init };
            let expr = parse_var_in_tail(parser, ops, start, first)?;
            expect_statement_end(parser)?;

            let span = expr.span().clone();
            Ok(Stmt::Expression { expr, span })
        }
        _ => {
            let init = match init {
                Some(init) => init,
                None => {
                    return Err(Error::new(
                        ErrorImpl::UnexpectedTokenDetailed {
                            token: parser.current_token().value.clone(),
                            message: String::from("expected '=' in variable declaration statement"),
                        },
                        parser.get_position(),
                    ))
                }
            };
            expect_statement_end(parser)?;

            let span = Span {
                start,
                end: parser.get_position(),
            };
            Ok(Stmt::VarDecl { id, name, init, span })
        }
    }
}

fn parse_var_in_tail(
    parser: &mut Parser,
    ops: &OperatorTable,
    start: Position,
    first: VarBinding,
) -> Result<Expr, Error> {
    let mut bindings = vec![first];

    while parser.current_token_kind() == TokenKind::Comma {
        parser.advance();

        let error = Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected identifier list after var"),
            },
            parser.get_position(),
        );
        let name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;
        let id = parser.advance_id();

        let init = if parser.current_token_kind() == TokenKind::Assign {
            parser.advance();
            Some(parse_expr(parser, ops)?)
        } else {
            None
        };

        bindings.push(VarBinding { id, name, init });
    }

    parser.expect_error(
        TokenKind::In,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected 'in' keyword after var"),
            },
            parser.get_position(),
        )),
    )?;
    let body = parse_expr(parser, ops)?;

    let span = Span {
        start,
        end: body.span().end.clone(),
    };
    Ok(Expr::VarIn {
        bindings,
        body: Box::new(body),
        span,
    })
}

pub fn parse_return_stmt(parser: &mut Parser, ops: &OperatorTable) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let value = parse_expr(parser, ops)?;

    parser.expect_error(
        TokenKind::Semicolon,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected ';' after return statement"),
            },
            parser.get_position(),
        )),
    )?;

    let span = Span {
        start,
        end: parser.get_position(),
    };
    Ok(Stmt::Return { value, span })
}

/// Parses `{ stmt* }`, returning the block's scope id, body, and span.
/// Shared between block statements and braced definition bodies.
pub fn parse_block_body(
    parser: &mut Parser,
    ops: &OperatorTable,
) -> Result<(NodeId, Vec<Stmt>, Span), Error> {
    let start = parser.expect(TokenKind::OpenCurly)?.span.start;
    let id = parser.advance_id();

    let mut body = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected '}' to close block"),
                },
                parser.get_position(),
            ));
        }
        body.push(parse_stmt(parser, ops)?);
    }

    let end = parser.advance().span.end;
    Ok((id, body, Span { start, end }))
}

pub fn parse_block_stmt(parser: &mut Parser, ops: &OperatorTable) -> Result<Stmt, Error> {
    let (id, body, span) = parse_block_body(parser, ops)?;
    Ok(Stmt::Block { id, body, span })
}

/// `then` after the condition continues as the mandatory-else expression
/// form; a brace body is the statement form with optional `else`.
pub fn parse_if_stmt(parser: &mut Parser, ops: &OperatorTable) -> Result<Stmt, Error> {
    let start = parser.advance().span.start;

    let cond = parse_expr(parser, ops)?;

    if parser.current_token_kind() == TokenKind::Then {
        parser.advance();
        let then_branch = parse_expr(parser, ops)?;

        parser.expect_error(
            TokenKind::Else,
            Some(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected 'else'"),
                },
                parser.get_position(),
            )),
        )?;
        let else_branch = parse_expr(parser, ops)?;

        let span = Span {
            start,
            end: else_branch.span().end.clone(),
        };
        let expr = Expr::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
            span: span.clone(),
        };
        expect_statement_end(parser)?;
        return Ok(Stmt::Expression { expr, span });
    }

    if parser.current_token_kind() != TokenKind::OpenCurly {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected 'then' or '{' after if condition"),
            },
            parser.get_position(),
        ));
    }

    let then_body = parse_block_stmt(parser, ops)?;

    let else_body = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        if parser.current_token_kind() == TokenKind::If {
            Some(Box::new(parse_if_stmt(parser, ops)?))
        } else {
            Some(Box::new(parse_block_stmt(parser, ops)?))
        }
    } else {
        None
    };

    let span = Span {
        start,
        end: parser.get_position(),
    };
    Ok(Stmt::If {
        cond,
        then_body: Box::new(then_body),
        else_body,
        span,
    })
}

pub fn parse_for_stmt(parser: &mut Parser, ops: &OperatorTable) -> Result<Stmt, Error> {
    let start_pos = parser.advance().span.start;

    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("expected identifier after for"),
        },
        parser.get_position(),
    );
    let var_name = parser.expect_error(TokenKind::Identifier, Some(error))?.value;
    let var_id = parser.advance_id();

    parser.expect_error(
        TokenKind::Assign,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected '=' after for"),
            },
            parser.get_position(),
        )),
    )?;
    let start = parse_expr(parser, ops)?;

    parser.expect_error(
        TokenKind::Comma,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected ',' after for start value"),
            },
            parser.get_position(),
        )),
    )?;
    let end = parse_expr(parser, ops)?;

    let step = if parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        Some(parse_expr(parser, ops)?)
    } else {
        None
    };

    parser.expect_error(
        TokenKind::In,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected 'in' after for"),
            },
            parser.get_position(),
        )),
    )?;

    if parser.current_token_kind() == TokenKind::OpenCurly {
        let body = parse_block_stmt(parser, ops)?;
        let span = Span {
            start: start_pos,
            end: parser.get_position(),
        };
        return Ok(Stmt::For {
            var_id,
            var_name,
            start,
            end,
            step,
            body: Box::new(body),
            span,
        });
    }

    let body = parse_expr(parser, ops)?;
    let span = Span {
        start: start_pos,
        end: body.span().end.clone(),
    };
    let expr = Expr::For {
        var_id,
        var_name,
        start: Box::new(start),
        end: Box::new(end),
        step: step.map(Box::new),
        body: Box::new(body),
        span: span.clone(),
    };
    expect_statement_end(parser)?;
    Ok(Stmt::Expression { expr, span })
}

/// An identifier opens either an assignment or an expression statement.
/// The identifier is consumed, then one token of lookahead decides: `=`
/// makes it an assignment, anything else re-enters expression parsing
/// with the identifier as the leading term. No backtracking.
pub fn parse_ident_stmt(parser: &mut Parser, ops: &OperatorTable) -> Result<Stmt, Error> {
    let ident = parser.advance();

    if parser.current_token_kind() == TokenKind::Assign {
        parser.advance();
        let id = parser.advance_id();
        let value = parse_expr(parser, ops)?;
        expect_statement_end(parser)?;

        let span = Span {
            start: ident.span.start,
            end: parser.get_position(),
        };
        return Ok(Stmt::Assign {
            id,
            name: ident.value,
            value,
            span,
        });
    }

    let lhs = parse_identifier_suffix(parser, ops, ident)?;
    let expr = parse_binary_rhs(parser, ops, 0, lhs)?;
    expect_statement_end(parser)?;

    let span = expr.span().clone();
    Ok(Stmt::Expression { expr, span })
}

/// `def PROTOTYPE BODY` where the body is a single expression or a
/// braced statement list. Operator definitions may drop the `def` and
/// start with `binary`/`unary` directly.
pub fn parse_definition(parser: &mut Parser, ops: &OperatorTable) -> Result<FunctionUnit, Error> {
    let start = parser.get_position();
    if parser.current_token_kind() == TokenKind::Def {
        parser.advance();
    }

    let prototype = parse_prototype(parser)?;

    let body = if parser.current_token_kind() == TokenKind::OpenCurly {
        let (_, body, _) = parse_block_body(parser, ops)?;
        FnBody::Block(body)
    } else {
        FnBody::Expr(parse_expr(parser, ops)?)
    };

    let span = Span {
        start,
        end: parser.get_position(),
    };
    Ok(FunctionUnit {
        prototype,
        body: Some(body),
        span,
    })
}

pub fn parse_extern(parser: &mut Parser) -> Result<FunctionUnit, Error> {
    let start = parser.advance().span.start;

    let prototype = parse_prototype(parser)?;

    let span = Span {
        start,
        end: parser.get_position(),
    };
    Ok(FunctionUnit {
        prototype,
        body: None,
        span,
    })
}

/// A prototype is an ordinary name, `unary<sym>`, or
/// `binary<sym> [precedence]`, followed by a parenthesized list of
/// whitespace-separated parameter names. Operator forms have their arity
/// checked here; precedence is validated against [1,100] and defaults to
/// 30 when omitted.
pub fn parse_prototype(parser: &mut Parser) -> Result<Prototype, Error> {
    let name;
    let mut kind: usize = 0; // 0 = identifier, 1 = unary, 2 = binary
    let mut precedence = DEFAULT_BINARY_PRECEDENCE;

    match parser.current_token_kind() {
        TokenKind::Identifier => {
            name = parser.advance().value;
        }
        TokenKind::Unary => {
            parser.advance();
            let symbol = expect_operator_symbol(parser)?;
            name = format!("unary{}", symbol);
            kind = 1;
        }
        TokenKind::Binary => {
            parser.advance();
            let symbol = expect_operator_symbol(parser)?;
            name = format!("binary{}", symbol);
            kind = 2;

            if parser.current_token_kind() == TokenKind::Number {
                let token = parser.advance();
                let value = numeric_value(&token.value);
                if !(1.0..=100.0).contains(&value) {
                    return Err(Error::new(
                        ErrorImpl::InvalidPrecedence { value },
                        token.span.start,
                    ));
                }
                precedence = value as i32;
            }
        }
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected function name in prototype"),
                },
                parser.get_position(),
            ))
        }
    }

    parser.expect_error(
        TokenKind::OpenParen,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected '(' in prototype"),
            },
            parser.get_position(),
        )),
    )?;

    let mut params = vec![];
    while parser.current_token_kind() == TokenKind::Identifier {
        params.push(parser.advance().value);
    }

    parser.expect_error(
        TokenKind::CloseParen,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected ')' in prototype"),
            },
            parser.get_position(),
        )),
    )?;

    if kind != 0 && params.len() != kind {
        return Err(Error::new(
            ErrorImpl::InvalidOperandCount {
                name,
                expected: kind,
                received: params.len(),
            },
            parser.get_position(),
        ));
    }

    if kind != 0 {
        Ok(Prototype::new_operator(name, params, precedence))
    } else {
        Ok(Prototype::new(name, params))
    }
}

fn expect_operator_symbol(parser: &mut Parser) -> Result<char, Error> {
    match parser.current_token().op_symbol() {
        Some(symbol) => {
            parser.advance();
            Ok(symbol)
        }
        None => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected operator symbol"),
            },
            parser.get_position(),
        )),
    }
}

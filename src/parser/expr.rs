use crate::{
    ast::expressions::{Expr, VarBinding},
    errors::errors::{Error, ErrorImpl},
    lexer::{lexer::numeric_value, tokens::{Token, TokenKind}},
    Span,
};

use super::{lookups::OperatorTable, parser::Parser};

/// Parses a full expression: a unary/primary term followed by any infix
/// operators the table knows about.
pub fn parse_expr(parser: &mut Parser, ops: &OperatorTable) -> Result<Expr, Error> {
    let lhs = parse_unary(parser, ops)?;
    parse_binary_rhs(parser, ops, 0, lhs)
}

/// Precedence climbing. Consumes infix operators binding at least as
/// tightly as `min_precedence`; recurses with a raised floor whenever the
/// operator after the right-hand side binds tighter. Left associativity
/// falls out of the loop structure.
pub fn parse_binary_rhs(
    parser: &mut Parser,
    ops: &OperatorTable,
    min_precedence: i32,
    mut lhs: Expr,
) -> Result<Expr, Error> {
    loop {
        let token_precedence = ops.precedence_of(parser.current_token());

        // Non-operators come back as -1, so this is also the exit at the
        // end of the expression.
        if token_precedence < min_precedence {
            return Ok(lhs);
        }

        let op_token = parser.advance();
        let op = op_token.op_symbol().unwrap();

        let mut rhs = parse_unary(parser, ops)?;

        let next_precedence = ops.precedence_of(parser.current_token());
        if token_precedence < next_precedence {
            rhs = parse_binary_rhs(parser, ops, token_precedence + 1, rhs)?;
        }

        let span = Span {
            start: lhs.span().start.clone(),
            end: rhs.span().end.clone(),
        };
        lhs = Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
            span,
        };
    }
}

/// A prefix operator application, or a primary term. Any operator-class
/// token can stack here; whether `unary<sym>` exists is the lowering
/// collaborator's concern.
pub fn parse_unary(parser: &mut Parser, ops: &OperatorTable) -> Result<Expr, Error> {
    if parser.current_token_kind() != TokenKind::Op {
        return parse_primary(parser, ops);
    }

    let op_token = parser.advance();
    let op = op_token.op_symbol().unwrap();
    let operand = parse_unary(parser, ops)?;

    let span = Span {
        start: op_token.span.start.clone(),
        end: operand.span().end.clone(),
    };
    Ok(Expr::Unary {
        op,
        operand: Box::new(operand),
        span,
    })
}

pub fn parse_primary(parser: &mut Parser, ops: &OperatorTable) -> Result<Expr, Error> {
    match parser.current_token_kind() {
        TokenKind::Number => {
            let token = parser.advance();
            Ok(Expr::Number {
                value: numeric_value(&token.value),
                span: token.span,
            })
        }
        TokenKind::Identifier => {
            let token = parser.advance();
            parse_identifier_suffix(parser, ops, token)
        }
        TokenKind::OpenParen => {
            parser.advance();
            let expr = parse_expr(parser, ops)?;
            parser.expect_error(
                TokenKind::CloseParen,
                Some(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: parser.current_token().value.clone(),
                        message: String::from("expected ')' after expression"),
                    },
                    parser.get_position(),
                )),
            )?;
            Ok(expr)
        }
        TokenKind::If => parse_if_expr(parser, ops),
        TokenKind::For => parse_for_expr(parser, ops),
        TokenKind::Var => parse_var_expr(parser, ops),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected an expression"),
            },
            parser.get_position(),
        )),
    }
}

/// Continues an expression whose leading identifier token has already
/// been consumed: a call if `(` follows immediately, a variable
/// reference otherwise. Shared with the statement parser, which eats the
/// identifier while disambiguating assignments.
pub fn parse_identifier_suffix(
    parser: &mut Parser,
    ops: &OperatorTable,
    ident: Token,
) -> Result<Expr, Error> {
    if parser.current_token_kind() != TokenKind::OpenParen {
        let id = parser.advance_id();
        return Ok(Expr::Variable {
            id,
            name: ident.value,
            span: ident.span,
        });
    }

    parser.advance();
    let mut args = vec![];

    if parser.current_token_kind() != TokenKind::CloseParen {
        loop {
            args.push(parse_expr(parser, ops)?);

            if parser.current_token_kind() == TokenKind::CloseParen {
                break;
            }

            parser.expect_error(
                TokenKind::Comma,
                Some(Error::new(
                    ErrorImpl::UnexpectedTokenDetailed {
                        token: parser.current_token().value.clone(),
                        message: String::from("expected ')' or ',' in argument list"),
                    },
                    parser.get_position(),
                )),
            )?;
        }
    }

    let close = parser.advance();
    Ok(Expr::Call {
        callee: ident.value,
        args,
        span: Span {
            start: ident.span.start,
            end: close.span.end,
        },
    })
}

/// `if COND then THEN else ELSE` - both branches are mandatory in the
/// expression form.
fn parse_if_expr(parser: &mut Parser, ops: &OperatorTable) -> Result<Expr, Error> {
    let start = parser.advance().span.start;

    let cond = parse_expr(parser, ops)?;

    parser.expect_error(
        TokenKind::Then,
        Some(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected 'then' after if condition"),
            },
            parser.get_position(),
        )),
    )?;
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
    Ok(Expr::If {
        cond: Box::new(cond),
        then_branch: Box::new(then_branch),
        else_branch: Box::new(else_branch),
        span,
    })
}

/// `for id = start, end[, step] in BODY`
fn parse_for_expr(parser: &mut Parser, ops: &OperatorTable) -> Result<Expr, Error> {
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

    // The step value is optional.
    let step = if parser.current_token_kind() == TokenKind::Comma {
        parser.advance();
        Some(Box::new(parse_expr(parser, ops)?))
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
    let body = parse_expr(parser, ops)?;

    let span = Span {
        start: start_pos,
        end: body.span().end.clone(),
    };
    Ok(Expr::For {
        var_id,
        var_name,
        start: Box::new(start),
        end: Box::new(end),
        step,
        body: Box::new(body),
        span,
    })
}

/// `var id[=init][, ...] in BODY` - scoped local bindings.
pub fn parse_var_expr(parser: &mut Parser, ops: &OperatorTable) -> Result<Expr, Error> {
    let start = parser.advance().span.start;

    let mut bindings = vec![];
    loop {
        let error = Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected identifier after var"),
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

        if parser.current_token_kind() != TokenKind::Comma {
            break;
        }
        parser.advance();
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

//! Parser implementation for building the Abstract Syntax Tree.
//!
//! This module contains the main Parser struct and the top-level unit
//! entry point. Expression parsing uses precedence climbing against the
//! mutable operator table; statement parsing dispatches through a
//! handler lookup table keyed on the lookahead token.
//!
//! The parser holds exactly one lookahead token and pulls further tokens
//! lazily from the lexer as they are consumed.

use std::collections::HashMap;

use crate::{
    ast::ast::{FunctionUnit, NodeId},
    ast::statements::Stmt,
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::Lexer,
        tokens::{Token, TokenKind},
    },
    Position,
};

use super::{
    lookups::{create_stmt_lookups, OperatorTable, StmtHandler, StmtLookup},
    stmt::{parse_definition, parse_extern, parse_stmt},
};

/// The main parser structure that maintains parsing state.
///
/// Owns the lexer and the single lookahead token, the statement handler
/// lookup table, and the node id counter used to key symbol resolution.
pub struct Parser {
    /// Token source, consulted one token at a time
    lexer: Lexer,
    /// The lookahead token
    current: Token,
    /// Lookup table for statement parsing handlers
    stmt_lookup: StmtLookup,
    /// Counter for generating unique node ids
    current_id: NodeId,
}

impl Parser {
    pub fn new(source: String, file: Option<String>) -> Self {
        let mut lexer = Lexer::new(source, file);
        let current = lexer.next_token();

        let mut parser = Parser {
            lexer,
            current,
            stmt_lookup: HashMap::new(),
            current_id: 0,
        };
        create_stmt_lookups(&mut parser);

        parser
    }

    /// Returns the lookahead token without consuming it.
    pub fn current_token(&self) -> &Token {
        &self.current
    }

    /// Returns the kind of the lookahead token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current.kind
    }

    /// Consumes the lookahead token and pulls the next one from the
    /// lexer. Returns the consumed token.
    pub fn advance(&mut self) -> Token {
        let next = self.lexer.next_token();
        std::mem::replace(&mut self.current, next)
    }

    /// Expects a token of the specified kind, with optional custom error.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: Option<Error>,
    ) -> Result<Token, Error> {
        if self.current.kind != expected_kind {
            match error {
                Some(error) => Err(error),
                None => Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: self.current.value.clone(),
                    },
                    self.current.span.start.clone(),
                )),
            }
        } else {
            Ok(self.advance())
        }
    }

    /// Expects a token of the specified kind with default error message.
    pub fn expect(&mut self, expected_kind: TokenKind) -> Result<Token, Error> {
        self.expect_error(expected_kind, None)
    }

    /// Returns true while the lookahead token is not EOF.
    pub fn has_tokens(&self) -> bool {
        self.current.kind != TokenKind::EOF
    }

    pub fn get_stmt_lookup(&self) -> &StmtLookup {
        &self.stmt_lookup
    }

    /// Registers a statement handler for a token.
    pub fn stmt(&mut self, kind: TokenKind, stmt_fn: StmtHandler) {
        self.stmt_lookup.insert(kind, stmt_fn);
    }

    /// Advances the internal node id counter and returns the previous
    /// value.
    pub fn advance_id(&mut self) -> NodeId {
        let id = self.current_id;
        self.current_id += 1;
        id
    }

    /// Source position of the lookahead token.
    pub fn get_position(&self) -> Position {
        self.current.span.start.clone()
    }
}

/// One parsed top-level construct, before resolution and lowering.
#[derive(Debug)]
pub enum ParsedUnit {
    Definition(FunctionUnit),
    Extern(FunctionUnit),
    TopLevel(Stmt),
}

/// Parses one top-level unit: a `def`, an `extern`, or a bare
/// statement/expression. This is the single entry point the unit driver
/// feeds from; it does not recover from errors itself.
pub fn parse_unit(parser: &mut Parser, ops: &OperatorTable) -> Result<ParsedUnit, Error> {
    match parser.current_token_kind() {
        TokenKind::Def | TokenKind::Binary | TokenKind::Unary => {
            Ok(ParsedUnit::Definition(parse_definition(parser, ops)?))
        }
        TokenKind::Extern => Ok(ParsedUnit::Extern(parse_extern(parser)?)),
        _ => Ok(ParsedUnit::TopLevel(parse_stmt(parser, ops)?)),
    }
}

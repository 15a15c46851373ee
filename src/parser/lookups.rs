use std::collections::HashMap;

use crate::{
    ast::statements::Stmt,
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    Position,
};

use super::{parser::Parser, stmt::*};

/// Precedence given to `binary` definitions that omit an explicit one.
pub const DEFAULT_BINARY_PRECEDENCE: i32 = 30;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Arity {
    Unary,
    Binary,
}

#[derive(Clone, Copy, Debug)]
pub struct OperatorEntry {
    pub arity: Arity,
    pub precedence: i32,
}

/// Mutable operator precedence table consulted by the expression parser.
///
/// Seeded with the built-in binary operators; `binary`/`unary`
/// definitions insert or overwrite entries at function-definition time.
/// Redefinition is last-write-wins. A symbol without a binary entry is
/// not an infix operator, which the parser observes as precedence -1.
pub struct OperatorTable {
    entries: HashMap<char, OperatorEntry>,
}

impl OperatorTable {
    pub fn new() -> Self {
        let mut table = OperatorTable {
            entries: HashMap::new(),
        };

        // Built-in seeding. No built-in unary operators exist; prefix
        // operators always come from `unary` definitions.
        for (symbol, precedence) in [('<', 10), ('>', 10), ('+', 20), ('-', 30), ('*', 40), ('/', 40)] {
            table.entries.insert(
                symbol,
                OperatorEntry {
                    arity: Arity::Binary,
                    precedence,
                },
            );
        }

        table
    }

    /// Inserts or overwrites an entry. Precedence must be in [1,100].
    pub fn define(&mut self, symbol: char, arity: Arity, precedence: i32) -> Result<(), Error> {
        if !(1..=100).contains(&precedence) {
            return Err(Error::new(
                ErrorImpl::InvalidPrecedence {
                    value: precedence as f64,
                },
                Position::null(),
            ));
        }

        self.entries.insert(symbol, OperatorEntry { arity, precedence });
        Ok(())
    }

    /// Infix binding power of a token; -1 for anything that is not a
    /// defined binary operator. Never fails.
    pub fn precedence_of(&self, token: &Token) -> i32 {
        let symbol = match token.op_symbol() {
            Some(symbol) => symbol,
            None => return -1,
        };

        match self.entries.get(&symbol) {
            Some(entry) if entry.arity == Arity::Binary && entry.precedence > 0 => entry.precedence,
            _ => -1,
        }
    }

    pub fn get(&self, symbol: char) -> Option<&OperatorEntry> {
        self.entries.get(&symbol)
    }
}

impl Default for OperatorTable {
    fn default() -> Self {
        OperatorTable::new()
    }
}

pub type StmtHandler = fn(&mut Parser, &OperatorTable) -> Result<Stmt, Error>;

pub fn create_stmt_lookups(parser: &mut Parser) {
    parser.stmt(TokenKind::Var, parse_var_stmt);
    parser.stmt(TokenKind::Return, parse_return_stmt);
    parser.stmt(TokenKind::OpenCurly, parse_block_stmt);
    parser.stmt(TokenKind::If, parse_if_stmt);
    parser.stmt(TokenKind::For, parse_for_stmt);
    parser.stmt(TokenKind::Identifier, parse_ident_stmt);
}

// Lookup table inside parser struct, so it's easier
pub type StmtLookup = HashMap<TokenKind, StmtHandler>;

use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

/// A rule handler consumes the matched text and either produces a token or
/// returns None for skipped input (whitespace, comments).
pub type RuleHandler = fn(&mut Lexer, &str) -> Option<Token>;

pub struct LexRule {
    regex: Regex,
    handler: RuleHandler,
}

lazy_static! {
    static ref RULES: Vec<LexRule> = vec![
        LexRule { regex: Regex::new("[a-zA-Z][a-zA-Z0-9]*").unwrap(), handler: symbol_handler },
        LexRule { regex: Regex::new("[0-9.]+").unwrap(), handler: number_handler },
        LexRule { regex: Regex::new("\\s+").unwrap(), handler: skip_handler },
        LexRule { regex: Regex::new("#[^\n]*").unwrap(), handler: skip_handler },
        LexRule { regex: Regex::new("\\(").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(") },
        LexRule { regex: Regex::new("\\)").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")") },
        LexRule { regex: Regex::new("\\{").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{") },
        LexRule { regex: Regex::new("\\}").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}") },
        LexRule { regex: Regex::new(",").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Comma, ",") },
        LexRule { regex: Regex::new(";").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";") },
        LexRule { regex: Regex::new("=").unwrap(), handler: MK_DEFAULT_HANDLER!(TokenKind::Assign, "=") },
    ];
}

/// Lazy tokenizer. Owns the character cursor exclusively; each call to
/// [`Lexer::next_token`] consumes exactly the characters of one token.
pub struct Lexer {
    source: String,
    pos: usize,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            source,
            pos: 0,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn file(&self) -> Rc<String> {
        Rc::clone(&self.file)
    }

    pub fn position(&self) -> Position {
        Position(self.pos as u32, Rc::clone(&self.file))
    }

    pub fn span_here(&self, len: usize) -> Span {
        Span {
            start: Position(self.pos as u32, Rc::clone(&self.file)),
            end: Position((self.pos + len) as u32, Rc::clone(&self.file)),
        }
    }

    /// Produces the next token. Never fails: input matched by no rule is
    /// returned verbatim as a one-character operator token, and end of
    /// input yields the EOF token idempotently.
    pub fn next_token(&mut self) -> Token {
        'scan: loop {
            if self.at_eof() {
                return MK_TOKEN!(TokenKind::EOF, String::from("EOF"), self.span_here(0));
            }

            for rule in RULES.iter() {
                let matched = match rule.regex.find(self.remainder()) {
                    Some(found) if found.start() == 0 => found.as_str().to_string(),
                    _ => continue,
                };

                match (rule.handler)(self, &matched) {
                    Some(token) => return token,
                    None => continue 'scan,
                }
            }

            let ch = self.remainder().chars().next().unwrap();
            let span = self.span_here(ch.len_utf8());
            self.advance_n(ch.len_utf8());
            return MK_TOKEN!(TokenKind::Op, ch.to_string(), span);
        }
    }
}

fn symbol_handler(lexer: &mut Lexer, matched: &str) -> Option<Token> {
    let span = lexer.span_here(matched.len());
    lexer.advance_n(matched.len());

    if let Some(kind) = RESERVED_LOOKUP.get(matched) {
        Some(MK_TOKEN!(*kind, String::from(matched), span))
    } else {
        Some(MK_TOKEN!(TokenKind::Identifier, String::from(matched), span))
    }
}

fn number_handler(lexer: &mut Lexer, matched: &str) -> Option<Token> {
    let span = lexer.span_here(matched.len());
    lexer.advance_n(matched.len());
    Some(MK_TOKEN!(TokenKind::Number, String::from(matched), span))
}

fn skip_handler(lexer: &mut Lexer, matched: &str) -> Option<Token> {
    lexer.advance_n(matched.len());
    None
}

/// Numeric value of a number token's text. Greedy lexing accepts runs such
/// as `1.2.3`; the value is the longest parseable prefix, zero if none.
pub fn numeric_value(text: &str) -> f64 {
    for end in (1..=text.len()).rev() {
        if let Ok(value) = text[..end].parse::<f64>() {
            return value;
        }
    }

    0.0
}

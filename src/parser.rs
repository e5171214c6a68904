//! Recursive-descent parser for the token grammar.
//!
//! Grammar: `token := [NOW] { modifier | snap }` with
//! `modifier := ("+"|"-") [NUMBER] MODIFIER` and `snap := ("/"|"@") MODIFIER`.
//!
//! The parser never fails loudly: it accumulates human-readable messages in
//! its error list and stops at the first one (uniform hard-stop — a node is
//! never emitted from an invalid unit). Converting accumulated errors into a
//! caller-visible rejection is the evaluator's job.

use std::mem;

use crate::ast::{AMOUNT_UNIT_CODES, Expr, ModifierUnit, SNAP_UNIT_CODES, Sign, SnapEdge, SnapUnit};
use crate::lexer::{Lexer, Token, TokenKind};

/// Ordered node sequence plus accumulated diagnostics. Empty `nodes` or
/// non-empty `errors` means the input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub nodes: Vec<Expr>,
    pub errors: Vec<String>,
}

impl ParseResult {
    pub fn is_rejected(&self) -> bool {
        self.nodes.is_empty() || !self.errors.is_empty()
    }
}

/// Tokenize and parse `input` in one step.
pub fn parse_token(input: &str) -> ParseResult {
    Parser::new(Lexer::new(input)).parse()
}

pub struct Parser {
    lexer: Lexer,
    current: Token,
    peek: Token,
    errors: Vec<String>,
}

impl Parser {
    pub fn new(mut lexer: Lexer) -> Self {
        let current = lexer.next_token();
        let peek = lexer.next_token();
        Parser { lexer, current, peek, errors: Vec::new() }
    }

    fn bump(&mut self) {
        self.current = mem::replace(&mut self.peek, self.lexer.next_token());
    }

    /// Consume the whole token stream. Loops over expression-start tokens
    /// until `End`; any recorded error terminates the loop immediately. A
    /// non-operator token in start position (a stray number or bare word)
    /// terminates the loop silently, matching the historical grammar.
    pub fn parse(mut self) -> ParseResult {
        let mut nodes = Vec::new();
        loop {
            let parsed = match self.current.kind {
                TokenKind::End => break,
                TokenKind::Now => Some(Expr::Now),
                TokenKind::Plus | TokenKind::Minus => self.parse_modifier(),
                TokenKind::Slash | TokenKind::At => self.parse_snap(),
                TokenKind::Illegal => {
                    self.errors.push(format!("illegal character \"{}\"", self.current.literal));
                    None
                }
                TokenKind::Number | TokenKind::Modifier => None,
            };
            match parsed {
                Some(node) => {
                    nodes.push(node);
                    self.bump();
                }
                None => break,
            }
        }
        ParseResult { nodes, errors: self.errors }
    }

    /// `("+"|"-") [NUMBER] MODIFIER`, amount defaulting to 1.
    fn parse_modifier(&mut self) -> Option<Expr> {
        let sign = if self.current.kind == TokenKind::Plus { Sign::Plus } else { Sign::Minus };
        self.bump();

        let mut amount = 1i64;
        if self.current.kind == TokenKind::Number {
            match self.current.literal.parse::<i64>() {
                Ok(value) => amount = value,
                Err(_) => {
                    self.errors.push(format!("amount \"{}\" is out of range", self.current.literal));
                    return None;
                }
            }
            self.bump();
        }

        if self.current.kind != TokenKind::Modifier {
            self.errors
                .push(format!("expected a unit after \"{}\", got {}", sign.as_char(), describe(&self.current)));
            return None;
        }

        match ModifierUnit::from_code(&self.current.literal) {
            Some(unit) => Some(Expr::Modifier { sign, amount, unit }),
            None => {
                self.errors.push(format!(
                    "\"{}\" is not a valid amount unit (expected one of {})",
                    self.current.literal,
                    AMOUNT_UNIT_CODES.join(", ")
                ));
                None
            }
        }
    }

    /// `("/"|"@") MODIFIER` over the snap-unit set.
    fn parse_snap(&mut self) -> Option<Expr> {
        let edge = if self.current.kind == TokenKind::Slash { SnapEdge::Start } else { SnapEdge::End };
        self.bump();

        if self.current.kind != TokenKind::Modifier {
            self.errors.push(format!("expected a unit after \"{}\", got {}", edge.as_char(), describe(&self.current)));
            return None;
        }

        match SnapUnit::from_code(&self.current.literal) {
            Some(unit) => Some(Expr::Snap { edge, unit }),
            None => {
                self.errors.push(format!(
                    "\"{}\" is not a valid snap unit (expected one of {})",
                    self.current.literal,
                    SNAP_UNIT_CODES.join(", ")
                ));
                None
            }
        }
    }
}

fn describe(token: &Token) -> String {
    match token.kind {
        TokenKind::End => "end of input".to_string(),
        _ => format!("\"{}\"", token.literal),
    }
}

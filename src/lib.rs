//! Compiler and evaluator for compact relative-date tokens.
//!
//! A token like `now-1d+2h/d@mon` is tokenized, parsed into an ordered
//! sequence of typed expression nodes, and folded left-to-right over a seed
//! instant:
//!
//! ```text
//! string ──▶ lexer ──▶ parser ──▶ [Expr, ...] ──▶ fold over seed ──▶ instant
//! ```
//!
//! Grammar surface (case-sensitive): the optional `now` keyword; operators
//! `+ - / @`; amount units `s m h d w M Y`; snap units additionally `bw`,
//! weekday codes `mon..sun` and quarter codes `Q`, `Q1..Q4`.
//!
//! The seed is always an aware instant: a naive reference is assumed to be
//! UTC, and an optional target zone decides on whose wall clock snap
//! boundaries such as "start of day" are computed.
//!
//! ```
//! use chrono::NaiveDate;
//! use datetoken::Datetoken;
//!
//! let at = NaiveDate::from_ymd_opt(2018, 12, 15).unwrap().and_hms_opt(10, 12, 34).unwrap();
//! let then = Datetoken::new().at(at).token("now-1d/d").to_date().unwrap();
//! assert_eq!(then.to_string(), "2018-12-14 00:00:00 UTC");
//! ```

extern crate self as datetoken;

#[macro_use]
mod macros;
mod ast;
mod error;
mod evaluate;
mod lexer;
mod object;
mod parser;

pub use ast::{AMOUNT_UNIT_CODES, Expr, ModifierUnit, SNAP_UNIT_CODES, Sign, SnapEdge, SnapUnit};
pub use error::TokenError;
pub use evaluate::{At, eval_datetoken, evaluate, parse_zone, utc_now};
pub use lexer::{Lexer, Token, TokenKind};
pub use object::{Datetoken, EvaluatedToken, token_to_date, token_to_utc_date};
pub use parser::{ParseResult, Parser, parse_token};

/// Cheap shape check: does `text` match the canonical token grammar?
///
/// This is a conservative pre-filter (a single anchored regex), useful for
/// validating user input before evaluating. It accepts exactly the canonical
/// grammar; the parser additionally tolerates a trailing stray operand, so a
/// `false` here does not always mean [`evaluate`] will fail.
pub fn matches_grammar(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty()
        && regex!(r"^(?:now)?(?:[+-][0-9]*[smhdwMY]|[/@](?:bw|mon|tue|wed|thu|fri|sat|sun|Q[1-4]?|[smhdwMY]))*$")
            .is_match(trimmed)
}

//! Evaluated-token object and the fluent configuration wrapper.
//!
//! [`EvaluatedToken`] is the structured entry point: a node sequence plus
//! the seed instant it folds over. It can come from the parser (via
//! [`crate::eval_datetoken`]) or be assembled programmatically with
//! [`EvaluatedToken::from_exprs`], bypassing the tokenizer and parser
//! entirely.
//!
//! [`Datetoken`] is a thin builder that stores reference instant, zone and
//! token string, and delegates to the compiler on `eval`.

use std::fmt;

use chrono::DateTime;
use chrono_tz::Tz;

use crate::ast::Expr;
use crate::error::TokenError;
use crate::evaluate::{At, eval_datetoken, parse_zone, utc_now};

/// A compiled token bound to its seed instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatedToken {
    nodes: Vec<Expr>,
    at: DateTime<Tz>,
}

impl EvaluatedToken {
    /// Build from an already-decomposed node sequence. A missing leading
    /// [`Expr::Now`] is materialized so rendering is always canonical.
    pub fn from_exprs(mut nodes: Vec<Expr>, at: DateTime<Tz>) -> Self {
        if !matches!(nodes.first(), Some(Expr::Now)) {
            nodes.insert(0, Expr::Now);
        }
        EvaluatedToken { nodes, at }
    }

    /// The seed instant the fold starts from.
    pub fn at(&self) -> DateTime<Tz> {
        self.at
    }

    pub fn nodes(&self) -> &[Expr] {
        &self.nodes
    }

    /// Re-seed the token, defaulting to the current UTC instant.
    pub fn refresh_at(&mut self, at: Option<DateTime<Tz>>) {
        self.at = at.unwrap_or_else(utc_now);
    }

    /// Whether the token snaps to a boundary anywhere in its sequence.
    pub fn is_snapped(&self) -> bool {
        self.nodes.iter().any(|node| matches!(node, Expr::Snap { .. }))
    }

    /// Whether the token shifts the instant (additions or subtractions).
    pub fn is_calculated(&self) -> bool {
        self.nodes.iter().any(|node| matches!(node, Expr::Modifier { .. }))
    }

    /// Fold the node sequence left-to-right over the seed.
    pub fn to_date(&self) -> DateTime<Tz> {
        self.nodes.iter().fold(self.at, |acc, node| node.apply(acc))
    }

    /// [`Self::to_date`] re-expressed in UTC. Pure conversion; the computed
    /// boundaries do not move.
    pub fn to_utc_date(&self) -> DateTime<Tz> {
        self.to_date().with_timezone(&chrono_tz::UTC)
    }
}

impl fmt::Display for EvaluatedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in &self.nodes {
            write!(f, "{node}")?;
        }
        Ok(())
    }
}

/// Fluent configuration for token evaluation: set any of reference instant,
/// zone and token string, then evaluate. Defaults: current UTC instant, no
/// zone conversion, token `"now"`.
#[derive(Debug, Clone, Default)]
pub struct Datetoken {
    token: Option<String>,
    at: Option<At>,
    tz: Option<Tz>,
}

impl Datetoken {
    pub fn new() -> Self {
        Datetoken::default()
    }

    /// Set the reference instant. Accepts naive (assumed UTC) and aware
    /// values via [`At`]'s conversions.
    pub fn at(mut self, at: impl Into<At>) -> Self {
        self.at = Some(at.into());
        self
    }

    /// Set the target zone.
    pub fn on(mut self, tz: Tz) -> Self {
        self.tz = Some(tz);
        self
    }

    /// Set the target zone from an IANA name.
    pub fn on_name(mut self, name: &str) -> Result<Self, TokenError> {
        self.tz = Some(parse_zone(name)?);
        Ok(self)
    }

    /// Set the token string.
    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Evaluate with the accumulated configuration.
    pub fn eval(&self) -> Result<EvaluatedToken, TokenError> {
        eval_datetoken(self.token.as_deref().unwrap_or("now"), self.at, self.tz)
    }

    pub fn to_date(&self) -> Result<DateTime<Tz>, TokenError> {
        self.eval().map(|evaluated| evaluated.to_date())
    }

    pub fn to_utc_date(&self) -> Result<DateTime<Tz>, TokenError> {
        self.eval().map(|evaluated| evaluated.to_utc_date())
    }
}

/// One-call wrapper: evaluate `token` against the current UTC instant.
pub fn token_to_date(token: &str) -> Result<DateTime<Tz>, TokenError> {
    Datetoken::new().token(token).to_date()
}

/// One-call wrapper returning the result in UTC.
pub fn token_to_utc_date(token: &str) -> Result<DateTime<Tz>, TokenError> {
    Datetoken::new().token(token).to_utc_date()
}

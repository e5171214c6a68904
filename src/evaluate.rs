//! Token evaluation: seed resolution, zone coercion and the fold.
//!
//! The pipeline is strictly one-way: string → tokens → node sequence →
//! folded instant. This module owns the only two implicit-looking decisions
//! and makes them explicit:
//!
//! - a reference instant without a zone identity ([`At::Naive`]) is assumed
//!   to be UTC, and nothing else is ever reinterpreted;
//! - when a target zone is supplied, the seed is converted into that zone
//!   before the fold, so every snap boundary is computed on that zone's
//!   wall clock.

use chrono::{DateTime, NaiveDateTime, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::TokenError;
use crate::lexer::Lexer;
use crate::object::EvaluatedToken;
use crate::parser::Parser;

/// A caller-supplied reference instant.
///
/// Keeping naive and aware references as distinct variants makes the
/// UTC-coercion step visible instead of an ambient default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum At {
    /// No zone identity; assumed to be UTC wall-clock.
    Naive(NaiveDateTime),
    /// Already zoned; never reinterpreted.
    Aware(DateTime<Tz>),
}

impl From<NaiveDateTime> for At {
    fn from(naive: NaiveDateTime) -> Self {
        At::Naive(naive)
    }
}

impl From<DateTime<Tz>> for At {
    fn from(aware: DateTime<Tz>) -> Self {
        At::Aware(aware)
    }
}

impl From<DateTime<Utc>> for At {
    fn from(aware: DateTime<Utc>) -> Self {
        At::Aware(aware.with_timezone(&chrono_tz::UTC))
    }
}

/// The current instant in UTC, truncated to whole seconds.
pub fn utc_now() -> DateTime<Tz> {
    let now = Utc::now();
    now.with_nanosecond(0).unwrap_or(now).with_timezone(&chrono_tz::UTC)
}

/// Resolve an IANA zone name such as `Europe/Madrid`.
pub fn parse_zone(name: &str) -> Result<Tz, TokenError> {
    name.parse::<Tz>().map_err(|_| TokenError::InvalidTimezone(name.to_string()))
}

/// Resolve the seed instant the fold starts from: reference (or the current
/// wall clock), naive→UTC coercion, then optional conversion into `tz`.
fn resolve_seed(at: Option<At>, tz: Option<Tz>) -> DateTime<Tz> {
    let seed = match at {
        None => utc_now(),
        Some(At::Naive(naive)) => chrono_tz::UTC.from_utc_datetime(&naive),
        Some(At::Aware(aware)) => aware,
    };
    match tz {
        Some(tz) => seed.with_timezone(&tz),
        None => seed,
    }
}

/// Evaluate `token` into an [`EvaluatedToken`] carrying the node sequence
/// and the resolved seed.
///
/// Fails with [`TokenError::InvalidToken`] when parsing produced no nodes or
/// recorded any diagnostic; there is no partial success.
pub fn eval_datetoken(token: &str, at: Option<At>, tz: Option<Tz>) -> Result<EvaluatedToken, TokenError> {
    let seed = resolve_seed(at, tz);
    let lexer = Lexer::new(token);
    let trimmed = lexer.input().to_string();
    let result = Parser::new(lexer).parse();

    if result.is_rejected() {
        return Err(TokenError::InvalidToken { token: trimmed, errors: result.errors });
    }
    Ok(EvaluatedToken::from_exprs(result.nodes, seed))
}

/// Evaluate `token` straight to an instant, still carrying whichever zone
/// the seed ended up in.
pub fn evaluate(token: &str, at: Option<At>, tz: Option<Tz>) -> Result<DateTime<Tz>, TokenError> {
    eval_datetoken(token, at, tz).map(|evaluated| evaluated.to_date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::UTC;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Tz> {
        UTC.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    fn naive(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d).unwrap().and_hms_opt(h, mi, s).unwrap()
    }

    fn eval_at(token: &str, at: DateTime<Tz>) -> DateTime<Tz> {
        evaluate(token, Some(at.into()), None).unwrap()
    }

    #[test]
    fn now_returns_the_reference_exactly() {
        let reference = utc(2018, 12, 15, 10, 12, 34);
        assert_eq!(eval_at("now", reference), reference);
    }

    #[test]
    fn modifiers_and_snap_combine_left_to_right() {
        let reference = utc(2018, 12, 15, 10, 12, 34);
        assert_eq!(eval_at("now-1d+2h/d", reference), utc(2018, 12, 14, 0, 0, 0));
        assert_eq!(eval_at("now-1d+2h+1w/m", reference), utc(2018, 12, 21, 12, 12, 0));
    }

    #[test]
    fn weekday_snaps_from_a_monday() {
        let reference = utc(2016, 11, 28, 12, 55, 23);
        assert_eq!(eval_at("now/mon", reference), reference);
        assert_eq!(eval_at("now/fri", reference), utc(2016, 11, 25, 12, 55, 23));
        assert_eq!(eval_at("now@fri", reference), utc(2016, 12, 2, 12, 55, 23));
        assert_eq!(eval_at("now@sun/d", reference), utc(2016, 12, 4, 0, 0, 0));
    }

    #[test]
    fn month_end_from_the_first_of_the_month() {
        let reference = utc(2018, 12, 1, 0, 0, 0);
        assert_eq!(eval_at("now@M", reference), utc(2018, 12, 31, 23, 59, 59));
    }

    #[test]
    fn snap_idempotence() {
        let reference = utc(2018, 12, 15, 10, 12, 34);
        assert_eq!(eval_at("now/d/d", reference), eval_at("now/d", reference));
        assert_eq!(eval_at("now@w@w", reference), eval_at("now@w", reference));
    }

    #[test]
    fn later_snap_overrides_earlier_field_effect() {
        let reference = utc(2018, 5, 20, 9, 30, 0);
        assert_eq!(eval_at("now/Q1/Q2", reference), utc(2018, 4, 1, 0, 0, 0));
    }

    #[test]
    fn malformed_tokens_are_rejected_whole() {
        let reference = utc(2018, 12, 15, 10, 12, 34);
        for input in ["now*2h", "now-2A-zZ/T", "", "5d"] {
            let err = evaluate(input, Some(reference.into()), None).unwrap_err();
            assert!(matches!(err, TokenError::InvalidToken { .. }), "{input} should be invalid");
        }
    }

    #[test]
    fn invalid_token_error_carries_input_and_causes() {
        let err = evaluate("now*2h", None, None).unwrap_err();
        let TokenError::InvalidToken { token, errors } = err else {
            panic!("expected InvalidToken");
        };
        assert_eq!(token, "now*2h");
        assert_eq!(errors, vec!["illegal character \"*\"".to_string()]);
    }

    #[test]
    fn naive_reference_is_assumed_utc() {
        let then = evaluate("now/d", Some(naive(2014, 11, 25, 23, 48, 43).into()), None).unwrap();
        assert_eq!(then, utc(2014, 11, 25, 0, 0, 0));
        assert_eq!(then.timezone(), UTC);
    }

    #[test]
    fn target_zone_changes_what_start_of_day_means() {
        // 23:48 UTC is 00:48 next day in Madrid (CET), so the day snap lands
        // on the 26th in local wall-clock terms.
        let madrid = parse_zone("Europe/Madrid").unwrap();
        let then = evaluate("now/d", Some(naive(2014, 11, 25, 23, 48, 43).into()), Some(madrid)).unwrap();
        assert_eq!(then.naive_local(), naive(2014, 11, 26, 0, 0, 0));
        assert_eq!(then.timezone(), madrid);
    }

    #[test]
    fn aware_reference_is_never_reinterpreted() {
        let madrid = parse_zone("Europe/Madrid").unwrap();
        let aware = utc(2014, 11, 2, 23, 48, 43).with_timezone(&madrid);
        let then = evaluate("now/d", Some(aware.into()), None).unwrap();
        // Start of Nov 3 in Madrid is 23:00 UTC on Nov 2.
        assert_eq!(then.with_timezone(&UTC), utc(2014, 11, 2, 23, 0, 0));
    }

    #[test]
    fn unknown_zone_name_is_an_error() {
        let err = parse_zone("Mars/Olympus").unwrap_err();
        assert_eq!(err, TokenError::InvalidTimezone("Mars/Olympus".to_string()));
    }

    #[test]
    fn default_reference_is_current_utc_with_whole_seconds() {
        let before = Utc::now();
        let then = evaluate("now", None, None).unwrap();
        let after = Utc::now();
        assert_eq!(then.nanosecond(), 0);
        assert!(then.with_timezone(&Utc) >= before.with_nanosecond(0).unwrap_or(before));
        assert!(then.with_timezone(&Utc) <= after);
    }

    #[test]
    fn duration_units_are_exact_across_dst() {
        // Madrid springs forward on 2024-03-31: +1d crosses the gap but the
        // absolute timeline shift is still exactly 24h.
        let madrid = parse_zone("Europe/Madrid").unwrap();
        let reference = utc(2024, 3, 30, 12, 0, 0).with_timezone(&madrid);
        let then = eval_at("now+1d", reference);
        assert_eq!(then.with_timezone(&UTC), utc(2024, 3, 31, 12, 0, 0));
    }
}

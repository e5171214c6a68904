//! Typed expression nodes and the calendar arithmetic behind them.
//!
//! A parsed token is an ordered sequence of [`Expr`] values. Each node knows
//! two things: how to transform an instant ([`Expr::apply`]) and how to render
//! itself back to canonical text (`Display`). Evaluation is a plain
//! left-to-right fold of `apply` over a seed instant; order is significant and
//! nodes are never merged or reordered.
//!
//! Duration units (`s m h d w`) shift along the absolute timeline, so adding
//! a week is always 7×24h even across a DST transition. Calendar units
//! (`M Y`) and all snaps work on the wall-clock fields of the instant's zone
//! and re-attach the zone afterwards.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Weekday};
use chrono_tz::Tz;

/// Sign of an amount modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
}

impl Sign {
    pub fn as_char(self) -> char {
        match self {
            Sign::Plus => '+',
            Sign::Minus => '-',
        }
    }

    fn factor(self) -> i64 {
        match self {
            Sign::Plus => 1,
            Sign::Minus => -1,
        }
    }
}

/// Units an amount modifier may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifierUnit {
    Seconds,
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
}

/// Canonical single-letter codes, in grammar order.
pub const AMOUNT_UNIT_CODES: [&str; 7] = ["s", "m", "h", "d", "w", "M", "Y"];

impl ModifierUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(ModifierUnit::Seconds),
            "m" => Some(ModifierUnit::Minutes),
            "h" => Some(ModifierUnit::Hours),
            "d" => Some(ModifierUnit::Days),
            "w" => Some(ModifierUnit::Weeks),
            "M" => Some(ModifierUnit::Months),
            "Y" => Some(ModifierUnit::Years),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            ModifierUnit::Seconds => "s",
            ModifierUnit::Minutes => "m",
            ModifierUnit::Hours => "h",
            ModifierUnit::Days => "d",
            ModifierUnit::Weeks => "w",
            ModifierUnit::Months => "M",
            ModifierUnit::Years => "Y",
        }
    }
}

/// Units a snap may target. Superset of the amount units: adds the business
/// week, weekday codes and quarter codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapUnit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    BusinessWeek,
    Month,
    Year,
    /// `mon` .. `sun`.
    Weekday(Weekday),
    /// `Q` (current quarter) or `Q1`..`Q4` (explicit quarter of the current year).
    Quarter(Option<u32>),
}

/// Canonical snap-unit codes, in grammar order.
pub const SNAP_UNIT_CODES: [&str; 20] = [
    "s", "m", "h", "d", "w", "bw", "M", "Y", "mon", "tue", "wed", "thu", "fri", "sat", "sun", "Q", "Q1", "Q2", "Q3",
    "Q4",
];

impl SnapUnit {
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(SnapUnit::Second),
            "m" => Some(SnapUnit::Minute),
            "h" => Some(SnapUnit::Hour),
            "d" => Some(SnapUnit::Day),
            "w" => Some(SnapUnit::Week),
            "bw" => Some(SnapUnit::BusinessWeek),
            "M" => Some(SnapUnit::Month),
            "Y" => Some(SnapUnit::Year),
            "mon" => Some(SnapUnit::Weekday(Weekday::Mon)),
            "tue" => Some(SnapUnit::Weekday(Weekday::Tue)),
            "wed" => Some(SnapUnit::Weekday(Weekday::Wed)),
            "thu" => Some(SnapUnit::Weekday(Weekday::Thu)),
            "fri" => Some(SnapUnit::Weekday(Weekday::Fri)),
            "sat" => Some(SnapUnit::Weekday(Weekday::Sat)),
            "sun" => Some(SnapUnit::Weekday(Weekday::Sun)),
            "Q" => Some(SnapUnit::Quarter(None)),
            "Q1" => Some(SnapUnit::Quarter(Some(1))),
            "Q2" => Some(SnapUnit::Quarter(Some(2))),
            "Q3" => Some(SnapUnit::Quarter(Some(3))),
            "Q4" => Some(SnapUnit::Quarter(Some(4))),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            SnapUnit::Second => "s",
            SnapUnit::Minute => "m",
            SnapUnit::Hour => "h",
            SnapUnit::Day => "d",
            SnapUnit::Week => "w",
            SnapUnit::BusinessWeek => "bw",
            SnapUnit::Month => "M",
            SnapUnit::Year => "Y",
            SnapUnit::Weekday(Weekday::Mon) => "mon",
            SnapUnit::Weekday(Weekday::Tue) => "tue",
            SnapUnit::Weekday(Weekday::Wed) => "wed",
            SnapUnit::Weekday(Weekday::Thu) => "thu",
            SnapUnit::Weekday(Weekday::Fri) => "fri",
            SnapUnit::Weekday(Weekday::Sat) => "sat",
            SnapUnit::Weekday(Weekday::Sun) => "sun",
            SnapUnit::Quarter(None) => "Q",
            SnapUnit::Quarter(Some(1)) => "Q1",
            SnapUnit::Quarter(Some(2)) => "Q2",
            SnapUnit::Quarter(Some(3)) => "Q3",
            SnapUnit::Quarter(Some(_)) => "Q4",
        }
    }
}

/// Which boundary of the unit a snap targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapEdge {
    /// `/` — truncate to the start of the unit.
    Start,
    /// `@` — advance to the end of the unit.
    End,
}

impl SnapEdge {
    pub fn as_char(self) -> char {
        match self {
            SnapEdge::Start => '/',
            SnapEdge::End => '@',
        }
    }
}

/// One node of a parsed token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// The optional leading `now` keyword. Identity under `apply`.
    Now,
    /// Additive or subtractive shift: `+2h`, `-1d`, `+w` (amount defaults to 1).
    Modifier { sign: Sign, amount: i64, unit: ModifierUnit },
    /// Boundary snap: `/d`, `@M`, `/mon`, `@Q2`.
    Snap { edge: SnapEdge, unit: SnapUnit },
}

impl Expr {
    /// Transform `dt` according to this node.
    pub fn apply(&self, dt: DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Expr::Now => dt,
            Expr::Modifier { sign, amount, unit } => {
                let n = sign.factor().saturating_mul(*amount);
                let delta = match unit {
                    ModifierUnit::Seconds => Duration::try_seconds(n),
                    ModifierUnit::Minutes => Duration::try_minutes(n),
                    ModifierUnit::Hours => Duration::try_hours(n),
                    ModifierUnit::Days => Duration::try_days(n),
                    ModifierUnit::Weeks => Duration::try_weeks(n),
                    ModifierUnit::Months => {
                        return resolve_local(dt.timezone(), add_months(dt.naive_local(), n));
                    }
                    ModifierUnit::Years => {
                        return resolve_local(dt.timezone(), add_months(dt.naive_local(), n.saturating_mul(12)));
                    }
                };
                // Out-of-range shifts leave the instant untouched rather
                // than wrapping or panicking.
                delta.and_then(|delta| dt.checked_add_signed(delta)).unwrap_or(dt)
            }
            Expr::Snap { edge, unit } => resolve_local(dt.timezone(), snap(dt.naive_local(), *edge, *unit)),
        }
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Now => f.write_str("now"),
            Expr::Modifier { sign, amount, unit } => write!(f, "{}{}{}", sign.as_char(), amount, unit.code()),
            Expr::Snap { edge, unit } => write!(f, "{}{}", edge.as_char(), unit.code()),
        }
    }
}

/// Shift by whole calendar months, preserving day-of-month and clamping to
/// the last valid day when the target month is shorter.
fn add_months(dt: NaiveDateTime, months: i64) -> NaiveDateTime {
    let zero_based = dt.year() as i64 * 12 + (dt.month() as i64 - 1) + months;
    let Ok(year) = i32::try_from(zero_based.div_euclid(12)) else {
        return dt;
    };
    let month = (zero_based.rem_euclid(12) + 1) as u32;
    let day = dt.day().min(days_in_month(year, month));
    match NaiveDate::from_ymd_opt(year, month, day) {
        Some(date) => NaiveDateTime::new(date, dt.time()),
        None => dt,
    }
}

/// Computed as first-of-next-month minus one day, not a fixed table.
fn days_in_month(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    let first_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX));
    (first_next - Duration::days(1)).day()
}

fn day_start(date: NaiveDate) -> NaiveDateTime {
    NaiveDateTime::new(date, NaiveTime::MIN)
}

fn day_end(date: NaiveDate) -> NaiveDateTime {
    NaiveDateTime::new(date, NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
}

fn with_hms(dt: NaiveDateTime, hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDateTime::new(dt.date(), NaiveTime::from_hms_opt(hour, minute, second).unwrap_or_else(|| dt.time()))
}

fn monday_of(dt: NaiveDateTime) -> NaiveDate {
    dt.date() - Duration::days(dt.weekday().num_days_from_monday() as i64)
}

fn snap(dt: NaiveDateTime, edge: SnapEdge, unit: SnapUnit) -> NaiveDateTime {
    use chrono::Timelike;

    match (edge, unit) {
        // No sub-second resolution: both edges clamp to the whole-second
        // boundary, mirroring the minute truncation.
        (_, SnapUnit::Second) => with_hms(dt, dt.hour(), dt.minute(), 0),
        (SnapEdge::Start, SnapUnit::Minute) => with_hms(dt, dt.hour(), dt.minute(), 0),
        (SnapEdge::End, SnapUnit::Minute) => with_hms(dt, dt.hour(), dt.minute(), 59),
        (SnapEdge::Start, SnapUnit::Hour) => with_hms(dt, dt.hour(), 0, 0),
        (SnapEdge::End, SnapUnit::Hour) => with_hms(dt, dt.hour(), 59, 59),
        (SnapEdge::Start, SnapUnit::Day) => day_start(dt.date()),
        (SnapEdge::End, SnapUnit::Day) => day_end(dt.date()),
        (SnapEdge::Start, SnapUnit::Week | SnapUnit::BusinessWeek) => day_start(monday_of(dt)),
        (SnapEdge::End, SnapUnit::Week) => day_end(monday_of(dt) + Duration::days(6)),
        (SnapEdge::End, SnapUnit::BusinessWeek) => day_end(monday_of(dt) + Duration::days(4)),
        (SnapEdge::Start, SnapUnit::Month) => {
            day_start(NaiveDate::from_ymd_opt(dt.year(), dt.month(), 1).unwrap_or_else(|| dt.date()))
        }
        (SnapEdge::End, SnapUnit::Month) => {
            let last = days_in_month(dt.year(), dt.month());
            day_end(NaiveDate::from_ymd_opt(dt.year(), dt.month(), last).unwrap_or_else(|| dt.date()))
        }
        (SnapEdge::Start, SnapUnit::Year) => {
            day_start(NaiveDate::from_ymd_opt(dt.year(), 1, 1).unwrap_or_else(|| dt.date()))
        }
        (SnapEdge::End, SnapUnit::Year) => {
            day_end(NaiveDate::from_ymd_opt(dt.year(), 12, 31).unwrap_or_else(|| dt.date()))
        }
        // Weekday snaps keep the time of day; today counts in both directions.
        (SnapEdge::Start, SnapUnit::Weekday(target)) => {
            let back =
                (dt.weekday().num_days_from_monday() as i64 - target.num_days_from_monday() as i64).rem_euclid(7);
            dt - Duration::days(back)
        }
        (SnapEdge::End, SnapUnit::Weekday(target)) => {
            let forward =
                (target.num_days_from_monday() as i64 - dt.weekday().num_days_from_monday() as i64).rem_euclid(7);
            dt + Duration::days(forward)
        }
        (edge, SnapUnit::Quarter(which)) => {
            let index = which.map(|q| q.saturating_sub(1)).unwrap_or((dt.month() - 1) / 3);
            let first_month = index * 3 + 1;
            match edge {
                SnapEdge::Start => {
                    day_start(NaiveDate::from_ymd_opt(dt.year(), first_month, 1).unwrap_or_else(|| dt.date()))
                }
                SnapEdge::End => {
                    let last_month = first_month + 2;
                    let last = days_in_month(dt.year(), last_month);
                    day_end(NaiveDate::from_ymd_opt(dt.year(), last_month, last).unwrap_or_else(|| dt.date()))
                }
            }
        }
    }
}

/// Re-attach a zone to wall-clock fields after calendar math. An ambiguous
/// local time (DST fall-back) resolves to the earliest instant; a
/// nonexistent one (spring-forward gap) skips forward to the next wall
/// clock that exists.
pub(crate) fn resolve_local(tz: Tz, naive: NaiveDateTime) -> DateTime<Tz> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => {
            let mut probe = naive;
            for _ in 0..48 {
                probe += Duration::hours(1);
                if let Some(dt) = tz.from_local_datetime(&probe).earliest() {
                    return dt;
                }
            }
            tz.from_utc_datetime(&naive)
        }
    }
}

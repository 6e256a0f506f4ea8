//! # Date Math
//!
//! Resolves date-picker expressions into absolute UTC timestamps.
//!
//! ```text
//! now                      current instant
//! now-15m                  fifteen minutes ago
//! now-1d/d                 start of yesterday (end of yesterday when rounding up)
//! 2021-07-01 00:00:00      absolute, UTC
//! 2021-07-01||+1M/M        absolute anchor followed by math
//! ```
//!
//! Units: `s m h d w M y` (`H` is accepted for hours). Weeks start on Monday.

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Timelike, Utc};

use crate::error::{QueryError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Second,
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl Unit {
    fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Unit::Second),
            'm' => Some(Unit::Minute),
            'h' | 'H' => Some(Unit::Hour),
            'd' => Some(Unit::Day),
            'w' => Some(Unit::Week),
            'M' => Some(Unit::Month),
            'y' => Some(Unit::Year),
            _ => None,
        }
    }
}

/// Resolve `expr` against `now`. With `round_up`, a `/unit` suffix snaps to
/// the last instant of the unit instead of its first.
pub fn parse(expr: &str, now: DateTime<Utc>, round_up: bool) -> Result<DateTime<Utc>> {
    let invalid = || QueryError::InvalidTimeExpression {
        expr: expr.to_string(),
    };

    let text = expr.trim();
    if text.is_empty() {
        return Err(invalid());
    }

    let (anchor, math) = if let Some(rest) = text.strip_prefix("now") {
        (now, rest)
    } else if let Some((anchor, rest)) = text.split_once("||") {
        (parse_absolute(anchor).ok_or_else(invalid)?, rest)
    } else {
        (parse_absolute(text).ok_or_else(invalid)?, "")
    };

    apply_math(anchor, math, round_up).ok_or_else(invalid)
}

fn parse_absolute(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

fn apply_math(mut dt: DateTime<Utc>, math: &str, round_up: bool) -> Option<DateTime<Utc>> {
    let mut chars = math.trim().chars().peekable();

    while let Some(op) = chars.next() {
        match op {
            '+' | '-' => {
                let mut digits = String::new();
                while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
                    digits.push(c);
                    chars.next();
                }
                // A bare `now-d` means one unit.
                let amount: i64 = if digits.is_empty() { 1 } else { digits.parse().ok()? };
                let unit = Unit::from_char(chars.next()?)?;
                let amount = if op == '-' { -amount } else { amount };
                dt = shift(dt, unit, amount)?;
            }
            '/' => {
                let unit = Unit::from_char(chars.next()?)?;
                dt = floor(dt, unit)?;
                if round_up {
                    dt = shift(dt, unit, 1)? - Duration::milliseconds(1);
                }
            }
            c if c.is_whitespace() => {}
            _ => return None,
        }
    }
    Some(dt)
}

fn shift(dt: DateTime<Utc>, unit: Unit, amount: i64) -> Option<DateTime<Utc>> {
    let duration = match unit {
        Unit::Second => Duration::try_seconds(amount)?,
        Unit::Minute => Duration::try_minutes(amount)?,
        Unit::Hour => Duration::try_hours(amount)?,
        Unit::Day => Duration::try_days(amount)?,
        Unit::Week => Duration::try_weeks(amount)?,
        Unit::Month => return shift_months(dt, amount),
        Unit::Year => return shift_months(dt, amount.checked_mul(12)?),
    };
    dt.checked_add_signed(duration)
}

fn shift_months(dt: DateTime<Utc>, amount: i64) -> Option<DateTime<Utc>> {
    let months = Months::new(u32::try_from(amount.unsigned_abs()).ok()?);
    if amount >= 0 {
        dt.checked_add_months(months)
    } else {
        dt.checked_sub_months(months)
    }
}

fn floor(dt: DateTime<Utc>, unit: Unit) -> Option<DateTime<Utc>> {
    let date = dt.date_naive();
    let naive = match unit {
        Unit::Second => date.and_hms_opt(dt.hour(), dt.minute(), dt.second())?,
        Unit::Minute => date.and_hms_opt(dt.hour(), dt.minute(), 0)?,
        Unit::Hour => date.and_hms_opt(dt.hour(), 0, 0)?,
        Unit::Day => date.and_hms_opt(0, 0, 0)?,
        Unit::Week => {
            let back = i64::from(date.weekday().num_days_from_monday());
            date.checked_sub_signed(Duration::try_days(back)?)?.and_hms_opt(0, 0, 0)?
        }
        Unit::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)?.and_hms_opt(0, 0, 0)?,
        Unit::Year => NaiveDate::from_ymd_opt(date.year(), 1, 1)?.and_hms_opt(0, 0, 0)?,
    };
    Some(Utc.from_utc_datetime(&naive))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        // Wednesday
        Utc.with_ymd_and_hms(2021, 7, 14, 13, 45, 30).unwrap()
    }

    fn fmt(dt: DateTime<Utc>) -> String {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    #[test]
    fn test_now_and_offsets() {
        assert_eq!(parse("now", now(), false).unwrap(), now());
        assert_eq!(fmt(parse("now-15m", now(), false).unwrap()), "2021-07-14 13:30:30");
        assert_eq!(fmt(parse("now+2h", now(), false).unwrap()), "2021-07-14 15:45:30");
        assert_eq!(fmt(parse("now-1M", now(), false).unwrap()), "2021-06-14 13:45:30");
        assert_eq!(fmt(parse("now-d", now(), false).unwrap()), "2021-07-13 13:45:30");
    }

    #[test]
    fn test_rounding_down_and_up() {
        assert_eq!(fmt(parse("now/d", now(), false).unwrap()), "2021-07-14 00:00:00");
        assert_eq!(fmt(parse("now/d", now(), true).unwrap()), "2021-07-14 23:59:59");
        assert_eq!(fmt(parse("now-1d/d", now(), true).unwrap()), "2021-07-13 23:59:59");
        assert_eq!(fmt(parse("now/w", now(), false).unwrap()), "2021-07-12 00:00:00");
        assert_eq!(fmt(parse("now/M", now(), true).unwrap()), "2021-07-31 23:59:59");
        assert_eq!(fmt(parse("now/y", now(), false).unwrap()), "2021-01-01 00:00:00");
    }

    #[test]
    fn test_absolute_anchors() {
        assert_eq!(
            fmt(parse("2021-07-01 08:00:00", now(), false).unwrap()),
            "2021-07-01 08:00:00"
        );
        assert_eq!(
            fmt(parse("2021-07-01T08:00:00+02:00", now(), false).unwrap()),
            "2021-07-01 06:00:00"
        );
        assert_eq!(fmt(parse("2021-07-01", now(), false).unwrap()), "2021-07-01 00:00:00");
        assert_eq!(
            fmt(parse("2021-07-01||+1M/M", now(), true).unwrap()),
            "2021-08-31 23:59:59"
        );
    }

    #[test]
    fn test_rejects_out_of_range_rounding() {
        for (expr, round_up) in [("now-264164y/y/w", false), ("now+260121y/y", true)] {
            assert!(
                matches!(
                    parse(expr, now(), round_up),
                    Err(QueryError::InvalidTimeExpression { .. })
                ),
                "{expr:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_rejects_garbage() {
        for expr in ["", "   ", "yesterday", "now-15x", "now/", "now*2d", "2021-13-01"] {
            assert!(
                matches!(
                    parse(expr, now(), false),
                    Err(QueryError::InvalidTimeExpression { .. })
                ),
                "{expr:?} should be rejected"
            );
        }
    }
}

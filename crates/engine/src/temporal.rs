//! Lexical parsing and offset arithmetic for the date/time value family.
//!
//! Lexical forms follow ISO-8601: an optional trailing `Z` or `±hh:mm`
//! offset in the range −14:00..+14:00. Absence of an offset is preserved,
//! not defaulted.

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};

use crate::item::Duration;

/// Largest legal timezone offset magnitude, in seconds (±14:00).
pub const MAX_TIMEZONE_OFFSET_SECONDS: i64 = 14 * 3600;

/// Split a trailing timezone designator off a lexical form.
fn split_offset(lexical: &str) -> Option<(&str, Option<FixedOffset>)> {
    if let Some(body) = lexical.strip_suffix('Z') {
        return Some((body, Some(utc())));
    }
    // ±hh:mm suffix; the '-' must not be the date separator, so only a
    // suffix of exactly six characters counts.
    if lexical.len() > 6 && lexical.is_char_boundary(lexical.len() - 6) {
        let (body, suffix) = lexical.split_at(lexical.len() - 6);
        let mut chars = suffix.chars();
        let sign = match chars.next() {
            Some('+') => 1,
            Some('-') => -1,
            _ => return Some((lexical, None)),
        };
        let rest: Vec<&str> = suffix[1..].split(':').collect();
        if rest.len() == 2
            && let (Ok(hours), Ok(minutes)) = (rest[0].parse::<i32>(), rest[1].parse::<i32>())
            && minutes < 60
        {
            let seconds = sign * (hours * 3600 + minutes * 60);
            if i64::from(seconds.abs()) <= MAX_TIMEZONE_OFFSET_SECONDS {
                return Some((body, FixedOffset::east_opt(seconds)));
            }
            return None;
        }
    }
    Some((lexical, None))
}

pub fn utc() -> FixedOffset {
    use chrono::Offset;
    chrono::Utc.fix()
}

pub fn parse_time(lexical: &str) -> Option<(NaiveTime, Option<FixedOffset>)> {
    let (body, tz) = split_offset(lexical.trim())?;
    let time = NaiveTime::parse_from_str(body, "%H:%M:%S%.f").ok()?;
    Some((time, tz))
}

pub fn parse_date(lexical: &str) -> Option<(NaiveDate, Option<FixedOffset>)> {
    let (body, tz) = split_offset(lexical.trim())?;
    let date = NaiveDate::parse_from_str(body, "%Y-%m-%d").ok()?;
    Some((date, tz))
}

pub fn parse_date_time(lexical: &str) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
    let (body, tz) = split_offset(lexical.trim())?;
    let dt = NaiveDateTime::parse_from_str(body, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Some((dt, tz))
}

/// Parse an ISO-8601 duration (`-PnYnMnDTnHnMn.nS`).
pub fn parse_duration(lexical: &str) -> Option<Duration> {
    let mut s = lexical.trim();
    let negative = if let Some(rest) = s.strip_prefix('-') {
        s = rest;
        true
    } else {
        false
    };
    let s = s.strip_prefix('P')?;
    let (date_part, time_part) = match s.split_once('T') {
        Some((d, t)) if !t.is_empty() => (d, Some(t)),
        Some(_) => return None,
        None => (s, None),
    };

    let mut months: i64 = 0;
    let mut seconds: i64 = 0;
    let mut nanos: u32 = 0;
    let mut saw_component = false;

    let mut rest = date_part;
    for (designator, factor) in [('Y', 12i64), ('M', 1), ('D', 0)] {
        if let Some(pos) = rest.find(designator) {
            let value: i64 = rest[..pos].parse().ok()?;
            if designator == 'D' {
                seconds += value * 86_400;
            } else {
                months += value * factor;
            }
            rest = &rest[pos + 1..];
            saw_component = true;
        }
    }
    if !rest.is_empty() {
        return None;
    }

    if let Some(time_part) = time_part {
        let mut rest = time_part;
        for (designator, factor) in [('H', 3600i64), ('M', 60), ('S', 1)] {
            if let Some(pos) = rest.find(designator) {
                let field = &rest[..pos];
                if designator == 'S' {
                    let (int_part, frac_part) = match field.split_once('.') {
                        Some((i, f)) => (i, Some(f)),
                        None => (field, None),
                    };
                    seconds += int_part.parse::<i64>().ok()?;
                    if let Some(frac) = frac_part {
                        if frac.is_empty() || frac.len() > 9 {
                            return None;
                        }
                        let scale = 10u32.pow(9 - frac.len() as u32);
                        nanos = frac.parse::<u32>().ok()? * scale;
                    }
                } else {
                    seconds += rest[..pos].parse::<i64>().ok()? * factor;
                }
                rest = &rest[pos + 1..];
                saw_component = true;
            }
        }
        if !rest.is_empty() {
            return None;
        }
    }

    if !saw_component {
        return None;
    }
    if negative {
        months = -months;
        seconds = -seconds;
    }
    Some(Duration { months: i32::try_from(months).ok()?, seconds, nanos })
}

pub fn format_offset(offset: FixedOffset) -> String {
    let total = offset.local_minus_utc();
    if total == 0 {
        return "Z".to_string();
    }
    let sign = if total < 0 { '-' } else { '+' };
    let abs = total.abs();
    format!("{sign}{:02}:{:02}", abs / 3600, (abs % 3600) / 60)
}

pub fn format_duration(value: &Duration) -> String {
    if value.is_zero() {
        return "PT0S".to_string();
    }
    let negative = value.months < 0 || value.seconds < 0;
    let months = i64::from(value.months).unsigned_abs();
    let mut secs = value.seconds.unsigned_abs();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push('P');
    if months / 12 > 0 {
        out.push_str(&format!("{}Y", months / 12));
    }
    if months % 12 > 0 {
        out.push_str(&format!("{}M", months % 12));
    }
    if secs / 86_400 > 0 {
        out.push_str(&format!("{}D", secs / 86_400));
        secs %= 86_400;
    }
    if secs > 0 || value.nanos > 0 {
        out.push('T');
        if secs / 3600 > 0 {
            out.push_str(&format!("{}H", secs / 3600));
            secs %= 3600;
        }
        if secs / 60 > 0 {
            out.push_str(&format!("{}M", secs / 60));
            secs %= 60;
        }
        if value.nanos > 0 {
            let frac = format!("{:09}", value.nanos);
            out.push_str(&format!("{}.{}S", secs, frac.trim_end_matches('0')));
        } else if secs > 0 {
            out.push_str(&format!("{secs}S"));
        }
    }
    out
}

/// Interpret a duration as a timezone offset: a pure day-time value within
/// ±14:00 on a whole-minute boundary. Anything else is rejected.
pub fn offset_from_duration(value: &Duration) -> Option<FixedOffset> {
    if value.months != 0 || value.nanos != 0 {
        return None;
    }
    if value.seconds % 60 != 0 || value.seconds.abs() > MAX_TIMEZONE_OFFSET_SECONDS {
        return None;
    }
    FixedOffset::east_opt(value.seconds as i32)
}

/// Shift clock fields so the same instant reads in UTC.
pub fn to_utc(dt: NaiveDateTime, offset: FixedOffset) -> NaiveDateTime {
    dt - TimeDelta::seconds(i64::from(offset.local_minus_utc()))
}

/// Re-express the same instant under a different offset.
pub fn rezone(dt: NaiveDateTime, from: FixedOffset, to: FixedOffset) -> NaiveDateTime {
    dt + TimeDelta::seconds(i64::from(to.local_minus_utc()) - i64::from(from.local_minus_utc()))
}

/// Same-instant re-zoning for bare times; wraps around midnight.
pub fn rezone_time(time: NaiveTime, from: FixedOffset, to: FixedOffset) -> NaiveTime {
    let delta =
        TimeDelta::seconds(i64::from(to.local_minus_utc()) - i64::from(from.local_minus_utc()));
    time.overflowing_add_signed(delta).0
}

/// Shift a bare time so the same instant reads in UTC; wraps around midnight.
pub fn time_to_utc(time: NaiveTime, offset: FixedOffset) -> NaiveTime {
    time.overflowing_sub_signed(TimeDelta::seconds(i64::from(offset.local_minus_utc()))).0
}

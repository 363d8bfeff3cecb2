//! Item value model: atomic scalars, objects and arrays flowing through
//! iterator trees. Items are immutable once constructed and carry no
//! reference back to the iterator that produced them.

use core::fmt;
use std::sync::Arc;

use chrono::{FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use compact_str::CompactString;

use crate::temporal;
use crate::types::registry::TypeRegistry;
use crate::types::ItemType;

/// One duration value shared by the whole duration type family. The family
/// (duration / yearMonthDuration / dayTimeDuration) is split in the type
/// lattice, not in the value representation.
///
/// `months` and `seconds` carry their own sign; `nanos` extends `seconds`
/// toward its sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Duration {
    pub months: i32,
    pub seconds: i64,
    pub nanos: u32,
}

impl Duration {
    pub const fn new(months: i32, seconds: i64, nanos: u32) -> Self {
        Self { months, seconds, nanos }
    }

    pub const fn from_seconds(seconds: i64) -> Self {
        Self { months: 0, seconds, nanos: 0 }
    }

    pub fn from_offset(offset: FixedOffset) -> Self {
        Self::from_seconds(i64::from(offset.local_minus_utc()))
    }

    pub fn is_zero(&self) -> bool {
        self.months == 0 && self.seconds == 0 && self.nanos == 0
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&temporal::format_duration(self))
    }
}

/// Atomic scalar values, sub-tagged by primitive type family. Temporal
/// values keep a naive calendar value plus an optional offset so that "no
/// timezone" stays observable and distinct from a zero UTC offset.
#[derive(Debug, Clone, PartialEq)]
pub enum AtomicValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    Double(f64),
    AnyUri(String),
    Date { date: NaiveDate, tz: Option<FixedOffset> },
    Time { time: NaiveTime, tz: Option<FixedOffset> },
    DateTime { dt: NaiveDateTime, tz: Option<FixedOffset> },
    Duration(Duration),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    Atomic(AtomicValue),
    /// Ordered mapping with unique keys.
    Object(Vec<(CompactString, Item)>),
    Array(Vec<Item>),
}

impl Item {
    pub fn string(value: impl Into<String>) -> Self {
        Item::Atomic(AtomicValue::String(value.into()))
    }

    pub fn boolean(value: bool) -> Self {
        Item::Atomic(AtomicValue::Boolean(value))
    }

    pub fn integer(value: i64) -> Self {
        Item::Atomic(AtomicValue::Integer(value))
    }

    pub fn decimal(value: f64) -> Self {
        Item::Atomic(AtomicValue::Decimal(value))
    }

    pub fn double(value: f64) -> Self {
        Item::Atomic(AtomicValue::Double(value))
    }

    pub fn any_uri(value: impl Into<String>) -> Self {
        Item::Atomic(AtomicValue::AnyUri(value.into()))
    }

    pub fn date(date: NaiveDate, tz: Option<FixedOffset>) -> Self {
        Item::Atomic(AtomicValue::Date { date, tz })
    }

    pub fn time(time: NaiveTime, tz: Option<FixedOffset>) -> Self {
        Item::Atomic(AtomicValue::Time { time, tz })
    }

    pub fn date_time(dt: NaiveDateTime, tz: Option<FixedOffset>) -> Self {
        Item::Atomic(AtomicValue::DateTime { dt, tz })
    }

    pub fn duration(value: Duration) -> Self {
        Item::Atomic(AtomicValue::Duration(value))
    }

    pub fn object(pairs: Vec<(CompactString, Item)>) -> Self {
        Item::Object(pairs)
    }

    pub fn array(items: Vec<Item>) -> Self {
        Item::Array(items)
    }

    pub fn as_atomic(&self) -> Option<&AtomicValue> {
        match self {
            Item::Atomic(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&[(CompactString, Item)]> {
        match self {
            Item::Object(pairs) => Some(pairs),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Item]> {
        match self {
            Item::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<&str> {
        match self {
            Item::Atomic(AtomicValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Item::Atomic(AtomicValue::Integer(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn as_date_time(&self) -> Option<(NaiveDateTime, Option<FixedOffset>)> {
        match self {
            Item::Atomic(AtomicValue::DateTime { dt, tz }) => Some((*dt, *tz)),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<(NaiveTime, Option<FixedOffset>)> {
        match self {
            Item::Atomic(AtomicValue::Time { time, tz }) => Some((*time, *tz)),
            _ => None,
        }
    }

    pub fn as_duration(&self) -> Option<Duration> {
        match self {
            Item::Atomic(AtomicValue::Duration(d)) => Some(*d),
            _ => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Item::Object(_))
    }

    /// Whether a temporal item carries a timezone offset. Non-temporal items
    /// report false.
    pub fn has_timezone(&self) -> bool {
        matches!(
            self,
            Item::Atomic(
                AtomicValue::Date { tz: Some(_), .. }
                    | AtomicValue::Time { tz: Some(_), .. }
                    | AtomicValue::DateTime { tz: Some(_), .. }
            )
        )
    }

    /// Built-in name of the item's dynamic type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Item::Atomic(AtomicValue::String(_)) => "string",
            Item::Atomic(AtomicValue::Boolean(_)) => "boolean",
            Item::Atomic(AtomicValue::Integer(_)) => "integer",
            Item::Atomic(AtomicValue::Decimal(_)) => "decimal",
            Item::Atomic(AtomicValue::Double(_)) => "double",
            Item::Atomic(AtomicValue::AnyUri(_)) => "anyURI",
            Item::Atomic(AtomicValue::Date { .. }) => "date",
            Item::Atomic(AtomicValue::Time { .. }) => "time",
            Item::Atomic(AtomicValue::DateTime { .. }) => "dateTime",
            Item::Atomic(AtomicValue::Duration(_)) => "duration",
            Item::Object(_) => "object",
            Item::Array(_) => "array",
        }
    }

    /// Resolve the lattice handle for an atomic item's dynamic type.
    /// Structured items have no atomic type and yield `None`.
    pub fn dynamic_type(&self, registry: &TypeRegistry) -> Option<Arc<ItemType>> {
        match self {
            Item::Atomic(_) => registry.lookup(self.type_name()),
            Item::Object(_) | Item::Array(_) => None,
        }
    }

    /// JSON-ish rendering used in error messages.
    pub fn serialize(&self) -> String {
        self.to_string()
    }
}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    write!(f, "\"")?;
    for c in s.chars() {
        match c {
            '"' => write!(f, "\\\"")?,
            '\\' => write!(f, "\\\\")?,
            _ => write!(f, "{c}")?,
        }
    }
    write!(f, "\"")
}

impl fmt::Display for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Item::Atomic(AtomicValue::String(s)) | Item::Atomic(AtomicValue::AnyUri(s)) => {
                write_escaped(f, s)
            }
            Item::Atomic(AtomicValue::Boolean(b)) => write!(f, "{b}"),
            Item::Atomic(AtomicValue::Integer(i)) => write!(f, "{i}"),
            Item::Atomic(AtomicValue::Decimal(d)) | Item::Atomic(AtomicValue::Double(d)) => {
                write!(f, "{d}")
            }
            Item::Atomic(AtomicValue::Date { date, tz }) => {
                write!(f, "{}", date.format("%Y-%m-%d"))?;
                if let Some(off) = tz {
                    f.write_str(&temporal::format_offset(*off))?;
                }
                Ok(())
            }
            Item::Atomic(AtomicValue::Time { time, tz }) => {
                write!(f, "{}", time.format("%H:%M:%S%.f"))?;
                if let Some(off) = tz {
                    f.write_str(&temporal::format_offset(*off))?;
                }
                Ok(())
            }
            Item::Atomic(AtomicValue::DateTime { dt, tz }) => {
                write!(f, "{}", dt.format("%Y-%m-%dT%H:%M:%S%.f"))?;
                if let Some(off) = tz {
                    f.write_str(&temporal::format_offset(*off))?;
                }
                Ok(())
            }
            Item::Atomic(AtomicValue::Duration(d)) => write!(f, "{d}"),
            Item::Object(pairs) => {
                write!(f, "{{")?;
                for (i, (key, value)) in pairs.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write_escaped(f, key)?;
                    write!(f, ": {value}")?;
                }
                write!(f, "}}")
            }
            Item::Array(items) => {
                write!(f, "[")?;
                for (i, value) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
        }
    }
}

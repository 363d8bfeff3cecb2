//! Runtime casting and type promotion over the lattice.

use std::sync::Arc;

use compact_str::CompactString;

use crate::error::{Error, SourceLocation};
use crate::item::{AtomicValue, Item};
use crate::runtime::context::DynamicContext;
use crate::runtime::iterator::{Cardinality, IteratorState, RuntimeIterator};
use crate::temporal;
use crate::types::registry::TypeRegistry;
use crate::types::{ItemType, PrimitiveKind};

/// Unquoted lexical value of an atomic item, for cast sources and string
/// targets.
fn atomic_lexical(item: &Item) -> String {
    match item {
        Item::Atomic(AtomicValue::String(s)) | Item::Atomic(AtomicValue::AnyUri(s)) => s.clone(),
        other => other.to_string(),
    }
}

fn numeric_as_f64(value: &AtomicValue) -> Option<f64> {
    match value {
        AtomicValue::Integer(i) => Some(*i as f64),
        AtomicValue::Decimal(d) | AtomicValue::Double(d) => Some(*d),
        _ => None,
    }
}

/// Explicit, possibly failing conversion of a single value. The static
/// castability gate has already been consulted; this is the value-level
/// half.
fn cast_value(item: &Item, target: &ItemType, location: SourceLocation) -> Result<Item, Error> {
    let fail = || Error::cast(&atomic_lexical(item), item.type_name(), target.name(), location);
    let value = match item.as_atomic() {
        Some(v) => v,
        None => {
            return Err(Error::unexpected_type(
                format!("cannot cast a {} to an atomic type", item.type_name()),
                location,
            ));
        }
    };
    let Some(kind) = target.primitive_kind() else {
        // Casting to the universal atomic type is the identity.
        return Ok(item.clone());
    };
    match kind {
        PrimitiveKind::String => Ok(Item::string(atomic_lexical(item))),
        PrimitiveKind::AnyUri => match value {
            AtomicValue::AnyUri(_) => Ok(item.clone()),
            AtomicValue::String(s) => Ok(Item::any_uri(s.trim())),
            _ => Err(fail()),
        },
        PrimitiveKind::Boolean => match value {
            AtomicValue::Boolean(_) => Ok(item.clone()),
            AtomicValue::Integer(i) => Ok(Item::boolean(*i != 0)),
            AtomicValue::Decimal(d) | AtomicValue::Double(d) => {
                Ok(Item::boolean(*d != 0.0 && !d.is_nan()))
            }
            AtomicValue::String(s) => match s.trim() {
                "true" | "1" => Ok(Item::boolean(true)),
                "false" | "0" => Ok(Item::boolean(false)),
                _ => Err(fail()),
            },
            _ => Err(fail()),
        },
        PrimitiveKind::Decimal => {
            // integer and int restrict decimal; pick the representation off
            // the target name.
            let integral = target.name() != "decimal";
            match value {
                AtomicValue::Integer(i) => {
                    Ok(if integral { Item::integer(*i) } else { Item::decimal(*i as f64) })
                }
                AtomicValue::Decimal(d) | AtomicValue::Double(d) => {
                    if integral {
                        if d.is_finite() {
                            Ok(Item::integer(d.trunc() as i64))
                        } else {
                            Err(fail())
                        }
                    } else if d.is_finite() {
                        Ok(Item::decimal(*d))
                    } else {
                        Err(fail())
                    }
                }
                AtomicValue::Boolean(b) => {
                    Ok(if integral {
                        Item::integer(i64::from(*b))
                    } else {
                        Item::decimal(f64::from(u8::from(*b)))
                    })
                }
                AtomicValue::String(s) => {
                    if integral {
                        s.trim().parse::<i64>().map(Item::integer).map_err(|_| fail())
                    } else {
                        s.trim().parse::<f64>().map(Item::decimal).map_err(|_| fail())
                    }
                }
                _ => Err(fail()),
            }
        }
        PrimitiveKind::Double | PrimitiveKind::Float => match value {
            AtomicValue::Integer(i) => Ok(Item::double(*i as f64)),
            AtomicValue::Decimal(d) | AtomicValue::Double(d) => Ok(Item::double(*d)),
            AtomicValue::Boolean(b) => Ok(Item::double(f64::from(u8::from(*b)))),
            AtomicValue::String(s) => match s.trim() {
                "NaN" => Ok(Item::double(f64::NAN)),
                "INF" => Ok(Item::double(f64::INFINITY)),
                "-INF" => Ok(Item::double(f64::NEG_INFINITY)),
                t => t.parse::<f64>().map(Item::double).map_err(|_| fail()),
            },
            _ => Err(fail()),
        },
        PrimitiveKind::Date => match value {
            AtomicValue::Date { .. } => Ok(item.clone()),
            AtomicValue::DateTime { dt, tz } => Ok(Item::date(dt.date(), *tz)),
            AtomicValue::String(s) => match temporal::parse_date(s) {
                Some((date, tz)) => Ok(Item::date(date, tz)),
                None => Err(fail()),
            },
            _ => Err(fail()),
        },
        PrimitiveKind::Time => match value {
            AtomicValue::Time { .. } => Ok(item.clone()),
            AtomicValue::DateTime { dt, tz } => Ok(Item::time(dt.time(), *tz)),
            AtomicValue::String(s) => match temporal::parse_time(s) {
                Some((time, tz)) => Ok(Item::time(time, tz)),
                None => Err(fail()),
            },
            _ => Err(fail()),
        },
        PrimitiveKind::DateTime => match value {
            AtomicValue::DateTime { .. } => Ok(item.clone()),
            AtomicValue::Date { date, tz } => {
                Ok(Item::date_time(date.and_time(chrono::NaiveTime::MIN), *tz))
            }
            AtomicValue::String(s) => match temporal::parse_date_time(s) {
                Some((dt, tz)) => Ok(Item::date_time(dt, tz)),
                None => Err(fail()),
            },
            _ => Err(fail()),
        },
        PrimitiveKind::Duration => {
            let parsed = match value {
                AtomicValue::Duration(d) => Some(*d),
                AtomicValue::String(s) => temporal::parse_duration(s),
                _ => None,
            };
            let Some(d) = parsed else { return Err(fail()) };
            // The duration subtypes keep only their own component family.
            match target.name() {
                "yearMonthDuration" => {
                    Ok(Item::duration(crate::item::Duration::new(d.months, 0, 0)))
                }
                "dayTimeDuration" => {
                    Ok(Item::duration(crate::item::Duration::new(0, d.seconds, d.nanos)))
                }
                _ => Ok(Item::duration(d)),
            }
        }
        PrimitiveKind::HexBinary | PrimitiveKind::Base64Binary | PrimitiveKind::Null => Err(
            Error::unexpected_type(
                format!("cast to {} is not supported by the value model", target.name()),
                location,
            ),
        ),
    }
}

/// At-most-one cast operator: converts its single input item to the target
/// atomic type, or passes the empty sequence through.
pub struct CastIterator {
    child: Box<dyn RuntimeIterator>,
    target: Arc<ItemType>,
    registry: Arc<TypeRegistry>,
    state: IteratorState,
    location: SourceLocation,
}

impl CastIterator {
    pub fn new(
        child: Box<dyn RuntimeIterator>,
        target: Arc<ItemType>,
        registry: Arc<TypeRegistry>,
        location: SourceLocation,
    ) -> Self {
        Self { child, target, registry, state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for CastIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("cast", self.location)?;
        let Some(item) = self.child.materialize_first_item_or_none(ctx)? else {
            self.state.open_single(None);
            return Ok(());
        };
        let source_type = item.dynamic_type(&self.registry).ok_or_else(|| {
            Error::unexpected_type(
                format!("cannot cast a {} to an atomic type", item.type_name()),
                self.location,
            )
        })?;
        if !source_type.is_statically_castable_as(&self.target) {
            return Err(Error::cast(
                &atomic_lexical(&item),
                source_type.name(),
                self.target.name(),
                self.location,
            ));
        }
        let result = cast_value(&item, &self.target, self.location)?;
        self.state.open_single(Some(result));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("cast", self.location)
    }

    fn close(&mut self) {
        self.child.close();
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(
            self.child.boxed_clone(),
            self.target.clone(),
            self.registry.clone(),
            self.location,
        ))
    }
}

/// Streaming enforcement of a declared parameter contract: items that are
/// subtypes of the target pass through, promotable items are widened, and
/// everything else fails with a diagnostic that distinguishes wrong type
/// from wrong cardinality.
pub struct TypePromotionIterator {
    child: Box<dyn RuntimeIterator>,
    target: Arc<ItemType>,
    cardinality: Cardinality,
    /// What the contract belongs to, e.g. `parameter $timezone of function
    /// adjust-dateTime-to-timezone`.
    what: CompactString,
    registry: Arc<TypeRegistry>,
    opened: bool,
    lookahead: Option<Item>,
    produced: usize,
    location: SourceLocation,
}

impl TypePromotionIterator {
    pub fn new(
        child: Box<dyn RuntimeIterator>,
        target: Arc<ItemType>,
        cardinality: Cardinality,
        what: impl Into<CompactString>,
        registry: Arc<TypeRegistry>,
        location: SourceLocation,
    ) -> Self {
        Self {
            child,
            target,
            cardinality,
            what: what.into(),
            registry,
            opened: false,
            lookahead: None,
            produced: 0,
            location,
        }
    }

    fn promote(&self, item: Item) -> Result<Item, Error> {
        let Some(actual) = item.dynamic_type(&self.registry) else {
            return Err(Error::unexpected_type(
                format!(
                    "invalid type for {}: {} does not match expected type {}",
                    self.what,
                    item.type_name(),
                    self.target
                ),
                self.location,
            ));
        };
        if actual.is_subtype_of(&self.target) {
            return Ok(item);
        }
        if actual.can_be_promoted_to(&self.target) {
            if self.target.name() == "double"
                && let Item::Atomic(value) = &item
                && let Some(n) = numeric_as_f64(value)
            {
                return Ok(Item::double(n));
            }
            if self.target.name() == "string" {
                return Ok(Item::string(atomic_lexical(&item)));
            }
        }
        Err(Error::unexpected_type(
            format!(
                "invalid type for {}: {} cannot be promoted to expected type {}",
                self.what,
                actual.name(),
                self.target
            ),
            self.location,
        ))
    }

    fn advance(&mut self) -> Result<(), Error> {
        self.lookahead = None;
        if !self.child.has_next() {
            return Ok(());
        }
        if self.produced >= 1
            && matches!(self.cardinality, Cardinality::ZeroOrOne | Cardinality::ExactlyOne)
        {
            return Err(Error::unexpected_type(
                format!(
                    "sequence of more than one item cannot be promoted to {} item of type {} for {}",
                    self.cardinality, self.target, self.what
                ),
                self.location,
            ));
        }
        let item = self.child.next()?;
        let promoted = self.promote(item)?;
        self.lookahead = Some(promoted);
        self.produced += 1;
        Ok(())
    }
}

impl RuntimeIterator for TypePromotionIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        if self.opened {
            return Err(Error::new(
                crate::error::ErrorKind::FlowViolation,
                "open() called on already open iterator: type promotion",
                self.location,
            ));
        }
        self.child.open(ctx)?;
        self.opened = true;
        self.produced = 0;
        self.advance()?;
        if self.lookahead.is_none() && self.cardinality == Cardinality::ExactlyOne {
            return Err(Error::unexpected_type(
                format!(
                    "empty sequence cannot be promoted to exactly one item of type {} for {}",
                    self.target, self.what
                ),
                self.location,
            ));
        }
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.lookahead.is_some()
    }

    fn next(&mut self) -> Result<Item, Error> {
        let Some(item) = self.lookahead.take() else {
            return Err(Error::flow_violation("type promotion", self.location));
        };
        self.advance()?;
        Ok(item)
    }

    fn close(&mut self) {
        self.child.close();
        self.opened = false;
        self.lookahead = None;
        self.produced = 0;
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(
            self.child.boxed_clone(),
            self.target.clone(),
            self.cardinality,
            self.what.clone(),
            self.registry.clone(),
            self.location,
        ))
    }
}

//! Date/time function iterators: constructors, calendar component
//! extraction, and timezone adjustment.

use chrono::{Datelike, Timelike};

use crate::error::{Error, SourceLocation};
use crate::item::Item;
use crate::runtime::context::DynamicContext;
use crate::runtime::iterator::{IteratorState, RuntimeIterator};
use crate::temporal;

/// Constructs a time value from its lexical form.
pub struct TimeIterator {
    child: Box<dyn RuntimeIterator>,
    state: IteratorState,
    location: SourceLocation,
}

impl TimeIterator {
    pub fn new(child: Box<dyn RuntimeIterator>, location: SourceLocation) -> Self {
        Self { child, state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for TimeIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("time function", self.location)?;
        let Some(item) = self.child.materialize_first_item_or_none(ctx)? else {
            self.state.open_single(None);
            return Ok(());
        };
        let Some(lexical) = item.as_string() else {
            return Err(Error::unexpected_type(
                format!("invalid argument of function time(): expected a string, found {}", item.type_name()),
                self.location,
            ));
        };
        let Some((time, tz)) = temporal::parse_time(lexical) else {
            return Err(Error::cast(&item.serialize(), "string", "time", self.location));
        };
        self.state.open_single(Some(Item::time(time, tz)));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("time function", self.location)
    }

    fn close(&mut self) {
        self.child.close();
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(self.child.boxed_clone(), self.location))
    }
}

/// Constructs a dateTime value from its lexical form.
pub struct DateTimeIterator {
    child: Box<dyn RuntimeIterator>,
    state: IteratorState,
    location: SourceLocation,
}

impl DateTimeIterator {
    pub fn new(child: Box<dyn RuntimeIterator>, location: SourceLocation) -> Self {
        Self { child, state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for DateTimeIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("dateTime function", self.location)?;
        let Some(item) = self.child.materialize_first_item_or_none(ctx)? else {
            self.state.open_single(None);
            return Ok(());
        };
        let Some(lexical) = item.as_string() else {
            return Err(Error::unexpected_type(
                format!(
                    "invalid argument of function dateTime(): expected a string, found {}",
                    item.type_name()
                ),
                self.location,
            ));
        };
        let Some((dt, tz)) = temporal::parse_date_time(lexical) else {
            return Err(Error::cast(&item.serialize(), "string", "dateTime", self.location));
        };
        self.state.open_single(Some(Item::date_time(dt, tz)));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("dateTime function", self.location)
    }

    fn close(&mut self) {
        self.child.close();
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(self.child.boxed_clone(), self.location))
    }
}

/// Calendar fields extractable from a dateTime value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeComponent {
    Year,
    Month,
    Day,
    Hours,
    Minutes,
    Seconds,
}

impl DateTimeComponent {
    fn function_name(&self) -> &'static str {
        match self {
            DateTimeComponent::Year => "year-from-dateTime",
            DateTimeComponent::Month => "month-from-dateTime",
            DateTimeComponent::Day => "day-from-dateTime",
            DateTimeComponent::Hours => "hours-from-dateTime",
            DateTimeComponent::Minutes => "minutes-from-dateTime",
            DateTimeComponent::Seconds => "seconds-from-dateTime",
        }
    }
}

/// At-most-one extraction of a calendar field from a dateTime value. An
/// empty input yields the empty sequence, not an error.
pub struct ComponentFromDateTimeIterator {
    child: Box<dyn RuntimeIterator>,
    component: DateTimeComponent,
    state: IteratorState,
    location: SourceLocation,
}

impl ComponentFromDateTimeIterator {
    pub fn new(
        child: Box<dyn RuntimeIterator>,
        component: DateTimeComponent,
        location: SourceLocation,
    ) -> Self {
        Self { child, component, state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for ComponentFromDateTimeIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed(self.component.function_name(), self.location)?;
        let Some(item) = self.child.materialize_first_item_or_none(ctx)? else {
            self.state.open_single(None);
            return Ok(());
        };
        let Some((dt, _tz)) = item.as_date_time() else {
            return Err(Error::unexpected_type(
                format!(
                    "invalid argument of function {}(): expected a dateTime, found {}",
                    self.component.function_name(),
                    item.type_name()
                ),
                self.location,
            ));
        };
        let result = match self.component {
            DateTimeComponent::Year => Item::integer(i64::from(dt.year())),
            DateTimeComponent::Month => Item::integer(i64::from(dt.month())),
            DateTimeComponent::Day => Item::integer(i64::from(dt.day())),
            DateTimeComponent::Hours => Item::integer(i64::from(dt.hour())),
            DateTimeComponent::Minutes => Item::integer(i64::from(dt.minute())),
            DateTimeComponent::Seconds => Item::decimal(
                f64::from(dt.second()) + f64::from(dt.nanosecond()) / 1_000_000_000.0,
            ),
        };
        self.state.open_single(Some(result));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next(self.component.function_name(), self.location)
    }

    fn close(&mut self) {
        self.child.close();
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(self.child.boxed_clone(), self.component, self.location))
    }
}

/// Clock fields extractable from a time value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeComponent {
    Hours,
    Minutes,
    Seconds,
}

impl TimeComponent {
    fn function_name(&self) -> &'static str {
        match self {
            TimeComponent::Hours => "hours-from-time",
            TimeComponent::Minutes => "minutes-from-time",
            TimeComponent::Seconds => "seconds-from-time",
        }
    }
}

/// At-most-one extraction of a clock field from a time value.
pub struct ComponentFromTimeIterator {
    child: Box<dyn RuntimeIterator>,
    component: TimeComponent,
    state: IteratorState,
    location: SourceLocation,
}

impl ComponentFromTimeIterator {
    pub fn new(
        child: Box<dyn RuntimeIterator>,
        component: TimeComponent,
        location: SourceLocation,
    ) -> Self {
        Self { child, component, state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for ComponentFromTimeIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed(self.component.function_name(), self.location)?;
        let Some(item) = self.child.materialize_first_item_or_none(ctx)? else {
            self.state.open_single(None);
            return Ok(());
        };
        let Some((time, _tz)) = item.as_time() else {
            return Err(Error::unexpected_type(
                format!(
                    "invalid argument of function {}(): expected a time, found {}",
                    self.component.function_name(),
                    item.type_name()
                ),
                self.location,
            ));
        };
        let result = match self.component {
            TimeComponent::Hours => Item::integer(i64::from(time.hour())),
            TimeComponent::Minutes => Item::integer(i64::from(time.minute())),
            TimeComponent::Seconds => Item::decimal(
                f64::from(time.second()) + f64::from(time.nanosecond()) / 1_000_000_000.0,
            ),
        };
        self.state.open_single(Some(result));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next(self.component.function_name(), self.location)
    }

    fn close(&mut self) {
        self.child.close();
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(self.child.boxed_clone(), self.component, self.location))
    }
}

/// Validate a timezone-offset argument: a day-time duration within ±14:00
/// on a whole-minute boundary.
fn timezone_offset_argument(
    item: &Item,
    function: &str,
    location: SourceLocation,
) -> Result<chrono::FixedOffset, Error> {
    let Some(duration) = item.as_duration() else {
        return Err(Error::unexpected_type(
            format!(
                "invalid argument of function {}(): expected a dayTimeDuration, found {}",
                function,
                item.type_name()
            ),
            location,
        ));
    };
    temporal::offset_from_duration(&duration).ok_or_else(|| {
        Error::invalid_timezone(
            format!(
                "invalid timezone offset {}: must lie between -PT14H and PT14H on a whole-minute boundary",
                item.serialize()
            ),
            location,
        )
    })
}

/// Adjusts a dateTime value to a timezone.
///
/// With no timezone argument the value is normalized to UTC and marked
/// timezone-present. With an argument that evaluates to the empty sequence
/// the value is returned unchanged. With a present argument the value is
/// converted to the new offset (instant preserved) when it already carries a
/// timezone, or given the offset with its clock fields retained when it does
/// not.
pub struct AdjustDateTimeToTimezoneIterator {
    value: Box<dyn RuntimeIterator>,
    timezone: Option<Box<dyn RuntimeIterator>>,
    state: IteratorState,
    location: SourceLocation,
}

impl AdjustDateTimeToTimezoneIterator {
    pub fn new(
        value: Box<dyn RuntimeIterator>,
        timezone: Option<Box<dyn RuntimeIterator>>,
        location: SourceLocation,
    ) -> Self {
        Self { value, timezone, state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for AdjustDateTimeToTimezoneIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("adjust-dateTime-to-timezone function", self.location)?;
        let Some(item) = self.value.materialize_first_item_or_none(ctx)? else {
            self.state.open_single(None);
            return Ok(());
        };
        let Some((dt, tz)) = item.as_date_time() else {
            return Err(Error::unexpected_type(
                format!(
                    "invalid argument of function adjust-dateTime-to-timezone(): expected a dateTime, found {}",
                    item.type_name()
                ),
                self.location,
            ));
        };
        let timezone_arg = match self.timezone.as_mut() {
            Some(iterator) => iterator.materialize_first_item_or_none(ctx)?,
            None => None,
        };
        let result = match (&self.timezone, timezone_arg) {
            // Arity 1: normalize to UTC. A value without a timezone is
            // reinterpreted as a UTC instant with its clock fields kept.
            (None, _) => {
                let utc = temporal::utc();
                match tz {
                    Some(offset) => Item::date_time(temporal::to_utc(dt, offset), Some(utc)),
                    None => Item::date_time(dt, Some(utc)),
                }
            }
            // Timezone argument present but empty: leave the value as it is,
            // timezone-presence flag included.
            (Some(_), None) => item.clone(),
            (Some(_), Some(tz_item)) => {
                let offset = timezone_offset_argument(
                    &tz_item,
                    "adjust-dateTime-to-timezone",
                    self.location,
                )?;
                match tz {
                    Some(old) => Item::date_time(temporal::rezone(dt, old, offset), Some(offset)),
                    None => Item::date_time(dt, Some(offset)),
                }
            }
        };
        self.state.open_single(Some(result));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("adjust-dateTime-to-timezone function", self.location)
    }

    fn close(&mut self) {
        self.value.close();
        if let Some(timezone) = self.timezone.as_mut() {
            timezone.close();
        }
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(
            self.value.boxed_clone(),
            self.timezone.as_ref().map(|t| t.boxed_clone()),
            self.location,
        ))
    }
}

/// Adjusts a time value to a timezone; same contract as the dateTime
/// variant, with clock arithmetic wrapping around midnight.
pub struct AdjustTimeToTimezoneIterator {
    value: Box<dyn RuntimeIterator>,
    timezone: Option<Box<dyn RuntimeIterator>>,
    state: IteratorState,
    location: SourceLocation,
}

impl AdjustTimeToTimezoneIterator {
    pub fn new(
        value: Box<dyn RuntimeIterator>,
        timezone: Option<Box<dyn RuntimeIterator>>,
        location: SourceLocation,
    ) -> Self {
        Self { value, timezone, state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for AdjustTimeToTimezoneIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("adjust-time-to-timezone function", self.location)?;
        let Some(item) = self.value.materialize_first_item_or_none(ctx)? else {
            self.state.open_single(None);
            return Ok(());
        };
        let Some((time, tz)) = item.as_time() else {
            return Err(Error::unexpected_type(
                format!(
                    "invalid argument of function adjust-time-to-timezone(): expected a time, found {}",
                    item.type_name()
                ),
                self.location,
            ));
        };
        let timezone_arg = match self.timezone.as_mut() {
            Some(iterator) => iterator.materialize_first_item_or_none(ctx)?,
            None => None,
        };
        let result = match (&self.timezone, timezone_arg) {
            (None, _) => {
                let utc = temporal::utc();
                match tz {
                    Some(offset) => Item::time(temporal::time_to_utc(time, offset), Some(utc)),
                    None => Item::time(time, Some(utc)),
                }
            }
            (Some(_), None) => item.clone(),
            (Some(_), Some(tz_item)) => {
                let offset = timezone_offset_argument(
                    &tz_item,
                    "adjust-time-to-timezone",
                    self.location,
                )?;
                match tz {
                    Some(old) => {
                        Item::time(temporal::rezone_time(time, old, offset), Some(offset))
                    }
                    None => Item::time(time, Some(offset)),
                }
            }
        };
        self.state.open_single(Some(result));
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("adjust-time-to-timezone function", self.location)
    }

    fn close(&mut self) {
        self.value.close();
        if let Some(timezone) = self.timezone.as_mut() {
            timezone.close();
        }
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(
            self.value.boxed_clone(),
            self.timezone.as_ref().map(|t| t.boxed_clone()),
            self.location,
        ))
    }
}

//! Facets: constraint values attached to derived atomic types at
//! definition time. A facet bag is immutable after construction; whether a
//! facet may be *used* at all is decided by the owning type's primitive.

use core::fmt;

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::item::Item;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacetKind {
    MinInclusive,
    MaxInclusive,
    MinExclusive,
    MaxExclusive,
    MinLength,
    Length,
    MaxLength,
    TotalDigits,
    FractionDigits,
    Enumeration,
    Constraints,
    ExplicitTimezone,
}

impl FacetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FacetKind::MinInclusive => "minInclusive",
            FacetKind::MaxInclusive => "maxInclusive",
            FacetKind::MinExclusive => "minExclusive",
            FacetKind::MaxExclusive => "maxExclusive",
            FacetKind::MinLength => "minLength",
            FacetKind::Length => "length",
            FacetKind::MaxLength => "maxLength",
            FacetKind::TotalDigits => "totalDigits",
            FacetKind::FractionDigits => "fractionDigits",
            FacetKind::Enumeration => "enumeration",
            FacetKind::Constraints => "constraints",
            FacetKind::ExplicitTimezone => "explicitTimezone",
        }
    }
}

impl fmt::Display for FacetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy for the explicit-timezone facet of temporal types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimezonePolicy {
    Required,
    Prohibited,
    #[default]
    Optional,
}

/// One optional slot per facet kind. Range bounds are items of the
/// restricted value space; constraints are named predicates resolved by the
/// host.
#[derive(Debug, Clone, Default)]
pub struct Facets {
    pub(crate) min_inclusive: Option<Item>,
    pub(crate) max_inclusive: Option<Item>,
    pub(crate) min_exclusive: Option<Item>,
    pub(crate) max_exclusive: Option<Item>,
    pub(crate) min_length: Option<u32>,
    pub(crate) length: Option<u32>,
    pub(crate) max_length: Option<u32>,
    pub(crate) total_digits: Option<u32>,
    pub(crate) fraction_digits: Option<u32>,
    pub(crate) enumeration: Option<Vec<Item>>,
    pub(crate) constraints: SmallVec<[CompactString; 2]>,
    pub(crate) explicit_timezone: Option<TimezonePolicy>,
}

impl Facets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_min_inclusive(mut self, value: Item) -> Self {
        self.min_inclusive = Some(value);
        self
    }

    pub fn with_max_inclusive(mut self, value: Item) -> Self {
        self.max_inclusive = Some(value);
        self
    }

    pub fn with_min_exclusive(mut self, value: Item) -> Self {
        self.min_exclusive = Some(value);
        self
    }

    pub fn with_max_exclusive(mut self, value: Item) -> Self {
        self.max_exclusive = Some(value);
        self
    }

    pub fn with_min_length(mut self, value: u32) -> Self {
        self.min_length = Some(value);
        self
    }

    pub fn with_length(mut self, value: u32) -> Self {
        self.length = Some(value);
        self
    }

    pub fn with_max_length(mut self, value: u32) -> Self {
        self.max_length = Some(value);
        self
    }

    pub fn with_total_digits(mut self, value: u32) -> Self {
        self.total_digits = Some(value);
        self
    }

    pub fn with_fraction_digits(mut self, value: u32) -> Self {
        self.fraction_digits = Some(value);
        self
    }

    pub fn with_enumeration(mut self, values: Vec<Item>) -> Self {
        self.enumeration = Some(values);
        self
    }

    pub fn with_constraint(mut self, name: impl Into<CompactString>) -> Self {
        self.constraints.push(name.into());
        self
    }

    pub fn with_explicit_timezone(mut self, policy: TimezonePolicy) -> Self {
        self.explicit_timezone = Some(policy);
        self
    }

    /// The facet kinds this bag defines locally. Used when a derivation is
    /// validated against the base type's allowed-facet set.
    pub fn defined_kinds(&self) -> SmallVec<[FacetKind; 4]> {
        let mut kinds = SmallVec::new();
        if self.min_inclusive.is_some() {
            kinds.push(FacetKind::MinInclusive);
        }
        if self.max_inclusive.is_some() {
            kinds.push(FacetKind::MaxInclusive);
        }
        if self.min_exclusive.is_some() {
            kinds.push(FacetKind::MinExclusive);
        }
        if self.max_exclusive.is_some() {
            kinds.push(FacetKind::MaxExclusive);
        }
        if self.min_length.is_some() {
            kinds.push(FacetKind::MinLength);
        }
        if self.length.is_some() {
            kinds.push(FacetKind::Length);
        }
        if self.max_length.is_some() {
            kinds.push(FacetKind::MaxLength);
        }
        if self.total_digits.is_some() {
            kinds.push(FacetKind::TotalDigits);
        }
        if self.fraction_digits.is_some() {
            kinds.push(FacetKind::FractionDigits);
        }
        if self.enumeration.is_some() {
            kinds.push(FacetKind::Enumeration);
        }
        if !self.constraints.is_empty() {
            kinds.push(FacetKind::Constraints);
        }
        if self.explicit_timezone.is_some() {
            kinds.push(FacetKind::ExplicitTimezone);
        }
        kinds
    }

    pub fn is_empty(&self) -> bool {
        self.defined_kinds().is_empty()
    }
}

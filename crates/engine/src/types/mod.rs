//! The atomic type lattice: primitive types, facet-restricted derived
//! types, and the subtype / supertype / castability / promotability decision
//! procedures over them.
//!
//! Type identity is name-based: two handles denote the same type iff their
//! canonical names are equal. Base and primitive pointers are `Arc`-shared
//! because many derivations hang off the same ancestors; the whole graph is
//! built once by the [`registry::TypeRegistry`] and never mutated.

pub mod facets;
pub mod registry;

use core::fmt;
use std::sync::Arc;

use compact_str::CompactString;
use itertools::Itertools;
use smallvec::SmallVec;

use crate::error::Error;
use crate::item::Item;
use facets::{FacetKind, Facets, TimezonePolicy};

/// Primitive atomic type families. Each family fixes the facets its
/// descendants may carry and one row of the castability matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    String,
    Boolean,
    Decimal,
    Double,
    Float,
    AnyUri,
    Date,
    Time,
    DateTime,
    Duration,
    HexBinary,
    Base64Binary,
    Null,
}

const RANGE_FACETS: [FacetKind; 6] = [
    FacetKind::MinInclusive,
    FacetKind::MaxInclusive,
    FacetKind::MinExclusive,
    FacetKind::MaxExclusive,
    FacetKind::Enumeration,
    FacetKind::Constraints,
];

const NUMERIC_FACETS: [FacetKind; 8] = [
    FacetKind::MinInclusive,
    FacetKind::MaxInclusive,
    FacetKind::MinExclusive,
    FacetKind::MaxExclusive,
    FacetKind::TotalDigits,
    FacetKind::FractionDigits,
    FacetKind::Enumeration,
    FacetKind::Constraints,
];

const LENGTH_FACETS: [FacetKind; 5] = [
    FacetKind::MinLength,
    FacetKind::Length,
    FacetKind::MaxLength,
    FacetKind::Enumeration,
    FacetKind::Constraints,
];

const TEMPORAL_FACETS: [FacetKind; 7] = [
    FacetKind::MinInclusive,
    FacetKind::MaxInclusive,
    FacetKind::MinExclusive,
    FacetKind::MaxExclusive,
    FacetKind::ExplicitTimezone,
    FacetKind::Enumeration,
    FacetKind::Constraints,
];

const VALUE_FACETS: [FacetKind; 2] = [FacetKind::Enumeration, FacetKind::Constraints];

impl PrimitiveKind {
    pub fn name(&self) -> &'static str {
        match self {
            PrimitiveKind::String => "string",
            PrimitiveKind::Boolean => "boolean",
            PrimitiveKind::Decimal => "decimal",
            PrimitiveKind::Double => "double",
            PrimitiveKind::Float => "float",
            PrimitiveKind::AnyUri => "anyURI",
            PrimitiveKind::Date => "date",
            PrimitiveKind::Time => "time",
            PrimitiveKind::DateTime => "dateTime",
            PrimitiveKind::Duration => "duration",
            PrimitiveKind::HexBinary => "hexBinary",
            PrimitiveKind::Base64Binary => "base64Binary",
            PrimitiveKind::Null => "null",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, PrimitiveKind::Decimal | PrimitiveKind::Double | PrimitiveKind::Float)
    }

    /// The facet kinds any type of this family may carry.
    pub fn allowed_facets(&self) -> &'static [FacetKind] {
        match self {
            PrimitiveKind::String | PrimitiveKind::AnyUri => &LENGTH_FACETS,
            PrimitiveKind::HexBinary | PrimitiveKind::Base64Binary => &LENGTH_FACETS,
            PrimitiveKind::Decimal | PrimitiveKind::Double | PrimitiveKind::Float => {
                &NUMERIC_FACETS
            }
            PrimitiveKind::Date | PrimitiveKind::Time | PrimitiveKind::DateTime => {
                &TEMPORAL_FACETS
            }
            PrimitiveKind::Duration => &RANGE_FACETS,
            PrimitiveKind::Boolean | PrimitiveKind::Null => &VALUE_FACETS,
        }
    }

    /// Fixed primitive-to-primitive castability matrix.
    pub fn castable_to(self, target: PrimitiveKind) -> bool {
        use PrimitiveKind::*;
        if self == target || target == String {
            return true;
        }
        match self {
            // A string's lexical form may denote any value but null.
            String => !matches!(target, Null),
            Boolean => matches!(target, Decimal | Double | Float),
            Decimal | Double | Float => matches!(target, Decimal | Double | Float | Boolean),
            AnyUri => false,
            Date => matches!(target, DateTime),
            DateTime => matches!(target, Date | Time),
            Time => false,
            Duration => false,
            HexBinary => matches!(target, Base64Binary),
            Base64Binary => matches!(target, HexBinary),
            Null => false,
        }
    }
}

#[derive(Debug)]
pub struct PrimitiveAtomicType {
    pub(crate) name: CompactString,
    pub(crate) kind: PrimitiveKind,
    /// Always the universal atomic root.
    pub(crate) base: Arc<ItemType>,
}

#[derive(Debug)]
pub struct DerivedAtomicType {
    pub(crate) name: CompactString,
    pub(crate) base: Arc<ItemType>,
    /// Equals the base's primitive type unless the base is itself primitive.
    pub(crate) primitive: Arc<ItemType>,
    pub(crate) user_defined: bool,
    pub(crate) facets: Facets,
}

/// An atomic item type: the universal root, a primitive family member, or a
/// facet-restricted derivation.
#[derive(Debug)]
pub enum ItemType {
    AnyAtomic,
    Primitive(PrimitiveAtomicType),
    Derived(DerivedAtomicType),
}

pub const ANY_ATOMIC_TYPE_NAME: &str = "anyAtomicType";

impl PartialEq for ItemType {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

impl Eq for ItemType {}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl ItemType {
    pub fn name(&self) -> &str {
        match self {
            ItemType::AnyAtomic => ANY_ATOMIC_TYPE_NAME,
            ItemType::Primitive(p) => &p.name,
            ItemType::Derived(d) => &d.name,
        }
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, ItemType::Primitive(_))
    }

    pub fn is_user_defined(&self) -> bool {
        match self {
            ItemType::Derived(d) => d.user_defined,
            _ => false,
        }
    }

    pub fn base_type(&self) -> Option<&Arc<ItemType>> {
        match self {
            ItemType::AnyAtomic => None,
            ItemType::Primitive(p) => Some(&p.base),
            ItemType::Derived(d) => Some(&d.base),
        }
    }

    /// The primitive family this type restricts. The root has none.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        match self {
            ItemType::AnyAtomic => None,
            ItemType::Primitive(p) => Some(p.kind),
            ItemType::Derived(d) => d.primitive.primitive_kind(),
        }
    }

    /// The primitive ancestor of `ty`: the stored pointer for derivations,
    /// `ty` itself for primitives and the root.
    pub fn primitive_ancestor(ty: &Arc<ItemType>) -> Arc<ItemType> {
        match ty.as_ref() {
            ItemType::Derived(d) => d.primitive.clone(),
            _ => ty.clone(),
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.primitive_kind().is_some_and(|k| k.is_numeric())
    }

    /// Reflexive, transitive walk up the base-type chain. Every atomic type
    /// is a subtype of the root.
    pub fn is_subtype_of(&self, other: &ItemType) -> bool {
        if self == other {
            return true;
        }
        match self.base_type() {
            Some(base) => base.is_subtype_of(other),
            None => false,
        }
    }

    /// Nearest common ancestor of two types in the lattice.
    ///
    /// The recursion reduces `left` through its base chain and normalizes a
    /// user-defined `right` to its base so both walks converge on the
    /// primitive skeleton; the reached ancestor is independent of argument
    /// order even though the paths differ.
    pub fn least_common_supertype(left: &Arc<ItemType>, right: &Arc<ItemType>) -> Arc<ItemType> {
        if left.is_subtype_of(right) {
            return right.clone();
        }
        if right.is_subtype_of(left) {
            return left.clone();
        }
        let reduced = match left.base_type() {
            Some(base) => base.clone(),
            // Unreachable for well-formed graphs: the root is a supertype of
            // every atomic type and is caught above.
            None => return left.clone(),
        };
        let normalized = if right.is_user_defined() {
            right.base_type().cloned().unwrap_or_else(|| right.clone())
        } else {
            right.clone()
        };
        ItemType::least_common_supertype(&reduced, &normalized)
    }

    /// Strip both sides to their nearest non-user-defined ancestor, then
    /// consult the primitive castability matrix.
    pub fn is_statically_castable_as(&self, other: &ItemType) -> bool {
        let mut from = self;
        while from.is_user_defined() {
            match from.base_type() {
                Some(base) => from = base.as_ref(),
                None => break,
            }
        }
        let mut to = other;
        while to.is_user_defined() {
            match to.base_type() {
                Some(base) => to = base.as_ref(),
                None => break,
            }
        }
        if matches!(to, ItemType::AnyAtomic) {
            return true;
        }
        match (from.primitive_kind(), to.primitive_kind()) {
            (Some(source), Some(target)) => source.castable_to(target),
            _ => false,
        }
    }

    /// Closed widening rule table: to `string` for string- and anyURI-derived
    /// types, to `double` for numerics; nothing else promotes.
    pub fn can_be_promoted_to(&self, other: &ItemType) -> bool {
        if other.name() == "string" {
            return self.has_ancestor_named("string") || self.has_ancestor_named("anyURI");
        }
        if other.name() == "double" {
            return self.is_numeric();
        }
        false
    }

    fn has_ancestor_named(&self, name: &str) -> bool {
        if self.name() == name {
            return true;
        }
        match self.base_type() {
            Some(base) => base.has_ancestor_named(name),
            None => false,
        }
    }

    /// Allowed facets are fixed per primitive family; the root allows none.
    pub fn allowed_facets(&self) -> &'static [FacetKind] {
        match self.primitive_kind() {
            Some(kind) => kind.allowed_facets(),
            None => &[],
        }
    }

    fn local_facets(&self) -> Option<&Facets> {
        match self {
            ItemType::Derived(d) => Some(&d.facets),
            _ => None,
        }
    }

    /// Allowed-facet gate, checked before any inheritance walk.
    fn require_facet(&self, kind: FacetKind) -> Result<(), Error> {
        if self.allowed_facets().contains(&kind) {
            return Ok(());
        }
        let allowed = self.allowed_facets().iter().map(FacetKind::as_str).join(", ");
        Err(Error::unsupported_facet(if allowed.is_empty() {
            format!("type {} does not support the {} facet (no facets allowed)", self.name(), kind)
        } else {
            format!("type {} does not support the {} facet (allowed: {})", self.name(), kind, allowed)
        }))
    }

    /// Walk toward the root for the nearest locally defined value. The
    /// allowed-facet gate has already been passed at this point.
    fn walk_item_facet<'a>(
        &'a self,
        select: fn(&Facets) -> Option<&Item>,
    ) -> Option<&'a Item> {
        if let Some(facets) = self.local_facets()
            && let Some(value) = select(facets)
        {
            return Some(value);
        }
        self.base_type().and_then(|base| base.walk_item_facet(select))
    }

    fn walk_count_facet(&self, select: fn(&Facets) -> Option<u32>) -> Option<u32> {
        if let Some(facets) = self.local_facets()
            && let Some(value) = select(facets)
        {
            return Some(value);
        }
        self.base_type().and_then(|base| base.walk_count_facet(select))
    }

    fn inherited_item_facet(
        &self,
        kind: FacetKind,
        select: fn(&Facets) -> Option<&Item>,
    ) -> Result<Option<&Item>, Error> {
        self.require_facet(kind)?;
        Ok(self.walk_item_facet(select))
    }

    fn inherited_count_facet(
        &self,
        kind: FacetKind,
        select: fn(&Facets) -> Option<u32>,
    ) -> Result<Option<u32>, Error> {
        self.require_facet(kind)?;
        Ok(self.walk_count_facet(select))
    }

    pub fn min_inclusive_facet(&self) -> Result<Option<&Item>, Error> {
        self.inherited_item_facet(FacetKind::MinInclusive, |f| f.min_inclusive.as_ref())
    }

    pub fn max_inclusive_facet(&self) -> Result<Option<&Item>, Error> {
        self.inherited_item_facet(FacetKind::MaxInclusive, |f| f.max_inclusive.as_ref())
    }

    pub fn min_exclusive_facet(&self) -> Result<Option<&Item>, Error> {
        self.inherited_item_facet(FacetKind::MinExclusive, |f| f.min_exclusive.as_ref())
    }

    pub fn max_exclusive_facet(&self) -> Result<Option<&Item>, Error> {
        self.inherited_item_facet(FacetKind::MaxExclusive, |f| f.max_exclusive.as_ref())
    }

    pub fn min_length_facet(&self) -> Result<Option<u32>, Error> {
        self.inherited_count_facet(FacetKind::MinLength, |f| f.min_length)
    }

    pub fn length_facet(&self) -> Result<Option<u32>, Error> {
        self.inherited_count_facet(FacetKind::Length, |f| f.length)
    }

    pub fn max_length_facet(&self) -> Result<Option<u32>, Error> {
        self.inherited_count_facet(FacetKind::MaxLength, |f| f.max_length)
    }

    pub fn total_digits_facet(&self) -> Result<Option<u32>, Error> {
        self.inherited_count_facet(FacetKind::TotalDigits, |f| f.total_digits)
    }

    pub fn fraction_digits_facet(&self) -> Result<Option<u32>, Error> {
        self.inherited_count_facet(FacetKind::FractionDigits, |f| f.fraction_digits)
    }

    pub fn enumeration_facet(&self) -> Result<Option<&[Item]>, Error> {
        self.require_facet(FacetKind::Enumeration)?;
        let mut current = self;
        loop {
            if let Some(facets) = current.local_facets()
                && let Some(values) = facets.enumeration.as_deref()
            {
                return Ok(Some(values));
            }
            match current.base_type() {
                Some(base) => current = base.as_ref(),
                None => return Ok(None),
            }
        }
    }

    /// Constraints accumulate down the chain: the result is the union of the
    /// base type's constraints and the local ones, base-first.
    pub fn constraints_facet(&self) -> Result<SmallVec<[CompactString; 2]>, Error> {
        self.require_facet(FacetKind::Constraints)?;
        let mut chain = SmallVec::<[&ItemType; 4]>::new();
        let mut current = self;
        loop {
            chain.push(current);
            match current.base_type() {
                Some(base) => current = base.as_ref(),
                None => break,
            }
        }
        let mut union = SmallVec::new();
        for ty in chain.iter().rev() {
            if let Some(facets) = ty.local_facets() {
                union.extend(facets.constraints.iter().cloned());
            }
        }
        Ok(union)
    }

    /// Explicit-timezone policy; unset anywhere in the chain means Optional.
    pub fn explicit_timezone_facet(&self) -> Result<TimezonePolicy, Error> {
        self.require_facet(FacetKind::ExplicitTimezone)?;
        let mut current = self;
        loop {
            if let Some(facets) = current.local_facets()
                && let Some(policy) = facets.explicit_timezone
            {
                return Ok(policy);
            }
            match current.base_type() {
                Some(base) => current = base.as_ref(),
                None => return Ok(TimezonePolicy::Optional),
            }
        }
    }
}

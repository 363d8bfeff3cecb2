//! Process-scoped type catalogue. Built once at startup, passed by
//! reference into the components that need it, never mutated after setup
//! apart from explicit user-type derivation.

use std::collections::HashMap;
use std::sync::Arc;

use compact_str::CompactString;

use crate::error::Error;
use crate::item::Item;
use crate::types::facets::Facets;
use crate::types::{DerivedAtomicType, ItemType, PrimitiveAtomicType, PrimitiveKind};

pub struct TypeRegistry {
    by_name: HashMap<CompactString, Arc<ItemType>>,
    any_atomic: Arc<ItemType>,
    string: Arc<ItemType>,
    boolean: Arc<ItemType>,
    decimal: Arc<ItemType>,
    integer: Arc<ItemType>,
    int: Arc<ItemType>,
    double: Arc<ItemType>,
    any_uri: Arc<ItemType>,
    date: Arc<ItemType>,
    time: Arc<ItemType>,
    date_time: Arc<ItemType>,
    duration: Arc<ItemType>,
    day_time_duration: Arc<ItemType>,
}

impl TypeRegistry {
    /// Install the built-in catalogue: the universal atomic root, the
    /// primitive families, and the built-in derived types (integer, int,
    /// yearMonthDuration, dayTimeDuration).
    pub fn with_builtins() -> Self {
        let any_atomic = Arc::new(ItemType::AnyAtomic);
        let mut by_name: HashMap<CompactString, Arc<ItemType>> = HashMap::new();
        by_name.insert(CompactString::from(any_atomic.name()), any_atomic.clone());

        let mut primitive = |kind: PrimitiveKind| {
            let ty = Arc::new(ItemType::Primitive(PrimitiveAtomicType {
                name: CompactString::from(kind.name()),
                kind,
                base: any_atomic.clone(),
            }));
            by_name.insert(CompactString::from(kind.name()), ty.clone());
            ty
        };

        let string = primitive(PrimitiveKind::String);
        let boolean = primitive(PrimitiveKind::Boolean);
        let decimal = primitive(PrimitiveKind::Decimal);
        let double = primitive(PrimitiveKind::Double);
        primitive(PrimitiveKind::Float);
        let any_uri = primitive(PrimitiveKind::AnyUri);
        let date = primitive(PrimitiveKind::Date);
        let time = primitive(PrimitiveKind::Time);
        let date_time = primitive(PrimitiveKind::DateTime);
        let duration = primitive(PrimitiveKind::Duration);
        primitive(PrimitiveKind::HexBinary);
        primitive(PrimitiveKind::Base64Binary);
        primitive(PrimitiveKind::Null);

        let mut builtin_derived = |name: &str, base: &Arc<ItemType>, facets: Facets| {
            let ty = Arc::new(ItemType::Derived(DerivedAtomicType {
                name: CompactString::from(name),
                base: base.clone(),
                primitive: ItemType::primitive_ancestor(base),
                user_defined: false,
                facets,
            }));
            by_name.insert(CompactString::from(name), ty.clone());
            ty
        };

        let integer =
            builtin_derived("integer", &decimal, Facets::new().with_fraction_digits(0));
        let int = builtin_derived(
            "int",
            &integer,
            Facets::new()
                .with_min_inclusive(Item::integer(i64::from(i32::MIN)))
                .with_max_inclusive(Item::integer(i64::from(i32::MAX))),
        );
        builtin_derived("yearMonthDuration", &duration, Facets::new());
        let day_time_duration = builtin_derived("dayTimeDuration", &duration, Facets::new());

        Self {
            by_name,
            any_atomic,
            string,
            boolean,
            decimal,
            integer,
            int,
            double,
            any_uri,
            date,
            time,
            date_time,
            duration,
            day_time_duration,
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Arc<ItemType>> {
        self.by_name.get(name).cloned()
    }

    /// Register a user-defined restriction of `base`. Every facet supplied
    /// must be allowed for the base's primitive family.
    pub fn derive(
        &mut self,
        name: &str,
        base: &Arc<ItemType>,
        facets: Facets,
    ) -> Result<Arc<ItemType>, Error> {
        if self.by_name.contains_key(name) {
            return Err(Error::duplicate_type(name));
        }
        for kind in facets.defined_kinds() {
            if !base.allowed_facets().contains(&kind) {
                return Err(Error::unsupported_facet(format!(
                    "facet {} is not allowed when restricting type {}",
                    kind,
                    base.name()
                )));
            }
        }
        let ty = Arc::new(ItemType::Derived(DerivedAtomicType {
            name: CompactString::from(name),
            base: base.clone(),
            primitive: ItemType::primitive_ancestor(base),
            user_defined: true,
            facets,
        }));
        tracing::debug!(name, base = base.name(), "registered derived atomic type");
        self.by_name.insert(CompactString::from(name), ty.clone());
        Ok(ty)
    }

    pub fn any_atomic_type(&self) -> Arc<ItemType> {
        self.any_atomic.clone()
    }

    pub fn string_type(&self) -> Arc<ItemType> {
        self.string.clone()
    }

    pub fn boolean_type(&self) -> Arc<ItemType> {
        self.boolean.clone()
    }

    pub fn decimal_type(&self) -> Arc<ItemType> {
        self.decimal.clone()
    }

    pub fn integer_type(&self) -> Arc<ItemType> {
        self.integer.clone()
    }

    pub fn int_type(&self) -> Arc<ItemType> {
        self.int.clone()
    }

    pub fn double_type(&self) -> Arc<ItemType> {
        self.double.clone()
    }

    pub fn any_uri_type(&self) -> Arc<ItemType> {
        self.any_uri.clone()
    }

    pub fn date_type(&self) -> Arc<ItemType> {
        self.date.clone()
    }

    pub fn time_type(&self) -> Arc<ItemType> {
        self.time.clone()
    }

    pub fn date_time_type(&self) -> Arc<ItemType> {
        self.date_time.clone()
    }

    pub fn duration_type(&self) -> Arc<ItemType> {
        self.duration.clone()
    }

    pub fn day_time_duration_type(&self) -> Arc<ItemType> {
        self.day_time_duration.clone()
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

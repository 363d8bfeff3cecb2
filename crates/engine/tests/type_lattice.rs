//! Subtype, supertype, castability and promotion behavior of the lattice.

use onyq_engine::{Facets, Item, ItemType, TypeRegistry};
use rstest::rstest;
use std::sync::Arc;

fn registry_with_user_types() -> (TypeRegistry, Arc<ItemType>, Arc<ItemType>) {
    let mut registry = TypeRegistry::with_builtins();
    let int = registry.int_type();
    let positive_year = registry
        .derive("positiveYear", &int, Facets::new().with_min_inclusive(Item::integer(1)))
        .unwrap();
    let string = registry.string_type();
    let token = registry
        .derive("token", &string, Facets::new().with_min_length(1))
        .unwrap();
    (registry, positive_year, token)
}

#[rstest]
#[case("string")]
#[case("boolean")]
#[case("integer")]
#[case("int")]
#[case("double")]
#[case("dateTime")]
#[case("duration")]
#[case("anyAtomicType")]
fn subtype_is_reflexive(#[case] name: &str) {
    let registry = TypeRegistry::with_builtins();
    let ty = registry.lookup(name).unwrap();
    assert!(ty.is_subtype_of(&ty));
}

#[rstest]
fn subtype_walks_the_whole_chain() {
    let (registry, positive_year, _) = registry_with_user_types();
    assert!(positive_year.is_subtype_of(&registry.int_type()));
    assert!(positive_year.is_subtype_of(&registry.integer_type()));
    assert!(positive_year.is_subtype_of(&registry.decimal_type()));
    assert!(positive_year.is_subtype_of(&registry.any_atomic_type()));
    assert!(!positive_year.is_subtype_of(&registry.double_type()));
    assert!(!registry.int_type().is_subtype_of(&positive_year));
}

#[rstest]
fn subtype_is_transitive_over_builtins() {
    let registry = TypeRegistry::with_builtins();
    let int = registry.int_type();
    let integer = registry.integer_type();
    let decimal = registry.decimal_type();
    assert!(int.is_subtype_of(&integer));
    assert!(integer.is_subtype_of(&decimal));
    assert!(int.is_subtype_of(&decimal));
}

#[rstest]
fn least_common_supertype_is_idempotent() {
    let (_, positive_year, _) = registry_with_user_types();
    let lcs = ItemType::least_common_supertype(&positive_year, &positive_year);
    assert_eq!(*lcs, *positive_year);
}

#[rstest]
fn least_common_supertype_of_sub_and_super() {
    let (registry, positive_year, _) = registry_with_user_types();
    let integer = registry.integer_type();
    let a = ItemType::least_common_supertype(&positive_year, &integer);
    let b = ItemType::least_common_supertype(&integer, &positive_year);
    assert_eq!(*a, *integer);
    assert_eq!(*a, *b);
}

#[rstest]
fn least_common_supertype_across_branches_reaches_the_root() {
    let registry = TypeRegistry::with_builtins();
    let int = registry.int_type();
    let double = registry.double_type();
    let a = ItemType::least_common_supertype(&int, &double);
    let b = ItemType::least_common_supertype(&double, &int);
    assert_eq!(a.name(), "anyAtomicType");
    assert_eq!(*a, *b);
}

#[rstest]
fn least_common_supertype_is_symmetric_for_user_types() {
    let (_, positive_year, token) = registry_with_user_types();
    let a = ItemType::least_common_supertype(&positive_year, &token);
    let b = ItemType::least_common_supertype(&token, &positive_year);
    assert_eq!(*a, *b);
    assert_eq!(a.name(), "anyAtomicType");
}

#[rstest]
fn user_types_share_ancestors_through_the_same_branch() {
    let mut registry = TypeRegistry::with_builtins();
    let int = registry.int_type();
    let positive = registry
        .derive("positive", &int, Facets::new().with_min_inclusive(Item::integer(1)))
        .unwrap();
    let negative = registry
        .derive("negative", &int, Facets::new().with_max_inclusive(Item::integer(-1)))
        .unwrap();
    let a = ItemType::least_common_supertype(&positive, &negative);
    let b = ItemType::least_common_supertype(&negative, &positive);
    assert_eq!(*a, *int);
    assert_eq!(*a, *b);
}

#[rstest]
fn castability_strips_user_defined_layers() {
    let (registry, positive_year, _) = registry_with_user_types();
    assert!(positive_year.is_statically_castable_as(&registry.string_type()));
    assert!(positive_year.is_statically_castable_as(&registry.double_type()));
    assert!(positive_year.is_statically_castable_as(&registry.boolean_type()));
    assert!(!positive_year.is_statically_castable_as(&registry.date_time_type()));
}

#[rstest]
fn string_casts_to_temporal_targets() {
    let registry = TypeRegistry::with_builtins();
    let string = registry.string_type();
    assert!(string.is_statically_castable_as(&registry.time_type()));
    assert!(string.is_statically_castable_as(&registry.date_time_type()));
    assert!(string.is_statically_castable_as(&registry.duration_type()));
}

#[rstest]
fn boolean_does_not_cast_to_temporal_targets() {
    let registry = TypeRegistry::with_builtins();
    let boolean = registry.boolean_type();
    assert!(!boolean.is_statically_castable_as(&registry.date_type()));
    assert!(!boolean.is_statically_castable_as(&registry.duration_type()));
}

#[rstest]
fn numeric_types_promote_to_double() {
    let (registry, positive_year, token) = registry_with_user_types();
    let double = registry.double_type();
    assert!(positive_year.can_be_promoted_to(&double));
    assert!(registry.integer_type().can_be_promoted_to(&double));
    assert!(registry.decimal_type().can_be_promoted_to(&double));
    assert!(!token.can_be_promoted_to(&double));
    assert!(!registry.date_type().can_be_promoted_to(&double));
}

#[rstest]
fn string_and_uri_types_promote_to_string() {
    let (registry, positive_year, token) = registry_with_user_types();
    let string = registry.string_type();
    assert!(token.can_be_promoted_to(&string));
    assert!(registry.any_uri_type().can_be_promoted_to(&string));
    assert!(!positive_year.can_be_promoted_to(&string));
}

#[rstest]
fn nothing_promotes_to_other_targets() {
    let registry = TypeRegistry::with_builtins();
    let integer = registry.integer_type();
    assert!(!integer.can_be_promoted_to(&registry.decimal_type()));
    assert!(!integer.can_be_promoted_to(&registry.boolean_type()));
}

#[rstest]
fn equality_is_name_based() {
    let registry = TypeRegistry::with_builtins();
    let a = registry.lookup("integer").unwrap();
    let b = registry.integer_type();
    assert_eq!(*a, *b);
    assert_ne!(*a, *registry.int_type());
}

#[rstest]
fn derived_types_report_their_primitive() {
    let (registry, positive_year, token) = registry_with_user_types();
    assert_eq!(ItemType::primitive_ancestor(&positive_year).name(), "decimal");
    assert_eq!(ItemType::primitive_ancestor(&token).name(), "string");
    assert_eq!(ItemType::primitive_ancestor(&registry.day_time_duration_type()).name(), "duration");
}

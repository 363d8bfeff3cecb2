//! Runtime casting and parameter-contract promotion.

use std::sync::Arc;

use chrono::NaiveTime;
use onyq_engine::runtime::sequences::SequenceIterator;
use onyq_engine::runtime::typing::{CastIterator, TypePromotionIterator};
use onyq_engine::{
    Cardinality, DynamicContext, ErrorKind, Item, RuntimeIterator, SourceLocation, TypeRegistry,
};
use rstest::rstest;

fn loc() -> SourceLocation {
    SourceLocation::new(1, 1)
}

fn source(items: Vec<Item>) -> Box<dyn RuntimeIterator> {
    Box::new(SequenceIterator::new(items, loc()))
}

#[rstest]
fn cast_string_to_time_parses_the_lexical_form() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = CastIterator::new(
        source(vec![Item::string("09:45:00+02:00")]),
        registry.time_type(),
        registry.clone(),
        loc(),
    );
    let result = iterator.materialize_first_item_or_none(&ctx).unwrap().unwrap();
    let (time, tz) = result.as_time().unwrap();
    assert_eq!(time, NaiveTime::from_hms_opt(9, 45, 0).unwrap());
    assert_eq!(tz.unwrap().local_minus_utc(), 2 * 3600);
}

#[rstest]
fn failed_cast_reports_value_source_and_target() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = CastIterator::new(
        source(vec![Item::string("2024-13-99")]),
        registry.date_type(),
        registry.clone(),
        loc(),
    );
    let err = iterator.open(&ctx).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cast);
    assert!(err.message.contains("2024-13-99"));
    assert!(err.message.contains("string"));
    assert!(err.message.contains("date"));
}

#[rstest]
fn statically_impossible_casts_fail_without_parsing() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = CastIterator::new(
        source(vec![Item::boolean(true)]),
        registry.date_time_type(),
        registry.clone(),
        loc(),
    );
    let err = iterator.open(&ctx).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cast);
}

#[rstest]
fn cast_integer_to_string_serializes() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = CastIterator::new(
        source(vec![Item::integer(42)]),
        registry.string_type(),
        registry.clone(),
        loc(),
    );
    assert_eq!(
        iterator.materialize_first_item_or_none(&ctx).unwrap(),
        Some(Item::string("42"))
    );
}

#[rstest]
fn cast_string_to_day_time_duration_keeps_the_day_time_part() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = CastIterator::new(
        source(vec![Item::string("PT5H30M")]),
        registry.day_time_duration_type(),
        registry.clone(),
        loc(),
    );
    let result = iterator.materialize_first_item_or_none(&ctx).unwrap().unwrap();
    let duration = result.as_duration().unwrap();
    assert_eq!(duration.months, 0);
    assert_eq!(duration.seconds, 5 * 3600 + 30 * 60);
}

#[rstest]
fn cast_of_the_empty_sequence_is_empty() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator =
        CastIterator::new(source(vec![]), registry.time_type(), registry.clone(), loc());
    assert_eq!(iterator.materialize_first_item_or_none(&ctx).unwrap(), None);
}

#[rstest]
fn cast_of_an_object_is_a_type_error() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = CastIterator::new(
        source(vec![Item::object(vec![])]),
        registry.string_type(),
        registry.clone(),
        loc(),
    );
    let err = iterator.open(&ctx).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedType);
}

#[rstest]
fn promotion_widens_integers_to_double() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = TypePromotionIterator::new(
        source(vec![Item::integer(1), Item::decimal(2.5)]),
        registry.double_type(),
        Cardinality::ZeroOrMore,
        "parameter $values of function sum",
        registry.clone(),
        loc(),
    );
    assert_eq!(
        iterator.materialize(&ctx).unwrap(),
        vec![Item::double(1.0), Item::double(2.5)]
    );
}

#[rstest]
fn promotion_passes_subtypes_through_unchanged() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = TypePromotionIterator::new(
        source(vec![Item::integer(7)]),
        registry.decimal_type(),
        Cardinality::ExactlyOne,
        "parameter $n of function abs",
        registry.clone(),
        loc(),
    );
    assert_eq!(iterator.materialize(&ctx).unwrap(), vec![Item::integer(7)]);
}

#[rstest]
fn promotion_widens_uris_to_string() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = TypePromotionIterator::new(
        source(vec![Item::any_uri("http://example.com/a")]),
        registry.string_type(),
        Cardinality::ExactlyOne,
        "parameter $input of function concat",
        registry.clone(),
        loc(),
    );
    assert_eq!(
        iterator.materialize(&ctx).unwrap(),
        vec![Item::string("http://example.com/a")]
    );
}

#[rstest]
fn wrong_type_and_wrong_cardinality_produce_distinct_diagnostics() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();

    let mut wrong_type = TypePromotionIterator::new(
        source(vec![Item::boolean(true)]),
        registry.double_type(),
        Cardinality::ExactlyOne,
        "parameter $n of function round",
        registry.clone(),
        loc(),
    );
    let err = wrong_type.materialize(&ctx).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedType);
    assert!(err.message.contains("cannot be promoted"));
    assert!(!err.message.contains("more than one"));

    let mut too_many = TypePromotionIterator::new(
        source(vec![Item::integer(1), Item::integer(2)]),
        registry.double_type(),
        Cardinality::ExactlyOne,
        "parameter $n of function round",
        registry.clone(),
        loc(),
    );
    let err = too_many.materialize(&ctx).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedType);
    assert!(err.message.contains("more than one item"));
}

#[rstest]
fn exactly_one_promotion_rejects_the_empty_sequence() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();
    let mut iterator = TypePromotionIterator::new(
        source(vec![]),
        registry.double_type(),
        Cardinality::ExactlyOne,
        "parameter $n of function round",
        registry.clone(),
        loc(),
    );
    let err = iterator.materialize(&ctx).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedType);
    assert!(err.message.contains("empty sequence"));
}

#[rstest]
fn zero_or_one_promotion_accepts_empty_and_single() {
    let registry = Arc::new(TypeRegistry::with_builtins());
    let ctx = DynamicContext::new();

    let mut empty = TypePromotionIterator::new(
        source(vec![]),
        registry.double_type(),
        Cardinality::ZeroOrOne,
        "parameter $n of function round",
        registry.clone(),
        loc(),
    );
    assert_eq!(empty.materialize(&ctx).unwrap(), Vec::<Item>::new());

    let mut single = TypePromotionIterator::new(
        source(vec![Item::integer(3)]),
        registry.double_type(),
        Cardinality::ZeroOrOne,
        "parameter $n of function round",
        registry.clone(),
        loc(),
    );
    assert_eq!(single.materialize(&ctx).unwrap(), vec![Item::double(3.0)]);
}

#[rstest]
fn promotion_into_user_defined_targets_uses_the_subtype_walk() {
    let mut registry = TypeRegistry::with_builtins();
    let int = registry.int_type();
    let positive_year = registry
        .derive(
            "positiveYear",
            &int,
            onyq_engine::Facets::new().with_min_inclusive(Item::integer(1)),
        )
        .unwrap();
    let registry = Arc::new(registry);
    let ctx = DynamicContext::new();

    // integer is not a subtype of positiveYear and cannot be promoted to it.
    let mut iterator = TypePromotionIterator::new(
        source(vec![Item::integer(2024)]),
        positive_year,
        Cardinality::ExactlyOne,
        "parameter $year of function era",
        registry.clone(),
        loc(),
    );
    let err = iterator.materialize(&ctx).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnexpectedType);
}

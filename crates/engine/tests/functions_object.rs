//! Descendant-object projection over nested structures.

use compact_str::CompactString;
use onyq_engine::runtime::functions::object::DescendantObjectsIterator;
use onyq_engine::runtime::sequences::SequenceIterator;
use onyq_engine::{DynamicContext, Item, RuntimeIterator, SourceLocation};
use rstest::rstest;

fn loc() -> SourceLocation {
    SourceLocation::new(1, 1)
}

fn source(items: Vec<Item>) -> Box<dyn RuntimeIterator> {
    Box::new(SequenceIterator::new(items, loc()))
}

fn obj(pairs: Vec<(&str, Item)>) -> Item {
    Item::object(pairs.into_iter().map(|(k, v)| (CompactString::from(k), v)).collect())
}

#[rstest]
fn top_level_object_and_nested_object_are_both_emitted() {
    let ctx = DynamicContext::new();
    let nested = obj(vec![("c", Item::integer(2))]);
    let input = obj(vec![("a", Item::integer(1)), ("b", nested.clone())]);

    let mut iterator = DescendantObjectsIterator::new(source(vec![input.clone()]), loc());
    let results = iterator.materialize(&ctx).unwrap();
    assert_eq!(results, vec![input, nested]);
}

#[rstest]
fn non_object_items_pass_through_unchanged() {
    let ctx = DynamicContext::new();
    let input = vec![Item::integer(1), Item::string("x"), Item::array(vec![Item::integer(2)])];
    let mut iterator = DescendantObjectsIterator::new(source(input.clone()), loc());
    assert_eq!(iterator.materialize(&ctx).unwrap(), input);
}

#[rstest]
fn descent_reaches_objects_inside_arrays_and_deep_nesting() {
    let ctx = DynamicContext::new();
    let deepest = obj(vec![("z", Item::integer(3))]);
    let middle = obj(vec![("deep", deepest.clone())]);
    let input = obj(vec![
        ("list", Item::array(vec![Item::integer(1), middle.clone()])),
        ("flat", Item::boolean(true)),
    ]);

    let mut iterator = DescendantObjectsIterator::new(source(vec![input.clone()]), loc());
    let results = iterator.materialize(&ctx).unwrap();
    assert_eq!(results, vec![input, middle, deepest]);
}

#[rstest]
fn empty_input_produces_an_empty_sequence() {
    let ctx = DynamicContext::new();
    let mut iterator = DescendantObjectsIterator::new(source(vec![]), loc());
    assert_eq!(iterator.materialize(&ctx).unwrap(), Vec::<Item>::new());
}

#[rstest]
fn close_releases_the_buffer_and_open_restarts() {
    let ctx = DynamicContext::new();
    let input = obj(vec![("a", obj(vec![("b", Item::integer(1))]))]);
    let mut iterator = DescendantObjectsIterator::new(source(vec![input.clone()]), loc());

    iterator.open(&ctx).unwrap();
    assert!(iterator.has_next());
    iterator.next().unwrap();
    iterator.close();
    assert!(!iterator.has_next());

    let replay = iterator.materialize(&ctx).unwrap();
    assert_eq!(replay.len(), 2);
    assert_eq!(replay[0], input);
}

#[rstest]
fn mixed_sequences_keep_input_order() {
    let ctx = DynamicContext::new();
    let first = obj(vec![("a", Item::integer(1))]);
    let second = obj(vec![("b", obj(vec![("c", Item::integer(2))]))]);
    let input = vec![first.clone(), Item::string("between"), second.clone()];

    let mut iterator = DescendantObjectsIterator::new(source(input), loc());
    let results = iterator.materialize(&ctx).unwrap();
    assert_eq!(results.len(), 4);
    assert_eq!(results[0], first);
    assert_eq!(results[1], Item::string("between"));
    assert_eq!(results[2], second);
    assert_eq!(results[3], obj(vec![("c", Item::integer(2))]));
}

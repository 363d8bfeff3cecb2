//! Object projection over nested structures.

use crate::error::{Error, SourceLocation};
use crate::item::Item;
use crate::runtime::context::DynamicContext;
use crate::runtime::iterator::{IteratorState, RuntimeIterator};

/// Emits, for every object in its input, the object itself followed by all
/// descendant objects found by walking nested values (arrays included);
/// non-object items pass through unchanged.
///
/// The entire input is materialized at `open` because the recursive-descent
/// contract needs full knowledge of each item before emitting. This is a
/// documented exception to the streaming contract; the buffer is released
/// by `close`.
pub struct DescendantObjectsIterator {
    child: Box<dyn RuntimeIterator>,
    state: IteratorState,
    location: SourceLocation,
}

impl DescendantObjectsIterator {
    pub fn new(child: Box<dyn RuntimeIterator>, location: SourceLocation) -> Self {
        Self { child, state: IteratorState::Closed, location }
    }

    fn collect_object(item: &Item, out: &mut Vec<Item>) {
        out.push(item.clone());
        if let Item::Object(pairs) = item {
            for (_key, value) in pairs {
                Self::descend(value, out);
            }
        }
    }

    fn descend(value: &Item, out: &mut Vec<Item>) {
        match value {
            Item::Object(_) => Self::collect_object(value, out),
            Item::Array(items) => {
                for element in items {
                    Self::descend(element, out);
                }
            }
            Item::Atomic(_) => {}
        }
    }
}

impl RuntimeIterator for DescendantObjectsIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("descendant-objects function", self.location)?;
        let input = self.child.materialize(ctx)?;
        let mut results = Vec::with_capacity(input.len());
        for item in &input {
            if item.is_object() {
                Self::collect_object(item, &mut results);
            } else {
                results.push(item.clone());
            }
        }
        tracing::trace!(input = input.len(), buffered = results.len(), "descendant-objects materialized");
        self.state.open_buffered(results);
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("descendant-objects function", self.location)
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

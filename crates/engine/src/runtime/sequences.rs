//! Source leaves: materialized literal sequences, variable references and
//! focus access.

use compact_str::CompactString;

use crate::error::{Error, SourceLocation};
use crate::item::Item;
use crate::runtime::context::DynamicContext;
use crate::runtime::iterator::{IteratorState, RuntimeIterator};

/// Yields a fixed, pre-materialized list of items (compiler-provided
/// literals or constant-folded results). Restartable.
pub struct SequenceIterator {
    items: Vec<Item>,
    state: IteratorState,
    location: SourceLocation,
}

impl SequenceIterator {
    pub fn new(items: Vec<Item>, location: SourceLocation) -> Self {
        Self { items, state: IteratorState::Closed, location }
    }

    pub fn empty(location: SourceLocation) -> Self {
        Self::new(Vec::new(), location)
    }
}

impl RuntimeIterator for SequenceIterator {
    fn open(&mut self, _ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("sequence", self.location)?;
        self.state.open_buffered(self.items.clone());
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("sequence", self.location)
    }

    fn close(&mut self) {
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(self.items.clone(), self.location))
    }
}

/// Resolves a variable name against the dynamic context at `open`.
pub struct VariableReferenceIterator {
    name: CompactString,
    state: IteratorState,
    location: SourceLocation,
}

impl VariableReferenceIterator {
    pub fn new(name: impl Into<CompactString>, location: SourceLocation) -> Self {
        Self { name: name.into(), state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for VariableReferenceIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("variable reference", self.location)?;
        let Some(bound) = ctx.variable(&self.name) else {
            return Err(Error::undeclared_variable(&self.name, self.location));
        };
        self.state.open_buffered(bound.to_vec());
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("variable reference", self.location)
    }

    fn close(&mut self) {
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(self.name.clone(), self.location))
    }
}

/// Yields the focus item of the dynamic context, or the empty sequence when
/// no focus is set.
pub struct ContextItemIterator {
    state: IteratorState,
    location: SourceLocation,
}

impl ContextItemIterator {
    pub fn new(location: SourceLocation) -> Self {
        Self { state: IteratorState::Closed, location }
    }
}

impl RuntimeIterator for ContextItemIterator {
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error> {
        self.state.ensure_closed("context item", self.location)?;
        self.state.open_single(ctx.focus().cloned());
        Ok(())
    }

    fn has_next(&self) -> bool {
        self.state.has_next()
    }

    fn next(&mut self) -> Result<Item, Error> {
        self.state.next("context item", self.location)
    }

    fn close(&mut self) {
        self.state.close();
    }

    fn location(&self) -> SourceLocation {
        self.location
    }

    fn boxed_clone(&self) -> Box<dyn RuntimeIterator> {
        Box::new(Self::new(self.location))
    }
}

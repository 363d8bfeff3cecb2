//! The pull-iterator protocol every runtime operator implements.
//!
//! Lifecycle: Closed → `open(ctx)` → Open → (has_next/next)* → Exhausted →
//! `close()` → Closed. A closed tree may be opened again; the sequence is
//! restartable but not concurrently reentrant. End-of-sequence is only ever
//! communicated through `has_next`; `next()` without a preceding positive
//! `has_next` is a flow violation and fatal.

use crate::error::{Error, SourceLocation};
use crate::item::Item;
use crate::runtime::context::DynamicContext;

/// How many items a declared parameter or operator accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    ZeroOrOne,
    ExactlyOne,
    ZeroOrMore,
}

impl core::fmt::Display for Cardinality {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Cardinality::ZeroOrOne => "zero or one",
            Cardinality::ExactlyOne => "exactly one",
            Cardinality::ZeroOrMore => "zero or more",
        })
    }
}

/// Per-pass state of an iterator, as an explicit machine instead of nullable
/// fields. `Single` covers the at-most-one shapes (the cached slot empties
/// on consumption); `Buffered` covers operators that hold their whole
/// output.
#[derive(Debug, Clone, Default)]
pub enum IteratorState {
    #[default]
    Closed,
    Single { cached: Option<Item> },
    Buffered { results: Vec<Item>, pos: usize },
}

impl IteratorState {
    pub fn is_open(&self) -> bool {
        !matches!(self, IteratorState::Closed)
    }

    /// Guard for `open()`: opening an already open iterator is the same
    /// protocol defect as a stray `next()`.
    pub fn ensure_closed(&self, what: &str, location: SourceLocation) -> Result<(), Error> {
        if self.is_open() {
            return Err(Error::new(
                crate::error::ErrorKind::FlowViolation,
                format!("open() called on already open iterator: {what}"),
                location,
            ));
        }
        Ok(())
    }

    pub fn open_single(&mut self, item: Option<Item>) {
        *self = IteratorState::Single { cached: item };
    }

    pub fn open_buffered(&mut self, results: Vec<Item>) {
        *self = IteratorState::Buffered { results, pos: 0 };
    }

    pub fn has_next(&self) -> bool {
        match self {
            IteratorState::Closed => false,
            IteratorState::Single { cached } => cached.is_some(),
            IteratorState::Buffered { results, pos } => *pos < results.len(),
        }
    }

    /// Take the next pending item; anything else is the flow-violation
    /// transition.
    pub fn next(&mut self, what: &str, location: SourceLocation) -> Result<Item, Error> {
        match self {
            IteratorState::Single { cached } => match cached.take() {
                Some(item) => Ok(item),
                None => Err(Error::flow_violation(what, location)),
            },
            IteratorState::Buffered { results, pos } if *pos < results.len() => {
                let item = results[*pos].clone();
                *pos += 1;
                Ok(item)
            }
            _ => Err(Error::flow_violation(what, location)),
        }
    }

    /// Drop all per-pass state, releasing any buffer.
    pub fn close(&mut self) {
        *self = IteratorState::Closed;
    }
}

/// A node in an iterator tree. Owns its children exclusively; carries
/// mutable per-pass state only. Created once per compilation,
/// reset-or-recreated per evaluation pass.
pub trait RuntimeIterator: Send {
    /// Propagates to all children before establishing local state. Must be
    /// called at most once between closes.
    fn open(&mut self, ctx: &DynamicContext) -> Result<(), Error>;

    /// Pure query; false once the sequence is exhausted, never an error.
    fn has_next(&self) -> bool;

    /// Only legal after a positive `has_next`; otherwise signals a
    /// [`crate::error::ErrorKind::FlowViolation`].
    fn next(&mut self) -> Result<Item, Error>;

    /// Propagates to all children and resets consumed state, enabling a
    /// later `open` (restart). Safe to call at any point after `open`.
    fn close(&mut self);

    /// Static metadata for error attribution.
    fn location(&self) -> SourceLocation;

    /// Deep-clone the tree in Closed state, for per-partition
    /// re-instantiation without shared mutable state.
    fn boxed_clone(&self) -> Box<dyn RuntimeIterator>;

    /// Many shape: drain the whole sequence into a vector.
    fn materialize(&mut self, ctx: &DynamicContext) -> Result<Vec<Item>, Error> {
        self.open(ctx)?;
        let mut items = Vec::new();
        while self.has_next() {
            match self.next() {
                Ok(item) => items.push(item),
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        }
        self.close();
        Ok(items)
    }

    /// At-most-one shape: the first item if any, `None` for the empty
    /// sequence. Extra items are left unconsumed.
    fn materialize_first_item_or_none(
        &mut self,
        ctx: &DynamicContext,
    ) -> Result<Option<Item>, Error> {
        self.open(ctx)?;
        let first = if self.has_next() {
            match self.next() {
                Ok(item) => Some(item),
                Err(e) => {
                    self.close();
                    return Err(e);
                }
            }
        } else {
            None
        };
        self.close();
        Ok(first)
    }

    /// Exactly-one shape: errors on the empty sequence and on any second
    /// item, with distinct diagnostics.
    fn materialize_exactly_one_item(&mut self, ctx: &DynamicContext) -> Result<Item, Error> {
        self.open(ctx)?;
        if !self.has_next() {
            self.close();
            return Err(Error::unexpected_type(
                "empty sequence where exactly one item is required",
                self.location(),
            ));
        }
        let item = match self.next() {
            Ok(item) => item,
            Err(e) => {
                self.close();
                return Err(e);
            }
        };
        if self.has_next() {
            self.close();
            return Err(Error::unexpected_type(
                "sequence of more than one item where exactly one is required",
                self.location(),
            ));
        }
        self.close();
        Ok(item)
    }
}

impl Clone for Box<dyn RuntimeIterator> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}

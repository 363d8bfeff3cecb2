//! Evaluation core of the onyq query language: the atomic type lattice and
//! the lazy pull-iterator runtime that query operators are built on.

pub mod error;
pub mod item;
pub mod runtime;
pub mod temporal;
pub mod types;

pub use error::{Error, ErrorKind, SourceLocation};
pub use item::{AtomicValue, Duration, Item};
pub use runtime::context::{DynamicContext, DynamicContextBuilder};
pub use runtime::iterator::{Cardinality, IteratorState, RuntimeIterator};
pub use types::facets::{FacetKind, Facets, TimezonePolicy};
pub use types::registry::TypeRegistry;
pub use types::{ItemType, PrimitiveKind};

//! Concrete function iterators built on the pull protocol.

pub mod datetime;
pub mod object;

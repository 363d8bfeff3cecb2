//! Error surface shared by the type lattice and the runtime iterators.

use core::fmt;
use std::sync::Arc;

/// Closed set of error classes the core can signal. Everything here is
/// unrecoverable at the point of origin and propagates to the caller of the
/// top-level evaluation; retries are the backend's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `next()` was called without a preceding positive `has_next()`.
    /// Indicates a defect in the consuming code, never retried.
    FlowViolation,
    /// A value's lexical form cannot be interpreted as the requested type.
    Cast,
    /// An argument's dynamic type or cardinality does not satisfy a declared
    /// signature.
    UnexpectedType,
    /// A timezone offset argument is out of range or has a sub-minute part.
    InvalidTimezone,
    /// A facet accessor was invoked on a type whose primitive type does not
    /// allow that facet.
    UnsupportedFacet,
    /// A variable reference has no binding in the dynamic context.
    UndeclaredVariable,
    /// A type name is already registered.
    DuplicateType,
    /// A type name is not registered.
    UnknownType,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::FlowViolation => "iterator flow violation",
            ErrorKind::Cast => "cast error",
            ErrorKind::UnexpectedType => "unexpected type",
            ErrorKind::InvalidTimezone => "invalid timezone",
            ErrorKind::UnsupportedFacet => "unsupported facet",
            ErrorKind::UndeclaredVariable => "undeclared variable",
            ErrorKind::DuplicateType => "duplicate type",
            ErrorKind::UnknownType => "unknown type",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of the expression an iterator was compiled from. Attached at
/// construction time so runtime failures can be attributed to query text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SourceLocation {
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Placeholder for nodes with no position information (line 0).
    pub const UNKNOWN: SourceLocation = SourceLocation { line: 0, column: 0 };

    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "unknown location")
        } else {
            write!(f, "line {}, column {}", self.line, self.column)
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub struct Error {
    pub kind: ErrorKind,
    pub message: String,
    pub location: SourceLocation,
    #[source]
    pub source: Option<Arc<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind, message: impl Into<String>, location: SourceLocation) -> Self {
        Self { kind, message: message.into(), location, source: None }
    }

    pub fn flow_violation(what: &str, location: SourceLocation) -> Self {
        Self::new(
            ErrorKind::FlowViolation,
            format!("invalid next() call on exhausted or unopened iterator: {what}"),
            location,
        )
    }

    /// Cast failure reported with the offending serialized value, its dynamic
    /// type and the target type name.
    pub fn cast(value: &str, from: &str, to: &str, location: SourceLocation) -> Self {
        Self::new(
            ErrorKind::Cast,
            format!("\"{value}\": value of type {from} is not castable to type {to}"),
            location,
        )
    }

    pub fn unexpected_type(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::UnexpectedType, message, location)
    }

    pub fn invalid_timezone(message: impl Into<String>, location: SourceLocation) -> Self {
        Self::new(ErrorKind::InvalidTimezone, message, location)
    }

    pub fn unsupported_facet(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnsupportedFacet, message, SourceLocation::UNKNOWN)
    }

    pub fn undeclared_variable(name: &str, location: SourceLocation) -> Self {
        Self::new(
            ErrorKind::UndeclaredVariable,
            format!("variable ${name} is not bound in the dynamic context"),
            location,
        )
    }

    pub fn duplicate_type(name: &str) -> Self {
        Self::new(
            ErrorKind::DuplicateType,
            format!("a type named {name} is already registered"),
            SourceLocation::UNKNOWN,
        )
    }

    pub fn unknown_type(name: &str) -> Self {
        Self::new(
            ErrorKind::UnknownType,
            format!("no type named {name} is registered"),
            SourceLocation::UNKNOWN,
        )
    }

    /// Compose an error with an underlying cause.
    pub fn with_source(
        mut self,
        source: impl Into<Option<Arc<dyn std::error::Error + Send + Sync>>>,
    ) -> Self {
        self.source = source.into();
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} ({})", self.kind, self.message, self.location)
    }
}

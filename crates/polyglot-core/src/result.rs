//! Result type aliases for Polyglot.

use crate::PolyglotError;

/// A specialized `Result` type for Polyglot operations.
pub type PolyglotResult<T> = Result<T, PolyglotError>;

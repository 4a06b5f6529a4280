use thiserror::Error;

pub use rowpat_parser::Error as ParseError;

/// Errors returned while compiling a row pattern.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    /// The pattern text could not be parsed.
    #[error(transparent)]
    ParseError(#[from] ParseError),

    /// The flattened program violates one of its structural invariants.
    /// Seeing this error means a bug in the compiler itself.
    #[error("internal error: {0}")]
    Internal(String),
}

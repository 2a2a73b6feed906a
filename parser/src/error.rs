//! Error type for parser construction and invocation.

use record_opt_core::{DocumentError, SchemaError};
use thiserror::Error;

/// Errors surfaced by [`RecordParser`](crate::RecordParser).
#[derive(Debug, Error)]
pub enum ParseError {
    /// Schema declaration or registration failure.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Schema document could not be loaded.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// Malformed user input, or a help/version request. Call
    /// [`exit`](clap::Error::exit) to print it and terminate like the engine
    /// normally would.
    #[error(transparent)]
    Usage(#[from] clap::Error),
}

impl ParseError {
    /// The engine error, if this is a usage error.
    pub fn as_usage(&self) -> Option<&clap::Error> {
        match self {
            Self::Usage(err) => Some(err),
            _ => None,
        }
    }
}

/// Convenience alias for results with [`ParseError`].
pub type Result<T> = std::result::Result<T, ParseError>;

//! Error types for schema declaration, resolution and record extraction.
//!
//! Configuration and unsupported-feature errors are raised eagerly, when a
//! schema is built or registered, never while tokens are being parsed.

use thiserror::Error;

use crate::Action;

/// Errors raised while declaring, resolving or registering a schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// A non-record declaration was handed to a registration entry point.
    #[error("{0} must be a structured record")]
    MustBeRecord(String),

    /// The field asked for a feature this crate deliberately does not offer.
    #[error("unsupported feature on field '{field}': {feature}")]
    Unsupported {
        /// Field identifier.
        field: String,
        /// What was requested.
        feature: UnsupportedFeature,
    },

    /// An option ended up with neither a long nor a short name.
    #[error("option '{0}' has no usable names")]
    NoOptionNames(String),

    /// An option name is neither `-x` nor `--long` shaped.
    #[error("invalid option name '{name}' on field '{field}'")]
    InvalidOptionName {
        /// Field identifier.
        field: String,
        /// The rejected name.
        name: String,
    },

    /// Two arguments of the same parser claim the same name.
    #[error("conflicting option string: {0}")]
    ConflictingOptionName(String),

    /// A positional was given an action that reads no value.
    #[error("positional '{field}' cannot use action '{action}'")]
    InvalidPositionalAction {
        /// Field identifier.
        field: String,
        /// The rejected action.
        action: Action,
    },

    /// A value-taking argument asked for exactly zero values.
    #[error("nargs for '{0}' must be != 0")]
    ZeroNargs(String),

    /// A required positional follows one that may be omitted.
    #[error("required positional '{field}' follows optional positional '{after}'")]
    RequiredAfterOptional {
        /// Field identifier.
        field: String,
        /// The earlier optional positional.
        after: String,
    },

    /// A positional follows one that consumes several values.
    #[error("positional '{field}' follows multi-valued positional '{after}'")]
    PositionalAfterMultiValued {
        /// Field identifier.
        field: String,
        /// The earlier multi-valued positional.
        after: String,
    },

    /// Two fields of one record share an identifier.
    #[error("duplicate field '{field}' in record {record}")]
    DuplicateField {
        /// Record name.
        record: String,
        /// Field identifier.
        field: String,
    },

    /// Two sub-commands of one parser share a name.
    #[error("duplicate sub-command: {0}")]
    DuplicateCommand(String),

    /// A type expression could not be parsed.
    #[error("invalid type expression '{0}'")]
    InvalidType(String),
}

/// Features rejected by [`SchemaError::Unsupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnsupportedFeature {
    /// A default equal to the reserved suppress sentinel.
    SuppressDefault,
    /// The `append_const` action.
    AppendConst,
}

impl std::fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SuppressDefault => f.write_str("SUPPRESS default is not supported"),
            Self::AppendConst => f.write_str("append_const is not supported"),
        }
    }
}

/// Errors raised while pulling typed values out of a [`Record`](crate::Record).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The record has no value under this field.
    #[error("record {record} has no field '{field}'")]
    MissingField {
        /// Record name.
        record: String,
        /// Field identifier.
        field: String,
    },

    /// The stored value has the wrong shape for the requested type.
    #[error("field '{field}' expected {expected}, found {found}")]
    TypeMismatch {
        /// Field identifier.
        field: String,
        /// Requested type.
        expected: &'static str,
        /// Actual value kind.
        found: &'static str,
    },

    /// The record was built from a different schema than the target type.
    #[error("expected record {expected}, found {found}")]
    WrongRecord {
        /// Target record name.
        expected: String,
        /// Actual record name.
        found: String,
    },
}

/// Errors raised while loading a schema document.
#[derive(Debug, Error)]
pub enum DocumentError {
    /// File I/O failure.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON parsing failure.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// YAML parsing failure.
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// A reference to a type the document does not define.
    #[error("unknown type '{0}'")]
    UnknownType(String),

    /// The document describes an invalid schema.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// Convenience alias for results with [`SchemaError`].
pub type Result<T> = std::result::Result<T, SchemaError>;

//! Core schema model for record-driven command-line interfaces.
//!
//! This crate turns a declared record into the configuration of a command-line
//! argument, without depending on any particular parsing engine:
//!
//! - [`Field`] / [`Schema`]: the declaration surface. Fields built with
//!   [`Field::opt`] become options, everything else is positional.
//! - [`infer_type`]: base type, optionality and repetition from a
//!   [`TypeExpr`].
//! - [`derive_names`]: long/short option names or the positional name.
//! - [`resolve_argument`]: reconciles inference with explicit metadata into
//!   an [`ArgumentSpec`].
//! - [`Record`] / [`FromRecord`]: reconstructed instances and typed
//!   extraction.
//! - [`SchemaDocument`]: records written as YAML or JSON.
//!
//! # Example
//!
//! ```
//! use record_opt_core::*;
//!
//! let schema = Schema::builder("Test")
//!     .field(Field::new("string", TypeExpr::STR).default("abc"))
//!     .field(Field::opt("count", TypeExpr::optional(TypeExpr::INT)))
//!     .build()
//!     .unwrap();
//!
//! let specs: Vec<ArgumentSpec> = schema
//!     .fields()
//!     .iter()
//!     .map(|f| resolve_argument(&FieldSpec::new(f)).unwrap())
//!     .collect();
//!
//! assert_eq!(specs[0].names, vec!["string"]);
//! assert_eq!(specs[0].nargs, Some(Nargs::Optional));
//! assert_eq!(specs[1].names, vec!["--count", "-c"]);
//! assert_eq!(specs[1].required, Some(false));
//! ```

mod document;
mod error;
mod field;
mod infer;
mod names;
mod record;
mod resolve;
mod schema;
mod types;
mod value;

pub use document::{CommandList, FieldDoc, ParserConfig, SchemaDocument, TypeDoc};
pub use error::{DocumentError, RecordError, Result, SchemaError, UnsupportedFeature};
pub use field::{DefaultValue, FactoryFn, Field, FieldMeta, FieldSpec, SUPPRESS};
pub use infer::{InferredType, infer_type};
pub use names::derive_names;
pub use record::{FromRecord, FromValue, Record};
pub use resolve::{ArgumentSpec, resolve_argument};
pub use schema::{Declaration, Schema, SchemaBuilder, command_name_for};
pub use types::{Action, ArgKind, ConvertFn, Converter, NameOverride, Nargs, ScalarType, TypeExpr};
pub use value::Value;

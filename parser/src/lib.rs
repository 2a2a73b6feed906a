//! Declare a command line as records; parse it with clap; get records back.
//!
//! [`RecordParser`] compiles each field of a [`Schema`] into a clap argument
//! (see [`record_opt_core::resolve_argument`] for the rules), runs clap over
//! the tokens and reconstructs the matched records into an [`Outcome`].
//!
//! # Example
//!
//! ```
//! use record_opt::{Field, Outcome, Record, RecordParser, Schema, TypeExpr, Value};
//!
//! let test = Schema::builder("Test")
//!     .field(Field::opt("foo", TypeExpr::BOOL))
//!     .build()
//!     .unwrap();
//! let a = Schema::builder("A")
//!     .field(Field::new("bar", TypeExpr::INT))
//!     .build()
//!     .unwrap();
//! let b = Schema::builder("B")
//!     .field(Field::opt("baz", TypeExpr::optional(TypeExpr::STR)))
//!     .build()
//!     .unwrap();
//!
//! let parser = RecordParser::new("prog")
//!     .with_root(test)
//!     .unwrap()
//!     .with_commands([a, b])
//!     .unwrap();
//!
//! match parser.try_parse_args_from(["a", "12"]).unwrap() {
//!     Outcome::RootAndCommand { root, command } => {
//!         assert_eq!(root, Record::new("Test").with("foo", false));
//!         assert_eq!(command.name, "a");
//!         assert_eq!(command.record.get("bar"), Some(&Value::Int(12)));
//!     }
//!     other => panic!("unexpected outcome: {other:?}"),
//! }
//! ```

mod compile;
mod engine;
mod error;
mod namespace;
mod parser;
mod reconstruct;

pub use compile::compile;
pub use error::{ParseError, Result};
pub use namespace::{Callback, CallbackFn, CommandMarker, Namespace};
pub use parser::RecordParser;
pub use reconstruct::{CommandInstance, Outcome};

pub use record_opt_core::{
    Action, ArgKind, ArgumentSpec, Converter, Declaration, DefaultValue, DocumentError, Field,
    FieldMeta, FieldSpec, FromRecord, FromValue, NameOverride, Nargs, ParserConfig, Record,
    RecordError, SUPPRESS, ScalarType, Schema, SchemaDocument, SchemaError, TypeExpr,
    UnsupportedFeature, Value, command_name_for,
};

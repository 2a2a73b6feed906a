//! Schema compilation: every field of a record resolved into its argument
//! specification, in declaration order.

use record_opt_core::{ArgumentSpec, FieldSpec, Schema, SchemaError, resolve_argument};
use tracing::debug;

/// Resolves the fields of `schema`. Fields marked `suppress` are skipped.
///
/// Specifications are derived fresh on every call; compiling the same schema
/// twice yields equal results.
///
/// # Errors
///
/// Whatever [`resolve_argument`] rejects.
///
/// # Examples
///
/// ```
/// use record_opt::{Field, Schema, TypeExpr, compile};
///
/// let schema = Schema::builder("Test")
///     .field(Field::new("bar", TypeExpr::STR))
///     .field(Field::opt("foo", TypeExpr::STR))
///     .field(Field::opt("hidden", TypeExpr::INT).suppress())
///     .build()
///     .unwrap();
///
/// let specs = compile(&schema).unwrap();
/// assert_eq!(specs.len(), 2);
/// assert_eq!(specs[1].names, vec!["--foo", "-f"]);
/// assert_eq!(specs, compile(&schema).unwrap());
/// ```
pub fn compile(schema: &Schema) -> Result<Vec<ArgumentSpec>, SchemaError> {
    let specs = schema
        .fields()
        .iter()
        .filter(|field| !field.meta.suppress)
        .map(|field| resolve_argument(&FieldSpec::new(field)))
        .collect::<Result<Vec<_>, _>>()?;
    debug!(record = schema.name(), count = specs.len(), "compiled schema");
    Ok(specs)
}

//! Command-line names for a field.

use crate::{FieldSpec, NameOverride};

/// Computes the ordered command-line names of a field.
///
/// Positionals get their identifier verbatim. Options get their explicit
/// names followed by any explicit `long`/`short` override; without explicit
/// names a `--long-form` and a `-s` short form are derived from the
/// identifier unless suppressed.
///
/// An option with both forms suppressed yields no names at all; registration
/// rejects it.
///
/// # Examples
///
/// ```
/// use record_opt_core::{Field, FieldSpec, TypeExpr, derive_names};
///
/// let field = Field::opt("dry_run", TypeExpr::BOOL);
/// assert_eq!(derive_names(&FieldSpec::new(&field)), vec!["--dry-run", "-d"]);
///
/// let field = Field::new("input_file", TypeExpr::PATH);
/// assert_eq!(derive_names(&FieldSpec::new(&field)), vec!["input_file"]);
/// ```
pub fn derive_names(spec: &FieldSpec<'_>) -> Vec<String> {
    let meta = spec.meta();
    let Some(explicit) = &meta.names else {
        return vec![spec.name().to_string()];
    };

    let mut names = Vec::new();
    if explicit.is_empty() {
        match &meta.long {
            NameOverride::Unset => names.push(format!("--{}", spec.name().replace('_', "-"))),
            NameOverride::Name(long) => names.push(long.clone()),
            NameOverride::Suppressed => {}
        }
        match &meta.short {
            NameOverride::Unset => {
                if let Some(c) = spec.name().chars().find(|c| c.is_alphanumeric() || *c == '_') {
                    names.push(format!("-{c}"));
                }
            }
            NameOverride::Name(short) => names.push(short.clone()),
            NameOverride::Suppressed => {}
        }
    } else {
        names.extend(explicit.iter().cloned());
        if let NameOverride::Name(long) = &meta.long {
            names.push(long.clone());
        }
        if let NameOverride::Name(short) = &meta.short {
            names.push(short.clone());
        }
    }

    names
}

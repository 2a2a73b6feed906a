//! Record schemas and the declarations handed to registration entry points.

use std::collections::HashSet;

use crate::error::{Result, SchemaError, UnsupportedFeature};
use crate::{Field, TypeExpr};

/// A structured record: a name plus its fields in declaration order.
///
/// # Examples
///
/// ```
/// use record_opt_core::{Field, Schema, TypeExpr};
///
/// let schema = Schema::builder("Serve")
///     .field(Field::new("root", TypeExpr::PATH))
///     .field(Field::opt("port", TypeExpr::INT).default(8080))
///     .build()
///     .unwrap();
///
/// assert_eq!(schema.name(), "Serve");
/// assert_eq!(schema.field_names().collect::<Vec<_>>(), vec!["root", "port"]);
/// ```
#[derive(Debug, Clone)]
pub struct Schema {
    name: String,
    fields: Vec<Field>,
}

impl Schema {
    /// Starts a schema named `name`.
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Record name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Looks up a field by identifier.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Field identifiers in declaration order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }

    /// Whether `name` is one of this record's field identifiers.
    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }
}

/// Accumulates fields for a [`Schema`].
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl SchemaBuilder {
    /// Appends a field.
    pub fn field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    /// Appends several fields.
    pub fn fields(mut self, fields: impl IntoIterator<Item = Field>) -> Self {
        self.fields.extend(fields);
        self
    }

    /// Finishes the schema.
    ///
    /// # Errors
    ///
    /// [`SchemaError::Unsupported`] when a field defaults to the suppress
    /// sentinel, [`SchemaError::DuplicateField`] when two fields share an
    /// identifier.
    pub fn build(self) -> Result<Schema> {
        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.meta.default.is_suppress() {
                return Err(SchemaError::Unsupported {
                    field: field.name.clone(),
                    feature: UnsupportedFeature::SuppressDefault,
                });
            }
            if !seen.insert(field.name.as_str()) {
                return Err(SchemaError::DuplicateField {
                    record: self.name.clone(),
                    field: field.name.clone(),
                });
            }
        }

        Ok(Schema {
            name: self.name,
            fields: self.fields,
        })
    }
}

/// Something offered to a registration entry point.
///
/// Only [`Record`](Declaration::Record) is accepted; an alias names a plain
/// type and is rejected with [`SchemaError::MustBeRecord`].
#[derive(Debug, Clone)]
pub enum Declaration {
    /// A structured record.
    Record(Schema),
    /// A named non-record type.
    Alias {
        /// Type name.
        name: String,
        /// Aliased type.
        ty: TypeExpr,
    },
}

impl Declaration {
    /// Declared name.
    pub fn name(&self) -> &str {
        match self {
            Self::Record(schema) => schema.name(),
            Self::Alias { name, .. } => name,
        }
    }

    /// Unwraps the record.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MustBeRecord`] for aliases.
    pub fn into_record(self) -> Result<Schema> {
        match self {
            Self::Record(schema) => Ok(schema),
            Self::Alias { name, .. } => Err(SchemaError::MustBeRecord(name)),
        }
    }
}

impl From<Schema> for Declaration {
    fn from(value: Schema) -> Self {
        Self::Record(value)
    }
}

/// Derives a sub-command name from a record name: `MyCommand` → `my-command`.
///
/// # Examples
///
/// ```
/// use record_opt_core::command_name_for;
///
/// assert_eq!(command_name_for("A"), "a");
/// assert_eq!(command_name_for("RemoteAdd"), "remote-add");
/// assert_eq!(command_name_for("HTTPServer"), "http-server");
/// assert_eq!(command_name_for("fetch_all"), "fetch-all");
/// ```
pub fn command_name_for(record_name: &str) -> String {
    let chars: Vec<char> = record_name.chars().collect();
    let mut out = String::with_capacity(record_name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            out.push('-');
            continue;
        }
        let prev = i.checked_sub(1).and_then(|j| chars.get(j)).copied();
        if let Some(prev) = prev.filter(|_| c.is_uppercase()) {
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary && !out.ends_with('-') {
                out.push('-');
            }
        }
        out.extend(c.to_lowercase());
    }

    out
}

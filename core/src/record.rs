//! Reconstructed record instances and typed extraction from them.

use std::path::PathBuf;

use indexmap::IndexMap;
use serde::Serialize;

use crate::Value;
use crate::error::RecordError;

/// An instance of a structured record: its schema name and field values in
/// declaration order.
///
/// # Examples
///
/// ```
/// use record_opt_core::{Record, Value};
///
/// let record = Record::new("Test").with("string", "abc").with("integer", 10);
/// assert_eq!(record.get("integer"), Some(&Value::Int(10)));
/// assert_eq!(record.extract::<String>("string").unwrap(), "abc");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    name: String,
    fields: IndexMap<String, Value>,
}

impl Record {
    /// An empty record named `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    /// Builder-style [`insert`](Self::insert).
    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value);
        self
    }

    /// Sets a field value.
    pub fn insert(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    /// Record (schema) name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field value by identifier.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field values in declaration order.
    pub fn fields(&self) -> &IndexMap<String, Value> {
        &self.fields
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Converts one field into a Rust type.
    ///
    /// # Errors
    ///
    /// [`RecordError::MissingField`] or [`RecordError::TypeMismatch`].
    pub fn extract<T: FromValue>(&self, field: &str) -> Result<T, RecordError> {
        let value = self.fields.get(field).ok_or_else(|| RecordError::MissingField {
            record: self.name.clone(),
            field: field.to_string(),
        })?;
        T::from_value(value).map_err(|found| RecordError::TypeMismatch {
            field: field.to_string(),
            expected: T::EXPECTED,
            found,
        })
    }

    /// Checks that the record was built from the schema named `name`.
    ///
    /// # Errors
    ///
    /// [`RecordError::WrongRecord`] on a different name.
    pub fn expect_name(&self, name: &str) -> Result<(), RecordError> {
        if self.name == name {
            Ok(())
        } else {
            Err(RecordError::WrongRecord {
                expected: name.to_string(),
                found: self.name.clone(),
            })
        }
    }

    /// Converts the whole record into a user type.
    ///
    /// # Errors
    ///
    /// Whatever [`FromRecord::from_record`] reports.
    pub fn into_typed<T: FromRecord>(self) -> Result<T, RecordError> {
        T::from_record(&self)
    }
}

/// Conversion out of a [`Value`].
///
/// The error is the kind name of the value that did not fit.
pub trait FromValue: Sized {
    /// Name used in mismatch errors.
    const EXPECTED: &'static str;

    /// Performs the conversion.
    fn from_value(value: &Value) -> Result<Self, &'static str>;
}

impl FromValue for Value {
    const EXPECTED: &'static str = "any";

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        Ok(value.clone())
    }
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(other.kind()),
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Int(i) => Ok(*i),
            other => Err(other.kind()),
        }
    }
}

impl FromValue for f64 {
    const EXPECTED: &'static str = "float";

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Float(x) => Ok(*x),
            #[allow(clippy::cast_precision_loss)]
            Value::Int(i) => Ok(*i as f64),
            other => Err(other.kind()),
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "str";

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Str(s) => Ok(s.clone()),
            other => Err(other.kind()),
        }
    }
}

impl FromValue for PathBuf {
    const EXPECTED: &'static str = "path";

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::Path(p) => Ok(p.clone()),
            Value::Str(s) => Ok(PathBuf::from(s)),
            other => Err(other.kind()),
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::None => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    const EXPECTED: &'static str = "list";

    fn from_value(value: &Value) -> Result<Self, &'static str> {
        match value {
            Value::List(items) => items.iter().map(T::from_value).collect(),
            other => Err(other.kind()),
        }
    }
}

/// Construction of a user type from a reconstructed [`Record`].
///
/// # Examples
///
/// ```
/// use record_opt_core::{FromRecord, Record, RecordError};
///
/// #[derive(Debug, PartialEq)]
/// struct Serve {
///     port: i64,
///     verbose: bool,
/// }
///
/// impl FromRecord for Serve {
///     fn from_record(record: &Record) -> Result<Self, RecordError> {
///         Ok(Self {
///             port: record.extract("port")?,
///             verbose: record.extract("verbose")?,
///         })
///     }
/// }
///
/// let record = Record::new("Serve").with("port", 8080).with("verbose", true);
/// assert_eq!(record.into_typed::<Serve>().unwrap(), Serve { port: 8080, verbose: true });
/// ```
pub trait FromRecord: Sized {
    /// Builds `Self` from a record's field values.
    ///
    /// # Errors
    ///
    /// Missing fields or values of the wrong shape.
    fn from_record(record: &Record) -> Result<Self, RecordError>;
}

impl FromRecord for Record {
    fn from_record(record: &Record) -> Result<Self, RecordError> {
        Ok(record.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_optional_and_lists() {
        let record = Record::new("Test")
            .with("baz", Value::None)
            .with("foo", vec![1i64, 2]);
        assert_eq!(record.extract::<Option<String>>("baz").unwrap(), None);
        assert_eq!(record.extract::<Vec<i64>>("foo").unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_extract_reports_mismatch() {
        let record = Record::new("Test").with("foo", "x");
        assert_eq!(
            record.extract::<i64>("foo").unwrap_err(),
            RecordError::TypeMismatch {
                field: "foo".to_string(),
                expected: "int",
                found: "str",
            }
        );
    }

    #[test]
    fn test_expect_name() {
        let record = Record::new("A");
        assert!(record.expect_name("A").is_ok());
        assert!(matches!(
            record.expect_name("B"),
            Err(RecordError::WrongRecord { .. })
        ));
    }

    #[test]
    fn test_extract_missing_field() {
        let record = Record::new("Test");
        assert!(matches!(
            record.extract::<bool>("foo"),
            Err(RecordError::MissingField { .. })
        ));
    }

    #[test]
    fn test_equality_ignores_field_order() {
        let a = Record::new("T").with("x", 1).with("y", 2);
        let b = Record::new("T").with("y", 2).with("x", 1);
        assert_eq!(a, b);
        assert_ne!(a, Record::new("U").with("x", 1).with("y", 2));
    }
}

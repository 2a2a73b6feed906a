//! Schema documents: record declarations written as YAML or JSON.
//!
//! A document names its types (records or plain aliases), picks an optional
//! root record and a set of sub-command records, and carries the parser
//! configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! prog: fetcher
//! about: Download things
//! version: "1.2.0"
//! root: Global
//! commands:
//!   - Fetch
//!   - RemoteAdd
//! types:
//!   Port: int
//!   Global:
//!     fields:
//!       - { name: verbose, type: int, option: true, action: count, default: 0 }
//!   Fetch:
//!     fields:
//!       - { name: url, type: str }
//!       - { name: retries, type: "Optional[int]", option: true }
//!   RemoteAdd:
//!     fields:
//!       - { name: name, type: str, choices: [origin, upstream] }
//! ```

use std::io::BufReader;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::DocumentError;
use crate::{
    Action, Converter, Declaration, Field, NameOverride, Nargs, Schema, TypeExpr, Value,
    command_name_for,
};

/// Top-level parser configuration.
///
/// # Examples
///
/// ```
/// use record_opt_core::ParserConfig;
///
/// let config = ParserConfig::default();
/// assert_eq!(config.prog, None);
/// assert!(!config.command_required);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Program name shown in usage.
    #[serde(default)]
    pub prog: Option<String>,
    /// One-line description.
    #[serde(default)]
    pub about: Option<String>,
    /// Registers `--version` printing this string.
    #[serde(default)]
    pub version: Option<String>,
    /// Fail when no sub-command is given.
    #[serde(default)]
    pub command_required: bool,
}

/// Sub-commands listed by type name, or mapped from command name to type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandList {
    /// Names derived from the type names.
    Types(Vec<String>),
    /// Explicit command names.
    Named(IndexMap<String, String>),
}

impl Default for CommandList {
    fn default() -> Self {
        Self::Types(Vec::new())
    }
}

/// A named type: a record with fields, or an alias for a plain type.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TypeDoc {
    /// Structured record.
    Record {
        /// Optional description, used as sub-command help.
        #[serde(default)]
        help: Option<String>,
        /// Fields in declaration order.
        #[serde(default)]
        fields: Vec<FieldDoc>,
    },
    /// Plain type alias.
    Alias(TypeExpr),
}

/// One field as written in a document.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDoc {
    /// Identifier.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: TypeExpr,
    /// Declares an option with derived names.
    #[serde(default)]
    pub option: bool,
    /// Explicit option names.
    #[serde(default)]
    pub names: Vec<String>,
    /// Short-name override; `null` or `""` suppresses it.
    #[serde(default, deserialize_with = "present")]
    pub short: Option<Option<String>>,
    /// Long-name override; `null` or `""` suppresses it.
    #[serde(default, deserialize_with = "present")]
    pub long: Option<Option<String>>,
    /// Action override.
    #[serde(default)]
    pub action: Option<Action>,
    /// Constant.
    #[serde(default, rename = "const")]
    pub constant: Option<Value>,
    /// Arity override.
    #[serde(default)]
    pub nargs: Option<Nargs>,
    /// Default value; `null` is an explicit `None` default.
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,
    /// Allowed values.
    #[serde(default)]
    pub choices: Option<Vec<Value>>,
    /// Usage placeholder.
    #[serde(default)]
    pub metavar: Option<String>,
    /// Version string.
    #[serde(default)]
    pub version: Option<String>,
    /// Help text.
    #[serde(default)]
    pub help: Option<String>,
    /// Converter override (a scalar type name).
    #[serde(default)]
    pub convert: Option<Converter>,
    /// Skip the field.
    #[serde(default)]
    pub suppress: bool,
    /// Hide from help.
    #[serde(default)]
    pub hidden: bool,
}

/// Maps a present key to `Some`, including an explicit `null`.
fn present<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(de).map(Some)
}

impl FieldDoc {
    fn into_field(self) -> Field {
        let mut field = if self.option || !self.names.is_empty() {
            Field::opt(self.name, self.ty).names(self.names)
        } else {
            Field::arg(self.name, self.ty)
        };

        let meta = &mut field.meta;
        if let Some(short) = self.short {
            meta.short = NameOverride::from(short.as_deref());
        }
        if let Some(long) = self.long {
            meta.long = NameOverride::from(long.as_deref());
        }
        meta.action = self.action;
        meta.constant = self.constant;
        meta.nargs = self.nargs;
        meta.choices = self.choices;
        meta.metavar = self.metavar;
        meta.version = self.version;
        meta.help = self.help;
        meta.value_type = self.convert;
        meta.suppress = self.suppress;
        meta.hidden = self.hidden;

        match self.default {
            Some(value) => field.default(value),
            None => field,
        }
    }
}

/// A whole schema document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SchemaDocument {
    /// Parser configuration.
    #[serde(flatten)]
    pub config: ParserConfig,
    /// Root record type name.
    #[serde(default)]
    pub root: Option<String>,
    /// Sub-command types.
    #[serde(default)]
    pub commands: CommandList,
    /// Named types.
    #[serde(default)]
    pub types: IndexMap<String, TypeDoc>,
}

impl SchemaDocument {
    /// Loads a document, choosing JSON for `.json` files and YAML otherwise.
    ///
    /// # Errors
    ///
    /// I/O or parse failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DocumentError> {
        let path = path.as_ref();
        let reader = BufReader::new(std::fs::File::open(path)?);
        let doc = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_reader(reader)?
        } else {
            serde_yaml::from_reader(reader)?
        };
        Ok(doc)
    }

    /// Parses a YAML document.
    ///
    /// # Errors
    ///
    /// [`DocumentError::YamlError`].
    pub fn from_yaml_str(src: &str) -> Result<Self, DocumentError> {
        Ok(serde_yaml::from_str(src)?)
    }

    /// Parses a JSON document.
    ///
    /// # Errors
    ///
    /// [`DocumentError::JsonError`].
    pub fn from_json_str(src: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(src)?)
    }

    /// Builds the declaration for a named type.
    ///
    /// # Errors
    ///
    /// [`DocumentError::UnknownType`], or schema errors from building the
    /// record.
    pub fn declaration(&self, name: &str) -> Result<Declaration, DocumentError> {
        let doc = self
            .types
            .get(name)
            .ok_or_else(|| DocumentError::UnknownType(name.to_string()))?;

        match doc {
            TypeDoc::Record { fields, .. } => {
                let schema = Schema::builder(name)
                    .fields(fields.iter().cloned().map(FieldDoc::into_field))
                    .build()?;
                Ok(Declaration::Record(schema))
            }
            TypeDoc::Alias(ty) => Ok(Declaration::Alias {
                name: name.to_string(),
                ty: ty.clone(),
            }),
        }
    }

    /// Help text of a record type, if any.
    pub fn help_for(&self, name: &str) -> Option<&str> {
        match self.types.get(name)? {
            TypeDoc::Record { help, .. } => help.as_deref(),
            TypeDoc::Alias(_) => None,
        }
    }

    /// The root declaration, if the document names one.
    ///
    /// # Errors
    ///
    /// As [`declaration`](Self::declaration).
    pub fn root_declaration(&self) -> Result<Option<Declaration>, DocumentError> {
        self.root.as_deref().map(|name| self.declaration(name)).transpose()
    }

    /// Sub-command names paired with their type names, in document order.
    pub fn command_entries(&self) -> Vec<(String, String)> {
        match &self.commands {
            CommandList::Types(types) => types
                .iter()
                .map(|ty| (command_name_for(ty), ty.clone()))
                .collect(),
            CommandList::Named(named) => named
                .iter()
                .map(|(cmd, ty)| (cmd.clone(), ty.clone()))
                .collect(),
        }
    }
}

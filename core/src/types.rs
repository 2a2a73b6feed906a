//! Type expressions and the small vocabulary shared by fields and argument
//! specifications.
//!
//! [`TypeExpr`] is the explicit stand-in for a declared field type. It is
//! written by hand (or parsed from the compact textual grammar used in schema
//! documents) instead of being discovered through reflection.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::Value;
use crate::error::SchemaError;

/// Base scalar types that inference can produce and that have a built-in
/// value converter.
///
/// # Examples
///
/// ```
/// use record_opt_core::{ScalarType, Value};
///
/// assert_eq!(ScalarType::Int.convert("42"), Ok(Value::Int(42)));
/// assert!(ScalarType::Int.convert("spam").is_err());
/// assert_eq!("float".parse::<ScalarType>(), Ok(ScalarType::Float));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    /// `true`/`false` style flags.
    Bool,
    /// 64-bit signed integer.
    Int,
    /// 64-bit float.
    Float,
    /// Plain text.
    Str,
    /// Filesystem path.
    Path,
}

impl ScalarType {
    /// Canonical lower-case name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Path => "path",
        }
    }

    /// Converts one raw token into a [`Value`] of this type.
    ///
    /// # Errors
    ///
    /// Returns a human-readable message when the token does not parse.
    pub fn convert(self, raw: &str) -> Result<Value, String> {
        match self {
            Self::Bool => match raw.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
                "false" | "no" | "off" | "0" => Ok(Value::Bool(false)),
                _ => Err(format!("invalid bool value: '{raw}'")),
            },
            Self::Int => raw
                .trim()
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| format!("invalid int value: '{raw}'")),
            Self::Float => raw
                .trim()
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| format!("invalid float value: '{raw}'")),
            Self::Str => Ok(Value::Str(raw.to_string())),
            Self::Path => Ok(Value::Path(PathBuf::from(raw))),
        }
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScalarType {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "bool" => Ok(Self::Bool),
            "int" => Ok(Self::Int),
            "float" => Ok(Self::Float),
            "str" => Ok(Self::Str),
            "path" | "Path" => Ok(Self::Path),
            other => Err(SchemaError::InvalidType(other.to_string())),
        }
    }
}

/// A declared field type.
///
/// Optional-of-T is a two-way [`Union`](TypeExpr::Union) with
/// [`NoneType`](TypeExpr::NoneType); [`Any`](TypeExpr::Any) stands for an
/// unparameterized generic marker that names no concrete type.
///
/// # Examples
///
/// ```
/// use record_opt_core::{ScalarType, TypeExpr};
///
/// let ty: TypeExpr = "Optional[List[int]]".parse().unwrap();
/// assert_eq!(ty, TypeExpr::optional(TypeExpr::list(TypeExpr::INT)));
/// assert_eq!(ty.to_string(), "Optional[List[int]]");
/// assert_eq!(TypeExpr::Scalar(ScalarType::Str), TypeExpr::STR);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeExpr {
    /// A plain scalar.
    Scalar(ScalarType),
    /// The absence-of-value marker.
    NoneType,
    /// A union of alternatives.
    Union(Vec<TypeExpr>),
    /// A sequence with its type arguments.
    List(Vec<TypeExpr>),
    /// An unparameterized generic marker.
    Any,
}

impl TypeExpr {
    /// `bool`
    pub const BOOL: Self = Self::Scalar(ScalarType::Bool);
    /// `int`
    pub const INT: Self = Self::Scalar(ScalarType::Int);
    /// `float`
    pub const FLOAT: Self = Self::Scalar(ScalarType::Float);
    /// `str`
    pub const STR: Self = Self::Scalar(ScalarType::Str);
    /// `path`
    pub const PATH: Self = Self::Scalar(ScalarType::Path);

    /// `Optional[inner]`
    pub fn optional(inner: Self) -> Self {
        Self::Union(vec![inner, Self::NoneType])
    }

    /// `List[inner]`
    pub fn list(inner: Self) -> Self {
        Self::List(vec![inner])
    }

    /// `Union[..]` of the given alternatives.
    pub fn union(alternatives: impl IntoIterator<Item = Self>) -> Self {
        Self::Union(alternatives.into_iter().collect())
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, items: &[TypeExpr]) -> fmt::Result {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{item}")?;
            }
            Ok(())
        }

        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::NoneType => f.write_str("None"),
            Self::Any => f.write_str("Any"),
            Self::Union(alts) => match alts.as_slice() {
                [inner, Self::NoneType] => write!(f, "Optional[{inner}]"),
                _ => {
                    f.write_str("Union[")?;
                    join(f, alts)?;
                    f.write_str("]")
                }
            },
            Self::List(args) if args.is_empty() => f.write_str("List"),
            Self::List(args) => {
                f.write_str("List[")?;
                join(f, args)?;
                f.write_str("]")
            }
        }
    }
}

impl FromStr for TypeExpr {
    type Err = SchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parser = TypeParser { src: s, pos: 0 };
        let expr = parser.expr()?;
        parser.skip_ws();
        if parser.pos != s.len() {
            return Err(SchemaError::InvalidType(s.to_string()));
        }
        Ok(expr)
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeExpr> for String {
    fn from(value: TypeExpr) -> Self {
        value.to_string()
    }
}

/// Recursive-descent parser for `Name` / `Name[arg, ...]`.
struct TypeParser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> TypeParser<'a> {
    fn skip_ws(&mut self) {
        let src = self.src;
        let rest = &src[self.pos..];
        self.pos += rest.len() - rest.trim_start().len();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        if self.src[self.pos..].starts_with(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    fn ident(&mut self) -> Result<&'a str, SchemaError> {
        self.skip_ws();
        let src = self.src;
        let rest = &src[self.pos..];
        let len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.error());
        }
        self.pos += len;
        Ok(&rest[..len])
    }

    fn error(&self) -> SchemaError {
        SchemaError::InvalidType(self.src.to_string())
    }

    fn expr(&mut self) -> Result<TypeExpr, SchemaError> {
        let name = self.ident()?;
        let args = if self.eat('[') {
            let mut args = vec![self.expr()?];
            while self.eat(',') {
                args.push(self.expr()?);
            }
            if !self.eat(']') {
                return Err(self.error());
            }
            Some(args)
        } else {
            None
        };

        let name = name.strip_prefix("typing.").unwrap_or(name);
        match (name, args) {
            ("None" | "NoneType", None) => Ok(TypeExpr::NoneType),
            ("Any" | "Callable" | "Optional" | "Union", None) => Ok(TypeExpr::Any),
            ("Optional", Some(mut args)) if args.len() == 1 => {
                let inner = args.pop().ok_or_else(|| self.error())?;
                Ok(TypeExpr::optional(inner))
            }
            ("Union", Some(args)) => Ok(TypeExpr::Union(args)),
            ("List" | "list", args) => Ok(TypeExpr::List(args.unwrap_or_default())),
            (scalar, None) => scalar.parse().map(TypeExpr::Scalar).map_err(|_| self.error()),
            _ => Err(self.error()),
        }
    }
}

/// How an argument consumes the tokens after its name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Store the converted value.
    Store,
    /// Store the field's const when present.
    StoreConst,
    /// Store `true` when present.
    StoreTrue,
    /// Store `false` when present.
    StoreFalse,
    /// Collect every occurrence into a list.
    Append,
    /// Collect the const per occurrence. Rejected at resolution.
    AppendConst,
    /// Count occurrences.
    Count,
    /// Print the version string and exit.
    Version,
}

impl Action {
    /// Actions that never run a value converter.
    pub fn ignores_converter(self) -> bool {
        matches!(
            self,
            Self::StoreConst | Self::AppendConst | Self::StoreTrue | Self::StoreFalse | Self::Count
        )
    }

    /// Actions that read values from the command line.
    pub fn takes_value(self) -> bool {
        matches!(self, Self::Store | Self::Append)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Store => "store",
            Self::StoreConst => "store_const",
            Self::StoreTrue => "store_true",
            Self::StoreFalse => "store_false",
            Self::Append => "append",
            Self::AppendConst => "append_const",
            Self::Count => "count",
            Self::Version => "version",
        };
        f.write_str(name)
    }
}

/// Arity: how many tokens one occurrence consumes.
///
/// Serialized as a number or one of `?`, `*`, `+`.
///
/// # Examples
///
/// ```
/// use record_opt_core::Nargs;
///
/// let nargs: Vec<Nargs> = serde_json::from_str(r#"[2, "?", "+"]"#).unwrap();
/// assert_eq!(nargs, vec![Nargs::Exactly(2), Nargs::Optional, Nargs::OneOrMore]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "NargsRepr", into = "NargsRepr")]
pub enum Nargs {
    /// Exactly `n` tokens, collected into a list.
    Exactly(usize),
    /// `?`: zero or one token.
    Optional,
    /// `*`: any number of tokens.
    ZeroOrMore,
    /// `+`: at least one token.
    OneOrMore,
}

impl Nargs {
    /// Whether the parsed value is a list.
    pub fn yields_list(self) -> bool {
        !matches!(self, Self::Optional)
    }

    /// Whether zero tokens satisfy this arity.
    pub fn allows_zero(self) -> bool {
        matches!(self, Self::Optional | Self::ZeroOrMore | Self::Exactly(0))
    }

    /// Whether more than one token may be consumed.
    pub fn takes_many(self) -> bool {
        match self {
            Self::Exactly(n) => n > 1,
            Self::Optional => false,
            Self::ZeroOrMore | Self::OneOrMore => true,
        }
    }
}

impl fmt::Display for Nargs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(n) => write!(f, "{n}"),
            Self::Optional => f.write_str("?"),
            Self::ZeroOrMore => f.write_str("*"),
            Self::OneOrMore => f.write_str("+"),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum NargsRepr {
    Count(usize),
    Symbol(String),
}

impl TryFrom<NargsRepr> for Nargs {
    type Error = String;

    fn try_from(value: NargsRepr) -> Result<Self, Self::Error> {
        match value {
            NargsRepr::Count(n) => Ok(Self::Exactly(n)),
            NargsRepr::Symbol(s) => match s.as_str() {
                "?" => Ok(Self::Optional),
                "*" => Ok(Self::ZeroOrMore),
                "+" => Ok(Self::OneOrMore),
                other => other
                    .parse()
                    .map(Self::Exactly)
                    .map_err(|_| format!("invalid nargs '{other}'")),
            },
        }
    }
}

impl From<Nargs> for NargsRepr {
    fn from(value: Nargs) -> Self {
        match value {
            Nargs::Exactly(n) => Self::Count(n),
            other => Self::Symbol(other.to_string()),
        }
    }
}

/// Signature of a custom value converter.
pub type ConvertFn = dyn Fn(&str) -> Result<Value, String> + Send + Sync;

/// Turns one raw token into a [`Value`].
///
/// Documents can only name scalar converters; custom converters are attached
/// in code.
///
/// # Examples
///
/// ```
/// use record_opt_core::{Converter, Value};
///
/// let upper = Converter::custom("upper", |raw| Ok(Value::Str(raw.to_uppercase())));
/// assert_eq!(upper.convert("abc"), Ok(Value::from("ABC")));
/// assert_eq!(upper.name(), "upper");
/// ```
#[derive(Clone, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Converter {
    /// Built-in scalar conversion.
    Scalar(ScalarType),
    /// Named user conversion.
    Custom {
        /// Display name.
        name: String,
        /// Conversion function.
        func: Arc<ConvertFn>,
    },
}

impl Converter {
    /// Wraps a closure as a named converter.
    pub fn custom<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> Result<Value, String> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Display name.
    pub fn name(&self) -> &str {
        match self {
            Self::Scalar(scalar) => scalar.name(),
            Self::Custom { name, .. } => name,
        }
    }

    /// Converts one raw token.
    ///
    /// # Errors
    ///
    /// Returns the converter's message when the token is rejected.
    pub fn convert(&self, raw: &str) -> Result<Value, String> {
        match self {
            Self::Scalar(scalar) => scalar.convert(raw),
            Self::Custom { func, .. } => func(raw),
        }
    }
}

impl From<ScalarType> for Converter {
    fn from(value: ScalarType) -> Self {
        Self::Scalar(value)
    }
}

impl PartialEq for Converter {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Custom { name: a, func: fa }, Self::Custom { name: b, func: fb }) => {
                a == b && Arc::ptr_eq(fa, fb)
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar(scalar) => f.debug_tuple("Scalar").field(scalar).finish(),
            Self::Custom { name, .. } => f.debug_tuple("Custom").field(name).finish(),
        }
    }
}

impl TryFrom<String> for Converter {
    type Error = SchemaError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse().map(Self::Scalar)
    }
}

impl From<Converter> for String {
    fn from(value: Converter) -> Self {
        value.name().to_string()
    }
}

/// Explicit `short`/`long` override on an option.
///
/// Distinguishes "not given" ([`Unset`](NameOverride::Unset), derive a name)
/// from "given but empty" ([`Suppressed`](NameOverride::Suppressed), no name).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NameOverride {
    /// Not configured.
    #[default]
    Unset,
    /// Explicitly disabled.
    Suppressed,
    /// Explicit name, used verbatim.
    Name(String),
}

impl From<&str> for NameOverride {
    fn from(value: &str) -> Self {
        if value.is_empty() {
            Self::Suppressed
        } else {
            Self::Name(value.to_string())
        }
    }
}

impl From<String> for NameOverride {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<Option<&str>> for NameOverride {
    fn from(value: Option<&str>) -> Self {
        value.map_or(Self::Suppressed, Self::from)
    }
}

/// Whether a field is addressed by position or by a marker name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArgKind {
    /// Identified by position.
    Positional,
    /// Identified by `-x` / `--name`.
    Option,
}

//! Field declarations: the per-field metadata a schema author writes.
//!
//! A field built with [`Field::new`] carries no metadata and becomes a
//! positional argument. [`Field::arg`] configures a positional, and
//! [`Field::opt`] declares an option (the names marker is what makes it one).

use std::fmt;
use std::sync::Arc;

use crate::{Action, ArgKind, Converter, InferredType, NameOverride, Nargs, ScalarType, TypeExpr, Value};

/// Reserved default sentinel requesting "leave the destination unset".
/// Rejected when a schema is built.
pub const SUPPRESS: &str = "==SUPPRESS==";

/// Signature of a default factory.
pub type FactoryFn = dyn Fn() -> Value + Send + Sync;

/// Where a field's default comes from.
#[derive(Clone, Default)]
pub enum DefaultValue {
    /// No default and no factory.
    #[default]
    Missing,
    /// Literal default.
    Value(Value),
    /// Invoked once per compilation.
    Factory(Arc<FactoryFn>),
}

impl DefaultValue {
    /// Whether a literal default or a factory was given.
    pub fn is_given(&self) -> bool {
        !matches!(self, Self::Missing)
    }

    /// Materializes the default; [`Missing`](Self::Missing) yields `None`.
    pub fn resolve(&self) -> Value {
        match self {
            Self::Missing => Value::None,
            Self::Value(value) => value.clone(),
            Self::Factory(factory) => factory(),
        }
    }

    /// Whether this is the literal suppress sentinel.
    pub fn is_suppress(&self) -> bool {
        matches!(self, Self::Value(Value::Str(s)) if s == SUPPRESS)
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing => f.write_str("Missing"),
            Self::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Self::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Explicit per-field configuration. Every entry overrides what inference
/// would otherwise pick.
#[derive(Debug, Clone, Default)]
pub struct FieldMeta {
    /// The names marker. `Some` makes the field an option; the vector holds
    /// explicitly supplied names, possibly none.
    pub names: Option<Vec<String>>,
    /// Short-name override.
    pub short: NameOverride,
    /// Long-name override.
    pub long: NameOverride,
    /// Action override.
    pub action: Option<Action>,
    /// Constant for `store_const` and arity `?` options.
    pub constant: Option<Value>,
    /// Arity override.
    pub nargs: Option<Nargs>,
    /// Allowed values, compared after conversion.
    pub choices: Option<Vec<Value>>,
    /// Placeholder shown in usage.
    pub metavar: Option<String>,
    /// Version string for the `version` action.
    pub version: Option<String>,
    /// Help text.
    pub help: Option<String>,
    /// Converter override.
    pub value_type: Option<Converter>,
    /// Skip this field entirely.
    pub suppress: bool,
    /// Hide from help output.
    pub hidden: bool,
    /// Default value or factory.
    pub default: DefaultValue,
}

/// One declared field of a record.
///
/// # Examples
///
/// ```
/// use record_opt_core::{Action, ArgKind, Field, TypeExpr, Value};
///
/// let verbose = Field::opt("verbose", TypeExpr::INT)
///     .action(Action::Count)
///     .default(0);
/// assert_eq!(verbose.kind(), ArgKind::Option);
///
/// let input = Field::new("input", TypeExpr::PATH);
/// assert_eq!(input.kind(), ArgKind::Positional);
/// ```
#[derive(Debug, Clone)]
pub struct Field {
    /// Identifier; also the destination key.
    pub name: String,
    /// Declared type.
    pub ty: TypeExpr,
    /// Explicit metadata.
    pub meta: FieldMeta,
}

impl Field {
    /// A field with no metadata (a plain positional).
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
            meta: FieldMeta::default(),
        }
    }

    /// A configurable positional.
    pub fn arg(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self::new(name, ty)
    }

    /// An option whose names are derived from the identifier unless
    /// [`names`](Self::names) supplies them.
    pub fn opt(name: impl Into<String>, ty: TypeExpr) -> Self {
        let mut field = Self::new(name, ty);
        field.meta.names = Some(Vec::new());
        field
    }

    /// Explicit option names such as `"--sum"` or `"-s"`.
    pub fn names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = self.meta.names.get_or_insert_with(Vec::new);
        list.extend(names.into_iter().map(Into::into));
        self
    }

    /// Short-name override; an empty string suppresses it.
    pub fn short(mut self, name: impl Into<NameOverride>) -> Self {
        self.meta.short = name.into();
        self
    }

    /// Disables the derived short name.
    pub fn no_short(mut self) -> Self {
        self.meta.short = NameOverride::Suppressed;
        self
    }

    /// Long-name override; an empty string suppresses it.
    pub fn long(mut self, name: impl Into<NameOverride>) -> Self {
        self.meta.long = name.into();
        self
    }

    /// Disables the derived long name.
    pub fn no_long(mut self) -> Self {
        self.meta.long = NameOverride::Suppressed;
        self
    }

    /// Action override.
    pub fn action(mut self, action: Action) -> Self {
        self.meta.action = Some(action);
        self
    }

    /// Constant value.
    pub fn constant(mut self, value: impl Into<Value>) -> Self {
        self.meta.constant = Some(value.into());
        self
    }

    /// Arity override.
    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.meta.nargs = Some(nargs);
        self
    }

    /// Allowed values.
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.meta.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Usage placeholder.
    pub fn metavar(mut self, metavar: impl Into<String>) -> Self {
        self.meta.metavar = Some(metavar.into());
        self
    }

    /// Version string (with [`Action::Version`]).
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.meta.version = Some(version.into());
        self
    }

    /// Help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.meta.help = Some(help.into());
        self
    }

    /// Converter override.
    pub fn value_type(mut self, converter: impl Into<Converter>) -> Self {
        self.meta.value_type = Some(converter.into());
        self
    }

    /// Keeps the field off the command line.
    pub fn suppress(mut self) -> Self {
        self.meta.suppress = true;
        self
    }

    /// Hides the argument from help output.
    pub fn hidden(mut self) -> Self {
        self.meta.hidden = true;
        self
    }

    /// Literal default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.meta.default = DefaultValue::Value(value.into());
        self
    }

    /// Default produced by a factory.
    pub fn default_factory<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.meta.default = DefaultValue::Factory(Arc::new(factory));
        self
    }

    /// Positional unless the names marker is present.
    pub fn kind(&self) -> ArgKind {
        if self.meta.names.is_some() {
            ArgKind::Option
        } else {
            ArgKind::Positional
        }
    }
}

/// A field together with what inference computed for it.
///
/// Derived fresh for every compilation and never mutated afterwards.
#[derive(Debug, Clone)]
pub struct FieldSpec<'a> {
    /// The declared field.
    pub field: &'a Field,
    /// Inferred base type.
    pub base: Option<ScalarType>,
    /// Declared type admits the absence marker.
    pub optional: bool,
    /// Declared type is a sequence.
    pub repeated: bool,
    /// Positional or option.
    pub kind: ArgKind,
}

impl<'a> FieldSpec<'a> {
    /// Runs type inference over `field`.
    pub fn new(field: &'a Field) -> Self {
        let InferredType {
            base,
            optional,
            repeated,
        } = crate::infer_type(&field.ty);
        Self {
            field,
            base,
            optional,
            repeated,
            kind: field.kind(),
        }
    }

    /// Field identifier.
    pub fn name(&self) -> &str {
        &self.field.name
    }

    /// Explicit metadata.
    pub fn meta(&self) -> &FieldMeta {
        &self.field.meta
    }

    /// Whether the field is positional.
    pub fn is_positional(&self) -> bool {
        self.kind == ArgKind::Positional
    }
}

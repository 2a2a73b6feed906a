//! Metadata resolution: from a field and its explicit metadata to the
//! [`ArgumentSpec`] handed to the parsing engine.
//!
//! Each step starts from what inference suggests and lets an explicit
//! metadata entry of the same key win:
//!
//! 1. action: boolean options default to `store_true`;
//! 2. default: literal, factory result, or absent;
//! 3. arity: sequences default to `+`, positionals with a truthy default or
//!    an optional type to `?`;
//! 4. requiredness (options only): no default, not optional, not boolean;
//! 5. converter: override or inferred, dropped for flag-like actions;
//! 6. pass-through: const, choices, metavar, version, help;
//! 7. the default is kept when the action takes values, or when it is absent
//!    on an optional field (so the field resolves to `None`);
//! 8. options always carry `dest` and an explicit `required`.

use serde::Serialize;
use tracing::trace;

use crate::error::{Result, SchemaError, UnsupportedFeature};
use crate::{Action, ArgKind, Converter, FieldSpec, Nargs, ScalarType, Value, derive_names};

/// Resolved configuration for one argument.
///
/// Positionals never carry `required` or `dest`; their semantics follow
/// from arity. Options always carry both.
///
/// # Examples
///
/// ```
/// use record_opt_core::{Action, ArgKind, ArgumentSpec};
///
/// let spec = ArgumentSpec::new(["--foo"]).action(Action::StoreTrue);
/// assert_eq!(spec.kind, ArgKind::Option);
/// assert_eq!(spec.id(), "foo");
///
/// let spec = ArgumentSpec::new(["files"]);
/// assert_eq!(spec.kind, ArgKind::Positional);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArgumentSpec {
    /// Command-line names (one identifier for positionals).
    pub names: Vec<String>,
    /// Positional or option.
    pub kind: ArgKind,
    /// Action; `None` means plain store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Arity; `None` means exactly one token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nargs: Option<Nargs>,
    /// Constant.
    #[serde(rename = "const", skip_serializing_if = "Option::is_none")]
    pub constant: Option<Value>,
    /// Default applied when the argument is absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Value converter.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub converter: Option<Converter>,
    /// Allowed values.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Value>>,
    /// Usage placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metavar: Option<String>,
    /// Version string.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Help text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
    /// Requiredness (options only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    /// Destination key (options only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dest: Option<String>,
    /// Hidden from help.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub hidden: bool,
}

impl ArgumentSpec {
    /// A bare specification for a schema-less argument. Names starting with
    /// `-` make an option whose destination is derived from the first long
    /// name (or else the first name); otherwise a positional.
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let is_option = names.first().is_some_and(|n| n.starts_with('-'));
        let dest = is_option.then(|| {
            names
                .iter()
                .find(|n| n.starts_with("--"))
                .or(names.first())
                .map(|n| n.trim_start_matches('-').replace('-', "_"))
                .unwrap_or_default()
        });

        Self {
            names,
            kind: if is_option { ArgKind::Option } else { ArgKind::Positional },
            action: None,
            nargs: None,
            constant: None,
            default: None,
            converter: None,
            choices: None,
            metavar: None,
            version: None,
            help: None,
            required: is_option.then_some(false),
            dest,
            hidden: false,
        }
    }

    /// Sets the action.
    pub fn action(mut self, action: Action) -> Self {
        self.action = Some(action);
        self
    }

    /// Sets the arity.
    pub fn nargs(mut self, nargs: Nargs) -> Self {
        self.nargs = Some(nargs);
        self
    }

    /// Sets the default.
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Sets the converter.
    pub fn converter(mut self, converter: impl Into<Converter>) -> Self {
        self.converter = Some(converter.into());
        self
    }

    /// Sets the help text.
    pub fn help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// Marks an option as required.
    pub fn required(mut self, required: bool) -> Self {
        if self.kind == ArgKind::Option {
            self.required = Some(required);
        }
        self
    }

    /// Key under which the parsed value is stored.
    pub fn id(&self) -> &str {
        self.dest
            .as_deref()
            .or(self.names.first().map(String::as_str))
            .unwrap_or_default()
    }
}

/// Resolves one field into its argument specification.
///
/// # Errors
///
/// [`SchemaError::Unsupported`] when the field asks for `append_const`.
///
/// # Examples
///
/// ```
/// use record_opt_core::{Action, Field, FieldSpec, Nargs, TypeExpr, Value, resolve_argument};
///
/// let field = Field::opt("tags", TypeExpr::list(TypeExpr::STR));
/// let spec = resolve_argument(&FieldSpec::new(&field)).unwrap();
/// assert_eq!(spec.nargs, Some(Nargs::OneOrMore));
/// assert_eq!(spec.required, Some(true));
/// assert_eq!(spec.dest.as_deref(), Some("tags"));
///
/// let field = Field::opt("quiet", TypeExpr::BOOL);
/// let spec = resolve_argument(&FieldSpec::new(&field)).unwrap();
/// assert_eq!(spec.action, Some(Action::StoreTrue));
/// assert_eq!(spec.required, Some(false));
/// assert_eq!(spec.converter, None);
/// ```
pub fn resolve_argument(spec: &FieldSpec<'_>) -> Result<ArgumentSpec> {
    let meta = spec.meta();
    let positional = spec.is_positional();

    let converter = meta
        .value_type
        .clone()
        .or_else(|| spec.base.map(Converter::Scalar));
    let is_bool = converter == Some(Converter::Scalar(ScalarType::Bool));

    let default_action = (!positional && is_bool).then_some(Action::StoreTrue);
    let action = meta.action.or(default_action);
    if action == Some(Action::AppendConst) {
        return Err(SchemaError::Unsupported {
            field: spec.name().to_string(),
            feature: UnsupportedFeature::AppendConst,
        });
    }

    let default = meta.default.resolve();
    let use_default = !is_bool && !matches!(action, Some(Action::StoreTrue | Action::StoreFalse));

    let default_nargs = if spec.repeated && action.is_none() {
        Some(Nargs::OneOrMore)
    } else if positional && default.is_truthy() {
        Some(Nargs::Optional)
    } else if positional && default.is_none() && spec.optional {
        Some(Nargs::Optional)
    } else {
        None
    };
    let nargs = meta.nargs.or(default_nargs);

    let required = !meta.default.is_given() && !spec.optional && spec.base != Some(ScalarType::Bool);

    let converter = converter.filter(|_| !action.is_some_and(Action::ignores_converter));

    let keep_default = (!default.is_none() && use_default) || (default.is_none() && spec.optional);

    let resolved = ArgumentSpec {
        names: derive_names(spec),
        kind: spec.kind,
        action,
        nargs,
        constant: meta.constant.clone(),
        default: keep_default.then_some(default),
        converter,
        choices: meta.choices.clone(),
        metavar: meta.metavar.clone(),
        version: meta.version.clone(),
        help: meta.help.clone(),
        required: (!positional).then_some(required),
        dest: (!positional).then(|| spec.name().to_string()),
        hidden: meta.hidden,
    };
    trace!(field = spec.name(), ?resolved, "resolved argument");
    Ok(resolved)
}

//! Adapter between resolved [`ArgumentSpec`]s and clap's builder API.
//!
//! Registration turns an [`ArgumentSpec`] into a [`clap::Arg`]; extraction
//! reads the value back out of [`ArgMatches`] and applies the resolved
//! default. Defaults never go through clap, so non-string defaults survive
//! untouched.

use std::collections::HashSet;
use std::ffi::OsStr;

use clap::builder::{PossibleValue, TypedValueParser};
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};
use record_opt_core::{
    Action, ArgKind, ArgumentSpec, Converter, Nargs, SchemaError, UnsupportedFeature, Value,
};
use tracing::warn;

/// Names clap claims on every command.
pub(crate) const RESERVED_NAMES: [&str; 2] = ["-h", "--help"];

/// Value parser that runs a [`Converter`] and checks the choice set.
#[derive(Clone)]
pub(crate) struct ConverterParser {
    converter: Option<Converter>,
    choices: Option<Vec<Value>>,
}

impl ConverterParser {
    pub(crate) fn new(spec: &ArgumentSpec) -> Self {
        Self {
            converter: spec.converter.clone(),
            choices: spec.choices.clone(),
        }
    }

    fn convert(&self, raw: &str) -> Result<Value, String> {
        match &self.converter {
            Some(converter) => converter.convert(raw),
            None => Ok(Value::Str(raw.to_string())),
        }
    }
}

impl TypedValueParser for ConverterParser {
    type Value = Value;

    fn parse_ref(
        &self,
        cmd: &Command,
        arg: Option<&Arg>,
        value: &OsStr,
    ) -> Result<Self::Value, clap::Error> {
        let raw = value
            .to_str()
            .ok_or_else(|| clap::Error::new(ErrorKind::InvalidUtf8).with_cmd(cmd))?;

        let parsed = self.convert(raw).map_err(|reason| {
            tracing::debug!(%reason, raw, "value rejected by converter");
            let mut err = clap::Error::new(ErrorKind::ValueValidation).with_cmd(cmd);
            if let Some(arg) = arg {
                err.insert(ContextKind::InvalidArg, ContextValue::String(arg.to_string()));
            }
            err.insert(ContextKind::InvalidValue, ContextValue::String(raw.to_string()));
            err
        })?;

        if let Some(choices) = &self.choices {
            if !choices.contains(&parsed) {
                let mut err = clap::Error::new(ErrorKind::InvalidValue).with_cmd(cmd);
                if let Some(arg) = arg {
                    err.insert(ContextKind::InvalidArg, ContextValue::String(arg.to_string()));
                }
                err.insert(ContextKind::InvalidValue, ContextValue::String(raw.to_string()));
                err.insert(
                    ContextKind::ValidValue,
                    ContextValue::Strings(choices.iter().map(ToString::to_string).collect()),
                );
                return Err(err);
            }
        }

        Ok(parsed)
    }

    fn possible_values(&self) -> Option<Box<dyn Iterator<Item = PossibleValue> + '_>> {
        let choices = self.choices.as_ref()?;
        Some(Box::new(
            choices.iter().map(|choice| PossibleValue::new(choice.to_string())),
        ))
    }
}

/// Builds the clap argument for `spec`, claiming its names in `taken`.
pub(crate) fn build_arg(spec: &ArgumentSpec, taken: &mut HashSet<String>) -> Result<Arg, SchemaError> {
    let id = spec.id().to_string();
    let action = spec.action.unwrap_or(Action::Store);
    let arg_action = match action {
        Action::Store => ArgAction::Set,
        Action::Append => ArgAction::Append,
        Action::StoreTrue | Action::StoreConst => ArgAction::SetTrue,
        Action::StoreFalse => ArgAction::SetFalse,
        Action::Count => ArgAction::Count,
        Action::Version => ArgAction::Version,
        Action::AppendConst => {
            return Err(SchemaError::Unsupported {
                field: id,
                feature: UnsupportedFeature::AppendConst,
            });
        }
    };
    if spec.kind == ArgKind::Positional && !action.takes_value() {
        return Err(SchemaError::InvalidPositionalAction { field: id, action });
    }
    if action.takes_value() && spec.nargs == Some(Nargs::Exactly(0)) {
        return Err(SchemaError::ZeroNargs(id));
    }

    let mut arg = Arg::new(id.clone()).action(arg_action);
    if spec.kind == ArgKind::Option {
        arg = apply_option_names(arg, spec, &id, taken)?;
        arg = arg.required(spec.required.unwrap_or(false));
    } else {
        if !taken.insert(id.clone()) {
            return Err(SchemaError::ConflictingOptionName(id));
        }
        arg = arg.required(positional_required(spec));
    }

    if action.takes_value() {
        arg = arg.value_parser(ConverterParser::new(spec));
        arg = match spec.nargs {
            None => arg.num_args(1),
            Some(Nargs::Exactly(n)) => arg.num_args(n),
            Some(Nargs::Optional) => arg.num_args(0..=1),
            Some(Nargs::ZeroOrMore) => arg.num_args(0..),
            Some(Nargs::OneOrMore) => arg.num_args(1..),
        };
        if let Some(metavar) = &spec.metavar {
            arg = arg.value_name(metavar.clone());
        }
    }

    if let Some(help) = &spec.help {
        arg = arg.help(help.clone());
    }
    if spec.hidden {
        arg = arg.hide(true);
    }

    Ok(arg)
}

/// Checks that positional `spec` may follow the positionals in `earlier`.
///
/// Tokens are matched to positionals left to right without backtracking, so
/// only the last positional may take several values and no required
/// positional may follow an optional one.
pub(crate) fn check_positional_order<'a>(
    earlier: impl IntoIterator<Item = &'a ArgumentSpec>,
    spec: &ArgumentSpec,
) -> Result<(), SchemaError> {
    if spec.kind != ArgKind::Positional {
        return Ok(());
    }
    let required = positional_required(spec);
    for prev in earlier.into_iter().filter(|s| s.kind == ArgKind::Positional) {
        let multi_valued =
            prev.action == Some(Action::Append) || prev.nargs.is_some_and(Nargs::takes_many);
        if multi_valued {
            return Err(SchemaError::PositionalAfterMultiValued {
                field: spec.id().to_string(),
                after: prev.id().to_string(),
            });
        }
        if required && !positional_required(prev) {
            return Err(SchemaError::RequiredAfterOptional {
                field: spec.id().to_string(),
                after: prev.id().to_string(),
            });
        }
    }
    Ok(())
}

fn positional_required(spec: &ArgumentSpec) -> bool {
    !spec.nargs.is_some_and(Nargs::allows_zero)
}

fn apply_option_names(
    mut arg: Arg,
    spec: &ArgumentSpec,
    id: &str,
    taken: &mut HashSet<String>,
) -> Result<Arg, SchemaError> {
    if spec.names.is_empty() {
        return Err(SchemaError::NoOptionNames(id.to_string()));
    }

    let (mut has_long, mut has_short) = (false, false);
    for name in &spec.names {
        if !taken.insert(name.clone()) {
            return Err(SchemaError::ConflictingOptionName(name.clone()));
        }

        if let Some(long) = name.strip_prefix("--").filter(|l| !l.is_empty()) {
            arg = if has_long {
                arg.visible_alias(long.to_string())
            } else {
                arg.long(long.to_string())
            };
            has_long = true;
            continue;
        }

        let mut chars = name.strip_prefix('-').unwrap_or_default().chars();
        match (chars.next(), chars.next()) {
            (Some(short), None) if short != '-' => {
                arg = if has_short {
                    arg.visible_short_alias(short)
                } else {
                    arg.short(short)
                };
                has_short = true;
            }
            _ => {
                return Err(SchemaError::InvalidOptionName {
                    field: id.to_string(),
                    name: name.clone(),
                });
            }
        }
    }

    Ok(arg)
}

/// Reads the value of `spec` out of `matches`.
///
/// Returns `Ok(None)` for arguments that never produce a value (version).
pub(crate) fn extract_value(
    spec: &ArgumentSpec,
    matches: &ArgMatches,
) -> Result<Option<Value>, clap::Error> {
    let id = spec.id();
    let present = matches.value_source(id) == Some(ValueSource::CommandLine);
    let absent_default = || spec.default.clone().unwrap_or(Value::None);

    let value = match spec.action.unwrap_or(Action::Store) {
        Action::Version | Action::AppendConst => return Ok(None),
        Action::StoreTrue if present => Value::Bool(true),
        Action::StoreTrue => spec.default.clone().unwrap_or(Value::Bool(false)),
        Action::StoreFalse if present => Value::Bool(false),
        Action::StoreFalse => spec.default.clone().unwrap_or(Value::Bool(true)),
        Action::StoreConst if present => spec.constant.clone().unwrap_or(Value::None),
        Action::StoreConst => absent_default(),
        Action::Count if present => {
            let base = match &spec.default {
                Some(Value::Int(n)) => *n,
                _ => 0,
            };
            Value::Int(base + i64::from(matches.get_count(id)))
        }
        Action::Count => absent_default(),
        Action::Store if present => {
            let values: Vec<Value> = matches
                .get_many::<Value>(id)
                .map(|vals| vals.cloned().collect())
                .unwrap_or_default();
            shape_values(spec, values)
        }
        Action::Append if present => {
            // Occurrences extend a list default.
            let mut items = match &spec.default {
                Some(Value::List(items)) => items.clone(),
                _ => Vec::new(),
            };
            if let Some(occurrences) = matches.get_occurrences::<Value>(id) {
                items.extend(occurrences.map(|vals| shape_values(spec, vals.cloned().collect())));
            }
            Value::List(items)
        }
        Action::Store | Action::Append => default_for_absent(spec)?,
    };

    Ok(Some(value))
}

/// Folds the tokens of one occurrence according to arity.
fn shape_values(spec: &ArgumentSpec, mut values: Vec<Value>) -> Value {
    match spec.nargs {
        None => values.pop().unwrap_or(Value::None),
        Some(Nargs::Optional) => {
            if values.is_empty() {
                spec.constant.clone().unwrap_or(Value::None)
            } else {
                values.swap_remove(0)
            }
        }
        Some(_) => Value::List(values),
    }
}

/// Default of an absent value-taking argument. String defaults go through
/// the converter; other defaults are used as given.
fn default_for_absent(spec: &ArgumentSpec) -> Result<Value, clap::Error> {
    match (&spec.default, &spec.converter) {
        (Some(Value::Str(raw)), Some(converter)) => converter.convert(raw).map_err(|reason| {
            warn!(arg = spec.id(), %reason, "string default failed conversion");
            clap::Error::raw(
                ErrorKind::ValueValidation,
                format!("argument {}: {reason}\n", spec.id()),
            )
        }),
        (Some(value), _) => Ok(value.clone()),
        (None, _) if spec.kind == ArgKind::Positional && spec.nargs == Some(Nargs::ZeroOrMore) => {
            Ok(Value::List(Vec::new()))
        }
        (None, _) => Ok(Value::None),
    }
}

//! The top-level entry point: records in, clap command out, records back.

use std::cell::Cell;
use std::collections::HashSet;
use std::ffi::OsString;
use std::path::Path;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{Arg, ArgMatches, Command};
use indexmap::IndexMap;
use record_opt_core::{
    Action, ArgumentSpec, Declaration, ParserConfig, Schema, SchemaDocument, SchemaError,
    command_name_for,
};
use tracing::{debug, trace};

use crate::compile::compile;
use crate::engine::{RESERVED_NAMES, build_arg, check_positional_order, extract_value};
use crate::error::Result;
use crate::namespace::{Callback, CommandMarker, Namespace};
use crate::reconstruct::{Outcome, reconstruct};

const FALLBACK_PROG: &str = "record-opt";

/// An argument registered on a parser, with its engine counterpart.
#[derive(Debug, Clone)]
struct Registered {
    spec: ArgumentSpec,
    arg: Arg,
}

#[derive(Debug, Clone)]
struct SubCommand {
    parser: RecordParser,
    schema: Arc<Schema>,
    help: Option<String>,
    callback: Option<Callback>,
}

/// Sub-command table, created on the first registration.
#[derive(Debug, Clone, Default)]
struct Dispatcher {
    entries: IndexMap<String, SubCommand>,
}

/// Per-invocation state threaded through nested sub-commands.
#[derive(Debug, Default)]
struct ParseContext {
    depth: Cell<usize>,
}

impl ParseContext {
    fn descend(&self) -> Descend<'_> {
        self.depth.set(self.depth.get() + 1);
        Descend(self)
    }

    fn is_nested(&self) -> bool {
        self.depth.get() > 0
    }
}

/// Restores the depth when a nested level finishes, on every exit path.
struct Descend<'a>(&'a ParseContext);

impl Drop for Descend<'_> {
    fn drop(&mut self) {
        self.0.depth.set(self.0.depth.get().saturating_sub(1));
    }
}

/// Compiles record schemas into a clap command and rebuilds records from
/// what the user typed.
///
/// # Examples
///
/// ```
/// use record_opt::{Field, Record, RecordParser, Schema, TypeExpr};
///
/// let test = Schema::builder("Test")
///     .field(Field::new("bar", TypeExpr::STR))
///     .field(Field::opt("foo", TypeExpr::STR))
///     .build()
///     .unwrap();
///
/// let parser = RecordParser::new("prog").with_root(test).unwrap();
/// let outcome = parser.try_parse_args_from(["BAR", "-f", "FOO"]).unwrap();
/// assert_eq!(
///     outcome.root(),
///     Some(&Record::new("Test").with("bar", "BAR").with("foo", "FOO"))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RecordParser {
    name: String,
    config: ParserConfig,
    root: Option<Arc<Schema>>,
    args: Vec<Registered>,
    taken: HashSet<String>,
    commands: Option<Dispatcher>,
}

impl Default for RecordParser {
    fn default() -> Self {
        Self::new(default_prog())
    }
}

impl RecordParser {
    /// A parser with no arguments, named `name` in usage output.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: ParserConfig::default(),
            root: None,
            args: Vec::new(),
            taken: RESERVED_NAMES.iter().map(|n| n.to_string()).collect(),
            commands: None,
        }
    }

    /// Applies program name, description, version and sub-command
    /// requiredness.
    ///
    /// # Errors
    ///
    /// As [`with_version`](Self::with_version).
    pub fn with_config(mut self, config: ParserConfig) -> std::result::Result<Self, SchemaError> {
        if let Some(prog) = &config.prog {
            self.name = prog.clone();
        }
        let version = config.version.clone();
        self.config = config;
        match version {
            Some(version) => self.with_version(version),
            None => Ok(self),
        }
    }

    /// Registers the root record; its fields go on this parser and parse
    /// results reconstruct into it.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MustBeRecord`] for non-records, or any registration
    /// error of its fields.
    pub fn with_root(mut self, decl: impl Into<Declaration>) -> std::result::Result<Self, SchemaError> {
        let schema = decl.into().into_record()?;
        self.register_fields(&schema)?;
        self.root = Some(Arc::new(schema));
        Ok(self)
    }

    /// Registers one sub-command named after its record.
    ///
    /// # Errors
    ///
    /// As [`add_command`](Self::add_command).
    pub fn with_command(self, decl: impl Into<Declaration>) -> std::result::Result<Self, SchemaError> {
        self.with_commands([decl])
    }

    /// Registers sub-commands named after their records (`RemoteAdd` →
    /// `remote-add`).
    ///
    /// # Errors
    ///
    /// As [`add_command`](Self::add_command).
    pub fn with_commands<I, D>(mut self, decls: I) -> std::result::Result<Self, SchemaError>
    where
        I: IntoIterator<Item = D>,
        D: Into<Declaration>,
    {
        for decl in decls {
            let decl = decl.into();
            let name = command_name_for(decl.name());
            self.add_command(name, decl, None, None)?;
        }
        Ok(self)
    }

    /// Registers sub-commands under explicit names.
    ///
    /// # Errors
    ///
    /// As [`add_command`](Self::add_command).
    pub fn with_named_commands<I, S, D>(mut self, commands: I) -> std::result::Result<Self, SchemaError>
    where
        I: IntoIterator<Item = (S, D)>,
        S: Into<String>,
        D: Into<Declaration>,
    {
        for (name, decl) in commands {
            self.add_command(name, decl, None, None)?;
        }
        Ok(self)
    }

    /// Registers `--version`, printing `version` and exiting successfully.
    ///
    /// # Errors
    ///
    /// [`SchemaError::ConflictingOptionName`] when `--version` is taken.
    pub fn with_version(mut self, version: impl Into<String>) -> std::result::Result<Self, SchemaError> {
        let mut spec = ArgumentSpec::new(["--version"]).action(Action::Version);
        spec.version = Some(version.into());
        self.add_argument(spec)?;
        Ok(self)
    }

    /// Builds a parser from a schema document.
    ///
    /// # Errors
    ///
    /// Unknown type names, schema errors, or registration errors.
    pub fn from_document(doc: &SchemaDocument) -> Result<Self> {
        let mut parser = Self::default().with_config(doc.config.clone())?;
        if let Some(root) = doc.root_declaration()? {
            parser = parser.with_root(root)?;
        }
        for (name, ty) in doc.command_entries() {
            let decl = doc.declaration(&ty)?;
            parser.add_command(name, decl, doc.help_for(&ty), None)?;
        }
        Ok(parser)
    }

    /// Registers a sub-command and returns its parser for further
    /// configuration. The callback travels with the reconstructed
    /// [`CommandInstance`](crate::CommandInstance).
    ///
    /// # Errors
    ///
    /// [`SchemaError::MustBeRecord`], [`SchemaError::DuplicateCommand`], or
    /// any registration error of the record's fields.
    pub fn add_command(
        &mut self,
        name: impl Into<String>,
        decl: impl Into<Declaration>,
        help: Option<&str>,
        callback: Option<Callback>,
    ) -> std::result::Result<&mut RecordParser, SchemaError> {
        let name = name.into();
        let schema = decl.into().into_record()?;

        let mut parser = RecordParser::new(name.clone());
        parser.register_fields(&schema)?;

        let dispatcher = self.commands.get_or_insert_with(Dispatcher::default);
        if dispatcher.entries.contains_key(&name) {
            return Err(SchemaError::DuplicateCommand(name));
        }
        debug!(command = %name, record = schema.name(), "registered sub-command");

        let entry = dispatcher.entries.entry(name).or_insert(SubCommand {
            parser,
            schema: Arc::new(schema),
            help: help.map(str::to_string),
            callback,
        });
        Ok(&mut entry.parser)
    }

    /// Registers the fields of a record on this parser without marking it
    /// for reconstruction; its values land in the residual namespace.
    ///
    /// # Errors
    ///
    /// [`SchemaError::MustBeRecord`], or any registration error.
    pub fn add_arguments(&mut self, decl: impl Into<Declaration>) -> std::result::Result<&mut Self, SchemaError> {
        let schema = decl.into().into_record()?;
        self.register_fields(&schema)?;
        Ok(self)
    }

    /// Registers one schema-less argument.
    ///
    /// # Errors
    ///
    /// Name conflicts, malformed names, unsupported actions, or a
    /// positional that cannot follow the positionals already registered.
    pub fn add_argument(&mut self, spec: ArgumentSpec) -> std::result::Result<&mut Self, SchemaError> {
        check_positional_order(self.argument_specs(), &spec)?;
        let arg = build_arg(&spec, &mut self.taken)?;
        debug!(parser = %self.name, id = spec.id(), names = ?spec.names, "registered argument");
        self.args.push(Registered { spec, arg });
        Ok(self)
    }

    fn register_fields(&mut self, schema: &Schema) -> std::result::Result<(), SchemaError> {
        for spec in compile(schema)? {
            self.add_argument(spec)?;
        }
        Ok(())
    }

    /// Program name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Root record, if registered.
    pub fn root(&self) -> Option<&Schema> {
        self.root.as_deref()
    }

    /// Arguments registered directly on this parser, in order.
    pub fn argument_specs(&self) -> impl Iterator<Item = &ArgumentSpec> {
        self.args.iter().map(|reg| &reg.spec)
    }

    /// Sub-command names, in registration order.
    pub fn command_names(&self) -> impl Iterator<Item = &str> {
        self.commands
            .iter()
            .flat_map(|d| d.entries.keys().map(String::as_str))
    }

    /// Parser of a registered sub-command.
    pub fn subcommand(&self, name: &str) -> Option<&RecordParser> {
        self.commands.as_ref()?.entries.get(name).map(|sub| &sub.parser)
    }

    /// Mutable parser of a registered sub-command.
    pub fn subcommand_mut(&mut self, name: &str) -> Option<&mut RecordParser> {
        self.commands
            .as_mut()?
            .entries
            .get_mut(name)
            .map(|sub| &mut sub.parser)
    }

    /// Version string of a registered version argument, falling back to
    /// the configured version.
    pub(crate) fn version_text(&self) -> Option<String> {
        self.args
            .iter()
            .find(|reg| reg.spec.action == Some(Action::Version))
            .map(|reg| {
                reg.spec
                    .version
                    .clone()
                    .or_else(|| self.config.version.clone())
                    .unwrap_or_default()
            })
    }

    /// Whether any sub-command was ever registered.
    pub fn has_commands(&self) -> bool {
        self.commands.is_some()
    }

    /// The clap command equivalent to this parser.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(self.name.clone()).disable_version_flag(true);
        if let Some(about) = &self.config.about {
            cmd = cmd.about(about.clone());
        }

        if let Some(version) = self.version_text() {
            cmd = cmd.version(version);
        }
        for reg in &self.args {
            cmd = cmd.arg(reg.arg.clone());
        }

        if let Some(dispatcher) = &self.commands {
            for (name, sub) in &dispatcher.entries {
                let mut sub_cmd = sub.parser.command().name(name.clone());
                if let Some(help) = &sub.help {
                    sub_cmd = sub_cmd.about(help.clone());
                }
                cmd = cmd.subcommand(sub_cmd);
            }
            cmd = cmd.subcommand_required(self.config.command_required);
        }

        cmd
    }

    /// Parses `tokens` (without the program name).
    ///
    /// # Errors
    ///
    /// [`ParseError::Usage`] for malformed input and for help or version
    /// requests; call [`clap::Error::exit`] to report it.
    pub fn try_parse_args_from<I, T>(&self, tokens: I) -> Result<Outcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Ok(self.parse_tokens(tokens)?)
    }

    /// Parses `tokens`, exiting the process on malformed input. A version
    /// request prints the bare version string and exits with status 0.
    pub fn parse_args_from<I, T>(&self, tokens: I) -> Outcome
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        self.parse_tokens(tokens).unwrap_or_else(|err| {
            if err.kind() == ErrorKind::DisplayVersion {
                if let Some(version) = self.version_text() {
                    println!("{version}");
                    std::process::exit(0);
                }
            }
            err.exit()
        })
    }

    /// Parses the process arguments, exiting on malformed input.
    pub fn parse_args(&self) -> Outcome {
        self.parse_args_from(std::env::args_os().skip(1))
    }

    /// Reconstructs the outcome from matches of [`command`](Self::command).
    ///
    /// # Errors
    ///
    /// [`ParseError::Usage`] when a string default fails conversion.
    pub fn from_matches(&self, matches: &ArgMatches) -> Result<Outcome> {
        let ctx = ParseContext::default();
        let ns = self.collect(matches, &ctx)?;
        Ok(reconstruct(ns, self.has_commands()))
    }

    fn parse_tokens<I, T>(&self, tokens: I) -> std::result::Result<Outcome, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = std::iter::once(OsString::from(&self.name)).chain(tokens.into_iter().map(Into::into));
        let matches = self.command().try_get_matches_from(argv)?;

        let ctx = ParseContext::default();
        let ns = self.collect(&matches, &ctx)?;
        Ok(reconstruct(ns, self.has_commands()))
    }

    /// Gathers the values of this level and every matched sub-command level
    /// into one flat namespace. The deepest matched command sets the marker.
    fn collect(&self, matches: &ArgMatches, ctx: &ParseContext) -> std::result::Result<Namespace, clap::Error> {
        let mut ns = Namespace::new();
        if !ctx.is_nested() {
            ns.root = self.root.clone();
        }

        for reg in &self.args {
            if let Some(value) = extract_value(&reg.spec, matches)? {
                trace!(id = reg.spec.id(), %value, "extracted value");
                ns.insert(reg.spec.id(), value);
            }
        }

        let Some((name, sub_matches)) = matches.subcommand() else {
            return Ok(ns);
        };
        let Some(sub) = self.commands.as_ref().and_then(|d| d.entries.get(name)) else {
            return Ok(ns);
        };

        ns.command = Some(CommandMarker {
            name: name.to_string(),
            schema: Arc::clone(&sub.schema),
            callback: sub.callback.clone(),
        });

        let nested = {
            let _level = ctx.descend();
            sub.parser.collect(sub_matches, ctx)?
        };
        if nested.command.is_some() {
            ns.command = nested.command.clone();
        }
        for (key, value) in nested.values() {
            ns.insert(key.clone(), value.clone());
        }

        Ok(ns)
    }
}

fn default_prog() -> String {
    std::env::args_os()
        .next()
        .and_then(|argv0| {
            Path::new(&argv0)
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| FALLBACK_PROG.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use record_opt_core::{Field, Nargs, TypeExpr, Value};

    fn schema(name: &str, fields: Vec<Field>) -> Schema {
        Schema::builder(name).fields(fields).build().unwrap()
    }

    #[test]
    fn test_duplicate_command_is_rejected() {
        let a = schema("A", vec![]);
        let mut parser = RecordParser::new("prog");
        parser.add_command("a", a.clone(), None, None).unwrap();
        let err = parser.add_command("a", a, None, None).unwrap_err();
        assert_eq!(err, SchemaError::DuplicateCommand("a".to_string()));
    }

    #[test]
    fn test_dispatcher_created_lazily() {
        let mut parser = RecordParser::new("prog");
        assert!(!parser.has_commands());
        parser.add_command("a", schema("A", vec![]), None, None).unwrap();
        parser.add_command("b", schema("B", vec![]), None, None).unwrap();
        assert_eq!(parser.command_names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_conflicting_field_names() {
        let test = schema(
            "Test",
            vec![
                Field::opt("foo", TypeExpr::BOOL),
                Field::opt("far", TypeExpr::BOOL),
            ],
        );
        let err = RecordParser::new("prog").with_root(test).unwrap_err();
        assert_eq!(err, SchemaError::ConflictingOptionName("-f".to_string()));
    }

    #[test]
    fn test_help_flag_is_reserved() {
        let test = schema("Test", vec![Field::opt("host", TypeExpr::STR)]);
        let err = RecordParser::new("prog").with_root(test).unwrap_err();
        assert_eq!(err, SchemaError::ConflictingOptionName("-h".to_string()));
    }

    #[test]
    fn test_nested_command_sets_deepest_marker() {
        let mut parser = RecordParser::new("git");
        let remote = parser
            .add_command("remote", schema("Remote", vec![Field::opt("verbose", TypeExpr::BOOL)]), None, None)
            .unwrap();
        remote
            .add_command("add", schema("RemoteAdd", vec![Field::new("name", TypeExpr::STR)]), None, None)
            .unwrap();

        let outcome = parser
            .try_parse_args_from(["remote", "-v", "add", "origin"])
            .unwrap();
        let command = outcome.command().unwrap();
        assert_eq!(command.name, "add");
        assert_eq!(command.record.get("name"), Some(&Value::from("origin")));
        assert_eq!(outcome.rest().unwrap().get("verbose"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_version_text() {
        let parser = RecordParser::new("prog");
        assert_eq!(parser.version_text(), None);

        let parser = parser.with_version("2.1.0").unwrap();
        assert_eq!(parser.version_text().as_deref(), Some("2.1.0"));
        assert_eq!(parser.command().get_version(), Some("2.1.0"));
    }

    #[test]
    fn test_positional_order_checked_at_registration() {
        let test = schema(
            "Test",
            vec![
                Field::arg("bar", TypeExpr::optional(TypeExpr::STR)),
                Field::new("baz", TypeExpr::INT),
            ],
        );
        let err = RecordParser::new("prog").with_root(test).unwrap_err();
        assert_eq!(
            err,
            SchemaError::RequiredAfterOptional {
                field: "baz".to_string(),
                after: "bar".to_string(),
            }
        );

        let mut parser = RecordParser::new("prog");
        parser
            .add_argument(ArgumentSpec::new(["files"]).nargs(Nargs::OneOrMore))
            .unwrap();
        let err = parser.add_argument(ArgumentSpec::new(["dest"])).unwrap_err();
        assert!(matches!(err, SchemaError::PositionalAfterMultiValued { .. }));
        assert_eq!(parser.argument_specs().count(), 1);
    }

    #[test]
    fn test_subcommand_mut_registers_on_sub_parser() {
        let mut parser = RecordParser::new("prog");
        parser.add_command("a", schema("A", vec![]), None, None).unwrap();
        assert!(parser.subcommand_mut("b").is_none());
        parser
            .subcommand_mut("a")
            .unwrap()
            .add_argument(ArgumentSpec::new(["--dry-run"]).action(Action::StoreTrue))
            .unwrap();

        let outcome = parser.try_parse_args_from(["a", "--dry-run"]).unwrap();
        assert_eq!(outcome.command().map(|c| c.name.as_str()), Some("a"));
        assert_eq!(outcome.rest().unwrap().get("dry_run"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_context_depth_restored() {
        let ctx = ParseContext::default();
        {
            let _outer = ctx.descend();
            let _inner = ctx.descend();
            assert!(ctx.is_nested());
        }
        assert!(!ctx.is_nested());
    }

    #[test]
    fn test_from_matches_equals_direct_parse() {
        let test = schema("Test", vec![Field::opt("count", TypeExpr::INT).default(1)]);
        let parser = RecordParser::new("prog").with_root(test).unwrap();
        let matches = parser.command().try_get_matches_from(["prog", "-c", "5"]).unwrap();
        assert_eq!(
            parser.from_matches(&matches).unwrap(),
            parser.try_parse_args_from(["-c", "5"]).unwrap()
        );
    }
}

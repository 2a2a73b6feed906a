//! Result reconstruction: the flat namespace turned back into records.

use record_opt_core::{Record, Schema, Value};
use serde::Serialize;
use tracing::debug;

use crate::namespace::{Callback, Namespace};

/// A reconstructed sub-command paired with what was registered with it.
#[derive(Debug, Clone, Serialize)]
pub struct CommandInstance {
    /// Command name as matched on the command line.
    pub name: String,
    /// The command's record.
    pub record: Record,
    #[serde(skip)]
    callback: Option<Callback>,
}

impl CommandInstance {
    /// Pairs a record with its command name and callback.
    pub fn new(name: impl Into<String>, record: Record, callback: Option<Callback>) -> Self {
        Self {
            name: name.into(),
            record,
            callback,
        }
    }

    /// Callback registered with the command.
    pub fn callback(&self) -> Option<&Callback> {
        self.callback.as_ref()
    }

    /// Invokes the callback with the record. Returns `false` when none was
    /// registered.
    pub fn run(&self) -> bool {
        match &self.callback {
            Some(callback) => {
                callback.call(&self.record);
                true
            }
            None => false,
        }
    }
}

impl PartialEq for CommandInstance {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.record == other.record
    }
}

/// What a parse produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    /// No records registered: the flat namespace.
    Plain(Namespace),
    /// Root record plus the keys it did not claim.
    Root {
        /// Root record.
        root: Record,
        /// Unclaimed keys.
        rest: Namespace,
    },
    /// Sub-command record plus the keys it did not claim.
    Command {
        /// Unclaimed keys.
        rest: Namespace,
        /// The matched command.
        command: CommandInstance,
    },
    /// Root and sub-command records.
    RootAndCommand {
        /// Root record.
        root: Record,
        /// The matched command.
        command: CommandInstance,
    },
    /// Sub-commands exist but none was given.
    NoCommand(Namespace),
}

impl Outcome {
    /// The root record, if reconstructed.
    pub fn root(&self) -> Option<&Record> {
        match self {
            Self::Root { root, .. } | Self::RootAndCommand { root, .. } => Some(root),
            _ => None,
        }
    }

    /// The matched sub-command, if any.
    pub fn command(&self) -> Option<&CommandInstance> {
        match self {
            Self::Command { command, .. } | Self::RootAndCommand { command, .. } => Some(command),
            _ => None,
        }
    }

    /// The flat keys not claimed by a record.
    pub fn rest(&self) -> Option<&Namespace> {
        match self {
            Self::Plain(ns) | Self::NoCommand(ns) => Some(ns),
            Self::Root { rest, .. } | Self::Command { rest, .. } => Some(rest),
            Self::RootAndCommand { .. } => None,
        }
    }
}

/// Builds a record of `schema` from the matching keys of `ns`.
///
/// Fields without a key (suppressed fields never reach the engine) take
/// their declared default, or `None`.
fn build_record(schema: &Schema, ns: &Namespace) -> Record {
    let mut record = Record::new(schema.name());
    for field in schema.fields() {
        let value = match ns.get(&field.name) {
            Some(value) => value.clone(),
            None if field.meta.default.is_given() => field.meta.default.resolve(),
            None => Value::None,
        };
        record.insert(field.name.clone(), value);
    }
    record
}

/// Splits off the keys claimed by `schema`.
fn residual(schema: &Schema, mut ns: Namespace) -> Namespace {
    for name in schema.field_names() {
        ns.remove(name);
    }
    ns.root = None;
    ns.command = None;
    ns
}

/// Turns a parse result into its [`Outcome`].
pub(crate) fn reconstruct(mut ns: Namespace, has_commands: bool) -> Outcome {
    let root = ns.root.take();
    let command = ns.command.take();

    let outcome = match (root, command) {
        (None, None) if has_commands => Outcome::NoCommand(ns),
        (None, None) => Outcome::Plain(ns),
        (Some(root), None) => {
            let record = build_record(&root, &ns);
            Outcome::Root {
                root: record,
                rest: residual(&root, ns),
            }
        }
        (None, Some(marker)) => {
            let record = build_record(&marker.schema, &ns);
            Outcome::Command {
                rest: residual(&marker.schema, ns),
                command: CommandInstance::new(marker.name, record, marker.callback),
            }
        }
        (Some(root), Some(marker)) => Outcome::RootAndCommand {
            root: build_record(&root, &ns),
            command: CommandInstance::new(
                marker.name,
                build_record(&marker.schema, &ns),
                marker.callback,
            ),
        },
    };

    debug!(
        root = outcome.root().map(Record::name),
        command = outcome.command().map(|c| c.name.as_str()),
        "reconstructed parse result"
    );
    outcome
}

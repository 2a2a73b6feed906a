//! The flat parse result and the markers identifying its record types.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use record_opt_core::{Record, Schema, Value};
use serde::Serialize;

/// Function attached to a sub-command, invoked with its reconstructed record.
pub type CallbackFn = dyn Fn(&Record) + Send + Sync;

/// Shareable handle to a sub-command callback.
#[derive(Clone)]
pub struct Callback(Arc<CallbackFn>);

impl Callback {
    /// Wraps a function.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Record) + Send + Sync + 'static,
    {
        Self(Arc::new(func))
    }

    /// Calls the function.
    pub fn call(&self, record: &Record) {
        (self.0)(record)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// Marker set by the matched sub-command.
#[derive(Debug, Clone)]
pub struct CommandMarker {
    /// Command name as typed on the command line.
    pub name: String,
    /// Record type of the command.
    pub schema: Arc<Schema>,
    /// Callback registered with the command.
    pub callback: Option<Callback>,
}

/// Flat mapping from destination key to parsed value.
///
/// Equality and serialization only look at the values; the markers are
/// bookkeeping for reconstruction.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Namespace {
    #[serde(flatten)]
    values: IndexMap<String, Value>,
    #[serde(skip)]
    pub(crate) root: Option<Arc<Schema>>,
    #[serde(skip)]
    pub(crate) command: Option<CommandMarker>,
}

impl Namespace {
    /// An empty namespace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Sets `key`, replacing any earlier value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Value under `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Whether `key` is present.
    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Removes and returns the value under `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// All values in insertion order.
    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether no keys are set.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Root record type, if one was registered.
    pub fn root_schema(&self) -> Option<&Schema> {
        self.root.as_deref()
    }

    /// Matched sub-command, if any.
    pub fn command_marker(&self) -> Option<&CommandMarker> {
        self.command.as_ref()
    }
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Namespace {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut ns = Self::new();
        for (key, value) in iter {
            ns.insert(key, value);
        }
        ns
    }
}

//! Backend adapter contract
//!
//! A backend hosts one persisted schema plus the values of a data tree,
//! addressed slot by slot with [`FieldPath`]s. List lengths are recorded as
//! sequence slots so that empty elements survive a round trip.

use crate::path::FieldPath;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use strata_schema::SchemaHash;
use thiserror::Error;

/// Errors reported by backend adapters
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("No storage found at '{location}'")]
    NotFound { location: String },

    #[error("Storage already exists at '{location}'")]
    AlreadyExists { location: String },

    #[error("I/O error at '{location}': {source}")]
    Io {
        location: String,
        #[source]
        source: io::Error,
    },

    #[error("Corrupt storage at '{location}': {reason}")]
    Corrupt { location: String, reason: String },

    #[error("Encoding error at '{location}': {reason}")]
    Encoding { location: String, reason: String },
}

impl BackendError {
    /// Classify an I/O error, keeping "not found" and "already exists"
    /// apart from other failures
    pub fn from_io(location: impl Into<String>, source: io::Error) -> Self {
        let location = location.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { location },
            io::ErrorKind::AlreadyExists => Self::AlreadyExists { location },
            _ => Self::Io { location, source },
        }
    }

    pub fn corrupt(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            location: location.into(),
            reason: reason.into(),
        }
    }

    pub fn encoding(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Encoding {
            location: location.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for backend operations
pub type BackendResult<T> = std::result::Result<T, BackendError>;

/// Schema as recorded in a backend: its hash and its JSON document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSchema {
    pub hash: SchemaHash,
    pub json: String,
}

/// Storage engine hosting one data tree
pub trait Backend: fmt::Debug {
    /// Location this backend was opened or created at
    fn location(&self) -> &str;

    /// Persisted schema, or `None` for a freshly created backend
    fn read_schema(&self) -> BackendResult<Option<PersistedSchema>>;

    fn write_schema(&mut self, schema: PersistedSchema) -> BackendResult<()>;

    /// Value stored in a slot, `None` when the slot is empty
    fn read_value(&self, slot: &FieldPath) -> BackendResult<Option<Value>>;

    fn write_value(&mut self, slot: &FieldPath, value: &Value) -> BackendResult<()>;

    /// Clear a slot; clearing an empty slot is not an error
    fn remove_value(&mut self, slot: &FieldPath) -> BackendResult<()>;

    /// Recorded length of the list at `slot`, zero when unrecorded
    fn sequence_len(&self, slot: &FieldPath) -> BackendResult<usize>;

    /// Record a list length; shrinking drops every slot of the removed
    /// elements
    fn resize_sequence(&mut self, slot: &FieldPath, len: usize) -> BackendResult<()>;

    /// Make every write durable
    fn flush(&mut self) -> BackendResult<()>;
}

/// Creates and opens backends of one kind
pub trait BackendFactory: Send + Sync + fmt::Debug {
    /// Short name used to select the backend explicitly
    fn name(&self) -> &'static str;

    /// Location suffixes this backend is detected by
    fn suffixes(&self) -> &[&'static str];

    fn exists(&self, location: &str) -> bool;

    /// Create a new, empty backend
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::AlreadyExists`] when something is already
    /// stored at `location` and `overwrite` is false.
    fn create(&self, location: &str, overwrite: bool) -> BackendResult<Box<dyn Backend>>;

    /// Open an existing backend
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when nothing is stored at
    /// `location`.
    fn open(&self, location: &str) -> BackendResult<Box<dyn Backend>>;
}

/// In-memory slot staging shared by the bundled adapters
///
/// Slot keys are the display form of their [`FieldPath`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SlotTable {
    pub schema: Option<PersistedSchema>,
    #[serde(default)]
    pub values: BTreeMap<String, Value>,
    #[serde(default)]
    pub sequences: BTreeMap<String, usize>,
}

impl SlotTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, slot: &FieldPath) -> Option<&Value> {
        self.values.get(&slot.to_string())
    }

    pub fn set_value(&mut self, slot: &FieldPath, value: Value) {
        self.values.insert(slot.to_string(), value);
    }

    pub fn remove_value(&mut self, slot: &FieldPath) {
        self.values.remove(&slot.to_string());
    }

    pub fn sequence_len(&self, slot: &FieldPath) -> usize {
        self.sequences.get(&slot.to_string()).copied().unwrap_or(0)
    }

    pub fn resize_sequence(&mut self, slot: &FieldPath, len: usize) {
        let key = slot.to_string();
        let previous = self.sequences.get(&key).copied().unwrap_or(0);
        for index in len..previous {
            let prefix = slot.index(index).to_string();
            self.values.retain(|k, _| !is_within(k, &prefix));
            self.sequences.retain(|k, _| !is_within(k, &prefix));
        }
        if len == 0 {
            self.sequences.remove(&key);
        } else {
            self.sequences.insert(key, len);
        }
    }

    /// First slot holding a NaN or infinite float
    ///
    /// Text encodings cannot represent such values.
    pub fn first_non_finite(&self) -> Option<&str> {
        self.values
            .iter()
            .find(|(_, value)| !value.is_finite())
            .map(|(slot, _)| slot.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.schema.is_none() && self.values.is_empty() && self.sequences.is_empty()
    }
}

/// Whether `key` is `prefix` itself or a slot below it
fn is_within(key: &str, prefix: &str) -> bool {
    key.strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with(['.', '[']))
}

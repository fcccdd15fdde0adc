#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # strata-storage
//!
//! Storage lifecycle, backend auto-detection, and pseudo storages.
//!
//! A [`Storage`] binds a data tree to one backend location. New storages are
//! created from a schema; existing ones are loaded only when their persisted
//! schema hash is one of the hashes the caller accepts. A [`PseudoStorage`]
//! lets a library work with its own schema regardless of whether its data
//! lives in a storage of its own or inside a larger application tree.
//!
//! ## Example Usage
//!
//! ```rust
//! use strata_schema::{DType, SchemaNode};
//! use strata_storage::{LoadOptions, StorageConfig};
//!
//! let schema = SchemaNode::compilation()
//!     .field("count", SchemaNode::scalar(DType::UInt16).build()?)
//!     .build()?;
//! let mut storage = strata_storage::create(":memory:", schema, &StorageConfig::default())?;
//! storage.data_mut()?.field_mut("count")?.set(7u32)?;
//! storage.save()?;
//! assert_eq!(storage.data()?.field("count")?.value()?.as_i64(), Some(7));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod memory;
pub mod pseudo;
pub mod registry;
pub mod storage;

pub use config::StorageConfig;
pub use memory::{MEMORY_LOCATION, MemoryBackend, MemoryBackendFactory};
pub use pseudo::PseudoStorage;
pub use registry::BackendRegistry;
pub use storage::{LoadOptions, Storage, StorageState};

use strata_data::{BackendError, DataNode};
use strata_schema::{SchemaHash, SchemaNode};
use strata_validation::ValidationError;
use thiserror::Error;

/// Errors that can occur when working with storages
#[derive(Error, Debug)]
pub enum Error {
    #[error("Could not automatically detect backend for \"{location}\".")]
    AutodetectBackend { location: String },

    #[error("Unknown backend '{name}'")]
    UnknownBackend { name: String },

    /// The persisted schema hash is not accepted by the caller
    #[error(
        "Schema of '{location}' does not match the required schema (found {found}, {accepted} accepted hashes)"
    )]
    IncompatibleSchema {
        location: String,
        found: SchemaHash,
        accepted: usize,
    },

    #[error("Storage '{location}' is closed")]
    Closed { location: String },

    #[error("Pseudo storage has not been opened")]
    NotOpen,

    #[error("Storage '{location}' holds no schema")]
    NoSchema { location: String },

    #[error("Storage '{location}' is corrupt: {reason}")]
    Corrupt { location: String, reason: String },

    #[error("Invalid storage configuration: {reason}")]
    Config { reason: String },

    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Data(#[from] strata_data::Error),

    #[error(transparent)]
    Schema(#[from] strata_schema::Error),
}

impl Error {
    /// Build a corrupt-storage error with location context.
    pub fn corrupt(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            location: location.into(),
            reason: reason.into(),
        }
    }

    /// Build a closed-storage error.
    pub fn closed(location: impl Into<String>) -> Self {
        Self::Closed {
            location: location.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Create a new storage with the default backend registry
///
/// The backend is auto-detected from the location suffix unless
/// `config.backend` names one.
///
/// # Errors
///
/// Fails when no backend matches or the backend cannot create the location.
pub fn create(
    location: &str,
    schema: impl Into<std::sync::Arc<SchemaNode>>,
    config: &StorageConfig,
) -> Result<Storage> {
    Storage::create(&BackendRegistry::default(), location, schema, config)
}

/// Load an existing storage with the default backend registry
///
/// # Errors
///
/// Fails when the location cannot be opened, its schema is not accepted, or
/// the loaded data does not validate while `require_valid` is set.
pub fn load(location: &str, options: LoadOptions) -> Result<Storage> {
    Storage::load(&BackendRegistry::default(), location, options)
}

/// Create a new storage holding a copy of `data`
///
/// # Errors
///
/// Fails like [`create`].
pub fn create_from(location: &str, data: &DataNode, config: &StorageConfig) -> Result<Storage> {
    Storage::create_from(&BackendRegistry::default(), location, data, config)
}

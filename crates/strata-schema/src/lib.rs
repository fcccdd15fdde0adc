//! # strata-schema
//!
//! Schema model, canonical hashing, and schema loading for strata storages.
//!
//! A schema is an immutable tree of [`SchemaNode`]s. Leaves describe a single
//! value (scalar, array, bytes, string, date/time) and its constraints;
//! compilations group named fields and lists repeat a single element
//! template. The canonical [`SchemaHash`] of a tree is the identity used to
//! decide whether a persisted storage is compatible with a schema.
//!
//! ## Example Usage
//!
//! ```rust
//! use strata_schema::{DType, SchemaNode};
//!
//! let schema = SchemaNode::compilation()
//!     .field("time", SchemaNode::array(DType::Float64).unit("s").build()?)
//!     .field(
//!         "voltage",
//!         SchemaNode::array(DType::Float64).unit("V").depends_on(["time"]).build()?,
//!     )
//!     .field("comment", SchemaNode::string().build()?)
//!     .optional("comment")
//!     .build()?;
//!
//! assert_eq!(schema.hash().to_string().len(), 64);
//! # Ok::<(), strata_schema::Error>(())
//! ```

pub mod hash;
pub mod loader;
pub mod model;
pub mod registry;

pub use hash::SchemaHash;
pub use loader::SchemaLoader;
pub use model::{
    ArraySchema, BytesSchema, CompilationSchema, DType, ListSchema, NodeKind, ScalarSchema,
    SchemaNode, StringSchema, TemporalKind, TemporalSchema,
};
pub use registry::SchemaRegistry;

use thiserror::Error;

/// Errors that can occur when working with schemas
#[derive(Error, Debug)]
pub enum Error {
    /// The constraints handed to a schema constructor contradict each other.
    #[error("Invalid {kind} schema: {reason}")]
    Construction { kind: NodeKind, reason: String },

    #[error("Invalid schema format: {0}")]
    InvalidFormat(String),

    #[error("Invalid schema hash '{value}': {reason}")]
    InvalidHash { value: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a construction error for a node kind.
    pub fn construction(kind: NodeKind, reason: impl Into<String>) -> Self {
        Self::Construction {
            kind,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

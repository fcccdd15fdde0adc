#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # strata-data
//!
//! Data node tree, values, and backend adapter contract for strata storages.
//!
//! A [`DataNode`] tree mirrors a [`strata_schema::SchemaNode`] tree one to
//! one. Item nodes hold an optional [`Value`]; compilations and lists derive
//! their emptiness and completeness from their children. Backends implement
//! the [`Backend`] contract and host the values of a tree slot by slot.

/// Backend adapter contract and the shared slot table.
pub mod backend;
/// File-backed backends over a slot table.
pub mod file;
/// Raw input accepted by bulk replacement.
pub mod input;
/// Data nodes bound to schema nodes.
pub mod node;
/// Field paths addressing nodes and backend slots.
pub mod path;
/// Visitor-based traversal over data trees.
pub mod traversal;
/// Values and coercion to declared element types.
pub mod value;

pub use backend::{Backend, BackendError, BackendFactory, BackendResult, PersistedSchema, SlotTable};
pub use file::{FileBackend, TableCodec, file_exists};
pub use input::Input;
pub use node::{CompilationNode, DataNode, ItemNode, ListNode};
pub use path::{FieldPath, PathSegment};
pub use traversal::{Visitor, walk};
pub use value::{ArrayData, NdArray, Value, coerce};

use strata_schema::{DType, NodeKind, SchemaHash};
use thiserror::Error;

/// Errors that can occur when working with data nodes
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Node is empty. The value of empty nodes is undefined.")]
    EmptyNode,

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    #[error("Value {value} cannot be represented as {dtype}")]
    OutOfRange { value: String, dtype: DType },

    #[error("Invalid array: {reason}")]
    InvalidArray { reason: String },

    #[error("Node not found at path: {path}")]
    NodeNotFound { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Operation '{operation}' is not supported on {kind} nodes")]
    Unsupported {
        operation: &'static str,
        kind: NodeKind,
    },

    #[error("Nodes with schema hashes {left} and {right} are incompatible")]
    IncompatibleNodes { left: SchemaHash, right: SchemaHash },
}

impl Error {
    /// Build a type-mismatch error from expected and found descriptions.
    pub fn type_mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }

    /// Build a node-not-found error with path context.
    pub fn node_not_found(path: impl Into<String>) -> Self {
        Self::NodeNotFound { path: path.into() }
    }

    /// Build an invalid-path error with input path and parsing reason.
    pub fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Build an invalid-array error.
    pub fn invalid_array(reason: impl Into<String>) -> Self {
        Self::InvalidArray {
            reason: reason.into(),
        }
    }
}

/// Crate-local result type for data node operations.
pub type Result<T> = std::result::Result<T, Error>;

#![deny(warnings)]
#![deny(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

//! # strata-validation
//!
//! Validation of data trees against the constraints of their schemas.
//!
//! Leaf nodes are checked against bounds, shape, and length constraints.
//! Compilations additionally check that dependent arrays match the lengths of
//! their independent variables, and group nodes aggregate every failure of
//! their subtree under its full field path.
//!
//! ## Example Usage
//!
//! ```rust
//! use strata_data::DataNode;
//! use strata_schema::{DType, SchemaNode};
//! use strata_validation::Validate;
//!
//! let schema = SchemaNode::compilation()
//!     .field("count", SchemaNode::scalar(DType::Int32).max_value(100.0).build().unwrap())
//!     .build()
//!     .unwrap();
//! let mut data = DataNode::from_schema(schema);
//! assert!(data.validate().is_ok());
//!
//! data.field_mut("count").unwrap().set(123).unwrap();
//! let err = data.validate().unwrap_err();
//! assert!(err.to_string().contains("count"));
//! ```

pub mod engine;
pub mod report;
pub mod rules;

pub use engine::{Validate, ValidationConfig, Validator};
pub use report::ValidationReport;
pub use rules::ConstraintKind;

use std::fmt;
use strata_data::FieldPath;
use thiserror::Error;

/// Validation failure of a node
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A leaf value violates one of its constraints
    #[error("{message} (Expected: {expected}. Got: {got})")]
    Constraint {
        constraint: ConstraintKind,
        message: String,
        expected: String,
        got: String,
    },

    /// A dependent array dimension does not match its independent variable
    #[error(
        "Dependent array size mismatch: dimension {dimension} of '{dependent}' depends on '{independent}' (Expected: {expected}. Got: {got})"
    )]
    Dependency {
        dependent: String,
        independent: String,
        dimension: usize,
        expected: usize,
        got: usize,
    },

    /// One or more nodes below a compilation or list failed
    #[error("{}", DisplayFailures(failures))]
    Aggregate { failures: Vec<FieldFailure> },
}

impl ValidationError {
    /// Leaf constraint failure with its canonical message
    pub fn constraint(
        constraint: ConstraintKind,
        expected: impl fmt::Display,
        got: impl fmt::Display,
    ) -> Self {
        Self::Constraint {
            constraint,
            message: constraint.message().to_string(),
            expected: expected.to_string(),
            got: got.to_string(),
        }
    }

    /// Failures of an aggregate, or an empty slice for leaf errors
    pub fn failures(&self) -> &[FieldFailure] {
        match self {
            Self::Aggregate { failures } => failures,
            _ => &[],
        }
    }
}

/// A leaf failure located by its full path from the validated node
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFailure {
    pub path: FieldPath,
    pub error: ValidationError,
}

impl fmt::Display for FieldFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node \"{}\" failed validation: {}", self.path, self.error)
    }
}

struct DisplayFailures<'a>(&'a [FieldFailure]);

impl fmt::Display for DisplayFailures<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, failure) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{failure}")?;
        }
        Ok(())
    }
}

/// Result type for validation
pub type Result<T> = std::result::Result<T, ValidationError>;

//! Validation reporting

use crate::{FieldFailure, Result, ValidationError};
use std::fmt;

/// Every failure found in one validation pass, in tree order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationReport {
    failures: Vec<FieldFailure>,
}

impl ValidationReport {
    pub fn new(failures: Vec<FieldFailure>) -> Self {
        Self { failures }
    }

    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failures(&self) -> &[FieldFailure] {
        &self.failures
    }

    pub fn len(&self) -> usize {
        self.failures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert into the error a failing node reports
    ///
    /// A single failure of the validated node itself is returned as is;
    /// anything else becomes [`ValidationError::Aggregate`].
    ///
    /// # Errors
    ///
    /// Fails when the report holds any failure.
    pub fn into_result(mut self) -> Result<()> {
        match self.failures.len() {
            0 => Ok(()),
            1 if self.failures[0].path.is_root() => match self.failures.pop() {
                Some(failure) => Err(failure.error),
                None => Ok(()),
            },
            _ => Err(ValidationError::Aggregate {
                failures: self.failures,
            }),
        }
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failures.is_empty() {
            return f.write_str("Validation passed");
        }
        writeln!(f, "Validation failed with {} error(s):", self.failures.len())?;
        for failure in &self.failures {
            writeln!(f, "  {failure}")?;
        }
        Ok(())
    }
}

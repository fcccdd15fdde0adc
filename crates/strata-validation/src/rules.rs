//! Validation rules

use crate::{Result, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_data::{ArrayData, CompilationNode, NdArray, Value};
use strata_schema::{
    ArraySchema, BytesSchema, DType, ScalarSchema, SchemaNode, StringSchema, TemporalKind,
};

/// The constraint a leaf value failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstraintKind {
    Type,
    DType,
    NDim,
    MinShape,
    MaxShape,
    MinElementValue,
    MaxElementValue,
    MinValue,
    MaxValue,
    MinBytesLength,
    MaxBytesLength,
    MinStringLength,
    MaxStringLength,
    Pattern,
    MinListLength,
    MaxListLength,
}

impl ConstraintKind {
    /// User-facing description of the violated constraint
    pub fn message(self) -> &'static str {
        match self {
            ConstraintKind::Type => "Invalid type/value.",
            ConstraintKind::DType => "Invalid dtype.",
            ConstraintKind::NDim => "Invalid number of array dimensions.",
            ConstraintKind::MinShape => "Minimum array shape undercut.",
            ConstraintKind::MaxShape => "Maximum array shape exceeded.",
            ConstraintKind::MinElementValue => "Minimum array element value undercut.",
            ConstraintKind::MaxElementValue => "Maximum array element value exceeded.",
            ConstraintKind::MinValue => "Minimum value undercut.",
            ConstraintKind::MaxValue => "Maximum value exceeded.",
            ConstraintKind::MinBytesLength => "Minimum bytes length undercut.",
            ConstraintKind::MaxBytesLength => "Maximum bytes length exceeded.",
            ConstraintKind::MinStringLength => "Minimum string length undercut.",
            ConstraintKind::MaxStringLength => "Maximum string length exceeded.",
            ConstraintKind::Pattern => "String does not match pattern.",
            ConstraintKind::MinListLength => "Minimum list length undercut.",
            ConstraintKind::MaxListLength => "Maximum list length exceeded.",
        }
    }
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Check a populated item value against its schema
///
/// # Errors
///
/// Returns the first violated constraint.
pub fn validate_item(schema: &SchemaNode, value: &Value) -> Result<()> {
    match (schema, value) {
        (SchemaNode::Bool, Value::Bool(_)) => Ok(()),
        (SchemaNode::Scalar(scalar), value) => validate_scalar(scalar, value),
        (SchemaNode::Array(array), Value::Array(nd)) => validate_array(array, nd),
        (SchemaNode::Bytes(bytes), Value::Bytes(b)) => validate_bytes(bytes, b),
        (SchemaNode::String(string), Value::String(s)) => validate_string(string, s),
        (SchemaNode::Temporal(temporal), value) => {
            let ok = matches!(
                (temporal.kind(), value),
                (TemporalKind::Date, Value::Date(_))
                    | (TemporalKind::Time, Value::Time(_))
                    | (TemporalKind::DateTime, Value::DateTime(_))
            );
            if ok {
                Ok(())
            } else {
                Err(type_error(schema, value))
            }
        }
        (schema, value) => Err(type_error(schema, value)),
    }
}

fn type_error(schema: &SchemaNode, value: &Value) -> ValidationError {
    ValidationError::constraint(ConstraintKind::Type, schema.kind(), value.type_name())
}

/// Check a scalar against its dtype and value bounds
///
/// # Errors
///
/// Fails on non-numeric values, values of the wrong numeric family, and
/// bound violations.
pub fn validate_scalar(schema: &ScalarSchema, value: &Value) -> Result<()> {
    let dtype = schema.dtype();
    let fits = match value {
        Value::Int(i) => dtype.is_signed_integer() && fits_integer(dtype, i128::from(*i)),
        Value::UInt(u) => dtype.is_unsigned_integer() && fits_integer(dtype, i128::from(*u)),
        Value::Float(_) => dtype.is_float(),
        other => {
            return Err(ValidationError::constraint(
                ConstraintKind::Type,
                dtype,
                other.type_name(),
            ));
        }
    };
    if !fits {
        return Err(ValidationError::constraint(ConstraintKind::DType, dtype, value));
    }

    let Some(number) = value.as_f64() else {
        return Ok(());
    };
    if let Some(max) = schema.max_value() {
        if number > max {
            return Err(ValidationError::constraint(ConstraintKind::MaxValue, max, value));
        }
    }
    if let Some(min) = schema.min_value() {
        if number < min {
            return Err(ValidationError::constraint(ConstraintKind::MinValue, min, value));
        }
    }
    Ok(())
}

/// Check an array against its dtype, dimensions, shape, and element bounds
///
/// # Errors
///
/// Returns the first violated constraint in that order.
pub fn validate_array(schema: &ArraySchema, array: &NdArray) -> Result<()> {
    let dtype = schema.dtype();
    let dtype_ok = match array.data() {
        ArrayData::Int(v) => {
            dtype.is_signed_integer() && v.iter().all(|&i| fits_integer(dtype, i128::from(i)))
        }
        ArrayData::UInt(v) => {
            dtype.is_unsigned_integer() && v.iter().all(|&u| fits_integer(dtype, i128::from(u)))
        }
        ArrayData::Float(_) => dtype.is_float(),
    };
    if !dtype_ok {
        return Err(ValidationError::constraint(
            ConstraintKind::DType,
            dtype,
            data_kind(array.data()),
        ));
    }

    if array.ndim() != schema.ndim() {
        return Err(ValidationError::constraint(
            ConstraintKind::NDim,
            schema.ndim(),
            array.ndim(),
        ));
    }

    let shape = array.shape();
    if let Some(max) = schema.max_shape() {
        if shape.iter().zip(max).any(|(got, max)| got > max) {
            return Err(ValidationError::constraint(
                ConstraintKind::MaxShape,
                format!("{max:?}"),
                format!("{shape:?}"),
            ));
        }
    }
    if let Some(min) = schema.min_shape() {
        if shape.iter().zip(min).any(|(got, min)| got < min) {
            return Err(ValidationError::constraint(
                ConstraintKind::MinShape,
                format!("{min:?}"),
                format!("{shape:?}"),
            ));
        }
    }

    if let Some(max) = schema.max_value() {
        if let Some(got) = array.iter_f64().find(|&x| x > max) {
            return Err(ValidationError::constraint(
                ConstraintKind::MaxElementValue,
                max,
                got,
            ));
        }
    }
    if let Some(min) = schema.min_value() {
        if let Some(got) = array.iter_f64().find(|&x| x < min) {
            return Err(ValidationError::constraint(
                ConstraintKind::MinElementValue,
                min,
                got,
            ));
        }
    }
    Ok(())
}

/// # Errors
///
/// Fails when the byte count is outside the declared bounds.
pub fn validate_bytes(schema: &BytesSchema, bytes: &[u8]) -> Result<()> {
    check_length(
        bytes.len(),
        schema.min_length(),
        schema.max_length(),
        ConstraintKind::MinBytesLength,
        ConstraintKind::MaxBytesLength,
    )
}

/// Length constraints count characters, not bytes
///
/// # Errors
///
/// Fails when the length is outside the declared bounds or the pattern does
/// not match.
pub fn validate_string(schema: &StringSchema, value: &str) -> Result<()> {
    check_length(
        value.chars().count(),
        schema.min_length(),
        schema.max_length(),
        ConstraintKind::MinStringLength,
        ConstraintKind::MaxStringLength,
    )?;
    if let Some(pattern) = schema.pattern() {
        if !pattern.is_match(value) {
            return Err(ValidationError::constraint(
                ConstraintKind::Pattern,
                pattern.as_str(),
                format!("{value:?}"),
            ));
        }
    }
    Ok(())
}

/// Check the element count of a populated list
///
/// # Errors
///
/// Fails when the number of elements is outside the declared bounds.
pub fn validate_list_length(schema: &SchemaNode, len: usize) -> Result<()> {
    let Some(list) = schema.as_list() else {
        return Ok(());
    };
    check_length(
        len,
        list.min_length(),
        list.max_length(),
        ConstraintKind::MinListLength,
        ConstraintKind::MaxListLength,
    )
}

/// Check every populated dependent array of a compilation against its
/// independent variables
///
/// Dimensions whose independent field is empty are skipped. Returns the
/// offending field name alongside each failure.
pub fn validate_dependencies(compilation: &CompilationNode) -> Vec<(String, ValidationError)> {
    let mut failures = Vec::new();
    for (name, node) in compilation.fields() {
        let Some(deps) = node.schema().as_array().and_then(ArraySchema::depends_on) else {
            continue;
        };
        let Some(dependent) = node.value().ok().and_then(Value::as_array) else {
            continue;
        };

        for (dimension, independent) in deps.iter().enumerate() {
            let Some(independent) = independent else {
                continue;
            };
            let Some(got) = dependent.shape().get(dimension).copied() else {
                continue;
            };
            let Some(reference) = compilation
                .get(independent)
                .and_then(|n| n.value().ok())
                .and_then(Value::as_array)
            else {
                continue;
            };
            let expected = reference.len();
            if got != expected {
                failures.push((
                    name.to_string(),
                    ValidationError::Dependency {
                        dependent: name.to_string(),
                        independent: independent.clone(),
                        dimension,
                        expected,
                        got,
                    },
                ));
            }
        }
    }
    failures
}

fn check_length(
    len: usize,
    min: Option<usize>,
    max: Option<usize>,
    min_kind: ConstraintKind,
    max_kind: ConstraintKind,
) -> Result<()> {
    if let Some(max) = max {
        if len > max {
            return Err(ValidationError::constraint(max_kind, max, len));
        }
    }
    if let Some(min) = min {
        if len < min {
            return Err(ValidationError::constraint(min_kind, min, len));
        }
    }
    Ok(())
}

fn fits_integer(dtype: DType, value: i128) -> bool {
    dtype
        .integer_range()
        .is_some_and(|(lo, hi)| (lo..=hi).contains(&value))
}

fn data_kind(data: &ArrayData) -> &'static str {
    match data {
        ArrayData::Int(_) => "int64",
        ArrayData::UInt(_) => "uint64",
        ArrayData::Float(_) => "float64",
    }
}

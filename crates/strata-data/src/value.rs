//! Values held by item nodes and their coercion to declared element types
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].

use crate::{Error, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use strata_schema::{DType, SchemaNode, TemporalKind};

/// A single stored value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Value {
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Array(NdArray),
    Bytes(Vec<u8>),
    String(String),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

impl Value {
    /// Short name of the value variant, used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Array(_) => "array",
            Value::Bytes(_) => "bytes",
            Value::String(_) => "string",
            Value::Date(_) => "date",
            Value::Time(_) => "time",
            Value::DateTime(_) => "datetime",
        }
    }

    /// Whether every float in the value is finite
    ///
    /// Values without floats always are.
    pub fn is_finite(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            Value::Array(array) => match array.data() {
                ArrayData::Float(values) => values.iter().all(|f| f.is_finite()),
                ArrayData::Int(_) | ArrayData::UInt(_) => true,
            },
            _ => true,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::UInt(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    /// Numeric view of scalar values
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::UInt(u) => Some(*u as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NdArray> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::UInt(u) => write!(f, "{u}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Array(a) => write!(f, "array{:?}", a.shape()),
            Value::Bytes(b) => write!(f, "{} bytes", b.len()),
            Value::String(s) => write!(f, "{s:?}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Time(t) => write!(f, "{t}"),
            Value::DateTime(dt) => write!(f, "{dt}"),
        }
    }
}

/// Row-major element buffer of an [`NdArray`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "elements", content = "data", rename_all = "snake_case")]
pub enum ArrayData {
    Int(Vec<i64>),
    UInt(Vec<u64>),
    Float(Vec<f64>),
}

impl ArrayData {
    pub fn len(&self) -> usize {
        match self {
            ArrayData::Int(v) => v.len(),
            ArrayData::UInt(v) => v.len(),
            ArrayData::Float(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// N-dimensional numeric array
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawNdArray")]
pub struct NdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

#[derive(Deserialize)]
struct RawNdArray {
    shape: Vec<usize>,
    data: ArrayData,
}

impl TryFrom<RawNdArray> for NdArray {
    type Error = Error;

    fn try_from(raw: RawNdArray) -> Result<Self> {
        NdArray::new(raw.shape, raw.data)
    }
}

impl NdArray {
    /// Create an array from a shape and a row-major buffer
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidArray`] when the shape is empty or its product
    /// does not equal the number of elements.
    pub fn new(shape: Vec<usize>, data: ArrayData) -> Result<Self> {
        if shape.is_empty() {
            return Err(Error::invalid_array("shape must have at least one dimension"));
        }
        let expected = shape
            .iter()
            .try_fold(1usize, |product, &dim| product.checked_mul(dim))
            .ok_or_else(|| Error::invalid_array(format!("shape {shape:?} overflows")))?;
        if expected != data.len() {
            return Err(Error::invalid_array(format!(
                "shape {shape:?} needs {expected} elements, got {}",
                data.len()
            )));
        }
        Ok(Self { shape, data })
    }

    /// One-dimensional array over the given buffer
    pub fn from_vec(data: ArrayData) -> Self {
        Self {
            shape: vec![data.len()],
            data,
        }
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    pub fn ndim(&self) -> usize {
        self.shape.len()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn data(&self) -> &ArrayData {
        &self.data
    }

    /// Elements widened to `f64`, for bound comparisons
    #[allow(clippy::cast_precision_loss)]
    pub fn iter_f64(&self) -> Box<dyn Iterator<Item = f64> + '_> {
        match &self.data {
            ArrayData::Int(v) => Box::new(v.iter().map(|&i| i as f64)),
            ArrayData::UInt(v) => Box::new(v.iter().map(|&u| u as f64)),
            ArrayData::Float(v) => Box::new(v.iter().copied()),
        }
    }
}

impl From<Vec<f64>> for NdArray {
    fn from(values: Vec<f64>) -> Self {
        NdArray::from_vec(ArrayData::Float(values))
    }
}

impl From<Vec<i64>> for NdArray {
    fn from(values: Vec<i64>) -> Self {
        NdArray::from_vec(ArrayData::Int(values))
    }
}

impl From<Vec<u64>> for NdArray {
    fn from(values: Vec<u64>) -> Self {
        NdArray::from_vec(ArrayData::UInt(values))
    }
}

/// Convert a value to the representation an item schema declares
///
/// Numeric conversions only succeed when exact: integers must fit the
/// declared type, and floats convert to integer types only when integral
/// and in range. Integers always convert to floating point types. `Float32`
/// values are rounded through `f32`.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] when the value variant does not fit the
/// schema and [`Error::OutOfRange`] when a numeric value is not
/// representable in the declared type.
pub fn coerce(schema: &SchemaNode, value: Value) -> Result<Value> {
    match (schema, value) {
        (SchemaNode::Bool, value @ Value::Bool(_)) => Ok(value),
        (SchemaNode::Scalar(scalar), value) => coerce_scalar(scalar.dtype(), value),
        (SchemaNode::Array(array), Value::Array(nd)) => {
            let NdArray { shape, data } = nd;
            let data = coerce_data(array.dtype(), data)?;
            Ok(Value::Array(NdArray { shape, data }))
        }
        (SchemaNode::Bytes(_), value @ Value::Bytes(_)) => Ok(value),
        (SchemaNode::String(_), value @ Value::String(_)) => Ok(value),
        (SchemaNode::Temporal(temporal), value) => match (temporal.kind(), value) {
            (TemporalKind::Date, value @ Value::Date(_))
            | (TemporalKind::Time, value @ Value::Time(_))
            | (TemporalKind::DateTime, value @ Value::DateTime(_)) => Ok(value),
            (kind, value) => Err(Error::type_mismatch(
                temporal_name(kind),
                value.type_name(),
            )),
        },
        (schema, value) => Err(Error::type_mismatch(
            schema.kind().as_str(),
            value.type_name(),
        )),
    }
}

fn temporal_name(kind: TemporalKind) -> &'static str {
    match kind {
        TemporalKind::Date => "date",
        TemporalKind::Time => "time",
        TemporalKind::DateTime => "datetime",
    }
}

#[derive(Clone, Copy)]
enum Number {
    Int(i64),
    UInt(u64),
    Float(f64),
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::UInt(u) => write!(f, "{u}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

fn coerce_scalar(dtype: DType, value: Value) -> Result<Value> {
    let number = match value {
        Value::Int(i) => Number::Int(i),
        Value::UInt(u) => Number::UInt(u),
        Value::Float(f) => Number::Float(f),
        other => {
            return Err(Error::type_mismatch(dtype.as_str(), other.type_name()));
        }
    };
    if dtype.is_float() {
        to_float(dtype, number).map(Value::Float)
    } else if dtype.is_signed_integer() {
        to_integer(dtype, number).and_then(|i| narrow_signed(dtype, i)).map(Value::Int)
    } else {
        to_integer(dtype, number).and_then(|i| narrow_unsigned(dtype, i)).map(Value::UInt)
    }
}

fn coerce_data(dtype: DType, data: ArrayData) -> Result<ArrayData> {
    let numbers: Vec<Number> = match data {
        ArrayData::Int(v) if dtype == DType::Int64 => return Ok(ArrayData::Int(v)),
        ArrayData::UInt(v) if dtype == DType::UInt64 => return Ok(ArrayData::UInt(v)),
        ArrayData::Float(v) if dtype == DType::Float64 => return Ok(ArrayData::Float(v)),
        ArrayData::Int(v) => v.into_iter().map(Number::Int).collect(),
        ArrayData::UInt(v) => v.into_iter().map(Number::UInt).collect(),
        ArrayData::Float(v) => v.into_iter().map(Number::Float).collect(),
    };

    if dtype.is_float() {
        numbers
            .into_iter()
            .map(|n| to_float(dtype, n))
            .collect::<Result<_>>()
            .map(ArrayData::Float)
    } else if dtype.is_signed_integer() {
        numbers
            .into_iter()
            .map(|n| to_integer(dtype, n).and_then(|i| narrow_signed(dtype, i)))
            .collect::<Result<_>>()
            .map(ArrayData::Int)
    } else {
        numbers
            .into_iter()
            .map(|n| to_integer(dtype, n).and_then(|i| narrow_unsigned(dtype, i)))
            .collect::<Result<_>>()
            .map(ArrayData::UInt)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn to_float(dtype: DType, number: Number) -> Result<f64> {
    let value = match number {
        Number::Int(i) => i as f64,
        Number::UInt(u) => u as f64,
        Number::Float(f) => f,
    };
    if dtype == DType::Float32 {
        let narrowed = value as f32;
        if value.is_finite() && narrowed.is_infinite() {
            return Err(out_of_range(number, dtype));
        }
        return Ok(f64::from(narrowed));
    }
    Ok(value)
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn to_integer(dtype: DType, number: Number) -> Result<i128> {
    let Some((lo, hi)) = dtype.integer_range() else {
        return Err(out_of_range(number, dtype));
    };
    let value = match number {
        Number::Int(i) => i128::from(i),
        Number::UInt(u) => i128::from(u),
        Number::Float(f) => {
            // Upper bound is exclusive: `hi as f64` rounds up to a power of two
            // for the 64-bit types.
            let in_range = f >= lo as f64 && f < (hi as f64) + 1.0;
            if !f.is_finite() || f.fract() != 0.0 || !in_range {
                return Err(out_of_range(number, dtype));
            }
            f as i128
        }
    };
    if value < lo || value > hi {
        return Err(out_of_range(number, dtype));
    }
    Ok(value)
}

fn narrow_signed(dtype: DType, value: i128) -> Result<i64> {
    i64::try_from(value).map_err(|_| Error::OutOfRange {
        value: value.to_string(),
        dtype,
    })
}

fn narrow_unsigned(dtype: DType, value: i128) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::OutOfRange {
        value: value.to_string(),
        dtype,
    })
}

fn out_of_range(number: Number, dtype: DType) -> Error {
    Error::OutOfRange {
        value: number.to_string(),
        dtype,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(dtype: DType) -> SchemaNode {
        SchemaNode::scalar(dtype).build().unwrap()
    }

    #[test]
    fn test_integer_coercion_is_exact() {
        let int8 = scalar(DType::Int8);
        assert_eq!(coerce(&int8, Value::Int(-128)).unwrap(), Value::Int(-128));
        assert_eq!(coerce(&int8, Value::Float(12.0)).unwrap(), Value::Int(12));
        assert!(matches!(
            coerce(&int8, Value::Int(128)),
            Err(Error::OutOfRange { dtype: DType::Int8, .. })
        ));
        assert!(matches!(
            coerce(&int8, Value::Float(1.5)),
            Err(Error::OutOfRange { .. })
        ));
        assert!(coerce(&int8, Value::Float(f64::NAN)).is_err());
    }

    #[test]
    fn test_unsigned_rejects_negative() {
        let uint16 = scalar(DType::UInt16);
        assert_eq!(coerce(&uint16, Value::Int(65535)).unwrap(), Value::UInt(65535));
        assert!(coerce(&uint16, Value::Int(-1)).is_err());
        assert!(coerce(&uint16, Value::UInt(65536)).is_err());
    }

    #[test]
    fn test_int64_boundaries_from_float() {
        let int64 = scalar(DType::Int64);
        assert!(coerce(&int64, Value::Float(9.223_372_036_854_775_807e18)).is_err());
        assert_eq!(
            coerce(&int64, Value::Float(-9.223_372_036_854_775_808e18)).unwrap(),
            Value::Int(i64::MIN)
        );
        let uint64 = scalar(DType::UInt64);
        assert_eq!(coerce(&uint64, Value::UInt(u64::MAX)).unwrap(), Value::UInt(u64::MAX));
    }

    #[test]
    fn test_integers_convert_to_float() {
        let float64 = scalar(DType::Float64);
        assert_eq!(coerce(&float64, Value::Int(3)).unwrap(), Value::Float(3.0));

        let float32 = scalar(DType::Float32);
        let rounded = coerce(&float32, Value::Float(0.1)).unwrap();
        assert_eq!(rounded, Value::Float(f64::from(0.1_f32)));
        assert!(coerce(&float32, Value::Float(1e300)).is_err());
    }

    #[test]
    fn test_type_mismatch() {
        assert!(matches!(
            coerce(&SchemaNode::Bool, Value::Int(1)),
            Err(Error::TypeMismatch { .. })
        ));
        assert!(coerce(&scalar(DType::Int32), Value::String("1".into())).is_err());
        let date = SchemaNode::date().build().unwrap();
        let time = NaiveTime::from_hms_opt(12, 0, 0).unwrap();
        assert!(coerce(&date, Value::Time(time)).is_err());
        let compilation = SchemaNode::compilation().build().unwrap();
        assert!(coerce(&compilation, Value::Bool(true)).is_err());
    }

    #[test]
    fn test_array_coercion() {
        let schema = SchemaNode::array(DType::Int32).build().unwrap();
        let value = Value::Array(NdArray::from(vec![1.0, 2.0, 3.0]));
        let coerced = coerce(&schema, value).unwrap();
        assert_eq!(
            coerced.as_array().unwrap().data(),
            &ArrayData::Int(vec![1, 2, 3])
        );

        let lossy = Value::Array(NdArray::from(vec![1.0, 2.5]));
        assert!(coerce(&schema, lossy).is_err());

        let floats = SchemaNode::array(DType::Float64).build().unwrap();
        let coerced = coerce(&floats, Value::Array(NdArray::from(vec![1_i64, 2]))).unwrap();
        assert_eq!(coerced.as_array().unwrap().data(), &ArrayData::Float(vec![1.0, 2.0]));
    }

    #[test]
    fn test_ndarray_shape_checked() {
        assert!(NdArray::new(vec![2, 3], ArrayData::Int(vec![0; 6])).is_ok());
        assert!(NdArray::new(vec![2, 3], ArrayData::Int(vec![0; 5])).is_err());
        assert!(NdArray::new(vec![], ArrayData::Int(vec![])).is_err());
    }

    #[test]
    fn test_overflowing_shape_is_rejected() {
        let half = 1usize << (usize::BITS - 1);
        let err = NdArray::new(vec![half, 2], ArrayData::Float(vec![])).unwrap_err();
        assert!(matches!(err, Error::InvalidArray { .. }), "{err}");

        let json = format!(
            r#"{{"kind":"array","value":{{"shape":[{half},2],"data":{{"elements":"float","data":[]}}}}}}"#
        );
        assert!(serde_json::from_str::<Value>(&json).is_err());
    }

    #[test]
    fn test_value_serde_tagging() {
        let json = serde_json::to_string(&Value::Int(5)).unwrap();
        assert_eq!(json, r#"{"kind":"int","value":5}"#);

        let bad = r#"{"kind":"array","value":{"shape":[2],"data":{"elements":"int","data":[1]}}}"#;
        assert!(serde_json::from_str::<Value>(bad).is_err());
    }
}

//! Schema model definitions
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].
#![allow(clippy::return_self_not_must_use)] // Builder methods are designed for chaining.

use crate::hash::SchemaHash;
use crate::{Error, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Numeric element type of scalar and array nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DType {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
}

impl DType {
    /// Canonical lowercase name (e.g. `"int32"`)
    pub fn as_str(self) -> &'static str {
        match self {
            DType::Int8 => "int8",
            DType::Int16 => "int16",
            DType::Int32 => "int32",
            DType::Int64 => "int64",
            DType::UInt8 => "uint8",
            DType::UInt16 => "uint16",
            DType::UInt32 => "uint32",
            DType::UInt64 => "uint64",
            DType::Float32 => "float32",
            DType::Float64 => "float64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, DType::Float32 | DType::Float64)
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(
            self,
            DType::Int8 | DType::Int16 | DType::Int32 | DType::Int64
        )
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(
            self,
            DType::UInt8 | DType::UInt16 | DType::UInt32 | DType::UInt64
        )
    }

    /// Inclusive value range of integer types, `None` for floats
    pub fn integer_range(self) -> Option<(i128, i128)> {
        let range = match self {
            DType::Int8 => (i128::from(i8::MIN), i128::from(i8::MAX)),
            DType::Int16 => (i128::from(i16::MIN), i128::from(i16::MAX)),
            DType::Int32 => (i128::from(i32::MIN), i128::from(i32::MAX)),
            DType::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
            DType::UInt8 => (0, i128::from(u8::MAX)),
            DType::UInt16 => (0, i128::from(u16::MAX)),
            DType::UInt32 => (0, i128::from(u32::MAX)),
            DType::UInt64 => (0, i128::from(u64::MAX)),
            DType::Float32 | DType::Float64 => return None,
        };
        Some(range)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let dtype = match s {
            "int8" => DType::Int8,
            "int16" => DType::Int16,
            "int32" => DType::Int32,
            "int64" | "int" => DType::Int64,
            "uint8" => DType::UInt8,
            "uint16" => DType::UInt16,
            "uint32" => DType::UInt32,
            "uint64" => DType::UInt64,
            "float32" => DType::Float32,
            "float64" | "float" => DType::Float64,
            other => {
                return Err(Error::InvalidFormat(format!("unknown dtype '{other}'")));
            }
        };
        Ok(dtype)
    }
}

/// Variant tag of a schema node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Bool,
    Scalar,
    Array,
    Bytes,
    String,
    Date,
    Time,
    DateTime,
    Compilation,
    List,
}

impl NodeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Bool => "Bool",
            NodeKind::Scalar => "Scalar",
            NodeKind::Array => "Array",
            NodeKind::Bytes => "Bytes",
            NodeKind::String => "String",
            NodeKind::Date => "Date",
            NodeKind::Time => "Time",
            NodeKind::DateTime => "DateTime",
            NodeKind::Compilation => "Compilation",
            NodeKind::List => "List",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which instant-in-time value a temporal node holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalKind {
    Date,
    Time,
    DateTime,
}

/// A node in the schema tree
///
/// Schema nodes are immutable once built; every constructor checks its
/// constraints for internal consistency. Equality is structural and defined
/// through the canonical hash, never through object identity.
#[derive(Debug, Clone)]
pub enum SchemaNode {
    Bool,
    Scalar(ScalarSchema),
    Array(ArraySchema),
    Bytes(BytesSchema),
    String(StringSchema),
    Temporal(TemporalSchema),
    Compilation(CompilationSchema),
    List(ListSchema),
}

impl SchemaNode {
    /// Start building a scalar node
    pub fn scalar(dtype: DType) -> ScalarBuilder {
        ScalarBuilder {
            dtype,
            unit: String::new(),
            min_value: None,
            max_value: None,
        }
    }

    /// Start building an array node
    pub fn array(dtype: DType) -> ArrayBuilder {
        ArrayBuilder {
            dtype,
            unit: String::new(),
            ndim: None,
            min_shape: None,
            max_shape: None,
            min_value: None,
            max_value: None,
            depends_on: None,
        }
    }

    /// Start building a bytes node
    pub fn bytes() -> BytesBuilder {
        BytesBuilder {
            min_length: None,
            max_length: None,
        }
    }

    /// Start building a string node
    pub fn string() -> StringBuilder {
        StringBuilder {
            min_length: None,
            max_length: None,
            pattern: None,
        }
    }

    pub fn date() -> TemporalBuilder {
        TemporalBuilder::new(TemporalKind::Date)
    }

    pub fn time() -> TemporalBuilder {
        TemporalBuilder::new(TemporalKind::Time)
    }

    pub fn datetime() -> TemporalBuilder {
        TemporalBuilder::new(TemporalKind::DateTime)
    }

    /// Start building a compilation (named group of fields)
    pub fn compilation() -> CompilationBuilder {
        CompilationBuilder {
            fields: Vec::new(),
            optionals: Vec::new(),
        }
    }

    /// Start building a list with the given element template
    pub fn list(element: impl Into<Arc<SchemaNode>>) -> ListBuilder {
        ListBuilder {
            element: element.into(),
            min_length: None,
            max_length: None,
        }
    }

    /// Variant tag of this node
    pub fn kind(&self) -> NodeKind {
        match self {
            SchemaNode::Bool => NodeKind::Bool,
            SchemaNode::Scalar(_) => NodeKind::Scalar,
            SchemaNode::Array(_) => NodeKind::Array,
            SchemaNode::Bytes(_) => NodeKind::Bytes,
            SchemaNode::String(_) => NodeKind::String,
            SchemaNode::Temporal(t) => match t.kind {
                TemporalKind::Date => NodeKind::Date,
                TemporalKind::Time => NodeKind::Time,
                TemporalKind::DateTime => NodeKind::DateTime,
            },
            SchemaNode::Compilation(_) => NodeKind::Compilation,
            SchemaNode::List(_) => NodeKind::List,
        }
    }

    /// Whether this node holds a single value (i.e. is not a group)
    pub fn is_item(&self) -> bool {
        !matches!(self, SchemaNode::Compilation(_) | SchemaNode::List(_))
    }

    /// Canonical structural hash of this node and all its descendants
    pub fn hash(&self) -> SchemaHash {
        crate::hash::hash_node(self)
    }

    /// Insertion-ordered JSON representation, as persisted by backends
    pub fn to_json(&self) -> String {
        crate::loader::to_json(self)
    }

    /// Rebuild a schema from its JSON representation, re-running all
    /// construction checks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] for malformed documents and
    /// [`Error::Construction`] for inconsistent constraints.
    pub fn from_json(json: &str) -> Result<Self> {
        crate::loader::from_json(json)
    }

    pub fn as_compilation(&self) -> Option<&CompilationSchema> {
        match self {
            SchemaNode::Compilation(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListSchema> {
        match self {
            SchemaNode::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArraySchema> {
        match self {
            SchemaNode::Array(a) => Some(a),
            _ => None,
        }
    }
}

impl PartialEq for SchemaNode {
    fn eq(&self, other: &Self) -> bool {
        self.hash() == other.hash()
    }
}

impl Eq for SchemaNode {}

/// Constraints of a scalar numeric value
#[derive(Debug, Clone)]
pub struct ScalarSchema {
    dtype: DType,
    unit: String,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl ScalarSchema {
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }
}

/// Builder for [`ScalarSchema`]
#[derive(Debug, Clone)]
pub struct ScalarBuilder {
    dtype: DType,
    unit: String,
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl ScalarBuilder {
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    /// Check the constraints and build the node
    ///
    /// # Errors
    ///
    /// Fails when the bounds are not finite numbers or `min_value > max_value`.
    pub fn build(self) -> Result<SchemaNode> {
        check_value_bounds(NodeKind::Scalar, self.min_value, self.max_value)?;
        Ok(SchemaNode::Scalar(ScalarSchema {
            dtype: self.dtype,
            unit: self.unit,
            min_value: self.min_value,
            max_value: self.max_value,
        }))
    }
}

/// Constraints of an n-dimensional numeric array
#[derive(Debug, Clone)]
pub struct ArraySchema {
    dtype: DType,
    unit: String,
    ndim: usize,
    min_shape: Option<Vec<usize>>,
    max_shape: Option<Vec<usize>>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    depends_on: Option<Vec<Option<String>>>,
}

impl ArraySchema {
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn ndim(&self) -> usize {
        self.ndim
    }

    pub fn min_shape(&self) -> Option<&[usize]> {
        self.min_shape.as_deref()
    }

    pub fn max_shape(&self) -> Option<&[usize]> {
        self.max_shape.as_deref()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    /// Independent-variable sibling per dimension (`None` entries are free)
    pub fn depends_on(&self) -> Option<&[Option<String>]> {
        self.depends_on.as_deref()
    }
}

/// Builder for [`ArraySchema`]
#[derive(Debug, Clone)]
pub struct ArrayBuilder {
    dtype: DType,
    unit: String,
    ndim: Option<usize>,
    min_shape: Option<Vec<usize>>,
    max_shape: Option<Vec<usize>>,
    min_value: Option<f64>,
    max_value: Option<f64>,
    depends_on: Option<Vec<Option<String>>>,
}

impl ArrayBuilder {
    pub fn unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn ndim(mut self, ndim: usize) -> Self {
        self.ndim = Some(ndim);
        self
    }

    pub fn min_shape(mut self, shape: impl Into<Vec<usize>>) -> Self {
        self.min_shape = Some(shape.into());
        self
    }

    pub fn max_shape(mut self, shape: impl Into<Vec<usize>>) -> Self {
        self.max_shape = Some(shape.into());
        self
    }

    pub fn min_value(mut self, min: f64) -> Self {
        self.min_value = Some(min);
        self
    }

    pub fn max_value(mut self, max: f64) -> Self {
        self.max_value = Some(max);
        self
    }

    /// Every dimension depends on the named sibling field, in order
    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = Some(names.into_iter().map(|n| Some(n.into())).collect());
        self
    }

    /// Per-dimension dependencies, where `None` leaves a dimension free
    pub fn depends_on_dims(mut self, dims: Vec<Option<String>>) -> Self {
        self.depends_on = Some(dims);
        self
    }

    /// Check the constraints and build the node
    ///
    /// # Errors
    ///
    /// Fails when shape constraints disagree with each other or with `ndim`,
    /// when `depends_on` does not have one entry per dimension, or when the
    /// value bounds are inconsistent.
    pub fn build(self) -> Result<SchemaNode> {
        let kind = NodeKind::Array;
        check_value_bounds(kind, self.min_value, self.max_value)?;

        if let (Some(min), Some(max)) = (&self.min_shape, &self.max_shape) {
            if min.len() != max.len() {
                return Err(Error::construction(
                    kind,
                    "shape constraints must have the same length",
                ));
            }
            if let Some(dim) = min.iter().zip(max).position(|(lo, hi)| lo > hi) {
                return Err(Error::construction(
                    kind,
                    format!(
                        "min_shape {:?} exceeds max_shape {:?} in dimension {dim}",
                        min, max
                    ),
                ));
            }
        }

        let shape_ndim = self
            .min_shape
            .as_ref()
            .or(self.max_shape.as_ref())
            .map(Vec::len);
        let ndim = match (self.ndim, shape_ndim) {
            (Some(explicit), Some(inferred)) if explicit != inferred => {
                return Err(Error::construction(
                    kind,
                    format!("ndim {explicit} does not match shape constraints of length {inferred}"),
                ));
            }
            (Some(explicit), _) => explicit,
            (None, Some(inferred)) => inferred,
            (None, None) => 1,
        };
        if ndim == 0 {
            return Err(Error::construction(kind, "arrays need at least one dimension"));
        }

        if let Some(deps) = &self.depends_on {
            if deps.len() != ndim {
                return Err(Error::construction(
                    kind,
                    "number of independent variables must be equal to the number of array dimensions",
                ));
            }
        }

        Ok(SchemaNode::Array(ArraySchema {
            dtype: self.dtype,
            unit: self.unit,
            ndim,
            min_shape: self.min_shape,
            max_shape: self.max_shape,
            min_value: self.min_value,
            max_value: self.max_value,
            depends_on: self.depends_on,
        }))
    }
}

/// Constraints of a byte sequence
#[derive(Debug, Clone)]
pub struct BytesSchema {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl BytesSchema {
    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }
}

/// Builder for [`BytesSchema`]
#[derive(Debug, Clone)]
pub struct BytesBuilder {
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl BytesBuilder {
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// # Errors
    ///
    /// Fails when `min_length > max_length`.
    pub fn build(self) -> Result<SchemaNode> {
        check_length_bounds(NodeKind::Bytes, self.min_length, self.max_length)?;
        Ok(SchemaNode::Bytes(BytesSchema {
            min_length: self.min_length,
            max_length: self.max_length,
        }))
    }
}

/// Constraints of a text value
#[derive(Debug, Clone)]
pub struct StringSchema {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<Regex>,
}

impl StringSchema {
    /// Minimum length in characters
    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    /// Maximum length in characters
    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }

    pub fn pattern(&self) -> Option<&Regex> {
        self.pattern.as_ref()
    }
}

/// Builder for [`StringSchema`]
#[derive(Debug, Clone)]
pub struct StringBuilder {
    min_length: Option<usize>,
    max_length: Option<usize>,
    pattern: Option<String>,
}

impl StringBuilder {
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// Values must match this regular expression
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// # Errors
    ///
    /// Fails when `min_length > max_length` or the pattern does not compile.
    pub fn build(self) -> Result<SchemaNode> {
        check_length_bounds(NodeKind::String, self.min_length, self.max_length)?;
        let pattern = self
            .pattern
            .map(|p| {
                Regex::new(&p).map_err(|e| {
                    Error::construction(NodeKind::String, format!("invalid pattern '{p}': {e}"))
                })
            })
            .transpose()?;
        Ok(SchemaNode::String(StringSchema {
            min_length: self.min_length,
            max_length: self.max_length,
            pattern,
        }))
    }
}

/// Date, time, or date-time value
#[derive(Debug, Clone)]
pub struct TemporalSchema {
    kind: TemporalKind,
    set_on_create: bool,
}

impl TemporalSchema {
    pub fn kind(&self) -> TemporalKind {
        self.kind
    }

    /// New data nodes are populated with the current local time
    pub fn set_on_create(&self) -> bool {
        self.set_on_create
    }
}

/// Builder for [`TemporalSchema`]
#[derive(Debug, Clone)]
pub struct TemporalBuilder {
    kind: TemporalKind,
    set_on_create: bool,
}

impl TemporalBuilder {
    fn new(kind: TemporalKind) -> Self {
        Self {
            kind,
            set_on_create: false,
        }
    }

    pub fn set_on_create(mut self) -> Self {
        self.set_on_create = true;
        self
    }

    /// # Errors
    ///
    /// Temporal nodes carry no conflicting constraints; this never fails but
    /// keeps the builder API uniform.
    pub fn build(self) -> Result<SchemaNode> {
        Ok(SchemaNode::Temporal(TemporalSchema {
            kind: self.kind,
            set_on_create: self.set_on_create,
        }))
    }
}

/// Named group of heterogeneous fields
#[derive(Debug, Clone)]
pub struct CompilationSchema {
    fields: Vec<(String, Arc<SchemaNode>)>,
    optionals: Vec<String>,
}

impl CompilationSchema {
    /// Fields in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Arc<SchemaNode>)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn field(&self, name: &str) -> Option<&Arc<SchemaNode>> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, node)| node)
    }

    pub fn optionals(&self) -> &[String] {
        &self.optionals
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.optionals.iter().any(|o| o == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Builder for [`CompilationSchema`]
#[derive(Debug, Clone)]
pub struct CompilationBuilder {
    fields: Vec<(String, Arc<SchemaNode>)>,
    optionals: Vec<String>,
}

impl CompilationBuilder {
    pub fn field(mut self, name: impl Into<String>, node: impl Into<Arc<SchemaNode>>) -> Self {
        self.fields.push((name.into(), node.into()));
        self
    }

    /// Exclude a field from completeness evaluation
    pub fn optional(mut self, name: impl Into<String>) -> Self {
        self.optionals.push(name.into());
        self
    }

    /// Check the field set and build the node
    ///
    /// # Errors
    ///
    /// Fails on empty, duplicate, or path-reserved field names, on optional
    /// names that are not declared fields, and on array dependencies that do
    /// not name a one-dimensional sibling array.
    pub fn build(mut self) -> Result<SchemaNode> {
        let kind = NodeKind::Compilation;
        let mut seen = HashSet::new();
        for (name, _) in &self.fields {
            if name.is_empty() || name.contains(['.', '[', ']', '/', '\\']) {
                return Err(Error::construction(
                    kind,
                    format!("invalid field name '{name}'"),
                ));
            }
            if !seen.insert(name.as_str()) {
                return Err(Error::construction(
                    kind,
                    format!("duplicate field name '{name}'"),
                ));
            }
        }

        for optional in &self.optionals {
            if !seen.contains(optional.as_str()) {
                return Err(Error::construction(
                    kind,
                    format!("optional field '{optional}' is not declared"),
                ));
            }
        }
        self.optionals.sort();
        self.optionals.dedup();

        for (name, node) in &self.fields {
            let Some(deps) = node.as_array().and_then(ArraySchema::depends_on) else {
                continue;
            };
            for independent in deps.iter().flatten() {
                if independent == name {
                    return Err(Error::construction(
                        kind,
                        format!("field '{name}' cannot depend on itself"),
                    ));
                }
                let sibling = self
                    .fields
                    .iter()
                    .find(|(field, _)| field == independent)
                    .map(|(_, node)| node)
                    .ok_or_else(|| {
                        Error::construction(
                            kind,
                            format!("field '{name}' depends on undeclared field '{independent}'"),
                        )
                    })?;
                match sibling.as_array() {
                    Some(array) if array.ndim() == 1 => {}
                    _ => {
                        return Err(Error::construction(
                            kind,
                            format!(
                                "independent variable '{independent}' of '{name}' must be a one-dimensional array"
                            ),
                        ));
                    }
                }
            }
        }

        Ok(SchemaNode::Compilation(CompilationSchema {
            fields: self.fields,
            optionals: self.optionals,
        }))
    }
}

/// Homogeneous, variable-length sequence of elements
#[derive(Debug, Clone)]
pub struct ListSchema {
    element: Arc<SchemaNode>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl ListSchema {
    /// Template shared by every element
    pub fn element(&self) -> &Arc<SchemaNode> {
        &self.element
    }

    pub fn min_length(&self) -> Option<usize> {
        self.min_length
    }

    pub fn max_length(&self) -> Option<usize> {
        self.max_length
    }
}

/// Builder for [`ListSchema`]
#[derive(Debug, Clone)]
pub struct ListBuilder {
    element: Arc<SchemaNode>,
    min_length: Option<usize>,
    max_length: Option<usize>,
}

impl ListBuilder {
    pub fn min_length(mut self, len: usize) -> Self {
        self.min_length = Some(len);
        self
    }

    pub fn max_length(mut self, len: usize) -> Self {
        self.max_length = Some(len);
        self
    }

    /// # Errors
    ///
    /// Fails when `min_length > max_length`.
    pub fn build(self) -> Result<SchemaNode> {
        check_length_bounds(NodeKind::List, self.min_length, self.max_length)?;
        Ok(SchemaNode::List(ListSchema {
            element: self.element,
            min_length: self.min_length,
            max_length: self.max_length,
        }))
    }
}

fn check_value_bounds(kind: NodeKind, min: Option<f64>, max: Option<f64>) -> Result<()> {
    if !min.is_none_or(f64::is_finite) || !max.is_none_or(f64::is_finite) {
        return Err(Error::construction(kind, "value bounds must be finite numbers"));
    }
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(Error::construction(
                kind,
                format!("min_value {min} exceeds max_value {max}"),
            ));
        }
    }
    Ok(())
}

fn check_length_bounds(kind: NodeKind, min: Option<usize>, max: Option<usize>) -> Result<()> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(Error::construction(
                kind,
                format!("min_length {min} exceeds max_length {max}"),
            ));
        }
    }
    Ok(())
}

//! Schema loader for JSON and YAML schema documents

use crate::model::{DType, SchemaNode, TemporalKind};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

/// Serializable schema format, shared by persisted storages and schema files
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "node_type", content = "config")]
pub(crate) enum NodeFile {
    Bool {},
    Scalar {
        dtype: DType,
        #[serde(default)]
        unit: String,
        #[serde(default)]
        min_value: Option<f64>,
        #[serde(default)]
        max_value: Option<f64>,
    },
    Array {
        dtype: DType,
        #[serde(default)]
        unit: String,
        #[serde(default)]
        ndim: Option<usize>,
        #[serde(default)]
        min_shape: Option<Vec<usize>>,
        #[serde(default)]
        max_shape: Option<Vec<usize>>,
        #[serde(default)]
        min_value: Option<f64>,
        #[serde(default)]
        max_value: Option<f64>,
        #[serde(default)]
        depends_on: Option<Vec<Option<String>>>,
    },
    Bytes {
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
    },
    String {
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
        #[serde(default)]
        pattern: Option<String>,
    },
    Date {
        #[serde(default)]
        set_on_create: bool,
    },
    Time {
        #[serde(default)]
        set_on_create: bool,
    },
    DateTime {
        #[serde(default)]
        set_on_create: bool,
    },
    Compilation {
        subnodes: Vec<FieldFile>,
        #[serde(default)]
        optionals: Vec<String>,
    },
    List {
        subnode: Box<NodeFile>,
        #[serde(default)]
        min_length: Option<usize>,
        #[serde(default)]
        max_length: Option<usize>,
    },
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct FieldFile {
    name: String,
    node: NodeFile,
}

/// How compilation fields are ordered when converting to a [`NodeFile`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldOrder {
    /// Declaration order, used for persisted schemas
    Declared,
    /// Byte-wise sorted by field name, used for the canonical hash
    Sorted,
}

impl NodeFile {
    pub(crate) fn from_node(node: &SchemaNode, order: FieldOrder) -> Self {
        match node {
            SchemaNode::Bool => NodeFile::Bool {},
            SchemaNode::Scalar(s) => NodeFile::Scalar {
                dtype: s.dtype(),
                unit: s.unit().to_string(),
                min_value: s.min_value(),
                max_value: s.max_value(),
            },
            SchemaNode::Array(a) => NodeFile::Array {
                dtype: a.dtype(),
                unit: a.unit().to_string(),
                ndim: Some(a.ndim()),
                min_shape: a.min_shape().map(<[usize]>::to_vec),
                max_shape: a.max_shape().map(<[usize]>::to_vec),
                min_value: a.min_value(),
                max_value: a.max_value(),
                depends_on: a.depends_on().map(<[Option<String>]>::to_vec),
            },
            SchemaNode::Bytes(b) => NodeFile::Bytes {
                min_length: b.min_length(),
                max_length: b.max_length(),
            },
            SchemaNode::String(s) => NodeFile::String {
                min_length: s.min_length(),
                max_length: s.max_length(),
                pattern: s.pattern().map(|p| p.as_str().to_string()),
            },
            SchemaNode::Temporal(t) => {
                let set_on_create = t.set_on_create();
                match t.kind() {
                    TemporalKind::Date => NodeFile::Date { set_on_create },
                    TemporalKind::Time => NodeFile::Time { set_on_create },
                    TemporalKind::DateTime => NodeFile::DateTime { set_on_create },
                }
            }
            SchemaNode::Compilation(c) => {
                let mut subnodes: Vec<FieldFile> = c
                    .fields()
                    .map(|(name, child)| FieldFile {
                        name: name.to_string(),
                        node: NodeFile::from_node(child, order),
                    })
                    .collect();
                let mut optionals = c.optionals().to_vec();
                if order == FieldOrder::Sorted {
                    subnodes.sort_by(|a, b| a.name.cmp(&b.name));
                    optionals.sort();
                }
                NodeFile::Compilation {
                    subnodes,
                    optionals,
                }
            }
            SchemaNode::List(l) => NodeFile::List {
                subnode: Box::new(NodeFile::from_node(l.element(), order)),
                min_length: l.min_length(),
                max_length: l.max_length(),
            },
        }
    }

    /// Convert into a schema node through the regular builders
    pub(crate) fn into_node(self) -> Result<SchemaNode> {
        match self {
            NodeFile::Bool {} => Ok(SchemaNode::Bool),
            NodeFile::Scalar {
                dtype,
                unit,
                min_value,
                max_value,
            } => {
                let mut builder = SchemaNode::scalar(dtype).unit(unit);
                if let Some(min) = min_value {
                    builder = builder.min_value(min);
                }
                if let Some(max) = max_value {
                    builder = builder.max_value(max);
                }
                builder.build()
            }
            NodeFile::Array {
                dtype,
                unit,
                ndim,
                min_shape,
                max_shape,
                min_value,
                max_value,
                depends_on,
            } => {
                let mut builder = SchemaNode::array(dtype).unit(unit);
                if let Some(ndim) = ndim {
                    builder = builder.ndim(ndim);
                }
                if let Some(shape) = min_shape {
                    builder = builder.min_shape(shape);
                }
                if let Some(shape) = max_shape {
                    builder = builder.max_shape(shape);
                }
                if let Some(min) = min_value {
                    builder = builder.min_value(min);
                }
                if let Some(max) = max_value {
                    builder = builder.max_value(max);
                }
                if let Some(deps) = depends_on {
                    builder = builder.depends_on_dims(deps);
                }
                builder.build()
            }
            NodeFile::Bytes {
                min_length,
                max_length,
            } => {
                let mut builder = SchemaNode::bytes();
                if let Some(min) = min_length {
                    builder = builder.min_length(min);
                }
                if let Some(max) = max_length {
                    builder = builder.max_length(max);
                }
                builder.build()
            }
            NodeFile::String {
                min_length,
                max_length,
                pattern,
            } => {
                let mut builder = SchemaNode::string();
                if let Some(min) = min_length {
                    builder = builder.min_length(min);
                }
                if let Some(max) = max_length {
                    builder = builder.max_length(max);
                }
                if let Some(pattern) = pattern {
                    builder = builder.pattern(pattern);
                }
                builder.build()
            }
            NodeFile::Date { set_on_create } => temporal(SchemaNode::date(), set_on_create),
            NodeFile::Time { set_on_create } => temporal(SchemaNode::time(), set_on_create),
            NodeFile::DateTime { set_on_create } => {
                temporal(SchemaNode::datetime(), set_on_create)
            }
            NodeFile::Compilation {
                subnodes,
                optionals,
            } => {
                let mut builder = SchemaNode::compilation();
                for field in subnodes {
                    trace!(field = %field.name, "Loading compilation field");
                    builder = builder.field(field.name, field.node.into_node()?);
                }
                for optional in optionals {
                    builder = builder.optional(optional);
                }
                builder.build()
            }
            NodeFile::List {
                subnode,
                min_length,
                max_length,
            } => {
                let mut builder = SchemaNode::list(Arc::new(subnode.into_node()?));
                if let Some(min) = min_length {
                    builder = builder.min_length(min);
                }
                if let Some(max) = max_length {
                    builder = builder.max_length(max);
                }
                builder.build()
            }
        }
    }
}

fn temporal(builder: crate::model::TemporalBuilder, set_on_create: bool) -> Result<SchemaNode> {
    if set_on_create {
        builder.set_on_create().build()
    } else {
        builder.build()
    }
}

pub(crate) fn to_json(node: &SchemaNode) -> String {
    serde_json::to_string(&NodeFile::from_node(node, FieldOrder::Declared))
        .expect("schema documents have string keys and finite bounds")
}

pub(crate) fn from_json(json: &str) -> Result<SchemaNode> {
    let file: NodeFile = serde_json::from_str(json)
        .map_err(|e| Error::InvalidFormat(format!("JSON parse error: {e}")))?;
    file.into_node()
}

/// Loads schema definitions from files and strings
///
/// Documents use the same `node_type`/`config` layout that storages persist,
/// so a schema exported with [`SchemaNode::to_json`] can be loaded back as a
/// schema file.
#[derive(Debug, Clone, Default)]
pub struct SchemaLoader;

impl SchemaLoader {
    pub fn new() -> Self {
        Self
    }

    /// Load a schema from a file; `.yaml`/`.yml` files are parsed as YAML,
    /// everything else as JSON
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be read and a format or
    /// construction error if the document is not a valid schema.
    pub fn load_from_file(&self, path: &Path) -> Result<SchemaNode> {
        trace!("Loading schema from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;

        let node = if path
            .extension()
            .is_some_and(|e| e == "yaml" || e == "yml")
        {
            self.load_from_yaml(&content)?
        } else {
            self.load_from_json(&content)?
        };
        debug!(path = %path.display(), hash = %node.hash(), "Loaded schema");
        Ok(node)
    }

    /// Load a schema from a JSON string
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] or a construction error.
    pub fn load_from_json(&self, json: &str) -> Result<SchemaNode> {
        from_json(json)
    }

    /// Load a schema from a YAML string
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidFormat`] or a construction error.
    pub fn load_from_yaml(&self, yaml: &str) -> Result<SchemaNode> {
        let file: NodeFile = serde_yaml::from_str(yaml)
            .map_err(|e| Error::InvalidFormat(format!("YAML parse error: {e}")))?;
        file.into_node()
    }
}

//! Data nodes bound to schema nodes
#![allow(clippy::must_use_candidate)] // Accessors are clear at call sites without #[must_use].

use crate::input::Input;
use crate::path::{FieldPath, PathSegment};
use crate::value::{Value, coerce};
use crate::{Error, Result};
use chrono::Local;
use std::sync::Arc;
use strata_schema::{NodeKind, SchemaHash, SchemaNode, TemporalKind};

/// A node in the data tree
///
/// Every data node is bound to exactly one schema node, and the shape of a
/// data tree always follows its schema: compilations carry one child per
/// declared field and list elements share the list's element template.
#[derive(Debug, Clone)]
pub enum DataNode {
    Item(ItemNode),
    Compilation(CompilationNode),
    List(ListNode),
}

/// Leaf holding at most one value
#[derive(Debug, Clone)]
pub struct ItemNode {
    schema: Arc<SchemaNode>,
    value: Option<Value>,
}

/// Named group of child nodes, in declaration order
#[derive(Debug, Clone)]
pub struct CompilationNode {
    schema: Arc<SchemaNode>,
    fields: Vec<(String, DataNode)>,
}

/// Variable-length sequence of child nodes
#[derive(Debug, Clone)]
pub struct ListNode {
    schema: Arc<SchemaNode>,
    items: Vec<DataNode>,
}

impl ItemNode {
    pub fn schema(&self) -> &Arc<SchemaNode> {
        &self.schema
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }
}

impl CompilationNode {
    pub fn schema(&self) -> &Arc<SchemaNode> {
        &self.schema
    }

    /// Children in declaration order
    pub fn fields(&self) -> impl Iterator<Item = (&str, &DataNode)> {
        self.fields.iter().map(|(name, node)| (name.as_str(), node))
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = (&str, &mut DataNode)> {
        self.fields
            .iter_mut()
            .map(|(name, node)| (name.as_str(), node))
    }

    pub fn get(&self, name: &str) -> Option<&DataNode> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, node)| node)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut DataNode> {
        self.fields
            .iter_mut()
            .find(|(field, _)| field == name)
            .map(|(_, node)| node)
    }

    pub fn is_optional(&self, name: &str) -> bool {
        self.schema
            .as_compilation()
            .is_some_and(|c| c.is_optional(name))
    }
}

impl ListNode {
    pub fn schema(&self) -> &Arc<SchemaNode> {
        &self.schema
    }

    pub fn items(&self) -> &[DataNode] {
        &self.items
    }

    pub fn items_mut(&mut self) -> impl Iterator<Item = &mut DataNode> {
        self.items.iter_mut()
    }

    fn new_element(&self) -> Result<DataNode> {
        let element = self.schema.as_list().ok_or(Error::Unsupported {
            operation: "append",
            kind: self.schema.kind(),
        })?;
        Ok(DataNode::from_schema(Arc::clone(element.element())))
    }
}

impl DataNode {
    /// Instantiate an empty data tree for a schema
    ///
    /// Temporal nodes declared with `set_on_create` are populated with the
    /// current local time.
    pub fn from_schema(schema: impl Into<Arc<SchemaNode>>) -> Self {
        let schema = schema.into();
        match schema.as_ref() {
            SchemaNode::Compilation(compilation) => {
                let fields = compilation
                    .fields()
                    .map(|(name, child)| (name.to_string(), DataNode::from_schema(Arc::clone(child))))
                    .collect();
                DataNode::Compilation(CompilationNode { schema, fields })
            }
            SchemaNode::List(_) => DataNode::List(ListNode {
                schema,
                items: Vec::new(),
            }),
            SchemaNode::Temporal(temporal) if temporal.set_on_create() => {
                let now = Local::now().naive_local();
                let value = match temporal.kind() {
                    TemporalKind::Date => Value::Date(now.date()),
                    TemporalKind::Time => Value::Time(now.time()),
                    TemporalKind::DateTime => Value::DateTime(now),
                };
                DataNode::Item(ItemNode {
                    schema,
                    value: Some(value),
                })
            }
            _ => DataNode::Item(ItemNode {
                schema,
                value: None,
            }),
        }
    }

    pub fn schema(&self) -> &Arc<SchemaNode> {
        match self {
            DataNode::Item(item) => &item.schema,
            DataNode::Compilation(compilation) => &compilation.schema,
            DataNode::List(list) => &list.schema,
        }
    }

    pub fn schema_hash(&self) -> SchemaHash {
        self.schema().hash()
    }

    pub fn kind(&self) -> NodeKind {
        self.schema().kind()
    }

    pub fn as_item(&self) -> Option<&ItemNode> {
        match self {
            DataNode::Item(item) => Some(item),
            _ => None,
        }
    }

    pub fn as_compilation(&self) -> Option<&CompilationNode> {
        match self {
            DataNode::Compilation(compilation) => Some(compilation),
            _ => None,
        }
    }

    pub fn as_compilation_mut(&mut self) -> Option<&mut CompilationNode> {
        match self {
            DataNode::Compilation(compilation) => Some(compilation),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListNode> {
        match self {
            DataNode::List(list) => Some(list),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut ListNode> {
        match self {
            DataNode::List(list) => Some(list),
            _ => None,
        }
    }

    /// No value anywhere in this subtree
    pub fn is_empty(&self) -> bool {
        match self {
            DataNode::Item(item) => item.value.is_none(),
            DataNode::Compilation(compilation) => {
                compilation.fields.iter().all(|(_, node)| node.is_empty())
            }
            DataNode::List(list) => list.items.iter().all(DataNode::is_empty),
        }
    }

    /// Every non-optional node in this subtree holds a value
    pub fn is_complete(&self) -> bool {
        match self {
            DataNode::Item(item) => item.value.is_some(),
            DataNode::Compilation(compilation) => compilation
                .fields
                .iter()
                .all(|(name, node)| compilation.is_optional(name) || node.is_complete()),
            DataNode::List(list) => list.items.iter().all(DataNode::is_complete),
        }
    }

    /// Current value of an item node
    ///
    /// # Errors
    ///
    /// Returns [`Error::EmptyNode`] for unpopulated items and
    /// [`Error::Unsupported`] for compilations and lists.
    pub fn value(&self) -> Result<&Value> {
        match self {
            DataNode::Item(item) => item.value.as_ref().ok_or(Error::EmptyNode),
            other => Err(Error::Unsupported {
                operation: "value",
                kind: other.kind(),
            }),
        }
    }

    /// Coerce a value to the declared type and store it
    ///
    /// # Errors
    ///
    /// Fails when the value cannot be coerced exactly, or when called on a
    /// compilation or list.
    pub fn set(&mut self, value: impl Into<Value>) -> Result<()> {
        match self {
            DataNode::Item(item) => {
                item.value = Some(coerce(&item.schema, value.into())?);
                Ok(())
            }
            other => Err(Error::Unsupported {
                operation: "set",
                kind: other.kind(),
            }),
        }
    }

    /// Bulk assignment from a value, mapping, or sequence
    ///
    /// Mappings on compilations touch only the named fields; sequences on
    /// lists replace all elements. The assignment is all-or-nothing: on
    /// failure the node keeps its previous contents.
    ///
    /// # Errors
    ///
    /// Fails when the input shape does not fit the node, a mapping names an
    /// unknown field, or any value fails coercion.
    pub fn replace(&mut self, input: impl Into<Input>) -> Result<()> {
        let input = input.into();
        match (self, input) {
            (DataNode::Item(item), Input::Value(value)) => {
                item.value = Some(coerce(&item.schema, value)?);
                Ok(())
            }
            (DataNode::Compilation(compilation), Input::Map(entries)) => {
                let mut staged = compilation.clone();
                for (name, input) in entries {
                    staged
                        .get_mut(&name)
                        .ok_or_else(|| Error::node_not_found(name.as_str()))?
                        .replace(input)?;
                }
                *compilation = staged;
                Ok(())
            }
            (DataNode::List(list), Input::Seq(inputs)) => {
                let mut items = Vec::with_capacity(inputs.len());
                for input in inputs {
                    let mut element = list.new_element()?;
                    element.replace(input)?;
                    items.push(element);
                }
                list.items = items;
                Ok(())
            }
            (node, input) => {
                let expected = match node {
                    DataNode::Item(_) => "value",
                    DataNode::Compilation(_) => "mapping",
                    DataNode::List(_) => "sequence",
                };
                Err(Error::type_mismatch(expected, input.type_name()))
            }
        }
    }

    /// Reset this node and all its descendants to empty
    ///
    /// Lists lose their elements.
    pub fn clear(&mut self) {
        match self {
            DataNode::Item(item) => item.value = None,
            DataNode::Compilation(compilation) => {
                for (_, node) in &mut compilation.fields {
                    node.clear();
                }
            }
            DataNode::List(list) => list.items.clear(),
        }
    }

    /// Child of a compilation by field name
    ///
    /// # Errors
    ///
    /// Fails for unknown names and for nodes that are not compilations.
    pub fn field(&self, name: &str) -> Result<&DataNode> {
        match self {
            DataNode::Compilation(compilation) => compilation
                .get(name)
                .ok_or_else(|| Error::node_not_found(name)),
            other => Err(Error::Unsupported {
                operation: "field",
                kind: other.kind(),
            }),
        }
    }

    /// Mutable child of a compilation by field name
    ///
    /// # Errors
    ///
    /// Fails for unknown names and for nodes that are not compilations.
    pub fn field_mut(&mut self, name: &str) -> Result<&mut DataNode> {
        match self {
            DataNode::Compilation(compilation) => compilation
                .get_mut(name)
                .ok_or_else(|| Error::node_not_found(name)),
            other => Err(Error::Unsupported {
                operation: "field",
                kind: other.kind(),
            }),
        }
    }

    /// List element by index
    ///
    /// # Errors
    ///
    /// Fails for out-of-range indices and for nodes that are not lists.
    pub fn get(&self, index: usize) -> Result<&DataNode> {
        match self {
            DataNode::List(list) => list
                .items
                .get(index)
                .ok_or_else(|| Error::node_not_found(format!("[{index}]"))),
            other => Err(Error::Unsupported {
                operation: "index",
                kind: other.kind(),
            }),
        }
    }

    /// Mutable list element by index
    ///
    /// # Errors
    ///
    /// Fails for out-of-range indices and for nodes that are not lists.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut DataNode> {
        match self {
            DataNode::List(list) => list
                .items
                .get_mut(index)
                .ok_or_else(|| Error::node_not_found(format!("[{index}]"))),
            other => Err(Error::Unsupported {
                operation: "index",
                kind: other.kind(),
            }),
        }
    }

    /// Number of list elements; zero for other nodes
    pub fn len(&self) -> usize {
        match self {
            DataNode::List(list) => list.items.len(),
            _ => 0,
        }
    }

    /// Append a new empty element to a list
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unsupported`] when this node is not a list.
    pub fn append(&mut self) -> Result<&mut DataNode> {
        let list = self.list_mut("append")?;
        let element = list.new_element()?;
        list.items.push(element);
        let last = list.items.len() - 1;
        Ok(&mut list.items[last])
    }

    /// Append a new element populated from `input`
    ///
    /// The list is left unchanged when the input does not fit the element
    /// schema.
    ///
    /// # Errors
    ///
    /// Fails when this node is not a list or the input cannot be assigned.
    pub fn append_with(&mut self, input: impl Into<Input>) -> Result<&mut DataNode> {
        let list = self.list_mut("append")?;
        let mut element = list.new_element()?;
        element.replace(input)?;
        list.items.push(element);
        let last = list.items.len() - 1;
        Ok(&mut list.items[last])
    }

    /// Node at a dotted path such as `"a.b[2].c"`
    ///
    /// # Errors
    ///
    /// Fails when the path does not parse or does not address a node.
    pub fn navigate(&self, path: &str) -> Result<&DataNode> {
        self.node_at(&path.parse()?)
    }

    /// Mutable node at a dotted path
    ///
    /// # Errors
    ///
    /// Fails when the path does not parse or does not address a node.
    pub fn navigate_mut(&mut self, path: &str) -> Result<&mut DataNode> {
        let path: FieldPath = path.parse()?;
        self.node_at_mut(&path)
    }

    /// Node addressed by a parsed path
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] naming the full path when any segment
    /// does not resolve.
    pub fn node_at(&self, path: &FieldPath) -> Result<&DataNode> {
        let mut current = self;
        for segment in path.segments() {
            let next = match (segment, current) {
                (PathSegment::Field(name), DataNode::Compilation(c)) => c.get(name),
                (PathSegment::Index(index), DataNode::List(l)) => l.items.get(*index),
                _ => None,
            };
            current = next.ok_or_else(|| Error::node_not_found(path.to_string()))?;
        }
        Ok(current)
    }

    /// Mutable node addressed by a parsed path
    ///
    /// # Errors
    ///
    /// Returns [`Error::NodeNotFound`] naming the full path when any segment
    /// does not resolve.
    pub fn node_at_mut(&mut self, path: &FieldPath) -> Result<&mut DataNode> {
        let mut current = self;
        for segment in path.segments() {
            let next = match (segment, current) {
                (PathSegment::Field(name), DataNode::Compilation(c)) => c.get_mut(name),
                (PathSegment::Index(index), DataNode::List(l)) => l.items.get_mut(*index),
                _ => None,
            };
            current = next.ok_or_else(|| Error::node_not_found(path.to_string()))?;
        }
        Ok(current)
    }

    /// Copy every value from a tree with the same schema
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleNodes`] when the schema hashes differ.
    pub fn load_from(&mut self, other: &DataNode) -> Result<()> {
        let (left, right) = (self.schema_hash(), other.schema_hash());
        if left != right {
            return Err(Error::IncompatibleNodes { left, right });
        }
        self.copy_values(other)
    }

    fn copy_values(&mut self, other: &DataNode) -> Result<()> {
        match (self, other) {
            (DataNode::Item(target), DataNode::Item(source)) => {
                target.value.clone_from(&source.value);
            }
            (DataNode::Compilation(target), DataNode::Compilation(source)) => {
                // Equal hashes do not imply equal declaration order
                for (name, field) in &mut target.fields {
                    let from = source.get(name).ok_or_else(|| Error::IncompatibleNodes {
                        left: field.schema_hash(),
                        right: source.schema.hash(),
                    })?;
                    field.copy_values(from)?;
                }
            }
            (DataNode::List(target), DataNode::List(source)) => {
                let mut items = Vec::with_capacity(source.items.len());
                for source in &source.items {
                    let mut element = target.new_element()?;
                    element.copy_values(source)?;
                    items.push(element);
                }
                target.items = items;
            }
            (target, source) => {
                return Err(Error::IncompatibleNodes {
                    left: target.schema_hash(),
                    right: source.schema_hash(),
                });
            }
        }
        Ok(())
    }

    fn list_mut(&mut self, operation: &'static str) -> Result<&mut ListNode> {
        match self {
            DataNode::List(list) => Ok(list),
            other => Err(Error::Unsupported {
                operation,
                kind: other.kind(),
            }),
        }
    }
}

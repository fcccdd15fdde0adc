//! Storage lifecycle

use crate::config::StorageConfig;
use crate::registry::BackendRegistry;
use crate::{Error, Result};
use std::fmt;
use std::sync::Arc;
use strata_data::{Backend, DataNode, FieldPath, PersistedSchema};
use strata_schema::{SchemaHash, SchemaNode, SchemaRegistry};
use strata_validation::Validator;
use tracing::{debug, info, trace};

/// Lifecycle state of a [`Storage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageState {
    /// Freshly created, nothing written yet
    Created,
    /// Data tree live and modified since the last save
    Open,
    /// Data tree matches what was last written
    Saved,
    /// Backend released, every operation fails
    Closed,
}

impl fmt::Display for StorageState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StorageState::Created => "created",
            StorageState::Open => "open",
            StorageState::Saved => "saved",
            StorageState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Schema requirements and settings for [`Storage::load`]
///
/// The accepted hashes are the required one followed by the alternatives in
/// the order they were added. Without any accepted hash every persisted
/// schema is accepted.
#[derive(Debug, Default)]
pub struct LoadOptions {
    required: Option<SchemaHash>,
    alternatives: Vec<SchemaHash>,
    schemas: SchemaRegistry,
    config: StorageConfig,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the persisted schema to have this hash
    #[must_use]
    pub fn require_schema(mut self, hash: SchemaHash) -> Self {
        self.required = Some(hash);
        self
    }

    /// Additionally accept a persisted schema with this hash
    #[must_use]
    pub fn accept_alternative(mut self, hash: SchemaHash) -> Self {
        self.alternatives.push(hash);
        self
    }

    /// Require the schema of `node`; a match binds the tree to this instance
    #[must_use]
    pub fn require_node(mut self, node: impl Into<Arc<SchemaNode>>) -> Self {
        let hash = self.schemas.register(node.into());
        self.required = Some(hash);
        self
    }

    /// Additionally accept the schema of `node`
    #[must_use]
    pub fn accept_node(mut self, node: impl Into<Arc<SchemaNode>>) -> Self {
        let hash = self.schemas.register(node.into());
        self.alternatives.push(hash);
        self
    }

    /// Force a backend instead of detecting it from the location
    #[must_use]
    pub fn backend(mut self, name: impl Into<String>) -> Self {
        self.config.backend = Some(name.into());
        self
    }

    /// Validate loaded data before returning the storage
    #[must_use]
    pub fn require_valid(mut self, require: bool) -> Self {
        self.config.require_valid_on_load = require;
        self
    }

    /// Use `config` for backend choice, validation, and later saves
    ///
    /// Replaces backend and validity settings made earlier on these options.
    #[must_use]
    pub fn with_config(mut self, config: StorageConfig) -> Self {
        self.config = config;
        self
    }

    /// Accepted schema hashes in matching order
    pub fn accepted(&self) -> Vec<SchemaHash> {
        self.required
            .iter()
            .chain(&self.alternatives)
            .copied()
            .collect()
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

#[derive(Debug)]
struct Bound {
    backend: Box<dyn Backend>,
    data: DataNode,
}

/// A data tree bound to a backend location
#[derive(Debug)]
pub struct Storage {
    location: String,
    backend_name: &'static str,
    schema_hash: SchemaHash,
    state: StorageState,
    config: StorageConfig,
    accepted_index: Option<usize>,
    bound: Option<Bound>,
}

impl Storage {
    /// Create a new, empty storage for `schema`
    ///
    /// Nothing is persisted until [`save`](Self::save).
    ///
    /// # Errors
    ///
    /// Fails when no backend matches the location or the backend refuses to
    /// create it, e.g. because it exists and `config.overwrite` is unset.
    pub fn create(
        registry: &BackendRegistry,
        location: &str,
        schema: impl Into<Arc<SchemaNode>>,
        config: &StorageConfig,
    ) -> Result<Self> {
        let factory = registry.resolve(location, config.backend.as_deref())?;
        let backend = factory.create(location, config.overwrite)?;
        let data = DataNode::from_schema(schema);
        info!(
            location,
            backend = factory.name(),
            schema_hash = %data.schema_hash(),
            "Created storage"
        );

        Ok(Self {
            location: location.to_string(),
            backend_name: factory.name(),
            schema_hash: data.schema_hash(),
            state: StorageState::Created,
            config: config.clone(),
            accepted_index: None,
            bound: Some(Bound { backend, data }),
        })
    }

    /// Create a new storage holding a copy of every value of `data`
    ///
    /// The new storage is bound to the schema instance of `data` and starts
    /// out [`Open`](StorageState::Open).
    ///
    /// # Errors
    ///
    /// Fails like [`create`](Self::create).
    pub fn create_from(
        registry: &BackendRegistry,
        location: &str,
        data: &DataNode,
        config: &StorageConfig,
    ) -> Result<Self> {
        let mut storage = Self::create(registry, location, Arc::clone(data.schema()), config)?;
        storage.data_mut()?.load_from(data)?;
        Ok(storage)
    }

    /// Open an existing storage
    ///
    /// The persisted schema hash is checked against the accepted hashes of
    /// `options` before any value is read; the first match wins. When the
    /// matching hash was registered through a schema node, the tree is bound
    /// to that instance, otherwise to the schema rebuilt from the storage.
    ///
    /// # Errors
    ///
    /// - [`Error::IncompatibleSchema`] when no accepted hash matches
    /// - [`Error::NoSchema`] / [`Error::Corrupt`] for storages without a
    ///   usable schema
    /// - [`Error::Validation`] when validity is required and the data is
    ///   invalid
    pub fn load(registry: &BackendRegistry, location: &str, options: LoadOptions) -> Result<Self> {
        let factory = registry.resolve(location, options.config.backend.as_deref())?;
        let backend = factory.open(location)?;
        debug!(location, backend = factory.name(), "Opened backend");

        let persisted = backend.read_schema()?.ok_or_else(|| Error::NoSchema {
            location: location.to_string(),
        })?;
        let rebuilt = SchemaNode::from_json(&persisted.json)
            .map_err(|e| Error::corrupt(location, format!("unreadable schema: {e}")))?;
        if rebuilt.hash() != persisted.hash {
            return Err(Error::corrupt(
                location,
                format!(
                    "stored hash {} does not match stored schema {}",
                    persisted.hash,
                    rebuilt.hash()
                ),
            ));
        }

        let accepted = options.accepted();
        let accepted_index = if accepted.is_empty() {
            None
        } else {
            let index = accepted
                .iter()
                .position(|hash| *hash == persisted.hash)
                .ok_or_else(|| Error::IncompatibleSchema {
                    location: location.to_string(),
                    found: persisted.hash,
                    accepted: accepted.len(),
                })?;
            Some(index)
        };

        let schema = options
            .schemas
            .get(&persisted.hash)
            .unwrap_or_else(|| Arc::new(rebuilt));
        let config = options.config;
        let mut data = DataNode::from_schema(schema);
        restore(&mut data, &FieldPath::root(), backend.as_ref(), config.max_list_length)?;

        if config.require_valid_on_load {
            Validator::with_config(config.validation.clone()).validate(&data)?;
        }
        info!(
            location,
            backend = factory.name(),
            schema_hash = %persisted.hash,
            ?accepted_index,
            "Loaded storage"
        );

        Ok(Self {
            location: location.to_string(),
            backend_name: factory.name(),
            schema_hash: persisted.hash,
            state: StorageState::Open,
            config,
            accepted_index,
            bound: Some(Bound { backend, data }),
        })
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend_name
    }

    pub fn state(&self) -> StorageState {
        self.state
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Hash of the schema this storage is bound to
    pub fn schema_hash(&self) -> SchemaHash {
        self.schema_hash
    }

    /// Position of the matched hash among the accepted hashes of the load
    ///
    /// `None` for created storages and loads that accepted any schema.
    pub fn accepted_index(&self) -> Option<usize> {
        self.accepted_index
    }

    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`close`](Self::close).
    pub fn schema(&self) -> Result<&Arc<SchemaNode>> {
        Ok(self.data()?.schema())
    }

    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`close`](Self::close).
    pub fn data(&self) -> Result<&DataNode> {
        self.bound
            .as_ref()
            .map(|bound| &bound.data)
            .ok_or_else(|| Error::closed(&self.location))
    }

    /// Mutable access to the data tree, moving the storage to
    /// [`Open`](StorageState::Open)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`close`](Self::close).
    pub fn data_mut(&mut self) -> Result<&mut DataNode> {
        let bound = self
            .bound
            .as_mut()
            .ok_or_else(|| Error::closed(&self.location))?;
        if self.state != StorageState::Open {
            trace!(location = %self.location, from = %self.state, "Storage reopened for mutation");
            self.state = StorageState::Open;
        }
        Ok(&mut bound.data)
    }

    /// # Errors
    ///
    /// Returns [`Error::Closed`] after [`close`](Self::close).
    pub fn is_complete(&self) -> Result<bool> {
        Ok(self.data()?.is_complete())
    }

    /// Validate the data tree with the configured validation settings
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] describing every failure, or
    /// [`Error::Closed`].
    pub fn validate(&self) -> Result<()> {
        let data = self.data()?;
        Validator::with_config(self.config.validation.clone()).validate(data)?;
        Ok(())
    }

    /// Persist the schema and every slot of the data tree
    ///
    /// The tree is validated first unless `validate_on_save` is disabled; a
    /// validation failure leaves the backend untouched. Populated values are
    /// written, empty ones removed, and list lengths resized before the
    /// backend is flushed.
    ///
    /// # Errors
    ///
    /// Fails on validation or backend errors, or with [`Error::Closed`].
    pub fn save(&mut self) -> Result<()> {
        if self.config.validate_on_save {
            self.validate()?;
        }
        let bound = self
            .bound
            .as_mut()
            .ok_or_else(|| Error::closed(&self.location))?;

        let schema = bound.data.schema();
        bound.backend.write_schema(PersistedSchema {
            hash: schema.hash(),
            json: schema.to_json(),
        })?;
        let mut slots = 0;
        persist(&bound.data, &FieldPath::root(), bound.backend.as_mut(), &mut slots)?;
        bound.backend.flush()?;

        self.state = StorageState::Saved;
        info!(location = %self.location, slots, "Saved storage");
        Ok(())
    }

    /// Release the backend without saving
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) {
        if self.bound.take().is_some() {
            debug!(location = %self.location, from = %self.state, "Closed storage");
        }
        self.state = StorageState::Closed;
    }
}

/// Rebuild a freshly instantiated tree from the slots of a backend
fn restore(
    node: &mut DataNode,
    path: &FieldPath,
    backend: &dyn Backend,
    max_list_length: usize,
) -> Result<()> {
    match node {
        DataNode::Item(_) => match backend.read_value(path)? {
            Some(value) => node.set(value)?,
            // Drops values a fresh tree fills in on creation.
            None => node.clear(),
        },
        DataNode::Compilation(compilation) => {
            for (name, child) in compilation.fields_mut() {
                restore(child, &path.child(name), backend, max_list_length)?;
            }
        }
        DataNode::List(_) => {
            let len = backend.sequence_len(path)?;
            if len > max_list_length {
                return Err(Error::corrupt(
                    backend.location(),
                    format!("list '{path}' claims {len} elements, limit is {max_list_length}"),
                ));
            }
            for _ in 0..len {
                node.append()?;
            }
            if let Some(list) = node.as_list_mut() {
                for (index, element) in list.items_mut().enumerate() {
                    restore(element, &path.index(index), backend, max_list_length)?;
                }
            }
        }
    }
    Ok(())
}

/// Write every slot of a tree to a backend
fn persist(node: &DataNode, path: &FieldPath, backend: &mut dyn Backend, slots: &mut usize) -> Result<()> {
    match node {
        DataNode::Item(item) => match item.value() {
            Some(value) => {
                backend.write_value(path, value)?;
                *slots += 1;
            }
            None => backend.remove_value(path)?,
        },
        DataNode::Compilation(compilation) => {
            for (name, child) in compilation.fields() {
                persist(child, &path.child(name), backend, slots)?;
            }
        }
        DataNode::List(list) => {
            backend.resize_sequence(path, list.items().len())?;
            for (index, element) in list.items().iter().enumerate() {
                persist(element, &path.index(index), backend, slots)?;
            }
        }
    }
    Ok(())
}

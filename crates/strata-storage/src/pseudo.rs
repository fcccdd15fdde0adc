//! Pseudo storages
//!
//! A library that defines its own schema cannot know whether the application
//! stores the library's data in a dedicated storage or embeds it as a field
//! of a larger tree. [`PseudoStorage`] covers both cases behind one API:
//!
//! - [`PseudoStorage::from_location`] owns a [`Storage`] and manages its whole
//!   lifecycle
//! - [`PseudoStorage::from_node`] is a view onto a node owned by somebody
//!   else; it never creates, saves, or closes anything

use crate::config::StorageConfig;
use crate::registry::BackendRegistry;
use crate::storage::{LoadOptions, Storage};
use crate::{Error, Result};
use std::sync::Arc;
use strata_data::DataNode;
use strata_schema::SchemaNode;
use tracing::{debug, warn};

#[derive(Debug)]
enum Source<'a> {
    Location {
        location: String,
        config: StorageConfig,
        storage: Option<Storage>,
    },
    Node {
        node: &'a mut DataNode,
        open: bool,
    },
}

/// Storage facade over either a location or an embedded node
#[derive(Debug)]
pub struct PseudoStorage<'a> {
    schema: Arc<SchemaNode>,
    alternatives: Vec<Arc<SchemaNode>>,
    owns_storage: bool,
    source: Source<'a>,
}

impl PseudoStorage<'static> {
    /// Facade owning the storage at `location`
    ///
    /// [`open`](PseudoStorage::open) loads the location when it exists and
    /// creates it otherwise.
    pub fn from_location(location: impl Into<String>, schema: impl Into<Arc<SchemaNode>>) -> Self {
        Self {
            schema: schema.into(),
            alternatives: Vec::new(),
            owns_storage: true,
            source: Source::Location {
                location: location.into(),
                config: StorageConfig::default(),
                storage: None,
            },
        }
    }
}

impl<'a> PseudoStorage<'a> {
    /// View onto a node embedded in a tree owned elsewhere
    pub fn from_node(node: &'a mut DataNode, schema: impl Into<Arc<SchemaNode>>) -> Self {
        Self {
            schema: schema.into(),
            alternatives: Vec::new(),
            owns_storage: false,
            source: Source::Node { node, open: false },
        }
    }

    /// Also accept data bound to `schema`
    #[must_use]
    pub fn accept_alternative(mut self, schema: impl Into<Arc<SchemaNode>>) -> Self {
        self.alternatives.push(schema.into());
        self
    }

    /// Configuration for the owned storage; ignored for node views
    #[must_use]
    pub fn with_config(mut self, new_config: StorageConfig) -> Self {
        if let Source::Location { config, .. } = &mut self.source {
            *config = new_config;
        }
        self
    }

    /// Whether this facade creates, saves, and closes a storage of its own
    pub fn owns_storage(&self) -> bool {
        self.owns_storage
    }

    /// Expected schema
    pub fn schema(&self) -> &Arc<SchemaNode> {
        &self.schema
    }

    pub fn is_open(&self) -> bool {
        match &self.source {
            Source::Location { storage, .. } => storage.is_some(),
            Source::Node { open, .. } => *open,
        }
    }

    /// The owned storage while open
    pub fn storage(&self) -> Option<&Storage> {
        match &self.source {
            Source::Location { storage, .. } => storage.as_ref(),
            Source::Node { .. } => None,
        }
    }

    pub fn storage_mut(&mut self) -> Option<&mut Storage> {
        match &mut self.source {
            Source::Location { storage, .. } => storage.as_mut(),
            Source::Node { .. } => None,
        }
    }

    /// Make the data available
    ///
    /// An owning facade loads its location, accepting the expected schema
    /// first and then the alternatives, or creates the location when it
    /// does not exist. A node view checks the node's schema hash against the
    /// same accepted set. Opening an open facade is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::IncompatibleSchema`] when the data is bound to a
    /// schema that is not accepted, or any error of loading or creating.
    pub fn open(&mut self) -> Result<()> {
        self.open_with(&BackendRegistry::default())
    }

    /// [`open`](Self::open) resolving backends from `registry`
    ///
    /// # Errors
    ///
    /// Fails like [`open`](Self::open).
    pub fn open_with(&mut self, registry: &BackendRegistry) -> Result<()> {
        let accepted: Vec<_> = std::iter::once(&self.schema)
            .chain(&self.alternatives)
            .map(|schema| schema.hash())
            .collect();

        match &mut self.source {
            Source::Location {
                location,
                config,
                storage,
            } => {
                if storage.is_some() {
                    return Ok(());
                }
                let factory = registry.resolve(location, config.backend.as_deref())?;
                let opened = if factory.exists(location) {
                    debug!(location = %location, "Pseudo storage loading existing location");
                    let options = self
                        .alternatives
                        .iter()
                        .fold(
                            LoadOptions::new()
                                .with_config(config.clone())
                                .require_node(Arc::clone(&self.schema)),
                            |options, schema| options.accept_node(Arc::clone(schema)),
                        );
                    Storage::load(registry, location, options)?
                } else {
                    debug!(location = %location, "Pseudo storage creating new location");
                    Storage::create(registry, location, Arc::clone(&self.schema), config)?
                };
                *storage = Some(opened);
            }
            Source::Node { node, open } => {
                let found = node.schema_hash();
                if !accepted.contains(&found) {
                    return Err(Error::IncompatibleSchema {
                        location: String::new(),
                        found,
                        accepted: accepted.len(),
                    });
                }
                *open = true;
            }
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns [`Error::NotOpen`] before [`open`](Self::open).
    pub fn data(&self) -> Result<&DataNode> {
        match &self.source {
            Source::Location { storage, .. } => storage.as_ref().ok_or(Error::NotOpen)?.data(),
            Source::Node { node, open: true } => Ok(&**node),
            Source::Node { .. } => Err(Error::NotOpen),
        }
    }

    /// # Errors
    ///
    /// Returns [`Error::NotOpen`] before [`open`](Self::open).
    pub fn data_mut(&mut self) -> Result<&mut DataNode> {
        match &mut self.source {
            Source::Location { storage, .. } => storage.as_mut().ok_or(Error::NotOpen)?.data_mut(),
            Source::Node { node, open: true } => Ok(&mut **node),
            Source::Node { .. } => Err(Error::NotOpen),
        }
    }

    /// Save and release an owned storage; a node view just stops being
    /// open
    ///
    /// The owned storage is released even when saving fails.
    ///
    /// # Errors
    ///
    /// Returns the save error of the owned storage.
    pub fn close(&mut self) -> Result<()> {
        match &mut self.source {
            Source::Location { storage, .. } => {
                if let Some(mut storage) = storage.take() {
                    let saved = storage.save();
                    storage.close();
                    saved?;
                }
            }
            Source::Node { open, .. } => *open = false,
        }
        Ok(())
    }

    /// Release without saving
    pub fn discard(&mut self) {
        match &mut self.source {
            Source::Location { storage, .. } => {
                if let Some(mut storage) = storage.take() {
                    warn!(location = storage.location(), "Discarding unsaved pseudo storage");
                    storage.close();
                }
            }
            Source::Node { open, .. } => *open = false,
        }
    }

    /// Open, run `f` on the data, then close
    ///
    /// On `Ok` the facade is closed, which saves an owned storage. On `Err`
    /// it is released without saving and the error is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns the error of opening, of `f`, or of the final save.
    pub fn scoped<T, E>(
        &mut self,
        f: impl FnOnce(&mut DataNode) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E>
    where
        E: From<Error>,
    {
        self.open()?;
        let result = self.data_mut().map_err(E::from).and_then(f);
        match result {
            Ok(value) => {
                self.close()?;
                Ok(value)
            }
            Err(e) => {
                self.discard();
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MEMORY_LOCATION;
    use strata_schema::DType;

    fn library_schema() -> Arc<SchemaNode> {
        Arc::new(
            SchemaNode::compilation()
                .field("gain", SchemaNode::scalar(DType::Float64).build().unwrap())
                .build()
                .unwrap(),
        )
    }

    #[test]
    fn test_node_view_never_owns() {
        let schema = library_schema();
        let mut node = DataNode::from_schema(Arc::clone(&schema));
        let mut pseudo = PseudoStorage::from_node(&mut node, schema);
        assert!(!pseudo.owns_storage());
        assert!(matches!(pseudo.data(), Err(Error::NotOpen)));

        pseudo.open().unwrap();
        pseudo.data_mut().unwrap().field_mut("gain").unwrap().set(2.5).unwrap();
        assert!(pseudo.storage().is_none());
        pseudo.close().unwrap();
        assert!(!pseudo.is_open());

        assert_eq!(node.field("gain").unwrap().value().unwrap().as_f64(), Some(2.5));
    }

    #[test]
    fn test_node_view_checks_schema() {
        let mut node = DataNode::from_schema(SchemaNode::Bool);
        {
            let mut pseudo = PseudoStorage::from_node(&mut node, library_schema());
            assert!(matches!(pseudo.open(), Err(Error::IncompatibleSchema { .. })));
        }

        let mut pseudo = PseudoStorage::from_node(&mut node, library_schema())
            .accept_alternative(SchemaNode::Bool);
        assert!(pseudo.open().is_ok());
        assert!(pseudo.data().unwrap().is_empty());
    }

    #[test]
    fn test_scoped_memory_storage() {
        let mut pseudo = PseudoStorage::from_location(MEMORY_LOCATION, library_schema());
        assert!(pseudo.owns_storage());

        let gain = pseudo
            .scoped(|data| -> Result<f64> {
                data.field_mut("gain")?.set(1.25)?;
                Ok(1.25)
            })
            .unwrap();
        assert!((gain - 1.25).abs() < f64::EPSILON);
        assert!(!pseudo.is_open());
    }
}

//! Backend registry with suffix auto-detection

use crate::memory::MemoryBackendFactory;
use crate::{Error, Result};
use strata_adapter_archive::ArchiveBackendFactory;
use strata_adapter_csv::CsvBackendFactory;
use strata_adapter_json::JsonBackendFactory;
use strata_data::BackendFactory;
use tracing::trace;

/// Ordered set of backend factories
#[derive(Debug)]
pub struct BackendRegistry {
    factories: Vec<Box<dyn BackendFactory>>,
}

impl BackendRegistry {
    /// Create a registry without any backends
    pub fn empty() -> Self {
        Self {
            factories: Vec::new(),
        }
    }

    /// Register a backend factory
    ///
    /// A factory whose name is already registered replaces the earlier one.
    #[must_use]
    pub fn with(mut self, factory: impl BackendFactory + 'static) -> Self {
        self.register(factory);
        self
    }

    pub fn register(&mut self, factory: impl BackendFactory + 'static) {
        self.factories.retain(|f| f.name() != factory.name());
        self.factories.push(Box::new(factory));
    }

    /// Names of the registered backends in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.iter().map(|f| f.name())
    }

    /// Get a factory by backend name
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownBackend`] for unregistered names.
    pub fn by_name(&self, name: &str) -> Result<&dyn BackendFactory> {
        self.factories
            .iter()
            .find(|f| f.name() == name)
            .map(|f| &**f)
            .ok_or_else(|| Error::UnknownBackend {
                name: name.to_string(),
            })
    }

    /// Detect the backend for a location from its suffix
    ///
    /// The longest matching suffix wins, so `.tar.zst` is preferred over a
    /// backend claiming `.zst`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AutodetectBackend`] when no suffix matches.
    pub fn detect(&self, location: &str) -> Result<&dyn BackendFactory> {
        let found = self
            .factories
            .iter()
            .filter_map(|f| {
                f.suffixes()
                    .iter()
                    .filter(|suffix| location.ends_with(*suffix))
                    .map(|suffix| suffix.len())
                    .max()
                    .map(|len| (len, f))
            })
            .max_by_key(|(len, _)| *len)
            .map(|(_, f)| &**f);

        match found {
            Some(factory) => {
                trace!(location, backend = factory.name(), "Detected backend");
                Ok(factory)
            }
            None => Err(Error::AutodetectBackend {
                location: location.to_string(),
            }),
        }
    }

    /// Explicitly named backend, or the detected one
    ///
    /// # Errors
    ///
    /// Fails like [`by_name`](Self::by_name) or [`detect`](Self::detect).
    pub fn resolve(&self, location: &str, backend: Option<&str>) -> Result<&dyn BackendFactory> {
        match backend {
            Some(name) => self.by_name(name),
            None => self.detect(location),
        }
    }
}

impl Default for BackendRegistry {
    /// Registry with the memory, JSON, archive, and CSV backends
    fn default() -> Self {
        Self::empty()
            .with(MemoryBackendFactory)
            .with(JsonBackendFactory::new())
            .with(ArchiveBackendFactory::new())
            .with(CsvBackendFactory::new())
    }
}

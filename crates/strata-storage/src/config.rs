//! Storage configuration

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use strata_validation::ValidationConfig;

/// Longest list accepted from a stored file unless configured otherwise
pub const DEFAULT_MAX_LIST_LENGTH: usize = 1 << 20;

/// Configuration for creating and loading storages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend name; auto-detected from the location when unset
    pub backend: Option<String>,
    /// Replace an existing location on create
    pub overwrite: bool,
    /// Validate the whole tree before saving
    pub validate_on_save: bool,
    /// Validate loaded data before handing it out
    pub require_valid_on_load: bool,
    /// Stored list lengths above this are reported as corrupt on load
    pub max_list_length: usize,
    pub validation: ValidationConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: None,
            overwrite: false,
            validate_on_save: true,
            require_valid_on_load: true,
            max_list_length: DEFAULT_MAX_LIST_LENGTH,
            validation: ValidationConfig::default(),
        }
    }
}

impl StorageConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a configuration from YAML
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when the document does not describe a
    /// storage configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| Error::Config {
            reason: e.to_string(),
        })
    }

    #[must_use]
    pub fn with_backend(mut self, name: impl Into<String>) -> Self {
        self.backend = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    #[must_use]
    pub fn with_validate_on_save(mut self, validate: bool) -> Self {
        self.validate_on_save = validate;
        self
    }

    #[must_use]
    pub fn with_require_valid_on_load(mut self, require: bool) -> Self {
        self.require_valid_on_load = require;
        self
    }

    #[must_use]
    pub fn with_max_list_length(mut self, max: usize) -> Self {
        self.max_list_length = max;
        self
    }

    #[must_use]
    pub fn with_validation(mut self, validation: ValidationConfig) -> Self {
        self.validation = validation;
        self
    }
}

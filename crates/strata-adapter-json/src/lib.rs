#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

//! # strata-adapter-json
//!
//! JSON document backend for strata storages.
//!
//! A storage is a single document:
//!
//! ```json
//! {
//!   "format": "strata",
//!   "version": 1,
//!   "schema_hash": "…",
//!   "schema": { "node_type": "Compilation", "config": { … } },
//!   "values": { "title": { "kind": "string", "value": "run 1" } },
//!   "sequences": { "runs": 2 }
//! }
//! ```

pub mod codec;

pub use codec::{FORMAT, JsonCodec, VERSION};

use strata_data::{Backend, BackendFactory, BackendResult, FileBackend, file_exists};
use tracing::debug;

/// Backend storing a data tree as one JSON document
pub type JsonBackend = FileBackend<JsonCodec>;

/// Factory for `.json` storages
#[derive(Debug, Clone, Default)]
pub struct JsonBackendFactory {
    codec: JsonCodec,
}

impl JsonBackendFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a specific codec, e.g. compact output
    #[must_use]
    pub fn with_codec(mut self, codec: JsonCodec) -> Self {
        self.codec = codec;
        self
    }
}

impl BackendFactory for JsonBackendFactory {
    fn name(&self) -> &'static str {
        "json"
    }

    fn suffixes(&self) -> &[&'static str] {
        &[".json"]
    }

    fn exists(&self, location: &str) -> bool {
        file_exists(location)
    }

    fn create(&self, location: &str, overwrite: bool) -> BackendResult<Box<dyn Backend>> {
        debug!(location, "Creating JSON storage");
        Ok(Box::new(JsonBackend::create(location, overwrite, self.codec.clone())?))
    }

    fn open(&self, location: &str) -> BackendResult<Box<dyn Backend>> {
        debug!(location, "Opening JSON storage");
        Ok(Box::new(JsonBackend::open(location, self.codec.clone())?))
    }
}

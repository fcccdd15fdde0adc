#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

//! # strata-adapter-csv
//!
//! CSV record backend for strata storages.
//!
//! Every row is a `record,key,payload` triple:
//!
//! | record     | key          | payload                          |
//! |------------|--------------|----------------------------------|
//! | `schema`   |              | schema document (JSON)           |
//! | `hash`     |              | hex schema hash                  |
//! | `sequence` | list slot    | list length                      |
//! | `value`    | value slot   | tagged value (JSON)              |

pub mod codec;

pub use codec::{CsvCodec, RecordType};

use strata_data::{Backend, BackendFactory, BackendResult, FileBackend, file_exists};
use tracing::debug;

/// Backend storing a data tree as CSV records
pub type CsvBackend = FileBackend<CsvCodec>;

/// Factory for `.csv` storages
#[derive(Debug, Clone, Default)]
pub struct CsvBackendFactory {
    codec: CsvCodec,
}

impl CsvBackendFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_codec(mut self, codec: CsvCodec) -> Self {
        self.codec = codec;
        self
    }
}

impl BackendFactory for CsvBackendFactory {
    fn name(&self) -> &'static str {
        "csv"
    }

    fn suffixes(&self) -> &[&'static str] {
        &[".csv"]
    }

    fn exists(&self, location: &str) -> bool {
        file_exists(location)
    }

    fn create(&self, location: &str, overwrite: bool) -> BackendResult<Box<dyn Backend>> {
        debug!(location, "Creating CSV storage");
        Ok(Box::new(CsvBackend::create(location, overwrite, self.codec.clone())?))
    }

    fn open(&self, location: &str) -> BackendResult<Box<dyn Backend>> {
        debug!(location, "Opening CSV storage");
        Ok(Box::new(CsvBackend::open(location, self.codec.clone())?))
    }
}

#![deny(rust_2018_idioms)]
#![warn(clippy::all)]

//! # strata-adapter-archive
//!
//! Zstandard-compressed tar archive backend for strata storages.
//!
//! Archive layout:
//!
//! - `_schema.json`: schema document
//! - `_hash`: hex schema hash
//! - `_sequences.json`: list lengths by slot
//! - `values/<slot>.json`: one entry per populated slot (the root slot is
//!   `values/.json`)

pub mod codec;

pub use codec::ArchiveCodec;

use strata_data::{Backend, BackendFactory, BackendResult, FileBackend, file_exists};
use tracing::debug;

/// Backend storing a data tree as a `.tar.zst` archive
pub type ArchiveBackend = FileBackend<ArchiveCodec>;

/// Factory for `.tar.zst` storages
#[derive(Debug, Clone, Default)]
pub struct ArchiveBackendFactory {
    codec: ArchiveCodec,
}

impl ArchiveBackendFactory {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_codec(mut self, codec: ArchiveCodec) -> Self {
        self.codec = codec;
        self
    }
}

impl BackendFactory for ArchiveBackendFactory {
    fn name(&self) -> &'static str {
        "archive"
    }

    fn suffixes(&self) -> &[&'static str] {
        &[".tar.zst"]
    }

    fn exists(&self, location: &str) -> bool {
        file_exists(location)
    }

    fn create(&self, location: &str, overwrite: bool) -> BackendResult<Box<dyn Backend>> {
        debug!(location, level = self.codec.level(), "Creating archive storage");
        Ok(Box::new(ArchiveBackend::create(location, overwrite, self.codec.clone())?))
    }

    fn open(&self, location: &str) -> BackendResult<Box<dyn Backend>> {
        debug!(location, "Opening archive storage");
        Ok(Box::new(ArchiveBackend::open(location, self.codec.clone())?))
    }
}

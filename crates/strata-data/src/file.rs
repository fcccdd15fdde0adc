//! File-backed backends over a [`SlotTable`]
//!
//! The file is opened on create/open and held until the backend is dropped.
//! Writes are staged in memory and the whole table is re-encoded on flush.

use crate::backend::{Backend, BackendError, BackendResult, PersistedSchema, SlotTable};
use crate::path::FieldPath;
use crate::value::Value;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;
use tracing::{debug, trace};

/// Encoding of a whole slot table into file contents
pub trait TableCodec: fmt::Debug {
    /// # Errors
    ///
    /// Returns [`BackendError::Encoding`] when the table cannot be encoded.
    fn encode(&self, location: &str, table: &SlotTable) -> BackendResult<Vec<u8>>;

    /// # Errors
    ///
    /// Returns [`BackendError::Corrupt`] when the contents are malformed.
    fn decode(&self, location: &str, bytes: &[u8]) -> BackendResult<SlotTable>;
}

/// Backend storing its slot table in a single file
#[derive(Debug)]
pub struct FileBackend<C: TableCodec> {
    location: String,
    file: File,
    table: SlotTable,
    codec: C,
}

impl<C: TableCodec> FileBackend<C> {
    /// Create a new file, replacing an existing one only when `overwrite`
    /// is set
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::AlreadyExists`] when the file exists and
    /// `overwrite` is false.
    pub fn create(location: &str, overwrite: bool, codec: C) -> BackendResult<Self> {
        let mut options = OpenOptions::new();
        options.read(true).write(true);
        if overwrite {
            options.create(true).truncate(true);
        } else {
            options.create_new(true);
        }
        let file = options
            .open(location)
            .map_err(|e| BackendError::from_io(location, e))?;
        debug!(location, overwrite, "Created storage file");
        Ok(Self {
            location: location.to_string(),
            file,
            table: SlotTable::new(),
            codec,
        })
    }

    /// Open an existing file and decode its contents
    ///
    /// A zero-length file decodes to an empty table.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::NotFound`] when the file does not exist and
    /// [`BackendError::Corrupt`] when it cannot be decoded.
    pub fn open(location: &str, codec: C) -> BackendResult<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(location)
            .map_err(|e| BackendError::from_io(location, e))?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)
            .map_err(|e| BackendError::from_io(location, e))?;
        let table = if bytes.is_empty() {
            SlotTable::new()
        } else {
            codec.decode(location, &bytes)?
        };
        debug!(
            location,
            bytes = bytes.len(),
            values = table.values.len(),
            "Opened storage file"
        );
        Ok(Self {
            location: location.to_string(),
            file,
            table,
            codec,
        })
    }

    pub fn table(&self) -> &SlotTable {
        &self.table
    }
}

/// Whether a regular file exists at `location`
pub fn file_exists(location: &str) -> bool {
    Path::new(location).is_file()
}

impl<C: TableCodec> Backend for FileBackend<C> {
    fn location(&self) -> &str {
        &self.location
    }

    fn read_schema(&self) -> BackendResult<Option<PersistedSchema>> {
        Ok(self.table.schema.clone())
    }

    fn write_schema(&mut self, schema: PersistedSchema) -> BackendResult<()> {
        self.table.schema = Some(schema);
        Ok(())
    }

    fn read_value(&self, slot: &FieldPath) -> BackendResult<Option<Value>> {
        Ok(self.table.value(slot).cloned())
    }

    fn write_value(&mut self, slot: &FieldPath, value: &Value) -> BackendResult<()> {
        self.table.set_value(slot, value.clone());
        Ok(())
    }

    fn remove_value(&mut self, slot: &FieldPath) -> BackendResult<()> {
        self.table.remove_value(slot);
        Ok(())
    }

    fn sequence_len(&self, slot: &FieldPath) -> BackendResult<usize> {
        Ok(self.table.sequence_len(slot))
    }

    fn resize_sequence(&mut self, slot: &FieldPath, len: usize) -> BackendResult<()> {
        self.table.resize_sequence(slot, len);
        Ok(())
    }

    fn flush(&mut self) -> BackendResult<()> {
        let bytes = self.codec.encode(&self.location, &self.table)?;
        let location = self.location.as_str();
        let io = |e| BackendError::from_io(location, e);
        self.file.seek(SeekFrom::Start(0)).map_err(io)?;
        self.file.set_len(0).map_err(io)?;
        self.file.write_all(&bytes).map_err(io)?;
        self.file.sync_all().map_err(io)?;
        trace!(location, bytes = bytes.len(), "Flushed storage file");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct JsonLines;

    impl TableCodec for JsonLines {
        fn encode(&self, location: &str, table: &SlotTable) -> BackendResult<Vec<u8>> {
            serde_json::to_vec(table).map_err(|e| BackendError::encoding(location, e.to_string()))
        }

        fn decode(&self, location: &str, bytes: &[u8]) -> BackendResult<SlotTable> {
            serde_json::from_slice(bytes).map_err(|e| BackendError::corrupt(location, e.to_string()))
        }
    }

    #[test]
    fn test_create_flush_open() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("table.json");
        let location = location.to_str().unwrap();

        let mut backend = FileBackend::create(location, false, JsonLines).unwrap();
        backend.write_value(&"x".parse().unwrap(), &Value::Int(3)).unwrap();
        backend.flush().unwrap();
        drop(backend);

        assert!(file_exists(location));
        let reopened = FileBackend::open(location, JsonLines).unwrap();
        assert_eq!(
            reopened.read_value(&"x".parse().unwrap()).unwrap(),
            Some(Value::Int(3))
        );
    }

    #[test]
    fn test_create_respects_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().join("table.json");
        let location = location.to_str().unwrap();
        std::fs::write(location, b"{}").unwrap();

        assert!(matches!(
            FileBackend::create(location, false, JsonLines),
            Err(BackendError::AlreadyExists { .. })
        ));
        let backend = FileBackend::create(location, true, JsonLines).unwrap();
        assert!(backend.table().is_empty());
    }

    #[test]
    fn test_open_missing_and_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            FileBackend::open(missing.to_str().unwrap(), JsonLines),
            Err(BackendError::NotFound { .. })
        ));

        let corrupt = dir.path().join("corrupt.json");
        std::fs::write(&corrupt, b"not json").unwrap();
        assert!(matches!(
            FileBackend::open(corrupt.to_str().unwrap(), JsonLines),
            Err(BackendError::Corrupt { .. })
        ));

        let empty = dir.path().join("empty.json");
        std::fs::write(&empty, b"").unwrap();
        let backend = FileBackend::open(empty.to_str().unwrap(), JsonLines).unwrap();
        assert!(backend.read_schema().unwrap().is_none());
    }
}

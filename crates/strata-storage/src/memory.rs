//! In-memory backend
//!
//! Holds a storage for the lifetime of the process without writing anything
//! to disk. Useful for collecting data before a location has been chosen;
//! copy the tree into a persistent storage with [`crate::create_from`].

use strata_data::{Backend, BackendError, BackendFactory, BackendResult, FieldPath, PersistedSchema, SlotTable, Value};
use tracing::trace;

/// Location selecting the in-memory backend
pub const MEMORY_LOCATION: &str = ":memory:";

/// Backend keeping its slot table in memory
#[derive(Debug, Default)]
pub struct MemoryBackend {
    location: String,
    table: SlotTable,
}

impl MemoryBackend {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            table: SlotTable::new(),
        }
    }

    pub fn table(&self) -> &SlotTable {
        &self.table
    }
}

impl Backend for MemoryBackend {
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
        trace!(
            location = %self.location,
            values = self.table.values.len(),
            "Memory backend flush is a no-op"
        );
        Ok(())
    }
}

/// Factory for `:memory:` storages
///
/// Memory storages never exist beforehand, so they can be created but not
/// opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryBackendFactory;

impl BackendFactory for MemoryBackendFactory {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn suffixes(&self) -> &[&'static str] {
        &[MEMORY_LOCATION]
    }

    fn exists(&self, _location: &str) -> bool {
        false
    }

    fn create(&self, location: &str, _overwrite: bool) -> BackendResult<Box<dyn Backend>> {
        Ok(Box::new(MemoryBackend::new(location)))
    }

    fn open(&self, location: &str) -> BackendResult<Box<dyn Backend>> {
        Err(BackendError::NotFound {
            location: location.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage_cannot_be_opened() {
        let factory = MemoryBackendFactory;
        assert!(!factory.exists(MEMORY_LOCATION));
        assert!(factory.create(MEMORY_LOCATION, false).is_ok());
        assert!(matches!(
            factory.open(MEMORY_LOCATION),
            Err(BackendError::NotFound { .. })
        ));
    }

    #[test]
    fn test_slots_live_in_table() {
        let mut backend = MemoryBackend::new(MEMORY_LOCATION);
        let slot: FieldPath = "rows[0].x".parse().unwrap();
        backend.resize_sequence(&"rows".parse().unwrap(), 1).unwrap();
        backend.write_value(&slot, &Value::Float(1.5)).unwrap();
        assert_eq!(backend.read_value(&slot).unwrap(), Some(Value::Float(1.5)));

        backend.resize_sequence(&"rows".parse().unwrap(), 0).unwrap();
        assert!(backend.table().is_empty());
    }
}

//! Schema registry keyed by canonical hash

use crate::hash::SchemaHash;
use crate::model::SchemaNode;
use dashmap::DashMap;
use std::sync::Arc;

/// Interns schema trees by their canonical hash
///
/// Registering a schema hands out the shared instance for its hash, so code
/// that reopens a storage gets back the application's own schema object
/// rather than a structurally equal copy.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: DashMap<SchemaHash, Arc<SchemaNode>>,
}

impl SchemaRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema and return its hash; an already registered hash
    /// keeps its first instance
    pub fn register(&self, schema: Arc<SchemaNode>) -> SchemaHash {
        let hash = schema.hash();
        self.schemas.entry(hash).or_insert(schema);
        hash
    }

    /// Get a schema by hash
    pub fn get(&self, hash: &SchemaHash) -> Option<Arc<SchemaNode>> {
        self.schemas.get(hash).map(|entry| Arc::clone(entry.value()))
    }

    /// Check if a schema exists
    pub fn contains(&self, hash: &SchemaHash) -> bool {
        self.schemas.contains_key(hash)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DType;

    #[test]
    fn test_register_interns_first_instance() {
        let registry = SchemaRegistry::new();
        let first = Arc::new(SchemaNode::scalar(DType::Int32).build().unwrap());
        let second = Arc::new(SchemaNode::scalar(DType::Int32).build().unwrap());

        let hash = registry.register(Arc::clone(&first));
        assert_eq!(registry.register(second), hash);
        assert_eq!(registry.len(), 1);
        assert!(Arc::ptr_eq(&registry.get(&hash).unwrap(), &first));
    }

    #[test]
    fn test_unknown_hash() {
        let registry = SchemaRegistry::new();
        assert!(registry.is_empty());
        assert!(!registry.contains(&SchemaNode::Bool.hash()));
        assert!(registry.get(&SchemaNode::Bool.hash()).is_none());
    }
}

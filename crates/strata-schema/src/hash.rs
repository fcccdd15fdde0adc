//! Canonical schema hashing
//!
//! The canonical form of a schema is its JSON document with compilation
//! fields and optional names sorted by name. Two trees built from the same
//! field mapping therefore hash identically regardless of the order in which
//! fields were supplied, while any change to a type, bound, unit, or field
//! name changes the digest.

use crate::loader::{FieldOrder, NodeFile};
use crate::model::SchemaNode;
use crate::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// SHA-256 digest of a schema's canonical form
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaHash([u8; 32]);

impl SchemaHash {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex representation (64 characters)
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for SchemaHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SchemaHash({})", self.to_hex())
    }
}

impl FromStr for SchemaHash {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| Error::InvalidHash {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for SchemaHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for SchemaHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Canonical JSON bytes of a schema tree
pub fn canonical_bytes(node: &SchemaNode) -> Vec<u8> {
    let file = NodeFile::from_node(node, FieldOrder::Sorted);
    serde_json::to_vec(&file).expect("schema documents have string keys and finite bounds")
}

pub(crate) fn hash_node(node: &SchemaNode) -> SchemaHash {
    let digest = Sha256::digest(canonical_bytes(node));
    SchemaHash(digest.into())
}

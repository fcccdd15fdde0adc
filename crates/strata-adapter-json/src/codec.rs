//! JSON document encoding of slot tables

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strata_data::{BackendError, BackendResult, PersistedSchema, SlotTable, TableCodec, Value};
use strata_schema::SchemaHash;

/// Value of the document's `format` field
pub const FORMAT: &str = "strata";

/// Document layout version written by this codec
pub const VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct Document {
    format: String,
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema_hash: Option<SchemaHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<serde_json::Value>,
    #[serde(default)]
    values: BTreeMap<String, Value>,
    #[serde(default)]
    sequences: BTreeMap<String, usize>,
}

/// Codec writing one JSON document per storage
#[derive(Debug, Clone)]
pub struct JsonCodec {
    pretty: bool,
}

impl Default for JsonCodec {
    fn default() -> Self {
        Self { pretty: true }
    }
}

impl JsonCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indent the written document
    #[must_use]
    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl TableCodec for JsonCodec {
    fn encode(&self, location: &str, table: &SlotTable) -> BackendResult<Vec<u8>> {
        let encoding = |e: serde_json::Error| BackendError::encoding(location, e.to_string());
        if let Some(slot) = table.first_non_finite() {
            return Err(BackendError::encoding(
                location,
                format!("slot '{slot}' holds a non-finite float"),
            ));
        }
        let (schema_hash, schema) = match &table.schema {
            Some(persisted) => (
                Some(persisted.hash),
                Some(serde_json::from_str(&persisted.json).map_err(encoding)?),
            ),
            None => (None, None),
        };
        let document = Document {
            format: FORMAT.to_string(),
            version: VERSION,
            schema_hash,
            schema,
            values: table.values.clone(),
            sequences: table.sequences.clone(),
        };
        if self.pretty {
            serde_json::to_vec_pretty(&document).map_err(encoding)
        } else {
            serde_json::to_vec(&document).map_err(encoding)
        }
    }

    fn decode(&self, location: &str, bytes: &[u8]) -> BackendResult<SlotTable> {
        let document: Document = serde_json::from_slice(bytes)
            .map_err(|e| BackendError::corrupt(location, e.to_string()))?;
        if document.format != FORMAT {
            return Err(BackendError::corrupt(
                location,
                format!("unknown format '{}'", document.format),
            ));
        }
        if document.version != VERSION {
            return Err(BackendError::corrupt(
                location,
                format!("unsupported version {}", document.version),
            ));
        }

        let schema = match (document.schema_hash, document.schema) {
            (Some(hash), Some(schema)) => Some(PersistedSchema {
                hash,
                json: schema.to_string(),
            }),
            (None, None) => None,
            _ => {
                return Err(BackendError::corrupt(
                    location,
                    "schema and schema_hash must be stored together",
                ));
            }
        };
        Ok(SlotTable {
            schema,
            values: document.values,
            sequences: document.sequences,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_schema::{DType, SchemaNode};

    fn table() -> SlotTable {
        let schema = SchemaNode::list(SchemaNode::scalar(DType::Int16).build().unwrap())
            .build()
            .unwrap();
        let mut table = SlotTable::new();
        table.schema = Some(PersistedSchema {
            hash: schema.hash(),
            json: schema.to_json(),
        });
        table.resize_sequence(&"".parse().unwrap(), 1);
        table.set_value(&"[0]".parse().unwrap(), Value::Int(-4));
        table
    }

    #[test]
    fn test_document_roundtrip() {
        let codec = JsonCodec::new().pretty(false);
        let bytes = codec.encode("mem", &table()).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with(r#"{"format":"strata","version":1"#));

        let decoded = codec.decode("mem", &bytes).unwrap();
        let schema = decoded.schema.as_ref().unwrap();
        assert_eq!(SchemaNode::from_json(&schema.json).unwrap().hash(), schema.hash);
        assert_eq!(decoded.values, table().values);
        assert_eq!(decoded.sequences, table().sequences);
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        let mut table = SlotTable::new();
        table.set_value(&"x".parse().unwrap(), Value::Float(f64::NAN));
        let err = JsonCodec::new().encode("mem", &table).unwrap_err();
        assert!(matches!(err, BackendError::Encoding { .. }));
        assert!(err.to_string().contains("'x'"));
    }

    #[test]
    fn test_rejects_foreign_documents() {
        let codec = JsonCodec::new();
        for doc in [
            r#"{"format":"other","version":1}"#,
            r#"{"format":"strata","version":99}"#,
            r#"{"format":"strata","version":1,"schema":{}}"#,
            "[]",
        ] {
            assert!(matches!(
                codec.decode("x.json", doc.as_bytes()),
                Err(BackendError::Corrupt { .. })
            ));
        }
    }
}

//! CSV record encoding of slot tables

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strata_data::{BackendError, BackendResult, PersistedSchema, SlotTable, TableCodec, Value};
use strata_schema::SchemaHash;
use tracing::{debug, trace};

/// Kind of a CSV record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    Schema,
    Hash,
    Sequence,
    Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Record {
    record: RecordType,
    key: String,
    payload: String,
}

/// Codec writing one CSV row per schema, hash, sequence, and value
#[derive(Debug, Clone)]
pub struct CsvCodec {
    delimiter: u8,
}

impl Default for CsvCodec {
    fn default() -> Self {
        Self { delimiter: b',' }
    }
}

impl CsvCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set delimiter character
    ///
    /// Only ASCII delimiters are supported; others fall back to `,`.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = u8::try_from(delimiter)
            .ok()
            .filter(u8::is_ascii)
            .unwrap_or(b',');
        self
    }
}

impl TableCodec for CsvCodec {
    fn encode(&self, location: &str, table: &SlotTable) -> BackendResult<Vec<u8>> {
        let encoding = |reason: String| BackendError::encoding(location, reason);
        if let Some(slot) = table.first_non_finite() {
            return Err(encoding(format!("slot '{slot}' holds a non-finite float")));
        }
        let mut writer = csv::WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_writer(Vec::new());

        let mut records = Vec::new();
        if let Some(schema) = &table.schema {
            records.push(Record {
                record: RecordType::Schema,
                key: String::new(),
                payload: schema.json.clone(),
            });
            records.push(Record {
                record: RecordType::Hash,
                key: String::new(),
                payload: schema.hash.to_hex(),
            });
        }
        for (slot, len) in &table.sequences {
            records.push(Record {
                record: RecordType::Sequence,
                key: slot.clone(),
                payload: len.to_string(),
            });
        }
        for (slot, value) in &table.values {
            records.push(Record {
                record: RecordType::Value,
                key: slot.clone(),
                payload: serde_json::to_string(value).map_err(|e| encoding(e.to_string()))?,
            });
        }

        for record in &records {
            writer
                .serialize(record)
                .map_err(|e| encoding(e.to_string()))?;
            trace!(?record.record, key = %record.key, "Wrote CSV row");
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| encoding(e.to_string()))?;
        debug!(location, record_count = records.len(), "Finished writing CSV");
        Ok(bytes)
    }

    fn decode(&self, location: &str, bytes: &[u8]) -> BackendResult<SlotTable> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .from_reader(bytes);

        let mut schema_json = None;
        let mut hash = None;
        let mut sequences = BTreeMap::new();
        let mut values = BTreeMap::new();

        for (index, result) in reader.deserialize::<Record>().enumerate() {
            // Line 1 is the header row.
            let line = index + 2;
            let corrupt = |reason: String| {
                BackendError::corrupt(location, format!("line {line}: {reason}"))
            };
            let record = result.map_err(|e| corrupt(e.to_string()))?;
            match record.record {
                RecordType::Schema => schema_json = Some(record.payload),
                RecordType::Hash => {
                    let parsed: SchemaHash = record
                        .payload
                        .parse()
                        .map_err(|e: strata_schema::Error| corrupt(e.to_string()))?;
                    hash = Some(parsed);
                }
                RecordType::Sequence => {
                    let len: usize = record
                        .payload
                        .parse()
                        .map_err(|e: std::num::ParseIntError| corrupt(e.to_string()))?;
                    sequences.insert(record.key, len);
                }
                RecordType::Value => {
                    let value: Value = serde_json::from_str(&record.payload)
                        .map_err(|e| corrupt(e.to_string()))?;
                    values.insert(record.key, value);
                }
            }
        }

        let schema = match (hash, schema_json) {
            (Some(hash), Some(json)) => Some(PersistedSchema { hash, json }),
            (None, None) => None,
            _ => {
                return Err(BackendError::corrupt(
                    location,
                    "schema and hash records must be stored together",
                ));
            }
        };
        Ok(SlotTable {
            schema,
            values,
            sequences,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SlotTable {
        let mut table = SlotTable::new();
        table.resize_sequence(&"runs".parse().unwrap(), 2);
        table.set_value(&"runs[0].note".parse().unwrap(), Value::String("a, \"quoted\"\nline".into()));
        table.set_value(&"runs[1].n".parse().unwrap(), Value::UInt(9));
        table
    }

    #[test]
    fn test_record_layout() {
        let bytes = CsvCodec::new().encode("mem", &sample()).unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("record,key,payload"));
        assert_eq!(lines.next(), Some("sequence,runs,2"));
    }

    #[test]
    fn test_roundtrip_with_delimiter() {
        let codec = CsvCodec::new().with_delimiter(';');
        let bytes = codec.encode("mem", &sample()).unwrap();
        assert_eq!(codec.decode("mem", &bytes).unwrap(), sample());
    }

    #[test]
    fn test_bad_rows_report_line() {
        let text = "record,key,payload\nsequence,runs,2\nsequence,runs,many\n";
        let err = CsvCodec::new().decode("x.csv", text.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("line 3"));

        let unknown = "record,key,payload\nblob,x,1\n";
        assert!(CsvCodec::new().decode("x.csv", unknown.as_bytes()).is_err());
    }
}

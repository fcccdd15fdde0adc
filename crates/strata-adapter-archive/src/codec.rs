//! Tar + zstd encoding of slot tables

use std::collections::BTreeMap;
use std::io::{self, Read};
use strata_data::{BackendError, BackendResult, PersistedSchema, SlotTable, TableCodec, Value};
use strata_schema::SchemaHash;
use tar::{Archive, Builder, Header};
use tracing::trace;

const SCHEMA_ENTRY: &str = "_schema.json";
const HASH_ENTRY: &str = "_hash";
const SEQUENCES_ENTRY: &str = "_sequences.json";
const VALUES_DIR: &str = "values/";
const VALUE_SUFFIX: &str = ".json";

/// Codec writing a zstd-compressed tar archive
#[derive(Debug, Clone)]
pub struct ArchiveCodec {
    level: i32,
}

impl Default for ArchiveCodec {
    fn default() -> Self {
        Self {
            level: zstd::DEFAULT_COMPRESSION_LEVEL,
        }
    }
}

impl ArchiveCodec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Zstandard compression level
    #[must_use]
    pub fn with_level(mut self, level: i32) -> Self {
        self.level = level;
        self
    }

    pub fn level(&self) -> i32 {
        self.level
    }
}

fn append(builder: &mut Builder<Vec<u8>>, path: &str, data: &[u8]) -> io::Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(data.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();
    builder.append_data(&mut header, path, data)
}

impl TableCodec for ArchiveCodec {
    fn encode(&self, location: &str, table: &SlotTable) -> BackendResult<Vec<u8>> {
        let io_err = |e: io::Error| BackendError::from_io(location, e);
        let json_err = |e: serde_json::Error| BackendError::encoding(location, e.to_string());
        if let Some(slot) = table.first_non_finite() {
            return Err(BackendError::encoding(
                location,
                format!("slot '{slot}' holds a non-finite float"),
            ));
        }

        let mut builder = Builder::new(Vec::new());
        if let Some(schema) = &table.schema {
            append(&mut builder, SCHEMA_ENTRY, schema.json.as_bytes()).map_err(io_err)?;
            append(&mut builder, HASH_ENTRY, schema.hash.to_hex().as_bytes()).map_err(io_err)?;
        }
        let sequences = serde_json::to_vec(&table.sequences).map_err(json_err)?;
        append(&mut builder, SEQUENCES_ENTRY, &sequences).map_err(io_err)?;
        for (slot, value) in &table.values {
            let data = serde_json::to_vec(value).map_err(json_err)?;
            let path = format!("{VALUES_DIR}{slot}{VALUE_SUFFIX}");
            append(&mut builder, &path, &data).map_err(io_err)?;
        }

        let tar = builder.into_inner().map_err(io_err)?;
        let compressed = zstd::encode_all(tar.as_slice(), self.level).map_err(io_err)?;
        trace!(
            location,
            entries = table.values.len(),
            raw = tar.len(),
            compressed = compressed.len(),
            "Encoded archive"
        );
        Ok(compressed)
    }

    fn decode(&self, location: &str, bytes: &[u8]) -> BackendResult<SlotTable> {
        let corrupt = |reason: String| BackendError::corrupt(location, reason);
        let tar = zstd::decode_all(bytes).map_err(|e| corrupt(e.to_string()))?;
        let mut archive = Archive::new(tar.as_slice());

        let mut schema_json = None;
        let mut hash = None;
        let mut sequences = BTreeMap::new();
        let mut values = BTreeMap::new();

        for entry in archive.entries().map_err(|e| corrupt(e.to_string()))? {
            let mut entry = entry.map_err(|e| corrupt(e.to_string()))?;
            let path = entry
                .path()
                .map_err(|e| corrupt(e.to_string()))?
                .to_string_lossy()
                .into_owned();
            let mut contents = Vec::new();
            entry
                .read_to_end(&mut contents)
                .map_err(|e| corrupt(e.to_string()))?;

            match path.as_str() {
                SCHEMA_ENTRY => {
                    let json = String::from_utf8(contents)
                        .map_err(|e| corrupt(format!("{SCHEMA_ENTRY}: {e}")))?;
                    schema_json = Some(json);
                }
                HASH_ENTRY => {
                    let text = String::from_utf8_lossy(&contents);
                    let parsed: SchemaHash = text
                        .trim()
                        .parse()
                        .map_err(|e: strata_schema::Error| corrupt(e.to_string()))?;
                    hash = Some(parsed);
                }
                SEQUENCES_ENTRY => {
                    sequences = serde_json::from_slice(&contents)
                        .map_err(|e| corrupt(format!("{SEQUENCES_ENTRY}: {e}")))?;
                }
                other => {
                    let Some(slot) = other
                        .strip_prefix(VALUES_DIR)
                        .and_then(|rest| rest.strip_suffix(VALUE_SUFFIX))
                    else {
                        trace!(location, entry = other, "Skipping unknown archive entry");
                        continue;
                    };
                    let value: Value = serde_json::from_slice(&contents)
                        .map_err(|e| corrupt(format!("{other}: {e}")))?;
                    values.insert(slot.to_string(), value);
                }
            }
        }

        let schema = match (hash, schema_json) {
            (Some(hash), Some(json)) => Some(PersistedSchema { hash, json }),
            (None, None) => None,
            _ => {
                return Err(corrupt(format!(
                    "{SCHEMA_ENTRY} and {HASH_ENTRY} must be stored together"
                )));
            }
        };
        Ok(SlotTable {
            schema,
            values,
            sequences,
        })
    }
}

//! Save/load cycles through every bundled backend

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;
use std::sync::Arc;
use strata_data::{BackendError, DataNode, FieldPath, Input, Value, Visitor, walk};
use strata_schema::{DType, SchemaNode};
use strata_storage::{Error, LoadOptions, PseudoStorage, StorageConfig, StorageState};
use tracing_subscriber::{EnvFilter, fmt};

fn setup_logging() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("strata_storage=debug".parse().unwrap()))
        .with_test_writer()
        .try_init();
}

fn location(dir: &Path, name: &str) -> String {
    dir.join(name).to_string_lossy().into_owned()
}

fn experiment_schema() -> Result<Arc<SchemaNode>> {
    let run = SchemaNode::compilation()
        .field("label", SchemaNode::string().max_length(8).build()?)
        .field("gain", SchemaNode::scalar(DType::Float32).min_value(0.0).build()?)
        .field("raw", SchemaNode::bytes().build()?)
        .build()?;
    let schema = SchemaNode::compilation()
        .field("time", SchemaNode::array(DType::Float64).unit("s").build()?)
        .field(
            "voltage",
            SchemaNode::array(DType::Float64).unit("V").depends_on(["time"]).build()?,
        )
        .field("samples", SchemaNode::scalar(DType::UInt32).max_value(1000.0).build()?)
        .field("enabled", SchemaNode::Bool)
        .field("offset", SchemaNode::scalar(DType::Int64).build()?)
        .field("day", SchemaNode::date().build()?)
        .field("alarm", SchemaNode::time().build()?)
        .field("started", SchemaNode::datetime().build()?)
        .field("comment", SchemaNode::string().build()?)
        .field("runs", SchemaNode::list(run).build()?)
        .optional("comment")
        .build()?;
    Ok(Arc::new(schema))
}

fn populate(data: &mut DataNode) -> Result<()> {
    data.replace(Input::map([
        ("time", Input::from(vec![0.0, 0.1, 0.2])),
        ("voltage", Input::from(vec![1.5, -2.25, 3.0])),
        ("samples", Input::from(3u32)),
        ("enabled", Input::from(true)),
        ("offset", Input::from(-42i64)),
        ("day", Input::from(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())),
        ("alarm", Input::from(NaiveTime::from_hms_milli_opt(6, 30, 0, 250).unwrap())),
        (
            "started",
            Input::from(
                NaiveDate::from_ymd_opt(2024, 2, 29)
                    .and_then(|day| day.and_hms_opt(23, 59, 58))
                    .unwrap(),
            ),
        ),
    ]))?;
    let runs = data.field_mut("runs")?;
    runs.append_with(Input::map([
        ("label", Input::from("warmup")),
        ("gain", Input::from(0.5)),
        ("raw", Input::from(vec![1u8, 2, 3])),
    ]))?;
    runs.append()?.field_mut("label")?.set("main")?;
    Ok(())
}

/// Every node's path with its emptiness, completeness, and item value
#[derive(Default)]
struct Snapshot(Vec<(String, bool, bool, Option<Value>)>);

impl Visitor for Snapshot {
    fn visit(&mut self, node: &DataNode, path: &FieldPath) {
        let value = node.as_item().and_then(|item| item.value()).cloned();
        self.0
            .push((path.to_string(), node.is_empty(), node.is_complete(), value));
    }
}

fn snapshot(data: &DataNode) -> Vec<(String, bool, bool, Option<Value>)> {
    let mut snapshot = Snapshot::default();
    walk(data, &mut snapshot);
    snapshot.0
}

#[test]
fn test_roundtrip_through_every_file_backend() -> Result<()> {
    setup_logging();
    let dir = tempfile::tempdir()?;
    let schema = experiment_schema()?;

    for name in ["run.json", "run.tar.zst", "run.csv"] {
        let location = location(dir.path(), name);
        let mut storage = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default())?;
        populate(storage.data_mut()?)?;
        let expected = snapshot(storage.data()?);
        storage.save()?;
        storage.close();

        let loaded = strata_storage::load(&location, LoadOptions::new().require_node(Arc::clone(&schema)))?;
        assert_eq!(snapshot(loaded.data()?), expected, "backend for {name}");
        assert!(Arc::ptr_eq(loaded.schema()?, &schema));
        assert_eq!(loaded.accepted_index(), Some(0));
        assert_eq!(loaded.state(), StorageState::Open);
        assert!(!loaded.is_complete()?);
        assert_eq!(loaded.schema_hash(), schema.hash());
    }
    Ok(())
}

#[test]
fn test_load_without_requirements_rebuilds_schema() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "any.json");
    let schema = experiment_schema()?;

    let mut storage = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default())?;
    populate(storage.data_mut()?)?;
    storage.save()?;
    drop(storage);

    let loaded = strata_storage::load(&location, LoadOptions::new())?;
    assert_eq!(loaded.accepted_index(), None);
    assert!(!Arc::ptr_eq(loaded.schema()?, &schema));
    assert_eq!(loaded.schema()?.hash(), schema.hash());
    assert_eq!(
        loaded.data()?.navigate("runs[0].label")?.value()?.as_str(),
        Some("warmup")
    );
    Ok(())
}

#[test]
fn test_schema_compatibility_gate() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "gate.json");
    let schema = experiment_schema()?;
    let other = SchemaNode::compilation()
        .field("samples", SchemaNode::scalar(DType::UInt32).max_value(500.0).build()?)
        .build()?;

    let mut storage = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default())?;
    populate(storage.data_mut()?)?;
    storage.save()?;
    drop(storage);

    let err = strata_storage::load(&location, LoadOptions::new().require_schema(other.hash())).unwrap_err();
    match err {
        Error::IncompatibleSchema { found, accepted, .. } => {
            assert_eq!(found, schema.hash());
            assert_eq!(accepted, 1);
        }
        other => panic!("expected incompatible schema, got {other}"),
    }

    let loaded = strata_storage::load(
        &location,
        LoadOptions::new()
            .require_schema(other.hash())
            .accept_alternative(schema.hash()),
    )?;
    assert_eq!(loaded.accepted_index(), Some(1));
    Ok(())
}

#[test]
fn test_memory_storage_cannot_be_loaded() {
    let err = strata_storage::load(":memory:", LoadOptions::new()).unwrap_err();
    assert!(matches!(err, Error::Backend(BackendError::NotFound { .. })));
}

#[test]
fn test_create_respects_overwrite() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "once.csv");
    let schema = experiment_schema()?;

    let mut storage = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default())?;
    storage.save()?;
    drop(storage);

    let err = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default()).unwrap_err();
    assert!(matches!(err, Error::Backend(BackendError::AlreadyExists { .. })));
    let config = StorageConfig::default().with_overwrite(true);
    assert!(strata_storage::create(&location, schema, &config).is_ok());

    let unknown = strata_storage::create("run.h5", SchemaNode::Bool, &StorageConfig::default()).unwrap_err();
    assert!(matches!(unknown, Error::AutodetectBackend { .. }));
    Ok(())
}

#[test]
fn test_invalid_data_requires_opt_out_on_load() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "invalid.tar.zst");
    let schema = experiment_schema()?;

    let config = StorageConfig::default().with_validate_on_save(false);
    let mut storage = strata_storage::create(&location, Arc::clone(&schema), &config)?;
    populate(storage.data_mut()?)?;
    storage.data_mut()?.field_mut("voltage")?.set(vec![1.0, 2.0])?;
    storage.save()?;
    drop(storage);

    let err = strata_storage::load(&location, LoadOptions::new()).unwrap_err();
    assert!(err.to_string().contains("voltage"), "{err}");

    let loaded = strata_storage::load(&location, LoadOptions::new().require_valid(false))?;
    assert!(loaded.validate().is_err());
    Ok(())
}

#[test]
fn test_shrinking_a_list_drops_stale_slots() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "shrink.json");
    let schema = experiment_schema()?;

    let mut storage = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default())?;
    populate(storage.data_mut()?)?;
    storage.save()?;

    storage
        .data_mut()?
        .field_mut("runs")?
        .replace(Input::seq([Input::map([("label", "only")])]))?;
    storage.data_mut()?.field_mut("samples")?.clear();
    storage.save()?;
    storage.close();

    let loaded = strata_storage::load(&location, LoadOptions::new().require_node(schema))?;
    let data = loaded.data()?;
    assert_eq!(data.field("runs")?.len(), 1);
    assert!(data.navigate("runs[0].gain")?.is_empty());
    assert!(data.field("samples")?.is_empty());
    Ok(())
}

#[test]
fn test_empty_list_elements_survive_reload() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let schema = experiment_schema()?;

    for name in ["blank.json", "blank.tar.zst", "blank.csv"] {
        let location = location(dir.path(), name);
        let mut storage = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default())?;
        let runs = storage.data_mut()?.field_mut("runs")?;
        for _ in 0..4 {
            runs.append()?;
        }
        storage.save()?;
        storage.close();

        let loaded = strata_storage::load(&location, LoadOptions::new().require_node(Arc::clone(&schema)))?;
        let runs = loaded.data()?.field("runs")?;
        assert_eq!(runs.len(), 4, "{name}");
        assert!(runs.is_empty(), "{name}");
    }
    Ok(())
}

#[test]
fn test_oversized_list_length_is_corrupt() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "tampered.json");
    let schema = experiment_schema()?;

    let mut storage = strata_storage::create(&location, Arc::clone(&schema), &StorageConfig::default())?;
    populate(storage.data_mut()?)?;
    storage.save()?;
    storage.close();

    let mut document: serde_json::Value = serde_json::from_slice(&std::fs::read(&location)?)?;
    document["sequences"]["runs"] = serde_json::Value::from(u64::MAX);
    std::fs::write(&location, serde_json::to_vec(&document)?)?;

    let err = strata_storage::load(&location, LoadOptions::new().require_node(Arc::clone(&schema))).unwrap_err();
    assert!(matches!(err, Error::Corrupt { .. }), "{err}");
    assert!(err.to_string().contains("runs"), "{err}");

    // A lower limit rejects lengths that real data reaches
    let strict = StorageConfig::default().with_max_list_length(1);
    document["sequences"]["runs"] = serde_json::Value::from(2);
    std::fs::write(&location, serde_json::to_vec(&document)?)?;
    let err = strata_storage::load(&location, LoadOptions::new().with_config(strict)).unwrap_err();
    assert!(matches!(err, Error::Corrupt { .. }), "{err}");
    Ok(())
}

#[test]
fn test_create_from_memory_collection() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let schema = experiment_schema()?;

    let mut scratch = strata_storage::create(":memory:", Arc::clone(&schema), &StorageConfig::default())?;
    populate(scratch.data_mut()?)?;

    let location = location(dir.path(), "final.json");
    let mut storage = strata_storage::create_from(&location, scratch.data()?, &StorageConfig::default())?;
    assert_eq!(storage.state(), StorageState::Open);
    storage.save()?;
    drop(storage);

    let loaded = strata_storage::load(&location, LoadOptions::new().require_node(Arc::clone(&schema)))?;
    assert_eq!(snapshot(loaded.data()?), snapshot(scratch.data()?));
    Ok(())
}

fn library_schema() -> Result<Arc<SchemaNode>> {
    Ok(Arc::new(
        SchemaNode::compilation()
            .field("gain", SchemaNode::scalar(DType::Float64).build()?)
            .field("label", SchemaNode::string().build()?)
            .build()?,
    ))
}

#[test]
fn test_owned_pseudo_storage_saves_on_ok_only() -> Result<()> {
    setup_logging();
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "library.json");
    let schema = library_schema()?;

    let mut pseudo = PseudoStorage::from_location(location.clone(), Arc::clone(&schema));
    pseudo.scoped(|data| -> Result<()> {
        data.field_mut("gain")?.set(1.0)?;
        Ok(())
    })?;
    assert!(!pseudo.is_open());

    let failed = pseudo.scoped(|data| -> Result<()> {
        data.field_mut("gain")?.set(2.0)?;
        anyhow::bail!("measurement aborted")
    });
    assert_eq!(failed.unwrap_err().to_string(), "measurement aborted");

    let loaded = strata_storage::load(&location, LoadOptions::new().require_node(schema))?;
    assert_eq!(loaded.data()?.field("gain")?.value()?.as_f64(), Some(1.0));
    Ok(())
}

#[test]
fn test_pseudo_storage_accepts_alternative_schema() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "old.csv");
    let old = Arc::new(
        SchemaNode::compilation()
            .field("gain", SchemaNode::scalar(DType::Float64).build()?)
            .build()?,
    );

    let mut storage = strata_storage::create(&location, Arc::clone(&old), &StorageConfig::default())?;
    storage.data_mut()?.field_mut("gain")?.set(0.25)?;
    storage.save()?;
    drop(storage);

    let mut pseudo = PseudoStorage::from_location(location.clone(), library_schema()?);
    assert!(matches!(pseudo.open(), Err(Error::IncompatibleSchema { .. })));

    let mut pseudo = PseudoStorage::from_location(location, library_schema()?).accept_alternative(Arc::clone(&old));
    pseudo.open()?;
    let storage = pseudo.storage().unwrap();
    assert_eq!(storage.accepted_index(), Some(1));
    assert!(Arc::ptr_eq(storage.schema()?, &old));
    Ok(())
}

#[test]
fn test_embedded_pseudo_storage_defers_to_owner() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let location = location(dir.path(), "app.json");
    let library = library_schema()?;
    let app_schema = SchemaNode::compilation()
        .field("operator", SchemaNode::string().build()?)
        .field("library", Arc::clone(&library))
        .build()?;

    let mut app = strata_storage::create(&location, app_schema, &StorageConfig::default())?;
    app.save()?;
    assert_eq!(app.state(), StorageState::Saved);

    let node = app.data_mut()?.field_mut("library")?;
    let mut pseudo = PseudoStorage::from_node(node, Arc::clone(&library));
    assert!(!pseudo.owns_storage());
    pseudo.scoped(|data| -> Result<()> {
        data.field_mut("label")?.set("embedded")?;
        Ok(())
    })?;
    assert!(pseudo.storage().is_none());

    assert_eq!(app.state(), StorageState::Open);
    assert_eq!(
        app.data()?.navigate("library.label")?.value()?.as_str(),
        Some("embedded")
    );

    // Nothing reached the backend until the owner saves.
    let before = strata_storage::load(&location, LoadOptions::new())?;
    assert!(before.data()?.navigate("library.label")?.is_empty());
    app.save()?;
    let after = strata_storage::load(&location, LoadOptions::new())?;
    assert_eq!(
        after.data()?.navigate("library.label")?.value()?.as_str(),
        Some("embedded")
    );
    Ok(())
}

//! Round-trip tests for the JSON backend

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use strata_adapter_json::JsonBackendFactory;
use strata_data::{ArrayData, BackendError, BackendFactory, FieldPath, NdArray, PersistedSchema, Value};
use strata_schema::SchemaNode;

fn every_kind() -> Vec<(FieldPath, Value)> {
    let date = NaiveDate::from_ymd_opt(2023, 12, 24).unwrap();
    let time = NaiveTime::from_hms_milli_opt(18, 30, 5, 250).unwrap();
    vec![
        ("flag".parse().unwrap(), Value::Bool(true)),
        ("count".parse().unwrap(), Value::Int(-42)),
        ("size".parse().unwrap(), Value::UInt(u64::MAX)),
        ("ratio".parse().unwrap(), Value::Float(0.125)),
        (
            "grid".parse().unwrap(),
            Value::Array(NdArray::new(vec![2, 2], ArrayData::Float(vec![1.0, 2.0, 3.0, 4.5])).unwrap()),
        ),
        ("blob".parse().unwrap(), Value::Bytes(vec![0, 255, 7])),
        ("label".parse().unwrap(), Value::String("ünïcode".into())),
        ("day".parse().unwrap(), Value::Date(date)),
        ("at".parse().unwrap(), Value::Time(time)),
        ("stamp".parse().unwrap(), Value::DateTime(date.and_time(time))),
    ]
}

#[test]
fn test_every_value_kind_roundtrips() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.json");
    let location = path.to_str().unwrap();
    let factory = JsonBackendFactory::new();
    let schema = SchemaNode::Bool;

    let mut backend = factory.create(location, false)?;
    backend.write_schema(PersistedSchema {
        hash: schema.hash(),
        json: schema.to_json(),
    })?;
    for (slot, value) in every_kind() {
        backend.write_value(&slot, &value)?;
    }
    backend.resize_sequence(&"items".parse()?, 3)?;
    backend.flush()?;
    drop(backend);

    assert!(factory.exists(location));
    let backend = factory.open(location)?;
    assert_eq!(backend.read_schema()?.map(|s| s.hash), Some(schema.hash()));
    for (slot, value) in every_kind() {
        assert_eq!(backend.read_value(&slot)?, Some(value), "slot {slot}");
    }
    assert_eq!(backend.sequence_len(&"items".parse()?)?, 3);
    assert_eq!(backend.read_value(&"missing".parse()?)?, None);
    Ok(())
}

#[test]
fn test_create_does_not_clobber() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("data.json");
    let location = path.to_str().unwrap();
    let factory = JsonBackendFactory::new();

    let mut backend = factory.create(location, false)?;
    backend.flush()?;
    drop(backend);

    assert!(matches!(
        factory.create(location, false),
        Err(BackendError::AlreadyExists { .. })
    ));
    assert!(factory.create(location, true).is_ok());
    assert!(matches!(
        factory.open(dir.path().join("nope.json").to_str().unwrap()),
        Err(BackendError::NotFound { .. })
    ));
    Ok(())
}

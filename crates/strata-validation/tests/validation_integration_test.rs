//! Integration tests for strata-validation
//!
//! These tests validate realistic measurement trees end to end.

use strata_data::{DataNode, Input};
use strata_schema::{DType, SchemaNode};
use strata_validation::{
    ConstraintKind, Validate, ValidationConfig, ValidationError, Validator,
};

fn recording_schema() -> SchemaNode {
    let sweep = SchemaNode::compilation()
        .field(
            "frequency",
            SchemaNode::array(DType::Float64).unit("Hz").build().unwrap(),
        )
        .field(
            "gain",
            SchemaNode::array(DType::Float64)
                .unit("dB")
                .max_value(60.0)
                .depends_on(["frequency"])
                .build()
                .unwrap(),
        )
        .build()
        .unwrap();
    SchemaNode::compilation()
        .field(
            "channel",
            SchemaNode::scalar(DType::UInt8).max_value(100.0).build().unwrap(),
        )
        .field("label", SchemaNode::string().max_length(8).build().unwrap())
        .field("sweeps", SchemaNode::list(sweep).build().unwrap())
        .optional("label")
        .build()
        .unwrap()
}

#[test]
fn test_bound_violation_names_field_and_bound() {
    let mut data = DataNode::from_schema(recording_schema());
    data.field_mut("channel").unwrap().set(99).unwrap();
    assert!(data.validate().is_ok());

    data.field_mut("channel").unwrap().set(123).unwrap();
    let err = data.validate().unwrap_err();
    let [failure] = err.failures() else {
        panic!("expected one failure, got {err}");
    };
    assert_eq!(failure.path.to_string(), "channel");
    assert_eq!(
        failure.error,
        ValidationError::Constraint {
            constraint: ConstraintKind::MaxValue,
            message: "Maximum value exceeded.".to_string(),
            expected: "100".to_string(),
            got: "123".to_string(),
        }
    );
}

#[test]
fn test_dependency_violation_inside_list() {
    let mut data = DataNode::from_schema(recording_schema());
    let sweeps = data.field_mut("sweeps").unwrap();
    sweeps
        .append_with(Input::map([
            ("frequency", vec![1.0, 10.0, 100.0]),
            ("gain", vec![0.0, 3.0, 6.0]),
        ]))
        .unwrap();
    sweeps
        .append_with(Input::map([
            ("frequency", vec![1.0, 10.0]),
            ("gain", vec![0.0, 3.0, 6.0]),
        ]))
        .unwrap();

    let err = data.validate().unwrap_err();
    let [failure] = err.failures() else {
        panic!("expected one failure, got {err}");
    };
    assert_eq!(failure.path.to_string(), "sweeps[1].gain");
    match &failure.error {
        ValidationError::Dependency {
            dependent,
            independent,
            expected,
            got,
            ..
        } => {
            assert_eq!(dependent, "gain");
            assert_eq!(independent, "frequency");
            assert_eq!((*expected, *got), (2, 3));
        }
        other => panic!("unexpected error {other}"),
    }
    assert!(err.to_string().contains("sweeps[1].gain"));
}

#[test]
fn test_multiple_failures_reported_together() {
    let mut data = DataNode::from_schema(recording_schema());
    data.replace(Input::map([
        ("channel", Input::from(200)),
        ("label", Input::from("far too long")),
    ]))
    .unwrap();

    let report = Validator::new().report(&data);
    assert_eq!(report.len(), 2);
    assert!(!report.is_valid());

    let strict = Validator::with_config(ValidationConfig::fail_fast());
    assert_eq!(strict.report(&data).len(), 1);
}

#[test]
fn test_optional_fields_validated_when_populated() -> anyhow::Result<()> {
    let mut data = DataNode::from_schema(recording_schema());
    data.field_mut("channel")?.set(1)?;
    assert!(data.is_complete());
    data.validate()?;

    data.field_mut("label")?.set("toolonglabel")?;
    assert!(data.validate().is_err());
    Ok(())
}

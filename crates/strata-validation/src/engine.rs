//! Validation engine

use crate::report::ValidationReport;
use crate::rules;
use crate::{FieldFailure, Result, ValidationError};
use serde::{Deserialize, Serialize};
use strata_data::{DataNode, FieldPath};
use tracing::{debug, trace};

/// Validation configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Continue validation after errors (collect all)
    pub continue_on_error: bool,
    /// Maximum errors before stopping (0 = unlimited)
    pub max_errors: usize,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            continue_on_error: true,
            max_errors: 0,
        }
    }
}

impl ValidationConfig {
    /// Stop at the first failure
    #[must_use]
    pub fn fail_fast() -> Self {
        Self {
            continue_on_error: false,
            max_errors: 0,
        }
    }

    #[must_use]
    pub fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

/// Stateless validator for data trees
#[derive(Debug, Clone, Default)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a validator with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create with specific configuration
    pub fn with_config(config: ValidationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Validate a tree, failing with the leaf error for item nodes and an
    /// aggregate of every failing path for groups
    ///
    /// # Errors
    ///
    /// Returns the [`ValidationError`] describing
    /// every collected failure.
    pub fn validate(&self, node: &DataNode) -> Result<()> {
        self.report(node).into_result()
    }

    /// Collect the failures of a tree without turning them into an error
    pub fn report(&self, node: &DataNode) -> ValidationReport {
        let mut failures = Vec::new();
        self.check(node, &FieldPath::root(), &mut failures);
        debug!(
            schema_hash = %node.schema_hash(),
            failures = failures.len(),
            "Validated data tree"
        );
        ValidationReport::new(failures)
    }

    fn is_full(&self, failures: &[FieldFailure]) -> bool {
        (!self.config.continue_on_error && !failures.is_empty())
            || (self.config.max_errors > 0 && failures.len() >= self.config.max_errors)
    }

    fn record(&self, failures: &mut Vec<FieldFailure>, path: FieldPath, error: ValidationError) {
        if self.is_full(failures) {
            return;
        }
        trace!(path = %path, error = %error, "Validation failure");
        failures.push(FieldFailure { path, error });
    }

    fn check(&self, node: &DataNode, path: &FieldPath, failures: &mut Vec<FieldFailure>) {
        if self.is_full(failures) {
            return;
        }
        match node {
            DataNode::Item(item) => {
                if let Some(value) = item.value() {
                    if let Err(error) = rules::validate_item(item.schema(), value) {
                        self.record(failures, path.clone(), error);
                    }
                }
            }
            DataNode::Compilation(compilation) => {
                for (name, child) in compilation.fields() {
                    self.check(child, &path.child(name), failures);
                }
                for (name, error) in rules::validate_dependencies(compilation) {
                    self.record(failures, path.child(name), error);
                }
            }
            DataNode::List(list) => {
                let len = list.items().len();
                if len > 0 {
                    if let Err(error) = rules::validate_list_length(list.schema(), len) {
                        self.record(failures, path.clone(), error);
                    }
                }
                for (index, child) in list.items().iter().enumerate() {
                    self.check(child, &path.index(index), failures);
                }
            }
        }
    }
}

/// Validation with the default configuration, as a method on data nodes
pub trait Validate {
    /// # Errors
    ///
    /// Returns the validation failure of this node or its descendants.
    fn validate(&self) -> Result<()>;
}

impl Validate for DataNode {
    fn validate(&self) -> Result<()> {
        Validator::new().validate(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strata_data::Input;
    use strata_schema::{DType, SchemaNode};

    fn bounded_pair() -> DataNode {
        let bounded = SchemaNode::scalar(DType::Int32).max_value(10.0).build().unwrap();
        let schema = SchemaNode::compilation()
            .field("a", bounded.clone())
            .field("b", bounded)
            .build()
            .unwrap();
        let mut node = DataNode::from_schema(schema);
        node.replace(Input::map([("a", 11), ("b", 12)])).unwrap();
        node
    }

    #[test]
    fn test_empty_tree_is_valid() {
        let schema = SchemaNode::compilation()
            .field("x", SchemaNode::scalar(DType::Int8).min_value(1.0).build().unwrap())
            .build()
            .unwrap();
        let node = DataNode::from_schema(schema);
        assert!(Validator::new().validate(&node).is_ok());
        assert!(node.validate().is_ok());
    }

    #[test]
    fn test_collects_all_failures() {
        let err = Validator::new().validate(&bounded_pair()).unwrap_err();
        let paths: Vec<_> = err.failures().iter().map(|f| f.path.to_string()).collect();
        assert_eq!(paths, ["a", "b"]);
        let text = err.to_string();
        assert!(text.contains("Node \"a\" failed validation"));
        assert!(text.contains("Node \"b\" failed validation"));
    }

    #[test]
    fn test_fail_fast_and_max_errors() {
        let node = bounded_pair();
        let fast = Validator::with_config(ValidationConfig::fail_fast());
        assert_eq!(fast.report(&node).len(), 1);

        let capped = Validator::with_config(ValidationConfig::default().with_max_errors(1));
        assert_eq!(capped.report(&node).len(), 1);
    }

    #[test]
    fn test_item_root_fails_with_leaf_error() {
        let mut node = DataNode::from_schema(
            SchemaNode::scalar(DType::Float64).max_value(1.0).build().unwrap(),
        );
        node.set(2.0).unwrap();
        let err = node.validate().unwrap_err();
        assert!(matches!(err, ValidationError::Constraint { .. }));
    }

    #[test]
    fn test_validation_is_stateless() {
        let mut node = bounded_pair();
        node.replace(Input::map([("a", 1), ("b", 2)])).unwrap();
        assert!(node.validate().is_ok());
        node.replace(Input::map([("b", 20)])).unwrap();
        assert!(node.validate().is_err());
    }

    #[test]
    fn test_nested_paths_are_flattened() {
        let element = SchemaNode::compilation()
            .field("v", SchemaNode::scalar(DType::Int32).max_value(0.0).build().unwrap())
            .build()
            .unwrap();
        let schema = SchemaNode::compilation()
            .field("items", SchemaNode::list(element).max_length(1).build().unwrap())
            .build()
            .unwrap();
        let mut node = DataNode::from_schema(schema);
        node.replace(Input::map([(
            "items",
            Input::seq([Input::map([("v", 0)]), Input::map([("v", 5)])]),
        )]))
        .unwrap();

        let err = node.validate().unwrap_err();
        let paths: Vec<_> = err.failures().iter().map(|f| f.path.to_string()).collect();
        assert_eq!(paths, ["items", "items[1].v"]);
        assert!(err.failures().iter().all(|f| f.error.failures().is_empty()));
    }

    #[test]
    fn test_config_from_yaml() {
        let config: ValidationConfig = serde_yaml::from_str("max_errors: 5").unwrap();
        assert!(config.continue_on_error);
        assert_eq!(config.max_errors, 5);
    }
}

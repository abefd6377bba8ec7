//! JSON Schema (draft 4) validation of registration responses.
//!
//! Thin layer over the `jsonschema` crate: compiles a schema, collects every
//! error with its instance and schema paths, and picks the one worth
//! showing to a user.

use std::fmt;

use ::jsonschema::error::ValidationErrorKind;
use ::jsonschema::{ValidationError, Validator};
use serde_json::Value;

/// A single failed keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Keyword that failed, e.g. `required`.
    pub keyword: String,
    /// Keys and indices leading to the offending value in the instance.
    pub instance_path: Vec<String>,
    /// Path to the failing keyword inside the schema.
    pub schema_path: Vec<String>,
    /// Property names involved: the missing one for `required`, the
    /// unexpected ones for `additionalProperties`.
    pub names: Vec<String>,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<ValidationError<'_>> for Violation {
    fn from(error: ValidationError<'_>) -> Self {
        let schema_path = pointer_tokens(error.schema_path.as_str());
        let names = match &error.kind {
            ValidationErrorKind::Required { property } => {
                vec![property.as_str().map_or_else(|| property.to_string(), str::to_string)]
            }
            ValidationErrorKind::AdditionalProperties { unexpected } => unexpected.clone(),
            _ => Vec::new(),
        };
        Self {
            keyword: schema_path.last().cloned().unwrap_or_default(),
            instance_path: pointer_tokens(error.instance_path.as_str()),
            schema_path,
            names,
            message: error.to_string(),
        }
    }
}

/// Compile `schema` as draft 4, checking it against the draft 4 metaschema.
///
/// # Errors
///
/// Returns the metaschema violation when `schema` is malformed.
pub fn compile(schema: &Value) -> Result<Validator, String> {
    ::jsonschema::draft4::new(schema).map_err(|e| {
        let at = e.instance_path.as_str();
        if at.is_empty() {
            e.to_string()
        } else {
            format!("{e} at {at}")
        }
    })
}

/// Every violation of `validator` by `instance`, in evaluation order.
#[must_use]
pub fn iter_errors(validator: &Validator, instance: &Value) -> Vec<Violation> {
    validator.iter_errors(instance).map(Violation::from).collect()
}

/// Pick the most relevant violation: the shallowest one, first in
/// evaluation order on ties.
#[must_use]
pub fn best_match(violations: Vec<Violation>) -> Option<Violation> {
    let mut best: Option<Violation> = None;
    for violation in violations {
        let better = best
            .as_ref()
            .map_or(true, |b| violation.instance_path.len() < b.instance_path.len());
        if better {
            best = Some(violation);
        }
    }
    best
}

/// Compile `schema` and validate `instance` against it.
///
/// The outer error is a malformed schema; the inner one the most relevant
/// violation of a well-formed schema.
///
/// # Errors
///
/// Returns the metaschema violation when `schema` is malformed.
pub fn validate(schema: &Value, instance: &Value) -> Result<Result<(), Violation>, String> {
    let validator = compile(schema)?;
    Ok(match best_match(iter_errors(&validator, instance)) {
        Some(violation) => Err(violation),
        None => Ok(()),
    })
}

/// Split a JSON pointer into its unescaped reference tokens.
fn pointer_tokens(pointer: &str) -> Vec<String> {
    pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn root() -> Value {
        json!({
            "type": "object",
            "additionalProperties": false,
            "properties": {
                "q1": {
                    "type": "object",
                    "additionalProperties": false,
                    "properties": {"value": {"enum": ["yes", "no"]}},
                    "required": ["value"]
                },
                "q2": {"type": "string", "minLength": 1}
            },
            "required": ["q1"]
        })
    }

    fn violation(instance: Value) -> Violation {
        validate(&root(), &instance).unwrap().unwrap_err()
    }

    #[test]
    fn valid_instance_passes() {
        assert!(validate(&root(), &json!({"q1": {"value": "yes"}, "q2": "x"}))
            .unwrap()
            .is_ok());
    }

    #[test]
    fn missing_root_property_reports_required() {
        let err = violation(json!({"q2": "x"}));
        assert_eq!(err.keyword, "required");
        assert_eq!(err.schema_path, vec!["required".to_string()]);
        assert!(err.instance_path.is_empty());
        assert_eq!(err.names, vec!["q1".to_string()]);
        assert!(err.message.contains("q1"));
    }

    #[test]
    fn extra_property_reports_additional_properties() {
        let err = violation(json!({"q1": {"value": "no"}, "q9": 1}));
        assert_eq!(err.keyword, "additionalProperties");
        assert_eq!(err.names, vec!["q9".to_string()]);
        assert_eq!(
            err.message,
            "Additional properties are not allowed ('q9' was unexpected)"
        );
    }

    #[test]
    fn nested_enum_failure_points_into_question() {
        let err = violation(json!({"q1": {"value": "maybe"}}));
        assert_eq!(err.keyword, "enum");
        assert_eq!(err.instance_path, vec!["q1".to_string(), "value".to_string()]);
        assert_eq!(err.schema_path[0], "properties");
        assert!(err.message.contains("maybe"));
    }

    #[test]
    fn shallow_errors_win() {
        let err = violation(json!({"q1": {"value": "maybe"}, "extra": true}));
        assert_eq!(err.keyword, "additionalProperties");
    }

    #[test]
    fn array_items_are_indexed() {
        let schema = json!({"type": "array", "items": {"enum": ["a"]}});
        let err = validate(&schema, &json!(["a", "b"])).unwrap().unwrap_err();
        assert_eq!(err.instance_path, vec!["1".to_string()]);
    }

    #[test]
    fn escaped_pointer_tokens_are_decoded() {
        assert_eq!(pointer_tokens(""), Vec::<String>::new());
        assert_eq!(pointer_tokens("/a~1b/c~0d"), vec!["a/b", "c~d"]);
    }

    #[test]
    fn malformed_schemas_are_rejected() {
        assert!(compile(&root()).is_ok());
        assert!(compile(&json!({"properties": {"a": {"type": "text"}}})).is_err());
        assert!(compile(&json!({"required": "a"})).is_err());
        assert!(compile(&json!({"minLength": -1})).is_err());
    }

    #[test]
    fn nullable_type_lists_are_accepted() {
        let schema = json!({"type": ["string", "null"]});
        assert!(validate(&schema, &json!(null)).unwrap().is_ok());
        assert!(validate(&schema, &json!("x")).unwrap().is_ok());
        assert!(validate(&schema, &json!(1)).unwrap().is_err());
    }
}

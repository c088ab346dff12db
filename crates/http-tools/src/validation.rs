//! Argument validation against a tool's advertised input schema.

use crate::catalog::CatalogTool;
use rmcp::model::JsonObject;
use serde_json::{Value, json};

/// A rejected set of arguments.
///
/// `data` is suitable as JSON-RPC error data:
/// `{ "type": "validation-errors", "violations": [...] }`.
#[derive(Debug, Clone)]
pub struct ValidationFailure {
    pub message: String,
    pub data: Value,
}

/// Validate call arguments for `tool`.
///
/// # Errors
///
/// Returns a [`ValidationFailure`] listing unknown parameters (with suggestions), missing required
/// parameters and schema constraint violations.
pub fn validate_arguments(tool: &CatalogTool, args: &JsonObject) -> Result<(), ValidationFailure> {
    let schema = tool.input_schema();
    let props = schema.get("properties").and_then(Value::as_object);
    let allows_additional = schema
        .get("additionalProperties")
        .is_some_and(|v| v.as_bool() == Some(true) || v.is_object());

    let mut violations: Vec<Value> = Vec::new();

    if let Some(props) = props
        && !allows_additional
    {
        let valid_params: Vec<&str> = props.keys().map(String::as_str).collect();
        for k in args.keys() {
            if props.contains_key(k) {
                continue;
            }
            violations.push(json!({
                "type": "invalid-parameter",
                "parameter": k,
                "suggestions": find_similar_strings(k, &valid_params),
                "validParameters": valid_params,
            }));
        }
    }

    for r in schema
        .get("required")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
    {
        if !args.contains_key(r) {
            violations.push(json!({
                "type": "missing-required-parameter",
                "parameter": r,
            }));
        }
    }

    if let Some(validator) = &tool.validator {
        let instance = Value::Object(args.clone());
        for e in validator.iter_errors(&instance) {
            // Reported above with a friendlier shape.
            if matches!(
                e.kind(),
                jsonschema::error::ValidationErrorKind::Required { .. }
            ) {
                continue;
            }
            violations.push(json!({
                "type": "constraint-violation",
                "message": e.to_string(),
                "instancePath": e.instance_path().to_string(),
            }));
        }
    }

    if violations.is_empty() {
        return Ok(());
    }

    let message = if let Some(v) = violations
        .iter()
        .find(|v| v.get("type").and_then(Value::as_str) == Some("invalid-parameter"))
    {
        let p = v.get("parameter").and_then(Value::as_str).unwrap_or("?");
        let suggestion = v
            .get("suggestions")
            .and_then(Value::as_array)
            .and_then(|arr| arr.first())
            .and_then(Value::as_str);
        match suggestion {
            Some(s) => format!("Invalid params: unknown parameter '{p}' (did you mean '{s}'?)"),
            None => format!("Invalid params: unknown parameter '{p}'"),
        }
    } else {
        format!(
            "Invalid params: validation failed with {} error(s)",
            violations.len()
        )
    };

    Err(ValidationFailure {
        message,
        data: json!({
            "type": "validation-errors",
            "violations": violations,
        }),
    })
}

fn find_similar_strings(unknown: &str, known: &[&str]) -> Vec<String> {
    let mut candidates: Vec<(f64, String)> = known
        .iter()
        .map(|k| (strsim::jaro(unknown, k), (*k).to_string()))
        .filter(|(score, _)| *score > 0.7)
        .collect();
    candidates.sort_by(|a, b| b.0.total_cmp(&a.0));
    candidates.into_iter().map(|(_, s)| s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolCatalog;
    use crate::config::ToolsFile;

    fn catalog() -> ToolCatalog {
        let doc: ToolsFile = serde_json::from_value(json!({"tools": [
            {
                "name": "findPetsByStatus",
                "inputSchema": {
                    "type": "object",
                    "properties": {
                        "status": {"type": "string", "enum": ["available", "pending", "sold"]},
                        "limit": {"type": "integer", "minimum": 1}
                    },
                    "required": ["status"]
                },
                "metadata": {"method": "GET", "path": "/pet/findByStatus"}
            },
            {
                "name": "freeform",
                "inputSchema": {"type": "object", "properties": {"a": {}}, "additionalProperties": true},
                "metadata": {"method": "POST", "path": "/free"}
            },
            {
                "name": "noSchema",
                "metadata": {"method": "GET", "path": "/any"}
            }
        ]}))
        .expect("tools document");
        ToolCatalog::new(doc.tools).expect("catalog")
    }

    fn args(v: Value) -> JsonObject {
        v.as_object().cloned().expect("object")
    }

    #[test]
    fn accepts_valid_arguments() {
        let catalog = catalog();
        let tool = catalog.get("findPetsByStatus").expect("tool");
        validate_arguments(tool, &args(json!({"status": "sold", "limit": 5}))).expect("valid");
    }

    #[test]
    fn unknown_parameter_gets_a_suggestion() {
        let catalog = catalog();
        let tool = catalog.get("findPetsByStatus").expect("tool");
        let err = validate_arguments(tool, &args(json!({"status": "sold", "statu": "x"})))
            .expect_err("unknown parameter");
        assert_eq!(
            err.message,
            "Invalid params: unknown parameter 'statu' (did you mean 'status'?)"
        );
        assert_eq!(err.data["type"], "validation-errors");
    }

    #[test]
    fn missing_required_and_constraint_violations_are_reported() {
        let catalog = catalog();
        let tool = catalog.get("findPetsByStatus").expect("tool");
        let err = validate_arguments(tool, &args(json!({"limit": 0}))).expect_err("invalid");

        let violations = err.data["violations"].as_array().expect("violations");
        assert!(violations.iter().any(|v| {
            v["type"] == "missing-required-parameter" && v["parameter"] == "status"
        }));
        assert!(
            violations
                .iter()
                .any(|v| v["type"] == "constraint-violation" && v["instancePath"] == "/limit")
        );
        assert_eq!(
            err.message,
            format!(
                "Invalid params: validation failed with {} error(s)",
                violations.len()
            )
        );
    }

    #[test]
    fn additional_properties_disable_unknown_parameter_checks() {
        let catalog = catalog();
        let tool = catalog.get("freeform").expect("tool");
        validate_arguments(tool, &args(json!({"a": 1, "b": 2}))).expect("valid");
    }

    #[test]
    fn tools_without_a_schema_accept_any_arguments() {
        let catalog = catalog();
        let tool = catalog.get("noSchema").expect("tool");
        validate_arguments(tool, &args(json!({"q": 1}))).expect("valid");
    }
}

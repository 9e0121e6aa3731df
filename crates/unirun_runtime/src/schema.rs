use serde_json::{json, Map, Value};

const WRAPPER_KEY: &str = "value";

/// Output schema prepared for a backend that requires an object root.
#[derive(Clone, Debug, PartialEq)]
pub struct NormalizedSchema {
    pub schema: Value,
    pub wrapped: bool,
}

/// Wrap a non-object schema root in an object with a single `value` property.
/// Object-rooted schemas pass through untouched.
/// Allocation: one wrapper object on wrap. Complexity: O(1).
pub fn normalize_output_schema(schema: Value) -> NormalizedSchema {
    if is_object_root(&schema) {
        return NormalizedSchema {
            schema,
            wrapped: false,
        };
    }
    NormalizedSchema {
        schema: json!({
            "type": "object",
            "properties": { WRAPPER_KEY: schema },
            "required": [WRAPPER_KEY],
            "additionalProperties": false
        }),
        wrapped: true,
    }
}

/// Reverse of [`normalize_output_schema`] on the produced output: unwrap the
/// single `value` key when the schema was wrapped. A malformed wrapper shape
/// passes through unchanged rather than failing the run.
/// Allocation: none beyond the moved value. Complexity: O(1).
pub fn unwrap_structured_output(output: Value, wrapped: bool) -> Value {
    if !wrapped {
        return output;
    }
    match output {
        Value::Object(mut map) if is_wrapper_shape(&map) => {
            map.remove(WRAPPER_KEY).unwrap_or(Value::Null)
        }
        other => other,
    }
}

fn is_object_root(schema: &Value) -> bool {
    schema
        .get("type")
        .and_then(Value::as_str)
        .is_some_and(|t| t == "object")
}

fn is_wrapper_shape(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.contains_key(WRAPPER_KEY)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn object_root_passes_through_unwrapped() {
        let schema = json!({"type": "object", "properties": {"name": {"type": "string"}}});
        let normalized = normalize_output_schema(schema.clone());
        assert!(!normalized.wrapped);
        assert_eq!(normalized.schema, schema);
    }

    #[test]
    fn non_object_root_round_trips_through_wrapper() {
        let schema = json!({"type": "array", "items": {"type": "number"}});
        let normalized = normalize_output_schema(schema);
        assert!(normalized.wrapped);
        assert_eq!(normalized.schema["type"], "object");
        assert_eq!(normalized.schema["required"], json!(["value"]));

        let output = json!({"value": [1, 2, 3]});
        assert_eq!(
            unwrap_structured_output(output, normalized.wrapped),
            json!([1, 2, 3])
        );
    }

    #[test]
    fn malformed_wrapper_passes_through_unchanged() {
        let extra_keys = json!({"value": 1, "other": 2});
        assert_eq!(
            unwrap_structured_output(extra_keys.clone(), true),
            extra_keys
        );

        let not_an_object = json!("plain text");
        assert_eq!(
            unwrap_structured_output(not_an_object.clone(), true),
            not_an_object
        );
    }

    #[test]
    fn unwrapped_output_is_untouched() {
        let output = json!({"value": 1});
        assert_eq!(unwrap_structured_output(output.clone(), false), output);
    }
}

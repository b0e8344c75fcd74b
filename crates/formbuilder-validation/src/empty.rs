use serde_json::Value;

/// Whether a user-entered value counts as "not filled in".
///
/// Null and the empty string are empty. Arrays and objects are empty when every
/// element is itself empty, so `[]`, `{}` and `{"code": ""}` all count as empty.
/// Numbers and booleans are never empty, `0` and `false` included.
pub fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(_) | Value::Number(_) => false,
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.iter().all(is_empty),
        Value::Object(map) => map.values().all(is_empty),
    }
}

/// A missing value is empty.
pub fn is_empty_opt(value: Option<&Value>) -> bool {
    value.is_none_or(is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert!(is_empty(&Value::Null));
        assert!(is_empty(&json!("")));
        assert!(!is_empty(&json!(" ")));
        assert!(!is_empty(&json!(0)));
        assert!(!is_empty(&json!(false)));
        assert!(!is_empty(&json!("2024-01-01")));
    }

    #[test]
    fn test_nested_containers() {
        assert!(is_empty(&json!([])));
        assert!(is_empty(&json!({})));
        assert!(is_empty(&json!({"code": "", "system": null})));
        assert!(is_empty(&json!([null, "", {"display": ""}])));
        assert!(!is_empty(&json!({"code": "a1", "system": ""})));
        assert!(!is_empty(&json!([null, {"value": 0}])));
    }

    #[test]
    fn test_missing() {
        assert!(is_empty_opt(None));
        assert!(!is_empty_opt(Some(&json!(true))));
    }
}

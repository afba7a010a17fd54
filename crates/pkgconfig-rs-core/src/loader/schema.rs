//! JSON-Schema style validation (draft-3/draft-4 subset) with default filling.

use crate::ConfigError;
use regex::Regex;
use serde_json::{Map, Value};

/// Type names accepted by the `type` keyword.
const SCHEMA_TYPES: &[&str] = &[
    "string", "number", "integer", "boolean", "object", "array", "null", "any",
];

/// Keywords whose value must be a non-negative integer.
const COUNT_KEYWORDS: &[&str] = &["minLength", "maxLength", "minItems", "maxItems"];

/// Check that a schema descriptor is structurally valid.
pub fn check_schema(schema: &Value) -> Result<(), ConfigError> {
    check_node(schema, "")
}

/// Fill in declared defaults, then validate `config` against `schema`.
///
/// Returns the config with defaults applied. Failures carry the property path
/// of the offending value (`root`, `server.port`, `hosts[1]`).
pub fn validate(mut config: Value, schema: &Value) -> Result<Value, ConfigError> {
    apply_defaults(&mut config, schema);
    validate_node(&config, schema, "")?;
    Ok(config)
}

/// Validate a single schema node and its children.
fn check_node(schema: &Value, path: &str) -> Result<(), ConfigError> {
    let map = expect_schema_object(schema, path)?;

    if let Some(value) = map.get("type") {
        validate_type_keyword(value, &join_path(path, "type"))?;
    }
    if let Some(value) = map.get("properties") {
        let properties_path = join_path(path, "properties");
        let properties = expect_schema_object(value, &properties_path)?;
        for (key, property) in properties {
            check_node(property, &join_path(&properties_path, key))?;
        }
    }
    if let Some(value) = map.get("required") {
        validate_required_keyword(value, &join_path(path, "required"))?;
    }
    if let Some(value) = map.get("items") {
        let items_path = join_path(path, "items");
        match value {
            Value::Array(schemas) => {
                for (idx, item) in schemas.iter().enumerate() {
                    check_node(item, &format!("{items_path}[{idx}]"))?;
                }
            }
            other => check_node(other, &items_path)?,
        }
    }
    if let Some(value) = map.get("additionalProperties") {
        if !value.is_boolean() {
            check_node(value, &join_path(path, "additionalProperties"))?;
        }
    }
    if let Some(value) = map.get("enum") {
        match value {
            Value::Array(options) if !options.is_empty() => {}
            _ => {
                return Err(invalid_schema(
                    &join_path(path, "enum"),
                    "expected non-empty array",
                ));
            }
        }
    }
    for key in ["minimum", "maximum"] {
        if let Some(value) = map.get(key) {
            if !value.is_number() {
                return Err(invalid_schema(&join_path(path, key), "expected number"));
            }
        }
    }
    for key in ["exclusiveMinimum", "exclusiveMaximum"] {
        if let Some(value) = map.get(key) {
            if !value.is_boolean() {
                return Err(invalid_schema(&join_path(path, key), "expected bool"));
            }
        }
    }
    for key in COUNT_KEYWORDS {
        if let Some(value) = map.get(*key) {
            if !value.is_u64() {
                return Err(invalid_schema(
                    &join_path(path, key),
                    "expected non-negative integer",
                ));
            }
        }
    }
    if let Some(value) = map.get("pattern") {
        compile_pattern(value, &join_path(path, "pattern"))?;
    }
    Ok(())
}

/// Validate the `type` keyword (a type name or a list of them).
fn validate_type_keyword(value: &Value, path: &str) -> Result<(), ConfigError> {
    let names: Vec<&Value> = match value {
        Value::Array(names) if !names.is_empty() => names.iter().collect(),
        Value::Array(_) => return Err(invalid_schema(path, "expected non-empty array")),
        other => vec![other],
    };
    for name in names {
        match name.as_str() {
            Some(name) if SCHEMA_TYPES.contains(&name) => {}
            Some(name) => {
                return Err(invalid_schema(path, &format!("unknown type '{name}'")));
            }
            None => return Err(invalid_schema(path, "expected string")),
        }
    }
    Ok(())
}

/// `required` is a bool on a property (draft-3) or a name list on an object (draft-4).
fn validate_required_keyword(value: &Value, path: &str) -> Result<(), ConfigError> {
    match value {
        Value::Bool(_) => Ok(()),
        Value::Array(names) => {
            for (idx, name) in names.iter().enumerate() {
                if name.as_str().is_none() {
                    return Err(invalid_schema(
                        &format!("{path}[{idx}]"),
                        "expected string",
                    ));
                }
            }
            Ok(())
        }
        _ => Err(invalid_schema(path, "expected bool or array of strings")),
    }
}

fn compile_pattern(value: &Value, path: &str) -> Result<Regex, ConfigError> {
    let Some(pattern) = value.as_str() else {
        return Err(invalid_schema(path, "expected string"));
    };
    Regex::new(pattern).map_err(|err| invalid_schema(path, &err.to_string()))
}

/// Insert `default` values for missing properties, recursively.
fn apply_defaults(value: &mut Value, schema: &Value) {
    let Some(schema) = schema.as_object() else {
        return;
    };
    match value {
        Value::Object(map) => {
            let Some(properties) = schema.get("properties").and_then(Value::as_object) else {
                return;
            };
            for (key, property) in properties {
                if !map.contains_key(key) {
                    if let Some(default) = property.get("default") {
                        map.insert(key.clone(), default.clone());
                    }
                }
                if let Some(child) = map.get_mut(key) {
                    apply_defaults(child, property);
                }
            }
        }
        Value::Array(items) => match schema.get("items") {
            Some(Value::Array(schemas)) => {
                for (item, item_schema) in items.iter_mut().zip(schemas) {
                    apply_defaults(item, item_schema);
                }
            }
            Some(item_schema) => {
                for item in items.iter_mut() {
                    apply_defaults(item, item_schema);
                }
            }
            None => {}
        },
        _ => {}
    }
}

/// Validate a value against one schema node.
fn validate_node(value: &Value, schema: &Value, path: &str) -> Result<(), ConfigError> {
    let Some(schema) = schema.as_object() else {
        return Ok(());
    };

    if let Some(types) = schema.get("type") {
        validate_type(value, types, path)?;
    }
    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            return Err(invalid_value(path, "value is not one of the allowed options"));
        }
    }

    match value {
        Value::Number(_) => validate_range(value, schema, path),
        Value::String(text) => validate_string(text, schema, path),
        Value::Array(items) => validate_items(items, schema, path),
        Value::Object(map) => validate_properties(map, schema, path),
        Value::Null | Value::Bool(_) => Ok(()),
    }
}

fn validate_type(value: &Value, types: &Value, path: &str) -> Result<(), ConfigError> {
    let names: Vec<&str> = match types {
        Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
        other => other.as_str().into_iter().collect(),
    };
    if names.is_empty() || names.iter().any(|name| matches_type(value, name)) {
        return Ok(());
    }
    Err(invalid_value(
        path,
        &format!("expected {}, found {}", names.join(" or "), type_name(value)),
    ))
}

fn matches_type(value: &Value, name: &str) -> bool {
    match name {
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => is_integer(value),
        "boolean" => value.is_boolean(),
        "object" => value.is_object(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        "any" => true,
        _ => false,
    }
}

fn is_integer(value: &Value) -> bool {
    value.is_i64()
        || value.is_u64()
        || value.as_f64().is_some_and(|number| number.fract() == 0.0)
}

/// Schema-style name of a value's type.
fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) if is_integer(value) => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn validate_range(
    value: &Value,
    schema: &Map<String, Value>,
    path: &str,
) -> Result<(), ConfigError> {
    let Some(number) = value.as_f64() else {
        return Ok(());
    };
    let exclusive = |key: &str| schema.get(key).and_then(Value::as_bool).unwrap_or(false);

    if let Some(minimum) = schema.get("minimum").and_then(Value::as_f64) {
        if exclusive("exclusiveMinimum") && number <= minimum {
            return Err(invalid_value(path, &format!("must be greater than {minimum}")));
        }
        if number < minimum {
            return Err(invalid_value(path, &format!("must be at least {minimum}")));
        }
    }
    if let Some(maximum) = schema.get("maximum").and_then(Value::as_f64) {
        if exclusive("exclusiveMaximum") && number >= maximum {
            return Err(invalid_value(path, &format!("must be less than {maximum}")));
        }
        if number > maximum {
            return Err(invalid_value(path, &format!("must be at most {maximum}")));
        }
    }
    Ok(())
}

fn validate_string(
    text: &str,
    schema: &Map<String, Value>,
    path: &str,
) -> Result<(), ConfigError> {
    let length = text.chars().count() as u64;
    if let Some(min) = schema.get("minLength").and_then(Value::as_u64) {
        if length < min {
            return Err(invalid_value(path, &format!("shorter than {min} characters")));
        }
    }
    if let Some(max) = schema.get("maxLength").and_then(Value::as_u64) {
        if length > max {
            return Err(invalid_value(path, &format!("longer than {max} characters")));
        }
    }
    if let Some(pattern) = schema.get("pattern") {
        let regex = compile_pattern(pattern, &join_path(path, "pattern"))?;
        if !regex.is_match(text) {
            return Err(invalid_value(
                path,
                &format!("does not match pattern '{}'", regex.as_str()),
            ));
        }
    }
    Ok(())
}

fn validate_items(
    items: &[Value],
    schema: &Map<String, Value>,
    path: &str,
) -> Result<(), ConfigError> {
    let count = items.len() as u64;
    if let Some(min) = schema.get("minItems").and_then(Value::as_u64) {
        if count < min {
            return Err(invalid_value(path, &format!("fewer than {min} items")));
        }
    }
    if let Some(max) = schema.get("maxItems").and_then(Value::as_u64) {
        if count > max {
            return Err(invalid_value(path, &format!("more than {max} items")));
        }
    }
    match schema.get("items") {
        Some(Value::Array(schemas)) => {
            for (idx, (item, item_schema)) in items.iter().zip(schemas).enumerate() {
                validate_node(item, item_schema, &format!("{path}[{idx}]"))?;
            }
        }
        Some(item_schema) => {
            for (idx, item) in items.iter().enumerate() {
                validate_node(item, item_schema, &format!("{path}[{idx}]"))?;
            }
        }
        None => {}
    }
    Ok(())
}

fn validate_properties(
    map: &Map<String, Value>,
    schema: &Map<String, Value>,
    path: &str,
) -> Result<(), ConfigError> {
    let properties = schema.get("properties").and_then(Value::as_object);

    if let Some(Value::Array(names)) = schema.get("required") {
        for name in names.iter().filter_map(Value::as_str) {
            if !map.contains_key(name) {
                return Err(invalid_value(
                    &join_path(path, name),
                    "missing required property",
                ));
            }
        }
    }

    if let Some(properties) = properties {
        for (key, property) in properties {
            let child_path = join_path(path, key);
            match map.get(key) {
                Some(child) => validate_node(child, property, &child_path)?,
                None if property.get("required") == Some(&Value::Bool(true)) => {
                    return Err(invalid_value(&child_path, "missing required property"));
                }
                None => {}
            }
        }
    }

    match schema.get("additionalProperties") {
        Some(Value::Bool(false)) => {
            for key in map.keys() {
                if !properties.is_some_and(|known| known.contains_key(key)) {
                    return Err(invalid_value(&join_path(path, key), "unknown property"));
                }
            }
        }
        Some(extra_schema @ Value::Object(_)) => {
            for (key, child) in map {
                if !properties.is_some_and(|known| known.contains_key(key)) {
                    validate_node(child, extra_schema, &join_path(path, key))?;
                }
            }
        }
        _ => {}
    }
    Ok(())
}

/// Expect a schema node to be an object.
fn expect_schema_object<'a>(
    value: &'a Value,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_schema(path, "expected object")),
    }
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

fn normalize_path(path: &str) -> String {
    if path.is_empty() {
        "root".to_string()
    } else {
        path.to_string()
    }
}

fn invalid_schema(path: &str, message: &str) -> ConfigError {
    ConfigError::InvalidSchema {
        path: normalize_path(path),
        message: message.to_string(),
    }
}

fn invalid_value(path: &str, message: &str) -> ConfigError {
    ConfigError::Validation {
        path: normalize_path(path),
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn port_schema() -> Value {
        json!({
            "properties": {
                "port": {
                    "description": "The web server port number.",
                    "type": "integer",
                    "required": true,
                    "minimum": 1,
                    "maximum": 65535,
                    "default": 80
                }
            }
        })
    }

    #[test]
    fn accepts_valid_config() {
        let config = validate(json!({ "port": 8080 }), &port_schema()).expect("valid");
        assert_eq!(config, json!({ "port": 8080 }));
    }

    #[test]
    fn applies_defaults_for_missing_properties() {
        let config = validate(json!({}), &port_schema()).expect("valid");
        assert_eq!(config, json!({ "port": 80 }));
    }

    #[test]
    fn applies_nested_defaults() {
        let schema = json!({
            "properties": {
                "server": {
                    "type": "object",
                    "default": {},
                    "properties": {
                        "host": { "type": "string", "default": "localhost" },
                        "tls": { "type": "boolean", "default": false }
                    }
                }
            }
        });
        let config = validate(json!({ "server": { "tls": true } }), &schema).expect("valid");
        assert_eq!(config, json!({ "server": { "host": "localhost", "tls": true } }));

        let config = validate(json!({}), &schema).expect("valid");
        assert_eq!(config, json!({ "server": { "host": "localhost", "tls": false } }));
    }

    #[test]
    fn rejects_out_of_range_value() {
        let err = validate(json!({ "port": 70000 }), &port_schema()).unwrap_err();
        match err {
            ConfigError::Validation { path, message } => {
                assert_eq!(path, "port");
                assert_eq!(message, "must be at most 65535");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rejects_missing_required_property_without_default() {
        let schema = json!({
            "properties": {
                "port": { "type": "integer", "required": true }
            }
        });
        let err = validate(json!({ "badport": 8080 }), &schema).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "validation failed at port: missing required property"
        );
    }

    #[test]
    fn draft4_required_list() {
        let schema = json!({
            "type": "object",
            "required": ["name"],
            "properties": { "name": { "type": "string", "minLength": 1 } }
        });
        let err = validate(json!({}), &schema).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref path, .. } if path == "name"));

        let err = validate(json!({ "name": "" }), &schema).unwrap_err();
        assert!(format!("{err}").contains("shorter than 1"));
    }

    #[test]
    fn rejects_wrong_type_with_path() {
        let schema = json!({
            "properties": {
                "hosts": { "type": "array", "items": { "type": "string" } }
            }
        });
        let err = validate(json!({ "hosts": ["a", 2] }), &schema).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "validation failed at hosts[1]: expected string, found integer"
        );
    }

    #[test]
    fn integer_rejects_fractional_numbers() {
        let err = validate(json!({ "port": 80.5 }), &port_schema()).unwrap_err();
        assert!(format!("{err}").contains("expected integer, found number"));
    }

    #[test]
    fn enum_and_pattern_constraints() {
        let schema = json!({
            "properties": {
                "level": { "enum": ["debug", "info"] },
                "name": { "type": "string", "pattern": "^[a-z]+$" }
            }
        });
        assert!(validate(json!({ "level": "info", "name": "web" }), &schema).is_ok());
        assert!(validate(json!({ "level": "loud" }), &schema).is_err());
        let err = validate(json!({ "name": "Web" }), &schema).unwrap_err();
        assert!(format!("{err}").contains("does not match pattern"));
    }

    #[test]
    fn additional_properties_false_rejects_unknown_keys() {
        let schema = json!({
            "additionalProperties": false,
            "properties": { "port": { "type": "integer" } }
        });
        let err = validate(json!({ "port": 1, "extra": true }), &schema).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref path, .. } if path == "extra"));
    }

    #[test]
    fn root_type_errors_use_root_path() {
        let err = validate(json!([]), &json!({ "type": "object" })).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { ref path, .. } if path == "root"));
    }

    #[test]
    fn exclusive_bounds() {
        let schema = json!({
            "properties": {
                "ratio": { "type": "number", "minimum": 0, "exclusiveMinimum": true }
            }
        });
        assert!(validate(json!({ "ratio": 0.1 }), &schema).is_ok());
        assert!(validate(json!({ "ratio": 0 }), &schema).is_err());
    }

    #[test]
    fn check_schema_accepts_descriptor() {
        check_schema(&port_schema()).expect("schema");
    }

    #[test]
    fn check_schema_rejects_unknown_type() {
        let schema = json!({ "properties": { "port": { "type": "int" } } });
        let err = check_schema(&schema).unwrap_err();
        assert_eq!(
            format!("{err}"),
            "invalid schema at properties.port.type: unknown type 'int'"
        );
    }

    #[test]
    fn check_schema_rejects_malformed_keywords() {
        assert!(check_schema(&json!("object")).is_err());
        assert!(check_schema(&json!({ "properties": [] })).is_err());
        assert!(check_schema(&json!({ "minimum": "1" })).is_err());
        assert!(check_schema(&json!({ "minLength": -1 })).is_err());
        assert!(check_schema(&json!({ "enum": [] })).is_err());
        assert!(check_schema(&json!({ "required": "yes" })).is_err());
        assert!(check_schema(&json!({ "pattern": "(" })).is_err());
    }
}

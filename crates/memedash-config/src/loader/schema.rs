//! Schema validation helpers for memedash JSON5 configuration.

use crate::ConfigError;
use memedash_protocol::{PageSize, SortField, SortOrder};
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(
        map,
        &[
            "$schema",
            "api",
            "top_memes",
            "history",
            "reports",
            "notifications",
            "storage",
        ],
        layer,
        "",
    )?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("api") {
        validate_api(value, layer, "api")?;
    }
    if let Some(value) = map.get("top_memes") {
        validate_top_memes(value, layer, "top_memes")?;
    }
    if let Some(value) = map.get("history") {
        validate_history(value, layer, "history")?;
    }
    if let Some(value) = map.get("reports") {
        let map = expect_object(value, layer, "reports")?;
        ensure_allowed_keys(map, &["limit"], layer, "reports")?;
        if let Some(value) = map.get("limit") {
            expect_u64(value, layer, "reports.limit")?;
        }
    }
    if let Some(value) = map.get("notifications") {
        let map = expect_object(value, layer, "notifications")?;
        ensure_allowed_keys(map, &["ttl_ms"], layer, "notifications")?;
        if let Some(value) = map.get("ttl_ms") {
            expect_u64(value, layer, "notifications.ttl_ms")?;
        }
    }
    if let Some(value) = map.get("storage") {
        let map = expect_object(value, layer, "storage")?;
        ensure_allowed_keys(map, &["path"], layer, "storage")?;
        if let Some(value) = map.get("path") {
            expect_string(value, layer, "storage.path")?;
        }
    }
    Ok(())
}

/// Validate the "api" block.
fn validate_api(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["base_url", "timeout_ms"], layer, path)?;
    if let Some(value) = map.get("base_url") {
        expect_string(value, layer, &join_path(path, "base_url"))?;
    }
    if let Some(value) = map.get("timeout_ms") {
        expect_u64(value, layer, &join_path(path, "timeout_ms"))?;
    }
    Ok(())
}

/// Validate the "top_memes" block.
fn validate_top_memes(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(
        map,
        &["limit", "refetch_interval_ms", "stale_time_ms"],
        layer,
        path,
    )?;
    for key in ["limit", "refetch_interval_ms", "stale_time_ms"] {
        if let Some(value) = map.get(key) {
            expect_u64(value, layer, &join_path(path, key))?;
        }
    }
    Ok(())
}

/// Validate the "history" block, including the allowed enum values.
fn validate_history(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["sort_by", "order", "limit"], layer, path)?;
    if let Some(value) = map.get("sort_by") {
        let field_path = join_path(path, "sort_by");
        let raw = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &field_path, "expected string"))?;
        raw.parse::<SortField>()
            .map_err(|err| invalid_field(layer, &field_path, &err.to_string()))?;
    }
    if let Some(value) = map.get("order") {
        let field_path = join_path(path, "order");
        let raw = value
            .as_str()
            .ok_or_else(|| invalid_field(layer, &field_path, "expected string"))?;
        raw.parse::<SortOrder>()
            .map_err(|err| invalid_field(layer, &field_path, &err.to_string()))?;
    }
    if let Some(value) = map.get("limit") {
        let field_path = join_path(path, "limit");
        let raw = value
            .as_u64()
            .ok_or_else(|| invalid_field(layer, &field_path, "expected integer"))?;
        let raw = u32::try_from(raw)
            .map_err(|_| invalid_field(layer, &field_path, "value out of range"))?;
        PageSize::try_from(raw)
            .map_err(|err| invalid_field(layer, &field_path, &err.to_string()))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_string() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
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

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}

//! Field rules shared by catalog inputs.
//!
//! Text and JSON values must be storable in Postgres, which rejects the NUL
//! character in both TEXT columns and JSONB strings.

use serde_json::Value;

use warehouse_core::{DomainError, DomainResult};

pub const CATEGORY_NAME_MAX: usize = 200;
pub const PRODUCT_NAME_MAX: usize = 255;
pub const IMAGE_URL_MAX: usize = 500;
pub const SKU_MAX: usize = 64;

/// Required text: must contain a non-whitespace character and fit in `max` chars.
pub fn required_text(field: &str, value: &str, max: usize) -> DomainResult<()> {
    if value.trim().is_empty() {
        return Err(DomainError::validation(format!("{field} cannot be empty")));
    }
    max_len(field, value, max)
}

/// Optional text: when present, must fit in `max` chars.
pub fn optional_text(field: &str, value: Option<&str>, max: usize) -> DomainResult<()> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

/// Optional unbounded text (e.g. `description`).
pub fn free_text(field: &str, value: Option<&str>) -> DomainResult<()> {
    match value {
        Some(v) => no_nul(field, v),
        None => Ok(()),
    }
}

/// Attribute maps: every key and every nested string must be storable.
pub fn attrs(field: &str, map: &serde_json::Map<String, Value>) -> DomainResult<()> {
    for (key, value) in map {
        no_nul(field, key)?;
        json_value(field, value)?;
    }
    Ok(())
}

fn json_value(field: &str, value: &Value) -> DomainResult<()> {
    match value {
        Value::String(s) => no_nul(field, s),
        Value::Array(items) => items.iter().try_for_each(|item| json_value(field, item)),
        Value::Object(map) => attrs(field, map),
        Value::Null | Value::Bool(_) | Value::Number(_) => Ok(()),
    }
}

fn no_nul(field: &str, value: &str) -> DomainResult<()> {
    if value.contains('\0') {
        return Err(DomainError::validation(format!(
            "{field} must not contain NUL characters"
        )));
    }
    Ok(())
}

fn max_len(field: &str, value: &str, max: usize) -> DomainResult<()> {
    no_nul(field, value)?;
    let len = value.chars().count();
    if len > max {
        return Err(DomainError::validation(format!(
            "{field} must be at most {max} characters (got {len})"
        )));
    }
    Ok(())
}

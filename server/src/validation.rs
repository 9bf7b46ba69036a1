//! Request body checks.
//!
//! The create body must be an object whose only key is `value`, a string of
//! 1 to 50 characters. Length is counted in UTF-16 code units, the way
//! browsers count it. An update may move a todo only to an order that a
//! JSON number represents exactly. The first violation found is reported.

use serde_json::Value;
use thiserror::Error;
use validator::{Validate, ValidationErrors};

use crate::todo::{CreateTodo, UpdateTodo};

pub const VALUE_MAX_UNITS: usize = 50;

/// Largest integer a JSON number carries without rounding, 2^53 - 1.
pub const MAX_SAFE_ORDER: i64 = (1 << 53) - 1;

/// A rejected request body. `Display` is the client-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub fn validate_create(body: Value) -> Result<CreateTodo, ValidationError> {
    if !body.is_object() {
        return Err(ValidationError::new("value", "\"value\" must be of type object"));
    }
    let create: CreateTodo = serde_json::from_value(body).map_err(|e| shape_error(&e))?;
    create.validate().map_err(|e| first_violation(&e))?;
    Ok(create)
}

pub fn validate_update(patch: &UpdateTodo) -> Result<(), ValidationError> {
    patch.validate().map_err(|e| first_violation(&e))
}

pub(crate) fn within_value_limit(value: &str) -> Result<(), validator::ValidationError> {
    if value.encode_utf16().count() > VALUE_MAX_UNITS {
        return Err(validator::ValidationError::new("length"));
    }
    Ok(())
}

pub(crate) fn safe_order(order: i64) -> Result<(), validator::ValidationError> {
    if !(-MAX_SAFE_ORDER..=MAX_SAFE_ORDER).contains(&order) {
        return Err(validator::ValidationError::new("range"));
    }
    Ok(())
}

/// serde reports unknown keys as ``unknown field `name`, expected ...``;
/// every other failure on this body is a non-string `value`.
fn shape_error(error: &serde_json::Error) -> ValidationError {
    let text = error.to_string();
    let unknown = text
        .strip_prefix("unknown field `")
        .and_then(|rest| rest.split_once('`'))
        .map(|(name, _)| name);
    match unknown {
        Some(name) => ValidationError::new(name, format!("\"{name}\" is not allowed")),
        None => ValidationError::new("value", "\"value\" must be a string"),
    }
}

fn first_violation(errors: &ValidationErrors) -> ValidationError {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by(|a, b| a.0.cmp(&b.0));
    fields
        .iter()
        .find_map(|(field, list)| {
            let error = list.first()?;
            let message = error
                .message
                .as_deref()
                .map_or_else(|| error.code.to_string(), str::to_string);
            Some(ValidationError::new(field, message))
        })
        .unwrap_or_else(|| ValidationError::new("", errors.to_string()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn message(body: Value) -> String {
        validate_create(body).unwrap_err().message
    }

    #[test]
    fn accepts_short_value() {
        let create = validate_create(json!({"value": "buy milk"})).unwrap();
        assert_eq!(create.value.as_deref(), Some("buy milk"));
    }

    #[test]
    fn accepts_exactly_fifty_units() {
        let value = "x".repeat(VALUE_MAX_UNITS);
        assert!(validate_create(json!({ "value": value })).is_ok());
    }

    #[test]
    fn counts_utf16_units_not_bytes() {
        let value = "할".repeat(VALUE_MAX_UNITS);
        assert!(validate_create(json!({ "value": value })).is_ok());
    }

    #[test]
    fn astral_chars_count_twice() {
        let value = "🥛".repeat(VALUE_MAX_UNITS / 2);
        assert!(validate_create(json!({ "value": value })).is_ok());

        let value = "🥛".repeat(VALUE_MAX_UNITS / 2 + 1);
        assert_eq!(
            message(json!({ "value": value })),
            "\"value\" length must be less than or equal to 50 characters long"
        );
    }

    #[test]
    fn rejects_missing_value() {
        assert_eq!(message(json!({})), "\"value\" is required");
    }

    #[test]
    fn rejects_non_string_value() {
        assert_eq!(message(json!({"value": 12})), "\"value\" must be a string");
        assert_eq!(message(json!({"value": null})), "\"value\" must be a string");
        assert_eq!(message(json!({"value": ["a"]})), "\"value\" must be a string");
    }

    #[test]
    fn rejects_empty_value() {
        assert_eq!(message(json!({"value": ""})), "\"value\" is not allowed to be empty");
    }

    #[test]
    fn rejects_long_value() {
        let value = "x".repeat(VALUE_MAX_UNITS + 1);
        assert_eq!(
            message(json!({ "value": value })),
            "\"value\" length must be less than or equal to 50 characters long"
        );
    }

    #[test]
    fn rejects_unknown_key() {
        let err = validate_create(json!({"value": "a", "priority": 1})).unwrap_err();
        assert_eq!(err.field, "priority");
        assert_eq!(err.message, "\"priority\" is not allowed");
    }

    #[test]
    fn rejects_non_object_body() {
        assert_eq!(message(json!(["value"])), "\"value\" must be of type object");
        assert_eq!(message(json!("value")), "\"value\" must be of type object");
    }

    #[test]
    fn update_accepts_safe_orders() {
        for order in [1, 0, -5, MAX_SAFE_ORDER, -MAX_SAFE_ORDER] {
            let patch = UpdateTodo {
                order: Some(order),
                ..UpdateTodo::default()
            };
            assert!(validate_update(&patch).is_ok(), "order {order}");
        }
        assert!(validate_update(&UpdateTodo::default()).is_ok());
    }

    #[test]
    fn update_rejects_orders_beyond_json_precision() {
        for order in [MAX_SAFE_ORDER + 1, i64::MAX, i64::MIN] {
            let patch = UpdateTodo {
                order: Some(order),
                ..UpdateTodo::default()
            };
            let err = validate_update(&patch).unwrap_err();
            assert_eq!(err.field, "order");
            assert_eq!(err.message, "\"order\" must be a safe number");
        }
    }
}

//! Todo document and the JSON bodies exchanged over the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::validation::{safe_order, within_value_limit};

/// A single todo. Higher `order` means higher priority; `done_at` is `None`
/// while the task is open.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub value: String,
    pub order: i64,
    pub done_at: Option<DateTime<Utc>>,
}

/// Create payload. `value` is `None` only when the key is absent; an
/// explicit `null` fails deserialization as a non-string.
#[derive(Debug, PartialEq, Eq, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTodo {
    #[serde(default, deserialize_with = "present")]
    #[validate(required(message = "\"value\" is required"))]
    #[validate(length(min = 1, message = "\"value\" is not allowed to be empty"))]
    #[validate(custom(
        function = "within_value_limit",
        message = "\"value\" length must be less than or equal to 50 characters long"
    ))]
    pub value: Option<String>,
}

/// Partial update. Every field is optional and applied independently.
///
/// `done` distinguishes an absent key (`None`, leave `doneAt` alone) from an
/// explicit `null` (`Some(None)`, clear it).
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateTodo {
    #[serde(default)]
    #[validate(custom(function = "safe_order", message = "\"order\" must be a safe number"))]
    pub order: Option<i64>,
    #[serde(default, deserialize_with = "present")]
    pub done: Option<Option<bool>>,
    #[serde(default)]
    pub value: Option<String>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct Message {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TodoEnvelope {
    pub todo: Todo,
}

#[derive(Debug, Serialize)]
pub struct TodoList {
    pub todos: Vec<Todo>,
}

/// Serializes to `{}`.
#[derive(Debug, Serialize)]
pub struct Empty {}

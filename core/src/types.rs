//! Domain DTOs for the todo API.
//!
//! # Design
//! These types mirror the server's JSON schema but are defined independently
//! so the client never links the server. The integration test against a live
//! server catches any schema drift between the two crates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single todo item returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: Uuid,
    pub value: String,
    pub order: i64,
    pub done_at: Option<DateTime<Utc>>,
}

impl Todo {
    pub fn is_done(&self) -> bool {
        self.done_at.is_some()
    }
}

/// Request payload for creating a new todo.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTodo {
    pub value: String,
}

/// Request payload for updating an existing todo. Only the fields present in
/// the JSON are applied; omitted fields remain unchanged on the server.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTodo {
    /// Move to this rank, swapping with whichever todo currently holds it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TodoEnvelope {
    pub todo: Todo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TodoList {
    pub todos: Vec<Todo>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ErrorBody {
    pub error_message: String,
}

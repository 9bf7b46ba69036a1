//! Error-to-response translation.
//!
//! # Design
//! Handlers return `Result<_, ApiError>`; `IntoResponse for ApiError` is the
//! only place a failure becomes a status code and body. Store failures are
//! logged in full and answered with a generic 500 so internals never reach
//! the client.

use std::any::Any;
use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{FormRejection, JsonRejection},
        FromRequest, Request,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::store::StoreError;
use crate::validation::ValidationError;

pub const TODO_NOT_FOUND: &str = "todo does not exist.";
pub const TASK_DATA_MISSING: &str = "task data does not exist";
const INTERNAL: &str = "internal server error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request body is malformed or fails the schema. 400.
    #[error("{0}")]
    Validation(String),

    /// The referenced todo does not exist. 404.
    #[error("{0}")]
    NotFound(String),

    /// 500.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ApiError {
    pub fn todo_not_found() -> Self {
        Self::NotFound(TODO_NOT_FOUND.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Body of every error response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = match &self {
            ApiError::Store(error) => {
                tracing::error!(%error, "store operation failed");
                INTERNAL.to_string()
            }
            other => {
                tracing::debug!(%status, error = %other, "request rejected");
                other.to_string()
            }
        };
        (status, Json(ErrorBody { error_message })).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(error: ValidationError) -> Self {
        ApiError::Validation(error.message)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

/// `Json` extractor whose rejections answer 400 with an `errorMessage`
/// body instead of axum's plain-text 415/422.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

/// A JSON body, or an HTML form body read as an object of string fields.
#[derive(Debug)]
pub struct JsonOrForm(pub Value);

impl<S> FromRequest<S> for JsonOrForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_form(&req) {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(req, state).await?;
            let object: Map<String, Value> = fields
                .into_iter()
                .map(|(key, value)| (key, Value::String(value)))
                .collect();
            return Ok(Self(Value::Object(object)));
        }
        let JsonBody(value) = JsonBody::<Value>::from_request(req, state).await?;
        Ok(Self(value))
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/x-www-form-urlencoded"))
}

/// Response for a handler that panicked.
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(detail, "handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error_message: INTERNAL.to_string(),
        }),
    )
        .into_response()
}

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::{Value, json};
use std::any::Any;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BinderError>;

/// Errors raised while configuring, binding or starting an application.
#[derive(Debug, Error)]
pub enum BinderError {
    #[error("Invalid configuration for {key}: {message}")]
    Config { key: String, message: String },

    #[error("Duplicate route: {method} {path}")]
    DuplicateRoute { method: String, path: String },

    #[error("Route {path} conflicts with {existing}")]
    ConflictingRoute { path: String, existing: String },

    #[error("Invalid route {path}: {message}")]
    InvalidRoute { path: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BinderError {
    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// HTTP-facing error.
///
/// Every failure that reaches a client goes through [`ApiError::into_response`]:
/// handler errors, argument marshaling failures, unknown routes and panics.
/// The response carries `status` and a JSON body of the form
/// `{ "message": "...", "errors": [...] }`.
#[derive(Debug, Clone, Error)]
#[error("{status}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub errors: Vec<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            errors: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Append a single entry to `errors`.
    pub fn with_error(mut self, error: Value) -> Self {
        self.errors.push(error);
        self
    }

    pub fn with_errors(mut self, errors: impl IntoIterator<Item = Value>) -> Self {
        self.errors.extend(errors);
        self
    }

    pub fn body(&self) -> Value {
        json!({
            "message": self.message,
            "errors": self.errors,
        })
    }
}

impl Default for ApiError {
    fn default() -> Self {
        Self::internal("Internal Server Error")
    }
}

impl From<BinderError> for ApiError {
    fn from(err: BinderError) -> Self {
        Self::internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(
                status = self.status.as_u16(),
                message = %self.message,
                errors = ?self.errors,
                "Request failed"
            );
        } else {
            tracing::warn!(
                status = self.status.as_u16(),
                message = %self.message,
                errors = ?self.errors,
                "Request rejected"
            );
        }
        let body = self.body();
        (self.status, Json(body)).into_response()
    }
}

/// Panic handler for `CatchPanicLayer`; the panic payload is logged, never sent.
pub(crate) fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else {
        "unknown panic payload".to_string()
    };
    tracing::error!(panic = %detail, "Handler panicked");
    ApiError::default().into_response()
}

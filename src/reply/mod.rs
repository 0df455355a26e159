use crate::error::ApiError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;
use std::any::{TypeId, type_name};
use std::fmt;

trait ErasedBody: Send {
    fn to_json(&self) -> serde_json::Result<Value>;
}

impl<T: Serialize + Send> ErasedBody for T {
    fn to_json(&self) -> serde_json::Result<Value> {
        serde_json::to_value(self)
    }
}

/// A value returned by a controller method.
///
/// The concrete type is erased but its `TypeId` is kept, so the binder can
/// pick the status code declared for that type.
pub struct Reply {
    type_id: TypeId,
    type_name: &'static str,
    body: Option<Box<dyn ErasedBody>>,
}

impl Reply {
    pub fn new<T: Serialize + Send + 'static>(value: T) -> Self {
        if TypeId::of::<T>() == TypeId::of::<()>() {
            return Self::empty();
        }
        Self {
            type_id: TypeId::of::<T>(),
            type_name: type_name::<T>(),
            body: Some(Box::new(value)),
        }
    }

    /// A reply without a body.
    pub fn empty() -> Self {
        Self {
            type_id: TypeId::of::<()>(),
            type_name: type_name::<()>(),
            body: None,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_none()
    }

    pub fn to_json(&self) -> serde_json::Result<Option<Value>> {
        self.body.as_ref().map(|b| b.to_json()).transpose()
    }

    pub fn into_response(self, status: StatusCode) -> Response {
        match self.to_json() {
            Ok(Some(body)) => (status, Json(body)).into_response(),
            Ok(None) => status.into_response(),
            Err(e) => ApiError::internal(format!("Failed to serialize {}", self.type_name))
                .with_error(Value::String(e.to_string()))
                .into_response(),
        }
    }
}

impl fmt::Debug for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reply")
            .field("type_name", &self.type_name)
            .field("empty", &self.is_empty())
            .finish()
    }
}

/// Conversion of a controller method's return value.
pub trait IntoReply {
    fn into_reply(self) -> Result<Reply, ApiError>;
}

impl IntoReply for Reply {
    fn into_reply(self) -> Result<Reply, ApiError> {
        Ok(self)
    }
}

impl IntoReply for () {
    fn into_reply(self) -> Result<Reply, ApiError> {
        Ok(Reply::empty())
    }
}

impl<T: Serialize + Send + 'static> IntoReply for Json<T> {
    fn into_reply(self) -> Result<Reply, ApiError> {
        Ok(Reply::new(self.0))
    }
}

impl<R, E> IntoReply for Result<R, E>
where
    R: IntoReply,
    E: Into<ApiError>,
{
    fn into_reply(self) -> Result<Reply, ApiError> {
        self.map_err(Into::into).and_then(IntoReply::into_reply)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Serialize)]
    struct Pet {
        name: String,
    }

    #[test]
    fn test_keeps_runtime_type() {
        let reply = Reply::new(Pet {
            name: "Rex".to_string(),
        });
        assert_eq!(reply.type_id(), TypeId::of::<Pet>());
        assert!(reply.type_name().ends_with("Pet"));
        assert_eq!(reply.to_json().unwrap(), Some(json!({"name": "Rex"})));
    }

    #[test]
    fn test_unit_is_empty() {
        let reply = Reply::new(());
        assert!(reply.is_empty());
        assert_eq!(reply.type_id(), TypeId::of::<()>());
        assert!(().into_reply().unwrap().is_empty());
    }

    #[test]
    fn test_result_conversion() {
        let ok: Result<Reply, ApiError> = Ok(Reply::new(1u8));
        assert_eq!(ok.into_reply().unwrap().type_id(), TypeId::of::<u8>());

        let json: Result<Json<Pet>, ApiError> = Ok(Json(Pet {
            name: "Rex".to_string(),
        }));
        assert_eq!(json.into_reply().unwrap().type_id(), TypeId::of::<Pet>());

        let err: Result<(), ApiError> = Err(ApiError::not_found("gone"));
        assert_eq!(err.into_reply().unwrap_err().status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_response_uses_given_status() {
        let response = Reply::new(Pet {
            name: "Rex".to_string(),
        })
        .into_response(StatusCode::CREATED);
        assert_eq!(response.status(), StatusCode::CREATED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], br#"{"name":"Rex"}"#);

        let response = Reply::empty().into_response(StatusCode::NO_CONTENT);
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
    }
}

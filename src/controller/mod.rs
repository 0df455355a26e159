//! Controllers
//!
//! Controller functionality is primarily provided through macros:
//! - `#[controller(path = "...")]` implements [`ControllerInfo`]
//! - `#[routes]` on the impl block implements [`Controller`], turning every
//!   `#[get]`, `#[post]`, `#[put]`, `#[delete]`, `#[patch]`, `#[head]` and
//!   `#[options]` method into an [`Operation`]
//!
//! # Example
//! ```rust,ignore
//! use oasbind::prelude::*;
//!
//! #[controller(path = "/pets", tag = "pets")]
//! pub struct PetController {
//!     store: Arc<PetStore>,
//! }
//!
//! #[routes]
//! impl PetController {
//!     /// Find a pet by id
//!     #[get("/{id}")]
//!     #[response(200, Pet)]
//!     #[response(404, NotFound)]
//!     async fn get_pet(&self, #[path] id: i64) -> Reply {
//!         match self.store.get(id).await {
//!             Some(pet) => Reply::new(pet),
//!             None => Reply::new(NotFound::new(id)),
//!         }
//!     }
//! }
//! ```

use crate::error::ApiError;
use crate::marshal::Arguments;
use crate::metadata::OperationSpec;
use crate::reply::Reply;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Reply, ApiError>> + Send>>;

/// Type-erased call into one controller method.
pub type Handler<C> = Arc<dyn Fn(Arc<C>, Arguments) -> HandlerFuture + Send + Sync>;

/// Controller-level metadata, implemented by `#[controller]`.
pub trait ControllerInfo {
    /// Path every operation of the controller is mounted under.
    fn base_path() -> &'static str;

    /// OpenAPI tag applied to operations that declare none.
    fn tag() -> &'static str;

    fn description() -> Option<&'static str> {
        None
    }
}

/// A controller with declared operations, implemented by `#[routes]`.
pub trait Controller: ControllerInfo + Send + Sync + Sized + 'static {
    fn operations() -> Vec<Operation<Self>>;
}

/// A declared operation and the call into the method that implements it.
pub struct Operation<C> {
    spec: OperationSpec,
    handler: Handler<C>,
}

impl<C: Send + Sync + 'static> Operation<C> {
    pub fn new<F, Fut>(spec: OperationSpec, handler: F) -> Self
    where
        F: Fn(Arc<C>, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Reply, ApiError>> + Send + 'static,
    {
        Self {
            spec,
            handler: Arc::new(move |controller: Arc<C>, args: Arguments| -> HandlerFuture {
                Box::pin(handler(controller, args))
            }),
        }
    }

    pub fn spec(&self) -> &OperationSpec {
        &self.spec
    }

    pub fn handler(&self) -> &Handler<C> {
        &self.handler
    }

    pub fn into_parts(self) -> (OperationSpec, Handler<C>) {
        (self.spec, self.handler)
    }

    pub async fn call(&self, controller: Arc<C>, args: Arguments) -> Result<Reply, ApiError> {
        (self.handler)(controller, args).await
    }
}

impl<C> Clone for Operation<C> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec.clone(),
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<C> std::fmt::Debug for Operation<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operation").field("spec", &self.spec).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::HttpMethod;
    use serde_json::json;

    struct Counter {
        step: i64,
    }

    #[tokio::test]
    async fn test_operation_calls_handler() {
        let op = Operation::new(
            OperationSpec::new(HttpMethod::Get, "/{n}", "add"),
            |controller: Arc<Counter>, mut args: Arguments| async move {
                let n: i64 = args.take(0)?;
                Ok::<_, ApiError>(Reply::new(n + controller.step))
            },
        );

        let mut args = Arguments::default();
        args.push("n", Some(json!(40)));

        let reply = op.call(Arc::new(Counter { step: 2 }), args).await.unwrap();
        assert_eq!(reply.to_json().unwrap(), Some(json!(42)));
        assert_eq!(op.spec().operation_id, "add");
    }

    #[tokio::test]
    async fn test_handler_errors_propagate() {
        let op = Operation::new(
            OperationSpec::new(HttpMethod::Get, "/", "fail"),
            |_: Arc<Counter>, _: Arguments| async move {
                Err::<Reply, _>(ApiError::not_found("nothing here"))
            },
        );

        let err = op
            .call(Arc::new(Counter { step: 0 }), Arguments::default())
            .await
            .unwrap_err();
        assert_eq!(err.message, "nothing here");
    }
}

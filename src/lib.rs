//! # oasbind
//!
//! Bind annotated controllers to axum routes and serve the OpenAPI document
//! they describe.
//!
//! Route methods carry their OpenAPI metadata as attributes. At registration
//! time every declared operation becomes an axum route whose handler
//! marshals path, query, header and cookie values (plus a JSON body) into
//! the method's typed arguments, calls the method and picks the response
//! status from the run-time type of the returned value.
//!
//! ## Features
//!
//! - **Declarative operations**: `#[get]`, `#[post]`, ... with parameter,
//!   body and response attributes
//! - **Scalar coercion**: parameters are coerced by their declared OpenAPI
//!   type before deserialization
//! - **Response mapping**: `#[response(404, NotFound)]` maps a returned
//!   `NotFound` to 404
//! - **Generated documentation**: the assembled document is served with a
//!   Swagger UI page and written to disk on startup
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use oasbind::prelude::*;
//!
//! #[derive(Serialize, ToSchema)]
//! pub struct Pet {
//!     id: i64,
//!     name: String,
//! }
//!
//! #[derive(Serialize, ToSchema)]
//! pub struct PetNotFound {
//!     id: i64,
//! }
//!
//! #[controller(path = "/pets")]
//! pub struct PetController;
//!
//! #[routes]
//! impl PetController {
//!     /// Find a pet by id
//!     #[get("/{id}")]
//!     #[response(200, Pet)]
//!     #[response(404, PetNotFound)]
//!     async fn get_pet(&self, #[path] id: i64) -> Reply {
//!         if id == 1 {
//!             Reply::new(Pet { id, name: "Rex".to_string() })
//!         } else {
//!             Reply::new(PetNotFound { id })
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> oasbind::Result<()> {
//!     Application::builder()
//!         .title("Pet Store")
//!         .controller(PetController)
//!         .build()?
//!         .listen()
//!         .await
//! }
//! ```

pub mod application;
pub mod binder;
pub mod config;
pub mod controller;
pub mod docs;
pub mod error;
pub mod marshal;
pub mod metadata;
pub mod openapi;
pub mod reply;

// Generated code refers to `::oasbind`, including inside this crate's tests.
extern crate self as oasbind;

pub use application::{Application, ApplicationBuilder, shutdown_signal};
pub use config::{ConfigService, ServerConfig};
pub use controller::{Controller, ControllerInfo, Operation};
pub use docs::DocsConfig;
pub use error::{ApiError, BinderError, Result};
pub use marshal::Arguments;
pub use openapi::DocumentInfo;
pub use reply::{IntoReply, Reply};

pub use oasbind_macro::{
    controller, delete, get, head, options, patch, post, put, response, routes,
};

pub use axum;
pub use utoipa;

/// Prelude module for convenient imports
///
/// ```
/// use oasbind::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        ApiError, Application, Controller, ControllerInfo, IntoReply, Reply, ServerConfig,
        controller, delete, get, head, options, patch, post, put, response, routes,
    };
    pub use axum::Json;
    pub use serde::{Deserialize, Serialize};
    pub use std::sync::Arc;
    pub use utoipa::ToSchema;
}
